//! Instructions sent to the chat model
//!
//! Each prompt pins the JSON object the model must answer with; the shapes
//! are mirrored by the response structs in `chat.rs`.

pub(super) const RELEVANCE_SYSTEM: &str = "\
You grade web documents for a research assistant.
Rate how relevant the document is to the query on a scale of 1 to 5:
1 = irrelevant, 2 = slightly relevant, 3 = relevant, 4 = highly relevant, 5 = very relevant.
Answer with a JSON object only: {\"score\": <integer 1-5>}";

pub(super) const COMPRESS_SYSTEM: &str = "\
You condense web documents for a research assistant.
Extract every piece of information in the document that is directly, indirectly,
potentially or partially related to the query. Keep figures, names and dates exact.
Do not add anything that is not in the document.
If nothing in the document relates to the query, use the summary NOTHING_RELEVANT.
Answer with a JSON object only: {\"summary\": \"<text>\"}";

pub(super) const GRADE_SYSTEM: &str = "\
You review collected sources for a research assistant.
Decide whether the sources sufficiently answer the queries.
If they do, grade \"pass\". If not, grade \"fail\" and propose at most three
follow-up search queries that target exactly the missing information.
Answer with a JSON object only:
{\"grade\": \"pass\" | \"fail\", \"follow_up_queries\": [\"<query>\", ...]}";

pub(super) const BUDGET_SYSTEM: &str = "\
You plan web research for a research assistant.
Given the queries, decide how many search iterations (1 to 3) are needed:
1 for simple factual lookups, 3 for broad or multi-part topics.
Answer with a JSON object only: {\"budget\": <integer>}";

pub(super) fn relevance_user(query: &str, document: &str) -> String {
    format!("Query: {query}\n\nDocument:\n{document}")
}

pub(super) fn compress_user(query: &str, document: &str) -> String {
    format!("Query: {query}\n\nDocument:\n{document}")
}

pub(super) fn grade_user(queries: &[String], corpus: &str) -> String {
    format!("Queries:\n{}\n\nSources:\n{corpus}", bullet_list(queries))
}

pub(super) fn budget_user(queries: &[String]) -> String {
    format!("Queries:\n{}", bullet_list(queries))
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
