//! Cross-iteration dedup and the accumulated source corpus

use dashmap::DashSet;
use std::cmp::Reverse;
use std::collections::HashSet;

use crate::web_search::SearchResult;

/// URLs already taken by this run
///
/// Insert-if-absent is atomic, so concurrent claimers of one URL see exactly
/// one winner.
#[derive(Debug, Default)]
pub struct SeenUrls {
    urls: DashSet<String>,
}

impl SeenUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `url`; `true` if this call was the first to see it
    pub fn claim(&self, url: &str) -> bool {
        self.urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// All sources accepted so far in one run, unique by URL
///
/// Only grows. Each iteration's additions are ordered by score (highest
/// first) with URL as tie-breaker, so the corpus does not depend on the
/// order in which concurrent work finished.
#[derive(Debug, Default, Clone)]
pub struct SourceCorpus {
    sources: Vec<SearchResult>,
    urls: HashSet<String>,
}

impl SourceCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one iteration's sources; returns the ones actually added, in corpus order
    pub fn absorb(&mut self, mut batch: Vec<SearchResult>) -> &[SearchResult] {
        sort_for_corpus(&mut batch);
        let start = self.sources.len();
        for source in batch {
            if self.urls.insert(source.url.clone()) {
                self.sources.push(source);
            }
        }
        &self.sources[start..]
    }

    pub fn sources(&self) -> &[SearchResult] {
        &self.sources
    }

    pub fn into_sources(self) -> Vec<SearchResult> {
        self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }
}

fn sort_for_corpus(batch: &mut [SearchResult]) {
    batch.sort_by(|a, b| {
        Reverse(a.score.unwrap_or(1))
            .cmp(&Reverse(b.score.unwrap_or(1)))
            .then_with(|| a.url.cmp(&b.url))
    });
}

/// Render sources as the text handed to graders and writers
///
/// Sources are deduplicated by URL keeping the highest-scored entry. A
/// source without content contributes an empty body.
pub fn format_sources(sources: &[SearchResult]) -> String {
    let mut ordered: Vec<&SearchResult> = sources.iter().collect();
    ordered.sort_by_key(|source| Reverse(source.score.unwrap_or(1)));

    let mut seen = HashSet::new();
    let mut text = String::from("Sources:\n\n");
    for source in ordered {
        if !seen.insert(source.url.as_str()) {
            continue;
        }
        text.push_str(&format!("Source {}:\n===\n", source.title));
        text.push_str(&format!("URL: {}\n===\n", source.url));
        text.push_str(&format!(
            "Most relevant content from source: {}\n===\n",
            source.content
        ));
        text.push_str(source.raw_content.as_deref().unwrap_or_default());
        text.push_str("\n\n");
    }
    text.trim().to_string()
}

/// Document scored for relevance: title, snippet and full page text
pub fn relevance_document(result: &SearchResult) -> String {
    format!(
        "Title:{}\n\nContent:{}\n\nRaw Content:{}",
        result.title,
        result.content,
        result.raw_content.as_deref().unwrap_or_default()
    )
}

/// Document handed to the compressor
pub fn compression_document(result: &SearchResult) -> String {
    format!(
        "Title:{},Brief Content:{},Full Content:{}",
        result.title,
        result.content,
        result.raw_content.as_deref().unwrap_or_default()
    )
}
