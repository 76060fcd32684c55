//! Research pipeline driven by a fake backend and a scripted oracle

mod common;

use std::sync::Arc;

use common::{FakeBackend, FakeOracle};
use kodegen_tools_research::oracle::Grade;
use kodegen_tools_research::research::{ResearchConfig, ResearchPipeline, TerminationReason};

const A: &str = "https://a.test/";
const B: &str = "https://b.test/";
const C: &str = "https://c.test/";
const D: &str = "https://d.test/";
const E: &str = "https://e.test/";

fn config(budget: u32) -> ResearchConfig {
    ResearchConfig {
        budget,
        ..ResearchConfig::default()
    }
}

fn pipeline(backend: &Arc<FakeBackend>, oracle: &Arc<FakeOracle>, config: ResearchConfig) -> ResearchPipeline {
    ResearchPipeline::new(backend.clone(), oracle.clone(), config)
}

fn urls(outcome: &kodegen_tools_research::research::ResearchOutcome) -> Vec<&str> {
    outcome.sources.iter().map(|s| s.url.as_str()).collect()
}

#[tokio::test]
async fn follow_up_iteration_never_repeats_a_source() {
    let backend = FakeBackend::new();
    backend.respond("rust pools", &[A, B]);
    backend.respond("rust pool health checks", &[B, C]);
    let oracle = Arc::new(FakeOracle::with_grades(vec![
        Ok(Grade::fail(["rust pool health checks"])),
        Ok(Grade::pass()),
    ]));

    let outcome = pipeline(&backend, &oracle, config(3))
        .run(vec!["rust pools".into()])
        .await;

    assert_eq!(outcome.termination, TerminationReason::Passed);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(backend.queries(), ["rust pools", "rust pool health checks"]);

    let mut found = urls(&outcome);
    found.sort_unstable();
    assert_eq!(found, [A, B, C]);

    let text = &outcome.source_text;
    assert_eq!(text.matches(&format!("URL: {B}")).count(), 1);
    assert_eq!(text.matches("Sources:").count(), 2, "one block per iteration");
    assert!(text.contains("Brief: Title of https://c.test/"));
}

#[tokio::test]
async fn budget_of_one_with_failing_grader_runs_exactly_once() {
    let backend = FakeBackend::new();
    backend.respond("q", &[A]);
    let oracle = Arc::new(FakeOracle::with_grades(vec![Ok(Grade::fail(["more", "even more"]))]));

    let outcome = pipeline(&backend, &oracle, config(1)).run(vec!["q".into()]).await;

    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.budget, 1);
    assert_eq!(outcome.termination, TerminationReason::BudgetExhausted);
    assert_eq!(backend.queries(), ["q"]);
    assert_eq!(oracle.grade_calls(), 1);
    assert_eq!(urls(&outcome), [A]);
}

#[tokio::test]
async fn passing_grade_stops_before_budget_is_used() {
    let backend = FakeBackend::new();
    backend.respond("q", &[A, B]);
    let oracle = Arc::new(FakeOracle::default());

    let outcome = pipeline(&backend, &oracle, config(3)).run(vec!["q".into()]).await;

    assert_eq!(outcome.termination, TerminationReason::Passed);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.sources.len(), 2);
}

#[tokio::test]
async fn failing_grader_with_follow_ups_uses_the_whole_budget() {
    let backend = FakeBackend::new();
    backend.respond("q", &[A]);
    backend.respond("next", &[B]);
    let oracle = Arc::new(FakeOracle::with_grades(vec![Ok(Grade::fail(["next"]))]));

    let outcome = pipeline(&backend, &oracle, config(3)).run(vec!["q".into()]).await;

    assert_eq!(outcome.iterations, 3);
    assert_eq!(outcome.termination, TerminationReason::BudgetExhausted);
    assert_eq!(backend.queries(), ["q", "next", "next"]);
    // The third iteration only saw already-known URLs
    assert_eq!(outcome.sources.len(), 2);
    assert_eq!(outcome.source_text.matches("Sources:").count(), 2);
}

#[tokio::test]
async fn filtering_and_compression_shape_the_corpus() {
    let backend = FakeBackend::new();
    backend.respond("q", &[A, B, C]);
    backend.respond("r", &[D, E]);
    let oracle = Arc::new(FakeOracle::default());
    oracle.score(A, 2); // below the acceptance threshold
    oracle.score(B, -1); // scoring fails after retries
    oracle.score(C, 5);
    oracle.score(D, 3);
    oracle.irrelevant.lock().insert(D.to_string());
    oracle.compress_failures.lock().insert(E.to_string());

    let outcome = pipeline(&backend, &oracle, config(1))
        .run(vec!["q".into(), "r".into()])
        .await;

    assert_eq!(urls(&outcome), [C, E], "ordered by score, highest first");
    assert_eq!(outcome.sources[0].score, Some(5));
    assert_eq!(
        outcome.sources[0].raw_content.as_deref(),
        Some("Brief: Title of https://c.test/")
    );
    assert_eq!(outcome.sources[1].score, Some(4));
    assert!(outcome.sources[1].raw_content.is_none(), "failed compression keeps the snippet only");
}

#[tokio::test]
async fn url_found_by_two_queries_is_kept_once() {
    let backend = FakeBackend::new();
    backend.respond("first", &[A]);
    backend.respond("second", &[A, B]);
    let oracle = Arc::new(FakeOracle::default());

    let outcome = pipeline(&backend, &oracle, config(1))
        .run(vec!["first".into(), "second".into()])
        .await;

    let mut found = urls(&outcome);
    found.sort_unstable();
    assert_eq!(found, [A, B]);
    assert_eq!(outcome.source_text.matches(&format!("URL: {A}")).count(), 1);
}

#[tokio::test]
async fn unavailable_backend_only_loses_its_own_query() {
    let backend = FakeBackend::new();
    backend.fail("down");
    backend.respond("up", &[A]);
    let oracle = Arc::new(FakeOracle::default());

    let outcome = pipeline(&backend, &oracle, config(1))
        .run(vec!["down".into(), "up".into()])
        .await;

    assert_eq!(urls(&outcome), [A]);
    assert_eq!(outcome.termination, TerminationReason::Passed);
}

#[tokio::test]
async fn grading_failure_returns_what_was_gathered() {
    let backend = FakeBackend::new();
    backend.respond("q", &[A]);
    let oracle = Arc::new(FakeOracle::with_grades(vec![Err("service unavailable".into())]));

    let outcome = pipeline(&backend, &oracle, config(3)).run(vec!["q".into()]).await;

    assert_eq!(outcome.iterations, 1);
    assert!(matches!(outcome.termination, TerminationReason::GradingUnavailable(_)));
    assert_eq!(urls(&outcome), [A]);
}

#[tokio::test]
async fn failing_grade_without_follow_ups_ends_the_run() {
    let backend = FakeBackend::new();
    backend.respond("q", &[A]);
    let oracle = Arc::new(FakeOracle::with_grades(vec![Ok(Grade::fail(Vec::<String>::new()))]));

    let outcome = pipeline(&backend, &oracle, config(3)).run(vec!["q".into()]).await;

    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.termination, TerminationReason::NoFollowUps);
}

#[tokio::test]
async fn assigned_budget_is_clamped_to_the_maximum() {
    let backend = FakeBackend::new();
    backend.respond("q", &[A]);
    let oracle = Arc::new(FakeOracle {
        budget: Some(9),
        ..FakeOracle::with_grades(vec![Ok(Grade::fail(["q again"]))])
    });
    let config = ResearchConfig {
        assign_budget: true,
        max_budget: 3,
        ..ResearchConfig::default()
    };

    let outcome = pipeline(&backend, &oracle, config).run(vec!["q".into()]).await;

    assert_eq!(outcome.budget, 3);
    assert_eq!(outcome.iterations, 3);
}

#[tokio::test]
async fn searches_request_crawled_pages_from_the_backend() {
    let backend = FakeBackend::new();
    backend.respond("q", &[A]);
    let oracle = Arc::new(FakeOracle::default());

    pipeline(&backend, &oracle, config(1)).run(vec!["q".into()]).await;

    let requests = backend.requests.lock().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].max_results, 3);
    assert_eq!(requests[0].timeout, 40);
    assert!(requests[0].include_raw_content);
}
