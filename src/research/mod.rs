//! Iterative research pipeline
//!
//! One run takes a batch of queries through
//! budget → search → dedup → relevance filter → compress → aggregate → grade
//! and repeats with the grader's follow-up queries until the grader passes
//! the corpus or the iteration budget runs out. Iterations are strictly
//! sequential; inside an iteration searches, scoring and compression fan out
//! concurrently.
//!
//! A run never fails. Search, scoring and compression failures shrink the
//! corpus; a grading failure ends the run early with what was gathered.

mod budget;
mod config;
mod corpus;
mod state;

pub use budget::IterationBudget;
pub use config::{BackendConfig, ResearchConfig};
pub use corpus::{SeenUrls, SourceCorpus, compression_document, format_sources, relevance_document};
pub use state::{PipelineStage, PipelineState, ResearchOutcome, TerminationReason};

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::oracle::{Brief, Oracle};
use crate::search_service::{SearchBackend, SearchRequest};
use crate::web_search::SearchResult;

pub struct ResearchPipeline {
    backend: Arc<dyn SearchBackend>,
    oracle: Arc<dyn Oracle>,
    config: ResearchConfig,
}

impl ResearchPipeline {
    pub fn new(backend: Arc<dyn SearchBackend>, oracle: Arc<dyn Oracle>, config: ResearchConfig) -> Self {
        Self {
            backend,
            oracle,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Research `queries` and return the accumulated corpus
    pub async fn run(&self, queries: Vec<String>) -> ResearchOutcome {
        let queries: Vec<String> = queries
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();

        let budget = self.assign_budget(&queries).await;
        let mut state = PipelineState::new(queries, budget);
        state.advance(PipelineStage::BudgetAssigned);
        info!("Research run for {:?} with budget {budget}", state.original_queries);

        loop {
            state.begin_iteration();
            let batches = self.search(&state).await;

            state.advance(PipelineStage::Filtering);
            let accepted = self.filter(batches).await;

            state.advance(PipelineStage::Compressing);
            let compressed = self.compress(accepted).await;

            state.advance(PipelineStage::Aggregating);
            let added = state.aggregate(compressed);
            info!(
                "Iteration {} added {added} sources ({} total)",
                state.iteration,
                state.corpus.len()
            );

            state.advance(PipelineStage::Grading);
            let termination = match self
                .oracle
                .grade_sufficiency(&state.original_queries, &state.source_text)
                .await
            {
                Ok(grade) if grade.passed() => Some(TerminationReason::Passed),
                Ok(_) if state.budget.exhausted_by(state.iteration) => {
                    Some(TerminationReason::BudgetExhausted)
                }
                Ok(grade) => {
                    let follow_ups: Vec<String> = grade
                        .follow_up_queries
                        .into_iter()
                        .map(|q| q.trim().to_string())
                        .filter(|q| !q.is_empty())
                        .collect();
                    if follow_ups.is_empty() {
                        Some(TerminationReason::NoFollowUps)
                    } else {
                        info!("Grader requested follow-up queries: {follow_ups:?}");
                        state.follow_up(follow_ups);
                        None
                    }
                }
                Err(e) => {
                    warn!("Sufficiency grading failed: {e}");
                    Some(TerminationReason::GradingUnavailable(e.to_string()))
                }
            };

            if let Some(reason) = termination {
                state.advance(PipelineStage::Done);
                info!(
                    "Research run finished after {} iterations: {reason}",
                    state.iteration
                );
                return ResearchOutcome::finish(state, reason);
            }
        }
    }

    async fn assign_budget(&self, queries: &[String]) -> IterationBudget {
        let config = &self.config;
        if !config.assign_budget {
            return IterationBudget::fixed(config.budget);
        }

        match self.oracle.assign_budget(queries).await {
            Ok(assigned) => IterationBudget::from_assignment(assigned, config.max_budget, config.budget),
            Err(e) => {
                warn!("Budget assignment failed, using default {}: {e}", config.budget);
                IterationBudget::fixed(config.budget)
            }
        }
    }

    /// Search every current query and drop URLs seen earlier in the run
    ///
    /// Searches run concurrently; dedup walks the results in query order so
    /// a URL returned for two queries is always attributed to the first.
    async fn search(&self, state: &PipelineState) -> Vec<(String, Vec<SearchResult>)> {
        let config = &self.config;
        let searches = state.current_queries.iter().map(|query| {
            let request = SearchRequest::new(query.clone())
                .max_results(config.max_results)
                .timeout_secs(config.timeout_secs)
                .include_raw_content(config.include_raw_content);
            async move {
                match self.backend.search_and_crawl(&request).await {
                    Ok(results) => results,
                    Err(e) => {
                        warn!("Search for '{}' failed: {e:#}", request.query);
                        Vec::new()
                    }
                }
            }
        });
        let responses = join_all(searches).await;

        state
            .current_queries
            .iter()
            .cloned()
            .zip(responses)
            .map(|(query, results)| {
                let fresh: Vec<SearchResult> = results
                    .into_iter()
                    .filter(|result| {
                        let is_new = state.seen.claim(&result.url);
                        if !is_new {
                            debug!("Skipping already-seen source {}", result.url);
                        }
                        is_new
                    })
                    .collect();
                (query, fresh)
            })
            .collect()
    }

    /// Keep results the oracle scores at or above the acceptance threshold
    async fn filter(&self, batches: Vec<(String, Vec<SearchResult>)>) -> Vec<(String, SearchResult)> {
        let threshold = self.config.acceptance_threshold;
        let scorings = batches
            .into_iter()
            .flat_map(|(query, results)| results.into_iter().map(move |result| (query.clone(), result)))
            .map(|(query, mut result)| async move {
                let document = relevance_document(&result);
                match self.oracle.score_relevance(&query, &document).await {
                    Ok(relevance) if relevance.meets(threshold) => {
                        result.score = Some(relevance.value());
                        Some((query, result))
                    }
                    Ok(relevance) => {
                        debug!("Rejected {} (score {relevance})", result.url);
                        None
                    }
                    Err(e) => {
                        warn!("Excluding {}: relevance scoring failed: {e}", result.url);
                        None
                    }
                }
            });

        join_all(scorings).await.into_iter().flatten().collect()
    }

    /// Replace each result's raw content with its query-focused brief
    async fn compress(&self, accepted: Vec<(String, SearchResult)>) -> Vec<SearchResult> {
        let compressions = accepted.into_iter().map(|(query, mut result)| async move {
            let document = compression_document(&result);
            match self.oracle.compress(&query, &document).await {
                Ok(Brief::Relevant(brief)) => {
                    result.raw_content = Some(brief);
                    Some(result)
                }
                Ok(Brief::NothingRelevant) => {
                    debug!("Dropping {}: nothing relevant after compression", result.url);
                    None
                }
                Err(e) => {
                    warn!("Compression of {} failed, keeping snippet only: {e}", result.url);
                    result.raw_content = None;
                    Some(result)
                }
            }
        });

        join_all(compressions).await.into_iter().flatten().collect()
    }
}
