use serde::Serialize;
use std::fmt;
use tracing::info;

use super::budget::IterationBudget;
use super::corpus::{SeenUrls, SourceCorpus, format_sources};
use crate::web_search::SearchResult;

/// Stages of one research run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineStage {
    BudgetAssigned,
    Searching,
    Filtering,
    Compressing,
    Aggregating,
    Grading,
    Done,
}

/// Why a run stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TerminationReason {
    /// The grader judged the corpus sufficient
    Passed,
    /// The iteration budget was used up
    BudgetExhausted,
    /// Grading failed after retries; the corpus so far is returned
    GradingUnavailable(String),
    /// The grader failed the corpus but proposed nothing to search next
    NoFollowUps,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "grader passed the sources"),
            Self::BudgetExhausted => write!(f, "iteration budget exhausted"),
            Self::GradingUnavailable(e) => write!(f, "grading unavailable: {e}"),
            Self::NoFollowUps => write!(f, "grader proposed no follow-up queries"),
        }
    }
}

/// Mutable state of one run
///
/// Created at the start of a run, mutated by the driver loop only, and
/// dropped at the end.
#[derive(Debug)]
pub struct PipelineState {
    pub original_queries: Vec<String>,
    /// Original queries on the first iteration, follow-ups afterwards
    pub current_queries: Vec<String>,
    /// Iterations started so far
    pub iteration: u32,
    pub budget: IterationBudget,
    pub stage: PipelineStage,
    pub seen: SeenUrls,
    pub corpus: SourceCorpus,
    /// Formatted sources of every iteration, separated by a blank line
    pub source_text: String,
}

impl PipelineState {
    pub fn new(queries: Vec<String>, budget: IterationBudget) -> Self {
        Self {
            current_queries: queries.clone(),
            original_queries: queries,
            iteration: 0,
            budget,
            stage: PipelineStage::BudgetAssigned,
            seen: SeenUrls::new(),
            corpus: SourceCorpus::new(),
            source_text: String::new(),
        }
    }

    pub fn advance(&mut self, stage: PipelineStage) {
        info!(
            stage = ?stage,
            iteration = self.iteration,
            budget = self.budget.get(),
            "Research stage"
        );
        self.stage = stage;
    }

    /// Start the next iteration with the current queries
    pub fn begin_iteration(&mut self) {
        self.iteration += 1;
        self.advance(PipelineStage::Searching);
    }

    /// Continue with follow-up queries
    pub fn follow_up(&mut self, queries: Vec<String>) {
        self.current_queries = queries;
    }

    /// Add an iteration's compressed sources to the corpus and formatted text
    ///
    /// Returns the number of sources added.
    pub fn aggregate(&mut self, batch: Vec<SearchResult>) -> usize {
        let added = self.corpus.absorb(batch);
        if added.is_empty() {
            return 0;
        }
        let count = added.len();
        let formatted = format_sources(added);
        if !self.source_text.is_empty() {
            self.source_text.push_str("\n\n");
        }
        self.source_text.push_str(&formatted);
        count
    }
}

/// What a finished run hands back
#[derive(Debug, Clone, Serialize)]
pub struct ResearchOutcome {
    pub sources: Vec<SearchResult>,
    pub source_text: String,
    pub iterations: u32,
    pub budget: u32,
    pub termination: TerminationReason,
}

impl ResearchOutcome {
    pub(crate) fn finish(state: PipelineState, termination: TerminationReason) -> Self {
        Self {
            iterations: state.iteration,
            budget: state.budget.get(),
            source_text: state.source_text,
            sources: state.corpus.into_sources(),
            termination,
        }
    }
}
