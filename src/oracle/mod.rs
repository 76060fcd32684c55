//! Text Oracle: the external judgment service the research pipeline consults
//!
//! The pipeline only ever talks to the [`Oracle`] trait. Every method has a
//! fixed, typed result; parsing free-form model output and retrying belong
//! to adapters ([`ChatOracle`], [`RetryingOracle`]), never to the pipeline.

mod chat;
mod error;
mod prompts;
mod retry;

pub use chat::{ChatOracle, ChatOracleConfig};
pub use error::OracleError;
pub use retry::RetryingOracle;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relevance of a document to a query, 1 (irrelevant) to 5 (very relevant)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Relevance(u8);

impl Relevance {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(score: i64) -> Result<Self, OracleError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&score) {
            // Range-checked above
            Ok(Self(score as u8))
        } else {
            Err(OracleError::Malformed(format!(
                "relevance score {score} outside {}..={}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether the score meets `threshold`
    #[must_use]
    pub fn meets(self, threshold: u8) -> bool {
        self.0 >= threshold
    }
}

impl fmt::Display for Relevance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Text a compressor returns when a document holds nothing useful
pub const NOTHING_RELEVANT: &str = "NOTHING_RELEVANT";

/// Query-focused distillation of one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Brief {
    Relevant(String),
    NothingRelevant,
}

impl Brief {
    /// Interpret compressor output; blank text or the sentinel means nothing relevant
    pub fn from_text(text: impl AsRef<str>) -> Self {
        let text = text.as_ref().trim();
        if text.is_empty() || text.eq_ignore_ascii_case(NOTHING_RELEVANT) {
            Self::NothingRelevant
        } else {
            Self::Relevant(text.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

/// Sufficiency judgment over the accumulated corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    #[serde(rename = "grade")]
    pub verdict: Verdict,
    /// Queries targeting the gap; only meaningful on [`Verdict::Fail`]
    #[serde(default)]
    pub follow_up_queries: Vec<String>,
}

impl Grade {
    #[must_use]
    pub fn pass() -> Self {
        Self {
            verdict: Verdict::Pass,
            follow_up_queries: Vec::new(),
        }
    }

    pub fn fail<I, S>(follow_up_queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            verdict: Verdict::Fail,
            follow_up_queries: follow_up_queries.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

/// Stateless request/response judgment service
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Score how relevant `document` is to `query`
    async fn score_relevance(&self, query: &str, document: &str) -> Result<Relevance, OracleError>;

    /// Distill only the parts of `document` relevant to `query`
    async fn compress(&self, query: &str, document: &str) -> Result<Brief, OracleError>;

    /// Judge whether `corpus` sufficiently answers `queries`
    async fn grade_sufficiency(&self, queries: &[String], corpus: &str) -> Result<Grade, OracleError>;

    /// Suggest an iteration budget for researching `queries`
    ///
    /// `Ok(None)` means no opinion; the pipeline then uses its configured
    /// default.
    async fn assign_budget(&self, _queries: &[String]) -> Result<Option<u32>, OracleError> {
        Ok(None)
    }
}

#[async_trait]
impl<O: Oracle + ?Sized> Oracle for std::sync::Arc<O> {
    async fn score_relevance(&self, query: &str, document: &str) -> Result<Relevance, OracleError> {
        (**self).score_relevance(query, document).await
    }

    async fn compress(&self, query: &str, document: &str) -> Result<Brief, OracleError> {
        (**self).compress(query, document).await
    }

    async fn grade_sufficiency(&self, queries: &[String], corpus: &str) -> Result<Grade, OracleError> {
        (**self).grade_sufficiency(queries, corpus).await
    }

    async fn assign_budget(&self, queries: &[String]) -> Result<Option<u32>, OracleError> {
        (**self).assign_budget(queries).await
    }
}
