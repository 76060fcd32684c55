//! Task and outcome types for batch crawling

use std::fmt;
use std::time::Duration;

use crate::web_search::SearchResult;

/// Error recorded on a result whose task outlived its deadline
pub const TIMEOUT_ERROR: &str = "timeout";

/// One result submitted to the coordinator
#[derive(Debug, Clone)]
pub struct CrawlTask {
    /// Position in the submitted batch; output is restored to this order
    pub index: usize,
    pub result: SearchResult,
    /// Page-load timeout handed to the fetcher
    pub timeout: Duration,
}

/// How a task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Fetched; `raw_content` holds the extraction (possibly `None` for an empty page)
    Completed,
    /// Abandoned by the coordinator after `timeout + grace`
    TimedOut,
    /// The fetch reported an error, or the task itself died
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub index: usize,
    pub status: TaskStatus,
    pub result: SearchResult,
}

impl CrawlOutcome {
    pub(crate) fn from_fetch(index: usize, result: SearchResult) -> Self {
        let status = if result.error.is_some() {
            TaskStatus::Failed
        } else {
            TaskStatus::Completed
        };
        Self {
            index,
            status,
            result,
        }
    }

    pub(crate) fn timed_out(index: usize, mut result: SearchResult) -> Self {
        result.mark_failed(TIMEOUT_ERROR);
        Self {
            index,
            status: TaskStatus::TimedOut,
            result,
        }
    }

    pub(crate) fn failed(index: usize, mut result: SearchResult, reason: impl Into<String>) -> Self {
        result.mark_failed(reason);
        Self {
            index,
            status: TaskStatus::Failed,
            result,
        }
    }
}
