use std::fmt;

/// Maximum number of search-filter-grade iterations for one run
///
/// Fixed once the run starts. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IterationBudget(u32);

impl IterationBudget {
    #[must_use]
    pub fn fixed(iterations: u32) -> Self {
        Self(iterations.max(1))
    }

    /// Budget from an oracle suggestion, clamped to `1..=max`
    ///
    /// Without a suggestion the `fallback` is used unclamped.
    #[must_use]
    pub fn from_assignment(assigned: Option<u32>, max: u32, fallback: u32) -> Self {
        match assigned {
            Some(iterations) => Self(iterations.clamp(1, max.max(1))),
            None => Self::fixed(fallback),
        }
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Whether `completed` iterations use up the budget
    #[must_use]
    pub fn exhausted_by(self, completed: u32) -> bool {
        completed >= self.0
    }
}

impl fmt::Display for IterationBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
