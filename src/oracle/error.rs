use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    /// The request never produced a response (connect, TLS, timeout)
    #[error("Oracle transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("Oracle returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response did not match the expected schema
    #[error("Malformed oracle response: {0}")]
    Malformed(String),

    /// Every attempt failed; `last` is the final attempt's error
    #[error("Oracle failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<OracleError>,
    },
}

impl OracleError {
    /// Whether another attempt could plausibly succeed
    ///
    /// Malformed responses count as transient: the same prompt usually
    /// parses on the next sample.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Malformed(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Exhausted { .. } => false,
        }
    }
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_statuses() {
        let status = |status| OracleError::Status {
            status,
            body: String::new(),
        };
        assert!(status(429).is_transient());
        assert!(status(503).is_transient());
        assert!(!status(401).is_transient());
        assert!(OracleError::Malformed("score missing".into()).is_transient());

        let exhausted = OracleError::Exhausted {
            attempts: 5,
            last: Box::new(OracleError::Transport("reset".into())),
        };
        assert!(!exhausted.is_transient());
        assert!(exhausted.to_string().contains("after 5 attempts"));
    }
}
