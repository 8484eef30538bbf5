//! Error taxonomy. The variants classify how far an error is allowed to
//! propagate: `Config`/`Setup` stop the process (exit 1), `Source`/`Cache`/
//! `Channel` are cycle- or entity-scoped and are caught by the loop or job
//! that observed them. Per-recipient delivery failures never become errors —
//! they are recorded in `DispatchOutcome`.

use thiserror::Error;

/// BizPulse error type.
#[derive(Debug, Error)]
pub enum BizPulseError {
    /// Configuration file missing, unreadable, or invalid.
    #[error("Config error: {0}")]
    Config(String),

    /// Fatal setup failure — preflight refused, bad fan-out parameters.
    /// The daemon must not start (or must abort before doing work).
    #[error("Setup error: {0}")]
    Setup(String),

    /// Chat transport failure (Telegram / webhook).
    #[error("Channel error: {0}")]
    Channel(String),

    /// Business data-source failure (backend API).
    #[error("Source error: {0}")]
    Source(String),

    /// Cache probe failure.
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BizPulseError {
    /// Fatal errors terminate the process with exit code 1; everything else
    /// is recovered at some enclosing scope.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Setup(_))
    }
}

pub type Result<T> = std::result::Result<T, BizPulseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(BizPulseError::Setup("bad".into()).is_fatal());
        assert!(BizPulseError::Config("bad".into()).is_fatal());
        assert!(!BizPulseError::Channel("down".into()).is_fatal());
        assert!(!BizPulseError::Source("down".into()).is_fatal());
        assert!(!BizPulseError::Cache("down".into()).is_fatal());
    }
}
