//! Error types for the Transaction Builder
//!
//! These errors cover envelope assembly and the envelope hand-offs around
//! signing. They never reach the caller directly: the orchestrator classifies
//! them into a `ClassifiedError` (all of them land in `Unknown`, since they
//! indicate a malformed request or a misbehaving wallet rather than a ledger
//! outcome).

use crate::codec::CodecError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionBuilderError {
    /// Target is not a contract strkey
    #[error("Invalid contract address: {0}")]
    InvalidContract(String),

    /// Function names are 1-32 chars of `[A-Za-z0-9_]`
    #[error("Invalid function name: {0:?}")]
    InvalidFunctionName(String),

    /// Argument or envelope encoding failed
    #[error("Encoding error: {0}")]
    Encoding(#[from] CodecError),

    /// An envelope does not parse back, or is not a v1 envelope
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Signed envelope was produced for a different network or source
    #[error("Envelope mismatch: {0}")]
    Mismatch(String),

    /// Invalid policy values
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TransactionBuilderError {
    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidContract(_) => "contract",
            Self::InvalidFunctionName(_) => "function",
            Self::Encoding(_) => "encoding",
            Self::MalformedEnvelope(_) => "envelope",
            Self::Mismatch(_) => "mismatch",
            Self::Configuration(_) => "config",
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEnvelope(reason.into())
    }

    pub fn mismatch(reason: impl Into<String>) -> Self {
        Self::Mismatch(reason.into())
    }
}
