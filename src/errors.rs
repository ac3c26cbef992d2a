//! Classified call errors
//!
//! Every failure that leaves the orchestrator is a [`ClassifiedError`]: one
//! [`ErrorKind`] from a closed taxonomy plus a human-readable message. Lower
//! layers convert into it through explicit per-stage classification functions
//! (`account::classify_node_error`, `wallet::classify_wallet_error`, ...);
//! [`classify_any`] is the total fallback.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    WalletNotFound,
    TransactionRejected,
    InsufficientBalance,
    SubmissionFailed,
    OnChainFailure,
    Timeout,
    Unknown,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::WalletNotFound,
        ErrorKind::TransactionRejected,
        ErrorKind::InsufficientBalance,
        ErrorKind::SubmissionFailed,
        ErrorKind::OnChainFailure,
        ErrorKind::Timeout,
        ErrorKind::Unknown,
    ];

    /// Wire tag, also used as the metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::WalletNotFound => "WALLET_NOT_FOUND",
            ErrorKind::TransactionRejected => "TRANSACTION_REJECTED",
            ErrorKind::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ErrorKind::SubmissionFailed => "SUBMISSION_FAILED",
            ErrorKind::OnChainFailure => "ON_CHAIN_FAILURE",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How loudly a failure should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// A failure of one contract call
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn wallet_not_found() -> Self {
        Self::new(ErrorKind::WalletNotFound, "No wallet connected")
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransactionRejected, message)
    }

    pub fn insufficient_balance() -> Self {
        Self::new(ErrorKind::InsufficientBalance, "Account not funded on testnet")
    }

    pub fn submission_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SubmissionFailed, message)
    }

    pub fn on_chain_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OnChainFailure, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    pub fn severity(&self) -> Severity {
        match self.kind {
            ErrorKind::WalletNotFound => Severity::Warning,
            ErrorKind::TransactionRejected => Severity::Info,
            _ => Severity::Error,
        }
    }

    /// Message suitable for an end user
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::WalletNotFound => "Please connect your wallet first".to_string(),
            ErrorKind::TransactionRejected => "Transaction was cancelled".to_string(),
            ErrorKind::InsufficientBalance => {
                "Insufficient XLM balance. Please fund your account on testnet".to_string()
            }
            _ if self.message.trim().is_empty() => "An unexpected error occurred".to_string(),
            _ => self.message.clone(),
        }
    }
}

/// Classify an arbitrary error. Already-classified errors keep their kind;
/// everything else becomes `Unknown` with its raw message.
pub fn classify_any(err: &(dyn std::error::Error + 'static)) -> ClassifiedError {
    match err.downcast_ref::<ClassifiedError>() {
        Some(classified) => classified.clone(),
        None => ClassifiedError::unknown(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        for kind in ErrorKind::ALL {
            let expected = match kind {
                ErrorKind::WalletNotFound => Severity::Warning,
                ErrorKind::TransactionRejected => Severity::Info,
                _ => Severity::Error,
            };
            assert_eq!(ClassifiedError::new(kind, "x").severity(), expected, "{kind}");
        }
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            ClassifiedError::wallet_not_found().user_message(),
            "Please connect your wallet first"
        );
        assert_eq!(
            ClassifiedError::rejected("User declined the request").user_message(),
            "Transaction was cancelled"
        );
        assert_eq!(
            ClassifiedError::insufficient_balance().user_message(),
            "Insufficient XLM balance. Please fund your account on testnet"
        );
        assert_eq!(
            ClassifiedError::on_chain_failure("Transaction failed on-chain").user_message(),
            "Transaction failed on-chain"
        );
        assert_eq!(
            ClassifiedError::unknown("").user_message(),
            "An unexpected error occurred"
        );
    }

    #[test]
    fn test_kind_serde_tags() {
        let json = serde_json::to_string(&ErrorKind::WalletNotFound).unwrap();
        assert_eq!(json, "\"WALLET_NOT_FOUND\"");
        for kind in ErrorKind::ALL {
            let tag = serde_json::to_string(&kind).unwrap();
            assert_eq!(tag.trim_matches('"'), kind.as_str());
        }
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
    }

    #[test]
    fn test_classify_any_is_total() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let classified = classify_any(&io);
        assert_eq!(classified.kind, ErrorKind::Unknown);
        assert_eq!(classified.message, "disk on fire");

        let original = ClassifiedError::timeout("late");
        assert_eq!(classify_any(&original), original);
    }

    #[test]
    fn test_display() {
        let err = ClassifiedError::submission_failed("Transaction submission failed");
        assert_eq!(err.to_string(), "SUBMISSION_FAILED: Transaction submission failed");
    }
}
