//! Wallet bridge
//!
//! Signing is delegated to an external signer behind [`WalletSigner`]. The
//! signer receives the serialized prepared envelope, the network passphrase and
//! the signer address, and answers with a serialized signed envelope. Nothing
//! here holds key material.

use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::WalletConfig;
use crate::errors::ClassifiedError;

/// Substrings that identify a user rejection in an unstructured wallet error
const REJECTION_MARKERS: [&str; 4] = ["rejected", "cancelled", "denied", "user declined"];

/// Why the signer refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    UserDeclined,
    Cancelled,
    Denied,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RejectionReason::UserDeclined => "User declined the request",
            RejectionReason::Cancelled => "Signing was cancelled",
            RejectionReason::Denied => "Signing permission denied",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// The signer explicitly refused
    #[error("{reason}")]
    Rejected { reason: RejectionReason },

    /// The signer ran but failed
    #[error("Wallet signing failed: {0}")]
    Failed(String),

    /// No signer could be reached
    #[error("Wallet unavailable: {0}")]
    Unavailable(String),
}

/// External signer capability
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Sign `envelope_wire` for `signer` on the network identified by
    /// `network_passphrase`; returns the signed envelope in wire form.
    async fn sign_transaction(
        &self,
        envelope_wire: &str,
        network_passphrase: &str,
        signer: &str,
    ) -> Result<String, WalletError>;
}

pub fn classify_wallet_error(err: WalletError) -> ClassifiedError {
    match err {
        WalletError::Rejected { reason } => ClassifiedError::rejected(reason.to_string()),
        WalletError::Unavailable(message) => ClassifiedError::new(
            crate::errors::ErrorKind::WalletNotFound,
            format!("Wallet unavailable: {}", message),
        ),
        WalletError::Failed(message) => {
            let lowered = message.to_lowercase();
            if REJECTION_MARKERS.iter().any(|m| lowered.contains(m)) {
                ClassifiedError::rejected(message)
            } else {
                ClassifiedError::unknown(message)
            }
        }
    }
}

/// Signer run as a child process per request.
///
/// The envelope is written to stdin; `LEDGER_SIGNER_ADDRESS` and
/// `LEDGER_NETWORK_PASSPHRASE` are set in its environment. A zero exit status
/// with a non-empty stdout is a signed envelope; anything else is a failure
/// carrying stderr. There is no timeout: the call waits for the signer.
#[derive(Debug, Clone)]
pub struct ProcessWallet {
    command: String,
    args: Vec<String>,
}

impl ProcessWallet {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// `None` when no signer command is configured
    pub fn from_config(config: &WalletConfig) -> Option<Self> {
        if config.command.trim().is_empty() {
            None
        } else {
            Some(Self::new(config.command.clone(), config.args.clone()))
        }
    }
}

#[async_trait]
impl WalletSigner for ProcessWallet {
    async fn sign_transaction(
        &self,
        envelope_wire: &str,
        network_passphrase: &str,
        signer: &str,
    ) -> Result<String, WalletError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .env("LEDGER_SIGNER_ADDRESS", signer)
            .env("LEDGER_NETWORK_PASSPHRASE", network_passphrase)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WalletError::Unavailable(format!("{}: {}", self.command, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A signer that exits without reading closes the pipe early
            if let Err(e) = stdin.write_all(envelope_wire.as_bytes()).await {
                debug!(error = %e, "Signer closed stdin before reading the envelope");
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| WalletError::Failed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(status = %output.status, "Signer exited with failure");
            return Err(WalletError::Failed(if stderr.is_empty() {
                format!("signer exited with {}", output.status)
            } else {
                stderr
            }));
        }

        let signed = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if signed.is_empty() {
            return Err(WalletError::Failed("signer returned no envelope".to_string()));
        }
        Ok(signed)
    }
}
