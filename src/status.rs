//! Call status reporting
//!
//! [`TxStatus`] is the per-call orchestration cursor. [`StatusTracker`] owns
//! the cursor for one call, enforces forward-only transitions and forwards
//! every distinct transition to an optional [`StatusObserver`].

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Idle,
    Preparing,
    Signing,
    Submitting,
    Pending,
    Success,
    Failed,
}

impl TxStatus {
    fn rank(&self) -> u8 {
        match self {
            TxStatus::Idle => 0,
            TxStatus::Preparing => 1,
            TxStatus::Signing => 2,
            TxStatus::Submitting => 3,
            TxStatus::Pending => 4,
            TxStatus::Success | TxStatus::Failed => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TxStatus::Idle => "Ready",
            TxStatus::Preparing => "Preparing transaction...",
            TxStatus::Signing => "Please sign in your wallet...",
            TxStatus::Submitting => "Submitting to network...",
            TxStatus::Pending => "Waiting for confirmation...",
            TxStatus::Success => "Transaction confirmed",
            TxStatus::Failed => "Transaction failed",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            TxStatus::Preparing | TxStatus::Signing | TxStatus::Submitting | TxStatus::Pending
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TxStatus::Success | TxStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Idle => "idle",
            TxStatus::Preparing => "preparing",
            TxStatus::Signing => "signing",
            TxStatus::Submitting => "submitting",
            TxStatus::Pending => "pending",
            TxStatus::Success => "success",
            TxStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase label and spinner flag for a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseDisplay {
    pub label: &'static str,
    pub loading: bool,
}

pub fn describe(status: TxStatus) -> PhaseDisplay {
    PhaseDisplay {
        label: status.label(),
        loading: status.is_loading(),
    }
}

/// Receives every status transition of one call, synchronously
pub trait StatusObserver: Send + Sync {
    fn on_status(&self, status: TxStatus);
}

impl<F> StatusObserver for F
where
    F: Fn(TxStatus) + Send + Sync,
{
    fn on_status(&self, status: TxStatus) {
        self(status)
    }
}

/// Per-call status cursor.
///
/// Starts at `Idle`. Transitions only move forward; `Failed` is reachable
/// from any non-terminal state and nothing moves once a terminal state is
/// reached. The observer never sees the same state twice in a row.
pub struct StatusTracker<'o> {
    current: TxStatus,
    observer: Option<&'o dyn StatusObserver>,
    history: Vec<TxStatus>,
}

impl<'o> StatusTracker<'o> {
    pub fn new(observer: Option<&'o dyn StatusObserver>) -> Self {
        Self {
            current: TxStatus::Idle,
            observer,
            history: vec![TxStatus::Idle],
        }
    }

    pub fn current(&self) -> TxStatus {
        self.current
    }

    /// Every state this call has been in, starting with `Idle`
    pub fn history(&self) -> &[TxStatus] {
        &self.history
    }

    /// Move to `next`. Returns whether a transition happened.
    pub fn advance(&mut self, next: TxStatus) -> bool {
        if self.current.is_terminal() || next == self.current {
            return false;
        }
        if next != TxStatus::Failed && next.rank() <= self.current.rank() {
            warn!(from = %self.current, to = %next, "Ignoring backward status transition");
            return false;
        }

        trace!(from = %self.current, to = %next, "Status transition");
        self.current = next;
        self.history.push(next);
        if let Some(observer) = self.observer {
            observer.on_status(next);
        }
        true
    }

    /// Force `Failed` unless already terminal
    pub fn fail(&mut self) -> bool {
        self.advance(TxStatus::Failed)
    }
}

impl std::fmt::Debug for StatusTracker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusTracker")
            .field("current", &self.current)
            .field("history", &self.history)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}
