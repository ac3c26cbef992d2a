//! RPC Manager Module
//!
//! The remote ledger node boundary: the [`LedgerNode`] trait the pipeline
//! talks to, and an HTTP JSON-RPC implementation of it.
//!
//! One node handle is shared by every in-flight call, so implementations must
//! be safe for concurrent use through `&self`.

use async_trait::async_trait;

use crate::tx_builder::{SignedEnvelope, TransactionEnvelope};
use crate::types::{AccountState, SimulationResponse, SubmissionReceipt, TransactionStatusResponse};

// Submodules
pub mod rpc_client;
pub mod rpc_errors;

// Re-exports for convenience
pub use rpc_client::HttpLedgerNode;
pub use rpc_errors::NodeError;

/// Operations the orchestrator needs from a remote ledger node
#[async_trait]
pub trait LedgerNode: Send + Sync {
    /// Current on-ledger state of an account
    async fn get_account(&self, address: &str) -> Result<AccountState, NodeError>;

    /// Dry-run an unsigned envelope and report its resource cost
    async fn simulate_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SimulationResponse, NodeError>;

    /// Broadcast a signed envelope
    async fn send_transaction(&self, envelope: &SignedEnvelope)
        -> Result<SubmissionReceipt, NodeError>;

    /// Query confirmation status by hash
    async fn get_transaction(&self, hash: &str) -> Result<TransactionStatusResponse, NodeError>;
}
