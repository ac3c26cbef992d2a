//! Account resolution
//!
//! Fetches the caller's current ledger state (account id and sequence) that
//! the transaction builder needs.

use tracing::debug;

use crate::errors::ClassifiedError;
use crate::rpc_manager::{LedgerNode, NodeError};
use crate::types::AccountState;

/// Resolve the source account of a call
pub async fn resolve_account(
    node: &dyn LedgerNode,
    caller: &str,
) -> Result<AccountState, ClassifiedError> {
    let caller = caller.trim();
    if caller.is_empty() {
        return Err(ClassifiedError::wallet_not_found());
    }

    let account = node.get_account(caller).await.map_err(classify_node_error)?;
    debug!(account = %account.account_id, sequence = account.sequence, "Resolved source account");
    Ok(account)
}

/// A missing account means it was never funded
pub fn classify_node_error(err: NodeError) -> ClassifiedError {
    if err.is_not_found() {
        ClassifiedError::insufficient_balance()
    } else {
        ClassifiedError::unknown(err.to_string())
    }
}
