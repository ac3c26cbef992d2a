//! Submission and confirmation polling
//!
//! Broadcasts a signed envelope once, then queries its status at a fixed
//! interval for a bounded number of attempts. The poll loop is strictly
//! sequential: one query in flight at a time, no sleep after the final query.

use tracing::{debug, info, warn};

use crate::codec::ScVal;
use crate::config::CallPolicy;
use crate::errors::ClassifiedError;
use crate::rpc_manager::LedgerNode;
use crate::tx_builder::SignedEnvelope;
use crate::types::{explorer_url, LedgerTxStatus, SendStatus, SubmissionReceipt};

const SUBMISSION_FAILED: &str = "Transaction submission failed";
const ON_CHAIN_FAILURE: &str = "Transaction failed on-chain";

/// Confirmed result of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub return_value: Option<ScVal>,
    /// Number of status queries issued, including the confirming one
    pub attempts: u32,
    pub ledger: Option<u32>,
}

/// Broadcast `signed`. Exactly one send request is made.
pub async fn submit(
    node: &dyn LedgerNode,
    signed: &SignedEnvelope,
) -> Result<SubmissionReceipt, ClassifiedError> {
    let mut receipt = node.send_transaction(signed).await.map_err(|e| {
        warn!(error = %e, "sendTransaction failed");
        ClassifiedError::submission_failed(format!("{}: {}", SUBMISSION_FAILED, e))
    })?;

    match receipt.initial_status {
        SendStatus::Error => {
            let message = match &receipt.error_detail {
                Some(detail) if !detail.is_empty() => format!("{}: {}", SUBMISSION_FAILED, detail),
                _ => SUBMISSION_FAILED.to_string(),
            };
            return Err(ClassifiedError::submission_failed(message));
        }
        SendStatus::TryAgainLater => {
            return Err(ClassifiedError::submission_failed(format!(
                "{}: node is busy, try again later",
                SUBMISSION_FAILED
            )));
        }
        SendStatus::Pending | SendStatus::Duplicate => {}
    }

    if receipt.transaction_hash.is_empty() {
        receipt.transaction_hash = signed.hash().to_string();
    } else if receipt.transaction_hash != signed.hash() {
        warn!(
            reported = %receipt.transaction_hash,
            computed = %signed.hash(),
            "Node reported a different transaction hash"
        );
    }

    info!(hash = %receipt.transaction_hash, status = ?receipt.initial_status, "Transaction submitted");
    Ok(receipt)
}

/// Poll `hash` until it is confirmed, fails, or the attempt budget runs out
pub async fn poll_confirmation(
    node: &dyn LedgerNode,
    hash: &str,
    policy: &CallPolicy,
    explorer_base: &str,
) -> Result<PollOutcome, ClassifiedError> {
    let max_attempts = policy.max_poll_attempts.max(1);
    let interval = policy.poll_interval();

    for attempt in 1..=max_attempts {
        match node.get_transaction(hash).await {
            Ok(response) => match response.status {
                LedgerTxStatus::Success => {
                    debug!(hash, attempt, "Transaction confirmed");
                    return Ok(PollOutcome {
                        return_value: response.return_value,
                        attempts: attempt,
                        ledger: response.ledger,
                    });
                }
                LedgerTxStatus::Failed => {
                    warn!(hash, attempt, "Transaction failed on-chain");
                    return Err(ClassifiedError::on_chain_failure(ON_CHAIN_FAILURE));
                }
                LedgerTxStatus::NotFound => {
                    debug!(hash, attempt, max_attempts, "Transaction not yet confirmed");
                }
            },
            // Status is still unknown; the attempt is spent
            Err(e) => warn!(hash, attempt, error = %e, "Status query failed"),
        }

        if attempt < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }

    Err(ClassifiedError::timeout(format!(
        "Transaction timeout - please check explorer: {} ({})",
        hash,
        explorer_url(explorer_base, hash)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_utils::{signed_fixture, MockLedgerNode};
    use crate::types::TransactionStatusResponse;
    use std::time::Duration;

    const EXPLORER: &str = "https://stellar.expert/explorer/testnet";

    fn fast_policy(attempts: u32) -> CallPolicy {
        CallPolicy::default()
            .with_poll_interval(Duration::from_millis(1_000))
            .with_max_poll_attempts(attempts)
    }

    #[tokio::test]
    async fn test_submit_error_status() {
        let node = MockLedgerNode::new().with_send_status(SendStatus::Error);
        let err = submit(&node, &signed_fixture()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::SubmissionFailed);
        assert!(err.message.starts_with("Transaction submission failed"));
        assert_eq!(node.send_calls(), 1);
    }

    #[tokio::test]
    async fn test_submit_uses_computed_hash_when_missing() {
        let signed = signed_fixture();
        let node = MockLedgerNode::new().with_reported_hash("");
        let receipt = submit(&node, &signed).await.unwrap();
        assert_eq!(receipt.transaction_hash, signed.hash());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_success_after_pending() {
        let node = MockLedgerNode::new().with_poll_script(vec![
            TransactionStatusResponse::pending(),
            TransactionStatusResponse::pending(),
            TransactionStatusResponse::success(Some(ScVal::U64(42))),
        ]);
        let started = tokio::time::Instant::now();
        let outcome = poll_confirmation(&node, "abc", &fast_policy(15), EXPLORER)
            .await
            .unwrap();
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.return_value, Some(ScVal::U64(42)));
        assert_eq!(node.poll_calls(), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_exhaustion_is_timeout() {
        let node = MockLedgerNode::new();
        let started = tokio::time::Instant::now();
        let err = poll_confirmation(&node, "abc", &fast_policy(15), EXPLORER)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.message.contains("abc"));
        assert!(err.message.contains("https://stellar.expert/explorer/testnet/tx/abc"));
        assert_eq!(node.poll_calls(), 15);
        // no sleep after the last query
        assert_eq!(started.elapsed(), Duration::from_millis(14_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_failed_on_chain() {
        let node = MockLedgerNode::new().with_poll_script(vec![
            TransactionStatusResponse::pending(),
            TransactionStatusResponse::failed(),
        ]);
        let err = poll_confirmation(&node, "abc", &fast_policy(15), EXPLORER)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::OnChainFailure);
        assert_eq!(err.message, "Transaction failed on-chain");
        assert_eq!(node.poll_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_transport_error_spends_one_attempt() {
        let node = MockLedgerNode::new()
            .with_poll_transport_errors(1)
            .with_poll_script(vec![TransactionStatusResponse::success(None)]);
        let outcome = poll_confirmation(&node, "abc", &fast_policy(3), EXPLORER)
            .await
            .unwrap();
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.return_value, None);
    }
}
