//! Table-checked calls that fail before reaching the node still end in Failed

use std::sync::Arc;

use crate::codec::{string_to_scval, ScVal};
use crate::contracts::clubs::ClubsClient;
use crate::contracts::feedback;
use crate::contracts::nfts::NftsClient;
use crate::errors::ErrorKind;
use crate::orchestrator::{CallOrchestrator, ContractClient, EngineSettings};
use crate::status::TxStatus;
use crate::test_utils::{MockLedgerNode, MockWallet, RecordingObserver, TEST_CALLER, TEST_CONTRACT};

fn engine(node: &Arc<MockLedgerNode>, wallet: &Arc<MockWallet>) -> CallOrchestrator {
    CallOrchestrator::new(node.clone(), wallet.clone(), EngineSettings::default())
}

fn feedback_client(node: &Arc<MockLedgerNode>, wallet: &Arc<MockWallet>) -> ContractClient {
    ContractClient::new(engine(node, wallet), feedback::contract(TEST_CONTRACT))
}

#[tokio::test]
async fn test_register_club_without_caller_reports_failed() {
    let node = Arc::new(MockLedgerNode::new());
    let wallet = Arc::new(MockWallet::approving());
    let observer = RecordingObserver::new();

    let err = ClubsClient::new(engine(&node, &wallet), TEST_CONTRACT)
        .register_club(None, "Ajax", "https://img/ajax.png", Some(&observer))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::WalletNotFound);
    assert_eq!(observer.statuses(), vec![TxStatus::Failed]);
    assert_eq!(node.total_calls(), 0);
    assert_eq!(wallet.calls(), 0);
}

#[tokio::test]
async fn test_invalid_address_argument_reports_failed() {
    let node = Arc::new(MockLedgerNode::new());
    let wallet = Arc::new(MockWallet::approving());
    let observer = RecordingObserver::new();

    let err = NftsClient::new(engine(&node, &wallet), TEST_CONTRACT)
        .get_nfts_by_owner(Some(TEST_CALLER), "GNOTANADDRESS", Some(&observer))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Unknown);
    assert!(err.message.contains("Invalid address"));
    assert_eq!(observer.statuses(), vec![TxStatus::Failed]);
    assert_eq!(node.total_calls(), 0);
}

#[tokio::test]
async fn test_unknown_function_reports_failed() {
    let node = Arc::new(MockLedgerNode::new());
    let wallet = Arc::new(MockWallet::approving());
    let observer = RecordingObserver::new();

    let err = feedback_client(&node, &wallet)
        .invoke(Some(TEST_CALLER), "delete_feedback", vec![], Some(&observer))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Unknown);
    assert!(err.message.contains("no function named delete_feedback"));
    assert_eq!(observer.statuses(), vec![TxStatus::Failed]);
    assert_eq!(node.total_calls(), 0);
}

#[tokio::test]
async fn test_wrong_arity_reports_failed() {
    let node = Arc::new(MockLedgerNode::new());
    let wallet = Arc::new(MockWallet::approving());
    let observer = RecordingObserver::new();

    let err = feedback_client(&node, &wallet)
        .invoke(Some(TEST_CALLER), "send_feedback", vec![], Some(&observer))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Unknown);
    assert!(err.message.contains("expected 1 argument(s), got 0"));
    assert_eq!(observer.statuses(), vec![TxStatus::Failed]);
    assert_eq!(node.total_calls(), 0);
}

#[tokio::test]
async fn test_wrong_argument_type_reports_failed() {
    let node = Arc::new(MockLedgerNode::new());
    let wallet = Arc::new(MockWallet::approving());
    let observer = RecordingObserver::new();

    let err = feedback_client(&node, &wallet)
        .invoke(Some(TEST_CALLER), "send_feedback", vec![ScVal::U64(1)], Some(&observer))
        .await
        .unwrap_err();

    assert!(err.message.contains("argument 1 must be string, got u64"));
    assert_eq!(observer.statuses(), vec![TxStatus::Failed]);
}

#[tokio::test]
async fn test_missing_caller_with_valid_args_reports_failed() {
    let node = Arc::new(MockLedgerNode::new());
    let wallet = Arc::new(MockWallet::approving());
    let observer = RecordingObserver::new();

    let err = feedback_client(&node, &wallet)
        .invoke(
            Some("   "),
            "send_feedback",
            vec![string_to_scval("gg").unwrap()],
            Some(&observer),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::WalletNotFound);
    assert_eq!(observer.statuses(), vec![TxStatus::Failed]);
    assert_eq!(node.total_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_valid_call_after_rejected_one_is_unaffected() {
    let node = Arc::new(MockLedgerNode::new().with_poll_script(vec![
        crate::types::TransactionStatusResponse::success(Some(ScVal::U64(5))),
    ]));
    let wallet = Arc::new(MockWallet::approving());
    let client = feedback_client(&node, &wallet);

    let rejected = RecordingObserver::new();
    assert!(client
        .invoke(Some(TEST_CALLER), "send_feedback", vec![], Some(&rejected))
        .await
        .is_err());

    let observer = RecordingObserver::new();
    let outcome = client
        .invoke(
            Some(TEST_CALLER),
            "send_feedback",
            vec![string_to_scval("gg").unwrap()],
            Some(&observer),
        )
        .await
        .unwrap();
    assert_eq!(outcome.decode::<u64>().unwrap(), Some(5));
    assert_eq!(observer.last(), Some(TxStatus::Success));
    assert_eq!(rejected.statuses(), vec![TxStatus::Failed]);
}
