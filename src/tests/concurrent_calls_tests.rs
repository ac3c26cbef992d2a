//! Concurrent calls on one orchestrator instance

use std::sync::Arc;

use futures::future::join_all;

use crate::codec::ScVal;
use crate::errors::ErrorKind;
use crate::orchestrator::{CallOrchestrator, EngineSettings};
use crate::status::TxStatus;
use crate::test_utils::{MockLedgerNode, MockWallet, RecordingObserver, TEST_CALLER, TEST_CONTRACT};
use crate::types::{CallRequest, TransactionStatusResponse};

#[tokio::test(start_paused = true)]
async fn test_each_call_has_its_own_status_stream() {
    let node = Arc::new(MockLedgerNode::new().with_poll_script(vec![
        TransactionStatusResponse::success(Some(ScVal::U64(1))),
        TransactionStatusResponse::success(Some(ScVal::U64(2))),
        TransactionStatusResponse::success(Some(ScVal::U64(3))),
    ]));
    let engine = CallOrchestrator::new(
        node.clone(),
        Arc::new(MockWallet::approving()),
        EngineSettings::default(),
    );
    let observers: Vec<RecordingObserver> = (0..3).map(|_| RecordingObserver::new()).collect();

    let calls = observers.iter().map(|observer| {
        let engine = engine.clone();
        async move {
            let request = CallRequest::new(
                TEST_CONTRACT,
                "get_total_count",
                (),
                Some(TEST_CALLER.to_string()),
            );
            engine.call(request, Some(observer)).await
        }
    });
    let results = join_all(calls).await;

    let mut values: Vec<u64> = results
        .into_iter()
        .map(|r| r.unwrap().decode::<u64>().unwrap().unwrap())
        .collect();
    values.sort_unstable();
    assert_eq!(values, vec![1, 2, 3]);

    for observer in &observers {
        assert_eq!(
            observer.statuses(),
            vec![
                TxStatus::Preparing,
                TxStatus::Signing,
                TxStatus::Submitting,
                TxStatus::Pending,
                TxStatus::Success,
            ]
        );
    }
    assert_eq!(node.send_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_one_failure_does_not_leak_into_siblings() {
    let node = Arc::new(MockLedgerNode::new().with_poll_script(vec![
        TransactionStatusResponse::success(Some(ScVal::Bool(true))),
    ]));
    let engine = CallOrchestrator::new(
        node,
        Arc::new(MockWallet::approving()),
        EngineSettings::default(),
    );
    let ok_observer = RecordingObserver::new();
    let no_wallet_observer = RecordingObserver::new();

    let with_caller = CallRequest::new(
        TEST_CONTRACT,
        "is_club_registered",
        ScVal::U64(1),
        Some(TEST_CALLER.to_string()),
    );
    let without_caller = CallRequest::new(TEST_CONTRACT, "is_club_registered", ScVal::U64(1), None);

    let (ok, err) = tokio::join!(
        engine.call(with_caller, Some(&ok_observer)),
        engine.call(without_caller, Some(&no_wallet_observer)),
    );

    assert_eq!(ok.unwrap().value, Some(serde_json::json!(true)));
    assert_eq!(err.unwrap_err().kind, ErrorKind::WalletNotFound);
    assert_eq!(ok_observer.last(), Some(TxStatus::Success));
    assert_eq!(no_wallet_observer.statuses(), vec![TxStatus::Failed]);
}

#[tokio::test(start_paused = true)]
async fn test_spawned_calls_share_one_engine() {
    let node = Arc::new(MockLedgerNode::new().with_poll_script(vec![
        TransactionStatusResponse::success(None),
        TransactionStatusResponse::success(None),
    ]));
    let engine = CallOrchestrator::new(
        node.clone(),
        Arc::new(MockWallet::approving()),
        EngineSettings::default(),
    );

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let observer = RecordingObserver::new();
                let request = CallRequest::new(
                    TEST_CONTRACT,
                    "get_total_count",
                    (),
                    Some(TEST_CALLER.to_string()),
                );
                let result = engine.call(request, Some(&observer)).await;
                (result, observer.statuses())
            })
        })
        .collect();

    for handle in handles {
        let (result, statuses) = handle.await.unwrap();
        assert!(result.is_ok());
        assert_eq!(statuses.last(), Some(&TxStatus::Success));
    }
    assert_eq!(node.account_calls(), 2);
}
