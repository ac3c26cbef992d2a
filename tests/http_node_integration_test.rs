//! Integration tests for the HTTP JSON-RPC ledger node
//!
//! This test validates:
//! - Request/response mapping for every node method
//! - Error mapping (not found, RPC errors, HTTP failures)
//! - A full call pipeline against a mocked node

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use ledger_call::codec::{self, Address, ScVal};
use ledger_call::config::CallPolicy;
use ledger_call::rpc_manager::{HttpLedgerNode, LedgerNode, NodeError};
use ledger_call::tx_builder::{
    DecoratedSignature, EnvelopeExt, SignedEnvelope, TransactionBuilder, TransactionEnvelope,
};
use ledger_call::types::{AccountState, LedgerTxStatus, SendStatus};
use ledger_call::wallet::{WalletError, WalletSigner};
use ledger_call::{CallOrchestrator, CallRequest, EngineSettings, ErrorKind, TxStatus};
use stellar_xdr::curr::{
    AccountEntry, AccountEntryExt, AccountId, LedgerEntryData, LedgerKey, Limits, PublicKey,
    ReadXdr, SequenceNumber, Signature, SignatureHint, SorobanTransactionData, String32, StringM,
    Thresholds, Uint256, VecM, WriteXdr,
};

const PASSPHRASE: &str = "Test SDF Network ; September 2015";
const CALLER: &str = "GAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQDZ7H";
const CONTRACT: &str = "CADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQP5KR";

/// Signs by appending a fixed signature to the envelope it is given
struct StaticWallet;

#[async_trait]
impl WalletSigner for StaticWallet {
    async fn sign_transaction(
        &self,
        envelope_wire: &str,
        _network_passphrase: &str,
        _signer: &str,
    ) -> Result<String, WalletError> {
        let mut envelope = TransactionEnvelope::from_wire(envelope_wire)
            .map_err(|e| WalletError::Failed(e.to_string()))?;
        let signature = Signature(
            vec![9u8; 64]
                .try_into()
                .map_err(|_| WalletError::Failed("signature length".into()))?,
        );
        envelope
            .push_signature(DecoratedSignature {
                hint: SignatureHint([1, 2, 3, 4]),
                signature,
            })
            .map_err(|e| WalletError::Failed(e.to_string()))?;
        envelope.to_wire().map_err(|e| WalletError::Failed(e.to_string()))
    }
}

fn node_for(server: &ServerGuard) -> HttpLedgerNode {
    HttpLedgerNode::new(server.url(), Duration::from_secs(5)).unwrap()
}

fn rpc_result(result: serde_json::Value) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
}

fn rpc_error(code: i64, message: &str) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": code, "message": message } }).to_string()
}

fn method(name: &str) -> Matcher {
    Matcher::PartialJson(json!({ "jsonrpc": "2.0", "method": name }))
}

fn account_entry(sequence: i64) -> String {
    let key = *Address::parse(CALLER).unwrap().key();
    let entry = LedgerEntryData::Account(AccountEntry {
        account_id: AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(key))),
        balance: 100_000_000,
        seq_num: SequenceNumber(sequence),
        num_sub_entries: 0,
        inflation_dest: None,
        flags: 0,
        home_domain: String32(StringM::default()),
        thresholds: Thresholds([1, 0, 0, 0]),
        signers: VecM::default(),
        ext: AccountEntryExt::V0,
    });
    codec::encode_xdr(&entry).unwrap()
}

fn ledger_entries(sequence: i64) -> serde_json::Value {
    json!({
        "entries": [{ "key": "", "xdr": account_entry(sequence), "lastModifiedLedgerSeq": 1 }],
        "latestLedger": 2,
    })
}

/// ext, empty read-only and read-write footprints, instructions, read bytes,
/// write bytes, resource fee
fn transaction_data(instructions: u32, resource_fee: i64) -> String {
    let mut bytes = Vec::new();
    for word in [0u32, 0, 0, instructions, 2048, 512] {
        bytes.extend_from_slice(&word.to_be_bytes());
    }
    bytes.extend_from_slice(&resource_fee.to_be_bytes());
    let data = SorobanTransactionData::from_xdr(bytes, Limits::none()).unwrap();
    codec::encode_xdr(&data).unwrap()
}

/// V3 transaction meta with no ledger changes, carrying `value` as the
/// Soroban return value
fn result_meta(value: &ScVal) -> String {
    let mut bytes = Vec::new();
    // meta v3, ext, before, operations, after, soroban meta present
    for word in [3u32, 0, 0, 0, 0, 1] {
        bytes.extend_from_slice(&word.to_be_bytes());
    }
    // soroban meta ext, no events
    for word in [0u32, 0] {
        bytes.extend_from_slice(&word.to_be_bytes());
    }
    bytes.extend_from_slice(&value.to_xdr(Limits::none()).unwrap());
    // no diagnostic events
    bytes.extend_from_slice(&0u32.to_be_bytes());
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn unsigned_envelope() -> TransactionEnvelope {
    let account = AccountState {
        account_id: CALLER.to_string(),
        sequence: 7,
    };
    let policy = CallPolicy::default();
    TransactionBuilder::new(&account, &policy)
        .invoke(CONTRACT, "get_total_count", ().into())
        .and_then(|b| b.build_at(1_700_000_000))
        .unwrap()
}

#[tokio::test]
async fn test_get_account_reads_ledger_entry() {
    let key = LedgerKey::Account(stellar_xdr::curr::LedgerKeyAccount {
        account_id: AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(
            *Address::parse(CALLER).unwrap().key(),
        ))),
    });
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "method": "getLedgerEntries",
            "params": { "keys": [codec::encode_xdr(&key).unwrap()] },
        })))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(ledger_entries(123456)))
        .create_async()
        .await;

    let account = node_for(&server).get_account(CALLER).await.unwrap();
    assert_eq!(account.account_id, CALLER);
    assert_eq!(account.sequence, 123456);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_account_maps_to_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/")
        .match_body(method("getLedgerEntries"))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!({ "entries": null, "latestLedger": 2 })))
        .create_async()
        .await;

    let err = node_for(&server).get_account(CALLER).await.unwrap_err();
    assert_eq!(
        err,
        NodeError::AccountNotFound {
            account: CALLER.to_string()
        }
    );
}

#[tokio::test]
async fn test_http_failure_is_transport_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/")
        .with_status(503)
        .create_async()
        .await;

    let err = node_for(&server).get_transaction("ab").await.unwrap_err();
    assert!(matches!(err, NodeError::Transport { .. }), "got {:?}", err);
    assert_eq!(err.endpoint(), Some(server.url().as_str()));
}

#[tokio::test]
async fn test_rpc_error_object_is_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/")
        .match_body(method("getLedgerEntries"))
        .with_header("content-type", "application/json")
        .with_body(rpc_error(-32602, "invalid ledger key"))
        .create_async()
        .await;

    let err = node_for(&server).get_account(CALLER).await.unwrap_err();
    assert_eq!(
        err,
        NodeError::RpcResponse {
            code: Some(-32602),
            message: "invalid ledger key".to_string()
        }
    );
}

#[tokio::test]
async fn test_simulation_reports_fee_and_transaction_data() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/")
        .match_body(method("simulateTransaction"))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!({
            "minResourceFee": "58181",
            "transactionData": transaction_data(1_000_000, 58181),
            "results": [{ "auth": [], "xdr": codec::encode_xdr(&ScVal::Void).unwrap() }],
            "latestLedger": 2,
        })))
        .create_async()
        .await;

    let simulation = node_for(&server)
        .simulate_transaction(&unsigned_envelope())
        .await
        .unwrap();
    assert_eq!(simulation.min_resource_fee, 58181);
    let data = simulation.transaction_data.unwrap();
    assert_eq!(data.resources.instructions, 1_000_000);
    assert_eq!(data.resource_fee, 58181);
    assert!(simulation.auth.is_empty());
    assert!(simulation.error.is_none());
}

#[tokio::test]
async fn test_simulation_error_is_reported_not_raised() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/")
        .match_body(method("simulateTransaction"))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!({ "error": "HostError: contract trapped" })))
        .create_async()
        .await;

    let simulation = node_for(&server)
        .simulate_transaction(&unsigned_envelope())
        .await
        .unwrap();
    assert_eq!(simulation.error.as_deref(), Some("HostError: contract trapped"));
}

#[tokio::test]
async fn test_send_and_get_transaction() {
    let signed = SignedEnvelope::new(unsigned_envelope(), PASSPHRASE.to_string()).unwrap();
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "method": "sendTransaction",
            "params": { "transaction": signed.to_wire().unwrap() },
        })))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!({ "status": "PENDING", "hash": signed.hash() })))
        .create_async()
        .await;
    server
        .mock("POST", "/")
        .match_body(method("getTransaction"))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!({
            "status": "SUCCESS",
            "ledger": 4242,
            "resultMetaXdr": result_meta(&ScVal::U64(9)),
        })))
        .create_async()
        .await;

    let node = node_for(&server);
    let receipt = node.send_transaction(&signed).await.unwrap();
    assert_eq!(receipt.initial_status, SendStatus::Pending);
    assert_eq!(receipt.transaction_hash, signed.hash());

    let status = node.get_transaction(signed.hash()).await.unwrap();
    assert_eq!(status.status, LedgerTxStatus::Success);
    assert_eq!(status.return_value, Some(ScVal::U64(9)));
    assert_eq!(status.ledger, Some(4242));
}

#[tokio::test]
async fn test_full_call_against_mocked_node() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/")
        .match_body(method("getLedgerEntries"))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(ledger_entries(10)))
        .create_async()
        .await;
    server
        .mock("POST", "/")
        .match_body(method("simulateTransaction"))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!({
            "minResourceFee": "900",
            "transactionData": transaction_data(50_000, 900),
        })))
        .create_async()
        .await;
    let send = server
        .mock("POST", "/")
        .match_body(method("sendTransaction"))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!({ "status": "PENDING", "hash": "" })))
        .expect(1)
        .create_async()
        .await;
    server
        .mock("POST", "/")
        .match_body(method("getTransaction"))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!({
            "status": "SUCCESS",
            "ledger": 11,
            "resultMetaXdr": result_meta(&ScVal::U64(3)),
        })))
        .create_async()
        .await;

    let settings = EngineSettings::default().with_policy(
        CallPolicy::default()
            .with_poll_interval(Duration::from_millis(10))
            .with_max_poll_attempts(3),
    );
    let engine = CallOrchestrator::new(Arc::new(node_for(&server)), Arc::new(StaticWallet), settings);

    let statuses = parking_lot::Mutex::new(Vec::new());
    let observer = |status: TxStatus| statuses.lock().push(status);
    let request = CallRequest::new(CONTRACT, "get_total_count", (), Some(CALLER.to_string()));

    let outcome = engine.call(request, Some(&observer)).await.unwrap();
    assert_eq!(outcome.decode::<u64>().unwrap(), Some(3));
    assert_eq!(outcome.ledger, Some(11));
    assert_eq!(outcome.poll_attempts, 1);
    assert_eq!(outcome.transaction_hash.len(), 64);
    assert_eq!(statuses.lock().last(), Some(&TxStatus::Success));
    send.assert_async().await;
}

#[tokio::test]
async fn test_full_call_with_unfunded_account() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/")
        .match_body(method("getLedgerEntries"))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!({ "entries": [], "latestLedger": 2 })))
        .create_async()
        .await;
    let simulate = server
        .mock("POST", "/")
        .match_body(method("simulateTransaction"))
        .expect(0)
        .create_async()
        .await;

    let engine = CallOrchestrator::new(
        Arc::new(node_for(&server)),
        Arc::new(StaticWallet),
        EngineSettings::default(),
    );
    let request = CallRequest::new(CONTRACT, "get_total_count", (), Some(CALLER.to_string()));

    let err = engine.call(request, None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InsufficientBalance);
    simulate.assert_async().await;
}
