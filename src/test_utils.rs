//! Test Utilities Module
//!
//! Deterministic stand-ins for the remote ledger node and the external signer,
//! plus an observer that records every status transition.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use stellar_xdr::curr::{Limits, ReadXdr, Signature, SignatureHint, SorobanTransactionData};

use crate::config::CallPolicy;
use crate::rpc_manager::{LedgerNode, NodeError};
use crate::status::{StatusObserver, TxStatus};
use crate::tx_builder::{
    DecoratedSignature, EnvelopeExt, SignedEnvelope, TransactionBuilder, TransactionEnvelope,
};
use crate::types::{
    AccountState, CallArgs, SendStatus, SimulationResponse, SubmissionReceipt,
    TransactionStatusResponse,
};
use crate::wallet::{RejectionReason, WalletError, WalletSigner};

pub const TEST_PASSPHRASE: &str = "Test SDF Network ; September 2015";
pub const TEST_CALLER: &str = "GAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQDZ7H";
pub const TEST_CONTRACT: &str = "CADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQP5KR";

/// Default sequence reported for accounts without an explicit entry
const DEFAULT_SEQUENCE: i64 = 100;

/// Scripted ledger node
///
/// Every account exists unless configured otherwise, simulation succeeds,
/// sends are accepted as `PENDING`, and status queries answer from a script,
/// falling back to `NOT_FOUND` once the script is exhausted.
#[derive(Debug, Default)]
pub struct MockLedgerNode {
    accounts: HashMap<String, i64>,
    missing_account: bool,
    simulation_error: Option<String>,
    min_resource_fee: u64,
    send_status: Option<SendStatus>,
    send_transport_error: bool,
    reported_hash: Option<String>,
    poll_script: Mutex<VecDeque<TransactionStatusResponse>>,
    poll_transport_errors: AtomicUsize,

    account_calls: AtomicUsize,
    simulate_calls: AtomicUsize,
    send_calls: AtomicUsize,
    poll_calls: AtomicUsize,
}

impl MockLedgerNode {
    pub fn new() -> Self {
        Self {
            min_resource_fee: 1_000,
            ..Default::default()
        }
    }

    pub fn with_account(mut self, address: &str, sequence: i64) -> Self {
        self.accounts.insert(address.to_string(), sequence);
        self
    }

    /// Every account lookup fails with not-found
    pub fn with_missing_account(mut self) -> Self {
        self.missing_account = true;
        self
    }

    pub fn with_simulation_error(mut self, error: &str) -> Self {
        self.simulation_error = Some(error.to_string());
        self
    }

    pub fn with_send_status(mut self, status: SendStatus) -> Self {
        self.send_status = Some(status);
        self
    }

    pub fn with_send_transport_error(mut self) -> Self {
        self.send_transport_error = true;
        self
    }

    /// Hash the node reports on send; defaults to the envelope's own hash
    pub fn with_reported_hash(mut self, hash: &str) -> Self {
        self.reported_hash = Some(hash.to_string());
        self
    }

    pub fn with_poll_script(self, script: Vec<TransactionStatusResponse>) -> Self {
        *self.poll_script.lock() = script.into();
        self
    }

    /// The first `count` status queries fail at the transport level
    pub fn with_poll_transport_errors(self, count: usize) -> Self {
        self.poll_transport_errors.store(count, Ordering::SeqCst);
        self
    }

    pub fn account_calls(&self) -> usize {
        self.account_calls.load(Ordering::SeqCst)
    }

    pub fn simulate_calls(&self) -> usize {
        self.simulate_calls.load(Ordering::SeqCst)
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.account_calls() + self.simulate_calls() + self.send_calls() + self.poll_calls()
    }
}

#[async_trait]
impl LedgerNode for MockLedgerNode {
    async fn get_account(&self, address: &str) -> Result<AccountState, NodeError> {
        self.account_calls.fetch_add(1, Ordering::SeqCst);
        if self.missing_account {
            return Err(NodeError::AccountNotFound {
                account: address.to_string(),
            });
        }
        Ok(AccountState {
            account_id: address.to_string(),
            sequence: self.accounts.get(address).copied().unwrap_or(DEFAULT_SEQUENCE),
        })
    }

    async fn simulate_transaction(
        &self,
        _envelope: &TransactionEnvelope,
    ) -> Result<SimulationResponse, NodeError> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        let resource_fee = i64::try_from(self.min_resource_fee).unwrap_or(i64::MAX);
        Ok(SimulationResponse {
            min_resource_fee: self.min_resource_fee,
            transaction_data: Some(soroban_data(250_000, resource_fee)),
            auth: Vec::new(),
            error: self.simulation_error.clone(),
        })
    }

    async fn send_transaction(
        &self,
        envelope: &SignedEnvelope,
    ) -> Result<SubmissionReceipt, NodeError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        if self.send_transport_error {
            return Err(NodeError::Transport {
                endpoint: "mock://node".to_string(),
                message: "connection reset".to_string(),
            });
        }
        let status = self.send_status.unwrap_or(SendStatus::Pending);
        Ok(SubmissionReceipt {
            transaction_hash: self
                .reported_hash
                .clone()
                .unwrap_or_else(|| envelope.hash().to_string()),
            initial_status: status,
            error_detail: (status == SendStatus::Error).then(|| "txBadSeq".to_string()),
        })
    }

    async fn get_transaction(&self, _hash: &str) -> Result<TransactionStatusResponse, NodeError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .poll_transport_errors
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(NodeError::Timeout {
                endpoint: "mock://node".to_string(),
                timeout_ms: 30_000,
            });
        }
        Ok(self
            .poll_script
            .lock()
            .pop_front()
            .unwrap_or_else(TransactionStatusResponse::pending))
    }
}

#[derive(Debug, Clone)]
enum WalletBehavior {
    Approve,
    Reject(RejectionReason),
    Fail(String),
}

/// Scripted signer
#[derive(Debug)]
pub struct MockWallet {
    behavior: WalletBehavior,
    calls: AtomicUsize,
    last_signer: Mutex<Option<String>>,
}

impl MockWallet {
    fn with_behavior(behavior: WalletBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_signer: Mutex::new(None),
        }
    }

    /// Appends a dummy signature to whatever it is given
    pub fn approving() -> Self {
        Self::with_behavior(WalletBehavior::Approve)
    }

    pub fn rejecting(reason: RejectionReason) -> Self {
        Self::with_behavior(WalletBehavior::Reject(reason))
    }

    /// Fails with an unstructured message
    pub fn failing(message: &str) -> Self {
        Self::with_behavior(WalletBehavior::Fail(message.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_signer(&self) -> Option<String> {
        self.last_signer.lock().clone()
    }
}

#[async_trait]
impl WalletSigner for MockWallet {
    async fn sign_transaction(
        &self,
        envelope_wire: &str,
        _network_passphrase: &str,
        signer: &str,
    ) -> Result<String, WalletError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_signer.lock() = Some(signer.to_string());
        match &self.behavior {
            WalletBehavior::Approve => sign_wire(envelope_wire),
            WalletBehavior::Reject(reason) => Err(WalletError::Rejected { reason: *reason }),
            WalletBehavior::Fail(message) => Err(WalletError::Failed(message.clone())),
        }
    }
}

fn sign_wire(envelope_wire: &str) -> Result<String, WalletError> {
    let mut envelope = TransactionEnvelope::from_wire(envelope_wire)
        .map_err(|e| WalletError::Failed(e.to_string()))?;
    envelope
        .push_signature(dummy_signature([0xde, 0xad, 0xbe, 0xef], 7))
        .map_err(|e| WalletError::Failed(e.to_string()))?;
    envelope
        .to_wire()
        .map_err(|e| WalletError::Failed(e.to_string()))
}

/// Observer that records every transition it sees
#[derive(Debug, Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<TxStatus>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<TxStatus> {
        self.seen.lock().clone()
    }

    pub fn last(&self) -> Option<TxStatus> {
        self.seen.lock().last().copied()
    }
}

impl StatusObserver for RecordingObserver {
    fn on_status(&self, status: TxStatus) {
        self.seen.lock().push(status);
    }
}

/// A prepared, signed envelope for tests that start at submission
pub fn signed_fixture() -> SignedEnvelope {
    let account = AccountState {
        account_id: TEST_CALLER.to_string(),
        sequence: DEFAULT_SEQUENCE,
    };
    let policy = CallPolicy::default();
    let mut envelope = match TransactionBuilder::new(&account, &policy)
        .invoke(TEST_CONTRACT, "get_total_count", CallArgs::None)
        .and_then(|b| b.build_at(0))
    {
        Ok(envelope) => envelope,
        Err(e) => panic!("fixture envelope: {}", e),
    };
    if let Err(e) = envelope.push_signature(dummy_signature([0; 4], 1)) {
        panic!("fixture signature: {}", e);
    }
    match SignedEnvelope::new(envelope, TEST_PASSPHRASE.to_string()) {
        Ok(signed) => signed,
        Err(e) => panic!("fixture hash: {}", e),
    }
}

/// A 64-byte signature filled with `fill`; never verified by the mocks
pub fn dummy_signature(hint: [u8; 4], fill: u8) -> DecoratedSignature {
    let bytes = match vec![fill; 64].try_into() {
        Ok(bytes) => bytes,
        Err(e) => panic!("fixture signature bytes: {}", e),
    };
    DecoratedSignature {
        hint: SignatureHint(hint),
        signature: Signature(bytes),
    }
}

/// Soroban transaction data with an empty footprint, decoded from its XDR
/// layout: ext, two empty key lists, instructions, read and write bytes,
/// resource fee.
pub fn soroban_data(instructions: u32, resource_fee: i64) -> SorobanTransactionData {
    let mut bytes = Vec::with_capacity(32);
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes.extend_from_slice(&instructions.to_be_bytes());
    bytes.extend_from_slice(&1_024u32.to_be_bytes());
    bytes.extend_from_slice(&256u32.to_be_bytes());
    bytes.extend_from_slice(&resource_fee.to_be_bytes());
    match SorobanTransactionData::from_xdr(bytes, Limits::none()) {
        Ok(data) => data,
        Err(e) => panic!("fixture transaction data: {}", e),
    }
}
