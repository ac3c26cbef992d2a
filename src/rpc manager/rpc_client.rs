//! HTTP JSON-RPC ledger node
//!
//! Speaks Soroban RPC (JSON-RPC 2.0) over a single shared `reqwest::Client`:
//! `getLedgerEntries` for account state, `simulateTransaction`,
//! `sendTransaction` and `getTransaction`. Envelopes, ledger keys and results
//! travel as base64 XDR.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use stellar_xdr::curr::{
    AccountId, LedgerEntryData, LedgerKey, LedgerKeyAccount, PublicKey, ScVal,
    SorobanAuthorizationEntry, SorobanTransactionData, TransactionMeta, TransactionResult,
    Uint256,
};
use tracing::{debug, trace, warn};

use super::{LedgerNode, NodeError};
use crate::codec::{self, Address, AddressKind};
use crate::config::NodeConfig;
use crate::tx_builder::{EnvelopeExt, SignedEnvelope, TransactionEnvelope};
use crate::types::{
    AccountState, LedgerTxStatus, SendStatus, SimulationResponse, SubmissionReceipt,
    TransactionStatusResponse,
};

#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct LedgerEntriesResult {
    #[serde(default)]
    entries: Option<Vec<LedgerEntryResult>>,
}

#[derive(Debug, Deserialize)]
struct LedgerEntryResult {
    xdr: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResult {
    #[serde(default)]
    min_resource_fee: Option<String>,
    #[serde(default)]
    transaction_data: Option<String>,
    #[serde(default)]
    results: Option<Vec<SimulateHostFunctionResult>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SimulateHostFunctionResult {
    #[serde(default)]
    auth: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResult {
    status: SendStatus,
    hash: String,
    #[serde(default)]
    error_result_xdr: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetTransactionResult {
    status: LedgerTxStatus,
    #[serde(default)]
    result_meta_xdr: Option<String>,
    #[serde(default)]
    ledger: Option<u32>,
}

/// Ledger node reached over HTTP JSON-RPC
#[derive(Debug)]
pub struct HttpLedgerNode {
    http: Client,
    endpoint: String,
    timeout_ms: u64,
    next_id: AtomicU64,
}

impl HttpLedgerNode {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, NodeError> {
        let endpoint = endpoint.into();
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeError::Transport {
                endpoint: endpoint.clone(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            endpoint,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &NodeConfig) -> Result<Self, NodeError> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<R, NodeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!(method, id, "JSON-RPC request");

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NodeError::from_reqwest(e, &self.endpoint, self.timeout_ms))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NodeError::Transport {
                endpoint: self.endpoint.clone(),
                message: format!("HTTP {}", status),
            });
        }

        let body: RpcResponse<R> = resp
            .json()
            .await
            .map_err(|e| NodeError::InvalidResponse(format!("{}: {}", method, e)))?;

        match (body.result, body.error) {
            (_, Some(err)) => Err(NodeError::RpcResponse {
                code: err.code,
                message: err.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(NodeError::InvalidResponse(format!(
                "{}: neither result nor error present",
                method
            ))),
        }
    }
}

fn envelope_param(envelope: &TransactionEnvelope) -> Result<serde_json::Value, NodeError> {
    let wire = envelope
        .to_wire()
        .map_err(|e| NodeError::Encoding(e.to_string()))?;
    Ok(json!({ "transaction": wire }))
}

fn account_key(address: &str) -> Result<String, NodeError> {
    let account = Address::parse(address)
        .ok()
        .filter(|a| a.kind() == AddressKind::Account)
        .ok_or_else(|| NodeError::Encoding(format!("not an account address: {}", address)))?;
    let key = LedgerKey::Account(LedgerKeyAccount {
        account_id: AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(*account.key()))),
    });
    codec::encode_xdr(&key).map_err(|e| NodeError::Encoding(e.to_string()))
}

fn decode_field<T: stellar_xdr::curr::ReadXdr>(field: &str, encoded: &str) -> Result<T, NodeError> {
    codec::decode_xdr(encoded).map_err(|e| NodeError::InvalidResponse(format!("{}: {}", field, e)))
}

/// Return value of a confirmed invocation.
///
/// Meta versions without Soroban return data decode to `None`, as does meta
/// this client cannot parse; the call itself has still succeeded.
fn return_value_from_meta(encoded: &str) -> Option<ScVal> {
    match codec::decode_xdr::<TransactionMeta>(encoded) {
        Ok(TransactionMeta::V3(meta)) => meta.soroban_meta.map(|m| m.return_value),
        Ok(TransactionMeta::V4(meta)) => meta.soroban_meta.and_then(|m| m.return_value),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "Could not decode resultMetaXdr; return value dropped");
            None
        }
    }
}

/// `txBadSeq`-style name of a failed submission's result code
fn describe_error_result(encoded: &str) -> String {
    match codec::decode_xdr::<TransactionResult>(encoded) {
        Ok(result) => {
            let name = result.result.name();
            let mut chars = name.chars();
            match chars.next() {
                Some(first) => first.to_lowercase().chain(chars).collect(),
                None => encoded.to_string(),
            }
        }
        Err(_) => encoded.to_string(),
    }
}

#[async_trait]
impl LedgerNode for HttpLedgerNode {
    async fn get_account(&self, address: &str) -> Result<AccountState, NodeError> {
        let key = account_key(address)?;
        let result: LedgerEntriesResult = self
            .call("getLedgerEntries", json!({ "keys": [key] }))
            .await?;

        let entry = result
            .entries
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| NodeError::AccountNotFound {
                account: address.to_string(),
            })?;

        let sequence = match decode_field::<LedgerEntryData>("entries[0].xdr", &entry.xdr)? {
            LedgerEntryData::Account(account) => account.seq_num.0,
            other => {
                return Err(NodeError::InvalidResponse(format!(
                    "expected an account entry, got {}",
                    other.name()
                )))
            }
        };
        debug!(account = %address, sequence, "Loaded account");

        Ok(AccountState {
            account_id: address.trim().to_string(),
            sequence,
        })
    }

    async fn simulate_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SimulationResponse, NodeError> {
        let result: SimulateResult = self
            .call("simulateTransaction", envelope_param(envelope)?)
            .await?;

        if let Some(error) = result.error {
            return Ok(SimulationResponse {
                error: Some(error),
                ..Default::default()
            });
        }

        let min_resource_fee = match result.min_resource_fee.as_deref() {
            Some(fee) => fee
                .parse::<u64>()
                .map_err(|e| NodeError::InvalidResponse(format!("minResourceFee {:?}: {}", fee, e)))?,
            None => 0,
        };
        let transaction_data = result
            .transaction_data
            .as_deref()
            .filter(|data| !data.is_empty())
            .map(|data| decode_field::<SorobanTransactionData>("transactionData", data))
            .transpose()?;
        let auth = result
            .results
            .unwrap_or_default()
            .into_iter()
            .flat_map(|r| r.auth.unwrap_or_default())
            .map(|entry| decode_field::<SorobanAuthorizationEntry>("results[].auth", &entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SimulationResponse {
            min_resource_fee,
            transaction_data,
            auth,
            error: None,
        })
    }

    async fn send_transaction(
        &self,
        envelope: &SignedEnvelope,
    ) -> Result<SubmissionReceipt, NodeError> {
        let result: SendResult = self
            .call("sendTransaction", envelope_param(envelope.envelope())?)
            .await?;

        Ok(SubmissionReceipt {
            transaction_hash: result.hash,
            initial_status: result.status,
            error_detail: result.error_result_xdr.as_deref().map(describe_error_result),
        })
    }

    async fn get_transaction(&self, hash: &str) -> Result<TransactionStatusResponse, NodeError> {
        let result: GetTransactionResult = self
            .call("getTransaction", json!({ "hash": hash }))
            .await?;

        let return_value = result
            .result_meta_xdr
            .as_deref()
            .and_then(return_value_from_meta);

        Ok(TransactionStatusResponse {
            status: result.status,
            return_value,
            ledger: result.ledger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "GAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQDZ7H";

    #[test]
    fn test_account_key_is_ledger_key_xdr() {
        let key: LedgerKey = codec::decode_xdr(&account_key(ACCOUNT).unwrap()).unwrap();
        match key {
            LedgerKey::Account(LedgerKeyAccount {
                account_id: AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(bytes))),
            }) => assert_eq!(&bytes, Address::parse(ACCOUNT).unwrap().key()),
            other => panic!("unexpected key {:?}", other),
        }

        assert!(matches!(
            account_key("CBK6DMOHM7I7G3IDNQS7JAJOCJ4XVO5SLXP6KHQAWNVTKW5YHETSE5UA"),
            Err(NodeError::Encoding(_))
        ));
    }

    #[test]
    fn test_undecodable_meta_has_no_return_value() {
        assert_eq!(return_value_from_meta("AAAA"), None);
        assert_eq!(describe_error_result("junk"), "junk");
    }

    #[test]
    fn test_oversized_timeout_saturates() {
        let node = HttpLedgerNode::new("http://127.0.0.1:1", Duration::from_secs(u64::MAX)).unwrap();
        assert_eq!(node.timeout_ms, u64::MAX);

        let node = HttpLedgerNode::new("http://127.0.0.1:1", Duration::from_millis(1_500)).unwrap();
        assert_eq!(node.timeout_ms, 1_500);
    }

    #[test]
    fn test_response_without_result_field_parses() {
        let body: RpcResponse<LedgerEntriesResult> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"bad key"}}"#,
        )
        .unwrap();
        assert!(body.result.is_none());
        assert_eq!(body.error.unwrap().message, "bad key");
    }
}
