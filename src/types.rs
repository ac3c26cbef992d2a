//! Common types used throughout the call pipeline

use crate::codec::{CodecError, ScVal};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use stellar_xdr::curr::{SorobanAuthorizationEntry, SorobanTransactionData};

/// Argument list of one contract invocation.
///
/// Call-sites pass nothing, a single value or a list; all three shapes are
/// normalised into an ordered argument vector by [`CallArgs::into_vec`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CallArgs {
    #[default]
    None,
    Single(ScVal),
    Many(Vec<ScVal>),
}

impl CallArgs {
    pub fn into_vec(self) -> Vec<ScVal> {
        match self {
            CallArgs::None => Vec::new(),
            CallArgs::Single(value) => vec![value],
            CallArgs::Many(values) => values,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CallArgs::None => 0,
            CallArgs::Single(_) => 1,
            CallArgs::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the normalised arguments without consuming them
    pub fn iter(&self) -> std::slice::Iter<'_, ScVal> {
        match self {
            CallArgs::None => {
                let empty: &'static [ScVal] = &[];
                empty.iter()
            }
            CallArgs::Single(value) => std::slice::from_ref(value).iter(),
            CallArgs::Many(values) => values.iter(),
        }
    }
}

impl From<()> for CallArgs {
    fn from(_: ()) -> Self {
        CallArgs::None
    }
}

impl From<ScVal> for CallArgs {
    fn from(value: ScVal) -> Self {
        CallArgs::Single(value)
    }
}

impl From<Option<ScVal>> for CallArgs {
    fn from(value: Option<ScVal>) -> Self {
        match value {
            Some(v) => CallArgs::Single(v),
            None => CallArgs::None,
        }
    }
}

impl From<Vec<ScVal>> for CallArgs {
    fn from(values: Vec<ScVal>) -> Self {
        CallArgs::Many(values)
    }
}

/// One contract invocation, immutable once built
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub contract_address: String,
    pub function_name: String,
    pub args: CallArgs,
    /// Signer/source account. `None` or empty means no wallet is connected.
    pub caller: Option<String>,
}

impl CallRequest {
    pub fn new(
        contract_address: impl Into<String>,
        function_name: impl Into<String>,
        args: impl Into<CallArgs>,
        caller: Option<String>,
    ) -> Self {
        Self {
            contract_address: contract_address.into(),
            function_name: function_name.into(),
            args: args.into(),
            caller,
        }
    }

    /// Caller address if one was supplied and is non-blank
    pub fn caller(&self) -> Option<&str> {
        self.caller
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// On-ledger account state needed to build a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub account_id: String,
    pub sequence: i64,
}

/// Broadcast status returned by `sendTransaction`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendStatus {
    Pending,
    Duplicate,
    TryAgainLater,
    Error,
}

/// Result of broadcasting a signed envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub transaction_hash: String,
    pub initial_status: SendStatus,
    /// Node-provided detail when `initial_status` is `Error`
    pub error_detail: Option<String>,
}

/// Status reported by `getTransaction`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerTxStatus {
    Success,
    Failed,
    NotFound,
}

/// One confirmation-status query result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionStatusResponse {
    pub status: LedgerTxStatus,
    pub return_value: Option<ScVal>,
    pub ledger: Option<u32>,
}

impl TransactionStatusResponse {
    pub fn pending() -> Self {
        Self {
            status: LedgerTxStatus::NotFound,
            return_value: None,
            ledger: None,
        }
    }

    pub fn success(return_value: Option<ScVal>) -> Self {
        Self {
            status: LedgerTxStatus::Success,
            return_value,
            ledger: Some(1),
        }
    }

    pub fn failed() -> Self {
        Self {
            status: LedgerTxStatus::Failed,
            return_value: None,
            ledger: Some(1),
        }
    }
}

/// Dry-run result returned by `simulateTransaction`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimulationResponse {
    pub min_resource_fee: u64,
    /// Footprint and resource limits to attach before signing
    pub transaction_data: Option<SorobanTransactionData>,
    /// Authorization entries recorded for the invocation
    pub auth: Vec<SorobanAuthorizationEntry>,
    pub error: Option<String>,
}

/// Terminal success value of one call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallOutcome {
    /// Native form of the return value; `None` for side-effect-only functions
    pub value: Option<serde_json::Value>,
    #[serde(skip)]
    pub return_value: Option<ScVal>,
    pub transaction_hash: String,
    pub ledger: Option<u32>,
    pub poll_attempts: u32,
}

impl CallOutcome {
    /// Deserialize the native return value into a typed shape
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>, CodecError> {
        self.value
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| CodecError::Wire(format!("unexpected return shape: {}", e)))
    }

    pub fn explorer_url(&self, base_url: &str) -> String {
        explorer_url(base_url, &self.transaction_hash)
    }
}

/// Link to an external transaction lookup page
pub fn explorer_url(base_url: &str, hash: &str) -> String {
    format!("{}/tx/{}", base_url.trim_end_matches('/'), hash)
}
