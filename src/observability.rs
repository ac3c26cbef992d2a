//! Call correlation
//!
//! Every contract call gets a [`TraceContext`]; each pipeline stage it enters
//! derives a child context so log lines of one call can be stitched back
//! together by `trace_id`, and stages ordered by `parent_span_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::TxStatus;

/// Identifier shared by every log line of one call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CallId(Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, enough to tell concurrent calls apart in logs
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `CADQ..P5KR` style abbreviation of a ledger address
fn abbreviate(address: &str) -> String {
    if address.len() <= 12 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}..{}", &address[..4], &address[address.len() - 4..])
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceContext {
    pub call_id: CallId,
    pub trace_id: Uuid,
    pub span_id: Uuid,
    pub parent_span_id: Option<Uuid>,
    /// `<contract>.<function>`, or `<contract>.<function>/<stage>` for a stage
    pub operation: String,
    pub started_at: DateTime<Utc>,
}

impl TraceContext {
    /// Root context for a call of `function` on `contract`
    pub fn for_call(contract: &str, function: &str) -> Self {
        Self {
            call_id: CallId::new(),
            trace_id: Uuid::new_v4(),
            span_id: Uuid::new_v4(),
            parent_span_id: None,
            operation: format!("{}.{}", abbreviate(contract), function),
            started_at: Utc::now(),
        }
    }

    /// Child context for one pipeline stage of this call
    pub fn stage(&self, status: TxStatus) -> Self {
        let root = self.operation.split('/').next().unwrap_or_default();
        Self {
            call_id: self.call_id,
            trace_id: self.trace_id,
            span_id: Uuid::new_v4(),
            parent_span_id: Some(self.span_id),
            operation: format!("{}/{}", root, status),
            started_at: Utc::now(),
        }
    }

    pub fn call_id(&self) -> CallId {
        self.call_id
    }

    /// Milliseconds since this context was created
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds().max(0)
    }
}
