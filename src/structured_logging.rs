//! Structured logging for call pipeline events

use crate::errors::{ClassifiedError, ErrorKind};
use crate::observability::TraceContext;
use crate::status::TxStatus;

/// Structured logger bound to one contract call.
///
/// Every line it emits carries the same `context_id`, plus the contract and
/// function being invoked.
#[derive(Debug, Clone)]
pub struct CallLogger {
    context_id: String,
    contract: String,
    function: String,
}

impl CallLogger {
    pub fn new(context: &TraceContext, contract: &str, function: &str) -> Self {
        Self {
            context_id: context.call_id().to_string(),
            contract: contract.to_string(),
            function: function.to_string(),
        }
    }

    pub fn log_stage(&self, stage: &TraceContext, status: TxStatus, since_start_ms: i64) {
        tracing::debug!(
            context_id = %self.context_id,
            span_id = %stage.span_id,
            operation = %stage.operation,
            status = %status,
            since_start_ms,
            "Call stage"
        );
    }

    pub fn log_submitted(&self, hash: &str) {
        tracing::info!(
            context_id = %self.context_id,
            contract = %self.contract,
            function = %self.function,
            hash = %hash,
            "Transaction submitted"
        );
    }

    pub fn log_poll(&self, hash: &str, attempts: u32, max_attempts: u32) {
        tracing::debug!(
            context_id = %self.context_id,
            hash = %hash,
            attempts = %attempts,
            max_attempts = %max_attempts,
            "Confirmation polling finished"
        );
    }

    pub fn log_success(&self, hash: &str, attempts: u32, latency_ms: u64) {
        tracing::info!(
            context_id = %self.context_id,
            contract = %self.contract,
            function = %self.function,
            hash = %hash,
            attempts = %attempts,
            latency_ms = %latency_ms,
            "Contract call confirmed"
        );
    }

    pub fn log_failure(&self, error: &ClassifiedError, latency_ms: u64) {
        match error.kind {
            ErrorKind::Unknown => tracing::error!(
                context_id = %self.context_id,
                contract = %self.contract,
                function = %self.function,
                kind = %error.kind,
                error = %error.message,
                latency_ms = %latency_ms,
                "Contract call failed"
            ),
            ErrorKind::TransactionRejected => tracing::info!(
                context_id = %self.context_id,
                contract = %self.contract,
                function = %self.function,
                latency_ms = %latency_ms,
                "Contract call rejected by signer"
            ),
            _ => tracing::warn!(
                context_id = %self.context_id,
                contract = %self.contract,
                function = %self.function,
                kind = %error.kind,
                error = %error.message,
                latency_ms = %latency_ms,
                "Contract call failed"
            ),
        }
    }
}
