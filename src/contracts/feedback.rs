//! Anonymous feedback contract

use serde::Deserialize;

use super::{decode_return, encode_args, string_arg, ContractConfig, FunctionSpec, ParamKind, ReturnShape};
use crate::codec::u64_to_scval;
use crate::errors::ClassifiedError;
use crate::orchestrator::{CallOrchestrator, ContractClient};
use crate::status::StatusObserver;

pub const LABEL: &str = "feedback";

pub const FUNCTIONS: &[FunctionSpec] = &[
    FunctionSpec {
        name: "send_feedback",
        params: &[ParamKind::String],
        returns: ReturnShape::U64,
    },
    FunctionSpec {
        name: "fetch_feedback",
        params: &[ParamKind::U64],
        returns: ReturnShape::Record("Feedback"),
    },
];

pub fn contract(address: &str) -> ContractConfig {
    ContractConfig {
        label: LABEL,
        address: address.to_string(),
        functions: FUNCTIONS,
    }
}

#[derive(Debug, Deserialize)]
struct FeedbackRecord {
    message: String,
}

#[derive(Clone)]
pub struct FeedbackClient {
    client: ContractClient,
}

impl FeedbackClient {
    pub fn new(orchestrator: CallOrchestrator, address: &str) -> Self {
        Self {
            client: ContractClient::new(orchestrator, contract(address)),
        }
    }

    pub fn client(&self) -> &ContractClient {
        &self.client
    }

    /// Store a message; returns its id
    pub async fn send_feedback(
        &self,
        caller: Option<&str>,
        message: &str,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<u64, ClassifiedError> {
        let outcome = self
            .client
            .invoke_encoded(caller, "send_feedback", encode_args([string_arg(message)]), observer)
            .await?;
        decode_return(&outcome)
    }

    pub async fn fetch_feedback(
        &self,
        caller: Option<&str>,
        feedback_id: u64,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<String, ClassifiedError> {
        let outcome = self
            .client
            .invoke(caller, "fetch_feedback", vec![u64_to_scval(feedback_id)], observer)
            .await?;
        let record: FeedbackRecord = decode_return(&outcome)?;
        Ok(record.message)
    }
}
