//! NFT minter contract

use serde::{Deserialize, Serialize};

use super::{
    address_arg, caller_address, decode_return, encode_args, string_arg, ContractConfig,
    FunctionSpec, ParamKind, ReturnShape,
};
use crate::codec::u64_to_scval;
use crate::errors::ClassifiedError;
use crate::orchestrator::{CallOrchestrator, ContractClient};
use crate::status::StatusObserver;

pub const LABEL: &str = "nfts";

pub const FUNCTIONS: &[FunctionSpec] = &[
    FunctionSpec {
        name: "mint",
        params: &[
            ParamKind::Address,
            ParamKind::String,
            ParamKind::String,
            ParamKind::String,
        ],
        returns: ReturnShape::U64,
    },
    FunctionSpec {
        name: "get_nft",
        params: &[ParamKind::U64],
        returns: ReturnShape::Record("NftInfo"),
    },
    FunctionSpec {
        name: "get_owner",
        params: &[ParamKind::U64],
        returns: ReturnShape::Address,
    },
    FunctionSpec {
        name: "get_nfts_by_owner",
        params: &[ParamKind::Address],
        returns: ReturnShape::U64List,
    },
    FunctionSpec {
        name: "transfer",
        params: &[ParamKind::Address, ParamKind::Address, ParamKind::U64],
        returns: ReturnShape::Void,
    },
    FunctionSpec {
        name: "get_total_count",
        params: &[],
        returns: ReturnShape::U64,
    },
];

pub fn contract(address: &str) -> ContractConfig {
    ContractConfig {
        label: LABEL,
        address: address.to_string(),
        functions: FUNCTIONS,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftInfo {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub owner: String,
    #[serde(default)]
    pub created_at: u64,
}

#[derive(Clone)]
pub struct NftsClient {
    client: ContractClient,
}

impl NftsClient {
    pub fn new(orchestrator: CallOrchestrator, address: &str) -> Self {
        Self {
            client: ContractClient::new(orchestrator, contract(address)),
        }
    }

    pub fn client(&self) -> &ContractClient {
        &self.client
    }

    /// Mint a token owned by the caller; returns its id
    pub async fn mint(
        &self,
        caller: Option<&str>,
        name: &str,
        description: &str,
        image_url: &str,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<u64, ClassifiedError> {
        let args = encode_args([
            caller_address(caller),
            string_arg(name),
            string_arg(description),
            string_arg(image_url),
        ]);
        let outcome = self
            .client
            .invoke_encoded(caller, "mint", args, observer)
            .await?;
        decode_return(&outcome)
    }

    pub async fn get_nft(
        &self,
        caller: Option<&str>,
        nft_id: u64,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<NftInfo, ClassifiedError> {
        let outcome = self
            .client
            .invoke(caller, "get_nft", vec![u64_to_scval(nft_id)], observer)
            .await?;
        decode_return(&outcome)
    }

    pub async fn get_owner(
        &self,
        caller: Option<&str>,
        nft_id: u64,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<String, ClassifiedError> {
        let outcome = self
            .client
            .invoke(caller, "get_owner", vec![u64_to_scval(nft_id)], observer)
            .await?;
        decode_return(&outcome)
    }

    pub async fn get_nfts_by_owner(
        &self,
        caller: Option<&str>,
        owner: &str,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<Vec<u64>, ClassifiedError> {
        let outcome = self
            .client
            .invoke_encoded(caller, "get_nfts_by_owner", encode_args([address_arg(owner)]), observer)
            .await?;
        decode_return(&outcome)
    }

    /// Transfer `nft_id` from the caller to `to`; returns the transaction hash
    pub async fn transfer(
        &self,
        caller: Option<&str>,
        to: &str,
        nft_id: u64,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<String, ClassifiedError> {
        let args = encode_args([caller_address(caller), address_arg(to), Ok(u64_to_scval(nft_id))]);
        let outcome = self
            .client
            .invoke_encoded(caller, "transfer", args, observer)
            .await?;
        Ok(outcome.transaction_hash)
    }

    pub async fn get_total_count(
        &self,
        caller: Option<&str>,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<u64, ClassifiedError> {
        let outcome = self
            .client
            .invoke(caller, "get_total_count", vec![], observer)
            .await?;
        decode_return(&outcome)
    }
}
