//! Club game contract

use serde::{Deserialize, Serialize};

use super::{
    address_arg, caller_address, decode_return, encode_args, string_arg, ContractConfig,
    FunctionSpec, ParamKind, ReturnShape,
};
use crate::codec::u64_to_scval;
use crate::errors::ClassifiedError;
use crate::orchestrator::{CallOrchestrator, ContractClient};
use crate::status::StatusObserver;
use crate::types::CallOutcome;

pub const LABEL: &str = "clubs";

pub const FUNCTIONS: &[FunctionSpec] = &[
    FunctionSpec {
        name: "register_club",
        params: &[ParamKind::Address, ParamKind::String, ParamKind::String],
        returns: ReturnShape::U64,
    },
    FunctionSpec {
        name: "get_club_info",
        params: &[ParamKind::U64],
        returns: ReturnShape::Record("ClubInfo"),
    },
    FunctionSpec {
        name: "query_club_stats",
        params: &[ParamKind::U64],
        returns: ReturnShape::Record("ClubStats"),
    },
    FunctionSpec {
        name: "get_player_clubs",
        params: &[ParamKind::Address],
        returns: ReturnShape::U64List,
    },
    FunctionSpec {
        name: "simulate_match",
        params: &[ParamKind::U64, ParamKind::U64],
        returns: ReturnShape::U64Pair,
    },
    FunctionSpec {
        name: "is_club_registered",
        params: &[ParamKind::U64],
        returns: ReturnShape::Bool,
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
pub struct ClubStats {
    pub attack: u32,
    pub defense: u32,
    pub midfield: u32,
    pub goalkeeping: u32,
    pub speed: u32,
    pub overall: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubInfo {
    pub id: u64,
    pub name: String,
    pub logo_url: String,
    pub owner: String,
    pub stats: ClubStats,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    #[serde(default)]
    pub created_at: u64,
}

/// Result of a simulated match. A `(0, 0)` result is a draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchOutcome {
    pub winner: u64,
    pub loser: u64,
    pub is_draw: bool,
    pub transaction_hash: String,
}

impl MatchOutcome {
    fn from_pair((winner, loser): (u64, u64), transaction_hash: String) -> Self {
        Self {
            winner,
            loser,
            is_draw: winner == 0 && loser == 0,
            transaction_hash,
        }
    }
}

/// Typed client for the club game contract
#[derive(Clone)]
pub struct ClubsClient {
    client: ContractClient,
}

impl ClubsClient {
    pub fn new(orchestrator: CallOrchestrator, address: &str) -> Self {
        Self {
            client: ContractClient::new(orchestrator, contract(address)),
        }
    }

    pub fn client(&self) -> &ContractClient {
        &self.client
    }

    /// Register a club owned by the caller; returns the new club id
    pub async fn register_club(
        &self,
        caller: Option<&str>,
        name: &str,
        logo_url: &str,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<u64, ClassifiedError> {
        let args = encode_args([caller_address(caller), string_arg(name), string_arg(logo_url)]);
        let outcome = self
            .client
            .invoke_encoded(caller, "register_club", args, observer)
            .await?;
        decode_return(&outcome)
    }

    pub async fn get_club_info(
        &self,
        caller: Option<&str>,
        club_id: u64,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<ClubInfo, ClassifiedError> {
        let outcome = self
            .client
            .invoke(caller, "get_club_info", vec![u64_to_scval(club_id)], observer)
            .await?;
        decode_return(&outcome)
    }

    pub async fn query_club_stats(
        &self,
        caller: Option<&str>,
        club_id: u64,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<ClubStats, ClassifiedError> {
        let outcome = self
            .client
            .invoke(caller, "query_club_stats", vec![u64_to_scval(club_id)], observer)
            .await?;
        decode_return(&outcome)
    }

    pub async fn get_player_clubs(
        &self,
        caller: Option<&str>,
        player: &str,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<Vec<u64>, ClassifiedError> {
        let outcome = self
            .client
            .invoke_encoded(caller, "get_player_clubs", encode_args([address_arg(player)]), observer)
            .await?;
        decode_return(&outcome)
    }

    pub async fn simulate_match(
        &self,
        caller: Option<&str>,
        club1_id: u64,
        club2_id: u64,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<MatchOutcome, ClassifiedError> {
        let outcome: CallOutcome = self
            .client
            .invoke(
                caller,
                "simulate_match",
                vec![u64_to_scval(club1_id), u64_to_scval(club2_id)],
                observer,
            )
            .await?;
        let pair = decode_return(&outcome)?;
        Ok(MatchOutcome::from_pair(pair, outcome.transaction_hash))
    }

    pub async fn is_club_registered(
        &self,
        caller: Option<&str>,
        club_id: u64,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<bool, ClassifiedError> {
        let outcome = self
            .client
            .invoke(caller, "is_club_registered", vec![u64_to_scval(club_id)], observer)
            .await?;
        decode_return(&outcome)
    }
}
