//! Call-site configuration tables
//!
//! Each deployed contract is described by a [`ContractConfig`]: its address
//! and the table of functions it exposes, with parameter kinds and return
//! shape. [`crate::orchestrator::ContractClient`] checks calls against the
//! table; the per-contract modules add typed wrappers on top.

pub mod clubs;
pub mod feedback;
pub mod nfts;

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;

use crate::codec::{self, CodecError, ScVal};
use crate::config::ContractsConfig;
use crate::errors::ClassifiedError;
use crate::types::CallOutcome;

/// Wire type of one function parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Symbol,
    U32,
    U64,
    I64,
    Bool,
    Address,
}

impl ParamKind {
    pub fn name(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Symbol => "symbol",
            ParamKind::U32 => "u32",
            ParamKind::U64 => "u64",
            ParamKind::I64 => "i64",
            ParamKind::Bool => "bool",
            ParamKind::Address => "address",
        }
    }

    pub fn matches(&self, value: &ScVal) -> bool {
        matches!(
            (self, value),
            (ParamKind::String, ScVal::String(_))
                | (ParamKind::Symbol, ScVal::Symbol(_))
                | (ParamKind::U32, ScVal::U32(_))
                | (ParamKind::U64, ScVal::U64(_))
                | (ParamKind::I64, ScVal::I64(_))
                | (ParamKind::Bool, ScVal::Bool(_))
                | (ParamKind::Address, ScVal::Address(_))
        )
    }

    /// Encode a textual value as this kind
    pub fn parse_value(&self, raw: &str) -> Result<ScVal, CodecError> {
        let out_of_range = |_| CodecError::OutOfRange(self.name());
        Ok(match self {
            ParamKind::String => codec::string_to_scval(raw)?,
            ParamKind::Symbol => codec::symbol_to_scval(raw)?,
            ParamKind::U32 => ScVal::U32(raw.trim().parse().map_err(out_of_range)?),
            ParamKind::U64 => ScVal::U64(raw.trim().parse().map_err(out_of_range)?),
            ParamKind::I64 => ScVal::I64(raw.trim().parse().map_err(out_of_range)?),
            ParamKind::Bool => ScVal::Bool(raw.trim().parse().map_err(|_| CodecError::TypeMismatch {
                expected: "bool",
                found: "string",
            })?),
            ParamKind::Address => codec::address_to_scval(raw)?,
        })
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(ParamKind::String),
            "symbol" => Ok(ParamKind::Symbol),
            "u32" => Ok(ParamKind::U32),
            "u64" => Ok(ParamKind::U64),
            "i64" => Ok(ParamKind::I64),
            "bool" => Ok(ParamKind::Bool),
            "address" => Ok(ParamKind::Address),
            other => Err(format!("unknown argument type: {}", other)),
        }
    }
}

/// What a function returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    Void,
    Bool,
    U64,
    Address,
    U64List,
    U64Pair,
    /// A contract-defined struct, by name
    Record(&'static str),
}

impl fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnShape::Void => f.write_str("()"),
            ReturnShape::Bool => f.write_str("bool"),
            ReturnShape::U64 => f.write_str("u64"),
            ReturnShape::Address => f.write_str("address"),
            ReturnShape::U64List => f.write_str("vec<u64>"),
            ReturnShape::U64Pair => f.write_str("(u64, u64)"),
            ReturnShape::Record(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub params: &'static [ParamKind],
    pub returns: ReturnShape,
}

impl FunctionSpec {
    /// Check argument count and kinds
    pub fn check_args(&self, args: &[ScVal]) -> Result<(), String> {
        if args.len() != self.params.len() {
            return Err(format!(
                "expected {} argument(s), got {}",
                self.params.len(),
                args.len()
            ));
        }
        for (index, (kind, arg)) in self.params.iter().zip(args).enumerate() {
            if !kind.matches(arg) {
                return Err(format!(
                    "argument {} must be {}, got {}",
                    index + 1,
                    kind,
                    codec::type_name(arg)
                ));
            }
        }
        Ok(())
    }

    /// `name(u64, address) -> bool`
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(ParamKind::name).collect();
        format!("{}({}) -> {}", self.name, params.join(", "), self.returns)
    }
}

/// One deployed contract and its function table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractConfig {
    pub label: &'static str,
    pub address: String,
    pub functions: &'static [FunctionSpec],
}

impl ContractConfig {
    pub fn function(&self, name: &str) -> Option<&'static FunctionSpec> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// Look up a configured contract by label
pub fn by_name(label: &str, contracts: &ContractsConfig) -> Option<ContractConfig> {
    match label {
        clubs::LABEL => Some(clubs::contract(&contracts.clubs)),
        nfts::LABEL => Some(nfts::contract(&contracts.nfts)),
        feedback::LABEL => Some(feedback::contract(&contracts.feedback)),
        _ => None,
    }
}

/// Encode the caller as an address argument
pub(crate) fn caller_address(caller: Option<&str>) -> Result<ScVal, ClassifiedError> {
    let caller = caller
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(ClassifiedError::wallet_not_found)?;
    codec::address_to_scval(caller).map_err(|e| ClassifiedError::unknown(e.to_string()))
}

pub(crate) fn address_arg(address: &str) -> Result<ScVal, ClassifiedError> {
    codec::address_to_scval(address).map_err(|e| ClassifiedError::unknown(e.to_string()))
}

pub(crate) fn string_arg(value: &str) -> Result<ScVal, ClassifiedError> {
    codec::string_to_scval(value).map_err(|e| ClassifiedError::unknown(e.to_string()))
}

/// Collect encoded arguments, stopping at the first encoding failure
pub(crate) fn encode_args<const N: usize>(
    args: [Result<ScVal, ClassifiedError>; N],
) -> Result<Vec<ScVal>, ClassifiedError> {
    args.into_iter().collect()
}

/// Decode a confirmed call's return value into its typed shape
pub(crate) fn decode_return<T: DeserializeOwned>(
    outcome: &CallOutcome,
) -> Result<T, ClassifiedError> {
    match outcome.decode::<T>() {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(ClassifiedError::unknown(
            "unexpected return value: contract returned nothing",
        )),
        Err(e) => Err(ClassifiedError::unknown(format!("unexpected return value: {}", e))),
    }
}
