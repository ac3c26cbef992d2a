//! Argument codec
//!
//! Converts native Rust values (strings, integers, strkey addresses) into the
//! ledger's XDR value type [`ScVal`] and back. Return values coming back from
//! the node are decoded into a loosely typed `serde_json::Value` through
//! [`scval_to_native`], from which typed results are deserialized.
//!
//! On the wire every value and envelope travels as base64 of its XDR encoding.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::str::FromStr;
use stellar_strkey::Strkey;
use stellar_xdr::curr::{
    AccountId, ContractId, Hash, Limits, PublicKey, ReadXdr, ScAddress, ScMap, ScMapEntry,
    ScString, ScSymbol, ScVec, Uint256, WriteXdr,
};
use thiserror::Error;

pub use stellar_xdr::curr::ScVal;

/// Longest symbol the ledger accepts
pub const MAX_SYMBOL_LEN: usize = 32;

/// Codec failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Not a valid account (`G…`) or contract (`C…`) strkey
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Symbols are 1-32 chars of `[A-Za-z0-9_]`
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    /// The value has a different wire type than the one requested
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Integer does not fit the requested width
    #[error("Integer out of range for {0}")]
    OutOfRange(&'static str),

    /// Base64 or XDR decoding failed
    #[error("Wire decoding failed: {0}")]
    Wire(String),
}

/// What an [`Address`] points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    Account,
    Contract,
}

/// A validated ledger address in strkey form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    text: String,
    kind: AddressKind,
    key: [u8; 32],
}

impl Address {
    /// Parse and checksum-validate a strkey. Only account and contract keys
    /// are addressable.
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        let trimmed = s.trim();
        let (kind, key) = match Strkey::from_string(trimmed) {
            Ok(Strkey::PublicKeyEd25519(pk)) => (AddressKind::Account, pk.0),
            Ok(Strkey::Contract(contract)) => (AddressKind::Contract, contract.0),
            _ => return Err(CodecError::InvalidAddress(s.to_string())),
        };
        Ok(Self {
            text: trimmed.to_string(),
            kind,
            key,
        })
    }

    fn from_key(kind: AddressKind, key: [u8; 32]) -> Self {
        let text = match kind {
            AddressKind::Account => stellar_strkey::ed25519::PublicKey(key).to_string(),
            AddressKind::Contract => stellar_strkey::Contract(key).to_string(),
        };
        Self { text, kind, key }
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Raw ed25519 key or contract id
    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    pub fn to_sc_address(&self) -> ScAddress {
        match self.kind {
            AddressKind::Account => ScAddress::Account(AccountId(
                PublicKey::PublicKeyTypeEd25519(Uint256(self.key)),
            )),
            AddressKind::Contract => ScAddress::Contract(ContractId(Hash(self.key))),
        }
    }

    /// Muxed, claimable-balance and pool addresses are not callers or targets
    pub fn from_sc_address(address: &ScAddress) -> Result<Self, CodecError> {
        match address {
            ScAddress::Account(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(key)))) => {
                Ok(Self::from_key(AddressKind::Account, *key))
            }
            ScAddress::Contract(ContractId(Hash(key))) => {
                Ok(Self::from_key(AddressKind::Contract, *key))
            }
            other => Err(CodecError::InvalidAddress(format!("{:?}", other))),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Address {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Wire type name, used in error messages
pub fn type_name(value: &ScVal) -> &'static str {
    match value {
        ScVal::Void => "void",
        ScVal::Bool(_) => "bool",
        ScVal::Error(_) => "error",
        ScVal::U32(_) => "u32",
        ScVal::I32(_) => "i32",
        ScVal::U64(_) => "u64",
        ScVal::I64(_) => "i64",
        ScVal::Timepoint(_) => "timepoint",
        ScVal::Duration(_) => "duration",
        ScVal::U128(_) => "u128",
        ScVal::I128(_) => "i128",
        ScVal::U256(_) => "u256",
        ScVal::I256(_) => "i256",
        ScVal::Bytes(_) => "bytes",
        ScVal::String(_) => "string",
        ScVal::Symbol(_) => "symbol",
        ScVal::Vec(_) => "vec",
        ScVal::Map(_) => "map",
        ScVal::Address(_) => "address",
        _ => "ledger-internal",
    }
}

pub fn string_to_scval(value: &str) -> Result<ScVal, CodecError> {
    let inner = value
        .to_string()
        .try_into()
        .map_err(|_| CodecError::OutOfRange("string"))?;
    Ok(ScVal::String(ScString(inner)))
}

pub fn symbol_to_scval(value: &str) -> Result<ScVal, CodecError> {
    let valid = !value.is_empty()
        && value.len() <= MAX_SYMBOL_LEN
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(CodecError::InvalidSymbol(value.to_string()));
    }
    let inner = value
        .to_string()
        .try_into()
        .map_err(|_| CodecError::InvalidSymbol(value.to_string()))?;
    Ok(ScVal::Symbol(ScSymbol(inner)))
}

pub fn u64_to_scval(value: u64) -> ScVal {
    ScVal::U64(value)
}

pub fn address_to_scval(address: &str) -> Result<ScVal, CodecError> {
    Address::parse(address).map(|a| ScVal::Address(a.to_sc_address()))
}

pub fn vec_to_scval(items: Vec<ScVal>) -> Result<ScVal, CodecError> {
    let inner = items
        .try_into()
        .map_err(|_| CodecError::OutOfRange("vec"))?;
    Ok(ScVal::Vec(Some(ScVec(inner))))
}

/// Map from `(key, value)` pairs. The ledger requires keys in ascending
/// order, so entries are sorted here.
pub fn map_to_scval(mut entries: Vec<(ScVal, ScVal)>) -> Result<ScVal, CodecError> {
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let inner = entries
        .into_iter()
        .map(|(key, val)| ScMapEntry { key, val })
        .collect::<Vec<_>>()
        .try_into()
        .map_err(|_| CodecError::OutOfRange("map"))?;
    Ok(ScVal::Map(Some(ScMap(inner))))
}

fn utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decode a wire value into a loosely typed native value.
///
/// Maps keyed by symbols or strings become JSON objects, 128-bit integers
/// that do not fit in 64 bits become decimal strings, 256-bit integers and
/// bytes become hex.
pub fn scval_to_native(value: &ScVal) -> serde_json::Value {
    use serde_json::Value;

    match value {
        ScVal::Void => Value::Null,
        ScVal::Bool(b) => Value::Bool(*b),
        ScVal::U32(n) => Value::from(*n),
        ScVal::I32(n) => Value::from(*n),
        ScVal::U64(n) => Value::from(*n),
        ScVal::I64(n) => Value::from(*n),
        ScVal::Timepoint(t) => Value::from(t.0),
        ScVal::Duration(d) => Value::from(d.0),
        ScVal::U128(parts) => {
            let n = (u128::from(parts.hi) << 64) | u128::from(parts.lo);
            match u64::try_from(n) {
                Ok(small) => Value::from(small),
                Err(_) => Value::String(n.to_string()),
            }
        }
        ScVal::I128(parts) => {
            let n = (i128::from(parts.hi) << 64) | i128::from(parts.lo);
            match i64::try_from(n) {
                Ok(small) => Value::from(small),
                Err(_) => Value::String(n.to_string()),
            }
        }
        ScVal::U256(p) => Value::String(format!(
            "0x{:016x}{:016x}{:016x}{:016x}",
            p.hi_hi, p.hi_lo, p.lo_hi, p.lo_lo
        )),
        ScVal::I256(p) => Value::String(format!(
            "0x{:016x}{:016x}{:016x}{:016x}",
            p.hi_hi, p.hi_lo, p.lo_hi, p.lo_lo
        )),
        ScVal::Bytes(b) => Value::String(hex::encode(b.0.as_slice())),
        ScVal::String(s) => Value::String(utf8(s.0.as_slice())),
        ScVal::Symbol(s) => Value::String(utf8(s.0.as_slice())),
        ScVal::Address(a) => match Address::from_sc_address(a) {
            Ok(address) => Value::String(address.to_string()),
            Err(_) => Value::Null,
        },
        ScVal::Vec(items) => Value::Array(
            items
                .as_ref()
                .map(|v| v.0.iter().map(scval_to_native).collect())
                .unwrap_or_default(),
        ),
        ScVal::Map(entries) => {
            let entries = entries.as_ref().map(|m| m.0.as_slice()).unwrap_or_default();
            let mut object = serde_json::Map::with_capacity(entries.len());
            for entry in entries {
                let key = match &entry.key {
                    ScVal::Symbol(s) => utf8(s.0.as_slice()),
                    ScVal::String(s) => utf8(s.0.as_slice()),
                    other => scval_to_native(other).to_string(),
                };
                object.insert(key, scval_to_native(&entry.val));
            }
            Value::Object(object)
        }
        ScVal::Error(e) => Value::String(format!("{:?}", e)),
        _ => Value::Null,
    }
}

/// Serialize any XDR structure to its base64 transport form
pub fn encode_xdr<T: WriteXdr>(value: &T) -> Result<String, CodecError> {
    let bytes = value
        .to_xdr(Limits::none())
        .map_err(|e| CodecError::Wire(e.to_string()))?;
    Ok(STANDARD.encode(bytes))
}

/// Inverse of [`encode_xdr`]
pub fn decode_xdr<T: ReadXdr>(encoded: &str) -> Result<T, CodecError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| CodecError::Wire(format!("base64: {}", e)))?;
    T::from_xdr(bytes, Limits::none()).map_err(|e| CodecError::Wire(e.to_string()))
}
