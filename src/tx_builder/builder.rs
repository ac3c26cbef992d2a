//! Core TransactionBuilder implementation
//!
//! Assembles an unsigned XDR envelope carrying exactly one contract invocation
//! from the caller's account state, the fee/validity policy and the encoded
//! argument list.

use crate::codec::{self, Address, AddressKind};
use crate::config::CallPolicy;
use crate::tx_builder::errors::TransactionBuilderError;
use crate::types::{AccountState, CallArgs};
use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    Hash, HostFunction, InvokeContractArgs, InvokeHostFunctionOp, Limits, Memo, MuxedAccount,
    OperationBody, Preconditions, ScSymbol, SequenceNumber, TimeBounds, TimePoint,
    TransactionExt, TransactionSignaturePayload, TransactionSignaturePayloadTaggedTransaction,
    TransactionV1Envelope, Uint256, VecM, WriteXdr,
};

pub use stellar_xdr::curr::{DecoratedSignature, Operation, Transaction, TransactionEnvelope};

/// Longest function symbol accepted by the ledger
pub const MAX_FUNCTION_NAME_LEN: usize = codec::MAX_SYMBOL_LEN;

/// Envelope helpers over the XDR [`TransactionEnvelope`]
///
/// Only v1 (`Tx`) envelopes are produced or accepted; legacy v0 and fee-bump
/// envelopes are rejected as malformed.
pub trait EnvelopeExt: Sized {
    fn v1(&self) -> Result<&TransactionV1Envelope, TransactionBuilderError>;
    fn v1_mut(&mut self) -> Result<&mut TransactionV1Envelope, TransactionBuilderError>;

    fn to_wire(&self) -> Result<String, TransactionBuilderError>;
    fn from_wire(encoded: &str) -> Result<Self, TransactionBuilderError>;

    /// Network-bound transaction hash:
    /// hex(SHA-256(XDR(TransactionSignaturePayload))). Signatures are not
    /// part of the hash.
    fn hash(&self, network_passphrase: &str) -> Result<String, TransactionBuilderError>;

    fn is_signed(&self) -> bool;
    fn is_expired_at(&self, now_unix: u64) -> bool;

    /// Append a signature, within the ledger's limit of 20
    fn push_signature(&mut self, signature: DecoratedSignature)
        -> Result<(), TransactionBuilderError>;
}

impl EnvelopeExt for TransactionEnvelope {
    fn v1(&self) -> Result<&TransactionV1Envelope, TransactionBuilderError> {
        match self {
            TransactionEnvelope::Tx(v1) => Ok(v1),
            _ => Err(TransactionBuilderError::malformed(
                "only v1 transaction envelopes are supported",
            )),
        }
    }

    fn v1_mut(&mut self) -> Result<&mut TransactionV1Envelope, TransactionBuilderError> {
        match self {
            TransactionEnvelope::Tx(v1) => Ok(v1),
            _ => Err(TransactionBuilderError::malformed(
                "only v1 transaction envelopes are supported",
            )),
        }
    }

    fn to_wire(&self) -> Result<String, TransactionBuilderError> {
        Ok(codec::encode_xdr(self)?)
    }

    fn from_wire(encoded: &str) -> Result<Self, TransactionBuilderError> {
        let envelope: TransactionEnvelope = codec::decode_xdr(encoded)
            .map_err(|e| TransactionBuilderError::malformed(e.to_string()))?;
        envelope.v1()?;
        Ok(envelope)
    }

    fn hash(&self, network_passphrase: &str) -> Result<String, TransactionBuilderError> {
        let tx = self.v1()?.tx.clone();
        let network_id = Sha256::digest(network_passphrase.as_bytes());
        let payload = TransactionSignaturePayload {
            network_id: Hash(network_id.into()),
            tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx),
        }
        .to_xdr(Limits::none())
        .map_err(|e| TransactionBuilderError::Encoding(codec::CodecError::Wire(e.to_string())))?;
        Ok(hex::encode(Sha256::digest(payload)))
    }

    fn is_signed(&self) -> bool {
        self.v1().map(|v1| !v1.signatures.is_empty()).unwrap_or(false)
    }

    fn is_expired_at(&self, now_unix: u64) -> bool {
        match self.v1().map(|v1| &v1.tx.cond) {
            Ok(Preconditions::Time(bounds)) => {
                let max = bounds.max_time.0;
                max != 0 && now_unix > max
            }
            _ => false,
        }
    }

    fn push_signature(
        &mut self,
        signature: DecoratedSignature,
    ) -> Result<(), TransactionBuilderError> {
        let v1 = self.v1_mut()?;
        let mut signatures = v1.signatures.to_vec();
        signatures.push(signature);
        v1.signatures = signatures
            .try_into()
            .map_err(|_| TransactionBuilderError::malformed("too many signatures"))?;
        Ok(())
    }
}

/// The single contract invocation of a built transaction, if that is what it
/// carries
pub fn invocation(tx: &Transaction) -> Option<&InvokeContractArgs> {
    match tx.operations.first().map(|op| &op.body) {
        Some(OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
            host_function: HostFunction::InvokeContract(args),
            ..
        })) => Some(args),
        _ => None,
    }
}

/// Builder for an unsigned contract-call envelope
#[derive(Debug)]
pub struct TransactionBuilder<'a> {
    account: &'a AccountState,
    policy: &'a CallPolicy,
    operations: Vec<Operation>,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(account: &'a AccountState, policy: &'a CallPolicy) -> Self {
        Self {
            account,
            policy,
            operations: Vec::with_capacity(1),
        }
    }

    /// Add `invoke(contract, function, args...)`
    pub fn invoke(
        mut self,
        contract: &str,
        function: &str,
        args: CallArgs,
    ) -> Result<Self, TransactionBuilderError> {
        let contract = match Address::parse(contract) {
            Ok(addr) if addr.kind() == AddressKind::Contract => addr,
            _ => return Err(TransactionBuilderError::InvalidContract(contract.to_string())),
        };
        let function_name = function_symbol(function)?;
        let args = args
            .into_vec()
            .try_into()
            .map_err(|_| TransactionBuilderError::Encoding(codec::CodecError::OutOfRange("args")))?;

        self.operations.push(Operation {
            source_account: None,
            body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                host_function: HostFunction::InvokeContract(InvokeContractArgs {
                    contract_address: contract.to_sc_address(),
                    function_name,
                    args,
                }),
                auth: VecM::default(),
            }),
        });
        Ok(self)
    }

    pub fn build(self) -> Result<TransactionEnvelope, TransactionBuilderError> {
        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        self.build_at(now)
    }

    /// Build with an explicit clock; the validity window ends at
    /// `now_unix + validity_secs`.
    pub fn build_at(self, now_unix: u64) -> Result<TransactionEnvelope, TransactionBuilderError> {
        if self.operations.len() != 1 {
            return Err(TransactionBuilderError::Configuration(format!(
                "a contract call carries exactly one operation, got {}",
                self.operations.len()
            )));
        }
        if self.policy.validity_secs == 0 {
            return Err(TransactionBuilderError::Configuration(
                "validity window must be at least one second".to_string(),
            ));
        }

        let source = Address::parse(&self.account.account_id)
            .ok()
            .filter(|a| a.kind() == AddressKind::Account)
            .ok_or_else(|| {
                TransactionBuilderError::Encoding(codec::CodecError::InvalidAddress(
                    self.account.account_id.clone(),
                ))
            })?;
        let operations = self
            .operations
            .try_into()
            .map_err(|_| TransactionBuilderError::Configuration("too many operations".into()))?;

        let tx = Transaction {
            source_account: MuxedAccount::Ed25519(Uint256(*source.key())),
            fee: self.policy.base_fee,
            seq_num: SequenceNumber(self.account.sequence + 1),
            cond: Preconditions::Time(TimeBounds {
                min_time: TimePoint(0),
                max_time: TimePoint(now_unix + self.policy.validity_secs),
            }),
            memo: Memo::None,
            operations,
            ext: TransactionExt::V0,
        };
        Ok(TransactionEnvelope::Tx(TransactionV1Envelope {
            tx,
            signatures: VecM::default(),
        }))
    }
}

fn function_symbol(name: &str) -> Result<ScSymbol, TransactionBuilderError> {
    match codec::symbol_to_scval(name) {
        Ok(codec::ScVal::Symbol(symbol)) => Ok(symbol),
        _ => Err(TransactionBuilderError::InvalidFunctionName(name.to_string())),
    }
}
