//! Envelope hand-off types
//!
//! [`PreparedEnvelope`] is the sign-ready output of simulation and is owned by
//! the orchestrator until it is handed to the wallet. [`SignedEnvelope`] is the
//! wallet's reply, parsed back and checked against the prepared envelope; it
//! is consumed by submission.

use crate::tx_builder::builder::{EnvelopeExt, TransactionEnvelope};
use crate::tx_builder::errors::TransactionBuilderError;

/// Simulated, resource-annotated envelope ready for signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedEnvelope {
    envelope: TransactionEnvelope,
    network_passphrase: String,
}

impl PreparedEnvelope {
    pub fn new(envelope: TransactionEnvelope, network_passphrase: impl Into<String>) -> Self {
        Self {
            envelope,
            network_passphrase: network_passphrase.into(),
        }
    }

    pub fn envelope(&self) -> &TransactionEnvelope {
        &self.envelope
    }

    pub fn network_passphrase(&self) -> &str {
        &self.network_passphrase
    }

    /// Serialized form handed to the wallet
    pub fn to_wire(&self) -> Result<String, TransactionBuilderError> {
        self.envelope.to_wire()
    }

    /// Parse the wallet's reply and make sure it signs this very transaction.
    ///
    /// Consumes the prepared envelope: once a signed copy exists the unsigned
    /// one has no further use.
    pub fn accept_signed(self, signed_wire: &str) -> Result<SignedEnvelope, TransactionBuilderError> {
        let signed = TransactionEnvelope::from_wire(signed_wire)?;
        if signed.v1()?.tx != self.envelope.v1()?.tx {
            return Err(TransactionBuilderError::mismatch(
                "wallet returned a different transaction than the one prepared",
            ));
        }
        if !signed.is_signed() {
            return Err(TransactionBuilderError::mismatch(
                "wallet returned an envelope without signatures",
            ));
        }
        SignedEnvelope::new(signed, self.network_passphrase)
    }
}

/// Signed envelope ready for broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    envelope: TransactionEnvelope,
    network_passphrase: String,
    hash: String,
}

impl SignedEnvelope {
    pub fn new(
        envelope: TransactionEnvelope,
        network_passphrase: String,
    ) -> Result<Self, TransactionBuilderError> {
        let hash = EnvelopeExt::hash(&envelope, &network_passphrase)?;
        Ok(Self {
            envelope,
            network_passphrase,
            hash,
        })
    }

    /// Parse a signed envelope received over the wire
    pub fn from_wire(
        encoded: &str,
        network_passphrase: impl Into<String>,
    ) -> Result<Self, TransactionBuilderError> {
        let envelope = TransactionEnvelope::from_wire(encoded)?;
        Self::new(envelope, network_passphrase.into())
    }

    pub fn envelope(&self) -> &TransactionEnvelope {
        &self.envelope
    }

    pub fn network_passphrase(&self) -> &str {
        &self.network_passphrase
    }

    /// Hash the node will report for this envelope
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn to_wire(&self) -> Result<String, TransactionBuilderError> {
        self.envelope.to_wire()
    }
}
