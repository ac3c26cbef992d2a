//! Simulation / preparation step
//!
//! Dry-runs the unsigned envelope on the node exactly once and assembles the
//! sign-ready envelope from the result: Soroban transaction data attached,
//! recorded authorization entries filled in, fee raised by the minimum
//! resource fee. Node errors are returned unmodified.

use stellar_xdr::curr::{OperationBody, TransactionExt};
use tracing::debug;

use crate::rpc_manager::{LedgerNode, NodeError};
use crate::tx_builder::builder::{EnvelopeExt, TransactionEnvelope};
use crate::tx_builder::output::PreparedEnvelope;
use crate::types::SimulationResponse;

/// Simulate `envelope` and return the assembled, sign-ready envelope
pub async fn prepare_transaction(
    node: &dyn LedgerNode,
    envelope: TransactionEnvelope,
    network_passphrase: &str,
) -> Result<PreparedEnvelope, NodeError> {
    let simulation = node.simulate_transaction(&envelope).await?;
    let assembled = assemble(envelope, &simulation)?;
    Ok(PreparedEnvelope::new(assembled, network_passphrase))
}

/// Apply a simulation result to an unsigned envelope
pub fn assemble(
    mut envelope: TransactionEnvelope,
    simulation: &SimulationResponse,
) -> Result<TransactionEnvelope, NodeError> {
    if let Some(error) = &simulation.error {
        return Err(NodeError::Simulation(error.clone()));
    }

    let v1 = envelope
        .v1_mut()
        .map_err(|e| NodeError::Encoding(e.to_string()))?;
    let tx = &mut v1.tx;

    let resource_fee = u32::try_from(simulation.min_resource_fee).map_err(|_| {
        NodeError::InvalidResponse(format!(
            "resource fee {} exceeds the fee field",
            simulation.min_resource_fee
        ))
    })?;
    let fee = tx.fee.checked_add(resource_fee).ok_or_else(|| {
        NodeError::InvalidResponse(format!(
            "total fee overflows: {} + {}",
            tx.fee, resource_fee
        ))
    })?;

    if !simulation.auth.is_empty() {
        let mut operations = tx.operations.to_vec();
        if let Some(OperationBody::InvokeHostFunction(op)) =
            operations.first_mut().map(|op| &mut op.body)
        {
            if op.auth.is_empty() {
                op.auth = simulation.auth.clone().try_into().map_err(|_| {
                    NodeError::InvalidResponse(format!(
                        "{} authorization entries do not fit an operation",
                        simulation.auth.len()
                    ))
                })?;
            }
        }
        tx.operations = operations
            .try_into()
            .map_err(|_| NodeError::Encoding("operation list overflow".to_string()))?;
    }

    debug!(
        base_fee = tx.fee,
        resource_fee,
        instructions = simulation
            .transaction_data
            .as_ref()
            .map(|data| data.resources.instructions),
        auth_entries = simulation.auth.len(),
        "Assembled simulated transaction"
    );

    tx.fee = fee;
    if let Some(data) = &simulation.transaction_data {
        tx.ext = TransactionExt::V1(data.clone());
    }
    Ok(envelope)
}
