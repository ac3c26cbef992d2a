//! Transaction Builder
//!
//! Turns a contract call into a broadcastable XDR envelope:
//!
//! - **errors**: builder error taxonomy
//! - **builder**: unsigned envelope with exactly one contract invocation
//! - **simulate**: dry-run on the node and assembly of the sign-ready envelope
//! - **output**: prepared / signed envelope hand-off types
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use ledger_call::config::CallPolicy;
//! use ledger_call::tx_builder::{EnvelopeExt, TransactionBuilder, TransactionBuilderError};
//! use ledger_call::types::{AccountState, CallArgs};
//!
//! # fn example(account: AccountState) -> Result<(), TransactionBuilderError> {
//! let policy = CallPolicy::default();
//! let envelope = TransactionBuilder::new(&account, &policy)
//!     .invoke(
//!         "CBK6DMOHM7I7G3IDNQS7JAJOCJ4XVO5SLXP6KHQAWNVTKW5YHETSE5UA",
//!         "get_total_count",
//!         CallArgs::None,
//!     )?
//!     .build()?;
//! assert_eq!(envelope.v1()?.tx.operations.len(), 1);
//! # Ok(())
//! # }
//! ```

// Public API - Error types
pub mod errors;
pub use errors::TransactionBuilderError;

mod builder;
mod output;
pub mod simulate;

pub use builder::{
    invocation, DecoratedSignature, EnvelopeExt, Operation, Transaction, TransactionBuilder,
    TransactionEnvelope, MAX_FUNCTION_NAME_LEN,
};
pub use output::{PreparedEnvelope, SignedEnvelope};
pub use simulate::prepare_transaction;
