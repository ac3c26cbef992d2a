//! ledger-call - remote ledger contract call orchestrator
//!
//! Drives a smart-contract call end to end against a remote ledger node:
//! account lookup, transaction construction, simulation, delegated signing,
//! submission and bounded confirmation polling, with progress reported through
//! a status observer and failures classified into a small typed taxonomy.

pub mod account;
pub mod codec;
pub mod config;
pub mod contracts;
pub mod errors;
pub mod metrics;
pub mod observability;
pub mod orchestrator;
pub mod status;
pub mod structured_logging;
pub mod submitter;
pub mod tx_builder;
pub mod types;
pub mod wallet;

// Component modules with non-standard paths (directories with spaces)
#[path = "rpc manager/mod.rs"]
pub mod rpc_manager;

pub mod test_utils;

// Re-export commonly used types
pub use errors::{ClassifiedError, ErrorKind, Severity};
pub use orchestrator::{CallOrchestrator, ContractClient, EngineSettings};
pub use status::{StatusObserver, TxStatus};
pub use types::{CallArgs, CallOutcome, CallRequest};
