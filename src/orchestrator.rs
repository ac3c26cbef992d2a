//! Contract call orchestrator
//!
//! Drives one contract call through the full pipeline:
//!
//! ```text
//! PREPARING   resolve account -> build envelope -> simulate/assemble
//! SIGNING     external wallet signs the prepared envelope
//! SUBMITTING  broadcast once
//! PENDING     bounded confirmation polling
//! SUCCESS / FAILED
//! ```
//!
//! Every call owns its own [`StatusTracker`]; the orchestrator itself only
//! shares the node and wallet handles, so any number of calls may run
//! concurrently on clones of one instance. Failures from every stage leave as a
//! [`ClassifiedError`].

use std::sync::Arc;

use tracing::{info_span, warn, Instrument};

use crate::account::resolve_account;
use crate::codec::{scval_to_native, ScVal};
use crate::config::{CallPolicy, Config};
use crate::contracts::ContractConfig;
use crate::errors::ClassifiedError;
use crate::metrics::{metrics, Timer};
use crate::observability::TraceContext;
use crate::rpc_manager::{LedgerNode, NodeError};
use crate::status::{StatusObserver, StatusTracker, TxStatus};
use crate::structured_logging::CallLogger;
use crate::submitter::{poll_confirmation, submit};
use crate::tx_builder::{prepare_transaction, TransactionBuilder, TransactionBuilderError};
use crate::types::{CallArgs, CallOutcome, CallRequest};
use crate::wallet::{classify_wallet_error, WalletSigner};

/// Per-instance engine parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub network_passphrase: String,
    pub policy: CallPolicy,
    pub explorer_base_url: String,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            network_passphrase: config.node.network_passphrase.clone(),
            policy: config.policy.clone(),
            explorer_base_url: config.explorer.base_url.clone(),
        }
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

fn classify_builder_error(err: TransactionBuilderError) -> ClassifiedError {
    ClassifiedError::unknown(err.to_string())
}

fn classify_preparation_error(err: NodeError) -> ClassifiedError {
    ClassifiedError::unknown(err.to_string())
}

/// Generic contract call engine
#[derive(Clone)]
pub struct CallOrchestrator {
    node: Arc<dyn LedgerNode>,
    wallet: Arc<dyn WalletSigner>,
    settings: Arc<EngineSettings>,
}

impl CallOrchestrator {
    pub fn new(
        node: Arc<dyn LedgerNode>,
        wallet: Arc<dyn WalletSigner>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            node,
            wallet,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Fail a call that never reached the pipeline. The observer still sees
    /// `Failed`, and the failure is counted and logged like any other.
    pub fn reject(
        &self,
        contract: &str,
        function: &str,
        err: ClassifiedError,
        observer: Option<&dyn StatusObserver>,
    ) -> ClassifiedError {
        let context = TraceContext::for_call(contract, function);
        let logger = CallLogger::new(&context, contract, function);
        let m = metrics();
        m.calls_total.inc();
        m.record_failure(err.kind);
        StatusTracker::new(observer).fail();
        logger.log_failure(&err, 0);
        err
    }

    /// Run one contract call to completion.
    ///
    /// `observer` sees every distinct status transition in order. If the
    /// returned future is dropped before completion the observer still
    /// receives `Failed`.
    pub async fn call(
        &self,
        request: CallRequest,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<CallOutcome, ClassifiedError> {
        let context = TraceContext::for_call(&request.contract_address, &request.function_name);
        let logger = CallLogger::new(&context, &request.contract_address, &request.function_name);
        let span = info_span!(
            "contract_call",
            call_id = %context.call_id().short(),
            trace_id = %context.trace_id,
            contract = %request.contract_address,
            function = %request.function_name,
        );

        let m = metrics();
        m.calls_total.inc();
        m.calls_in_flight.inc();
        let _in_flight = scopeguard::guard((), |_| metrics().calls_in_flight.dec());
        let timer = Timer::new();

        let mut tracker = scopeguard::guard(StatusTracker::new(observer), |mut tracker| {
            if tracker.fail() {
                warn!("Contract call abandoned before completion");
            }
        });

        let result = self
            .run(&request, &mut tracker, &context, &logger)
            .instrument(span)
            .await;

        timer.observe_duration(&m.call_latency);
        match &result {
            Ok(outcome) => {
                m.calls_succeeded.inc();
                m.poll_attempts.observe(f64::from(outcome.poll_attempts));
                logger.log_success(&outcome.transaction_hash, outcome.poll_attempts, timer.elapsed_ms());
            }
            Err(err) => {
                tracker.fail();
                m.record_failure(err.kind);
                logger.log_failure(err, timer.elapsed_ms());
            }
        }
        result
    }

    async fn run(
        &self,
        request: &CallRequest,
        tracker: &mut StatusTracker<'_>,
        context: &TraceContext,
        logger: &CallLogger,
    ) -> Result<CallOutcome, ClassifiedError> {
        let node = self.node.as_ref();
        let settings = self.settings.as_ref();

        let caller = request.caller().ok_or_else(ClassifiedError::wallet_not_found)?;

        advance(tracker, context, logger, TxStatus::Preparing);
        let account = resolve_account(node, caller).await?;
        let envelope = TransactionBuilder::new(&account, &settings.policy)
            .invoke(
                &request.contract_address,
                &request.function_name,
                request.args.clone(),
            )
            .and_then(TransactionBuilder::build)
            .map_err(classify_builder_error)?;
        let prepared = prepare_transaction(node, envelope, &settings.network_passphrase)
            .await
            .map_err(classify_preparation_error)?;

        advance(tracker, context, logger, TxStatus::Signing);
        let unsigned_wire = prepared.to_wire().map_err(classify_builder_error)?;
        let signed_wire = self
            .wallet
            .sign_transaction(&unsigned_wire, &settings.network_passphrase, caller)
            .await
            .map_err(classify_wallet_error)?;
        let signed = prepared
            .accept_signed(&signed_wire)
            .map_err(classify_builder_error)?;

        advance(tracker, context, logger, TxStatus::Submitting);
        let receipt = submit(node, &signed).await?;
        logger.log_submitted(&receipt.transaction_hash);

        advance(tracker, context, logger, TxStatus::Pending);
        let polled = poll_confirmation(
            node,
            &receipt.transaction_hash,
            &settings.policy,
            &settings.explorer_base_url,
        )
        .await?;
        logger.log_poll(
            &receipt.transaction_hash,
            polled.attempts,
            settings.policy.max_poll_attempts,
        );

        advance(tracker, context, logger, TxStatus::Success);
        let value = match &polled.return_value {
            None | Some(ScVal::Void) => None,
            Some(value) => Some(scval_to_native(value)),
        };
        Ok(CallOutcome {
            value,
            return_value: polled.return_value,
            transaction_hash: receipt.transaction_hash,
            ledger: polled.ledger,
            poll_attempts: polled.attempts,
        })
    }
}

fn advance(
    tracker: &mut StatusTracker<'_>,
    context: &TraceContext,
    logger: &CallLogger,
    status: TxStatus,
) {
    if tracker.advance(status) {
        logger.log_stage(&context.stage(status), status, context.elapsed_ms());
    }
}

/// An orchestrator bound to one contract and its function table
#[derive(Clone)]
pub struct ContractClient {
    orchestrator: CallOrchestrator,
    contract: ContractConfig,
}

impl ContractClient {
    pub fn new(orchestrator: CallOrchestrator, contract: ContractConfig) -> Self {
        Self {
            orchestrator,
            contract,
        }
    }

    pub fn contract(&self) -> &ContractConfig {
        &self.contract
    }

    /// Invoke `function` after checking it against the function table.
    ///
    /// Unknown functions and wrongly typed or counted arguments fail before any
    /// network call is made; the observer still sees `Failed`.
    pub async fn invoke(
        &self,
        caller: Option<&str>,
        function: &str,
        args: Vec<ScVal>,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<CallOutcome, ClassifiedError> {
        self.invoke_encoded(caller, function, Ok(args), observer).await
    }

    /// [`Self::invoke`] for an argument list whose encoding may have failed.
    /// An encoding failure is reported like any other pre-flight failure.
    pub async fn invoke_encoded(
        &self,
        caller: Option<&str>,
        function: &str,
        args: Result<Vec<ScVal>, ClassifiedError>,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<CallOutcome, ClassifiedError> {
        let args = match args.and_then(|args| self.check(function, args)) {
            Ok(args) => args,
            Err(err) => {
                return Err(self
                    .orchestrator
                    .reject(&self.contract.address, function, err, observer))
            }
        };
        let request = CallRequest::new(
            self.contract.address.clone(),
            function,
            args,
            caller.map(str::to_string),
        );
        self.orchestrator.call(request, observer).await
    }

    fn check(&self, function: &str, args: Vec<ScVal>) -> Result<CallArgs, ClassifiedError> {
        let spec = self.contract.function(function).ok_or_else(|| {
            ClassifiedError::unknown(format!(
                "{} contract has no function named {}",
                self.contract.label, function
            ))
        })?;
        spec.check_args(&args).map_err(|reason| {
            ClassifiedError::unknown(format!("{}.{}: {}", self.contract.label, function, reason))
        })?;

        Ok(match args.len() {
            0 => CallArgs::None,
            1 => CallArgs::from(args.into_iter().next()),
            _ => CallArgs::Many(args),
        })
    }
}
