//! ledger-call - command line front end
//!
//! Runs one contract call through the orchestrator and prints the outcome as
//! JSON, or lists a configured contract's function table.
//!
//! ```text
//! ledger-call call --contract nfts --function get_total_count --caller G...
//! ledger-call call --contract feedback --function send_feedback \
//!     --caller G... --arg string:"great game"
//! ledger-call functions --contract clubs
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_call::codec::ScVal;
use ledger_call::config::Config;
use ledger_call::contracts::{self, ParamKind};
use ledger_call::metrics::metrics;
use ledger_call::rpc_manager::HttpLedgerNode;
use ledger_call::wallet::{ProcessWallet, WalletError, WalletSigner};
use ledger_call::{
    CallArgs, CallOrchestrator, CallRequest, ClassifiedError, ContractClient, EngineSettings,
    TxStatus,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "ledger-call.toml", global = true)]
    config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print Prometheus metrics after the command finishes
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Invoke a contract function and wait for confirmation
    Call {
        /// Contract label (clubs, nfts, feedback) or a contract address
        #[arg(long)]
        contract: String,

        #[arg(long)]
        function: String,

        /// Signer / source account address
        #[arg(long, env = "LEDGER_CALLER")]
        caller: Option<String>,

        /// Argument as <type>:<value>; repeat in call order
        #[arg(long = "arg", value_name = "TYPE:VALUE")]
        args: Vec<String>,
    },

    /// List the functions of a configured contract
    Functions {
        #[arg(long)]
        contract: String,
    },
}

/// Signer used when no signer command is configured
struct UnconfiguredWallet;

#[async_trait]
impl WalletSigner for UnconfiguredWallet {
    async fn sign_transaction(
        &self,
        _envelope_wire: &str,
        _network_passphrase: &str,
        _signer: &str,
    ) -> Result<String, WalletError> {
        Err(WalletError::Unavailable(
            "no signer command configured (wallet.command or LEDGER_WALLET_COMMAND)".to_string(),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    init_logging(args.verbose, args.json_logs)?;

    let config = Config::from_file_with_env(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;
    config.validate().context("Invalid configuration")?;

    let code = match &args.command {
        Command::Functions { contract } => list_functions(&config, contract)?,
        Command::Call {
            contract,
            function,
            caller,
            args: raw_args,
        } => run_call(&config, contract, function, caller.clone(), raw_args).await?,
    };

    if args.print_metrics && config.monitoring.enable_metrics {
        println!("{}", metrics().gather_text()?);
    }
    Ok(code)
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let default_filter = if verbose {
        "ledger_call=debug,info"
    } else {
        "ledger_call=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }
    Ok(())
}

fn list_functions(config: &Config, label: &str) -> Result<ExitCode> {
    let contract = contracts::by_name(label, &config.contracts)
        .ok_or_else(|| anyhow!("unknown contract label: {}", label))?;
    println!("{} ({})", contract.label, contract.address);
    for function in contract.functions {
        println!("  {}", function.signature());
    }
    Ok(ExitCode::SUCCESS)
}

/// `<type>:<value>`, e.g. `u64:7` or `string:hello`
fn parse_typed_arg(raw: &str) -> Result<ScVal> {
    let (kind, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("argument {:?} is not in <type>:<value> form", raw))?;
    let kind: ParamKind = kind.parse().map_err(|e: String| anyhow!(e))?;
    kind.parse_value(value)
        .with_context(|| format!("argument {:?}", raw))
}

async fn run_call(
    config: &Config,
    contract: &str,
    function: &str,
    caller: Option<String>,
    raw_args: &[String],
) -> Result<ExitCode> {
    let args = raw_args
        .iter()
        .map(|raw| parse_typed_arg(raw))
        .collect::<Result<Vec<_>>>()?;

    let node = HttpLedgerNode::from_config(&config.node)?;
    info!(endpoint = %node.endpoint(), "Using ledger node");

    let wallet: Arc<dyn WalletSigner> = match ProcessWallet::from_config(&config.wallet) {
        Some(wallet) => Arc::new(wallet),
        None => {
            warn!("No signer configured; calls will fail at the signing stage");
            Arc::new(UnconfiguredWallet)
        }
    };
    let engine = CallOrchestrator::new(Arc::new(node), wallet, EngineSettings::from_config(config));

    let observer = |status: TxStatus| {
        info!(status = %status, label = status.label(), "Call status");
    };

    let result = match contracts::by_name(contract, &config.contracts) {
        Some(table) => {
            ContractClient::new(engine, table)
                .invoke(caller.as_deref(), function, args, Some(&observer))
                .await
        }
        None => {
            let request = CallRequest::new(contract, function, CallArgs::Many(args), caller);
            engine.call(request, Some(&observer)).await
        }
    };

    match result {
        Ok(outcome) => {
            let report = serde_json::json!({
                "value": outcome.value,
                "hash": outcome.transaction_hash,
                "explorer": outcome.explorer_url(&config.explorer.base_url),
                "ledger": outcome.ledger,
                "poll_attempts": outcome.poll_attempts,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            report_failure(&err);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report_failure(err: &ClassifiedError) {
    eprintln!("[{}] {}: {}", err.severity(), err.kind, err.user_message());
    if err.user_message() != err.message {
        eprintln!("  detail: {}", err.message);
    }
}
