//! Configuration module for the ledger call orchestrator
//!
//! This module handles configuration loading from TOML files and
//! `LEDGER_*` environment variables, and provides structured configuration types.

use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::codec::{Address, AddressKind};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote ledger node
    #[serde(default)]
    pub node: NodeConfig,

    /// Fee, validity and polling policy
    #[serde(default)]
    pub policy: CallPolicy,

    /// Deployed contract addresses
    #[serde(default)]
    pub contracts: ContractsConfig,

    /// Out-of-process signer
    #[serde(default)]
    pub wallet: WalletConfig,

    /// Transaction lookup links
    #[serde(default)]
    pub explorer: ExplorerConfig,

    /// Monitoring and metrics
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// JSON-RPC endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Network passphrase every envelope is bound to
    #[serde(default = "default_network_passphrase")]
    pub network_passphrase: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Per-instance call parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallPolicy {
    /// Base inclusion fee (stroops)
    #[serde(default = "default_base_fee")]
    pub base_fee: u32,

    /// Validity window of a built transaction in seconds
    #[serde(default = "default_validity_secs")]
    pub validity_secs: u64,

    /// Delay between confirmation queries in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of confirmation queries
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    #[serde(default = "default_clubs_contract")]
    pub clubs: String,

    #[serde(default = "default_nfts_contract")]
    pub nfts: String,

    #[serde(default = "default_feedback_contract")]
    pub feedback: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Signer executable; empty means no wallet is configured
    #[serde(default)]
    pub command: String,

    /// Extra arguments passed to the signer
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default = "default_explorer_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub enable_metrics: bool,
}

// Default value functions
fn default_endpoint() -> String { "https://soroban-testnet.stellar.org:443".to_string() }
fn default_network_passphrase() -> String { "Test SDF Network ; September 2015".to_string() }
fn default_request_timeout() -> u64 { 30 }
fn default_base_fee() -> u32 { 100 }
fn default_validity_secs() -> u64 { 30 }
fn default_poll_interval_ms() -> u64 { 1_000 }
fn default_max_poll_attempts() -> u32 { 15 }
fn default_clubs_contract() -> String { "CAJ6DMM56A3EMMRE4SUFEZDUIUSR6FIIOVQTNCLC5H65QQOJC324WB4B".to_string() }
fn default_nfts_contract() -> String { "CAGXJUI4GWABBGDQK5XWCYMLBOW77ABCBAAZWI5KXBLQ73FPCD7BDGMG".to_string() }
fn default_feedback_contract() -> String { "CBK6DMOHM7I7G3IDNQS7JAJOCJ4XVO5SLXP6KHQAWNVTKW5YHETSE5UA".to_string() }
fn default_explorer_url() -> String { "https://stellar.expert/explorer/testnet".to_string() }
fn default_true() -> bool { true }

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            network_passphrase: default_network_passphrase(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            base_fee: default_base_fee(),
            validity_secs: default_validity_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }
}

impl CallPolicy {
    pub fn with_base_fee(mut self, base_fee: u32) -> Self {
        self.base_fee = base_fee;
        self
    }

    pub fn with_validity_secs(mut self, secs: u64) -> Self {
        self.validity_secs = secs;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            clubs: default_clubs_contract(),
            nfts: default_nfts_contract(),
            feedback: default_feedback_contract(),
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: default_explorer_url(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("parsing config file {}", path))?;
        Ok(config)
    }

    /// Load configuration with `.env` and environment variable overrides.
    ///
    /// A missing file falls back to the defaults.
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = if std::path::Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `LEDGER_*` overrides read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LEDGER_RPC_URL") {
            self.node.endpoint = url;
        }
        if let Some(passphrase) = lookup("LEDGER_NETWORK_PASSPHRASE") {
            self.node.network_passphrase = passphrase;
        }
        if let Some(fee) = lookup("LEDGER_BASE_FEE") {
            self.policy.base_fee = fee
                .parse()
                .with_context(|| format!("LEDGER_BASE_FEE={}", fee))?;
        }
        if let Some(interval) = lookup("LEDGER_POLL_INTERVAL_MS") {
            self.policy.poll_interval_ms = interval
                .parse()
                .with_context(|| format!("LEDGER_POLL_INTERVAL_MS={}", interval))?;
        }
        if let Some(attempts) = lookup("LEDGER_MAX_POLL_ATTEMPTS") {
            self.policy.max_poll_attempts = attempts
                .parse()
                .with_context(|| format!("LEDGER_MAX_POLL_ATTEMPTS={}", attempts))?;
        }
        if let Some(command) = lookup("LEDGER_WALLET_COMMAND") {
            self.wallet.command = command;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.node.endpoint.trim().is_empty() {
            bail!("node.endpoint must not be empty");
        }
        if self.node.network_passphrase.is_empty() {
            bail!("node.network_passphrase must not be empty");
        }
        if self.policy.max_poll_attempts == 0 {
            bail!("policy.max_poll_attempts must be at least 1");
        }
        if self.policy.validity_secs == 0 {
            bail!("policy.validity_secs must be at least 1");
        }
        for (name, address) in [
            ("clubs", &self.contracts.clubs),
            ("nfts", &self.contracts.nfts),
            ("feedback", &self.contracts.feedback),
        ] {
            match Address::parse(address) {
                Ok(addr) if addr.kind() == AddressKind::Contract => {}
                _ => bail!("contracts.{} is not a contract address: {}", name, address),
            }
        }
        Ok(())
    }
}
