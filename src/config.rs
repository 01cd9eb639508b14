//! Configuration management for the subscription charger
//!
//! Loads configuration from TOML files with environment variable substitution.

use crate::chains::{self, NetworkDescriptor};
use crate::scheduler::DailySchedule;

use anyhow::{Context, Result};
use ethers::types::Address;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub charger: ChargerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    pub network: NetworkConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChargerConfig {
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    /// Upper bound on the confirmation wait; unbounded when absent
    pub confirmation_timeout_secs: Option<u64>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// UTC time of day, `HH:MM:SS`
    #[serde(default = "default_schedule_time")]
    pub time: String,
    #[serde(default)]
    pub autostart: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_chain")]
    pub chain: String,
    /// Overrides the RPC endpoint from the network table
    pub rpc_url: Option<String>,
    pub contract_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("cron.log")
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_schedule_time() -> String {
    "00:00:02".to_string()
}

fn default_chain() -> String {
    chains::default_network().key.to_string()
}

fn default_private_key_env() -> String {
    "WALLET_PRIVATE_KEY".to_string()
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for ChargerConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            confirmation_timeout_secs: None,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            time: default_schedule_time(),
            autostart: false,
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: default_private_key_env(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Settings {
    /// Load settings from configuration files
    pub fn load() -> Result<Self> {
        let config_path = env::var("CHARGER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let mut settings = Self::parse(&config_str)?;

        if let Ok(port) = env::var("PORT") {
            settings.api.port = port
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
        }

        Ok(settings)
    }

    /// Parse and validate a configuration document
    pub fn parse(config_str: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        let network = chains::by_key(&self.network.chain)
            .with_context(|| unknown_network(&self.network.chain))?;
        if network.unsupported {
            tracing::warn!("Network {} is marked unsupported", network.name);
        }

        self.contract_address()?;
        self.schedule()?;

        if self.wallet.private_key_env.is_empty() {
            anyhow::bail!("wallet.private_key_env must name an environment variable");
        }

        Ok(())
    }

    /// Network selected by `network.chain`
    pub fn network(&self) -> Result<&'static NetworkDescriptor> {
        chains::by_key(&self.network.chain)
            .with_context(|| unknown_network(&self.network.chain))
    }

    /// RPC endpoint, honouring the override
    pub fn rpc_url(&self) -> Result<String> {
        match &self.network.rpc_url {
            Some(url) if !url.is_empty() => Ok(url.clone()),
            _ => Ok(self.network()?.rpc_url.to_string()),
        }
    }

    /// Parsed SubscriptionManager address
    pub fn contract_address(&self) -> Result<Address> {
        self.network
            .contract_address
            .parse()
            .with_context(|| {
                format!(
                    "Invalid contract address: {:?}",
                    self.network.contract_address
                )
            })
    }

    /// Parsed daily schedule
    pub fn schedule(&self) -> Result<DailySchedule> {
        self.scheduler
            .time
            .parse()
            .with_context(|| format!("Invalid schedule time: {}", self.scheduler.time))
    }
}

fn unknown_network(key: &str) -> String {
    let known: Vec<&str> = chains::all().iter().map(|n| n.key).collect();
    format!("Unknown network: {} (known: {})", key, known.join(", "))
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    lazy_static::lazy_static! {
        static ref ENV_VAR: regex::Regex =
            regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    }

    let mut result = input.to_string();
    for cap in ENV_VAR.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
