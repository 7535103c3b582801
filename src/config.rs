//! Configuration management for the voter
//!
//! Loads configuration from a TOML file with environment variable substitution,
//! so the signing key and endpoint can come from `.env` or CI secrets.

use crate::tx::gas::gwei_to_wei;

use anyhow::{Context, Result};
use ethers::types::Address;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub rpc: RpcConfig,
    pub account: AccountConfig,
    pub vote: VoteConfig,
    pub fees: FeeConfig,
    #[serde(default)]
    pub campaign: CampaignConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    pub url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Clone, Deserialize)]
pub struct AccountConfig {
    pub address: String,
    pub private_key: String,
}

// Keep the key out of logs.
impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoteConfig {
    pub contract_address: String,
    pub chain_id: u64,
    /// Hex call data; defaults to the `vote()` selector
    pub call_data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeeConfig {
    /// Fee per gas in gwei, as a decimal string (e.g. "0.234")
    pub rate_gwei: String,
    /// Optional fee cap in gwei; when absent the cap equals the rate
    pub max_fee_gwei: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    #[serde(default = "default_attempt_delay_secs")]
    pub attempt_delay_secs: u64,
    #[serde(default = "default_suppressed_error_alert_threshold")]
    pub suppressed_error_alert_threshold: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_attempts() -> u32 {
    80
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_confirmation_timeout_secs() -> u64 {
    300
}

fn default_attempt_delay_secs() -> u64 {
    5
}

fn default_suppressed_error_alert_threshold() -> u32 {
    5
}

fn default_metrics_port() -> u16 {
    9464
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            poll_interval_secs: default_poll_interval_secs(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            attempt_delay_secs: default_attempt_delay_secs(),
            suppressed_error_alert_threshold: default_suppressed_error_alert_threshold(),
        }
    }
}

impl CampaignConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn attempt_delay(&self) -> Duration {
        Duration::from_secs(self.attempt_delay_secs)
    }
}

impl Settings {
    /// Path of the configuration file: `VOTER_CONFIG` or `config/default.toml`
    pub fn default_path() -> PathBuf {
        env::var("VOTER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"))
    }

    /// Load settings from a configuration file
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::parse(&config_str)
    }

    /// Parse settings from TOML text after substituting environment variables
    pub fn parse(config_str: &str) -> Result<Self> {
        let config_str = substitute_env_vars(config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.rpc.url.trim().is_empty() {
            anyhow::bail!("RPC URL is empty");
        }

        self.account
            .address
            .parse::<Address>()
            .with_context(|| format!("Invalid account address: {:?}", self.account.address))?;
        if self.account.private_key.trim().is_empty() {
            anyhow::bail!("Private key is empty");
        }

        self.vote
            .contract_address
            .parse::<Address>()
            .with_context(|| {
                format!("Invalid contract address: {:?}", self.vote.contract_address)
            })?;
        if let Some(ref data) = self.vote.call_data {
            hex::decode(data.trim_start_matches("0x"))
                .with_context(|| format!("Invalid call data: {:?}", data))?;
        }

        let rate = gwei_to_wei(&self.fees.rate_gwei)
            .map_err(|e| anyhow::anyhow!("Invalid fee rate {:?}: {}", self.fees.rate_gwei, e))?;
        if let Some(ref cap) = self.fees.max_fee_gwei {
            let cap_wei =
                gwei_to_wei(cap).map_err(|e| anyhow::anyhow!("Invalid max fee {:?}: {}", cap, e))?;
            if cap_wei < rate {
                anyhow::bail!(
                    "max_fee_gwei ({}) is below rate_gwei ({})",
                    cap,
                    self.fees.rate_gwei
                );
            }
        }

        if self.campaign.attempts == 0 {
            anyhow::bail!("Campaign must run at least one attempt");
        }
        if self.campaign.poll_interval_secs == 0 {
            anyhow::bail!("Poll interval must be positive");
        }
        if self.campaign.suppressed_error_alert_threshold == 0 {
            anyhow::bail!("suppressed_error_alert_threshold must be at least 1");
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static regex");

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
