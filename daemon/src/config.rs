//! Daemon configuration.

use serde::Deserialize;
use std::path::PathBuf;

fn default_dataset_path() -> PathBuf {
    PathBuf::from("./details.json")
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./relaytip_ledger.json")
}

fn default_oracle_url() -> String {
    "https://blockchain.info".to_string()
}

fn default_fee_per_kb() -> u64 {
    relaytip_sweep::DEFAULT_FEE_PER_KB
}

fn default_min_output() -> u64 {
    relaytip_sweep::MIN_OUTPUT
}

fn default_sweep_window_secs() -> u64 {
    relaytip_ledger::expiry::DEFAULT_WINDOW_SECS
}

fn default_expire_stale() -> bool {
    true
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings read from the TOML config file; CLI flags and environment
/// variables override them. The key seed is deliberately absent here and is
/// only ever taken from the environment.
#[derive(Clone, Debug, Deserialize)]
pub struct DaemonConfig {
    /// Relay details document consumed by ranking queries.
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Ledger store file.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Base URL of the chain oracle.
    #[serde(default = "default_oracle_url")]
    pub oracle_url: String,

    /// Miner fee per 1000 bytes, satoshis.
    #[serde(default = "default_fee_per_kb")]
    pub fee_per_kb: u64,

    /// Smallest transaction output worth creating, satoshis.
    #[serde(default = "default_min_output")]
    pub min_output: u64,

    /// How long a forwarding address stays eligible for batch sweeps.
    #[serde(default = "default_sweep_window_secs")]
    pub sweep_window_secs: u64,

    /// Mark entries outside the window as expired instead of retrying them.
    #[serde(default = "default_expire_stale")]
    pub expire_stale: bool,

    /// Timeout for chain oracle requests.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            store_path: default_store_path(),
            oracle_url: default_oracle_url(),
            fee_per_kb: default_fee_per_kb(),
            min_output: default_min_output(),
            sweep_window_secs: default_sweep_window_secs(),
            expire_stale: default_expire_stale(),
            http_timeout_secs: default_http_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}
