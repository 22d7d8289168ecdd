//! RelayTip — rank network relays, mint forwarding addresses, sweep payments.

mod config;

use anyhow::Context;
use clap::Parser;
use config::DaemonConfig;
use relaytip_crypto::KeySeed;
use relaytip_ledger::{AddressLedger, ExpiryPolicy};
use relaytip_relays::{determine_relays, donation_split, Dataset, QuerySpec};
use relaytip_store::{FileStore, LedgerStore};
use relaytip_sweep::{HttpOracle, PaymentSweeper, SweepConfig};
use relaytip_types::{DonationSplit, Timestamp};
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding the address derivation seed.
const KEY_SEED_ENV: &str = "RELAYTIP_KEY_SEED";

#[derive(Parser)]
#[command(name = "relaytip", about = "Relay donation ranking and payment forwarding")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings are
    /// used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Relay details document for ranking queries.
    #[arg(long, env = "RELAYTIP_DATASET")]
    dataset: Option<PathBuf>,

    /// Ledger store file.
    #[arg(long, env = "RELAYTIP_STORE")]
    store: Option<PathBuf>,

    /// Base URL of the chain oracle.
    #[arg(long, env = "RELAYTIP_ORACLE_URL")]
    oracle_url: Option<String>,

    /// Miner fee per 1000 bytes, satoshis.
    #[arg(long, env = "RELAYTIP_FEE_PER_KB")]
    fee_per_kb: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Rank relays and print the weighted selection.
    Rank {
        /// Ranking options as key=value pairs, e.g. --opt top=10 --opt by_country=true.
        #[arg(long = "opt", value_name = "KEY=VALUE")]
        opts: Vec<String>,
    },
    /// Rank relays and mint a forwarding address bound to the resulting split.
    Donate {
        #[arg(long = "opt", value_name = "KEY=VALUE")]
        opts: Vec<String>,
    },
    /// Sweep one forwarding address regardless of its age.
    Forward {
        /// The forwarding address to sweep.
        address: String,
    },
    /// Sweep every unswept address inside the eligibility window.
    Check {
        /// Ignore the window and check every unswept address.
        #[arg(long)]
        all: bool,
    },
    /// Print the running donation total in satoshis.
    Total,
}

fn load_config(cli: &Cli) -> DaemonConfig {
    let mut config = if let Some(ref config_path) = cli.config {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str::<DaemonConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("loaded config from {}", config_path.display());
                    cfg
                }
                Err(e) => {
                    tracing::warn!("failed to parse config file: {e}, using defaults");
                    DaemonConfig::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "failed to read config file {}: {e}, using defaults",
                    config_path.display()
                );
                DaemonConfig::default()
            }
        }
    } else {
        DaemonConfig::default()
    };

    if let Some(ref dataset) = cli.dataset {
        config.dataset_path = dataset.clone();
    }
    if let Some(ref store) = cli.store {
        config.store_path = store.clone();
    }
    if let Some(ref oracle_url) = cli.oracle_url {
        config.oracle_url = oracle_url.clone();
    }
    if let Some(fee_per_kb) = cli.fee_per_kb {
        config.fee_per_kb = fee_per_kb;
    }
    config
}

/// Parse repeated `key=value` ranking options into a query spec.
fn query_spec(opts: &[String]) -> QuerySpec {
    let pairs: Vec<(&str, &str)> = opts
        .iter()
        .filter_map(|opt| opt.split_once('='))
        .collect();
    QuerySpec::from_params(pairs)
}

/// The derivation seed comes from the environment only; it never appears in
/// a config file or on the command line.
fn key_seed() -> anyhow::Result<KeySeed> {
    let seed = std::env::var(KEY_SEED_ENV)
        .with_context(|| format!("{KEY_SEED_ENV} is not set"))?;
    anyhow::ensure!(!seed.is_empty(), "{KEY_SEED_ENV} is empty");
    Ok(KeySeed::new(seed.into_bytes()))
}

/// Mint a forwarding address for the ranked split, as a printable payload.
///
/// A selection with no payable relays is a fail answer, not a fault: the
/// caller gets the same status-body shape the sweep commands produce.
fn donate_payload(ledger: &AddressLedger, split: DonationSplit) -> serde_json::Value {
    if split.is_empty() {
        return serde_json::json!({
            "status": "fail",
            "data": {
                "message": "no relays with donation addresses matched the query",
                "code": 404,
            },
        });
    }
    match ledger.create(split) {
        Ok(record) => serde_json::json!({
            "status": "success",
            "data": {
                "id": record.id,
                "address": record.address,
                "outputs": record.outputs,
            },
        }),
        Err(e) => serde_json::json!({
            "status": "error",
            "message": e.to_string(),
        }),
    }
}

fn open_store(config: &DaemonConfig) -> anyhow::Result<Arc<FileStore>> {
    let store = FileStore::open(&config.store_path)
        .with_context(|| format!("opening ledger store {}", config.store_path.display()))?;
    Ok(Arc::new(store))
}

fn sweeper(
    config: &DaemonConfig,
    store: Arc<FileStore>,
) -> anyhow::Result<PaymentSweeper<HttpOracle>> {
    let oracle = HttpOracle::new(config.oracle_url.clone(), config.http_timeout_secs)?;
    Ok(PaymentSweeper::new(
        oracle,
        store,
        SweepConfig {
            fee_per_kb: config.fee_per_kb,
            min_output: config.min_output,
        },
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    match cli.command {
        Command::Rank { opts } => {
            let mut dataset = Dataset::load(&config.dataset_path)?;
            dataset.annotate();
            let set = determine_relays(&dataset, &query_spec(&opts));
            println!("{}", serde_json::to_string_pretty(&set)?);
        }
        Command::Donate { opts } => {
            let mut dataset = Dataset::load(&config.dataset_path)?;
            dataset.annotate();
            let set = determine_relays(&dataset, &query_spec(&opts));
            let split = donation_split(&set);

            let store = open_store(&config)?;
            let ledger = AddressLedger::new(store, key_seed()?);
            let payload = donate_payload(&ledger, split);
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Forward { address } => {
            let store = open_store(&config)?;
            let outcome = sweeper(&config, store)?.sweep_address(&address).await;
            println!("{}", serde_json::to_string_pretty(&outcome.to_payload())?);
            if matches!(outcome, relaytip_sweep::Outcome::Error { .. }) {
                std::process::exit(1);
            }
        }
        Command::Check { all } => {
            let store = open_store(&config)?;
            let policy = ExpiryPolicy::new(config.sweep_window_secs, config.expire_stale);
            let reports = sweeper(&config, store)?
                .sweep_eligible(&policy, Timestamp::now(), all)
                .await?;
            for report in reports {
                let mut payload = report.outcome.to_payload();
                payload["address"] = serde_json::Value::String(report.address);
                println!("{payload}");
            }
        }
        Command::Total => {
            let store = open_store(&config)?;
            println!(
                "{}",
                serde_json::json!({ "satoshis_donated": store.running_total()? })
            );
        }
    }

    Ok(())
}
