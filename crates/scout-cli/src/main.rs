use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, Context, Result};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use scout_core::{Evidence, PendingTransaction, ScoutConfig};
use scout_detect::{AnyCreditHeuristic, TxForger};
use scout_pipeline::{MemoryBackend, Pipeline};
use scout_sim::{HeaderContext, SnapshotState};
use serde::Deserialize;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scout")]
#[command(about = "Mempool front-run opportunity scout")]
#[command(version)]
struct Cli {
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Path to a JSON configuration file; identity and key come from
    /// the environment when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a captured pool snapshot against a state fixture.
    Replay(ReplayArgs),
    /// Show the configured impersonating identity.
    Identity,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// JSON fixture with state, header, and observed transactions.
    #[arg(long)]
    fixture: PathBuf,

    /// Also report any positive third-party credit, not just transfers
    /// above the configured thresholds.
    #[arg(long)]
    loose: bool,

    #[arg(long, default_value = "table")]
    output: String,
}

/// Self-contained replay scenario: a chain head plus the transactions
/// observed against it.
#[derive(Debug, Deserialize)]
struct Fixture {
    header: FixtureHeader,
    #[serde(default)]
    accounts: Vec<FixtureAccount>,
    #[serde(default)]
    contracts: Vec<FixtureContract>,
    #[serde(default)]
    pool_nonces: HashMap<Address, u64>,
    transactions: Vec<PendingTransaction>,
}

#[derive(Debug, Deserialize)]
struct FixtureHeader {
    number: u64,
    timestamp: u64,
    gas_limit: u64,
    #[serde(default)]
    base_fee: u128,
    #[serde(default)]
    coinbase: Address,
}

#[derive(Debug, Deserialize)]
struct FixtureAccount {
    address: Address,
    balance: U256,
    #[serde(default)]
    nonce: u64,
}

#[derive(Debug, Deserialize)]
struct FixtureContract {
    address: Address,
    code: Bytes,
    #[serde(default)]
    storage: HashMap<U256, U256>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    let cfg = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Replay(args) => handle_replay(cfg, args).await,
        Commands::Identity => handle_identity(cfg),
    }
}

fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::WARN
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .wrap_err("failed to initialize tracing filter")?;

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Load configuration, with environment identity taking precedence
/// over the file.
fn load_config(path: Option<&std::path::Path>) -> Result<ScoutConfig> {
    let Some(path) = path else {
        return ScoutConfig::from_env();
    };

    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let mut cfg: ScoutConfig = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("failed to parse config {}", path.display()))?;

    if let Ok(address) = std::env::var(scout_core::config::ENV_ADDRESS) {
        cfg.identity = address
            .parse()
            .wrap_err_with(|| format!("{} is not a valid address", scout_core::config::ENV_ADDRESS))?;
    }
    if let Ok(key) = std::env::var(scout_core::config::ENV_PRIVATE_KEY) {
        cfg.private_key = key;
    }

    Ok(cfg)
}

async fn handle_replay(cfg: ScoutConfig, args: ReplayArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.fixture)
        .wrap_err_with(|| format!("failed to read {}", args.fixture.display()))?;
    let fixture: Fixture = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("failed to parse fixture {}", args.fixture.display()))?;

    let mut state = SnapshotState::new();
    for account in &fixture.accounts {
        state.insert_eoa(account.address, account.balance, account.nonce);
    }
    for contract in &fixture.contracts {
        state.insert_contract(contract.address, contract.code.clone());
        for (slot, value) in &contract.storage {
            state.insert_storage(contract.address, *slot, *value);
        }
    }

    let header = HeaderContext {
        number: fixture.header.number,
        timestamp: fixture.header.timestamp,
        gas_limit: fixture.header.gas_limit,
        base_fee: fixture.header.base_fee,
        coinbase: fixture.header.coinbase,
    };

    let mut backend = MemoryBackend::new(header, state);
    for (address, nonce) in &fixture.pool_nonces {
        backend = backend.with_pool_nonce(*address, *nonce);
    }

    let mut pipeline = Pipeline::new(cfg, Arc::new(backend))?;
    if args.loose {
        pipeline = pipeline.with_heuristic(Box::new(AnyCreditHeuristic));
    }

    let mut findings = Vec::new();
    let mut abandoned = 0usize;
    for tx in &fixture.transactions {
        match pipeline.analyze_transaction(tx).await {
            Ok(Some(evidence)) => findings.push(evidence),
            Ok(None) => {}
            Err(err) => {
                abandoned += 1;
                tracing::warn!(tx_hash = %tx.hash, %err, "analysis abandoned");
            }
        }
    }

    match args.output.to_lowercase().as_str() {
        "table" => print_findings_table(&findings),
        "json" => {
            let json =
                serde_json::to_string_pretty(&findings).wrap_err("failed to serialize JSON")?;
            println!("{json}");
        }
        other => return Err(eyre!("unknown output format '{other}'; use 'table' or 'json'")),
    }

    info!(
        transactions = fixture.transactions.len(),
        opportunities = findings.len(),
        abandoned,
        cached_creations = pipeline.shadow_cache().len(),
        "replay completed"
    );

    Ok(())
}

fn print_findings_table(findings: &[Evidence]) {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Source Tx", "Token", "Amount (wei)", "Recipient", "Heuristic"]);

    for evidence in findings {
        table.add_row(vec![
            truncate_hex(&format!("{:#x}", evidence.source_tx)),
            format!("{:#x}", evidence.token),
            evidence.amount.to_string(),
            truncate_hex(&format!("{:#x}", evidence.recipient)),
            evidence.heuristic.to_string(),
        ]);
    }

    println!("\n{table}\n");
}

fn handle_identity(cfg: ScoutConfig) -> Result<()> {
    let forger = TxForger::new(&cfg)?;

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Configured address", &format!("{:#x}", cfg.identity)]);
    table.add_row(vec!["Derived from key", &format!("{:#x}", forger.identity())]);
    table.add_row(vec!["Blacklisted contracts", &cfg.blacklist.len().to_string()]);
    table.add_row(vec!["Token thresholds", &cfg.thresholds.len().to_string()]);
    println!("\n{table}\n");

    Ok(())
}

/// Truncate a hex hash/address for compact table display.
fn truncate_hex(value: &str) -> String {
    if value.len() > 14 {
        format!("{}…{}", &value[..8], &value[value.len() - 4..])
    } else {
        value.to_string()
    }
}
