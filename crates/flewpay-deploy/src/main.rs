//! FlewPay deploy tool.
//!
//! Replays a deployment of the token ledger, custody bridge and settlement
//! engine from a JSON config file and/or environment, prints the resulting
//! addresses, and can run a deposit → liquidation cycle against them.
//!
//! Environment (also read from `.env`):
//! - `FLEWPAY_CONFIG`: path to a JSON `DeploymentConfig`
//! - `FLEWPAY_DEPLOYER`, `FLEWPAY_EXTERNAL_ASSET`, `FLEWPAY_COMPANY_WALLET`:
//!   override the matching config fields
//! - `RUST_LOG`: log filter (default `info`)

mod deployment;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use flewpay_types::{AccountId, DeploymentConfig, TokenAmount};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use deployment::Deployment;

/// Account funded from the asset faucet during `simulate`.
const SIMULATION_DEPOSITOR: AccountId = AccountId([0x11; 20]);
/// Account paid by the depositor and then liquidated during `simulate`.
const SIMULATION_MERCHANT: AccountId = AccountId([0x22; 20]);

#[derive(Parser)]
#[command(name = "flewpay-deploy")]
#[command(about = "Deploy the FlewPay ledger, custody bridge and settlement engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Deployment config file (JSON)
    #[arg(short, long, env = "FLEWPAY_CONFIG")]
    config: Option<PathBuf>,

    /// Deploying account; becomes the ledger's initial owner
    #[arg(long, env = "FLEWPAY_DEPLOYER")]
    deployer: Option<AccountId>,

    /// External asset taken into custody; a mock is deployed when absent
    #[arg(long, env = "FLEWPAY_EXTERNAL_ASSET")]
    external_asset: Option<AccountId>,

    /// Payee of every liquidation
    #[arg(long, env = "FLEWPAY_COMPANY_WALLET")]
    company_wallet: Option<AccountId>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy and print the deployed addresses
    Deploy,

    /// Deploy, then bridge a deposit and liquidate part of it
    Simulate {
        /// Tokens to bridge in
        #[arg(long, default_value = "100")]
        deposit: Decimal,

        /// Tokens paid to the merchant and liquidated
        #[arg(long, default_value = "40")]
        settle: Decimal,
    },
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = resolve_config(&cli)?;
    let mut deployment = Deployment::deploy(&config).context("deployment failed")?;

    match cli.command {
        Commands::Deploy => {
            print_json(&deployment.manifest())?;
        }
        Commands::Simulate { deposit, settle } => {
            let deposit = TokenAmount::from_decimal(deposit).context("invalid --deposit")?;
            let settle = TokenAmount::from_decimal(settle).context("invalid --settle")?;
            let report = deployment
                .simulate(SIMULATION_DEPOSITOR, SIMULATION_MERCHANT, deposit, settle)
                .context("simulation failed")?;
            print_json(&report)?;
        }
    }
    Ok(())
}

/// Logs go to stderr so stdout carries only the JSON output.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Config file first, then flags / environment on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<DeploymentConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DeploymentConfig::new(AccountId::ZERO, AccountId::ZERO),
    };
    if let Some(deployer) = cli.deployer {
        config.deployer = deployer;
    }
    if let Some(asset) = cli.external_asset {
        config.external_asset = Some(asset);
    }
    if let Some(wallet) = cli.company_wallet {
        config.company_wallet = wallet;
    }
    config.validate().context(
        "deployer and company wallet must be set via flags, environment or config file",
    )?;
    tracing::info!(
        deployer = %config.deployer,
        company_wallet = %config.company_wallet,
        external_asset = ?config.external_asset.map(|a| a.to_string()),
        "Deployment config loaded"
    );
    Ok(config)
}

fn load_config(path: &Path) -> anyhow::Result<DeploymentConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
