// Futarchy Arbitrage Bot
// Main entry point

use std::collections::BTreeMap;
use std::process::ExitCode;
use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::providers::{Provider, ProviderBuilder};
use clap::Parser;
use tracing::{error, info, Level};

use futarchy_arb_bot::cli::Cli;
use futarchy_arb_bot::config::{self, EffectiveConfig};
use futarchy_arb_bot::contracts::IERC20;
use futarchy_arb_bot::controller::{self, Controller, ControllerConfig};
use futarchy_arb_bot::executor::futarchy_v5::FutarchyV5Adapter;
use futarchy_arb_bot::executor::pnk_variant::PnkVariantAdapter;
use futarchy_arb_bot::executor::prediction_v1::PredictionV1Adapter;
use futarchy_arb_bot::executor::ExecutorAdapter;
use futarchy_arb_bot::types::ExecutorFlavor;
use futarchy_arb_bot::wallet;

const EXIT_OK: u8 = 0;
const EXIT_CONFIG_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = futarchy_arb_bot::cli::validate(&cli) {
        error!("invalid arguments: {e}");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    config::load_dotenv_base();
    let dump_config = cli.dump_config.clone();
    let overrides = cli.into_overrides();
    let process_env: BTreeMap<String, String> = std::env::vars().collect();

    let effective = match config::load(&overrides, &process_env) {
        Ok(c) => c,
        Err(e) => {
            error!("configuration error: {e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    if let Some(target) = dump_config {
        if let Err(e) = dump_config_and_exit(&effective, &target) {
            error!("failed to dump config: {e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
        return ExitCode::from(EXIT_OK);
    }

    match run(effective).await {
        Ok(()) => ExitCode::from(EXIT_OK),
        Err(e) => {
            error!("fatal startup error: {e}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn dump_config_and_exit(effective: &EffectiveConfig, target: &str) -> anyhow::Result<()> {
    let json = effective.materialise_json();
    let pretty = serde_json::to_string_pretty(&json)?;
    if target == "-" {
        println!("{pretty}");
    } else {
        std::fs::write(target, pretty)?;
    }
    Ok(())
}

async fn run(mut effective: EffectiveConfig) -> anyhow::Result<()> {
    let signer = match &effective.private_key {
        Some(key) => wallet::from_private_key(key)?,
        None if effective.dry_run => {
            info!("dry run with no PRIVATE_KEY: using an ephemeral throwaway signer");
            wallet::from_private_key("0x0000000000000000000000000000000000000000000000000000000000000001")?
        }
        None => anyhow::bail!("PRIVATE_KEY is required for non-dry-run operation"),
    };
    let wallet_address = wallet::address_of(&signer);
    effective = effective.with_owner_wallet(wallet_address);

    let ethereum_wallet = EthereumWallet::from(signer);
    let provider = ProviderBuilder::new()
        .wallet(ethereum_wallet)
        .connect_http(effective.rpc_url.parse()?);

    let latest_block = provider.get_block_number().await?;
    info!(block = latest_block, wallet = %wallet_address, "connected to RPC");

    let base_currency_decimals = IERC20::new(effective.proposal.base_currency, provider.clone())
        .decimals()
        .call()
        .await?;

    let adapter: Arc<dyn ExecutorAdapter> = match effective.executor.flavor {
        ExecutorFlavor::FutarchyV5 => Arc::new(FutarchyV5Adapter::new(
            provider.clone(),
            effective.executor.address,
            wallet_address,
            effective.proposal.base_currency,
            effective.swapr_router,
            effective.balancer_router,
            effective.futarchy_router,
            effective.gas,
        )),
        ExecutorFlavor::PnkVariant => Arc::new(PnkVariantAdapter::new(
            provider.clone(),
            effective.executor.address,
            wallet_address,
            effective.proposal.base_currency,
            effective.gas,
        )),
        ExecutorFlavor::PredictionV1 => Arc::new(PredictionV1Adapter::new(
            provider.clone(),
            effective.executor.address,
            wallet_address,
            effective.proposal.base_currency,
            effective.gas,
        )),
    };

    let shutdown = controller::install_shutdown_signal()?;

    let controller_config = ControllerConfig {
        amount: effective.amount,
        tolerance: effective.tolerance,
        min_profit: effective.min_profit,
        interval_secs: effective.interval_secs,
        prefund: effective.prefund,
        force_send: effective.force_send,
        dry_run: effective.dry_run,
        base_currency_decimals,
        wallet_address,
        executor_address: effective.executor.address,
    };

    let mut controller = Controller::new(
        provider,
        effective.proposal.clone(),
        adapter,
        controller_config,
        shutdown,
    );

    controller.run().await
}
