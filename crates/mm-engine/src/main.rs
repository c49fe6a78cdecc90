//! Market-Maker Bot
//!
//! Deterministic market-making across short-lived binary "up/down" markets:
//! detect the next slot (C4), split collateral and post both legs (C5),
//! adaptively chase a floor price on whichever leg lags (C6), and clean up
//! stray orders and resolved positions (C7).

mod detector;
mod dispatcher;
mod position;
mod status;

use anyhow::{Context, Result};
use auth::TradingWallet;
use polymarket_core::api::clob::ApiCredentials;
use polymarket_core::api::{ClobClient, MetadataClient, PositionsClient};
use polymarket_core::chain::PolygonClient;
use polymarket_core::config::Config;
use polymarket_core::signing::OrderSigner;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trading_engine::{CtfPrimitives, Redeemer, WalletExecutor};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mm_engine=info,polymarket_core=info,trading_engine=info,risk_manager=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting market-maker bot");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal startup failure");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env().context("loading configuration")?;
    let wallet = TradingWallet::from_env().context("loading trading wallet")?;
    let wallet_address = wallet.address();

    let rpc_url = config.polygon.get_rpc_url().unwrap_or_default();
    let polygon = Arc::new(PolygonClient::new(rpc_url));

    let signer = wallet.into_signer();
    let order_signer = OrderSigner::new(signer.clone());

    let executor = WalletExecutor::spawn(polygon.clone(), wallet_address, signer, config.dry_run);

    let creds = match (
        &config.venue.api_key,
        &config.venue.api_secret,
        &config.venue.api_passphrase,
    ) {
        (Some(key), Some(secret), Some(passphrase)) => Some(ApiCredentials {
            api_key: key.clone(),
            api_secret: secret.clone(),
            api_passphrase: passphrase.clone(),
        }),
        _ => {
            info!("no CLOB API credentials configured, deriving from signing key");
            Some(
                ClobClient::derive_credentials(&config.venue.clob_base_url, &order_signer)
                    .await
                    .context("deriving CLOB API credentials")?,
            )
        }
    };

    let clob = Arc::new(ClobClient::new(
        config.venue.clob_base_url.clone(),
        creds.clone(),
        order_signer.clone(),
    ));
    let ctf = Arc::new(CtfPrimitives::new(
        polygon.clone(),
        executor.clone(),
        config.addresses,
        wallet_address,
    ));

    let positions = PositionsClient::new(config.venue.positions_base_url.clone());
    let redeemer_clob = ClobClient::new(config.venue.clob_base_url.clone(), creds, order_signer);
    let redeemer_ctf = CtfPrimitives::new(polygon.clone(), executor.clone(), config.addresses, wallet_address);
    let redeemer = Redeemer::new(redeemer_clob, positions, redeemer_ctf, wallet_address);

    redeemer
        .startup_cleanup()
        .await
        .context("startup cleanup (cancel stray orders, merge stranded positions)")?;

    let shutdown = CancellationToken::new();

    let deps = Arc::new(position::PositionDeps {
        clob: clob.clone(),
        ctf: ctf.clone(),
        addresses: config.addresses,
        cfg: Arc::new(config.mm.clone()),
        dry_run: config.dry_run,
    });

    let (market_tx, market_rx) = tokio::sync::mpsc::channel(16);
    let metadata = MetadataClient::new(config.venue.metadata_base_url.clone());
    let detector = detector::Detector::new(
        metadata,
        config.mm.assets.clone(),
        config.mm.slot_seconds,
        config.mm.poll_interval_secs,
    );
    let detector_shutdown = shutdown.clone();
    let detector_task = tokio::spawn(detector.run(market_tx, detector_shutdown));

    let dispatcher = dispatcher::Dispatcher::new(deps, config.mm.cut_loss_time_secs);
    let dispatcher_shutdown = shutdown.clone();
    let dispatcher_task = tokio::spawn(dispatcher.run(market_rx, dispatcher_shutdown));

    let redeem_interval = std::time::Duration::from_secs(config.redeem_interval_secs);
    let redeemer_shutdown = shutdown.clone();
    let redeemer_task = tokio::spawn(async move {
        tokio::select! {
            _ = redeemer_shutdown.cancelled() => {}
            _ = redeemer.run_periodic(redeem_interval) => {}
        }
    });

    let status_task = tokio::spawn(status::run(shutdown.clone()));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }
    shutdown.cancel();

    let _ = tokio::join!(detector_task, dispatcher_task, redeemer_task, status_task);
    info!("shutdown complete");
    Ok(())
}
