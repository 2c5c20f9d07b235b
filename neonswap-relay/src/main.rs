use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use neonswap_relay::api::{self, health, state::AppState};
use neonswap_relay::domain::error::SwapResult;
use neonswap_relay::infrastructure::blockchain::ethereum::short_address;
use neonswap_relay::infrastructure::blockchain::reader::HttpReaderFactory;
use neonswap_relay::infrastructure::blockchain::signer::{EthersSigner, SwapSigner};
use neonswap_relay::infrastructure::config::Config;
use neonswap_relay::infrastructure::logger::{LogConfig, Logger};
use neonswap_relay::infrastructure::storage::preference_store::FilePreferenceStore;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<()> {
    let config = Config::new().context("Configuration initialization failed")?;

    Logger::init_with(LogConfig {
        level: config.log_level.clone(),
        log_directory: config.log_directory.clone(),
        ..LogConfig::default()
    });

    tracing::info!("Starting NeonSwap Relay...");
    tracing::info!(config = %config.summary(), "Configuration loaded");

    let store = Arc::new(
        FilePreferenceStore::new(&config.data_dir).context("Preference store initialization failed")?,
    );
    tracing::info!(path = %store.path().display(), "Preference store ready");

    let router = config.router()?;
    let factory = Arc::new(HttpReaderFactory::new(router));

    let private_key = config.wallet_private_key.clone();
    let chain_id = config.chain_id;
    let legacy = config.legacy_transactions;
    let approval_timeout = config.approval_timeout();
    let signer_for = move |url: &str| -> SwapResult<Option<Arc<dyn SwapSigner>>> {
        match &private_key {
            Some(key) => {
                let signer = EthersSigner::new(url, key, chain_id, router, legacy, approval_timeout)?;
                Ok(Some(Arc::new(signer)))
            }
            None => Ok(None),
        }
    };

    let port = config.port;
    let state = Arc::new(
        AppState::build(config, store, factory, signer_for).context("Failed to wire relay components")?,
    );

    let current = state.selector.current();
    tracing::info!(
        chain = %state.config.chain_name,
        chain_id = state.config.chain_id,
        endpoints = state.selector.len(),
        preferred = %current.label,
        "Relay components initialized"
    );
    match state.executor(state.selector.current_index())?.signer_address() {
        Some(address) => tracing::info!(signer = %short_address(&address), "Swap execution enabled"),
        None => tracing::warn!("WALLET_PRIVATE_KEY not set; swap execution is disabled"),
    }

    tracing::info!(port, "Starting HTTP server");
    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            .wrap(actix_cors::Cors::permissive())
            .app_data(web::Data::new(Arc::clone(&state)))
            .service(health)
            .configure(api::configure)
    })
    .bind(("0.0.0.0", port))
    .with_context(|| format!("Failed to bind port {port}"))?
    .run()
    .await?;

    Ok(())
}
