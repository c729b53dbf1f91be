pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{ConversionService, MarketPair, MarketPriceCache};
use crate::store::FileSettingsStore;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Convert {
        amount: String,
        direction: String,
        json: bool,
        confirm: bool,
    },
    Market {
        json: bool,
    },
    AdminShow {
        json: bool,
    },
    AdminSetRate {
        secret: String,
        rate: String,
        json: bool,
    },
}

/// Wires the settings file, the configured price source and the market cache
/// into a conversion service.
pub fn build_service(config: &AppConfig) -> Result<ConversionService> {
    let settings_path = config.settings_path()?;
    debug!("Using settings file {}", settings_path.display());
    let settings = Arc::new(FileSettingsStore::new(
        settings_path,
        config.defaults.settings(),
    ));

    let source = providers::from_config(&config.providers)?;
    let fetch_timeout = config
        .providers
        .binance
        .as_ref()
        .map_or(crate::core::cache::DEFAULT_FETCH_TIMEOUT, |b| {
            Duration::from_secs(b.timeout_secs)
        });
    let market = MarketPriceCache::new(source, MarketPair::usdt_idr())
        .stale_after(config.market.stale_after())
        .fetch_timeout(fetch_timeout);

    Ok(ConversionService::new(settings, market))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Rupitz starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let service = build_service(&config)?;

    match command {
        AppCommand::Convert {
            amount,
            direction,
            json,
            confirm,
        } => {
            cli::convert::run(
                &service,
                &amount,
                &direction,
                cli::convert::ConvertOptions { json, confirm },
                &config.handoff,
            )
            .await
        }
        AppCommand::Market { json } => cli::market::run(&service, json).await,
        AppCommand::AdminShow { json } => cli::admin::show(&service, json).await,
        AppCommand::AdminSetRate { secret, rate, json } => {
            cli::admin::set_rate(&service, &secret, &rate, json).await
        }
    }
}
