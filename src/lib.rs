pub mod api;
pub mod cli;
pub mod core;
pub mod providers;
pub mod service;
pub mod store;

use crate::core::config::AppConfig;
use crate::providers::CnbProvider;
use crate::service::RateService;
use anyhow::{Context, Result};
use chrono::TimeDelta;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Serve,
    List,
    Show { code: String },
    Convert { currency: String, amount: f64 },
}

/// Wires the CNB provider and the rate cache from configuration.
pub fn build_service(config: &AppConfig) -> Result<Arc<RateService>> {
    let provider = CnbProvider::new(&config.source)?;
    let ttl = i64::try_from(config.cache.ttl_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .with_context(|| format!("cache ttl_secs {} is too large", config.cache.ttl_secs))?;
    Ok(Arc::new(RateService::new(Arc::new(provider), ttl)))
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    Ok(config.with_env_overrides())
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("CNB exchange rates starting...");

    let config = load_config(config_path)?;
    debug!("Loaded config: {config:#?}");

    let service = build_service(&config)?;

    match command {
        AppCommand::Serve => api::run(&config.server.bind, service).await,
        AppCommand::List => cli::rates::list(&service).await,
        AppCommand::Show { code } => cli::rates::show(&service, &code).await,
        AppCommand::Convert { currency, amount } => {
            cli::rates::convert(&service, &currency, amount).await
        }
    }
}
