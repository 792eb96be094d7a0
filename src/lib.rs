pub mod config;
pub mod db;
pub mod errors;
pub mod ingestion;
pub mod metrics;
pub mod models;
pub mod polymarket;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::db::Ledger;
use crate::ingestion::{AlertEvaluator, PipelineConfig};
use crate::services::notifier::{AlertNotifier, EmailNotifier};
use crate::services::wallet_age::EtherscanOracle;
use crate::services::Monitor;

/// Wire a [`Monitor`] from configuration: source adapter, ledger, wallet-age
/// oracle and (when configured) email delivery.
pub async fn build_monitor(config: &AppConfig) -> anyhow::Result<Monitor> {
    let source = polymarket::build_source(config)?;

    let ledger = Arc::new(Ledger::open(&config.sqlite_path).await?);
    tracing::info!(path = %config.sqlite_path, "Ledger opened");

    let oracle = Arc::new(EtherscanOracle::new(
        polymarket::http_client(config.http_timeout_secs)?,
        config.etherscan_api_url.clone(),
        config.etherscan_api_key.clone(),
    ));
    if config.etherscan_api_key.is_none() {
        tracing::warn!("ETHERSCAN_API_KEY not set; new-wallet alerts are disabled");
    }

    let notifier: Option<Arc<dyn AlertNotifier>> = match EmailNotifier::from_config(config)? {
        Some(n) => Some(Arc::new(n)),
        None => {
            tracing::warn!("SMTP host or recipient not configured; alerts are logged only");
            None
        }
    };

    let evaluator = AlertEvaluator::new(
        ledger,
        oracle,
        notifier,
        PipelineConfig::with_threshold(config.alert_usdc_threshold),
    );

    Ok(Monitor::new(
        source,
        evaluator,
        Duration::from_secs(config.poll_interval_secs),
    ))
}
