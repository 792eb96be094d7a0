use clap::{Parser, Subcommand};

use polymonitor::config::AppConfig;
use polymonitor::models::{Alert, AlertReason, TradeRecord};
use polymonitor::polymarket;
use polymonitor::services::notifier::{AlertNotifier, EmailNotifier};
use polymonitor::services::wallet_age::{EtherscanOracle, WalletAgeOracle, NEW_WALLET_WINDOW_SECS};

#[derive(Parser)]
#[command(name = "polymonitor", about = "Polymarket trade monitor and alerter")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the configured source forever (default)
    Run,
    /// Run a single poll cycle and exit
    Once,
    /// Fetch one batch and check the configured collaborators without recording anything
    Probe {
        /// Also deliver a synthetic alert through the mail settings
        #[arg(long)]
        send_test_alert: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing(&config);
    polymonitor::metrics::init_metrics(config.metrics_addr)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let monitor = polymonitor::build_monitor(&config).await?;
            monitor.run().await?;
        }
        Command::Once => {
            let monitor = polymonitor::build_monitor(&config).await?;
            let stats = monitor.run_once().await?;
            println!(
                "fetched={} processed={} skipped={} alerts={}",
                stats.fetched, stats.processed, stats.skipped, stats.alerts
            );
        }
        Command::Probe { send_test_alert } => probe(&config, send_test_alert).await?,
    }

    Ok(())
}

async fn probe(config: &AppConfig, send_test_alert: bool) -> anyhow::Result<()> {
    println!("source type: {:?}", config.source_type);
    println!("source url: {}", config.source_url.as_deref().unwrap_or("-"));
    println!("market keywords: {:?}", config.market_keywords);
    println!("custom query set: {}", config.graphql_trades_query.is_some());
    println!("mail delivery configured: {}", config.has_smtp());

    let source = polymarket::build_source(config)?;
    println!("using adapter: {}", source.kind());

    let trades = source.fetch_recent_trades().await;
    println!("fetched trades: {}", trades.len());
    for (i, trade) in trades.iter().take(10).enumerate() {
        println!("--- trade {} ---", i + 1);
        println!("{}", serde_json::to_string_pretty(trade)?);
    }

    if let Some(wallet) = trades.first().and_then(|t| t.wallet.as_deref()) {
        let oracle = EtherscanOracle::new(
            polymarket::http_client(config.http_timeout_secs)?,
            config.etherscan_api_url.clone(),
            config.etherscan_api_key.clone(),
        );
        let first = oracle.first_activity(wallet).await;
        println!("wallet {wallet}: first on-chain activity {first:?}");
        println!(
            "wallet {wallet}: new (<24h) = {}",
            oracle.is_new(wallet, NEW_WALLET_WINDOW_SECS).await
        );
    }

    if send_test_alert {
        match EmailNotifier::from_config(config)? {
            Some(notifier) => {
                let trade = TradeRecord {
                    tx_hash: None,
                    wallet: Some("0xTESTWALLET000000000000000000000000".into()),
                    market_id: None,
                    market_name: Some("Integration Test Market".into()),
                    amount_usdc: 12_345.0,
                    timestamp: chrono::Utc::now().timestamp(),
                };
                let alert = Alert::for_trade(
                    &trade,
                    AlertReason::LargeTrade {
                        threshold: config.alert_usdc_threshold,
                    },
                );
                notifier.send(&alert).await?;
                println!("test alert sent");
            }
            None => println!("SMTP or recipient not configured; skipping test alert"),
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    if config.log_json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
