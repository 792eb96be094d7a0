use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;

use polymonitor::config::{AppConfig, SourceKind};
use polymonitor::db::Ledger;
use polymonitor::errors::MonitorError;
use polymonitor::ingestion::{AlertEvaluator, PipelineConfig};
use polymonitor::models::{Alert, TradeRecord};
use polymonitor::polymarket::TradeSource;
use polymonitor::services::notifier::AlertNotifier;
use polymonitor::services::wallet_age::WalletAgeOracle;

/// Open a ledger on a fresh SQLite file. Keep the `TempDir` alive.
#[allow(dead_code)]
pub async fn temp_ledger() -> (tempfile::TempDir, Arc<Ledger>) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("monitor.db");
    let ledger = Ledger::open(path.to_str().unwrap())
        .await
        .expect("Failed to open ledger");
    (dir, Arc::new(ledger))
}

/// Oracle answering from a fixed first-activity offset (seconds before now).
#[allow(dead_code)]
pub struct StubOracle {
    first_activity_ago: Option<i64>,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl StubOracle {
    pub fn unknown() -> Self {
        Self {
            first_activity_ago: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn first_seen_ago(secs: i64) -> Self {
        Self {
            first_activity_ago: Some(secs),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletAgeOracle for StubOracle {
    async fn first_activity(&self, _wallet: &str) -> Option<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.first_activity_ago.map(|ago| Utc::now().timestamp() - ago)
    }
}

/// Notifier that keeps every alert it is asked to send.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Alert>>,
}

#[async_trait]
impl AlertNotifier for RecordingNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), MonitorError> {
        self.sent.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

/// Notifier whose mail server is always down.
#[allow(dead_code)]
pub struct FailingNotifier;

#[async_trait]
impl AlertNotifier for FailingNotifier {
    async fn send(&self, _alert: &Alert) -> Result<(), MonitorError> {
        Err(MonitorError::Delivery("connection refused".into()))
    }
}

/// Source returning the same fixed batch on every poll.
#[allow(dead_code)]
pub struct StaticSource(pub Vec<TradeRecord>);

#[async_trait]
impl TradeSource for StaticSource {
    fn kind(&self) -> &'static str {
        "static"
    }

    async fn fetch_recent_trades(&self) -> Vec<TradeRecord> {
        self.0.clone()
    }
}

#[allow(dead_code)]
pub fn evaluator(
    ledger: Arc<Ledger>,
    oracle: Arc<dyn WalletAgeOracle>,
    notifier: Option<Arc<dyn AlertNotifier>>,
    threshold: f64,
) -> AlertEvaluator {
    AlertEvaluator::new(ledger, oracle, notifier, PipelineConfig::with_threshold(threshold))
}

#[allow(dead_code)]
pub fn make_trade(tx: &str, wallet: &str, market: &str, amount: f64) -> TradeRecord {
    TradeRecord {
        tx_hash: Some(tx.into()),
        wallet: Some(wallet.into()),
        market_id: Some(market.into()),
        market_name: Some(format!("Market {market}")),
        amount_usdc: amount,
        timestamp: Utc::now().timestamp(),
    }
}

/// Serve `app` on an ephemeral local port and return its base URL.
#[allow(dead_code)]
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Minimal config for tests: mock source, no collaborators, ledger file
/// inside `dir`.
#[allow(dead_code)]
pub fn test_config(dir: &Path) -> AppConfig {
    AppConfig {
        source_type: SourceKind::Mock,
        source_url: None,
        market_keywords: vec![],
        graphql_trades_query: None,
        auth_header: None,
        auth_cookie: None,
        subgraph_url: None,
        http_timeout_secs: 5,
        etherscan_api_key: None,
        etherscan_api_url: "http://127.0.0.1:9/api".into(),
        smtp_host: None,
        smtp_port: 587,
        smtp_user: None,
        smtp_password: None,
        alert_recipient: None,
        alert_usdc_threshold: 5000.0,
        poll_interval_secs: 1,
        sqlite_path: dir.join("monitor.db").to_string_lossy().into_owned(),
        log_level: "debug".into(),
        log_json: false,
        metrics_addr: None,
    }
}
