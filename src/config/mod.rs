use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

const DEFAULT_ETHERSCAN_URL: &str = "https://api.etherscan.io/api";

/// Which upstream adapter to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Rest,
    Graphql,
    GenericGraphql,
    Subgraph,
    Mock,
}

impl SourceKind {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "rest" => SourceKind::Rest,
            "graphql" | "gamma" => SourceKind::Graphql,
            "graphql-generic" | "generic" => SourceKind::GenericGraphql,
            "subgraph" | "thegraph" => SourceKind::Subgraph,
            _ => SourceKind::Mock,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Upstream trade source
    pub source_type: SourceKind,
    pub source_url: Option<String>,
    pub market_keywords: Vec<String>,
    pub graphql_trades_query: Option<String>,
    pub auth_header: Option<String>,
    pub auth_cookie: Option<String>,
    pub subgraph_url: Option<String>,
    pub http_timeout_secs: u64,

    // Wallet-age oracle
    pub etherscan_api_key: Option<String>,
    pub etherscan_api_url: String,

    // Email delivery
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub alert_recipient: Option<String>,

    // Monitor
    pub alert_usdc_threshold: f64,
    pub poll_interval_secs: u64,
    pub sqlite_path: String,

    // Ops
    pub log_level: String,
    pub log_json: bool,
    pub metrics_addr: Option<SocketAddr>,
}

/// Read a variable, treating empty values as unset.
fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} is invalid ({raw}): {e}")),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let market_keywords: Vec<String> = var("POLY_MARKET_KEYWORDS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let metrics_addr = match var("METRICS_ADDR") {
            Some(raw) => Some(
                raw.parse()
                    .map_err(|e| anyhow::anyhow!("METRICS_ADDR is invalid ({raw}): {e}"))?,
            ),
            None => None,
        };

        Ok(Self {
            source_type: SourceKind::parse(
                &var("POLY_SOURCE_TYPE").unwrap_or_else(|| "rest".into()),
            ),
            source_url: var("POLY_SOURCE_URL"),
            market_keywords,
            graphql_trades_query: var("POLY_GRAPHQL_TRADES_QUERY"),
            auth_header: var("POLY_AUTH_HEADER"),
            auth_cookie: var("POLY_AUTH_COOKIE"),
            subgraph_url: var("POLY_SUBGRAPH_URL"),
            http_timeout_secs: parse_or("HTTP_TIMEOUT_SECONDS", 15)?,

            etherscan_api_key: var("ETHERSCAN_API_KEY"),
            etherscan_api_url: var("ETHERSCAN_API_URL")
                .unwrap_or_else(|| DEFAULT_ETHERSCAN_URL.into()),

            smtp_host: var("SMTP_HOST"),
            smtp_port: parse_or("SMTP_PORT", 587)?,
            smtp_user: var("SMTP_USER"),
            smtp_password: var("SMTP_PASSWORD"),
            alert_recipient: var("ALERT_RECIPIENT"),

            alert_usdc_threshold: parse_or("ALERT_USDC_THRESHOLD", 5000.0)?,
            poll_interval_secs: parse_or("POLL_INTERVAL_SECONDS", 30)?,
            sqlite_path: var("SQLITE_PATH").unwrap_or_else(|| "./polymonitor.db".into()),

            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_json: var("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            metrics_addr,
        })
    }

    /// Returns true if a mail server and a recipient are configured.
    pub fn has_smtp(&self) -> bool {
        self.smtp_host.is_some() && self.alert_recipient.is_some()
    }
}
