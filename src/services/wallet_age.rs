use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

/// Window inside which a wallet's first on-chain activity counts as new.
pub const NEW_WALLET_WINDOW_SECS: i64 = 24 * 3600;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Answers "when did this wallet first act on-chain?".
#[async_trait]
pub trait WalletAgeOracle: Send + Sync {
    /// Unix seconds of the wallet's first transaction, or `None` if unknown.
    async fn first_activity(&self, wallet: &str) -> Option<i64>;

    /// True only when the first activity is known and younger than `within_secs`.
    async fn is_new(&self, wallet: &str, within_secs: i64) -> bool {
        match self.first_activity(wallet).await {
            Some(ts) => is_recent(ts, chrono::Utc::now().timestamp(), within_secs),
            None => false,
        }
    }
}

pub fn is_recent(first_ts: i64, now: i64, within_secs: i64) -> bool {
    now - first_ts < within_secs
}

/// Read the earliest transaction timestamp out of a block-explorer
/// `txlist` response sorted ascending.
pub fn parse_first_timestamp(body: &Value) -> Result<Option<i64>, OracleError> {
    if body.get("status").and_then(Value::as_str) != Some("1") {
        return Ok(None);
    }
    let Some(first) = body
        .get("result")
        .and_then(Value::as_array)
        .and_then(|r| r.first())
    else {
        return Ok(None);
    };

    let ts = match first.get("timeStamp") {
        Some(Value::String(s)) => s.parse::<i64>().ok(),
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    };
    ts.map(Some)
        .ok_or_else(|| OracleError::Unexpected("first transaction has no timeStamp".into()))
}

/// Etherscan-compatible explorer client.
#[derive(Debug, Clone)]
pub struct EtherscanOracle {
    http: Client,
    api_url: String,
    api_key: Option<String>,
}

impl EtherscanOracle {
    pub fn new(http: Client, api_url: String, api_key: Option<String>) -> Self {
        Self {
            http,
            api_url,
            api_key,
        }
    }

    async fn try_first_activity(&self, wallet: &str, api_key: &str) -> Result<Option<i64>, OracleError> {
        let body: Value = self
            .http
            .get(&self.api_url)
            .query(&[
                ("module", "account"),
                ("action", "txlist"),
                ("address", wallet),
                ("startblock", "0"),
                ("endblock", "99999999"),
                ("page", "1"),
                ("offset", "1"),
                ("sort", "asc"),
                ("apikey", api_key),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_first_timestamp(&body)
    }
}

#[async_trait]
impl WalletAgeOracle for EtherscanOracle {
    async fn first_activity(&self, wallet: &str) -> Option<i64> {
        let api_key = self.api_key.as_deref()?;
        match self.try_first_activity(wallet, api_key).await {
            Ok(ts) => ts,
            Err(e) => {
                tracing::warn!(error = %e, wallet = %wallet, "Wallet age lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_first_timestamp() {
        let body = json!({
            "status": "1",
            "message": "OK",
            "result": [{ "timeStamp": "1690000000", "hash": "0x1" }, { "timeStamp": "1690000100" }]
        });
        assert_eq!(parse_first_timestamp(&body).unwrap(), Some(1_690_000_000));
    }

    #[test]
    fn test_no_transactions_is_unknown() {
        let body = json!({ "status": "0", "message": "No transactions found", "result": [] });
        assert_eq!(parse_first_timestamp(&body).unwrap(), None);
    }

    #[test]
    fn test_missing_timestamp_is_an_error() {
        let body = json!({ "status": "1", "result": [{ "hash": "0x1" }] });
        assert!(parse_first_timestamp(&body).is_err());
    }

    #[test]
    fn test_is_recent() {
        let now = 1_700_000_000;
        assert!(is_recent(now - 3600, now, NEW_WALLET_WINDOW_SECS));
        assert!(!is_recent(now - 48 * 3600, now, NEW_WALLET_WINDOW_SECS));
        assert!(!is_recent(now - NEW_WALLET_WINDOW_SECS, now, NEW_WALLET_WINDOW_SECS));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_never_new() {
        let oracle = EtherscanOracle::new(Client::new(), "http://127.0.0.1:9".into(), None);
        assert_eq!(oracle.first_activity("0xabc").await, None);
        assert!(!oracle.is_new("0xabc", NEW_WALLET_WINDOW_SECS).await);
    }
}
