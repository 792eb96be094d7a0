use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::normalize::{normalize_item, CANONICAL};
use super::types::SourceError;
use super::TradeSource;
use crate::models::TradeRecord;

/// Plain GET endpoint that already returns canonical trade records.
#[derive(Debug, Clone)]
pub struct RestSource {
    http: Client,
    url: String,
}

impl RestSource {
    pub fn new(http: Client, url: String) -> Self {
        Self { http, url }
    }

    async fn try_fetch(&self) -> Result<Vec<TradeRecord>, SourceError> {
        let body: Value = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let items = body
            .as_array()
            .ok_or_else(|| SourceError::Unexpected("expected a JSON array of trades".into()))?;

        let now = chrono::Utc::now().timestamp();
        Ok(items
            .iter()
            .map(|item| normalize_item(item, &CANONICAL, now))
            .collect())
    }
}

#[async_trait]
impl TradeSource for RestSource {
    fn kind(&self) -> &'static str {
        "rest"
    }

    async fn fetch_recent_trades(&self) -> Vec<TradeRecord> {
        match self.try_fetch().await {
            Ok(trades) => trades,
            Err(e) => {
                tracing::warn!(error = %e, url = %self.url, "REST source: fetch failed");
                Vec::new()
            }
        }
    }
}
