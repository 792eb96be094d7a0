use async_trait::async_trait;
use serde_json::Value;

use super::graphql::GraphqlClient;
use super::normalize::{normalize_item, GENERIC};
use super::types::GraphqlRequest;
use super::TradeSource;
use crate::models::TradeRecord;

/// Sends exactly one user-supplied query to the configured endpoint.
#[derive(Debug, Clone)]
pub struct GraphqlSource {
    graphql: GraphqlClient,
    url: String,
    query: Option<String>,
}

impl GraphqlSource {
    pub fn new(graphql: GraphqlClient, url: String, query: Option<String>) -> Self {
        Self { graphql, url, query }
    }
}

#[async_trait]
impl TradeSource for GraphqlSource {
    fn kind(&self) -> &'static str {
        "graphql-generic"
    }

    async fn fetch_recent_trades(&self) -> Vec<TradeRecord> {
        let Some(query) = self.query.as_deref() else {
            tracing::debug!("Generic GraphQL source: no query configured");
            return Vec::new();
        };

        let resp = match self.graphql.try_post(&self.url, &GraphqlRequest::new(query)).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, url = %self.url, "Generic GraphQL source: fetch failed");
                return Vec::new();
            }
        };

        let list = resp
            .get("data")
            .and_then(Value::as_object)
            .and_then(|root| root.values().find_map(Value::as_array));

        let Some(items) = list else {
            tracing::warn!(url = %self.url, "Generic GraphQL source: no list in response");
            return Vec::new();
        };

        let now = chrono::Utc::now().timestamp();
        items
            .iter()
            .map(|item| normalize_item(item, &GENERIC, now))
            .collect()
    }
}
