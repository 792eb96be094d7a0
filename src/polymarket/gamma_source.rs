use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::graphql::{query_endpoint, GraphqlClient};
use super::normalize::{find_first_list, normalize_item, KeywordFilter, GAMMA};
use super::types::GraphqlRequest;
use super::TradeSource;
use crate::models::TradeRecord;

/// Known shapes of the Gamma trades schema, tried in order.
pub const BUILTIN_QUERIES: [&str; 4] = [
    "query { fills(limit:50) { txHash trader amountUsd market { id title } createdAt } }",
    "query { fills(limit:50) { id txHash trader amount market { id title name } createdAt } }",
    "query { trades(limit:50) { id txHash wallet amount market { id title } timestamp } }",
    "query { trades(limit:50) { txHash actor amount outcome { market { id title } } timestamp } }",
];

/// Query adapter for a schema-flexible Gamma-style backend.
///
/// Tries a user-supplied statement first, then [`BUILTIN_QUERIES`], and maps
/// the first list any of them returns.
#[derive(Debug, Clone)]
pub struct GammaSource {
    http: Client,
    graphql: GraphqlClient,
    base_url: String,
    endpoint: String,
    custom_query: Option<String>,
    /// No cookie configured: let the backend set one with a plain GET first.
    prime_session: bool,
    filter: KeywordFilter,
}

impl GammaSource {
    pub fn new(
        http: Client,
        graphql: GraphqlClient,
        base_url: String,
        custom_query: Option<String>,
        prime_session: bool,
        filter: KeywordFilter,
    ) -> Self {
        Self {
            endpoint: query_endpoint(&base_url),
            http,
            graphql,
            base_url,
            custom_query,
            prime_session,
            filter,
        }
    }

    pub fn candidate_queries(&self) -> Vec<&str> {
        let mut queries = Vec::with_capacity(BUILTIN_QUERIES.len() + 1);
        if let Some(custom) = self.custom_query.as_deref() {
            queries.push(custom);
        }
        for query in BUILTIN_QUERIES {
            queries.push(query);
        }
        queries
    }

    async fn prime_cookies(&self) {
        if let Err(e) = self.http.get(&self.base_url).send().await {
            tracing::debug!(error = %e, "Gamma source: session priming request failed");
        }
    }

    fn map_list(&self, items: &[Value]) -> Vec<TradeRecord> {
        let now = chrono::Utc::now().timestamp();
        let mapped = items
            .iter()
            .map(|item| normalize_item(item, &GAMMA, now))
            .collect();
        self.filter.apply(mapped)
    }
}

#[async_trait]
impl TradeSource for GammaSource {
    fn kind(&self) -> &'static str {
        "graphql"
    }

    async fn fetch_recent_trades(&self) -> Vec<TradeRecord> {
        if self.prime_session {
            self.prime_cookies().await;
        }

        for (idx, query) in self.candidate_queries().into_iter().enumerate() {
            let resp = self
                .graphql
                .post(&self.endpoint, &GraphqlRequest::new(query))
                .await;

            let Some(data) = resp.get("data").filter(|d| !d.is_null()) else {
                let errors = resp.get("errors").map(Value::to_string).unwrap_or_default();
                tracing::debug!(
                    candidate = idx,
                    errors = %errors,
                    "Gamma source: no data for candidate query"
                );
                continue;
            };

            let Some(items) = find_first_list(data) else {
                tracing::debug!(candidate = idx, "Gamma source: no list in response");
                continue;
            };

            let trades = self.map_list(items);
            tracing::debug!(
                candidate = idx,
                raw = items.len(),
                kept = trades.len(),
                "Gamma source: candidate query matched"
            );
            return trades;
        }

        tracing::warn!(endpoint = %self.endpoint, "Gamma source: no candidate query returned trades");
        Vec::new()
    }
}
