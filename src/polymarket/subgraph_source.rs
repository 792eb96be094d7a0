use async_trait::async_trait;
use serde_json::{json, Value};

use super::graphql::GraphqlClient;
use super::normalize::{
    has_nonempty_list, normalize_item, AliasTable, FieldPath, KeywordFilter, USDC_BASE_UNITS,
};
use super::types::{GraphqlRequest, SourceError};
use super::TradeSource;
use crate::models::TradeRecord;

/// Public subgraph deployments tried after the configured endpoint.
pub const FALLBACK_ENDPOINTS: &[&str] = &[
    "https://api.thegraph.com/subgraphs/name/Polymarket/polymarket-subgraph",
    "https://api.thegraph.com/subgraphs/name/polymarket/polymarket-subgraph",
    "https://api.thegraph.com/subgraphs/name/Polymarket/fpmm-subgraph",
    "https://api.thegraph.com/subgraphs/name/polymarket/fpmm-subgraph",
    "https://api.goldsky.com/api/public/project_cl6mb8i9h0003e201j6li0diw/subgraphs/activity-subgraph/0.0.4/gn",
    "https://api.goldsky.com/api/public/project_cl6mb8i9h0003e201j6li0diw/subgraphs/orderbook-subgraph/0.0.1/gn",
    "https://api.goldsky.com/api/public/project_cl6mb8i9h0003e201j6li0diw/subgraphs/positions-subgraph/0.0.7/gn",
    "https://api.goldsky.com/api/public/project_cl6mb8i9h0003e201j6li0diw/subgraphs/pnl-subgraph/0.0.14/gn",
];

/// Items requested per entity query.
const PAGE_SIZE: u32 = 50;

/// One activity entity exposed by the subgraph and how to read it.
#[derive(Debug, Clone, Copy)]
pub struct EntityKind {
    pub name: &'static str,
    pub query: &'static str,
    pub aliases: AliasTable,
}

const fn entity_aliases(
    actor: &'static [FieldPath],
    market: &'static [FieldPath],
    amount: &'static [FieldPath],
) -> AliasTable {
    AliasTable {
        tx_hash: &[&["id"]],
        wallet: actor,
        market_object: &[],
        market_id: market,
        market_name: &[],
        amount,
        timestamp: &[&["timestamp"]],
        amount_scale: Some(USDC_BASE_UNITS),
        split_tx_suffix: true,
        name_from_market_id: true,
    }
}

pub const ENTITY_KINDS: [EntityKind; 4] = [
    EntityKind {
        name: "negRiskConversions",
        query: "query RecentNegRisk($first:Int){ negRiskConversions(first:$first, orderBy: timestamp, orderDirection: desc) { id stakeholder negRiskMarketId amount timestamp } }",
        aliases: entity_aliases(&[&["stakeholder"]], &[&["negRiskMarketId"]], &[&["amount"]]),
    },
    EntityKind {
        name: "splits",
        query: "query RecentSplits($first:Int){ splits(first:$first, orderBy: timestamp, orderDirection: desc) { id stakeholder condition amount timestamp } }",
        aliases: entity_aliases(&[&["stakeholder"]], &[&["condition"]], &[&["amount"]]),
    },
    EntityKind {
        name: "merges",
        query: "query RecentMerges($first:Int){ merges(first:$first, orderBy: timestamp, orderDirection: desc) { id stakeholder condition amount timestamp } }",
        aliases: entity_aliases(&[&["stakeholder"]], &[&["condition"]], &[&["amount"]]),
    },
    EntityKind {
        name: "redemptions",
        query: "query RecentRedemptions($first:Int){ redemptions(first:$first, orderBy: timestamp, orderDirection: desc) { id redeemer condition payout timestamp } }",
        aliases: entity_aliases(&[&["redeemer"]], &[&["condition"]], &[&["payout"]]),
    },
];

/// Subgraph adapter with an ordered list of candidate endpoints.
#[derive(Debug, Clone)]
pub struct SubgraphSource {
    graphql: GraphqlClient,
    endpoints: Vec<String>,
    filter: KeywordFilter,
}

impl SubgraphSource {
    /// Configured endpoint first, then [`FALLBACK_ENDPOINTS`].
    pub fn new(graphql: GraphqlClient, primary: Option<&str>, filter: KeywordFilter) -> Self {
        let mut endpoints: Vec<String> = primary.into_iter().map(String::from).collect();
        for &url in FALLBACK_ENDPOINTS {
            if !endpoints.iter().any(|e| e.as_str() == url) {
                endpoints.push(url.to_string());
            }
        }
        Self::with_endpoints(graphql, endpoints, filter)
    }

    pub fn with_endpoints(graphql: GraphqlClient, endpoints: Vec<String>, filter: KeywordFilter) -> Self {
        Self {
            graphql,
            endpoints,
            filter,
        }
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Run `request` against each endpoint in turn and return the first
    /// response carrying a non-empty list under `data`.
    pub async fn query(&self, request: &GraphqlRequest<'_>) -> Result<Value, SourceError> {
        let mut last_err = String::from("no endpoint available");

        for endpoint in &self.endpoints {
            match self.graphql.try_post(endpoint, request).await {
                Ok(resp) if has_nonempty_list(&resp) => return Ok(resp),
                Ok(resp) => {
                    last_err = resp
                        .get("errors")
                        .map(Value::to_string)
                        .unwrap_or_else(|| "response carried no list data".into());
                }
                Err(e) => last_err = e.to_string(),
            }
            tracing::debug!(endpoint = %endpoint, error = %last_err, "Subgraph endpoint rejected");
        }

        Err(SourceError::Unexpected(last_err))
    }

    fn map_entity(&self, kind: &EntityKind, items: &[Value]) -> Vec<TradeRecord> {
        let now = chrono::Utc::now().timestamp();
        items
            .iter()
            .filter(|item| item.is_object())
            .map(|item| normalize_item(item, &kind.aliases, now))
            .collect()
    }
}

#[async_trait]
impl TradeSource for SubgraphSource {
    fn kind(&self) -> &'static str {
        "subgraph"
    }

    async fn fetch_recent_trades(&self) -> Vec<TradeRecord> {
        let variables = json!({ "first": PAGE_SIZE });

        for kind in &ENTITY_KINDS {
            let request = GraphqlRequest::new(kind.query).with_variables(variables.clone());
            let resp = match self.query(&request).await {
                Ok(resp) => resp,
                Err(e) => {
                    tracing::debug!(entity = kind.name, error = %e, "Subgraph source: entity query failed");
                    continue;
                }
            };

            let items = resp
                .get("data")
                .and_then(|d| d.get(kind.name))
                .and_then(Value::as_array)
                .filter(|a| !a.is_empty());
            let Some(items) = items else {
                continue;
            };

            let mapped = self.map_entity(kind, items);
            if self.filter.is_empty() {
                return mapped;
            }

            let filtered = self.filter.apply(mapped);
            if filtered.is_empty() {
                tracing::debug!(entity = kind.name, "Subgraph source: keyword filter removed every item");
                continue;
            }
            return filtered;
        }

        tracing::warn!("Subgraph source: no entity query returned trades");
        Vec::new()
    }
}
