pub mod gamma_source;
pub mod graphql;
pub mod graphql_source;
pub mod normalize;
pub mod rest_source;
pub mod subgraph_source;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::{AppConfig, SourceKind};
use crate::models::TradeRecord;

pub use gamma_source::GammaSource;
pub use graphql::GraphqlClient;
pub use graphql_source::GraphqlSource;
pub use normalize::KeywordFilter;
pub use rest_source::RestSource;
pub use subgraph_source::SubgraphSource;
pub use types::SourceError;

/// An upstream that yields recently observed trades.
///
/// Implementations never fail: transport and parse problems are logged and
/// degrade to an empty batch.
#[async_trait]
pub trait TradeSource: Send + Sync {
    /// Short adapter name for logs.
    fn kind(&self) -> &'static str;

    async fn fetch_recent_trades(&self) -> Vec<TradeRecord>;
}

/// Safe default when no source is configured.
#[derive(Debug, Clone, Default)]
pub struct NoopSource;

#[async_trait]
impl TradeSource for NoopSource {
    fn kind(&self) -> &'static str {
        "noop"
    }

    async fn fetch_recent_trades(&self) -> Vec<TradeRecord> {
        Vec::new()
    }
}

/// Shared HTTP client with the per-request timeout and a cookie jar.
pub fn http_client(timeout_secs: u64) -> anyhow::Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .cookie_store(true)
        .build()?;
    Ok(client)
}

/// Pick the adapter for `config`.
///
/// Precedence: REST, then the Gamma query adapter, then the generic query
/// adapter, then the subgraph adapter (by type or by a configured subgraph
/// URL), and finally [`NoopSource`].
pub fn build_source(config: &AppConfig) -> anyhow::Result<Box<dyn TradeSource>> {
    let http = http_client(config.http_timeout_secs)?;
    let filter = KeywordFilter::new(&config.market_keywords);
    let graphql = || -> anyhow::Result<GraphqlClient> {
        let headers = graphql::auth_headers(
            config.auth_header.as_deref(),
            config.auth_cookie.as_deref(),
        )?;
        Ok(GraphqlClient::new(http.clone(), headers))
    };

    let source: Box<dyn TradeSource> = match (config.source_type, config.source_url.as_deref()) {
        (SourceKind::Rest, Some(url)) => Box::new(RestSource::new(http.clone(), url.to_string())),
        (SourceKind::Graphql, Some(url)) => Box::new(GammaSource::new(
            http.clone(),
            graphql()?,
            url.to_string(),
            config.graphql_trades_query.clone(),
            config.auth_cookie.is_none(),
            filter,
        )),
        (SourceKind::GenericGraphql, Some(url)) => Box::new(GraphqlSource::new(
            graphql()?,
            url.to_string(),
            config.graphql_trades_query.clone(),
        )),
        _ if config.source_type == SourceKind::Subgraph || config.subgraph_url.is_some() => {
            Box::new(SubgraphSource::new(
                graphql()?,
                config.subgraph_url.as_deref(),
                filter,
            ))
        }
        _ => Box::new(NoopSource),
    };

    tracing::info!(source = source.kind(), "Trade source selected");
    Ok(source)
}
