use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and register all monitor metrics.
///
/// With `listen` set, a scrape endpoint is served on that address;
/// otherwise metrics are recorded but not exported.
pub fn init_metrics(listen: Option<SocketAddr>) -> anyhow::Result<()> {
    match listen {
        Some(addr) => {
            PrometheusBuilder::new().with_http_listener(addr).install()?;
            tracing::info!(%addr, "Prometheus exporter listening");
        }
        None => {
            PrometheusBuilder::new().install_recorder()?;
        }
    }

    // Pre-register counters so they appear even before the first increment.
    counter!("trades_fetched_total").absolute(0);
    counter!("trades_ingested_total").absolute(0);
    counter!("duplicate_trades_skipped_total").absolute(0);
    counter!("alert_delivery_failures_total").absolute(0);
    counter!("poll_cycles_failed_total").absolute(0);

    // Histogram is lazily created on first record; force creation.
    histogram!("poll_cycle_seconds").record(0.0);

    Ok(())
}
