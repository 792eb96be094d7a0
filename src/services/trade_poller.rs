use std::collections::HashSet;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tokio::time::sleep;

use crate::ingestion::AlertEvaluator;
use crate::polymarket::TradeSource;

/// Drives fetch, dedup and evaluation on a fixed interval.
pub struct Monitor {
    source: Box<dyn TradeSource>,
    evaluator: AlertEvaluator,
    poll_interval: Duration,
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub fetched: usize,
    pub processed: usize,
    pub skipped: usize,
    pub alerts: usize,
}

impl Monitor {
    pub fn new(source: Box<dyn TradeSource>, evaluator: AlertEvaluator, poll_interval: Duration) -> Self {
        Self {
            source,
            evaluator,
            poll_interval,
        }
    }

    pub fn evaluator(&self) -> &AlertEvaluator {
        &self.evaluator
    }

    /// One fetch-evaluate pass.
    ///
    /// Trades are deduplicated by `tx_hash` within this batch only; records
    /// without a hash are dropped. Evaluation is sequential in source order.
    pub async fn run_once(&self) -> anyhow::Result<CycleStats> {
        let trades = self.source.fetch_recent_trades().await;
        counter!("trades_fetched_total").increment(trades.len() as u64);

        let mut stats = CycleStats {
            fetched: trades.len(),
            ..CycleStats::default()
        };
        let mut seen: HashSet<&str> = HashSet::with_capacity(trades.len());

        for trade in &trades {
            let Some(tx) = trade.tx_hash.as_deref().filter(|tx| !tx.is_empty()) else {
                stats.skipped += 1;
                continue;
            };
            if !seen.insert(tx) {
                counter!("duplicate_trades_skipped_total").increment(1);
                stats.skipped += 1;
                continue;
            }

            let alerts = self.evaluator.process_trade(trade).await?;
            stats.processed += 1;
            stats.alerts += alerts.len();
        }

        Ok(stats)
    }

    /// Poll forever. Errors end the current cycle only.
    pub async fn run(&self) -> anyhow::Result<()> {
        self.evaluator.ledger().init().await?;

        tracing::info!(
            source = self.source.kind(),
            interval_secs = self.poll_interval.as_secs(),
            "Trade monitor started"
        );

        loop {
            let start = Instant::now();
            match self.run_once().await {
                Ok(stats) => {
                    if stats.fetched > 0 {
                        tracing::info!(
                            fetched = stats.fetched,
                            processed = stats.processed,
                            skipped = stats.skipped,
                            alerts = stats.alerts,
                            "Poll cycle complete"
                        );
                    }
                }
                Err(e) => {
                    counter!("poll_cycles_failed_total").increment(1);
                    tracing::error!(error = %e, "Poll cycle failed");
                }
            }
            histogram!("poll_cycle_seconds").record(start.elapsed().as_secs_f64());

            sleep(self.poll_interval).await;
        }
    }
}
