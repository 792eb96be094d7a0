use metrics::counter;
use std::sync::Arc;

use crate::db::Ledger;
use crate::models::{Alert, AlertReason, TradeRecord};
use crate::services::notifier::AlertNotifier;
use crate::services::wallet_age::{WalletAgeOracle, NEW_WALLET_WINDOW_SECS};

/// Thresholds for the three alert signals.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Single-trade amount (USDC) at or above which a large-trade alert fires.
    pub large_trade_threshold: f64,
    /// Window for counting repeated trades in one market.
    pub frequency_window_secs: i64,
    /// Trade count within the window that triggers a frequency alert.
    pub frequency_min_trades: i64,
    /// Age below which a wallet's first on-chain activity counts as new.
    pub new_wallet_window_secs: i64,
}

impl PipelineConfig {
    pub fn with_threshold(large_trade_threshold: f64) -> Self {
        Self {
            large_trade_threshold,
            ..Self::default()
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            large_trade_threshold: 5000.0,
            frequency_window_secs: 24 * 3600,
            frequency_min_trades: 3,
            new_wallet_window_secs: NEW_WALLET_WINDOW_SECS,
        }
    }
}

/// Records each trade and decides which alert signals fire for it.
pub struct AlertEvaluator {
    ledger: Arc<Ledger>,
    oracle: Arc<dyn WalletAgeOracle>,
    notifier: Option<Arc<dyn AlertNotifier>>,
    config: PipelineConfig,
}

impl AlertEvaluator {
    pub fn new(
        ledger: Arc<Ledger>,
        oracle: Arc<dyn WalletAgeOracle>,
        notifier: Option<Arc<dyn AlertNotifier>>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            ledger,
            oracle,
            notifier,
            config,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Process one trade:
    /// 1. Check wallet history (before recording, so "prior" excludes this trade)
    /// 2. Persist trade to the ledger
    /// 3. Large-trade signal
    /// 4. New-wallet signal (no prior trades and young on-chain history)
    /// 5. Frequency signal (count includes this trade)
    ///
    /// Returns the alerts that fired. Ledger errors propagate; delivery
    /// errors are logged and do not stop the remaining signals.
    pub async fn process_trade(&self, trade: &TradeRecord) -> anyhow::Result<Vec<Alert>> {
        let wallet = trade.wallet.as_deref();

        let has_prior = match wallet {
            Some(w) => self.ledger.has_any_prior_trades(w).await?,
            None => true,
        };

        let id = self.ledger.record(trade).await?;
        counter!("trades_ingested_total").increment(1);
        tracing::debug!(id, trade = %trade, "Trade recorded");

        let mut alerts = Vec::new();

        if trade.amount_usdc >= self.config.large_trade_threshold {
            alerts.push(AlertReason::LargeTrade {
                threshold: self.config.large_trade_threshold,
            });
        }

        if let Some(w) = wallet {
            if !has_prior && self.oracle.is_new(w, self.config.new_wallet_window_secs).await {
                alerts.push(AlertReason::NewWallet);
            }

            let count = self
                .ledger
                .count_recent_by_wallet_and_market(
                    w,
                    trade.market_id.as_deref(),
                    self.config.frequency_window_secs,
                )
                .await?;
            if count >= self.config.frequency_min_trades {
                alerts.push(AlertReason::HighFrequency { count });
            }
        }

        let alerts: Vec<Alert> = alerts
            .into_iter()
            .map(|reason| Alert::for_trade(trade, reason))
            .collect();

        for alert in &alerts {
            tracing::info!(
                wallet = %alert.wallet,
                market = %alert.market_name,
                amount = alert.amount_usdc,
                reason = %alert.reason,
                "Alert fired"
            );
            counter!("alerts_fired_total", "reason" => alert.reason.as_str()).increment(1);
            self.deliver(alert).await;
        }

        Ok(alerts)
    }

    async fn deliver(&self, alert: &Alert) {
        let Some(notifier) = &self.notifier else {
            tracing::debug!("Mail delivery not configured; skipping alert email");
            return;
        };
        if let Err(e) = notifier.send(alert).await {
            counter!("alert_delivery_failures_total").increment(1);
            tracing::error!(
                error = %e,
                wallet = %alert.wallet,
                reason = alert.reason.as_str(),
                "Alert delivery failed"
            );
        }
    }
}
