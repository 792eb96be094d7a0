use serde::Serialize;
use std::fmt;

use super::TradeRecord;

pub const SUBJECT_PREFIX: &str = "Polymarket anomaly alert";

/// Why an alert fired. Each variant is an independent signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertReason {
    /// Single trade amount at or above the configured threshold.
    LargeTrade { threshold: f64 },
    /// No earlier trades on the platform and first on-chain activity is recent.
    NewWallet,
    /// Repeated trading by one wallet in one market inside the window.
    HighFrequency { count: i64 },
}

impl AlertReason {
    /// Stable label, used as a metrics tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertReason::LargeTrade { .. } => "large_trade",
            AlertReason::NewWallet => "new_wallet",
            AlertReason::HighFrequency { .. } => "high_frequency",
        }
    }
}

impl fmt::Display for AlertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertReason::LargeTrade { threshold } => {
                write!(f, "single amount >= {threshold} USDC")
            }
            AlertReason::NewWallet => write!(f, "new wallet, first on-chain activity < 24h"),
            AlertReason::HighFrequency { count } => {
                write!(f, ">=3 trades in same market within 24h ({count} trades)")
            }
        }
    }
}

/// An alert ready for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub wallet: String,
    pub amount_usdc: f64,
    pub market_name: String,
    pub reason: AlertReason,
}

impl Alert {
    pub fn for_trade(trade: &TradeRecord, reason: AlertReason) -> Self {
        Self {
            wallet: trade.wallet.clone().unwrap_or_else(|| "unknown".into()),
            amount_usdc: trade.amount_usdc,
            market_name: trade.market_label().to_string(),
            reason,
        }
    }

    pub fn subject(&self) -> String {
        format!("{SUBJECT_PREFIX} - {}", self.reason)
    }

    pub fn body(&self) -> String {
        format!(
            "Wallet: {}\nAmount (USDC): {}\nMarket: {}\nReason: {}\n",
            self.wallet, self.amount_usdc, self.market_name, self.reason,
        )
    }
}
