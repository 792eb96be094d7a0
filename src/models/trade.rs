use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

// ---------------------------------------------------------------------------
// TradeRecord: canonical pipeline message
// ---------------------------------------------------------------------------

/// A normalized trade, as produced by every `TradeSource`.
///
/// Upstream schemas are loose, so everything except the amount and the
/// timestamp is optional. `tx_hash` is the dedup key within a poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub tx_hash: Option<String>,
    pub wallet: Option<String>,
    pub market_id: Option<String>,
    pub market_name: Option<String>,
    /// Amount in USDC (already scaled down from base units where needed).
    pub amount_usdc: f64,
    /// Upstream-reported event time, Unix seconds.
    pub timestamp: i64,
}

impl TradeRecord {
    /// Market label for humans: the title when known, otherwise the id.
    pub fn market_label(&self) -> &str {
        self.market_name
            .as_deref()
            .or(self.market_id.as_deref())
            .unwrap_or("unknown")
    }
}

impl fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = |s: Option<&str>| -> String { s.unwrap_or("-").chars().take(10).collect() };
        write!(
            f,
            "Trade: tx={} wallet={} market={} amount={:.2} ts={}",
            short(self.tx_hash.as_deref()),
            short(self.wallet.as_deref()),
            self.market_label(),
            self.amount_usdc,
            self.timestamp,
        )
    }
}

// ---------------------------------------------------------------------------
// LedgerEntry: database row
// ---------------------------------------------------------------------------

/// Database row for the append-only `trades` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    pub id: i64,
    pub tx_hash: Option<String>,
    pub wallet: Option<String>,
    pub market_id: Option<String>,
    pub market_name: Option<String>,
    pub amount_usdc: f64,
    pub timestamp: i64,
}

impl From<LedgerEntry> for TradeRecord {
    fn from(e: LedgerEntry) -> Self {
        Self {
            tx_hash: e.tx_hash,
            wallet: e.wallet,
            market_id: e.market_id,
            market_name: e.market_name,
            amount_usdc: e.amount_usdc,
            timestamp: e.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_shortens_hash_and_wallet() {
        let trade = TradeRecord {
            tx_hash: Some("0x1234567890abcdef".into()),
            wallet: None,
            market_id: Some("0xcond".into()),
            market_name: None,
            amount_usdc: 12.5,
            timestamp: 7,
        };
        assert_eq!(
            trade.to_string(),
            "Trade: tx=0x12345678 wallet=- market=0xcond amount=12.50 ts=7"
        );
    }

    #[test]
    fn test_display_handles_multibyte_ids() {
        let trade = TradeRecord {
            tx_hash: Some("éééééééééééé".into()),
            wallet: Some("w".into()),
            market_id: None,
            market_name: Some("Élection".into()),
            amount_usdc: 0.0,
            timestamp: 0,
        };
        assert!(trade.to_string().starts_with("Trade: tx=éééééééééé wallet=w market=Élection"));
    }
}
