use sqlx::SqlitePool;
use tokio::sync::Mutex;

use super::SCHEMA;
use crate::models::{LedgerEntry, TradeRecord};

/// Append-only store of ingested trades.
///
/// Call [`Ledger::init`] once before use. Every operation also runs it, so an
/// uninitialised ledger still works; the mutex keeps schema creation to one
/// caller at a time.
#[derive(Debug)]
pub struct Ledger {
    pool: SqlitePool,
    initialized: Mutex<bool>,
}

impl Ledger {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            initialized: Mutex::new(false),
        }
    }

    /// Open the database file at `path` and create the schema.
    pub async fn open(path: &str) -> anyhow::Result<Self> {
        let ledger = Self::new(super::init_pool(path).await?);
        ledger.init().await?;
        Ok(ledger)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the backing table. Idempotent.
    pub async fn init(&self) -> anyhow::Result<()> {
        let mut initialized = self.initialized.lock().await;
        if *initialized {
            return Ok(());
        }
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        *initialized = true;
        tracing::debug!("Ledger schema ready");
        Ok(())
    }

    /// Append a trade. No uniqueness check on `tx_hash`.
    pub async fn record(&self, trade: &TradeRecord) -> anyhow::Result<i64> {
        self.init().await?;
        let result = sqlx::query(
            r#"
            INSERT INTO trades (tx_hash, wallet, market_id, market_name, amount_usdc, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&trade.tx_hash)
        .bind(&trade.wallet)
        .bind(&trade.market_id)
        .bind(&trade.market_name)
        .bind(trade.amount_usdc)
        .bind(trade.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Count trades by `wallet` in `market_id` whose timestamp lies within
    /// `window_secs` of the current wall-clock time.
    pub async fn count_recent_by_wallet_and_market(
        &self,
        wallet: &str,
        market_id: Option<&str>,
        window_secs: i64,
    ) -> anyhow::Result<i64> {
        self.init().await?;
        let cutoff = chrono::Utc::now().timestamp() - window_secs;
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM trades WHERE wallet = ? AND market_id IS ? AND timestamp >= ?",
        )
        .bind(wallet)
        .bind(market_id)
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// True if at least one trade by `wallet` is already recorded.
    pub async fn has_any_prior_trades(&self, wallet: &str) -> anyhow::Result<bool> {
        self.init().await?;
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trades WHERE wallet = ?")
            .bind(wallet)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0 > 0)
    }

    /// All entries for a wallet, oldest first.
    pub async fn entries_by_wallet(&self, wallet: &str) -> anyhow::Result<Vec<LedgerEntry>> {
        self.init().await?;
        let entries = sqlx::query_as::<_, LedgerEntry>(
            "SELECT * FROM trades WHERE wallet = ? ORDER BY id ASC",
        )
        .bind(wallet)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Total number of entries.
    pub async fn count_entries(&self) -> anyhow::Result<i64> {
        self.init().await?;
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trades")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0)
    }
}
