//! SQLite ledger.
//!
//! Persistent `Ledger` implementation over a single `treasury` table.
//! Balances are upserted; the claim history is a JSON column that is
//! read-modified-written without a transaction, the same discipline the
//! store has always had — settlement correctness does not depend on it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::types::GameError;

use super::{ClaimRecord, Ledger, LedgerEntry};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS treasury (
    wallet        TEXT PRIMARY KEY,
    amount        REAL NOT NULL DEFAULT 0,
    deposit_index INTEGER NOT NULL DEFAULT 0,
    claim_index   INTEGER NOT NULL DEFAULT 0,
    claim_history TEXT NOT NULL DEFAULT '[]'
)";

pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Open (or create) the treasury database and ensure the schema exists.
    pub async fn connect(url: &str) -> Result<Self> {
        // One connection: SQLite has a single writer, and `:memory:` URLs
        // must not be split across pooled connections.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .with_context(|| format!("Failed to open ledger database: {url}"))?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .context("Failed to create treasury table")?;

        info!(url, "Ledger database ready");
        Ok(Self { pool })
    }

    async fn fetch(&self, wallet: &str) -> Result<Option<LedgerEntry>> {
        let row = sqlx::query(
            "SELECT wallet, amount, deposit_index, claim_index, claim_history \
             FROM treasury WHERE wallet = ?1",
        )
        .bind(wallet)
        .fetch_optional(&self.pool)
        .await
        .context("Ledger lookup failed")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let history_json: String = row.try_get("claim_history")?;
        let claim_history: Vec<ClaimRecord> = serde_json::from_str(&history_json)
            .context("Corrupt claim history")?;

        Ok(Some(LedgerEntry {
            wallet: row.try_get("wallet")?,
            amount: row.try_get("amount")?,
            deposit_index: row.try_get::<i64, _>("deposit_index")? as u64,
            claim_index: row.try_get::<i64, _>("claim_index")? as u64,
            claim_history,
        }))
    }
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn balance(&self, wallet: &str) -> Result<f64> {
        let row = sqlx::query("SELECT amount FROM treasury WHERE wallet = ?1")
            .bind(wallet)
            .fetch_optional(&self.pool)
            .await
            .context("Balance lookup failed")?;
        Ok(row.map(|r| r.get::<f64, _>("amount")).unwrap_or(0.0))
    }

    async fn credit(&self, wallet: &str, amount: f64) -> Result<()> {
        sqlx::query(
            "INSERT INTO treasury (wallet, amount) VALUES (?1, ?2) \
             ON CONFLICT(wallet) DO UPDATE SET amount = amount + ?2",
        )
        .bind(wallet)
        .bind(amount)
        .execute(&self.pool)
        .await
        .context("Credit failed")?;
        debug!(wallet, amount, "Ledger credit");
        Ok(())
    }

    async fn debit(&self, wallet: &str, amount: f64) -> Result<()> {
        sqlx::query(
            "INSERT INTO treasury (wallet, amount) VALUES (?1, -?2) \
             ON CONFLICT(wallet) DO UPDATE SET amount = amount - ?2",
        )
        .bind(wallet)
        .bind(amount)
        .execute(&self.pool)
        .await
        .context("Debit failed")?;
        debug!(wallet, amount, "Ledger debit");
        Ok(())
    }

    async fn deposit(&self, wallet: &str, amount: f64, index: u64) -> Result<()> {
        sqlx::query(
            "INSERT INTO treasury (wallet, amount, deposit_index) VALUES (?1, ?2, ?3) \
             ON CONFLICT(wallet) DO UPDATE SET amount = amount + ?2, deposit_index = ?3",
        )
        .bind(wallet)
        .bind(amount)
        .bind(index as i64)
        .execute(&self.pool)
        .await
        .context("Deposit failed")?;
        info!(wallet, amount, index, "Deposit applied");
        Ok(())
    }

    async fn withdraw(&self, wallet: &str, amount: f64, index: u64) -> Result<()> {
        if amount <= 0.0 {
            return Err(GameError::InvalidParams.into());
        }

        let entry = self.fetch(wallet).await?;
        let (balance, mut history) = match entry {
            Some(e) => (e.amount, e.claim_history),
            None => (0.0, Vec::new()),
        };
        if amount > balance {
            return Err(GameError::InsufficientFunds.into());
        }

        history.push(ClaimRecord { index, amount });
        let history_json = serde_json::to_string(&history)?;

        sqlx::query(
            "UPDATE treasury SET amount = amount - ?2, claim_index = ?3, \
             claim_history = ?4 WHERE wallet = ?1",
        )
        .bind(wallet)
        .bind(amount)
        .bind(index as i64)
        .bind(history_json)
        .execute(&self.pool)
        .await
        .context("Withdraw failed")?;
        info!(wallet, amount, index, "Withdrawal applied");
        Ok(())
    }

    async fn entry(&self, wallet: &str) -> Result<Option<LedgerEntry>> {
        self.fetch(wallet).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
