//! Ledger integrations.
//!
//! Defines the `Ledger` trait over the external balance store and provides
//! implementations for:
//! - SQLite (sqlx) — the persistent treasury table
//! - Memory — deterministic in-memory double for tests and local runs
//!
//! On-chain confirmation and withdrawal signing live outside this process;
//! deposits and withdrawals arrive here already confirmed, carrying their
//! chain-side index.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One recorded withdrawal claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaimRecord {
    pub index: u64,
    pub amount: f64,
}

/// Full wallet state as held by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub wallet: String,
    pub amount: f64,
    pub deposit_index: u64,
    pub claim_index: u64,
    pub claim_history: Vec<ClaimRecord>,
}

/// Abstraction over the external balance ledger.
///
/// Implementors persist wallet balances and claim history. The engine only
/// uses `balance`/`credit`/`debit`; the deposit and withdraw operations are
/// transport-facing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current balance. A wallet the store has never seen reads as 0.
    async fn balance(&self, wallet: &str) -> Result<f64>;

    /// Increase a wallet's balance, creating the entry if absent.
    async fn credit(&self, wallet: &str, amount: f64) -> Result<()>;

    /// Decrease a wallet's balance unconditionally. Sufficiency was checked
    /// at bet admission; a balance that moved since can go negative here.
    async fn debit(&self, wallet: &str, amount: f64) -> Result<()>;

    /// Credit a confirmed deposit and record its chain-side index.
    async fn deposit(&self, wallet: &str, amount: f64, index: u64) -> Result<()>;

    /// Withdraw against the balance. Unlike `debit`, this validates
    /// sufficiency, then records the claim index and appends to the
    /// claim history.
    async fn withdraw(&self, wallet: &str, amount: f64, index: u64) -> Result<()>;

    /// Full wallet state, or `None` if the store has never seen the wallet.
    async fn entry(&self, wallet: &str) -> Result<Option<LedgerEntry>>;
}
