//! In-memory ledger.
//!
//! Deterministic `Ledger` implementation backed by a `HashMap`. Used by the
//! test suites and by local runs that don't want a database file. Wallets
//! can be forced to fail for partial-failure settlement tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::types::GameError;

use super::{ClaimRecord, Ledger, LedgerEntry};

#[derive(Default)]
pub struct MemoryLedger {
    entries: Mutex<HashMap<String, LedgerEntry>>,
    /// Wallets whose operations all fail (simulated store outage).
    failing: Mutex<HashSet<String>>,
    /// Count of mutating calls (credit/debit/deposit/withdraw) observed.
    mutations: Mutex<u64>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed wallets with starting balances.
    pub fn with_balances(balances: &[(&str, f64)]) -> Self {
        let ledger = Self::new();
        {
            let mut entries = ledger.entries.lock().unwrap();
            for (wallet, amount) in balances {
                entries.insert(wallet.to_string(), blank_entry(wallet, *amount));
            }
        }
        ledger
    }

    /// Force all subsequent operations for `wallet` to fail.
    pub fn fail_wallet(&self, wallet: &str) {
        self.failing.lock().unwrap().insert(wallet.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// Number of mutating ledger calls made so far.
    pub fn mutation_count(&self) -> u64 {
        *self.mutations.lock().unwrap()
    }

    fn check_failure(&self, wallet: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(wallet) {
            return Err(anyhow!("simulated ledger outage for {wallet}"));
        }
        Ok(())
    }

    fn record_mutation(&self) {
        *self.mutations.lock().unwrap() += 1;
    }
}

fn blank_entry(wallet: &str, amount: f64) -> LedgerEntry {
    LedgerEntry {
        wallet: wallet.to_string(),
        amount,
        deposit_index: 0,
        claim_index: 0,
        claim_history: Vec::new(),
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn balance(&self, wallet: &str) -> Result<f64> {
        self.check_failure(wallet)?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(wallet)
            .map(|e| e.amount)
            .unwrap_or(0.0))
    }

    async fn credit(&self, wallet: &str, amount: f64) -> Result<()> {
        self.check_failure(wallet)?;
        self.record_mutation();
        let mut entries = self.entries.lock().unwrap();
        entries
            .entry(wallet.to_string())
            .or_insert_with(|| blank_entry(wallet, 0.0))
            .amount += amount;
        Ok(())
    }

    async fn debit(&self, wallet: &str, amount: f64) -> Result<()> {
        self.check_failure(wallet)?;
        self.record_mutation();
        let mut entries = self.entries.lock().unwrap();
        entries
            .entry(wallet.to_string())
            .or_insert_with(|| blank_entry(wallet, 0.0))
            .amount -= amount;
        Ok(())
    }

    async fn deposit(&self, wallet: &str, amount: f64, index: u64) -> Result<()> {
        self.check_failure(wallet)?;
        self.record_mutation();
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .entry(wallet.to_string())
            .or_insert_with(|| blank_entry(wallet, 0.0));
        entry.amount += amount;
        entry.deposit_index = index;
        Ok(())
    }

    async fn withdraw(&self, wallet: &str, amount: f64, index: u64) -> Result<()> {
        self.check_failure(wallet)?;
        if amount <= 0.0 {
            return Err(GameError::InvalidParams.into());
        }
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .entry(wallet.to_string())
            .or_insert_with(|| blank_entry(wallet, 0.0));
        if amount > entry.amount {
            return Err(GameError::InsufficientFunds.into());
        }
        self.record_mutation();
        entry.amount -= amount;
        entry.claim_index = index;
        entry.claim_history.push(ClaimRecord { index, amount });
        Ok(())
    }

    async fn entry(&self, wallet: &str) -> Result<Option<LedgerEntry>> {
        self.check_failure(wallet)?;
        Ok(self.entries.lock().unwrap().get(wallet).cloned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
