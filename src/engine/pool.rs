//! Bet pool — the in-memory set of admitted bets for the open round.
//!
//! Admission and drain both run on the engine task, so the pool needs no
//! interior locking: no admission can interleave with a drain.

use crate::types::{Bet, BetColor, GameError, StakeTotals};

#[derive(Debug, Default)]
pub struct BetPool {
    bets: Vec<Bet>,
}

impl BetPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameter checks shared with callers that want to reject garbage
    /// before paying for a balance lookup.
    pub fn validate(wallet: &str, amount: f64) -> Result<(), GameError> {
        if wallet.is_empty() || !amount.is_finite() || amount <= 0.0 {
            return Err(GameError::InvalidParams);
        }
        Ok(())
    }

    /// Admit a bet against the caller-supplied balance. Checks run in
    /// order: parameters, funds, one-bet-per-wallet. Returns the accepted
    /// amount.
    pub fn admit(
        &mut self,
        wallet: &str,
        amount: f64,
        color: BetColor,
        balance: f64,
    ) -> Result<f64, GameError> {
        Self::validate(wallet, amount)?;
        if balance < amount {
            return Err(GameError::InsufficientFunds);
        }
        if self.bets.iter().any(|b| b.wallet == wallet) {
            return Err(GameError::DuplicateBet);
        }
        self.bets.push(Bet {
            wallet: wallet.to_string(),
            amount,
            color,
        });
        Ok(amount)
    }

    /// Per-color staked sums; colors nobody staked report 0.
    pub fn totals(&self) -> StakeTotals {
        let mut totals = StakeTotals::default();
        for bet in &self.bets {
            match bet.color {
                BetColor::Green => totals.green += bet.amount,
                BetColor::Blue => totals.blue += bet.amount,
                BetColor::Same => totals.same += bet.amount,
            }
        }
        totals
    }

    /// Take every pooled bet and empty the pool. A second drain in the
    /// same round returns nothing.
    pub fn drain(&mut self) -> Vec<Bet> {
        std::mem::take(&mut self.bets)
    }

    pub fn snapshot(&self) -> Vec<Bet> {
        self.bets.clone()
    }

    pub fn len(&self) -> usize {
        self.bets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_success() {
        let mut pool = BetPool::new();
        let accepted = pool.admit("w1", 10.0, BetColor::Green, 100.0).unwrap();
        assert_eq!(accepted, 10.0);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_admit_rejects_bad_params() {
        let mut pool = BetPool::new();
        assert_eq!(
            pool.admit("", 10.0, BetColor::Green, 100.0),
            Err(GameError::InvalidParams)
        );
        assert_eq!(
            pool.admit("w1", 0.0, BetColor::Green, 100.0),
            Err(GameError::InvalidParams)
        );
        assert_eq!(
            pool.admit("w1", -5.0, BetColor::Green, 100.0),
            Err(GameError::InvalidParams)
        );
        assert_eq!(
            pool.admit("w1", f64::NAN, BetColor::Green, 100.0),
            Err(GameError::InvalidParams)
        );
        assert!(pool.is_empty());
    }

    #[test]
    fn test_admit_rejects_insufficient_funds() {
        let mut pool = BetPool::new();
        assert_eq!(
            pool.admit("w1", 50.0, BetColor::Blue, 49.99),
            Err(GameError::InsufficientFunds)
        );
        // Exactly the balance is allowed
        assert!(pool.admit("w1", 50.0, BetColor::Blue, 50.0).is_ok());
    }

    #[test]
    fn test_admit_rejects_duplicate_wallet() {
        let mut pool = BetPool::new();
        pool.admit("w1", 10.0, BetColor::Green, 100.0).unwrap();
        assert_eq!(
            pool.admit("w1", 5.0, BetColor::Blue, 100.0),
            Err(GameError::DuplicateBet)
        );
        assert_eq!(pool.len(), 1);
        // A different wallet is fine
        assert!(pool.admit("w2", 5.0, BetColor::Blue, 100.0).is_ok());
    }

    #[test]
    fn test_totals_by_color() {
        let mut pool = BetPool::new();
        pool.admit("w1", 50.0, BetColor::Green, 100.0).unwrap();
        pool.admit("w2", 20.0, BetColor::Green, 100.0).unwrap();
        pool.admit("w3", 10.0, BetColor::Blue, 100.0).unwrap();

        let totals = pool.totals();
        assert!((totals.green - 70.0).abs() < 1e-10);
        assert!((totals.blue - 10.0).abs() < 1e-10);
        assert_eq!(totals.same, 0.0);
    }

    #[test]
    fn test_drain_empties_pool() {
        let mut pool = BetPool::new();
        pool.admit("w1", 10.0, BetColor::Green, 100.0).unwrap();
        pool.admit("w2", 5.0, BetColor::Same, 100.0).unwrap();

        let drained = pool.drain();
        assert_eq!(drained.len(), 2);
        assert!(pool.is_empty());
        assert_eq!(pool.totals().total(), 0.0);

        // Drain is idempotent within a round
        assert!(pool.drain().is_empty());
    }

    #[test]
    fn test_wallet_can_rebet_after_drain() {
        let mut pool = BetPool::new();
        pool.admit("w1", 10.0, BetColor::Green, 100.0).unwrap();
        pool.drain();
        assert!(pool.admit("w1", 10.0, BetColor::Blue, 100.0).is_ok());
    }

    #[test]
    fn test_snapshot_leaves_pool_intact() {
        let mut pool = BetPool::new();
        pool.admit("w1", 10.0, BetColor::Green, 100.0).unwrap();
        let snap = pool.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(pool.len(), 1);
    }
}
