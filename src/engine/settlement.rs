//! Settlement — paying out and collecting every pooled bet once the
//! outcome is known.
//!
//! Winners are credited `stake × (multiplier − 1)`; everyone else is
//! debited their full stake. All ledger mutations for a round run
//! concurrently and are joined before the clock may move on. A failed
//! mutation is logged and reported, never retried, and never blocks the
//! other wallets.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

use crate::ledger::Ledger;
use crate::types::{Bet, BetColor, RollOutcome};

// ---------------------------------------------------------------------------
// Payout table
// ---------------------------------------------------------------------------

/// Per-color payout multipliers. The two dice colors share one value; the
/// tie pays a distinct, higher one.
#[derive(Debug, Clone, Copy)]
pub struct PayoutTable {
    pub color: f64,
    pub same: f64,
}

impl PayoutTable {
    pub fn multiplier(&self, color: BetColor) -> f64 {
        match color {
            BetColor::Green | BetColor::Blue => self.color,
            BetColor::Same => self.same,
        }
    }
}

// ---------------------------------------------------------------------------
// Settlement report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FailedSettlement {
    pub wallet: String,
    pub reason: String,
}

/// What actually happened to the pooled bets of one round.
#[derive(Debug, Clone, Default)]
pub struct SettlementReport {
    pub winners: usize,
    pub losers: usize,
    pub failed: Vec<FailedSettlement>,
    /// Sum of winnings successfully credited.
    pub total_paid: f64,
    /// Sum of stakes successfully collected.
    pub total_collected: f64,
}

impl SettlementReport {
    pub fn settled(&self) -> usize {
        self.winners + self.losers
    }
}

// ---------------------------------------------------------------------------
// Settlement engine
// ---------------------------------------------------------------------------

pub struct SettlementEngine {
    ledger: Arc<dyn Ledger>,
    payouts: PayoutTable,
}

enum Applied {
    Paid(f64),
    Collected(f64),
    Failed(FailedSettlement),
}

impl SettlementEngine {
    pub fn new(ledger: Arc<dyn Ledger>, payouts: PayoutTable) -> Self {
        Self { ledger, payouts }
    }

    /// Settle the drained pool against the outcome. Returns once every
    /// ledger mutation has completed or permanently failed.
    pub async fn settle(&self, outcome: &RollOutcome, bets: Vec<Bet>) -> SettlementReport {
        let mut report = SettlementReport::default();

        // An unwon round (empty pool) touches the ledger zero times.
        if !outcome.won || bets.is_empty() {
            return report;
        }

        let results = join_all(bets.into_iter().map(|bet| self.apply(outcome, bet))).await;

        for applied in results {
            match applied {
                Applied::Paid(amount) => {
                    report.winners += 1;
                    report.total_paid += amount;
                }
                Applied::Collected(amount) => {
                    report.losers += 1;
                    report.total_collected += amount;
                }
                Applied::Failed(failure) => report.failed.push(failure),
            }
        }

        info!(
            result = %outcome.result,
            winners = report.winners,
            losers = report.losers,
            failed = report.failed.len(),
            paid = format!("{:.2}", report.total_paid),
            collected = format!("{:.2}", report.total_collected),
            "Round settled"
        );

        report
    }

    async fn apply(&self, outcome: &RollOutcome, bet: Bet) -> Applied {
        if bet.color == outcome.result {
            let winnings = bet.amount * (self.payouts.multiplier(bet.color) - 1.0);
            match self.ledger.credit(&bet.wallet, winnings).await {
                Ok(()) => Applied::Paid(winnings),
                Err(e) => {
                    warn!(wallet = %bet.wallet, error = %e, "Payout credit failed");
                    Applied::Failed(FailedSettlement {
                        wallet: bet.wallet,
                        reason: e.to_string(),
                    })
                }
            }
        } else {
            match self.ledger.debit(&bet.wallet, bet.amount).await {
                Ok(()) => Applied::Collected(bet.amount),
                Err(e) => {
                    warn!(wallet = %bet.wallet, error = %e, "Stake debit failed");
                    Applied::Failed(FailedSettlement {
                        wallet: bet.wallet,
                        reason: e.to_string(),
                    })
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
