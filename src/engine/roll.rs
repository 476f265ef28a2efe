//! Outcome selection — the stake-biased draw and the dice faces behind it.
//!
//! The draw favours the house: the color carrying the most money wins 60%
//! of rounds, the runner-up 30%, and the least-staked 10%. Colors nobody
//! staked never enter the ranking, so a lone staked color wins outright.
//! The faces are generated to match the chosen color, then shifted into
//! the 1–6 display range, which preserves the ordering relation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

use crate::types::{color_of_faces, BetColor, RollOutcome, StakeTotals};

/// Thresholds for the biased winner draw over `roll(10)`.
const HIGH_CUTOFF: u32 = 5; // r <= 5 → top-staked, 60%
const MIDDLE_CUTOFF: u32 = 8; // r <= 8 → second, 30%; else lowest, 10%

// ---------------------------------------------------------------------------
// Dice
// ---------------------------------------------------------------------------

/// Source of uniform random integers. The seam that makes every draw
/// reproducible under test.
pub trait Dice: Send {
    /// Uniform integer in `[0, bound)`.
    fn roll(&mut self, bound: u32) -> u32;
}

/// Production dice over a seedable PRNG.
pub struct StdDice(StdRng);

impl StdDice {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    /// Fixed seed for reproducible statistical runs.
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Dice for StdDice {
    fn roll(&mut self, bound: u32) -> u32 {
        self.0.gen_range(0..bound)
    }
}

/// Replays a fixed roll sequence; exhausted entries read as 0.
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
}

impl ScriptedDice {
    pub fn new(rolls: &[u32]) -> Self {
        Self {
            rolls: rolls.iter().copied().collect(),
        }
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self, bound: u32) -> u32 {
        self.rolls.pop_front().unwrap_or(0) % bound
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Colors that attracted money, ordered by stake descending. The sort is
/// stable, so equal stakes keep the fixed green/blue/same priority.
pub fn rank_stakes(totals: &StakeTotals) -> Vec<BetColor> {
    let mut ranked: Vec<BetColor> = BetColor::ALL
        .into_iter()
        .filter(|c| totals.get(*c) > 0.0)
        .collect();
    ranked.sort_by(|a, b| {
        totals
            .get(*b)
            .partial_cmp(&totals.get(*a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

/// Pick the winner for a draw `r` in [0,9] over a non-empty ranking.
/// Rankings shorter than three clamp to their last entry, so a lone
/// staked color is simultaneously top, second, and lowest.
pub fn winner_for_roll(r: u32, ranked: &[BetColor]) -> BetColor {
    let slot = if r <= HIGH_CUTOFF {
        0
    } else if r <= MIDDLE_CUTOFF {
        1
    } else {
        2
    };
    ranked[slot.min(ranked.len() - 1)]
}

/// Zero-based faces consistent with the winning color.
fn draw_faces(dice: &mut dyn Dice, winner: BetColor) -> (u8, u8) {
    match winner {
        BetColor::Green => {
            let blue = dice.roll(5) as u8;
            let green = blue + 1 + dice.roll(5 - blue as u32) as u8;
            (green, blue)
        }
        BetColor::Blue => {
            let green = dice.roll(5) as u8;
            let blue = green + 1 + dice.roll(5 - green as u32) as u8;
            (green, blue)
        }
        BetColor::Same => {
            let face = dice.roll(6) as u8;
            (face, face)
        }
    }
}

/// Draw the round's outcome from the aggregated stakes.
///
/// An empty pool still produces faces for display — drawn over a uniform
/// color — but is flagged `won = false` and settles nothing.
pub fn draw_outcome(dice: &mut dyn Dice, totals: &StakeTotals) -> RollOutcome {
    let ranked = rank_stakes(totals);

    let (winner, won, message) = if ranked.is_empty() {
        let color = BetColor::ALL[dice.roll(3) as usize];
        (color, false, "No bet")
    } else {
        let r = dice.roll(10);
        (winner_for_roll(r, &ranked), true, "Bet complete")
    };

    let (green, blue) = draw_faces(dice, winner);
    RollOutcome {
        green: green + 1,
        blue: blue + 1,
        result: color_of_faces(green + 1, blue + 1),
        won,
        message: message.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
