//! Shared types for the ROLLHOUSE server.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that ledger, engine, and server
//! modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Bet color
// ---------------------------------------------------------------------------

/// The three wager targets: the green die, the blue die, or a tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetColor {
    Green,
    Blue,
    Same,
}

impl BetColor {
    /// All colors in fixed priority order (used to break stake ties).
    pub const ALL: [BetColor; 3] = [BetColor::Green, BetColor::Blue, BetColor::Same];
}

impl fmt::Display for BetColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetColor::Green => write!(f, "green"),
            BetColor::Blue => write!(f, "blue"),
            BetColor::Same => write!(f, "same"),
        }
    }
}

impl std::str::FromStr for BetColor {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "green" => Ok(BetColor::Green),
            "blue" => Ok(BetColor::Blue),
            "same" => Ok(BetColor::Same),
            _ => Err(GameError::InvalidParams),
        }
    }
}

// ---------------------------------------------------------------------------
// Bet
// ---------------------------------------------------------------------------

/// One wallet's stake in the current round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub wallet: String,
    pub amount: f64,
    pub color: BetColor,
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bets {:.2} on {}", self.wallet, self.amount, self.color)
    }
}

// ---------------------------------------------------------------------------
// Stake totals
// ---------------------------------------------------------------------------

/// Per-color staked sums for one round; colors with no bets report 0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StakeTotals {
    pub green: f64,
    pub blue: f64,
    pub same: f64,
}

impl StakeTotals {
    pub fn get(&self, color: BetColor) -> f64 {
        match color {
            BetColor::Green => self.green,
            BetColor::Blue => self.blue,
            BetColor::Same => self.same,
        }
    }

    pub fn total(&self) -> f64 {
        self.green + self.blue + self.same
    }
}

// ---------------------------------------------------------------------------
// Roll outcome
// ---------------------------------------------------------------------------

/// The winning color implied by a pair of dice faces.
pub fn color_of_faces(green: u8, blue: u8) -> BetColor {
    if green > blue {
        BetColor::Green
    } else if blue > green {
        BetColor::Blue
    } else {
        BetColor::Same
    }
}

/// The result of one resolved round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollOutcome {
    /// Green die face, 1–6.
    pub green: u8,
    /// Blue die face, 1–6.
    pub blue: u8,
    /// Winning color, always consistent with the faces.
    pub result: BetColor,
    /// Whether any bets were settled this round.
    pub won: bool,
    pub message: String,
}

impl RollOutcome {
    /// Faces in display range and result matching the faces.
    pub fn is_consistent(&self) -> bool {
        (1..=6).contains(&self.green)
            && (1..=6).contains(&self.blue)
            && color_of_faces(self.green, self.blue) == self.result
    }
}

impl fmt::Display for RollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "green={} blue={} → {} ({})",
            self.green, self.blue, self.result, self.message,
        )
    }
}

// ---------------------------------------------------------------------------
// Round phase & status
// ---------------------------------------------------------------------------

/// Phase of the single active round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    Idle,
    Open,
    Locked,
    Resolving,
    Resolved,
    Cooldown,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundPhase::Idle => write!(f, "idle"),
            RoundPhase::Open => write!(f, "open"),
            RoundPhase::Locked => write!(f, "locked"),
            RoundPhase::Resolving => write!(f, "resolving"),
            RoundPhase::Resolved => write!(f, "resolved"),
            RoundPhase::Cooldown => write!(f, "cooldown"),
        }
    }
}

/// Passive snapshot answered to `get_status` queries.
#[derive(Debug, Clone, Serialize)]
pub struct RoundStatus {
    pub tick: u32,
    pub phase: RoundPhase,
    pub bets: Vec<Bet>,
    pub rounds_played: u64,
    pub started_at: DateTime<Utc>,
}

impl RoundStatus {
    /// Uptime since the engine started.
    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for ROLLHOUSE.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid request param")]
    InvalidParams,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("You have already bet")]
    DuplicateBet,

    #[error("Betting now")]
    RoundLocked,

    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- BetColor tests --

    #[test]
    fn test_color_display() {
        assert_eq!(format!("{}", BetColor::Green), "green");
        assert_eq!(format!("{}", BetColor::Blue), "blue");
        assert_eq!(format!("{}", BetColor::Same), "same");
    }

    #[test]
    fn test_color_from_str() {
        assert_eq!("green".parse::<BetColor>().unwrap(), BetColor::Green);
        assert_eq!("blue".parse::<BetColor>().unwrap(), BetColor::Blue);
        assert_eq!("same".parse::<BetColor>().unwrap(), BetColor::Same);
        assert_eq!("red".parse::<BetColor>(), Err(GameError::InvalidParams));
        // Wire strings are exact — no case folding
        assert!("GREEN".parse::<BetColor>().is_err());
    }

    #[test]
    fn test_color_serialization_roundtrip() {
        for color in BetColor::ALL {
            let json = serde_json::to_string(&color).unwrap();
            let parsed: BetColor = serde_json::from_str(&json).unwrap();
            assert_eq!(color, parsed);
        }
        assert_eq!(serde_json::to_string(&BetColor::Green).unwrap(), "\"green\"");
    }

    #[test]
    fn test_color_priority_order() {
        assert_eq!(
            BetColor::ALL,
            [BetColor::Green, BetColor::Blue, BetColor::Same]
        );
    }

    // -- StakeTotals tests --

    #[test]
    fn test_stake_totals_get_and_total() {
        let totals = StakeTotals {
            green: 50.0,
            blue: 10.0,
            same: 0.0,
        };
        assert_eq!(totals.get(BetColor::Green), 50.0);
        assert_eq!(totals.get(BetColor::Blue), 10.0);
        assert_eq!(totals.get(BetColor::Same), 0.0);
        assert!((totals.total() - 60.0).abs() < 1e-10);
    }

    #[test]
    fn test_stake_totals_default_is_zero() {
        assert_eq!(StakeTotals::default().total(), 0.0);
    }

    // -- RollOutcome tests --

    #[test]
    fn test_color_of_faces() {
        assert_eq!(color_of_faces(5, 2), BetColor::Green);
        assert_eq!(color_of_faces(1, 6), BetColor::Blue);
        assert_eq!(color_of_faces(4, 4), BetColor::Same);
    }

    #[test]
    fn test_outcome_consistency() {
        let outcome = RollOutcome {
            green: 4,
            blue: 2,
            result: BetColor::Green,
            won: true,
            message: "Bet complete".to_string(),
        };
        assert!(outcome.is_consistent());

        let inconsistent = RollOutcome {
            result: BetColor::Blue,
            ..outcome.clone()
        };
        assert!(!inconsistent.is_consistent());

        let out_of_range = RollOutcome { green: 7, ..outcome };
        assert!(!out_of_range.is_consistent());
    }

    #[test]
    fn test_outcome_serialization_roundtrip() {
        let outcome = RollOutcome {
            green: 3,
            blue: 3,
            result: BetColor::Same,
            won: false,
            message: "No bet".to_string(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"same\""));
        let parsed: RollOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.result, BetColor::Same);
        assert!(!parsed.won);
        assert_eq!(parsed.message, "No bet");
    }

    // -- Bet tests --

    #[test]
    fn test_bet_serialization_roundtrip() {
        let bet = Bet {
            wallet: "0xabc".to_string(),
            amount: 12.5,
            color: BetColor::Blue,
        };
        let json = serde_json::to_string(&bet).unwrap();
        let parsed: Bet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.wallet, "0xabc");
        assert_eq!(parsed.color, BetColor::Blue);
        assert!((parsed.amount - 12.5).abs() < 1e-10);
    }

    #[test]
    fn test_bet_display() {
        let bet = Bet {
            wallet: "0xabc".to_string(),
            amount: 10.0,
            color: BetColor::Green,
        };
        let display = format!("{bet}");
        assert!(display.contains("0xabc"));
        assert!(display.contains("green"));
    }

    // -- RoundPhase tests --

    #[test]
    fn test_phase_display() {
        assert_eq!(format!("{}", RoundPhase::Open), "open");
        assert_eq!(format!("{}", RoundPhase::Resolving), "resolving");
        assert_eq!(format!("{}", RoundPhase::Idle), "idle");
    }

    #[test]
    fn test_phase_serialization_roundtrip() {
        for phase in [
            RoundPhase::Idle,
            RoundPhase::Open,
            RoundPhase::Locked,
            RoundPhase::Resolving,
            RoundPhase::Resolved,
            RoundPhase::Cooldown,
        ] {
            let json = serde_json::to_string(&phase).unwrap();
            let parsed: RoundPhase = serde_json::from_str(&json).unwrap();
            assert_eq!(phase, parsed);
        }
    }

    // -- GameError tests --

    #[test]
    fn test_game_error_display() {
        assert_eq!(format!("{}", GameError::InvalidParams), "Invalid request param");
        assert_eq!(format!("{}", GameError::InsufficientFunds), "Insufficient funds");
        assert_eq!(format!("{}", GameError::DuplicateBet), "You have already bet");
        assert_eq!(format!("{}", GameError::RoundLocked), "Betting now");
        assert!(format!("{}", GameError::LedgerUnavailable("db gone".into()))
            .contains("db gone"));
    }
}
