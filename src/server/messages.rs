//! Wire messages for the WebSocket channel.
//!
//! Incoming frames carry an `event` tag naming the request; outgoing
//! frames carry a `type` tag so clients can route them. The bet's color
//! travels under the historical field name `type` inside the betting
//! request, which is why the envelope tag is `event` and not `type`.

use serde::{Deserialize, Serialize};

use crate::types::{Bet, BetColor, RollOutcome, RoundPhase};

// ---------------------------------------------------------------------------
// Incoming
// ---------------------------------------------------------------------------

/// A request frame from a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Stake `amount` on a color for the open round. Fields are optional
    /// so that missing ones surface as a domain rejection, not a parse
    /// failure.
    Betting {
        wallet: Option<String>,
        amount: Option<f64>,
        #[serde(rename = "type")]
        color: Option<String>,
    },
    GetStatus,
    GetFund {
        wallet: String,
    },
    /// Apply an externally confirmed deposit.
    DepositFund {
        wallet: String,
        amount: f64,
        index: u64,
    },
    WithdrawFund {
        wallet: String,
        amount: f64,
    },
}

// ---------------------------------------------------------------------------
// Outgoing
// ---------------------------------------------------------------------------

/// A frame pushed to one client or broadcast to all of them.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The betting window just opened.
    BettingStart,
    /// The round locked and resolved; carries the outcome.
    RollStart {
        #[serde(flatten)]
        outcome: RollOutcome,
    },
    /// Display-only re-announcement of the same outcome.
    RollEnd {
        #[serde(flatten)]
        outcome: RollOutcome,
    },
    /// Result of a betting request. Successes are broadcast to everyone;
    /// rejections go only to the requester.
    Betting {
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        amount: Option<f64>,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        wallet: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<BetColor>,
    },
    GetStatus {
        tick: u32,
        phase: RoundPhase,
        bets: Vec<Bet>,
        rounds_played: u64,
    },
    GetFund {
        ok: bool,
        wallet: String,
        amount: Option<f64>,
    },
    DepositFund {
        ok: bool,
        message: String,
    },
    WithdrawFund {
        ok: bool,
        message: String,
    },
    Error {
        ok: bool,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_betting_request() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"event":"betting","wallet":"0xabc","amount":25.0,"type":"green"}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Betting { wallet, amount, color } => {
                assert_eq!(wallet.as_deref(), Some("0xabc"));
                assert_eq!(amount, Some(25.0));
                assert_eq!(color.as_deref(), Some("green"));
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_parse_betting_with_missing_fields() {
        // Missing fields parse; the handler rejects them as invalid params.
        let msg: ClientMessage =
            serde_json::from_str(r#"{"event":"betting","wallet":"0xabc"}"#).unwrap();
        match msg {
            ClientMessage::Betting { amount, color, .. } => {
                assert!(amount.is_none());
                assert!(color.is_none());
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_parse_get_status_and_funds() {
        assert!(matches!(
            serde_json::from_str::<ClientMessage>(r#"{"event":"get_status"}"#).unwrap(),
            ClientMessage::GetStatus
        ));
        assert!(matches!(
            serde_json::from_str::<ClientMessage>(r#"{"event":"get_fund","wallet":"w"}"#).unwrap(),
            ClientMessage::GetFund { .. }
        ));
        assert!(matches!(
            serde_json::from_str::<ClientMessage>(
                r#"{"event":"deposit_fund","wallet":"w","amount":5.0,"index":2}"#
            )
            .unwrap(),
            ClientMessage::DepositFund { index: 2, .. }
        ));
        assert!(matches!(
            serde_json::from_str::<ClientMessage>(
                r#"{"event":"withdraw_fund","wallet":"w","amount":5.0}"#
            )
            .unwrap(),
            ClientMessage::WithdrawFund { .. }
        ));
    }

    #[test]
    fn test_unknown_event_is_a_parse_error() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"event":"explode"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json at all").is_err());
    }

    #[test]
    fn test_roll_start_flattens_outcome() {
        let json = serde_json::to_string(&ServerMessage::RollStart {
            outcome: RollOutcome {
                green: 4,
                blue: 2,
                result: BetColor::Green,
                won: true,
                message: "Bet complete".to_string(),
            },
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "roll_start");
        assert_eq!(value["green"], 4);
        assert_eq!(value["blue"], 2);
        assert_eq!(value["result"], "green");
        assert_eq!(value["won"], true);
    }

    #[test]
    fn test_betting_start_tag() {
        let json = serde_json::to_string(&ServerMessage::BettingStart).unwrap();
        assert_eq!(json, r#"{"type":"betting_start"}"#);
    }

    #[test]
    fn test_betting_reply_skips_empty_fields() {
        let json = serde_json::to_string(&ServerMessage::Betting {
            ok: false,
            amount: None,
            message: "Insufficient funds".to_string(),
            wallet: Some("w".to_string()),
            color: Some(BetColor::Blue),
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "betting");
        assert_eq!(value["ok"], false);
        assert!(value.get("amount").is_none());
        assert_eq!(value["color"], "blue");
    }

    #[test]
    fn test_status_reply_shape() {
        let json = serde_json::to_string(&ServerMessage::GetStatus {
            tick: 7,
            phase: RoundPhase::Open,
            bets: vec![Bet {
                wallet: "w".to_string(),
                amount: 5.0,
                color: BetColor::Same,
            }],
            rounds_played: 3,
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "get_status");
        assert_eq!(value["tick"], 7);
        assert_eq!(value["bets"][0]["color"], "same");
        assert_eq!(value["rounds_played"], 3);
    }
}
