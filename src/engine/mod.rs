//! Core engine — the round lifecycle task.
//!
//! A single task owns the clock, the bet pool, the dice, and the ledger
//! handle. It multiplexes two inputs: a self-re-arming tick timer (one
//! timer armed at a time — the next tick is scheduled only after the
//! current one, settlement included, has finished) and a command channel
//! from the transport. Because admissions and drains run on the same task,
//! admission is a critical section by construction and aggregation only
//! ever sees a closed pool.

pub mod clock;
pub mod pool;
pub mod roll;
pub mod settlement;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::ledger::Ledger;
use crate::server::messages::ServerMessage;
use crate::types::{BetColor, GameError, RollOutcome, RoundPhase, RoundStatus};

use clock::{RoundClock, TickEvent};
use pool::BetPool;
use roll::Dice;
use settlement::{PayoutTable, SettlementEngine};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Requests the transport sends to the engine task.
#[derive(Debug)]
pub enum EngineCommand {
    PlaceBet {
        wallet: String,
        amount: f64,
        color: BetColor,
        reply: oneshot::Sender<Result<f64, GameError>>,
    },
    Status {
        reply: oneshot::Sender<RoundStatus>,
    },
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cheap-to-clone handle for talking to the engine task.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    events: broadcast::Sender<ServerMessage>,
}

impl EngineHandle {
    /// Submit a bet for the current round.
    pub async fn place_bet(
        &self,
        wallet: &str,
        amount: f64,
        color: BetColor,
    ) -> Result<f64, GameError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(EngineCommand::PlaceBet {
                wallet: wallet.to_string(),
                amount,
                color,
                reply,
            })
            .await
            .map_err(|_| GameError::LedgerUnavailable("engine stopped".into()))?;
        rx.await
            .map_err(|_| GameError::LedgerUnavailable("engine stopped".into()))?
    }

    /// Snapshot of the current round; side-effect free.
    pub async fn status(&self) -> Result<RoundStatus> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(EngineCommand::Status { reply })
            .await
            .map_err(|_| anyhow!("engine stopped"))?;
        rx.await.map_err(|_| anyhow!("engine stopped"))
    }

    /// Subscribe to round events and bet broadcasts.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.events.subscribe()
    }

    /// Fan a message out to every subscriber. Send errors only mean there
    /// is currently nobody listening.
    pub fn broadcast(&self, message: ServerMessage) {
        let _ = self.events.send(message);
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct RoundEngine {
    clock: RoundClock,
    pool: BetPool,
    dice: Box<dyn Dice>,
    ledger: Arc<dyn Ledger>,
    settlement: SettlementEngine,
    events: broadcast::Sender<ServerMessage>,
    commands: mpsc::Receiver<EngineCommand>,
    tick_period: Duration,
    last_outcome: Option<RollOutcome>,
    rounds_played: u64,
    started_at: DateTime<Utc>,
}

impl RoundEngine {
    pub fn new(
        cfg: &GameConfig,
        ledger: Arc<dyn Ledger>,
        dice: Box<dyn Dice>,
    ) -> (Self, EngineHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (event_tx, _) = broadcast::channel(cfg.channel_capacity);

        let engine = Self {
            clock: RoundClock::new(),
            pool: BetPool::new(),
            dice,
            ledger: ledger.clone(),
            settlement: SettlementEngine::new(
                ledger,
                PayoutTable {
                    color: cfg.color_multiplier,
                    same: cfg.same_multiplier,
                },
            ),
            events: event_tx.clone(),
            commands: cmd_rx,
            tick_period: Duration::from_millis(cfg.tick_millis),
            last_outcome: None,
            rounds_played: 0,
            started_at: Utc::now(),
        };

        let handle = EngineHandle {
            commands: cmd_tx,
            events: event_tx,
        };

        (engine, handle)
    }

    /// Drive the round clock until every handle is gone.
    pub async fn run(mut self) {
        info!(
            tick_millis = self.tick_period.as_millis() as u64,
            "Round clock started"
        );

        let mut next_tick = Instant::now() + self.tick_period;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(next_tick) => {
                    self.advance().await;
                    // Re-arm only after the tick's work completed; a slow
                    // settlement delays the schedule, it never overlaps it.
                    next_tick = Instant::now() + self.tick_period;
                }
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        info!("All engine handles dropped; round clock stopping");
                        break;
                    }
                }
            }
        }
    }

    async fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::PlaceBet {
                wallet,
                amount,
                color,
                reply,
            } => {
                let result = self.admit(&wallet, amount, color).await;
                let _ = reply.send(result);
            }
            EngineCommand::Status { reply } => {
                let _ = reply.send(self.status());
            }
        }
    }

    async fn admit(&mut self, wallet: &str, amount: f64, color: BetColor) -> Result<f64, GameError> {
        if self.clock.phase() != RoundPhase::Open {
            return Err(GameError::RoundLocked);
        }
        BetPool::validate(wallet, amount)?;

        // A ledger that cannot answer reads as a zero balance — the bet is
        // rejected, the caller is never shown a ledger failure.
        let balance = match self.ledger.balance(wallet).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(wallet, error = %e, "Balance lookup failed; treating as zero");
                0.0
            }
        };

        let accepted = self.pool.admit(wallet, amount, color, balance)?;
        debug!(wallet, amount, %color, pooled = self.pool.len(), "Bet admitted");
        Ok(accepted)
    }

    fn status(&self) -> RoundStatus {
        RoundStatus {
            tick: self.clock.current_tick(),
            phase: self.clock.phase(),
            bets: self.pool.snapshot(),
            rounds_played: self.rounds_played,
            started_at: self.started_at,
        }
    }

    /// Process one clock step and do whatever it calls for.
    async fn advance(&mut self) {
        match self.clock.step() {
            TickEvent::OpenBetting => {
                debug!("Betting window open");
                let _ = self.events.send(ServerMessage::BettingStart);
            }
            TickEvent::Resolve => {
                self.resolve().await;
            }
            TickEvent::Announce => {
                if let Some(outcome) = self.last_outcome.clone() {
                    let _ = self.events.send(ServerMessage::RollEnd { outcome });
                }
            }
            TickEvent::Hold => {}
        }
    }

    /// Lock intake, draw the outcome, settle the pool, announce.
    async fn resolve(&mut self) {
        self.clock.begin_resolving();

        let totals = self.pool.totals();
        let bets = self.pool.drain();
        let outcome = roll::draw_outcome(self.dice.as_mut(), &totals);

        info!(
            round = self.rounds_played + 1,
            bets = bets.len(),
            staked = format!("{:.2}", totals.total()),
            %outcome,
            "Round locked, rolling"
        );

        // Barrier: the clock cannot move past Resolving until every
        // per-bet mutation has completed or permanently failed.
        let report = self.settlement.settle(&outcome, bets).await;
        if !report.failed.is_empty() {
            warn!(
                failed = report.failed.len(),
                "Round settled with per-wallet failures"
            );
        }

        self.rounds_played += 1;
        self.last_outcome = Some(outcome.clone());
        let _ = self.events.send(ServerMessage::RollStart { outcome });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
