//! WebSocket sessions.
//!
//! Each connection runs one task that multiplexes two streams: the
//! engine's broadcast channel (round events and accepted bets, forwarded
//! verbatim) and the client's own requests. Request rejections are
//! answered only on the requesting socket; accepted bets are handed back
//! to the broadcast channel so every subscriber — the bettor included —
//! sees them.

use anyhow::Result;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::{BetColor, GameError};

use super::messages::{ClientMessage, ServerMessage};
use super::AppState;

/// GET /ws — upgrade and run the session.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| session(socket, state))
}

async fn session(socket: WebSocket, state: AppState) {
    let session = Uuid::new_v4();
    info!(%session, "Client connected");

    let (mut sink, mut stream) = socket.split();
    let mut events = state.engine.subscribe();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(message) => {
                    if send(&mut sink, &message).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(%session, skipped, "Client lagging; round events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = next_text(&mut stream) => match incoming {
                Some(text) => {
                    if dispatch(&state, &text, &mut sink).await.is_err() {
                        break;
                    }
                }
                None => break,
            }
        }
    }

    info!(%session, "Client disconnected");
}

/// Next text frame, or `None` once the socket is done. Control frames are
/// handled by axum underneath.
async fn next_text(stream: &mut SplitStream<WebSocket>) -> Option<String> {
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => return Some(text),
            Some(Ok(Message::Close(_))) | None => return None,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                debug!(error = %e, "WebSocket read failed");
                return None;
            }
        }
    }
}

async fn send(sink: &mut SplitSink<WebSocket, Message>, message: &ServerMessage) -> Result<()> {
    let json = serde_json::to_string(message)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}

/// Handle one request frame. An `Err` here means the socket itself is
/// broken and the session should end.
async fn dispatch(
    state: &AppState,
    text: &str,
    sink: &mut SplitSink<WebSocket, Message>,
) -> Result<()> {
    let Ok(message) = serde_json::from_str::<ClientMessage>(text) else {
        return send(
            sink,
            &ServerMessage::Error {
                ok: false,
                message: "Request message error".to_string(),
            },
        )
        .await;
    };

    match message {
        ClientMessage::Betting { wallet, amount, color } => {
            handle_betting(state, wallet, amount, color, sink).await
        }

        ClientMessage::GetStatus => {
            let status = state.engine.status().await?;
            send(
                sink,
                &ServerMessage::GetStatus {
                    tick: status.tick,
                    phase: status.phase,
                    bets: status.bets,
                    rounds_played: status.rounds_played,
                },
            )
            .await
        }

        ClientMessage::GetFund { wallet } => {
            let reply = match state.ledger.balance(&wallet).await {
                Ok(amount) => ServerMessage::GetFund {
                    ok: true,
                    wallet,
                    amount: Some(amount),
                },
                Err(e) => {
                    warn!(wallet, error = %e, "Fund lookup failed");
                    ServerMessage::GetFund {
                        ok: false,
                        wallet,
                        amount: None,
                    }
                }
            };
            send(sink, &reply).await
        }

        ClientMessage::DepositFund { wallet, amount, index } => {
            let reply = match state.ledger.deposit(&wallet, amount, index).await {
                Ok(()) => ServerMessage::DepositFund {
                    ok: true,
                    message: "Deposit successful".to_string(),
                },
                Err(e) => {
                    warn!(wallet, amount, index, error = %e, "Deposit failed");
                    ServerMessage::DepositFund {
                        ok: false,
                        message: e.to_string(),
                    }
                }
            };
            send(sink, &reply).await
        }

        ClientMessage::WithdrawFund { wallet, amount } => {
            let reply = match withdraw(state, &wallet, amount).await {
                Ok(()) => ServerMessage::WithdrawFund {
                    ok: true,
                    message: "Withdraw successful".to_string(),
                },
                Err(e) => {
                    warn!(wallet, amount, error = %e, "Withdrawal failed");
                    ServerMessage::WithdrawFund {
                        ok: false,
                        message: e.to_string(),
                    }
                }
            };
            send(sink, &reply).await
        }
    }
}

async fn handle_betting(
    state: &AppState,
    wallet: Option<String>,
    amount: Option<f64>,
    color: Option<String>,
    sink: &mut SplitSink<WebSocket, Message>,
) -> Result<()> {
    let rejection = |wallet: Option<String>, color: Option<BetColor>, e: GameError| {
        ServerMessage::Betting {
            ok: false,
            amount: None,
            message: e.to_string(),
            wallet,
            color,
        }
    };

    let (Some(wallet), Some(amount), Some(color_raw)) = (wallet, amount, color) else {
        return send(sink, &rejection(None, None, GameError::InvalidParams)).await;
    };

    let color = match color_raw.parse::<BetColor>() {
        Ok(color) => color,
        Err(e) => return send(sink, &rejection(Some(wallet), None, e)).await,
    };

    match state.engine.place_bet(&wallet, amount, color).await {
        Ok(accepted) => {
            // Everyone sees accepted bets, the bettor included.
            state.engine.broadcast(ServerMessage::Betting {
                ok: true,
                amount: Some(accepted),
                message: "Bet successful".to_string(),
                wallet: Some(wallet),
                color: Some(color),
            });
            Ok(())
        }
        Err(e) => send(sink, &rejection(Some(wallet), Some(color), e)).await,
    }
}
