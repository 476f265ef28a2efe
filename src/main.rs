//! ROLLHOUSE — round-based dice wagering server.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the treasury ledger, spawns the round engine, and serves the
//! WebSocket channel with graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use rollhouse::config;
use rollhouse::engine::roll::StdDice;
use rollhouse::engine::RoundEngine;
use rollhouse::ledger::sqlite::SqliteLedger;
use rollhouse::ledger::Ledger;
use rollhouse::server::{self, AppState};

const BANNER: &str = r#"
 ____   ___  _     _     _   _  ___  _   _ ____  _____
|  _ \ / _ \| |   | |   | | | |/ _ \| | | / ___|| ____|
| |_) | | | | |   | |   | |_| | | | | | | \___ \|  _|
|  _ <| |_| | |___| |___|  _  | |_| | |_| |___) | |___
|_| \_\\___/|_____|_____|_| |_|\___/ \___/|____/|_____|

  Green vs Blue — the house rolls every 24 ticks
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        port = cfg.server.port,
        tick_millis = cfg.game.tick_millis,
        color_multiplier = cfg.game.color_multiplier,
        same_multiplier = cfg.game.same_multiplier,
        "ROLLHOUSE starting up"
    );

    // -- External ledger store -------------------------------------------

    let ledger: Arc<dyn Ledger> =
        Arc::new(SqliteLedger::connect(&cfg.ledger.database_url).await?);

    // -- Round engine ----------------------------------------------------

    let (engine, handle) = RoundEngine::new(
        &cfg.game,
        ledger.clone(),
        Box::new(StdDice::from_entropy()),
    );
    tokio::spawn(engine.run());

    // -- Serve the message channel ---------------------------------------

    let state = AppState {
        engine: handle,
        ledger,
    };
    server::serve(state, cfg.server.port).await?;

    info!("ROLLHOUSE shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rollhouse=info"));

    let json_logging = std::env::var("ROLLHOUSE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
