//! Grub match driver - headless authoritative match runner
//!
//! Runs one match against the in-process sandbox world:
//! - Teams and grubs spawned from configuration
//! - Fixed-rate simulation with bot-driven turns
//! - Snapshots broadcast for presentation subscribers

use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use grub_match_core::config::Config;
use grub_match_core::game::{Authority, GameMatch, MatchRunner, SandboxWorld, WeaponCatalog};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting grub match");
    info!(
        seed = config.match_seed,
        teams = config.team_count,
        grubs = config.game.grub_count,
        "Match configuration"
    );

    let catalog = match &config.weapons_path {
        Some(path) => WeaponCatalog::from_path(path)?,
        None => WeaponCatalog::builtin()?,
    };
    info!(weapons = catalog.len(), "Weapon catalog ready");

    let mut world = SandboxWorld::new();
    let mut game = GameMatch::new(
        config.match_seed,
        config.game.clone(),
        catalog,
        Authority::Server,
    );
    for _ in 0..config.team_count {
        game.add_team(vec![Uuid::new_v4()], &mut world)?;
    }
    game.start()?;

    let runner = MatchRunner::new(game, world, config.max_turns);

    // Log snapshots as a stand-in presentation client
    let mut snapshots = runner.subscribe();
    tokio::spawn(async move {
        while let Ok(snapshot) = snapshots.recv().await {
            debug!(
                tick = snapshot.tick,
                turn = snapshot.turn,
                active_team = snapshot.active_team,
                events = snapshot.events.len(),
                "Snapshot"
            );
        }
    });

    let outcome = runner.run(shutdown_signal()).await?;

    info!(?outcome, "Match runner shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
