//! influencer-agent HTTP server binary.
//!
//! Seeds an in-memory persona store, starts the agent loop and exposes the
//! control surface over HTTP.
//!
//! # Environment Variables
//!
//! - `PORT` — HTTP port (default: 8000)
//! - `AGENT_*` — Loop tuning, see [`AgentConfig::from_env`]
//! - `RUST_LOG` — Tracing filter (default: "info,influencer_agent=debug")
//!
//! # Usage
//!
//! ```bash
//! AGENT_TICK_SECS=5 cargo run --bin server
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use influencer_agent::interfaces::{Collaborators, InMemoryPersonaStore, PlaceholderVideoSynthesizer};
use influencer_agent::persona::Persona;
use influencer_agent::server::{app_router, AppState};
use influencer_agent::{AgentConfig, AgentController};

fn seed_personas() -> InMemoryPersonaStore {
    InMemoryPersonaStore::with_personas([Persona::new(1, "Caelum")
        .with_tone("Solarpunk Engineer")
        .with_goals(["Make regenerative tech feel buildable", "Grow an engaged audience"])
        .with_background("Field engineer retrofitting cities with living infrastructure.")
        .with_interests(["Vertical Farming", "Right to Repair", "Community Microgrids"])])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,influencer_agent=debug".into()),
        )
        .init();

    let config = AgentConfig::from_env().context("invalid agent configuration")?;
    let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let bind_addr = format!("0.0.0.0:{}", port);

    let collaborators = Collaborators::new(Arc::new(seed_personas())).with_video(Arc::new(
        PlaceholderVideoSynthesizer::new("https://example.com/dummy_video.mp4", Duration::from_secs(1)),
    ));
    let controller = Arc::new(AgentController::new(config, collaborators)?);
    controller.start();

    let app = app_router(AppState::new(controller.clone()));

    tracing::info!("influencer-agent server starting on {}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health            — liveness probe");
    tracing::info!("  GET  /api/agent/status  — status snapshot");
    tracing::info!("  POST /api/agent/start|stop|trigger|focus — operator controls");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .context("server failed")?;

    controller.shutdown().await;
    Ok(())
}
