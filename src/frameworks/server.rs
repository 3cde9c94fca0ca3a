// Framework bootstrap for the game server runtime.

use crate::frameworks::config::{self, ServerConfig};
use crate::interface_adapters::clients::persistence::HttpPlayerStore;
use crate::interface_adapters::net::{latest_state_handler, spawn_world_serializer, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{Simulation, WorldSettings, spawn_world};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener, server_config: ServerConfig) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(server_config)?;

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/state", get(latest_state_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::http_host(), config::http_port());

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener, ServerConfig::from_env()).await
}

fn build_state(server_config: ServerConfig) -> Result<Arc<AppState>> {
    let player_store = HttpPlayerStore::new(
        server_config.persistence_url.clone(),
        server_config.persistence_timeout,
    )
    .map_err(|e| std::io::Error::other(format!("failed to initialize persistence client: {e}")))?;
    tracing::debug!(
        persistence_url = %server_config.persistence_url,
        persistence_timeout_ms = server_config.persistence_timeout.as_millis(),
        "persistence client configured"
    );

    let mut sim = Simulation::new(server_config.tuning, server_config.sim_seed);
    sim.populate();
    tracing::info!(
        layout = ?server_config.tuning.base.layout,
        seeded = server_config.sim_seed.is_some(),
        "world created"
    );

    // The world task and its serializer live for the whole process.
    let world = spawn_world(
        &WorldSettings {
            input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
            world_broadcast_capacity: config::WORLD_BROADCAST_CAPACITY,
            tick_interval: server_config.tick_interval,
        },
        sim,
    );
    spawn_world_serializer(&world);

    Ok(Arc::new(AppState {
        world,
        player_store: Arc::new(player_store),
        tuning: server_config.tuning,
    }))
}
