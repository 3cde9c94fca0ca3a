use crate::domain::tuning::{BaseLayout, GameTuning};
use std::{env, net::IpAddr, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("GAME_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn http_host() -> IpAddr {
    env::var("GAME_SERVER_HOST")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

pub fn persistence_service_url() -> String {
    env::var("PERSISTENCE_SERVICE_URL").unwrap_or_else(|_| "http://127.0.0.1:3002".to_string())
}

pub fn persistence_timeout() -> Duration {
    let millis = env::var("PERSISTENCE_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(1500);
    Duration::from_millis(millis)
}

// Unset or zero keeps one private base per player.
pub fn shared_base_capacity() -> Option<usize> {
    env::var("SHARED_BASE_CAPACITY")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|capacity| *capacity > 0)
}

pub fn sim_seed() -> Option<u64> {
    env::var("SIM_SEED").ok().and_then(|value| value.parse().ok())
}

pub fn game_tuning() -> GameTuning {
    let mut tuning = GameTuning::default();
    if let Some(capacity) = shared_base_capacity() {
        tuning.base.layout = BaseLayout::Shared { capacity };
    }
    tuning
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;

pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Everything `run` needs besides the listener.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub persistence_url: String,
    pub persistence_timeout: Duration,
    pub tuning: GameTuning,
    pub sim_seed: Option<u64>,
    pub tick_interval: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            persistence_url: persistence_service_url(),
            persistence_timeout: persistence_timeout(),
            tuning: game_tuning(),
            sim_seed: sim_seed(),
            tick_interval: TICK_INTERVAL,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            persistence_url: "http://127.0.0.1:3002".to_string(),
            persistence_timeout: Duration::from_millis(1500),
            tuning: GameTuning::default(),
            sim_seed: None,
            tick_interval: TICK_INTERVAL,
        }
    }
}
