// Spawning and addressing the single authoritative world.

use crate::use_cases::game::{Simulation, world_task};
use crate::use_cases::{GameEvent, WorldUpdate};
use axum::extract::ws::Utf8Bytes;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};

/// Configuration for spawning the world task.
#[derive(Debug, Clone)]
pub struct WorldSettings {
    /// Capacity for inbound player events.
    pub input_channel_capacity: usize,
    /// Capacity for broadcast world updates.
    pub world_broadcast_capacity: usize,
    /// Fixed tick interval for the game loop.
    pub tick_interval: Duration,
}

/// Channels connecting the network layer to the world task.
#[derive(Clone)]
pub struct WorldHandle {
    /// Sender for game events into the world task.
    pub input_tx: mpsc::Sender<GameEvent>,
    /// Broadcast sender for raw world updates.
    pub world_tx: broadcast::Sender<WorldUpdate>,
    /// Broadcast sender for serialized world updates.
    pub world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Watch sender holding the latest serialized world update.
    pub world_latest_tx: watch::Sender<Utf8Bytes>,
}

/// Spawns the world task around `sim` and returns its channels.
pub fn spawn_world(settings: &WorldSettings, sim: Simulation) -> WorldHandle {
    // Channel wiring for the world loop.
    let (input_tx, input_rx) = mpsc::channel::<GameEvent>(settings.input_channel_capacity);
    let (world_tx, _world_rx) =
        broadcast::channel::<WorldUpdate>(settings.world_broadcast_capacity);
    let (world_bytes_tx, _world_bytes_rx) =
        broadcast::channel::<Utf8Bytes>(settings.world_broadcast_capacity);
    let (world_latest_tx, _world_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));

    // Spawn the authoritative world loop.
    tokio::spawn(world_task(
        input_rx,
        world_tx.clone(),
        settings.tick_interval,
        sim,
    ));

    WorldHandle {
        input_tx,
        world_tx,
        world_bytes_tx,
        world_latest_tx,
    }
}
