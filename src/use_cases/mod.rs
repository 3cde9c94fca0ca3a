// Use cases layer: application workflows for the game server.

pub mod game;
pub mod handle;
pub mod profile;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;

pub use game::Simulation;
pub use handle::{WorldHandle, WorldSettings, spawn_world};
pub use types::{GameEvent, JoinAccepted, PlayerSeed, WorldUpdate};
