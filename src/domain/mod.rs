// Domain layer: core simulation types and rules.

pub mod catalog;
pub mod errors;
pub mod ports;
pub mod snapshot;
pub mod state;
pub mod systems;
pub mod tuning;
pub mod world;

pub use errors::JoinError;
pub use snapshot::{BaseSnapshot, BrainSnapshot, PlayerSnapshot};
pub use state::{Base, BaseId, Brain, BrainId, BrainState, Player, PlayerId, PlayerInput};
pub use world::{RemovedPlayer, WorldState};
