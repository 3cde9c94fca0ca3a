// Gameplay tuning, kept apart from runtime/server configuration.

pub mod arena;
pub mod base;
pub mod brain;
pub mod player;

pub use arena::ArenaTuning;
pub use base::{BaseLayout, BaseTuning};
pub use brain::BrainTuning;
pub use player::PlayerTuning;

/// All gameplay knobs the simulation reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameTuning {
    pub arena: ArenaTuning,
    pub player: PlayerTuning,
    pub brain: BrainTuning,
    pub base: BaseTuning,
}
