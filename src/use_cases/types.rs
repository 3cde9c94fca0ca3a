// Use-case level inputs/outputs for the game loop.

use crate::domain::catalog::BrainKind;
use crate::domain::{
    BaseId, BaseSnapshot, BrainSnapshot, JoinError, PlayerId, PlayerInput, PlayerSnapshot,
    RemovedPlayer,
};
use tokio::sync::oneshot;

/// Progress restored into a fresh player on join.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerSeed {
    pub money: f64,
    pub kinds: Vec<BrainKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinAccepted {
    pub player_id: PlayerId,
    pub base_id: BaseId,
    /// Seeded brains that fit into the base.
    pub seeded: usize,
}

#[derive(Debug)]
pub enum GameEvent {
    Join {
        player_id: PlayerId,
        name: String,
        account: Option<String>,
        seed: Option<PlayerSeed>,
        reply: oneshot::Sender<Result<JoinAccepted, JoinError>>,
    },
    Leave {
        player_id: PlayerId,
        reply: Option<oneshot::Sender<RemovedPlayer>>,
    },
    Input {
        player_id: PlayerId,
        input: PlayerInput,
    },
    SetName {
        player_id: PlayerId,
        name: String,
    },
}

#[derive(Debug, Clone)]
pub struct WorldUpdate {
    pub tick: u64,
    pub server_time_ms: u64,
    pub players: Vec<PlayerSnapshot>,
    pub brains: Vec<BrainSnapshot>,
    pub bases: Vec<BaseSnapshot>,
}
