// Wire protocol DTOs and conversions for public game server messages.
// Ids are rendered as strings so JavaScript clients never lose precision.

use crate::domain::catalog::BrainType;
use crate::domain::tuning::ArenaTuning;
use crate::domain::{BaseSnapshot, BrainSnapshot, BrainState, PlayerInput, PlayerSnapshot};
use crate::use_cases::WorldUpdate;
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    // One-time handshake reply with the assigned identity and static tables.
    Init(InitDto),
    // Snapshot of the world for a given tick.
    State(WorldUpdateDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    // Initial handshake message; credentials are optional.
    Join(JoinPayload),
    // Input messages sent after a successful Join.
    Input(PlayerInputDto),
    SetName(SetNamePayload),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetNamePayload {
    pub name: String,
}

/// Per-tick input payload sent by the client after joining.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerInputDto {
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub interact: bool,
    #[serde(default)]
    pub shield: bool,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<&PlayerInputDto> for PlayerInput {
    fn from(input: &PlayerInputDto) -> Self {
        Self {
            up: input.up,
            down: input.down,
            left: input.left,
            right: input.right,
            interact: input.interact,
            shield: input.shield,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InitDto {
    pub player_id: String,
    pub base_id: String,
    pub arena: ArenaDto,
    pub brain_types: Vec<BrainTypeDto>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ArenaDto {
    pub width: f32,
    pub height: f32,
}

impl From<&ArenaTuning> for ArenaDto {
    fn from(arena: &ArenaTuning) -> Self {
        Self {
            width: arena.width,
            height: arena.height,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BrainTypeDto {
    pub id: &'static str,
    pub name: &'static str,
    pub rarity: &'static str,
    pub income_per_second: f64,
    pub weight: u32,
}

impl From<&BrainType> for BrainTypeDto {
    fn from(t: &BrainType) -> Self {
        Self {
            id: t.id,
            name: t.name,
            rarity: t.rarity,
            income_per_second: t.income_per_second,
            weight: t.weight,
        }
    }
}

/// Snapshot of the world sent to clients on each tick.
#[derive(Debug, Clone, Serialize)]
pub struct WorldUpdateDto {
    pub tick: u64,
    pub server_time_ms: u64,
    pub players: Vec<PlayerStateDto>,
    pub brains: Vec<BrainStateDto>,
    pub bases: Vec<BaseStateDto>,
}

impl From<WorldUpdate> for WorldUpdateDto {
    fn from(update: WorldUpdate) -> Self {
        Self {
            tick: update.tick,
            server_time_ms: update.server_time_ms,
            players: update.players.iter().map(PlayerStateDto::from).collect(),
            brains: update.brains.iter().map(BrainStateDto::from).collect(),
            bases: update.bases.iter().map(BaseStateDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerStateDto {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub money: u64,
    pub carrying: Option<String>,
    pub base_id: String,
}

impl From<&PlayerSnapshot> for PlayerStateDto {
    fn from(p: &PlayerSnapshot) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name.clone(),
            x: p.x,
            y: p.y,
            money: p.money,
            carrying: p.carrying.map(|id| id.to_string()),
            base_id: p.base_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BrainStateDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub type_id: &'static str,
    pub type_name: &'static str,
    pub income_per_second: f64,
    // "ground" | "carried" | "stored"
    pub state: &'static str,
    pub carried_by: Option<String>,
    pub stored_by: Option<String>,
    pub base_id: Option<String>,
}

impl From<&BrainSnapshot> for BrainStateDto {
    fn from(b: &BrainSnapshot) -> Self {
        let (carried_by, stored_by, base_id) = match b.state {
            BrainState::Ground => (None, None, None),
            BrainState::Carried { holder } => (Some(holder.to_string()), None, None),
            BrainState::Stored { base, holder } => {
                (None, Some(holder.to_string()), Some(base.to_string()))
            }
        };
        Self {
            id: b.id.to_string(),
            x: b.x,
            y: b.y,
            type_id: b.type_id,
            type_name: b.type_name,
            income_per_second: b.income_per_second,
            state: b.state.tag(),
            carried_by,
            stored_by,
            base_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BaseStateDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub stored_count: usize,
    pub shield_active: bool,
    pub shield_expires_at_ms: u64,
    pub shield_cooldown_until_ms: u64,
    pub members: Vec<String>,
}

impl From<&BaseSnapshot> for BaseStateDto {
    fn from(b: &BaseSnapshot) -> Self {
        Self {
            id: b.id.to_string(),
            x: b.x,
            y: b.y,
            radius: b.radius,
            stored_count: b.stored_count,
            shield_active: b.shield_active,
            shield_expires_at_ms: b.shield_expires_at_ms,
            shield_cooldown_until_ms: b.shield_cooldown_until_ms,
            members: b.members.iter().map(|id| id.to_string()).collect(),
        }
    }
}
