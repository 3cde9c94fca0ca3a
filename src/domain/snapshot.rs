// Read-only views of the world handed to the broadcaster each tick.

use crate::domain::catalog::brain_type;
use crate::domain::state::{Base, BaseId, Brain, BrainId, BrainState, Player, PlayerId};

#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    // Floored for display; the simulation keeps the fraction.
    pub money: u64,
    pub carrying: Option<BrainId>,
    pub base_id: BaseId,
}

#[derive(Debug, Clone)]
pub struct BrainSnapshot {
    pub id: BrainId,
    pub x: f32,
    pub y: f32,
    pub type_id: &'static str,
    pub type_name: &'static str,
    pub income_per_second: f64,
    pub state: BrainState,
}

#[derive(Debug, Clone)]
pub struct BaseSnapshot {
    pub id: BaseId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub stored_count: usize,
    pub shield_active: bool,
    pub shield_expires_at_ms: u64,
    pub shield_cooldown_until_ms: u64,
    pub members: Vec<PlayerId>,
}

impl From<&Player> for PlayerSnapshot {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            x: p.x,
            y: p.y,
            money: p.money.max(0.0).floor() as u64,
            carrying: p.carrying,
            base_id: p.base,
        }
    }
}

impl From<&Brain> for BrainSnapshot {
    fn from(b: &Brain) -> Self {
        let kind = brain_type(b.kind);
        Self {
            id: b.id,
            x: b.x,
            y: b.y,
            type_id: kind.id,
            type_name: kind.name,
            income_per_second: kind.income_per_second,
            state: b.state,
        }
    }
}

impl From<&Base> for BaseSnapshot {
    fn from(b: &Base) -> Self {
        Self {
            id: b.id,
            x: b.x,
            y: b.y,
            radius: b.radius,
            stored_count: b.stored.len(),
            shield_active: b.shield.active,
            shield_expires_at_ms: b.shield.expires_at_ms,
            shield_cooldown_until_ms: b.shield.cooldown_until_ms,
            members: b.members.clone(),
        }
    }
}
