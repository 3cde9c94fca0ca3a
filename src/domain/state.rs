// Domain-level simulation entities and input types.

use crate::domain::catalog::BrainKind;

pub type PlayerId = u64;
pub type BrainId = u64;
pub type BaseId = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    // Held flags; the resolver acts on them every tick while set.
    pub interact: bool,
    pub shield: bool,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,

    // Fractional; only snapshots floor it.
    pub money: f64,
    pub carrying: Option<BrainId>,
    pub base: BaseId,

    // Username when the player authenticated, used for saving on leave.
    pub account: Option<String>,

    // Movement-only state (do not serialize to clients)
    pub last_input: PlayerInput,
}

impl Player {
    pub fn new(id: PlayerId, name: String, x: f32, y: f32, base: BaseId) -> Self {
        Self {
            id,
            name,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            money: 0.0,
            carrying: None,
            base,
            account: None,
            last_input: PlayerInput::default(),
        }
    }
}

/// Where a brain currently is. Back-references only exist on the variants that need them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrainState {
    Ground,
    Carried { holder: PlayerId },
    Stored { base: BaseId, holder: PlayerId },
}

impl BrainState {
    pub fn tag(&self) -> &'static str {
        match self {
            BrainState::Ground => "ground",
            BrainState::Carried { .. } => "carried",
            BrainState::Stored { .. } => "stored",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Brain {
    pub id: BrainId,
    pub kind: BrainKind,
    pub x: f32,
    pub y: f32,
    pub state: BrainState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shield {
    pub active: bool,
    pub expires_at_ms: u64,
    pub cooldown_until_ms: u64,
}

impl Shield {
    pub fn can_activate(&self, now_ms: u64) -> bool {
        now_ms >= self.cooldown_until_ms
    }

    pub fn activate(&mut self, now_ms: u64, duration_ms: u64, cooldown_ms: u64) {
        self.active = true;
        self.expires_at_ms = now_ms + duration_ms;
        self.cooldown_until_ms = now_ms + cooldown_ms;
    }

    /// Drops an expired shield. Returns true when it was switched off.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        if self.active && now_ms > self.expires_at_ms {
            self.active = false;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone)]
pub struct Base {
    pub id: BaseId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,

    // Stack: the last element was stored most recently and is stolen first.
    pub stored: Vec<BrainId>,
    pub shield: Shield,

    pub members: Vec<PlayerId>,
    pub capacity: usize,
}

impl Base {
    pub fn new(id: BaseId, x: f32, y: f32, radius: f32, capacity: usize) -> Self {
        Self {
            id,
            x,
            y,
            radius,
            stored: Vec::new(),
            shield: Shield::default(),
            members: Vec::new(),
            capacity,
        }
    }

    pub fn is_member(&self, player_id: PlayerId) -> bool {
        self.members.contains(&player_id)
    }

    pub fn has_room(&self) -> bool {
        self.members.len() < self.capacity
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        distance_sq(self.x, self.y, x, y) <= self.radius * self.radius
    }
}

pub fn distance_sq(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = ax - bx;
    let dy = ay - by;
    dx * dx + dy * dy
}
