// In-memory registry of players, brains and bases owned by the world task.

use crate::domain::catalog::{BrainKind, brain_type};
use crate::domain::errors::JoinError;
use crate::domain::state::{
    Base, BaseId, Brain, BrainId, BrainState, Player, PlayerId, PlayerInput,
};
use crate::domain::tuning::{BaseLayout, GameTuning};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};

// Spreads dropped brains around a base without stacking them on one point.
const GOLDEN_ANGLE: f32 = 2.399_963;

/// What was left of a player after removal; used to persist progress.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedPlayer {
    pub id: PlayerId,
    pub name: String,
    pub account: Option<String>,
    pub money: f64,
    /// Kinds of the brains the player had stored, bottom of the stack first.
    pub stored_kinds: Vec<BrainKind>,
}

pub struct WorldState {
    pub tuning: GameTuning,
    players: HashMap<PlayerId, Player>,
    // Ordered maps keep snapshots and iteration stable between ticks.
    brains: BTreeMap<BrainId, Brain>,
    bases: BTreeMap<BaseId, Base>,
    next_brain_id: BrainId,
    next_base_id: BaseId,
}

impl WorldState {
    pub fn new(tuning: GameTuning) -> Self {
        let mut world = Self {
            tuning,
            players: HashMap::new(),
            brains: BTreeMap::new(),
            bases: BTreeMap::new(),
            next_brain_id: 1,
            next_base_id: 1,
        };

        if let BaseLayout::Shared { capacity } = tuning.base.layout {
            // One base per corner, inset so the whole radius stays on screen.
            let inset = tuning.base.radius + tuning.arena.margin;
            let (w, h) = (tuning.arena.width, tuning.arena.height);
            let corners = [
                (inset, inset),
                (w - inset, inset),
                (inset, h - inset),
                (w - inset, h - inset),
            ];
            for (x, y) in corners {
                world.insert_base(x, y, capacity);
            }
        }

        world
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn brains(&self) -> impl Iterator<Item = &Brain> {
        self.brains.values()
    }

    pub fn brains_mut(&mut self) -> impl Iterator<Item = &mut Brain> {
        self.brains.values_mut()
    }

    pub fn brain(&self, id: BrainId) -> Option<&Brain> {
        self.brains.get(&id)
    }

    pub fn brain_mut(&mut self, id: BrainId) -> Option<&mut Brain> {
        self.brains.get_mut(&id)
    }

    pub fn bases(&self) -> impl Iterator<Item = &Base> {
        self.bases.values()
    }

    pub fn bases_mut(&mut self) -> impl Iterator<Item = &mut Base> {
        self.bases.values_mut()
    }

    pub fn base(&self, id: BaseId) -> Option<&Base> {
        self.bases.get(&id)
    }

    pub fn base_mut(&mut self, id: BaseId) -> Option<&mut Base> {
        self.bases.get_mut(&id)
    }

    pub fn insert_base(&mut self, x: f32, y: f32, capacity: usize) -> BaseId {
        let id = self.next_base_id;
        self.next_base_id += 1;
        self.bases
            .insert(id, Base::new(id, x, y, self.tuning.base.radius, capacity));
        id
    }

    pub fn spawn_brain(&mut self, kind: BrainKind, x: f32, y: f32) -> BrainId {
        let id = self.next_brain_id;
        self.next_brain_id += 1;
        self.brains.insert(
            id,
            Brain {
                id,
                kind,
                x,
                y,
                state: BrainState::Ground,
            },
        );
        id
    }

    pub fn ground_count(&self) -> usize {
        self.brains
            .values()
            .filter(|b| b.state == BrainState::Ground)
            .count()
    }

    /// Registers a player and binds it to a base according to the configured layout.
    pub fn add_player<R: Rng + ?Sized>(
        &mut self,
        id: PlayerId,
        name: String,
        rng: &mut R,
    ) -> Result<BaseId, JoinError> {
        if self.players.contains_key(&id) {
            return Err(JoinError::AlreadyJoined);
        }

        let base_id = self.assign_base(id, rng)?;
        let (bx, by) = self
            .bases
            .get(&base_id)
            .map(|b| (b.x, b.y))
            .ok_or(JoinError::NoBaseAvailable)?;

        // Spawn just below the base center so the player starts in deposit range.
        let (x, y) = self.tuning.arena.clamp(bx, by + self.tuning.player.radius * 2.0);
        self.players
            .insert(id, Player::new(id, name, x, y, base_id));
        Ok(base_id)
    }

    fn assign_base<R: Rng + ?Sized>(
        &mut self,
        player_id: PlayerId,
        rng: &mut R,
    ) -> Result<BaseId, JoinError> {
        let base_id = match self.tuning.base.layout {
            BaseLayout::PerPlayer => {
                let inset = self.tuning.base.radius + self.tuning.arena.margin;
                let x = rng.gen_range(inset..=(self.tuning.arena.width - inset).max(inset));
                let y = rng.gen_range(inset..=(self.tuning.arena.height - inset).max(inset));
                self.insert_base(x, y, 1)
            }
            BaseLayout::Shared { .. } => self
                .bases
                .values()
                .filter(|b| b.has_room())
                .min_by_key(|b| b.members.len())
                .map(|b| b.id)
                .ok_or(JoinError::NoBaseAvailable)?,
        };

        if let Some(base) = self.bases.get_mut(&base_id) {
            base.members.push(player_id);
        }
        Ok(base_id)
    }

    /// Places already-owned brains into the player's base. Returns how many fit.
    pub fn seed_stored(&mut self, player_id: PlayerId, kinds: &[BrainKind]) -> usize {
        let Some(base_id) = self.players.get(&player_id).map(|p| p.base) else {
            return 0;
        };

        let mut seeded = 0;
        for &kind in kinds {
            let Some(base) = self.bases.get(&base_id) else {
                break;
            };
            if base.stored.len() >= self.tuning.base.storage_capacity {
                break;
            }
            let (x, y) = self.scatter_around(base, base.stored.len());
            let brain_id = self.spawn_brain(kind, x, y);
            if let Some(brain) = self.brains.get_mut(&brain_id) {
                brain.state = BrainState::Stored {
                    base: base_id,
                    holder: player_id,
                };
            }
            if let Some(base) = self.bases.get_mut(&base_id) {
                base.stored.push(brain_id);
            }
            seeded += 1;
        }
        seeded
    }

    pub fn set_input(&mut self, player_id: PlayerId, input: PlayerInput) -> bool {
        match self.players.get_mut(&player_id) {
            Some(player) => {
                player.last_input = input;
                true
            }
            None => false,
        }
    }

    pub fn set_name(&mut self, player_id: PlayerId, name: String) -> bool {
        match self.players.get_mut(&player_id) {
            Some(player) => {
                player.name = name;
                true
            }
            None => false,
        }
    }

    /// Sum of income per second of the brains the player has stored.
    pub fn income_rate(&self, player_id: PlayerId) -> f64 {
        self.brains
            .values()
            .filter(|b| matches!(b.state, BrainState::Stored { holder, .. } if holder == player_id))
            .map(|b| brain_type(b.kind).income_per_second)
            .sum()
    }

    /// Removes a player and returns the brains it held or stored to the ground.
    ///
    /// Brains stored by an account player are removed instead; they live on in
    /// the saved game and come back through `seed_stored` on the next join.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Option<RemovedPlayer> {
        let player = self.players.remove(&player_id)?;

        // Carried brain falls next to where the player was last seen.
        if let Some(brain_id) = player.carrying {
            let (x, y) = self.drop_point(player.x, player.y);
            if let Some(brain) = self.brains.get_mut(&brain_id) {
                brain.x = x;
                brain.y = y;
                brain.state = BrainState::Ground;
            }
        }

        // Stored brains leave their base stack, oldest first so saves keep stack order.
        // An account keeps them in its saved game, so they leave the world with it.
        let departs_with_player = player.account.is_some();
        let mut stored_kinds = Vec::new();
        let base_ids: Vec<BaseId> = self.bases.keys().copied().collect();
        for base_id in base_ids {
            let Some(base) = self.bases.get(&base_id) else {
                continue;
            };
            let owned: Vec<BrainId> = base
                .stored
                .iter()
                .copied()
                .filter(|id| {
                    self.brains.get(id).is_some_and(|b| {
                        matches!(b.state, BrainState::Stored { holder, .. } if holder == player_id)
                    })
                })
                .collect();
            if owned.is_empty() {
                continue;
            }

            let drops: Vec<(BrainId, (f32, f32))> = owned
                .iter()
                .enumerate()
                .map(|(i, id)| (*id, self.scatter_around(base, i)))
                .collect();
            for (brain_id, (x, y)) in drops {
                if departs_with_player {
                    if let Some(brain) = self.brains.remove(&brain_id) {
                        stored_kinds.push(brain.kind);
                    }
                } else if let Some(brain) = self.brains.get_mut(&brain_id) {
                    stored_kinds.push(brain.kind);
                    brain.x = x;
                    brain.y = y;
                    brain.state = BrainState::Ground;
                }
            }
            if let Some(base) = self.bases.get_mut(&base_id) {
                base.stored.retain(|id| !owned.contains(id));
            }
        }

        if let Some(base) = self.bases.get_mut(&player.base) {
            base.members.retain(|id| *id != player_id);
            let vacant = base.members.is_empty();
            if vacant && self.tuning.base.layout == BaseLayout::PerPlayer {
                self.bases.remove(&player.base);
            }
        }

        Some(RemovedPlayer {
            id: player.id,
            name: player.name,
            account: player.account,
            money: player.money,
            stored_kinds,
        })
    }

    // Below the player, or above when the bottom edge would swallow the offset.
    fn drop_point(&self, x: f32, y: f32) -> (f32, f32) {
        let arena = self.tuning.arena;
        let offset = self.tuning.brain.drop_offset;
        let below = y + offset;
        let y = if below > arena.height - arena.margin {
            y - offset
        } else {
            below
        };
        arena.clamp(x, y)
    }

    fn scatter_around(&self, base: &Base, index: usize) -> (f32, f32) {
        let angle = index as f32 * GOLDEN_ANGLE;
        let dist = base.radius * 0.6;
        self.tuning
            .arena
            .clamp(base.x + angle.cos() * dist, base.y + angle.sin() * dist)
    }

    /// Verifies the cross-entity invariants. Used by tests after every tick.
    pub fn check_invariants(&self) -> Result<(), String> {
        for brain in self.brains.values() {
            match brain.state {
                BrainState::Ground => {
                    if self.players.values().any(|p| p.carrying == Some(brain.id)) {
                        return Err(format!("ground brain {} is carried", brain.id));
                    }
                    if self.bases.values().any(|b| b.stored.contains(&brain.id)) {
                        return Err(format!("ground brain {} is stored", brain.id));
                    }
                }
                BrainState::Carried { holder } => {
                    let carrier = self
                        .players
                        .get(&holder)
                        .ok_or_else(|| format!("brain {} carried by missing player", brain.id))?;
                    if carrier.carrying != Some(brain.id) {
                        return Err(format!("brain {} carrier mismatch", brain.id));
                    }
                    if self.bases.values().any(|b| b.stored.contains(&brain.id)) {
                        return Err(format!("carried brain {} is stored", brain.id));
                    }
                }
                BrainState::Stored { base, holder } => {
                    if !self.players.contains_key(&holder) {
                        return Err(format!("brain {} stored by missing player", brain.id));
                    }
                    let holders = self
                        .bases
                        .values()
                        .filter(|b| b.stored.contains(&brain.id))
                        .count();
                    let in_base = self
                        .bases
                        .get(&base)
                        .is_some_and(|b| b.stored.iter().filter(|id| **id == brain.id).count() == 1);
                    if holders != 1 || !in_base {
                        return Err(format!("brain {} not in exactly one base", brain.id));
                    }
                    if self.players.values().any(|p| p.carrying == Some(brain.id)) {
                        return Err(format!("stored brain {} is carried", brain.id));
                    }
                }
            }
        }

        for player in self.players.values() {
            if let Some(brain_id) = player.carrying {
                let ok = self.brains.get(&brain_id).is_some_and(|b| {
                    b.state == BrainState::Carried { holder: player.id }
                });
                if !ok {
                    return Err(format!("player {} carries inconsistent brain", player.id));
                }
            }
        }

        for base in self.bases.values() {
            if base.stored.len() > self.brains.len() {
                return Err(format!("base {} stores more than exist", base.id));
            }
            if base.members.len() > base.capacity {
                return Err(format!("base {} over capacity", base.id));
            }
            for brain_id in &base.stored {
                let ok = self
                    .brains
                    .get(brain_id)
                    .is_some_and(|b| {
                        matches!(b.state, BrainState::Stored { base: stored_in, .. } if stored_in == base.id)
                    });
                if !ok {
                    return Err(format!("base {} lists non-stored brain {}", base.id, brain_id));
                }
            }
        }

        Ok(())
    }
}
