// Pickup, deposit, steal and shield resolution for one player per tick.
//
// Preconditions are re-checked every tick; unmet ones are silent no-ops.

use crate::domain::state::{BaseId, BrainId, BrainState, PlayerId, distance_sq};
use crate::domain::world::WorldState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    PickedUp { brain_id: BrainId },
    Deposited { brain_id: BrainId, base_id: BaseId },
    Stole { brain_id: BrainId, from_base: BaseId },
    ShieldRaised { base_id: BaseId },
}

pub fn resolve_player(
    world: &mut WorldState,
    player_id: PlayerId,
    now_ms: u64,
) -> Vec<InteractionOutcome> {
    let mut outcomes = Vec::new();
    let Some(player) = world.player(player_id) else {
        return outcomes;
    };
    let input = player.last_input;
    let carrying = player.carrying;

    if input.interact {
        let outcome = match carrying {
            None => try_pickup(world, player_id).or_else(|| try_steal(world, player_id)),
            Some(brain_id) => try_deposit(world, player_id, brain_id),
        };
        outcomes.extend(outcome);
    }

    if input.shield {
        outcomes.extend(try_shield(world, player_id, now_ms));
    }

    outcomes
}

fn try_pickup(world: &mut WorldState, player_id: PlayerId) -> Option<InteractionOutcome> {
    let player = world.player(player_id)?;
    let (px, py) = (player.x, player.y);
    let range = world.tuning.brain.pickup_range(world.tuning.player.radius);
    let range_sq = range * range;

    // Nearest wins; ties keep the lowest id.
    let mut nearest: Option<(BrainId, f32)> = None;
    for brain in world.brains() {
        if brain.state != BrainState::Ground {
            continue;
        }
        let d = distance_sq(px, py, brain.x, brain.y);
        if d > range_sq {
            continue;
        }
        if nearest.is_none_or(|(_, best)| d < best) {
            nearest = Some((brain.id, d));
        }
    }

    let (brain_id, _) = nearest?;
    carry(world, player_id, brain_id);
    Some(InteractionOutcome::PickedUp { brain_id })
}

fn try_steal(world: &mut WorldState, player_id: PlayerId) -> Option<InteractionOutcome> {
    let player = world.player(player_id)?;
    let (px, py) = (player.x, player.y);

    let target = world
        .bases()
        .find(|b| {
            !b.is_member(player_id)
                && b.contains_point(px, py)
                && !b.shield.active
                && !b.stored.is_empty()
        })
        .map(|b| b.id)?;

    let brain_id = world.base_mut(target)?.stored.pop()?;
    carry(world, player_id, brain_id);
    Some(InteractionOutcome::Stole {
        brain_id,
        from_base: target,
    })
}

fn try_deposit(
    world: &mut WorldState,
    player_id: PlayerId,
    brain_id: BrainId,
) -> Option<InteractionOutcome> {
    let player = world.player(player_id)?;
    let (px, py, base_id) = (player.x, player.y, player.base);
    let storage_capacity = world.tuning.base.storage_capacity;

    let base = world.base_mut(base_id)?;
    if !base.contains_point(px, py) || base.stored.len() >= storage_capacity {
        return None;
    }
    base.stored.push(brain_id);
    let (bx, by) = (base.x, base.y);

    if let Some(brain) = world.brain_mut(brain_id) {
        brain.state = BrainState::Stored {
            base: base_id,
            holder: player_id,
        };
        brain.x = bx;
        brain.y = by;
    }
    if let Some(player) = world.player_mut(player_id) {
        player.carrying = None;
    }
    Some(InteractionOutcome::Deposited { brain_id, base_id })
}

fn try_shield(
    world: &mut WorldState,
    player_id: PlayerId,
    now_ms: u64,
) -> Option<InteractionOutcome> {
    let base_id = world.player(player_id)?.base;
    let tuning = world.tuning.base;
    let base = world.base_mut(base_id)?;
    if !base.shield.can_activate(now_ms) {
        return None;
    }
    base.shield
        .activate(now_ms, tuning.shield_duration_ms, tuning.shield_cooldown_ms);
    Some(InteractionOutcome::ShieldRaised { base_id })
}

fn carry(world: &mut WorldState, player_id: PlayerId, brain_id: BrainId) {
    if let Some(brain) = world.brain_mut(brain_id) {
        brain.state = BrainState::Carried { holder: player_id };
    }
    if let Some(player) = world.player_mut(player_id) {
        player.carrying = Some(brain_id);
    }
}
