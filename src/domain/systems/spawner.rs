use crate::domain::catalog::{BRAIN_TYPES, pick_random};
use crate::domain::state::BrainId;
use crate::domain::world::WorldState;
use rand::Rng;

/// Spawns one brain of a weighted-random type inside the spawn region.
pub fn spawn_one<R: Rng + ?Sized>(world: &mut WorldState, rng: &mut R) -> BrainId {
    let kind = pick_random(&BRAIN_TYPES, rng);
    let arena = world.tuning.arena;
    let inset = world.tuning.brain.spawn_inset;

    // Fall back to the arena margin when the arena is too small for the inset.
    let (min_x, max_x) = range_or_margin(inset, arena.width - inset, arena.margin, arena.width);
    let (min_y, max_y) = range_or_margin(inset, arena.height - inset, arena.margin, arena.height);
    let x = rng.gen_range(min_x..=max_x);
    let y = rng.gen_range(min_y..=max_y);
    world.spawn_brain(kind, x, y)
}

fn range_or_margin(min: f32, max: f32, margin: f32, extent: f32) -> (f32, f32) {
    if min < max {
        (min, max)
    } else {
        (margin, (extent - margin).max(margin))
    }
}

/// Rolls the per-tick spawn chance while the ground population is under the cap.
pub fn tick_spawner<R: Rng + ?Sized>(world: &mut WorldState, rng: &mut R) -> Option<BrainId> {
    if world.ground_count() >= world.tuning.brain.max_ground {
        return None;
    }
    if !rng.gen_bool(world.tuning.brain.spawn_chance.clamp(0.0, 1.0)) {
        return None;
    }
    Some(spawn_one(world, rng))
}
