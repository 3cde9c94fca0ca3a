use crate::domain::state::PlayerId;
use crate::domain::world::WorldState;

/// Adds `rate * dt` to the player's money and returns the amount added.
///
/// Money stays fractional; flooring happens only when building snapshots.
pub fn accrue(world: &mut WorldState, player_id: PlayerId, dt: f32) -> f64 {
    let earned = world.income_rate(player_id) * f64::from(dt);
    if earned == 0.0 {
        return 0.0;
    }
    if let Some(player) = world.player_mut(player_id) {
        player.money += earned;
    }
    earned
}
