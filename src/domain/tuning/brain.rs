/// Gameplay tuning for collectible brains and the spawner.

#[derive(Debug, Clone, Copy)]
pub struct BrainTuning {
    /// World-space radius in pixels.
    pub radius: f32,

    /// Extra slack added to player + brain radius when picking up.
    pub pickup_margin: f32,

    /// Vertical offset of a carried brain above its carrier.
    pub carry_offset: f32,

    /// Spawner stops while this many brains are on the ground.
    pub max_ground: usize,

    /// Per-tick probability of a spawn while below the cap.
    pub spawn_chance: f64,

    /// Brains spawned when the world starts.
    pub initial: usize,

    /// Spawn region, inset from every arena edge.
    pub spawn_inset: f32,

    /// Distance a dropped brain lands from the player that dropped it.
    pub drop_offset: f32,
}

impl BrainTuning {
    pub fn pickup_range(&self, player_radius: f32) -> f32 {
        player_radius + self.radius + self.pickup_margin
    }
}

impl Default for BrainTuning {
    fn default() -> Self {
        Self {
            radius: 12.0,
            pickup_margin: 6.0,
            carry_offset: 30.0,
            max_ground: 12,
            spawn_chance: 0.05,
            initial: 6,
            spawn_inset: 100.0,
            drop_offset: 24.0,
        }
    }
}
