/// Gameplay tuning for bases and shields.

/// How players are mapped onto bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseLayout {
    /// Every player gets a private base that disappears when they leave.
    PerPlayer,
    /// Four fixed corner bases, each shared by up to `capacity` players.
    Shared { capacity: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct BaseTuning {
    pub layout: BaseLayout,

    /// Interaction range around the base center.
    pub radius: f32,

    /// Most brains a base can hold.
    pub storage_capacity: usize,

    pub shield_duration_ms: u64,
    pub shield_cooldown_ms: u64,
}

impl Default for BaseTuning {
    fn default() -> Self {
        Self {
            layout: BaseLayout::PerPlayer,
            radius: 60.0,
            storage_capacity: 12,
            shield_duration_ms: 8_000,
            shield_cooldown_ms: 30_000,
        }
    }
}
