/// Gameplay tuning for player avatars.

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Movement speed in pixels per second (diagonals are normalized to this).
    pub speed: f32,

    /// World-space interaction radius in pixels.
    pub radius: f32,

    /// Longest display name kept after sanitizing.
    pub max_name_len: usize,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            speed: 200.0,
            radius: 18.0,
            max_name_len: 20,
        }
    }
}
