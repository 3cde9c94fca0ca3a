/// Playfield dimensions in pixels.

#[derive(Debug, Clone, Copy)]
pub struct ArenaTuning {
    pub width: f32,
    pub height: f32,

    /// Distance players are kept from each edge so sprites stay fully visible.
    pub margin: f32,
}

impl ArenaTuning {
    /// Clamps a point into the playable area.
    pub fn clamp(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x.clamp(self.margin, self.width - self.margin),
            y.clamp(self.margin, self.height - self.margin),
        )
    }
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            margin: 10.0,
        }
    }
}
