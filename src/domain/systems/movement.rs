use crate::domain::state::Player;
use crate::domain::tuning::{ArenaTuning, PlayerTuning};

#[derive(Debug, Clone, Copy)]
pub struct MovementConfig {
    pub speed: f32, // px/s
    pub arena: ArenaTuning,
}

impl MovementConfig {
    pub fn new(player: PlayerTuning, arena: ArenaTuning) -> Self {
        Self {
            speed: player.speed,
            arena,
        }
    }
}

pub fn tick_player(p: &mut Player, dt: f32, cfg: MovementConfig) {
    let input = p.last_input;

    // direction (+Y is down, matching canvas coordinates)
    let mut dir_x = 0.0_f32;
    let mut dir_y = 0.0_f32;
    if input.left {
        dir_x -= 1.0;
    }
    if input.right {
        dir_x += 1.0;
    }
    if input.up {
        dir_y -= 1.0;
    }
    if input.down {
        dir_y += 1.0;
    }

    // Normalize so diagonals never exceed the configured speed.
    let len = (dir_x * dir_x + dir_y * dir_y).sqrt();
    if len > 0.0 {
        dir_x /= len;
        dir_y /= len;
    }

    p.vx = dir_x * cfg.speed;
    p.vy = dir_y * cfg.speed;

    // position integrate
    let (x, y) = cfg.arena.clamp(p.x + p.vx * dt, p.y + p.vy * dt);
    p.x = x;
    p.y = y;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::PlayerInput;

    fn player_at(x: f32, y: f32, input: PlayerInput) -> Player {
        let mut p = Player::new(1, "p".into(), x, y, 1);
        p.last_input = input;
        p
    }

    fn cfg() -> MovementConfig {
        MovementConfig::new(PlayerTuning::default(), ArenaTuning::default())
    }

    #[test]
    fn straight_movement_uses_full_speed() {
        let mut p = player_at(
            400.0,
            300.0,
            PlayerInput {
                right: true,
                ..PlayerInput::default()
            },
        );
        tick_player(&mut p, 0.5, cfg());
        assert!((p.x - 500.0).abs() < 1e-3);
        assert_eq!(p.y, 300.0);
    }

    #[test]
    fn diagonal_movement_is_normalized() {
        let mut p = player_at(
            400.0,
            300.0,
            PlayerInput {
                up: true,
                left: true,
                ..PlayerInput::default()
            },
        );
        tick_player(&mut p, 0.1, cfg());
        let speed = (p.vx * p.vx + p.vy * p.vy).sqrt();
        assert!((speed - 200.0).abs() < 1e-3);
        assert!(p.vx < 0.0 && p.vy < 0.0);
    }

    #[test]
    fn opposite_keys_cancel_out() {
        let mut p = player_at(
            400.0,
            300.0,
            PlayerInput {
                up: true,
                down: true,
                ..PlayerInput::default()
            },
        );
        tick_player(&mut p, 1.0, cfg());
        assert_eq!((p.x, p.y), (400.0, 300.0));
    }

    #[test]
    fn position_is_clamped_inside_margins() {
        let mut p = player_at(
            15.0,
            595.0,
            PlayerInput {
                left: true,
                down: true,
                ..PlayerInput::default()
            },
        );
        tick_player(&mut p, 1.0, cfg());
        assert_eq!((p.x, p.y), (10.0, 590.0));
    }
}
