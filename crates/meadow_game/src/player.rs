use glam::Vec2;
use meadow_core::input::{InputState, Key};

use crate::direction::DirectionState;

const IDLE_SCALE: f32 = 0.5;
const TILT_FACTOR: f32 = 0.1;
const BOB_FREQUENCY: f64 = 0.01;
const BOB_AMPLITUDE: f32 = 0.05;

/// Per-axis movement intent, each component in {-1, 0, 1}.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerInput {
    pub move_x: i8,
    pub move_y: i8,
}

impl PlayerInput {
    /// Resolve arrow keys and WASD. When both keys of an axis are held the
    /// positive direction wins: right over left, down over up.
    pub fn from_input(input: &InputState) -> Self {
        let right = input.any_held(&[Key::Right, Key::D]);
        let left = input.any_held(&[Key::Left, Key::A]);
        let down = input.any_held(&[Key::Down, Key::S]);
        let up = input.any_held(&[Key::Up, Key::W]);
        Self {
            move_x: resolve_axis(left, right),
            move_y: resolve_axis(up, down),
        }
    }
}

fn resolve_axis(negative: bool, positive: bool) -> i8 {
    if positive {
        1
    } else if negative {
        -1
    } else {
        0
    }
}

/// Sprite rotation and uniform scale for the current velocity. Moving tilts
/// slightly toward the heading and bobs the scale; idle resets both.
pub fn orientation(velocity: Vec2, now_ms: f64) -> (f32, f32) {
    if velocity == Vec2::ZERO {
        return (0.0, IDLE_SCALE);
    }
    let tilt = velocity.y.atan2(velocity.x) * TILT_FACTOR;
    let bob = 1.0 + (now_ms * BOB_FREQUENCY).sin() as f32 * BOB_AMPLITUDE;
    (tilt, IDLE_SCALE * bob)
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerController {
    pub position: Vec2,
    pub velocity: Vec2,
    pub speed: f32,
    pub direction: DirectionState,
    pub flip_x: bool,
    pub rotation: f32,
    pub scale: f32,
}

impl PlayerController {
    pub fn new(position: Vec2, speed: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            speed,
            direction: DirectionState::default(),
            flip_x: false,
            rotation: 0.0,
            scale: IDLE_SCALE,
        }
    }

    pub fn update(&mut self, input: PlayerInput, dt: f32, now_ms: f64) {
        let mut velocity = Vec2::new(
            input.move_x as f32 * self.speed,
            input.move_y as f32 * self.speed,
        );
        // Diagonals move at the same speed as straight lines.
        if velocity.x != 0.0 && velocity.y != 0.0 {
            velocity = velocity.normalize() * self.speed;
        }
        self.velocity = velocity;

        if input.move_x < 0 {
            self.flip_x = true;
        } else if input.move_x > 0 {
            self.flip_x = false;
        }

        self.direction.update(velocity);
        self.position += velocity * dt;
        (self.rotation, self.scale) = orientation(velocity, now_ms);
    }

    pub fn is_moving(&self) -> bool {
        self.velocity != Vec2::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn input_with(keys: &[Key]) -> InputState {
        let mut input = InputState::new();
        for key in keys {
            input.key_down(*key);
        }
        input
    }

    #[test]
    fn diagonal_speed_is_capped() {
        let mut player = PlayerController::new(Vec2::ZERO, 300.0);
        let input = PlayerInput::from_input(&input_with(&[Key::Up, Key::Right]));
        player.update(input, DT, 0.0);
        assert!((player.velocity.x - 212.1).abs() < 0.05);
        assert!((player.velocity.y + 212.1).abs() < 0.05);
        assert!((player.velocity.length() - 300.0).abs() < 1e-3);
        assert_eq!(player.direction.as_array(), [1, -1]);
    }

    #[test]
    fn idle_keeps_last_facing() {
        let mut player = PlayerController::new(Vec2::ZERO, 300.0);
        player.update(PlayerInput { move_x: 0, move_y: 1 }, DT, 0.0);
        player.update(PlayerInput::default(), DT, 16.0);
        assert_eq!(player.direction.as_array(), [0, 1]);
        assert!(!player.is_moving());
    }

    #[test]
    fn opposing_keys_resolve_to_positive_axis() {
        let both_x = PlayerInput::from_input(&input_with(&[Key::Left, Key::Right]));
        assert_eq!(both_x.move_x, 1);
        let both_y = PlayerInput::from_input(&input_with(&[Key::Up, Key::Down]));
        assert_eq!(both_y.move_y, 1);
        let wasd = PlayerInput::from_input(&input_with(&[Key::A, Key::W]));
        assert_eq!(wasd, PlayerInput { move_x: -1, move_y: -1 });
    }

    #[test]
    fn position_integrates_velocity() {
        let mut player = PlayerController::new(Vec2::new(5.0, 5.0), 300.0);
        player.update(PlayerInput { move_x: 1, move_y: 0 }, 0.5, 0.0);
        assert_eq!(player.position, Vec2::new(155.0, 5.0));
    }

    #[test]
    fn flip_follows_horizontal_heading() {
        let mut player = PlayerController::new(Vec2::ZERO, 300.0);
        player.update(PlayerInput { move_x: -1, move_y: 0 }, DT, 0.0);
        assert!(player.flip_x);
        player.update(PlayerInput { move_x: 0, move_y: 1 }, DT, 0.0);
        assert!(player.flip_x, "vertical movement keeps the flip");
        player.update(PlayerInput { move_x: 1, move_y: 0 }, DT, 0.0);
        assert!(!player.flip_x);
    }

    #[test]
    fn orientation_tilts_and_bobs_only_while_moving() {
        assert_eq!(orientation(Vec2::ZERO, 1234.0), (0.0, 0.5));

        let (rotation, scale) = orientation(Vec2::new(0.0, 300.0), 0.0);
        assert!((rotation - std::f32::consts::FRAC_PI_2 * 0.1).abs() < 1e-6);
        assert!((scale - 0.5).abs() < 1e-6);

        let quarter = std::f64::consts::FRAC_PI_2 / 0.01;
        let (_, peak) = orientation(Vec2::new(300.0, 0.0), quarter);
        assert!((peak - 0.525).abs() < 1e-5);
    }

    #[test]
    fn replayed_inputs_reach_same_state() {
        let script = [
            PlayerInput { move_x: 1, move_y: 0 },
            PlayerInput { move_x: 1, move_y: -1 },
            PlayerInput { move_x: 0, move_y: 0 },
            PlayerInput { move_x: -1, move_y: 1 },
        ];
        let mut a = PlayerController::new(Vec2::ZERO, 300.0);
        let mut b = PlayerController::new(Vec2::ZERO, 300.0);
        for (i, input) in script.iter().cycle().take(240).enumerate() {
            let now = i as f64 * 16.667;
            a.update(*input, DT, now);
            b.update(*input, DT, now);
        }
        assert_eq!(a.position, b.position);
        assert_eq!(a.direction, b.direction);
        assert_eq!(a.scale, b.scale);
    }
}
