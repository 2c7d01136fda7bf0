use glam::Vec2;

/// Last non-zero movement direction, one of the eight compass directions.
/// Starts facing right so a throw before any movement still has an aim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionState {
    pub x: i8,
    pub y: i8,
}

impl Default for DirectionState {
    fn default() -> Self {
        Self { x: 1, y: 0 }
    }
}

impl DirectionState {
    /// Take the sign of each velocity component. A zero velocity keeps the
    /// previous facing.
    pub fn update(&mut self, velocity: Vec2) {
        if velocity == Vec2::ZERO {
            return;
        }
        self.x = sign(velocity.x);
        self.y = sign(velocity.y);
    }

    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    pub fn as_array(self) -> [i8; 2] {
        [self.x, self.y]
    }
}

fn sign(v: f32) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}
