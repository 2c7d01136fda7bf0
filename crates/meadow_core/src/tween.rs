//! Deterministic numeric tweens.
//!
//! A tween maps elapsed time to a value between `from` and `to`. All timing is
//! integer microseconds (`u64`), and sampling is a pure function of elapsed
//! time. Owners store a start timestamp and sample every step, so nothing is
//! scheduled and two runs over the same clock produce identical values.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Once,
    Forever,
}

#[derive(Debug, Clone, Copy)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub duration_us: u64,
    pub repeat: Repeat,
}

impl Tween {
    pub fn once(from: f32, to: f32, duration_us: u64) -> Self {
        Self {
            from,
            to,
            duration_us,
            repeat: Repeat::Once,
        }
    }

    pub fn forever(from: f32, to: f32, duration_us: u64) -> Self {
        Self {
            from,
            to,
            duration_us,
            repeat: Repeat::Forever,
        }
    }

    /// Value after `elapsed_us`. A one-shot tween holds `to` once finished; a
    /// repeating tween restarts from `from` at every cycle boundary.
    pub fn sample(&self, elapsed_us: u64) -> f32 {
        if self.duration_us == 0 {
            return self.to;
        }
        let local_us = match self.repeat {
            Repeat::Once => elapsed_us.min(self.duration_us),
            Repeat::Forever => elapsed_us % self.duration_us,
        };
        let t = local_us as f32 / self.duration_us as f32;
        self.from + (self.to - self.from) * t
    }
}

/// Milliseconds on the simulation clock to whole microseconds.
pub fn ms_to_us(ms: f64) -> u64 {
    if ms <= 0.0 {
        0
    } else {
        (ms * 1000.0).round() as u64
    }
}
