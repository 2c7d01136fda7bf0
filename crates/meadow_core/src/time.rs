use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

/// Fixed step in integer microseconds. The simulation clock advances by exactly
/// this much per step so `now_ms()` is identical across runs and platforms.
pub const FIXED_DT_US: u64 = 16_667;

pub struct TimeState {
    pub fixed_dt: f64,
    pub max_accumulator: f64,
    accumulator: f64,
    pub total_time: f64,
    sim_time_us: u64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    last_instant: Instant,
    pub interpolation_alpha: f64,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new() -> Self {
        Self {
            fixed_dt: FIXED_DT_US as f64 / 1_000_000.0,
            max_accumulator: 0.25,
            accumulator: 0.0,
            total_time: 0.0,
            sim_time_us: 0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            last_instant: Instant::now(),
            interpolation_alpha: 0.0,
            fps_samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let real_dt = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.advance(real_dt);
    }

    /// Feed `real_dt` seconds of wall-clock time into the accumulator.
    pub fn advance(&mut self, real_dt: f64) {
        self.real_dt = real_dt;

        // Spiral-of-death cap
        if self.real_dt > self.max_accumulator {
            log::warn!(
                "Frame took {:.1}ms, capping accumulator to {}ms",
                self.real_dt * 1000.0,
                self.max_accumulator * 1000.0
            );
            self.real_dt = self.max_accumulator;
        }

        self.accumulator += self.real_dt;
        self.steps_this_frame = 0;
        self.frame_count += 1;

        // FPS smoothing
        self.fps_samples[self.fps_sample_index] = self.real_dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    pub fn should_step(&mut self) -> bool {
        if self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            self.total_time += self.fixed_dt;
            self.sim_time_us += FIXED_DT_US;
            self.fixed_step_count += 1;
            self.steps_this_frame += 1;
            true
        } else {
            false
        }
    }

    pub fn end_frame(&mut self) {
        self.interpolation_alpha = self.accumulator / self.fixed_dt;
    }

    /// Monotonic simulation clock in milliseconds, advanced only by fixed steps.
    pub fn now_ms(&self) -> f64 {
        self.sim_time_us as f64 / 1000.0
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_produces_whole_fixed_steps() {
        let mut time = TimeState::new();
        time.advance(time.fixed_dt * 3.5);
        let mut steps = 0;
        while time.should_step() {
            steps += 1;
        }
        assert_eq!(steps, 3);
        assert_eq!(time.steps_this_frame, 3);
        time.end_frame();
        assert!((time.interpolation_alpha - 0.5).abs() < 1e-6);
    }

    #[test]
    fn long_frames_are_capped() {
        let mut time = TimeState::new();
        time.advance(5.0);
        assert!((time.real_dt - time.max_accumulator).abs() < f64::EPSILON);
        let mut steps = 0;
        while time.should_step() {
            steps += 1;
        }
        // 0.25s at 16.667ms per step
        assert_eq!(steps, 14);
    }

    #[test]
    fn sim_clock_advances_only_on_steps() {
        let mut time = TimeState::new();
        assert_eq!(time.now_ms(), 0.0);
        time.advance(time.fixed_dt * 0.5);
        assert!(!time.should_step());
        assert_eq!(time.now_ms(), 0.0);

        time.advance(time.fixed_dt);
        assert!(time.should_step());
        assert!((time.now_ms() - 16.667).abs() < 1e-9);
    }

    #[test]
    fn sim_clock_is_exact_after_many_steps() {
        let mut time = TimeState::new();
        for _ in 0..600 {
            time.advance(time.fixed_dt);
            while time.should_step() {}
        }
        assert_eq!(time.fixed_step_count, 600);
        assert!((time.now_ms() - 600.0 * 16.667).abs() < 1e-6);
    }
}
