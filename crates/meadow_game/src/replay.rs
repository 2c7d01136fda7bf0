use meadow_core::input::{InputState, Key};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    /// Keys held during the frame.
    #[serde(default)]
    pub held: Vec<Key>,
    /// Fresh press of the throw key on the first repetition of this frame.
    #[serde(default)]
    pub fire: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

/// One simulation step worth of input.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayStep {
    pub held: Vec<Key>,
    pub fire: bool,
}

impl ReplaySequence {
    pub fn expanded_inputs(&self) -> Vec<ReplayStep> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for i in 0..frame.repeat.max(1) {
                out.push(ReplayStep {
                    held: frame.held.clone(),
                    fire: frame.fire && i == 0,
                });
            }
        }
        out
    }
}

/// Bring `input` to the state described by `step`, producing the same edge
/// transitions a keyboard would.
pub fn apply_step(input: &mut InputState, step: &ReplayStep) {
    input.end_frame();
    if input.is_held(Key::Space) && !step.held.contains(&Key::Space) {
        input.key_up(Key::Space);
    }
    for key in [
        Key::Left,
        Key::Right,
        Key::Up,
        Key::Down,
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::Enter,
    ] {
        if step.held.contains(&key) {
            input.key_down(key);
        } else {
            input.key_up(key);
        }
    }
    if step.fire {
        input.key_up(Key::Space);
        input.key_down(Key::Space);
    } else if step.held.contains(&Key::Space) {
        input.key_down(Key::Space);
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt <= 0.0 {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::temp_file_path;
    use crate::config::GameConfig;
    use crate::scene::{GameScene, SceneSnapshot};
    use meadow_render::ShapeStore;
    use std::sync::mpsc;

    fn run(replay: &ReplaySequence) -> (SceneSnapshot, usize) {
        let mut config = GameConfig::default();
        config.world.view_radius = 4;
        let mut store = ShapeStore::new();
        let (tx, _rx) = mpsc::channel();
        let mut scene =
            GameScene::on_create(&config, tx, (1024, 768), 0.0, &mut store).expect("scene builds");
        let mut input = InputState::new();
        let step_ms = replay.fixed_dt as f64 * 1000.0;
        for (i, step) in replay.expanded_inputs().iter().enumerate() {
            apply_step(&mut input, step);
            scene.on_update(&input, replay.fixed_dt, (i + 1) as f64 * step_ms, &mut store);
        }
        let snapshot = scene.snapshot();
        let live = store.live_count();
        scene.teardown(&mut store);
        assert_eq!(store.live_count(), 0);
        (snapshot, live)
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("replay_parse");
        fs::write(
            &path,
            r#"{
              "fixed_dt": 0.016667,
              "frames": [
                { "held": ["right"], "repeat": 3 },
                { "held": ["right", "up"], "fire": true, "repeat": 2 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let expanded = replay.expanded_inputs();
        assert_eq!(expanded.len(), 5);
        assert!(!expanded[2].fire);
        assert!(expanded[3].fire);
        assert!(!expanded[4].fire);
        assert_eq!(expanded[4].held, vec![Key::Right, Key::Up]);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_rejects_empty_frames() {
        let path = temp_file_path("replay_empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty replay should fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn fire_step_produces_fresh_press() {
        let mut input = InputState::new();
        let fire = ReplayStep {
            held: vec![Key::Space],
            fire: true,
        };
        apply_step(&mut input, &fire);
        assert!(input.is_just_pressed(Key::Space));
        apply_step(&mut input, &fire);
        assert!(input.is_just_pressed(Key::Space));
        let hold = ReplayStep {
            held: vec![Key::Space],
            fire: false,
        };
        apply_step(&mut input, &hold);
        assert!(input.is_held(Key::Space));
        assert!(!input.is_just_pressed(Key::Space));
    }

    #[test]
    fn replay_run_is_deterministic() {
        let path = temp_file_path("replay_deterministic");
        fs::write(
            &path,
            r#"{
              "fixed_dt": 0.016667,
              "frames": [
                { "held": ["right"], "repeat": 40 },
                { "held": ["right", "up"], "fire": true, "repeat": 30 },
                { "repeat": 10 },
                { "fire": true },
                { "held": ["a", "s"], "repeat": 45 },
                { "held": ["left", "right"], "fire": true, "repeat": 20 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let (a, live_a) = run(&replay);
        let (b, live_b) = run(&replay);
        assert_eq!(a, b);
        assert_eq!(live_a, live_b);
        assert!(a.tiles_recycled > 0, "the run should cross tile boundaries");
        assert!(!a.projectiles.is_empty());
        // Last frame: opposing horizontal keys resolve to the right.
        assert_eq!(a.facing, [1, 0]);

        let _ = fs::remove_file(path);
    }
}
