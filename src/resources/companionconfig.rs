//! Companion configuration resource.
//!
//! Every tunable threshold lives here as a named default and can be
//! overridden from an INI file. Missing keys keep their defaults.
//!
//! # Configuration File Format
//!
//! ```ini
//! [clock]
//! tick_hz = 60
//! max_dt_factor = 3
//! time_scale = 1
//!
//! [physics]
//! gravity = 2400
//! restitution = 0.45
//! bounce_damping = 0.8
//! rest_speed = 60
//!
//! [interaction]
//! drag_threshold_px = 5
//! drag_speed_threshold = 3
//! throw_samples = 4
//!
//! [animation]
//! settle_ticks = 24
//!
//! [behavior]
//! autonomous = false
//! seed = 42
//!
//! [render]
//! shadow_map_size = 1024
//! msaa_samples = 4
//!
//! [window]
//! width = 480
//! height = 360
//! floor_y = 24
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

// [clock]
const DEFAULT_TICK_HZ: f32 = 60.0;
const DEFAULT_MAX_DT_FACTOR: f32 = 3.0;
const DEFAULT_TIME_SCALE: f32 = 1.0;
// [physics]
const DEFAULT_GRAVITY: f32 = 2400.0;
const DEFAULT_RESTITUTION: f32 = 0.45;
const DEFAULT_BOUNCE_DAMPING: f32 = 0.8;
const DEFAULT_REST_SPEED: f32 = 60.0;
const DEFAULT_GROUND_FRICTION: f32 = 8.0;
const DEFAULT_MAX_SPEED: f32 = 6000.0;
const DEFAULT_SQUASH_PER_SPEED: f32 = 1.0 / 4000.0;
const DEFAULT_MAX_SQUASH: f32 = 0.35;
const DEFAULT_SQUASH_RETAIN: f32 = 0.6;
const DEFAULT_HARD_LANDING_SPEED: f32 = 900.0;
const DEFAULT_TIP_OVER_SPEED: f32 = 250.0;
// [interaction]
const DEFAULT_DRAG_THRESHOLD_PX: f32 = 5.0;
const DEFAULT_DRAG_SPEED_THRESHOLD: f32 = 3.0;
const DEFAULT_THROW_SAMPLES: usize = 4;
const DEFAULT_THROW_WINDOW_SECS: f32 = 0.1;
const DEFAULT_MAX_THROW_SPEED: f32 = 5000.0;
const DEFAULT_FACING_DEADZONE_PX: f32 = 1.0;
const DEFAULT_RAGE_CLICK_THRESHOLD: u32 = 10;
const DEFAULT_CLICK_STREAK_GAP_SECS: f32 = 2.0;
// [animation]
const DEFAULT_SETTLE_TICKS: u32 = 24;
const DEFAULT_FEED_SECS: f32 = 2.0;
const DEFAULT_HEAL_STEP_SECS: f32 = 1.0;
// [behavior]
const DEFAULT_AUTONOMOUS: bool = false;
const DEFAULT_WALK_SPEED: f32 = 90.0;
const DEFAULT_ARRIVE_DISTANCE: f32 = 2.0;
const DEFAULT_ACTIVITY_MIN_SECS: f32 = 3.0;
const DEFAULT_ACTIVITY_MAX_SECS: f32 = 8.0;
const DEFAULT_MOOD_CHECK_SECS: f32 = 10.0;
const DEFAULT_IDLE_SLEEP_SECS: f32 = 120.0;
const DEFAULT_KNOCKBACK_PER_DAMAGE: f32 = 6.0;
const DEFAULT_MAX_KNOCKBACK_SPEED: f32 = 300.0;
const DEFAULT_KNOCKBACK_HOP: f32 = 240.0;
// [render]
const DEFAULT_SHADOW_MAP_SIZE: u32 = 1024;
const DEFAULT_MSAA_SAMPLES: u32 = 4;
const DEFAULT_SHADOW_FADE_HEIGHT: f32 = 300.0;
// [window]
const DEFAULT_WINDOW_WIDTH: u32 = 480;
const DEFAULT_WINDOW_HEIGHT: u32 = 360;
const DEFAULT_FLOOR_Y: f32 = 24.0;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_CONFIG_PATH: &str = "./companion.ini";

/// Companion configuration resource.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct CompanionConfig {
    /// Nominal simulation rate in Hz.
    pub tick_hz: f32,
    /// Largest step as a multiple of the nominal period.
    pub max_dt_factor: f32,
    /// Simulation speed multiplier; 0 freezes the world.
    pub time_scale: f32,

    /// Downward acceleration, px/s².
    pub gravity: f32,
    /// Fraction of normal speed kept on floor and wall bounces.
    pub restitution: f32,
    /// Horizontal speed multiplier per floor bounce.
    pub bounce_damping: f32,
    /// Below this rebound speed (px/s) the body settles.
    pub rest_speed: f32,
    /// Ground damping: `v *= 1 - friction * dt`.
    pub ground_friction: f32,
    pub max_speed: f32,
    /// Squash amount per px/s of impact speed.
    pub squash_per_speed: f32,
    pub max_squash: f32,
    /// Fraction of squash kept each tick.
    pub squash_retain: f32,
    /// Peak impact speed (px/s) that makes a landing fall over.
    pub hard_landing_speed: f32,
    /// Horizontal speed (px/s) at touchdown above which a hard landing tips sideways.
    pub tip_over_speed: f32,

    /// Pointer path length (px) that turns a press into a drag.
    pub drag_threshold_px: f32,
    /// Torso drag speed (px per nominal tick) that enters BeingDraggedOnGround.
    pub drag_speed_threshold: f32,
    /// Pointer samples used for throw velocity.
    pub throw_samples: usize,
    /// Samples older than this (s) before the newest are ignored.
    pub throw_window_secs: f32,
    pub max_throw_speed: f32,
    pub facing_deadzone_px: f32,
    /// Click streak that makes the companion annoyed.
    pub rage_click_threshold: u32,
    pub click_streak_gap_secs: f32,

    /// Length of FallingOnFace / TippingOverSide.
    pub settle_ticks: u32,
    pub feed_secs: f32,
    /// Length of each step of the heal sequence.
    pub heal_step_secs: f32,

    pub autonomous: bool,
    /// Walking speed, px/s, before the mood modifier.
    pub walk_speed: f32,
    pub arrive_distance: f32,
    pub activity_min_secs: f32,
    pub activity_max_secs: f32,
    pub mood_check_secs: f32,
    pub idle_sleep_secs: f32,
    pub knockback_per_damage: f32,
    pub max_knockback_speed: f32,
    /// Upward speed of the knockback hop, px/s.
    pub knockback_hop: f32,
    pub seed: Option<u64>,

    pub shadow_map_size: u32,
    pub msaa_samples: u32,
    /// Height at which the contact shadow reaches its faintest.
    pub shadow_fade_height: f32,

    pub window_width: u32,
    pub window_height: u32,
    pub floor_y: f32,
    pub target_fps: u32,

    pub config_path: PathBuf,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CompanionConfig {
    pub fn new() -> Self {
        Self {
            tick_hz: DEFAULT_TICK_HZ,
            max_dt_factor: DEFAULT_MAX_DT_FACTOR,
            time_scale: DEFAULT_TIME_SCALE,
            gravity: DEFAULT_GRAVITY,
            restitution: DEFAULT_RESTITUTION,
            bounce_damping: DEFAULT_BOUNCE_DAMPING,
            rest_speed: DEFAULT_REST_SPEED,
            ground_friction: DEFAULT_GROUND_FRICTION,
            max_speed: DEFAULT_MAX_SPEED,
            squash_per_speed: DEFAULT_SQUASH_PER_SPEED,
            max_squash: DEFAULT_MAX_SQUASH,
            squash_retain: DEFAULT_SQUASH_RETAIN,
            hard_landing_speed: DEFAULT_HARD_LANDING_SPEED,
            tip_over_speed: DEFAULT_TIP_OVER_SPEED,
            drag_threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
            drag_speed_threshold: DEFAULT_DRAG_SPEED_THRESHOLD,
            throw_samples: DEFAULT_THROW_SAMPLES,
            throw_window_secs: DEFAULT_THROW_WINDOW_SECS,
            max_throw_speed: DEFAULT_MAX_THROW_SPEED,
            facing_deadzone_px: DEFAULT_FACING_DEADZONE_PX,
            rage_click_threshold: DEFAULT_RAGE_CLICK_THRESHOLD,
            click_streak_gap_secs: DEFAULT_CLICK_STREAK_GAP_SECS,
            settle_ticks: DEFAULT_SETTLE_TICKS,
            feed_secs: DEFAULT_FEED_SECS,
            heal_step_secs: DEFAULT_HEAL_STEP_SECS,
            autonomous: DEFAULT_AUTONOMOUS,
            walk_speed: DEFAULT_WALK_SPEED,
            arrive_distance: DEFAULT_ARRIVE_DISTANCE,
            activity_min_secs: DEFAULT_ACTIVITY_MIN_SECS,
            activity_max_secs: DEFAULT_ACTIVITY_MAX_SECS,
            mood_check_secs: DEFAULT_MOOD_CHECK_SECS,
            idle_sleep_secs: DEFAULT_IDLE_SLEEP_SECS,
            knockback_per_damage: DEFAULT_KNOCKBACK_PER_DAMAGE,
            max_knockback_speed: DEFAULT_MAX_KNOCKBACK_SPEED,
            knockback_hop: DEFAULT_KNOCKBACK_HOP,
            seed: None,
            shadow_map_size: DEFAULT_SHADOW_MAP_SIZE,
            msaa_samples: DEFAULT_MSAA_SAMPLES,
            shadow_fade_height: DEFAULT_SHADOW_FADE_HEIGHT,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            floor_y: DEFAULT_FLOOR_Y,
            target_fps: DEFAULT_TARGET_FPS,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Nominal tick length in seconds.
    pub fn nominal_dt(&self) -> f32 {
        1.0 / self.tick_hz.max(1.0)
    }

    /// Seconds expressed as nominal ticks, at least one.
    pub fn secs_to_ticks(&self, secs: f32) -> u32 {
        (secs * self.tick_hz).round().max(1.0) as u32
    }

    /// Load overrides from `config_path`.
    ///
    /// Missing values retain their current values. Returns an error if the
    /// file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut ini = Ini::new();
        ini.load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        let float = |section: &str, key: &str| ini.getfloat(section, key).ok().flatten().map(|v| v as f32);
        let uint = |section: &str, key: &str| ini.getuint(section, key).ok().flatten();
        let boolean = |section: &str, key: &str| ini.getbool(section, key).ok().flatten();

        // [clock]
        if let Some(v) = float("clock", "tick_hz") {
            self.tick_hz = v;
        }
        if let Some(v) = float("clock", "max_dt_factor") {
            self.max_dt_factor = v;
        }
        if let Some(v) = float("clock", "time_scale") {
            self.time_scale = v;
        }

        // [physics]
        for (key, slot) in [
            ("gravity", &mut self.gravity),
            ("restitution", &mut self.restitution),
            ("bounce_damping", &mut self.bounce_damping),
            ("rest_speed", &mut self.rest_speed),
            ("ground_friction", &mut self.ground_friction),
            ("max_speed", &mut self.max_speed),
            ("squash_per_speed", &mut self.squash_per_speed),
            ("max_squash", &mut self.max_squash),
            ("squash_retain", &mut self.squash_retain),
            ("hard_landing_speed", &mut self.hard_landing_speed),
            ("tip_over_speed", &mut self.tip_over_speed),
        ] {
            if let Some(v) = float("physics", key) {
                *slot = v;
            }
        }

        // [interaction]
        for (key, slot) in [
            ("drag_threshold_px", &mut self.drag_threshold_px),
            ("drag_speed_threshold", &mut self.drag_speed_threshold),
            ("throw_window_secs", &mut self.throw_window_secs),
            ("max_throw_speed", &mut self.max_throw_speed),
            ("facing_deadzone_px", &mut self.facing_deadzone_px),
            ("click_streak_gap_secs", &mut self.click_streak_gap_secs),
        ] {
            if let Some(v) = float("interaction", key) {
                *slot = v;
            }
        }
        if let Some(v) = uint("interaction", "throw_samples") {
            self.throw_samples = v as usize;
        }
        if let Some(v) = uint("interaction", "rage_click_threshold") {
            self.rage_click_threshold = v as u32;
        }

        // [animation]
        if let Some(v) = uint("animation", "settle_ticks") {
            self.settle_ticks = v as u32;
        }
        if let Some(v) = float("animation", "feed_secs") {
            self.feed_secs = v;
        }
        if let Some(v) = float("animation", "heal_step_secs") {
            self.heal_step_secs = v;
        }

        // [behavior]
        if let Some(v) = boolean("behavior", "autonomous") {
            self.autonomous = v;
        }
        for (key, slot) in [
            ("walk_speed", &mut self.walk_speed),
            ("arrive_distance", &mut self.arrive_distance),
            ("activity_min_secs", &mut self.activity_min_secs),
            ("activity_max_secs", &mut self.activity_max_secs),
            ("mood_check_secs", &mut self.mood_check_secs),
            ("idle_sleep_secs", &mut self.idle_sleep_secs),
            ("knockback_per_damage", &mut self.knockback_per_damage),
            ("max_knockback_speed", &mut self.max_knockback_speed),
            ("knockback_hop", &mut self.knockback_hop),
        ] {
            if let Some(v) = float("behavior", key) {
                *slot = v;
            }
        }
        if let Some(v) = uint("behavior", "seed") {
            self.seed = Some(v);
        }

        // [render]
        if let Some(v) = uint("render", "shadow_map_size") {
            self.shadow_map_size = v as u32;
        }
        if let Some(v) = uint("render", "msaa_samples") {
            self.msaa_samples = v as u32;
        }
        if let Some(v) = float("render", "shadow_fade_height") {
            self.shadow_fade_height = v;
        }

        // [window]
        if let Some(v) = uint("window", "width") {
            self.window_width = v as u32;
        }
        if let Some(v) = uint("window", "height") {
            self.window_height = v as u32;
        }
        if let Some(v) = float("window", "floor_y") {
            self.floor_y = v;
        }
        if let Some(v) = uint("window", "target_fps") {
            self.target_fps = v as u32;
        }

        info!(
            "Loaded config: {}x{} window, {} Hz, gravity={}, restitution={}, settle={} ticks, autonomous={}",
            self.window_width,
            self.window_height,
            self.tick_hz,
            self.gravity,
            self.restitution,
            self.settle_ticks,
            self.autonomous
        );

        Ok(())
    }

    /// Save the current values to `config_path`, creating the file if needed.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut ini = Ini::new();
        let mut set = |section: &str, key: &str, value: String| {
            ini.set(section, key, Some(value));
        };

        set("clock", "tick_hz", self.tick_hz.to_string());
        set("clock", "max_dt_factor", self.max_dt_factor.to_string());
        set("clock", "time_scale", self.time_scale.to_string());

        set("physics", "gravity", self.gravity.to_string());
        set("physics", "restitution", self.restitution.to_string());
        set("physics", "bounce_damping", self.bounce_damping.to_string());
        set("physics", "rest_speed", self.rest_speed.to_string());
        set("physics", "ground_friction", self.ground_friction.to_string());
        set("physics", "max_speed", self.max_speed.to_string());
        set("physics", "squash_per_speed", self.squash_per_speed.to_string());
        set("physics", "max_squash", self.max_squash.to_string());
        set("physics", "squash_retain", self.squash_retain.to_string());
        set("physics", "hard_landing_speed", self.hard_landing_speed.to_string());
        set("physics", "tip_over_speed", self.tip_over_speed.to_string());

        set("interaction", "drag_threshold_px", self.drag_threshold_px.to_string());
        set("interaction", "drag_speed_threshold", self.drag_speed_threshold.to_string());
        set("interaction", "throw_samples", self.throw_samples.to_string());
        set("interaction", "throw_window_secs", self.throw_window_secs.to_string());
        set("interaction", "max_throw_speed", self.max_throw_speed.to_string());
        set("interaction", "facing_deadzone_px", self.facing_deadzone_px.to_string());
        set("interaction", "rage_click_threshold", self.rage_click_threshold.to_string());
        set("interaction", "click_streak_gap_secs", self.click_streak_gap_secs.to_string());

        set("animation", "settle_ticks", self.settle_ticks.to_string());
        set("animation", "feed_secs", self.feed_secs.to_string());
        set("animation", "heal_step_secs", self.heal_step_secs.to_string());

        set("behavior", "autonomous", self.autonomous.to_string());
        set("behavior", "walk_speed", self.walk_speed.to_string());
        set("behavior", "arrive_distance", self.arrive_distance.to_string());
        set("behavior", "activity_min_secs", self.activity_min_secs.to_string());
        set("behavior", "activity_max_secs", self.activity_max_secs.to_string());
        set("behavior", "mood_check_secs", self.mood_check_secs.to_string());
        set("behavior", "idle_sleep_secs", self.idle_sleep_secs.to_string());
        set("behavior", "knockback_per_damage", self.knockback_per_damage.to_string());
        set("behavior", "max_knockback_speed", self.max_knockback_speed.to_string());
        set("behavior", "knockback_hop", self.knockback_hop.to_string());
        if let Some(seed) = self.seed {
            set("behavior", "seed", seed.to_string());
        }

        set("render", "shadow_map_size", self.shadow_map_size.to_string());
        set("render", "msaa_samples", self.msaa_samples.to_string());
        set("render", "shadow_fade_height", self.shadow_fade_height.to_string());

        set("window", "width", self.window_width.to_string());
        set("window", "height", self.window_height.to_string());
        set("window", "floor_y", self.floor_y.to_string());
        set("window", "target_fps", self.target_fps.to_string());

        ini.write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("companion_{}_{}.ini", name, std::process::id()))
    }

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = CompanionConfig::new();
        assert_eq!(config.restitution, 0.45);
        assert_eq!(config.bounce_damping, 0.8);
        assert_eq!(config.settle_ticks, 24);
        assert_eq!(config.drag_threshold_px, 5.0);
        assert_eq!(config.drag_speed_threshold, 3.0);
        assert_eq!(config.throw_samples, 4);
        assert_eq!(config.shadow_map_size, 1024);
        assert_eq!(config.msaa_samples, 4);
        assert_eq!(config.rage_click_threshold, 10);
    }

    #[test]
    fn secs_to_ticks_rounds_at_nominal_rate() {
        let config = CompanionConfig::new();
        assert_eq!(config.secs_to_ticks(2.0), 120);
        assert_eq!(config.secs_to_ticks(0.0), 1);
    }

    #[test]
    fn load_overrides_only_present_keys() {
        let path = temp_path("partial");
        std::fs::write(&path, "[physics]\ngravity = 1000\n\n[behavior]\nautonomous = true\nseed = 9\n").unwrap();
        let mut config = CompanionConfig::with_path(&path);
        config.load_from_file().unwrap();
        assert_eq!(config.gravity, 1000.0);
        assert!(config.autonomous);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.restitution, DEFAULT_RESTITUTION);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let path = temp_path("roundtrip");
        let mut saved = CompanionConfig::with_path(&path);
        saved.walk_speed = 123.0;
        saved.settle_ticks = 30;
        saved.save_to_file().unwrap();

        let mut loaded = CompanionConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        assert_eq!(loaded, saved);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut config = CompanionConfig::with_path("/nonexistent/companion.ini");
        assert!(config.load_from_file().is_err());
    }
}
