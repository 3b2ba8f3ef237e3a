//! Companion main entry point.
//!
//! Runs the companion either headless (default) or in a raylib window when
//! built with the `window` feature.
//!
//! # Headless
//!
//! Ticks the simulation a fixed number of times at the nominal rate, applying
//! triggers and events given on the command line, logging every notification
//! and printing snapshots as JSON.
//!
//! ```sh
//! cargo run --release -- --ticks 240 --event place:240,300 --json
//! ```
//!
//! # Windowed
//!
//! Left mouse pets, pokes, drags and throws the companion. Right drag orbits
//! the camera, the wheel zooms and `R` resets the view.
//!
//! ```sh
//! cargo run --release --features window
//! ```

// Do not create console on Windows
#![cfg_attr(
    all(target_os = "windows", feature = "window"),
    windows_subsystem = "windows"
)]

use std::path::PathBuf;

use clap::Parser;
use companion::Companion;
use companion::events::companion::CompanionEvent;
use companion::resources::companionconfig::CompanionConfig;

/// Animated desktop companion
#[derive(Parser, Debug)]
#[command(version, about = "Animated companion character: rig, state machine, drag/throw physics and a lit 3D pass.")]
struct Cli {
    /// Config file (INI). Missing files fall back to defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Headless ticks to simulate.
    #[arg(long, default_value_t = 300)]
    ticks: u32,

    /// State to trigger before the first tick, e.g. `waving` or `eating`.
    #[arg(long, value_name = "STATE")]
    trigger: Option<String>,

    /// Event to apply before the first tick; repeatable.
    /// Forms: `feed`, `pet`, `damage:20[,x]`, `heal`, `mood:sleepy`,
    /// `collision:0.5,0.3`, `walk:300`, `place:200,240`, `focus_lost`,
    /// `item:apple,300`, `walk_item:0`, `interact:0`, `color:accent,200,40,40`.
    #[arg(long = "event", value_name = "EVENT", value_parser = parse_event)]
    events: Vec<CompanionEvent>,

    /// Let the companion pick its own activities.
    #[arg(long)]
    autonomous: bool,

    /// Seed for the behaviour RNG.
    #[arg(long)]
    seed: Option<u64>,

    /// Print a JSON snapshot every N ticks (0 prints only the final one).
    #[arg(long, value_name = "N", default_value_t = 0)]
    every: u32,

    /// Print snapshots as JSON instead of a one-line summary.
    #[arg(long)]
    json: bool,

    /// Open a window instead of running headless (needs the `window` feature).
    #[arg(long)]
    window: bool,
}

fn parse_event(s: &str) -> Result<CompanionEvent, String> {
    s.parse()
}

fn load_config(cli: &Cli) -> CompanionConfig {
    let mut config = match &cli.config {
        Some(path) => CompanionConfig::with_path(path),
        None => CompanionConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        // Defaults are fine when no file is around.
        log::info!("{}; using defaults", e);
    }
    if cli.autonomous {
        config.autonomous = true;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config
}

fn prime(companion: &mut Companion, cli: &Cli) {
    for event in &cli.events {
        if !companion.apply_event(*event) {
            log::warn!("event '{}' had no effect", event.name());
        }
    }
    if let Some(state) = &cli.trigger {
        companion.trigger(state, None);
    }
}

fn log_notifications(companion: &mut Companion) {
    for note in companion.drain_notifications() {
        log::info!("{:?}", note);
    }
}

fn print_snapshot(companion: &Companion, json: bool) {
    let snapshot = companion.snapshot();
    if json {
        match serde_json::to_string(&snapshot) {
            Ok(line) => println!("{}", line),
            Err(e) => log::error!("snapshot serialization failed: {}", e),
        }
    } else {
        println!(
            "frame {:>5} {:?} mood {:?} at ({:.1}, {:.1}) grounded {}",
            snapshot.frame,
            snapshot.state,
            snapshot.mood,
            snapshot.position[0],
            snapshot.position[1],
            snapshot.grounded
        );
    }
}

fn run_headless(cli: &Cli, config: CompanionConfig) {
    let dt = config.nominal_dt();
    let mut companion = Companion::new(config);
    prime(&mut companion, cli);
    log_notifications(&mut companion);

    for tick in 1..=cli.ticks {
        companion.tick(dt);
        log_notifications(&mut companion);
        if cli.every > 0 && tick % cli.every == 0 {
            print_snapshot(&companion, cli.json);
        }
    }
    print_snapshot(&companion, cli.json);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli);

    if cli.window {
        #[cfg(feature = "window")]
        {
            window::run(&cli, config);
            return;
        }
        #[cfg(not(feature = "window"))]
        log::warn!("built without the `window` feature; running headless");
    }

    run_headless(&cli, config);
}

#[cfg(feature = "window")]
mod window {
    use raylib::prelude::*;

    use companion::Companion;
    use companion::events::companion::CompanionEvent;
    use companion::render::SceneRenderer;
    use companion::render::raylib_backend::draw_frame;
    use companion::resources::companionconfig::CompanionConfig;

    use super::{Cli, log_notifications, prime};

    /// Radians of orbit per pixel of right-drag.
    const ORBIT_SENSITIVITY: f32 = 0.01;
    const ZOOM_STEP: f32 = 1.1;

    pub fn run(cli: &Cli, config: CompanionConfig) {
        let (mut rl, thread) = raylib::init()
            .size(config.window_width as i32, config.window_height as i32)
            .resizable()
            .msaa_4x()
            .title("Companion")
            .build();
        rl.set_target_fps(config.target_fps);

        let mut renderer = SceneRenderer::from_config(&config);
        let mut companion = Companion::new(config);
        prime(&mut companion, cli);
        let mut focused = true;

        while !rl.window_should_close() {
            if rl.is_window_resized() {
                companion.set_viewport(rl.get_screen_width() as f32, rl.get_screen_height() as f32);
            }
            companion.set_visible(!rl.is_window_minimized());

            let now_focused = rl.is_window_focused();
            if now_focused != focused {
                focused = now_focused;
                let event = if focused {
                    CompanionEvent::FocusGained
                } else {
                    CompanionEvent::FocusLost
                };
                companion.apply_event(event);
            }

            let time = rl.get_time() as f32;
            let mouse = rl.get_mouse_position();
            if rl.is_mouse_button_pressed(MouseButton::MOUSE_BUTTON_LEFT) {
                companion.pointer_down(mouse.x, mouse.y, time);
            } else if rl.is_mouse_button_down(MouseButton::MOUSE_BUTTON_LEFT) {
                companion.pointer_move(mouse.x, mouse.y, time);
            } else if rl.is_mouse_button_released(MouseButton::MOUSE_BUTTON_LEFT) {
                companion.pointer_up(mouse.x, mouse.y, time);
            }

            if rl.is_mouse_button_down(MouseButton::MOUSE_BUTTON_RIGHT) {
                let delta = rl.get_mouse_delta();
                renderer
                    .camera_mut()
                    .orbit(-delta.x * ORBIT_SENSITIVITY, delta.y * ORBIT_SENSITIVITY);
            }
            let wheel = rl.get_mouse_wheel_move();
            if wheel != 0.0 {
                renderer.camera_mut().zoom_by(ZOOM_STEP.powf(wheel));
            }
            if rl.is_key_pressed(KeyboardKey::KEY_R) {
                renderer.camera_mut().reset();
            }

            let dt = rl.get_frame_time();
            companion.tick(dt);
            log_notifications(&mut companion);

            let frame = companion.render_frame(&mut renderer);
            let mut d = rl.begin_drawing(&thread);
            match frame {
                Some(frame) => draw_frame(&mut d, &frame),
                None => d.clear_background(Color::RAYWHITE),
            }
        }
    }
}
