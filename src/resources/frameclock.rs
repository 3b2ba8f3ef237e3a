//! Simulation cadence.
//!
//! The host calls `Companion::tick(dt)` at whatever rate it paints. The
//! [`FrameClock`] turns that raw delta into the simulation step: it is
//! clamped to `[0, max_dt]`, NaN counts as zero, nothing runs while the
//! companion is hidden, and the first step after becoming visible again is
//! exactly one nominal period. Each simulated tick raises a redraw request
//! that the host may coalesce.

use bevy_ecs::prelude::Resource;

pub const DEFAULT_TICK_HZ: f32 = 60.0;
pub const DEFAULT_MAX_DT_FACTOR: f32 = 3.0;

#[derive(Resource, Debug, Clone)]
pub struct FrameClock {
    nominal_dt: f32,
    max_dt: f32,
    visible: bool,
    resume_pending: bool,
    redraw_requested: bool,
    ticks: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_HZ, DEFAULT_MAX_DT_FACTOR)
    }
}

impl FrameClock {
    /// `tick_hz` nominal rate; `max_dt_factor` multiples of the nominal period
    /// allowed in one step.
    pub fn new(tick_hz: f32, max_dt_factor: f32) -> Self {
        let hz = if tick_hz.is_finite() && tick_hz > 0.0 { tick_hz } else { DEFAULT_TICK_HZ };
        let nominal_dt = 1.0 / hz;
        Self {
            nominal_dt,
            max_dt: nominal_dt * max_dt_factor.max(1.0),
            visible: true,
            resume_pending: false,
            redraw_requested: false,
            ticks: 0,
        }
    }

    pub fn nominal_dt(&self) -> f32 {
        self.nominal_dt
    }

    pub fn max_dt(&self) -> f32 {
        self.max_dt
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn set_visible(&mut self, visible: bool) {
        if visible && !self.visible {
            self.resume_pending = true;
        }
        self.visible = visible;
    }

    /// Step length for a raw host delta, or `None` when no tick should run.
    pub fn step(&mut self, raw_dt: f32) -> Option<f32> {
        if !self.visible {
            return None;
        }
        let dt = if self.resume_pending {
            self.resume_pending = false;
            self.nominal_dt
        } else if raw_dt.is_nan() {
            0.0
        } else {
            raw_dt.clamp(0.0, self.max_dt)
        };
        self.ticks += 1;
        self.redraw_requested = true;
        Some(dt)
    }

    /// Read and clear the pending redraw request.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }
}
