//! Companion systems.
//!
//! This module groups the ECS systems that advance the companion each tick
//! and the registered systems the facade runs on demand.
//!
//! Submodules overview
//! - [`inbox`] – resolve external events (feed, damage, mood, walk, ...)
//! - [`interaction`] – pointer grab, drag, throw and click handling
//! - [`items`] – scene item physics and eaten food removal
//! - [`mood`] – periodic mood drift
//! - [`physics`] – gravity, floor/wall bounces, squash from impacts
//! - [`pose`] – evaluate the state's pose and compose the rig hierarchy
//! - [`statemachine`] – advance animation states, landing rules, triggers
//! - [`time`] – filter the host delta and update simulation time
//! - [`wander`] – walk to targets and pick autonomous activities
//!
//! Per-tick order (see `Companion::new`): inbox, animation, wander, squash
//! decay, physics, item physics, eaten items, landing, mood, pose.

pub mod inbox;
pub mod interaction;
pub mod items;
pub mod mood;
pub mod physics;
pub mod pose;
pub mod statemachine;
pub mod time;
pub mod wander;
