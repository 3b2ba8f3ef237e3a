//! Animated companion library.
//!
//! A small rigid-rig character that lives on the floor of a host window. It
//! idles, walks, reacts to clicks, can be dragged by any body part, thrown,
//! bounced and knocked over, and renders as lit boxes and spheres with a
//! software shadow pass.
//!
//! # Modules
//!
//! - [`components`] – ECS components of the companion entity
//! - [`events`] – inbound events, notifications and internal messages
//! - [`resources`] – clock, config, viewport, inbox and other world resources
//! - [`systems`] – per-tick and on-demand systems
//! - [`poses`] – the keyframe functions behind each animation state
//! - [`render`] – camera, lighting, shadow map and the frame description
//! - [`companion`] – the [`Companion`] facade hosts talk to

pub mod companion;
pub mod components;
pub mod events;
pub mod poses;
pub mod render;
pub mod resources;
pub mod systems;

pub use companion::{Companion, CompanionSnapshot};
