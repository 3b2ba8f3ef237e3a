//! ECS components of the companion entity.
//!
//! Submodules overview:
//! - [`animation`] – animation states, their timing table and the player
//! - [`bodypart`] – the nine rig parts, hierarchy offsets and shapes
//! - [`dragsession`] – pointer capture, sample ring and drag spin
//! - [`facing`] – horizontal facing direction
//! - [`mood`] – mood, its modifiers and drift rules
//! - [`palette`] – colour slots and the runtime rig palette
//! - [`physicsbody`] – position, velocity and ground contact
//! - [`pose`] – pose parameters, part transforms and the composed rig
//! - [`sceneitem`] – food and toys dropped into the scene
//! - [`squash`] – squash/stretch from impacts
//! - [`walktarget`] – walk destination and autonomous activity timer

pub mod animation;
pub mod bodypart;
pub mod dragsession;
pub mod facing;
pub mod mood;
pub mod palette;
pub mod physicsbody;
pub mod pose;
pub mod sceneitem;
pub mod squash;
pub mod walktarget;
