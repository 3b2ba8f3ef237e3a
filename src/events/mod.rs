//! Event types and observers used by the companion.
//!
//! Inbound events come from the host, outbound notifications go back to it,
//! and internal messages carry contacts between systems.
//!
//! Submodules:
//! - [`companion`] – discrete events pushed in by external collaborators
//! - [`notification`] – outbound notifications drained by the facade
//! - [`physics`] – floor and wall contacts reported by the integrator
//! - [`pointer`] – what a pointer release did
//! - [`statechange`] – animation transitions and their logging observer
pub mod companion;
pub mod notification;
pub mod physics;
pub mod pointer;
pub mod statechange;
