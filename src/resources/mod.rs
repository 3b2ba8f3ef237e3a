//! ECS resources shared by the companion systems.
//!
//! Overview
//! - `companionconfig` – tunables loaded from an INI file
//! - `eventinbox` – cross-thread queue of external events
//! - `frameclock` – host delta filtering, visibility and redraw requests
//! - `interactionstats` – click, pet, throw and grab counters
//! - `itemregistry` – scene item ids and their entities
//! - `rng` – seedable random source
//! - `viewport` – surface size, floor height, screen/world conversion
//! - `worldtime` – simulation time and delta
pub mod companionconfig;
pub mod eventinbox;
pub mod frameclock;
pub mod interactionstats;
pub mod itemregistry;
pub mod rng;
pub mod viewport;
pub mod worldtime;
