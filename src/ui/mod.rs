//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard and mouse input handling
//! - `events` - Background task event processing
//! - `render` - View rendering dispatch and overlays
//! - `helpers` - Spawn helpers for background fetches
//! - `carousel` - Horizontal scroll and swipe-gesture logic
//! - `board` - Category tabs, subcategory bar, and event lanes
//! - `detail` - Article detail modal
//! - `map` - 2-D similarity map view
//! - `posturas` - Stance groupings view
//! - `toasts` - Update notification toasts
//! - `status` - Status bar widget

mod board;
pub mod carousel;
mod detail;
mod events;
mod helpers;
mod input;
mod loop_runner;
mod map;
mod posturas;
mod render;
mod status;
mod toasts;

// Re-export the public API
pub use loop_runner::{run, Action};
