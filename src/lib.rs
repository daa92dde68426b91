//! Terminal client for a news-aggregation backend.
//!
//! The backend groups articles into categories, subcategories, and
//! events; this crate renders that hierarchy as a board of horizontally
//! scrolling card lanes, with an article detail modal, a 2-D similarity
//! map, stance groupings, and background update notifications.

pub mod api;
pub mod app;
pub mod config;
pub mod notify;
pub mod selection;
pub mod ui;
pub mod util;
pub mod view;
