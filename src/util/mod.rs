//! Shared helpers with no dependencies on application state.

pub mod text;

pub use text::{
    date_sort_key, format_clock_time, format_short_date, parse_date_flexible, split_keywords,
    strip_control_chars, truncate_to_width,
};
