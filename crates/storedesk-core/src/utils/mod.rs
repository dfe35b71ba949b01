//! Utility functions for formatting values in tables and detail views.

pub mod format;

pub use format::{format_date, format_optional, format_price, truncate_string};
