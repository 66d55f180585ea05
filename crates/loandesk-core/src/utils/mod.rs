//! Utility functions for display formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{format_amount, format_date, format_optional, format_rate, truncate_string, yes_no};
