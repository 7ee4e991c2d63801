//! Derived metrics computed from activity records.
//!
//! Pure functions; nothing here touches the remote gateway.

pub mod streak;
pub mod weekly;

pub use streak::current_streak;
pub use weekly::{weekly_histogram, DAYS_PER_WEEK};
