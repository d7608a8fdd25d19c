//! Utility functions module
//!
//! Pure helpers shared by the session core and the HTTP layer.

pub mod format;
pub mod signals;
pub mod validation;

// Re-export main functions
pub use format::format_time;
pub use signals::shutdown_signal;
pub use validation::{confirm_set_count, RestDuration, SetCountInput};
