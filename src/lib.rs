//! Set Counter - a workout set counter with a rest countdown
//!
//! Counting a set starts a rest countdown; when it runs out a "next set"
//! notification shows for a few seconds. The counter survives restarts
//! through a small JSON store, and a presentation layer drives everything
//! over HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::SessionError;
pub use state::{AppState, SessionController, SessionSnapshot, TimerStatus};
pub use utils::signals::shutdown_signal;
