//! State management module
//!
//! The session state machine and the runtime that drives it.

pub mod app_state;
pub mod controller;
pub mod session_state;

// Re-export main types
pub use app_state::AppState;
pub use controller::{
    Effect, Generation, SessionController, SessionEvent, AUTO_DISMISS_DELAY, TICK_INTERVAL,
};
pub use session_state::{SessionSnapshot, SessionState, TimerStatus};
