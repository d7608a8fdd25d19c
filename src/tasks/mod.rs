//! Background tasks module
//!
//! Timers and workers that run alongside the HTTP server and report back
//! to the session through channels.

pub mod auto_dismiss;
pub mod countdown;
pub mod persistence;
pub mod session_events;

// Re-export main functions
pub use auto_dismiss::DismissHandle;
pub use countdown::CountdownHandle;
pub use persistence::persistence_task;
pub use session_events::session_event_task;
