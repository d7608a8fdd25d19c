//! Error types for the session core

use thiserror::Error;

/// Errors raised by session intents and input validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Target set count outside of [1, 99]
    #[error("set count {0} is out of range (1-99)")]
    InvalidSetCount(u32),

    /// Rest duration that no picker position can produce
    #[error("invalid rest duration {minutes}m {seconds}s (minutes 0-59, seconds 0/15/30/45)")]
    InvalidRestDuration { minutes: u32, seconds: u32 },

    /// The session mutex was poisoned by a panicking holder
    #[error("failed to lock session state: {0}")]
    StateLock(String),
}
