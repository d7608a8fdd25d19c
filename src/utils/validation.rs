//! Input validation for the sets and rest-timer pickers

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

pub const MIN_SETS: u32 = 1;
pub const MAX_SETS: u32 = 99;
/// Fallback when a sets dialog is confirmed without a valid number
pub const DEFAULT_SETS: u32 = 10;

pub const MAX_REST_MINUTES: u32 = 59;
/// The only second values the seconds wheel offers
pub const REST_SECOND_STEPS: [u32; 4] = [0, 15, 30, 45];

/// Parse a set count, accepting only integers in [1, 99]
pub fn parse_set_count(input: &str) -> Option<u32> {
    input
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|n| (MIN_SETS..=MAX_SETS).contains(n))
}

/// Resolve the text of a confirmed sets dialog
pub fn confirm_set_count(input: &str) -> u32 {
    parse_set_count(input).unwrap_or(DEFAULT_SETS)
}

/// Check a set count coming from a trusted source
pub fn validate_set_count(total: u32) -> Result<u32, SessionError> {
    if (MIN_SETS..=MAX_SETS).contains(&total) {
        Ok(total)
    } else {
        Err(SessionError::InvalidSetCount(total))
    }
}

/// Edit buffer of the sets dialog, for presentation layers that validate per keystroke.
///
/// Edits that do not parse to a valid count are rejected and the
/// previous text is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetCountInput {
    text: String,
}

impl SetCountInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to replace the buffer, returns whether the edit was accepted
    pub fn edit(&mut self, text: &str) -> bool {
        if parse_set_count(text).is_some() {
            self.text = text.trim().to_string();
            true
        } else {
            false
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn confirm(&self) -> u32 {
        confirm_set_count(&self.text)
    }
}

/// Rest duration as chosen on the minute and second wheels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestDuration {
    minutes: u32,
    seconds: u32,
}

impl RestDuration {
    pub fn new(minutes: u32, seconds: u32) -> Result<Self, SessionError> {
        if minutes > MAX_REST_MINUTES || !REST_SECOND_STEPS.contains(&seconds) {
            return Err(SessionError::InvalidRestDuration { minutes, seconds });
        }
        Ok(Self { minutes, seconds })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn as_millis(&self) -> u64 {
        u64::from(self.minutes * 60 + self.seconds) * 1000
    }
}
