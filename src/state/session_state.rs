//! Session state record and the snapshot handed to the presentation layer

use serde::{Deserialize, Serialize};

use crate::utils::format_time;

/// Lifecycle of the rest countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    /// No countdown active, the configured duration is displayed
    Idle,
    Running,
    /// Countdown reached zero and the "next set" notification is up
    Finished,
}

/// Everything the session controller owns besides its timer bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub count: u32,
    pub total_sets: u32,
    pub rest_duration_millis: u64,
    pub remaining_millis: u64,
    pub timer_status: TimerStatus,
    pub notification_visible: bool,
}

impl SessionState {
    /// Create an idle session showing the full rest duration
    pub fn new(total_sets: u32, rest_duration_millis: u64) -> Self {
        Self {
            count: 0,
            total_sets,
            rest_duration_millis,
            remaining_millis: rest_duration_millis,
            timer_status: TimerStatus::Idle,
            notification_visible: false,
        }
    }

    /// Share of the target sets already done, saturating at 1.0
    pub fn progress_fraction(&self) -> f64 {
        if self.total_sets == 0 {
            return 0.0;
        }
        f64::from(self.count.min(self.total_sets)) / f64::from(self.total_sets)
    }
}

/// Immutable view of a session published after every transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub count: u32,
    pub total_sets: u32,
    pub timer_text: String,
    pub timer_status: TimerStatus,
    pub notification_visible: bool,
    pub progress_fraction: f64,
    pub remaining_millis: u64,
    pub rest_duration_millis: u64,
}

impl From<&SessionState> for SessionSnapshot {
    fn from(state: &SessionState) -> Self {
        Self {
            count: state.count,
            total_sets: state.total_sets,
            timer_text: format_time(state.remaining_millis),
            timer_status: state.timer_status,
            notification_visible: state.notification_visible,
            progress_fraction: state.progress_fraction(),
            remaining_millis: state.remaining_millis,
            rest_duration_millis: state.rest_duration_millis,
        }
    }
}
