//! Session controller: the counter and rest-countdown state machine
//!
//! The controller is synchronous and owns no clock. Every intent or timer
//! event returns the [`Effect`]s the runtime must carry out (start or cancel
//! a countdown, schedule or cancel the auto-dismiss, persist the counter).
//! Countdown and auto-dismiss instances are tagged with independent
//! [`Generation`]s so events from a superseded instance are dropped.

use std::time::Duration;

use tracing::{debug, info};

use super::session_state::{SessionSnapshot, SessionState, TimerStatus};
use crate::{error::SessionError, utils::validation::validate_set_count};

/// Countdown tick resolution
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
/// How long the "next set" notification stays up on its own
pub const AUTO_DISMISS_DELAY: Duration = Duration::from_millis(3000);

/// Monotonic tag of a countdown or auto-dismiss instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    fn advance(&mut self) -> Generation {
        self.0 += 1;
        *self
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Timer callbacks delivered back to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Tick {
        generation: Generation,
        remaining_millis: u64,
    },
    Elapsed {
        generation: Generation,
    },
    AutoDismiss {
        generation: Generation,
    },
}

/// Side effects requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    StartCountdown {
        generation: Generation,
        duration: Duration,
        tick: Duration,
    },
    CancelCountdown {
        generation: Generation,
    },
    ScheduleDismiss {
        generation: Generation,
        delay: Duration,
    },
    CancelDismiss {
        generation: Generation,
    },
    PersistCount(u32),
}

#[derive(Debug, Clone)]
pub struct SessionController {
    state: SessionState,
    countdown_generation: Generation,
    live_countdown: Option<Generation>,
    dismiss_generation: Generation,
    pending_dismiss: Option<Generation>,
}

impl SessionController {
    pub fn new(total_sets: u32, rest_duration_millis: u64) -> Self {
        Self {
            state: SessionState::new(total_sets, rest_duration_millis),
            countdown_generation: Generation::default(),
            live_countdown: None,
            dismiss_generation: Generation::default(),
            pending_dismiss: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(&self.state)
    }

    pub fn has_live_countdown(&self) -> bool {
        self.live_countdown.is_some()
    }

    pub fn has_pending_dismiss(&self) -> bool {
        self.pending_dismiss.is_some()
    }

    /// Apply the counter value read from the store at startup
    pub fn restore_count(&mut self, count: u32) {
        info!("Restored count {} from store", count);
        self.state.count = count;
    }

    /// Count a set and start the rest countdown
    pub fn increment(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.close_notification(&mut effects);
        self.cancel_countdown(&mut effects);

        self.state.count = self.state.count.saturating_add(1);

        let generation = self.countdown_generation.advance();
        self.live_countdown = Some(generation);
        self.state.remaining_millis = self.state.rest_duration_millis;
        self.state.timer_status = TimerStatus::Running;
        effects.push(Effect::StartCountdown {
            generation,
            duration: Duration::from_millis(self.state.rest_duration_millis),
            tick: TICK_INTERVAL,
        });
        effects.push(Effect::PersistCount(self.state.count));

        info!(
            "Set {} of {} done, rest countdown #{} started",
            self.state.count,
            self.state.total_sets,
            generation.value()
        );
        effects
    }

    /// Take back one set; a no-op at zero
    pub fn decrement(&mut self) -> Vec<Effect> {
        if self.state.count == 0 {
            debug!("Decrement ignored, count already zero");
            return Vec::new();
        }

        let mut effects = Vec::new();
        self.state.count -= 1;
        self.close_notification(&mut effects);
        self.cancel_countdown(&mut effects);
        self.go_idle();
        effects.push(Effect::PersistCount(self.state.count));

        info!("Count decremented to {}", self.state.count);
        effects
    }

    pub fn reset(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.state.count = 0;
        self.close_notification(&mut effects);
        self.cancel_countdown(&mut effects);
        self.go_idle();
        effects.push(Effect::PersistCount(0));

        info!("Session reset");
        effects
    }

    /// Change the rest duration; an in-progress rest is abandoned
    pub fn configure_timer(&mut self, rest_duration_millis: u64) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.state.rest_duration_millis = rest_duration_millis;
        self.close_notification(&mut effects);
        self.cancel_countdown(&mut effects);
        self.go_idle();

        info!("Rest duration set to {} ms", rest_duration_millis);
        effects
    }

    pub fn configure_sets(&mut self, total_sets: u32) -> Result<Vec<Effect>, SessionError> {
        self.state.total_sets = validate_set_count(total_sets)?;
        info!("Target sets set to {}", total_sets);
        Ok(Vec::new())
    }

    /// User closed the notification before it went away on its own
    pub fn dismiss_notification(&mut self) -> Vec<Effect> {
        if !self.state.notification_visible {
            debug!("Dismiss ignored, no notification visible");
            return Vec::new();
        }

        let mut effects = Vec::new();
        self.close_notification(&mut effects);
        self.go_idle();
        effects
    }

    /// Apply a timer callback, dropping it if its instance is no longer current
    pub fn handle_event(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::Tick {
                generation,
                remaining_millis,
            } => {
                if !self.is_current_countdown(generation) {
                    debug!("Discarding stale tick from countdown #{}", generation.value());
                    return Vec::new();
                }
                self.state.remaining_millis = remaining_millis.min(self.state.rest_duration_millis);
                debug!("Countdown #{} at {} ms", generation.value(), self.state.remaining_millis);
                Vec::new()
            }
            SessionEvent::Elapsed { generation } => {
                if !self.is_current_countdown(generation) {
                    debug!("Discarding stale elapse from countdown #{}", generation.value());
                    return Vec::new();
                }
                self.live_countdown = None;
                self.state.remaining_millis = 0;
                self.state.timer_status = TimerStatus::Finished;
                self.state.notification_visible = true;

                let dismiss = self.dismiss_generation.advance();
                self.pending_dismiss = Some(dismiss);

                info!("Rest over, next set (countdown #{})", generation.value());
                vec![Effect::ScheduleDismiss {
                    generation: dismiss,
                    delay: AUTO_DISMISS_DELAY,
                }]
            }
            SessionEvent::AutoDismiss { generation } => {
                if self.pending_dismiss != Some(generation) || !self.state.notification_visible {
                    debug!("Discarding stale auto-dismiss #{}", generation.value());
                    return Vec::new();
                }
                self.pending_dismiss = None;
                self.state.notification_visible = false;
                self.go_idle();
                debug!("Notification auto-dismissed");
                Vec::new()
            }
        }
    }

    fn is_current_countdown(&self, generation: Generation) -> bool {
        self.state.timer_status == TimerStatus::Running && self.live_countdown == Some(generation)
    }

    fn cancel_countdown(&mut self, effects: &mut Vec<Effect>) {
        if let Some(generation) = self.live_countdown.take() {
            debug!("Cancelling countdown #{}", generation.value());
            effects.push(Effect::CancelCountdown { generation });
        }
    }

    fn close_notification(&mut self, effects: &mut Vec<Effect>) {
        self.state.notification_visible = false;
        if let Some(generation) = self.pending_dismiss.take() {
            effects.push(Effect::CancelDismiss { generation });
        }
    }

    fn go_idle(&mut self) {
        self.state.timer_status = TimerStatus::Idle;
        self.state.remaining_millis = self.state.rest_duration_millis;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn controller() -> SessionController {
        SessionController::new(10, 60_000)
    }

    fn started_generation(effects: &[Effect]) -> Generation {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::StartCountdown { generation, .. } => Some(*generation),
                _ => None,
            })
            .expect("no countdown started")
    }

    fn dismiss_generation(effects: &[Effect]) -> Generation {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::ScheduleDismiss { generation, .. } => Some(*generation),
                _ => None,
            })
            .expect("no dismiss scheduled")
    }

    #[test]
    fn test_increment_starts_countdown_and_persists() {
        let mut c = controller();
        let effects = c.increment();

        let generation = started_generation(&effects);
        assert_eq!(
            effects,
            vec![
                Effect::StartCountdown {
                    generation,
                    duration: Duration::from_millis(60_000),
                    tick: TICK_INTERVAL,
                },
                Effect::PersistCount(1),
            ]
        );
        assert_eq!(c.state().count, 1);
        assert_eq!(c.state().timer_status, TimerStatus::Running);
        assert_eq!(c.state().remaining_millis, 60_000);
        assert!(c.has_live_countdown());
    }

    #[test]
    fn test_increment_while_running_replaces_countdown() {
        let mut c = controller();
        let first = started_generation(&c.increment());
        let effects = c.increment();
        let second = started_generation(&effects);

        assert_ne!(first, second);
        assert_eq!(effects[0], Effect::CancelCountdown { generation: first });
        assert_eq!(c.state().count, 2);

        // ticks from the replaced instance no longer land
        c.handle_event(SessionEvent::Tick {
            generation: first,
            remaining_millis: 1_000,
        });
        assert_eq!(c.state().remaining_millis, 60_000);
    }

    #[test]
    fn test_tick_updates_remaining_and_text() {
        let mut c = controller();
        let generation = started_generation(&c.increment());
        c.handle_event(SessionEvent::Tick {
            generation,
            remaining_millis: 42_000,
        });
        assert_eq!(c.snapshot().timer_text, "00:42");
        assert_eq!(c.state().timer_status, TimerStatus::Running);
    }

    #[test]
    fn test_full_rest_cycle() {
        let mut c = controller();
        let generation = started_generation(&c.increment());

        let effects = c.handle_event(SessionEvent::Elapsed { generation });
        let dismiss = dismiss_generation(&effects);
        assert_eq!(
            effects,
            vec![Effect::ScheduleDismiss {
                generation: dismiss,
                delay: AUTO_DISMISS_DELAY,
            }]
        );
        assert_eq!(c.state().timer_status, TimerStatus::Finished);
        assert!(c.state().notification_visible);
        assert_eq!(c.snapshot().timer_text, "00:00");
        assert!(!c.has_live_countdown());

        c.handle_event(SessionEvent::AutoDismiss { generation: dismiss });
        assert!(!c.state().notification_visible);
        assert_eq!(c.state().timer_status, TimerStatus::Idle);
        assert_eq!(c.state().remaining_millis, 60_000);
        assert!(!c.has_live_countdown());
    }

    #[test]
    fn test_decrement_cancels_without_finish() {
        let mut c = controller();
        let generation = started_generation(&c.increment());

        let effects = c.decrement();
        assert_eq!(
            effects,
            vec![
                Effect::CancelCountdown { generation },
                Effect::PersistCount(0),
            ]
        );
        assert_eq!(c.state().count, 0);
        assert_eq!(c.state().timer_status, TimerStatus::Idle);

        let late = c.handle_event(SessionEvent::Elapsed { generation });
        assert!(late.is_empty());
        assert_eq!(c.state().timer_status, TimerStatus::Idle);
        assert!(!c.state().notification_visible);
    }

    #[test]
    fn test_decrement_at_zero_is_noop() {
        let mut c = controller();
        let before = c.state().clone();
        assert!(c.decrement().is_empty());
        assert_eq!(c.state(), &before);
    }

    proptest! {
        #[test]
        fn test_count_follows_saturating_model(steps in proptest::collection::vec(any::<bool>(), 0..200)) {
            let mut c = controller();
            let mut expected_count: u32 = 0;
            let mut expected_live = false;

            for increment in steps {
                if increment {
                    c.increment();
                    expected_count += 1;
                    expected_live = true;
                } else {
                    c.decrement();
                    if expected_count > 0 {
                        expected_count -= 1;
                        expected_live = false;
                    }
                }
                prop_assert_eq!(c.state().count, expected_count);
                prop_assert_eq!(c.has_live_countdown(), expected_live);
            }
        }
    }

    #[test]
    fn test_reset_clears_count_and_countdown() {
        let mut c = controller();
        c.increment();
        c.increment();
        let effects = c.reset();

        assert!(effects.contains(&Effect::PersistCount(0)));
        assert_eq!(c.state().count, 0);
        assert_eq!(c.state().timer_status, TimerStatus::Idle);
        assert!(!c.has_live_countdown());
    }

    #[test]
    fn test_configure_timer_abandons_rest() {
        let mut c = controller();
        let generation = started_generation(&c.increment());

        let effects = c.configure_timer(90_000);
        assert_eq!(effects, vec![Effect::CancelCountdown { generation }]);
        assert_eq!(c.state().timer_status, TimerStatus::Idle);
        assert_eq!(c.snapshot().timer_text, "01:30");
        assert!(!c.has_live_countdown());

        let next = c.increment();
        assert!(next.contains(&Effect::StartCountdown {
            generation: started_generation(&next),
            duration: Duration::from_millis(90_000),
            tick: TICK_INTERVAL,
        }));
    }

    #[test]
    fn test_configure_sets_keeps_timer_state() {
        let mut c = controller();
        c.increment();
        assert_eq!(c.configure_sets(3), Ok(Vec::new()));
        assert_eq!(c.state().total_sets, 3);
        assert_eq!(c.state().timer_status, TimerStatus::Running);
        assert_eq!(c.configure_sets(0), Err(SessionError::InvalidSetCount(0)));
        assert_eq!(c.state().total_sets, 3);
    }

    #[test]
    fn test_manual_dismiss_cancels_auto_dismiss() {
        let mut c = controller();
        let generation = started_generation(&c.increment());
        let dismiss = dismiss_generation(&c.handle_event(SessionEvent::Elapsed { generation }));

        let effects = c.dismiss_notification();
        assert_eq!(effects, vec![Effect::CancelDismiss { generation: dismiss }]);
        assert!(!c.state().notification_visible);
        assert_eq!(c.state().timer_status, TimerStatus::Idle);
        assert!(!c.has_pending_dismiss());
    }

    #[test]
    fn test_stale_auto_dismiss_spares_newer_notification() {
        let mut c = SessionController::new(10, 0);
        let first = started_generation(&c.increment());
        let old_dismiss =
            dismiss_generation(&c.handle_event(SessionEvent::Elapsed { generation: first }));
        c.dismiss_notification();

        let second = started_generation(&c.increment());
        let new_dismiss =
            dismiss_generation(&c.handle_event(SessionEvent::Elapsed { generation: second }));
        assert_ne!(old_dismiss, new_dismiss);

        c.handle_event(SessionEvent::AutoDismiss {
            generation: old_dismiss,
        });
        assert!(c.state().notification_visible);
        assert_eq!(c.state().timer_status, TimerStatus::Finished);

        c.handle_event(SessionEvent::AutoDismiss {
            generation: new_dismiss,
        });
        assert!(!c.state().notification_visible);
    }

    #[test]
    fn test_increment_during_notification_closes_it() {
        let mut c = controller();
        let generation = started_generation(&c.increment());
        let dismiss = dismiss_generation(&c.handle_event(SessionEvent::Elapsed { generation }));

        let effects = c.increment();
        assert_eq!(effects[0], Effect::CancelDismiss { generation: dismiss });
        assert!(!c.state().notification_visible);
        assert_eq!(c.state().timer_status, TimerStatus::Running);
    }

    #[test]
    fn test_dismiss_without_notification_is_noop() {
        let mut c = controller();
        assert!(c.dismiss_notification().is_empty());
    }

    #[test]
    fn test_restore_count_does_not_persist() {
        let mut c = controller();
        c.restore_count(4);
        assert_eq!(c.state().count, 4);
        assert_eq!(c.decrement(), vec![Effect::PersistCount(3)]);
    }
}
