//! Local typing presence state machine.
//!
//! Pure and side-effect-free: the caller feeds keystrokes and idle-check
//! firings in, and executes the returned [`TypingAction`]s (publishing
//! events, arming or cancelling the single idle-check timer).
//!
//! ```text
//!            Keystroke                         IdleCheck (window elapsed)
//!   Idle ─────────────────────► Active ──────────────────────────────► Idle
//!        PublishTyping              │   PublishStopTyping
//!        ArmIdleCheck(window)       │
//!                                   │ IdleCheck (window not elapsed)
//!                                   └──► ArmIdleCheck(remaining)
//! ```
//!
//! Keystrokes while `Active` only record their timestamp. The one armed
//! check re-arms itself for the remaining time when it fires early, so
//! exactly one check is pending while `Active` and none while `Idle`, no
//! matter how fast the user types.

use std::time::{Duration, Instant};

/// Inactivity window after which typing stops.
pub const DEFAULT_IDLE_WINDOW: Duration = Duration::from_millis(3000);

/// Typing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Active { last_keystroke: Instant },
}

/// Local typing state for the open conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingState {
    window: Duration,
    phase: Phase,
}

impl TypingState {
    /// Create an idle state with the given inactivity window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            phase: Phase::Idle,
        }
    }

    /// Process an event and return the new state plus actions to execute.
    pub fn on_event(self, event: TypingEvent) -> (Self, Vec<TypingAction>) {
        let window = self.window;
        let (phase, actions) = match (self.phase, event) {
            (Phase::Idle, TypingEvent::Keystroke { at }) => (
                Phase::Active { last_keystroke: at },
                vec![
                    TypingAction::PublishTyping,
                    TypingAction::ArmIdleCheck { delay: window },
                ],
            ),
            (Phase::Active { .. }, TypingEvent::Keystroke { at }) => {
                (Phase::Active { last_keystroke: at }, vec![])
            }

            (Phase::Active { last_keystroke }, TypingEvent::IdleCheck { at }) => {
                let elapsed = at.saturating_duration_since(last_keystroke);
                if elapsed >= window {
                    (Phase::Idle, vec![TypingAction::PublishStopTyping])
                } else {
                    (
                        Phase::Active { last_keystroke },
                        vec![TypingAction::ArmIdleCheck {
                            delay: window - elapsed,
                        }],
                    )
                }
            }
            // A check that outlived its burst
            (Phase::Idle, TypingEvent::IdleCheck { .. }) => (Phase::Idle, vec![]),

            // Stop typing goes out before the message, whatever the phase.
            (Phase::Active { .. }, TypingEvent::Submitted) => (
                Phase::Idle,
                vec![
                    TypingAction::CancelIdleCheck,
                    TypingAction::PublishStopTyping,
                ],
            ),
            (Phase::Idle, TypingEvent::Submitted) => {
                (Phase::Idle, vec![TypingAction::PublishStopTyping])
            }

            (Phase::Active { .. }, TypingEvent::Reset) => {
                (Phase::Idle, vec![TypingAction::CancelIdleCheck])
            }
            (Phase::Idle, TypingEvent::Reset) => (Phase::Idle, vec![]),
        };
        (Self { window, phase }, actions)
    }

    /// Check if the local user is currently typing.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active { .. })
    }

    /// The inactivity window.
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for TypingState {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_WINDOW)
    }
}

/// Inputs to the typing state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingEvent {
    /// Content was entered into the compose buffer.
    Keystroke {
        /// When the keystroke happened.
        at: Instant,
    },
    /// The armed idle check fired.
    IdleCheck {
        /// When the check fired.
        at: Instant,
    },
    /// Enter was pressed with non-empty content.
    Submitted,
    /// The conversation was deselected or the engine shut down.
    Reset,
}

/// Actions for the caller to execute, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingAction {
    /// Publish `typing` for the open conversation.
    PublishTyping,
    /// Publish `stop typing` for the open conversation.
    PublishStopTyping,
    /// Arm the idle check to fire after `delay`.
    ArmIdleCheck {
        /// Time until the check fires.
        delay: Duration,
    },
    /// Disarm the pending idle check.
    CancelIdleCheck,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Drive the machine and collect all actions.
    fn run(state: TypingState, events: &[TypingEvent]) -> (TypingState, Vec<TypingAction>) {
        let mut state = state;
        let mut all = Vec::new();
        for event in events {
            let (next, actions) = state.on_event(*event);
            state = next;
            all.extend(actions);
        }
        (state, all)
    }

    // ===========================================
    // Burst Tests
    // ===========================================

    #[test]
    fn first_keystroke_publishes_typing_and_arms_check() {
        let t0 = Instant::now();
        let (state, actions) = TypingState::default().on_event(TypingEvent::Keystroke { at: t0 });

        assert!(state.is_active());
        assert_eq!(
            actions,
            vec![
                TypingAction::PublishTyping,
                TypingAction::ArmIdleCheck { delay: ms(3000) },
            ]
        );
    }

    #[test]
    fn further_keystrokes_publish_and_arm_nothing() {
        let t0 = Instant::now();
        let (_, actions) = run(
            TypingState::default(),
            &[
                TypingEvent::Keystroke { at: t0 },
                TypingEvent::Keystroke { at: t0 + ms(100) },
                TypingEvent::Keystroke { at: t0 + ms(200) },
            ],
        );

        let typing = actions
            .iter()
            .filter(|a| **a == TypingAction::PublishTyping)
            .count();
        let arms = actions
            .iter()
            .filter(|a| matches!(a, TypingAction::ArmIdleCheck { .. }))
            .count();
        assert_eq!(typing, 1);
        assert_eq!(arms, 1);
    }

    #[test]
    fn check_after_silent_window_stops_typing() {
        let t0 = Instant::now();
        let (state, actions) = run(
            TypingState::default(),
            &[
                TypingEvent::Keystroke { at: t0 },
                TypingEvent::IdleCheck { at: t0 + ms(3000) },
            ],
        );

        assert!(!state.is_active());
        assert_eq!(actions.last(), Some(&TypingAction::PublishStopTyping));
    }

    #[test]
    fn early_check_rearms_for_remaining_time() {
        // Keystrokes at 0, 500, 1000, 1500; first check fires at 3000
        let t0 = Instant::now();
        let (state, _) = run(
            TypingState::default(),
            &[
                TypingEvent::Keystroke { at: t0 },
                TypingEvent::Keystroke { at: t0 + ms(500) },
                TypingEvent::Keystroke { at: t0 + ms(1000) },
                TypingEvent::Keystroke { at: t0 + ms(1500) },
            ],
        );

        let (state, actions) = state.on_event(TypingEvent::IdleCheck { at: t0 + ms(3000) });
        assert!(state.is_active());
        assert_eq!(actions, vec![TypingAction::ArmIdleCheck { delay: ms(1500) }]);

        let (state, actions) = state.on_event(TypingEvent::IdleCheck { at: t0 + ms(4500) });
        assert!(!state.is_active());
        assert_eq!(actions, vec![TypingAction::PublishStopTyping]);
    }

    #[test]
    fn stale_check_while_idle_is_ignored() {
        let (state, actions) =
            TypingState::default().on_event(TypingEvent::IdleCheck { at: Instant::now() });
        assert!(!state.is_active());
        assert!(actions.is_empty());
    }

    #[test]
    fn new_burst_after_stop_publishes_typing_again() {
        let t0 = Instant::now();
        let (state, actions) = run(
            TypingState::default(),
            &[
                TypingEvent::Keystroke { at: t0 },
                TypingEvent::IdleCheck { at: t0 + ms(3000) },
                TypingEvent::Keystroke { at: t0 + ms(5000) },
            ],
        );

        assert!(state.is_active());
        let typing = actions
            .iter()
            .filter(|a| **a == TypingAction::PublishTyping)
            .count();
        assert_eq!(typing, 2);
    }

    // ===========================================
    // Submit / Reset Tests
    // ===========================================

    #[test]
    fn submit_while_active_cancels_then_stops() {
        let t0 = Instant::now();
        let (state, _) = TypingState::default().on_event(TypingEvent::Keystroke { at: t0 });
        let (state, actions) = state.on_event(TypingEvent::Submitted);

        assert!(!state.is_active());
        assert_eq!(
            actions,
            vec![
                TypingAction::CancelIdleCheck,
                TypingAction::PublishStopTyping,
            ]
        );
    }

    #[test]
    fn submit_while_idle_still_stops() {
        let (_, actions) = TypingState::default().on_event(TypingEvent::Submitted);
        assert_eq!(actions, vec![TypingAction::PublishStopTyping]);
    }

    #[test]
    fn reset_disarms_without_publishing() {
        let t0 = Instant::now();
        let (state, _) = TypingState::default().on_event(TypingEvent::Keystroke { at: t0 });
        let (state, actions) = state.on_event(TypingEvent::Reset);

        assert!(!state.is_active());
        assert_eq!(actions, vec![TypingAction::CancelIdleCheck]);

        let (_, actions) = state.on_event(TypingEvent::Reset);
        assert!(actions.is_empty());
    }

    #[test]
    fn custom_window_is_respected() {
        let t0 = Instant::now();
        let (state, actions) =
            TypingState::new(ms(500)).on_event(TypingEvent::Keystroke { at: t0 });
        assert_eq!(actions[1], TypingAction::ArmIdleCheck { delay: ms(500) });
        assert_eq!(state.window(), ms(500));

        let (state, _) = state.on_event(TypingEvent::IdleCheck { at: t0 + ms(500) });
        assert!(!state.is_active());
    }
}
