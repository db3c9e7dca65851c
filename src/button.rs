//! Button debouncer/classifier (C4).
//!
//! Polls `button_read()` at a fixed cadence from a dedicated thread and
//! turns the raw boolean line into [`ButtonState`] transitions plus
//! classified [`EventKind`] emissions. Debounce is judged against the
//! timestamp of the last raw-level change, not a running integrator.
//!
//! `button_state` is the only value shared between this task and the
//! lifecycle task; it is written only here and read only there, so a
//! plain `AtomicU8` needs no further synchronization.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::adapters::Adapters;
use crate::config::SupervisorTimings;
use crate::events::EventBus;
use crate::model::{ButtonState, EventKind, Request, RequestKind};
use crate::queue::RequestSender;

/// Poll cadence for the button task.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Shared button classification, single-writer (this task) /
/// single-reader (the lifecycle task).
pub struct ButtonCell(AtomicU8);

impl ButtonCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(ButtonState::Released as u8))
    }

    pub fn load(&self) -> ButtonState {
        ButtonState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn store(&self, state: ButtonState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

impl Default for ButtonCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal debounce/classification state, distinct from the
/// publicly-shared [`ButtonState`] in that it also tracks the raw level
/// and the timestamp of the last edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Released,
    DebounceWait { since: Instant },
    Pressed { since: Instant },
    LongPressed { since: Instant },
    VeryLongPressed,
}

struct Classifier {
    phase: Phase,
    timings: SupervisorTimings,
}

impl Classifier {
    fn new(timings: SupervisorTimings) -> Self {
        Self {
            phase: Phase::Released,
            timings,
        }
    }

    /// Advance the classifier by one raw sample. Emits zero or more
    /// events onto the bus and returns the resulting [`ButtonState`].
    fn tick(&mut self, now: Instant, raw_pressed: bool, bus: &EventBus) -> ButtonState {
        match self.phase {
            Phase::Released => {
                if raw_pressed {
                    self.phase = Phase::DebounceWait { since: now };
                }
                ButtonState::Released
            }

            Phase::DebounceWait { since } => {
                if !raw_pressed {
                    self.phase = Phase::Released;
                    return ButtonState::Released;
                }
                if now.duration_since(since).as_millis() as u32 >= self.timings.debounce_ms {
                    // Keep the original raw-edge timestamp rather than
                    // re-anchoring at debounce completion: long/very-long
                    // press durations are measured since the press edge,
                    // not since the button was first classified `Pressed`.
                    self.phase = Phase::Pressed { since };
                    let _ = bus.emit_simple(EventKind::ButtonPressed);
                    ButtonState::Pressed
                } else {
                    ButtonState::Released
                }
            }

            Phase::Pressed { since } => {
                if !raw_pressed {
                    self.phase = Phase::Released;
                    let _ = bus.emit_simple(EventKind::ButtonReleased);
                    let _ = bus.emit_simple(EventKind::ButtonClicked);
                    return ButtonState::Released;
                }
                let held_ms = now.duration_since(since).as_millis() as u32;
                if held_ms >= self.timings.long_press_ms {
                    self.phase = Phase::LongPressed { since };
                    let _ = bus.emit_simple(EventKind::ButtonLongPressed);
                    ButtonState::LongPressed
                } else {
                    ButtonState::Pressed
                }
            }

            Phase::LongPressed { since } => {
                if !raw_pressed {
                    self.phase = Phase::Released;
                    let _ = bus.emit_simple(EventKind::ButtonReleased);
                    return ButtonState::Released;
                }
                let held_ms = now.duration_since(since).as_millis() as u32;
                if held_ms >= self.timings.very_long_press_ms {
                    self.phase = Phase::VeryLongPressed;
                    let _ = bus.emit_simple(EventKind::ButtonVeryLongPressed);
                    ButtonState::VeryLongPressed
                } else {
                    ButtonState::LongPressed
                }
            }

            Phase::VeryLongPressed => {
                if !raw_pressed {
                    self.phase = Phase::Released;
                    let _ = bus.emit_simple(EventKind::ButtonReleased);
                    return ButtonState::Released;
                }
                ButtonState::VeryLongPressed
            }
        }
    }
}

/// Spawn the button polling task. Runs until the process exits; there is
/// no cancellation.
///
/// `requests` refreshes `last_activity_ms` once per tick while the button
/// is in any pressed sub-state (`Pressed`/`LongPressed`/`VeryLongPressed`)
/// — held buttons must keep suppressing idle-expiry the whole time they're
/// down, not just at the press/release edges. Uses `try_send` rather than
/// the budgeted `send`: at a ~1ms poll cadence this task cannot afford to
/// block waiting for queue room.
pub fn spawn(
    adapters: Arc<Adapters>,
    bus: Arc<EventBus>,
    state: Arc<ButtonCell>,
    requests: RequestSender,
    timings: SupervisorTimings,
) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name("button-task".into())
        .spawn(move || {
            let mut classifier = Classifier::new(timings);
            loop {
                let raw = adapters.read_button();
                let next = classifier.tick(Instant::now(), raw, &bus);
                state.store(next);
                if matches!(
                    next,
                    ButtonState::Pressed | ButtonState::LongPressed | ButtonState::VeryLongPressed
                ) {
                    requests.try_send(Request::simple(RequestKind::IdleTimerReset));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        })
        .expect("failed to spawn button task")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;

    fn timings() -> SupervisorTimings {
        SupervisorTimings {
            debounce_ms: 50,
            long_press_ms: 5_000,
            very_long_press_ms: 10_000,
            ..Default::default()
        }
    }

    #[test]
    fn no_transition_without_press() {
        let bus = EventBus::new();
        let mut c = Classifier::new(timings());
        let t0 = Instant::now();
        assert_eq!(c.tick(t0, false, &bus), ButtonState::Released);
        assert_eq!(
            c.tick(t0 + Duration::from_millis(100), false, &bus),
            ButtonState::Released
        );
    }

    #[test]
    fn debounce_filters_rapid_release() {
        let bus = EventBus::new();
        let mut c = Classifier::new(timings());
        let t0 = Instant::now();
        assert_eq!(c.tick(t0, true, &bus), ButtonState::Released);
        // released before debounce window elapses: never counted as a press
        assert_eq!(
            c.tick(t0 + Duration::from_millis(20), false, &bus),
            ButtonState::Released
        );
    }

    #[test]
    fn held_past_debounce_becomes_pressed_then_released_yields_click() {
        let bus = EventBus::new();
        let mut c = Classifier::new(timings());
        let t0 = Instant::now();
        c.tick(t0, true, &bus);
        assert_eq!(
            c.tick(t0 + Duration::from_millis(60), true, &bus),
            ButtonState::Pressed
        );
        assert_eq!(
            c.tick(t0 + Duration::from_millis(200), false, &bus),
            ButtonState::Released
        );
    }

    #[test]
    fn reaches_long_pressed_then_very_long_pressed() {
        let bus = EventBus::new();
        let mut c = Classifier::new(timings());
        let t0 = Instant::now();
        c.tick(t0, true, &bus);
        assert_eq!(
            c.tick(t0 + Duration::from_millis(60), true, &bus),
            ButtonState::Pressed
        );
        assert_eq!(
            c.tick(t0 + Duration::from_millis(5_100), true, &bus),
            ButtonState::LongPressed
        );
        assert_eq!(
            c.tick(t0 + Duration::from_millis(10_100), true, &bus),
            ButtonState::VeryLongPressed
        );
    }

    #[test]
    fn long_press_duration_is_measured_from_the_raw_press_edge() {
        // debounce_ms = 50, long_press_ms = 5_000 (see `timings()`). The
        // raw edge lands at t0; debounce only completes at t0+50ms. If
        // the long-press clock were re-anchored at debounce completion
        // instead of the edge, t0+5_040ms would still read `Pressed`
        // (5_040 - 50 = 4_990ms < 5_000ms since re-anchoring). Measured
        // from the edge it must already read `LongPressed`
        // (5_040ms >= 5_000ms).
        let bus = EventBus::new();
        let mut c = Classifier::new(timings());
        let t0 = Instant::now();
        c.tick(t0, true, &bus);
        c.tick(t0 + Duration::from_millis(60), true, &bus);
        assert_eq!(
            c.tick(t0 + Duration::from_millis(5_040), true, &bus),
            ButtonState::LongPressed
        );
    }
}
