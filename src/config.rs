//! Supervisor timing parameters
//!
//! All tunable timings for the lifecycle and button state machines.
//! Values can be overridden by the embedding application at construction
//! time; `Default` reproduces the documented defaults.

/// Timing and sizing tunables for a [`crate::supervisor::PowerManagement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorTimings {
    // --- Button ---
    /// Continuous raw-level duration required before `RELEASED` -> `PRESSED`.
    pub debounce_ms: u32,
    /// Press duration before `PRESSED` -> `LONG_PRESSED`.
    pub long_press_ms: u32,
    /// Press duration before `LONG_PRESSED` -> `VERY_LONG_PRESSED`.
    pub very_long_press_ms: u32,

    // --- Lifecycle ---
    /// `INIT` gives up and shuts down after this much time with no button
    /// press, no wakeup cause, and no charger.
    pub init_wait_for_button_action_ms: u32,
    /// Floor for `idle_set_timeout`; values below this are clamped.
    pub idle_timeout_min_ms: u32,
    /// Delay between emitting a prepare-state event and invoking the
    /// corresponding terminal adapter.
    pub gap_ms: u32,
    /// Poll interval for `off_charger_loop` while in `OFF_CHARGER`.
    pub off_charger_poll_ms: u32,

    // --- Queue ---
    /// Capacity of the request queue (C3).
    pub requests_queue_size: usize,
}

impl Default for SupervisorTimings {
    fn default() -> Self {
        Self {
            // Button
            debounce_ms: 50,
            long_press_ms: 5_000,
            very_long_press_ms: 10_000,

            // Lifecycle
            init_wait_for_button_action_ms: 5_000,
            idle_timeout_min_ms: 30_000,
            gap_ms: 3_000,
            off_charger_poll_ms: 100,

            // Queue
            requests_queue_size: 10,
        }
    }
}
