//! Device lifecycle FSM (C5) — the ten-state supervisor driving boot
//! disambiguation, idle/active operation, and the prepare→terminal
//! sequences for sleep/reboot/shutdown.
//!
//! Table-driven engine: `on_enter` runs once on transition, `on_update`
//! runs every tick and may request the next transition. `on_enter` bodies
//! are permitted to block — several states have a fixed-duration wait
//! embedded directly in their entry action (the 3s setup delay, the
//! `GAP_MS` prepare→terminal gap). Transitions requested by an incoming
//! request (sleep/reboot/shutdown/power-on triggers) go through the same
//! `transition_to` path as ones `on_update` requests, so `on_enter`
//! always runs exactly once regardless of what caused entry.

use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::adapters::Adapters;
use crate::button::ButtonCell;
use crate::config::SupervisorTimings;
use crate::events::EventBus;
use crate::model::{ButtonState, DeviceState, EventKind, IdleAction, Request, RequestKind};
use crate::queue::RequestQueue;

/// Cadence of the lifecycle main loop's per-iteration yields (two per
/// iteration: one after the state body, one after the request drain —
/// mirrors the original's `vTaskDelay(1)` between phases).
const TICK_YIELD: Duration = Duration::from_millis(1);

/// State shared between the lifecycle task and the public façade.
///
/// Owned exclusively by the lifecycle task except for `idle_timeout_ms`,
/// which the façade's `idle_get_timeout()` reads directly without a
/// request round-trip — a plain, race-free scalar read, since the
/// lifecycle task is still its sole writer.
pub struct SupervisorState {
    current: AtomicU8,
    idle_timeout_ms: AtomicU32,
    last_activity_ms: AtomicU64,
}

impl SupervisorState {
    pub(crate) fn from_timings(timings: &SupervisorTimings) -> Self {
        Self {
            current: AtomicU8::new(DeviceState::Init as u8),
            idle_timeout_ms: AtomicU32::new(timings.idle_timeout_min_ms),
            last_activity_ms: AtomicU64::new(0),
        }
    }

    pub fn current(&self) -> DeviceState {
        DeviceState::from_index(self.current.load(Ordering::Acquire) as usize)
    }

    fn set_current(&self, state: DeviceState) {
        self.current.store(state as u8, Ordering::Release);
    }

    /// Non-blocking read of the idle timeout, used by `idle_get_timeout()`.
    pub fn idle_timeout_ms(&self) -> u32 {
        self.idle_timeout_ms.load(Ordering::Acquire)
    }
}

/// Lifecycle-task-owned context. `SupervisorState` fields are reachable
/// through `state` for the parts the façade also needs to see.
struct Context {
    state: Arc<SupervisorState>,
    adapters: Arc<Adapters>,
    bus: Arc<EventBus>,
    queue: RequestQueue,
    button: Arc<ButtonCell>,
    timings: SupervisorTimings,

    active_lock_count: u32,
    idle_expired_action: IdleAction,
    idle_expired_event_latch: bool,
    shutdown_called: bool,

    boot: Instant,
    state_entered_at: Instant,
}

impl Context {
    fn now_ms(&self) -> u64 {
        self.boot.elapsed().as_millis() as u64
    }

    fn ticks_in_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    fn mark_activity(&self) {
        self.state
            .last_activity_ms
            .store(self.now_ms(), Ordering::Release);
    }

    fn emit(&self, kind: EventKind) {
        if let Err(e) = self.bus.emit_simple(kind) {
            warn!("failed to emit {kind:?}: {e}");
        }
    }

    fn gap(&self) {
        std::thread::sleep(Duration::from_millis(u64::from(self.timings.gap_ms)));
    }

    /// Invoke the `shutdown` adapter at most once. `shutdown()` is
    /// treated as non-returning in practice, but a host under test may
    /// let control flow fall back through — without this latch the
    /// surrounding loop would call it again on every subsequent tick.
    fn call_shutdown_once(&mut self) {
        if !self.shutdown_called {
            self.shutdown_called = true;
            self.adapters.call_shutdown();
        }
    }

    /// Move to `target`, running its `on_enter` exactly once. A
    /// transition to the state already current is a no-op — this is how
    /// `on_update`'s steady-state `Some(current)` return (used by states
    /// whose body runs every tick regardless of whether it just entered,
    /// like `OFF_CHARGER`) avoids re-running `on_enter`.
    fn transition_to(&mut self, target: DeviceState) {
        let current = self.state.current();
        if target == current {
            return;
        }
        info!("lifecycle: {current} -> {target}");
        self.state.set_current(target);
        self.state_entered_at = Instant::now();
        on_enter(self, target);
    }
}

/// Runs the lifecycle FSM forever on the calling thread. The caller
/// (`supervisor::PowerManagement::init`) spawns this onto its own thread.
pub fn run(
    state: Arc<SupervisorState>,
    adapters: Arc<Adapters>,
    bus: Arc<EventBus>,
    queue: RequestQueue,
    button: Arc<ButtonCell>,
    timings: SupervisorTimings,
) {
    let mut ctx = Context {
        state,
        adapters,
        bus,
        queue,
        button,
        timings,
        active_lock_count: 0,
        idle_expired_action: IdleAction::None,
        idle_expired_event_latch: false,
        shutdown_called: false,
        boot: Instant::now(),
        state_entered_at: Instant::now(),
    };

    // Run INIT's on_enter (a no-op) for symmetry with every later
    // transition, then drive the loop purely through on_update + requests.
    on_enter(&mut ctx, DeviceState::Init);

    loop {
        let current = ctx.state.current();
        if let Some(next) = on_update(&mut ctx, current) {
            ctx.transition_to(next);
        }
        std::thread::sleep(TICK_YIELD);

        if let Some(req) = ctx.queue.try_recv_one() {
            handle_request(&mut ctx, req);
        }
        std::thread::sleep(TICK_YIELD);
    }
}

/// One-time action run when `state` becomes current.
fn on_enter(ctx: &mut Context, state: DeviceState) {
    match state {
        DeviceState::Setup => {
            ctx.adapters.call_setup();
            std::thread::sleep(Duration::from_secs(3));
            ctx.emit(EventKind::DeviceSetupFinished);
            ctx.mark_activity();
        }
        DeviceState::ShutdownPrepare => {
            ctx.emit(EventKind::DeviceShutdown);
            ctx.gap();
            ctx.adapters.call_shutdown();
        }
        DeviceState::RebootPrepare => {
            ctx.emit(EventKind::DeviceReboot);
            ctx.gap();
            ctx.adapters.call_reboot();
        }
        DeviceState::SleepPrepare => {
            ctx.emit(EventKind::DeviceSleep);
            ctx.gap();
            ctx.adapters.call_sleep();
        }
        DeviceState::Init
        | DeviceState::OffCharger
        | DeviceState::DevIdle
        | DeviceState::DevActive
        | DeviceState::Shutdown
        | DeviceState::Sleep => {}
    }
}

/// Per-tick body for the current state. Returns the next state to
/// transition to, if any.
fn on_update(ctx: &mut Context, current: DeviceState) -> Option<DeviceState> {
    match current {
        DeviceState::Init => update_init(ctx),
        DeviceState::OffCharger => update_off_charger(ctx),
        DeviceState::Setup => Some(DeviceState::DevIdle),
        DeviceState::DevIdle => update_dev_idle(ctx),
        DeviceState::DevActive => update_dev_active(ctx),
        // Prepare states call their (non-returning, in practice) terminal
        // adapter from on_enter; there is nothing left for on_update to
        // do if the process is somehow still running.
        DeviceState::ShutdownPrepare
        | DeviceState::RebootPrepare
        | DeviceState::SleepPrepare
        | DeviceState::Shutdown
        | DeviceState::Sleep => None,
    }
}

fn update_init(ctx: &mut Context) -> Option<DeviceState> {
    if ctx.adapters.read_button() || ctx.adapters.read_device_woken_up() {
        return Some(DeviceState::Setup);
    }

    if ctx.adapters.read_charger_connected() {
        ctx.adapters.call_off_charger_setup();
        std::thread::sleep(Duration::from_secs(3));
        ctx.emit(EventKind::OffCharger);
        return Some(DeviceState::OffCharger);
    }

    let waited = ctx.ticks_in_state().as_millis() as u32;
    if waited > ctx.timings.init_wait_for_button_action_ms {
        ctx.call_shutdown_once();
    }

    None
}

fn update_off_charger(ctx: &mut Context) -> Option<DeviceState> {
    if !ctx.adapters.read_charger_connected() {
        ctx.call_shutdown_once();
        return None;
    }

    ctx.adapters.call_off_charger_loop();

    if ctx.button.load() == ButtonState::LongPressed {
        return Some(DeviceState::Setup);
    }

    std::thread::sleep(Duration::from_millis(u64::from(ctx.timings.off_charger_poll_ms)));
    None
}

fn update_dev_idle(ctx: &mut Context) -> Option<DeviceState> {
    ctx.adapters.call_pmic_loop();

    if ctx.active_lock_count > 0 {
        return Some(DeviceState::DevActive);
    }

    let last_activity = ctx.state.last_activity_ms.load(Ordering::Acquire);
    let idle_for = ctx.now_ms().saturating_sub(last_activity);
    let timeout = ctx.state.idle_timeout_ms();

    if idle_for > u64::from(timeout) {
        if !ctx.idle_expired_event_latch {
            ctx.emit(EventKind::IdleTimerExpired);
            ctx.idle_expired_event_latch = true;
        }
        match ctx.idle_expired_action {
            IdleAction::Shutdown => return Some(DeviceState::ShutdownPrepare),
            IdleAction::Sleep => return Some(DeviceState::SleepPrepare),
            IdleAction::None => {}
        }
    } else {
        ctx.idle_expired_event_latch = false;
    }

    if ctx.button.load() == ButtonState::VeryLongPressed {
        std::thread::sleep(Duration::from_millis(100));
        return Some(DeviceState::RebootPrepare);
    }

    None
}

fn update_dev_active(ctx: &mut Context) -> Option<DeviceState> {
    ctx.adapters.call_pmic_loop();

    if ctx.active_lock_count == 0 {
        return Some(DeviceState::DevIdle);
    }
    None
}

/// Apply one drained request to the context. Runs after the state body
/// within the same iteration.
fn handle_request(ctx: &mut Context, req: Request) {
    match req.kind {
        RequestKind::IdleTimerReset => {
            ctx.mark_activity();
        }
        RequestKind::IdleInactivitySet => {
            let ms = clamp_idle_timeout(req.inactivity_time_ms, ctx.timings.idle_timeout_min_ms);
            if ms != req.inactivity_time_ms {
                warn!(
                    "idle timeout {}ms below minimum {}ms, clamping",
                    req.inactivity_time_ms, ctx.timings.idle_timeout_min_ms
                );
            }
            ctx.state.idle_timeout_ms.store(ms, Ordering::Release);
        }
        RequestKind::IdleExpiredActionSet => {
            ctx.idle_expired_action = req.idle_action;
        }
        RequestKind::ActiveLock => {
            ctx.active_lock_count = apply_lock_delta(ctx.active_lock_count, req.kind);
            ctx.mark_activity();
        }
        RequestKind::ActiveUnlock => {
            ctx.active_lock_count = apply_lock_delta(ctx.active_lock_count, req.kind);
            ctx.mark_activity();
        }
        RequestKind::Sleep => force_prepare(ctx, DeviceState::SleepPrepare),
        RequestKind::Reboot => force_prepare(ctx, DeviceState::RebootPrepare),
        RequestKind::Shutdown => force_prepare(ctx, DeviceState::ShutdownPrepare),
        RequestKind::PowerOn => {
            if ctx.state.current() == DeviceState::OffCharger {
                ctx.transition_to(DeviceState::Setup);
            }
            // Elsewhere: a no-op, by symmetry with the off-charger case.
        }
    }
}

/// `IDLE_INACTIVITY_SET`'s clamp rule: values below the floor are raised
/// to it, never rejected.
pub fn clamp_idle_timeout(requested_ms: u32, min_ms: u32) -> u32 {
    requested_ms.max(min_ms)
}

/// `ACTIVE_LOCK`/`ACTIVE_UNLOCK`'s counter update: increments without
/// bound, decrements clamped at zero. `kind` must be one of those two
/// variants; any other value leaves `count` unchanged.
pub fn apply_lock_delta(count: u32, kind: RequestKind) -> u32 {
    match kind {
        RequestKind::ActiveLock => count.saturating_add(1),
        RequestKind::ActiveUnlock => count.saturating_sub(1),
        _ => count,
    }
}

fn force_prepare(ctx: &mut Context, target: DeviceState) {
    match ctx.state.current() {
        DeviceState::Shutdown | DeviceState::Sleep => {}
        _ => ctx.transition_to(target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_idle_timeout_leaves_values_at_or_above_minimum_untouched() {
        assert_eq!(clamp_idle_timeout(30_000, 30_000), 30_000);
        assert_eq!(clamp_idle_timeout(60_000, 30_000), 60_000);
    }

    #[test]
    fn clamp_idle_timeout_raises_values_below_minimum() {
        assert_eq!(clamp_idle_timeout(1, 30_000), 30_000);
        assert_eq!(clamp_idle_timeout(0, 30_000), 30_000);
    }

    #[test]
    fn lock_delta_release_at_zero_stays_at_zero() {
        assert_eq!(apply_lock_delta(0, RequestKind::ActiveUnlock), 0);
    }

    #[test]
    fn lock_delta_acquire_then_release_round_trips() {
        let after_acquire = apply_lock_delta(0, RequestKind::ActiveLock);
        assert_eq!(after_acquire, 1);
        let after_release = apply_lock_delta(after_acquire, RequestKind::ActiveUnlock);
        assert_eq!(after_release, 0);
    }
}
