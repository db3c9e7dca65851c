//! Public API façade (C6).
//!
//! Thin translation layer: every client-facing method either assigns an
//! adapter pointer (before `init`) or enqueues a [`Request`] (after
//! `init`). No method here mutates lifecycle state directly — that
//! discipline is what keeps the lifecycle task's state single-writer.

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::adapters::Adapters;
use crate::button::{self, ButtonCell};
use crate::config::SupervisorTimings;
use crate::error::Result;
use crate::events::{EventBus, HandlerId};
use crate::lifecycle::{self, SupervisorState};
use crate::model::{DeviceState, EventKind, EventPayload, IdleAction, Request, RequestKind};
use crate::queue::{RequestQueue, RequestSender};

/// The power management supervisor. Construct with [`PowerManagement::new`],
/// assign all ten adapters via the `set_*` methods, then call
/// [`PowerManagement::init`] exactly once.
pub struct PowerManagement {
    adapters: Adapters,
    timings: SupervisorTimings,
}

impl PowerManagement {
    pub fn new(timings: SupervisorTimings) -> Self {
        Self {
            adapters: Adapters::new(),
            timings,
        }
    }

    // -- Adapter setters (C1) -----------------------------------------

    pub fn set_setup(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.adapters.set_setup(cb);
    }

    pub fn set_sleep(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.adapters.set_sleep(cb);
    }

    pub fn set_reboot(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.adapters.set_reboot(cb);
    }

    pub fn set_shutdown(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.adapters.set_shutdown(cb);
    }

    pub fn set_off_charger_setup(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.adapters.set_off_charger_setup(cb);
    }

    pub fn set_off_charger_loop(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.adapters.set_off_charger_loop(cb);
    }

    pub fn set_pmic_loop(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.adapters.set_pmic_loop(cb);
    }

    pub fn set_button_read(&mut self, cb: impl Fn() -> bool + Send + Sync + 'static) {
        self.adapters.set_button_read(cb);
    }

    pub fn set_charger_connected(&mut self, cb: impl Fn() -> bool + Send + Sync + 'static) {
        self.adapters.set_charger_connected(cb);
    }

    pub fn set_device_woken_up(&mut self, cb: impl Fn() -> bool + Send + Sync + 'static) {
        self.adapters.set_device_woken_up(cb);
    }

    // -- Initialization --------------------------------------------------

    /// Asserts every adapter is set, builds the request queue and event
    /// bus, and spawns the button and lifecycle tasks. Returns a
    /// [`Handle`] for client interaction.
    ///
    /// # Errors
    ///
    /// Returns `Err(Error::MissingAdapter)` if any of the ten adapters was
    /// never set.
    pub fn init(self) -> Result<Handle> {
        self.adapters.assert_complete()?;

        let adapters = Arc::new(self.adapters);
        let bus = Arc::new(EventBus::new());
        let button_state = Arc::new(ButtonCell::new());
        let state = Arc::new(SupervisorState::from_timings(&self.timings));
        let queue = RequestQueue::with_capacity(self.timings.requests_queue_size);
        let sender = queue.sender();

        let button_handle = button::spawn(
            Arc::clone(&adapters),
            Arc::clone(&bus),
            Arc::clone(&button_state),
            sender.clone(),
            self.timings,
        );

        let lifecycle_state = Arc::clone(&state);
        let lifecycle_adapters = Arc::clone(&adapters);
        let lifecycle_bus = Arc::clone(&bus);
        let lifecycle_button = Arc::clone(&button_state);
        let timings = self.timings;
        let lifecycle_handle = std::thread::Builder::new()
            .name("lifecycle-task".into())
            .spawn(move || {
                lifecycle::run(
                    lifecycle_state,
                    lifecycle_adapters,
                    lifecycle_bus,
                    queue,
                    lifecycle_button,
                    timings,
                );
            })
            .expect("failed to spawn lifecycle task");

        Ok(Handle {
            state,
            bus,
            sender,
            _button_task: button_handle,
            _lifecycle_task: lifecycle_handle,
        })
    }
}

/// Live handle to a running supervisor. Every method either enqueues a
/// request or reads a lock-free scalar; none of them block longer than
/// the request queue's nominal 10ms enqueue budget.
pub struct Handle {
    state: Arc<SupervisorState>,
    bus: Arc<EventBus>,
    sender: RequestSender,
    _button_task: JoinHandle<()>,
    _lifecycle_task: JoinHandle<()>,
}

impl Handle {
    /// Current device lifecycle state.
    pub fn state(&self) -> DeviceState {
        self.state.current()
    }

    // -- Idle timer --------------------------------------------------

    pub fn idle_reset_timer(&self) {
        self.sender.send(Request::simple(RequestKind::IdleTimerReset));
    }

    pub fn idle_set_timeout(&self, timeout_ms: u32) {
        self.sender.send(Request::idle_inactivity_set(timeout_ms));
    }

    /// Non-blocking read of the current idle timeout.
    pub fn idle_get_timeout(&self) -> u32 {
        self.state.idle_timeout_ms()
    }

    pub fn idle_set_expired_action(&self, action: IdleAction) {
        self.sender.send(Request::idle_expired_action_set(action));
    }

    // -- Active lock --------------------------------------------------

    pub fn active_lock_acquire(&self) {
        self.sender.send(Request::simple(RequestKind::ActiveLock));
    }

    pub fn active_lock_release(&self) {
        self.sender.send(Request::simple(RequestKind::ActiveUnlock));
    }

    // -- Direct triggers --------------------------------------------------

    pub fn trigger_sleep(&self) {
        self.sender.send(Request::simple(RequestKind::Sleep));
    }

    pub fn trigger_reboot(&self) {
        self.sender.send(Request::simple(RequestKind::Reboot));
    }

    pub fn trigger_shutdown(&self) {
        self.sender.send(Request::simple(RequestKind::Shutdown));
    }

    /// Only takes effect while the device is in `OFF_CHARGER`.
    pub fn trigger_power_on(&self) {
        self.sender.send(Request::simple(RequestKind::PowerOn));
    }

    // -- Events (C2 passthrough) --------------------------------------------------

    pub fn emit_event(&self, kind: EventKind, payload: EventPayload) -> Result<()> {
        self.bus.emit(kind, payload)
    }

    pub fn register_event_handler(
        &self,
        kind: EventKind,
        handler: impl Fn(EventKind, &EventPayload) + Send + Sync + 'static,
    ) -> Result<HandlerId> {
        self.bus.register(kind, handler)
    }

    pub fn deregister_event_handler(&self, kind: EventKind, id: HandlerId) -> Result<()> {
        self.bus.deregister(kind, id)
    }
}
