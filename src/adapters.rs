//! Host adapter registry — the hexagonal boundary between the supervisor
//! and the application it runs inside.
//!
//! ```text
//!   Host application ──▶ Adapters ──▶ PowerManagement (domain)
//! ```
//!
//! The original ten free-function pointers become ten boxed closures held
//! in one record, assigned through [`crate::supervisor::PowerManagement`]'s
//! setter methods before `init()`. The domain core never touches hardware
//! directly — everything it knows about the physical device comes through
//! this registry.

use crate::error::{Error, Result};

pub type SetupFn = Box<dyn Fn() + Send + Sync>;
pub type SleepFn = Box<dyn Fn() + Send + Sync>;
pub type RebootFn = Box<dyn Fn() + Send + Sync>;
pub type ShutdownFn = Box<dyn Fn() + Send + Sync>;
pub type OffChargerSetupFn = Box<dyn Fn() + Send + Sync>;
pub type OffChargerLoopFn = Box<dyn Fn() + Send + Sync>;
pub type PmicLoopFn = Box<dyn Fn() + Send + Sync>;
pub type ButtonReadFn = Box<dyn Fn() -> bool + Send + Sync>;
pub type ChargerConnectedFn = Box<dyn Fn() -> bool + Send + Sync>;
pub type DeviceWokenUpFn = Box<dyn Fn() -> bool + Send + Sync>;

/// Holds the ten host callbacks. Populated one setter at a time
/// (mirrors the original `power_management_set_*_cb` free functions),
/// then validated by [`Adapters::assert_complete`] in `init()`.
#[derive(Default)]
pub struct Adapters {
    pub(crate) setup: Option<SetupFn>,
    pub(crate) sleep: Option<SleepFn>,
    pub(crate) reboot: Option<RebootFn>,
    pub(crate) shutdown: Option<ShutdownFn>,
    pub(crate) off_charger_setup: Option<OffChargerSetupFn>,
    pub(crate) off_charger_loop: Option<OffChargerLoopFn>,
    pub(crate) pmic_loop: Option<PmicLoopFn>,
    pub(crate) button_read: Option<ButtonReadFn>,
    pub(crate) charger_connected: Option<ChargerConnectedFn>,
    pub(crate) device_woken_up: Option<DeviceWokenUpFn>,
}

impl Adapters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_setup(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.setup = Some(Box::new(cb));
    }

    pub fn set_sleep(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.sleep = Some(Box::new(cb));
    }

    pub fn set_reboot(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.reboot = Some(Box::new(cb));
    }

    pub fn set_shutdown(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.shutdown = Some(Box::new(cb));
    }

    pub fn set_off_charger_setup(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.off_charger_setup = Some(Box::new(cb));
    }

    pub fn set_off_charger_loop(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.off_charger_loop = Some(Box::new(cb));
    }

    pub fn set_pmic_loop(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.pmic_loop = Some(Box::new(cb));
    }

    pub fn set_button_read(&mut self, cb: impl Fn() -> bool + Send + Sync + 'static) {
        self.button_read = Some(Box::new(cb));
    }

    pub fn set_charger_connected(&mut self, cb: impl Fn() -> bool + Send + Sync + 'static) {
        self.charger_connected = Some(Box::new(cb));
    }

    pub fn set_device_woken_up(&mut self, cb: impl Fn() -> bool + Send + Sync + 'static) {
        self.device_woken_up = Some(Box::new(cb));
    }

    /// `init()` precondition: every adapter must be set. Returns the name
    /// of the first missing one, matching the original's documented
    /// requirement that all ten callbacks be assigned before
    /// `power_management_init()`.
    pub fn assert_complete(&self) -> Result<()> {
        if self.setup.is_none() {
            return Err(Error::MissingAdapter("setup"));
        }
        if self.sleep.is_none() {
            return Err(Error::MissingAdapter("sleep"));
        }
        if self.reboot.is_none() {
            return Err(Error::MissingAdapter("reboot"));
        }
        if self.shutdown.is_none() {
            return Err(Error::MissingAdapter("shutdown"));
        }
        if self.off_charger_setup.is_none() {
            return Err(Error::MissingAdapter("off_charger_setup"));
        }
        if self.off_charger_loop.is_none() {
            return Err(Error::MissingAdapter("off_charger_loop"));
        }
        if self.pmic_loop.is_none() {
            return Err(Error::MissingAdapter("pmic_loop"));
        }
        if self.button_read.is_none() {
            return Err(Error::MissingAdapter("button_read"));
        }
        if self.charger_connected.is_none() {
            return Err(Error::MissingAdapter("charger_connected"));
        }
        if self.device_woken_up.is_none() {
            return Err(Error::MissingAdapter("device_woken_up"));
        }
        Ok(())
    }

    pub(crate) fn call_setup(&self) {
        (self.setup.as_ref().expect("assert_complete checked"))();
    }

    pub(crate) fn call_sleep(&self) {
        (self.sleep.as_ref().expect("assert_complete checked"))();
    }

    pub(crate) fn call_reboot(&self) {
        (self.reboot.as_ref().expect("assert_complete checked"))();
    }

    pub(crate) fn call_shutdown(&self) {
        (self.shutdown.as_ref().expect("assert_complete checked"))();
    }

    pub(crate) fn call_off_charger_setup(&self) {
        (self
            .off_charger_setup
            .as_ref()
            .expect("assert_complete checked"))();
    }

    pub(crate) fn call_off_charger_loop(&self) {
        (self
            .off_charger_loop
            .as_ref()
            .expect("assert_complete checked"))();
    }

    pub(crate) fn call_pmic_loop(&self) {
        (self.pmic_loop.as_ref().expect("assert_complete checked"))();
    }

    pub(crate) fn read_button(&self) -> bool {
        (self.button_read.as_ref().expect("assert_complete checked"))()
    }

    pub(crate) fn read_charger_connected(&self) -> bool {
        (self
            .charger_connected
            .as_ref()
            .expect("assert_complete checked"))()
    }

    pub(crate) fn read_device_woken_up(&self) -> bool {
        (self
            .device_woken_up
            .as_ref()
            .expect("assert_complete checked"))()
    }
}
