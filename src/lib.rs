//! Power management supervisor library.
//!
//! A device-lifecycle supervisor for battery-powered embedded devices
//! with a PMIC, a single power button, and an optional external charger.
//! The host application supplies ten callbacks through [`adapters`] and
//! drives everything else through [`supervisor::PowerManagement`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod button;
pub mod config;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod model;
pub mod queue;
pub mod supervisor;

pub use error::{Error, Result};
pub use model::{ButtonState, DeviceState, EventKind, EventPayload, IdleAction};
pub use supervisor::{Handle, PowerManagement};
