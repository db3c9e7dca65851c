//! Core data model: device/button state tags, requests, and event kinds.
//!
//! These are the wire types shared between the button task, the lifecycle
//! task, the event bus, and the public façade. None of them own behavior —
//! see `button.rs`, `lifecycle.rs`, and `events.rs` for the state machines
//! that produce and consume them.

use core::fmt;

// ---------------------------------------------------------------------------
// Device lifecycle state
// ---------------------------------------------------------------------------

/// The ten states of the device lifecycle FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceState {
    Init = 0,
    OffCharger = 1,
    Setup = 2,
    DevIdle = 3,
    DevActive = 4,
    ShutdownPrepare = 5,
    Shutdown = 6,
    RebootPrepare = 7,
    SleepPrepare = 8,
    Sleep = 9,
}

impl DeviceState {
    /// Total number of states — used to size the dispatch table.
    pub const COUNT: usize = 10;

    /// Convert a table index back to a `DeviceState`.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Init,
            1 => Self::OffCharger,
            2 => Self::Setup,
            3 => Self::DevIdle,
            4 => Self::DevActive,
            5 => Self::ShutdownPrepare,
            6 => Self::Shutdown,
            7 => Self::RebootPrepare,
            8 => Self::SleepPrepare,
            9 => Self::Sleep,
            _ => {
                debug_assert!(false, "invalid device state index: {idx}");
                Self::Shutdown
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::OffCharger => "OFF_CHARGER",
            Self::Setup => "SETUP",
            Self::DevIdle => "DEV_IDLE",
            Self::DevActive => "DEV_ACTIVE",
            Self::ShutdownPrepare => "SHUTDOWN_PREPARE",
            Self::Shutdown => "SHUTDOWN",
            Self::RebootPrepare => "REBOOT_PREPARE",
            Self::SleepPrepare => "SLEEP_PREPARE",
            Self::Sleep => "SLEEP",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Button classification state
// ---------------------------------------------------------------------------

/// Coarse button classification, shared single-writer (button task) /
/// single-reader (lifecycle task).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ButtonState {
    Released = 0,
    Pressed = 1,
    LongPressed = 2,
    VeryLongPressed = 3,
}

impl ButtonState {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Released,
            1 => Self::Pressed,
            2 => Self::LongPressed,
            3 => Self::VeryLongPressed,
            _ => {
                debug_assert!(false, "invalid button state byte: {v}");
                Self::Released
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Idle-expiry action
// ---------------------------------------------------------------------------

/// What `DEV_IDLE` should do once the inactivity timer expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IdleAction {
    None = 0,
    Sleep = 1,
    Shutdown = 2,
}

impl IdleAction {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::None,
            1 => Self::Sleep,
            2 => Self::Shutdown,
            _ => {
                debug_assert!(false, "invalid idle action byte: {v}");
                Self::None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Requests (C3)
// ---------------------------------------------------------------------------

/// Tag identifying what a [`Request`] asks the lifecycle task to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    IdleTimerReset,
    IdleInactivitySet,
    IdleExpiredActionSet,
    ActiveLock,
    ActiveUnlock,
    Sleep,
    Reboot,
    Shutdown,
    PowerOn,
}

/// A single request record enqueued onto the request queue.
///
/// Fields unused by a given `kind` are ignored by the lifecycle task —
/// mirrors the original C request struct, which carries every field in
/// one flat record regardless of which ones a given request kind needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub kind: RequestKind,
    pub inactivity_time_ms: u32,
    pub idle_action: IdleAction,
}

impl Request {
    pub fn simple(kind: RequestKind) -> Self {
        Self {
            kind,
            inactivity_time_ms: 0,
            idle_action: IdleAction::None,
        }
    }

    pub fn idle_inactivity_set(ms: u32) -> Self {
        Self {
            kind: RequestKind::IdleInactivitySet,
            inactivity_time_ms: ms,
            idle_action: IdleAction::None,
        }
    }

    pub fn idle_expired_action_set(action: IdleAction) -> Self {
        Self {
            kind: RequestKind::IdleExpiredActionSet,
            inactivity_time_ms: 0,
            idle_action: action,
        }
    }
}

// ---------------------------------------------------------------------------
// Event kinds (C2)
// ---------------------------------------------------------------------------

/// Closed enumeration of every event this supervisor can broadcast, plus
/// the `Any` wildcard a handler may register against to receive all of
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BatteryLow,
    BatteryCriticallyLow,
    BatteryFullyCharged,
    BatteryDead,
    BatteryConnected,
    BatteryTooCold,
    BatteryCool,
    BatteryWarm,
    BatteryTooHot,

    ChargerConnected,
    ChargerDisconnected,
    ChargeStarted,
    ChargeWeak,
    ChargePowerChanged,

    OffCharger,

    OtgConnected,
    OtgDisconnected,

    ButtonPressed,
    ButtonReleased,
    ButtonClicked,
    ButtonLongPressed,
    ButtonVeryLongPressed,

    IdleTimerExpired,

    DeviceShutdown,
    DeviceSleep,
    DeviceReboot,
    DeviceSetupFinished,

    PmicStatusUpdated,
    PmicControlUpdated,
    BatteryLevelUpdated,
    PortCurrentUpdated,

    UserEvent,

    /// Wildcard: a handler registered against `Any` receives every kind.
    Any,
}

/// Opaque event payload. The bus treats this as inert bytes — it does not
/// interpret or validate payload contents, matching the original
/// `void *, size_t` signature.
#[derive(Debug, Clone, Default)]
pub struct EventPayload(pub Vec<u8>);

impl EventPayload {
    pub fn empty() -> Self {
        Self(Vec::new())
    }
}

impl From<Vec<u8>> for EventPayload {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}
