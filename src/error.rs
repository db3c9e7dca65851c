//! Unified error types for the power-management supervisor.
//!
//! Most recoverable conditions (queue overflow, idle-timeout clamp, lock
//! underflow) are specified as silent recoveries and never surface an
//! `Error` — see `queue.rs` and `lifecycle.rs`. This type exists for the
//! small set of genuinely fallible operations: event-bus delivery and the
//! `init()` preconditions.

use core::fmt;

/// Every fallible public operation in this crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// `emit` could not hand the event to the dispatch thread within its
    /// 1 s deadline.
    EventBusTimeout,
    /// The event bus's dispatch thread is gone; no handler can run.
    EventBusClosed,
    /// The event bus's handler registry lock was poisoned by a panicking
    /// handler; registration/deregistration can no longer be trusted.
    EventBusPoisoned,
    /// `init()` was called before a required host adapter was set.
    MissingAdapter(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventBusTimeout => write!(f, "event bus: delivery deadline exceeded"),
            Self::EventBusClosed => write!(f, "event bus: dispatch thread not running"),
            Self::EventBusPoisoned => write!(f, "event bus: handler registry lock poisoned"),
            Self::MissingAdapter(name) => write!(f, "init: adapter `{name}` not set"),
        }
    }
}

impl std::error::Error for Error {}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
