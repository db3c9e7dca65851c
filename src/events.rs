//! Broadcast event bus (C2).
//!
//! Keyed by [`EventKind`] with an `Any` wildcard bucket. Multiple handlers
//! may register against the same kind. `emit` posts onto a bounded mailbox
//! drained by a dedicated dispatch thread, so handlers never run on the
//! emitter's own thread (button task, lifecycle task, or a client thread)
//! and a slow handler cannot stall the lifecycle FSM.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{EventKind, EventPayload};

/// Deadline for a single `emit` call to hand its message to the dispatch
/// thread.
const EMIT_DEADLINE: Duration = Duration::from_secs(1);

/// Opaque identifier returned by `register`, used to `deregister` later.
/// Values are unique for the lifetime of one `EventBus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Box<dyn Fn(EventKind, &EventPayload) + Send + Sync>;

struct Registry {
    by_kind: HashMap<EventKind, Vec<(HandlerId, Handler)>>,
    any: Vec<(HandlerId, Handler)>,
}

impl Registry {
    fn new() -> Self {
        Self {
            by_kind: HashMap::new(),
            any: Vec::new(),
        }
    }

    fn dispatch(&self, kind: EventKind, payload: &EventPayload) {
        if let Some(handlers) = self.by_kind.get(&kind) {
            for (_, handler) in handlers {
                handler(kind, payload);
            }
        }
        for (_, handler) in &self.any {
            handler(kind, payload);
        }
    }
}

struct Message {
    kind: EventKind,
    payload: EventPayload,
}

/// The broadcast event bus.
///
/// Construction spawns the dispatch thread immediately; dropping the bus
/// closes the mailbox and joins the thread.
pub struct EventBus {
    tx: Sender<Message>,
    registry: Arc<Mutex<Registry>>,
    next_id: AtomicU64,
    dispatcher: Option<JoinHandle<()>>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx): (Sender<Message>, Receiver<Message>) = crossbeam_channel::bounded(64);
        let registry = Arc::new(Mutex::new(Registry::new()));

        let dispatcher = {
            let registry = Arc::clone(&registry);
            std::thread::Builder::new()
                .name("event-bus-dispatch".into())
                .spawn(move || {
                    for msg in rx {
                        let guard = registry.lock().expect("event registry poisoned");
                        guard.dispatch(msg.kind, &msg.payload);
                    }
                })
                .expect("failed to spawn event bus dispatch thread")
        };

        Self {
            tx,
            registry,
            next_id: AtomicU64::new(1),
            dispatcher: Some(dispatcher),
        }
    }

    /// Subscribe `handler` to `kind`. Passing [`EventKind::Any`] matches
    /// every event the bus ever emits. Returns an id usable with
    /// [`EventBus::deregister`].
    ///
    /// # Errors
    ///
    /// Returns `Err(Error::EventBusPoisoned)` if a previous handler
    /// panicked while holding the registry lock.
    pub fn register(
        &self,
        kind: EventKind,
        handler: impl Fn(EventKind, &EventPayload) + Send + Sync + 'static,
    ) -> Result<HandlerId> {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut guard = self
            .registry
            .lock()
            .map_err(|_| Error::EventBusPoisoned)?;
        if kind == EventKind::Any {
            guard.any.push((id, Box::new(handler)));
        } else {
            guard
                .by_kind
                .entry(kind)
                .or_default()
                .push((id, Box::new(handler)));
        }
        Ok(id)
    }

    /// Remove a previously registered handler. Removing an id that is not
    /// present (already removed, or never registered against `kind`)
    /// fails softly — it is simply a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns `Err(Error::EventBusPoisoned)` if a previous handler
    /// panicked while holding the registry lock.
    pub fn deregister(&self, kind: EventKind, id: HandlerId) -> Result<()> {
        let mut guard = self
            .registry
            .lock()
            .map_err(|_| Error::EventBusPoisoned)?;
        let bucket = if kind == EventKind::Any {
            &mut guard.any
        } else {
            match guard.by_kind.get_mut(&kind) {
                Some(b) => b,
                None => return Ok(()),
            }
        };
        bucket.retain(|(existing, _)| *existing != id);
        Ok(())
    }

    /// Broadcast `kind` with `payload` to every matching handler. Handlers
    /// run on the dispatch thread, not the caller's thread. Returns
    /// `Err(Error::EventBusTimeout)` if the mailbox does not accept the
    /// message within the 1s deadline (a stalled dispatch thread is the
    /// only way this happens in practice).
    pub fn emit(&self, kind: EventKind, payload: EventPayload) -> Result<()> {
        debug!("emit {kind:?}");
        match self.tx.send_timeout(Message { kind, payload }, EMIT_DEADLINE) {
            Ok(()) => Ok(()),
            Err(crossbeam_channel::SendTimeoutError::Timeout(_)) => Err(Error::EventBusTimeout),
            Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => {
                Err(Error::EventBusClosed)
            }
        }
    }

    /// Convenience for the common case of an empty payload.
    pub fn emit_simple(&self, kind: EventKind) -> Result<()> {
        self.emit(kind, EventPayload::empty())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        if let Some(handle) = self.dispatcher.take() {
            if handle.join().is_err() {
                warn!("event bus dispatch thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc as StdArc;

    #[test]
    fn registered_handler_receives_matching_kind() {
        let bus = EventBus::new();
        let hits = StdArc::new(AtomicUsize::new(0));
        let hits2 = StdArc::clone(&hits);
        bus.register(EventKind::DeviceSleep, move |kind, _| {
            assert_eq!(kind, EventKind::DeviceSleep);
            hits2.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        bus.emit_simple(EventKind::DeviceSleep).unwrap();
        bus.emit_simple(EventKind::DeviceReboot).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn any_handler_receives_every_kind() {
        let bus = EventBus::new();
        let hits = StdArc::new(AtomicUsize::new(0));
        let hits2 = StdArc::clone(&hits);
        bus.register(EventKind::Any, move |_, _| {
            hits2.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        bus.emit_simple(EventKind::DeviceSleep).unwrap();
        bus.emit_simple(EventKind::DeviceReboot).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn deregister_stops_future_delivery() {
        let bus = EventBus::new();
        let hits = StdArc::new(AtomicUsize::new(0));
        let hits2 = StdArc::clone(&hits);
        let id = bus
            .register(EventKind::DeviceSleep, move |_, _| {
                hits2.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        bus.deregister(EventKind::DeviceSleep, id).unwrap();
        bus.emit_simple(EventKind::DeviceSleep).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn deregister_unknown_id_fails_softly() {
        let bus = EventBus::new();
        bus.deregister(EventKind::DeviceSleep, HandlerId(9999)).unwrap();
    }
}
