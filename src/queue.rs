//! Bounded single-producer(many-callers)/single-consumer request queue (C3).
//!
//! Any thread may enqueue a [`Request`]; only the lifecycle task dequeues.
//! Enqueue is non-blocking with a 10 ms budget and drops the request
//! silently if the queue is full — callers of the public façade are
//! fire-and-forget and must never be made to block on FSM backpressure.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use log::warn;

use crate::model::Request;

/// Nominal enqueue budget before a full queue gives up and drops the
/// request.
const ENQUEUE_BUDGET_MS: u64 = 10;

pub struct RequestQueue {
    tx: Sender<Request>,
    rx: Receiver<Request>,
}

impl RequestQueue {
    /// Build a queue with the given capacity (default: 10).
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self { tx, rx }
    }

    /// A cheap, cloneable handle producers use to enqueue requests.
    pub fn sender(&self) -> RequestSender {
        RequestSender {
            tx: self.tx.clone(),
        }
    }

    /// Dequeue at most one pending request. Called once per lifecycle
    /// loop iteration, so a burst of N requests takes N ticks to drain —
    /// intentional back-pressure against request storms.
    pub fn try_recv_one(&self) -> Option<Request> {
        match self.rx.recv_timeout(Duration::from_millis(0)) {
            Ok(req) => Some(req),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Cloneable producer handle. Every public façade method that enqueues a
/// request holds one of these rather than the queue itself, so multiple
/// client threads can submit requests concurrently.
#[derive(Clone)]
pub struct RequestSender {
    tx: Sender<Request>,
}

impl RequestSender {
    /// Enqueue `req`, waiting up to the nominal budget for room. On
    /// timeout or a disconnected receiver the request is dropped and a
    /// warning is logged — this never blocks the caller indefinitely and
    /// never returns an error the caller is expected to act on; this path
    /// is fire-and-forget by design.
    pub fn send(&self, req: Request) {
        match self
            .tx
            .send_timeout(req, Duration::from_millis(ENQUEUE_BUDGET_MS))
        {
            Ok(()) => {}
            Err(crossbeam_channel::SendTimeoutError::Timeout(_)) => {
                warn!("request queue full, dropping {:?}", req.kind);
            }
            Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => {
                warn!("request queue closed, dropping {:?}", req.kind);
            }
        }
    }

    /// Non-blocking variant used where the caller is itself on a hot
    /// polling path (e.g. the button task refreshing activity) and
    /// cannot afford the 10ms budget at all.
    pub fn try_send(&self, req: Request) {
        if let Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) = self.tx.try_send(req) {
            warn!("request queue full, dropping {:?}", req.kind);
        }
    }
}
