//! Watch subscriptions.
//!
//! A [`Watch`] is the caller's end of a subscription to change events. The
//! engine keeps the matching [`WatchSender`] and stops delivering once the
//! caller calls [`Watch::stop`] or drops the handle.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::{DynamicObject, Resource};
use crate::error::NarrowError;

/// What happened to the object carried by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Added,
    Modified,
    Deleted,
}

/// A single change delivered to a watcher.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchEvent {
    pub type_: EventType,
    /// Object state after the change (last known state for `Deleted`)
    pub object: DynamicObject,
}

impl WatchEvent {
    pub fn new(type_: EventType, object: DynamicObject) -> Self {
        Self { type_, object }
    }

    /// Decode the carried object as `K`.
    pub fn resource<K: Resource>(&self) -> Result<K, NarrowError> {
        self.object.clone().try_into_resource()
    }
}

/// Engine side of a watch.
#[derive(Debug, Clone)]
pub struct WatchSender {
    tx: UnboundedSender<WatchEvent>,
}

impl WatchSender {
    /// Deliver an event. Returns `false` once the watch has been released.
    pub fn send(&self, event: WatchEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Caller-owned handle to a live subscription.
///
/// Events arrive in the order the engine emitted them. Dropping the handle
/// releases it.
#[derive(Debug)]
pub struct Watch {
    rx: UnboundedReceiver<WatchEvent>,
}

impl Watch {
    /// Create a linked sender/handle pair.
    pub fn channel() -> (WatchSender, Watch) {
        let (tx, rx) = mpsc::unbounded_channel();
        (WatchSender { tx }, Watch { rx })
    }

    /// Next already-delivered event, without waiting.
    pub fn try_next(&mut self) -> Option<WatchEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next event. Returns `None` once the watch is stopped
    /// or the engine has dropped its sender.
    pub async fn next(&mut self) -> Option<WatchEvent> {
        self.rx.recv().await
    }

    /// Stop delivery and discard anything still buffered.
    pub fn stop(&mut self) {
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }
}
