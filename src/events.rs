//! Notifications emitted by the coordinator and profile store.
//!
//! Sent over an unbounded tokio channel so synchronous code can publish
//! without blocking. A dropped receiver is ignored.

use crate::color::Color;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// How an operation (or batch) turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Batch where some devices succeeded and some failed.
    Partial,
    Failure,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ColorChanged { device_id: String, color: Color },
    EffectChanged { device_id: String, effect: String },
    ActionResult { outcome: Outcome, message: String },
    TemperatureLinkingChanged(bool),
    ProfileLoaded(String),
    ProfileSaved(String),
    ProfileDeleted(String),
    ProfileFailed(String),
}

impl Event {
    pub fn success(message: impl Into<String>) -> Self {
        Event::ActionResult { outcome: Outcome::Success, message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Event::ActionResult { outcome: Outcome::Failure, message: message.into() }
    }

    pub fn partial(message: impl Into<String>) -> Self {
        Event::ActionResult { outcome: Outcome::Partial, message: message.into() }
    }

    /// True for events reporting a failed or partially failed operation.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Event::ActionResult { outcome: Outcome::Failure | Outcome::Partial, .. }
                | Event::ProfileFailed(_)
        )
    }
}

/// Publishing half of the event channel.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: UnboundedSender<Event>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<Event>) -> Self {
        Self { tx }
    }

    /// Best-effort; a closed channel is not an error.
    pub fn emit(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

/// Create a connected sink/receiver pair.
pub fn channel() -> (EventSink, UnboundedReceiver<Event>) {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    (EventSink::new(tx), rx)
}

/// Drain everything currently queued without waiting.
pub fn drain(rx: &mut UnboundedReceiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}
