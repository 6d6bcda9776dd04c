//! Ordered outbound event channel for one turn.
//!
//! The orchestrator and all tool executions write into one bounded queue;
//! the HTTP layer drains it into the response stream. When the receiver is
//! dropped (client disconnected) further sends become no-ops so the turn
//! can still finish its best-effort persistence without emitting.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::debug;

use scribe_types::stream::{StreamEvent, TurnEvent};

/// Writer half of the turn's event channel.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<TurnEvent>,
    closed: Arc<AtomicBool>,
}

impl EventSink {
    /// Create a bounded channel and its sink.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TurnEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                closed: Arc::new(AtomicBool::new(false)),
            },
            rx,
        )
    }

    /// True once the receiver has gone away.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// Send an event, waiting for queue capacity. A disconnected receiver
    /// flips the closed flag and turns subsequent sends into no-ops.
    pub async fn send(&self, event: TurnEvent) {
        if self.is_closed() {
            return;
        }
        if self.tx.send(event).await.is_err() {
            self.closed.store(true, Ordering::Relaxed);
            debug!("event receiver dropped; suppressing further emission");
        }
    }

    /// Emit a delta of the assistant's chat text.
    pub async fn message(&self, text: impl Into<String>) {
        self.send(TurnEvent::Message(text.into())).await;
    }

    /// Emit a side-channel stream event.
    pub async fn data(&self, event: StreamEvent) {
        self.send(TurnEvent::Data(event)).await;
    }

    /// Emit a turn error.
    pub async fn error(&self, message: impl Into<String>) {
        self.send(TurnEvent::Error(message.into())).await;
    }

    /// Emit the terminal close signal.
    pub async fn done(&self) {
        self.send(TurnEvent::Done).await;
    }
}
