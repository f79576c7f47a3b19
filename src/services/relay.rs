// Relay queue - the only channel between a worker thread and the UI thread
//
// One sender/receiver pair is created per run and dropped once the terminal
// notification has been consumed. Neither side ever blocks.

use crate::models::Notification;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Create a fresh, unbounded FIFO relay for a single run.
pub fn channel() -> (RelaySender, RelayReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RelaySender { tx }, RelayReceiver { rx })
}

/// Producer half, owned by the worker thread.
#[derive(Debug, Clone)]
pub struct RelaySender {
    tx: mpsc::UnboundedSender<Notification>,
}

impl RelaySender {
    /// Push a notification onto the queue.
    ///
    /// Returns `false` if the consumer has gone away (window closed mid-run).
    pub fn push(&self, notification: Notification) -> bool {
        let state = notification.state();
        match self.tx.send(notification) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!("Relay consumer dropped - discarding {} notification", state);
                false
            }
        }
    }
}

/// Result of a single non-blocking pop.
#[derive(Debug, PartialEq, Eq)]
pub enum Pop {
    Item(Notification),
    Empty,
    /// Every sender is gone and the queue is drained.
    Disconnected,
}

/// Consumer half, owned by the poller on the UI thread.
#[derive(Debug)]
pub struct RelayReceiver {
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl RelayReceiver {
    /// Take the oldest notification without waiting.
    pub fn try_pop(&mut self) -> Pop {
        match self.rx.try_recv() {
            Ok(notification) => Pop::Item(notification),
            Err(TryRecvError::Empty) => Pop::Empty,
            Err(TryRecvError::Disconnected) => Pop::Disconnected,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }
}
