//! Connection handle — the broker's only way to reach a participant.
//!
//! The gateway owns the socket; the broker owns a handle whose sender half
//! feeds the gateway's writer task. A handle is open until it is closed
//! explicitly, its outbound buffer overflows, or the writer task drops the
//! receiver. Overflow is a transport failure: the handle closes and the
//! gateway tears the connection down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Notify};

use duet_core::ServerEvent;

/// Events a writer may fall behind by before its connection is dropped.
pub const OUTBOUND_CAPACITY: usize = 256;

struct Shared {
    open: AtomicBool,
    closed: Notify,
}

pub struct ConnectionHandle<P> {
    tx: mpsc::Sender<ServerEvent<P>>,
    shared: Arc<Shared>,
}

impl<P> Clone for ConnectionHandle<P> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<P> ConnectionHandle<P> {
    pub fn new(tx: mpsc::Sender<ServerEvent<P>>) -> Self {
        Self {
            tx,
            shared: Arc::new(Shared {
                open: AtomicBool::new(true),
                closed: Notify::new(),
            }),
        }
    }

    /// A handle plus the receiver a writer task drains.
    pub fn channel() -> (Self, mpsc::Receiver<ServerEvent<P>>) {
        Self::with_capacity(OUTBOUND_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<ServerEvent<P>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Push an event without waiting. Silent no-op once the handle is closed.
    ///
    /// Returns whether the event was queued for the writer. A full buffer
    /// closes the handle.
    pub fn send(&self, event: ServerEvent<P>) -> bool {
        if !self.is_open() {
            return false;
        }
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!(capacity = self.tx.max_capacity(), "outbound buffer full, closing");
                self.close();
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.close();
                false
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Acquire) && !self.tx.is_closed()
    }

    /// Invalidate the handle. Every clone observes the close.
    pub fn close(&self) {
        self.shared.open.store(false, Ordering::Release);
        self.shared.closed.notify_waiters();
    }

    /// Resolves once [`close`](Self::close) has been called on any clone.
    pub async fn closed(&self) {
        loop {
            let notified = self.shared.closed.notified();
            if !self.shared.open.load(Ordering::Acquire) {
                return;
            }
            notified.await;
        }
    }
}
