//! Reader side of the shared output channel.
//!
//! Every value travels with a one-shot acknowledgement. A reader fires it as
//! it takes the value, and the emitter does not start its next wait until
//! then. A value parked in the channel therefore never counts as written.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::{Mutex, mpsc, oneshot};

/// One value in flight from an emitter to a reader.
#[derive(Debug)]
pub(crate) struct Delivery<V> {
    value: V,
    taken: oneshot::Sender<()>,
}

impl<V> Delivery<V> {
    /// Wrap `value`. The returned receiver resolves once a reader takes it,
    /// or errors if the delivery is dropped unread.
    pub(crate) fn new(value: V) -> (Self, oneshot::Receiver<()>) {
        let (taken, on_taken) = oneshot::channel();
        (Self { value, taken }, on_taken)
    }

    fn accept(self) -> V {
        // The emitter may already be gone; the reader keeps the value anyway.
        let _ = self.taken.send(());
        self.value
    }
}

/// Values released by the emitters of one run.
///
/// Ends (`recv` returns `None`) once every emitter has finished. Dropping the
/// stream cancels any emitter that still has values left.
#[derive(Debug)]
pub struct PacedStream<V> {
    rx: mpsc::Receiver<Delivery<V>>,
}

impl<V> PacedStream<V> {
    pub(crate) fn new(rx: mpsc::Receiver<Delivery<V>>) -> Self {
        Self { rx }
    }

    /// Receive the next value, or `None` once the run has completed.
    pub async fn recv(&mut self) -> Option<V> {
        self.rx.recv().await.map(Delivery::accept)
    }

    /// Receive without waiting. Returns `None` both when nothing is ready yet
    /// and when the stream has ended; use [`is_closed`](Self::is_closed) to
    /// tell them apart.
    pub fn try_recv(&mut self) -> Option<V> {
        self.rx.try_recv().ok().map(Delivery::accept)
    }

    /// True once every emitter has finished and no pending values remain.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.rx.is_closed() && self.rx.is_empty()
    }

    /// Convert into a handle that several readers can clone and consume
    /// concurrently. Each value goes to exactly one reader.
    #[must_use]
    pub fn into_shared(self) -> SharedPacedStream<V> {
        SharedPacedStream {
            rx: Arc::new(Mutex::new(self.rx)),
        }
    }
}

impl<V> Stream for PacedStream<V> {
    type Item = V;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<V>> {
        self.get_mut()
            .rx
            .poll_recv(cx)
            .map(|delivery| delivery.map(Delivery::accept))
    }
}

/// Clonable reader over a [`PacedStream`]. Values are distributed among the
/// clones, not broadcast.
///
/// A clone holds the receiver lock for the whole of [`recv`](Self::recv),
/// including the wait for the next value, so readers take turns: at most one
/// is waiting on the channel at any time and the others queue on the lock.
#[derive(Debug)]
pub struct SharedPacedStream<V> {
    rx: Arc<Mutex<mpsc::Receiver<Delivery<V>>>>,
}

impl<V> SharedPacedStream<V> {
    /// Receive the next value, or `None` once the run has completed.
    pub async fn recv(&self) -> Option<V> {
        self.rx.lock().await.recv().await.map(Delivery::accept)
    }
}

impl<V> Clone for SharedPacedStream<V> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}
