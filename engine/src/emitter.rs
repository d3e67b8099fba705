//! Per-group emitter.
//!
//! An emitter owns one group and releases it onto the shared output channel:
//!
//! ```text
//! Idle -> EmittingFirst -> (Waiting <-> EmittingRest)* -> Done
//! ```
//!
//! The first value goes out immediately. Every later value waits for a full
//! interval measured from the moment a reader *took* the previous one, so time
//! spent blocked on a slow reader pushes the rest of the group back instead of
//! being made up with a burst.

use std::sync::Arc;

use keyrate_types::KeyRate;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};

use crate::group::Group;
use crate::stream::Delivery;

/// How an emitter finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterOutcome {
    /// Every value in the group was taken by a reader.
    Done { emitted: usize },
    /// All readers went away before the group was exhausted.
    Abandoned { emitted: usize },
}

impl EmitterOutcome {
    #[must_use]
    pub const fn emitted(self) -> usize {
        match self {
            Self::Done { emitted } | Self::Abandoned { emitted } => emitted,
        }
    }
}

pub(crate) struct Emitter<V> {
    group_id: usize,
    values: Group<V>,
    tx: mpsc::Sender<Delivery<V>>,
    key_rate: KeyRate,
    permits: Option<Arc<Semaphore>>,
}

impl<V: Send + 'static> Emitter<V> {
    pub(crate) fn new(
        group_id: usize,
        values: Group<V>,
        tx: mpsc::Sender<Delivery<V>>,
        key_rate: KeyRate,
        permits: Option<Arc<Semaphore>>,
    ) -> Self {
        Self {
            group_id,
            values,
            tx,
            key_rate,
            permits,
        }
    }

    pub(crate) async fn run(self) -> EmitterOutcome {
        let Self {
            group_id,
            values,
            tx,
            key_rate,
            permits,
        } = self;
        let total = values.len();

        // Held until the emitter returns.
        let _permit = match permits {
            Some(permits) => match acquire(permits, &tx).await {
                Some(permit) => Some(permit),
                None => return abandon(group_id, 0, total),
            },
            None => None,
        };

        tracing::debug!(group = group_id, values = total, "Emitter started");

        let mut emitted = 0;
        for value in values {
            if emitted > 0 {
                // Read on every wait so a changed rate applies to the next gap.
                let interval = key_rate.get();
                tokio::select! {
                    () = tokio::time::sleep(interval) => {}
                    () = tx.closed() => return abandon(group_id, emitted, total),
                }
            }

            let (delivery, taken) = Delivery::new(value);
            if tx.send(delivery).await.is_err() {
                return abandon(group_id, emitted, total);
            }
            // Queued is not written: the next wait starts once a reader has it.
            tokio::select! {
                biased;
                result = taken => {
                    if result.is_err() {
                        return abandon(group_id, emitted, total);
                    }
                }
                () = tx.closed() => return abandon(group_id, emitted, total),
            }
            emitted += 1;
            tracing::trace!(group = group_id, emitted, "Value emitted");
        }

        tracing::debug!(group = group_id, emitted, "Emitter done");
        EmitterOutcome::Done { emitted }
    }
}

async fn acquire<V>(
    permits: Arc<Semaphore>,
    tx: &mpsc::Sender<Delivery<V>>,
) -> Option<OwnedSemaphorePermit> {
    tokio::select! {
        permit = permits.acquire_owned() => permit.ok(),
        () = tx.closed() => None,
    }
}

fn abandon(group_id: usize, emitted: usize, total: usize) -> EmitterOutcome {
    tracing::warn!(
        group = group_id,
        emitted,
        remaining = total - emitted,
        "Output stream closed by readers; abandoning group"
    );
    EmitterOutcome::Abandoned { emitted }
}
