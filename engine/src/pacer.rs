//! Run entry points and the completion coordinator.

use std::hash::Hash;
use std::sync::Arc;

use keyrate_types::{Item, KeyRate, PacerSettings};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinError, JoinHandle, JoinSet};

use crate::emitter::{Emitter, EmitterOutcome};
use crate::group::group_by_key;
use crate::stream::PacedStream;

/// Totals for one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Distinct keys, one emitter each.
    pub groups: usize,
    /// Values taken by a reader.
    pub emitted: usize,
    /// Groups cut short because every reader dropped the stream.
    pub abandoned: usize,
    /// Emitters that panicked.
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: EmitterOutcome) {
        self.emitted += outcome.emitted();
        if matches!(outcome, EmitterOutcome::Abandoned { .. }) {
            self.abandoned += 1;
        }
    }
}

/// Resolves once every emitter of a run has finished and the output stream
/// has closed.
#[derive(Debug)]
pub struct Completion {
    handle: Option<JoinHandle<RunSummary>>,
}

impl Completion {
    /// Wait for the run to finish.
    ///
    /// Errors only if the coordinator task itself panicked or the runtime shut
    /// down underneath it.
    pub async fn wait(self) -> Result<RunSummary, JoinError> {
        match self.handle {
            Some(handle) => handle.await,
            None => Ok(RunSummary::default()),
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

/// A started run: the output stream plus its completion signal.
#[derive(Debug)]
pub struct PacedRun<V> {
    pub stream: PacedStream<V>,
    pub completion: Completion,
}

/// Per-key pacer.
///
/// Each call to [`get`](Self::get) or [`spawn`](Self::spawn) is an independent
/// run over a fixed set of items. Runs started from the same `Pacer` share its
/// [`KeyRate`], so changing the rate affects every run still in flight.
#[derive(Debug, Clone, Default)]
pub struct Pacer {
    key_rate: KeyRate,
    settings: PacerSettings,
}

impl Pacer {
    #[must_use]
    pub fn new(key_rate: KeyRate, settings: PacerSettings) -> Self {
        Self { key_rate, settings }
    }

    #[must_use]
    pub fn key_rate(&self) -> &KeyRate {
        &self.key_rate
    }

    /// Start a run and return only its output stream.
    ///
    /// Must be called from within a tokio runtime.
    pub fn get<K, V, I, T>(&self, items: I) -> PacedStream<V>
    where
        K: Eq + Hash,
        V: Send + 'static,
        I: IntoIterator<Item = T>,
        T: Into<Item<K, V>>,
    {
        self.spawn(items).stream
    }

    /// Start a run: group `items` by key and spawn one emitter per group.
    ///
    /// Empty input returns an already-closed stream without spawning anything.
    /// Must be called from within a tokio runtime.
    pub fn spawn<K, V, I, T>(&self, items: I) -> PacedRun<V>
    where
        K: Eq + Hash,
        V: Send + 'static,
        I: IntoIterator<Item = T>,
        T: Into<Item<K, V>>,
    {
        let groups = group_by_key(items);
        // An emitter has at most one value in flight, so sends never block;
        // pacing waits on the reader taking each value instead.
        let (tx, rx) = mpsc::channel(groups.len().max(1));
        let stream = PacedStream::new(rx);

        if groups.is_empty() {
            // Dropping the only sender closes the stream right away.
            drop(tx);
            tracing::debug!("No items; output stream closed immediately");
            return PacedRun {
                stream,
                completion: Completion { handle: None },
            };
        }

        let permits = self
            .settings
            .max_emitters()
            .map(|cap| Arc::new(Semaphore::new(cap.get())));
        let group_count = groups.len();
        tracing::debug!(
            groups = group_count,
            interval_ms = self.key_rate.get().as_millis(),
            max_emitters = ?self.settings.max_emitters(),
            "Starting paced run"
        );

        let mut emitters = JoinSet::new();
        for (group_id, values) in groups.into_values().enumerate() {
            let emitter = Emitter::new(
                group_id,
                values,
                tx.clone(),
                self.key_rate.clone(),
                permits.clone(),
            );
            emitters.spawn(emitter.run());
        }
        // Emitters now hold the only senders: the stream closes exactly when
        // the last one finishes.
        drop(tx);

        let handle = tokio::spawn(coordinate(emitters, group_count));
        PacedRun {
            stream,
            completion: Completion {
                handle: Some(handle),
            },
        }
    }
}

async fn coordinate(mut emitters: JoinSet<EmitterOutcome>, groups: usize) -> RunSummary {
    let mut summary = RunSummary {
        groups,
        ..RunSummary::default()
    };

    while let Some(joined) = emitters.join_next().await {
        match joined {
            Ok(outcome) => summary.record(outcome),
            Err(e) => {
                summary.failed += 1;
                tracing::error!(error = %e, "Emitter task failed");
            }
        }
    }

    tracing::debug!(
        groups = summary.groups,
        emitted = summary.emitted,
        abandoned = summary.abandoned,
        failed = summary.failed,
        "Paced run complete"
    );
    summary
}

/// Pace `items` by key at `key_rate` with default settings.
///
/// Values sharing a key are emitted at least `key_rate` apart; values under
/// different keys are emitted independently. The returned stream yields every
/// value exactly once and then ends.
///
/// Must be called from within a tokio runtime.
pub fn get<K, V, I, T>(items: I, key_rate: &KeyRate) -> PacedStream<V>
where
    K: Eq + Hash,
    V: Send + 'static,
    I: IntoIterator<Item = T>,
    T: Into<Item<K, V>>,
{
    Pacer::new(key_rate.clone(), PacerSettings::default()).get(items)
}
