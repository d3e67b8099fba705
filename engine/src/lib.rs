//! Per-key pacing engine for keyrate.
//!
//! Takes a fixed collection of key/value items and releases the values onto a
//! single stream. Values sharing a key come out at least one [`KeyRate`]
//! interval apart; values under different keys are emitted concurrently with
//! no ordering between them.
//!
//! ```text
//! items -> group_by_key -> one Emitter task per key -> mpsc channel -> PacedStream
//!                                   |
//!                                   v
//!                       coordinator (JoinSet) -> Completion / RunSummary
//! ```
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() {
//! use std::time::Duration;
//! use keyrate_engine::{KeyRate, get};
//!
//! let rate = KeyRate::new(Duration::from_millis(10));
//! let mut stream = get([("a", "b"), ("b", "c"), ("a", "c")], &rate);
//! while let Some(value) = stream.recv().await {
//!     println!("{value}");
//! }
//! # }
//! ```

mod emitter;
mod group;
mod pacer;
mod stream;

pub use emitter::EmitterOutcome;
pub use group::{Group, Groups, group_by_key};
pub use pacer::{Completion, PacedRun, Pacer, RunSummary, get};
pub use stream::{PacedStream, SharedPacedStream};

pub use keyrate_types::{DEFAULT_KEY_RATE, Item, KeyRate, PacerSettings};
