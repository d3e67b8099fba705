//! Core domain types for keyrate.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! The engine, config and CLI crates all build on these.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod item;
mod rate;
mod settings;

pub use item::{Item, ItemParseError};
pub use rate::{DEFAULT_KEY_RATE, KeyRate};
pub use settings::{PacerSettings, SettingsError};
