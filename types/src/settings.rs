//! Engine tuning that is fixed for the lifetime of a run.

use std::num::NonZeroUsize;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("emitter cap must be at least 1 when set")]
    ZeroEmitterCap,
}

/// Validated pacer settings. A zero emitter cap is unrepresentable by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacerSettings {
    max_emitters: Option<NonZeroUsize>,
}

impl PacerSettings {
    pub fn new(max_emitters: Option<usize>) -> Result<Self, SettingsError> {
        let max_emitters = match max_emitters {
            Some(cap) => Some(NonZeroUsize::new(cap).ok_or(SettingsError::ZeroEmitterCap)?),
            None => None,
        };
        Ok(Self { max_emitters })
    }

    #[must_use]
    pub const fn with_max_emitters(mut self, cap: Option<NonZeroUsize>) -> Self {
        self.max_emitters = cap;
        self
    }

    /// Upper bound on groups emitting at the same time. `None` runs one
    /// emitter per key with no limit.
    #[must_use]
    pub const fn max_emitters(self) -> Option<NonZeroUsize> {
        self.max_emitters
    }
}
