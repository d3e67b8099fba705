//! Keyed input items.

use std::str::FromStr;

use thiserror::Error;

/// A key/value pair. Items sharing a key are paced against each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> Item<K, V> {
    #[must_use]
    pub const fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    #[must_use]
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> From<(K, V)> for Item<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self { key, value }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemParseError {
    #[error("line has no key/value separator")]
    MissingSeparator,
    #[error("key must not be empty")]
    EmptyKey,
}

/// Parses a `key<TAB>value` line. When the line has no tab, the first run of
/// whitespace separates key from value.
///
/// The value keeps its inner whitespace; only the line ending is trimmed.
impl FromStr for Item<String, String> {
    type Err = ItemParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (key, value) = match line.split_once('\t') {
            Some(parts) => parts,
            None => line
                .trim_start()
                .split_once(char::is_whitespace)
                .map(|(key, value)| (key, value.trim_start()))
                .ok_or(ItemParseError::MissingSeparator)?,
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(ItemParseError::EmptyKey);
        }
        Ok(Self::new(key.to_string(), value.to_string()))
    }
}
