//! Reading `key<TAB>value` lines.

use std::io::{self, BufRead};

use keyrate_types::{Item, ItemParseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        source: ItemParseError,
    },
}

/// Read every item from `reader`. Blank lines and lines starting with `#`
/// are skipped; line numbers in errors are 1-based.
pub fn read_items<R: BufRead>(reader: R) -> Result<Vec<Item<String, String>>, InputError> {
    let mut items = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let item = line.parse().map_err(|source| InputError::Parse {
            line: index + 1,
            source,
        })?;
        items.push(item);
    }
    Ok(items)
}
