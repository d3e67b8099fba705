//! Partitioning of input items into per-key groups.

use std::collections::HashMap;
use std::hash::Hash;

use keyrate_types::Item;

/// Values sharing one key, in input order.
pub type Group<V> = Vec<V>;

/// Groups by key. Iteration order over keys is unspecified.
pub type Groups<K, V> = HashMap<K, Group<V>>;

/// Partition `items` by key, keeping each key's values in their original
/// relative order.
pub fn group_by_key<K, V, I, T>(items: I) -> Groups<K, V>
where
    K: Eq + Hash,
    I: IntoIterator<Item = T>,
    T: Into<Item<K, V>>,
{
    let mut groups: Groups<K, V> = HashMap::new();
    for item in items {
        let Item { key, value } = item.into();
        groups.entry(key).or_default().push(value);
    }
    groups
}
