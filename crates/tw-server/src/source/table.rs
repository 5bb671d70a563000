//! Source table: the server's `name -> Item` data

use std::collections::BTreeMap;
use std::time::SystemTime;

use rand::Rng;
use tokio::sync::Mutex;

use tw_core::config::SeedItem;
use tw_core::Item;

/// Table of tracked items behind one exclusive lock.
///
/// Reads hand out copies taken under the lock. Iteration order is by name,
/// so a seeded RNG gives a repeatable mutation sequence.
pub struct SourceTable {
    items: Mutex<BTreeMap<String, Item>>,
}

impl SourceTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
        }
    }

    /// Create a table holding the configured seed items
    pub fn from_seeds(seeds: &[SeedItem]) -> Self {
        let items = seeds
            .iter()
            .map(|seed| (seed.name.clone(), Item::new(seed.name.clone(), seed.value)))
            .collect();
        Self {
            items: Mutex::new(items),
        }
    }

    /// Insert `name` with `initial_value` unless it is already present.
    ///
    /// Returns `true` if the item was inserted.
    pub async fn upsert(&self, name: &str, initial_value: f64) -> bool {
        let mut items = self.items.lock().await;
        if items.contains_key(name) {
            return false;
        }
        items.insert(name.to_string(), Item::new(name, initial_value));
        tracing::debug!(item = name, initial_value, "Item added to source table");
        true
    }

    /// Copy of one item
    pub async fn get(&self, name: &str) -> Option<Item> {
        self.items.lock().await.get(name).cloned()
    }

    /// Copy of every item, ordered by name
    pub async fn snapshot(&self) -> Vec<Item> {
        self.items.lock().await.values().cloned().collect()
    }

    /// Number of items
    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    /// Check if empty
    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// Change the value of a pseudo-random subset of items.
    ///
    /// A stride `k = max(1, rng in 0..len)` is drawn and every `k`-th item is
    /// updated to `1 + value * (r + 0.5)` with `r` in `[0, 1)`. Returns
    /// copies of the updated items.
    pub async fn mutate_random_subset<R>(&self, rng: &mut R) -> Vec<Item>
    where
        R: Rng,
    {
        let mut items = self.items.lock().await;
        if items.is_empty() {
            return Vec::new();
        }

        let stride = rng.gen_range(0..items.len()).max(1);
        let now = SystemTime::now();
        let mut changed = Vec::with_capacity(items.len() / stride);
        let mut skipped = 0;

        for item in items.values_mut() {
            skipped += 1;
            if skipped < stride {
                continue;
            }
            skipped = 0;

            item.value = 1.0 + item.value * (rng.gen::<f64>() + 0.5);
            item.updated_at = now;
            changed.push(item.clone());
        }

        changed
    }
}

impl Default for SourceTable {
    fn default() -> Self {
        Self::new()
    }
}
