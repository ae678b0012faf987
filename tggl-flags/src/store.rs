//! Flag snapshots and the atomically swapped store holding the current one.

use crate::{Context, Flag, FlagError, Value, Variation, decode_flags};
use arc_swap::ArcSwap;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Immutable set of flag definitions keyed by slug.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    flags: HashMap<String, Flag>,
}

impl ConfigSnapshot {
    /// Build a snapshot. A later flag with the same slug replaces an earlier one.
    pub fn from_flags(flags: impl IntoIterator<Item = Flag>) -> Self {
        Self {
            flags: flags
                .into_iter()
                .map(|flag| (flag.slug.clone(), flag))
                .collect(),
        }
    }

    /// Decode a JSON array of flag definitions, see [`decode_flags`].
    pub fn from_json(json: &str) -> Result<Self, FlagError> {
        Ok(Self::from_flags(decode_flags(json.as_bytes())?))
    }

    pub fn get(&self, slug: &str) -> Option<&Flag> {
        self.flags.get(slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.flags.contains_key(slug)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn flags(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values()
    }

    /// Evaluate one flag. Unknown slugs yield the inactive variation.
    pub fn evaluate<C: Context + ?Sized>(&self, context: &C, slug: &str) -> Variation {
        self.flags
            .get(slug)
            .map_or_else(Variation::inactive, |flag| flag.evaluate(context))
    }

    /// Evaluate every flag and keep the values of the active ones.
    pub fn active_flags<C: Context + ?Sized>(&self, context: &C) -> BTreeMap<String, Value> {
        self.flags
            .values()
            .filter_map(|flag| {
                let variation = flag.evaluate(context);
                variation
                    .active
                    .then(|| (flag.slug.clone(), variation.value))
            })
            .collect()
    }
}

/// Holder of the current [`ConfigSnapshot`].
///
/// Reads never block and always see one complete snapshot. Replacing the
/// snapshot is a single pointer swap; readers holding the previous `Arc`
/// keep a consistent view until they drop it.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: ArcSwap<ConfigSnapshot>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: ConfigSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot),
        }
    }

    /// Load the current snapshot.
    #[inline]
    pub fn read(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    /// Swap in a new snapshot.
    pub fn replace(&self, snapshot: ConfigSnapshot) {
        self.current.store(Arc::new(snapshot));
    }
}
