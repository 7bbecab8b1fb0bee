//! In-memory configuration accessor

use super::ConfigAccessor;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Configuration held in a map, for tests and embedding
///
/// Values can be changed after construction; readers always observe the
/// latest value for a key.
#[derive(Debug, Default)]
pub struct MapConfigAccessor {
    values: RwLock<HashMap<String, String>>,
}

impl MapConfigAccessor {
    /// Create an empty accessor
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accessor from key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: RwLock::new(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Add a value (builder pattern)
    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a value
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// Remove a value
    pub fn remove(&self, key: &str) -> Option<String> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    /// Number of keys held
    pub fn len(&self) -> usize {
        self.values.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no keys are held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConfigAccessor for MapConfigAccessor {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}
