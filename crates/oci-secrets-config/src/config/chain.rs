//! Configuration Chain
//!
//! Combines several accessors into a priority-ordered chain. When reading a
//! key, accessors are consulted in order and the first one holding the key
//! wins.
//!
//! # Example
//!
//! ```rust,ignore
//! use oci_secrets_config::config::{ConfigChain, EnvConfigAccessor, BundleConfigAccessor};
//!
//! // Environment overrides the application's config file
//! let chain = ConfigChain::new()
//!     .with_accessor(EnvConfigAccessor::new())
//!     .with_accessor(BundleConfigAccessor::from_file("application.yaml")?);
//! ```

use super::ConfigAccessor;
use std::sync::Arc;

/// A chain of configuration accessors with priority ordering
#[derive(Default)]
pub struct ConfigChain {
    accessors: Vec<Arc<dyn ConfigAccessor>>,
}

impl std::fmt::Debug for ConfigChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigChain")
            .field("accessors", &self.accessor_names())
            .finish()
    }
}

impl ConfigChain {
    /// Create a new empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an accessor to the chain (builder pattern)
    ///
    /// Accessors added first have higher priority.
    pub fn with_accessor<A: ConfigAccessor + 'static>(mut self, accessor: A) -> Self {
        self.accessors.push(Arc::new(accessor));
        self
    }

    /// Add a pre-wrapped Arc accessor
    pub fn add_arc_accessor(&mut self, accessor: Arc<dyn ConfigAccessor>) {
        self.accessors.push(accessor);
    }

    /// Get the number of accessors in the chain
    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }

    /// Get accessor names in priority order
    pub fn accessor_names(&self) -> Vec<&str> {
        self.accessors.iter().map(|a| a.name()).collect()
    }
}

impl ConfigAccessor for ConfigChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn get(&self, key: &str) -> Option<String> {
        for accessor in &self.accessors {
            if let Some(value) = accessor.get(key) {
                tracing::trace!(accessor = accessor.name(), key = key, "Configuration key resolved");
                return Some(value);
            }
        }
        None
    }
}
