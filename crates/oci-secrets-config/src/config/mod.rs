//! Configuration Accessors
//!
//! The secret-bundle source never owns configuration; it reads it through a
//! [`ConfigAccessor`] supplied by the host. Credential settings
//! (`oci.auth.*`, `oci.config.*`, `oci.imds.*`), per-property lookup settings
//! (`<name>.secretId`, `<name>.stage`, ...) and guard settings all flow
//! through the same accessor.
//!
//! # Provided Accessors
//!
//! - **Memory**: [`MapConfigAccessor`], for tests and embedding
//! - **Environment Variables**: [`EnvConfigAccessor`], with the usual
//!   `oci.auth.region` → `OCI_AUTH_REGION` mapping
//! - **Config Bundles**: [`BundleConfigAccessor`] for JSON, TOML and YAML files
//! - **Chains**: [`ConfigChain`] combining accessors in priority order
//!
//! # Example
//!
//! ```rust
//! use oci_secrets_config::config::{ConfigAccessorExt, ConfigChain, EnvConfigAccessor, MapConfigAccessor};
//!
//! let defaults = MapConfigAccessor::new().with("oci.config.profile", "DEFAULT");
//! let chain = ConfigChain::new()
//!     .with_accessor(EnvConfigAccessor::new())
//!     .with_accessor(defaults);
//!
//! assert_eq!(chain.get_string("oci.config.profile").as_deref(), Some("DEFAULT"));
//! ```

mod memory;
mod env;
mod bundles;
mod chain;

pub use memory::MapConfigAccessor;
pub use env::EnvConfigAccessor;
pub use bundles::{BundleConfigAccessor, BundleFormat};
pub use chain::ConfigChain;

use crate::error::{ProviderError, ProviderResult};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Read-only access to host configuration
///
/// Implementations must be thread-safe; lookups happen concurrently from
/// every thread that asks the source for a value.
pub trait ConfigAccessor: Send + Sync + fmt::Debug {
    /// Short name of this accessor, used in logs
    fn name(&self) -> &str {
        "config"
    }

    /// Get the raw value for `key`, if present
    fn get(&self, key: &str) -> Option<String>;
}

impl<T: ConfigAccessor + ?Sized> ConfigAccessor for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

impl<T: ConfigAccessor + ?Sized> ConfigAccessor for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// Typed reads on top of [`ConfigAccessor`]
///
/// Blank values are treated as absent. Conversion failures are configuration
/// errors rather than absent values.
pub trait ConfigAccessorExt: ConfigAccessor {
    /// Get a non-blank string value
    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a value converted with [`FromStr`]
    fn get_parsed<T>(&self, key: &str) -> ProviderResult<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get_string(key) {
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
                ProviderError::configuration(format!("Invalid value for {}: {:?} ({})", key, raw, e))
            }),
            None => Ok(None),
        }
    }

    /// Get a comma-separated list value
    ///
    /// A backslash escapes a literal comma. Blank elements are dropped.
    fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get_string(key).map(|raw| split_list(&raw))
    }
}

impl<T: ConfigAccessor + ?Sized> ConfigAccessorExt for T {}

/// Split a comma-separated list, honoring `\,` escapes
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&',') => {
                current.push(',');
                chars.next();
            }
            ',' => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);

    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Escape commas so a value survives [`split_list`] intact
pub(crate) fn escape_list_item(item: &str) -> String {
    item.replace(',', "\\,")
}
