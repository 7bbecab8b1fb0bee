//! Environment Variable Configuration Accessor
//!
//! Reads configuration keys from the process environment.
//!
//! # Key Naming Convention
//!
//! Dotted configuration keys are mapped to environment variable names the
//! same way MicroProfile Config does. For `oci.auth.tenant-id`, these names
//! are tried in order:
//! - `oci.auth.tenant-id` (exact)
//! - `oci_auth_tenant_id` (non-alphanumerics replaced with `_`)
//! - `OCI_AUTH_TENANT_ID` (the same, uppercased)
//!
//! With a prefix configured, each candidate is prefixed with `{PREFIX}_`.
//!
//! # Example
//!
//! ```rust,ignore
//! use oci_secrets_config::config::EnvConfigAccessor;
//!
//! // OCI_AUTH_REGION=us-ashburn-1 answers "oci.auth.region"
//! let env = EnvConfigAccessor::new();
//! let region = env.get("oci.auth.region");
//! ```

use super::ConfigAccessor;

/// Configuration accessor backed by environment variables
///
/// Read-only; reflects the environment at query time.
#[derive(Debug, Clone, Default)]
pub struct EnvConfigAccessor {
    prefix: Option<String>,
}

impl EnvConfigAccessor {
    /// Create an accessor with no prefix
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accessor that only considers variables starting with `{prefix}_`
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Candidate environment variable names for a key, in lookup order
    pub fn candidate_names(&self, key: &str) -> Vec<String> {
        let sanitized: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let upper = sanitized.to_uppercase();

        let mut names = vec![key.to_string()];
        for name in [sanitized, upper] {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        match &self.prefix {
            Some(prefix) => names
                .into_iter()
                .map(|name| format!("{}_{}", prefix, name))
                .collect(),
            None => names,
        }
    }
}

impl ConfigAccessor for EnvConfigAccessor {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.candidate_names(key).into_iter().find_map(|name| {
            match std::env::var(&name) {
                Ok(value) => Some(value),
                Err(std::env::VarError::NotPresent) => None,
                Err(std::env::VarError::NotUnicode(_)) => {
                    tracing::warn!(variable = %name, "Ignoring environment variable with invalid UTF-8");
                    None
                }
            }
        })
    }
}
