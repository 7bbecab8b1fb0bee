//! Credential Resolution Chain
//!
//! Tries each [`CredentialStrategy`] in priority order against one
//! [`ProbeEnvironment`]. The first strategy that applies wins. A strategy
//! that does not apply is skipped silently; a strategy that fails while
//! probing stops the chain with that error.
//!
//! # Example
//!
//! ```rust,ignore
//! use oci_secrets_config::providers::{CredentialResolver, ProbeEnvironment};
//!
//! let resolver = CredentialResolver::new(ProbeEnvironment::system(config));
//! let provider = resolver.resolve()?;
//! ```

use super::credentials::{CredentialProvider, CredentialStrategy};
use super::environment::ProbeEnvironment;
use crate::error::{ProviderError, ProviderResult};

/// Resolves the credential provider for one environment
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    environment: ProbeEnvironment,
    strategies: Vec<CredentialStrategy>,
}

impl CredentialResolver {
    /// Resolver using every strategy in the standard order
    pub fn new(environment: ProbeEnvironment) -> Self {
        Self {
            environment,
            strategies: CredentialStrategy::ORDER.to_vec(),
        }
    }

    /// Restrict resolution to `strategies`, tried in the given order
    pub fn with_strategies(mut self, strategies: impl IntoIterator<Item = CredentialStrategy>) -> Self {
        self.strategies = strategies.into_iter().collect();
        self
    }

    /// Strategies in the order they will be tried
    pub fn strategies(&self) -> &[CredentialStrategy] {
        &self.strategies
    }

    pub fn environment(&self) -> &ProbeEnvironment {
        &self.environment
    }

    /// Return the provider of the first applicable strategy
    ///
    /// Fails with [`ProviderError::NoCredentialProvider`] when none applies.
    pub fn resolve(&self) -> ProviderResult<CredentialProvider> {
        for strategy in &self.strategies {
            match strategy.probe(&self.environment) {
                Ok(Some(provider)) => {
                    tracing::info!(strategy = strategy.name(), "Resolved credential provider");
                    return Ok(provider);
                }
                Ok(None) => {
                    tracing::debug!(strategy = strategy.name(), "Credential strategy not applicable");
                }
                Err(e) => {
                    tracing::warn!(strategy = strategy.name(), error = %e, "Credential strategy failed");
                    return Err(e);
                }
            }
        }

        Err(ProviderError::NoCredentialProvider {
            tried: self.strategies.iter().map(|s| s.name().to_string()).collect(),
        })
    }
}
