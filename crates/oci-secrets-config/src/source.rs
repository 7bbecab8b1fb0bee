//! Config source adapter
//!
//! [`SecretBundleConfigSource`] answers property lookups with secret text
//! from the vault. It never enumerates what it could resolve:
//! [`ConfigSource::property_names`] and [`ConfigSource::properties`] are
//! always empty, and values are only produced for names asked for directly.

use crate::config::ConfigAccessor;
use crate::error::{ProviderError, ProviderResult};
use crate::providers::{CredentialResolver, CredentialStrategy, ProbeEnvironment};
use crate::secrets::{
    Guard, LazyClient, RequestBuilder, RequestHook, RequestMode, SecretIdFallback, SecretLookup,
    SecretsClientFactory, VaultRequest,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Read-only key/value source consulted by a host configuration system
pub trait ConfigSource: Send + Sync {
    fn name(&self) -> &str;

    /// Value for `name`, or `None` when this source has none
    fn get_value(&self, name: &str) -> ProviderResult<Option<String>>;

    fn property_names(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn properties(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn close(&self) -> ProviderResult<()> {
        Ok(())
    }
}

/// Where the lookup guard comes from
#[derive(Debug, Clone, Default)]
pub enum GuardPolicy {
    /// Every name is looked up
    Disabled,
    /// Read `oci.secrets.guard.*` from configuration
    #[default]
    FromConfig,
    /// Use this guard
    Fixed(Guard),
}

/// Every option of a [`SecretBundleConfigSource`]
///
/// | Option | Default |
/// |---|---|
/// | `name` | `oci-secrets` |
/// | `mode` | [`RequestMode::ById`] |
/// | `guard` | [`GuardPolicy::FromConfig`] |
/// | `strategies` | [`CredentialStrategy::ORDER`] |
/// | `request_hook` | none |
/// | `secret_id_fallback` | none |
/// | `default_vault_id` | none |
#[derive(Clone)]
pub struct SecretSourceOptions {
    pub name: String,
    pub mode: RequestMode,
    pub guard: GuardPolicy,
    pub strategies: Vec<CredentialStrategy>,
    pub request_hook: Option<RequestHook>,
    pub secret_id_fallback: Option<SecretIdFallback>,
    pub default_vault_id: Option<String>,
}

impl Default for SecretSourceOptions {
    fn default() -> Self {
        Self {
            name: "oci-secrets".to_string(),
            mode: RequestMode::ById,
            guard: GuardPolicy::FromConfig,
            strategies: CredentialStrategy::ORDER.to_vec(),
            request_hook: None,
            secret_id_fallback: None,
            default_vault_id: None,
        }
    }
}

impl fmt::Debug for SecretSourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretSourceOptions")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("guard", &self.guard)
            .field("strategies", &self.strategies)
            .field("request_hook", &self.request_hook.is_some())
            .field("secret_id_fallback", &self.secret_id_fallback.is_some())
            .field("default_vault_id", &self.default_vault_id)
            .finish()
    }
}

impl SecretSourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for looking secrets up by name, guarded by the configured pattern
    pub fn by_name() -> Self {
        Self {
            name: "oci-secrets-by-name".to_string(),
            mode: RequestMode::ByName,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_guard(mut self, guard: GuardPolicy) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_strategies(mut self, strategies: impl IntoIterator<Item = CredentialStrategy>) -> Self {
        self.strategies = strategies.into_iter().collect();
        self
    }

    pub fn with_request_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(VaultRequest) -> VaultRequest + Send + Sync + 'static,
    {
        self.request_hook = Some(Arc::new(hook));
        self
    }

    pub fn with_secret_id_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.secret_id_fallback = Some(Arc::new(fallback));
        self
    }

    pub fn with_default_vault_id(mut self, vault_id: impl Into<String>) -> Self {
        self.default_vault_id = Some(vault_id.into());
        self
    }
}

/// Config source backed by vault secret bundles
///
/// The secrets client is built on the first lookup that needs it and
/// released on [`ConfigSource::close`] or drop.
#[derive(Debug)]
pub struct SecretBundleConfigSource {
    name: String,
    lookup: SecretLookup,
}

impl SecretBundleConfigSource {
    /// Source probing `environment` for credentials and reading lookup
    /// settings from the environment's configuration
    ///
    /// Fails only if the guard settings are invalid. Credentials are not
    /// resolved until the first lookup.
    pub fn new(
        environment: ProbeEnvironment,
        factory: Arc<dyn SecretsClientFactory>,
        options: SecretSourceOptions,
    ) -> ProviderResult<Self> {
        let config = environment.shared_config();

        let guard = match options.guard {
            GuardPolicy::Disabled => None,
            GuardPolicy::FromConfig => Guard::from_config(config.as_ref())?,
            GuardPolicy::Fixed(guard) => Some(guard),
        };

        let builder = RequestBuilder::new(config, options.mode)
            .with_hook_arc(options.request_hook)
            .with_secret_id_fallback_arc(options.secret_id_fallback)
            .with_default_vault_id(options.default_vault_id);

        let resolver = CredentialResolver::new(environment).with_strategies(options.strategies);

        tracing::debug!(
            source = %options.name,
            mode = ?builder.mode(),
            guarded = guard.is_some(),
            "Created secret bundle config source"
        );

        Ok(Self {
            name: options.name,
            lookup: SecretLookup::new(guard, builder, LazyClient::new(resolver, factory)),
        })
    }

    /// By-id source over the real environment with default options
    pub fn from_config(
        config: Arc<dyn ConfigAccessor>,
        factory: Arc<dyn SecretsClientFactory>,
    ) -> ProviderResult<Self> {
        Self::new(ProbeEnvironment::system(config), factory, SecretSourceOptions::default())
    }

    /// By-name source over the real environment
    pub fn by_name(
        config: Arc<dyn ConfigAccessor>,
        factory: Arc<dyn SecretsClientFactory>,
    ) -> ProviderResult<Self> {
        Self::new(ProbeEnvironment::system(config), factory, SecretSourceOptions::by_name())
    }

    pub fn lookup(&self) -> &SecretLookup {
        &self.lookup
    }
}

impl ConfigSource for SecretBundleConfigSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_value(&self, name: &str) -> ProviderResult<Option<String>> {
        self.lookup.lookup(name)
    }

    fn close(&self) -> ProviderResult<()> {
        self.lookup.close()
    }
}

impl Drop for SecretBundleConfigSource {
    fn drop(&mut self) {
        match self.lookup.close() {
            Ok(()) => {}
            Err(ProviderError::Interrupted(message)) => {
                tracing::warn!(source = %self.name, error = %message, "Release interrupted on drop");
            }
            Err(e) => {
                tracing::warn!(source = %self.name, error = %e, "Failed to release secrets client on drop");
            }
        }
    }
}
