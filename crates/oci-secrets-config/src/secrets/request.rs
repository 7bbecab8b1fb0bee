//! Secret bundle requests and the builder that derives them from configuration
//!
//! For a property `db.secret`, the by-id mode reads:
//!
//! | Key | Meaning |
//! |---|---|
//! | `db.secret.secretId` | secret OCID (required) |
//! | `db.secret.opcRequestId` | correlation id |
//! | `db.secret.secretVersionName` | version name |
//! | `db.secret.versionNumber` | version number |
//! | `db.secret.stage` | `CURRENT`, `PENDING`, `LATEST`, `PREVIOUS`, `DEPRECATED` |
//!
//! The by-name mode reads `db.secret.secretName` (defaulting to `db.secret`)
//! and `db.secret.vaultId` instead of the secret id.

use crate::config::{ConfigAccessor, ConfigAccessorExt};
use crate::error::{ProviderError, ProviderResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Named pointer into a secret's version history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Current,
    Pending,
    #[default]
    Latest,
    Previous,
    Deprecated,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Current => "CURRENT",
            Stage::Pending => "PENDING",
            Stage::Latest => "LATEST",
            Stage::Previous => "PREVIOUS",
            Stage::Deprecated => "DEPRECATED",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CURRENT" => Ok(Stage::Current),
            "PENDING" => Ok(Stage::Pending),
            "LATEST" => Ok(Stage::Latest),
            "PREVIOUS" => Ok(Stage::Previous),
            "DEPRECATED" => Ok(Stage::Deprecated),
            other => Err(ProviderError::configuration(format!("Unknown stage: {}", other))),
        }
    }
}

/// Which version of a secret to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    Name(String),
    Number(u64),
    Stage(Stage),
}

/// Optional settings shared by both request kinds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionOptions {
    pub opc_request_id: Option<String>,
    pub version_name: Option<String>,
    pub version_number: Option<u64>,
    pub stage: Option<Stage>,
}

impl VersionOptions {
    /// The effective selector: name, then number, then stage, then `LATEST`
    pub fn selector(&self) -> VersionSelector {
        if let Some(name) = &self.version_name {
            VersionSelector::Name(name.clone())
        } else if let Some(number) = self.version_number {
            VersionSelector::Number(number)
        } else {
            VersionSelector::Stage(self.stage.unwrap_or_default())
        }
    }

    fn read(config: &dyn ConfigAccessor, name: &str) -> ProviderResult<Self> {
        Ok(Self {
            opc_request_id: config.get_string(&format!("{}.opcRequestId", name)),
            version_name: config.get_string(&format!("{}.secretVersionName", name)),
            version_number: config.get_parsed(&format!("{}.versionNumber", name))?,
            stage: config.get_parsed(&format!("{}.stage", name))?,
        })
    }
}

fn non_blank(value: String, what: &str) -> ProviderResult<String> {
    if value.trim().is_empty() {
        Err(ProviderError::configuration(format!("{} must not be empty", what)))
    } else {
        Ok(value)
    }
}

/// Fetch a secret bundle by secret OCID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretBundleRequest {
    secret_id: String,
    pub options: VersionOptions,
}

impl SecretBundleRequest {
    pub fn new(secret_id: impl Into<String>) -> ProviderResult<Self> {
        Ok(Self {
            secret_id: non_blank(secret_id.into(), "secret id")?,
            options: VersionOptions::default(),
        })
    }

    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    pub fn selector(&self) -> VersionSelector {
        self.options.selector()
    }

    pub fn with_opc_request_id(mut self, id: impl Into<String>) -> Self {
        self.options.opc_request_id = Some(id.into());
        self
    }

    pub fn with_version_name(mut self, name: impl Into<String>) -> Self {
        self.options.version_name = Some(name.into());
        self
    }

    pub fn with_version_number(mut self, number: u64) -> Self {
        self.options.version_number = Some(number);
        self
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.options.stage = Some(stage);
        self
    }
}

/// Fetch a secret bundle by secret name within a vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretBundleByNameRequest {
    secret_name: String,
    vault_id: String,
    pub options: VersionOptions,
}

impl SecretBundleByNameRequest {
    pub fn new(secret_name: impl Into<String>, vault_id: impl Into<String>) -> ProviderResult<Self> {
        Ok(Self {
            secret_name: non_blank(secret_name.into(), "secret name")?,
            vault_id: non_blank(vault_id.into(), "vault id")?,
            options: VersionOptions::default(),
        })
    }

    pub fn secret_name(&self) -> &str {
        &self.secret_name
    }

    pub fn vault_id(&self) -> &str {
        &self.vault_id
    }

    pub fn selector(&self) -> VersionSelector {
        self.options.selector()
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.options.stage = Some(stage);
        self
    }

    pub fn with_version_number(mut self, number: u64) -> Self {
        self.options.version_number = Some(number);
        self
    }
}

/// A single secret fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultRequest {
    ById(SecretBundleRequest),
    ByName(SecretBundleByNameRequest),
}

impl VaultRequest {
    /// The secret id or secret name
    pub fn identifier(&self) -> &str {
        match self {
            VaultRequest::ById(r) => r.secret_id(),
            VaultRequest::ByName(r) => r.secret_name(),
        }
    }

    pub fn options(&self) -> &VersionOptions {
        match self {
            VaultRequest::ById(r) => &r.options,
            VaultRequest::ByName(r) => &r.options,
        }
    }

    pub fn options_mut(&mut self) -> &mut VersionOptions {
        match self {
            VaultRequest::ById(r) => &mut r.options,
            VaultRequest::ByName(r) => &mut r.options,
        }
    }
}

/// How property names map to secrets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    #[default]
    ById,
    ByName,
}

/// Post-processing applied to every built request
pub type RequestHook = Arc<dyn Fn(VaultRequest) -> VaultRequest + Send + Sync>;

/// Supplies a secret id for properties without a `<name>.secretId` setting
pub type SecretIdFallback = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Derives a [`VaultRequest`] from a property name and its settings
#[derive(Clone)]
pub struct RequestBuilder {
    config: Arc<dyn ConfigAccessor>,
    mode: RequestMode,
    hook: Option<RequestHook>,
    secret_id_fallback: Option<SecretIdFallback>,
    default_vault_id: Option<String>,
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("config", &self.config.name())
            .field("mode", &self.mode)
            .field("hook", &self.hook.is_some())
            .field("secret_id_fallback", &self.secret_id_fallback.is_some())
            .field("default_vault_id", &self.default_vault_id)
            .finish()
    }
}

impl RequestBuilder {
    pub fn new(config: Arc<dyn ConfigAccessor>, mode: RequestMode) -> Self {
        Self {
            config,
            mode,
            hook: None,
            secret_id_fallback: None,
            default_vault_id: None,
        }
    }

    pub fn by_id(config: Arc<dyn ConfigAccessor>) -> Self {
        Self::new(config, RequestMode::ById)
    }

    pub fn by_name(config: Arc<dyn ConfigAccessor>) -> Self {
        Self::new(config, RequestMode::ByName)
    }

    /// Post-process every request before it is returned
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(VaultRequest) -> VaultRequest + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn with_hook_arc(mut self, hook: Option<RequestHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Consulted when `<name>.secretId` is not configured
    pub fn with_secret_id_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.secret_id_fallback = Some(Arc::new(fallback));
        self
    }

    pub fn with_secret_id_fallback_arc(mut self, fallback: Option<SecretIdFallback>) -> Self {
        self.secret_id_fallback = fallback;
        self
    }

    /// Vault used by the by-name mode when `<name>.vaultId` is not configured
    pub fn with_default_vault_id(mut self, vault_id: Option<String>) -> Self {
        self.default_vault_id = vault_id.filter(|v| !v.trim().is_empty());
        self
    }

    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Build the request for `name`
    ///
    /// Returns `Ok(None)` for a blank name, without reading configuration,
    /// and when the secret cannot be identified. Malformed version settings
    /// are errors.
    pub fn build(&self, name: &str) -> ProviderResult<Option<VaultRequest>> {
        if name.trim().is_empty() {
            return Ok(None);
        }

        let config = self.config.as_ref();
        let request = match self.mode {
            RequestMode::ById => {
                let secret_id = config
                    .get_string(&format!("{}.secretId", name))
                    .or_else(|| self.secret_id_fallback.as_ref().and_then(|f| f(name)));
                let Some(secret_id) = secret_id else {
                    tracing::trace!(property = name, "No secret id configured");
                    return Ok(None);
                };

                let mut request = SecretBundleRequest::new(secret_id)?;
                request.options = VersionOptions::read(config, name)?;
                VaultRequest::ById(request)
            }
            RequestMode::ByName => {
                let secret_name = config
                    .get_string(&format!("{}.secretName", name))
                    .unwrap_or_else(|| name.to_string());
                let vault_id = config
                    .get_string(&format!("{}.vaultId", name))
                    .or_else(|| self.default_vault_id.clone());
                let Some(vault_id) = vault_id else {
                    tracing::trace!(property = name, "No vault id configured");
                    return Ok(None);
                };

                let mut request = SecretBundleByNameRequest::new(secret_name, vault_id)?;
                request.options = VersionOptions::read(config, name)?;
                VaultRequest::ByName(request)
            }
        };

        Ok(Some(match &self.hook {
            Some(hook) => hook(request),
            None => request,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigAccessor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingAccessor {
        reads: AtomicUsize,
    }

    impl ConfigAccessor for CountingAccessor {
        fn get(&self, _key: &str) -> Option<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            None
        }
    }

    fn by_id(config: MapConfigAccessor) -> RequestBuilder {
        RequestBuilder::by_id(Arc::new(config))
    }

    #[test]
    fn test_stage_parsing() {
        assert_eq!("latest".parse::<Stage>().unwrap(), Stage::Latest);
        assert_eq!(" Previous ".parse::<Stage>().unwrap(), Stage::Previous);
        assert!("newest".parse::<Stage>().is_err());
        assert_eq!(Stage::default(), Stage::Latest);
        assert_eq!(serde_json::to_string(&Stage::Deprecated).unwrap(), "\"DEPRECATED\"");
    }

    #[test]
    fn test_selector_precedence() {
        let mut options = VersionOptions::default();
        assert_eq!(options.selector(), VersionSelector::Stage(Stage::Latest));

        options.stage = Some(Stage::Current);
        assert_eq!(options.selector(), VersionSelector::Stage(Stage::Current));

        options.version_number = Some(4);
        assert_eq!(options.selector(), VersionSelector::Number(4));

        options.version_name = Some("v4".into());
        assert_eq!(options.selector(), VersionSelector::Name("v4".into()));
    }

    #[test]
    fn test_requests_reject_empty_identifiers() {
        assert!(SecretBundleRequest::new("").is_err());
        assert!(SecretBundleRequest::new("   ").is_err());
        assert!(SecretBundleByNameRequest::new("db", "").is_err());
        assert!(SecretBundleByNameRequest::new("", "ocid1.vault.oc1..v").is_err());
    }

    #[test]
    fn test_build_by_id() {
        let config = MapConfigAccessor::new()
            .with("db.secret.secretId", "ocid1.vaultsecret.xyz")
            .with("db.secret.opcRequestId", "req-1")
            .with("db.secret.versionNumber", "7")
            .with("db.secret.stage", "current");

        let request = by_id(config).build("db.secret").unwrap().unwrap();
        match &request {
            VaultRequest::ById(r) => {
                assert_eq!(r.secret_id(), "ocid1.vaultsecret.xyz");
                assert_eq!(r.options.opc_request_id.as_deref(), Some("req-1"));
                assert_eq!(r.options.stage, Some(Stage::Current));
                assert_eq!(r.selector(), VersionSelector::Number(7));
            }
            other => panic!("expected by-id request, got {:?}", other),
        }
    }

    #[test]
    fn test_build_defaults_to_latest() {
        let config = MapConfigAccessor::new().with("db.secret.secretId", "ocid1.vaultsecret.xyz");
        let request = by_id(config).build("db.secret").unwrap().unwrap();
        assert_eq!(request.options().selector(), VersionSelector::Stage(Stage::Latest));
    }

    #[test]
    fn test_missing_secret_id_is_no_request() {
        assert!(by_id(MapConfigAccessor::new()).build("db.secret").unwrap().is_none());
    }

    #[test]
    fn test_secret_id_fallback() {
        let builder = by_id(MapConfigAccessor::new())
            .with_secret_id_fallback(|name| Some(format!("ocid1.vaultsecret.{}", name)));
        let request = builder.build("api").unwrap().unwrap();
        assert_eq!(request.identifier(), "ocid1.vaultsecret.api");
    }

    #[test]
    fn test_blank_name_reads_nothing() {
        let config = Arc::new(CountingAccessor::default());
        let builder = RequestBuilder::by_id(config.clone());

        assert!(builder.build("").unwrap().is_none());
        assert!(builder.build(" \t").unwrap().is_none());
        assert_eq!(config.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_malformed_version_number_is_error() {
        let config = MapConfigAccessor::new()
            .with("db.secret.secretId", "ocid1.vaultsecret.xyz")
            .with("db.secret.versionNumber", "seven");
        let err = by_id(config).build("db.secret").unwrap_err();
        assert!(matches!(err, ProviderError::ConfigurationError(_)));
    }

    #[test]
    fn test_build_by_name() {
        let config = MapConfigAccessor::new()
            .with("db.password.vaultId", "ocid1.vault.oc1..v")
            .with("db.password.secretVersionName", "blue");
        let builder = RequestBuilder::by_name(Arc::new(config));

        match builder.build("db.password").unwrap() {
            Some(VaultRequest::ByName(r)) => {
                assert_eq!(r.secret_name(), "db.password");
                assert_eq!(r.vault_id(), "ocid1.vault.oc1..v");
                assert_eq!(r.selector(), VersionSelector::Name("blue".into()));
            }
            other => panic!("expected by-name request, got {:?}", other),
        }
    }

    #[test]
    fn test_by_name_vault_resolution() {
        let config = Arc::new(MapConfigAccessor::new().with("api.secretName", "external-api-key"));

        let builder = RequestBuilder::by_name(config.clone());
        assert!(builder.build("api").unwrap().is_none());

        let builder = builder.with_default_vault_id(Some("ocid1.vault.oc1..default".into()));
        let request = builder.build("api").unwrap().unwrap();
        assert_eq!(request.identifier(), "external-api-key");
    }

    #[test]
    fn test_hook_post_processes() {
        let config = MapConfigAccessor::new().with("db.secret.secretId", "ocid1.vaultsecret.xyz");
        let builder = by_id(config).with_hook(|mut request| {
            request.options_mut().opc_request_id = Some("from-hook".into());
            request
        });

        let request = builder.build("db.secret").unwrap().unwrap();
        assert_eq!(request.options().opc_request_id.as_deref(), Some("from-hook"));
    }
}
