//! Credential providers and the strategies that produce them

use super::environment::ProbeEnvironment;
use super::{config_file, explicit, instance, resource};
use crate::error::ProviderResult;
use std::fmt;
use std::path::PathBuf;
use zeroize::Zeroizing;

const REDACTED: &str = "<redacted>";

/// Where an API signing key comes from
#[derive(Clone)]
pub enum PrivateKeySource {
    /// PEM text supplied directly in configuration
    Inline(Zeroizing<String>),
    /// PEM file on disk, read by the client when it signs requests
    File(PathBuf),
}

impl fmt::Debug for PrivateKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivateKeySource::Inline(_) => f.debug_tuple("Inline").field(&REDACTED).finish(),
            PrivateKeySource::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

fn redact(value: &Option<Zeroizing<String>>) -> Option<&'static str> {
    value.as_ref().map(|_| REDACTED)
}

/// API key credentials taken directly from configuration
#[derive(Clone)]
pub struct SimpleCredentials {
    pub fingerprint: String,
    pub region: String,
    pub tenant_id: String,
    pub user_id: String,
    pub private_key: PrivateKeySource,
    pub passphrase: Option<Zeroizing<String>>,
}

impl fmt::Debug for SimpleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleCredentials")
            .field("fingerprint", &self.fingerprint)
            .field("region", &self.region)
            .field("tenant_id", &self.tenant_id)
            .field("user_id", &self.user_id)
            .field("private_key", &self.private_key)
            .field("passphrase", &redact(&self.passphrase))
            .finish()
    }
}

/// API key credentials read from a profile of an OCI config file
#[derive(Clone)]
pub struct ConfigFileCredentials {
    pub path: PathBuf,
    pub profile: String,
    pub user: String,
    pub fingerprint: String,
    pub tenancy: String,
    pub region: Option<String>,
    pub key_file: PathBuf,
    pub passphrase: Option<Zeroizing<String>>,
}

impl fmt::Debug for ConfigFileCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigFileCredentials")
            .field("path", &self.path)
            .field("profile", &self.profile)
            .field("user", &self.user)
            .field("fingerprint", &self.fingerprint)
            .field("tenancy", &self.tenancy)
            .field("region", &self.region)
            .field("key_file", &self.key_file)
            .field("passphrase", &redact(&self.passphrase))
            .finish()
    }
}

/// Identity of the compute instance, obtained from its metadata service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstancePrincipalCredentials {
    pub metadata_host: String,
    pub metadata_port: u16,
}

/// Identity of the enclosing resource (functions, jobs, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePrincipalCredentials {
    /// Environment variable whose presence selected this provider
    pub marker: String,
}

/// Capability used to authenticate calls to the vault service
#[derive(Debug, Clone)]
pub enum CredentialProvider {
    Simple(SimpleCredentials),
    ConfigFile(ConfigFileCredentials),
    InstancePrincipal(InstancePrincipalCredentials),
    ResourcePrincipal(ResourcePrincipalCredentials),
}

impl CredentialProvider {
    /// The strategy that produced this provider
    pub fn strategy(&self) -> CredentialStrategy {
        match self {
            CredentialProvider::Simple(_) => CredentialStrategy::Explicit,
            CredentialProvider::ConfigFile(_) => CredentialStrategy::ConfigFile,
            CredentialProvider::InstancePrincipal(_) => CredentialStrategy::InstanceEnvironment,
            CredentialProvider::ResourcePrincipal(_) => CredentialStrategy::ResourceEnvironment,
        }
    }

    /// Region the provider is pinned to, when it carries one
    pub fn region(&self) -> Option<&str> {
        match self {
            CredentialProvider::Simple(c) => Some(&c.region),
            CredentialProvider::ConfigFile(c) => c.region.as_deref(),
            _ => None,
        }
    }
}

/// The ways credentials can be discovered, in resolution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialStrategy {
    /// Complete API key settings under `oci.auth.*`
    Explicit,
    /// A profile in an OCI config file
    ConfigFile,
    /// A reachable instance metadata service
    InstanceEnvironment,
    /// The resource principal marker variable
    ResourceEnvironment,
}

impl CredentialStrategy {
    /// Fixed priority order
    pub const ORDER: [CredentialStrategy; 4] = [
        CredentialStrategy::Explicit,
        CredentialStrategy::ConfigFile,
        CredentialStrategy::InstanceEnvironment,
        CredentialStrategy::ResourceEnvironment,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CredentialStrategy::Explicit => "explicit",
            CredentialStrategy::ConfigFile => "config-file",
            CredentialStrategy::InstanceEnvironment => "instance-principal",
            CredentialStrategy::ResourceEnvironment => "resource-principal",
        }
    }

    /// Probe the environment
    ///
    /// Returns `Ok(None)` when the strategy does not apply here, and an error
    /// only for genuine faults encountered while probing.
    pub fn probe(&self, env: &ProbeEnvironment) -> ProviderResult<Option<CredentialProvider>> {
        match self {
            CredentialStrategy::Explicit => explicit::probe(env),
            CredentialStrategy::ConfigFile => config_file::probe(env),
            CredentialStrategy::InstanceEnvironment => instance::probe(env),
            CredentialStrategy::ResourceEnvironment => resource::probe(env),
        }
    }
}

impl fmt::Display for CredentialStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
