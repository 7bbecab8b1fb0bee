//! Credential Providers
//!
//! Discovers how this process should authenticate to the vault service.
//! Four strategies are tried in a fixed order and the first one that applies
//! produces the [`CredentialProvider`]:
//!
//! 1. **Explicit**: complete `oci.auth.*` settings
//! 2. **Config File**: a profile of `~/.oci/config` (or `oci.config.path`)
//! 3. **Instance Principal**: a reachable instance metadata service
//! 4. **Resource Principal**: the `OCI_RESOURCE_PRINCIPAL_VERSION` marker
//!
//! # Architecture
//!
//! Strategies never touch the process directly. Configuration, files, the
//! network and environment variables are reached through the capability
//! traits in [`traits`], bundled into a [`ProbeEnvironment`]. Tests swap in
//! the doubles from [`testing`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use oci_secrets_config::config::MapConfigAccessor;
//! use oci_secrets_config::providers::{CredentialResolver, CredentialStrategy, ProbeEnvironment};
//!
//! let config = MapConfigAccessor::new()
//!     .with("oci.auth.fingerprint", "20:3b:97:13")
//!     .with("oci.auth.region", "us-ashburn-1")
//!     .with("oci.auth.tenant-id", "ocid1.tenancy.oc1..aaaa")
//!     .with("oci.auth.user-id", "ocid1.user.oc1..bbbb")
//!     .with("oci.auth.private-key-path", "/etc/oci/key.pem");
//!
//! let resolver = CredentialResolver::new(ProbeEnvironment::system(Arc::new(config)));
//! let provider = resolver.resolve()?;
//! assert_eq!(provider.strategy(), CredentialStrategy::Explicit);
//! # Ok::<(), oci_secrets_config::ProviderError>(())
//! ```

pub mod traits;
pub mod testing;
pub mod explicit;
pub mod config_file;
pub mod instance;
pub mod resource;
mod environment;
mod credentials;
mod chain;

pub use traits::{Environment, FileSystem, NetworkProbe, SystemEnvironment, SystemFileSystem, TcpProbe};
pub use environment::ProbeEnvironment;
pub use credentials::{
    ConfigFileCredentials, CredentialProvider, CredentialStrategy, InstancePrincipalCredentials,
    PrivateKeySource, ResourcePrincipalCredentials, SimpleCredentials,
};
pub use config_file::OciConfigFile;
pub use chain::CredentialResolver;
