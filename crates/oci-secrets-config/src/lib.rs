//! Configuration source backed by OCI Vault secret bundles.
//!
//! Resolves credentials for the vault service from the runtime environment
//! and answers configuration property lookups by fetching and decoding
//! secrets on demand.
//!
//! # Lookup Flow
//!
//! ```text
//! get_value(name)
//!   └─ Guard           accept-list / deny-list / pattern, no I/O
//!   └─ RequestBuilder  <name>.secretId, <name>.stage, ...
//!   └─ LazyClient      credentials resolved and client built once
//!   └─ SecretsClient   remote fetch
//!   └─ decode_payload  base64 -> UTF-8 text
//! ```
//!
//! # Usage
//!
//! 1. Provide configuration through a [`config::ConfigAccessor`].
//! 2. Provide a [`SecretsClientFactory`] that builds the vault client from
//!    a resolved [`CredentialProvider`].
//! 3. Create a [`SecretBundleConfigSource`] and call
//!    [`ConfigSource::get_value`].
//!
//! ```rust
//! use std::sync::Arc;
//! use oci_secrets_config::config::MapConfigAccessor;
//! use oci_secrets_config::{
//!     ConfigSource, CredentialProvider, MemorySecretsClient, ProviderResult,
//!     SecretBundleConfigSource, SecretsClient,
//! };
//!
//! let config = MapConfigAccessor::new()
//!     .with("oci.auth.fingerprint", "20:3b:97:13")
//!     .with("oci.auth.region", "us-ashburn-1")
//!     .with("oci.auth.tenant-id", "ocid1.tenancy.oc1..aaaa")
//!     .with("oci.auth.user-id", "ocid1.user.oc1..bbbb")
//!     .with("oci.auth.private-key-path", "/etc/oci/key.pem")
//!     .with("db.password.secretId", "ocid1.vaultsecret.oc1..cccc");
//!
//! let client = Arc::new(MemorySecretsClient::new().with_text("ocid1.vaultsecret.oc1..cccc", "s3cr3t"));
//! let factory = move |_: &CredentialProvider| -> ProviderResult<Arc<dyn SecretsClient>> {
//!     Ok(client.clone())
//! };
//!
//! let source = SecretBundleConfigSource::from_config(Arc::new(config), Arc::new(factory))?;
//! assert_eq!(source.get_value("db.password")?.as_deref(), Some("s3cr3t"));
//! # Ok::<(), oci_secrets_config::ProviderError>(())
//! ```

pub mod error;
pub mod config;
pub mod providers;
pub mod secrets;
pub mod source;
pub mod async_source;
pub mod interrupt;

pub use error::{ProviderError, ProviderResult};
pub use providers::{CredentialProvider, CredentialResolver, CredentialStrategy, ProbeEnvironment};
pub use secrets::{
    decode_payload, Guard, LazyClient, MemorySecretsClient, RequestBuilder, SecretBundle,
    SecretLookup, SecretPayload, SecretsClient, SecretsClientFactory, Stage, VaultRequest,
};
pub use source::{ConfigSource, GuardPolicy, SecretBundleConfigSource, SecretSourceOptions};
pub use async_source::AsyncConfigSource;
