//! In-memory secrets client for local development and tests

use super::client::{SecretBundle, SecretPayload, SecretsClient};
use super::request::{SecretBundleByNameRequest, SecretBundleRequest, VersionSelector};
use crate::error::{ProviderError, ProviderResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixtures {
    #[serde(default)]
    secrets: Vec<SecretBundle>,
    #[serde(default)]
    named: Vec<NamedFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamedFixture {
    vault_id: String,
    secret_name: String,
    bundle: SecretBundle,
}

/// Secrets client serving bundles from memory
///
/// Unknown secrets fail with a 404 transport error, like the real service.
/// Every fetch is counted, which makes the client usable as a spy.
#[derive(Debug, Default)]
pub struct MemorySecretsClient {
    by_id: RwLock<HashMap<String, SecretBundle>>,
    by_name: RwLock<HashMap<(String, String), SecretBundle>>,
    calls: AtomicUsize,
    closes: AtomicUsize,
    closed: AtomicBool,
}

impl MemorySecretsClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load bundles from a JSON document
    ///
    /// ```json
    /// {
    ///   "secrets": [
    ///     {"secretId": "ocid1.vaultsecret.xyz",
    ///      "secretBundleContent": {"contentType": "BASE64", "content": "aGVsbG8="}}
    ///   ],
    ///   "named": [
    ///     {"vaultId": "ocid1.vault.v", "secretName": "db-password",
    ///      "bundle": {"secretId": "ocid1.vaultsecret.abc",
    ///                 "secretBundleContent": {"contentType": "BASE64", "content": "czNjcjN0"}}}
    ///   ]
    /// }
    /// ```
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        let fixtures: Fixtures = serde_json::from_str(json)
            .map_err(|e| ProviderError::SerializationError(e.to_string()))?;

        let client = Self::new();
        for bundle in fixtures.secrets {
            client.insert(bundle.secret_id.clone(), bundle);
        }
        for named in fixtures.named {
            client.insert_named(named.vault_id, named.secret_name, named.bundle);
        }
        Ok(client)
    }

    /// Add a bundle addressable by secret id
    pub fn with_secret(self, bundle: SecretBundle) -> Self {
        self.insert(bundle.secret_id.clone(), bundle);
        self
    }

    /// Add a text secret addressable by secret id
    pub fn with_text(self, secret_id: &str, text: &str) -> Self {
        self.with_secret(SecretBundle::new(secret_id, SecretPayload::from_text(text)))
    }

    /// Add a text secret addressable by vault and secret name
    pub fn with_named_text(self, vault_id: &str, secret_name: &str, text: &str) -> Self {
        let bundle = SecretBundle::new(
            format!("{}/{}", vault_id, secret_name),
            SecretPayload::from_text(text),
        );
        self.insert_named(vault_id.to_string(), secret_name.to_string(), bundle);
        self
    }

    pub fn insert(&self, secret_id: String, bundle: SecretBundle) {
        self.by_id
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(secret_id, bundle);
    }

    pub fn insert_named(&self, vault_id: String, secret_name: String, bundle: SecretBundle) {
        self.by_name
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((vault_id, secret_name), bundle);
    }

    /// Number of fetches served or refused
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of times `close` was called
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn check_open(&self) -> ProviderResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.is_closed() {
            return Err(ProviderError::Closed);
        }
        Ok(())
    }
}

/// A pinned version number must match the stored bundle
fn select(bundle: &SecretBundle, selector: &VersionSelector) -> bool {
    match (selector, bundle.version_number) {
        (VersionSelector::Number(wanted), Some(actual)) => *wanted == actual,
        _ => true,
    }
}

impl SecretsClient for MemorySecretsClient {
    fn get_secret_bundle(&self, request: &SecretBundleRequest) -> ProviderResult<SecretBundle> {
        self.check_open()?;
        self.by_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(request.secret_id())
            .filter(|bundle| select(bundle, &request.selector()))
            .cloned()
            .ok_or_else(|| {
                ProviderError::transport(404, format!("Secret {} not found", request.secret_id()))
            })
    }

    fn get_secret_bundle_by_name(
        &self,
        request: &SecretBundleByNameRequest,
    ) -> ProviderResult<SecretBundle> {
        self.check_open()?;
        let key = (request.vault_id().to_string(), request.secret_name().to_string());
        self.by_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .filter(|bundle| select(bundle, &request.selector()))
            .cloned()
            .ok_or_else(|| {
                ProviderError::transport(
                    404,
                    format!("Secret {} not found in vault {}", request.secret_name(), request.vault_id()),
                )
            })
    }

    fn close(&self) -> ProviderResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
