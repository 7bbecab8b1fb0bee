//! The vault service as seen by the lookup pipeline

use super::request::{SecretBundleByNameRequest, SecretBundleRequest, Stage};
use crate::error::ProviderResult;
use crate::providers::CredentialProvider;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Secret content as returned by the service
///
/// Only base64 text is decodable; any other content type deserializes to
/// [`SecretPayload::Unsupported`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "contentType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecretPayload {
    Base64 { content: String },
    #[serde(other)]
    Unsupported,
}

impl SecretPayload {
    /// Base64 payload holding `text`
    pub fn from_text(text: &str) -> Self {
        SecretPayload::Base64 {
            content: STANDARD.encode(text.as_bytes()),
        }
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretPayload::Base64 { .. } => f.write_str("Base64 { content: <redacted> }"),
            SecretPayload::Unsupported => f.write_str("Unsupported"),
        }
    }
}

/// One version of a secret together with its content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretBundle {
    pub secret_id: String,
    #[serde(default)]
    pub version_number: Option<u64>,
    #[serde(default)]
    pub version_name: Option<String>,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub time_created: Option<DateTime<Utc>>,
    #[serde(rename = "secretBundleContent")]
    pub content: SecretPayload,
}

impl SecretBundle {
    pub fn new(secret_id: impl Into<String>, content: SecretPayload) -> Self {
        Self {
            secret_id: secret_id.into(),
            version_number: None,
            version_name: None,
            stages: vec![Stage::Current, Stage::Latest],
            time_created: None,
            content,
        }
    }

    pub fn with_version_number(mut self, number: u64) -> Self {
        self.version_number = Some(number);
        self
    }
}

/// Client for the secret retrieval service
///
/// Implementations must be safe to share across threads; a single client
/// serves every lookup of a config source. Transport and authentication
/// failures are reported as [`ProviderError::Transport`] or
/// [`ProviderError::AuthenticationFailed`] and are passed to callers as-is.
///
/// [`ProviderError::Transport`]: crate::ProviderError::Transport
/// [`ProviderError::AuthenticationFailed`]: crate::ProviderError::AuthenticationFailed
#[cfg_attr(test, mockall::automock)]
pub trait SecretsClient: Send + Sync + fmt::Debug {
    fn get_secret_bundle(&self, request: &SecretBundleRequest) -> ProviderResult<SecretBundle>;

    fn get_secret_bundle_by_name(
        &self,
        request: &SecretBundleByNameRequest,
    ) -> ProviderResult<SecretBundle>;

    /// Release connections and other resources
    ///
    /// May be called more than once. [`ProviderError::Interrupted`] signals
    /// that the release was cut short.
    ///
    /// [`ProviderError::Interrupted`]: crate::ProviderError::Interrupted
    fn close(&self) -> ProviderResult<()> {
        Ok(())
    }
}

/// Builds a client from resolved credentials
pub trait SecretsClientFactory: Send + Sync {
    fn create(&self, provider: &CredentialProvider) -> ProviderResult<Arc<dyn SecretsClient>>;
}

impl<F> SecretsClientFactory for F
where
    F: Fn(&CredentialProvider) -> ProviderResult<Arc<dyn SecretsClient>> + Send + Sync,
{
    fn create(&self, provider: &CredentialProvider) -> ProviderResult<Arc<dyn SecretsClient>> {
        self(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_deserialization() {
        let bundle: SecretBundle = serde_json::from_str(
            r#"{
                "secretId": "ocid1.vaultsecret.xyz",
                "versionNumber": 3,
                "stages": ["CURRENT", "LATEST"],
                "timeCreated": "2024-05-01T12:00:00Z",
                "secretBundleContent": {"contentType": "BASE64", "content": "aGVsbG8="}
            }"#,
        )
        .unwrap();

        assert_eq!(bundle.secret_id, "ocid1.vaultsecret.xyz");
        assert_eq!(bundle.version_number, Some(3));
        assert_eq!(bundle.stages, vec![Stage::Current, Stage::Latest]);
        assert!(bundle.time_created.is_some());
        assert_eq!(
            bundle.content,
            SecretPayload::Base64 {
                content: "aGVsbG8=".into()
            }
        );
    }

    #[test]
    fn test_unknown_content_type_is_unsupported() {
        let payload: SecretPayload =
            serde_json::from_str(r#"{"contentType": "BINARY_REF"}"#).unwrap();
        assert_eq!(payload, SecretPayload::Unsupported);
    }

    #[test]
    fn test_payload_debug_is_redacted() {
        let payload = SecretPayload::from_text("hello");
        assert_eq!(
            payload,
            SecretPayload::Base64 {
                content: "aGVsbG8=".into()
            }
        );
        assert!(!format!("{:?}", payload).contains("aGVsbG8="));
    }
}
