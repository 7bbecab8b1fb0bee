//! Property name to secret text

use super::client::SecretPayload;
use super::guard::Guard;
use super::lazy::LazyClient;
use super::request::{RequestBuilder, VaultRequest};
use crate::error::ProviderResult;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Decode a secret payload to text
///
/// Base64 content must decode to valid UTF-8; anything else is an error.
/// Unsupported content types decode to `None`.
pub fn decode_payload(payload: &SecretPayload) -> ProviderResult<Option<String>> {
    match payload {
        SecretPayload::Base64 { content } => {
            let bytes = STANDARD.decode(content.trim())?;
            Ok(Some(String::from_utf8(bytes)?))
        }
        SecretPayload::Unsupported => Ok(None),
    }
}

/// Guard, build, fetch and decode
#[derive(Debug)]
pub struct SecretLookup {
    guard: Option<Guard>,
    builder: RequestBuilder,
    client: LazyClient,
}

impl SecretLookup {
    pub fn new(guard: Option<Guard>, builder: RequestBuilder, client: LazyClient) -> Self {
        Self {
            guard,
            builder,
            client,
        }
    }

    /// Look up the secret text for `name`
    ///
    /// `Ok(None)` when the guard rejects the name, when no request can be
    /// built for it, or when the payload type is unsupported. Client,
    /// transport and decoding failures are returned as errors.
    pub fn lookup(&self, name: &str) -> ProviderResult<Option<String>> {
        if let Some(guard) = &self.guard {
            if !guard.permits(name) {
                return Ok(None);
            }
        }

        let Some(request) = self.builder.build(name)? else {
            return Ok(None);
        };

        let client = self.client.get()?;
        let bundle = match &request {
            VaultRequest::ById(r) => client.get_secret_bundle(r)?,
            VaultRequest::ByName(r) => client.get_secret_bundle_by_name(r)?,
        };

        tracing::debug!(
            property = name,
            secret = request.identifier(),
            version = ?bundle.version_number,
            "Fetched secret bundle"
        );

        let value = decode_payload(&bundle.content)?;
        if value.is_none() {
            tracing::debug!(property = name, "Unsupported secret content type");
        }
        Ok(value)
    }

    pub fn guard(&self) -> Option<&Guard> {
        self.guard.as_ref()
    }

    pub fn client(&self) -> &LazyClient {
        &self.client
    }

    pub fn close(&self) -> ProviderResult<()> {
        self.client.close()
    }
}
