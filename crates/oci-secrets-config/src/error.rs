//! Error types shared by every layer of the secret-bundle config source
//!
//! Only genuine faults are represented here. A credential strategy whose
//! preconditions are unmet reports `Ok(None)`, and a property the source
//! cannot answer for resolves to `Ok(None)` as well; neither ever becomes a
//! `ProviderError`.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while resolving credentials or looking up secrets
#[derive(Error, Debug)]
pub enum ProviderError {
    /// None of the credential strategies applies in this environment
    #[error("No credential provider is applicable (tried: {})", tried.join(", "))]
    NoCredentialProvider {
        /// Names of the strategies that were probed, in order
        tried: Vec<String>,
    },

    /// Configuration is present but unusable
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A file that exists could not be read
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The metadata endpoint probe failed for a reason other than unreachability
    #[error("Probe of {host}:{port} failed: {source}")]
    ProbeFailed {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// A base64 secret payload was malformed
    #[error("Secret payload is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// A decoded secret payload was not UTF-8 text
    #[error("Secret payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A guard pattern failed to compile
    #[error("Invalid guard pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The vault service rejected the caller's credentials
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The vault service or its transport reported a failure
    #[error("Vault service error ({status}): {message}")]
    Transport { status: u16, message: String },

    /// Client construction failed earlier; the failure is permanent for this source
    #[error("Secrets client unavailable: {0}")]
    ClientUnavailable(#[source] Arc<ProviderError>),

    /// The source has been closed
    #[error("Secrets client has been closed")]
    Closed,

    /// Releasing the client was interrupted
    #[error("Interrupted: {0}")]
    Interrupted(String),

    /// Generic provider error
    #[error("Provider error: {0}")]
    Other(String),
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }

    /// Create a transport error
    pub fn transport(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Create an interruption error
    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::Interrupted(message.into())
    }

    /// Whether this error was raised by the remote vault collaborator
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProviderError::Transport { .. } | ProviderError::AuthenticationFailed(_)
        )
    }

    /// The error at the bottom of a memoized client failure
    pub fn root(&self) -> &ProviderError {
        match self {
            ProviderError::ClientUnavailable(inner) => inner.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_provider_lists_strategies() {
        let err = ProviderError::NoCredentialProvider {
            tried: vec!["explicit".into(), "config-file".into()],
        };
        assert_eq!(
            err.to_string(),
            "No credential provider is applicable (tried: explicit, config-file)"
        );
    }

    #[test]
    fn test_root_unwraps_memoized_failure() {
        let inner = Arc::new(ProviderError::NoCredentialProvider { tried: vec![] });
        let err = ProviderError::ClientUnavailable(inner);
        assert!(matches!(err.root(), ProviderError::NoCredentialProvider { .. }));
        assert!(err.to_string().contains("No credential provider"));
    }

    #[test]
    fn test_transport_classification() {
        assert!(ProviderError::transport(404, "missing").is_transport());
        assert!(ProviderError::AuthenticationFailed("bad key".into()).is_transport());
        assert!(!ProviderError::configuration("oops").is_transport());
    }
}
