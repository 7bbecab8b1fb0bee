//! Instance principal detection via the metadata service

use super::credentials::{CredentialProvider, InstancePrincipalCredentials};
use super::environment::ProbeEnvironment;
use crate::config::ConfigAccessorExt;
use crate::error::{ProviderError, ProviderResult};
use std::io;
use std::time::Duration;

pub const HOSTNAME: &str = "oci.imds.hostname";
/// Probe timeout key; `0` disables the metadata probe rather than waiting without limit
pub const TIMEOUT_MILLIS: &str = "oci.imds.timeout.milliseconds";
pub const DEFAULT_HOSTNAME: &str = "169.254.169.254";
pub const DEFAULT_TIMEOUT_MILLIS: u64 = 100;
pub const METADATA_PORT: u16 = 80;

/// Probe timeout in milliseconds
///
/// Negative values clamp to zero; unparsable values fall back to the default.
pub(crate) fn timeout_millis(env: &ProbeEnvironment) -> u64 {
    match env.config().get_parsed::<i64>(TIMEOUT_MILLIS) {
        Ok(Some(millis)) => millis.max(0) as u64,
        Ok(None) => DEFAULT_TIMEOUT_MILLIS,
        Err(e) => {
            tracing::debug!(error = %e, default = DEFAULT_TIMEOUT_MILLIS, "Ignoring metadata probe timeout");
            DEFAULT_TIMEOUT_MILLIS
        }
    }
}

/// Errors that mean the endpoint is simply not there
fn is_unreachable(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::TimedOut
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable
    )
}

/// Applies when the metadata endpoint answers within the timeout
pub(crate) fn probe(env: &ProbeEnvironment) -> ProviderResult<Option<CredentialProvider>> {
    let host = env
        .config()
        .get_string(HOSTNAME)
        .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string());
    let millis = timeout_millis(env);

    if millis == 0 {
        tracing::debug!(host = %host, "Metadata probe disabled by zero timeout");
        return Ok(None);
    }

    match env
        .network()
        .probe(&host, METADATA_PORT, Duration::from_millis(millis))
    {
        Ok(()) => Ok(Some(CredentialProvider::InstancePrincipal(
            InstancePrincipalCredentials {
                metadata_host: host,
                metadata_port: METADATA_PORT,
            },
        ))),
        Err(e) if is_unreachable(e.kind()) => {
            tracing::debug!(host = %host, timeout_ms = millis, error = %e, "Metadata service unreachable");
            Ok(None)
        }
        Err(source) => Err(ProviderError::ProbeFailed {
            host,
            port: METADATA_PORT,
            source,
        }),
    }
}
