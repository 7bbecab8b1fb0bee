//! Explicit API key credentials from `oci.auth.*` settings

use super::credentials::{CredentialProvider, PrivateKeySource, SimpleCredentials};
use super::environment::ProbeEnvironment;
use crate::config::ConfigAccessorExt;
use crate::error::{ProviderError, ProviderResult};
use zeroize::Zeroizing;

pub const FINGERPRINT: &str = "oci.auth.fingerprint";
pub const REGION: &str = "oci.auth.region";
pub const TENANT_ID: &str = "oci.auth.tenant-id";
pub const USER_ID: &str = "oci.auth.user-id";
pub const PASSPHRASE: &str = "oci.auth.passphrase";
pub const PRIVATE_KEY: &str = "oci.auth.private-key";
pub const PRIVATE_KEY_PATH: &str = "oci.auth.private-key-path";
/// Older spelling of [`PRIVATE_KEY_PATH`]
pub const LEGACY_KEY_FILE: &str = "oci.auth.keyFile";
/// Key file used when no key is configured, relative to the home directory
pub const DEFAULT_KEY_FILE: &str = ".oci/oci_api_key.pem";

/// Applies when fingerprint, region, tenant id and user id are all set
pub(crate) fn probe(env: &ProbeEnvironment) -> ProviderResult<Option<CredentialProvider>> {
    let config = env.config();

    let fingerprint = config.get_string(FINGERPRINT);
    let region = config.get_string(REGION);
    let tenant_id = config.get_string(TENANT_ID);
    let user_id = config.get_string(USER_ID);

    let (Some(fingerprint), Some(region), Some(tenant_id), Some(user_id)) =
        (fingerprint, region, tenant_id, user_id)
    else {
        let missing: Vec<&str> = [FINGERPRINT, REGION, TENANT_ID, USER_ID]
            .into_iter()
            .filter(|key| config.get_string(key).is_none())
            .collect();
        tracing::debug!(missing = ?missing, "Explicit credentials incomplete");
        return Ok(None);
    };

    let private_key = private_key(env)?;
    let passphrase = config.get_string(PASSPHRASE).map(Zeroizing::new);

    Ok(Some(CredentialProvider::Simple(SimpleCredentials {
        fingerprint,
        region,
        tenant_id,
        user_id,
        private_key,
        passphrase,
    })))
}

/// Inline key first, then the configured key file, then the default key file
fn private_key(env: &ProbeEnvironment) -> ProviderResult<PrivateKeySource> {
    let config = env.config();

    if let Some(pem) = config.get_string(PRIVATE_KEY) {
        return Ok(PrivateKeySource::Inline(Zeroizing::new(pem)));
    }

    if let Some(path) = config
        .get_string(PRIVATE_KEY_PATH)
        .or_else(|| config.get_string(LEGACY_KEY_FILE))
    {
        return Ok(PrivateKeySource::File(env.expand_home(&path)));
    }

    env.home_path(DEFAULT_KEY_FILE)
        .map(PrivateKeySource::File)
        .ok_or_else(|| {
            ProviderError::configuration(format!(
                "No {} or {} configured and no home directory for the default key file",
                PRIVATE_KEY, PRIVATE_KEY_PATH
            ))
        })
}
