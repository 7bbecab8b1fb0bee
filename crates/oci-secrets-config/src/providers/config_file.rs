//! Credentials from a profile of an OCI config file
//!
//! The file is the INI-style format written by the OCI CLI:
//!
//! ```text
//! [DEFAULT]
//! user=ocid1.user.oc1..aaaa
//! fingerprint=20:3b:97:13:55:1c:5b:0d:d3:37:d8:50:4e:c5:3a:34
//! key_file=~/.oci/oci_api_key.pem
//! tenancy=ocid1.tenancy.oc1..bbbb
//! region=us-ashburn-1
//!
//! [PROD]
//! region=eu-frankfurt-1
//! ```
//!
//! Keys of the `DEFAULT` section are inherited by every other profile.

use super::credentials::{ConfigFileCredentials, CredentialProvider};
use super::environment::ProbeEnvironment;
use crate::config::ConfigAccessorExt;
use crate::error::{ProviderError, ProviderResult};
use std::collections::HashMap;
use zeroize::Zeroizing;

pub const PROFILE: &str = "oci.config.profile";
pub const PATH: &str = "oci.config.path";
pub const DEFAULT_PROFILE: &str = "DEFAULT";
/// Config file used when none is configured, relative to the home directory
pub const DEFAULT_CONFIG_FILE: &str = ".oci/config";

/// Parsed OCI config file
#[derive(Debug, Clone, Default)]
pub struct OciConfigFile {
    profiles: HashMap<String, HashMap<String, String>>,
}

impl OciConfigFile {
    /// Parse config file content
    ///
    /// Blank lines and lines starting with `#` or `;` are ignored. Any other
    /// line must be a `[section]` header or a `key=value` pair inside one.
    pub fn parse(content: &str) -> ProviderResult<Self> {
        let mut profiles: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current: Option<String> = None;

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(ProviderError::configuration(format!(
                        "Empty profile name on line {}",
                        index + 1
                    )));
                }
                profiles.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ProviderError::configuration(format!(
                    "Expected key=value on line {}",
                    index + 1
                )));
            };
            let Some(profile) = current.as_ref() else {
                return Err(ProviderError::configuration(format!(
                    "Entry outside of any profile on line {}",
                    index + 1
                )));
            };

            profiles
                .entry(profile.clone())
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }

        Ok(Self { profiles })
    }

    /// Profile names, sorted
    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Entries of `name` merged over the `DEFAULT` section
    ///
    /// `None` when the file declares no such profile.
    pub fn profile(&self, name: &str) -> Option<HashMap<String, String>> {
        let entries = self.profiles.get(name)?;
        let mut merged = self
            .profiles
            .get(DEFAULT_PROFILE)
            .cloned()
            .unwrap_or_default();
        merged.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));
        Some(merged)
    }
}

/// Applies when the config file exists; a present but unusable file is fatal
pub(crate) fn probe(env: &ProbeEnvironment) -> ProviderResult<Option<CredentialProvider>> {
    let config = env.config();
    let profile = config
        .get_string(PROFILE)
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

    let path = match config.get_string(PATH) {
        Some(path) => env.expand_home(&path),
        None => match env.home_path(DEFAULT_CONFIG_FILE) {
            Some(path) => path,
            None => {
                tracing::debug!("No config file path and no home directory");
                return Ok(None);
            }
        },
    };

    if !env.files().is_file(&path) {
        tracing::debug!(path = %path.display(), "OCI config file not present");
        return Ok(None);
    }

    let content = env
        .files()
        .read_to_string(&path)
        .map_err(|source| ProviderError::Io {
            path: path.clone(),
            source,
        })?;

    let file = OciConfigFile::parse(&content).map_err(|e| {
        ProviderError::configuration(format!("{}: {}", path.display(), e))
    })?;

    let entries = file.profile(&profile).ok_or_else(|| {
        ProviderError::configuration(format!(
            "Profile {} not found in {}",
            profile,
            path.display()
        ))
    })?;

    let required = |key: &str| -> ProviderResult<String> {
        entries
            .get(key)
            .filter(|value| !value.is_empty())
            .cloned()
            .ok_or_else(|| {
                ProviderError::configuration(format!(
                    "Profile {} in {} is missing {}",
                    profile,
                    path.display(),
                    key
                ))
            })
    };

    let user = required("user")?;
    let fingerprint = required("fingerprint")?;
    let tenancy = required("tenancy")?;
    let key_file = env.expand_home(&required("key_file")?);
    let region = entries.get("region").filter(|v| !v.is_empty()).cloned();
    let passphrase = entries
        .get("pass_phrase")
        .filter(|v| !v.is_empty())
        .cloned()
        .map(Zeroizing::new);

    Ok(Some(CredentialProvider::ConfigFile(ConfigFileCredentials {
        path,
        profile,
        user,
        fingerprint,
        tenancy,
        region,
        key_file,
        passphrase,
    })))
}
