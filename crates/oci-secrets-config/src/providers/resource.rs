//! Resource principal detection

use super::credentials::{CredentialProvider, ResourcePrincipalCredentials};
use super::environment::ProbeEnvironment;
use crate::error::ProviderResult;

/// Set by the platform for workloads running under a resource principal
pub const VERSION_VARIABLE: &str = "OCI_RESOURCE_PRINCIPAL_VERSION";

/// Applies when the marker variable is present, whatever its value
pub(crate) fn probe(env: &ProbeEnvironment) -> ProviderResult<Option<CredentialProvider>> {
    if env.env().var_os(VERSION_VARIABLE).is_none() {
        tracing::debug!(variable = VERSION_VARIABLE, "Resource principal marker not set");
        return Ok(None);
    }

    Ok(Some(CredentialProvider::ResourcePrincipal(
        ResourcePrincipalCredentials {
            marker: VERSION_VARIABLE.to_string(),
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigAccessor;
    use crate::providers::testing::StaticEnvironment;
    use std::sync::Arc;

    fn env(vars: StaticEnvironment) -> ProbeEnvironment {
        ProbeEnvironment::system(Arc::new(MapConfigAccessor::new())).with_environment(Arc::new(vars))
    }

    #[test]
    fn test_marker_presence() {
        assert!(probe(&env(StaticEnvironment::new())).unwrap().is_none());

        let provider = probe(&env(StaticEnvironment::new().with_var(VERSION_VARIABLE, ""))).unwrap();
        assert!(matches!(provider, Some(CredentialProvider::ResourcePrincipal(_))));
    }
}
