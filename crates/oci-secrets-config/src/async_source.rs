//! Async facade over [`ConfigSource`]
//!
//! Lookups block on file reads, network probes and remote calls. Async hosts
//! reach a source through [`AsyncConfigSource`], which moves each call onto
//! Tokio's blocking thread pool.
//!
//! Interruption marks set while a call runs on the pool are cleared there
//! before the thread is reused. When a call fails with
//! [`ProviderError::Interrupted`], the thread polling the future is marked
//! instead (see [`crate::interrupt`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use oci_secrets_config::{AsyncConfigSource, SecretBundleConfigSource};
//!
//! let source = Arc::new(SecretBundleConfigSource::from_config(config, factory)?);
//! let password = source.get_value_async("db.password").await?;
//! ```

use crate::error::{ProviderError, ProviderResult};
use crate::interrupt;
use crate::source::ConfigSource;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinError;

/// Non-blocking access to a [`ConfigSource`]
#[async_trait]
pub trait AsyncConfigSource: Send + Sync {
    async fn get_value_async(&self, name: &str) -> ProviderResult<Option<String>>;

    async fn close_async(&self) -> ProviderResult<()>;
}

fn join_error(e: JoinError) -> ProviderError {
    if e.is_cancelled() {
        ProviderError::interrupted("blocking task was cancelled")
    } else {
        ProviderError::Other(format!("blocking task panicked: {}", e))
    }
}

/// Run `f` on the blocking pool, moving any interruption mark to the caller
async fn run_blocking<T, F>(f: F) -> ProviderResult<T>
where
    F: FnOnce() -> ProviderResult<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || {
        let result = f();
        interrupt::interrupted();
        result
    })
    .await
    .map_err(join_error)?;

    if let Err(ProviderError::Interrupted(_)) = &result {
        interrupt::interrupt();
    }
    result
}

#[async_trait]
impl<S> AsyncConfigSource for Arc<S>
where
    S: ConfigSource + 'static,
{
    async fn get_value_async(&self, name: &str) -> ProviderResult<Option<String>> {
        let source = Arc::clone(self);
        let name = name.to_string();
        run_blocking(move || ConfigSource::get_value(&*source, &name)).await
    }

    async fn close_async(&self) -> ProviderResult<()> {
        let source = Arc::clone(self);
        run_blocking(move || ConfigSource::close(&*source)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigAccessor;
    use crate::providers::testing::{MemoryFileSystem, StaticEnvironment, StaticProbe};
    use crate::providers::{CredentialProvider, ProbeEnvironment};
    use crate::secrets::client::MockSecretsClient;
    use crate::secrets::{
        MemorySecretsClient, SecretBundle, SecretPayload, SecretsClient, SecretsClientFactory,
    };
    use crate::source::{SecretBundleConfigSource, SecretSourceOptions};
    use std::io;

    fn source(client: Arc<dyn SecretsClient>) -> Arc<SecretBundleConfigSource> {
        let config = MapConfigAccessor::new().with("db.secret.secretId", "ocid1.vaultsecret.xyz");
        let environment = ProbeEnvironment::system(Arc::new(config))
            .with_file_system(Arc::new(MemoryFileSystem::new()))
            .with_network(Arc::new(StaticProbe::failing(io::ErrorKind::TimedOut)))
            .with_environment(Arc::new(
                StaticEnvironment::new().with_var("OCI_RESOURCE_PRINCIPAL_VERSION", "2.2"),
            ))
            .with_home_dir(None);
        let factory: Arc<dyn SecretsClientFactory> = Arc::new(
            move |_: &CredentialProvider| -> ProviderResult<Arc<dyn SecretsClient>> { Ok(client.clone()) },
        );

        Arc::new(SecretBundleConfigSource::new(environment, factory, SecretSourceOptions::new()).unwrap())
    }

    #[tokio::test]
    async fn test_async_lookup() {
        let client = Arc::new(MemorySecretsClient::new().with_text("ocid1.vaultsecret.xyz", "hello"));
        let source = source(client.clone() as Arc<dyn SecretsClient>);

        assert_eq!(
            source.get_value_async("db.secret").await.unwrap().as_deref(),
            Some("hello")
        );
        assert_eq!(source.get_value_async("missing").await.unwrap(), None);

        source.close_async().await.unwrap();
        assert!(client.is_closed());
    }

    #[tokio::test]
    async fn test_async_errors_propagate() {
        let source = source(Arc::new(MemorySecretsClient::new()) as Arc<dyn SecretsClient>);
        let err = source.get_value_async("db.secret").await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport { status: 404, .. }));
    }

    #[test]
    fn test_interrupted_close_marks_caller_not_pool_thread() {
        let mut mock = MockSecretsClient::new();
        mock.expect_get_secret_bundle()
            .times(1)
            .returning(|r| Ok(SecretBundle::new(r.secret_id(), SecretPayload::from_text("hello"))));
        mock.expect_close()
            .times(1)
            .returning(|| Err(ProviderError::interrupted("stop")));
        let source = source(Arc::new(mock));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .max_blocking_threads(1)
            .build()
            .unwrap();

        runtime.block_on(async {
            assert_eq!(
                source.get_value_async("db.secret").await.unwrap().as_deref(),
                Some("hello")
            );

            let err = source.close_async().await.unwrap_err();
            assert!(matches!(err, ProviderError::Interrupted(_)));
            assert!(interrupt::interrupted());

            let pool_marked = tokio::task::spawn_blocking(interrupt::is_interrupted)
                .await
                .unwrap();
            assert!(!pool_marked);
        });
    }
}
