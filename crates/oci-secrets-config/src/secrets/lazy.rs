//! At-most-once construction of the secrets client
//!
//! The first call to [`LazyClient::get`] resolves credentials and builds the
//! client; every later call, on any thread, gets the same instance. Threads
//! racing on the first call block until the winner has finished, and never
//! observe a partially built client.
//!
//! A failed resolution or construction is remembered. The source stays
//! unusable and later calls return [`ProviderError::ClientUnavailable`]
//! wrapping the original cause without probing the environment again.

use super::client::{SecretsClient, SecretsClientFactory};
use crate::error::{ProviderError, ProviderResult};
use crate::interrupt;
use crate::providers::{CredentialResolver, CredentialStrategy};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct Initialized {
    strategy: CredentialStrategy,
    client: Arc<dyn SecretsClient>,
}

type Outcome = Result<Initialized, Arc<ProviderError>>;

/// Lazily constructed, shared secrets client
pub struct LazyClient {
    resolver: CredentialResolver,
    factory: Arc<dyn SecretsClientFactory>,
    cell: OnceCell<Outcome>,
    closed: AtomicBool,
    released: AtomicBool,
}

impl fmt::Debug for LazyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.cell.get() {
            None => "uninitialized",
            Some(Ok(_)) => "ready",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("LazyClient")
            .field("strategies", &self.resolver.strategies())
            .field("state", &state)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl LazyClient {
    pub fn new(resolver: CredentialResolver, factory: Arc<dyn SecretsClientFactory>) -> Self {
        Self {
            resolver,
            factory,
            cell: OnceCell::new(),
            closed: AtomicBool::new(false),
            released: AtomicBool::new(false),
        }
    }

    /// The shared client, constructing it on first use
    pub fn get(&self) -> ProviderResult<Arc<dyn SecretsClient>> {
        if self.is_closed() {
            return Err(ProviderError::Closed);
        }

        match self.cell.get_or_init(|| self.construct()) {
            Ok(initialized) => {
                // close() may have run while we were constructing
                if self.is_closed() {
                    if let Err(e) = self.release(&initialized.client) {
                        tracing::warn!(error = %e, "Failed to release secrets client closed during construction");
                    }
                    return Err(ProviderError::Closed);
                }
                Ok(Arc::clone(&initialized.client))
            }
            Err(cause) => Err(ProviderError::ClientUnavailable(Arc::clone(cause))),
        }
    }

    fn construct(&self) -> Outcome {
        let built = self.resolver.resolve().and_then(|provider| {
            let client = self.factory.create(&provider)?;
            Ok(Initialized {
                strategy: provider.strategy(),
                client,
            })
        });

        match built {
            Ok(initialized) => {
                tracing::info!(strategy = initialized.strategy.name(), "Secrets client constructed");
                Ok(initialized)
            }
            Err(e) => {
                tracing::error!(error = %e, "Secrets client construction failed; source is unusable");
                Err(Arc::new(e))
            }
        }
    }

    /// Whether construction has been attempted, successfully or not
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Strategy that produced the client, once constructed
    pub fn strategy(&self) -> Option<CredentialStrategy> {
        match self.cell.get() {
            Some(Ok(initialized)) => Some(initialized.strategy),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Release the client if one was constructed
    ///
    /// Only the first call does anything. If the client reports
    /// [`ProviderError::Interrupted`], the calling thread is marked as
    /// interrupted (see [`crate::interrupt`]) before the error is returned.
    pub fn close(&self) -> ProviderResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        match self.cell.get() {
            Some(Ok(initialized)) => self.release(&initialized.client),
            _ => Ok(()),
        }
    }

    /// Close `client` unless another caller already has
    fn release(&self, client: &Arc<dyn SecretsClient>) -> ProviderResult<()> {
        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        match client.close() {
            Ok(()) => {
                tracing::debug!("Secrets client released");
                Ok(())
            }
            Err(ProviderError::Interrupted(message)) => {
                interrupt::interrupt();
                tracing::warn!(error = %message, "Secrets client release interrupted");
                Err(ProviderError::Interrupted(message))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Secrets client release failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigAccessor;
    use crate::providers::testing::{MemoryFileSystem, StaticEnvironment, StaticProbe};
    use crate::providers::{CredentialProvider, ProbeEnvironment};
    use crate::secrets::client::MockSecretsClient;
    use crate::secrets::memory::MemorySecretsClient;
    use std::io;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::time::Duration;

    fn environment(marker: bool, probe: Arc<StaticProbe>) -> ProbeEnvironment {
        let mut env = StaticEnvironment::new();
        if marker {
            env = env.with_var("OCI_RESOURCE_PRINCIPAL_VERSION", "2.2");
        }
        ProbeEnvironment::system(Arc::new(MapConfigAccessor::new()))
            .with_file_system(Arc::new(MemoryFileSystem::new()))
            .with_network(probe)
            .with_environment(Arc::new(env))
            .with_home_dir(None)
    }

    fn resolver(marker: bool) -> CredentialResolver {
        CredentialResolver::new(environment(
            marker,
            Arc::new(StaticProbe::failing(io::ErrorKind::TimedOut)),
        ))
    }

    fn counting_factory(built: Arc<AtomicUsize>) -> Arc<dyn SecretsClientFactory> {
        Arc::new(move |_: &CredentialProvider| -> ProviderResult<Arc<dyn SecretsClient>> {
            built.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            Ok(Arc::new(MemorySecretsClient::new()))
        })
    }

    #[test]
    fn test_concurrent_first_access_constructs_once() {
        const THREADS: usize = 16;
        let built = Arc::new(AtomicUsize::new(0));
        let lazy = LazyClient::new(resolver(true), counting_factory(built.clone()));
        let barrier = Barrier::new(THREADS);

        let clients: Vec<Arc<dyn SecretsClient>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        lazy.get().unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(built.load(Ordering::SeqCst), 1);
        let first = Arc::as_ptr(&clients[0]);
        assert!(clients
            .iter()
            .all(|client| std::ptr::addr_eq(Arc::as_ptr(client), first)));
        assert_eq!(lazy.strategy(), Some(CredentialStrategy::ResourceEnvironment));
    }

    #[test]
    fn test_failure_is_memoized() {
        let probe = Arc::new(StaticProbe::failing(io::ErrorKind::TimedOut));
        let built = Arc::new(AtomicUsize::new(0));
        let lazy = LazyClient::new(
            CredentialResolver::new(environment(false, probe.clone())),
            counting_factory(built.clone()),
        );

        for _ in 0..3 {
            let err = lazy.get().unwrap_err();
            assert!(matches!(err, ProviderError::ClientUnavailable(_)));
            assert!(matches!(err.root(), ProviderError::NoCredentialProvider { .. }));
        }

        assert_eq!(probe.calls(), 1);
        assert_eq!(built.load(Ordering::SeqCst), 0);
        assert!(lazy.is_initialized());
    }

    #[test]
    fn test_factory_failure_is_memoized() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let factory: Arc<dyn SecretsClientFactory> = Arc::new(
            move |_: &CredentialProvider| -> ProviderResult<Arc<dyn SecretsClient>> {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::AuthenticationFailed("bad key".into()))
            },
        );
        let lazy = LazyClient::new(resolver(true), factory);

        assert!(lazy.get().is_err());
        let err = lazy.get().unwrap_err();
        assert!(matches!(err.root(), ProviderError::AuthenticationFailed(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_close_before_use_is_noop() {
        let built = Arc::new(AtomicUsize::new(0));
        let lazy = LazyClient::new(resolver(true), counting_factory(built.clone()));

        lazy.close().unwrap();
        assert!(matches!(lazy.get(), Err(ProviderError::Closed)));
        assert_eq!(built.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_close_releases_once() {
        let client = Arc::new(MemorySecretsClient::new());
        let shared = client.clone();
        let factory: Arc<dyn SecretsClientFactory> = Arc::new(
            move |_: &CredentialProvider| -> ProviderResult<Arc<dyn SecretsClient>> {
                Ok(shared.clone())
            },
        );
        let lazy = LazyClient::new(resolver(true), factory);

        lazy.get().unwrap();
        lazy.close().unwrap();
        lazy.close().unwrap();

        assert_eq!(client.close_count(), 1);
        assert!(matches!(lazy.get(), Err(ProviderError::Closed)));
    }

    #[test]
    fn test_close_during_construction_releases_once() {
        let client = Arc::new(MemorySecretsClient::new());
        let shared = client.clone();
        let factory: Arc<dyn SecretsClientFactory> = Arc::new(
            move |_: &CredentialProvider| -> ProviderResult<Arc<dyn SecretsClient>> {
                std::thread::sleep(Duration::from_millis(200));
                Ok(shared.clone())
            },
        );
        let lazy = LazyClient::new(resolver(true), factory);
        let barrier = Barrier::new(3);

        let results: Vec<ProviderResult<Arc<dyn SecretsClient>>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        lazy.get()
                    })
                })
                .collect();

            barrier.wait();
            std::thread::sleep(Duration::from_millis(50));
            lazy.close().unwrap();

            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results
            .iter()
            .all(|result| matches!(result, Err(ProviderError::Closed))));
        assert_eq!(client.close_count(), 1);

        lazy.close().unwrap();
        assert_eq!(client.close_count(), 1);
    }

    #[test]
    fn test_interrupted_close_marks_thread() {
        let mut mock = MockSecretsClient::new();
        mock.expect_close()
            .times(1)
            .returning(|| Err(ProviderError::interrupted("shutdown")));
        let mock: Arc<dyn SecretsClient> = Arc::new(mock);
        let factory: Arc<dyn SecretsClientFactory> = Arc::new(
            move |_: &CredentialProvider| -> ProviderResult<Arc<dyn SecretsClient>> {
                Ok(mock.clone())
            },
        );
        let lazy = LazyClient::new(resolver(true), factory);
        lazy.get().unwrap();

        let err = lazy.close().unwrap_err();
        assert!(matches!(err, ProviderError::Interrupted(_)));
        assert!(interrupt::interrupted());
    }
}
