//! The environment snapshot a credential resolution runs against

use super::traits::{Environment, FileSystem, NetworkProbe, SystemEnvironment, SystemFileSystem, TcpProbe};
use crate::config::ConfigAccessor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Capabilities and configuration visible to credential strategies
///
/// Cloning is cheap; every capability is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ProbeEnvironment {
    config: Arc<dyn ConfigAccessor>,
    files: Arc<dyn FileSystem>,
    network: Arc<dyn NetworkProbe>,
    env: Arc<dyn Environment>,
    home_dir: Option<PathBuf>,
}

impl ProbeEnvironment {
    /// Environment backed by the real file system, network and process
    /// environment, with the home directory from the `dirs` crate
    pub fn system(config: Arc<dyn ConfigAccessor>) -> Self {
        Self {
            config,
            files: Arc::new(SystemFileSystem),
            network: Arc::new(TcpProbe),
            env: Arc::new(SystemEnvironment),
            home_dir: dirs::home_dir(),
        }
    }

    pub fn with_config(mut self, config: Arc<dyn ConfigAccessor>) -> Self {
        self.config = config;
        self
    }

    pub fn with_file_system(mut self, files: Arc<dyn FileSystem>) -> Self {
        self.files = files;
        self
    }

    pub fn with_network(mut self, network: Arc<dyn NetworkProbe>) -> Self {
        self.network = network;
        self
    }

    pub fn with_environment(mut self, env: Arc<dyn Environment>) -> Self {
        self.env = env;
        self
    }

    /// Override (or clear) the home directory
    pub fn with_home_dir(mut self, home_dir: Option<PathBuf>) -> Self {
        self.home_dir = home_dir;
        self
    }

    pub fn config(&self) -> &dyn ConfigAccessor {
        self.config.as_ref()
    }

    pub fn shared_config(&self) -> Arc<dyn ConfigAccessor> {
        Arc::clone(&self.config)
    }

    pub fn files(&self) -> &dyn FileSystem {
        self.files.as_ref()
    }

    pub fn network(&self) -> &dyn NetworkProbe {
        self.network.as_ref()
    }

    pub fn env(&self) -> &dyn Environment {
        self.env.as_ref()
    }

    pub fn home_dir(&self) -> Option<&Path> {
        self.home_dir.as_deref()
    }

    /// Resolve `relative` against the home directory
    pub fn home_path(&self, relative: impl AsRef<Path>) -> Option<PathBuf> {
        self.home_dir.as_ref().map(|home| home.join(relative))
    }

    /// Expand a leading `~` to the home directory
    ///
    /// Paths without a tilde, and tilde paths when no home directory is
    /// known, are returned unchanged.
    pub fn expand_home(&self, raw: &str) -> PathBuf {
        match (raw, self.home_dir.as_ref()) {
            ("~", Some(home)) => home.clone(),
            (raw, Some(home)) if raw.starts_with("~/") => home.join(&raw[2..]),
            (raw, _) => PathBuf::from(raw),
        }
    }
}
