//! In-memory doubles for the environment capabilities
//!
//! These make every credential strategy testable without a home directory,
//! a metadata endpoint or process-wide environment variables. They are
//! public so hosts can exercise their own wiring the same way.

use super::traits::{Environment, FileSystem, NetworkProbe};
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

#[derive(Debug, Clone)]
enum MemoryFile {
    Contents(String),
    Unreadable(io::ErrorKind),
}

/// File system holding a fixed set of files
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<HashMap<PathBuf, MemoryFile>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a readable file
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), MemoryFile::Contents(contents.into()));
        self
    }

    /// Add a file that exists but fails to read with `kind`
    pub fn with_unreadable_file(self, path: impl Into<PathBuf>, kind: io::ErrorKind) -> Self {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), MemoryFile::Unreadable(kind));
        self
    }
}

impl FileSystem for MemoryFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        match self
            .files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            Some(MemoryFile::Contents(contents)) => Ok(contents.clone()),
            Some(MemoryFile::Unreadable(kind)) => Err(io::Error::from(*kind)),
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }
}

/// Network probe with a fixed outcome that counts its invocations
#[derive(Debug)]
pub struct StaticProbe {
    outcome: Option<io::ErrorKind>,
    calls: AtomicUsize,
}

impl StaticProbe {
    /// Every probe succeeds
    pub fn reachable() -> Self {
        Self {
            outcome: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every probe fails with `kind`
    pub fn failing(kind: io::ErrorKind) -> Self {
        Self {
            outcome: Some(kind),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of probes performed so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NetworkProbe for StaticProbe {
    fn probe(&self, host: &str, port: u16, timeout: Duration) -> io::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(host, port, timeout_ms = timeout.as_millis() as u64, "Static probe");
        match self.outcome {
            None => Ok(()),
            Some(kind) => Err(io::Error::from(kind)),
        }
    }
}

/// Fixed set of environment variables
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    vars: HashMap<String, OsString>,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl Environment for StaticEnvironment {
    fn var_os(&self, name: &str) -> Option<OsString> {
        self.vars.get(name).cloned()
    }
}
