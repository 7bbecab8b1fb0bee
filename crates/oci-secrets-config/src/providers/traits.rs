//! Environment capabilities probed by credential strategies
//!
//! Each credential strategy looks at the runtime environment through one or
//! more of these traits instead of touching the process directly. The
//! `System*` implementations are what production uses; tests substitute the
//! fakes in [`super::testing`].

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

/// Read access to the file system
pub trait FileSystem: Send + Sync + fmt::Debug {
    /// Whether `path` names an existing regular file
    fn is_file(&self, path: &Path) -> bool;

    /// Read the whole file at `path` as UTF-8 text
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Reachability check against a network endpoint
///
/// `Ok(())` means the endpoint answered within `timeout`. Errors carry the
/// underlying [`io::ErrorKind`] so callers can tell unreachable endpoints
/// from genuine faults.
pub trait NetworkProbe: Send + Sync + fmt::Debug {
    fn probe(&self, host: &str, port: u16, timeout: Duration) -> io::Result<()>;
}

/// Read access to process environment variables
pub trait Environment: Send + Sync + fmt::Debug {
    fn var_os(&self, name: &str) -> Option<OsString>;
}

/// The real file system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFileSystem;

impl FileSystem for SystemFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// TCP connect probe
///
/// Resolves the host and attempts a connection to each resolved address in
/// turn. The first successful connection wins; otherwise the last connect
/// error is returned. Resolution failures are returned as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

impl NetworkProbe for TcpProbe {
    fn probe(&self, host: &str, port: u16, timeout: Duration) -> io::Result<()> {
        let addrs: Vec<_> = (host, port).to_socket_addrs()?.collect();
        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} did not resolve to any address", host),
            ));
        }

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(_stream) => return Ok(()),
                Err(e) => {
                    tracing::trace!(address = %addr, error = %e, "Connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| io::Error::from(io::ErrorKind::TimedOut)))
    }
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var_os(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_system_file_system() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, "[DEFAULT]\n").unwrap();

        let fs = SystemFileSystem;
        assert!(fs.is_file(&path));
        assert!(!fs.is_file(dir.path()));
        assert!(!fs.is_file(&dir.path().join("absent")));
        assert_eq!(fs.read_to_string(&path).unwrap(), "[DEFAULT]\n");
    }

    #[test]
    fn test_tcp_probe_reaches_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = TcpProbe.probe("127.0.0.1", port, Duration::from_millis(500));
        assert!(result.is_ok());
    }

    #[test]
    fn test_tcp_probe_refused() {
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = TcpProbe
            .probe("127.0.0.1", port, Duration::from_millis(500))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
    }

    #[test]
    fn test_system_environment() {
        std::env::set_var("OCI_SECRETS_TRAITS_TEST_MARKER", "1");
        assert!(SystemEnvironment.var_os("OCI_SECRETS_TRAITS_TEST_MARKER").is_some());
        std::env::remove_var("OCI_SECRETS_TRAITS_TEST_MARKER");
        assert!(SystemEnvironment.var_os("OCI_SECRETS_TRAITS_TEST_MARKER").is_none());
    }
}
