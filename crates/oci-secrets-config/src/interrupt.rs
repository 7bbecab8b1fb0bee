//! Per-thread interruption status
//!
//! When releasing a client is cut short, the releasing thread is marked as
//! interrupted before the error is returned, so that code further up the
//! stack can still observe the request to stop.
//!
//! # Example
//!
//! ```rust,ignore
//! use oci_secrets_config::{interrupt, ConfigSource};
//!
//! if let Err(e) = source.close() {
//!     tracing::warn!(error = %e, "Secret source did not shut down cleanly");
//! }
//! if interrupt::interrupted() {
//!     // stop the shutdown sequence here
//!     return;
//! }
//! ```

use std::cell::Cell;

thread_local! {
    static INTERRUPTED: Cell<bool> = const { Cell::new(false) };
}

/// Mark the calling thread as interrupted
pub fn interrupt() {
    INTERRUPTED.with(|flag| flag.set(true));
}

/// Whether the calling thread is marked as interrupted
pub fn is_interrupted() -> bool {
    INTERRUPTED.with(Cell::get)
}

/// Return and clear the calling thread's interruption status
pub fn interrupted() -> bool {
    INTERRUPTED.with(|flag| flag.replace(false))
}
