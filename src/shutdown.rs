//! Ctrl+C handling for export runs.
//!
//! The export loop polls a [`ShutdownFlag`] between pages, so an interrupt
//! never lands between writing a page's rows and logging its cursor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared handle to a shutdown flag.
pub type SharedShutdown = Arc<ShutdownFlag>;

/// Set once when the user asks the export to stop.
#[derive(Debug, Default)]
pub struct ShutdownFlag {
    requested: AtomicBool,
}

impl ShutdownFlag {
    /// Create a new shared flag.
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::default())
    }

    /// Request shutdown. Returns `true` on the first request only.
    pub fn request_shutdown(&self) -> bool {
        !self.requested.swap(true, Ordering::SeqCst)
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Spawn a task that sets `flag` on Ctrl+C.
///
/// Repeated Ctrl+C presses never kill the process: a page's rows and its
/// cursor are always committed before the export stops.
pub fn install_ctrl_c_handler(flag: SharedShutdown) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if flag.request_shutdown() {
                tracing::warn!("Ctrl+C received - stopping after the current page");
            } else {
                tracing::warn!("Shutdown already requested - waiting for the current page to commit");
            }
        }
    });
}
