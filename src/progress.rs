//! Progress-callback trait for upload and download events.
//!
//! Inject an [`Arc<dyn UploadProgressCallback>`] via
//! [`crate::config::UploadConfigBuilder::progress_callback`] to receive
//! events while the PDF streams out and the response streams back.
//!
//! # Example
//!
//! ```rust
//! use marker_upload::{UploadConfig, UploadProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
//!
//! struct SentBytes(AtomicU64);
//!
//! impl UploadProgressCallback for SentBytes {
//!     fn on_upload_progress(&self, sent: u64, _total: u64) {
//!         self.0.store(sent, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = UploadConfig::builder()
//!     .file_path("paper.pdf")
//!     .progress_callback(Arc::new(SentBytes(AtomicU64::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called as the request body is consumed and the response body arrives.
///
/// The transport pulls the file stream from its own task, so implementations
/// must be `Send + Sync`. All methods default to no-ops.
pub trait UploadProgressCallback: Send + Sync {
    /// Called once before the request is issued.
    ///
    /// # Arguments
    /// * `total_bytes`: size of the PDF being uploaded
    fn on_upload_start(&self, total_bytes: u64) {
        let _ = total_bytes;
    }

    /// Called each time the transport pulls another chunk of the file.
    ///
    /// # Arguments
    /// * `sent`: file bytes handed to the transport so far
    /// * `total`: size of the PDF
    fn on_upload_progress(&self, sent: u64, total: u64) {
        let _ = (sent, total);
    }

    /// Called when the last file chunk has been pulled.
    fn on_upload_complete(&self, total_bytes: u64) {
        let _ = total_bytes;
    }

    /// Called when response headers arrive.
    fn on_response_start(&self, status: u16) {
        let _ = status;
    }

    /// Called for every body chunk; total length is not known in advance.
    fn on_response_chunk(&self, len: usize) {
        let _ = len;
    }

    /// Called once the whole body has been received.
    fn on_response_complete(&self, total_bytes: u64) {
        let _ = total_bytes;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl UploadProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::UploadConfig`].
pub type ProgressCallback = Arc<dyn UploadProgressCallback>;

/// Percentage of `sent` over `total`, capped at 100. An empty file counts as done.
pub fn upload_percent(sent: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (sent as f64 / total as f64 * 100.0).min(100.0)
}
