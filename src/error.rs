//! Error types for the marker-upload library.
//!
//! Two error types for two failure modes:
//!
//! * [`UploadError`]: **Fatal**: the single request/response cycle cannot
//!   complete (file inaccessible, server unreachable, timeout, bad status,
//!   unparsable body). Returned as `Err(UploadError)` from [`crate::upload`]
//!   and friends.
//!
//! * [`ImageError`]: **Non-fatal**: one embedded image could not be decoded
//!   or written. Collected in [`crate::output::ImageReport`] so the remaining
//!   images are still saved.
//!
//! The `Display` text of every variant is the console diagnostic printed by
//! the `send-pdf` binary.

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the marker-upload library.
#[derive(Debug, Error)]
pub enum UploadError {
    // ── Pre-flight errors ─────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Cannot access file {path:?}: no such file")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Cannot access file {path:?}: permission denied\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The path exists but is a directory or another non-regular file.
    #[error("Cannot access file {path:?}: not a regular file")]
    NotAFile { path: PathBuf },

    /// Any other I/O failure while opening or inspecting the file.
    #[error("Cannot access file {path:?}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Transport errors ──────────────────────────────────────────────────
    /// Nothing is listening on the endpoint.
    #[error("Could not connect to the server at {url}. Is it running?")]
    ConnectionRefused { url: String },

    /// TCP connect did not complete within the timeout.
    #[error("Connection timed out. The server took too long to respond.")]
    ConnectionTimeout { url: String },

    /// No upload activity and no response headers within the idle timeout.
    #[error("Request timeout - server is not responding (idle for {secs}s)")]
    RequestTimeout { secs: u64 },

    /// Response body stalled for longer than the idle timeout.
    #[error("Response timeout - server took too long to respond (idle for {secs}s)")]
    ResponseTimeout { secs: u64 },

    /// Any other transport-level failure.
    #[error("Error sending request: {0}")]
    Transport(String),

    // ── Response errors ───────────────────────────────────────────────────
    /// Server answered outside the 2xx range.
    #[error("Server responded with status code {}\nResponse: {body}", .status.as_u16())]
    NonSuccessStatus { status: StatusCode, body: String },

    /// 2xx response whose body is not the expected JSON document.
    #[error("Error parsing server response: {source}\nRaw response: {body}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the image output directory.
    #[error("Failed to create image directory '{path}': {source}")]
    ImagesDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl UploadError {
    /// True for failures detected before any network activity.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            UploadError::FileNotFound { .. }
                | UploadError::PermissionDenied { .. }
                | UploadError::NotAFile { .. }
                | UploadError::FileAccess { .. }
                | UploadError::InvalidConfig(_)
        )
    }

    /// True for connection and timeout failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            UploadError::ConnectionRefused { .. }
                | UploadError::ConnectionTimeout { .. }
                | UploadError::RequestTimeout { .. }
                | UploadError::ResponseTimeout { .. }
                | UploadError::Transport(_)
        )
    }

    /// Process exit status for this failure.
    ///
    /// Without `strict`, a non-2xx status or an unparsable body is only
    /// reported and the process still exits 0. `strict` turns every failure
    /// into exit status 1.
    pub fn exit_code(&self, strict: bool) -> i32 {
        match self {
            UploadError::NonSuccessStatus { .. } | UploadError::MalformedResponse { .. }
                if !strict =>
            {
                0
            }
            _ => 1,
        }
    }
}

/// A non-fatal error for a single extracted image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The image key cannot be used as a file name.
    #[error("Image '{name}': unusable file name")]
    InvalidName { name: String },

    /// The data URI payload is not valid base64.
    #[error("Image '{name}': invalid base64 payload: {source}")]
    Decode {
        name: String,
        #[source]
        source: base64::DecodeError,
    },

    /// Writing the decoded bytes failed.
    #[error("Image '{name}': failed to write '{path}': {source}")]
    Write {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ImageError {
    /// Key of the image this error refers to.
    pub fn name(&self) -> &str {
        match self {
            ImageError::InvalidName { name }
            | ImageError::Decode { name, .. }
            | ImageError::Write { name, .. } => name,
        }
    }
}
