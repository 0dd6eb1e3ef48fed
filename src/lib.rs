//! # marker-upload
//!
//! Send a local PDF to a [marker](https://github.com/VikParuchuri/marker)
//! conversion server and collect what comes back: Markdown, optional
//! metadata, and optional images embedded as data URIs.
//!
//! The server does all the conversion work. This crate owns the client side
//! of a fixed contract:
//!
//! ```text
//! POST http://localhost:3333/convert          multipart/form-data
//!   pdf_file        <file bytes>              application/pdf
//!   extract_images  "true" | "false"
//!
//! 2xx ─▶ { "markdown": "...", "metadata": {...}, "images": { "<name>": "data:...;base64,..." } }
//! ```
//!
//! Exactly one request is sent per call and nothing is retried.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use marker_upload::{save_images, upload, UploadConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = UploadConfig::builder()
//!         .file_path("paper.pdf")
//!         .timeout_secs(120)
//!         .build()?;
//!     let output = upload(&config).await?;
//!     println!("{}", output.response.markdown_text());
//!     if let Some(ref images) = output.response.images {
//!         let report = save_images(images, &config.images_dir).await?;
//!         eprintln!("{} images saved", report.saved.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `send-pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{send, upload, upload_sync};
pub use config::{
    parse_extract_images, parse_timeout_arg, UploadConfig, UploadConfigBuilder, DEFAULT_ENDPOINT,
    DEFAULT_IMAGES_DIR, DEFAULT_TIMEOUT_SECS,
};
pub use error::{ImageError, UploadError};
pub use output::{ConversionResponse, ImageReport, SavedImage, UploadOutput, UploadStats};
pub use pipeline::images::{decode_data_uri, save_images};
pub use pipeline::input::{validate_input, InputFile};
pub use progress::{upload_percent, NoopProgressCallback, ProgressCallback, UploadProgressCallback};
