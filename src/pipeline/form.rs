//! Multipart body construction.
//!
//! The form has exactly two parts:
//!
//! | part | kind | value |
//! |------|------|-------|
//! | `pdf_file` | binary | the file, streamed; filename = base name, `application/pdf` |
//! | `extract_images` | text | `"true"` or `"false"` |
//!
//! The file is never read into memory. It is wrapped in a `ReaderStream` and
//! every chunk the transport pulls is reported to the progress callback and
//! resets the idle timer.

use crate::config::{UploadConfig, EXTRACT_IMAGES_FIELD, FILE_FIELD};
use crate::error::UploadError;
use crate::pipeline::idle::IdleTimer;
use crate::pipeline::input::InputFile;
use futures::TryStreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use std::io::SeekFrom;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncSeekExt;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// MIME type declared for the file part, whatever the file actually holds.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Running count of file bytes pulled by the transport.
pub type SentCounter = Arc<AtomicU64>;

/// Build the two-part form for `input`.
///
/// `timer`, when present, is touched on every chunk so upload activity keeps
/// the request alive. The returned counter tracks how much of the file the
/// transport has consumed.
pub async fn build_form(
    input: &InputFile,
    config: &UploadConfig,
    timer: Option<IdleTimer>,
) -> Result<(Form, SentCounter), UploadError> {
    let access = |e: std::io::Error| UploadError::FileAccess {
        path: input.path.clone(),
        source: e,
    };
    // Same open file as validation; rewind in case it was streamed before.
    let mut file = tokio::fs::File::from_std(input.file.try_clone().map_err(access)?);
    file.seek(SeekFrom::Start(0)).await.map_err(access)?;

    let total = input.size_bytes;
    let sent: SentCounter = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&sent);
    let callback = config.progress_callback.clone();

    let stream = ReaderStream::new(file).inspect_ok(move |chunk| {
        let len = chunk.len() as u64;
        let so_far = counter.fetch_add(len, Ordering::SeqCst) + len;
        if let Some(ref t) = timer {
            t.touch();
        }
        if let Some(ref cb) = callback {
            cb.on_upload_progress(so_far, total);
            if so_far >= total && so_far - len < total {
                cb.on_upload_complete(total);
            }
        }
    });

    let part = Part::stream_with_length(Body::wrap_stream(stream), total)
        .file_name(input.file_name.clone())
        .mime_str(PDF_CONTENT_TYPE)
        .map_err(|e| UploadError::Internal(format!("content type: {e}")))?;

    debug!(
        "Form: {}={} ({} bytes), {}={}",
        FILE_FIELD,
        input.file_name,
        total,
        EXTRACT_IMAGES_FIELD,
        config.extract_images_value()
    );

    let form = Form::new()
        .part(FILE_FIELD, part)
        .text(EXTRACT_IMAGES_FIELD, config.extract_images_value());
    Ok((form, sent))
}
