//! The request/response lifecycle.
//!
//! One call, one request, one response. Nothing is retried: every failure is
//! terminal and comes back as a single [`UploadError`], so a timeout that
//! tears down the connection is reported exactly once.
//!
//! ```text
//! validate ──▶ build form ──▶ POST (idle-watched) ──▶ read body (per-chunk timeout) ──▶ parse
//! ```

use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::output::{ConversionResponse, UploadOutput, UploadStats};
use crate::pipeline::form;
use crate::pipeline::idle::IdleTimer;
use crate::pipeline::input::{validate_input, InputFile};
use crate::progress::ProgressCallback;
use futures::StreamExt;
use reqwest::{Client, Response};
use std::io::ErrorKind;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Validate `config.file_path` and upload it.
///
/// # Errors
/// - pre-flight: file missing, unreadable or not a regular file; no
///   connection is attempted
/// - transport: refused, connect timeout, idle timeout, broken connection
/// - response: non-2xx status or a body that is not the expected JSON
pub async fn upload(config: &UploadConfig) -> Result<UploadOutput, UploadError> {
    let input = validate_input(&config.file_path)?;
    send(&input, config).await
}

/// Upload an already validated file.
pub async fn send(input: &InputFile, config: &UploadConfig) -> Result<UploadOutput, UploadError> {
    let total_start = Instant::now();
    let idle = config.idle_timeout();
    let timer = idle.map(IdleTimer::new);
    let callback = config.progress_callback.as_ref();

    let client = build_client(idle)?;
    let (form, sent) = form::build_form(input, config, timer.clone()).await?;

    info!(
        "POST {} ({}, {} bytes, extract_images={})",
        config.endpoint,
        input.file_name,
        input.size_bytes,
        config.extract_images_value()
    );
    if let Some(cb) = callback {
        cb.on_upload_start(input.size_bytes);
        if input.size_bytes == 0 {
            cb.on_upload_complete(0);
        }
    }

    // ── Upload phase: idle until response headers ─────────────────────────
    let request = client.post(&config.endpoint).multipart(form).send();
    let result = match timer {
        Some(ref t) => {
            t.touch();
            tokio::select! {
                r = request => r,
                _ = t.expired() => {
                    warn!("No activity for {}s before response headers", config.timeout_secs);
                    return Err(UploadError::RequestTimeout { secs: config.timeout_secs });
                }
            }
        }
        None => request.await,
    };
    let response = result.map_err(|e| classify(e, &config.endpoint))?;
    let upload_duration_ms = total_start.elapsed().as_millis() as u64;

    let status = response.status();
    debug!("Response headers: {} after {}ms", status, upload_duration_ms);
    if let Some(cb) = callback {
        cb.on_response_start(status.as_u16());
    }

    // ── Response phase ───────────────────────────────────────────────────
    let (body, chunks) = read_body(response, idle, config, callback).await?;

    let stats = UploadStats {
        status: status.as_u16(),
        bytes_sent: sent.load(Ordering::SeqCst),
        bytes_received: body.len() as u64,
        response_chunks: chunks,
        upload_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    if !status.is_success() {
        return Err(UploadError::NonSuccessStatus {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    let response: ConversionResponse =
        serde_json::from_slice(&body).map_err(|e| UploadError::MalformedResponse {
            source: e,
            body: String::from_utf8_lossy(&body).into_owned(),
        })?;

    info!(
        "Conversion received: {} bytes markdown, {} images, {}ms total",
        response.markdown_text().len(),
        response.images.as_ref().map_or(0, |m| m.len()),
        stats.total_duration_ms
    );

    Ok(UploadOutput { response, stats })
}

/// Blocking wrapper around [`upload`].
///
/// Builds a current-thread tokio runtime internally; do not call from
/// inside an async context.
pub fn upload_sync(config: &UploadConfig) -> Result<UploadOutput, UploadError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| UploadError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(upload(config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn build_client(idle: Option<Duration>) -> Result<Client, UploadError> {
    // The endpoint is a local service; proxy env vars must not reroute it.
    let mut builder = Client::builder().no_proxy();
    if let Some(d) = idle {
        builder = builder.connect_timeout(d);
    }
    builder
        .build()
        .map_err(|e| UploadError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Accumulate the body, applying the idle timeout to every chunk.
async fn read_body(
    response: Response,
    idle: Option<Duration>,
    config: &UploadConfig,
    callback: Option<&ProgressCallback>,
) -> Result<(Vec<u8>, usize), UploadError> {
    let mut stream = std::pin::pin!(response.bytes_stream());
    let mut body = Vec::new();
    let mut chunks = 0usize;

    loop {
        let next = match idle {
            Some(d) => tokio::time::timeout(d, stream.next()).await.map_err(|_| {
                warn!("Response body stalled for {}s", config.timeout_secs);
                UploadError::ResponseTimeout {
                    secs: config.timeout_secs,
                }
            })?,
            None => stream.next().await,
        };
        let Some(chunk) = next else { break };
        let chunk = chunk.map_err(|e| classify(e, &config.endpoint))?;

        chunks += 1;
        body.extend_from_slice(&chunk);
        if let Some(cb) = callback {
            cb.on_response_chunk(chunk.len());
        }
    }

    if let Some(cb) = callback {
        cb.on_response_complete(body.len() as u64);
    }
    debug!("Body: {} bytes in {} chunks", body.len(), chunks);
    Ok((body, chunks))
}

/// Map a reqwest failure onto the error taxonomy.
fn classify(e: reqwest::Error, url: &str) -> UploadError {
    if e.is_connect() && source_is(&e, ErrorKind::ConnectionRefused) {
        return UploadError::ConnectionRefused {
            url: url.to_string(),
        };
    }
    if e.is_timeout() || source_is(&e, ErrorKind::TimedOut) {
        return UploadError::ConnectionTimeout {
            url: url.to_string(),
        };
    }
    UploadError::Transport(error_chain(&e))
}

/// Walk the source chain looking for an `io::Error` of `kind`.
fn source_is(e: &(dyn std::error::Error + 'static), kind: ErrorKind) -> bool {
    let mut cur = Some(e);
    while let Some(err) = cur {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if io.kind() == kind {
                return true;
            }
        }
        cur = err.source();
    }
    false
}

/// `outer: inner: innermost`, skipping repeated messages.
fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut cur = Some(e);
    while let Some(err) = cur {
        let msg = err.to_string();
        if parts.last() != Some(&msg) {
            parts.push(msg);
        }
        cur = err.source();
    }
    parts.join(": ")
}
