//! Configuration for a single upload.
//!
//! Every knob lives in [`UploadConfig`], built via [`UploadConfigBuilder`].
//! One config describes exactly one request; it is never reused for a retry.
//!
//! The two `parse_*` helpers reproduce the lenient coercion the `send-pdf`
//! command line applies to its positional arguments.

use crate::error::UploadError;
use crate::progress::ProgressCallback;
use reqwest::Url;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Endpoint of the marker conversion server.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3333/convert";

/// Idle timeout applied when none is given.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Directory decoded images are written to, relative to the working directory.
pub const DEFAULT_IMAGES_DIR: &str = "./extracted_images";

/// Multipart field carrying the PDF bytes.
pub const FILE_FIELD: &str = "pdf_file";

/// Multipart field carrying the `"true"` / `"false"` flag.
pub const EXTRACT_IMAGES_FIELD: &str = "extract_images";

/// Configuration for one PDF upload.
///
/// # Example
/// ```rust
/// use marker_upload::UploadConfig;
///
/// let config = UploadConfig::builder()
///     .file_path("paper.pdf")
///     .extract_images(false)
///     .timeout_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.extract_images_value(), "false");
/// ```
#[derive(Clone)]
pub struct UploadConfig {
    /// Local PDF to upload.
    pub file_path: PathBuf,

    /// Ask the server to return embedded images. Default: true.
    pub extract_images: bool,

    /// Idle timeout in seconds for both the upload and the response. Default: 300.
    ///
    /// The clock restarts whenever the transport makes progress, so a slow
    /// but steady upload never trips it. `0` disables the timeout.
    pub timeout_secs: u64,

    /// Conversion endpoint. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Output directory for decoded images. Default: [`DEFAULT_IMAGES_DIR`].
    pub images_dir: PathBuf,

    /// Receives upload and download progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::new(),
            extract_images: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadConfig")
            .field("file_path", &self.file_path)
            .field("extract_images", &self.extract_images)
            .field("timeout_secs", &self.timeout_secs)
            .field("endpoint", &self.endpoint)
            .field("images_dir", &self.images_dir)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn UploadProgressCallback>"),
            )
            .finish()
    }
}

impl UploadConfig {
    /// Create a new builder for `UploadConfig`.
    pub fn builder() -> UploadConfigBuilder {
        UploadConfigBuilder {
            config: Self::default(),
        }
    }

    /// The idle timeout, or `None` when disabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Text value of the `extract_images` form field.
    pub fn extract_images_value(&self) -> &'static str {
        if self.extract_images {
            "true"
        } else {
            "false"
        }
    }
}

/// Builder for [`UploadConfig`].
#[derive(Debug)]
pub struct UploadConfigBuilder {
    config: UploadConfig,
}

impl UploadConfigBuilder {
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.file_path = path.into();
        self
    }

    pub fn extract_images(mut self, v: bool) -> Self {
        self.config.extract_images = v;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.images_dir = dir.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<UploadConfig, UploadError> {
        let c = &self.config;
        if c.file_path.as_os_str().is_empty() {
            return Err(UploadError::InvalidConfig("file path is empty".into()));
        }
        let url = Url::parse(&c.endpoint).map_err(|e| {
            UploadError::InvalidConfig(format!("endpoint '{}' is not a URL: {}", c.endpoint, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(UploadError::InvalidConfig(format!(
                "endpoint must be http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(self.config)
    }
}

// ── Argument coercion ────────────────────────────────────────────────────

/// Interpret the optional `extract_images` argument.
///
/// Only the exact string `"false"` disables extraction. Anything else,
/// including a missing argument, `"no"`, `"0"`, `"False"` or `""`, enables it.
pub fn parse_extract_images(arg: Option<&str>) -> bool {
    arg != Some("false")
}

/// Interpret the optional `timeout_seconds` argument.
///
/// Reads the leading integer (leading whitespace, optional sign, digits;
/// trailing characters are ignored, so `"45s"` is 45). A missing,
/// unparsable, zero or negative value yields [`DEFAULT_TIMEOUT_SECS`].
pub fn parse_timeout_arg(arg: Option<&str>) -> u64 {
    let Some(raw) = arg else {
        return DEFAULT_TIMEOUT_SECS;
    };
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 || negative {
        return DEFAULT_TIMEOUT_SECS;
    }
    // All-digit prefix only fails to parse on overflow.
    let value = digits[..end].parse::<u64>().unwrap_or(u64::MAX);
    if value == 0 {
        DEFAULT_TIMEOUT_SECS
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = UploadConfig::default();
        assert!(c.extract_images);
        assert_eq!(c.timeout_secs, 300);
        assert_eq!(c.endpoint, "http://localhost:3333/convert");
        assert_eq!(c.images_dir, PathBuf::from("./extracted_images"));
        assert_eq!(c.idle_timeout(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn builder_rejects_empty_path() {
        let err = UploadConfig::builder().build().unwrap_err();
        assert!(matches!(err, UploadError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_non_http_endpoint() {
        let err = UploadConfig::builder()
            .file_path("a.pdf")
            .endpoint("ftp://localhost/convert")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http"));

        assert!(UploadConfig::builder()
            .file_path("a.pdf")
            .endpoint("not a url")
            .build()
            .is_err());
    }

    #[test]
    fn zero_timeout_disables_idle_timer() {
        let c = UploadConfig::builder()
            .file_path("a.pdf")
            .timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.idle_timeout(), None);
    }

    #[test]
    fn extract_images_only_false_literal_disables() {
        assert!(!parse_extract_images(Some("false")));
        assert!(parse_extract_images(None));
        assert!(parse_extract_images(Some("true")));
        assert!(parse_extract_images(Some("no")));
        assert!(parse_extract_images(Some("0")));
        assert!(parse_extract_images(Some("")));
        assert!(parse_extract_images(Some("False")));
        assert!(parse_extract_images(Some("false ")));
    }

    #[test]
    fn timeout_argument_coercion() {
        assert_eq!(parse_timeout_arg(None), 300);
        assert_eq!(parse_timeout_arg(Some("60")), 60);
        assert_eq!(parse_timeout_arg(Some("  45s")), 45);
        assert_eq!(parse_timeout_arg(Some("+7")), 7);
        assert_eq!(parse_timeout_arg(Some("0")), 300);
        assert_eq!(parse_timeout_arg(Some("-5")), 300);
        assert_eq!(parse_timeout_arg(Some("abc")), 300);
        assert_eq!(parse_timeout_arg(Some("")), 300);
        assert_eq!(
            parse_timeout_arg(Some("99999999999999999999999")),
            u64::MAX
        );
    }
}
