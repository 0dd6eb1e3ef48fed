//! Output types: what the server returned and what happened on the wire.

use crate::error::ImageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// JSON body of a successful conversion.
///
/// Every field is optional on the wire: servers have been seen omitting
/// `markdown` when only images were requested, and sending `null` for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionResponse {
    /// Converted document.
    #[serde(default)]
    pub markdown: Option<String>,

    /// Opaque metadata, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    /// Image name → data URI (`data:<mime>;base64,<payload>`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<BTreeMap<String, String>>,
}

impl ConversionResponse {
    /// Markdown text, empty when absent.
    pub fn markdown_text(&self) -> &str {
        self.markdown.as_deref().unwrap_or("")
    }

    /// Metadata worth printing: present and not JSON `null`.
    pub fn printable_metadata(&self) -> Option<&serde_json::Value> {
        self.metadata.as_ref().filter(|m| !m.is_null())
    }
}

/// Counters for one request/response cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadStats {
    /// HTTP status of the response.
    pub status: u16,
    /// File bytes handed to the transport.
    pub bytes_sent: u64,
    /// Response body bytes received.
    pub bytes_received: u64,
    /// Number of response body chunks.
    pub response_chunks: usize,
    /// Time from request start to response headers.
    pub upload_duration_ms: u64,
    /// Wall-clock time of the whole cycle.
    pub total_duration_ms: u64,
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutput {
    pub response: ConversionResponse,
    pub stats: UploadStats,
}

/// One image written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedImage {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Outcome of [`crate::save_images`].
#[derive(Debug, Default)]
pub struct ImageReport {
    pub saved: Vec<SavedImage>,
    pub failed: Vec<ImageError>,
}

impl ImageReport {
    pub fn total(&self) -> usize {
        self.saved.len() + self.failed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_response() {
        let body = r##"{"markdown":"# Hi","metadata":{"pages":2},"images":{"fig1":"data:image/png;base64,QUJD"}}"##;
        let r: ConversionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(r.markdown_text(), "# Hi");
        assert_eq!(r.printable_metadata(), Some(&json!({"pages": 2})));
        assert_eq!(r.images.unwrap()["fig1"], "data:image/png;base64,QUJD");
    }

    #[test]
    fn missing_and_null_fields_are_tolerated() {
        let r: ConversionResponse =
            serde_json::from_str(r#"{"images":{"fig1":"QUJD"}}"#).unwrap();
        assert_eq!(r.markdown_text(), "");
        assert!(r.metadata.is_none());

        let r: ConversionResponse =
            serde_json::from_str(r#"{"markdown":null,"metadata":null}"#).unwrap();
        assert_eq!(r.markdown_text(), "");
        assert!(r.printable_metadata().is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let r: ConversionResponse =
            serde_json::from_str(r#"{"markdown":"x","success":true}"#).unwrap();
        assert_eq!(r.markdown_text(), "x");
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert!(serde_json::from_str::<ConversionResponse>("[1,2]").is_err());
        assert!(serde_json::from_str::<ConversionResponse>(r#"{"images":{"a":1}}"#).is_err());
    }

    #[test]
    fn report_total() {
        let mut report = ImageReport::default();
        report.saved.push(SavedImage {
            name: "a".into(),
            path: "a.png".into(),
            size_bytes: 1,
        });
        report.failed.push(ImageError::InvalidName { name: "..".into() });
        assert_eq!(report.total(), 2);
    }
}
