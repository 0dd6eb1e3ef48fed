//! Image persistence: data URI → `<images_dir>/<name>.png`.
//!
//! The server embeds each extracted figure as a data URI
//! (`data:<mime>;base64,<payload>`). The declared MIME type is ignored and
//! every payload is written with a `.png` extension.
//!
//! A bad entry (unusable key, broken base64, write failure) is recorded in
//! [`ImageReport::failed`] and the remaining entries are still written. Only
//! failing to create the directory aborts the whole step.

use crate::error::{ImageError, UploadError};
use crate::output::{ImageReport, SavedImage};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Marker separating the data URI header from its payload.
pub const BASE64_MARKER: &str = ";base64,";

/// Standard alphabet, padding optional.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Strip everything through the first `;base64,` and decode the rest.
///
/// A value without the marker is decoded as a bare base64 string. ASCII
/// whitespace inside the payload (line-wrapped base64) is ignored.
pub fn decode_data_uri(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match value.find(BASE64_MARKER) {
        Some(i) => &value[i + BASE64_MARKER.len()..],
        None => value,
    };
    let compact: Vec<u8> = payload
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    LENIENT.decode(compact)
}

/// Target path for image `name`, or `None` when the key cannot be a file stem.
pub fn image_path(dir: &Path, name: &str) -> Option<PathBuf> {
    let unusable = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if unusable {
        return None;
    }
    Some(dir.join(format!("{name}.png")))
}

/// Decode and write every image in `images` under `dir`, creating it if absent.
pub async fn save_images(
    images: &BTreeMap<String, String>,
    dir: &Path,
) -> Result<ImageReport, UploadError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| UploadError::ImagesDirFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let mut report = ImageReport::default();

    for (name, value) in images {
        match save_one(dir, name, value).await {
            Ok(saved) => {
                debug!("Saved {} ({} bytes)", saved.path.display(), saved.size_bytes);
                report.saved.push(saved);
            }
            Err(e) => {
                warn!("{}", e);
                report.failed.push(e);
            }
        }
    }

    info!(
        "Images: {} saved, {} failed, dir {}",
        report.saved.len(),
        report.failed.len(),
        dir.display()
    );
    Ok(report)
}

async fn save_one(dir: &Path, name: &str, value: &str) -> Result<SavedImage, ImageError> {
    let path = image_path(dir, name).ok_or_else(|| ImageError::InvalidName {
        name: name.to_string(),
    })?;
    let bytes = decode_data_uri(value).map_err(|e| ImageError::Decode {
        name: name.to_string(),
        source: e,
    })?;
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| ImageError::Write {
            name: name.to_string(),
            path: path.clone(),
            source: e,
        })?;
    Ok(SavedImage {
        name: name.to_string(),
        path,
        size_bytes: bytes.len() as u64,
    })
}
