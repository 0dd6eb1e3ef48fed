//! Input validation: make sure the PDF can be read before touching the network.
//!
//! A missing or unreadable file must fail here, with no connection ever
//! opened. Readability is checked by actually opening the file; metadata
//! alone says nothing about permissions under ACLs or on network mounts.

use crate::error::UploadError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A validated local file, ready to be streamed.
///
/// Holds the handle opened during validation; the upload streams from it
/// instead of reopening the path.
#[derive(Debug)]
pub struct InputFile {
    /// Path as given by the caller.
    pub path: PathBuf,
    /// Base name sent as the multipart filename.
    pub file_name: String,
    /// Size in bytes at validation time.
    pub size_bytes: u64,
    pub(crate) file: std::fs::File,
}

impl InputFile {
    /// Size in mebibytes, as shown in the `File size:` line.
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Confirm `path` names a readable regular file and record its size.
pub fn validate_input(path: impl AsRef<Path>) -> Result<InputFile, UploadError> {
    let path = path.as_ref().to_path_buf();

    let file = std::fs::File::open(&path).map_err(|e| map_open_error(&path, e))?;
    let meta = file.metadata().map_err(|e| UploadError::FileAccess {
        path: path.clone(),
        source: e,
    })?;
    if !meta.is_file() {
        return Err(UploadError::NotAFile { path });
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    debug!("Validated {} ({} bytes)", path.display(), meta.len());
    Ok(InputFile {
        path,
        file_name,
        size_bytes: meta.len(),
        file,
    })
}

fn map_open_error(path: &Path, e: std::io::Error) -> UploadError {
    let path = path.to_path_buf();
    match e.kind() {
        ErrorKind::NotFound => UploadError::FileNotFound { path },
        ErrorKind::PermissionDenied => UploadError::PermissionDenied { path },
        _ => UploadError::FileAccess { path, source: e },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_not_found() {
        let err = validate_input("/definitely/not/a/real/file.pdf").unwrap_err();
        assert!(matches!(err, UploadError::FileNotFound { .. }), "got: {err:?}");
        assert!(err.is_preflight());
    }

    #[test]
    fn directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_input(dir.path()).unwrap_err();
        assert!(
            matches!(err, UploadError::NotAFile { .. } | UploadError::FileAccess { .. }),
            "got: {err:?}"
        );
    }

    #[test]
    fn regular_file_reports_name_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&vec![0u8; 2048]).unwrap();
        drop(f);

        let input = validate_input(&path).unwrap();
        assert_eq!(input.file_name, "report.pdf");
        assert_eq!(input.size_bytes, 2048);
        assert!((input.size_mb() - 2048.0 / 1_048_576.0).abs() < f64::EPSILON);
    }

    #[test]
    fn size_mb_of_one_mebibyte() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.pdf");
        std::fs::write(&path, vec![0u8; 1024 * 1024]).unwrap();

        let input = validate_input(&path).unwrap();
        assert_eq!(format!("{:.2}", input.size_mb()), "1.00");
    }
}
