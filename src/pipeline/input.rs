//! Input resolution: turn a path, URL or byte buffer into a local PDF file.
//!
//! pdfium opens documents from the file system, so downloads and uploads
//! are written to a temp location first. The temp file lives inside the
//! returned [`ResolvedInput`] and is removed when it is dropped. Every
//! source is checked for the `%PDF` magic before pdfium sees it.

use crate::error::ExtractError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF on disk, possibly owned by a temp location.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the PDF was downloaded into a temp directory.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
    /// Input was an in-memory buffer written to a temp file.
    Buffered(NamedTempFile),
}

impl ResolvedInput {
    /// Path of the PDF regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
            ResolvedInput::Buffered(file) => file.path(),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// The first four bytes when they are not the PDF magic.
///
/// Buffers shorter than four bytes are zero-padded and always rejected.
pub fn bad_magic(bytes: &[u8]) -> Option<[u8; 4]> {
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    (&magic != PDF_MAGIC).then_some(magic)
}

/// Resolve a local path or HTTP(S) URL to a local PDF file.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ExtractError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Write an in-memory PDF to a temp file after checking its magic.
pub fn resolve_bytes(bytes: &[u8]) -> Result<ResolvedInput, ExtractError> {
    if let Some(magic) = bad_magic(bytes) {
        return Err(ExtractError::NotAPdf {
            path: PathBuf::from("<upload>"),
            magic,
        });
    }

    let mut tmp = tempfile::Builder::new()
        .prefix("datasheet-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;

    debug!("Buffered {} bytes to {}", bytes.len(), tmp.path().display());
    Ok(ResolvedInput::Buffered(tmp))
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, ExtractError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(ExtractError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut head = [0u8; 4];
            let n = f.read(&mut head).unwrap_or(0);
            if let Some(magic) = bad_magic(&head[..n]) {
                return Err(ExtractError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ExtractError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ExtractError> {
    info!("Downloading PDF from: {}", url);

    let failed = |reason: String| ExtractError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ExtractError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let filename = filename_from_url(url);
    let temp_dir = TempDir::new().map_err(|e| ExtractError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    if let Some(magic) = bad_magic(&bytes) {
        return Err(ExtractError::NotAPdf {
            path: file_path,
            magic,
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| ExtractError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| last.contains('.') && !last.contains(['/', '\\']))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/ds.pdf"));
        assert!(is_url("http://example.com/ds.pdf"));
        assert!(!is_url("/tmp/ds.pdf"));
        assert!(!is_url("ds.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn magic_check() {
        assert_eq!(bad_magic(b"%PDF-1.7\n"), None);
        assert_eq!(bad_magic(b"PK\x03\x04"), Some(*b"PK\x03\x04"));
        assert_eq!(bad_magic(b"%P"), Some([b'%', b'P', 0, 0]));
        assert_eq!(bad_magic(b""), Some([0; 4]));
    }

    #[test]
    fn filename_comes_from_url_path() {
        assert_eq!(
            filename_from_url("https://example.com/files/tps42.pdf?dl=1"),
            "tps42.pdf"
        );
        assert_eq!(filename_from_url("https://example.com/download"), "downloaded.pdf");
        assert_eq!(filename_from_url("https://example.com/"), "downloaded.pdf");
    }

    #[test]
    fn missing_file_is_reported() {
        let err = resolve_local("/definitely/not/here.pdf").err().unwrap();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
    }

    #[test]
    fn non_pdf_file_is_rejected() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"<html>").unwrap();
        let err = resolve_local(f.path().to_str().unwrap()).err().unwrap();
        assert!(matches!(err, ExtractError::NotAPdf { magic, .. } if &magic == b"<htm"));
    }

    #[test]
    fn bytes_are_buffered_to_a_pdf_temp_file() {
        let resolved = resolve_bytes(b"%PDF-1.4\n%%EOF\n").unwrap();
        let path = resolved.path().to_path_buf();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
        assert!(path.exists());
        drop(resolved);
        assert!(!path.exists());
    }

    #[test]
    fn non_pdf_bytes_are_rejected() {
        let err = resolve_bytes(b"hello").err().unwrap();
        assert!(matches!(err, ExtractError::NotAPdf { .. }));
    }
}
