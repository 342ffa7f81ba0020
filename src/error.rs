//! Error types for the datasheet-extract library.
//!
//! Two distinct types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: the extraction cannot proceed at all
//!   (bad input file, wrong password, pdfium not loadable). Returned as
//!   `Err(ExtractError)` from the top-level `extract*` functions.
//!
//! * [`ImageFailure`] — **Non-fatal**: cropping one embedded image failed
//!   but every other image and table is fine. Collected into
//!   [`crate::output::ExtractionOutput::image_failures`] and logged, so a
//!   single odd image never costs the caller the whole datasheet.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the datasheet-extract library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium failed to read text or objects from a page.
    #[error("Failed to read page {page}: {detail}")]
    PageReadFailed { page: usize, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialisation of a table failed.
    #[error("Failed to write CSV for table '{title}': {detail}")]
    CsvFailed { title: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide so the dynamic loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure to crop one embedded image.
///
/// Stored in [`crate::output::ExtractionOutput::image_failures`]; the
/// extraction continues with the remaining images.
#[derive(Debug, Clone, Error, PartialEq, serde::Serialize, serde::Deserialize)]
#[error("Failed to extract image on page {page}: {detail}")]
pub struct ImageFailure {
    /// 1-indexed page number.
    pub page: usize,
    /// Position of the image among the image objects of its page.
    pub index: usize,
    /// Human-readable cause.
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_failure_display_names_page() {
        let f = ImageFailure {
            page: 7,
            index: 2,
            detail: "empty crop region".into(),
        };
        assert_eq!(
            f.to_string(),
            "Failed to extract image on page 7: empty crop region"
        );
    }

    #[test]
    fn page_read_failure_display() {
        let e = ExtractError::PageReadFailed {
            page: 5,
            detail: "PdfiumLibraryInternalError".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 5"), "got: {msg}");
    }

    #[test]
    fn binding_failure_mentions_env_var() {
        let e = ExtractError::PdfiumBindingFailed("dlopen failed".into());
        assert!(e.to_string().contains("PDFIUM_LIB_PATH"));
        assert!(e.to_string().contains("dlopen failed"));
    }

    #[test]
    fn csv_failure_display() {
        let e = ExtractError::CsvFailed {
            title: "Absolute Maximum Ratings".into(),
            detail: "broken pipe".into(),
        };
        assert!(e.to_string().contains("Absolute Maximum Ratings"));
    }
}
