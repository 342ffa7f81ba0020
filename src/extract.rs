//! Extraction entry points.
//!
//! [`extract`] resolves the input, scans the document from the start page
//! onwards and returns every titled table and cropped image in one
//! [`ExtractionOutput`]. The other functions are thin variations: from
//! bytes, blocking, writing a browsable directory, or metadata only.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::frame;
use crate::output::{DocumentMetadata, ExtractionOutput, ExtractionStats};
use crate::pipeline::{document, input};
use crate::viewer::{self, ViewerOptions};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Extract titled tables and images from a PDF file or URL.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Extraction configuration
///
/// # Returns
/// `Ok(ExtractionOutput)` even when nothing was found or some images could
/// not be cropped (see `output.image_failures`).
///
/// # Errors
/// Returns `Err(ExtractError)` only for fatal errors: unreadable input, not
/// a PDF, wrong password, pdfium unavailable, or a page pdfium cannot read.
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    extract_resolved(&resolved, config).await
}

/// Extract from PDF bytes held in memory.
///
/// The bytes are written to a managed temp file that is removed on return.
///
/// # Example
/// ```rust,no_run
/// use datasheet_extract::{extract_from_bytes, ExtractionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("tps42.pdf")?;
/// let output = extract_from_bytes(&bytes, &ExtractionConfig::default()).await?;
/// for t in &output.tables {
///     println!("page {}: {}", t.page, t.title);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn extract_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    info!("Starting extraction: {} bytes in memory", bytes.len());
    let resolved = input::resolve_bytes(bytes)?;
    extract_resolved(&resolved, config).await
}

async fn extract_resolved(
    resolved: &input::ResolvedInput,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();

    let scan = document::scan_document(resolved.path(), config).await?;

    let stats = ExtractionStats {
        total_pages: scan.metadata.page_count,
        scanned_pages: scan.scanned_pages,
        tables_detected: scan.tables_detected,
        tables_kept: scan.tables.len(),
        images_extracted: scan.images.len(),
        images_failed: scan.image_failures.len(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Extraction complete: {} titled tables ({} detected), {} images ({} failed) from {} pages in {}ms",
        stats.tables_kept,
        stats.tables_detected,
        stats.images_extracted,
        stats.images_failed,
        stats.scanned_pages,
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(stats.tables_kept, stats.images_extracted);
    }

    Ok(ExtractionOutput {
        tables: scan.tables,
        images: scan.images,
        image_failures: scan.image_failures,
        metadata: scan.metadata,
        stats,
        start_page: config.start_page,
    })
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_str, config))
}

/// Read PDF metadata without scanning any page.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, ExtractError> {
    inspect_with_password(input_str, None).await
}

/// [`inspect`] for encrypted documents.
pub async fn inspect_with_password(
    input_str: impl AsRef<str>,
    password: Option<&str>,
) -> Result<DocumentMetadata, ExtractError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    document::read_metadata(resolved.path(), password).await
}

/// Files written by [`extract_to_dir`], relative to the output directory.
#[derive(Debug, Clone, Default)]
pub struct WrittenFiles {
    pub index_html: PathBuf,
    pub csv_files: Vec<PathBuf>,
    pub image_files: Vec<PathBuf>,
}

/// Extract and write a browsable result directory.
///
/// Writes one CSV per titled table, one PNG per image under `images/`, and
/// an `index.html` viewer linking to them. `index.html` is written last,
/// atomically (temp file + rename), so it never references missing files.
pub async fn extract_to_dir(
    input_str: impl AsRef<str>,
    out_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<(ExtractionOutput, WrittenFiles), ExtractError> {
    let output = extract(input_str, config).await?;
    let files = write_output_dir(&output, out_dir.as_ref()).await?;
    Ok((output, files))
}

/// Write an already extracted output as a browsable directory.
pub async fn write_output_dir(
    output: &ExtractionOutput,
    dir: &Path,
) -> Result<WrittenFiles, ExtractError> {
    let write_failed = |path: &Path| {
        let path = path.to_path_buf();
        move |e| ExtractError::OutputWriteFailed { path, source: e }
    };

    let images_dir = dir.join("images");
    tokio::fs::create_dir_all(&images_dir)
        .await
        .map_err(write_failed(&images_dir))?;

    // ── CSV files ────────────────────────────────────────────────────────
    let csv_names = unique_csv_names(output);
    for (table, name) in output.tables.iter().zip(&csv_names) {
        let path = dir.join(name);
        let csv = frame::table_csv(table)?;
        tokio::fs::write(&path, csv).await.map_err(write_failed(&path))?;
        debug!("Wrote {}", path.display());
    }

    // ── Images ───────────────────────────────────────────────────────────
    let mut image_names = Vec::with_capacity(output.images.len());
    for image in &output.images {
        let name = format!("images/page-{}-{}.png", image.page, image.index + 1);
        let path = dir.join(&name);
        tokio::fs::write(&path, &image.png)
            .await
            .map_err(write_failed(&path))?;
        image_names.push(name);
    }

    // ── index.html ───────────────────────────────────────────────────────
    let options = ViewerOptions {
        csv_hrefs: Some(csv_names.iter().map(|n| percent_encode_path(n)).collect()),
        image_srcs: Some(image_names.clone()),
        ..ViewerOptions::default()
    };
    let html = viewer::render_html(output, &options)?;

    let index = dir.join("index.html");
    let tmp = dir.join("index.html.tmp");
    tokio::fs::write(&tmp, html).await.map_err(write_failed(&index))?;
    tokio::fs::rename(&tmp, &index)
        .await
        .map_err(write_failed(&index))?;

    info!(
        "Wrote {} CSV files and {} images to {}",
        csv_names.len(),
        image_names.len(),
        dir.display()
    );

    Ok(WrittenFiles {
        index_html: PathBuf::from("index.html"),
        csv_files: csv_names.into_iter().map(PathBuf::from).collect(),
        image_files: image_names.into_iter().map(PathBuf::from).collect(),
    })
}

/// Disk names for the tables' CSV files, unique within the output.
///
/// Names follow the download name; a repeat gets `-{idx}` before `.csv`,
/// then `-{idx}-2`, `-{idx}-3`, … until the name is free.
pub(crate) fn unique_csv_names(output: &ExtractionOutput) -> Vec<String> {
    let mut seen = HashSet::new();
    output
        .tables
        .iter()
        .enumerate()
        .map(|(idx, table)| {
            let fallback = format!("table-{idx}.csv");
            let base = frame::sanitize_file_name(&frame::table_file_name(table, idx), &fallback);
            let stem = base.strip_suffix(".csv").unwrap_or(&base).to_string();

            let mut name = base;
            let mut attempt = 0;
            while name.eq_ignore_ascii_case("index.html") || !seen.insert(name.to_lowercase()) {
                attempt += 1;
                name = if attempt == 1 {
                    format!("{stem}-{idx}.csv")
                } else {
                    format!("{stem}-{idx}-{attempt}.csv")
                };
            }
            name
        })
        .collect()
}

/// Escape characters that would break a relative URL to a local file.
fn percent_encode_path(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'(' | b')' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::TitledTable;

    fn titled(title: &str) -> TitledTable {
        TitledTable {
            page: 5,
            title: title.into(),
            rows: vec![vec!["Parameter".into()], vec!["VIN".into()]],
        }
    }

    #[test]
    fn csv_names_are_unique() {
        let output = ExtractionOutput {
            tables: vec![
                titled("Electrical Characteristics"),
                titled("Electrical Characteristics"),
                titled("I/O"),
            ],
            ..ExtractionOutput::default()
        };
        assert_eq!(
            unique_csv_names(&output),
            vec![
                "Electrical_Characteristics.csv",
                "Electrical_Characteristics-1.csv",
                "I_O.csv"
            ]
        );
    }

    #[test]
    fn suffixed_name_never_reuses_a_taken_name() {
        let output = ExtractionOutput {
            tables: vec![titled("A-2"), titled("A"), titled("A")],
            ..ExtractionOutput::default()
        };
        let names = unique_csv_names(&output);
        assert_eq!(names, vec!["A-2.csv", "A.csv", "A-2-2.csv"]);

        let distinct: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
        assert_eq!(distinct.len(), names.len());
    }

    #[test]
    fn untitled_tables_get_numbered_names() {
        let output = ExtractionOutput {
            tables: vec![titled(""), titled("")],
            ..ExtractionOutput::default()
        };
        assert_eq!(
            unique_csv_names(&output),
            vec!["Untitled_table_0.csv", "Untitled_table_1.csv"]
        );
    }

    #[test]
    fn percent_encoding_keeps_safe_chars() {
        assert_eq!(percent_encode_path("VIN_(max).csv"), "VIN_(max).csv");
        assert_eq!(percent_encode_path("Ω#1.csv"), "%CE%A9%231.csv");
    }

    #[tokio::test]
    async fn output_dir_contains_viewer_csv_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let output = ExtractionOutput {
            tables: vec![titled("Pin Functions")],
            start_page: 5,
            ..ExtractionOutput::default()
        };

        let files = write_output_dir(&output, dir.path()).await.unwrap();
        assert_eq!(files.csv_files, vec![PathBuf::from("Pin_Functions.csv")]);

        let csv = std::fs::read_to_string(dir.path().join("Pin_Functions.csv")).unwrap();
        assert_eq!(csv, "Parameter\nVIN\n");

        let html = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(html.contains("href=\"Pin_Functions.csv\""));
        assert!(html.contains("No images found from page 5 onwards."));
        assert!(!dir.path().join("index.html.tmp").exists());
    }

    #[tokio::test]
    async fn missing_input_is_fatal() {
        let err = extract("/no/such/datasheet.pdf", &ExtractionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn inspect_with_password_checks_input_first() {
        let err = inspect_with_password("/no/such/datasheet.pdf", Some("secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn non_pdf_bytes_are_fatal() {
        let err = extract_from_bytes(b"GIF89a", &ExtractionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::NotAPdf { .. }));
    }
}
