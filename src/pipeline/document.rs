//! Document-level pdfium work: binding the library, opening the PDF and
//! walking the scanned pages.
//!
//! pdfium keeps thread-local state and is not safe to drive from async
//! code, so [`scan_document`] and [`read_metadata`] move all of it onto a
//! `spawn_blocking` thread and return plain owned data.

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, ImageFailure};
use crate::output::{DocumentMetadata, PageImage, TitledTable};
use crate::pipeline::{images, layout, tables, titles};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit pdfium library file.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Everything read from the scanned pages of one document.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub metadata: DocumentMetadata,
    pub scanned_pages: usize,
    pub tables_detected: usize,
    pub tables: Vec<TitledTable>,
    pub images: Vec<PageImage>,
    pub image_failures: Vec<ImageFailure>,
}

/// Bind to pdfium: `$PDFIUM_LIB_PATH`, then `./`, then the system library.
pub fn bind_pdfium() -> Result<Pdfium, ExtractError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(lib) if !lib.is_empty() => {
            debug!("Binding pdfium from {}={}", PDFIUM_LIB_PATH_ENV, lib);
            Pdfium::bind_to_library(&lib)
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ExtractError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Open a PDF, mapping pdfium's load errors onto password/corruption errors.
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, ExtractError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ExtractError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                ExtractError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            ExtractError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

fn document_metadata(document: &PdfDocument) -> DocumentMetadata {
    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata
            .get(tag)
            .map(|t| t.value().trim().to_string())
            .filter(|v| !v.is_empty())
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}

/// Read document metadata without scanning any page.
pub async fn read_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, ExtractError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(str::to_string);

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = open_document(&pdfium, &path, pwd.as_deref())?;
        Ok(document_metadata(&document))
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("Metadata task panicked: {}", e)))?
}

/// Scan every page from the start page onwards for titled tables and images.
pub async fn scan_document(
    pdf_path: &Path,
    config: &ExtractionConfig,
) -> Result<ScanResult, ExtractError> {
    let path = pdf_path.to_path_buf();
    let config = config.clone();

    tokio::task::spawn_blocking(move || scan_document_blocking(&path, &config))
        .await
        .map_err(|e| ExtractError::Internal(format!("Scan task panicked: {}", e)))?
}

fn scan_document_blocking(
    pdf_path: &Path,
    config: &ExtractionConfig,
) -> Result<ScanResult, ExtractError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path, config.password.as_deref())?;
    let metadata = document_metadata(&document);
    let total_pages = metadata.page_count;
    info!("PDF loaded: {} pages", total_pages);

    let page_indices = config.page_indices(total_pages);
    if page_indices.is_empty() {
        warn!(
            "Start page {} is past the last page ({}); nothing to scan",
            config.start_page, total_pages
        );
    }
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(page_indices.len());
    }

    let pages = document.pages();
    let mut result = ScanResult {
        metadata,
        scanned_pages: page_indices.len(),
        ..ScanResult::default()
    };

    for idx in page_indices {
        let page_num = idx + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total_pages);
        }

        let page = pages
            .get(idx as u16)
            .map_err(|e| ExtractError::PageReadFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })?;
        let page_layout = layout::read_page_layout(&page, page_num)?;

        // ── Tables ───────────────────────────────────────────────────────
        let detected = tables::find_tables(&page_layout, &config.table_settings);
        let grids: Vec<tables::Grid> = detected.into_iter().map(|t| t.rows).collect();
        let kept = titles::titled_tables(
            page_num,
            &page_layout.lines(),
            &grids,
            config.keep_untitled,
        );
        debug!(
            "Page {}: {} tables detected, {} kept",
            page_num,
            grids.len(),
            kept.len()
        );
        result.tables_detected += grids.len();
        let kept_count = kept.len();
        result.tables.extend(kept);

        // ── Images ───────────────────────────────────────────────────────
        let mut image_count = 0;
        if config.extract_images {
            let (page_images, failures) = images::extract_page_images(&page, &page_layout, config);
            image_count = page_images.len();
            result.images.extend(page_images);
            result.image_failures.extend(failures);
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page_num, total_pages, kept_count, image_count);
        }
    }

    Ok(result)
}
