//! Result types returned by the extraction entry points.

use crate::error::ImageFailure;
use crate::pipeline::layout::BBox;
use serde::{Deserialize, Serialize};

/// A table kept from the document together with its title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitledTable {
    /// 1-indexed page number.
    pub page: usize,
    /// Trimmed line printed above the table.
    pub title: String,
    /// Cleaned rows; the first row is the header. Missing cells are `""`.
    pub rows: Vec<Vec<String>>,
}

/// An embedded image cropped from a rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageImage {
    /// 1-indexed page number.
    pub page: usize,
    /// Position among the image objects of the page.
    pub index: usize,
    /// Region of the page the image occupies, in points (top-down).
    pub bbox: BBox,
    /// Width of the cropped raster in pixels.
    pub width: u32,
    /// Height of the cropped raster in pixels.
    pub height: u32,
    /// PNG-encoded crop. Serialised as base64.
    #[serde(with = "png_base64")]
    pub png: Vec<u8>,
}

mod png_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Metadata extracted from the PDF document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Counters and timings for one extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages at or after the start page.
    pub scanned_pages: usize,
    /// Tables detected on scanned pages, titled or not.
    pub tables_detected: usize,
    /// Tables kept in the output.
    pub tables_kept: usize,
    pub images_extracted: usize,
    pub images_failed: usize,
    pub total_duration_ms: u64,
}

/// Everything extracted from one datasheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Titled tables in page order, then in detection order within a page.
    pub tables: Vec<TitledTable>,
    /// Cropped images in page order, then in object order within a page.
    pub images: Vec<PageImage>,
    /// Images that could not be cropped.
    pub image_failures: Vec<ImageFailure>,
    pub metadata: DocumentMetadata,
    pub stats: ExtractionStats,
    /// First scanned page (1-indexed), used in the "nothing found" notices.
    pub start_page: usize,
}
