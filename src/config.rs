//! Configuration types for datasheet extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Table-detection tolerances live in
//! their own [`TableSettings`] so they can be serialised and tuned apart from
//! the page/render knobs.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for one datasheet extraction.
///
/// # Example
/// ```rust
/// use datasheet_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .start_page(3)
///     .dpi(200)
///     .build()
///     .unwrap();
/// assert_eq!(config.start_page, 3);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// First page (1-indexed) that is scanned for tables and images. Default: 5.
    ///
    /// Datasheets open with cover, ordering and pin-out pages; the
    /// electrical tables start a few pages in.
    pub start_page: usize,

    /// Rendering DPI used when cropping embedded images. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Maximum rendered page dimension (width or height) in pixels. Default: 4000.
    ///
    /// Caps the page raster an image is cropped from, whatever its physical
    /// size. Crop geometry is computed from the actual raster size, so a
    /// capped render still crops the right region.
    pub max_rendered_pixels: u32,

    /// Extract embedded images. Default: true.
    pub extract_images: bool,

    /// Keep tables for which no title could be found (titled `""`). Default: false.
    pub keep_untitled: bool,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Lattice table-detection tolerances.
    pub table_settings: TableSettings,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-page progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            start_page: 5,
            dpi: 150,
            max_rendered_pixels: 4000,
            extract_images: true,
            keep_untitled: false,
            password: None,
            table_settings: TableSettings::default(),
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("start_page", &self.start_page)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("extract_images", &self.extract_images)
            .field("keep_untitled", &self.keep_untitled)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("table_settings", &self.table_settings)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// 0-indexed page indices scanned for a document of `total_pages` pages.
    pub fn page_indices(&self, total_pages: usize) -> Vec<usize> {
        let first = self.start_page.max(1) - 1;
        (first..total_pages).collect()
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn start_page(mut self, page: usize) -> Self {
        self.config.start_page = page;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn extract_images(mut self, v: bool) -> Self {
        self.config.extract_images = v;
        self
    }

    pub fn keep_untitled(mut self, v: bool) -> Self {
        self.config.keep_untitled = v;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn table_settings(mut self, settings: TableSettings) -> Self {
        self.config.table_settings = settings;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.start_page == 0 {
            return Err(ExtractError::InvalidConfig(
                "Start page is 1-indexed, got 0".into(),
            ));
        }
        if c.dpi < 72 || c.dpi > 400 {
            return Err(ExtractError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        c.table_settings.validate()?;
        Ok(self.config)
    }
}

/// Tolerances for lattice table detection, in PDF points.
///
/// All values default to 3.0, the conventional pdfplumber defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    /// Parallel edges closer than this are aligned to their mean position.
    pub snap_tolerance: f32,
    /// Collinear edge segments with gaps up to this are merged.
    pub join_tolerance: f32,
    /// Edges shorter than this are discarded.
    pub edge_min_length: f32,
    /// Slack when testing whether a horizontal and a vertical edge cross.
    pub intersection_tolerance: f32,
    /// Glyphs whose tops differ by at most this share a text line in a cell.
    pub text_y_tolerance: f32,
    /// Horizontal gaps wider than this between glyphs become a space.
    pub text_x_tolerance: f32,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            snap_tolerance: 3.0,
            join_tolerance: 3.0,
            edge_min_length: 3.0,
            intersection_tolerance: 3.0,
            text_y_tolerance: 3.0,
            text_x_tolerance: 3.0,
        }
    }
}

impl TableSettings {
    pub(crate) fn validate(&self) -> Result<(), ExtractError> {
        let fields = [
            ("snap_tolerance", self.snap_tolerance),
            ("join_tolerance", self.join_tolerance),
            ("edge_min_length", self.edge_min_length),
            ("intersection_tolerance", self.intersection_tolerance),
            ("text_y_tolerance", self.text_y_tolerance),
            ("text_x_tolerance", self.text_x_tolerance),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ExtractError::InvalidConfig(format!(
                    "{name} must be a finite, non-negative number of points, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_datasheet_layout() {
        let c = ExtractionConfig::default();
        assert_eq!(c.start_page, 5);
        assert_eq!(c.dpi, 150);
        assert!(c.extract_images);
        assert!(!c.keep_untitled);
    }

    #[test]
    fn builder_clamps_dpi() {
        let c = ExtractionConfig::builder().dpi(1000).build().unwrap();
        assert_eq!(c.dpi, 400);
        let c = ExtractionConfig::builder().dpi(10).build().unwrap();
        assert_eq!(c.dpi, 72);
    }

    #[test]
    fn zero_start_page_is_rejected() {
        let err = ExtractionConfig::builder().start_page(0).build().unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let settings = TableSettings {
            snap_tolerance: -1.0,
            ..TableSettings::default()
        };
        let err = ExtractionConfig::builder()
            .table_settings(settings)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("snap_tolerance"));
    }

    #[test]
    fn page_indices_start_at_start_page() {
        let c = ExtractionConfig::default();
        assert_eq!(c.page_indices(7), vec![4, 5, 6]);
        assert_eq!(c.page_indices(4), Vec::<usize>::new());

        let c = ExtractionConfig::builder().start_page(1).build().unwrap();
        assert_eq!(c.page_indices(3), vec![0, 1, 2]);
    }

    #[test]
    fn debug_redacts_password() {
        let c = ExtractionConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn table_settings_deserialise_with_defaults() {
        let s: TableSettings = serde_json::from_str(r#"{"snap_tolerance": 1.5}"#).unwrap();
        assert_eq!(s.snap_tolerance, 1.5);
        assert_eq!(s.join_tolerance, 3.0);
    }
}
