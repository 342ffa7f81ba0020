//! # datasheet-extract
//!
//! Pull the titled tables and the embedded figures out of electronic
//! component datasheets.
//!
//! Datasheets put their electrical data in ruled tables ("Absolute Maximum
//! Ratings", "Electrical Characteristics", …), each introduced by a heading
//! on the line right above it. This crate detects those tables from the
//! page's ruling lines, names each one after the line of text above its
//! first cell, and drops tables that have no such heading. Embedded images
//! (package drawings, typical-performance graphs) are cropped out of the
//! rendered page. The front matter (cover, ordering and pin-out pages) is
//! skipped: scanning starts at page 5 unless configured otherwise.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file, URL download or in-memory bytes
//!  ├─ 2. Layout   text, glyphs, ruling edges, image boxes via pdfium (spawn_blocking)
//!  ├─ 3. Tables   lattice detection from ruling edges
//!  ├─ 4. Titles   line above the first cell, untitled tables dropped
//!  ├─ 5. Images   render at 150 DPI and crop each image object
//!  └─ 6. Output   tables + PNGs, CSV export, HTML viewer
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use datasheet_extract::{extract, DataFrame, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let output = extract("tps42.pdf", &config).await?;
//!     for table in &output.tables {
//!         println!("📄 Page {}: {}", table.page, table.title);
//!         print!("{}", DataFrame::from_table(table).to_csv()?);
//!     }
//!     eprintln!("{} images", output.images.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `datasheet` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `serve` | on      | Enables the upload viewer in [`server`] (axum + tower-http) |
//!
//! Disable both when using only the library:
//! ```toml
//! datasheet-extract = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! pdfium is loaded at runtime: from `$PDFIUM_LIB_PATH` if set, else from
//! the working directory, else from the system library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod frame;
pub mod output;
pub mod pipeline;
pub mod progress;
#[cfg(feature = "serve")]
pub mod server;
pub mod viewer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, TableSettings};
pub use error::{ExtractError, ImageFailure};
pub use extract::{
    extract, extract_from_bytes, extract_sync, extract_to_dir, inspect, inspect_with_password,
    write_output_dir, WrittenFiles,
};
pub use frame::{csv_file_name, dedup_columns, display_title, table_file_name, DataFrame};
pub use output::{DocumentMetadata, ExtractionOutput, ExtractionStats, PageImage, TitledTable};
pub use pipeline::layout::BBox;
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use viewer::{render_html, ViewerOptions};
