//! Pipeline stages for datasheet extraction.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ document ──▶ layout ──┬──▶ tables ──▶ titles
//! (URL/path/bytes) (pdfium)  (per page)  └──▶ images ──▶ encode
//! ```
//!
//! 1. [`input`]    — canonicalise the path, URL or byte buffer to a local PDF
//! 2. [`document`] — bind pdfium, open the PDF and walk pages from the start
//!    page; runs in `spawn_blocking`
//! 3. [`layout`]   — text, glyph boxes, ruling edges and image boxes of a page
//! 4. [`tables`]   — lattice detection of ruled tables
//! 5. [`titles`]   — clean tables and pair each with the line above it
//! 6. [`images`]   — render the page and crop each embedded image
//! 7. [`encode`]   — PNG encoding and data-URIs
//!
//! Everything after [`layout`] works on plain data and is tested without a
//! pdfium library.

pub mod document;
pub mod encode;
pub mod images;
pub mod input;
pub mod layout;
pub mod tables;
pub mod titles;
