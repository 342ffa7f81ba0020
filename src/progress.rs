//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the pipeline scans each page. The CLI uses this to drive an
//! `indicatif` progress bar; the library itself never prints.
//!
//! # Example
//!
//! ```rust
//! use datasheet_extract::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct TableCounter {
//!     tables: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for TableCounter {
//!     fn on_page_complete(&self, _page_num: usize, _total: usize, tables: usize, _images: usize) {
//!         self.tables.fetch_add(tables, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(TableCounter { tables: AtomicUsize::new(0) });
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the extraction pipeline as it scans each page.
///
/// Events arrive from the blocking pdfium thread, hence `Send + Sync`.
/// All methods have no-op defaults.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once the document is open and the scanned pages are known.
    ///
    /// # Arguments
    /// * `pages_to_scan` — number of pages from the start page to the end
    fn on_extraction_start(&self, pages_to_scan: usize) {
        let _ = pages_to_scan;
    }

    /// Called before a page is scanned.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called after a page has been scanned.
    ///
    /// # Arguments
    /// * `page_num` — 1-indexed page number
    /// * `total_pages` — total pages in the document
    /// * `tables` — titled tables kept from this page
    /// * `images` — images cropped from this page
    fn on_page_complete(&self, page_num: usize, total_pages: usize, tables: usize, images: usize) {
        let _ = (page_num, total_pages, tables, images);
    }

    /// Called when cropping one image fails. The page continues.
    fn on_image_error(&self, page_num: usize, error: &str) {
        let _ = (page_num, error);
    }

    /// Called once after all pages have been scanned.
    fn on_extraction_complete(&self, tables: usize, images: usize) {
        let _ = (tables, images);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        pages: AtomicUsize,
        tables: AtomicUsize,
        image_errors: AtomicUsize,
        finished_with: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_page_complete(&self, _page: usize, _total: usize, tables: usize, _images: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
            self.tables.fetch_add(tables, Ordering::SeqCst);
        }

        fn on_image_error(&self, _page: usize, _error: &str) {
            self.image_errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_extraction_complete(&self, tables: usize, _images: usize) {
            self.finished_with.store(tables, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(3);
        cb.on_page_start(5, 7);
        cb.on_page_complete(5, 7, 2, 1);
        cb.on_image_error(6, "empty crop region");
        cb.on_extraction_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_page_complete(5, 7, 2, 0);
        tracker.on_page_complete(6, 7, 1, 3);
        tracker.on_image_error(6, "render failed");
        tracker.on_extraction_complete(3, 3);

        assert_eq!(tracker.pages.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.tables.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.image_errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.finished_with.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_extraction_start(10);
        cb.on_page_complete(5, 10, 0, 0);
    }
}
