//! Cropping embedded images out of a rendered page.
//!
//! Each page that carries image objects is rendered once at the configured
//! DPI; every image is then cropped from that raster by its bounding box.
//! Pixel geometry is derived from the actual raster size, so a render that
//! was capped by `max_rendered_pixels` still crops the right region.

use crate::config::ExtractionConfig;
use crate::error::ImageFailure;
use crate::output::PageImage;
use crate::pipeline::encode;
use crate::pipeline::layout::{BBox, PageLayout};
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

/// A crop rectangle in raster pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Map a top-down page box onto a raster of `image_w × image_h` pixels.
///
/// The box is clamped to the page first. Edges are rounded outwards so thin
/// images keep at least one pixel.
pub fn crop_rect(
    bbox: &BBox,
    page_w: f32,
    page_h: f32,
    image_w: u32,
    image_h: u32,
) -> Result<PixelRect, String> {
    if !(page_w > 0.0 && page_h > 0.0) || image_w == 0 || image_h == 0 {
        return Err("page has zero size".into());
    }

    let x0 = bbox.x0.clamp(0.0, page_w);
    let x1 = bbox.x1.clamp(0.0, page_w);
    let top = bbox.top.clamp(0.0, page_h);
    let bottom = bbox.bottom.clamp(0.0, page_h);
    if x0 >= x1 || top >= bottom {
        return Err(format!(
            "bounding box ({:.1}, {:.1}, {:.1}, {:.1}) lies outside the page",
            bbox.x0, bbox.top, bbox.x1, bbox.bottom
        ));
    }

    let sx = image_w as f32 / page_w;
    let sy = image_h as f32 / page_h;
    let (w, h) = (image_w as f32, image_h as f32);

    let left = (x0 * sx).floor().clamp(0.0, w) as u32;
    let right = (x1 * sx).ceil().clamp(0.0, w) as u32;
    let top_px = (top * sy).floor().clamp(0.0, h) as u32;
    let bottom_px = (bottom * sy).ceil().clamp(0.0, h) as u32;

    if right <= left || bottom_px <= top_px {
        return Err("crop region is empty after scaling".into());
    }

    Ok(PixelRect {
        left,
        top: top_px,
        width: right - left,
        height: bottom_px - top_px,
    })
}

/// Crop one image from an already rendered page raster.
pub fn crop_image(
    raster: &DynamicImage,
    layout: &PageLayout,
    index: usize,
    bbox: &BBox,
) -> Result<PageImage, String> {
    let rect = crop_rect(
        bbox,
        layout.width,
        layout.height,
        raster.width(),
        raster.height(),
    )?;
    let cropped = raster.crop_imm(rect.left, rect.top, rect.width, rect.height);
    let png = encode::encode_png(&cropped).map_err(|e| format!("PNG encoding failed: {e}"))?;

    Ok(PageImage {
        page: layout.page_num,
        index,
        bbox: *bbox,
        width: rect.width,
        height: rect.height,
        png,
    })
}

/// Render `page` at the configured DPI, capped at `max_rendered_pixels`.
fn render_page(page: &PdfPage, config: &ExtractionConfig) -> Result<DynamicImage, String> {
    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(config.dpi as f32 / 72.0)
        .set_maximum_width(config.max_rendered_pixels as i32)
        .set_maximum_height(config.max_rendered_pixels as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| format!("render failed: {:?}", e))?;
    Ok(bitmap.as_image())
}

/// Crop every embedded image on a page.
///
/// Failures are per image: each is logged, reported to the progress
/// callback and returned alongside the successful crops.
pub fn extract_page_images(
    page: &PdfPage,
    layout: &PageLayout,
    config: &ExtractionConfig,
) -> (Vec<PageImage>, Vec<ImageFailure>) {
    if layout.image_boxes.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let raster = render_page(page, config);
    if let Ok(ref r) = raster {
        debug!(
            "Rendered page {} → {}x{} px for cropping",
            layout.page_num,
            r.width(),
            r.height()
        );
    }

    crop_page_images(&raster, layout, config)
}

/// Crop every image box of `layout` from `raster`.
///
/// A failed render fails every box. Each failure is logged, reported to
/// the progress callback and recorded; the remaining boxes are still cropped.
pub fn crop_page_images(
    raster: &Result<DynamicImage, String>,
    layout: &PageLayout,
    config: &ExtractionConfig,
) -> (Vec<PageImage>, Vec<ImageFailure>) {
    let mut images = Vec::new();
    let mut failures = Vec::new();

    for (index, bbox) in layout.image_boxes.iter().enumerate() {
        let result = match raster {
            Ok(r) => crop_image(r, layout, index, bbox),
            Err(e) => Err(e.clone()),
        };
        match result {
            Ok(image) => images.push(image),
            Err(detail) => {
                let failure = ImageFailure {
                    page: layout.page_num,
                    index,
                    detail,
                };
                warn!("{}", failure);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_image_error(layout.page_num, &failure.detail);
                }
                failures.push(failure);
            }
        }
    }

    (images, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ExtractionProgressCallback;
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    // US Letter at 144 DPI: two pixels per point.
    const PAGE_W: f32 = 612.0;
    const PAGE_H: f32 = 792.0;
    const IMG_W: u32 = 1224;
    const IMG_H: u32 = 1584;

    #[test]
    fn crop_scales_points_to_pixels() {
        let rect = crop_rect(&BBox::new(72.0, 144.0, 216.0, 288.0), PAGE_W, PAGE_H, IMG_W, IMG_H)
            .unwrap();
        assert_eq!(
            rect,
            PixelRect {
                left: 144,
                top: 288,
                width: 288,
                height: 288
            }
        );
    }

    #[test]
    fn crop_is_clamped_to_the_page() {
        let rect = crop_rect(&BBox::new(-50.0, 700.0, 100.0, 900.0), PAGE_W, PAGE_H, IMG_W, IMG_H)
            .unwrap();
        assert_eq!(rect.left, 0);
        assert_eq!(rect.top + rect.height, IMG_H);
    }

    #[test]
    fn box_outside_the_page_is_an_error() {
        let err = crop_rect(&BBox::new(700.0, 10.0, 800.0, 50.0), PAGE_W, PAGE_H, IMG_W, IMG_H)
            .unwrap_err();
        assert!(err.contains("outside the page"), "got: {err}");
    }

    #[test]
    fn hairline_image_keeps_one_pixel() {
        let rect = crop_rect(&BBox::new(100.0, 100.2, 200.0, 100.4), PAGE_W, PAGE_H, IMG_W, IMG_H)
            .unwrap();
        assert!(rect.height >= 1);
    }

    #[test]
    fn crop_image_encodes_png_of_crop_size() {
        let raster = DynamicImage::ImageRgba8(RgbaImage::from_pixel(IMG_W, IMG_H, Rgba([0, 0, 0, 255])));
        let layout = PageLayout {
            page_num: 6,
            width: PAGE_W,
            height: PAGE_H,
            ..PageLayout::default()
        };
        let image = crop_image(&raster, &layout, 2, &BBox::new(0.0, 0.0, 72.0, 36.0)).unwrap();
        assert_eq!((image.page, image.index), (6, 2));
        assert_eq!((image.width, image.height), (144, 72));

        let decoded = image::load_from_memory(&image.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (144, 72));
    }

    #[derive(Default)]
    struct ErrorCounter {
        errors: AtomicUsize,
    }

    impl ExtractionProgressCallback for ErrorCounter {
        fn on_image_error(&self, _page: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn page_with_boxes(boxes: Vec<BBox>) -> PageLayout {
        PageLayout {
            page_num: 9,
            width: PAGE_W,
            height: PAGE_H,
            image_boxes: boxes,
            ..PageLayout::default()
        }
    }

    #[test]
    fn one_bad_box_does_not_stop_the_others() {
        let raster = Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            IMG_W,
            IMG_H,
            Rgba([255, 255, 255, 255]),
        )));
        let layout = page_with_boxes(vec![
            BBox::new(72.0, 72.0, 144.0, 108.0),
            BBox::new(700.0, 10.0, 800.0, 50.0),
            BBox::new(300.0, 400.0, 336.0, 436.0),
        ]);
        let counter = Arc::new(ErrorCounter::default());
        let config = ExtractionConfig::builder()
            .progress_callback(counter.clone())
            .build()
            .unwrap();

        let (images, failures) = crop_page_images(&raster, &layout, &config);

        assert_eq!(images.iter().map(|i| i.index).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(failures.len(), 1);
        assert_eq!((failures[0].page, failures[0].index), (9, 1));
        assert!(failures[0].detail.contains("outside the page"));
        assert_eq!(counter.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_render_fails_every_box() {
        let raster: Result<DynamicImage, String> = Err("render failed: out of memory".into());
        let layout = page_with_boxes(vec![
            BBox::new(72.0, 72.0, 144.0, 108.0),
            BBox::new(300.0, 400.0, 336.0, 436.0),
        ]);

        let (images, failures) = crop_page_images(&raster, &layout, &ExtractionConfig::default());

        assert!(images.is_empty());
        assert_eq!(failures.iter().map(|f| f.index).collect::<Vec<_>>(), vec![0, 1]);
        assert!(failures.iter().all(|f| f.detail == "render failed: out of memory"));
    }
}
