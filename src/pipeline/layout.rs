//! Page layout: the text, glyphs, ruling edges and image boxes of one page.
//!
//! pdfium reports coordinates with the origin at the bottom-left corner of
//! the page. Everything past this module works in *top-down* coordinates
//! (`top` grows towards the bottom of the page), so that "the line above"
//! and "the first row" mean what a reader expects.

use crate::error::ExtractError;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Segments whose endpoints differ by at most this many points along one
/// axis are treated as axis-aligned.
const AXIS_EPSILON: f32 = 0.5;

/// An axis-aligned rectangle in top-down page coordinates (points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl BBox {
    /// Build a box from two corners in any order.
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self {
            x0: x0.min(x1),
            top: top.min(bottom),
            x1: x0.max(x1),
            bottom: top.max(bottom),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// `true` when the point lies inside the box or on its border.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.top && y <= self.bottom
    }

    /// Convert a bottom-up pdfium rectangle on a page of `page_height` points.
    fn from_pdf_bounds(left: f32, bottom: f32, right: f32, top: f32, page_height: f32) -> Self {
        BBox::new(left, page_height - top, right, page_height - bottom)
    }
}

/// Direction of a ruling edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A horizontal or vertical ruling line.
///
/// Horizontal edges have `top == bottom`; vertical edges have `x0 == x1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
    pub orientation: Orientation,
}

impl Edge {
    pub fn horizontal(x0: f32, x1: f32, y: f32) -> Self {
        Self {
            x0: x0.min(x1),
            top: y,
            x1: x0.max(x1),
            bottom: y,
            orientation: Orientation::Horizontal,
        }
    }

    pub fn vertical(x: f32, top: f32, bottom: f32) -> Self {
        Self {
            x0: x,
            top: top.min(bottom),
            x1: x,
            bottom: top.max(bottom),
            orientation: Orientation::Vertical,
        }
    }

    /// The edge between two points, or `None` for a diagonal segment.
    pub fn between(ax: f32, ay: f32, bx: f32, by: f32) -> Option<Self> {
        if (ay - by).abs() <= AXIS_EPSILON {
            Some(Edge::horizontal(ax, bx, (ay + by) / 2.0))
        } else if (ax - bx).abs() <= AXIS_EPSILON {
            Some(Edge::vertical((ax + bx) / 2.0, ay, by))
        } else {
            None
        }
    }

    /// Length along the edge's own axis.
    pub fn length(&self) -> f32 {
        match self.orientation {
            Orientation::Horizontal => self.x1 - self.x0,
            Orientation::Vertical => self.bottom - self.top,
        }
    }
}

/// One glyph of page text with its bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub bbox: BBox,
}

impl Glyph {
    pub fn center(&self) -> (f32, f32) {
        (
            (self.bbox.x0 + self.bbox.x1) / 2.0,
            (self.bbox.top + self.bbox.bottom) / 2.0,
        )
    }
}

/// Everything the table and image passes need to know about one page.
#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    /// 1-indexed page number.
    pub page_num: usize,
    pub width: f32,
    pub height: f32,
    /// Extracted page text, lines separated by newlines.
    pub text: String,
    /// Visible (non-whitespace) glyphs.
    pub glyphs: Vec<Glyph>,
    /// Axis-aligned ruling edges from path objects.
    pub edges: Vec<Edge>,
    /// Bounding boxes of embedded image objects, in content-stream order.
    pub image_boxes: Vec<BBox>,
}

impl PageLayout {
    /// The page text split into lines; empty when the page has no text.
    pub fn lines(&self) -> Vec<&str> {
        split_lines(&self.text)
    }
}

/// Split extracted text into lines, tolerating `\r\n` separators.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Kind of a path segment, reduced to what edge detection cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    MoveTo,
    LineTo,
    Curve,
}

/// A path segment endpoint in top-down coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub kind: SegmentKind,
    pub x: f32,
    pub y: f32,
    /// The segment closes the current sub-path back to its start.
    pub close: bool,
}

/// Turn a path's segments into axis-aligned ruling edges.
///
/// Straight segments (including implicit close segments) become edges when
/// they are horizontal or vertical; curves only move the current point.
pub fn edges_from_path(points: &[PathPoint]) -> Vec<Edge> {
    let mut edges = Vec::new();
    let mut start: Option<(f32, f32)> = None;
    let mut current: Option<(f32, f32)> = None;

    for p in points {
        match p.kind {
            SegmentKind::MoveTo => {
                start = Some((p.x, p.y));
                current = Some((p.x, p.y));
            }
            SegmentKind::LineTo => {
                if let Some((cx, cy)) = current {
                    edges.extend(Edge::between(cx, cy, p.x, p.y));
                }
                current = Some((p.x, p.y));
            }
            SegmentKind::Curve => {
                current = Some((p.x, p.y));
            }
        }

        if p.close {
            if let (Some((sx, sy)), Some((cx, cy))) = (start, current) {
                if (sx, sy) != (cx, cy) {
                    edges.extend(Edge::between(cx, cy, sx, sy));
                }
                current = Some((sx, sy));
            }
        }
    }

    edges
        .into_iter()
        .filter(|e| e.length() > 0.0)
        .collect()
}

/// Read the layout of one pdfium page.
///
/// `page_num` is 1-indexed and only used for diagnostics.
pub fn read_page_layout(page: &PdfPage, page_num: usize) -> Result<PageLayout, ExtractError> {
    let width = page.width().value;
    let height = page.height().value;

    let text_page = page.text().map_err(|e| ExtractError::PageReadFailed {
        page: page_num,
        detail: format!("{:?}", e),
    })?;
    let text = text_page.all();

    let mut glyphs = Vec::new();
    for ch in text_page.chars().iter() {
        let Some(c) = ch.unicode_char() else {
            continue;
        };
        if c.is_whitespace() || c.is_control() {
            continue;
        }
        match ch.loose_bounds() {
            Ok(rect) => glyphs.push(Glyph {
                ch: c,
                bbox: BBox::from_pdf_bounds(
                    rect.left().value,
                    rect.bottom().value,
                    rect.right().value,
                    rect.top().value,
                    height,
                ),
            }),
            Err(e) => debug!("Page {}: glyph {:?} has no bounds: {:?}", page_num, c, e),
        }
    }

    let mut edges = Vec::new();
    let mut image_boxes = Vec::new();

    for object in page.objects().iter() {
        match object.object_type() {
            PdfPageObjectType::Path => {
                if let Some(path) = object.as_path_object() {
                    let points: Vec<PathPoint> = path
                        .segments()
                        .iter()
                        .filter_map(|segment| {
                            let kind = match segment.segment_type() {
                                PdfPathSegmentType::MoveTo => SegmentKind::MoveTo,
                                PdfPathSegmentType::LineTo => SegmentKind::LineTo,
                                PdfPathSegmentType::BezierTo => SegmentKind::Curve,
                                _ => return None,
                            };
                            Some(PathPoint {
                                kind,
                                x: segment.x().value,
                                y: height - segment.y().value,
                                close: segment.is_close(),
                            })
                        })
                        .collect();
                    edges.extend(edges_from_path(&points));
                }
            }
            PdfPageObjectType::Image => match object.bounds() {
                Ok(bounds) => image_boxes.push(BBox::from_pdf_bounds(
                    bounds.left().value,
                    bounds.bottom().value,
                    bounds.right().value,
                    bounds.top().value,
                    height,
                )),
                Err(e) => warn!("Page {}: image object without bounds: {:?}", page_num, e),
            },
            _ => {}
        }
    }

    debug!(
        "Page {}: {} glyphs, {} edges, {} images",
        page_num,
        glyphs.len(),
        edges.len(),
        image_boxes.len()
    );

    Ok(PageLayout {
        page_num,
        width,
        height,
        text,
        glyphs,
        edges,
        image_boxes,
    })
}
