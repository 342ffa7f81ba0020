//! Lattice table detection from ruling lines.
//!
//! A table is a connected group of rectangular cells whose borders are
//! drawn on the page:
//!
//! 1. ruling edges shorter than `edge_min_length` are dropped after nearby
//!    parallel edges are snapped together and collinear pieces are joined;
//! 2. every crossing of a horizontal and a vertical edge becomes a corner
//!    that remembers which edges pass through it;
//! 3. a cell is the smallest rectangle of four corners whose sides run
//!    along real edges;
//! 4. cells that share a corner form one table, and tables with a single
//!    cell are discarded;
//! 5. each table becomes a row × column grid whose slots are the cell text,
//!    or `None` where a merged cell or missing border leaves a gap.

use crate::config::TableSettings;
use crate::pipeline::layout::{BBox, Edge, Glyph, Orientation, PageLayout};
use std::collections::{BTreeMap, HashMap};

/// Table rows as detected: `None` for slots without a cell or without text.
pub type Grid = Vec<Vec<Option<String>>>;

/// A table found on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTable {
    /// Union of the table's cells.
    pub bbox: BBox,
    /// Cell text, top-to-bottom then left-to-right.
    pub rows: Grid,
}

/// Detect all ruled tables on a page, ordered top-to-bottom then left-to-right.
pub fn find_tables(layout: &PageLayout, settings: &TableSettings) -> Vec<DetectedTable> {
    let edges = snap_edges(layout.edges.clone(), settings.snap_tolerance);
    let edges: Vec<Edge> = join_edges(edges, settings.join_tolerance)
        .into_iter()
        .filter(|e| e.length() >= settings.edge_min_length)
        .collect();
    if edges.is_empty() {
        return Vec::new();
    }

    let corners = find_corners(&edges, settings.intersection_tolerance);
    let cells = corners_to_cells(&corners);

    group_cells(cells)
        .into_iter()
        .map(|cells| build_table(&cells, &layout.glyphs, settings))
        .collect()
}

/// Integer key for grouping coordinates that are equal after snapping.
fn key(v: f32) -> i64 {
    (v * 1000.0).round() as i64
}

fn unkey(k: i64) -> f32 {
    k as f32 / 1000.0
}

// ── Snapping ──────────────────────────────────────────────────────────────

/// Align parallel edges whose positions differ by at most `tolerance`.
///
/// Positions are clustered in sorted order, each step comparing against the
/// previous member, and every member moves to the cluster mean.
pub(crate) fn snap_edges(edges: Vec<Edge>, tolerance: f32) -> Vec<Edge> {
    let (mut horizontal, mut vertical): (Vec<Edge>, Vec<Edge>) = edges
        .into_iter()
        .partition(|e| e.orientation == Orientation::Horizontal);

    snap_axis(&mut horizontal, tolerance, |e| e.top, |e, y| {
        e.top = y;
        e.bottom = y;
    });
    snap_axis(&mut vertical, tolerance, |e| e.x0, |e, x| {
        e.x0 = x;
        e.x1 = x;
    });

    horizontal.extend(vertical);
    horizontal
}

fn snap_axis(
    edges: &mut [Edge],
    tolerance: f32,
    pos: impl Fn(&Edge) -> f32,
    set: impl Fn(&mut Edge, f32),
) {
    edges.sort_by(|a, b| pos(a).total_cmp(&pos(b)));

    let mut start = 0;
    while start < edges.len() {
        let mut end = start + 1;
        while end < edges.len() && pos(&edges[end]) - pos(&edges[end - 1]) <= tolerance {
            end += 1;
        }
        let mean = edges[start..end].iter().map(&pos).sum::<f32>() / (end - start) as f32;
        for edge in &mut edges[start..end] {
            set(edge, mean);
        }
        start = end;
    }
}

// ── Joining ───────────────────────────────────────────────────────────────

/// Merge collinear edges that overlap or are separated by at most `tolerance`.
pub(crate) fn join_edges(edges: Vec<Edge>, tolerance: f32) -> Vec<Edge> {
    let mut lines: BTreeMap<(u8, i64), Vec<(f32, f32)>> = BTreeMap::new();
    for e in &edges {
        match e.orientation {
            Orientation::Horizontal => lines.entry((0, key(e.top))).or_default().push((e.x0, e.x1)),
            Orientation::Vertical => lines.entry((1, key(e.x0))).or_default().push((e.top, e.bottom)),
        }
    }

    let mut joined = Vec::with_capacity(edges.len());
    for ((axis, pos), mut spans) in lines {
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut merged: Vec<(f32, f32)> = Vec::new();
        for (s, e) in spans {
            match merged.last_mut() {
                Some(last) if s <= last.1 + tolerance => last.1 = last.1.max(e),
                _ => merged.push((s, e)),
            }
        }

        let at = unkey(pos);
        joined.extend(merged.into_iter().map(|(s, e)| {
            if axis == 0 {
                Edge::horizontal(s, e, at)
            } else {
                Edge::vertical(at, s, e)
            }
        }));
    }
    joined
}

// ── Corners and cells ─────────────────────────────────────────────────────

/// Edges passing through one crossing point, by index into the edge list.
#[derive(Debug, Default, Clone)]
pub(crate) struct Corner {
    horizontal: Vec<usize>,
    vertical: Vec<usize>,
}

/// Crossing points keyed by `(key(x), key(top))`, sorted by x then top.
pub(crate) type Corners = BTreeMap<(i64, i64), Corner>;

pub(crate) fn find_corners(edges: &[Edge], tolerance: f32) -> Corners {
    let mut corners = Corners::new();
    for (hi, h) in edges
        .iter()
        .enumerate()
        .filter(|(_, e)| e.orientation == Orientation::Horizontal)
    {
        for (vi, v) in edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.orientation == Orientation::Vertical)
        {
            let crosses = v.x0 >= h.x0 - tolerance
                && v.x0 <= h.x1 + tolerance
                && h.top >= v.top - tolerance
                && h.top <= v.bottom + tolerance;
            if crosses {
                let corner = corners.entry((key(v.x0), key(h.top))).or_default();
                corner.horizontal.push(hi);
                corner.vertical.push(vi);
            }
        }
    }
    corners
}

/// `true` when the two corners lie on one shared edge.
fn connected(corners: &Corners, a: (i64, i64), b: (i64, i64)) -> bool {
    let (Some(ca), Some(cb)) = (corners.get(&a), corners.get(&b)) else {
        return false;
    };
    let shares = |xs: &[usize], ys: &[usize]| xs.iter().any(|i| ys.contains(i));
    if a.0 == b.0 {
        shares(&ca.vertical, &cb.vertical)
    } else if a.1 == b.1 {
        shares(&ca.horizontal, &cb.horizontal)
    } else {
        false
    }
}

/// The smallest bordered rectangle whose top-left corner is `origin`.
fn cell_at(corners: &Corners, points: &[(i64, i64)], at: usize) -> Option<BBox> {
    let origin = points[at];
    let rest = &points[at + 1..];
    let below = rest.iter().filter(|p| p.0 == origin.0);
    let right: Vec<&(i64, i64)> = rest.iter().filter(|p| p.1 == origin.1).collect();

    for &b in below {
        if !connected(corners, origin, b) {
            continue;
        }
        for &&r in &right {
            if !connected(corners, origin, r) {
                continue;
            }
            let opposite = (r.0, b.1);
            if corners.contains_key(&opposite)
                && connected(corners, opposite, r)
                && connected(corners, opposite, b)
            {
                return Some(BBox::new(
                    unkey(origin.0),
                    unkey(origin.1),
                    unkey(r.0),
                    unkey(b.1),
                ));
            }
        }
    }
    None
}

pub(crate) fn corners_to_cells(corners: &Corners) -> Vec<BBox> {
    let points: Vec<(i64, i64)> = corners.keys().copied().collect();
    (0..points.len())
        .filter_map(|i| cell_at(corners, &points, i))
        .collect()
}

// ── Tables ────────────────────────────────────────────────────────────────

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Group cells that share at least one corner; single-cell groups are dropped.
pub(crate) fn group_cells(cells: Vec<BBox>) -> Vec<Vec<BBox>> {
    let mut parent: Vec<usize> = (0..cells.len()).collect();
    let mut owner: HashMap<(i64, i64), usize> = HashMap::new();

    for (i, c) in cells.iter().enumerate() {
        let corners = [
            (key(c.x0), key(c.top)),
            (key(c.x1), key(c.top)),
            (key(c.x0), key(c.bottom)),
            (key(c.x1), key(c.bottom)),
        ];
        for corner in corners {
            match owner.get(&corner) {
                Some(&j) => {
                    let (ri, rj) = (find_root(&mut parent, i), find_root(&mut parent, j));
                    if ri != rj {
                        parent[ri] = rj;
                    }
                }
                None => {
                    owner.insert(corner, i);
                }
            }
        }
    }

    let mut groups: HashMap<usize, Vec<BBox>> = HashMap::new();
    for (i, cell) in cells.iter().enumerate() {
        let root = find_root(&mut parent, i);
        groups.entry(root).or_default().push(*cell);
    }

    let mut groups: Vec<Vec<BBox>> = groups.into_values().filter(|g| g.len() > 1).collect();
    groups.sort_by(|a, b| {
        let (ta, tb) = (top_left(a), top_left(b));
        ta.1.total_cmp(&tb.1).then(ta.0.total_cmp(&tb.0))
    });
    groups
}

fn top_left(cells: &[BBox]) -> (f32, f32) {
    cells
        .iter()
        .map(|c| (c.x0, c.top))
        .fold((f32::MAX, f32::MAX), |acc, (x, y)| {
            if y < acc.1 || (y == acc.1 && x < acc.0) {
                (x, y)
            } else {
                acc
            }
        })
}

fn build_table(cells: &[BBox], glyphs: &[Glyph], settings: &TableSettings) -> DetectedTable {
    let mut tops: Vec<i64> = cells.iter().map(|c| key(c.top)).collect();
    let mut lefts: Vec<i64> = cells.iter().map(|c| key(c.x0)).collect();
    tops.sort_unstable();
    tops.dedup();
    lefts.sort_unstable();
    lefts.dedup();

    let by_origin: HashMap<(i64, i64), &BBox> =
        cells.iter().map(|c| ((key(c.x0), key(c.top)), c)).collect();

    let rows = tops
        .iter()
        .map(|&top| {
            lefts
                .iter()
                .map(|&left| {
                    by_origin
                        .get(&(left, top))
                        .and_then(|cell| cell_text(cell, glyphs, settings))
                })
                .collect()
        })
        .collect();

    let bbox = cells[1..].iter().fold(cells[0], |acc, c| acc.union(c));
    DetectedTable { bbox, rows }
}

/// Text of the glyphs whose centre lies inside `cell`, or `None` if there are none.
pub(crate) fn cell_text(cell: &BBox, glyphs: &[Glyph], settings: &TableSettings) -> Option<String> {
    let mut inside: Vec<&Glyph> = glyphs
        .iter()
        .filter(|g| {
            let (cx, cy) = g.center();
            cell.contains_point(cx, cy)
        })
        .collect();
    if inside.is_empty() {
        return None;
    }
    inside.sort_by(|a, b| a.bbox.top.total_cmp(&b.bbox.top));

    let mut lines: Vec<Vec<&Glyph>> = Vec::new();
    for glyph in inside {
        match lines.last_mut() {
            Some(line) if (glyph.bbox.top - line[0].bbox.top).abs() <= settings.text_y_tolerance => {
                line.push(glyph)
            }
            _ => lines.push(vec![glyph]),
        }
    }

    let text = lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
            let mut out = String::new();
            let mut prev_x1: Option<f32> = None;
            for g in line {
                if let Some(x1) = prev_x1 {
                    if g.bbox.x0 - x1 > settings.text_x_tolerance {
                        out.push(' ');
                    }
                }
                out.push(g.ch);
                prev_x1 = Some(g.bbox.x1);
            }
            out
        })
        .collect::<Vec<_>>()
        .join("\n");

    Some(text)
}
