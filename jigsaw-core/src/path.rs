use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::edge::{EdgeType, Edges};

/// Knob protrusion as a fraction of the piece's minor dimension. Generous on
/// purpose: the tabs have to be easy targets for small hands at grid sizes
/// 3-5 without crossing into the next piece over.
pub const KNOB_RATIO: f64 = 0.28;

/// Basic two dimensional point used for geometry operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

/// A closed piece outline plus the metrics needed to register the source
/// image under it.
///
/// `width`/`height` are the nominal square inflated by one knob allowance on
/// every side that interlocks (tab or blank); flat sides add nothing.
/// `offset_x`/`offset_y` locate the nominal square's top-left corner inside
/// that inflated box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathData {
    pub path: String,
    pub width: f64,
    pub height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

fn fmt(v: f64) -> String {
    format!("{:.2}", v)
}

/// Append one shaped edge segment running from `start` to `end`.
///
/// This is the single curve primitive shared by piece outlines and the grid
/// overlay, which is what keeps their knobs pixel-identical. Positive `sign`
/// bulges to the left of the travel direction; on a clockwise walk of a
/// piece the left of travel is always outward, so each edge passes its own
/// signed value unmodified. The shape is a straight shoulder to 1/3 of the
/// edge, a quadratic neck, a cubic rounded head centered on the midpoint,
/// then the mirror of the way in. The shape is symmetric about the midpoint,
/// so traversing the same boundary in the opposite direction with a negated
/// sign traces the identical point set; the grid overlay leans on that when
/// it walks seams in grid order instead of piece-outline order.
pub fn edge_curve(start: Point, end: Point, knob: f64, sign: f64) -> String {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len = (dx * dx + dy * dy).sqrt();
    let (ux, uy) = (dx / len, dy / len);
    // Left-of-travel normal in screen coordinates (y grows downward).
    let (nx, ny) = (uy, -ux);

    let at = |t: f64, v: f64| -> Point {
        Point {
            x: start.x + ux * t + nx * v * sign,
            y: start.y + uy * t + ny * v * sign,
        }
    };
    let pt = |p: Point| format!("{} {}", fmt(p.x), fmt(p.y));

    let third = len / 3.0;
    let mid = len / 2.0;
    // Half-width of the neck opening, along the edge.
    let neck = knob * 0.5;

    let shoulder_in = at(third, 0.0);
    let neck_in_ctrl = at(mid - neck, 0.0);
    let neck_in = at(mid - neck, knob * 0.6);
    let head_ctrl_in = at(mid - neck, knob);
    let head_ctrl_out = at(mid + neck, knob);
    let neck_out = at(mid + neck, knob * 0.6);
    let neck_out_ctrl = at(mid + neck, 0.0);
    let shoulder_out = at(2.0 * third, 0.0);

    format!(
        " L {} Q {}, {} C {}, {}, {} Q {}, {} L {}",
        pt(shoulder_in),
        pt(neck_in_ctrl),
        pt(neck_in),
        pt(head_ctrl_in),
        pt(head_ctrl_out),
        pt(neck_out),
        pt(neck_out_ctrl),
        pt(shoulder_out),
        pt(end),
    )
}

/// Build the closed outline for one piece.
///
/// `width`/`height` are the nominal square (equal in practice, not required);
/// `padding` is an extra uniform margin added to every side of the box.
/// Edge values other than flat/tab/blank cannot occur by construction.
pub fn build_piece_path(width: f64, height: f64, edges: Edges, padding: f64) -> PathData {
    let knob = width.min(height) * KNOB_RATIO;
    let allow = |e: EdgeType| if e.is_flat() { padding } else { knob + padding };

    let ox = allow(edges.left);
    let oy = allow(edges.top);
    let tl = Point { x: ox, y: oy };
    let tr = Point { x: ox + width, y: oy };
    let br = Point {
        x: ox + width,
        y: oy + height,
    };
    let bl = Point {
        x: ox,
        y: oy + height,
    };

    let mut path = format!("M {} {}", fmt(tl.x), fmt(tl.y));
    // Clockwise walk: top, right, bottom, left.
    for (from, to, edge) in [
        (tl, tr, edges.top),
        (tr, br, edges.right),
        (br, bl, edges.bottom),
        (bl, tl, edges.left),
    ] {
        if edge.is_flat() {
            path.push_str(&format!(" L {} {}", fmt(to.x), fmt(to.y)));
        } else {
            path.push_str(&edge_curve(from, to, knob, edge.sign()));
        }
    }
    path.push_str(" Z");

    PathData {
        path,
        width: width + allow(edges.left) + allow(edges.right),
        height: height + allow(edges.top) + allow(edges.bottom),
        offset_x: ox,
        offset_y: oy,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct PathKey {
    size_bits: u64,
    edges: Edges,
}

/// Memoized piece outlines keyed by (size, edge tuple).
///
/// Many pieces share identical edge shapes at the same size, and the key
/// space is bounded by the grid size, so entries live for the whole puzzle
/// session with no eviction.
#[derive(Default)]
pub struct PathCache {
    entries: HashMap<PathKey, PathData>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outline for a square piece of the given size, built on first use.
    pub fn get(&mut self, size: f64, edges: Edges) -> &PathData {
        let key = PathKey {
            size_bits: size.to_bits(),
            edges,
        };
        self.entries
            .entry(key)
            .or_insert_with(|| build_piece_path(size, size, edges, 0.0))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
