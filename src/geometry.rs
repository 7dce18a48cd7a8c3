//! Stateless rectangle predicates shared by the tracker, snapping and validation.

use crate::types::Rect;

// Float noise left over after kerf arithmetic must not count as overlap.
const OVERLAP_EPS: f64 = 1e-6;

/// True when the interiors intersect. Rectangles that only share an edge
/// do not overlap.
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() - OVERLAP_EPS
        && b.x < a.right() - OVERLAP_EPS
        && a.y < b.bottom() - OVERLAP_EPS
        && b.y < a.bottom() - OVERLAP_EPS
}

pub fn point_in_rect(x: f64, y: f64, rect: &Rect, eps: f64) -> bool {
    x >= rect.x - eps && x <= rect.right() + eps && y >= rect.y - eps && y <= rect.bottom() + eps
}

pub fn rect_contains_rect(outer: &Rect, inner: &Rect, eps: f64) -> bool {
    inner.x >= outer.x - eps
        && inner.y >= outer.y - eps
        && inner.right() <= outer.right() + eps
        && inner.bottom() <= outer.bottom() + eps
}

/// True when the piece starts at the region's top-left corner.
pub fn is_corner_aligned(piece: &Rect, region: &Rect, eps: f64) -> bool {
    (piece.x - region.x).abs() <= eps && (piece.y - region.y).abs() <= eps
}

/// True when the open intervals (a0, a1) and (b0, b1) share more than `eps`.
pub fn spans_overlap(a0: f64, a1: f64, b0: f64, b1: f64, eps: f64) -> bool {
    a0.max(b0) + eps < a1.min(b1)
}
