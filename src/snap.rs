//! Snapping of a dropped piece onto board edges, neighbouring pieces and
//! free-region corners.

use crate::config::LayoutConfig;
use crate::types::{Rect, Region, Size};

/// Adjusts the candidate top-left corner (x, y) of a piece of `size`.
///
/// Rules run in a fixed order and every rule compares against the raw
/// candidate, so along each axis the last rule that matches wins:
/// usable-area edges, then every other piece (flush with a kerf gap on
/// either side, or aligned left/left and right/right), then free-region
/// corners (both axes at once). The result is finally clamped so the piece
/// stays inside the usable area.
pub fn snap(
    size: Size,
    x: f64,
    y: f64,
    others: &[Rect],
    regions: &[Region],
    config: &LayoutConfig,
) -> (f64, f64) {
    let usable = config.usable_area();
    let tol = config.snap_tolerance;
    let kerf = config.kerf;
    let near = |a: f64, b: f64| (a - b).abs() <= tol;

    let mut sx = x;
    let mut sy = y;

    // Board edges
    if near(x, usable.x) {
        sx = usable.x;
    }
    if near(x + size.w, usable.right()) {
        sx = usable.right() - size.w;
    }
    if near(y, usable.y) {
        sy = usable.y;
    }
    if near(y + size.h, usable.bottom()) {
        sy = usable.bottom() - size.h;
    }

    for other in others {
        if near(x, other.right() + kerf) {
            sx = other.right() + kerf;
        } else if near(x + size.w + kerf, other.x) {
            sx = other.x - kerf - size.w;
        }
        if near(x, other.x) {
            sx = other.x;
        } else if near(x + size.w, other.right()) {
            sx = other.right() - size.w;
        }

        if near(y, other.bottom() + kerf) {
            sy = other.bottom() + kerf;
        } else if near(y + size.h + kerf, other.y) {
            sy = other.y - kerf - size.h;
        }
        if near(y, other.y) {
            sy = other.y;
        } else if near(y + size.h, other.bottom()) {
            sy = other.bottom() - size.h;
        }
    }

    for region in regions {
        if near(x, region.x) && near(y, region.y) {
            sx = region.x;
            sy = region.y;
        }
    }

    let max_x = (usable.right() - size.w).max(usable.x);
    let max_y = (usable.bottom() - size.h).max(usable.y);
    (sx.clamp(usable.x, max_x), sy.clamp(usable.y, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LayoutConfig {
        LayoutConfig::default()
    }

    #[test]
    fn test_snaps_to_board_corner() {
        let (x, y) = snap(Size::new(400.0, 300.0), 25.0, 3.0, &[], &[], &config());
        assert_eq!((x, y), (10.0, 10.0));

        // Bottom-right: usable area ends at (2760, 1840).
        let (x, y) = snap(Size::new(400.0, 300.0), 2345.0, 1520.0, &[], &[], &config());
        assert_eq!((x, y), (2360.0, 1540.0));
    }

    #[test]
    fn test_snaps_flush_to_neighbour_with_kerf() {
        let other = Rect::new(10.0, 10.0, 400.0, 300.0);
        let (x, y) = snap(Size::new(200.0, 300.0), 420.0, 12.0, &[other], &[], &config());
        assert_eq!((x, y), (411.5, 10.0));

        // Left of the neighbour: 1000 - 1.5 - 200
        let other = Rect::new(1000.0, 500.0, 400.0, 300.0);
        let (x, _) = snap(Size::new(200.0, 100.0), 790.0, 900.0, &[other], &[], &config());
        assert_eq!(x, 798.5);
    }

    #[test]
    fn test_piece_snap_overrides_edge_snap() {
        // Right edge plus kerf lands at x = 30.
        let other = Rect::new(-60.0, 500.0, 88.5, 100.0);
        // 25 is within tolerance of both the left edge (10) and the neighbour (30).
        let (x, _) = snap(Size::new(200.0, 100.0), 25.0, 900.0, &[other], &[], &config());
        assert_eq!(x, 30.0);
    }

    #[test]
    fn test_snaps_to_region_corner() {
        let region = Region::from_rect(Rect::new(411.5, 311.5, 1000.0, 1000.0));
        let (x, y) = snap(Size::new(200.0, 100.0), 430.0, 300.0, &[], &[region], &config());
        assert_eq!((x, y), (411.5, 311.5));
    }

    #[test]
    fn test_far_from_everything_is_unchanged_but_clamped() {
        let (x, y) = snap(Size::new(200.0, 100.0), 900.0, 700.0, &[], &[], &config());
        assert_eq!((x, y), (900.0, 700.0));

        let (x, y) = snap(Size::new(200.0, 100.0), 5000.0, -400.0, &[], &[], &config());
        assert_eq!((x, y), (2560.0, 10.0));
    }
}
