use crate::geometry::{is_corner_aligned, rect_contains_rect, spans_overlap};
use crate::types::{Orientation, Rect, Region, Size};

/// A saw line that has already been charged kerf during the current rebuild.
#[derive(Debug, Clone, Copy, PartialEq)]
struct KerfLine {
    orientation: Orientation,
    position: f64,
    start: f64,
    end: f64,
}

/// Outcome of splitting a region around a freshly placed piece.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Children kept in the free set, at most two.
    pub children: Vec<Region>,
    /// Coordinate where the stock beyond the primary cut begins: the piece's
    /// far edge plus whatever kerf that line was charged.
    pub remainder_at: f64,
}

/// Owns the free regions of one board.
#[derive(Debug, Clone)]
pub struct RegionTracker {
    usable: Rect,
    tolerance: f64,
    pub regions: Vec<Region>,
    kerfed: Vec<KerfLine>,
    inherit_direction: bool,
}

impl RegionTracker {
    pub fn new(usable: Rect, tolerance: f64) -> Self {
        Self {
            usable,
            tolerance,
            regions: vec![Region::from_rect(usable)],
            kerfed: Vec::new(),
            inherit_direction: true,
        }
    }

    /// Starts from an existing free set, e.g. the result of the last rebuild.
    /// The kerf ledger starts empty.
    pub fn from_regions(usable: Rect, tolerance: f64, regions: Vec<Region>) -> Self {
        Self {
            usable,
            tolerance,
            regions,
            kerfed: Vec::new(),
            inherit_direction: true,
        }
    }

    /// Children split off from now on start without a direction instead of
    /// taking their parent's.
    pub fn without_inheritance(mut self) -> Self {
        self.inherit_direction = false;
        self
    }

    /// Back to a single region spanning the usable area and an empty ledger.
    pub fn reset(&mut self) {
        self.regions.clear();
        self.regions.push(Region::from_rect(self.usable));
        self.kerfed.clear();
    }

    pub fn into_regions(self) -> Vec<Region> {
        self.regions
    }

    /// Index of a free region that can hold a `size` rectangle with its
    /// top-left corner at (x, y).
    ///
    /// When several regions qualify (only possible once `free_region` has
    /// put a rectangle back on top of existing regions), the pick is: a region the
    /// rectangle is corner-aligned to, then the smallest area, then the
    /// top-most, then the left-most.
    pub fn find_region_containing(&self, size: Size, x: f64, y: f64) -> Option<usize> {
        let target = Rect::at(x, y, size);
        let eps = self.tolerance;
        self.regions
            .iter()
            .enumerate()
            .filter(|(_, r)| rect_contains_rect(&r.rect(), &target, eps))
            .min_by(|(_, a), (_, b)| {
                let aligned_a = is_corner_aligned(&target, &a.rect(), eps);
                let aligned_b = is_corner_aligned(&target, &b.rect(), eps);
                aligned_b
                    .cmp(&aligned_a)
                    .then(a.area().total_cmp(&b.area()))
                    .then(a.y.total_cmp(&b.y))
                    .then(a.x.total_cmp(&b.x))
            })
            .map(|(idx, _)| idx)
    }

    /// Sets the region's cut direction unless a piece already locked it.
    pub fn lock_direction(&mut self, idx: usize, orientation: Orientation) {
        let region = &mut self.regions[idx];
        if region.direction.is_none() {
            region.direction = Some(orientation);
        }
    }

    /// Removes the region at `idx` and adds its guillotine children.
    ///
    /// Vertical: the full-height remainder right of the piece, plus the
    /// strip below the piece as wide as the piece. Horizontal: the
    /// full-width remainder below the piece, plus the strip right of the
    /// piece as tall as the piece. Children below `min_size` on either side
    /// are scrap; when both are scrap the region is simply consumed.
    pub fn split_after_placement(
        &mut self,
        idx: usize,
        piece: Size,
        orientation: Orientation,
        kerf: f64,
        min_size: f64,
    ) -> Split {
        let region = self.regions.remove(idx);
        let line_x = region.x + piece.w;
        let line_y = region.y + piece.h;

        let (children, remainder_at) = match orientation {
            Orientation::Vertical => {
                let kerf_v = self.charge_kerf(
                    Orientation::Vertical,
                    line_x,
                    region.y,
                    region.bottom(),
                    region.right() - line_x,
                    kerf,
                );
                let kerf_h = self.charge_kerf(
                    Orientation::Horizontal,
                    line_y,
                    region.x,
                    line_x,
                    region.bottom() - line_y,
                    kerf,
                );
                let right = Rect::new(
                    line_x + kerf_v,
                    region.y,
                    region.size.w - piece.w - kerf_v,
                    region.size.h,
                );
                let below = Rect::new(
                    region.x,
                    line_y + kerf_h,
                    piece.w,
                    region.size.h - piece.h - kerf_h,
                );
                ([right, below], line_x + kerf_v)
            }
            Orientation::Horizontal => {
                let kerf_h = self.charge_kerf(
                    Orientation::Horizontal,
                    line_y,
                    region.x,
                    region.right(),
                    region.bottom() - line_y,
                    kerf,
                );
                let kerf_v = self.charge_kerf(
                    Orientation::Vertical,
                    line_x,
                    region.y,
                    line_y,
                    region.right() - line_x,
                    kerf,
                );
                let below = Rect::new(
                    region.x,
                    line_y + kerf_h,
                    region.size.w,
                    region.size.h - piece.h - kerf_h,
                );
                let right = Rect::new(
                    line_x + kerf_v,
                    region.y,
                    region.size.w - piece.w - kerf_v,
                    piece.h,
                );
                ([below, right], line_y + kerf_h)
            }
        };

        let inherit = self.inherit_direction;
        let children: Vec<Region> = children
            .into_iter()
            .filter(|r| r.w > 0.0 && r.h > 0.0 && r.w >= min_size && r.h >= min_size)
            .map(|r| Region {
                direction: if inherit { region.direction } else { None },
                depth: region.depth + 1,
                ..Region::from_rect(r)
            })
            .collect();

        self.regions.extend(children.iter().copied());
        Split {
            children,
            remainder_at,
        }
    }

    /// Takes a region out of the free set without leaving children, for a
    /// piece that fills it exactly.
    pub fn consume(&mut self, idx: usize) -> Region {
        self.regions.remove(idx)
    }

    /// Puts a rectangle back into the free set. Neighbours are not merged.
    pub fn free_region(&mut self, rect: Rect) {
        if rect.w > 0.0 && rect.h > 0.0 {
            self.regions.push(Region::from_rect(rect));
        }
    }

    // Kerf is charged once per physical line: a collinear line whose span
    // overlaps one already charged costs nothing. A line with no stock
    // behind it (`leftover`) is not a cut at all.
    fn charge_kerf(
        &mut self,
        orientation: Orientation,
        position: f64,
        start: f64,
        end: f64,
        leftover: f64,
        kerf: f64,
    ) -> f64 {
        if leftover <= self.tolerance {
            return 0.0;
        }
        let eps = self.tolerance;
        let already = self.kerfed.iter().any(|line| {
            line.orientation == orientation
                && (line.position - position).abs() <= eps
                && spans_overlap(line.start, line.end, start, end, 0.0)
        });
        if already {
            return 0.0;
        }
        self.kerfed.push(KerfLine {
            orientation,
            position,
            start,
            end,
        });
        kerf
    }
}

/// Whether cutting the piece off along `orientation` leaves stock behind,
/// i.e. strictly shrinks the region along that axis.
pub fn is_viable(orientation: Orientation, region: &Region, piece: Size, eps: f64) -> bool {
    match orientation {
        Orientation::Vertical => region.size.w - piece.w > eps,
        Orientation::Horizontal => region.size.h - piece.h > eps,
    }
}

/// Picks the cut orientation for a piece in `region`: the piece's own
/// preference, else the region's locked direction, else the board default.
/// Falls back to the other axis when only that one leaves stock behind.
pub fn resolve_orientation(
    preferred: Option<Orientation>,
    region: &Region,
    piece: Size,
    default: Orientation,
    eps: f64,
) -> Orientation {
    let desired = preferred.or(region.direction).unwrap_or(default);
    if !is_viable(desired, region, piece, eps) && is_viable(desired.other(), region, piece, eps) {
        desired.other()
    } else {
        desired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> RegionTracker {
        RegionTracker::new(Rect::new(10.0, 10.0, 2750.0, 1830.0), 1.0)
    }

    #[test]
    fn test_vertical_split_scenario() {
        let mut tracker = board();
        let idx = tracker
            .find_region_containing(Size::new(400.0, 300.0), 10.0, 10.0)
            .unwrap();
        let split = tracker.split_after_placement(
            idx,
            Size::new(400.0, 300.0),
            Orientation::Vertical,
            1.5,
            30.0,
        );
        assert_eq!(split.remainder_at, 411.5);
        assert_eq!(
            split.children.iter().map(|r| r.rect()).collect::<Vec<_>>(),
            vec![
                Rect::new(411.5, 10.0, 2348.5, 1830.0),
                Rect::new(10.0, 311.5, 400.0, 1528.5),
            ]
        );
        assert_eq!(tracker.regions.len(), 2);
    }

    #[test]
    fn test_horizontal_split() {
        let mut tracker = board();
        let split = tracker.split_after_placement(
            0,
            Size::new(400.0, 300.0),
            Orientation::Horizontal,
            1.5,
            30.0,
        );
        assert_eq!(split.remainder_at, 311.5);
        assert_eq!(
            split.children.iter().map(|r| r.rect()).collect::<Vec<_>>(),
            vec![
                Rect::new(10.0, 311.5, 2750.0, 1528.5),
                Rect::new(411.5, 10.0, 2348.5, 300.0),
            ]
        );
    }

    #[test]
    fn test_children_below_min_size_are_dropped() {
        let mut tracker = board();
        // 1830 - 1810 - 1.5 = 18.5 left below the piece
        let split = tracker.split_after_placement(
            0,
            Size::new(400.0, 1810.0),
            Orientation::Vertical,
            1.5,
            30.0,
        );
        assert_eq!(split.children.len(), 1);
        assert_eq!(split.children[0].x, 411.5);
    }

    #[test]
    fn test_both_children_scrap_consumes_region() {
        let mut tracker = board();
        let split = tracker.split_after_placement(
            0,
            Size::new(2730.0, 1810.0),
            Orientation::Horizontal,
            1.5,
            30.0,
        );
        assert!(split.children.is_empty());
        assert!(tracker.regions.is_empty());
        assert_eq!(split.remainder_at, 1821.5);
    }

    #[test]
    fn test_children_inherit_locked_direction() {
        let mut tracker = board();
        tracker.lock_direction(0, Orientation::Vertical);
        tracker.lock_direction(0, Orientation::Horizontal);
        assert_eq!(tracker.regions[0].direction, Some(Orientation::Vertical));

        tracker.split_after_placement(
            0,
            Size::new(400.0, 300.0),
            Orientation::Vertical,
            1.5,
            30.0,
        );
        assert!(
            tracker
                .regions
                .iter()
                .all(|r| r.direction == Some(Orientation::Vertical) && r.depth == 1)
        );
    }

    #[test]
    fn test_children_without_inheritance_start_unlocked() {
        let mut tracker = board().without_inheritance();
        tracker.lock_direction(0, Orientation::Horizontal);
        tracker.split_after_placement(
            0,
            Size::new(400.0, 300.0),
            Orientation::Horizontal,
            1.5,
            30.0,
        );
        assert_eq!(tracker.regions.len(), 2);
        assert!(tracker.regions.iter().all(|r| r.direction.is_none() && r.depth == 1));

        let idx = tracker
            .find_region_containing(Size::new(500.0, 200.0), 411.5, 10.0)
            .unwrap();
        tracker.split_after_placement(
            idx,
            Size::new(500.0, 200.0),
            Orientation::Vertical,
            1.5,
            30.0,
        );
        assert!(tracker.regions.iter().any(|r| r.depth == 2));
    }

    #[test]
    fn test_kerf_charged_once_per_line() {
        let mut tracker = RegionTracker::new(Rect::new(0.0, 0.0, 1000.0, 1000.0), 1.0);
        tracker.split_after_placement(
            0,
            Size::new(400.0, 300.0),
            Orientation::Vertical,
            5.0,
            30.0,
        );
        // A freed rectangle straddling the same x = 400 line.
        tracker.free_region(Rect::new(0.0, 600.0, 1000.0, 400.0));
        let idx = tracker
            .find_region_containing(Size::new(400.0, 100.0), 0.0, 600.0)
            .unwrap();
        assert_eq!(tracker.regions[idx].rect(), Rect::new(0.0, 600.0, 1000.0, 400.0));

        let split = tracker.split_after_placement(
            idx,
            Size::new(400.0, 100.0),
            Orientation::Vertical,
            5.0,
            30.0,
        );
        assert_eq!(split.remainder_at, 400.0);
        assert_eq!(split.children[0].rect(), Rect::new(400.0, 600.0, 600.0, 400.0));

        tracker.reset();
        let split = tracker.split_after_placement(
            0,
            Size::new(400.0, 100.0),
            Orientation::Vertical,
            5.0,
            30.0,
        );
        assert_eq!(split.remainder_at, 405.0);
    }

    #[test]
    fn test_find_prefers_aligned_then_smallest() {
        let mut tracker = RegionTracker::from_regions(
            Rect::new(0.0, 0.0, 1000.0, 1000.0),
            1.0,
            vec![
                Region::from_rect(Rect::new(0.0, 0.0, 1000.0, 1000.0)),
                Region::from_rect(Rect::new(0.0, 500.0, 1000.0, 500.0)),
            ],
        );
        // Inside both, aligned only to the second.
        assert_eq!(
            tracker.find_region_containing(Size::new(100.0, 100.0), 0.0, 500.0),
            Some(1)
        );
        // Inside both, aligned to neither: smallest wins.
        assert_eq!(
            tracker.find_region_containing(Size::new(100.0, 100.0), 50.0, 600.0),
            Some(1)
        );
        tracker.free_region(Rect::new(0.0, 0.0, 300.0, 300.0));
        assert_eq!(
            tracker.find_region_containing(Size::new(100.0, 100.0), 0.0, 0.0),
            Some(2)
        );
        assert_eq!(
            tracker.find_region_containing(Size::new(2000.0, 100.0), 0.0, 0.0),
            None
        );
    }

    #[test]
    fn test_free_region_does_not_merge() {
        let mut tracker = board();
        tracker.split_after_placement(
            0,
            Size::new(400.0, 300.0),
            Orientation::Vertical,
            1.5,
            30.0,
        );
        tracker.free_region(Rect::new(10.0, 10.0, 400.0, 300.0));
        assert_eq!(tracker.regions.len(), 3);
        assert_eq!(
            tracker.regions.last().unwrap().rect(),
            Rect::new(10.0, 10.0, 400.0, 300.0)
        );
    }

    #[test]
    fn test_resolve_orientation_falls_back_when_not_viable() {
        let region = Region::from_rect(Rect::new(0.0, 0.0, 500.0, 1000.0));
        let piece = Size::new(500.0, 300.0);
        assert_eq!(
            resolve_orientation(Some(Orientation::Vertical), &region, piece, Orientation::Vertical, 1.0),
            Orientation::Horizontal
        );

        let locked = Region {
            direction: Some(Orientation::Vertical),
            ..Region::from_rect(Rect::new(0.0, 0.0, 1000.0, 1000.0))
        };
        assert_eq!(
            resolve_orientation(None, &locked, piece, Orientation::Horizontal, 1.0),
            Orientation::Vertical
        );
        assert_eq!(
            resolve_orientation(
                Some(Orientation::Horizontal),
                &locked,
                piece,
                Orientation::Vertical,
                1.0
            ),
            Orientation::Horizontal
        );

        let exact = Region::from_rect(Rect::new(0.0, 0.0, 500.0, 300.0));
        assert_eq!(
            resolve_orientation(None, &exact, piece, Orientation::Vertical, 1.0),
            Orientation::Vertical
        );
        assert!(!is_viable(Orientation::Vertical, &exact, piece, 1.0));
        assert!(!is_viable(Orientation::Horizontal, &exact, piece, 1.0));
    }
}
