//! Full recomputation of free regions and cuts from the placed pieces.
//!
//! Every editor operation ends here. The pass is deterministic: pieces are
//! processed top row first, left to right inside a row, because each split
//! depends on the ones before it. A piece that does not fit the guillotine
//! bookkeeping (no region, not at its region's corner, cut blocked) is
//! reported and skipped; the pass itself never fails.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::cuts::{CutRecorder, first_obstruction};
use crate::geometry::is_corner_aligned;
use crate::guillotine::{RegionTracker, is_viable, resolve_orientation};
use crate::types::{Cut, Orientation, Piece, PieceId, Rect, Region};

/// Number of colour slots regions cycle through.
pub const REGION_PALETTE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceStatus {
    /// Region split and a cut recorded.
    Cut,
    /// Piece fills its region exactly; nothing left to cut off.
    Filled,
    NoRegion,
    Misaligned,
    Obstructed { by: PieceId },
}

impl PieceStatus {
    pub fn is_consistent(&self) -> bool {
        matches!(self, PieceStatus::Cut | PieceStatus::Filled)
    }
}

/// What the rebuild did with one placed piece.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacementRecord {
    pub piece_id: PieceId,
    pub status: PieceStatus,
    /// Region the piece was found in, as it was before the split.
    pub region: Option<Region>,
    pub orientation: Option<Orientation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    pub regions: Vec<Region>,
    pub cuts: Vec<Cut>,
    /// One entry per placed piece, in processing order.
    pub records: Vec<PlacementRecord>,
}

impl Layout {
    pub fn record(&self, id: PieceId) -> Option<&PlacementRecord> {
        self.records.iter().find(|r| r.piece_id == id)
    }

    pub fn is_consistent(&self, id: PieceId) -> bool {
        self.record(id).is_some_and(|r| r.status.is_consistent())
    }

    /// Placed pieces that produced no cut and own no region this pass.
    pub fn excluded(&self) -> impl Iterator<Item = &PlacementRecord> {
        self.records.iter().filter(|r| !r.status.is_consistent())
    }
}

/// Recomputes regions and cuts from scratch for every placed piece.
pub fn rebuild(pieces: &[Piece], config: &LayoutConfig) -> Layout {
    let placed: Vec<(PieceId, Rect, Option<Orientation>)> = pieces
        .iter()
        .filter_map(|p| {
            let placement = p.placement?;
            Some((p.id, p.rect()?, placement.orientation))
        })
        .collect();
    let footprints: Vec<(PieceId, Rect)> = placed.iter().map(|&(id, rect, _)| (id, rect)).collect();

    let mut pass = RebuildPass::new(config);
    for idx in processing_order(&footprints, config.tolerance) {
        let (id, rect, preferred) = placed[idx];
        let record = pass.place(id, rect, preferred, &footprints);
        pass.records.push(record);
    }
    pass.finish()
}

/// Indices into `footprints`, top row first and left to right inside a row.
/// Pieces whose top edges lie within `row_tolerance` of the row's first
/// piece share a row.
fn processing_order(footprints: &[(PieceId, Rect)], row_tolerance: f64) -> Vec<usize> {
    let mut by_y: Vec<usize> = (0..footprints.len()).collect();
    by_y.sort_by(|&a, &b| {
        let (id_a, ra) = footprints[a];
        let (id_b, rb) = footprints[b];
        ra.y.total_cmp(&rb.y)
            .then(ra.x.total_cmp(&rb.x))
            .then(id_a.cmp(&id_b))
    });

    let by_x = |a: &usize, b: &usize| {
        let (id_a, ra) = footprints[*a];
        let (id_b, rb) = footprints[*b];
        ra.x.total_cmp(&rb.x).then(id_a.cmp(&id_b))
    };

    let mut order = Vec::with_capacity(footprints.len());
    let mut row: Vec<usize> = Vec::new();
    let mut row_y = 0.0;
    for idx in by_y {
        let y = footprints[idx].1.y;
        if !row.is_empty() && y - row_y > row_tolerance {
            row.sort_by(by_x);
            order.append(&mut row);
        }
        if row.is_empty() {
            row_y = y;
        }
        row.push(idx);
    }
    row.sort_by(by_x);
    order.append(&mut row);
    order
}

struct RebuildPass<'a> {
    config: &'a LayoutConfig,
    tracker: RegionTracker,
    cuts: CutRecorder,
    records: Vec<PlacementRecord>,
}

impl<'a> RebuildPass<'a> {
    fn new(config: &'a LayoutConfig) -> Self {
        let usable = config.usable_area();
        let mut tracker = RegionTracker::new(usable, config.tolerance);
        if !config.default_orientation.inherits_direction() {
            tracker = tracker.without_inheritance();
        }
        Self {
            config,
            tracker,
            cuts: CutRecorder::new(usable, config.tolerance),
            records: Vec::new(),
        }
    }

    fn place(
        &mut self,
        id: PieceId,
        rect: Rect,
        preferred: Option<Orientation>,
        footprints: &[(PieceId, Rect)],
    ) -> PlacementRecord {
        let eps = self.config.tolerance;
        let size = rect.size();

        let Some(idx) = self.tracker.find_region_containing(size, rect.x, rect.y) else {
            warn!(piece = id, x = rect.x, y = rect.y, "no free region holds piece, skipping");
            return PlacementRecord {
                piece_id: id,
                status: PieceStatus::NoRegion,
                region: None,
                orientation: None,
            };
        };
        let region = self.tracker.regions[idx];
        if !is_corner_aligned(&rect, &region.rect(), eps) {
            warn!(
                piece = id,
                x = rect.x,
                y = rect.y,
                region_x = region.x,
                region_y = region.y,
                "piece is not at its region's corner, skipping"
            );
            return PlacementRecord {
                piece_id: id,
                status: PieceStatus::Misaligned,
                region: Some(region),
                orientation: None,
            };
        }

        let default = self.config.default_orientation.for_depth(region.depth);
        let orientation = resolve_orientation(preferred, &region, size, default, eps);
        if !is_viable(orientation, &region, size, eps) {
            self.tracker.consume(idx);
            debug!(piece = id, "piece fills its region exactly");
            return PlacementRecord {
                piece_id: id,
                status: PieceStatus::Filled,
                region: Some(region),
                orientation: None,
            };
        }

        // The cut runs across the whole region along the piece's far edge.
        let (line, start, end) = match orientation {
            Orientation::Vertical => (region.x + size.w, region.y, region.bottom()),
            Orientation::Horizontal => (region.y + size.h, region.x, region.right()),
        };
        if let Some(by) = first_obstruction(orientation, line, start, end, footprints, eps) {
            warn!(piece = id, blocked_by = by, %orientation, line, "cut is obstructed, skipping");
            return PlacementRecord {
                piece_id: id,
                status: PieceStatus::Obstructed { by },
                region: Some(region),
                orientation: Some(orientation),
            };
        }

        self.tracker.lock_direction(idx, orientation);
        let region = self.tracker.regions[idx];
        let split = self.tracker.split_after_placement(
            idx,
            size,
            orientation,
            self.config.kerf,
            self.config.min_region_size,
        );
        self.cuts
            .record(id, orientation, split.remainder_at, start, end);
        debug!(
            piece = id,
            %orientation,
            cut_at = split.remainder_at,
            children = split.children.len(),
            "split region"
        );

        PlacementRecord {
            piece_id: id,
            status: PieceStatus::Cut,
            region: Some(region),
            orientation: Some(orientation),
        }
    }

    fn finish(self) -> Layout {
        let mut regions = self.tracker.into_regions();
        for (i, region) in regions.iter_mut().enumerate() {
            region.color = i % REGION_PALETTE;
        }
        let cuts = self.cuts.finish();
        debug!(
            pieces = self.records.len(),
            regions = regions.len(),
            cuts = cuts.len(),
            "layout rebuilt"
        );
        Layout {
            regions,
            cuts,
            records: self.records,
        }
    }
}
