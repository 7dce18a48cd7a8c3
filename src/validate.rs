//! Accept/reject decision for a piece at a candidate position.

use crate::config::LayoutConfig;
use crate::error::PlacementError;
use crate::geometry::{is_corner_aligned, rect_contains_rect, rects_overlap};
use crate::guillotine::RegionTracker;
use crate::types::{PieceId, Rect, Region, Size};

/// Size limits that hold regardless of position.
pub fn check_size(size: Size, config: &LayoutConfig) -> Result<(), PlacementError> {
    if size.w < config.min_piece_size || size.h < config.min_piece_size {
        return Err(PlacementError::TooSmall);
    }
    let usable = config.usable_area();
    if size.w > usable.w + config.tolerance || size.h > usable.h + config.tolerance {
        return Err(PlacementError::ExceedsBoard);
    }
    Ok(())
}

/// Rejects drop points that are not finite numbers.
pub fn check_position(x: f64, y: f64) -> Result<(), PlacementError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(PlacementError::ExceedsBoard)
    }
}

/// Checks a piece of `size` with its top-left corner at (x, y) against the
/// other placed pieces and the free set, returning the region it would be
/// cut from.
pub fn validate(
    size: Size,
    x: f64,
    y: f64,
    others: &[(PieceId, Rect)],
    tracker: &RegionTracker,
    config: &LayoutConfig,
) -> Result<Region, PlacementError> {
    check_size(size, config)?;
    check_position(x, y)?;

    let target = Rect::at(x, y, size);
    if !rect_contains_rect(&config.usable_area(), &target, config.tolerance) {
        return Err(PlacementError::ExceedsBoard);
    }

    if let Some((id, _)) = others.iter().find(|(_, rect)| rects_overlap(&target, rect)) {
        return Err(PlacementError::Collision(*id));
    }

    let idx = tracker
        .find_region_containing(size, x, y)
        .ok_or(PlacementError::NoFreeRegion)?;
    let region = tracker.regions[idx];
    if !is_corner_aligned(&target, &region.rect(), config.tolerance) {
        return Err(PlacementError::NotCornerAligned);
    }
    Ok(region)
}
