//! Editing session over one board: the piece pool, the placed pieces and
//! the layout derived from them.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::LayoutConfig;
use crate::error::{ConfigError, PlacementError};
use crate::geometry::rects_overlap;
use crate::guillotine::{RegionTracker, resolve_orientation};
use crate::layout::{Layout, PieceStatus, rebuild};
use crate::snap::snap;
use crate::types::{Orientation, Piece, PieceId, Placement, Rect, Region, Size};
use crate::validate::{check_position, check_size, validate};

/// Where an accepted piece ended up after snapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placed {
    pub x: f64,
    pub y: f64,
    pub region: Region,
    pub orientation: Orientation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Moved {
    Placed(Placed),
    /// Dragged completely off the usable area.
    ReturnedToPool,
}

pub struct Editor {
    config: LayoutConfig,
    pieces: Vec<Piece>,
    layout: Layout,
    next_id: PieceId,
}

impl Editor {
    pub fn new(config: LayoutConfig) -> Result<Self, ConfigError> {
        Self::with_pieces(config, Vec::new())
    }

    /// Starts a session from an existing piece list, e.g. a loaded pattern.
    /// Placed pieces are taken as they are and reported by the first
    /// rebuild if they do not fit the guillotine bookkeeping.
    pub fn with_pieces(config: LayoutConfig, pieces: Vec<Piece>) -> Result<Self, ConfigError> {
        config.validate()?;
        let next_id = pieces.iter().map(|p| p.id + 1).max().unwrap_or(1);
        let layout = rebuild(&pieces, &config);
        Ok(Self {
            config,
            pieces,
            layout,
            next_id,
        })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    pub fn placed(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(|p| p.is_placed())
    }

    pub fn pool(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(|p| !p.is_placed())
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Adds a piece to the pool.
    pub fn add_piece(&mut self, name: impl Into<String>, size: Size) -> PieceId {
        let id = self.next_id;
        self.next_id += 1;
        self.pieces.push(Piece::new(id, name, size));
        id
    }

    /// Drops a piece from the pool onto the board at (x, y).
    pub fn place(&mut self, id: PieceId, x: f64, y: f64) -> Result<Placed, PlacementError> {
        let idx = self.index_of(id)?;
        let piece = &self.pieces[idx];
        if piece.is_placed() {
            return Err(PlacementError::AlreadyPlaced(id));
        }
        let size = piece.size;
        check_size(size, &self.config)?;
        check_position(x, y)?;

        let tracker = RegionTracker::from_regions(
            self.config.usable_area(),
            self.config.tolerance,
            self.layout.regions.clone(),
        );
        let placed = self.settle(id, size, x, y, &tracker, None)?;
        self.commit(idx, |piece| piece.placement = Some(placed.placement()))?;

        info!(
            piece = id,
            x = placed.x,
            y = placed.y,
            orientation = %placed.orientation,
            "placed piece"
        );
        Ok(placed)
    }

    /// Moves a placed piece. A target entirely off the usable area sends
    /// the piece back to the pool.
    pub fn move_piece(&mut self, id: PieceId, x: f64, y: f64) -> Result<Moved, PlacementError> {
        let idx = self.index_of(id)?;
        let piece = &self.pieces[idx];
        let Some(placement) = piece.placement else {
            return Err(PlacementError::NotPlaced(id));
        };
        let size = piece.size;
        check_position(x, y)?;

        if !rects_overlap(&Rect::at(x, y, size), &self.config.usable_area()) {
            self.pieces[idx].placement = None;
            self.refresh();
            info!(piece = id, "piece dragged off the board, back in the pool");
            return Ok(Moved::ReturnedToPool);
        }

        let tracker = self.tracker_without(id);
        let placed = self.settle(id, size, x, y, &tracker, placement.orientation)?;
        self.commit(idx, |piece| piece.placement = Some(placed.placement()))?;

        info!(piece = id, x = placed.x, y = placed.y, "moved piece");
        Ok(Moved::Placed(placed))
    }

    /// Takes a piece off the board. Remaining pieces stay where they are.
    pub fn remove(&mut self, id: PieceId) -> Result<(), PlacementError> {
        let idx = self.index_of(id)?;
        if self.pieces[idx].placement.take().is_none() {
            return Err(PlacementError::NotPlaced(id));
        }
        self.refresh();
        info!(piece = id, "removed piece");
        Ok(())
    }

    /// Swaps a piece's sides. On the board the swapped footprint has to be
    /// acceptable at the same origin; in the pool it always is.
    pub fn rotate(&mut self, id: PieceId) -> Result<Size, PlacementError> {
        let idx = self.index_of(id)?;
        let piece = &self.pieces[idx];
        match piece.rect() {
            Some(current) => {
                let rotated = piece.size.rotated();
                let tracker = self.tracker_without(id);
                let others = self.footprints(id);
                validate(rotated, current.x, current.y, &others, &tracker, &self.config)?;
                self.commit(idx, Piece::rotate)?;
            }
            None => self.pieces[idx].rotate(),
        }

        let size = self.pieces[idx].size;
        info!(piece = id, size = %size, "rotated piece");
        Ok(size)
    }

    /// Recomputes regions and cuts from the placed pieces.
    pub fn rebuild_all(&mut self) -> &Layout {
        self.refresh();
        &self.layout
    }

    fn refresh(&mut self) {
        self.layout = rebuild(&self.pieces, &self.config);
    }

    /// Applies `change` to the piece at `idx` and rebuilds. The edit stands
    /// only if the rebuild cuts the piece out and every other piece that
    /// had a cut keeps one; otherwise the piece and layout are restored.
    fn commit(
        &mut self,
        idx: usize,
        change: impl FnOnce(&mut Piece),
    ) -> Result<(), PlacementError> {
        let previous = self.pieces[idx].clone();
        let id = previous.id;
        let had_cut: Vec<PieceId> = self
            .placed()
            .map(|p| p.id)
            .filter(|&other| other != id && self.layout.is_consistent(other))
            .collect();

        change(&mut self.pieces[idx]);
        self.refresh();

        let outcome = match self.layout.record(id).map(|r| r.status) {
            Some(status) if status.is_consistent() => {
                match had_cut.into_iter().find(|&other| !self.layout.is_consistent(other)) {
                    Some(other) => Err(PlacementError::StrandsPiece(other)),
                    None => Ok(()),
                }
            }
            Some(PieceStatus::Obstructed { by }) => Err(PlacementError::CutBlocked(by)),
            Some(PieceStatus::NoRegion) => Err(PlacementError::NoFreeRegion),
            _ => Err(PlacementError::NotCornerAligned),
        };

        if let Err(e) = outcome {
            warn!(piece = id, code = e.code(), "rebuild refused the edit, restoring piece");
            self.pieces[idx] = previous;
            self.refresh();
        }
        outcome
    }

    fn index_of(&self, id: PieceId) -> Result<usize, PlacementError> {
        self.pieces
            .iter()
            .position(|p| p.id == id)
            .ok_or(PlacementError::UnknownPiece(id))
    }

    fn footprints(&self, except: PieceId) -> Vec<(PieceId, Rect)> {
        self.pieces
            .iter()
            .filter(|p| p.id != except)
            .filter_map(|p| p.rect().map(|r| (p.id, r)))
            .collect()
    }

    /// Free set the rebuild produces with piece `id` off the board.
    fn tracker_without(&self, id: PieceId) -> RegionTracker {
        let rest: Vec<Piece> = self.pieces.iter().filter(|p| p.id != id).cloned().collect();
        RegionTracker::from_regions(
            self.config.usable_area(),
            self.config.tolerance,
            rebuild(&rest, &self.config).regions,
        )
    }

    /// Snaps and validates a candidate position for piece `id`.
    fn settle(
        &self,
        id: PieceId,
        size: Size,
        x: f64,
        y: f64,
        tracker: &RegionTracker,
        preferred: Option<Orientation>,
    ) -> Result<Placed, PlacementError> {
        let others = self.footprints(id);
        let rects: Vec<Rect> = others.iter().map(|&(_, r)| r).collect();
        let (sx, sy) = snap(size, x, y, &rects, &tracker.regions, &self.config);
        let region = validate(size, sx, sy, &others, tracker, &self.config)?;
        let orientation = resolve_orientation(
            preferred,
            &region,
            size,
            self.config.default_orientation.for_depth(region.depth),
            self.config.tolerance,
        );
        Ok(Placed {
            x: region.x,
            y: region.y,
            region,
            orientation,
        })
    }
}

impl Placed {
    fn placement(&self) -> Placement {
        Placement {
            x: self.x,
            y: self.y,
            orientation: Some(self.orientation),
        }
    }
}
