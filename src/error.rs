//! Error types for the layout editor.

use std::io;
use thiserror::Error;

use crate::types::PieceId;

/// Why a placement, move or rotation was refused. Nothing is mutated when
/// one of these is returned; the caller restores the piece's previous
/// position, or leaves it in the pool if it was new.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PlacementError {
    #[error("piece {0} does not exist")]
    UnknownPiece(PieceId),

    #[error("piece {0} is already on the board")]
    AlreadyPlaced(PieceId),

    #[error("piece {0} is not on the board")]
    NotPlaced(PieceId),

    /// A side is below the minimum size worth cutting.
    #[error("piece is below the minimum cuttable size")]
    TooSmall,

    #[error("piece exceeds the usable board area")]
    ExceedsBoard,

    #[error("piece collides with piece {0}")]
    Collision(PieceId),

    #[error("piece is not aligned to the top-left corner of its region")]
    NotCornerAligned,

    #[error("no free region can hold the piece")]
    NoFreeRegion,

    /// The piece's cut would run through another piece.
    #[error("the cut for this piece would run through piece {0}")]
    CutBlocked(PieceId),

    /// Accepting the edit would leave another piece without its cut.
    #[error("piece {0} would lose its cut")]
    StrandsPiece(PieceId),
}

impl PlacementError {
    /// Stable identifier for wire responses.
    pub fn code(&self) -> &'static str {
        match self {
            PlacementError::UnknownPiece(_) => "unknown_piece",
            PlacementError::AlreadyPlaced(_) => "already_placed",
            PlacementError::NotPlaced(_) => "not_placed",
            PlacementError::TooSmall => "too_small",
            PlacementError::ExceedsBoard => "exceeds_board",
            PlacementError::Collision(_) => "collision",
            PlacementError::NotCornerAligned => "not_corner_aligned",
            PlacementError::NoFreeRegion => "no_free_region",
            PlacementError::CutBlocked(_) => "cut_blocked",
            PlacementError::StrandsPiece(_) => "strands_piece",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("'{field}' must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("'{field}' must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
}

/// Errors raised while reading a pattern file.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid pattern JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("pattern contains no layouts")]
    NoLayout,

    #[error("layout {index} out of range, pattern has {count}")]
    LayoutOutOfRange { index: usize, count: usize },

    #[error("part {0} appears more than once")]
    DuplicatePart(PieceId),

    #[error("invalid number for '{field}': {value}")]
    InvalidNumber { field: &'static str, value: String },
}
