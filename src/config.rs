//! Board and editing parameters, fixed for the lifetime of an editor.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{Orientation, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Board width in mm.
    pub width: f64,
    /// Board height in mm.
    pub height: f64,
    /// Saw blade thickness, consumed once per cut line.
    pub kerf: f64,
    /// Offset of the usable area from the board frame origin.
    pub margin: f64,
    /// Radius within which a dropped piece snaps to edges, pieces and region corners.
    pub snap_tolerance: f64,
    /// Regions narrower or shorter than this are dropped as scrap.
    pub min_region_size: f64,
    /// Pieces with a side below this are not worth cutting.
    pub min_piece_size: f64,
    /// Slack for containment, corner alignment and cut deduplication.
    pub tolerance: f64,
    pub default_orientation: DefaultOrientation,
}

/// Cut orientation for a piece whose region has no locked direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultOrientation {
    #[default]
    Horizontal,
    Vertical,
    /// Horizontal at even region depths, vertical at odd ones. Regions
    /// split off in this mode do not inherit their parent's direction.
    Alternate,
}

impl DefaultOrientation {
    pub fn for_depth(self, depth: usize) -> Orientation {
        match self {
            DefaultOrientation::Horizontal => Orientation::Horizontal,
            DefaultOrientation::Vertical => Orientation::Vertical,
            DefaultOrientation::Alternate if depth % 2 == 0 => Orientation::Horizontal,
            DefaultOrientation::Alternate => Orientation::Vertical,
        }
    }

    pub fn inherits_direction(self) -> bool {
        self != DefaultOrientation::Alternate
    }
}

impl From<Orientation> for DefaultOrientation {
    fn from(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Horizontal => DefaultOrientation::Horizontal,
            Orientation::Vertical => DefaultOrientation::Vertical,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 2750.0,
            height: 1830.0,
            kerf: 1.5,
            margin: 10.0,
            snap_tolerance: 30.0,
            min_region_size: 30.0,
            min_piece_size: 50.0,
            tolerance: 1.0,
            default_orientation: DefaultOrientation::Horizontal,
        }
    }
}

impl LayoutConfig {
    /// The rectangle pieces may occupy, in board coordinates.
    pub fn usable_area(&self) -> Rect {
        Rect::new(self.margin, self.margin, self.width, self.height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("width", self.width), ("height", self.height)] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        for (field, value) in [
            ("kerf", self.kerf),
            ("margin", self.margin),
            ("snap_tolerance", self.snap_tolerance),
            ("min_region_size", self.min_region_size),
            ("min_piece_size", self.min_piece_size),
            ("tolerance", self.tolerance),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }
}
