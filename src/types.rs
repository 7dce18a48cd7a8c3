use serde::{Deserialize, Serialize};

pub type PieceId = u32;

/// Width and height of a piece or region, in board units (mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Axis-aligned rectangle with its top-left corner at (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn at(x: f64, y: f64, size: Size) -> Self {
        Self::new(x, y, size.w, size.h)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }
}

/// Axis of the guillotine cut that separates a piece from the rest of its
/// region. A horizontal cut runs along x at a fixed y.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn other(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Horizontal => write!(f, "horizontal"),
            Orientation::Vertical => write!(f, "vertical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    /// Cut orientation chosen when the piece was placed. Pieces loaded from
    /// a pattern have none and take the region's or the board default.
    pub orientation: Option<Orientation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    pub name: String,
    pub size: Size,
    #[serde(default)]
    pub rotated: bool,
    /// `None` while the piece sits in the pool.
    #[serde(default)]
    pub placement: Option<Placement>,
}

impl Piece {
    pub fn new(id: PieceId, name: impl Into<String>, size: Size) -> Self {
        Self {
            id,
            name: name.into(),
            size,
            rotated: false,
            placement: None,
        }
    }

    pub fn placed_at(mut self, x: f64, y: f64, orientation: Option<Orientation>) -> Self {
        self.placement = Some(Placement { x, y, orientation });
        self
    }

    pub fn is_placed(&self) -> bool {
        self.placement.is_some()
    }

    /// Footprint on the board, if placed.
    pub fn rect(&self) -> Option<Rect> {
        self.placement.map(|p| Rect::at(p.x, p.y, self.size))
    }

    pub fn rotate(&mut self) {
        self.size = self.size.rotated();
        self.rotated = !self.rotated;
    }
}

/// A free rectangle of stock that pieces can still be placed into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub size: Size,
    /// Locked by the first piece placed in the region and inherited by the
    /// regions split off from it.
    pub direction: Option<Orientation>,
    /// Number of splits between the usable area and this region.
    #[serde(default)]
    pub depth: usize,
    /// Cosmetic colour slot, reassigned on every rebuild.
    pub color: usize,
}

impl Region {
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            size: rect.size(),
            direction: None,
            depth: 0,
            color: 0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::at(self.x, self.y, self.size)
    }

    pub fn area(&self) -> f64 {
        self.size.area()
    }

    pub fn right(&self) -> f64 {
        self.x + self.size.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.size.h
    }
}

/// One straight edge-to-edge saw pass. Horizontal cuts sit at y = `position`
/// and run from x = `start` to x = `end`; vertical cuts the other way round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cut {
    pub orientation: Orientation,
    pub position: f64,
    pub start: f64,
    pub end: f64,
    /// 1-based execution order, assigned once all pieces are processed.
    pub order: usize,
    /// Piece whose placement produced this cut.
    pub piece_id: PieceId,
}

impl Cut {
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Start and end points as (x, y) pairs.
    pub fn endpoints(&self) -> ((f64, f64), (f64, f64)) {
        match self.orientation {
            Orientation::Horizontal => ((self.start, self.position), (self.end, self.position)),
            Orientation::Vertical => ((self.position, self.start), (self.position, self.end)),
        }
    }
}

impl std::fmt::Display for Cut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.orientation {
            Orientation::Horizontal => write!(
                f,
                "#{} horizontal y={} x={}..{}",
                self.order, self.position, self.start, self.end
            ),
            Orientation::Vertical => write!(
                f,
                "#{} vertical x={} y={}..{}",
                self.order, self.position, self.start, self.end
            ),
        }
    }
}
