//! Loading of cutting patterns produced by an external optimizer.
//!
//! A pattern file is either a list of plans or an object holding them under
//! `sPlanos`. Each plan has a `layout` list; each layout describes one sheet
//! with its parts already positioned. Numbers come as JSON numbers or as
//! strings, and `rotated` as a bool or a `"True"`/`"False"` string.
//! Part coordinates are relative to the sheet's usable corner.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::config::LayoutConfig;
use crate::error::PatternError;
use crate::types::{Piece, PieceId, Size};

/// A scalar as it appears in pattern files.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl RawValue {
    fn number(&self, field: &'static str) -> Result<f64, PatternError> {
        let invalid = || PatternError::InvalidNumber {
            field,
            value: self.to_string(),
        };
        let n = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().map_err(|_| invalid())?,
            RawValue::Flag(_) => return Err(invalid()),
        };
        if n.is_finite() { Ok(n) } else { Err(invalid()) }
    }

    fn flag(&self) -> bool {
        match self {
            RawValue::Flag(b) => *b,
            RawValue::Number(n) => *n != 0.0,
            RawValue::Text(s) => {
                let s = s.trim();
                s.eq_ignore_ascii_case("true") || s == "1"
            }
        }
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Flag(b) => write!(f, "{b}"),
            RawValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternPart {
    pub part: RawValue,
    #[serde(default)]
    pub n_item: Option<RawValue>,
    pub width: RawValue,
    pub length: RawValue,
    #[serde(default)]
    pub rotated: Option<RawValue>,
    pub x: RawValue,
    pub y: RawValue,
}

impl PatternPart {
    fn id(&self) -> Result<PieceId, PatternError> {
        let n = self.part.number("part")?;
        if n < 0.0 || n.fract() != 0.0 || n > PieceId::MAX as f64 {
            return Err(PatternError::InvalidNumber {
                field: "part",
                value: self.part.to_string(),
            });
        }
        Ok(n as PieceId)
    }

    fn is_rotated(&self) -> bool {
        self.rotated.as_ref().is_some_and(RawValue::flag)
    }

    /// Footprint on the sheet. A rotated part lies with its length across.
    fn size(&self) -> Result<Size, PatternError> {
        let width = self.width.number("width")?;
        let length = self.length.number("length")?;
        Ok(if self.is_rotated() {
            Size::new(length, width)
        } else {
            Size::new(width, length)
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternLayout {
    #[serde(default)]
    pub sheet_w: Option<RawValue>,
    #[serde(default)]
    pub sheet_h: Option<RawValue>,
    #[serde(default)]
    pub part: Vec<PatternPart>,
}

impl PatternLayout {
    /// `base` with the board size replaced by the sheet size, if given.
    pub fn config(&self, base: &LayoutConfig) -> Result<LayoutConfig, PatternError> {
        let mut config = *base;
        if let Some(w) = &self.sheet_w {
            config.width = w.number("sheetW")?;
        }
        if let Some(h) = &self.sheet_h {
            config.height = h.number("sheetH")?;
        }
        Ok(config)
    }

    /// Parts as placed pieces in board coordinates. They carry no cut
    /// orientation; the rebuild picks one.
    pub fn pieces(&self, config: &LayoutConfig) -> Result<Vec<Piece>, PatternError> {
        let origin = config.usable_area();
        let mut seen = HashSet::new();
        let mut pieces = Vec::with_capacity(self.part.len());

        for part in &self.part {
            let id = part.id()?;
            if !seen.insert(id) {
                return Err(PatternError::DuplicatePart(id));
            }
            let name = match &part.n_item {
                Some(item) => item.to_string(),
                None => id.to_string(),
            };
            let x = part.x.number("x")?;
            let y = part.y.number("y")?;

            let mut piece = Piece::new(id, name, part.size()?)
                .placed_at(origin.x + x, origin.y + y, None);
            piece.rotated = part.is_rotated();
            pieces.push(piece);
        }
        Ok(pieces)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Plan {
    #[serde(default)]
    layout: Vec<PatternLayout>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PatternFile {
    Wrapped {
        #[serde(rename = "sPlanos")]
        plans: Vec<Plan>,
    },
    List(Vec<Plan>),
}

/// All sheet layouts of a pattern file, in file order.
#[derive(Debug, Clone)]
pub struct Pattern {
    layouts: Vec<PatternLayout>,
}

impl Pattern {
    pub fn from_json(json: &str) -> Result<Self, PatternError> {
        let plans = match serde_json::from_str::<PatternFile>(json)? {
            PatternFile::Wrapped { plans } | PatternFile::List(plans) => plans,
        };
        let layouts: Vec<PatternLayout> = plans.into_iter().flat_map(|p| p.layout).collect();
        if layouts.is_empty() {
            return Err(PatternError::NoLayout);
        }
        Ok(Self { layouts })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PatternError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn layouts(&self) -> &[PatternLayout] {
        &self.layouts
    }

    pub fn layout(&self, index: usize) -> Result<&PatternLayout, PatternError> {
        self.layouts
            .get(index)
            .ok_or(PatternError::LayoutOutOfRange {
                index,
                count: self.layouts.len(),
            })
    }
}
