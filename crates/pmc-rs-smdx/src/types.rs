// crates/pmc-rs-smdx/src/types.rs

//! Public data structures for a parsed SMDX model.

use pmc_rs::PointType;

/// A SunSpec model with its blocks and English strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SmdxModel {
    pub id: i64,
    pub name: String,
    /// Registers after the `ID`/`L` header.
    pub length: i64,
    pub label: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub blocks: Vec<SmdxBlock>,
}

impl SmdxModel {
    /// All points in register order.
    pub fn points(&self) -> impl Iterator<Item = &SmdxPoint> {
        self.blocks.iter().flat_map(|b| b.points.iter())
    }

    pub fn point(&self, id: &str) -> Option<&SmdxPoint> {
        self.points().find(|p| p.id == id)
    }

    pub fn fixed_block(&self) -> Option<&SmdxBlock> {
        self.blocks.iter().find(|b| b.kind == BlockKind::Fixed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockKind {
    #[default]
    Fixed,
    Repeating,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SmdxBlock {
    pub kind: BlockKind,
    pub name: Option<String>,
    pub length: i64,
    pub points: Vec<SmdxPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    ReadOnly,
    ReadWrite,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Access::ReadOnly => "r",
            Access::ReadWrite => "rw",
        }
    }
}

/// One register (or register run) of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmdxPoint {
    pub id: String,
    /// Offset from the start of the model body, in registers.
    pub offset: i64,
    pub point_type: PointType,
    pub size: i64,
    /// Id of the scale-factor point, or a constant exponent.
    pub scale_factor: Option<String>,
    pub units: Option<String>,
    pub access: Access,
    pub mandatory: bool,
    pub label: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub symbols: Vec<SmdxSymbol>,
}

impl SmdxPoint {
    pub fn new(id: impl Into<String>, point_type: PointType) -> Self {
        Self {
            id: id.into(),
            offset: 0,
            point_type,
            size: point_type.size().unwrap_or(1),
            scale_factor: None,
            units: None,
            access: Access::ReadOnly,
            mandatory: false,
            label: None,
            description: None,
            notes: None,
            symbols: Vec::new(),
        }
    }

    /// The scale-factor point id, when `scale_factor` isn't a constant.
    pub fn scale_factor_point(&self) -> Option<&str> {
        self.scale_factor
            .as_deref()
            .filter(|sf| sf.parse::<i64>().is_err())
    }
}

/// A named value of an enumerated or bitfield point.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SmdxSymbol {
    pub id: String,
    pub value: i64,
    pub label: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
}
