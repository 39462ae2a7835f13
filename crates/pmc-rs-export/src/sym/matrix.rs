// crates/pmc-rs-export/src/sym/matrix.rs
//! In-memory CAN matrix handed to the symbol writer.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

pub const GEN_MSG_CYCLE_TIME: &str = "GenMsgCycleTime";
pub const LONG_NAME: &str = "LongName";
pub const DISPLAY_DECIMAL_PLACES: &str = "DisplayDecimalPlaces";
pub const HEXADECIMAL_OUTPUT: &str = "HexadecimalOutput";
pub const GEN_SIG_START_VALUE: &str = "GenSigStartValue";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix {
    pub title: String,
    pub frames: Vec<Frame>,
    /// Enumeration name to `(value, name)` pairs.
    pub enums: BTreeMap<String, Vec<(i64, String)>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    Send,
    Receive,
    #[default]
    SendReceive,
}

impl Direction {
    pub fn from_flags(sendable: bool, receivable: bool) -> Self {
        match (sendable, receivable) {
            (true, false) => Direction::Send,
            (false, true) => Direction::Receive,
            _ => Direction::SendReceive,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub name: String,
    pub id: i64,
    pub extended: bool,
    /// Bytes.
    pub length: i64,
    pub comment: Option<String>,
    pub direction: Direction,
    pub attributes: BTreeMap<&'static str, String>,
    /// Signals present in every multiplexer section.
    pub signals: Vec<Signal>,
    pub selector: Option<Selector>,
    pub muxes: Vec<Mux>,
}

impl Frame {
    pub fn cycle_time(&self) -> Option<&str> {
        self.attributes.get(GEN_MSG_CYCLE_TIME).map(String::as_str)
    }
}

/// The signal whose value selects a multiplexer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub name: String,
    pub start_bit: i64,
    pub bits: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mux {
    pub name: String,
    pub value: i64,
    pub length: i64,
    pub comment: Option<String>,
    pub signals: Vec<Signal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub name: String,
    pub start_bit: i64,
    pub bits: i64,
    pub signed: bool,
    pub factor: Decimal,
    pub unit: Option<String>,
    pub minimum: Option<Decimal>,
    pub maximum: Option<Decimal>,
    pub enumeration: Option<String>,
    pub comment: Option<String>,
    pub attributes: BTreeMap<&'static str, String>,
}

impl Default for Signal {
    fn default() -> Self {
        Self {
            name: String::new(),
            start_bit: 0,
            bits: 0,
            signed: false,
            factor: Decimal::ONE,
            unit: None,
            minimum: None,
            maximum: None,
            enumeration: None,
            comment: None,
            attributes: BTreeMap::new(),
        }
    }
}
