// crates/pmc-rs-smdx/src/model.rs

//! Internal `serde` data structures that map directly to the SMDX XML schema.
//!
//! These structs are annotated for `quick-xml` and are not intended for direct
//! public use; see `types` for the public shape.

use serde::{Deserialize, Serialize};

/// The root element of an SMDX file.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename = "sunSpecModels")]
pub struct SunSpecModels {
    #[serde(rename = "@v", default)]
    pub v: String,

    #[serde(rename = "model")]
    pub model: Model,

    /// One entry per locale; only `en` is read.
    #[serde(rename = "strings", default, skip_serializing_if = "Vec::is_empty")]
    pub strings: Vec<Strings>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Model {
    #[serde(rename = "@id")]
    pub id: i64,

    #[serde(rename = "@len", default, skip_serializing_if = "Option::is_none")]
    pub len: Option<i64>,

    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "block", default)]
    pub block: Vec<Block>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Block {
    /// `repeating` for the repeating block; absent for the fixed one.
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,

    #[serde(rename = "@len", default, skip_serializing_if = "Option::is_none")]
    pub len: Option<i64>,

    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "point", default)]
    pub point: Vec<Point>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Point {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@offset", default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,

    #[serde(rename = "@type")]
    pub point_type: String,

    /// Register count; only required for `string` points.
    #[serde(rename = "@len", default, skip_serializing_if = "Option::is_none")]
    pub len: Option<i64>,

    /// Scale factor: the id of another point, or a constant exponent.
    #[serde(rename = "@sf", default, skip_serializing_if = "Option::is_none")]
    pub sf: Option<String>,

    #[serde(rename = "@units", default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,

    /// `r` or `rw`; read-only when absent.
    #[serde(rename = "@access", default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,

    #[serde(rename = "@mandatory", default, skip_serializing_if = "Option::is_none")]
    pub mandatory: Option<String>,

    #[serde(rename = "symbol", default, skip_serializing_if = "Vec::is_empty")]
    pub symbol: Vec<Symbol>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Symbol {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "$text", default)]
    pub value: String,
}

/// Human-readable strings of one locale.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Strings {
    #[serde(rename = "@id")]
    pub id: i64,

    #[serde(rename = "@locale", default)]
    pub locale: String,

    #[serde(rename = "model", default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Text>,

    #[serde(rename = "point", default, skip_serializing_if = "Vec::is_empty")]
    pub point: Vec<IdText>,

    #[serde(rename = "symbol", default, skip_serializing_if = "Vec::is_empty")]
    pub symbol: Vec<IdText>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Text {
    #[serde(rename = "label", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(rename = "description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "notes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Strings of one point or symbol, keyed by its id.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct IdText {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "label", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(rename = "description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "notes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
