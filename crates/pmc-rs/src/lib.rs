// crates/pmc-rs/src/lib.rs
//! Core of the parameter model compiler.
//!
//! Holds the declarative node schema, the per-concern trees (parameters, CAN,
//! SunSpec, static Modbus, anomalies), drop/move/delete dispatch, structural
//! checks and the table expansion engine. Exporters live in `pmc-rs-export`.

// --- Foundation Modules ---
pub mod error;
pub mod log;
pub mod schema;

// --- Trees & Models ---
pub mod behavior;
pub mod check;
pub mod json;
pub mod layout;
pub mod model;
pub mod models;
pub mod project;
pub mod tree;

// --- Table Expansion ---
pub mod expand;

// --- Top-level Exports ---
pub use error::{PmError, SchemaError, SchemaErrorKind};
pub use schema::{
    AttrDescriptor, AttrError, AttrType, AttrValue, BaseType, KindData, NodeData, NodeKind,
    TreeKind, parse_integer,
};
pub use tree::{Node, Subtree, Tree};
pub use model::{Model, NullView, ViewAdapter};
pub use models::{DropPayload, Lookup, Models};
pub use project::Project;
pub use check::{CheckResult, Finding, Level};
pub use layout::PointType;
pub use expand::{ExpandOptions, ExpansionReport, LeafOrder, ZeroBitsPolicy};
