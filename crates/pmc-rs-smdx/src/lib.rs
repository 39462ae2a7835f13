// crates/pmc-rs-smdx/src/lib.rs

#![doc = "Parses and generates SunSpec SMDX (XML model definition) files."]
#![doc = ""]
#![doc = "It supports:"]
#![doc = "- `load_smdx_from_str` / `load_smdx_model`: reading a model with its points, scale-factor"]
#![doc = "  back-references, symbols and English strings."]
#![doc = "- `save_smdx_to_string`: writing a model back as an SMDX document."]

// --- Crate Modules ---

mod builder;
mod error;
mod model;
mod parser;
mod types;

// --- Public API Re-exports ---

pub use builder::save_smdx_to_string;
pub use error::SmdxError;
pub use parser::{load_smdx_from_str, load_smdx_model, smdx_file_name};
pub use types::{Access, BlockKind, SmdxBlock, SmdxModel, SmdxPoint, SmdxSymbol};
