// crates/pmc-rs-export/src/config.rs

use std::path::PathBuf;

/// Where and how exports are written.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub out_dir: PathBuf,
    /// Directory whose `c_source.hbs` / `c_header.hbs` replace the embedded templates.
    pub template_dir: Option<PathBuf>,
    /// Directory of `.pmvs` per-product default files for the CAN workbook.
    pub pmvs_dir: Option<PathBuf>,
    /// `Title=` line of the `.sym` file.
    pub sym_title: String,
    /// Text of the banner comment placed in every generated C file.
    pub banner: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("generated"),
            template_dir: None,
            pmvs_dir: None,
            sym_title: "pmc".to_string(),
            banner: "Generated by pmc. Do not edit.".to_string(),
        }
    }
}

impl ExportConfig {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            ..Default::default()
        }
    }
}
