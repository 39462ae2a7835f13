// crates/pmc-rs-export/src/pmvs.rs
//! Per-product parameter value sets (`.pmvs`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ExportError, Result};

pub const EXTENSION: &str = "pmvs";

/// Values of one product, keyed by parameter UUID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<Uuid, Decimal>,
}

/// A value set and the product it's shown as.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub name: String,
    pub path: PathBuf,
    pub values: ValueSet,
}

impl Product {
    pub fn value(&self, parameter: Uuid) -> Option<Decimal> {
        self.values.values.get(&parameter).copied()
    }
}

pub fn load_value_set(path: &Path) -> Result<ValueSet> {
    let text = std::fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| ExportError::ValueSet {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Every `.pmvs` file of `dir`, ordered by file name. A set without a
/// `name` is named after its file.
pub fn load_products(dir: &Path) -> Result<Vec<Product>> {
    let entries = std::fs::read_dir(dir).map_err(|e| ExportError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ExportError::io(dir, e))?.path();
        if path.extension().is_some_and(|e| e == EXTENSION) && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let values = load_value_set(&path)?;
            let name = values.name.clone().unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            debug!("Loaded value set {name} ({} values)", values.values.len());
            Ok(Product { name, path, values })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_sorted_and_named() {
        let dir = tempfile::tempdir().expect("tempdir");
        let uuid = Uuid::new_v4();
        std::fs::write(
            dir.path().join("b.pmvs"),
            format!(r#"{{"values": {{"{uuid}": "1.5"}}}}"#),
        )
        .expect("write");
        std::fs::write(
            dir.path().join("a.pmvs"),
            format!(r#"{{"name": "Small", "values": {{"{uuid}": "2"}}}}"#),
        )
        .expect("write");
        std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let products = load_products(dir.path()).expect("load");
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Small", "b"]);
        assert_eq!(products[1].value(uuid), Some(Decimal::new(15, 1)));
    }

    #[test]
    fn malformed_set_names_its_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.pmvs");
        std::fs::write(&path, "{\"values\": 3}").expect("write");
        let err = load_value_set(&path).expect_err("malformed");
        assert!(matches!(err, ExportError::ValueSet { path: p, .. } if p == path));
    }
}
