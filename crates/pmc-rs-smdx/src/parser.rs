// crates/pmc-rs-smdx/src/parser.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;
use pmc_rs::PointType;

use crate::error::SmdxError;
use crate::model::{self, IdText};
use crate::types::{Access, BlockKind, SmdxBlock, SmdxModel, SmdxPoint, SmdxSymbol};

/// File name of model `id` in the SunSpec models repository: `smdx_00001.xml`.
pub fn smdx_file_name(id: i64) -> String {
    format!("smdx_{id:05}.xml")
}

/// Finds model `id` in the first directory of `search_path` that holds it
/// and parses it.
pub fn load_smdx_model(search_path: &[PathBuf], id: i64) -> Result<SmdxModel, SmdxError> {
    let name = smdx_file_name(id);
    let path = search_path
        .iter()
        .map(|dir| dir.join(&name))
        .find(|p| p.is_file())
        .ok_or_else(|| SmdxError::ModelNotFound {
            id,
            searched: search_path.to_vec(),
        })?;
    load_smdx_file(&path)
}

fn load_smdx_file(path: &Path) -> Result<SmdxModel, SmdxError> {
    let text = std::fs::read_to_string(path).map_err(|source| SmdxError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Parsing SMDX file {}", path.display());
    load_smdx_from_str(&text)
}

/// Parses an SMDX document into a [`SmdxModel`].
///
/// Point offsets missing from the file are computed from the sizes of the
/// preceding points; strings are taken from the `en` locale when present.
///
/// # Errors
/// Returns an `SmdxError` if the XML doesn't match the schema, a point has an
/// unknown type, a `string` point has no length, a scale factor doesn't
/// resolve, or a symbol value isn't an integer.
pub fn load_smdx_from_str(xml_content: &str) -> Result<SmdxModel, SmdxError> {
    // 1. Deserialize into the raw model.
    let root: model::SunSpecModels = quick_xml::de::from_str(xml_content)?;

    // 2. Pick the strings of the preferred locale.
    let strings = root
        .strings
        .iter()
        .find(|s| s.locale == "en")
        .or_else(|| root.strings.first());
    let point_text = index_text(strings.map(|s| s.point.as_slice()));
    let symbol_text = index_text(strings.map(|s| s.symbol.as_slice()));

    // 3. Convert the blocks, computing offsets as we go.
    let mut offset = 0;
    let mut blocks = Vec::with_capacity(root.model.block.len());
    for block in &root.model.block {
        let kind = match block.block_type.as_deref() {
            Some("repeating") => BlockKind::Repeating,
            _ => BlockKind::Fixed,
        };
        let mut points = Vec::with_capacity(block.point.len());
        for raw in &block.point {
            let point = parse_point(raw, offset, &point_text, &symbol_text)?;
            offset = point.offset + point.size;
            points.push(point);
        }
        let length = block
            .len
            .unwrap_or_else(|| points.iter().map(|p| p.size).sum());
        blocks.push(SmdxBlock {
            kind,
            name: block.name.clone(),
            length,
            points,
        });
    }

    let model_text = strings.and_then(|s| s.model.as_ref());
    let parsed = SmdxModel {
        id: root.model.id,
        name: root
            .model
            .name
            .clone()
            .unwrap_or_else(|| format!("model_{}", root.model.id)),
        length: root
            .model
            .len
            .unwrap_or_else(|| blocks.iter().map(|b| b.length).sum()),
        label: model_text.and_then(|t| non_empty(&t.label)),
        description: model_text.and_then(|t| non_empty(&t.description)),
        notes: model_text.and_then(|t| non_empty(&t.notes)),
        blocks,
    };

    // 4. Scale factors must name a point of the model or be constants.
    for point in parsed.points() {
        if let Some(sf) = point.scale_factor_point() {
            if parsed.point(sf).is_none() {
                return Err(SmdxError::UnknownScaleFactor {
                    point: point.id.clone(),
                    scale_factor: sf.to_string(),
                });
            }
        }
    }

    debug!(
        "Parsed SMDX model {} ({} points, length {})",
        parsed.id,
        parsed.points().count(),
        parsed.length
    );
    Ok(parsed)
}

fn parse_point(
    raw: &model::Point,
    next_offset: i64,
    point_text: &HashMap<&str, &IdText>,
    symbol_text: &HashMap<&str, &IdText>,
) -> Result<SmdxPoint, SmdxError> {
    let point_type = PointType::from_name(&raw.point_type).ok_or_else(|| SmdxError::UnknownPointType {
        point: raw.id.clone(),
        type_name: raw.point_type.clone(),
    })?;
    let size = match (point_type.size(), raw.len) {
        (_, Some(len)) => len,
        (Some(size), None) => size,
        (None, None) => {
            return Err(SmdxError::MissingLength {
                point: raw.id.clone(),
            });
        }
    };

    let symbols = raw
        .symbol
        .iter()
        .map(|s| {
            let value = s.value.trim().parse::<i64>().map_err(|_| SmdxError::InvalidSymbolValue {
                point: raw.id.clone(),
                symbol: s.id.clone(),
                value: s.value.clone(),
            })?;
            let text = symbol_text.get(s.id.as_str());
            Ok(SmdxSymbol {
                id: s.id.clone(),
                value,
                label: text.and_then(|t| non_empty(&t.label)),
                description: text.and_then(|t| non_empty(&t.description)),
                notes: text.and_then(|t| non_empty(&t.notes)),
            })
        })
        .collect::<Result<Vec<_>, SmdxError>>()?;

    let text = point_text.get(raw.id.as_str());
    Ok(SmdxPoint {
        id: raw.id.clone(),
        offset: raw.offset.unwrap_or(next_offset),
        point_type,
        size,
        scale_factor: raw.sf.clone(),
        units: raw.units.clone(),
        access: match raw.access.as_deref() {
            Some("rw") | Some("RW") => Access::ReadWrite,
            _ => Access::ReadOnly,
        },
        mandatory: matches!(raw.mandatory.as_deref(), Some("true") | Some("M")),
        label: text.and_then(|t| non_empty(&t.label)),
        description: text.and_then(|t| non_empty(&t.description)),
        notes: text.and_then(|t| non_empty(&t.notes)),
        symbols,
    })
}

fn index_text(items: Option<&[IdText]>) -> HashMap<&str, &IdText> {
    items
        .unwrap_or_default()
        .iter()
        .map(|t| (t.id.as_str(), t))
        .collect()
}

/// Empty `<notes/>` elements read as absent.
fn non_empty(text: &Option<String>) -> Option<String> {
    text.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"<sunSpecModels v="1">
  <model id="64001" name="test">
    <block>
      <point id="W" type="int16" sf="W_SF" units="W" />
      <point id="W_SF" type="sunssf" />
      <point id="Name" type="string" len="4" />
    </block>
  </model>
</sunSpecModels>"#;

    #[test]
    fn offsets_are_computed_when_missing() {
        let model = load_smdx_from_str(MINIMAL).expect("parse");
        let offsets: Vec<i64> = model.points().map(|p| p.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2]);
        assert_eq!(model.length, 6);
        assert_eq!(model.point("W").and_then(|p| p.scale_factor_point()), Some("W_SF"));
    }

    #[test]
    fn string_point_without_length_is_rejected() {
        let xml = MINIMAL.replace(r#" len="4""#, "");
        let result = load_smdx_from_str(&xml);
        assert!(matches!(result, Err(SmdxError::MissingLength { point }) if point == "Name"));
    }

    #[test]
    fn file_name_is_zero_padded() {
        assert_eq!(smdx_file_name(1), "smdx_00001.xml");
        assert_eq!(smdx_file_name(64001), "smdx_64001.xml");
    }
}
