// crates/pmc-rs-smdx/src/builder.rs

//! Serializes a [`SmdxModel`] back into an SMDX document.

use std::collections::HashSet;
use std::fmt::Write;

use serde::Serialize;

use crate::error::SmdxError;
use crate::model::{self, IdText, Text};
use crate::types::{Access, BlockKind, SmdxModel, SmdxPoint};

/// Serializes a model into an SMDX XML string with two-space indentation.
///
/// Offsets and lengths are written as stored in the model; strings go into a
/// single `en` locale. A symbol id shared by several points gets one string
/// entry, taken from its first occurrence.
pub fn save_smdx_to_string(file: &SmdxModel) -> Result<String, SmdxError> {
    // 1. Blocks and points.
    let block = file
        .blocks
        .iter()
        .map(|b| model::Block {
            block_type: (b.kind == BlockKind::Repeating).then(|| "repeating".to_string()),
            len: Some(b.length),
            name: b.name.clone(),
            point: b.points.iter().map(build_point).collect(),
        })
        .collect();

    // 2. Strings.
    let mut seen_symbols = HashSet::new();
    let mut symbol = Vec::new();
    for s in file.points().flat_map(|p| p.symbols.iter()) {
        if seen_symbols.insert(s.id.as_str()) {
            symbol.push(id_text(&s.id, &s.label, &s.description, &s.notes));
        }
    }
    let strings = model::Strings {
        id: file.id,
        locale: "en".to_string(),
        model: Some(Text {
            label: file.label.clone(),
            description: file.description.clone(),
            notes: file.notes.clone(),
        }),
        point: file
            .points()
            .map(|p| id_text(&p.id, &p.label, &p.description, &p.notes))
            .collect(),
        symbol,
    };

    let root = model::SunSpecModels {
        v: "1".to_string(),
        model: model::Model {
            id: file.id,
            len: Some(file.length),
            name: Some(file.name.clone()),
            block,
        },
        strings: vec![strings],
    };

    // 3. Serialize.
    let mut buffer = String::new();
    writeln!(&mut buffer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    let mut serializer = quick_xml::se::Serializer::new(&mut buffer);
    serializer.indent(' ', 2);
    root.serialize(serializer)?;
    buffer.push('\n');
    Ok(buffer)
}

fn build_point(point: &SmdxPoint) -> model::Point {
    model::Point {
        id: point.id.clone(),
        offset: Some(point.offset),
        point_type: point.point_type.name().to_string(),
        len: (point.point_type.size() != Some(point.size)).then_some(point.size),
        sf: point.scale_factor.clone(),
        units: point.units.clone(),
        access: (point.access == Access::ReadWrite).then(|| Access::ReadWrite.as_str().to_string()),
        mandatory: point.mandatory.then(|| "true".to_string()),
        symbol: point
            .symbols
            .iter()
            .map(|s| model::Symbol {
                id: s.id.clone(),
                value: s.value.to_string(),
            })
            .collect(),
    }
}

fn id_text(id: &str, label: &Option<String>, description: &Option<String>, notes: &Option<String>) -> IdText {
    IdText {
        id: id.to_string(),
        label: label.clone(),
        description: description.clone(),
        notes: notes.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SmdxBlock, SmdxSymbol};
    use pmc_rs::PointType;

    #[test]
    fn writes_declaration_and_lengths() {
        let mut point = SmdxPoint::new("St", PointType::Enum16);
        point.symbols.push(SmdxSymbol {
            id: "OFF".into(),
            value: 1,
            ..Default::default()
        });
        let model = SmdxModel {
            id: 64002,
            name: "state".into(),
            length: 1,
            blocks: vec![SmdxBlock {
                kind: BlockKind::Fixed,
                name: None,
                length: 1,
                points: vec![point],
            }],
            ..Default::default()
        };
        let xml = save_smdx_to_string(&model).expect("save");
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<sunSpecModels v=\"1\">"));
        assert!(xml.contains(r#"<model id="64002" len="1" name="state">"#));
        assert!(xml.contains(r#"<symbol id="OFF">1</symbol>"#));
        assert!(xml.contains(r#"<point id="St" offset="0" type="enum16">"#));
    }
}
