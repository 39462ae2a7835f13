// crates/pmc-rs-export/src/smdx.rs
//! SunSpec models to SMDX documents, and SMDX documents into a project.

use std::collections::HashMap;

use log::info;
use pmc_rs::layout::{POINT_TYPES_ENUMERATION, PointType, point_type_uuid};
use pmc_rs::{AttrValue, DropPayload, Lookup, Models, Node, NodeKind, PmError, Tree, TreeKind};
use pmc_rs_smdx::{Access, BlockKind, SmdxBlock, SmdxModel, SmdxPoint, SmdxSymbol};
use uuid::Uuid;

use crate::error::Result;
use crate::registers::{model_id, sunspec_registers};
use crate::xlsx::sunspec::{point_id, read_only, scale_factor};

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

/// Named values of a parameter's enumeration.
fn symbols(lookup: &Lookup, parameter: Uuid) -> Vec<SmdxSymbol> {
    let Some(enumeration) = lookup
        .parameter_attribute(parameter, "enumeration_uuid")
        .and_then(|v| v.as_uuid())
    else {
        return Vec::new();
    };
    let Some(tree) = lookup.tree_of(enumeration) else {
        return Vec::new();
    };
    tree.child_nodes(enumeration)
        .map(|e| {
            let text = |name: &str| non_empty(e.attr(name).and_then(|v| v.as_str().map(str::to_string)));
            SmdxSymbol {
                id: text("abbreviation").unwrap_or_else(|| e.name()),
                value: e.attr("value").and_then(|v| v.as_integer()).unwrap_or(0),
                label: text("label").or_else(|| Some(e.name())),
                description: text("description"),
                notes: None,
            }
        })
        .collect()
}

/// The SMDX form of one SunSpec model. Offsets count from the end of the
/// `ID`/`L` header; repeating-block references are written out as the
/// points they place.
pub fn smdx_model(lookup: &Lookup, tree: &Tree, model: &Node) -> Result<SmdxModel> {
    let lookup = lookup.with(tree);
    let registers = sunspec_registers(&lookup, tree, model.uuid)?;
    let header: i64 = registers.iter().filter(|r| r.header).map(|r| r.size).sum();

    let points: Vec<SmdxPoint> = registers
        .iter()
        .filter(|r| !r.header)
        .map(|r| {
            let parameter = r.parameter();
            let text = |name: &str| non_empty(parameter.and_then(|p| lookup.parameter_str(p, name)));
            SmdxPoint {
                id: point_id(&lookup, r.point),
                offset: r.offset - header,
                point_type: r.point_type,
                size: r.size,
                scale_factor: scale_factor(&lookup, tree, r),
                units: r.units().or_else(|| text("units")),
                access: if read_only(&lookup, r) {
                    Access::ReadOnly
                } else {
                    Access::ReadWrite
                },
                mandatory: r.flag("mandatory"),
                label: non_empty(parameter.map(|p| lookup.name_of(p))),
                description: text("description"),
                notes: text("comment"),
                symbols: parameter.map(|p| symbols(&lookup, p)).unwrap_or_default(),
            }
        })
        .collect();

    let length = model
        .attr("length")
        .and_then(|v| v.as_integer())
        .unwrap_or_else(|| points.iter().map(|p| p.size).sum());
    Ok(SmdxModel {
        id: model_id(model),
        name: model.name(),
        length,
        label: non_empty(Some(model.name())),
        description: None,
        notes: None,
        blocks: vec![SmdxBlock {
            kind: BlockKind::Fixed,
            name: None,
            length,
            points,
        }],
    })
}

fn set(models: &mut Models, tree: TreeKind, uuid: Uuid, name: &str, value: impl Into<AttrValue>) -> Result<()> {
    models.get_mut(tree).set_attribute(uuid, name, value.into())?;
    Ok(())
}

fn set_text(models: &mut Models, tree: TreeKind, uuid: Uuid, name: &str, value: &Option<String>) -> Result<()> {
    match value {
        Some(text) => set(models, tree, uuid, name, text.as_str()),
        None => Ok(()),
    }
}

/// Adds the point-type enumeration to the parameter tree unless present.
pub fn ensure_point_types(models: &mut Models) -> Result<Uuid> {
    let params = models.parameters.tree();
    if let Some(existing) = params
        .nodes_of_kind(NodeKind::Enumeration)
        .find(|n| n.name() == POINT_TYPES_ENUMERATION)
    {
        return Ok(existing.uuid);
    }
    let root = params.root();
    let enumeration = models.add_child(TreeKind::Parameters, root, NodeKind::Enumeration)?;
    set(models, TreeKind::Parameters, enumeration, "name", POINT_TYPES_ENUMERATION)?;
    for (value, point_type) in PointType::ALL.iter().enumerate() {
        let enumerator = models.add_child(TreeKind::Parameters, enumeration, NodeKind::Enumerator)?;
        set(models, TreeKind::Parameters, enumerator, "name", point_type.name())?;
        set(models, TreeKind::Parameters, enumerator, "value", value as i64)?;
    }
    Ok(enumeration)
}

/// Imports an SMDX model: a parameter group with one parameter per point
/// (plus an enumeration per enumerated point) and a SunSpec model whose fixed
/// block references them. Returns the new SunSpec model.
pub fn import_smdx(models: &mut Models, smdx: &SmdxModel) -> Result<Uuid> {
    ensure_point_types(models)?;
    let types: HashMap<PointType, Uuid> = {
        let lookup = models.lookup();
        PointType::ALL
            .iter()
            .filter_map(|t| point_type_uuid(&lookup, *t).map(|u| (*t, u)))
            .collect()
    };

    // Parameters
    let params_root = models.parameters.root();
    let group = models.add_child(TreeKind::Parameters, params_root, NodeKind::Group)?;
    set(models, TreeKind::Parameters, group, "name", smdx.label.clone().unwrap_or_else(|| smdx.name.clone()))?;
    let mut parameters = Vec::new();
    for point in smdx.points() {
        let parameter = models.add_child(TreeKind::Parameters, group, NodeKind::Parameter)?;
        let name = point.label.clone().unwrap_or_else(|| point.id.clone());
        set(models, TreeKind::Parameters, parameter, "name", name)?;
        set(models, TreeKind::Parameters, parameter, "abbreviation", point.id.as_str())?;
        set_text(models, TreeKind::Parameters, parameter, "units", &point.units)?;
        set_text(models, TreeKind::Parameters, parameter, "description", &point.description)?;
        set_text(models, TreeKind::Parameters, parameter, "comment", &point.notes)?;
        set(models, TreeKind::Parameters, parameter, "read_only", point.access == Access::ReadOnly)?;

        if !point.symbols.is_empty() {
            let enumeration = models.add_child(TreeKind::Parameters, group, NodeKind::Enumeration)?;
            set(models, TreeKind::Parameters, enumeration, "name", point.id.as_str())?;
            for symbol in &point.symbols {
                let enumerator = models.add_child(TreeKind::Parameters, enumeration, NodeKind::Enumerator)?;
                set(models, TreeKind::Parameters, enumerator, "name", symbol.id.as_str())?;
                set(models, TreeKind::Parameters, enumerator, "value", symbol.value)?;
                set_text(models, TreeKind::Parameters, enumerator, "label", &symbol.label)?;
                set_text(models, TreeKind::Parameters, enumerator, "description", &symbol.description)?;
            }
            set(models, TreeKind::Parameters, parameter, "enumeration_uuid", enumeration)?;
        }
        parameters.push(parameter);
    }

    // SunSpec model
    let sunspec_root = models.sunspec.root();
    let model = models.add_child(TreeKind::SunSpec, sunspec_root, NodeKind::SunSpecModel)?;
    set(models, TreeKind::SunSpec, model, "name", smdx.name.as_str())?;
    set(models, TreeKind::SunSpec, model, "id", smdx.id)?;
    let fixed = models
        .sunspec
        .tree()
        .child_nodes(model)
        .find(|n| n.kind() == NodeKind::FixedBlock)
        .map(|n| n.uuid)
        .ok_or(PmError::NotFound(model))?;

    let mut points_by_id = HashMap::new();
    for (point, parameter) in smdx.points().zip(&parameters) {
        let payload = DropPayload::new(*parameter).encode();
        let data_point = models.drop(TreeKind::SunSpec, &payload, fixed, None)?;
        if let Some(type_uuid) = types.get(&point.point_type) {
            set(models, TreeKind::SunSpec, data_point, "type_uuid", *type_uuid)?;
        }
        set(models, TreeKind::SunSpec, data_point, "size", point.size)?;
        set(models, TreeKind::SunSpec, data_point, "mandatory", point.mandatory)?;
        set_text(models, TreeKind::SunSpec, data_point, "units", &point.units)?;
        points_by_id.insert(point.id.as_str(), data_point);
    }

    // Scale factors name points that may come later in the model.
    for point in smdx.points() {
        let (Some(sf), Some(data_point)) = (point.scale_factor_point(), points_by_id.get(point.id.as_str())) else {
            continue;
        };
        if let Some(factor) = points_by_id.get(sf) {
            set(models, TreeKind::SunSpec, *data_point, "factor_uuid", *factor)?;
        }
    }

    info!(
        "Imported SMDX model {} ({}) with {} points",
        smdx.id,
        smdx.name,
        parameters.len()
    );
    Ok(model)
}
