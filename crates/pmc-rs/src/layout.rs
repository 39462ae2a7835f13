// crates/pmc-rs/src/layout.rs
//! Register layout of SunSpec models and the static Modbus map.
//!
//! Block offsets are running sums of point sizes starting from zero, and a
//! SunSpec model's length is the sum of all non-header point sizes. The
//! lenient pass here uses the stored `size` attributes and runs after every
//! structural change; the strict pass resolves point types and is run by
//! checks and exporters.

use uuid::Uuid;

use crate::error::PmError;
use crate::models::Lookup;
use crate::schema::kinds::staticmodbus::ModbusTableRepeatingBlockReference;
use crate::schema::kinds::sunspec::TableRepeatingBlockReferenceDataPointReference;
use crate::schema::{AttrValue, NodeKind, TreeKind};
use crate::tree::{Subtree, Tree};

/// Name of the enumeration whose enumerators are the point types.
pub const POINT_TYPES_ENUMERATION: &str = "SunSpecTypes";

/// SunSpec/Modbus point types and their register counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointType {
    Int16,
    Uint16,
    Count,
    Acc16,
    Enum16,
    Bitfield16,
    Pad,
    Sunssf,
    Int32,
    Uint32,
    Acc32,
    Enum32,
    Bitfield32,
    Ipaddr,
    Float32,
    Int64,
    Uint64,
    Acc64,
    Float64,
    Eui48,
    Ipv6addr,
    String,
}

impl PointType {
    pub const ALL: [PointType; 22] = [
        PointType::Int16,
        PointType::Uint16,
        PointType::Count,
        PointType::Acc16,
        PointType::Enum16,
        PointType::Bitfield16,
        PointType::Pad,
        PointType::Sunssf,
        PointType::Int32,
        PointType::Uint32,
        PointType::Acc32,
        PointType::Enum32,
        PointType::Bitfield32,
        PointType::Ipaddr,
        PointType::Float32,
        PointType::Int64,
        PointType::Uint64,
        PointType::Acc64,
        PointType::Float64,
        PointType::Eui48,
        PointType::Ipv6addr,
        PointType::String,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PointType::Int16 => "int16",
            PointType::Uint16 => "uint16",
            PointType::Count => "count",
            PointType::Acc16 => "acc16",
            PointType::Enum16 => "enum16",
            PointType::Bitfield16 => "bitfield16",
            PointType::Pad => "pad",
            PointType::Sunssf => "sunssf",
            PointType::Int32 => "int32",
            PointType::Uint32 => "uint32",
            PointType::Acc32 => "acc32",
            PointType::Enum32 => "enum32",
            PointType::Bitfield32 => "bitfield32",
            PointType::Ipaddr => "ipaddr",
            PointType::Float32 => "float32",
            PointType::Int64 => "int64",
            PointType::Uint64 => "uint64",
            PointType::Acc64 => "acc64",
            PointType::Float64 => "float64",
            PointType::Eui48 => "eui48",
            PointType::Ipv6addr => "ipv6addr",
            PointType::String => "string",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        PointType::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Register count, or `None` for `string` whose size is free.
    pub fn size(self) -> Option<i64> {
        use PointType::*;
        match self {
            Int16 | Uint16 | Count | Acc16 | Enum16 | Bitfield16 | Pad | Sunssf => Some(1),
            Int32 | Uint32 | Acc32 | Enum32 | Bitfield32 | Ipaddr | Float32 => Some(2),
            Int64 | Uint64 | Acc64 | Float64 | Eui48 => Some(4),
            Ipv6addr => Some(8),
            String => None,
        }
    }

    /// C type used for the interface variable behind a point.
    pub fn c_type(self) -> &'static str {
        use PointType::*;
        match self {
            Int16 | Sunssf => "int16_t",
            Uint16 | Count | Acc16 | Enum16 | Bitfield16 | Pad => "uint16_t",
            Int32 => "int32_t",
            Uint32 | Acc32 | Enum32 | Bitfield32 | Ipaddr => "uint32_t",
            Float32 => "float",
            Int64 => "int64_t",
            Uint64 | Acc64 | Eui48 | Ipv6addr => "uint64_t",
            Float64 => "double",
            String => "char",
        }
    }
}

/// Resolves a point's `type_uuid` to a [`PointType`].
pub fn resolve_point_type(lookup: &Lookup, point: Uuid, type_uuid: Option<Uuid>) -> Result<PointType, PmError> {
    type_uuid
        .and_then(|t| lookup.node(t))
        .filter(|n| n.kind() == NodeKind::Enumerator)
        .and_then(|n| PointType::from_name(&n.name()))
        .ok_or(PmError::TypeNotFound {
            uuid: point,
            type_uuid,
        })
}

/// The enumerator standing for `point_type` in the parameter tree's
/// point-type enumeration, if the project defines one.
pub fn point_type_uuid(lookup: &Lookup, point_type: PointType) -> Option<Uuid> {
    let params = lookup.parameters()?;
    let enumeration = params
        .nodes_of_kind(NodeKind::Enumeration)
        .find(|n| n.name() == POINT_TYPES_ENUMERATION)?;
    params
        .child_nodes(enumeration.uuid)
        .find(|n| n.name() == point_type.name())
        .map(|n| n.uuid)
}

/// Resolves and checks the type of one point, returning its size.
pub fn checked_size(lookup: &Lookup, tree: &Tree, point: Uuid) -> Result<i64, PmError> {
    let node = tree.node(point)?;
    let type_uuid = node.uuid_attr("type_uuid");
    let size = node.attr("size").and_then(|v| v.as_integer()).unwrap_or(0);
    let point_type = resolve_point_type(lookup, point, type_uuid)?;
    match point_type.size() {
        Some(expected) if expected != size => Err(PmError::MismatchedSizeAndType {
            uuid: point,
            type_name: point_type.name().to_string(),
            size,
            expected,
        }),
        _ => Ok(size),
    }
}

/// Strictly validates every laid-out point under `scope` and returns the sum
/// of their sizes. Header points and unexpanded table seeds are not counted.
pub fn validated_length(lookup: &Lookup, tree: &Tree, scope: Uuid) -> Result<i64, PmError> {
    let mut total = 0;
    for uuid in tree.descendants(scope) {
        let node = tree.node(uuid)?;
        if !matches!(
            node.kind(),
            NodeKind::DataPoint
                | NodeKind::DataPointBitfield
                | NodeKind::FunctionData
                | NodeKind::FunctionDataBitfield
        ) {
            continue;
        }
        let parent_kind = tree.parent_node(uuid).map(|p| p.kind());
        if matches!(
            parent_kind,
            Some(NodeKind::HeaderBlock | NodeKind::SunSpecTable | NodeKind::ModbusTable)
        ) {
            continue;
        }
        let size = checked_size(lookup, tree, uuid)?;
        // Repeating-block points count once per reference, through the reference.
        if matches!(
            parent_kind,
            Some(NodeKind::TableRepeatingBlock | NodeKind::ModbusTableRepeatingBlock)
        ) {
            continue;
        }
        total += size;
    }
    for uuid in tree.descendants(scope) {
        let node = tree.node(uuid)?;
        if matches!(
            node.kind(),
            NodeKind::TableRepeatingBlockReference | NodeKind::ModbusTableRepeatingBlockReference
        ) {
            if let Some(block) = node.uuid_attr("original") {
                total += block_size(tree, block);
            }
        }
    }
    Ok(total)
}

/// One attribute the layout wants to hold a given value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub uuid: Uuid,
    pub attribute: &'static str,
    pub value: i64,
}

fn size_of(tree: &Tree, uuid: Uuid) -> i64 {
    let Some(node) = tree.get(uuid) else {
        return 0;
    };
    match node.kind() {
        NodeKind::TableRepeatingBlockReference | NodeKind::ModbusTableRepeatingBlockReference => node
            .uuid_attr("original")
            .map_or(0, |block| block_size(tree, block)),
        _ => node.attr("size").and_then(|v| v.as_integer()).unwrap_or(0),
    }
}

/// Sum of the sizes of a repeating block's points.
pub fn block_size(tree: &Tree, block: Uuid) -> i64 {
    tree.children(block).iter().map(|c| size_of(tree, *c)).sum()
}

/// Places consecutive children of `block` starting at `base`; returns the total size.
fn place_children(tree: &Tree, block: Uuid, base: i64, with_offset: bool, out: &mut Vec<Placement>) -> i64 {
    let mut block_offset = 0;
    for child in tree.children(block) {
        out.push(Placement {
            uuid: *child,
            attribute: "block_offset",
            value: block_offset,
        });
        if with_offset && tree.get(*child).is_some_and(|n| n.kind().descriptor("offset").is_some()) {
            out.push(Placement {
                uuid: *child,
                attribute: "offset",
                value: base + block_offset,
            });
        }
        block_offset += size_of(tree, *child);
    }
    block_offset
}

/// Every layout-derived attribute value of the tree.
pub fn compute_layout(tree: &Tree) -> Vec<Placement> {
    let mut out = Vec::new();
    match tree.kind() {
        TreeKind::SunSpec => {
            for model in tree.nodes_of_kind(NodeKind::SunSpecModel) {
                let mut offset = 0;
                let mut header_length = 0;
                for block in tree.child_nodes(model.uuid) {
                    match block.kind() {
                        NodeKind::HeaderBlock | NodeKind::FixedBlock => {
                            out.push(Placement {
                                uuid: block.uuid,
                                attribute: "offset",
                                value: offset,
                            });
                            let size = place_children(tree, block.uuid, offset, true, &mut out);
                            if block.kind() == NodeKind::HeaderBlock {
                                header_length += size;
                            }
                            offset += size;
                        }
                        NodeKind::SunSpecTable => place_table(tree, block.uuid, &mut out),
                        _ => {}
                    }
                }
                out.push(Placement {
                    uuid: model.uuid,
                    attribute: "length",
                    value: offset - header_length,
                });
            }
        }
        TreeKind::StaticModbus => {
            let root = tree.root();
            for child in tree.child_nodes(root) {
                if child.kind() == NodeKind::ModbusTable {
                    place_table(tree, child.uuid, &mut out);
                }
            }
            let mut block_offset = 0;
            for child in tree.child_nodes(root) {
                if child.kind() == NodeKind::ModbusTable {
                    continue;
                }
                out.push(Placement {
                    uuid: child.uuid,
                    attribute: "block_offset",
                    value: block_offset,
                });
                let size = size_of(tree, child.uuid);
                if child.kind() == NodeKind::ModbusTableRepeatingBlockReference {
                    out.push(Placement {
                        uuid: child.uuid,
                        attribute: "size",
                        value: size,
                    });
                }
                block_offset += size;
            }
        }
        _ => {}
    }
    out
}

/// Repeating blocks of a table: points run from zero inside each block, and
/// blocks are offset by the sizes of the blocks before them.
fn place_table(tree: &Tree, table: Uuid, out: &mut Vec<Placement>) {
    let mut offset = 0;
    for block in tree.child_nodes(table) {
        if matches!(
            block.kind(),
            NodeKind::TableRepeatingBlock | NodeKind::ModbusTableRepeatingBlock
        ) {
            out.push(Placement {
                uuid: block.uuid,
                attribute: "offset",
                value: offset,
            });
            offset += place_children(tree, block.uuid, 0, true, out);
        }
    }
}

fn apply(tree: &mut Tree, placements: &[Placement], transient_only: bool) -> Result<(), PmError> {
    for p in placements {
        let data = tree.data_mut(p.uuid)?;
        let persisted = data
            .kind()
            .descriptor(p.attribute)
            .is_some_and(|d| d.persisted());
        if transient_only && persisted {
            continue;
        }
        data.set(p.attribute, AttrValue::Integer(p.value))
            .map_err(|source| PmError::Attribute { uuid: p.uuid, source })?;
    }
    Ok(())
}

/// Recomputes offsets, block offsets, lengths and reference children.
pub fn update_layout(tree: &mut Tree) -> Result<(), PmError> {
    sync_references(tree)?;
    let placements = compute_layout(tree);
    apply(tree, &placements, false)
}

/// Recomputes only non-persisted offsets (after load).
pub fn refresh_offsets(tree: &mut Tree) -> Result<(), PmError> {
    let placements = compute_layout(tree);
    apply(tree, &placements, true)
}

/// Persisted layout attributes whose stored value differs from the layout.
pub fn drift(tree: &Tree) -> Vec<(Placement, i64)> {
    compute_layout(tree)
        .into_iter()
        .filter_map(|p| {
            let node = tree.get(p.uuid)?;
            let persisted = node.kind().descriptor(p.attribute)?.persisted();
            let stored = node.attr(p.attribute)?.as_integer()?;
            (persisted && stored != p.value).then_some((p, stored))
        })
        .collect()
}

/// Keeps each SunSpec repeating-block reference's children in step with the
/// points of the block it references, reusing existing child identities.
fn sync_references(tree: &mut Tree) -> Result<(), PmError> {
    if tree.kind() != TreeKind::SunSpec {
        return Ok(());
    }
    let references: Vec<Uuid> = tree
        .nodes_of_kind(NodeKind::TableRepeatingBlockReference)
        .map(|n| n.uuid)
        .collect();
    for reference in references {
        let wanted: Vec<Uuid> = tree
            .get(reference)
            .and_then(|n| n.uuid_attr("original"))
            .map(|block| {
                tree.child_nodes(block)
                    .filter(|n| n.kind() == NodeKind::DataPoint)
                    .map(|n| n.uuid)
                    .collect()
            })
            .unwrap_or_default();
        let current: Vec<(Uuid, Option<Uuid>)> = tree
            .child_nodes(reference)
            .map(|n| (n.uuid, n.uuid_attr("original")))
            .collect();
        let current_originals: Vec<Option<Uuid>> = current.iter().map(|(_, o)| *o).collect();
        let wanted_originals: Vec<Option<Uuid>> = wanted.iter().copied().map(Some).collect();
        if current_originals == wanted_originals {
            continue;
        }
        let old = tree.detach_children(reference)?;
        for point in wanted {
            let uuid = old
                .iter()
                .find(|c| c.data.get("original").and_then(|v| v.as_uuid()) == Some(point))
                .map_or_else(Uuid::new_v4, |c| c.uuid);
            let child = Subtree::with_uuid(
                uuid,
                TableRepeatingBlockReferenceDataPointReference {
                    original: Some(point),
                },
            );
            tree.insert(reference, None, child)?;
        }
    }
    Ok(())
}

/// A new Modbus reference placed at the end of the map.
pub fn new_modbus_reference(tree: &Tree, block: Uuid) -> Subtree {
    Subtree::new(ModbusTableRepeatingBlockReference {
        original: Some(block),
        block_offset: 0,
        size: block_size(tree, block),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::kinds::sunspec::{
        DataPoint, FixedBlock, HeaderBlock, SunSpecModel, SunSpecTable, TableRepeatingBlock,
        TableRepeatingBlockReference,
    };

    fn point(name: &str, size: i64) -> Subtree {
        Subtree::new(DataPoint {
            name: name.into(),
            size,
            ..Default::default()
        })
    }

    fn sunspec_model(tree: &mut Tree) -> (Uuid, Uuid, Uuid) {
        let root = tree.root();
        let model = tree
            .insert(root, None, Subtree::new(SunSpecModel { name: "m".into(), id: 1, length: 0 }))
            .expect("model");
        let header = tree
            .insert(
                model,
                None,
                Subtree::new(HeaderBlock::default()).child(point("ID", 1)).child(point("L", 1)),
            )
            .expect("header");
        let fixed = tree
            .insert(model, None, Subtree::new(FixedBlock::default()))
            .expect("fixed");
        (model, header, fixed)
    }

    #[test]
    fn point_type_sizes() {
        assert_eq!(PointType::from_name("sunssf").and_then(PointType::size), Some(1));
        assert_eq!(PointType::from_name("float32").and_then(PointType::size), Some(2));
        assert_eq!(PointType::from_name("eui48").and_then(PointType::size), Some(4));
        assert_eq!(PointType::from_name("ipv6addr").and_then(PointType::size), Some(8));
        assert_eq!(PointType::String.size(), None);
        assert_eq!(PointType::from_name("quad"), None);
    }

    #[test]
    fn fixed_block_follows_header() {
        let mut tree = Tree::empty(TreeKind::SunSpec);
        let (model, _header, fixed) = sunspec_model(&mut tree);
        let a = tree.insert(fixed, None, point("A", 2)).expect("a");
        let b = tree.insert(fixed, None, point("B", 1)).expect("b");
        update_layout(&mut tree).expect("layout");

        assert_eq!(tree.typed::<FixedBlock>(fixed).map(|f| f.offset), Some(2));
        let a = tree.typed::<DataPoint>(a).expect("a");
        let b = tree.typed::<DataPoint>(b).expect("b");
        assert_eq!((a.block_offset, a.offset), (0, 2));
        assert_eq!((b.block_offset, b.offset), (2, 4));
        assert_eq!(tree.typed::<SunSpecModel>(model).map(|m| m.length), Some(3));
        assert!(drift(&tree).is_empty());
    }

    #[test]
    fn references_mirror_their_block() {
        let mut tree = Tree::empty(TreeKind::SunSpec);
        let (model, _header, fixed) = sunspec_model(&mut tree);
        let table = tree
            .insert(model, None, Subtree::new(SunSpecTable::default()))
            .expect("table");
        let block = tree
            .insert(
                table,
                None,
                Subtree::new(TableRepeatingBlock::default())
                    .child(point("x", 1))
                    .child(point("y", 2)),
            )
            .expect("block");
        let reference = tree
            .insert(
                fixed,
                None,
                Subtree::new(TableRepeatingBlockReference {
                    original: Some(block),
                    ..Default::default()
                }),
            )
            .expect("reference");
        update_layout(&mut tree).expect("layout");

        assert_eq!(tree.children(reference).len(), 2);
        assert_eq!(tree.typed::<SunSpecModel>(model).map(|m| m.length), Some(3));

        // A second pass keeps the reference children.
        let before = tree.children(reference).to_vec();
        update_layout(&mut tree).expect("layout");
        assert_eq!(tree.children(reference), before.as_slice());
    }

    #[test]
    fn drift_reports_stale_length() {
        let mut tree = Tree::empty(TreeKind::SunSpec);
        let (model, _header, fixed) = sunspec_model(&mut tree);
        tree.insert(fixed, None, point("A", 2)).expect("a");
        update_layout(&mut tree).expect("layout");
        tree.typed_mut::<SunSpecModel>(model).expect("model").length = 7;
        let drift = drift(&tree);
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].0.value, 2);
        assert_eq!(drift[0].1, 7);
    }
}
