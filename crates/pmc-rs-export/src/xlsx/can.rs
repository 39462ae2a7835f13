// crates/pmc-rs-export/src/xlsx/can.rs
//! One row per CAN signal with its parameter and per-product defaults.

use pmc_rs::{Lookup, Node, NodeKind, Tree};
use uuid::Uuid;

use super::book::{Book, Cell, Sheet};
use crate::pmvs::Product;

pub const SHEET: &str = "CAN";

pub const COLUMNS: &[&str] = &[
    "Message",
    "Multiplexer",
    "Signal",
    "Start Bit",
    "Bits",
    "Parameter",
    "Description",
    "Access Level",
    "Units",
    "Default",
    "Path",
];

fn nearest(tree: &Tree, uuid: Uuid, kinds: &[NodeKind]) -> Option<String> {
    tree.ancestors(uuid)
        .into_iter()
        .filter_map(|a| tree.get(a))
        .find(|n| kinds.contains(&n.kind()))
        .map(Node::name)
}

/// The value a product sets for `parameter`, trying the element itself and
/// then what it was derived from.
fn product_value(lookup: &Lookup, product: &Product, parameter: Uuid) -> Option<String> {
    product
        .value(parameter)
        .or_else(|| lookup.definition(parameter).and_then(|d| product.value(d.uuid)))
        .map(|v| v.normalize().to_string())
}

pub fn can_book(lookup: &Lookup, tree: &Tree, products: &[Product]) -> Book {
    let mut header: Vec<&str> = COLUMNS.to_vec();
    header.extend(products.iter().map(|p| p.name.as_str()));
    let mut sheet = Sheet::new(SHEET, &header).wrap("Description");

    for signal in tree.nodes_of_kind(NodeKind::Signal) {
        let parameter = signal.uuid_attr("parameter_uuid");
        let text = |name: &str| {
            parameter
                .and_then(|p| lookup.parameter_str(p, name))
                .filter(|t| !t.is_empty())
        };
        let access_level = parameter
            .and_then(|p| lookup.parameter_attribute(p, "access_level_uuid"))
            .and_then(|v| v.as_uuid())
            .map(|a| lookup.name_of(a));
        let default = parameter
            .and_then(|p| lookup.parameter_attribute(p, "default"))
            .and_then(|v| v.as_decimal())
            .map(|d| d.normalize().to_string());
        let path = parameter.and_then(|p| {
            let tree = lookup.tree_of(p)?;
            Some(tree.name_path(p).join("/"))
        });

        let mut row = vec![
            Cell::from(nearest(tree, signal.uuid, &[NodeKind::Message, NodeKind::MultiplexedMessage])),
            Cell::from(nearest(tree, signal.uuid, &[NodeKind::Multiplexer])),
            Cell::from(signal.name()),
            signal.attr("start_bit").and_then(|v| v.as_integer()).unwrap_or(0).into(),
            signal.attr("bits").and_then(|v| v.as_integer()).unwrap_or(0).into(),
            Cell::from(parameter.map(|p| lookup.name_of(p))),
            Cell::from(text("description")),
            Cell::from(access_level),
            Cell::from(text("units")),
            Cell::from(default),
            Cell::from(path),
        ];
        for product in products {
            row.push(Cell::from(parameter.and_then(|p| product_value(lookup, product, p))));
        }
        sheet.push(row);
    }
    Book { sheets: vec![sheet] }
}
