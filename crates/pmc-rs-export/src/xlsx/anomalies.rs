// crates/pmc-rs-export/src/xlsx/anomalies.rs
//! Anomalies workbook: the anomaly list plus the response level and trigger
//! type legends.

use pmc_rs::schema::columns::ANOMALY_COLUMNS;
use pmc_rs::schema::{ResponseLevel, TriggerType};
use pmc_rs::{Lookup, NodeKind, Tree};

use super::book::{Book, Cell, Sheet};

pub const ANOMALIES: &str = "Anomalies";
pub const RESPONSE_LEVELS: &str = "Response Levels";
pub const TRIGGER_TYPES: &str = "Trigger Types";

fn anomaly_sheet(lookup: &Lookup, tree: &Tree) -> Sheet {
    let mut header = vec!["Table"];
    header.extend(ANOMALY_COLUMNS.iter().map(|c| c.header));
    let mut sheet = Sheet::new(ANOMALIES, &header).wrap("Description").wrap("Comment");

    for table in tree.nodes_of_kind(NodeKind::AnomalyTable) {
        for anomaly in tree.child_nodes(table.uuid) {
            let mut row = vec![Cell::from(table.name())];
            for column in ANOMALY_COLUMNS {
                let cell = match column.attribute(anomaly.kind()) {
                    Some(descriptor) => anomaly
                        .attr(descriptor.name)
                        .filter(|v| !v.is_null())
                        .map_or(Cell::Empty, |v| match v.as_integer() {
                            Some(i) => Cell::from(i),
                            None => Cell::from(descriptor.display(&v)),
                        }),
                    // Sources hang below the anomaly.
                    None if column.header == "Parameter" => {
                        let names: Vec<String> = tree
                            .child_nodes(anomaly.uuid)
                            .filter_map(|s| s.uuid_attr("parameter_uuid"))
                            .map(|p| lookup.name_of(p))
                            .collect();
                        if names.is_empty() {
                            Cell::Empty
                        } else {
                            Cell::from(names.join(", "))
                        }
                    }
                    None => Cell::Empty,
                };
                row.push(cell);
            }
            sheet.push(row);
        }
    }
    sheet
}

fn legend(name: &str, entries: impl Iterator<Item = (&'static str, &'static str)>) -> Sheet {
    let mut sheet = Sheet::new(name, &["Name", "Description"]).wrap("Description");
    for (value, description) in entries {
        sheet.push(vec![value.into(), description.into()]);
    }
    sheet
}

pub fn anomalies_book(lookup: &Lookup, tree: &Tree) -> Book {
    Book {
        sheets: vec![
            anomaly_sheet(lookup, tree),
            legend(
                RESPONSE_LEVELS,
                ResponseLevel::ALL.iter().map(|l| (l.as_str(), l.description())),
            ),
            legend(
                TRIGGER_TYPES,
                TriggerType::ALL.iter().map(|t| (t.as_str(), t.description())),
            ),
        ],
    }
}
