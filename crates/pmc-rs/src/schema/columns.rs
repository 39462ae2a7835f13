// crates/pmc-rs/src/schema/columns.rs
//! View column sets, one constant per tree.

use super::kinds::{NodeKind, TreeKind};
use super::AttrDescriptor;

/// One view column: which attribute each kind shows in it.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    /// Attribute shown for kinds not listed in `overrides`, if the kind has it.
    pub default_attr: Option<&'static str>,
    /// Per-kind replacement; `None` blanks the cell for that kind.
    pub overrides: &'static [(NodeKind, Option<&'static str>)],
}

const fn col(header: &'static str, attr: &'static str) -> Column {
    Column {
        header,
        default_attr: Some(attr),
        overrides: &[],
    }
}

impl Column {
    const fn with(self, overrides: &'static [(NodeKind, Option<&'static str>)]) -> Self {
        Column { overrides, ..self }
    }

    /// The attribute this column shows for `kind`, if any.
    pub fn attribute(&self, kind: NodeKind) -> Option<&'static AttrDescriptor> {
        let name = self
            .overrides
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(self.default_attr, |(_, attr)| *attr)?;
        kind.descriptor(name)
    }
}

pub const PARAMETER_COLUMNS: &[Column] = &[
    col("Name", "name"),
    col("Abbreviation", "abbreviation"),
    col("Type Name", "type_name"),
    col("Units", "units"),
    col("Default", "default"),
    col("Minimum", "minimum"),
    col("Maximum", "maximum"),
    col("Decimal Places", "decimal_places"),
    col("Access Level", "access_level_uuid")
        .with(&[(NodeKind::AccessLevels, Some("default_access_level_uuid"))]),
    col("Enumeration", "enumeration_uuid")
        .with(&[(NodeKind::Array, Some("named_enumerators_uuid"))]),
    col("Value", "value"),
    col("Length", "length"),
    col("Original", "original"),
    col("Description", "description"),
];

pub const CAN_COLUMNS: &[Column] = &[
    col("Name", "name"),
    col("Identifier", "identifier"),
    col("Extended", "extended"),
    col("Length", "length"),
    col("Cycle Time", "cycle_time"),
    col("Bits", "bits"),
    col("Start Bit", "start_bit"),
    col("Signed", "signed"),
    col("Factor", "factor"),
    col("Parameter", "parameter_uuid"),
    col("Enumeration", "enumeration_uuid"),
    col("Range First", "multiplexer_range_first"),
    col("Range Last", "multiplexer_range_last"),
    col("Comment", "comment"),
];

pub const SUNSPEC_COLUMNS: &[Column] = &[
    col("Name", "name"),
    col("Id", "id"),
    col("Length", "length"),
    col("Size", "size"),
    col("Offset", "offset"),
    col("Block Offset", "block_offset"),
    col("Type", "type_uuid"),
    col("Parameter", "parameter_uuid")
        .with(&[(NodeKind::SunSpecTable, Some("parameter_table_uuid"))]),
    col("Scale Factor", "factor_uuid"),
    col("Units", "units"),
    col("Mandatory", "mandatory"),
    col("Original", "original"),
];

pub const STATICMODBUS_COLUMNS: &[Column] = &[
    col("Name", "name"),
    col("Size", "size"),
    col("Offset", "offset"),
    col("Block Offset", "block_offset"),
    col("Type", "type_uuid"),
    col("Parameter", "parameter_uuid")
        .with(&[(NodeKind::ModbusTable, Some("parameter_table_uuid"))]),
    col("Scale Factor", "factor_uuid"),
    col("Units", "units"),
    col("Original", "original"),
];

pub const ANOMALY_COLUMNS: &[Column] = &[
    col("Name", "name"),
    col("Abbreviation", "abbreviation"),
    col("Code", "code"),
    col("Response Level Active", "response_level_active"),
    col("Response Level Inactive", "response_level_inactive"),
    col("Trigger Type", "trigger_type"),
    col("Parameter", "parameter_uuid"),
    col("Description", "description"),
    col("Comment", "comment"),
];

pub fn columns(tree: TreeKind) -> &'static [Column] {
    match tree {
        TreeKind::Parameters => PARAMETER_COLUMNS,
        TreeKind::Can => CAN_COLUMNS,
        TreeKind::SunSpec => SUNSPEC_COLUMNS,
        TreeKind::StaticModbus => STATICMODBUS_COLUMNS,
        TreeKind::Anomalies => ANOMALY_COLUMNS,
    }
}

/// Which attribute `column` of `tree`'s view shows for `kind`.
pub fn column_attribute(tree: TreeKind, column: usize, kind: NodeKind) -> Option<&'static AttrDescriptor> {
    columns(tree).get(column)?.attribute(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_resolves_per_kind() {
        let access = column_attribute(TreeKind::Parameters, 8, NodeKind::Parameter).expect("attr");
        assert_eq!(access.name, "access_level_uuid");

        let default_level =
            column_attribute(TreeKind::Parameters, 8, NodeKind::AccessLevels).expect("attr");
        assert_eq!(default_level.name, "default_access_level_uuid");

        // Enumerations have no access level.
        assert!(column_attribute(TreeKind::Parameters, 8, NodeKind::Enumeration).is_none());
        assert!(column_attribute(TreeKind::Parameters, 99, NodeKind::Parameter).is_none());
    }

    #[test]
    fn every_column_shows_something() {
        for tree in TreeKind::ALL {
            for column in columns(tree) {
                let shown = NodeKind::ALL
                    .iter()
                    .filter(|k| k.tree() == tree)
                    .any(|k| column.attribute(*k).is_some());
                assert!(shown, "{:?} column {} is never populated", tree, column.header);
            }
        }
    }
}
