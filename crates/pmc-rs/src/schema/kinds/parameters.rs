// crates/pmc-rs/src/schema/kinds/parameters.rs
//! Kinds of the parameter tree.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::NodeKind;
use crate::schema::meta;

node_kind! {
    /// Top of the parameter tree.
    pub struct Root {
        name: String => meta("Name"),
    }
}

node_kind! {
    pub struct Group {
        name: String => meta("Name"),
        type_name: Option<String> => meta("Type Name"),
    }
}

node_kind! {
    /// An addressable configurable quantity of the device.
    pub struct Parameter {
        name: String => meta("Name"),
        abbreviation: Option<String> => meta("Abbreviation"),
        type_name: Option<String> => meta("Type Name"),
        units: Option<String> => meta("Units"),
        default: Option<Decimal> => meta("Default"),
        minimum: Option<Decimal> => meta("Minimum"),
        maximum: Option<Decimal> => meta("Maximum"),
        decimal_places: Option<i64> => meta("Decimal Places"),
        display_hexadecimal: bool => meta("Display Hexadecimal"),
        nv_format: Option<String> => meta("NV Format"),
        nv_factor: Option<String> => meta("NV Factor"),
        nv_cast: bool => meta("NV Cast"),
        read_only: bool => meta("Read Only"),
        access_level_uuid: Option<Uuid> =>
            meta("Access Level").refs(&[NodeKind::Enumerator]),
        enumeration_uuid: Option<Uuid> =>
            meta("Enumeration").refs(&[NodeKind::Enumeration, NodeKind::AccessLevels]),
        internal_variable: Option<String> => meta("Internal Variable"),
        internal_scale_factor: i64 => meta("Internal Scale Factor"),
        getter_function: Option<String> => meta("Getter Function"),
        setter_function: Option<String> => meta("Setter Function"),
        /// Parameters without an interface item are "legacy": the firmware
        /// reaches them through getter/setter functions and ignores access levels.
        uses_interface_item: bool => meta("Uses Interface Item"),
        description: Option<String> => meta("Description"),
        comment: Option<String> => meta("Comment"),
    }
}

node_kind! {
    /// Fixed-length, homogeneous sequence of parameters or groups.
    pub struct Array {
        name: String => meta("Name"),
        length: i64 => meta("Length"),
        named_enumerators_uuid: Option<Uuid> =>
            meta("Named Enumerators").refs(&[NodeKind::Enumeration]),
    }
}

node_kind! {
    /// Non-first element of a parameter array; shares semantics with `original`.
    pub struct ArrayParameterElement {
        name: String => meta("Name"),
        abbreviation: Option<String> => meta("Abbreviation"),
        default: Option<Decimal> => meta("Default"),
        access_level_uuid: Option<Uuid> =>
            meta("Access Level").refs(&[NodeKind::Enumerator]),
        original: Option<Uuid> =>
            meta("Original").refs(&[NodeKind::Parameter, NodeKind::ArrayParameterElement]),
    }
}

node_kind! {
    /// Non-first element of an array of groups.
    pub struct ArrayGroupElement {
        name: String => meta("Name"),
        original: Option<Uuid> => meta("Original").refs(&[NodeKind::Group]),
    }
}

node_kind! {
    /// Cartesian product of its axis enumerations times its arrays and groups.
    pub struct Table {
        name: String => meta("Name"),
    }
}

node_kind! {
    /// Generated grouping level of an expanded table.
    pub struct TableGroupElement {
        name: String => meta("Name"),
        path: Vec<Uuid> => meta("Path"),
        original: Option<Uuid> => meta("Original").refs(&[
            NodeKind::Enumerator,
            NodeKind::Array,
            NodeKind::Group,
            NodeKind::ArrayGroupElement,
        ]),
    }
}

node_kind! {
    /// Generated leaf of an expanded table: one concrete parameter.
    pub struct TableArrayElement {
        name: String => meta("Name"),
        abbreviation: Option<String> => meta("Abbreviation"),
        path: Vec<Uuid> => meta("Path"),
        curve_index: Option<i64> => meta("Curve Index"),
        original: Option<Uuid> => meta("Original").refs(&[
            NodeKind::Parameter,
            NodeKind::ArrayParameterElement,
        ]),
        access_level_uuid: Option<Uuid> =>
            meta("Access Level").refs(&[NodeKind::Enumerator]),
    }
}

node_kind! {
    pub struct Enumeration {
        name: String => meta("Name"),
    }
}

node_kind! {
    pub struct Enumerator {
        name: String => meta("Name"),
        abbreviation: Option<String> => meta("Abbreviation"),
        label: Option<String> => meta("Label"),
        description: Option<String> => meta("Description"),
        value: i64 => meta("Value"),
    }
}

node_kind! {
    /// Enumeration whose enumerators are operator access levels.
    pub struct AccessLevels {
        name: String => meta("Name"),
        default_access_level_uuid: Option<Uuid> =>
            meta("Default Access Level").refs(&[NodeKind::Enumerator]),
    }
}

/// Attributes of an array element that resolve through `original`.
pub const SHARED_ELEMENT_ATTRIBUTES: &[&str] = &[
    "type_name",
    "units",
    "nv_format",
    "nv_factor",
    "nv_cast",
    "minimum",
    "maximum",
    "decimal_places",
    "display_hexadecimal",
    "enumeration_uuid",
    "internal_scale_factor",
    "read_only",
    "uses_interface_item",
    "description",
];
