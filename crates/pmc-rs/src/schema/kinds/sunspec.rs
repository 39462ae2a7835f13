// crates/pmc-rs/src/schema/kinds/sunspec.rs
//! Kinds of the SunSpec tree.

use uuid::Uuid;

use super::NodeKind;
use super::can::SIGNAL_SOURCES;
use crate::schema::meta;

node_kind! {
    pub struct SunSpecRoot {}
}

node_kind! {
    pub struct SunSpecModel {
        name: String => meta("Name"),
        id: i64 => meta("Id"),
        /// Registers after the header; recomputed on every structural change.
        length: i64 => meta("Length"),
    }
}

node_kind! {
    pub struct HeaderBlock {
        offset: i64 => meta("Offset"),
    }
}

node_kind! {
    pub struct FixedBlock {
        offset: i64 => meta("Offset"),
    }
}

node_kind! {
    pub struct DataPoint {
        name: String => meta("Name"),
        parameter_uuid: Option<Uuid> => meta("Parameter").refs(SIGNAL_SOURCES),
        factor_uuid: Option<Uuid> => meta("Scale Factor").refs(&[NodeKind::DataPoint]),
        type_uuid: Option<Uuid> => meta("Type").refs(&[NodeKind::Enumerator]),
        size: i64 => meta("Size"),
        block_offset: i64 => meta("Block Offset"),
        /// Absolute register offset inside the model.
        offset: i64 => meta("Offset").transient(),
        units: Option<String> => meta("Units"),
        mandatory: bool => meta("Mandatory"),
        not_implemented: bool => meta("Not Implemented"),
        hand_coded_getter: bool => meta("Hand Coded Getter"),
        hand_coded_setter: bool => meta("Hand Coded Setter"),
    }
}

node_kind! {
    pub struct DataPointBitfield {
        name: String => meta("Name"),
        parameter_uuid: Option<Uuid> => meta("Parameter").refs(SIGNAL_SOURCES),
        type_uuid: Option<Uuid> => meta("Type").refs(&[NodeKind::Enumerator]),
        size: i64 => meta("Size"),
        block_offset: i64 => meta("Block Offset"),
        offset: i64 => meta("Offset").transient(),
    }
}

node_kind! {
    pub struct DataPointBitfieldMember {
        name: String => meta("Name"),
        parameter_uuid: Option<Uuid> => meta("Parameter").refs(SIGNAL_SOURCES),
        bit_offset: i64 => meta("Bit Offset"),
        bit_length: i64 => meta("Bit Length"),
    }
}

node_kind! {
    /// View of a parameter table inside a SunSpec model.
    pub struct SunSpecTable {
        parameter_table_uuid: Option<Uuid> =>
            meta("Parameter Table").refs(&[NodeKind::Table]),
    }
}

node_kind! {
    pub struct TableRepeatingBlock {
        name: String => meta("Name"),
        path: Vec<Uuid> => meta("Path"),
        offset: i64 => meta("Offset"),
    }
}

node_kind! {
    /// Places a repeating block into a fixed block.
    pub struct TableRepeatingBlockReference {
        original: Option<Uuid> => meta("Original").refs(&[NodeKind::TableRepeatingBlock]),
        block_offset: i64 => meta("Block Offset"),
        offset: i64 => meta("Offset").transient(),
    }
}

node_kind! {
    pub struct TableRepeatingBlockReferenceDataPointReference {
        original: Option<Uuid> => meta("Original").refs(&[NodeKind::DataPoint]),
    }
}
