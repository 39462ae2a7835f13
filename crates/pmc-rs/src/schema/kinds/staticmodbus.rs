// crates/pmc-rs/src/schema/kinds/staticmodbus.rs
//! Kinds of the static Modbus tree.

use uuid::Uuid;

use super::NodeKind;
use super::can::SIGNAL_SOURCES;
use crate::schema::meta;

node_kind! {
    pub struct StaticModbusRoot {}
}

node_kind! {
    pub struct FunctionData {
        name: String => meta("Name"),
        parameter_uuid: Option<Uuid> => meta("Parameter").refs(SIGNAL_SOURCES),
        factor_uuid: Option<Uuid> => meta("Scale Factor").refs(&[NodeKind::FunctionData]),
        type_uuid: Option<Uuid> => meta("Type").refs(&[NodeKind::Enumerator]),
        size: i64 => meta("Size"),
        block_offset: i64 => meta("Block Offset"),
        units: Option<String> => meta("Units"),
        not_implemented: bool => meta("Not Implemented"),
        hand_coded_getter: bool => meta("Hand Coded Getter"),
        hand_coded_setter: bool => meta("Hand Coded Setter"),
    }
}

node_kind! {
    pub struct FunctionDataBitfield {
        name: String => meta("Name"),
        parameter_uuid: Option<Uuid> => meta("Parameter").refs(SIGNAL_SOURCES),
        type_uuid: Option<Uuid> => meta("Type").refs(&[NodeKind::Enumerator]),
        size: i64 => meta("Size"),
        block_offset: i64 => meta("Block Offset"),
    }
}

node_kind! {
    pub struct FunctionDataBitfieldMember {
        name: String => meta("Name"),
        parameter_uuid: Option<Uuid> => meta("Parameter").refs(SIGNAL_SOURCES),
        bit_offset: i64 => meta("Bit Offset"),
        bit_length: i64 => meta("Bit Length"),
    }
}

node_kind! {
    pub struct ModbusTable {
        parameter_table_uuid: Option<Uuid> =>
            meta("Parameter Table").refs(&[NodeKind::Table]),
    }
}

node_kind! {
    pub struct ModbusTableRepeatingBlock {
        name: String => meta("Name"),
        path: Vec<Uuid> => meta("Path"),
        offset: i64 => meta("Offset"),
    }
}

node_kind! {
    pub struct ModbusTableRepeatingBlockReference {
        original: Option<Uuid> =>
            meta("Original").refs(&[NodeKind::ModbusTableRepeatingBlock]),
        block_offset: i64 => meta("Block Offset"),
        size: i64 => meta("Size"),
    }
}
