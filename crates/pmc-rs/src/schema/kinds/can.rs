// crates/pmc-rs/src/schema/kinds/can.rs
//! Kinds of the CAN tree.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::NodeKind;
use crate::schema::meta;

/// Kinds a signal's `parameter_uuid` may resolve to.
pub const SIGNAL_SOURCES: &[NodeKind] = &[
    NodeKind::Parameter,
    NodeKind::ArrayParameterElement,
    NodeKind::TableArrayElement,
    NodeKind::Array,
];

node_kind! {
    pub struct CanRoot {
        name: String => meta("Name"),
    }
}

node_kind! {
    pub struct Message {
        name: String => meta("Name"),
        identifier: i64 => meta("Identifier").hex(),
        extended: bool => meta("Extended"),
        length: i64 => meta("Length"),
        cycle_time: Option<i64> => meta("Cycle Time"),
        sendable: bool => meta("Sendable"),
        receivable: bool => meta("Receivable"),
        comment: Option<String> => meta("Comment"),
    }
}

node_kind! {
    /// Message whose first signal selects one of its multiplexers.
    pub struct MultiplexedMessage {
        name: String => meta("Name"),
        identifier: i64 => meta("Identifier").hex(),
        extended: bool => meta("Extended"),
        length: i64 => meta("Length"),
        cycle_time: Option<i64> => meta("Cycle Time"),
        sendable: bool => meta("Sendable"),
        receivable: bool => meta("Receivable"),
        comment: Option<String> => meta("Comment"),
    }
}

node_kind! {
    pub struct Multiplexer {
        name: String => meta("Name"),
        identifier: i64 => meta("Identifier").hex(),
        length: i64 => meta("Length"),
        cycle_time: Option<i64> => meta("Cycle Time"),
        comment: Option<String> => meta("Comment"),
        path: Vec<Uuid> => meta("Path"),
    }
}

node_kind! {
    /// A bit range of a frame carrying one parameter's value.
    pub struct Signal {
        name: String => meta("Name"),
        bits: i64 => meta("Bits"),
        signed: bool => meta("Signed"),
        factor: Decimal => meta("Factor"),
        start_bit: i64 => meta("Start Bit"),
        hexadecimal_output: bool => meta("Hexadecimal Output"),
        enumeration_uuid: Option<Uuid> =>
            meta("Enumeration").refs(&[NodeKind::Enumeration, NodeKind::AccessLevels]),
        parameter_uuid: Option<Uuid> => meta("Parameter").refs(SIGNAL_SOURCES),
    }
}

node_kind! {
    /// View of a parameter table inside a multiplexed message.
    pub struct CanTable {
        name: String => meta("Name"),
        parameter_uuid: Option<Uuid> => meta("Parameter Table").refs(&[NodeKind::Table]),
        multiplexer_range_first: i64 => meta("Multiplexer Range First").hex(),
        multiplexer_range_last: i64 => meta("Multiplexer Range Last").hex(),
    }
}

node_kind! {
    /// Re-emits another multiplexed message under its own identifier.
    pub struct MultiplexedMessageClone {
        name: String => meta("Name"),
        identifier: i64 => meta("Identifier").hex(),
        extended: bool => meta("Extended"),
        original: Option<Uuid> => meta("Original").refs(&[NodeKind::MultiplexedMessage]),
    }
}
