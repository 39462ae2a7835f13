// crates/pmc-rs/src/schema/kinds/mod.rs
//! Node kinds of every tree and the registry that ties them together.

pub mod anomalies;
pub mod can;
pub mod parameters;
pub mod staticmodbus;
pub mod sunspec;

use anomalies::*;
use can::*;
use parameters::*;
use staticmodbus::*;
use sunspec::*;

/// The five cooperating trees of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TreeKind {
    Parameters,
    Can,
    SunSpec,
    StaticModbus,
    Anomalies,
}

impl TreeKind {
    pub const ALL: [TreeKind; 5] = [
        TreeKind::Parameters,
        TreeKind::Can,
        TreeKind::SunSpec,
        TreeKind::StaticModbus,
        TreeKind::Anomalies,
    ];

    /// Name used as the key in the project file's `paths` map.
    pub fn name(self) -> &'static str {
        match self {
            TreeKind::Parameters => "parameters",
            TreeKind::Can => "can",
            TreeKind::SunSpec => "sunspec",
            TreeKind::StaticModbus => "staticmodbus",
            TreeKind::Anomalies => "anomalies",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        TreeKind::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn root_kind(self) -> NodeKind {
        match self {
            TreeKind::Parameters => NodeKind::Root,
            TreeKind::Can => NodeKind::CanRoot,
            TreeKind::SunSpec => NodeKind::SunSpecRoot,
            TreeKind::StaticModbus => NodeKind::StaticModbusRoot,
            TreeKind::Anomalies => NodeKind::AnomaliesRoot,
        }
    }

    /// Default file name used when a project is created from scratch.
    pub fn default_file_name(self) -> String {
        format!("{}.json", self.name())
    }
}

/// Typed access to one variant of [`NodeData`].
pub trait KindData: Sized {
    const KIND: NodeKind;
    fn from_data(data: &NodeData) -> Option<&Self>;
    fn from_data_mut(data: &mut NodeData) -> Option<&mut Self>;
    fn into_data(self) -> NodeData;
}

node_registry! {
    Parameters {
        Root(Root) = "root",
        Group(Group) = "group",
        Parameter(Parameter) = "parameter",
        Array(Array) = "array",
        ArrayParameterElement(ArrayParameterElement) = "array_parameter_element",
        ArrayGroupElement(ArrayGroupElement) = "array_group_element",
        Table(Table) = "table",
        TableGroupElement(TableGroupElement) = "table_group_element",
        TableArrayElement(TableArrayElement) = "table_array_element",
        Enumeration(Enumeration) = "enumeration",
        Enumerator(Enumerator) = "enumerator",
        AccessLevels(AccessLevels) = "access_levels",
    }
    Can {
        CanRoot(CanRoot) = "can_root",
        Message(Message) = "message",
        MultiplexedMessage(MultiplexedMessage) = "multiplexed_message",
        Multiplexer(Multiplexer) = "multiplexer",
        Signal(Signal) = "signal",
        CanTable(CanTable) = "can_table",
        MultiplexedMessageClone(MultiplexedMessageClone) = "multiplexed_message_clone",
    }
    SunSpec {
        SunSpecRoot(SunSpecRoot) = "sunspec_root",
        SunSpecModel(SunSpecModel) = "sunspec_model",
        HeaderBlock(HeaderBlock) = "sunspec_header_block",
        FixedBlock(FixedBlock) = "sunspec_fixed_block",
        DataPoint(DataPoint) = "sunspec_data_point",
        DataPointBitfield(DataPointBitfield) = "sunspec_data_point_bitfield",
        DataPointBitfieldMember(DataPointBitfieldMember) = "sunspec_data_point_bitfield_member",
        SunSpecTable(SunSpecTable) = "sunspec_table",
        TableRepeatingBlock(TableRepeatingBlock) = "sunspec_table_repeating_block",
        TableRepeatingBlockReference(TableRepeatingBlockReference) =
            "sunspec_table_repeating_block_reference",
        TableRepeatingBlockReferenceDataPointReference(TableRepeatingBlockReferenceDataPointReference) =
            "sunspec_table_repeating_block_reference_data_point_reference",
    }
    StaticModbus {
        StaticModbusRoot(StaticModbusRoot) = "staticmodbus_root",
        FunctionData(FunctionData) = "staticmodbus_function_data",
        FunctionDataBitfield(FunctionDataBitfield) = "staticmodbus_function_data_bitfield",
        FunctionDataBitfieldMember(FunctionDataBitfieldMember) =
            "staticmodbus_function_data_bitfield_member",
        ModbusTable(ModbusTable) = "staticmodbus_table",
        ModbusTableRepeatingBlock(ModbusTableRepeatingBlock) = "staticmodbus_table_repeating_block",
        ModbusTableRepeatingBlockReference(ModbusTableRepeatingBlockReference) =
            "staticmodbus_table_repeating_block_reference",
    }
    Anomalies {
        AnomaliesRoot(AnomaliesRoot) = "anomalies_root",
        AnomalyTable(AnomalyTable) = "anomaly_table",
        Anomaly(Anomaly) = "anomaly",
        AnomalySource(AnomalySource) = "anomaly_source",
    }
}

/// Parameter-ish kinds: anything a view node may reference as its value.
pub const PARAMETER_LIKE: &[NodeKind] = &[
    NodeKind::Parameter,
    NodeKind::ArrayParameterElement,
    NodeKind::TableArrayElement,
];

impl NodeKind {
    /// Kinds allowed as children of this kind, in menu order.
    pub fn valid_children(self) -> &'static [NodeKind] {
        use NodeKind::*;
        match self {
            // Parameters
            Root | Group => &[Group, Parameter, Array, Table, Enumeration, AccessLevels],
            Array => &[Parameter, ArrayParameterElement, Group, ArrayGroupElement],
            ArrayGroupElement => &[ArrayParameterElement],
            Table => &[Enumeration, Array, Group, TableGroupElement],
            TableGroupElement => &[TableGroupElement, TableArrayElement],
            Enumeration | AccessLevels => &[Enumerator],
            Parameter | ArrayParameterElement | TableArrayElement | Enumerator => &[],
            // CAN
            CanRoot => &[Message, MultiplexedMessage, MultiplexedMessageClone],
            Message | Multiplexer => &[Signal],
            MultiplexedMessage => &[Signal, Multiplexer, CanTable],
            CanTable => &[Signal, Multiplexer],
            Signal | MultiplexedMessageClone => &[],
            // SunSpec
            SunSpecRoot => &[SunSpecModel],
            SunSpecModel => &[HeaderBlock, FixedBlock, SunSpecTable],
            HeaderBlock => &[DataPoint],
            FixedBlock => &[DataPoint, DataPointBitfield, TableRepeatingBlockReference],
            DataPointBitfield => &[DataPointBitfieldMember],
            SunSpecTable => &[DataPoint, TableRepeatingBlock],
            TableRepeatingBlock => &[DataPoint],
            TableRepeatingBlockReference => &[TableRepeatingBlockReferenceDataPointReference],
            DataPoint | DataPointBitfieldMember | TableRepeatingBlockReferenceDataPointReference => &[],
            // Static Modbus
            StaticModbusRoot => &[
                FunctionData,
                FunctionDataBitfield,
                ModbusTableRepeatingBlockReference,
                ModbusTable,
            ],
            FunctionDataBitfield => &[FunctionDataBitfieldMember],
            ModbusTable => &[FunctionData, ModbusTableRepeatingBlock],
            ModbusTableRepeatingBlock => &[FunctionData],
            FunctionData | FunctionDataBitfieldMember | ModbusTableRepeatingBlockReference => &[],
            // Anomalies
            AnomaliesRoot => &[AnomalyTable],
            AnomalyTable => &[Anomaly],
            Anomaly => &[AnomalySource],
            AnomalySource => &[],
        }
    }

    /// Whether serialized nodes of this kind carry a `children` key.
    pub fn has_children(self) -> bool {
        !self.valid_children().is_empty()
    }

    pub fn allows_child(self, child: NodeKind) -> bool {
        self.valid_children().contains(&child)
    }

    pub fn descriptor(self, name: &str) -> Option<&'static crate::schema::AttrDescriptor> {
        self.descriptors().iter().find(|d| d.name == name)
    }

    pub fn is_parameter_like(self) -> bool {
        PARAMETER_LIKE.contains(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_and_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for kind in NodeKind::ALL {
            assert!(seen.insert(kind.tag()), "duplicate tag {}", kind.tag());
            assert_eq!(NodeKind::from_tag(kind.tag()), Some(*kind));
        }
        assert_eq!(NodeKind::from_tag("no_such_kind"), None);
    }

    #[test]
    fn children_stay_inside_their_tree() {
        for kind in NodeKind::ALL {
            for child in kind.valid_children() {
                assert_eq!(kind.tree(), child.tree(), "{kind:?} -> {child:?}");
            }
        }
    }

    #[test]
    fn roots_belong_to_their_tree() {
        for tree in TreeKind::ALL {
            assert_eq!(tree.root_kind().tree(), tree);
            assert_eq!(TreeKind::from_name(tree.name()), Some(tree));
        }
    }

    #[test]
    fn descriptor_names_are_not_reserved_keys() {
        for kind in NodeKind::ALL {
            for d in kind.descriptors() {
                assert!(!matches!(d.name, "_type" | "uuid" | "children"), "{kind:?}.{}", d.name);
            }
        }
    }

    #[test]
    fn typed_access_through_kind_data() {
        let data = NodeKind::Signal.default_data();
        assert!(can::Signal::from_data(&data).is_some());
        assert!(parameters::Parameter::from_data(&data).is_none());
        assert_eq!(data.kind(), NodeKind::Signal);
    }
}
