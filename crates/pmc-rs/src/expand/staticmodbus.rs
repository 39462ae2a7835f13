// crates/pmc-rs/src/expand/staticmodbus.rs
//! Static Modbus view family: mirrors SunSpec with function data.

use uuid::Uuid;

use super::engine::ViewFamily;
use super::shape::{Leaf, SeedSource};
use crate::error::PmError;
use crate::layout;
use crate::schema::kinds::staticmodbus::{FunctionData, ModbusTable, ModbusTableRepeatingBlock};
use crate::schema::{KindData, NodeData, NodeKind};
use crate::tree::Tree;

pub struct ModbusFamily;

impl ViewFamily for ModbusFamily {
    const VIEW: NodeKind = NodeKind::ModbusTable;
    const POINT: NodeKind = NodeKind::FunctionData;
    const GROUP: NodeKind = NodeKind::ModbusTableRepeatingBlock;

    fn table_of(&self, view: &NodeData) -> Option<Uuid> {
        ModbusTable::from_data(view).and_then(|v| v.parameter_table_uuid)
    }

    fn new_seed(&self, source: &SeedSource) -> NodeData {
        FunctionData {
            name: self.seed_name(source),
            parameter_uuid: Some(source.uuid),
            size: 1,
            ..Default::default()
        }
        .into()
    }

    fn seed_name(&self, source: &SeedSource) -> String {
        source.abbreviation.clone().unwrap_or_else(|| source.name.clone())
    }

    fn group(&self, name: &str, path: &[Uuid], _chunk: usize, _previous: Option<&NodeData>) -> NodeData {
        ModbusTableRepeatingBlock {
            name: name.to_string(),
            path: path.to_vec(),
            offset: 0,
        }
        .into()
    }

    fn leaf(&self, leaf: &Leaf, seed: &NodeData, _position: i64) -> NodeData {
        let seed = FunctionData::from_data(seed).cloned().unwrap_or_default();
        FunctionData {
            name: seed.name,
            parameter_uuid: Some(leaf.uuid),
            factor_uuid: seed.factor_uuid,
            type_uuid: seed.type_uuid,
            size: seed.size,
            units: seed.units,
            not_implemented: seed.not_implemented,
            hand_coded_getter: seed.hand_coded_getter,
            hand_coded_setter: seed.hand_coded_setter,
            ..Default::default()
        }
        .into()
    }

    fn finish(&self, tree: &mut Tree, _view: Uuid, _created_groups: &[Uuid]) -> Result<(), PmError> {
        layout::update_layout(tree)
    }
}
