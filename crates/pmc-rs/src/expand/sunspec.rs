// crates/pmc-rs/src/expand/sunspec.rs
//! SunSpec view family: reference points and repeating blocks.

use uuid::Uuid;

use super::engine::ViewFamily;
use super::shape::{Leaf, SeedSource};
use crate::error::PmError;
use crate::layout;
use crate::schema::kinds::sunspec::{DataPoint, SunSpecTable, TableRepeatingBlock};
use crate::schema::{KindData, NodeData, NodeKind};
use crate::tree::Tree;

pub struct SunSpecFamily;

impl ViewFamily for SunSpecFamily {
    const VIEW: NodeKind = NodeKind::SunSpecTable;
    const POINT: NodeKind = NodeKind::DataPoint;
    const GROUP: NodeKind = NodeKind::TableRepeatingBlock;

    fn table_of(&self, view: &NodeData) -> Option<Uuid> {
        SunSpecTable::from_data(view).and_then(|v| v.parameter_table_uuid)
    }

    fn new_seed(&self, source: &SeedSource) -> NodeData {
        DataPoint {
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
        TableRepeatingBlock {
            name: name.to_string(),
            path: path.to_vec(),
            offset: 0,
        }
        .into()
    }

    fn leaf(&self, leaf: &Leaf, seed: &NodeData, _position: i64) -> NodeData {
        let seed = DataPoint::from_data(seed).cloned().unwrap_or_default();
        DataPoint {
            name: seed.name,
            parameter_uuid: Some(leaf.uuid),
            factor_uuid: seed.factor_uuid,
            type_uuid: seed.type_uuid,
            size: seed.size,
            units: seed.units,
            mandatory: seed.mandatory,
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
