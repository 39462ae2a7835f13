// crates/pmc-rs/src/expand/can.rs
//! CAN view family: reference signals, multiplexers and packed leaf signals.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::engine::{Placed, ViewFamily, chunk_suffix};
use super::shape::{Leaf, SeedSource};
use crate::behavior::next_free;
use crate::error::PmError;
use crate::schema::kinds::can::{CanTable, Multiplexer, Signal};
use crate::schema::{KindData, NodeData, NodeKind};
use crate::tree::Tree;

/// Data bits of a multiplexed frame after the multiplexer id and header bytes.
pub const PAYLOAD_BITS: i64 = 48;
/// Bit just past the payload; leaves are packed downwards from here.
pub const PAYLOAD_END: i64 = 64;
/// Frame length of a generated multiplexer.
pub const MULTIPLEXER_LENGTH: i64 = 8;

pub struct CanFamily;

fn bits(seed: &NodeData) -> i64 {
    seed.get("bits").and_then(|v| v.as_integer()).unwrap_or(0)
}

impl ViewFamily for CanFamily {
    const VIEW: NodeKind = NodeKind::CanTable;
    const POINT: NodeKind = NodeKind::Signal;
    const GROUP: NodeKind = NodeKind::Multiplexer;

    fn table_of(&self, view: &NodeData) -> Option<Uuid> {
        CanTable::from_data(view).and_then(|v| v.parameter_uuid)
    }

    fn new_seed(&self, source: &SeedSource) -> NodeData {
        Signal {
            name: self.seed_name(source),
            factor: Decimal::ONE,
            parameter_uuid: Some(source.uuid),
            ..Default::default()
        }
        .into()
    }

    fn seed_ready(&self, seed: &NodeData) -> bool {
        bits(seed) > 0
    }

    fn seed_fits(&self, seed: &NodeData) -> bool {
        bits(seed) <= PAYLOAD_BITS
    }

    /// Packs leaves right-justified into the payload; a leaf that doesn't
    /// fit opens the next (overflow) multiplexer.
    fn pack(&self, seeds: &[&NodeData]) -> Vec<Vec<Placed>> {
        let mut chunks: Vec<Vec<Placed>> = Vec::new();
        let mut used = PAYLOAD_BITS;
        for (index, seed) in seeds.iter().enumerate() {
            let width = bits(seed);
            if used + width > PAYLOAD_BITS {
                chunks.push(Vec::new());
                used = 0;
            }
            used += width;
            if let Some(chunk) = chunks.last_mut() {
                chunk.push(Placed {
                    index,
                    position: PAYLOAD_END - used,
                });
            }
        }
        chunks
    }

    fn group(&self, name: &str, path: &[Uuid], chunk: usize, previous: Option<&NodeData>) -> NodeData {
        let previous = previous.and_then(Multiplexer::from_data);
        Multiplexer {
            name: format!("{name}{}", chunk_suffix(chunk)),
            identifier: previous.map_or(0, |p| p.identifier),
            length: MULTIPLEXER_LENGTH,
            cycle_time: previous.and_then(|p| p.cycle_time),
            comment: previous.and_then(|p| p.comment.clone()),
            path: path.to_vec(),
        }
        .into()
    }

    fn leaf(&self, leaf: &Leaf, seed: &NodeData, position: i64) -> NodeData {
        let seed = Signal::from_data(seed).cloned().unwrap_or_default();
        Signal {
            name: leaf.name.clone(),
            bits: seed.bits,
            signed: seed.signed,
            factor: seed.factor,
            start_bit: position,
            hexadecimal_output: seed.hexadecimal_output,
            enumeration_uuid: seed.enumeration_uuid,
            parameter_uuid: Some(leaf.uuid),
        }
        .into()
    }

    /// Gives each new multiplexer the next free identifier of the view's range.
    fn finish(&self, tree: &mut Tree, view: Uuid, created_groups: &[Uuid]) -> Result<(), PmError> {
        let range = tree
            .typed::<CanTable>(view)
            .map(|v| (v.multiplexer_range_first, v.multiplexer_range_last))
            .ok_or(PmError::NotFound(view))?;
        let message = tree.parent(view).ok_or(PmError::NotFound(view))?;
        let mut used: Vec<i64> = tree
            .descendants(message)
            .into_iter()
            .filter(|u| !created_groups.contains(u))
            .filter_map(|u| tree.typed::<Multiplexer>(u).map(|m| m.identifier))
            .collect();
        for group in created_groups {
            let id = next_free(used.iter().copied(), range.0, range.1)
                .ok_or_else(|| PmError::consistency("multiplexer id space exhausted"))?;
            used.push(id);
            if let Some(m) = tree.typed_mut::<Multiplexer>(*group) {
                m.identifier = id;
            }
        }
        Ok(())
    }
}
