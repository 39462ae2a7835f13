// crates/pmc-rs-export/src/sym/mod.rs
//! CAN tree to PCAN symbol file.

pub mod matrix;
pub mod writer;

use std::collections::BTreeMap;

use log::debug;
use pmc_rs::behavior::can::frame_length;
use pmc_rs::schema::kinds::can as kinds;
use pmc_rs::{Lookup, Models, Node, NodeKind, PmError, Tree};
use uuid::Uuid;

use self::matrix::{
    DISPLAY_DECIMAL_PLACES, Direction, Frame, GEN_MSG_CYCLE_TIME, GEN_SIG_START_VALUE, HEXADECIMAL_OUTPUT,
    LONG_NAME, Matrix, Mux, Selector, Signal,
};
use crate::error::{ExportError, Result};
use crate::names::c_identifier;
use crate::registry::{BuildContext, BuilderRegistry};

pub use writer::write_sym;

struct SymContext<'a> {
    tree: &'a Tree,
    lookup: Lookup<'a>,
}

impl BuildContext for SymContext<'_> {
    fn tree(&self) -> &Tree {
        self.tree
    }
}

/// What one CAN node contributes to the matrix.
enum Part {
    Frames(Vec<Frame>),
    Frame(Frame),
    Muxes(Vec<Mux>),
    Signal(Signal),
}

type Registry<'a> = BuilderRegistry<SymContext<'a>, Part>;

fn registry<'a>() -> Registry<'a> {
    BuilderRegistry::new("sym")
        .with(NodeKind::CanRoot, root)
        .with(NodeKind::Message, message)
        .with(NodeKind::MultiplexedMessage, multiplexed_message)
        .with(NodeKind::MultiplexedMessageClone, clone)
        .with(NodeKind::Multiplexer, multiplexer)
        .with(NodeKind::CanTable, table)
        .with(NodeKind::Signal, signal)
}

fn typed<'n, T: pmc_rs::KindData>(node: &'n Node) -> Result<&'n T> {
    node.get::<T>().ok_or(ExportError::Model(PmError::NotFound(node.uuid)))
}

fn non_empty(text: &Option<String>) -> Option<String> {
    text.clone().filter(|t| !t.trim().is_empty())
}

fn cycle_attributes(cycle_time: Option<i64>) -> BTreeMap<&'static str, String> {
    cycle_time
        .map(|c| (GEN_MSG_CYCLE_TIME, c.to_string()))
        .into_iter()
        .collect()
}

fn root<'a>(ctx: &SymContext<'a>, node: &Node, registry: &Registry<'a>) -> Result<Part> {
    let mut frames = Vec::new();
    for part in registry.build_children(ctx, node)? {
        match part {
            Part::Frame(frame) => frames.push(frame),
            Part::Frames(more) => frames.extend(more),
            Part::Muxes(_) | Part::Signal(_) => {}
        }
    }
    Ok(Part::Frames(frames))
}

fn message<'a>(ctx: &SymContext<'a>, node: &Node, registry: &Registry<'a>) -> Result<Part> {
    let m = typed::<kinds::Message>(node)?;
    let mut frame = Frame {
        name: m.name.clone(),
        id: m.identifier,
        extended: m.extended,
        length: m.length,
        comment: non_empty(&m.comment),
        direction: Direction::from_flags(m.sendable, m.receivable),
        attributes: cycle_attributes(m.cycle_time),
        ..Default::default()
    };
    for part in registry.build_children(ctx, node)? {
        if let Part::Signal(signal) = part {
            frame.signals.push(signal);
        }
    }
    Ok(Part::Frame(frame))
}

fn multiplexed_message<'a>(ctx: &SymContext<'a>, node: &Node, registry: &Registry<'a>) -> Result<Part> {
    let m = typed::<kinds::MultiplexedMessage>(node)?;
    let mut frame = Frame {
        name: m.name.clone(),
        id: m.identifier,
        extended: m.extended,
        length: m.length,
        comment: non_empty(&m.comment),
        direction: Direction::from_flags(m.sendable, m.receivable),
        attributes: cycle_attributes(m.cycle_time),
        ..Default::default()
    };
    for part in registry.build_children(ctx, node)? {
        match part {
            Part::Signal(signal) if frame.selector.is_none() => {
                frame.selector = Some(Selector {
                    name: signal.name,
                    start_bit: signal.start_bit,
                    bits: signal.bits,
                });
            }
            Part::Signal(signal) => frame.signals.push(signal),
            Part::Muxes(muxes) => frame.muxes.extend(muxes),
            Part::Frame(_) | Part::Frames(_) => {}
        }
    }
    Ok(Part::Frame(frame))
}

/// The original multiplexed message re-emitted under the clone's identity.
fn clone<'a>(ctx: &SymContext<'a>, node: &Node, registry: &Registry<'a>) -> Result<Part> {
    let c = typed::<kinds::MultiplexedMessageClone>(node)?;
    let original = c.original.ok_or(ExportError::Model(PmError::NotFound(node.uuid)))?;
    let original = ctx.tree.node(original)?;
    match registry.build(ctx, original)? {
        Part::Frame(frame) => Ok(Part::Frame(Frame {
            name: c.name.clone(),
            id: c.identifier,
            extended: c.extended,
            ..frame
        })),
        _ => Ok(Part::Frames(Vec::new())),
    }
}

fn multiplexer<'a>(ctx: &SymContext<'a>, node: &Node, registry: &Registry<'a>) -> Result<Part> {
    let m = typed::<kinds::Multiplexer>(node)?;
    let mut mux = Mux {
        name: m.name.clone(),
        value: m.identifier,
        length: m.length,
        comment: non_empty(&m.comment),
        signals: Vec::new(),
    };
    for part in registry.build_children(ctx, node)? {
        if let Part::Signal(signal) = part {
            mux.signals.push(signal);
        }
    }
    Ok(Part::Muxes(vec![mux]))
}

/// Multiplexers of an expanded table; its reference signals are not laid out.
fn table<'a>(ctx: &SymContext<'a>, node: &Node, registry: &Registry<'a>) -> Result<Part> {
    let mut muxes = Vec::new();
    for child in ctx.tree.child_nodes(node.uuid) {
        if child.kind() != NodeKind::Multiplexer {
            continue;
        }
        if let Part::Muxes(more) = registry.build(ctx, child)? {
            muxes.extend(more);
        }
    }
    Ok(Part::Muxes(muxes))
}

/// The enumeration a signal's values are named by.
fn signal_enumeration(lookup: &Lookup, signal: &kinds::Signal) -> Option<Uuid> {
    signal.enumeration_uuid.or_else(|| {
        signal
            .parameter_uuid
            .and_then(|p| lookup.parameter_attribute(p, "enumeration_uuid"))
            .and_then(|v| v.as_uuid())
    })
}

fn enumeration_name(lookup: &Lookup, enumeration: Uuid) -> String {
    c_identifier(&lookup.name_of(enumeration))
}

/// Comment of a signal: the parameter's description (or comment), followed
/// by its access level in angle brackets.
fn signal_comment(lookup: &Lookup, parameter: Uuid) -> Option<String> {
    let text = lookup
        .parameter_str(parameter, "description")
        .filter(|d| !d.trim().is_empty())
        .or_else(|| lookup.parameter_str(parameter, "comment"))
        .filter(|d| !d.trim().is_empty());
    let level = lookup
        .parameter_attribute(parameter, "access_level_uuid")
        .and_then(|v| v.as_uuid())
        .map(|level| lookup.name_of(level))
        .filter(|name| !name.is_empty())
        .map(|name| format!("<{name}>"));
    match (text, level) {
        (Some(text), Some(level)) => Some(format!("{text} {level}")),
        (text, level) => text.or(level),
    }
}

fn signal<'a>(ctx: &SymContext<'a>, node: &Node, _: &Registry<'a>) -> Result<Part> {
    let s = typed::<kinds::Signal>(node)?;
    let length = frame_length(ctx.tree, node.uuid).unwrap_or(0);
    let last_bit = 8 * length - 1;
    if s.start_bit < 0 || s.start_bit + s.bits - 1 > last_bit {
        return Err(ExportError::SignalOutsideMessage {
            path: ctx.tree.name_path(node.uuid).join("/"),
            message_range: (0, last_bit),
            signal_range: (s.start_bit, s.start_bit + s.bits - 1),
        });
    }

    let lookup = &ctx.lookup;
    let mut out = Signal {
        name: s.name.clone(),
        start_bit: s.start_bit,
        bits: s.bits,
        signed: s.signed,
        factor: s.factor,
        enumeration: signal_enumeration(lookup, s).map(|e| enumeration_name(lookup, e)),
        ..Default::default()
    };

    let decimal = |p: Uuid, name: &str| lookup.parameter_attribute(p, name).and_then(|v| v.as_decimal());
    let hexadecimal = s.hexadecimal_output
        || s.parameter_uuid
            .and_then(|p| lookup.parameter_attribute(p, "display_hexadecimal"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
    if hexadecimal {
        out.attributes.insert(HEXADECIMAL_OUTPUT, "1".to_string());
    }

    if let Some(p) = s.parameter_uuid {
        out.unit = lookup.parameter_str(p, "units").filter(|u| !u.is_empty());
        out.minimum = decimal(p, "minimum");
        out.maximum = decimal(p, "maximum");
        out.comment = signal_comment(lookup, p);
        let long_name = lookup.name_of(p);
        if !long_name.is_empty() {
            out.attributes.insert(LONG_NAME, long_name);
        }
        if let Some(places) = lookup.parameter_attribute(p, "decimal_places").and_then(|v| v.as_integer()) {
            out.attributes.insert(DISPLAY_DECIMAL_PLACES, places.to_string());
        }
        if let Some(default) = decimal(p, "default") {
            let raw = if s.factor.is_zero() {
                default
            } else {
                default / s.factor
            };
            out.attributes
                .insert(GEN_SIG_START_VALUE, raw.round().normalize().to_string());
        }
    }
    Ok(Part::Signal(out))
}

/// Every enumeration referenced by a signal, keyed by its symbol name.
fn collate_enums(lookup: &Lookup, tree: &Tree) -> BTreeMap<String, Vec<(i64, String)>> {
    let mut enums = BTreeMap::new();
    for node in tree.nodes_of_kind(NodeKind::Signal) {
        let Some(enumeration) = node.get::<kinds::Signal>().and_then(|s| signal_enumeration(lookup, s)) else {
            continue;
        };
        let Some(owner) = lookup.tree_of(enumeration) else {
            continue;
        };
        let values = owner
            .child_nodes(enumeration)
            .map(|e| (e.attr("value").and_then(|v| v.as_integer()).unwrap_or(0), e.name()))
            .collect();
        enums.entry(enumeration_name(lookup, enumeration)).or_insert(values);
    }
    enums
}

/// The CAN tree as a matrix.
pub fn build_matrix(models: &Models, title: &str) -> Result<Matrix> {
    let tree = models.can.tree();
    let ctx = SymContext {
        tree,
        lookup: models.lookup(),
    };
    let frames = match registry().build(&ctx, tree.root_node())? {
        Part::Frames(frames) => frames,
        _ => Vec::new(),
    };
    debug!("Built CAN matrix with {} frames", frames.len());
    Ok(Matrix {
        title: title.to_string(),
        frames,
        enums: collate_enums(&ctx.lookup, tree),
    })
}

/// The CAN tree as `.sym` text.
pub fn export_sym(models: &Models, title: &str) -> Result<String> {
    let matrix = build_matrix(models, title)?;
    Ok(write_sym(&matrix)?)
}
