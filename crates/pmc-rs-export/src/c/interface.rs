// crates/pmc-rs-export/src/c/interface.rs
//! `interface.c` / `interface.h`: one interface item per parameter.

use pmc_rs::{Lookup, Node, NodeKind, Tree};

use super::CContext;
use crate::error::Result;
use crate::names::{c_identifier, interface_item, item_type, uses_interface_item};
use crate::nested::Nested;
use crate::registry::BuilderRegistry;
use crate::templates::CFile;

pub const SOURCE: &str = "interface.c";
pub const HEADER: &str = "interface.h";

/// Definition and declaration lines of one item.
#[derive(Debug, Default)]
pub struct Items {
    pub definitions: Vec<Nested>,
    pub declarations: Vec<Nested>,
}

impl Items {
    fn extend(&mut self, other: Items) {
        self.definitions.extend(other.definitions);
        self.declarations.extend(other.declarations);
    }
}

type Registry<'a> = BuilderRegistry<CContext<'a>, Items>;

fn registry<'a>() -> Registry<'a> {
    BuilderRegistry::new("interface")
        .with(NodeKind::Root, container)
        .with(NodeKind::Group, container)
        .with(NodeKind::Array, container)
        .with(NodeKind::ArrayGroupElement, container)
        .with(NodeKind::Table, container)
        .with(NodeKind::TableGroupElement, container)
        .with(NodeKind::Parameter, item)
        .with(NodeKind::ArrayParameterElement, item)
        .with(NodeKind::TableArrayElement, item)
        .with(NodeKind::Enumeration, nothing)
        .with(NodeKind::AccessLevels, nothing)
}

fn container<'a>(ctx: &CContext<'a>, node: &Node, registry: &Registry<'a>) -> Result<Items> {
    let mut items = Items::default();
    for child in registry.build_children(ctx, node)? {
        items.extend(child);
    }
    Ok(items)
}

fn nothing<'a>(_: &CContext<'a>, _: &Node, _: &Registry<'a>) -> Result<Items> {
    Ok(Items::default())
}

fn item<'a>(ctx: &CContext<'a>, node: &Node, _: &Registry<'a>) -> Result<Items> {
    let lookup = &ctx.lookup;
    if !uses_interface_item(lookup, node.uuid) {
        return Ok(Items::default());
    }
    let name = interface_item(lookup, node.uuid);
    let ty = format!("InterfaceItem_{}", item_type(lookup, node.uuid));
    let path = ctx.tree.name_path(node.uuid).join("/");

    let access_level = lookup
        .parameter_attribute(node.uuid, "access_level_uuid")
        .and_then(|v| v.as_uuid())
        .and_then(|u| lookup.node(u))
        .and_then(|level| level.attr("value"))
        .and_then(|v| v.as_integer())
        .unwrap_or(0);
    let scale = lookup
        .parameter_attribute(node.uuid, "internal_scale_factor")
        .and_then(|v| v.as_integer())
        .unwrap_or(0);
    let variable = node
        .attr("internal_variable")
        .and_then(|v| v.as_str().map(str::to_string))
        .filter(|v| !v.is_empty());
    let function = |attr: &str| {
        node.attr(attr)
            .and_then(|v| v.as_str().map(c_identifier))
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| "NULL".to_string())
    };

    let definitions = vec![
        Nested::line(format!("// {path}")),
        Nested::line(format!("{ty} {name} = {{")),
        Nested::Block(vec![
            Nested::line(".common = {"),
            Nested::Block(vec![
                Nested::line(format!(".accessLevel = {access_level},")),
                Nested::line(format!(".internalScaleFactor = {scale},")),
            ]),
            Nested::line("},"),
            Nested::line(format!(".variable = {},", super::address_or_null(variable))),
            Nested::line(format!(".getter = {},", function("getter_function"))),
            Nested::line(format!(".setter = {},", function("setter_function"))),
        ]),
        Nested::line("};"),
        Nested::blank(),
    ];
    Ok(Items {
        definitions,
        declarations: vec![Nested::line(format!("extern {ty} {name};"))],
    })
}

pub fn generate(lookup: &Lookup, tree: &Tree) -> Result<[CFile; 2]> {
    let ctx = CContext {
        tree,
        lookup: lookup.with(tree),
    };
    let items = registry().build(&ctx, tree.root_node())?;

    let mut source = CFile::new(SOURCE).include(HEADER);
    source.body = items.definitions;
    let mut header = CFile::new(HEADER).include("<stdint.h>").include("interfaceTypes.h");
    header.body = items.declarations;
    Ok([source, header])
}
