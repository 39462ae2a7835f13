// crates/pmc-rs/src/json.rs
//! Canonical JSON form of trees.
//!
//! Key order is `_type`, persisted attributes in declaration order, `uuid`,
//! then `children` for kinds that can have children. Loading is strict:
//! unknown `_type` tags, unknown keys, missing required attributes and type
//! mismatches abort with a [`SchemaError`] naming the JSON path.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{PmError, SchemaError, SchemaErrorKind};
use crate::schema::{AttrValue, NodeData, NodeKind, TreeKind};
use crate::tree::{Subtree, Tree};

// --- Writing ---

/// JSON value of `uuid` and its descendants.
pub fn node_to_value(tree: &Tree, uuid: Uuid) -> Result<Value, PmError> {
    let node = tree.node(uuid)?;
    let kind = node.kind();
    let mut map = Map::new();
    map.insert("_type".into(), Value::String(kind.tag().into()));
    for d in kind.descriptors().iter().filter(|d| d.persisted()) {
        let value = node.data.get(d.name).unwrap_or(AttrValue::Null);
        map.insert(d.name.into(), value.to_json());
    }
    map.insert("uuid".into(), Value::String(uuid.hyphenated().to_string()));
    if kind.has_children() {
        let children = node
            .children
            .iter()
            .map(|c| node_to_value(tree, *c))
            .collect::<Result<Vec<_>, _>>()?;
        map.insert("children".into(), Value::Array(children));
    }
    Ok(Value::Object(map))
}

pub fn tree_to_value(tree: &Tree) -> Result<Value, PmError> {
    node_to_value(tree, tree.root())
}

/// Pretty form with four-space indentation, as written to model files.
pub fn to_pretty_string<T: Serialize + ?Sized>(value: &T) -> Result<String, PmError> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn to_json_string(tree: &Tree) -> Result<String, PmError> {
    to_pretty_string(&tree_to_value(tree)?)
}

/// Single-line canonical form.
pub fn to_compact_string(tree: &Tree) -> Result<String, PmError> {
    Ok(serde_json::to_string(&tree_to_value(tree)?)?)
}

// --- Reading ---

/// A decoded node whose UUID may still be unassigned.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub uuid: Option<Uuid>,
    pub data: NodeData,
    pub children: Vec<RawNode>,
}

impl RawNode {
    /// Converts into a [`Subtree`]. Call [`check_uuids`] first so that no
    /// slot is empty; any that still is gets a fresh UUID here.
    pub fn into_subtree(self) -> Subtree {
        Subtree {
            uuid: self.uuid.unwrap_or_else(Uuid::new_v4),
            data: self.data,
            children: self.children.into_iter().map(RawNode::into_subtree).collect(),
        }
    }
}

/// Decodes a JSON document into a raw tree of `tree` kinds.
pub fn parse_raw(text: &str, tree: TreeKind) -> Result<RawNode, PmError> {
    let value: Value = serde_json::from_str(text)?;
    let raw = raw_from_value(&value, tree, "$")?;
    if raw.data.kind() != tree.root_kind() {
        return Err(SchemaError::new(
            SchemaErrorKind::UnknownKind,
            raw.uuid,
            "$",
            format!(
                "expected `{}` at the top of the {} tree",
                tree.root_kind().tag(),
                tree.name()
            ),
        )
        .into());
    }
    Ok(raw)
}

pub fn raw_from_value(value: &Value, tree: TreeKind, path: &str) -> Result<RawNode, SchemaError> {
    let object = value.as_object().ok_or_else(|| {
        SchemaError::new(SchemaErrorKind::TypeMismatch, None, path, "expected an object")
    })?;

    // 1. Identity first, so every later error can name the node.
    let uuid = match object.get("uuid") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(Uuid::parse_str(s).map_err(|_| {
            SchemaError::new(SchemaErrorKind::TypeMismatch, None, path, format!("uuid: {s:?}"))
        })?),
        Some(other) => {
            return Err(SchemaError::new(
                SchemaErrorKind::TypeMismatch,
                None,
                path,
                format!("uuid: {other}"),
            ));
        }
    };

    // 2. Discriminator.
    let tag = object.get("_type").and_then(Value::as_str).ok_or_else(|| {
        SchemaError::new(SchemaErrorKind::UnknownKind, uuid, path, "missing `_type`")
    })?;
    let kind = NodeKind::from_tag(tag)
        .filter(|k| k.tree() == tree)
        .ok_or_else(|| {
            SchemaError::new(
                SchemaErrorKind::UnknownKind,
                uuid,
                path,
                format!("`{tag}` is not a {} kind", tree.name()),
            )
        })?;

    // 3. Reject keys the kind does not declare.
    for key in object.keys() {
        let known = matches!(key.as_str(), "_type" | "uuid")
            || (key == "children" && kind.has_children())
            || kind
                .descriptor(key)
                .is_some_and(|d| d.persisted());
        if !known {
            return Err(SchemaError::new(
                SchemaErrorKind::UnknownAttribute,
                uuid,
                path,
                format!("`{key}` on {tag}"),
            ));
        }
    }

    // 4. Attributes.
    let mut data = kind.default_data();
    for d in kind.descriptors().iter().filter(|d| d.persisted()) {
        let value = match object.get(d.name) {
            Some(v) => AttrValue::from_json(v, &d.ty).ok_or_else(|| {
                SchemaError::new(
                    SchemaErrorKind::TypeMismatch,
                    uuid,
                    path,
                    format!("{}: expected {}, got {v}", d.name, d.ty.name()),
                )
            })?,
            None => d.ty.missing_value().ok_or_else(|| {
                SchemaError::new(SchemaErrorKind::AttributeMissing, uuid, path, d.name)
            })?,
        };
        data.set(d.name, value).map_err(|e| {
            SchemaError::new(SchemaErrorKind::TypeMismatch, uuid, path, e.to_string())
        })?;
    }

    // 5. Children.
    let mut children = Vec::new();
    match object.get("children") {
        None => {}
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                let child_path = format!("{path}.children[{i}]");
                let child = raw_from_value(item, tree, &child_path)?;
                if !kind.allows_child(child.data.kind()) {
                    return Err(SchemaError::new(
                        SchemaErrorKind::InvalidChild,
                        child.uuid,
                        &child_path,
                        format!("{} under {tag}", child.data.kind().tag()),
                    ));
                }
                children.push(child);
            }
        }
        Some(other) => {
            return Err(SchemaError::new(
                SchemaErrorKind::TypeMismatch,
                uuid,
                path,
                format!("children: expected an array, got {other}"),
            ));
        }
    }

    Ok(RawNode {
        uuid,
        data,
        children,
    })
}

/// Ensures every UUID in `root` is unique across `root` and `others`, then
/// fills empty slots with fresh UUIDs. Existing UUIDs are never changed.
pub fn check_uuids(root: &mut RawNode, others: &[&Tree]) -> Result<(), SchemaError> {
    let mut seen: HashSet<Uuid> = others
        .iter()
        .flat_map(|t| t.iter().map(|n| n.uuid))
        .collect();
    collect_uuids(root, "$", &mut seen)?;
    fill_uuids(root, &mut seen);
    Ok(())
}

fn collect_uuids(node: &RawNode, path: &str, seen: &mut HashSet<Uuid>) -> Result<(), SchemaError> {
    if let Some(uuid) = node.uuid {
        if !seen.insert(uuid) {
            return Err(SchemaError::new(
                SchemaErrorKind::DuplicateUuid,
                Some(uuid),
                path,
                "uuid already used by another node",
            ));
        }
    }
    for (i, child) in node.children.iter().enumerate() {
        collect_uuids(child, &format!("{path}.children[{i}]"), seen)?;
    }
    Ok(())
}

fn fill_uuids(node: &mut RawNode, seen: &mut HashSet<Uuid>) {
    if node.uuid.is_none() {
        let mut fresh = Uuid::new_v4();
        while !seen.insert(fresh) {
            fresh = Uuid::new_v4();
        }
        node.uuid = Some(fresh);
    }
    for child in &mut node.children {
        fill_uuids(child, seen);
    }
}

/// Loads a tree, checking UUIDs against the already loaded `others`.
pub fn from_json_string(text: &str, tree: TreeKind, others: &[&Tree]) -> Result<Tree, PmError> {
    let mut raw = parse_raw(text, tree)?;
    check_uuids(&mut raw, others)?;
    Tree::new(tree, raw.into_subtree())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT_UUID: &str = "b9a6c1a0-3f1e-4a5c-9d2e-1f0a2b3c4d5e";

    #[test]
    fn compact_round_trip_is_byte_identical() {
        let input = format!(r#"{{"_type":"root","name":"Parameters","uuid":"{ROOT_UUID}","children":[]}}"#);
        let tree = from_json_string(&input, TreeKind::Parameters, &[]).expect("load");
        assert_eq!(to_compact_string(&tree).expect("dump"), input);
    }

    #[test]
    fn unknown_kind_is_rejected_with_path() {
        let input = format!(
            r#"{{"_type":"root","name":"P","uuid":"{ROOT_UUID}","children":[{{"_type":"gadget"}}]}}"#
        );
        let result = from_json_string(&input, TreeKind::Parameters, &[]);
        match result {
            Err(PmError::Schema(e)) => {
                assert_eq!(e.kind, SchemaErrorKind::UnknownKind);
                assert_eq!(e.path, "$.children[0]");
            }
            other => panic!("Expected UnknownKind, got {:?}", other),
        }
    }

    #[test]
    fn kind_from_another_tree_is_unknown() {
        let input = r#"{"_type":"can_root","name":"CAN","children":[]}"#;
        let result = from_json_string(input, TreeKind::Parameters, &[]);
        assert!(
            matches!(&result, Err(PmError::Schema(e)) if e.kind == SchemaErrorKind::UnknownKind),
            "got {:?}",
            result
        );
    }

    #[test]
    fn unknown_field_is_a_hard_error() {
        let input = r#"{"_type":"root","name":"P","colour":"red","children":[]}"#;
        let result = from_json_string(input, TreeKind::Parameters, &[]);
        assert!(
            matches!(&result, Err(PmError::Schema(e)) if e.kind == SchemaErrorKind::UnknownAttribute),
            "got {:?}",
            result
        );
    }

    #[test]
    fn missing_required_attribute() {
        let input = r#"{"_type":"root","children":[]}"#;
        let result = from_json_string(input, TreeKind::Parameters, &[]);
        assert!(
            matches!(&result, Err(PmError::Schema(e)) if e.kind == SchemaErrorKind::AttributeMissing),
            "got {:?}",
            result
        );
    }

    #[test]
    fn decimal_given_as_number_is_a_type_mismatch() {
        let input = r#"{"_type":"root","name":"P","children":[
            {"_type":"parameter","name":"x","default":1.5,"display_hexadecimal":false,
             "nv_cast":false,"read_only":false,"internal_scale_factor":0,"uses_interface_item":true}
        ]}"#;
        let result = from_json_string(input, TreeKind::Parameters, &[]);
        assert!(
            matches!(&result, Err(PmError::Schema(e)) if e.kind == SchemaErrorKind::TypeMismatch),
            "got {:?}",
            result
        );
    }

    #[test]
    fn duplicate_uuid_against_other_tree() {
        let params = from_json_string(
            &format!(r#"{{"_type":"root","name":"P","uuid":"{ROOT_UUID}","children":[]}}"#),
            TreeKind::Parameters,
            &[],
        )
        .expect("params");
        let can = format!(r#"{{"_type":"can_root","name":"CAN","uuid":"{ROOT_UUID}","children":[]}}"#);
        let result = from_json_string(&can, TreeKind::Can, &[&params]);
        assert!(
            matches!(&result, Err(PmError::Schema(e)) if e.kind == SchemaErrorKind::DuplicateUuid),
            "got {:?}",
            result
        );
    }

    #[test]
    fn missing_uuids_are_filled() {
        let input = r#"{"_type":"root","name":"P","children":[{"_type":"group","name":"g","children":[]}]}"#;
        let mut raw = parse_raw(input, TreeKind::Parameters).expect("parse");
        check_uuids(&mut raw, &[]).expect("check");
        assert!(raw.uuid.is_some());
        assert!(raw.children[0].uuid.is_some());
        assert_ne!(raw.uuid, raw.children[0].uuid);
    }

    #[test]
    fn transient_attributes_are_not_written() {
        let tree = Tree::empty(TreeKind::SunSpec);
        let text = to_json_string(&tree).expect("dump");
        assert!(text.contains("\"_type\": \"sunspec_root\""));
        assert!(text.starts_with("{\n    \"_type\""), "got {text}");
        assert!(!text.contains("\"offset\""));
    }
}
