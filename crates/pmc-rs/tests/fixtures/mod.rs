// crates/pmc-rs/tests/fixtures/mod.rs
//! Shared project builders for the integration tests.

#![allow(dead_code)]

use pmc_rs::schema::kinds::parameters::{
    AccessLevels, Array, ArrayParameterElement, Enumeration, Enumerator, Parameter, Root, Table,
};
use pmc_rs::{AttrValue, DropPayload, Model, Models, NodeKind, PointType, Subtree, Tree, TreeKind};
use uuid::Uuid;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn enumeration(name: &str, items: &[&str]) -> Subtree {
    items.iter().enumerate().fold(
        Subtree::new(Enumeration { name: name.into() }),
        |e, (value, item)| {
            e.child(Subtree::new(Enumerator {
                name: (*item).into(),
                value: value as i64,
                ..Default::default()
            }))
        },
    )
}

/// An array of `length` parameters named `name`, `name1`, `name2`, …
pub fn parameter_array(name: &str, length: usize) -> Subtree {
    let first = Subtree::new(Parameter {
        name: name.into(),
        uses_interface_item: true,
        ..Default::default()
    });
    let first_uuid = first.uuid;
    let mut array = Subtree::new(Array {
        name: name.into(),
        length: length as i64,
        named_enumerators_uuid: None,
    })
    .child(first);
    for index in 1..length {
        array = array.child(Subtree::new(ArrayParameterElement {
            name: format!("{name}{index}"),
            original: Some(first_uuid),
            ..Default::default()
        }));
    }
    array
}

/// A project whose parameter tree holds the point types, access levels, a
/// plain parameter and a `{Low, High} x {RideThrough, Trip}` curve table with
/// two four-point arrays.
pub struct Fixture {
    pub models: Models,
    pub table: Uuid,
    pub arrays: Vec<Uuid>,
    pub parameter: Uuid,
    pub factory: Uuid,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_table(
            vec![
                enumeration("Curve", &["Low", "High"]),
                enumeration("Kind", &["RideThrough", "Trip"]),
            ],
            vec![parameter_array("hertz", 4), parameter_array("seconds", 4)],
        )
    }

    /// A project whose table `Curves` has the given axes and arrays.
    pub fn with_table(axes: Vec<Subtree>, arrays: Vec<Subtree>) -> Self {
        let types = PointType::ALL
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>();
        let parameter = Subtree::new(Parameter {
            name: "MyParam".into(),
            abbreviation: Some("MP".into()),
            uses_interface_item: true,
            ..Default::default()
        });
        let parameter_uuid = parameter.uuid;
        let factory = Subtree::new(Enumerator {
            name: "factory".into(),
            value: 1,
            ..Default::default()
        });
        let factory_uuid = factory.uuid;
        let access = Subtree::new(AccessLevels {
            name: "AccessLevels".into(),
            default_access_level_uuid: None,
        })
        .child(Subtree::new(Enumerator {
            name: "user".into(),
            value: 0,
            ..Default::default()
        }))
        .child(factory);

        let array_uuids: Vec<Uuid> = arrays.iter().map(|a| a.uuid).collect();
        let table = axes
            .into_iter()
            .chain(arrays)
            .fold(Subtree::new(Table { name: "Curves".into() }), Subtree::child);
        let table_uuid = table.uuid;

        let root = Subtree::new(Root {
            name: "Parameters".into(),
        })
        .child(enumeration(pmc_rs::layout::POINT_TYPES_ENUMERATION, &types))
        .child(access)
        .child(parameter)
        .child(table);
        let tree = Tree::new(TreeKind::Parameters, root).expect("parameter tree");

        let mut models = Models::new();
        models.parameters = Model::new(tree);
        models.register_drop_sources().expect("drop sources");
        Self {
            models,
            table: table_uuid,
            arrays: array_uuids,
            parameter: parameter_uuid,
            factory: factory_uuid,
        }
    }

    pub fn point_type(&self, point_type: PointType) -> Uuid {
        pmc_rs::layout::point_type_uuid(&self.models.lookup(), point_type).expect("point type")
    }

    pub fn drop(&mut self, tree: TreeKind, source: Uuid, target: Uuid) -> Uuid {
        let payload = DropPayload::new(source).encode();
        self.models.drop(tree, &payload, target, None).expect("drop")
    }

    /// A multiplexed message with its selector signal.
    pub fn multiplexed_message(&mut self) -> Uuid {
        let root = self.models.can.root();
        let message = self
            .models
            .add_child(TreeKind::Can, root, NodeKind::MultiplexedMessage)
            .expect("message");
        self.models
            .add_child(TreeKind::Can, message, NodeKind::Signal)
            .expect("selector");
        message
    }

    /// A `CanTable` for the curve table with both reference signals set to `bits`.
    pub fn can_table(&mut self, bits: i64) -> Uuid {
        let message = self.multiplexed_message();
        let view = self.drop(TreeKind::Can, self.table, message);
        let seeds: Vec<Uuid> = self
            .models
            .can
            .tree()
            .child_nodes(view)
            .filter(|n| n.kind() == NodeKind::Signal)
            .map(|n| n.uuid)
            .collect();
        for seed in seeds {
            self.models
                .can
                .set_attribute(seed, "bits", AttrValue::Integer(bits))
                .expect("bits");
        }
        view
    }

    /// A SunSpec model holding a table view of the curve table whose
    /// reference points are typed `uint16`.
    pub fn sunspec_table(&mut self) -> (Uuid, Uuid) {
        let root = self.models.sunspec.root();
        let model = self
            .models
            .add_child(TreeKind::SunSpec, root, NodeKind::SunSpecModel)
            .expect("model");
        let view = self.drop(TreeKind::SunSpec, self.table, model);
        let uint16 = self.point_type(PointType::Uint16);
        let seeds: Vec<Uuid> = self.models.sunspec.tree().children(view).to_vec();
        for seed in seeds {
            self.models
                .sunspec
                .set_attribute(seed, "type_uuid", AttrValue::Uuid(uint16))
                .expect("type");
        }
        (model, view)
    }
}
