// crates/pmc-rs-export/tests/common/mod.rs
#![allow(dead_code)]

use pmc_rs::layout::{PointType, point_type_uuid};
use pmc_rs::{AttrValue, DropPayload, Models, NodeKind, TreeKind};
use pmc_rs_export::smdx::ensure_point_types;
use uuid::Uuid;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn set(models: &mut Models, tree: TreeKind, uuid: Uuid, name: &str, value: impl Into<AttrValue>) {
    models
        .get_mut(tree)
        .set_attribute(uuid, name, value.into())
        .unwrap_or_else(|e| panic!("set {name}: {e}"));
}

pub fn add(models: &mut Models, tree: TreeKind, parent: Uuid, kind: NodeKind, name: &str) -> Uuid {
    let uuid = models.add_child(tree, parent, kind).expect("add child");
    if !name.is_empty() {
        set(models, tree, uuid, "name", name);
    }
    uuid
}

pub fn group(models: &mut Models, name: &str) -> Uuid {
    let root = models.parameters.root();
    add(models, TreeKind::Parameters, root, NodeKind::Group, name)
}

pub fn parameter(models: &mut Models, parent: Uuid, name: &str) -> Uuid {
    add(models, TreeKind::Parameters, parent, NodeKind::Parameter, name)
}

/// A `factory` access level under a new access-levels node.
pub fn factory_level(models: &mut Models) -> Uuid {
    let root = models.parameters.root();
    let levels = add(models, TreeKind::Parameters, root, NodeKind::AccessLevels, "AccessLevel");
    add(models, TreeKind::Parameters, levels, NodeKind::Enumerator, "user");
    add(models, TreeKind::Parameters, levels, NodeKind::Enumerator, "factory")
}

pub fn message(models: &mut Models, name: &str, length: i64) -> Uuid {
    let root = models.can.root();
    let message = add(models, TreeKind::Can, root, NodeKind::Message, name);
    set(models, TreeKind::Can, message, "length", length);
    message
}

pub fn signal(models: &mut Models, frame: Uuid, parameter: Uuid, start_bit: i64, bits: i64) -> Uuid {
    let payload = DropPayload::new(parameter).encode();
    let signal = models.drop(TreeKind::Can, &payload, frame, None).expect("drop signal");
    set(models, TreeKind::Can, signal, "start_bit", start_bit);
    set(models, TreeKind::Can, signal, "bits", bits);
    signal
}

/// A SunSpec model with its header; returns the model and its fixed block.
pub fn sunspec_model(models: &mut Models, name: &str, id: i64) -> (Uuid, Uuid) {
    ensure_point_types(models).expect("point types");
    let root = models.sunspec.root();
    let model = add(models, TreeKind::SunSpec, root, NodeKind::SunSpecModel, name);
    set(models, TreeKind::SunSpec, model, "id", id);
    let fixed = models
        .sunspec
        .tree()
        .child_nodes(model)
        .find(|n| n.kind() == NodeKind::FixedBlock)
        .map(|n| n.uuid)
        .expect("fixed block");
    (model, fixed)
}

pub fn data_point(models: &mut Models, block: Uuid, parameter: Uuid, point_type: PointType) -> Uuid {
    let payload = DropPayload::new(parameter).encode();
    let point = models.drop(TreeKind::SunSpec, &payload, block, None).expect("drop point");
    let type_uuid = point_type_uuid(&models.lookup(), point_type).expect("type enumerator");
    set(models, TreeKind::SunSpec, point, "type_uuid", type_uuid);
    set(models, TreeKind::SunSpec, point, "size", point_type.size().unwrap_or(1));
    point
}

/// Parameters, a CAN message, a SunSpec model with a scale factor and an
/// anomaly, all linked together.
pub struct Device {
    pub models: Models,
    pub frequency: Uuid,
    pub current: Uuid,
    pub current_scale: Uuid,
    pub legacy: Uuid,
    pub factory: Uuid,
    pub status: Uuid,
    pub model: Uuid,
    pub current_point: Uuid,
    pub scale_point: Uuid,
}

impl Device {
    pub fn new() -> Self {
        init_logging();
        let mut models = Models::new();
        let factory = factory_level(&mut models);
        let grid = group(&mut models, "Grid");
        let frequency = parameter(&mut models, grid, "Frequency");
        set(&mut models, TreeKind::Parameters, frequency, "abbreviation", "Hz");
        set(&mut models, TreeKind::Parameters, frequency, "units", "Hz");
        set(&mut models, TreeKind::Parameters, frequency, "description", "Grid frequency");
        set(&mut models, TreeKind::Parameters, frequency, "access_level_uuid", factory);
        let current = parameter(&mut models, grid, "Current");
        set(&mut models, TreeKind::Parameters, current, "abbreviation", "A");
        set(&mut models, TreeKind::Parameters, current, "units", "A");
        let current_scale = parameter(&mut models, grid, "Current Scale");
        set(&mut models, TreeKind::Parameters, current_scale, "abbreviation", "ISF");
        let legacy = parameter(&mut models, grid, "Legacy");
        set(&mut models, TreeKind::Parameters, legacy, "uses_interface_item", false);

        let status = message(&mut models, "Status", 2);
        signal(&mut models, status, frequency, 0, 16);

        let (model, fixed) = sunspec_model(&mut models, "inverter", 64100);
        let current_point = data_point(&mut models, fixed, current, PointType::Uint16);
        let scale_point = data_point(&mut models, fixed, current_scale, PointType::Sunssf);
        set(&mut models, TreeKind::SunSpec, current_point, "factor_uuid", scale_point);

        Self {
            models,
            frequency,
            current,
            current_scale,
            legacy,
            factory,
            status,
            model,
            current_point,
            scale_point,
        }
    }
}
