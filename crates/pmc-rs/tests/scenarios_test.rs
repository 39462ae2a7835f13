// crates/pmc-rs/tests/scenarios_test.rs

mod fixtures;

use fixtures::Fixture;
use pmc_rs::expand::{self, ExpandOptions, ZeroBitsPolicy};
use pmc_rs::schema::kinds::can::{Multiplexer, Signal};
use pmc_rs::schema::kinds::staticmodbus::{FunctionData, ModbusTableRepeatingBlock};
use pmc_rs::schema::kinds::sunspec::{SunSpecModel, TableRepeatingBlock};
use pmc_rs::{Model, NodeKind, PmError, TreeKind, json};
use uuid::Uuid;

#[test]
fn parameter_root_round_trips_byte_for_byte() {
    let input = r#"{"_type":"root","name":"Parameters","uuid":"b9a6c1a0-3f1e-4a5c-9d2e-1f0a2b3c4d5e","children":[]}"#;
    let model = Model::from_json_string(input, TreeKind::Parameters, &[]).expect("load");
    assert_eq!(json::to_compact_string(model.tree()).expect("dump"), input);
}

#[test]
fn parameter_dropped_on_multiplexer_becomes_signal() {
    fixtures::init_logging();
    let mut fx = Fixture::new();
    let message = fx.multiplexed_message();
    let multiplexer = fx
        .models
        .add_child(TreeKind::Can, message, NodeKind::Multiplexer)
        .expect("multiplexer");

    let signal = fx.drop(TreeKind::Can, fx.parameter, multiplexer);

    let tree = fx.models.can.tree();
    let s = tree.typed::<Signal>(signal).expect("signal");
    assert_eq!(s.name, "MyParam");
    assert_eq!(s.parameter_uuid, Some(fx.parameter));
    assert_eq!((s.bits, s.start_bit), (0, 0));
    assert_ne!(signal, fx.parameter);
    assert_eq!(tree.parent(signal), Some(multiplexer));
}

#[test]
fn drop_onto_a_parameter_is_refused() {
    let mut fx = Fixture::new();
    let message = fx.multiplexed_message();
    let payload = pmc_rs::DropPayload::new(message).encode();
    let result = fx.models.drop(TreeKind::Parameters, &payload, fx.parameter, None);
    assert!(matches!(result, Err(PmError::IllegalDrop { .. })));
}

fn multiplexers(fx: &Fixture, view: Uuid) -> Vec<Uuid> {
    fx.models
        .can
        .tree()
        .child_nodes(view)
        .filter(|n| n.kind() == NodeKind::Multiplexer)
        .map(|n| n.uuid)
        .collect()
}

#[test]
fn table_expansion_preserves_identity() {
    fixtures::init_logging();
    let mut fx = Fixture::new();
    let options = ExpandOptions::default();
    let first = expand::expand_parameter_table(&mut fx.models.parameters, fx.table).expect("table");
    assert_eq!(first.created, 2 + 4 + 8 + 32);
    let again = expand::expand_parameter_table(&mut fx.models.parameters, fx.table).expect("table again");
    assert_eq!((again.created, again.reused), (0, first.created));

    let view = fx.can_table(8);
    expand::expand_view(&mut fx.models, TreeKind::Can, view, Some(fx.table), &options).expect("expand");
    let before = multiplexers(&fx, view);
    let json_before = fx.models.can.to_json_string().expect("json");
    assert_eq!(before.len(), 8);

    let report = expand::expand_view(&mut fx.models, TreeKind::Can, view, None, &options).expect("expand again");
    assert_eq!(report.created, 0);
    assert_eq!(multiplexers(&fx, view), before);
    assert_eq!(fx.models.can.to_json_string().expect("json"), json_before);
}

#[test]
fn multiplexers_get_ids_from_the_range_and_packed_signals() {
    let mut fx = Fixture::new();
    expand::expand_parameter_table(&mut fx.models.parameters, fx.table).expect("table");
    let view = fx.can_table(16);
    expand::expand_view(&mut fx.models, TreeKind::Can, view, None, &ExpandOptions::default()).expect("expand");

    let tree = fx.models.can.tree();
    let muxes = multiplexers(&fx, view);
    // Four 16-bit leaves need an overflow multiplexer per group.
    assert_eq!(muxes.len(), 16);
    let ids: Vec<i64> = muxes
        .iter()
        .filter_map(|m| tree.typed::<Multiplexer>(*m))
        .map(|m| m.identifier)
        .collect();
    assert_eq!(ids, (1..=16).collect::<Vec<_>>());
    let first = tree.typed::<Multiplexer>(muxes[0]).expect("mux");
    let overflow = tree.typed::<Multiplexer>(muxes[1]).expect("overflow");
    assert_eq!(overflow.name, format!("{}_A", first.name));
    let starts: Vec<i64> = tree
        .child_nodes(muxes[0])
        .filter_map(|n| n.get::<Signal>())
        .map(|s| s.start_bit)
        .collect();
    assert_eq!(starts, vec![48, 32, 16]);
}

#[test]
fn zero_bit_reference_aborts_or_skips() {
    let mut fx = Fixture::new();
    expand::expand_parameter_table(&mut fx.models.parameters, fx.table).expect("table");
    let view = fx.can_table(0);
    let before = fx.models.can.to_json_string().expect("json");

    let aborted = expand::expand_view(&mut fx.models, TreeKind::Can, view, None, &ExpandOptions::default());
    assert!(matches!(aborted, Err(PmError::Consistency(_))));
    assert_eq!(fx.models.can.to_json_string().expect("json"), before);

    let options = ExpandOptions {
        zero_bits: ZeroBitsPolicy::SkipAndWarn,
        ..Default::default()
    };
    let report = expand::expand_view(&mut fx.models, TreeKind::Can, view, None, &options).expect("skip");
    assert_eq!(report.skipped_seeds, fx.arrays);
    assert!(multiplexers(&fx, view).is_empty());
}

#[test]
fn mismatched_table_is_a_consistency_error() {
    let mut fx = Fixture::new();
    let view = fx.can_table(8);
    let result = expand::expand_view(&mut fx.models, TreeKind::Can, view, Some(Uuid::new_v4()), &ExpandOptions::default());
    assert!(matches!(result, Err(PmError::Consistency(_))));
}

#[test]
fn exhausted_multiplexer_range_fails() {
    let mut fx = Fixture::new();
    expand::expand_parameter_table(&mut fx.models.parameters, fx.table).expect("table");
    let view = fx.can_table(8);
    fx.models
        .can
        .set_attribute(view, "multiplexer_range_last", pmc_rs::AttrValue::Integer(4))
        .expect("range");
    let result = expand::expand_view(&mut fx.models, TreeKind::Can, view, None, &ExpandOptions::default());
    match result {
        Err(PmError::Consistency(message)) => assert_eq!(message, "multiplexer id space exhausted"),
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[test]
fn oversized_reference_is_a_consistency_error() {
    let mut fx = Fixture::new();
    expand::expand_parameter_table(&mut fx.models.parameters, fx.table).expect("table");
    let view = fx.can_table(8);
    let hertz = seed_of(&fx, view, fx.arrays[0]);
    fx.models
        .can
        .set_attribute(hertz, "bits", pmc_rs::AttrValue::Integer(56))
        .expect("bits");
    let before = fx.models.can.to_json_string().expect("json");

    let options = ExpandOptions {
        zero_bits: ZeroBitsPolicy::SkipAndWarn,
        ..Default::default()
    };
    let result = expand::expand_view(&mut fx.models, TreeKind::Can, view, None, &options);
    match result {
        Err(PmError::Consistency(message)) => assert!(message.ends_with(": hertz"), "{message}"),
        other => panic!("expected an oversized reference, got {other:?}"),
    }
    assert_eq!(fx.models.can.to_json_string().expect("json"), before);
}

/// The reference point of `view` generated from the parameter array `array`.
fn seed_of(fx: &Fixture, view: Uuid, array: Uuid) -> Uuid {
    fx.models
        .can
        .tree()
        .child_nodes(view)
        .find(|n| n.get::<Signal>().is_some_and(|s| s.parameter_uuid == Some(array)))
        .map(|n| n.uuid)
        .expect("seed")
}

#[test]
fn reused_reference_takes_the_renamed_parameter_name() {
    let mut fx = Fixture::new();
    expand::expand_parameter_table(&mut fx.models.parameters, fx.table).expect("table");
    let view = fx.can_table(8);
    expand::expand_view(&mut fx.models, TreeKind::Can, view, None, &ExpandOptions::default()).expect("expand");
    let seed = seed_of(&fx, view, fx.arrays[0]);
    assert_eq!(fx.models.can.tree().typed::<Signal>(seed).map(|s| s.name.clone()).as_deref(), Some("hertz"));

    fx.models
        .parameters
        .set_attribute(fx.arrays[0], "name", pmc_rs::AttrValue::String("frequency".into()))
        .expect("rename");
    let report = expand::expand_view(&mut fx.models, TreeKind::Can, view, None, &ExpandOptions::default()).expect("expand again");
    assert_eq!(report.created, 0);

    let signal = fx.models.can.tree().typed::<Signal>(seed).expect("same seed");
    assert_eq!(signal.name, "frequency");
    assert_eq!(signal.bits, 8);
    assert_eq!(seed_of(&fx, view, fx.arrays[0]), seed);
}

#[test]
fn parameter_table_dropped_on_modbus_root_expands_in_place() {
    let mut fx = Fixture::new();
    expand::expand_parameter_table(&mut fx.models.parameters, fx.table).expect("table");
    let root = fx.models.staticmodbus.root();
    let mut points = Vec::new();
    for size in [2, 3] {
        let point = fx
            .models
            .add_child(TreeKind::StaticModbus, root, NodeKind::FunctionData)
            .expect("point");
        fx.models
            .staticmodbus
            .set_attribute(point, "size", pmc_rs::AttrValue::Integer(size))
            .expect("size");
        points.push(point);
    }
    let view = fx.drop(TreeKind::StaticModbus, fx.table, root);
    assert_eq!(fx.models.staticmodbus.tree().node(view).map(|n| n.kind()).ok(), Some(NodeKind::ModbusTable));
    let last = fx
        .models
        .add_child(TreeKind::StaticModbus, root, NodeKind::FunctionData)
        .expect("point");
    points.push(last);

    let options = ExpandOptions::default();
    expand::expand_view(&mut fx.models, TreeKind::StaticModbus, view, None, &options).expect("expand");
    let blocks = |fx: &Fixture| -> Vec<Uuid> {
        fx.models
            .staticmodbus
            .tree()
            .child_nodes(view)
            .filter(|n| n.kind() == NodeKind::ModbusTableRepeatingBlock)
            .map(|n| n.uuid)
            .collect()
    };
    let before = blocks(&fx);
    let json_before = fx.models.staticmodbus.to_json_string().expect("json");
    assert_eq!(before.len(), 8);

    let report = expand::expand_view(&mut fx.models, TreeKind::StaticModbus, view, None, &options).expect("expand again");
    assert_eq!(report.created, 0);
    assert_eq!(blocks(&fx), before);
    assert_eq!(fx.models.staticmodbus.to_json_string().expect("json"), json_before);

    let tree = fx.models.staticmodbus.tree();
    let offsets: Vec<i64> = before
        .iter()
        .filter_map(|b| tree.typed::<ModbusTableRepeatingBlock>(*b))
        .map(|b| b.offset)
        .collect();
    assert_eq!(offsets, vec![0, 4, 8, 12, 16, 20, 24, 28]);
    let block_offsets: Vec<i64> = points
        .iter()
        .filter_map(|p| tree.typed::<FunctionData>(*p))
        .map(|p| p.block_offset)
        .collect();
    assert_eq!(block_offsets, vec![0, 2, 5]);
}

#[test]
fn sunspec_table_expands_and_references_count_toward_length() {
    let mut fx = Fixture::new();
    expand::expand_parameter_table(&mut fx.models.parameters, fx.table).expect("table");
    let (model, view) = fx.sunspec_table();
    expand::expand_view(&mut fx.models, TreeKind::SunSpec, view, None, &ExpandOptions::default()).expect("expand");

    let blocks: Vec<Uuid> = fx
        .models
        .sunspec
        .tree()
        .child_nodes(view)
        .filter(|n| n.kind() == NodeKind::TableRepeatingBlock)
        .map(|n| n.uuid)
        .collect();
    assert_eq!(blocks.len(), 8);
    let offsets: Vec<i64> = blocks
        .iter()
        .filter_map(|b| fx.models.sunspec.tree().typed::<TableRepeatingBlock>(*b))
        .map(|b| b.offset)
        .collect();
    assert_eq!(offsets, vec![0, 4, 8, 12, 16, 20, 24, 28]);

    let fixed = fx
        .models
        .sunspec
        .tree()
        .child_nodes(model)
        .find(|n| n.kind() == NodeKind::FixedBlock)
        .map(|n| n.uuid)
        .expect("fixed block");
    fx.drop(TreeKind::SunSpec, blocks[0], fixed);
    let tree = fx.models.sunspec.tree();
    assert_eq!(tree.typed::<SunSpecModel>(model).map(|m| m.length), Some(4));

    let lookup = fx.models.lookup();
    assert_eq!(pmc_rs::layout::validated_length(&lookup, tree, model).expect("valid"), 4);
    let result = pmc_rs::check::check(tree, &lookup, tree.root());
    assert!(!result.has_errors(), "{:?}", result.flatten());
}

#[test]
fn access_level_on_legacy_parameter_warns() {
    let mut fx = Fixture::new();
    fx.models
        .parameters
        .set_attribute(fx.parameter, "uses_interface_item", false.into())
        .expect("legacy");
    fx.models
        .parameters
        .set_attribute(fx.parameter, "access_level_uuid", fx.factory.into())
        .expect("access level");
    let results = fx.models.check();
    let messages: Vec<String> = results
        .iter()
        .flat_map(|r| r.flatten())
        .map(|(_, f)| f.message.clone())
        .collect();
    assert!(messages.iter().any(|m| m == "access level will not be enforced on a legacy parameter"));
}
