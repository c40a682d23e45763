//! Project file tests against the JSON fixtures

use signalpath::project::{self, UNRESOLVED_COMPONENT_SIZE};
use signalpath::{routing, BuiltinCatalog, PropertyValue, RouterConfig, SchematicError};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_load_preamp() {
    let loaded = signalpath::load_project_file(&fixture_path("preamp.json")).unwrap();
    let sch = &loaded.schematic;

    assert!(loaded.report.is_clean(), "{:?}", loaded.report.warnings);
    assert_eq!(sch.component_count(), 3);
    assert_eq!(sch.net_count(), 2);
    assert_eq!(sch.net("n1").unwrap().name.as_deref(), Some("MIC_OUT"));
    assert!(sch.is_pin_connected("mk1", "out"));
    assert!(sch.is_pin_connected("u1", "in_pos"));
    assert!(!sch.is_pin_connected("u1", "out"));
    assert!(sch.integrity_violations().is_empty());

    let r1 = sch.component("r1").unwrap();
    assert_eq!(r1.properties["Resistance"], PropertyValue::from("4.7kΩ"));
    let mk1 = sch.component("mk1").unwrap();
    assert_eq!(mk1.properties["Polarized"], PropertyValue::Bool(true));

    let metadata = loaded.metadata.unwrap();
    assert_eq!(metadata.name, "Intercom preamp");
    assert_eq!(metadata.created_at.to_rfc3339(), "2024-03-01T09:30:00+00:00");
}

#[test]
fn test_route_preamp() {
    let loaded = signalpath::load_project_file(&fixture_path("preamp.json")).unwrap();
    let wires = routing::route_all(&loaded.schematic, &RouterConfig::default());
    assert_eq!(wires.len(), 2);
    for wire in &wires {
        assert!(wire.points.len() >= 2 && wire.points.len() <= 5);
        for pair in wire.points.windows(2) {
            assert!(pair[0].x == pair[1].x || pair[0].y == pair[1].y);
        }
    }
}

#[test]
fn test_missing_nets_rejected() {
    let err = signalpath::load_project_file(&fixture_path("missing_nets.json")).unwrap_err();
    match err {
        SchematicError::InvalidProjectFile(message) => assert!(message.contains("nets")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_unknown_library_tolerated() {
    let loaded = signalpath::load_project_file(&fixture_path("unknown_library.json")).unwrap();
    let sch = &loaded.schematic;

    assert_eq!(sch.component_count(), 3);
    let v1 = sch.component("v1").unwrap();
    assert!(v1.pins.is_empty());
    assert_eq!(v1.size, UNRESOLVED_COMPONENT_SIZE);
    assert_eq!(v1.properties["Heater"], PropertyValue::from("12.6V"));

    assert_eq!(loaded.report.unresolved_components, vec!["v1".to_string()]);
    assert_eq!(loaded.report.dropped_nets, vec!["n1".to_string()]);
    assert_eq!(sch.net_count(), 1);
    assert!(!sch.is_pin_connected("r1", "1"));
    assert!(sch.is_pin_connected("r1", "2"));
    assert_eq!(sch.component("r1").unwrap().catalog_id, "RESISTOR_GENERIC");
}

#[test]
fn test_save_and_reload_fixture() {
    let catalog = BuiltinCatalog::new();
    let loaded = project::load_project_file(&fixture_path("unknown_library.json"), &catalog).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.json");
    project::save_project_file(&path, &loaded.schematic, loaded.metadata.as_ref()).unwrap();

    let reloaded = project::load_project_file(&path, &catalog).unwrap();
    assert_eq!(reloaded.schematic, loaded.schematic);
    assert_eq!(reloaded.report.unresolved_components, vec!["v1".to_string()]);
    assert!(reloaded.report.dropped_nets.is_empty());
}
