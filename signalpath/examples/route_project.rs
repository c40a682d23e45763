//! Load a project file and print every routed net.

use signalpath::{routing, RouterConfig, SchematicError};
use std::path::Path;

fn main() -> Result<(), SchematicError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/preamp.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example route_project [path/to/project.json]");
        std::process::exit(1);
    }

    let loaded = signalpath::load_project_file(path)?;
    for warning in &loaded.report.warnings {
        println!("warning: {}", warning);
    }

    let schematic = &loaded.schematic;
    for wire in routing::route_all(schematic, &RouterConfig::default()) {
        let label = schematic
            .net(&wire.net_id)
            .and_then(|n| n.name.clone())
            .unwrap_or_else(|| wire.net_id.clone());
        println!("{} ({} vertices)", label, wire.points.len());
        for point in &wire.points {
            println!("  {:>8.1} {:>8.1}", point.x, point.y);
        }
    }
    Ok(())
}
