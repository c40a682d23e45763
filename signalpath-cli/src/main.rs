//! Signalpath CLI - inspect and route schematic project files from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use signalpath::project::{self, LoadedProject};
use signalpath::{
    routing, BuiltinCatalog, Catalog, Connectivity, EditorConfig, Point, RoutedWire, Schematic,
};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "signalpath")]
#[command(about = "Schematic project inspection and wire routing tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a project and print its components, nets and statistics
    Inspect {
        /// Path to a project .json file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Directory of extra component definitions (*.json)
        #[arg(long, value_name = "DIR")]
        catalog_dir: Option<PathBuf>,
    },

    /// Print the routed polyline of every net in a project
    Route {
        /// Path to a project .json file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Editor config file overriding router settings
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },

    /// List the component catalog
    Catalog {
        /// Show pin layouts and default properties
        #[arg(long)]
        detailed: bool,

        /// Directory of extra component definitions (*.json)
        #[arg(long, value_name = "DIR")]
        catalog_dir: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Inspect {
            file,
            format,
            catalog_dir,
        } => handle_inspect(&file, format, catalog_dir.as_deref()),
        Commands::Route {
            file,
            format,
            config,
        } => handle_route(&file, format, config.as_deref()),
        Commands::Catalog {
            detailed,
            catalog_dir,
        } => handle_catalog(detailed || cli.verbose, catalog_dir.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(catalog_dir: Option<&Path>) -> BuiltinCatalog {
    match catalog_dir {
        Some(dir) => {
            let (catalog, errors) = BuiltinCatalog::with_directory(dir);
            for error in errors {
                tracing::warn!("{}", error);
            }
            catalog
        }
        None => BuiltinCatalog::new(),
    }
}

fn load(file: &Path, catalog: &BuiltinCatalog) -> Result<LoadedProject> {
    project::load_project_file(file, catalog)
        .with_context(|| format!("failed to load {}", file.display()))
}

fn handle_inspect(file: &Path, format: OutputFormat, catalog_dir: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(catalog_dir);
    let loaded = load(file, &catalog)?;
    match format {
        OutputFormat::Human => output_inspect_human(file, &loaded),
        OutputFormat::Json => output_inspect_json(file, &loaded)?,
    }
    Ok(())
}

fn pin_label(schematic: &Schematic, component_id: &str, pin_id: &str) -> String {
    let name = schematic
        .component(component_id)
        .map(|c| c.name.as_str())
        .unwrap_or(component_id);
    format!("{}.{}", name, pin_id)
}

fn fmt_point(p: &Point) -> String {
    format!("({}, {})", p.x, p.y)
}

fn output_inspect_human(file: &Path, loaded: &LoadedProject) {
    let schematic = &loaded.schematic;
    let title = loaded
        .metadata
        .as_ref()
        .map(|m| m.name.clone())
        .unwrap_or_else(|| file.display().to_string());

    println!("\nProject: {}", title);
    println!("{}", "─".repeat(60));

    println!("\n  Components ({}):", schematic.component_count());
    for c in schematic.components() {
        println!(
            "    {:<6} {:<12} at {:<14} [{}]",
            c.name,
            c.catalog_id,
            fmt_point(&c.position),
            c.id
        );
    }

    println!("\n  Nets ({}):", schematic.net_count());
    for net in schematic.nets() {
        let members: Vec<String> = net
            .connections
            .iter()
            .map(|p| pin_label(schematic, &p.component_id, &p.pin_id))
            .collect();
        println!(
            "    {:<10} {}",
            net.name.as_deref().unwrap_or(&net.id),
            members.join(" <-> ")
        );
    }

    let stats = schematic.stats();
    let connectivity = Connectivity::from_schematic(schematic).stats();
    println!("\n  Summary:");
    println!("    Components: {}", stats.component_count);
    println!("    Nets:       {}", stats.net_count);
    println!(
        "    Pins:       {} ({} connected)",
        stats.pin_count, stats.connected_pin_count
    );
    println!(
        "    Groups:     {} ({} isolated)",
        connectivity.group_count, connectivity.isolated_count
    );

    if !loaded.report.warnings.is_empty() {
        println!("\n  Warnings:");
        for warning in &loaded.report.warnings {
            println!("    - {}", warning);
        }
    }
}

fn output_inspect_json(file: &Path, loaded: &LoadedProject) -> Result<()> {
    let schematic = &loaded.schematic;
    let output = serde_json::json!({
        "file": file.display().to_string(),
        "metadata": loaded.metadata,
        "components": schematic.components().map(|c| {
            serde_json::json!({
                "id": c.id,
                "name": c.name,
                "libraryId": c.catalog_id,
                "position": c.position,
                "pins": c.pins.len(),
                "properties": c.properties,
            })
        }).collect::<Vec<_>>(),
        "nets": schematic.nets().collect::<Vec<_>>(),
        "stats": schematic.stats(),
        "connectivity": Connectivity::from_schematic(schematic).stats(),
        "unconnectedPins": schematic.unconnected_pins(),
        "report": loaded.report,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn handle_route(file: &Path, format: OutputFormat, config: Option<&Path>) -> Result<()> {
    let config = match config {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => EditorConfig::default(),
    };
    let catalog = BuiltinCatalog::new();
    let loaded = load(file, &catalog)?;
    let wires = routing::route_all(&loaded.schematic, &config.router);

    match format {
        OutputFormat::Human => output_route_human(&loaded.schematic, &wires),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "file": file.display().to_string(),
                "wires": wires,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn output_route_human(schematic: &Schematic, wires: &[RoutedWire]) {
    if wires.is_empty() {
        println!("No nets to route");
        return;
    }
    for wire in wires {
        let label = schematic
            .net(&wire.net_id)
            .and_then(|n| n.name.clone())
            .unwrap_or_else(|| wire.net_id.clone());
        let path: Vec<String> = wire.points.iter().map(fmt_point).collect();
        println!("{}: {}", label, path.join(" -> "));
    }
}

fn handle_catalog(detailed: bool, catalog_dir: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(catalog_dir);
    println!("Available components:\n");

    for def in catalog.definitions() {
        println!("  {:<12} {} [{}]", def.id, def.name, def.category);
        if !detailed {
            continue;
        }
        if !def.description.is_empty() {
            println!("               {}", def.description);
        }
        if !def.aliases.is_empty() {
            println!("               aliases: {}", def.aliases.join(", "));
        }
        println!("               size: {} x {}", def.width, def.height);
        for pin in &def.pins {
            println!(
                "               pin {:<8} {:<14} ({}, {}) {}",
                pin.id, pin.name, pin.x, pin.y, pin.role
            );
        }
        for (key, value) in &def.default_properties {
            println!("               {} = {}", key, value);
        }
    }
    Ok(())
}
