//! Project file persistence.
//!
//! ```json
//! { "components": [ { "id", "libraryId", "position": {"x","y"}, "rotation", "properties" } ],
//!   "nets": [ { "id", "connections": [ {"componentId","pinId"}, {"componentId","pinId"} ] } ] }
//! ```
//!
//! Loading fails closed: a malformed file is rejected as a whole and a new
//! [`Schematic`] is only handed back once it is fully built. Unknown library
//! ids are tolerated so files keep loading as catalogs evolve.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::catalog::Catalog;
use crate::error::{Result, SchematicError};
use crate::geometry::{Point, Size};
use crate::schematic::{Component, Net, PinRef, PropertyValue, Schematic};

/// Size given to components whose library id is not in the catalog
pub const UNRESOLVED_COMPONENT_SIZE: Size = Size::new(40.0, 40.0);

pub const PROJECT_FORMAT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub components: Vec<ProjectComponent>,
    pub nets: Vec<ProjectNet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ProjectMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectComponent {
    pub id: String,
    pub library_id: String,
    pub position: Point,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectNet {
    pub id: String,
    pub connections: Vec<PinRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

fn default_version() -> String {
    PROJECT_FORMAT_VERSION.to_string()
}

impl ProjectMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            version: default_version(),
            created_at: now,
            modified_at: now,
        }
    }
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Non-fatal findings from a load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Components kept without pins because their library id is unknown
    pub unresolved_components: Vec<String>,
    /// Nets left out to keep the schematic consistent
    pub dropped_nets: Vec<String>,
    pub warnings: Vec<String>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }
}

/// A successfully loaded project
#[derive(Debug, Clone)]
pub struct LoadedProject {
    pub schematic: Schematic,
    pub metadata: Option<ProjectMetadata>,
    pub report: LoadReport,
}

/// Parse and shape-check project JSON without building a schematic.
pub fn parse_project(content: &str) -> Result<ProjectFile> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| SchematicError::InvalidProjectFile(format!("not valid JSON: {}", e)))?;

    let object = value.as_object().ok_or_else(|| {
        SchematicError::InvalidProjectFile("top level must be an object".to_string())
    })?;
    for key in ["components", "nets"] {
        if !object.contains_key(key) {
            return Err(SchematicError::InvalidProjectFile(format!(
                "missing required key '{}'",
                key
            )));
        }
    }

    serde_json::from_value(value).map_err(|e| SchematicError::InvalidProjectFile(e.to_string()))
}

/// Build a fresh schematic from a parsed project.
pub fn build_schematic<C: Catalog + ?Sized>(
    project: &ProjectFile,
    catalog: &C,
) -> Result<(Schematic, LoadReport)> {
    let mut schematic = Schematic::new();
    let mut report = LoadReport::default();

    let mut seen = HashSet::new();
    let mut unnamed = Vec::new();
    for pc in &project.components {
        if !seen.insert(pc.id.as_str()) {
            return Err(SchematicError::InvalidProjectFile(format!(
                "duplicate component id '{}'",
                pc.id
            )));
        }
        if !pc.position.is_finite() {
            return Err(SchematicError::InvalidProjectFile(format!(
                "component '{}' has a non-finite position",
                pc.id
            )));
        }

        let mut component = match catalog.definition(&pc.library_id) {
            Some(definition) => {
                // Unnamed parts are numbered after every explicit name is known
                let name = match pc.name {
                    Some(ref name) => name.clone(),
                    None => {
                        unnamed.push((pc.id.as_str(), definition.designator_prefix.as_str()));
                        String::new()
                    }
                };
                let mut c = Component::from_definition(&pc.id, name, definition, pc.position);
                // Keep the id the file used, even when it was an alias
                c.catalog_id = pc.library_id.clone();
                c
            }
            None => {
                report.unresolved_components.push(pc.id.clone());
                report.warn(format!(
                    "component '{}' uses unknown library id '{}', loaded without pins",
                    pc.id, pc.library_id
                ));
                let mut c = Component::unresolved(
                    &pc.id,
                    &pc.library_id,
                    pc.position,
                    UNRESOLVED_COMPONENT_SIZE,
                );
                if let Some(ref name) = pc.name {
                    c.name = name.clone();
                }
                c
            }
        };
        component.rotation = pc.rotation;
        for (key, value) in &pc.properties {
            component.properties.insert(key.clone(), value.clone());
        }
        schematic.insert_component(component);
    }
    for (id, prefix) in unnamed {
        let name = schematic.next_designator(prefix);
        schematic.rename_component(id, &name)?;
    }

    let mut net_ids = HashSet::new();
    for pn in &project.nets {
        if let Err(reason) = check_net(&schematic, pn, &net_ids) {
            report.dropped_nets.push(pn.id.clone());
            report.warn(format!("net '{}' dropped: {}", pn.id, reason));
            continue;
        }
        net_ids.insert(pn.id.clone());
        schematic.insert_net(Net {
            id: pn.id.clone(),
            connections: pn.connections.clone(),
            name: pn.name.clone(),
        });
    }

    Ok((schematic, report))
}

fn check_net(
    schematic: &Schematic,
    net: &ProjectNet,
    net_ids: &HashSet<String>,
) -> std::result::Result<(), String> {
    if net_ids.contains(&net.id) {
        return Err("duplicate net id".to_string());
    }
    let [a, b] = match net.connections.as_slice() {
        [a, b] => [a, b],
        other => return Err(format!("expected 2 connections, found {}", other.len())),
    };
    for conn in [a, b] {
        match schematic.pin(conn) {
            None => return Err(format!("pin {} does not exist", conn)),
            Some(pin) if pin.is_connected() => {
                return Err(format!("pin {} is already connected", conn))
            }
            Some(_) => {}
        }
    }
    if a.component_id == b.component_id {
        return Err("both ends on the same component".to_string());
    }
    Ok(())
}

/// Parse project JSON into a new schematic. On error nothing is returned, so
/// the caller's current schematic is never touched.
pub fn load_project<C: Catalog + ?Sized>(content: &str, catalog: &C) -> Result<LoadedProject> {
    let project = parse_project(content)?;
    let (schematic, report) = build_schematic(&project, catalog)?;
    tracing::info!(
        "Loaded project with {} components and {} nets ({} warnings)",
        schematic.component_count(),
        schematic.net_count(),
        report.warnings.len()
    );
    Ok(LoadedProject {
        schematic,
        metadata: project.metadata,
        report,
    })
}

pub fn load_project_file<C: Catalog + ?Sized>(path: &Path, catalog: &C) -> Result<LoadedProject> {
    let content = std::fs::read_to_string(path)?;
    load_project(&content, catalog)
}

/// Convert a schematic to its file form.
pub fn to_project_file(schematic: &Schematic, metadata: Option<&ProjectMetadata>) -> ProjectFile {
    let components = schematic
        .components()
        .map(|c| ProjectComponent {
            id: c.id.clone(),
            library_id: c.catalog_id.clone(),
            position: c.position,
            rotation: c.rotation,
            properties: c.properties.clone(),
            name: Some(c.name.clone()),
        })
        .collect();
    let nets = schematic
        .nets()
        .map(|n| ProjectNet {
            id: n.id.clone(),
            connections: n.connections.clone(),
            name: n.name.clone(),
        })
        .collect();
    ProjectFile {
        components,
        nets,
        metadata: metadata.cloned(),
    }
}

/// Serialize to pretty JSON, stamping `modifiedAt`.
pub fn save_project(schematic: &Schematic, metadata: Option<&ProjectMetadata>) -> Result<String> {
    let mut metadata = metadata.cloned().unwrap_or_default();
    metadata.modified_at = Utc::now();
    let file = to_project_file(schematic, Some(&metadata));
    Ok(serde_json::to_string_pretty(&file)?)
}

pub fn save_project_file(
    path: &Path,
    schematic: &Schematic,
    metadata: Option<&ProjectMetadata>,
) -> Result<()> {
    let content = save_project(schematic, metadata)?;
    std::fs::write(path, content)?;
    tracing::info!("Saved project to {}", path.display());
    Ok(())
}
