//! Built-in and External Component Definitions
//!
//! Definitions come from:
//! 1. JSON files embedded in the binary (the stock palette)
//! 2. Optional user JSON files in a catalog directory
//!
//! A user file whose id matches a built-in definition replaces it.

use std::path::Path;

use super::{Catalog, ComponentDefinition};

const EMBEDDED_RESISTOR: &str = include_str!("../../catalog/resistor.json");
const EMBEDDED_OPAMP: &str = include_str!("../../catalog/opamp.json");
const EMBEDDED_MICROPHONE: &str = include_str!("../../catalog/microphone.json");

/// Parse the embedded definitions
pub fn embedded_definitions() -> Vec<ComponentDefinition> {
    let embedded_jsons = [EMBEDDED_RESISTOR, EMBEDDED_OPAMP, EMBEDDED_MICROPHONE];

    let mut definitions = Vec::new();
    for json_str in embedded_jsons {
        match serde_json::from_str::<ComponentDefinition>(json_str) {
            Ok(def) => definitions.push(def),
            Err(e) => {
                tracing::warn!("Failed to parse embedded component definition: {}", e);
            }
        }
    }
    definitions
}

/// Load definitions from a directory of JSON files.
/// Returns both the loaded definitions and the errors encountered.
pub fn load_definitions_from_directory(dir: &Path) -> (Vec<ComponentDefinition>, Vec<String>) {
    let mut definitions = Vec::new();
    let mut errors = Vec::new();

    if !dir.is_dir() {
        return (definitions, errors);
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            errors.push(format!("Failed to read directory {:?}: {}", dir, e));
            return (definitions, errors);
        }
    };

    let mut paths: Vec<_> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        if path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }
        match load_definition_from_file(&path) {
            Ok(def) => {
                tracing::info!("Loaded component definition {} from {:?}", def.id, path.file_name());
                definitions.push(def);
            }
            Err(e) => {
                let error_msg = format!("Failed to load {:?}: {}", path.file_name(), e);
                tracing::warn!("{}", error_msg);
                errors.push(error_msg);
            }
        }
    }

    (definitions, errors)
}

/// Load and validate a single definition file
pub fn load_definition_from_file(path: &Path) -> Result<ComponentDefinition, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;
    let def: ComponentDefinition =
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse JSON: {}", e))?;
    def.validate()?;
    Ok(def)
}

/// The stock catalog, optionally extended with user definitions.
#[derive(Debug, Clone)]
pub struct BuiltinCatalog {
    definitions: Vec<ComponentDefinition>,
}

impl BuiltinCatalog {
    pub fn new() -> Self {
        Self {
            definitions: embedded_definitions(),
        }
    }

    /// Built-ins plus every valid definition found in `dir`.
    /// Per-file errors are returned rather than aborting the load.
    pub fn with_directory(dir: &Path) -> (Self, Vec<String>) {
        let mut catalog = Self::new();
        let (extra, errors) = load_definitions_from_directory(dir);
        for def in extra {
            catalog.insert(def);
        }
        tracing::info!("Catalog has {} definitions", catalog.definitions.len());
        (catalog, errors)
    }

    /// Add a definition, replacing any with the same id.
    pub fn insert(&mut self, definition: ComponentDefinition) {
        match self.definitions.iter_mut().find(|d| d.id == definition.id) {
            Some(existing) => *existing = definition,
            None => self.definitions.push(definition),
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog for BuiltinCatalog {
    fn definition(&self, id: &str) -> Option<&ComponentDefinition> {
        self.definitions
            .iter()
            .find(|d| d.id == id)
            .or_else(|| self.definitions.iter().find(|d| d.matches_id(id)))
    }

    fn definitions(&self) -> Vec<&ComponentDefinition> {
        self.definitions.iter().collect()
    }
}
