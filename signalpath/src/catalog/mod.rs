//! Component Catalog
//!
//! Read-only registry mapping a catalog id (the drag-and-drop payload and the
//! project file's `libraryId`) to a pin layout and default properties.
//!
//! The editor only depends on the [`Catalog`] trait. [`BuiltinCatalog`]
//! ships the stock definitions and can be extended from a directory of JSON
//! files without recompiling.

pub mod builtin;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Size};
use crate::schematic::{PinRole, PropertyValue};

pub use builtin::BuiltinCatalog;

/// A pin as laid out in a catalog definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinDefinition {
    pub id: String,
    pub name: String,
    /// Position relative to the component origin
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub role: PinRole,
}

impl PinDefinition {
    pub fn relative_position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    /// Prefix for generated designators, e.g. "R" gives R1, R2, ...
    #[serde(default = "default_designator_prefix")]
    pub designator_prefix: String,
    /// Alternative ids resolving to this definition
    #[serde(default)]
    pub aliases: Vec<String>,
    pub width: f64,
    pub height: f64,
    pub pins: Vec<PinDefinition>,
    #[serde(default)]
    pub default_properties: IndexMap<String, PropertyValue>,
}

fn default_designator_prefix() -> String {
    "X".to_string()
}

impl ComponentDefinition {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn pin(&self, id: &str) -> Option<&PinDefinition> {
        self.pins.iter().find(|p| p.id == id)
    }

    pub fn matches_id(&self, id: &str) -> bool {
        self.id == id || self.aliases.iter().any(|a| a == id)
    }

    /// Check the definition is usable for placement.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("definition id is empty".to_string());
        }
        if !(self.width >= 0.0 && self.height >= 0.0) {
            return Err(format!("{}: negative size", self.id));
        }
        let mut seen = std::collections::HashSet::new();
        for pin in &self.pins {
            if !seen.insert(pin.id.as_str()) {
                return Err(format!("{}: duplicate pin id '{}'", self.id, pin.id));
            }
        }
        Ok(())
    }
}

/// Lookup seam between the editor and whatever supplies component layouts.
pub trait Catalog {
    /// Resolve a catalog id or alias.
    fn definition(&self, id: &str) -> Option<&ComponentDefinition>;

    /// All definitions, in palette order.
    fn definitions(&self) -> Vec<&ComponentDefinition>;

    fn contains(&self, id: &str) -> bool {
        self.definition(id).is_some()
    }
}
