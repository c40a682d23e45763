//! Schematic data types: pins, components, nets and property values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::ComponentDefinition;
use crate::geometry::{Point, Rect, Size};

/// Electrical role of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PinRole {
    Input,
    Output,
    Power,
    #[default]
    Generic,
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinRole::Input => write!(f, "Input"),
            PinRole::Output => write!(f, "Output"),
            PinRole::Power => write!(f, "Power"),
            PinRole::Generic => write!(f, "Generic"),
        }
    }
}

/// A component property value. Closed set of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Number(n) => write!(f, "{}", n),
            PropertyValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

/// Reference to one pin of one component
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinRef {
    pub component_id: String,
    pub pin_id: String,
}

impl PinRef {
    pub fn new(component_id: impl Into<String>, pin_id: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            pin_id: pin_id.into(),
        }
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.component_id, self.pin_id)
    }
}

/// A pin on a placed component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub id: String,
    pub name: String,
    /// Offset from the component origin
    pub relative: Point,
    /// Component position + relative offset, kept in sync by the owner
    pub absolute: Point,
    pub role: PinRole,
    /// Net this pin belongs to, if any
    pub net: Option<String>,
}

impl Pin {
    pub fn is_connected(&self) -> bool {
        self.net.is_some()
    }
}

/// A placed instance of a catalog definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub catalog_id: String,
    pub name: String,
    pub position: Point,
    pub size: Size,
    /// Degrees. Persisted but not applied to pin geometry.
    pub rotation: f64,
    pub pins: IndexMap<String, Pin>,
    pub properties: IndexMap<String, PropertyValue>,
    pub selected: bool,
}

impl Component {
    /// Instantiate a component from its catalog definition.
    pub fn from_definition(
        id: impl Into<String>,
        name: impl Into<String>,
        definition: &ComponentDefinition,
        position: Point,
    ) -> Self {
        let pins = definition
            .pins
            .iter()
            .map(|def| {
                let relative = def.relative_position();
                let pin = Pin {
                    id: def.id.clone(),
                    name: def.name.clone(),
                    relative,
                    absolute: position + relative,
                    role: def.role,
                    net: None,
                };
                (def.id.clone(), pin)
            })
            .collect();

        Self {
            id: id.into(),
            catalog_id: definition.id.clone(),
            name: name.into(),
            position,
            size: definition.size(),
            rotation: 0.0,
            pins,
            properties: definition.default_properties.clone(),
            selected: false,
        }
    }

    /// A component whose catalog entry could not be resolved. It keeps its
    /// identity and properties but has no pins.
    pub fn unresolved(
        id: impl Into<String>,
        catalog_id: impl Into<String>,
        position: Point,
        size: Size,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            catalog_id: catalog_id.into(),
            position,
            size,
            rotation: 0.0,
            pins: IndexMap::new(),
            properties: IndexMap::new(),
            selected: false,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Move the component and update every pin in place.
    pub fn set_position(&mut self, position: Point) {
        self.position = position;
        for pin in self.pins.values_mut() {
            pin.absolute = position + pin.relative;
        }
    }

    pub fn pin(&self, pin_id: &str) -> Option<&Pin> {
        self.pins.get(pin_id)
    }

    pub fn connected_pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.values().filter(|p| p.is_connected())
    }
}

/// A point-to-point electrical connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Net {
    pub id: String,
    pub connections: Vec<PinRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Net {
    pub fn touches_component(&self, component_id: &str) -> bool {
        self.connections.iter().any(|c| c.component_id == component_id)
    }

    pub fn contains(&self, pin: &PinRef) -> bool {
        self.connections.contains(pin)
    }
}
