//! Schematic Connectivity Model
//!
//! Components own their pins; nets reference pins by `(component, pin)` and
//! each pin keeps a back-reference to its net. [`Schematic`] keeps both sides
//! consistent.

pub mod graph;
pub mod model;

pub use graph::{Schematic, SchematicStats};
pub use model::{Component, Net, Pin, PinRef, PinRole, PropertyValue};
