//! Signalpath - schematic connectivity model and wire router
//!
//! This library holds the core of a schematic editor: components placed from
//! a catalog, two-pin nets between their pins, a wiring state machine that
//! turns pin clicks into nets, and an orthogonal router that turns nets into
//! drawable polylines. It never renders anything itself.
//!
//! # Quick Start
//!
//! ```no_run
//! use signalpath::prelude::*;
//!
//! let mut session = EditorSession::default();
//! let r1 = session.place_component("resistor", Point::new(100.0, 100.0)).unwrap();
//! let u1 = session.place_component("opamp", Point::new(300.0, 100.0)).unwrap();
//!
//! session.click_pin(PinRef::new(&r1, "2")).unwrap();
//! session.click_pin(PinRef::new(&u1, "in_pos")).unwrap();
//!
//! for wire in session.routed_wires() {
//!     println!("{}: {:?}", wire.net_id, wire.points);
//! }
//! ```
//!
//! # Features
//!
//! - **Schematic graph**: components, pins and nets with referential integrity
//! - **Wiring**: click-to-connect state machine with rejection reasons
//! - **Routing**: Manhattan polylines that detour around endpoint components
//! - **Editing**: viewport, snapshot undo/redo, keyboard and drag handling
//! - **Persistence**: JSON project files that load atomically

pub mod catalog;
pub mod config;
pub mod connectivity;
pub mod editor;
pub mod error;
pub mod events;
pub mod geometry;
pub mod history;
pub mod project;
pub mod registry;
pub mod routing;
pub mod schematic;
pub mod viewport;
pub mod wiring;

// Re-export main types
pub use catalog::{BuiltinCatalog, Catalog, ComponentDefinition, PinDefinition};
pub use config::{EditorConfig, RouterConfig, ViewportConfig};
pub use connectivity::{Connectivity, ConnectivityStats};
pub use editor::{CanvasClick, EditorSession, Key, KeyAction, Modifiers};
pub use error::{EntityKind, Result, SchematicError};
pub use events::{EditorEvent, SubscriptionId};
pub use geometry::{Point, Rect, Size};
pub use history::History;
pub use project::{LoadReport, LoadedProject, ProjectFile, ProjectMetadata};
pub use registry::{HostCallback, SessionId, SessionRegistry};
pub use routing::RoutedWire;
pub use schematic::{
    Component, Net, Pin, PinRef, PinRole, PropertyValue, Schematic, SchematicStats,
};
pub use viewport::Viewport;
pub use wiring::{WiringOutcome, WiringSession, WiringState};

/// Load a project file with the built-in catalog (convenience wrapper).
pub fn load_project_file(path: &std::path::Path) -> Result<LoadedProject> {
    project::load_project_file(path, &BuiltinCatalog::new())
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        BuiltinCatalog, Catalog, EditorConfig, EditorSession, Point, PinRef, PropertyValue,
        Schematic, SchematicError, WiringOutcome,
    };
}
