//! Host bridge: routes callbacks from an embedding UI to the right session.
//!
//! Hosts hold an opaque [`SessionId`] instead of a pointer to the session,
//! so a callback for a closed session is a `NotFound` rather than a dangling
//! reference.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::editor::EditorSession;
use crate::error::{EntityKind, Result, SchematicError};
use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callbacks a host UI raises. Positions are in schematic space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "callback", rename_all = "snake_case")]
pub enum HostCallback {
    /// The host selected a component, or cleared the selection
    ComponentSelected { component_id: Option<String> },
    /// A drag update from the host
    ComponentPositionChanged { component_id: String, x: f64, y: f64 },
    /// The host finished dragging a component
    ComponentMoved { component_id: String, x: f64, y: f64 },
    ZoomChanged { scale: f64 },
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, EditorSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, session: EditorSession) -> SessionId {
        let id = SessionId::new();
        self.sessions.insert(id, session);
        tracing::debug!("Registered editor session {}", id);
        id
    }

    pub fn remove(&mut self, id: SessionId) -> Option<EditorSession> {
        let removed = self.sessions.remove(&id);
        if removed.is_some() {
            tracing::debug!("Closed editor session {}", id);
        }
        removed
    }

    pub fn get(&self, id: SessionId) -> Option<&EditorSession> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut EditorSession> {
        self.sessions.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Apply a host callback to its session.
    pub fn dispatch(&mut self, id: SessionId, callback: HostCallback) -> Result<()> {
        let session = self.sessions.get_mut(&id).ok_or_else(|| SchematicError::NotFound {
            kind: EntityKind::Session,
            id: id.to_string(),
        })?;

        match callback {
            HostCallback::ComponentSelected { component_id } => {
                session.select(component_id.as_deref())?;
            }
            HostCallback::ComponentPositionChanged { component_id, x, y } => {
                session.drag_component(&component_id, Point::new(x, y))?;
            }
            HostCallback::ComponentMoved { component_id, x, y } => {
                session.drag_component(&component_id, Point::new(x, y))?;
                session.end_drag();
            }
            HostCallback::ZoomChanged { scale } => {
                session.set_zoom(scale);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_drag_sequence() {
        let mut registry = SessionRegistry::new();
        let id = registry.register(EditorSession::default());
        let component = registry
            .get_mut(id)
            .unwrap()
            .place_component("resistor", Point::new(0.0, 0.0))
            .unwrap();

        for x in [10.0, 20.0, 30.0] {
            registry
                .dispatch(
                    id,
                    HostCallback::ComponentPositionChanged {
                        component_id: component.clone(),
                        x,
                        y: 0.0,
                    },
                )
                .unwrap();
        }
        registry
            .dispatch(
                id,
                HostCallback::ComponentMoved {
                    component_id: component.clone(),
                    x: 40.0,
                    y: 0.0,
                },
            )
            .unwrap();

        let session = registry.get_mut(id).unwrap();
        assert_eq!(
            session.schematic().component(&component).unwrap().position,
            Point::new(40.0, 0.0)
        );
        assert!(!session.is_dragging());
        assert!(session.undo());
        assert_eq!(
            session.schematic().component(&component).unwrap().position,
            Point::new(0.0, 0.0),
            "the whole drag is one history entry"
        );
    }

    #[test]
    fn test_dispatch_selection_and_zoom() {
        let mut registry = SessionRegistry::new();
        let id = registry.register(EditorSession::default());
        registry
            .dispatch(id, HostCallback::ComponentSelected { component_id: None })
            .unwrap();
        registry
            .dispatch(id, HostCallback::ZoomChanged { scale: 2.5 })
            .unwrap();
        assert_eq!(registry.get(id).unwrap().zoom_percentage(), "250%");

        let err = registry
            .dispatch(
                id,
                HostCallback::ComponentSelected {
                    component_id: Some("ghost".to_string()),
                },
            )
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unknown_session() {
        let mut registry = SessionRegistry::new();
        let id = registry.register(EditorSession::default());
        assert!(registry.remove(id).is_some());
        let err = registry
            .dispatch(id, HostCallback::ZoomChanged { scale: 1.0 })
            .unwrap_err();
        assert!(matches!(
            err,
            SchematicError::NotFound {
                kind: EntityKind::Session,
                ..
            }
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_callback_json() {
        let cb: HostCallback = serde_json::from_str(
            r#"{"callback": "component_moved", "component_id": "r1", "x": 1.5, "y": 2}"#,
        )
        .unwrap();
        assert_eq!(
            cb,
            HostCallback::ComponentMoved {
                component_id: "r1".to_string(),
                x: 1.5,
                y: 2.0
            }
        );
    }
}
