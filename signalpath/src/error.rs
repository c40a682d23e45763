//! Error taxonomy shared by the graph, the wiring machine and persistence.
//!
//! Nothing here is fatal: every variant is returned after the operation has
//! been refused, so the schematic is always left in its last valid state.

use std::fmt;

/// The kind of entity a stale id referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Component,
    Pin,
    Net,
    Session,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Component => write!(f, "component"),
            EntityKind::Pin => write!(f, "pin"),
            EntityKind::Net => write!(f, "net"),
            EntityKind::Session => write!(f, "session"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchematicError {
    /// A mutation or query named an id that is not in the schematic.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("Unknown catalog id: {0}")]
    UnknownCatalogId(String),

    #[error("Pin {component_id}:{pin_id} is already connected")]
    PinAlreadyConnected { component_id: String, pin_id: String },

    #[error("Cannot connect component {component_id} to itself")]
    SelfConnection { component_id: String },

    #[error("Invalid project file: {0}")]
    InvalidProjectFile(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchematicError {
    pub fn component_not_found(id: impl Into<String>) -> Self {
        SchematicError::NotFound {
            kind: EntityKind::Component,
            id: id.into(),
        }
    }

    pub fn pin_not_found(component_id: &str, pin_id: &str) -> Self {
        SchematicError::NotFound {
            kind: EntityKind::Pin,
            id: format!("{}:{}", component_id, pin_id),
        }
    }

    pub fn net_not_found(id: impl Into<String>) -> Self {
        SchematicError::NotFound {
            kind: EntityKind::Net,
            id: id.into(),
        }
    }

    /// True for stale-reference errors, which callers usually treat as a no-op.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SchematicError::NotFound { .. })
    }

    /// True for the expected user-error outcomes of the wiring state machine.
    pub fn is_wiring_rejection(&self) -> bool {
        matches!(
            self,
            SchematicError::PinAlreadyConnected { .. } | SchematicError::SelfConnection { .. }
        )
    }
}

impl From<serde_json::Error> for SchematicError {
    fn from(e: serde_json::Error) -> Self {
        SchematicError::InvalidProjectFile(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SchematicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = SchematicError::pin_not_found("R1", "2");
        assert_eq!(err.to_string(), "pin 'R1:2' not found");
        assert!(err.is_not_found());
        assert!(!err.is_wiring_rejection());
    }

    #[test]
    fn test_wiring_rejections() {
        let err = SchematicError::SelfConnection {
            component_id: "U1".to_string(),
        };
        assert!(err.is_wiring_rejection());

        let err = SchematicError::UnknownCatalogId("nope".to_string());
        assert!(!err.is_wiring_rejection());
        assert_eq!(err.to_string(), "Unknown catalog id: nope");
    }
}
