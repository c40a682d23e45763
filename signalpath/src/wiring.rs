//! Wiring state machine.
//!
//! Turns a pair of pin clicks into a net:
//!
//! ```text
//! Idle  --click unconnected pin P-->  Armed(P)
//! Armed(P) --click pin Q (other component, unconnected)--> Idle + net P<->Q
//! Armed(P) --pointer move--> Armed(P)       (cursor only)
//! Armed(P) --cancel--> Idle
//! ```
//!
//! Rejections never touch the schematic. A rejection while armed drops the
//! session back to `Idle`.

use crate::error::{Result, SchematicError};
use crate::geometry::Point;
use crate::schematic::{PinRef, Schematic};

/// The pin a wire starts from and its resolved position.
#[derive(Debug, Clone, PartialEq)]
pub struct WireAnchor {
    pub pin: PinRef,
    pub point: Point,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum WiringState {
    #[default]
    Idle,
    Armed(WireAnchor),
}

/// Successful transitions of a pin click.
#[derive(Debug, Clone, PartialEq)]
pub enum WiringOutcome {
    /// A wire was started from this anchor
    Armed(WireAnchor),
    /// The wire was committed as a new net
    Connected {
        net_id: String,
        from: PinRef,
        to: PinRef,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WiringSession {
    state: WiringState,
    /// Live cursor for the rubber-band preview, schematic space
    cursor: Option<Point>,
}

impl WiringSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WiringState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, WiringState::Armed(_))
    }

    pub fn anchor(&self) -> Option<&WireAnchor> {
        match &self.state {
            WiringState::Armed(anchor) => Some(anchor),
            WiringState::Idle => None,
        }
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    /// Feed a pin click into the machine.
    ///
    /// On the second valid click `Schematic::create_net` is called exactly
    /// once. Every error leaves the schematic untouched and the session
    /// `Idle`.
    pub fn click_pin(&mut self, schematic: &mut Schematic, pin: PinRef) -> Result<WiringOutcome> {
        match std::mem::take(&mut self.state) {
            WiringState::Idle => {
                let point = schematic
                    .pin_anchor(&pin.component_id, &pin.pin_id)
                    .ok_or_else(|| SchematicError::pin_not_found(&pin.component_id, &pin.pin_id))?;
                if schematic.is_pin_connected(&pin.component_id, &pin.pin_id) {
                    tracing::debug!("Refusing to start wire from connected pin {}", pin);
                    return Err(already_connected(&pin));
                }
                let anchor = WireAnchor { pin, point };
                self.state = WiringState::Armed(anchor.clone());
                self.cursor = Some(point);
                Ok(WiringOutcome::Armed(anchor))
            }
            WiringState::Armed(anchor) => {
                self.cursor = None;
                let from = anchor.pin;
                Self::validate_target(schematic, &from, &pin).map_err(|e| {
                    tracing::debug!("Wire {} -> {} rejected: {}", from, pin, e);
                    e
                })?;
                let net_id = schematic.create_net(from.clone(), pin.clone());
                tracing::info!("Connected {} to {} (net {})", from, pin, net_id);
                Ok(WiringOutcome::Connected {
                    net_id,
                    from,
                    to: pin,
                })
            }
        }
    }

    fn validate_target(schematic: &Schematic, from: &PinRef, to: &PinRef) -> Result<()> {
        if schematic.pin(to).is_none() {
            return Err(SchematicError::pin_not_found(&to.component_id, &to.pin_id));
        }
        // The anchor may have gone stale if its component was deleted mid-wire.
        if schematic.pin(from).is_none() {
            return Err(SchematicError::pin_not_found(&from.component_id, &from.pin_id));
        }
        if from.component_id == to.component_id {
            return Err(SchematicError::SelfConnection {
                component_id: to.component_id.clone(),
            });
        }
        if schematic.is_pin_connected(&to.component_id, &to.pin_id) {
            return Err(already_connected(to));
        }
        if schematic.is_pin_connected(&from.component_id, &from.pin_id) {
            return Err(already_connected(from));
        }
        Ok(())
    }

    /// Update the rubber-band cursor. Returns false when no wire is active.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        if !self.is_active() {
            return false;
        }
        self.cursor = Some(point);
        true
    }

    /// Abandon the in-progress wire. Returns whether anything was cancelled.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = WiringState::Idle;
        self.cursor = None;
        was_active
    }

    /// Segment from the anchor to the live cursor, while armed.
    pub fn preview(&self) -> Option<[Point; 2]> {
        let anchor = self.anchor()?;
        Some([anchor.point, self.cursor.unwrap_or(anchor.point)])
    }
}

fn already_connected(pin: &PinRef) -> SchematicError {
    SchematicError::PinAlreadyConnected {
        component_id: pin.component_id.clone(),
        pin_id: pin.pin_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuiltinCatalog;

    fn setup() -> (Schematic, String, String) {
        let catalog = BuiltinCatalog::new();
        let mut sch = Schematic::new();
        let r = sch
            .place_component(&catalog, "resistor", Point::new(100.0, 100.0))
            .unwrap();
        let u = sch
            .place_component(&catalog, "opamp", Point::new(300.0, 100.0))
            .unwrap();
        (sch, r, u)
    }

    #[test]
    fn test_two_clicks_create_net() {
        let (mut sch, r, u) = setup();
        let mut wiring = WiringSession::new();

        let outcome = wiring.click_pin(&mut sch, PinRef::new(&r, "2")).unwrap();
        assert!(matches!(outcome, WiringOutcome::Armed(ref a) if a.point == Point::new(160.0, 110.0)));
        assert!(wiring.is_active());
        assert_eq!(sch.net_count(), 0);

        let outcome = wiring.click_pin(&mut sch, PinRef::new(&u, "in_pos")).unwrap();
        match outcome {
            WiringOutcome::Connected { net_id, from, to } => {
                let net = sch.net(&net_id).unwrap();
                assert_eq!(net.connections, vec![from, to]);
            }
            other => panic!("expected connection, got {:?}", other),
        }
        assert_eq!(sch.net_count(), 1);
        assert_eq!(wiring.state(), &WiringState::Idle);
    }

    #[test]
    fn test_self_connection_rejected() {
        let (mut sch, r, _) = setup();
        let mut wiring = WiringSession::new();
        wiring.click_pin(&mut sch, PinRef::new(&r, "1")).unwrap();
        let before = sch.clone();

        let err = wiring.click_pin(&mut sch, PinRef::new(&r, "2")).unwrap_err();
        assert!(matches!(err, SchematicError::SelfConnection { .. }));
        assert_eq!(sch, before);
        assert!(!wiring.is_active());
    }

    #[test]
    fn test_same_pin_twice_is_self_connection() {
        let (mut sch, r, _) = setup();
        let mut wiring = WiringSession::new();
        wiring.click_pin(&mut sch, PinRef::new(&r, "1")).unwrap();
        let err = wiring.click_pin(&mut sch, PinRef::new(&r, "1")).unwrap_err();
        assert!(matches!(err, SchematicError::SelfConnection { .. }));
    }

    #[test]
    fn test_arming_on_connected_pin_rejected() {
        let (mut sch, r, u) = setup();
        sch.create_net(PinRef::new(&r, "2"), PinRef::new(&u, "in_pos"));
        let before = sch.clone();
        let mut wiring = WiringSession::new();

        for _ in 0..3 {
            let err = wiring.click_pin(&mut sch, PinRef::new(&r, "2")).unwrap_err();
            assert!(matches!(err, SchematicError::PinAlreadyConnected { .. }));
            assert_eq!(wiring, WiringSession::new());
            assert_eq!(sch, before);
        }
    }

    #[test]
    fn test_target_already_connected_rejected() {
        let (mut sch, r, u) = setup();
        sch.create_net(PinRef::new(&r, "2"), PinRef::new(&u, "in_pos"));
        let mut wiring = WiringSession::new();
        wiring.click_pin(&mut sch, PinRef::new(&u, "out")).unwrap();

        let err = wiring.click_pin(&mut sch, PinRef::new(&r, "2")).unwrap_err();
        assert!(matches!(err, SchematicError::PinAlreadyConnected { ref pin_id, .. } if pin_id == "2"));
        assert_eq!(sch.net_count(), 1);
        assert!(!wiring.is_active());
    }

    #[test]
    fn test_unknown_pin() {
        let (mut sch, r, _) = setup();
        let mut wiring = WiringSession::new();
        assert!(wiring
            .click_pin(&mut sch, PinRef::new(&r, "9"))
            .unwrap_err()
            .is_not_found());
        assert!(!wiring.is_active());
    }

    #[test]
    fn test_stale_anchor() {
        let (mut sch, r, u) = setup();
        let mut wiring = WiringSession::new();
        wiring.click_pin(&mut sch, PinRef::new(&r, "1")).unwrap();
        sch.delete_component(&r).unwrap();
        let err = wiring.click_pin(&mut sch, PinRef::new(&u, "out")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(sch.net_count(), 0);
    }

    #[test]
    fn test_pointer_move_and_cancel() {
        let (mut sch, r, _) = setup();
        let mut wiring = WiringSession::new();
        assert!(!wiring.pointer_move(Point::new(1.0, 1.0)));
        assert!(wiring.preview().is_none());

        wiring.click_pin(&mut sch, PinRef::new(&r, "1")).unwrap();
        let before = sch.clone();
        assert!(wiring.pointer_move(Point::new(50.0, 60.0)));
        assert_eq!(
            wiring.preview(),
            Some([Point::new(100.0, 110.0), Point::new(50.0, 60.0)])
        );
        assert!(wiring.cancel());
        assert!(!wiring.cancel());
        assert_eq!(sch, before);
        assert!(wiring.cursor().is_none());
    }
}
