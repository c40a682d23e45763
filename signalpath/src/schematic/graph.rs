//! The schematic graph: authoritative component and net state.
//!
//! All mutations are total over stale ids: an unknown id is reported as
//! `NotFound` and nothing is changed. Only placement with an unknown catalog
//! id is a hard error.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

use super::model::*;
use crate::catalog::Catalog;
use crate::error::{Result, SchematicError};
use crate::geometry::Point;

/// Components, nets and the transient selection/hover state.
///
/// `Clone` produces a deep, independent copy, which is what the undo ledger
/// stores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schematic {
    /// Insertion order is z-order (last drawn on top)
    components: IndexMap<String, Component>,
    nets: IndexMap<String, Net>,
    selected: Option<String>,
    hovered: Option<String>,
}

/// Summary counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchematicStats {
    pub component_count: usize,
    pub net_count: usize,
    pub pin_count: usize,
    pub connected_pin_count: usize,
}

impl Schematic {
    /// Create a new empty schematic
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Place a new instance of `catalog_id` at `position` and select it.
    pub fn place_component<C: Catalog + ?Sized>(
        &mut self,
        catalog: &C,
        catalog_id: &str,
        position: Point,
    ) -> Result<String> {
        let definition = catalog
            .definition(catalog_id)
            .ok_or_else(|| SchematicError::UnknownCatalogId(catalog_id.to_string()))?;

        let id = uuid::Uuid::new_v4().to_string();
        let name = self.next_designator(&definition.designator_prefix);
        let component = Component::from_definition(id.clone(), name, definition, position);

        tracing::debug!(
            "Placed {} ({}) at ({}, {})",
            component.name,
            definition.id,
            position.x,
            position.y
        );
        self.components.insert(id.clone(), component);
        self.set_selected(Some(id.clone()));
        Ok(id)
    }

    /// Insert a fully built component, replacing nothing. Used by project
    /// loading, which has already checked id uniqueness.
    pub(crate) fn insert_component(&mut self, mut component: Component) {
        let position = component.position;
        component.set_position(position);
        component.selected = false;
        self.components.insert(component.id.clone(), component);
    }

    /// Move a component, recomputing its pins in place.
    pub fn move_component(&mut self, id: &str, position: Point) -> Result<()> {
        let component = self
            .components
            .get_mut(id)
            .ok_or_else(|| SchematicError::component_not_found(id))?;
        component.set_position(position);
        Ok(())
    }

    /// Delete a component and every net touching it.
    pub fn delete_component(&mut self, id: &str) -> Result<Component> {
        if !self.components.contains_key(id) {
            return Err(SchematicError::component_not_found(id));
        }

        for net_id in self.nets_touching(id) {
            self.remove_net(&net_id)?;
        }

        let component = self
            .components
            .shift_remove(id)
            .ok_or_else(|| SchematicError::component_not_found(id))?;

        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if self.hovered.as_deref() == Some(id) {
            self.hovered = None;
        }

        tracing::debug!("Deleted {} ({})", component.name, component.catalog_id);
        Ok(component)
    }

    /// Create a two-pin net. Callers validate first; this only records it.
    pub fn create_net(&mut self, a: PinRef, b: PinRef) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.insert_net(Net {
            id: id.clone(),
            connections: vec![a, b],
            name: None,
        });
        id
    }

    /// Record a net and set the back-reference on each member pin.
    pub(crate) fn insert_net(&mut self, net: Net) {
        for conn in &net.connections {
            if let Some(pin) = self.pin_mut(conn) {
                pin.net = Some(net.id.clone());
            }
        }
        tracing::debug!(
            "Created net {} ({})",
            net.id,
            net.connections
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" <-> ")
        );
        self.nets.insert(net.id.clone(), net);
    }

    /// Remove a net, clearing the back-reference on every member pin.
    pub fn remove_net(&mut self, id: &str) -> Result<Net> {
        let net = self
            .nets
            .shift_remove(id)
            .ok_or_else(|| SchematicError::net_not_found(id))?;
        for conn in &net.connections {
            if let Some(pin) = self.pin_mut(conn) {
                if pin.net.as_deref() == Some(id) {
                    pin.net = None;
                }
            }
        }
        tracing::debug!("Removed net {}", id);
        Ok(net)
    }

    /// Rename a net; `None` clears the name.
    pub fn rename_net(&mut self, id: &str, name: Option<String>) -> Result<()> {
        let net = self
            .nets
            .get_mut(id)
            .ok_or_else(|| SchematicError::net_not_found(id))?;
        net.name = name;
        Ok(())
    }

    /// Set a property, returning the previous value.
    pub fn set_property(
        &mut self,
        id: &str,
        key: &str,
        value: PropertyValue,
    ) -> Result<Option<PropertyValue>> {
        let component = self
            .components
            .get_mut(id)
            .ok_or_else(|| SchematicError::component_not_found(id))?;
        Ok(component.properties.insert(key.to_string(), value))
    }

    pub fn remove_property(&mut self, id: &str, key: &str) -> Result<Option<PropertyValue>> {
        let component = self
            .components
            .get_mut(id)
            .ok_or_else(|| SchematicError::component_not_found(id))?;
        Ok(component.properties.shift_remove(key))
    }

    pub fn rename_component(&mut self, id: &str, name: &str) -> Result<()> {
        let component = self
            .components
            .get_mut(id)
            .ok_or_else(|| SchematicError::component_not_found(id))?;
        component.name = name.to_string();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Selection and hover
    // ------------------------------------------------------------------

    /// Select a component (or clear with `None`). Returns whether the
    /// selection changed.
    pub fn select(&mut self, id: Option<&str>) -> Result<bool> {
        if let Some(id) = id {
            if !self.components.contains_key(id) {
                return Err(SchematicError::component_not_found(id));
            }
        }
        if self.selected.as_deref() == id {
            return Ok(false);
        }
        self.set_selected(id.map(str::to_string));
        Ok(true)
    }

    fn set_selected(&mut self, id: Option<String>) {
        if let Some(prev) = self.selected.take() {
            if let Some(c) = self.components.get_mut(&prev) {
                c.selected = false;
            }
        }
        if let Some(ref new_id) = id {
            if let Some(c) = self.components.get_mut(new_id) {
                c.selected = true;
            }
        }
        self.selected = id;
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_component(&self) -> Option<&Component> {
        self.selected.as_deref().and_then(|id| self.components.get(id))
    }

    pub fn has_selection(&self) -> bool {
        self.selected.is_some()
    }

    /// Set the hovered component. Returns whether it changed.
    pub fn set_hovered(&mut self, id: Option<&str>) -> Result<bool> {
        if let Some(id) = id {
            if !self.components.contains_key(id) {
                return Err(SchematicError::component_not_found(id));
            }
        }
        if self.hovered.as_deref() == id {
            return Ok(false);
        }
        self.hovered = id.map(str::to_string);
        Ok(true)
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.get(id)
    }

    /// Components in z-order
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn net(&self, id: &str) -> Option<&Net> {
        self.nets.get(id)
    }

    pub fn nets(&self) -> impl Iterator<Item = &Net> {
        self.nets.values()
    }

    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    pub fn pin(&self, pin: &PinRef) -> Option<&Pin> {
        self.components
            .get(&pin.component_id)
            .and_then(|c| c.pins.get(&pin.pin_id))
    }

    fn pin_mut(&mut self, pin: &PinRef) -> Option<&mut Pin> {
        self.components
            .get_mut(&pin.component_id)
            .and_then(|c| c.pins.get_mut(&pin.pin_id))
    }

    /// Absolute position of a pin
    pub fn pin_anchor(&self, component_id: &str, pin_id: &str) -> Option<Point> {
        self.components
            .get(component_id)
            .and_then(|c| c.pins.get(pin_id))
            .map(|p| p.absolute)
    }

    pub fn is_pin_connected(&self, component_id: &str, pin_id: &str) -> bool {
        self.components
            .get(component_id)
            .and_then(|c| c.pins.get(pin_id))
            .map(|p| p.is_connected())
            .unwrap_or(false)
    }

    /// Ids of every net touching any pin of the component
    pub fn nets_touching(&self, component_id: &str) -> BTreeSet<String> {
        self.nets
            .values()
            .filter(|n| n.touches_component(component_id))
            .map(|n| n.id.clone())
            .collect()
    }

    /// Topmost component containing the point
    pub fn component_at(&self, point: Point) -> Option<&Component> {
        self.components
            .values()
            .rev()
            .find(|c| c.bounds().contains(point))
    }

    /// Nearest pin within `radius` of the point. Ties go to the topmost
    /// component.
    pub fn pin_at(&self, point: Point, radius: f64) -> Option<PinRef> {
        let mut best: Option<(f64, PinRef)> = None;
        for component in self.components.values().rev() {
            for pin in component.pins.values() {
                let d = pin.absolute.distance_to(&point);
                if d <= radius && best.as_ref().map(|(bd, _)| d < *bd).unwrap_or(true) {
                    best = Some((d, PinRef::new(&component.id, &pin.id)));
                }
            }
        }
        best.map(|(_, r)| r)
    }

    /// Pins that are not part of any net
    pub fn unconnected_pins(&self) -> Vec<PinRef> {
        self.components
            .values()
            .flat_map(|c| {
                c.pins
                    .values()
                    .filter(|p| !p.is_connected())
                    .map(move |p| PinRef::new(&c.id, &p.id))
            })
            .collect()
    }

    pub fn stats(&self) -> SchematicStats {
        let pin_count = self.components.values().map(|c| c.pins.len()).sum();
        let connected_pin_count = self
            .components
            .values()
            .map(|c| c.connected_pins().count())
            .sum();
        SchematicStats {
            component_count: self.components.len(),
            net_count: self.nets.len(),
            pin_count,
            connected_pin_count,
        }
    }

    /// Check every structural invariant. Returns human-readable violations,
    /// empty when the schematic is consistent.
    pub fn integrity_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for net in self.nets.values() {
            for conn in &net.connections {
                match self.pin(conn) {
                    None => violations.push(format!("net {} references missing pin {}", net.id, conn)),
                    Some(pin) if pin.net.as_deref() != Some(net.id.as_str()) => violations.push(
                        format!("pin {} is in net {} but points at {:?}", conn, net.id, pin.net),
                    ),
                    Some(_) => {}
                }
            }
            if net.connections.len() < 2 {
                violations.push(format!("net {} has fewer than two members", net.id));
            }
        }

        for component in self.components.values() {
            for pin in component.pins.values() {
                if pin.absolute != component.position + pin.relative {
                    violations.push(format!("pin {}:{} has a stale position", component.id, pin.id));
                }
                if let Some(ref net_id) = pin.net {
                    let member = self
                        .nets
                        .get(net_id)
                        .map(|n| n.contains(&PinRef::new(&component.id, &pin.id)))
                        .unwrap_or(false);
                    if !member {
                        violations.push(format!(
                            "pin {}:{} points at net {} which does not list it",
                            component.id, pin.id, net_id
                        ));
                    }
                }
            }
        }

        for id in self.selected.iter().chain(self.hovered.iter()) {
            if !self.components.contains_key(id) {
                violations.push(format!("selection or hover points at missing component {}", id));
            }
        }

        violations
    }

    /// Next free designator for a prefix, e.g. "R3" when R1 and R2 exist.
    /// Falls back to the lowest free number once the highest one saturates.
    pub(crate) fn next_designator(&self, prefix: &str) -> String {
        let used: BTreeSet<u64> = self
            .components
            .values()
            .filter_map(|c| c.name.strip_prefix(prefix))
            .filter_map(|rest| rest.parse::<u64>().ok())
            .collect();
        let next = match used.iter().next_back() {
            None => 1,
            Some(highest) => highest
                .checked_add(1)
                .unwrap_or_else(|| (1..).find(|n| !used.contains(n)).unwrap_or(1)),
        };
        format!("{}{}", prefix, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuiltinCatalog;

    fn resistor_pair() -> (Schematic, String, String) {
        let catalog = BuiltinCatalog::new();
        let mut sch = Schematic::new();
        let r1 = sch
            .place_component(&catalog, "resistor", Point::new(0.0, 0.0))
            .unwrap();
        let r2 = sch
            .place_component(&catalog, "resistor", Point::new(200.0, 0.0))
            .unwrap();
        (sch, r1, r2)
    }

    #[test]
    fn test_place_selects_and_names() {
        let (sch, r1, r2) = resistor_pair();
        assert_eq!(sch.selected(), Some(r2.as_str()));
        assert!(!sch.component(&r1).unwrap().selected);
        assert!(sch.component(&r2).unwrap().selected);
        assert_eq!(sch.component(&r1).unwrap().name, "R1");
        assert_eq!(sch.component(&r2).unwrap().name, "R2");
    }

    #[test]
    fn test_designator_past_u32_range() {
        let catalog = BuiltinCatalog::new();
        let (mut sch, _, r2) = resistor_pair();
        sch.rename_component(&r2, "R4294967295").unwrap();
        let r3 = sch
            .place_component(&catalog, "resistor", Point::new(400.0, 0.0))
            .unwrap();
        assert_eq!(sch.component(&r3).unwrap().name, "R4294967296");

        sch.rename_component(&r3, "R18446744073709551615").unwrap();
        let r4 = sch
            .place_component(&catalog, "resistor", Point::new(600.0, 0.0))
            .unwrap();
        assert_eq!(sch.component(&r4).unwrap().name, "R2");
    }

    #[test]
    fn test_place_unknown_catalog_id() {
        let catalog = BuiltinCatalog::new();
        let mut sch = Schematic::new();
        let err = sch
            .place_component(&catalog, "flux_capacitor", Point::default())
            .unwrap_err();
        assert!(matches!(err, SchematicError::UnknownCatalogId(ref id) if id == "flux_capacitor"));
        assert_eq!(sch, Schematic::new());
    }

    #[test]
    fn test_move_updates_pins() {
        let (mut sch, r1, _) = resistor_pair();
        sch.move_component(&r1, Point::new(40.0, 50.0)).unwrap();
        assert_eq!(sch.pin_anchor(&r1, "1"), Some(Point::new(40.0, 60.0)));
        assert_eq!(sch.pin_anchor(&r1, "2"), Some(Point::new(100.0, 60.0)));
        assert!(sch.integrity_violations().is_empty());
    }

    #[test]
    fn test_move_missing_is_not_found() {
        let (mut sch, _, _) = resistor_pair();
        let before = sch.clone();
        let err = sch.move_component("ghost", Point::new(1.0, 1.0)).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(sch, before);
    }

    #[test]
    fn test_create_and_remove_net() {
        let (mut sch, r1, r2) = resistor_pair();
        let net = sch.create_net(PinRef::new(&r1, "2"), PinRef::new(&r2, "1"));
        assert!(sch.is_pin_connected(&r1, "2"));
        assert!(sch.is_pin_connected(&r2, "1"));
        assert!(!sch.is_pin_connected(&r1, "1"));
        assert_eq!(sch.nets_touching(&r1).into_iter().collect::<Vec<_>>(), vec![net.clone()]);

        sch.remove_net(&net).unwrap();
        assert!(!sch.is_pin_connected(&r1, "2"));
        assert!(!sch.is_pin_connected(&r2, "1"));
        assert!(sch.remove_net(&net).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_cascades_to_nets() {
        let (mut sch, r1, r2) = resistor_pair();
        sch.create_net(PinRef::new(&r1, "2"), PinRef::new(&r2, "1"));
        sch.create_net(PinRef::new(&r1, "1"), PinRef::new(&r2, "2"));

        let removed = sch.delete_component(&r2).unwrap();
        assert_eq!(removed.id, r2);
        assert_eq!(sch.net_count(), 0);
        assert!(!sch.is_pin_connected(&r1, "1"));
        assert!(!sch.is_pin_connected(&r1, "2"));
        assert_eq!(sch.selected(), None, "deleting the selection clears it");
        assert!(sch.integrity_violations().is_empty());
    }

    #[test]
    fn test_double_delete_is_not_found() {
        let (mut sch, r1, _) = resistor_pair();
        sch.delete_component(&r1).unwrap();
        let before = sch.clone();
        assert!(sch.delete_component(&r1).unwrap_err().is_not_found());
        assert_eq!(sch, before);
    }

    #[test]
    fn test_select_and_hover() {
        let (mut sch, r1, r2) = resistor_pair();
        assert!(sch.select(Some(&r1)).unwrap());
        assert!(!sch.select(Some(&r1)).unwrap());
        assert!(sch.component(&r1).unwrap().selected);
        assert!(!sch.component(&r2).unwrap().selected);
        assert!(sch.select(Some("ghost")).is_err());
        assert!(sch.select(None).unwrap());
        assert!(!sch.has_selection());

        assert!(sch.set_hovered(Some(&r2)).unwrap());
        sch.delete_component(&r2).unwrap();
        assert_eq!(sch.hovered(), None);
    }

    #[test]
    fn test_hit_testing() {
        let (sch, r1, r2) = resistor_pair();
        assert_eq!(sch.component_at(Point::new(10.0, 10.0)).map(|c| c.id.as_str()), Some(r1.as_str()));
        assert!(sch.component_at(Point::new(100.0, 10.0)).is_none());
        assert_eq!(
            sch.pin_at(Point::new(203.0, 11.0), 6.0),
            Some(PinRef::new(&r2, "1"))
        );
        assert_eq!(sch.pin_at(Point::new(100.0, 100.0), 6.0), None);
    }

    #[test]
    fn test_properties() {
        let (mut sch, r1, _) = resistor_pair();
        let prev = sch
            .set_property(&r1, "Resistance", PropertyValue::from("10kΩ"))
            .unwrap();
        assert_eq!(prev, Some(PropertyValue::from("1kΩ")));
        assert_eq!(
            sch.remove_property(&r1, "Tolerance").unwrap(),
            Some(PropertyValue::from("5%"))
        );
        assert!(sch.set_property("ghost", "a", true.into()).is_err());
    }

    #[test]
    fn test_stats_and_unconnected() {
        let (mut sch, r1, r2) = resistor_pair();
        sch.create_net(PinRef::new(&r1, "2"), PinRef::new(&r2, "1"));
        let stats = sch.stats();
        assert_eq!(stats.component_count, 2);
        assert_eq!(stats.net_count, 1);
        assert_eq!(stats.pin_count, 4);
        assert_eq!(stats.connected_pin_count, 2);
        assert_eq!(
            sch.unconnected_pins(),
            vec![PinRef::new(&r1, "1"), PinRef::new(&r2, "2")]
        );
    }

    #[test]
    fn test_snapshot_is_independent() {
        let (mut sch, r1, _) = resistor_pair();
        let snapshot = sch.clone();
        sch.move_component(&r1, Point::new(500.0, 500.0)).unwrap();
        assert_eq!(snapshot.component(&r1).unwrap().position, Point::new(0.0, 0.0));
        assert_ne!(snapshot, sch);
    }
}
