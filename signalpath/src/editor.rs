//! Editor session: the one place input turns into schematic mutations.
//!
//! `EditorSession` owns the live [`Schematic`] together with the wiring
//! machine, viewport, undo ledger and listeners. Every successful edit
//! commits the pre-edit snapshot to history, updates the status line and
//! notifies listeners. Rejections only update the status line.

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

use crate::catalog::{BuiltinCatalog, Catalog};
use crate::config::EditorConfig;
use crate::error::{Result, SchematicError};
use crate::events::{EditorEvent, Listeners, SubscriptionId};
use crate::geometry::Point;
use crate::history::History;
use crate::project::{self, LoadReport, ProjectMetadata};
use crate::routing::{self, RoutedWire};
use crate::schematic::{PinRef, PropertyValue, Schematic, SchematicStats};
use crate::viewport::Viewport;
use crate::wiring::{WiringOutcome, WiringSession};

/// Keys the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// Cmd on macOS
    pub meta: bool,
}

impl Modifiers {
    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    pub fn ctrl_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::default()
        }
    }

    fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    DeleteSelection,
    CancelWiring,
    Undo,
    Redo,
}

impl KeyAction {
    /// Map a key press to an editor action.
    ///
    /// Delete and Backspace are ignored while a text input has focus so
    /// property editing never deletes the component being edited.
    pub fn from_key(key: Key, modifiers: Modifiers, focus_in_text_input: bool) -> Option<Self> {
        match key {
            Key::Delete | Key::Backspace if !focus_in_text_input => Some(KeyAction::DeleteSelection),
            Key::Escape => Some(KeyAction::CancelWiring),
            Key::Char(c) if modifiers.command() => match c.to_ascii_lowercase() {
                'z' if modifiers.shift => Some(KeyAction::Redo),
                'z' => Some(KeyAction::Undo),
                'y' => Some(KeyAction::Redo),
                _ => None,
            },
            _ => None,
        }
    }
}

/// What a canvas click landed on
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasClick {
    Pin(WiringOutcome),
    Component(String),
    Empty,
}

/// An in-progress drag. The snapshot is committed once, when the drag ends.
#[derive(Debug, Clone)]
struct DragState {
    component_id: String,
    grab_offset: Point,
    origin: Point,
    snapshot: Schematic,
}

pub struct EditorSession {
    schematic: Schematic,
    wiring: WiringSession,
    viewport: Viewport,
    history: History<Schematic>,
    drag: Option<DragState>,
    catalog: Arc<dyn Catalog>,
    config: EditorConfig,
    metadata: Option<ProjectMetadata>,
    status: Option<String>,
    listeners: Listeners,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::build(Arc::new(BuiltinCatalog::new()), EditorConfig::default())
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("components", &self.schematic.component_count())
            .field("nets", &self.schematic.net_count())
            .field("wiring", &self.wiring.state())
            .field("status", &self.status)
            .finish()
    }
}

impl EditorSession {
    /// Create a session. The config is validated first.
    pub fn new(catalog: Arc<dyn Catalog>, config: EditorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(catalog, config))
    }

    fn build(catalog: Arc<dyn Catalog>, config: EditorConfig) -> Self {
        Self {
            schematic: Schematic::new(),
            wiring: WiringSession::new(),
            viewport: Viewport::from_valid(config.viewport.clone()),
            history: History::new(config.history_depth),
            drag: None,
            catalog,
            config,
            metadata: None,
            status: None,
            listeners: Listeners::new(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn schematic(&self) -> &Schematic {
        &self.schematic
    }

    pub fn wiring(&self) -> &WiringSession {
        &self.wiring
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    pub fn metadata(&self) -> Option<&ProjectMetadata> {
        self.metadata.as_ref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn component_count(&self) -> usize {
        self.schematic.component_count()
    }

    pub fn net_count(&self) -> usize {
        self.schematic.net_count()
    }

    pub fn has_selection(&self) -> bool {
        self.schematic.has_selection()
    }

    pub fn selected(&self) -> Option<&str> {
        self.schematic.selected()
    }

    pub fn stats(&self) -> SchematicStats {
        self.schematic.stats()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn zoom_percentage(&self) -> String {
        self.viewport.zoom_percentage()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Placement and editing
    // ------------------------------------------------------------------

    /// Place a catalog component with its origin at `position` (schematic
    /// space, snapped when configured).
    pub fn place_component(&mut self, catalog_id: &str, position: Point) -> Result<String> {
        let position = self.snap(position);
        let before = self.schematic.clone();
        let id = self
            .schematic
            .place_component(self.catalog.as_ref(), catalog_id, position)
            .map_err(|e| self.reject(e))?;

        let status = match self.schematic.component(&id) {
            Some(c) => format!("Added {} ({})", c.name, c.catalog_id),
            None => format!("Added {}", catalog_id),
        };
        self.commit(before, status);
        Ok(id)
    }

    /// Handle a palette drop. The payload is the catalog id.
    pub fn drop_payload(&mut self, payload: &str, screen_point: Point) -> Result<String> {
        let position = self.viewport.screen_to_schematic(screen_point);
        self.place_component(payload.trim(), position)
    }

    /// Move a component in one undoable step.
    pub fn move_component(&mut self, id: &str, position: Point) -> Result<()> {
        let position = self.snap(position);
        let before = self.schematic.clone();
        self.schematic
            .move_component(id, position)
            .map_err(|e| self.reject(e))?;
        if self.schematic == before {
            return Ok(());
        }
        let status = format!("Moved {}", self.component_name(id));
        self.commit(before, status);
        Ok(())
    }

    pub fn delete_component(&mut self, id: &str) -> Result<()> {
        let before = self.schematic.clone();
        let removed = self
            .schematic
            .delete_component(id)
            .map_err(|e| self.reject(e))?;

        if self
            .wiring
            .anchor()
            .map(|a| a.pin.component_id == id)
            .unwrap_or(false)
        {
            self.cancel_wiring();
        }
        if self.drag.as_ref().map(|d| d.component_id == id).unwrap_or(false) {
            self.drag = None;
        }
        self.commit(before, format!("Removed {}", removed.name));
        Ok(())
    }

    /// Delete the selected component. Returns false when nothing is selected.
    pub fn delete_selected(&mut self) -> Result<bool> {
        match self.schematic.selected().map(str::to_string) {
            Some(id) => self.delete_component(&id).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn set_property(
        &mut self,
        id: &str,
        key: &str,
        value: PropertyValue,
    ) -> Result<Option<PropertyValue>> {
        let before = self.schematic.clone();
        let previous = self
            .schematic
            .set_property(id, key, value)
            .map_err(|e| self.reject(e))?;
        if self.schematic != before {
            let status = format!("Updated {} of {}", key, self.component_name(id));
            self.commit(before, status);
        }
        Ok(previous)
    }

    /// Select a component, or clear the selection with `None`. Selection is
    /// not recorded in history.
    pub fn select(&mut self, id: Option<&str>) -> Result<bool> {
        let changed = self.schematic.select(id).map_err(|e| self.reject(e))?;
        if changed {
            self.emit_selection();
        }
        Ok(changed)
    }

    pub fn hover(&mut self, id: Option<&str>) -> Result<bool> {
        let changed = self.schematic.set_hovered(id).map_err(|e| self.reject(e))?;
        if changed {
            let hovered = self.schematic.hovered().map(str::to_string);
            self.emit(EditorEvent::HoverChanged { hovered });
        }
        Ok(changed)
    }

    // ------------------------------------------------------------------
    // Dragging
    // ------------------------------------------------------------------

    /// Start dragging the component under the pointer. The component is
    /// selected.
    pub fn begin_drag(&mut self, component_id: &str, screen_point: Point) -> Result<()> {
        let position = self
            .schematic
            .component(component_id)
            .map(|c| c.position)
            .ok_or_else(|| self.reject(SchematicError::component_not_found(component_id)))?;
        self.end_drag();

        let pointer = self.viewport.screen_to_schematic(screen_point);
        self.select(Some(component_id))?;
        self.drag = Some(DragState {
            component_id: component_id.to_string(),
            grab_offset: pointer - position,
            origin: position,
            snapshot: self.schematic.clone(),
        });
        Ok(())
    }

    /// Follow the pointer during a drag. Returns whether the component moved.
    pub fn drag_to(&mut self, screen_point: Point) -> Result<bool> {
        let Some((id, grab_offset)) = self
            .drag
            .as_ref()
            .map(|d| (d.component_id.clone(), d.grab_offset))
        else {
            return Ok(false);
        };
        let pointer = self.viewport.screen_to_schematic(screen_point);
        self.drag_component(&id, pointer - grab_offset)
    }

    /// Move a component as part of a drag, starting one if needed. Updates
    /// arrive in order; only the final position is committed to history.
    pub fn drag_component(&mut self, id: &str, position: Point) -> Result<bool> {
        let current = self
            .schematic
            .component(id)
            .map(|c| c.position)
            .ok_or_else(|| self.reject(SchematicError::component_not_found(id)))?;

        if self.drag.as_ref().map(|d| d.component_id != id).unwrap_or(true) {
            self.end_drag();
            self.drag = Some(DragState {
                component_id: id.to_string(),
                grab_offset: Point::default(),
                origin: current,
                snapshot: self.schematic.clone(),
            });
        }

        let position = self.snap(position);
        if position == current {
            return Ok(false);
        }
        self.schematic.move_component(id, position)?;
        let count = self.schematic.component_count();
        self.emit(EditorEvent::ComponentsChanged { count });
        Ok(true)
    }

    /// Finish the drag. Returns the final position when the component
    /// actually moved, in which case one history entry is recorded.
    pub fn end_drag(&mut self) -> Option<Point> {
        let drag = self.drag.take()?;
        let component = self.schematic.component(&drag.component_id)?;
        let position = component.position;
        if position == drag.origin {
            return None;
        }

        let status = format!("Moved {}", component.name);
        self.history.push(drag.snapshot);
        self.set_status(status);
        self.emit(EditorEvent::ComponentMoved {
            component_id: drag.component_id,
            position,
        });
        self.emit_history();
        Some(position)
    }

    // ------------------------------------------------------------------
    // Wiring
    // ------------------------------------------------------------------

    /// Feed a pin click to the wiring machine. A completed wire is one
    /// history entry.
    pub fn click_pin(&mut self, pin: PinRef) -> Result<WiringOutcome> {
        let was_active = self.wiring.is_active();
        let before = was_active.then(|| self.schematic.clone());

        match self.wiring.click_pin(&mut self.schematic, pin) {
            Ok(WiringOutcome::Armed(anchor)) => {
                let status = format!("Wiring from {}", self.pin_label(&anchor.pin));
                self.set_status(status);
                self.emit(EditorEvent::WiringChanged { active: true });
                Ok(WiringOutcome::Armed(anchor))
            }
            Ok(WiringOutcome::Connected { net_id, from, to }) => {
                let status = format!("Connected {} to {}", self.pin_label(&from), self.pin_label(&to));
                self.emit(EditorEvent::WiringChanged { active: false });
                if let Some(before) = before {
                    self.commit(before, status);
                }
                Ok(WiringOutcome::Connected { net_id, from, to })
            }
            Err(e) => {
                if was_active {
                    self.emit(EditorEvent::WiringChanged { active: false });
                }
                Err(self.reject(e))
            }
        }
    }

    /// Left click on the canvas: pins take priority over component bodies.
    /// Clicking empty canvas cancels wiring and clears the selection.
    pub fn click_canvas(&mut self, screen_point: Point) -> Result<CanvasClick> {
        let point = self.viewport.screen_to_schematic(screen_point);

        if let Some(pin) = self.schematic.pin_at(point, self.config.pin_hit_radius) {
            return self.click_pin(pin).map(CanvasClick::Pin);
        }

        self.cancel_wiring();
        match self.schematic.component_at(point).map(|c| c.id.clone()) {
            Some(id) => {
                self.select(Some(&id))?;
                Ok(CanvasClick::Component(id))
            }
            None => {
                self.select(None)?;
                Ok(CanvasClick::Empty)
            }
        }
    }

    /// Track the pointer for hover and the wire preview. Returns whether
    /// anything visible changed.
    pub fn pointer_move(&mut self, screen_point: Point) -> bool {
        let point = self.viewport.screen_to_schematic(screen_point);
        let mut changed = false;

        if self.wiring.pointer_move(point) {
            self.emit(EditorEvent::WiringChanged { active: true });
            changed = true;
        }

        let hovered = self.schematic.component_at(point).map(|c| c.id.clone());
        if let Ok(true) = self.schematic.set_hovered(hovered.as_deref()) {
            self.emit(EditorEvent::HoverChanged { hovered });
            changed = true;
        }
        changed
    }

    pub fn right_click(&mut self) -> bool {
        self.cancel_wiring()
    }

    pub fn cancel_wiring(&mut self) -> bool {
        if !self.wiring.cancel() {
            return false;
        }
        self.set_status("Wiring cancelled".to_string());
        self.emit(EditorEvent::WiringChanged { active: false });
        true
    }

    pub fn preview_wire(&self) -> Option<[Point; 2]> {
        self.wiring.preview()
    }

    /// Orthogonal polylines for every net
    pub fn routed_wires(&self) -> Vec<RoutedWire> {
        routing::route_all(&self.schematic, &self.config.router)
    }

    // ------------------------------------------------------------------
    // Keyboard and history
    // ------------------------------------------------------------------

    /// Handle a key press. Returns the action performed, if any.
    pub fn handle_key(
        &mut self,
        key: Key,
        modifiers: Modifiers,
        focus_in_text_input: bool,
    ) -> Result<Option<KeyAction>> {
        let Some(action) = KeyAction::from_key(key, modifiers, focus_in_text_input) else {
            return Ok(None);
        };
        let performed = match action {
            KeyAction::DeleteSelection => self.delete_selected()?,
            KeyAction::CancelWiring => self.cancel_wiring(),
            KeyAction::Undo => self.undo(),
            KeyAction::Redo => self.redo(),
        };
        Ok(performed.then_some(action))
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.schematic) {
            Some(previous) => {
                self.restore(previous, "Undo");
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.schematic) {
            Some(next) => {
                self.restore(next, "Redo");
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snapshot: Schematic, label: &str) {
        let before = std::mem::replace(&mut self.schematic, snapshot);
        self.drag = None;
        if self.wiring.cancel() {
            self.emit(EditorEvent::WiringChanged { active: false });
        }
        self.emit_diff(&before);
        self.set_status(label.to_string());
        self.emit_history();
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    pub fn zoom_at(&mut self, screen_point: Point, wheel_delta: f64) -> bool {
        let changed = self.viewport.zoom_at(screen_point, wheel_delta);
        if changed {
            self.emit_viewport();
        }
        changed
    }

    pub fn set_zoom(&mut self, scale: f64) -> bool {
        let changed = self.viewport.set_scale(scale);
        if changed {
            self.emit_viewport();
        }
        changed
    }

    pub fn pan(&mut self, delta: Point) {
        if delta == Point::default() {
            return;
        }
        self.viewport.pan(delta);
        self.emit_viewport();
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Replace the schematic with a project. The new graph is built in full
    /// first; on error the session is left exactly as it was.
    pub fn load_project(&mut self, content: &str) -> Result<LoadReport> {
        let loaded = project::load_project(content, self.catalog.as_ref())
            .map_err(|e| self.reject(e))?;

        let before = std::mem::replace(&mut self.schematic, loaded.schematic);
        self.metadata = loaded.metadata;
        self.history.clear();
        self.drag = None;
        if self.wiring.cancel() {
            self.emit(EditorEvent::WiringChanged { active: false });
        }
        self.emit_diff(&before);
        self.set_status(format!(
            "Loaded {} components and {} nets",
            self.schematic.component_count(),
            self.schematic.net_count()
        ));
        self.emit_history();
        Ok(loaded.report)
    }

    pub fn load_project_file(&mut self, path: &Path) -> Result<LoadReport> {
        let content = std::fs::read_to_string(path).map_err(|e| self.reject(e.into()))?;
        self.load_project(&content)
    }

    /// Serialize the schematic, stamping the project metadata.
    pub fn save_project(&mut self) -> Result<String> {
        let (content, metadata) = self.render_project()?;
        self.metadata = Some(metadata);
        Ok(content)
    }

    /// Write the project to `path`. The metadata is only stamped once the
    /// write has gone through.
    pub fn save_project_file(&mut self, path: &Path) -> Result<()> {
        let (content, metadata) = self.render_project()?;
        std::fs::write(path, content).map_err(|e| self.reject(e.into()))?;
        self.metadata = Some(metadata);
        self.set_status(format!("Saved {}", path.display()));
        Ok(())
    }

    fn render_project(&self) -> Result<(String, ProjectMetadata)> {
        let mut metadata = self.metadata.clone().unwrap_or_default();
        metadata.modified_at = Utc::now();
        let file = project::to_project_file(&self.schematic, Some(&metadata));
        Ok((serde_json::to_string_pretty(&file)?, metadata))
    }

    pub fn set_project_name(&mut self, name: &str) {
        self.metadata
            .get_or_insert_with(ProjectMetadata::default)
            .name = name.to_string();
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn snap(&self, position: Point) -> Point {
        if self.config.snap_to_grid {
            position.snap_to_grid(self.config.grid_size)
        } else {
            position
        }
    }

    fn component_name(&self, id: &str) -> String {
        self.schematic
            .component(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn pin_label(&self, pin: &PinRef) -> String {
        format!("{}.{}", self.component_name(&pin.component_id), pin.pin_id)
    }

    /// Record a finished edit whose pre-edit state is `before`.
    fn commit(&mut self, before: Schematic, status: String) {
        self.emit_diff(&before);
        self.history.push(before);
        self.set_status(status);
        self.emit_history();
    }

    /// Surface a refused operation on the status line and hand the error
    /// back to the caller.
    fn reject(&mut self, error: SchematicError) -> SchematicError {
        tracing::debug!("Rejected: {}", error);
        self.set_status(error.to_string());
        error
    }

    fn set_status(&mut self, message: String) {
        self.status = Some(message.clone());
        self.emit(EditorEvent::StatusMessage { message });
    }

    fn emit(&mut self, event: EditorEvent) {
        self.listeners.emit(&event);
    }

    fn emit_diff(&mut self, before: &Schematic) {
        if !before.components().eq(self.schematic.components()) {
            let count = self.schematic.component_count();
            self.emit(EditorEvent::ComponentsChanged { count });
        }
        if !before.nets().eq(self.schematic.nets()) {
            let count = self.schematic.net_count();
            self.emit(EditorEvent::NetsChanged { count });
        }
        if before.selected() != self.schematic.selected() {
            self.emit_selection();
        }
        if before.hovered() != self.schematic.hovered() {
            let hovered = self.schematic.hovered().map(str::to_string);
            self.emit(EditorEvent::HoverChanged { hovered });
        }
    }

    fn emit_selection(&mut self) {
        let selected = self.schematic.selected().map(str::to_string);
        let has_selection = selected.is_some();
        self.emit(EditorEvent::SelectionChanged {
            selected,
            has_selection,
        });
    }

    fn emit_history(&mut self) {
        let event = EditorEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        };
        self.emit(event);
    }

    fn emit_viewport(&mut self) {
        let event = EditorEvent::ViewportChanged {
            scale: self.viewport.scale(),
            offset: self.viewport.offset,
        };
        self.emit(event);
    }
}
