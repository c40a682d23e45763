//! Change notifications for views bound to an editor session.

use serde::Serialize;

use crate::geometry::Point;

/// What changed. Listeners re-read the session for the new values they need.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorEvent {
    ComponentsChanged { count: usize },
    NetsChanged { count: usize },
    SelectionChanged {
        selected: Option<String>,
        has_selection: bool,
    },
    HoverChanged { hovered: Option<String> },
    WiringChanged { active: bool },
    /// The named component finished a drag at this position
    ComponentMoved { component_id: String, position: Point },
    ViewportChanged { scale: f64, offset: Point },
    StatusMessage { message: String },
    HistoryChanged { can_undo: bool, can_redo: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&EditorEvent)>;

/// Ordered listener list. Listeners run synchronously in subscription order.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener)>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.entries.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn emit(&mut self, event: &EditorEvent) {
        tracing::trace!("event {:?}", event);
        for (_, listener) in self.entries.iter_mut() {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_subscribe_emit_unsubscribe() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::new();

        let sink = Rc::clone(&seen);
        let id = listeners.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        let event = EditorEvent::NetsChanged { count: 2 };
        listeners.emit(&event);
        assert_eq!(seen.borrow().as_slice(), &[event.clone()]);

        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.emit(&event);
        assert_eq!(seen.borrow().len(), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_event_json_shape() {
        let event = EditorEvent::SelectionChanged {
            selected: Some("r1".to_string()),
            has_selection: true,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "selection_changed");
        assert_eq!(value["has_selection"], true);
    }
}
