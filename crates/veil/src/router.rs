#![forbid(unsafe_code)]

//! Global input routing.
//!
//! One entry point, [`ModalManager::handle_event`], receives every
//! host-level input event and dispatches it against the current stack:
//!
//! - Escape closes the topmost dialog; lower dialogs never see it.
//! - Tab goes to the topmost dialog's focus trap first, then to
//!   default document traversal.
//! - Left clicks resolve trigger activation, close affordances, and
//!   backdrop dismissal by walking up from the click target.
//! - Resize events are debounced into one deferred recompute.

use tracing::trace;
use veil_dom::{InputEvent, KeyCode, KeyEvent, Modifiers, MouseButton, NodeId, PointerEvent};

use crate::config::TRIGGER_ID_ATTR;
use crate::error::{ManagerError, report};
use crate::manager::ModalManager;

impl ModalManager {
    /// Route one input event. Returns whether the event was consumed.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        if !self.is_initialized() {
            report(&ManagerError::NotInitialized("handle_event"));
            return false;
        }
        match event {
            InputEvent::Key(key) => self.route_key(&key),
            InputEvent::Pointer(pointer) => self.route_pointer(&pointer),
            InputEvent::Resize => {
                self.schedule_resize_flush();
                true
            }
        }
    }

    fn route_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Escape if key.modifiers.is_empty() => {
                if self.open_count() > 0 {
                    self.close()
                } else {
                    false
                }
            }
            KeyCode::Tab => {
                if self.top_trap_handle_key(key) {
                    return true;
                }
                self.default_tab_move(key.modifiers.contains(Modifiers::SHIFT))
            }
            _ => false,
        }
    }

    fn route_pointer(&mut self, pointer: &PointerEvent) -> bool {
        if pointer.button != MouseButton::Left {
            return false;
        }
        if let Some(trigger) = self.resolve_trigger(pointer.target) {
            return self.activate_trigger(trigger);
        }
        self.route_dialog_click(pointer.target)
    }

    /// A click activates a trigger when it lands on (or inside) an
    /// element with the trigger class inside the trigger container.
    fn resolve_trigger(&self, target: NodeId) -> Option<NodeId> {
        let trigger = self.document().closest(target, &self.selectors().trigger)?;
        let group = self.trigger_group()?;
        (trigger == group || self.document().contains(group, trigger)).then_some(trigger)
    }

    fn activate_trigger(&mut self, trigger: NodeId) -> bool {
        let Some(id) = self
            .document()
            .attr(trigger, TRIGGER_ID_ATTR)
            .map(|v| v.trim().to_string())
        else {
            report(&ManagerError::InvalidTriggerId(String::new()));
            return false;
        };
        self.open(&id)
    }

    /// Dismissal clicks are honored only for the topmost dialog, and
    /// only while the matching listener is still attached.
    fn route_dialog_click(&mut self, target: NodeId) -> bool {
        let Some((node, close_active, overlay_active)) = self.top_dialog_state() else {
            return false;
        };
        let on_close = self
            .document()
            .closest(target, &self.selectors().close)
            .is_some_and(|c| c == node || self.document().contains(node, c));
        if on_close {
            if close_active {
                return self.close();
            }
            trace!(target: "veil", "close affordance click after detach");
            return false;
        }
        if target == node {
            if overlay_active {
                return self.close();
            }
            trace!(target: "veil", "backdrop click after detach");
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_dom::{Document, NodeSpec, Selector, fixture};

    fn ready_manager() -> (ModalManager, NodeId) {
        let mut doc = Document::new();
        let fx = fixture::standard_page(&mut doc);
        let trigger = fixture::trigger(&mut doc, fx.trigger_group, "settings");
        let mut mgr = ModalManager::new(doc);
        assert!(mgr.initialize());
        mgr.register_content("settings", "Settings", NodeSpec::new("p").text("body"));
        mgr.register_content("about", "About", NodeSpec::new("p").text("about"));
        (mgr, trigger)
    }

    #[test]
    fn trigger_click_opens_dialog() {
        let (mut mgr, trigger) = ready_manager();
        assert!(mgr.handle_event(InputEvent::Pointer(PointerEvent::click(trigger))));
        assert_eq!(mgr.snapshot().stack, vec!["settings"]);
    }

    #[test]
    fn click_inside_trigger_bubbles_to_it() {
        let (mut mgr, trigger) = ready_manager();
        let icon = mgr.document_mut().create_element("span");
        mgr.document_mut().append_child(trigger, icon);
        assert!(mgr.handle_event(InputEvent::Pointer(PointerEvent::click(icon))));
        assert_eq!(mgr.open_count(), 1);
    }

    #[test]
    fn trigger_outside_group_is_ignored() {
        let (mut mgr, _) = ready_manager();
        let body = mgr.document().find("body").unwrap();
        let stray = {
            let doc = mgr.document_mut();
            let b = doc.create_element("button");
            doc.add_class(b, "open-modal");
            doc.set_attr(b, "data-modalid", "settings");
            doc.append_child(body, b);
            b
        };
        assert!(!mgr.handle_event(InputEvent::Pointer(PointerEvent::click(stray))));
        assert_eq!(mgr.open_count(), 0);
    }

    #[test]
    fn without_trigger_container_clicks_are_not_wired() {
        let mut doc = Document::new();
        let root = doc.root();
        let body = doc.create_element("body");
        doc.append_child(root, body);
        let trigger = {
            let b = doc.create_element("button");
            doc.add_class(b, "open-modal");
            doc.set_attr(b, "data-modalid", "settings");
            doc.append_child(body, b);
            b
        };
        let mut mgr = ModalManager::new(doc);
        assert!(mgr.initialize());
        mgr.register_content("settings", "Settings", NodeSpec::new("p"));

        assert!(!mgr.handle_event(InputEvent::Pointer(PointerEvent::click(trigger))));
        assert_eq!(mgr.open_count(), 0);
        // Programmatic open is independent of trigger wiring.
        assert!(mgr.open("settings"));
        assert_eq!(mgr.open_count(), 1);
    }

    #[test]
    fn trigger_id_is_trimmed() {
        let (mut mgr, trigger) = ready_manager();
        mgr.document_mut().set_attr(trigger, "data-modalid", "  settings  ");
        assert!(mgr.handle_event(InputEvent::Pointer(PointerEvent::click(trigger))));
        assert_eq!(mgr.snapshot().stack, vec!["settings"]);
    }

    #[test]
    fn trigger_without_id_attr_fails() {
        let (mut mgr, trigger) = ready_manager();
        mgr.document_mut().remove_attr(trigger, "data-modalid");
        assert!(!mgr.handle_event(InputEvent::Pointer(PointerEvent::click(trigger))));
        assert_eq!(mgr.open_count(), 0);
    }

    #[test]
    fn escape_closes_topmost_only() {
        let (mut mgr, _) = ready_manager();
        mgr.open("settings");
        mgr.open("about");
        assert!(mgr.handle_event(InputEvent::Key(KeyEvent::plain(KeyCode::Escape))));
        assert_eq!(mgr.snapshot().stack, vec!["settings"]);
        assert!(mgr.handle_event(InputEvent::Key(KeyEvent::plain(KeyCode::Escape))));
        assert!(mgr.snapshot().stack.is_empty());
        assert!(!mgr.handle_event(InputEvent::Key(KeyEvent::plain(KeyCode::Escape))));
    }

    #[test]
    fn modified_escape_passes_through() {
        let (mut mgr, _) = ready_manager();
        mgr.open("settings");
        let ev = KeyEvent::new(KeyCode::Escape, Modifiers::CONTROL);
        assert!(!mgr.handle_event(InputEvent::Key(ev)));
        assert_eq!(mgr.open_count(), 1);
    }

    #[test]
    fn close_button_click_dismisses() {
        let (mut mgr, _) = ready_manager();
        mgr.open("settings");
        mgr.flush_timers();
        let close = mgr.document().find(".modal-close").unwrap();
        assert!(mgr.handle_event(InputEvent::Pointer(PointerEvent::click(close))));
        assert_eq!(mgr.open_count(), 0);
    }

    #[test]
    fn backdrop_click_dismisses_but_container_does_not() {
        let (mut mgr, _) = ready_manager();
        mgr.open("settings");
        mgr.flush_timers();
        let node = mgr.dialog_node("settings").unwrap();
        let container = {
            let sel = Selector::parse(".modal-container").unwrap();
            mgr.document().query_within(node, &sel).unwrap()
        };
        assert!(!mgr.handle_event(InputEvent::Pointer(PointerEvent::click(container))));
        assert_eq!(mgr.open_count(), 1);
        assert!(mgr.handle_event(InputEvent::Pointer(PointerEvent::click(node))));
        assert_eq!(mgr.open_count(), 0);
    }

    #[test]
    fn lower_dialog_ignores_dismissal_clicks() {
        let (mut mgr, _) = ready_manager();
        mgr.open("settings");
        mgr.open("about");
        mgr.flush_timers();
        let lower = mgr.dialog_node("settings").unwrap();
        assert!(!mgr.handle_event(InputEvent::Pointer(PointerEvent::click(lower))));
        assert_eq!(mgr.snapshot().stack, vec!["settings", "about"]);
    }

    #[test]
    fn right_click_is_ignored() {
        let (mut mgr, trigger) = ready_manager();
        let ev = PointerEvent {
            button: MouseButton::Right,
            target: trigger,
        };
        assert!(!mgr.handle_event(InputEvent::Pointer(ev)));
        assert_eq!(mgr.open_count(), 0);
    }

    #[test]
    fn tab_wraps_inside_top_dialog() {
        let (mut mgr, _) = ready_manager();
        mgr.open("settings");
        mgr.flush_timers();
        let node = mgr.dialog_node("settings").unwrap();
        let close = {
            let sel = Selector::parse(".modal-close").unwrap();
            mgr.document().query_within(node, &sel).unwrap()
        };
        // Close button is the only focusable in the chrome; Tab pins.
        assert_eq!(mgr.document().active_element(), Some(close));
        assert!(mgr.handle_event(InputEvent::Key(KeyEvent::plain(KeyCode::Tab))));
        assert_eq!(mgr.document().active_element(), Some(close));
        assert!(mgr.handle_event(InputEvent::Key(KeyEvent::shifted(KeyCode::Tab))));
        assert_eq!(mgr.document().active_element(), Some(close));
    }

    #[test]
    fn tab_without_dialogs_walks_document_order() {
        let (mut mgr, trigger) = ready_manager();
        let group = mgr.document().find(".group-actions").unwrap();
        let second = fixture::focusable_button(mgr.document_mut(), group, "second");
        mgr.document_mut().focus(trigger);
        assert!(mgr.handle_event(InputEvent::Key(KeyEvent::plain(KeyCode::Tab))));
        assert_eq!(mgr.document().active_element(), Some(second));
        assert!(mgr.handle_event(InputEvent::Key(KeyEvent::plain(KeyCode::Tab))));
        assert_eq!(mgr.document().active_element(), Some(trigger));
        assert!(mgr.handle_event(InputEvent::Key(KeyEvent::shifted(KeyCode::Tab))));
        assert_eq!(mgr.document().active_element(), Some(second));
    }

    #[test]
    fn resize_debounce_coalesces() {
        let (mut mgr, _) = ready_manager();
        mgr.open("settings");
        mgr.flush_timers();
        assert!(mgr.handle_event(InputEvent::Resize));
        assert!(mgr.handle_event(InputEvent::Resize));
        assert_eq!(mgr.snapshot().pending_timers, 2);
        mgr.flush_timers();
        assert_eq!(mgr.snapshot().pending_timers, 0);
    }

    #[test]
    fn events_before_initialize_are_dropped() {
        let mut doc = Document::new();
        fixture::standard_page(&mut doc);
        let mut mgr = ModalManager::new(doc);
        assert!(!mgr.handle_event(InputEvent::Key(KeyEvent::plain(KeyCode::Escape))));
        assert!(!mgr.handle_event(InputEvent::Resize));
    }
}
