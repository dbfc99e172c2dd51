#![forbid(unsafe_code)]

//! Focus trapping and restoration.
//!
//! A [`FocusTrap`] wraps Tab traversal inside a dialog subtree: Tab on
//! the last focusable moves to the first, Shift+Tab on the first moves
//! to the last. Traversal between those edges is left to default
//! handling. With exactly one focusable element the trap pins focus
//! there; with none, no trap is installed and the dialog runs without
//! containment.
//!
//! # Invariants
//!
//! - The focusable list is snapshotted at install time, in document
//!   order. Reinstall after content changes to refresh it.
//! - The trap's key interceptor is non-passive; wrapping must be able
//!   to suppress the default move.

use veil_dom::{Document, EventKind, KeyCode, KeyEvent, ListenerId, Modifiers, NodeId, Selector};

/// An installed focus trap over one dialog subtree.
#[derive(Debug)]
pub struct FocusTrap {
    listener: ListenerId,
    focusables: Vec<NodeId>,
}

impl FocusTrap {
    /// Install a trap over the subtree rooted at `root`.
    ///
    /// Returns `None` when the subtree has no focusable elements.
    pub fn install(doc: &mut Document, root: NodeId, focusable: &Selector) -> Option<Self> {
        let focusables = doc.query_all_within(root, focusable);
        if focusables.is_empty() {
            return None;
        }
        let listener = doc.add_listener(root, EventKind::KeyDown, false);
        Some(Self {
            listener,
            focusables,
        })
    }

    /// Whether the trap's interceptor is still registered.
    pub fn is_active(&self, doc: &Document) -> bool {
        doc.has_listener(self.listener)
    }

    /// The first focusable element in the snapshot.
    pub fn first(&self) -> NodeId {
        self.focusables[0]
    }

    /// Elements the trap wraps over, in document order.
    pub fn focusables(&self) -> &[NodeId] {
        &self.focusables
    }

    /// Handle a key event while this trap's dialog is topmost.
    ///
    /// Returns `true` when the event was consumed (focus wrapped or
    /// pinned); `false` leaves the event to default traversal.
    pub fn handle_key(&self, doc: &mut Document, event: &KeyEvent) -> bool {
        if event.code != KeyCode::Tab || !self.is_active(doc) {
            return false;
        }
        let shift = event.modifiers.contains(Modifiers::SHIFT);
        let active = doc.active_element();

        if self.focusables.len() == 1 {
            doc.focus(self.focusables[0]);
            return true;
        }

        let first = self.focusables[0];
        let last = self.focusables[self.focusables.len() - 1];
        if shift && active == Some(first) {
            doc.focus(last);
            true
        } else if !shift && active == Some(last) {
            doc.focus(first);
            true
        } else {
            false
        }
    }

    /// Remove the trap's key interceptor. Idempotent.
    pub fn remove(&self, doc: &mut Document) {
        doc.remove_listener(self.listener);
    }
}

/// Describe the element to return focus to after a dialog closes.
///
/// Prefers the id, then the first class, then the bare tag name. The
/// result is a selector string that re-resolves at restore time, so a
/// replaced-but-equivalent element still receives focus.
pub(crate) fn restore_selector(doc: &Document, el: NodeId) -> String {
    if let Some(id) = doc.id(el) {
        return format!("#{id}");
    }
    if let Some(class) = doc.classes(el).first() {
        return format!(".{class}");
    }
    doc.tag(el).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_dom::fixture;

    fn focusable() -> Selector {
        Selector::parse(crate::config::FOCUSABLE_SELECTOR).unwrap()
    }

    fn dialog_with_buttons(doc: &mut Document, count: usize) -> (NodeId, Vec<NodeId>) {
        let fx = fixture::standard_page(doc);
        let dialog = doc.create_element("div");
        doc.append_child(fx.body, dialog);
        let buttons = (0..count)
            .map(|i| fixture::focusable_button(doc, dialog, &format!("b{i}")))
            .collect();
        (dialog, buttons)
    }

    #[test]
    fn no_focusables_means_no_trap() {
        let mut doc = Document::new();
        let fx = fixture::standard_page(&mut doc);
        let dialog = doc.create_element("div");
        doc.append_child(fx.body, dialog);
        assert!(FocusTrap::install(&mut doc, dialog, &focusable()).is_none());
    }

    #[test]
    fn tab_wraps_from_last_to_first() {
        let mut doc = Document::new();
        let (dialog, buttons) = dialog_with_buttons(&mut doc, 3);
        let trap = FocusTrap::install(&mut doc, dialog, &focusable()).unwrap();
        doc.focus(buttons[2]);
        assert!(trap.handle_key(&mut doc, &KeyEvent::plain(KeyCode::Tab)));
        assert_eq!(doc.active_element(), Some(buttons[0]));
    }

    #[test]
    fn shift_tab_wraps_from_first_to_last() {
        let mut doc = Document::new();
        let (dialog, buttons) = dialog_with_buttons(&mut doc, 3);
        let trap = FocusTrap::install(&mut doc, dialog, &focusable()).unwrap();
        doc.focus(buttons[0]);
        assert!(trap.handle_key(&mut doc, &KeyEvent::shifted(KeyCode::Tab)));
        assert_eq!(doc.active_element(), Some(buttons[2]));
    }

    #[test]
    fn interior_tab_is_not_consumed() {
        let mut doc = Document::new();
        let (dialog, buttons) = dialog_with_buttons(&mut doc, 3);
        let trap = FocusTrap::install(&mut doc, dialog, &focusable()).unwrap();
        doc.focus(buttons[1]);
        assert!(!trap.handle_key(&mut doc, &KeyEvent::plain(KeyCode::Tab)));
        assert_eq!(doc.active_element(), Some(buttons[1]));
    }

    #[test]
    fn single_focusable_pins() {
        let mut doc = Document::new();
        let (dialog, buttons) = dialog_with_buttons(&mut doc, 1);
        let trap = FocusTrap::install(&mut doc, dialog, &focusable()).unwrap();
        doc.blur();
        assert!(trap.handle_key(&mut doc, &KeyEvent::plain(KeyCode::Tab)));
        assert_eq!(doc.active_element(), Some(buttons[0]));
        assert!(trap.handle_key(&mut doc, &KeyEvent::shifted(KeyCode::Tab)));
        assert_eq!(doc.active_element(), Some(buttons[0]));
    }

    #[test]
    fn non_tab_keys_pass_through() {
        let mut doc = Document::new();
        let (dialog, _) = dialog_with_buttons(&mut doc, 2);
        let trap = FocusTrap::install(&mut doc, dialog, &focusable()).unwrap();
        assert!(!trap.handle_key(&mut doc, &KeyEvent::plain(KeyCode::Enter)));
    }

    #[test]
    fn removed_trap_goes_inert() {
        let mut doc = Document::new();
        let (dialog, buttons) = dialog_with_buttons(&mut doc, 2);
        let trap = FocusTrap::install(&mut doc, dialog, &focusable()).unwrap();
        trap.remove(&mut doc);
        trap.remove(&mut doc);
        assert!(!trap.is_active(&doc));
        doc.focus(buttons[1]);
        assert!(!trap.handle_key(&mut doc, &KeyEvent::plain(KeyCode::Tab)));
    }

    #[test]
    fn restore_selector_prefers_id() {
        let mut doc = Document::new();
        let fx = fixture::standard_page(&mut doc);
        let button = fixture::focusable_button(&mut doc, fx.body, "launch");
        assert_eq!(restore_selector(&doc, button), "#launch");

        let plain = doc.create_element("button");
        doc.add_class(plain, "open-modal");
        doc.append_child(fx.body, plain);
        assert_eq!(restore_selector(&doc, plain), ".open-modal");

        let bare = doc.create_element("textarea");
        doc.append_child(fx.body, bare);
        assert_eq!(restore_selector(&doc, bare), "textarea");
    }
}
