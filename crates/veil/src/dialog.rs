#![forbid(unsafe_code)]

//! Per-dialog bookkeeping.
//!
//! A [`Dialog`] owns everything the manager attached on its behalf: the
//! backdrop node, the close and overlay click listeners, the focus trap,
//! and the selector describing where focus should return. Teardown is
//! idempotent; every handle is taken exactly once.

use veil_dom::{Document, EventKind, ListenerId, NodeId};

use crate::focus::FocusTrap;

/// State for one open (or closing) dialog.
#[derive(Debug)]
pub(crate) struct Dialog {
    trigger_id: String,
    node: NodeId,
    serial: u64,
    prev_focus: Option<String>,
    close_listener: Option<ListenerId>,
    overlay_listener: Option<ListenerId>,
    trap: Option<FocusTrap>,
}

impl Dialog {
    pub(crate) fn new(trigger_id: &str, node: NodeId, serial: u64) -> Self {
        Self {
            trigger_id: trigger_id.to_string(),
            node,
            serial,
            prev_focus: None,
            close_listener: None,
            overlay_listener: None,
            trap: None,
        }
    }

    pub(crate) fn trigger_id(&self) -> &str {
        &self.trigger_id
    }

    pub(crate) fn node(&self) -> NodeId {
        self.node
    }

    pub(crate) fn serial(&self) -> u64 {
        self.serial
    }

    pub(crate) fn set_prev_focus(&mut self, selector: String) {
        self.prev_focus = Some(selector);
    }

    pub(crate) fn take_prev_focus(&mut self) -> Option<String> {
        self.prev_focus.take()
    }

    pub(crate) fn trap(&self) -> Option<&FocusTrap> {
        self.trap.as_ref()
    }

    /// Install a trap, removing any previous interceptor first.
    pub(crate) fn replace_trap(&mut self, doc: &mut Document, trap: Option<FocusTrap>) {
        if let Some(old) = self.trap.take() {
            old.remove(doc);
        }
        self.trap = trap;
    }

    /// Attach the close-affordance click listener.
    pub(crate) fn attach_close(&mut self, doc: &mut Document, target: NodeId) {
        self.close_listener = Some(doc.add_listener(target, EventKind::Click, true));
    }

    /// Attach the backdrop (overlay) click listener.
    pub(crate) fn attach_overlay(&mut self, doc: &mut Document) {
        self.overlay_listener = Some(doc.add_listener(self.node, EventKind::Click, true));
    }

    pub(crate) fn close_active(&self, doc: &Document) -> bool {
        self.close_listener.is_some_and(|id| doc.has_listener(id))
    }

    pub(crate) fn overlay_active(&self, doc: &Document) -> bool {
        self.overlay_listener.is_some_and(|id| doc.has_listener(id))
    }

    /// Remove every listener and the trap. Safe to call repeatedly.
    pub(crate) fn detach_all(&mut self, doc: &mut Document) {
        if let Some(id) = self.close_listener.take() {
            doc.remove_listener(id);
        }
        if let Some(id) = self.overlay_listener.take() {
            doc.remove_listener(id);
        }
        if let Some(trap) = self.trap.take() {
            trap.remove(doc);
        }
    }
}
