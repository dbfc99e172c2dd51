#![forbid(unsafe_code)]

//! Document fixtures for tests and downstream harnesses.
//!
//! Gated behind the `test-helpers` feature so production builds never
//! carry fixture code.

use crate::document::{Document, NodeId};

/// Handles to the standard page fixture's landmarks.
#[derive(Debug, Clone, Copy)]
pub struct PageFixture {
    /// The `body` element.
    pub body: NodeId,
    /// The `.group-actions` trigger container.
    pub trigger_group: NodeId,
    /// The `script` element serving as the dialog insertion marker.
    pub marker: NodeId,
}

/// Build the canonical host page: a body containing a trigger-group
/// container followed by a script marker.
pub fn standard_page(doc: &mut Document) -> PageFixture {
    let root = doc.root();
    let body = doc.create_element("body");
    doc.append_child(root, body);

    let trigger_group = doc.create_element("div");
    doc.add_class(trigger_group, "group-actions");
    doc.append_child(body, trigger_group);

    let marker = doc.create_element("script");
    doc.append_child(body, marker);

    PageFixture {
        body,
        trigger_group,
        marker,
    }
}

/// Add an open-modal trigger button to a container.
pub fn trigger(doc: &mut Document, container: NodeId, modal_id: &str) -> NodeId {
    let button = doc.create_element("button");
    doc.add_class(button, "open-modal");
    doc.set_attr(button, "data-modalid", modal_id);
    doc.append_child(container, button);
    button
}

/// Add a plain focusable button with the given id.
pub fn focusable_button(doc: &mut Document, parent: NodeId, id: &str) -> NodeId {
    let button = doc.create_element("button");
    doc.set_attr(button, "id", id);
    doc.append_child(parent, button);
    button
}
