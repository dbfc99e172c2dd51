#![forbid(unsafe_code)]

//! Dialog node construction.
//!
//! [`DialogNodeBuilder`] is the seam for custom chrome: the manager
//! hands it the registered content spec plus a [`DialogChrome`]
//! describing the frame, and gets back a detached subtree to attach.
//! [`DefaultNodeBuilder`] produces the standard backdrop, container,
//! close affordance, title, and content slot.

use veil_dom::{Document, NodeId, NodeSpec};

use crate::config::{BACKDROP_CLASS, CLOSE_CLASS, CONTAINER_CLASS, CONTENT_CLASS, TITLE_CLASS};

/// Frame options for one dialog build.
#[derive(Debug, Clone)]
pub struct DialogChrome {
    /// The trigger id; becomes the backdrop's element id.
    pub trigger_id: String,
    /// Title text rendered in the header.
    pub title: String,
    /// Label for the close affordance.
    pub close_label: String,
    /// Extra class applied to the backdrop, when configured.
    pub extra_class: Option<String>,
}

/// Builds the element subtree for a dialog.
pub trait DialogNodeBuilder {
    /// Materialize a detached dialog subtree.
    ///
    /// Returns `None` when the content spec cannot be built; the open
    /// operation then fails without touching the document tree.
    fn build(
        &self,
        doc: &mut Document,
        content: &NodeSpec,
        chrome: &DialogChrome,
    ) -> Option<NodeId>;
}

/// The standard dialog chrome.
///
/// Produces, detached:
///
/// ```text
/// div.modal-backdrop#<trigger-id>
///   div.modal-container
///     button.modal-close
///     h2.modal-title
///     div.modal-content
///       <content>
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNodeBuilder;

impl DialogNodeBuilder for DefaultNodeBuilder {
    fn build(
        &self,
        doc: &mut Document,
        content: &NodeSpec,
        chrome: &DialogChrome,
    ) -> Option<NodeId> {
        let mut backdrop = NodeSpec::new("div")
            .class(BACKDROP_CLASS)
            .id(chrome.trigger_id.as_str());
        if let Some(extra) = &chrome.extra_class {
            backdrop = backdrop.class(extra.as_str());
        }
        let spec = backdrop.child(
            NodeSpec::new("div")
                .class(CONTAINER_CLASS)
                .child(
                    NodeSpec::new("button")
                        .class(CLOSE_CLASS)
                        .attr("type", "button")
                        .text(chrome.close_label.as_str()),
                )
                .child(
                    NodeSpec::new("h2")
                        .class(TITLE_CLASS)
                        .text(chrome.title.as_str()),
                )
                .child(NodeSpec::new("div").class(CONTENT_CLASS).child(content.clone())),
        );
        doc.build(&spec)
    }
}
