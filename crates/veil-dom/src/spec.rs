#![forbid(unsafe_code)]

//! Declarative subtree descriptions.
//!
//! [`NodeSpec`] replaces string-built markup: dialog chrome and content
//! are described as a typed tree and materialized in one step with
//! [`Document::build`]. Malformed descriptions (invalid tag names) are
//! rejected before any node is allocated, so a failed build never leaves
//! partial subtrees behind.

use crate::document::{Document, NodeId};

/// A declarative description of an element subtree.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// Start a spec for an element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set the `id` attribute.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a class.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Add an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Set text content.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child spec.
    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    /// The tag this spec describes.
    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    fn is_valid(&self) -> bool {
        valid_tag(&self.tag) && self.children.iter().all(NodeSpec::is_valid)
    }
}

/// Tag names: ASCII letter first, then letters, digits, or hyphens.
fn valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

impl Document {
    /// Materialize a spec into a detached subtree.
    ///
    /// Returns `None` without allocating anything when any tag in the
    /// spec tree is malformed.
    pub fn build(&mut self, spec: &NodeSpec) -> Option<NodeId> {
        if !spec.is_valid() {
            return None;
        }
        Some(self.build_valid(spec))
    }

    fn build_valid(&mut self, spec: &NodeSpec) -> NodeId {
        let node = self.create_element(&spec.tag);
        if let Some(id) = &spec.id {
            self.set_attr(node, "id", id);
        }
        for class in &spec.classes {
            self.add_class(node, class);
        }
        for (name, value) in &spec.attrs {
            self.set_attr(node, name, value);
        }
        if let Some(text) = &spec.text {
            self.set_text(node, text);
        }
        for child in &spec.children {
            let built = self.build_valid(child);
            self.append_child(node, built);
        }
        node
    }
}
