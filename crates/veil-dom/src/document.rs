#![forbid(unsafe_code)]

//! Arena-backed element tree with focus tracking and a listener registry.
//!
//! # Invariants
//!
//! - Node ids are never reused or invalidated: removal detaches a node
//!   from the tree but its slot survives, so a stale id can always be
//!   queried safely (it just reports `is_connected == false`).
//! - A node has at most one parent; `insert_before` and `append_child`
//!   detach the node from any previous parent first.
//! - The active element is always connected: disconnecting a subtree
//!   that contains it clears focus.
//! - Listener removal is idempotent: removing an unknown or already
//!   removed [`ListenerId`] is a no-op returning `false`.
//!
//! # Failure Modes
//!
//! - `insert_before` with a detached reference node returns `false`.
//! - `focus` on a disconnected node returns `false` and leaves the
//!   active element unchanged.

use ahash::AHashMap;

use crate::event::EventKind;
use crate::selector::Selector;

/// Handle to an element in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Raw arena index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Raw listener id.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// A registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listener {
    /// The element the listener is attached to.
    pub node: NodeId,
    /// The event class it observes.
    pub kind: EventKind,
    /// Passive listeners may not suppress default behavior.
    pub passive: bool,
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attrs: AHashMap<String, String>,
    classes: Vec<String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    scroll_height: u32,
    client_height: u32,
    z_index: Option<i32>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: AHashMap::new(),
            classes: Vec::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
            scroll_height: 0,
            client_height: 0,
            z_index: None,
        }
    }
}

/// A headless document: element arena, focus state, listener registry.
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    active: Option<NodeId>,
    listeners: AHashMap<ListenerId, Listener>,
    next_listener: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing only the root `html` element.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            active: None,
            listeners: AHashMap::new(),
            next_listener: 1,
        };
        doc.root = doc.alloc(Node::new("html"));
        doc
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// The root element.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    // --- Tree construction and mutation ---

    /// Create a detached element with the given tag.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::new(tag))
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Insert `new` immediately before `reference` under the same parent.
    ///
    /// Returns `false` when `reference` has no parent.
    pub fn insert_before(&mut self, new: NodeId, reference: NodeId) -> bool {
        let Some(parent) = self.node(reference).parent else {
            return false;
        };
        self.detach(new);
        self.node_mut(new).parent = Some(parent);
        let siblings = &mut self.node_mut(parent).children;
        let pos = siblings.iter().position(|&c| c == reference);
        match pos {
            Some(i) => siblings.insert(i, new),
            None => siblings.push(new),
        }
        true
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.node(node).parent {
            self.node_mut(parent).children.retain(|&c| c != node);
            self.node_mut(node).parent = None;
        }
    }

    /// Detach a node (and its subtree) from the document.
    ///
    /// The node remains addressable but is no longer connected. If the
    /// active element was inside the removed subtree, focus is cleared.
    pub fn remove(&mut self, node: NodeId) {
        if let Some(active) = self.active
            && (active == node || self.contains(node, active))
        {
            self.active = None;
        }
        self.detach(node);
    }

    /// Whether `node` is reachable from the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut cur = node;
        loop {
            if cur == self.root {
                return true;
            }
            match self.node(cur).parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    /// Whether `ancestor` strictly contains `node`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = self.node(node).parent;
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.node(p).parent;
        }
        false
    }

    /// Parent of a node, if attached.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    /// Children of a node, in order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    /// Lowercased tag name.
    pub fn tag(&self, node: NodeId) -> &str {
        &self.node(node).tag
    }

    // --- Attributes, classes, text ---

    /// Attribute value, if set.
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node).attrs.get(name).map(String::as_str)
    }

    /// Set an attribute.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        self.node_mut(node)
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    /// Remove an attribute.
    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        self.node_mut(node).attrs.remove(name);
    }

    /// The `id` attribute, if set.
    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.attr(node, "id")
    }

    /// Add a class if not already present.
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        let n = self.node_mut(node);
        if !n.classes.iter().any(|c| c == class) {
            n.classes.push(class.to_string());
        }
    }

    /// Remove a class.
    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        self.node_mut(node).classes.retain(|c| c != class);
    }

    /// Set a class present or absent (the `classList.toggle(_, force)` shape).
    pub fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        if on {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
    }

    /// Whether the node carries a class.
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node).classes.iter().any(|c| c == class)
    }

    /// Classes in insertion order.
    pub fn classes(&self, node: NodeId) -> &[String] {
        &self.node(node).classes
    }

    /// Text content.
    pub fn text(&self, node: NodeId) -> &str {
        &self.node(node).text
    }

    /// Set text content.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.node_mut(node).text = text.to_string();
    }

    // --- Layout metrics and stacking ---

    /// Set scroll metrics (normally driven by a layout adapter or test).
    pub fn set_scroll_metrics(&mut self, node: NodeId, scroll_height: u32, client_height: u32) {
        let n = self.node_mut(node);
        n.scroll_height = scroll_height;
        n.client_height = client_height;
    }

    /// Total scrollable height of the node's content.
    pub fn scroll_height(&self, node: NodeId) -> u32 {
        self.node(node).scroll_height
    }

    /// Visible height of the node.
    pub fn client_height(&self, node: NodeId) -> u32 {
        self.node(node).client_height
    }

    /// Set the inline stacking order.
    pub fn set_z_index(&mut self, node: NodeId, z: i32) {
        self.node_mut(node).z_index = Some(z);
    }

    /// Inline stacking order, if assigned.
    pub fn z_index(&self, node: NodeId) -> Option<i32> {
        self.node(node).z_index
    }

    // --- Focus ---

    /// The currently focused element.
    pub fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    /// Focus a node. Returns `false` if the node is not connected.
    pub fn focus(&mut self, node: NodeId) -> bool {
        if !self.is_connected(node) {
            return false;
        }
        self.active = Some(node);
        true
    }

    /// Clear focus.
    pub fn blur(&mut self) {
        self.active = None;
    }

    // --- Listener registry ---

    /// Register an event listener on a node.
    pub fn add_listener(&mut self, node: NodeId, kind: EventKind, passive: bool) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(
            id,
            Listener {
                node,
                kind,
                passive,
            },
        );
        id
    }

    /// Remove a listener. Safe to call for ids that were never registered
    /// or already removed; returns whether a listener was removed.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Whether a listener is still registered.
    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.listeners.contains_key(&id)
    }

    /// Look up a registered listener.
    pub fn listener(&self, id: ListenerId) -> Option<Listener> {
        self.listeners.get(&id).copied()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // --- Queries ---

    /// Pre-order walk of the subtree under `root`, excluding `root` itself.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.node(root).children.iter().rev().copied().collect();
        while let Some(n) = pending.pop() {
            out.push(n);
            pending.extend(self.node(n).children.iter().rev());
        }
        out
    }

    /// Whether a node matches a selector.
    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        let n = self.node(node);
        selector.matches(&n.tag, &n.attrs, &n.classes)
    }

    /// First matching element in document order.
    pub fn query(&self, selector: &Selector) -> Option<NodeId> {
        self.query_within(self.root, selector)
    }

    /// All matching elements in document order.
    pub fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.query_all_within(self.root, selector)
    }

    /// First matching descendant of `root`.
    pub fn query_within(&self, root: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&n| self.matches(n, selector))
    }

    /// All matching descendants of `root`, in document order.
    pub fn query_all_within(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&n| self.matches(n, selector))
            .collect()
    }

    /// Closest ancestor-or-self matching the selector.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if self.matches(n, selector) {
                return Some(n);
            }
            cur = self.node(n).parent;
        }
        None
    }

    /// First element matching a selector string; `None` for no match or a
    /// selector that fails to parse.
    pub fn find(&self, selector: &str) -> Option<NodeId> {
        let sel = Selector::parse(selector).ok()?;
        self.query(&sel)
    }

    /// All elements matching a selector string; empty for parse failures.
    pub fn find_all(&self, selector: &str) -> Vec<NodeId> {
        match Selector::parse(selector) {
            Ok(sel) => self.query_all(&sel),
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(doc: &mut Document) -> NodeId {
        let root = doc.root();
        let body = doc.create_element("body");
        doc.append_child(root, body);
        body
    }

    #[test]
    fn new_document_has_root() {
        let doc = Document::new();
        assert_eq!(doc.tag(doc.root()), "html");
        assert!(doc.is_connected(doc.root()));
    }

    #[test]
    fn append_and_connectivity() {
        let mut doc = Document::new();
        let body = body(&mut doc);
        let div = doc.create_element("div");
        assert!(!doc.is_connected(div));
        doc.append_child(body, div);
        assert!(doc.is_connected(div));
        assert!(doc.contains(body, div));
        assert!(!doc.contains(div, body));
    }

    #[test]
    fn insert_before_orders_siblings() {
        let mut doc = Document::new();
        let body = body(&mut doc);
        let a = doc.create_element("a");
        let script = doc.create_element("script");
        doc.append_child(body, script);
        assert!(doc.insert_before(a, script));
        assert_eq!(doc.children(body), &[a, script]);
    }

    #[test]
    fn insert_before_detached_reference_fails() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        let orphan = doc.create_element("div");
        assert!(!doc.insert_before(a, orphan));
    }

    #[test]
    fn remove_disconnects_subtree() {
        let mut doc = Document::new();
        let body = body(&mut doc);
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.append_child(body, outer);
        doc.append_child(outer, inner);
        doc.remove(outer);
        assert!(!doc.is_connected(outer));
        assert!(!doc.is_connected(inner));
        // Ids stay addressable after removal.
        assert_eq!(doc.tag(inner), "span");
    }

    #[test]
    fn removing_focused_subtree_clears_focus() {
        let mut doc = Document::new();
        let body = body(&mut doc);
        let div = doc.create_element("div");
        let button = doc.create_element("button");
        doc.append_child(body, div);
        doc.append_child(div, button);
        assert!(doc.focus(button));
        doc.remove(div);
        assert_eq!(doc.active_element(), None);
    }

    #[test]
    fn focus_rejects_disconnected() {
        let mut doc = Document::new();
        let loose = doc.create_element("button");
        assert!(!doc.focus(loose));
        assert_eq!(doc.active_element(), None);
    }

    #[test]
    fn class_toggle_forces_state() {
        let mut doc = Document::new();
        let body = body(&mut doc);
        doc.toggle_class(body, "has-scroll", true);
        doc.toggle_class(body, "has-scroll", true);
        assert!(doc.has_class(body, "has-scroll"));
        assert_eq!(doc.classes(body).len(), 1);
        doc.toggle_class(body, "has-scroll", false);
        assert!(!doc.has_class(body, "has-scroll"));
    }

    #[test]
    fn listener_removal_is_idempotent() {
        let mut doc = Document::new();
        let body = body(&mut doc);
        let id = doc.add_listener(body, EventKind::Click, true);
        assert!(doc.has_listener(id));
        assert!(doc.remove_listener(id));
        assert!(!doc.remove_listener(id));
        assert!(!doc.has_listener(id));
    }

    #[test]
    fn find_by_id_and_class() {
        let mut doc = Document::new();
        let body = body(&mut doc);
        let div = doc.create_element("div");
        doc.set_attr(div, "id", "launch");
        doc.add_class(div, "group-actions");
        doc.append_child(body, div);
        assert_eq!(doc.find("#launch"), Some(div));
        assert_eq!(doc.find(".group-actions"), Some(div));
        assert_eq!(doc.find("span"), None);
        assert!(doc.find("#(bad").is_none());
    }

    #[test]
    fn query_order_is_document_order() {
        let mut doc = Document::new();
        let body = body(&mut doc);
        let first = doc.create_element("button");
        let wrap = doc.create_element("div");
        let second = doc.create_element("button");
        doc.append_child(body, first);
        doc.append_child(body, wrap);
        doc.append_child(wrap, second);
        let sel = Selector::parse("button").unwrap();
        assert_eq!(doc.query_all(&sel), vec![first, second]);
    }

    #[test]
    fn closest_walks_ancestors() {
        let mut doc = Document::new();
        let body = body(&mut doc);
        let backdrop = doc.create_element("div");
        doc.add_class(backdrop, "modal-backdrop");
        let inner = doc.create_element("span");
        doc.append_child(body, backdrop);
        doc.append_child(backdrop, inner);
        let sel = Selector::parse(".modal-backdrop").unwrap();
        assert_eq!(doc.closest(inner, &sel), Some(backdrop));
        assert_eq!(doc.closest(backdrop, &sel), Some(backdrop));
        assert_eq!(doc.closest(body, &sel), None);
    }
}
