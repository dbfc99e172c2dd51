#![forbid(unsafe_code)]

//! The modal manager: dialog stack, lifecycle transitions, deferred
//! work.
//!
//! One manager owns one [`Document`] and is the only mutator of dialog
//! state within it. All public operations run synchronously on the
//! caller's thread; transitions that browsers stage asynchronously are
//! queued on an internal [`TimerQueue`](crate::timer::TimerQueue) and
//! run when the host calls [`ModalManager::tick`] (or, in tests,
//! [`ModalManager::flush_timers`]).
//!
//! # Invariants
//!
//! - The stack is strictly LIFO: `close` only ever removes the topmost
//!   dialog, and stale deferred tasks never resurrect a closed one.
//! - Every open dialog owns its listeners and trap; closing detaches
//!   them exactly once even when tasks fire late.
//! - A dialog's stacking order is `z_index_base + stack position`.
//!
//! # Failure Modes
//!
//! - `initialize` without a `body` element fails and leaves the manager
//!   inert; every later operation reports `NotInitialized` and no-ops.
//! - An unparseable focusable selector degrades the manager: dialogs
//!   open without traps and focus restore skips its focusability check.

use ahash::AHashMap;
use tracing::{debug, trace};
use veil_dom::{Document, NodeId, NodeSpec, Selector};
use web_time::Instant;

use crate::a11y;
use crate::builder::{DefaultNodeBuilder, DialogChrome, DialogNodeBuilder};
use crate::config::{ManagerConfig, Selectors, VISIBLE_CLASS, SCROLL_CLASS};
use crate::dialog::Dialog;
use crate::error::{ManagerError, report};
use crate::focus::{FocusTrap, restore_selector};
use crate::timer::{TimerQueue, TimerTask};

/// Content registered for one trigger id.
struct Registration {
    title: String,
    content: NodeSpec,
}

/// Observable manager state, for hosts and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSnapshot {
    /// Whether `initialize` has succeeded.
    pub initialized: bool,
    /// Registered trigger ids, sorted.
    pub registered: Vec<String>,
    /// Open dialog trigger ids, bottom of the stack first.
    pub stack: Vec<String>,
    /// Deferred tasks not yet run.
    pub pending_timers: usize,
}

/// Owns a document and manages the modal dialogs within it.
pub struct ModalManager {
    doc: Document,
    config: ManagerConfig,
    builder: Box<dyn DialogNodeBuilder>,
    selectors: Selectors,
    focusable: Option<Selector>,
    body: Option<NodeId>,
    marker: Option<NodeId>,
    trigger_group: Option<NodeId>,
    dialogs: Vec<Dialog>,
    registrations: AHashMap<String, Registration>,
    timers: TimerQueue,
    next_serial: u64,
    resize_epoch: u64,
    initialized: bool,
}

impl ModalManager {
    /// Create a manager over `doc` with default configuration.
    pub fn new(doc: Document) -> Self {
        Self::with_config(doc, ManagerConfig::default())
    }

    /// Create a manager over `doc` with the given configuration.
    pub fn with_config(doc: Document, config: ManagerConfig) -> Self {
        Self {
            doc,
            config,
            builder: Box::new(DefaultNodeBuilder),
            selectors: Selectors::standard(),
            focusable: None,
            body: None,
            marker: None,
            trigger_group: None,
            dialogs: Vec::new(),
            registrations: AHashMap::new(),
            timers: TimerQueue::new(),
            next_serial: 1,
            resize_epoch: 0,
            initialized: false,
        }
    }

    /// Replace the dialog chrome builder.
    pub fn set_node_builder(&mut self, builder: Box<dyn DialogNodeBuilder>) {
        self.builder = builder;
    }

    /// Register the content to render when `trigger_id` opens.
    ///
    /// Re-registering a trigger id replaces the previous content;
    /// already open dialogs are unaffected.
    pub fn register_content(&mut self, trigger_id: &str, title: &str, content: NodeSpec) {
        self.registrations.insert(
            trigger_id.to_string(),
            Registration {
                title: title.to_string(),
                content,
            },
        );
    }

    /// Locate document landmarks and parse the focusable selector.
    ///
    /// Idempotent; returns whether the manager is ready. A missing
    /// `body` fails initialization outright. A missing insertion marker
    /// degrades: dialogs append to the end of the body. Without a
    /// trigger container, trigger clicks are not wired at all;
    /// programmatic `open` still works. A focusable selector that fails
    /// to parse degrades focus handling but initialization still
    /// succeeds.
    pub fn initialize(&mut self) -> bool {
        if self.initialized {
            return true;
        }
        let Some(body) = self.doc.find("body") else {
            report(&ManagerError::DocumentUnavailable("body"));
            return false;
        };
        self.body = Some(body);
        self.marker = self.doc.find("script");
        self.trigger_group = self.doc.find(".group-actions");

        match Selector::parse(&self.config.focusable_selector) {
            Ok(sel) => self.focusable = Some(sel),
            Err(e) => {
                report(&ManagerError::SetupFailure {
                    stage: "focusable-selector",
                    reason: e.to_string(),
                });
                self.focusable = None;
            }
        }

        self.initialized = true;
        debug!(
            target: "veil",
            marker = self.marker.is_some(),
            trigger_group = self.trigger_group.is_some(),
            "manager initialized"
        );
        true
    }

    /// Open the dialog registered for `trigger_id`.
    ///
    /// Returns `true` when the dialog is open after the call, including
    /// the case where it already was. Returns `false` for an invalid or
    /// unregistered id, a failed build, or an uninitialized manager.
    pub fn open(&mut self, trigger_id: &str) -> bool {
        if !self.initialized {
            report(&ManagerError::NotInitialized("open"));
            return false;
        }
        let trigger_id = trigger_id.trim();
        if trigger_id.is_empty() {
            report(&ManagerError::InvalidTriggerId(trigger_id.to_string()));
            return false;
        }
        if self.dialogs.iter().any(|d| d.trigger_id() == trigger_id) {
            debug!(target: "veil", trigger_id, "dialog already open");
            return true;
        }
        self.open_dialog(trigger_id)
    }

    fn open_dialog(&mut self, trigger_id: &str) -> bool {
        let Some(registration) = self.registrations.get(trigger_id) else {
            report(&ManagerError::RenderFailure(format!(
                "no content registered for '{trigger_id}'"
            )));
            return false;
        };
        let chrome = DialogChrome {
            trigger_id: trigger_id.to_string(),
            title: registration.title.clone(),
            close_label: self.config.close_label.clone(),
            extra_class: self.config.dialog_class.clone(),
        };
        let content = registration.content.clone();
        let Some(node) = self.builder.build(&mut self.doc, &content, &chrome) else {
            report(&ManagerError::RenderFailure(format!(
                "builder produced no subtree for '{trigger_id}'"
            )));
            return false;
        };

        let serial = self.next_serial;
        self.next_serial += 1;
        let mut dialog = Dialog::new(trigger_id, node, serial);

        if let Some(active) = self.doc.active_element() {
            dialog.set_prev_focus(restore_selector(&self.doc, active));
        }

        if !self.attach(node) {
            report(&ManagerError::RenderFailure(format!(
                "could not attach dialog '{trigger_id}'"
            )));
            return false;
        }

        let index = self.dialogs.len();
        let close = a11y::annotate(
            &mut self.doc,
            node,
            index,
            self.config.z_index_base,
            &self.selectors,
        );
        if let Some(close) = close {
            dialog.attach_close(&mut self.doc, close);
        }
        dialog.attach_overlay(&mut self.doc);

        let trap = self
            .focusable
            .as_ref()
            .and_then(|sel| FocusTrap::install(&mut self.doc, node, sel));
        if trap.is_none() {
            debug!(target: "veil", trigger_id, "dialog opened without focus containment");
        }
        dialog.replace_trap(&mut self.doc, trap);

        self.dialogs.push(dialog);
        self.timers.schedule(
            Instant::now() + self.config.show_delay,
            TimerTask::Show { serial },
        );
        debug!(target: "veil", trigger_id, depth = self.dialogs.len(), "dialog opened");
        true
    }

    /// Attach a dialog node: before the insertion marker when one is
    /// present and still connected, otherwise at the end of the body.
    fn attach(&mut self, node: NodeId) -> bool {
        if let Some(marker) = self.marker
            && self.doc.insert_before(node, marker)
        {
            return true;
        }
        if let Some(body) = self.body {
            self.doc.append_child(body, node);
            return true;
        }
        false
    }

    /// Close the topmost dialog.
    ///
    /// Visibility drops immediately; node removal and focus restoration
    /// are deferred so exit transitions can play. With an empty stack
    /// this is a no-op returning `false`.
    pub fn close(&mut self) -> bool {
        if !self.initialized {
            report(&ManagerError::NotInitialized("close"));
            return false;
        }
        let Some(mut dialog) = self.dialogs.pop() else {
            trace!(target: "veil", "close with empty stack");
            return false;
        };
        let node = dialog.node();
        let serial = dialog.serial();
        self.doc.remove_class(node, VISIBLE_CLASS);
        dialog.detach_all(&mut self.doc);

        let now = Instant::now();
        if let Some(selector) = dialog.take_prev_focus() {
            self.timers.schedule(
                now + self.config.restore_delay,
                TimerTask::Restore { selector },
            );
        }
        self.timers.schedule(
            now + self.config.hide_delay,
            TimerTask::RemoveNode { node, serial },
        );
        debug!(
            target: "veil",
            trigger_id = dialog.trigger_id(),
            depth = self.dialogs.len(),
            "dialog closed"
        );
        true
    }

    /// Run every deferred task due at or before `now`. Returns how many
    /// ran.
    pub fn tick(&mut self, now: Instant) -> usize {
        let mut ran = 0;
        while let Some((at, task)) = self.timers.pop_due(now) {
            self.run_task(at, task);
            ran += 1;
        }
        ran
    }

    /// Drain the timer queue regardless of deadlines, in deadline
    /// order. Chained tasks (show then settle) keep their relative
    /// order. Returns how many ran.
    pub fn flush_timers(&mut self) -> usize {
        let mut ran = 0;
        while let Some((at, task)) = self.timers.pop_next() {
            self.run_task(at, task);
            ran += 1;
        }
        ran
    }

    /// Execute one deferred task. `at` is the task's deadline and the
    /// base instant for anything it schedules in turn.
    fn run_task(&mut self, at: Instant, task: TimerTask) {
        match task {
            TimerTask::Show { serial } => {
                let Some(index) = self.index_of_serial(serial) else {
                    trace!(target: "veil", serial, "show task outlived its dialog");
                    return;
                };
                let node = self.dialogs[index].node();
                self.doc.add_class(node, VISIBLE_CLASS);
                self.update_scroll_affordance(node);
                self.timers.schedule(
                    at + self.config.focus_settle_delay,
                    TimerTask::Settle { serial },
                );
            }
            TimerTask::Settle { serial } => {
                let Some(index) = self.index_of_serial(serial) else {
                    trace!(target: "veil", serial, "settle task outlived its dialog");
                    return;
                };
                let node = self.dialogs[index].node();
                let target = self
                    .doc
                    .query_within(node, &self.selectors.close)
                    .or_else(|| self.dialogs[index].trap().map(FocusTrap::first));
                if let Some(target) = target {
                    self.doc.focus(target);
                }
            }
            TimerTask::Restore { selector } => self.restore_focus(&selector),
            TimerTask::RemoveNode { node, serial } => {
                // A dialog reopened under the same id gets a fresh node,
                // so owning checks go by node, not trigger id.
                if self.dialogs.iter().any(|d| d.node() == node) {
                    trace!(target: "veil", serial, "remove task raced a live dialog");
                    return;
                }
                self.doc.remove(node);
            }
            TimerTask::FlushResize { epoch } => {
                if epoch != self.resize_epoch {
                    return;
                }
                let nodes: Vec<NodeId> = self.dialogs.iter().map(Dialog::node).collect();
                for node in nodes {
                    self.update_scroll_affordance(node);
                }
            }
        }
    }

    fn restore_focus(&mut self, selector: &str) {
        let Ok(sel) = Selector::parse(selector) else {
            trace!(target: "veil", selector, "unparseable restore selector");
            return;
        };
        let Some(target) = self.doc.query(&sel) else {
            trace!(target: "veil", selector, "restore target no longer present");
            return;
        };
        // Only hand focus back to something still focusable; with a
        // degraded focusable selector the check is skipped.
        if let Some(focusable) = &self.focusable
            && !self.doc.matches(target, focusable)
        {
            trace!(target: "veil", selector, "restore target not focusable");
            return;
        }
        self.doc.focus(target);
    }

    /// Toggle the scroll affordance on a dialog's content slot.
    fn update_scroll_affordance(&mut self, dialog_node: NodeId) {
        if let Some(content) = self.doc.query_within(dialog_node, &self.selectors.content) {
            let overflows = self.doc.scroll_height(content) > self.doc.client_height(content);
            self.doc.toggle_class(content, SCROLL_CLASS, overflows);
        }
    }

    /// Schedule a debounced scroll-affordance recompute. Each call
    /// supersedes pending ones; only the last burst member runs.
    pub(crate) fn schedule_resize_flush(&mut self) {
        self.resize_epoch += 1;
        self.timers.schedule(
            Instant::now() + self.config.resize_debounce,
            TimerTask::FlushResize {
                epoch: self.resize_epoch,
            },
        );
    }

    fn index_of_serial(&self, serial: u64) -> Option<usize> {
        self.dialogs.iter().position(|d| d.serial() == serial)
    }

    /// Tear everything down: close all dialogs, remove their nodes,
    /// drop pending tasks. The manager returns to the uninitialized
    /// state and can be initialized again.
    pub fn shutdown(&mut self) {
        let mut dialogs = std::mem::take(&mut self.dialogs);
        for dialog in &mut dialogs {
            dialog.detach_all(&mut self.doc);
            self.doc.remove(dialog.node());
        }
        self.timers.clear();
        self.body = None;
        self.marker = None;
        self.trigger_group = None;
        self.focusable = None;
        self.initialized = false;
        debug!(target: "veil", "manager shut down");
    }

    /// Current observable state.
    pub fn snapshot(&self) -> ManagerSnapshot {
        let mut registered: Vec<String> = self.registrations.keys().cloned().collect();
        registered.sort_unstable();
        ManagerSnapshot {
            initialized: self.initialized,
            registered,
            stack: self
                .dialogs
                .iter()
                .map(|d| d.trigger_id().to_string())
                .collect(),
            pending_timers: self.timers.len(),
        }
    }

    /// Number of open dialogs.
    pub fn open_count(&self) -> usize {
        self.dialogs.len()
    }

    /// The backdrop node of an open dialog.
    pub fn dialog_node(&self, trigger_id: &str) -> Option<NodeId> {
        self.dialogs
            .iter()
            .find(|d| d.trigger_id() == trigger_id)
            .map(Dialog::node)
    }

    pub(crate) fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    pub(crate) fn trigger_group(&self) -> Option<NodeId> {
        self.trigger_group
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Topmost dialog's node plus whether its close and overlay click
    /// listeners are still live.
    pub(crate) fn top_dialog_state(&self) -> Option<(NodeId, bool, bool)> {
        self.dialogs.last().map(|d| {
            (
                d.node(),
                d.close_active(&self.doc),
                d.overlay_active(&self.doc),
            )
        })
    }

    /// Offer a key event to the topmost dialog's focus trap.
    pub(crate) fn top_trap_handle_key(&mut self, event: &veil_dom::KeyEvent) -> bool {
        let Some(dialog) = self.dialogs.last() else {
            return false;
        };
        match dialog.trap() {
            Some(trap) => trap.handle_key(&mut self.doc, event),
            None => false,
        }
    }

    /// Default Tab traversal: step through the document's focusable
    /// elements in order, wrapping at the ends.
    pub(crate) fn default_tab_move(&mut self, backwards: bool) -> bool {
        let Some(focusable) = &self.focusable else {
            return false;
        };
        let candidates = self.doc.query_all(focusable);
        if candidates.is_empty() {
            return false;
        }
        let len = candidates.len();
        let target = match self
            .doc
            .active_element()
            .and_then(|a| candidates.iter().position(|&c| c == a))
        {
            Some(i) if backwards => candidates[(i + len - 1) % len],
            Some(i) => candidates[(i + 1) % len],
            None if backwards => candidates[len - 1],
            None => candidates[0],
        };
        self.doc.focus(target);
        true
    }

    /// The managed document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable access to the managed document, for hosts that drive
    /// layout metrics or page content outside dialog lifecycles.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }
}
