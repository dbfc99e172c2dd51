#![forbid(unsafe_code)]

//! Deterministic deferred-work queue.
//!
//! Transitions that browsers stage with timeouts (show, focus settle,
//! focus restore, node removal, resize flush) are queued here and run
//! when the host drives [`crate::ModalManager::tick`]. Nothing is ever
//! cancelled: tasks carry a serial or epoch and verify it against live
//! state before acting, so a task that outlived its dialog fires as a
//! no-op.
//!
//! # Invariants
//!
//! - Tasks pop in deadline order; equal deadlines pop in schedule order.
//! - `pop_due` never returns a task whose deadline is after `now`.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use veil_dom::NodeId;
use web_time::Instant;

/// A deferred unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TimerTask {
    /// Apply the visible state to the dialog with this serial.
    Show { serial: u64 },
    /// Move focus into the dialog with this serial.
    Settle { serial: u64 },
    /// Return focus to the element this selector described at open time.
    Restore { selector: String },
    /// Physically remove a closed dialog's node.
    RemoveNode { node: NodeId, serial: u64 },
    /// Recompute scroll affordances after a resize burst settles.
    FlushResize { epoch: u64 },
}

#[derive(Debug, Clone)]
struct Entry {
    at: Instant,
    seq: u64,
    task: TimerTask,
}

// Ordering ignores the task payload: (deadline, schedule order) only.
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.at.cmp(&other.at).then(self.seq.cmp(&other.seq))
    }
}

/// Min-heap of pending tasks keyed by deadline.
#[derive(Debug, Default)]
pub(crate) struct TimerQueue {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a task for execution at `at`.
    pub(crate) fn schedule(&mut self, at: Instant, task: TimerTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry { at, seq, task }));
    }

    /// Pop the earliest task whose deadline is at or before `now`.
    pub(crate) fn pop_due(&mut self, now: Instant) -> Option<(Instant, TimerTask)> {
        if self.heap.peek().is_some_and(|Reverse(e)| e.at <= now) {
            self.heap.pop().map(|Reverse(e)| (e.at, e.task))
        } else {
            None
        }
    }

    /// Pop the earliest task regardless of deadline.
    pub(crate) fn pop_next(&mut self) -> Option<(Instant, TimerTask)> {
        self.heap.pop().map(|Reverse(e)| (e.at, e.task))
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.heap.clear();
    }
}
