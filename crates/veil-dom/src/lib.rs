#![forbid(unsafe_code)]

//! Headless document model for the Veil modal manager.
//!
//! This crate provides the substrate the manager operates on without
//! depending on any real browser or rendering engine:
//!
//! - [`Document`]: an arena-backed element tree with attributes, classes,
//!   focus tracking, scroll metrics, and an event-listener registry.
//! - [`Selector`]: a small CSS-like selector engine (compound selectors,
//!   attribute tests, `:not()`, comma lists) that resolves every selector
//!   the manager uses, including the focusable-element criterion.
//! - [`event`]: input event types (keyboard, pointer, resize) routed by
//!   the manager's input router.
//! - [`NodeSpec`]: a declarative subtree description used to construct
//!   dialog chrome without string-built markup.
//!
//! The document is single-threaded: one logical owner mutates it from
//! event callbacks, so no interior locking exists anywhere.

pub mod document;
pub mod event;
pub mod selector;
pub mod spec;

#[cfg(feature = "test-helpers")]
pub mod fixture;

pub use document::{Document, Listener, ListenerId, NodeId};
pub use event::{EventKind, InputEvent, KeyCode, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use selector::{Selector, SelectorParseError};
pub use spec::NodeSpec;
