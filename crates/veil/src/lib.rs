#![forbid(unsafe_code)]

//! Modal dialog stack management over a headless document.
//!
//! `veil` keeps a LIFO stack of modal dialogs inside a
//! [`veil_dom::Document`]: it builds and attaches dialog chrome, traps
//! and restores keyboard focus, annotates dialogs for assistive
//! technology, and routes global input (Escape, Tab, clicks, resize)
//! against the stack. Work that browsers stage with timeouts is queued
//! deterministically and driven by the host through
//! [`ModalManager::tick`].
//!
//! # Example
//!
//! ```
//! use veil::ModalManager;
//! use veil_dom::{Document, NodeSpec};
//!
//! let mut doc = Document::new();
//! let root = doc.root();
//! let body = doc.create_element("body");
//! doc.append_child(root, body);
//!
//! let mut manager = ModalManager::new(doc);
//! assert!(manager.initialize());
//! manager.register_content("settings", "Settings", NodeSpec::new("p").text("hello"));
//! assert!(manager.open("settings"));
//! manager.flush_timers();
//! assert_eq!(manager.open_count(), 1);
//! ```

mod a11y;
pub mod builder;
pub mod config;
mod dialog;
pub mod error;
pub mod focus;
pub mod manager;
mod router;
mod timer;

pub use builder::{DefaultNodeBuilder, DialogChrome, DialogNodeBuilder};
pub use config::ManagerConfig;
pub use error::ManagerError;
pub use focus::FocusTrap;
pub use manager::{ManagerSnapshot, ModalManager};
