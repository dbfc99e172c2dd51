#![forbid(unsafe_code)]

//! Input event types dispatched into the modal manager.

use crate::document::NodeId;
use bitflags::bitflags;

/// Key codes the manager cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Escape,
    Tab,
    Enter,
    Backspace,
    Char(char),
}

bitflags! {
    /// Keyboard modifier state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a key event with explicit modifiers.
    pub const fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// Key press with no modifiers.
    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, Modifiers::empty())
    }

    /// Key press with Shift held.
    pub const fn shifted(code: KeyCode) -> Self {
        Self::new(code, Modifiers::SHIFT)
    }
}

/// Pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// A pointer (click) event with its target element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub button: MouseButton,
    pub target: NodeId,
}

impl PointerEvent {
    /// A left-button click on `target`.
    pub const fn click(target: NodeId) -> Self {
        Self {
            button: MouseButton::Left,
            target,
        }
    }
}

/// Event classes a listener can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    KeyDown,
}

/// An input event delivered to the manager's router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Pointer(PointerEvent),
    /// Viewport resize; the router debounces bursts of these.
    Resize,
}
