#![forbid(unsafe_code)]

//! Manager configuration and the class/attribute vocabulary shared by
//! the node builder, annotator, and router.

use std::time::Duration;

use veil_dom::Selector;

/// Class marking a dialog's outermost backdrop element.
pub const BACKDROP_CLASS: &str = "modal-backdrop";
/// Class on the inner dialog container.
pub const CONTAINER_CLASS: &str = "modal-container";
/// Class on the close affordance.
pub const CLOSE_CLASS: &str = "modal-close";
/// Class on the scrollable content slot.
pub const CONTENT_CLASS: &str = "modal-content";
/// Class on the dialog title element.
pub const TITLE_CLASS: &str = "modal-title";
/// Class marking an open-modal trigger element.
pub const TRIGGER_CLASS: &str = "open-modal";
/// Attribute on a trigger naming the dialog it opens.
pub const TRIGGER_ID_ATTR: &str = "data-modalid";
/// Class added when a dialog becomes visible.
pub const VISIBLE_CLASS: &str = "show";
/// Class toggled on a content slot that overflows vertically.
pub const SCROLL_CLASS: &str = "has-scroll";

/// Default focusable-element criterion: interactive elements not
/// explicitly excluded from tab order.
pub const FOCUSABLE_SELECTOR: &str =
    "button, [href], input, select, textarea, [tabindex]:not([tabindex=\"-1\"])";

/// Tunable delays and chrome options for the modal manager.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Delay before the visible state is applied to a newly opened dialog.
    pub show_delay: Duration,
    /// Delay between close and physical node removal (exit transition).
    pub hide_delay: Duration,
    /// Delay before focus settles inside a freshly shown dialog.
    pub focus_settle_delay: Duration,
    /// Delay before focus returns to the pre-open element after close.
    pub restore_delay: Duration,
    /// Coalescing window for resize bursts.
    pub resize_debounce: Duration,
    /// Base stacking order; dialog `i` renders at `z_index_base + i`.
    pub z_index_base: i32,
    /// Selector describing focusable elements (focus trap + restore).
    pub focusable_selector: String,
    /// Text content of the generated close affordance.
    pub close_label: String,
    /// Extra class applied to every dialog backdrop.
    pub dialog_class: Option<String>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            show_delay: Duration::from_millis(0),
            hide_delay: Duration::from_millis(300),
            focus_settle_delay: Duration::from_millis(50),
            restore_delay: Duration::from_millis(100),
            resize_debounce: Duration::from_millis(250),
            z_index_base: 1000,
            focusable_selector: FOCUSABLE_SELECTOR.to_string(),
            close_label: "\u{d7}".to_string(),
            dialog_class: None,
        }
    }
}

impl ManagerConfig {
    /// Set the show delay.
    pub fn show_delay(mut self, delay: Duration) -> Self {
        self.show_delay = delay;
        self
    }

    /// Set the hide delay.
    pub fn hide_delay(mut self, delay: Duration) -> Self {
        self.hide_delay = delay;
        self
    }

    /// Set the focus settle delay.
    pub fn focus_settle_delay(mut self, delay: Duration) -> Self {
        self.focus_settle_delay = delay;
        self
    }

    /// Set the focus restore delay.
    pub fn restore_delay(mut self, delay: Duration) -> Self {
        self.restore_delay = delay;
        self
    }

    /// Set the resize debounce window.
    pub fn resize_debounce(mut self, window: Duration) -> Self {
        self.resize_debounce = window;
        self
    }

    /// Set the base stacking order.
    pub fn z_index_base(mut self, base: i32) -> Self {
        self.z_index_base = base;
        self
    }

    /// Override the focusable-element criterion.
    pub fn focusable_selector(mut self, selector: impl Into<String>) -> Self {
        self.focusable_selector = selector.into();
        self
    }

    /// Set the close affordance label.
    pub fn close_label(mut self, label: impl Into<String>) -> Self {
        self.close_label = label.into();
        self
    }

    /// Apply an extra class to every dialog backdrop.
    pub fn dialog_class(mut self, class: impl Into<String>) -> Self {
        self.dialog_class = Some(class.into());
        self
    }
}

/// Pre-parsed selectors for the built-in vocabulary.
///
/// These come from compile-time constants, so a parse failure is a
/// programming error; failing loudly at construction is preferable to
/// a half-initialized manager.
pub(crate) struct Selectors {
    pub trigger: Selector,
    pub close: Selector,
    pub content: Selector,
    pub title: Selector,
}

impl Selectors {
    pub(crate) fn standard() -> Self {
        Self {
            trigger: parse_static(&format!(".{TRIGGER_CLASS}")),
            close: parse_static(&format!(".{CLOSE_CLASS}")),
            content: parse_static(&format!(".{CONTENT_CLASS}")),
            title: parse_static(&format!(".{TITLE_CLASS}")),
        }
    }
}

fn parse_static(selector: &str) -> Selector {
    Selector::parse(selector).expect("built-in selector must parse")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ManagerConfig::default();
        assert_eq!(config.show_delay, Duration::from_millis(0));
        assert_eq!(config.hide_delay, Duration::from_millis(300));
        assert_eq!(config.focus_settle_delay, Duration::from_millis(50));
        assert_eq!(config.restore_delay, Duration::from_millis(100));
        assert_eq!(config.resize_debounce, Duration::from_millis(250));
        assert_eq!(config.z_index_base, 1000);
        assert_eq!(config.focusable_selector, FOCUSABLE_SELECTOR);
    }

    #[test]
    fn builder_chain() {
        let config = ManagerConfig::default()
            .hide_delay(Duration::from_millis(10))
            .z_index_base(5000)
            .dialog_class("themed");
        assert_eq!(config.hide_delay, Duration::from_millis(10));
        assert_eq!(config.z_index_base, 5000);
        assert_eq!(config.dialog_class.as_deref(), Some("themed"));
    }

    #[test]
    fn standard_selectors_parse() {
        let selectors = Selectors::standard();
        let mut attrs = ahash::AHashMap::new();
        attrs.insert("id".to_string(), "x".to_string());
        assert!(
            selectors
                .close
                .matches("button", &attrs, &["modal-close".to_string()])
        );
    }

    #[test]
    fn default_focusable_selector_parses() {
        assert!(Selector::parse(FOCUSABLE_SELECTOR).is_ok());
    }
}
