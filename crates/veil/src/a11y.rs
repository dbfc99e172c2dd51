#![forbid(unsafe_code)]

//! Accessibility annotation for freshly attached dialogs.
//!
//! Applied after attachment, once per open: the dialog root gains the
//! `dialog` role and modal marker, the title is wired up through
//! `aria-labelledby`, the close affordance gets a readable label, and
//! the stacking order is set from the dialog's position in the stack.

use veil_dom::{Document, NodeId};

use crate::config::Selectors;

/// Annotate a dialog subtree for assistive technology and stacking.
///
/// `index` is the dialog's position in the open stack. Returns the
/// close affordance when one exists; `None` means the chrome carries no
/// close button (focus settle then falls back to the trap).
pub(crate) fn annotate(
    doc: &mut Document,
    dialog: NodeId,
    index: usize,
    z_base: i32,
    selectors: &Selectors,
) -> Option<NodeId> {
    doc.set_attr(dialog, "role", "dialog");
    doc.set_attr(dialog, "aria-modal", "true");
    doc.set_z_index(dialog, z_base + index as i32);

    if let Some(title) = doc.query_within(dialog, &selectors.title) {
        let title_id = format!("modal-title-{index}");
        doc.set_attr(title, "id", &title_id);
        doc.set_attr(dialog, "aria-labelledby", &title_id);
    }

    let close = doc.query_within(dialog, &selectors.close);
    if let Some(close) = close {
        doc.set_attr(close, "aria-label", "Close modal");
    }
    close
}
