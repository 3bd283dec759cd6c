//! Navigation fallback for entries that have no usable address: find the
//! host's own list item by its visible text and click it.

use std::ops::ControlFlow;

use chatfold_core::text::collapse_whitespace;

use crate::dom::{Element, ElementPath, HostPage};
use crate::error::PageError;
use crate::walk::{closest, walk_deep};

/// Visible text may differ from the stored title by fewer than this many chars.
pub const TITLE_LENGTH_TOLERANCE: usize = 5;

/// First element (document order, across shadow roots) whose text contains
/// `title` with a length within [`TITLE_LENGTH_TOLERANCE`].
pub fn find_by_title(body: &Element, title: &str, max_nodes: usize) -> Option<ElementPath> {
    let target = collapse_whitespace(title);
    if target.is_empty() {
        return None;
    }
    let target_len = target.chars().count();
    walk_deep(body, max_nodes, |_| false, |el, path| {
        // the body itself is never a list item
        if path.0.is_empty() {
            return ControlFlow::Continue(());
        }
        let mut text = collapse_whitespace(&el.inner_text());
        if text.is_empty() {
            text = el.aria_label().map(collapse_whitespace).unwrap_or_default();
        }
        if text.contains(&target) && text.chars().count().abs_diff(target_len) < TITLE_LENGTH_TOLERANCE {
            ControlFlow::Break(path.clone())
        } else {
            ControlFlow::Continue(())
        }
    })
}

/// Whether the host treats this element as clickable.
pub fn is_clickable(el: &Element) -> bool {
    el.is("a")
        || el.is("button")
        || (el.is("div") && (el.get_attr("role") == Some("button") || el.get_attr("jsaction").is_some()))
}

/// Click the host's entry for `title`. Returns the activated element's path.
pub fn simulate_click_by_title(
    page: &mut dyn HostPage,
    title: &str,
    max_nodes: usize,
) -> Result<ElementPath, PageError> {
    let hit = find_by_title(page.body(), title, max_nodes)
        .ok_or_else(|| PageError::TargetNotFound(title.to_string()))?;
    let target = closest(page.body(), &hit, is_clickable).unwrap_or(hit);
    tracing::info!(%target, "simulating click");
    page.activate(&target)?;
    Ok(target)
}
