//! Deep traversal across shadow roots.
//!
//! Worklist of tree roots: the body first, then every shadow root discovered
//! while scanning. Each popped root is scanned in document order with its own
//! explicit stack, so neither nesting depth nor the number of shadow
//! boundaries grows the call stack.

use std::ops::ControlFlow;

use crate::dom::{Element, ElementPath, PathStep};

/// Tags whose subtrees never contain conversation links or titles.
pub const PRUNED_TAGS: &[&str] = &["script", "style", "svg", "path"];

pub fn is_pruned(el: &Element) -> bool {
    PRUNED_TAGS.iter().any(|t| el.is(t))
}

/// Visit elements below `body` across shadow roots until `visit` breaks or
/// `max_nodes` elements have been seen. Elements for which `prune` returns
/// true are skipped together with their descendants and shadow roots.
pub fn walk_deep<'a, B>(
    body: &'a Element,
    max_nodes: usize,
    prune: impl Fn(&Element) -> bool,
    mut visit: impl FnMut(&'a Element, &ElementPath) -> ControlFlow<B>,
) -> Option<B> {
    let mut roots: Vec<Vec<(&'a Element, ElementPath)>> = vec![vec![(body, ElementPath::default())]];
    let mut seen = 0usize;

    while let Some(root) = roots.pop() {
        let mut stack: Vec<(&'a Element, ElementPath)> = root.into_iter().rev().collect();
        while let Some((el, path)) = stack.pop() {
            if prune(el) {
                continue;
            }
            seen += 1;
            if seen > max_nodes {
                tracing::debug!(max_nodes, "deep traversal budget exhausted");
                return None;
            }
            if let Some(shadow) = &el.shadow_root {
                roots.push(
                    shadow
                        .iter()
                        .enumerate()
                        .map(|(i, c)| (c, path.push(PathStep::Shadow(i))))
                        .collect(),
                );
            }
            if let ControlFlow::Break(b) = visit(el, &path) {
                return Some(b);
            }
            for (i, child) in el.children.iter().enumerate().rev() {
                stack.push((child, path.push(PathStep::Child(i))));
            }
        }
    }
    None
}

/// Closest ancestor-or-self of `path` matching `pred`, without leaving the
/// element's own tree (shadow boundaries are not crossed upward).
pub fn closest(
    body: &Element,
    path: &ElementPath,
    pred: impl Fn(&Element) -> bool,
) -> Option<ElementPath> {
    let floor = path.tree_root_len();
    let mut len = path.0.len();
    loop {
        let candidate = path.prefix(len);
        if body.at(&candidate).is_some_and(&pred) {
            return Some(candidate);
        }
        if len == floor {
            return None;
        }
        len -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Element {
        Element::new("body")
            .child(Element::new("script").child(Element::new("a").attr("id", "in-script")))
            .child(
                Element::new("host-a").shadow(vec![Element::new("div").child(
                    Element::new("host-b")
                        .shadow(vec![Element::new("a").attr("id", "deep")]),
                )]),
            )
            .child(Element::new("a").attr("id", "light"))
    }

    fn ids(body: &Element) -> Vec<String> {
        let mut out = Vec::new();
        let _: Option<()> = walk_deep(body, 1000, is_pruned, |el, _| {
            if let Some(id) = el.get_attr("id") {
                out.push(id.to_string());
            }
            ControlFlow::Continue(())
        });
        out
    }

    #[test]
    fn finds_links_inside_nested_shadow_roots() {
        let body = tree();
        let found = ids(&body);
        assert!(found.contains(&"deep".to_string()));
        assert!(found.contains(&"light".to_string()));
        assert!(!found.contains(&"in-script".to_string()));
    }

    #[test]
    fn break_returns_value_and_path() {
        let body = tree();
        let hit = walk_deep(&body, 1000, is_pruned, |el, path| {
            if el.get_attr("id") == Some("deep") {
                ControlFlow::Break(path.clone())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
        assert_eq!(body.at(&hit).unwrap().get_attr("id"), Some("deep"));
    }

    #[test]
    fn budget_stops_traversal() {
        let mut body = Element::new("body");
        for _ in 0..100 {
            body = body.child(Element::new("div"));
        }
        body = body.child(Element::new("a").attr("id", "last"));
        let hit = walk_deep(&body, 10, |_| false, |el, _| {
            if el.is("a") {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert!(hit.is_none());
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let mut el = Element::new("a").attr("id", "bottom");
        for _ in 0..2_000 {
            el = Element::new("div").child(el);
        }
        let body = Element::new("body").child(el);
        let hit = walk_deep(&body, 10_000, |_| false, |el, path| {
            if el.is("a") {
                ControlFlow::Break(path.0.len())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(hit, Some(2_001));
    }

    #[test]
    fn closest_stays_inside_own_tree() {
        let body = Element::new("body").child(
            Element::new("a").attr("href", "/x").child(
                Element::new("host").shadow(vec![Element::new("span").text("t")]),
            ),
        );
        let span = ElementPath(vec![PathStep::Child(0), PathStep::Child(0), PathStep::Shadow(0)]);
        assert_eq!(closest(&body, &span, |e| e.is("a")), None);
        assert_eq!(closest(&body, &span, |e| e.is("span")), Some(span.clone()));

        let host = ElementPath(vec![PathStep::Child(0), PathStep::Child(0)]);
        assert_eq!(
            closest(&body, &host, |e| e.is("a")),
            Some(ElementPath(vec![PathStep::Child(0)]))
        );
    }
}
