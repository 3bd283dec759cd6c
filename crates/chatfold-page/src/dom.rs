//! Read-mostly model of the host page.
//!
//! The host document is a tree of [`Element`]s; an element may host an
//! encapsulated sub-tree (`shadow_root`) that ordinary light-DOM queries do
//! not see. [`HostPage`] is the whole boundary the core needs: location,
//! document title, the body tree, and the two side-effecting calls
//! (navigate, activate an element).

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::PageError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Text directly inside this element (not including children).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_root: Option<Vec<Element>>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn shadow(mut self, children: Vec<Element>) -> Self {
        self.shadow_root = Some(children);
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn href(&self) -> Option<&str> {
        self.get_attr("href").filter(|h| !h.is_empty())
    }

    pub fn aria_label(&self) -> Option<&str> {
        self.get_attr("aria-label").filter(|l| !l.is_empty())
    }

    /// Rendered text of this element and its light-DOM descendants, one
    /// line per non-empty text node. Shadow content is not included.
    pub fn inner_text(&self) -> String {
        let mut parts = Vec::new();
        let mut stack = vec![self];
        while let Some(el) = stack.pop() {
            if !el.text.trim().is_empty() {
                parts.push(el.text.as_str());
            }
            stack.extend(el.children.iter().rev());
        }
        parts.join("\n")
    }

    /// First light-DOM descendant-or-self matching `pred`, in document order.
    pub fn query(&self, pred: impl Fn(&Element) -> bool) -> Option<&Element> {
        let mut stack = vec![self];
        while let Some(el) = stack.pop() {
            if pred(el) {
                return Some(el);
            }
            stack.extend(el.children.iter().rev());
        }
        None
    }

    /// Every light-DOM descendant-or-self matching `pred`, in document order.
    pub fn query_all(&self, pred: impl Fn(&Element) -> bool) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(el) = stack.pop() {
            if pred(el) {
                out.push(el);
            }
            stack.extend(el.children.iter().rev());
        }
        out
    }

    /// Resolve a path relative to this element.
    pub fn at(&self, path: &ElementPath) -> Option<&Element> {
        let mut cur = self;
        for step in &path.0 {
            cur = match *step {
                PathStep::Child(i) => cur.children.get(i)?,
                PathStep::Shadow(i) => cur.shadow_root.as_ref()?.get(i)?,
            };
        }
        Some(cur)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathStep {
    /// n-th light-DOM child
    Child(usize),
    /// n-th top-level element of the shadow root
    Shadow(usize),
}

/// Location of an element below the body, crossing shadow roots explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementPath(pub Vec<PathStep>);

impl ElementPath {
    pub fn push(&self, step: PathStep) -> Self {
        let mut steps = self.0.clone();
        steps.push(step);
        Self(steps)
    }

    /// Length of the prefix that is the root of this element's own tree:
    /// just past the last shadow step, or 0 for the light tree.
    pub fn tree_root_len(&self) -> usize {
        self.0
            .iter()
            .rposition(|s| matches!(s, PathStep::Shadow(_)))
            .map_or(0, |i| i + 1)
    }

    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body")?;
        for step in &self.0 {
            match step {
                PathStep::Child(i) => write!(f, "/{i}")?,
                PathStep::Shadow(i) => write!(f, "/#shadow/{i}")?,
            }
        }
        Ok(())
    }
}

pub trait HostPage {
    fn location(&self) -> String;
    fn document_title(&self) -> String;
    fn body(&self) -> &Element;
    /// Ask the host to load `url`.
    fn navigate(&mut self, url: &str) -> Result<(), PageError>;
    /// Programmatically click the element at `path`.
    fn activate(&mut self, path: &ElementPath) -> Result<(), PageError>;
}

/// A captured page: location, title, and body tree.
///
/// Navigation rewrites the location only; clicking a link follows its href,
/// the way the host's client-side router would.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotPage {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Element,
    #[serde(skip)]
    pub activated: Vec<ElementPath>,
}

impl SnapshotPage {
    pub fn new(url: &str, title: &str, body: Element) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            body,
            activated: Vec::new(),
        }
    }

    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading page snapshot: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("parsing page snapshot: {}", path.display()))
    }

    /// Parse a snapshot. Real pages nest far deeper than serde_json's default
    /// recursion limit, so the limit is lifted.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut de = serde_json::Deserializer::from_str(json);
        de.disable_recursion_limit();
        let page = Self::deserialize(&mut de)?;
        de.end()?;
        Ok(page)
    }
}

impl HostPage for SnapshotPage {
    fn location(&self) -> String {
        self.url.clone()
    }

    fn document_title(&self) -> String {
        self.title.clone()
    }

    fn body(&self) -> &Element {
        &self.body
    }

    fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        if url.trim().is_empty() {
            return Err(PageError::Navigation("empty url".to_string()));
        }
        tracing::debug!(from = %self.url, to = url, "snapshot navigate");
        self.url = url.to_string();
        Ok(())
    }

    fn activate(&mut self, path: &ElementPath) -> Result<(), PageError> {
        let el = self
            .body
            .at(path)
            .ok_or_else(|| PageError::NoSuchElement(path.to_string()))?;
        let target = el.is("a").then(|| el.href().map(str::to_string)).flatten();
        self.activated.push(path.clone());
        if let Some(href) = target {
            self.url = href;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_body() -> Element {
        Element::new("body")
            .child(Element::new("h1").text("  Quantum\n Notes "))
            .child(
                Element::new("nav").child(
                    Element::new("a")
                        .attr("href", "/app/abc1234567")
                        .child(Element::new("span").text("Quantum"))
                        .child(Element::new("span").text("Notes")),
                ),
            )
            .child(Element::new("side-list").shadow(vec![Element::new("a")
                .attr("href", "/app/hidden0000")
                .text("Hidden")]))
    }

    #[test]
    fn inner_text_walks_light_children_only() {
        let body = page_body();
        let nav = body.query(|e| e.is("nav")).unwrap();
        assert_eq!(nav.inner_text(), "Quantum\nNotes");
        assert!(!body.inner_text().contains("Hidden"));
    }

    #[test]
    fn query_all_is_document_order_and_light_only() {
        let body = page_body();
        let links = body.query_all(|e| e.is("a"));
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href(), Some("/app/abc1234567"));
    }

    #[test]
    fn paths_cross_shadow_roots() {
        let body = page_body();
        let p = ElementPath(vec![PathStep::Child(2), PathStep::Shadow(0)]);
        assert_eq!(body.at(&p).unwrap().text, "Hidden");
        assert_eq!(p.tree_root_len(), 2);
        assert_eq!(p.to_string(), "body/2/#shadow/0");
        assert!(body.at(&ElementPath(vec![PathStep::Shadow(0)])).is_none());
    }

    #[test]
    fn activating_a_link_follows_href() {
        let mut page = SnapshotPage::new("https://x.test/app", "Gemini", page_body());
        let p = ElementPath(vec![PathStep::Child(1), PathStep::Child(0)]);
        page.activate(&p).unwrap();
        assert_eq!(page.location(), "/app/abc1234567");
        assert_eq!(page.activated, vec![p]);

        let missing = ElementPath(vec![PathStep::Child(9)]);
        assert!(matches!(page.activate(&missing), Err(PageError::NoSuchElement(_))));
    }

    #[test]
    fn snapshot_loads_from_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("page.json");
        std::fs::write(
            &path,
            r#"{"url":"https://x.test/app/abc1234567","title":"Quantum Notes - Gemini",
                "body":{"tag":"body","children":[{"tag":"h1","text":"Quantum Notes"}]}}"#,
        )
        .unwrap();
        let page = SnapshotPage::load(&path).unwrap();
        assert_eq!(page.body.children[0].text, "Quantum Notes");
        assert!(page.activated.is_empty());
    }

    #[test]
    fn deeply_nested_snapshot_loads() {
        let mut el = Element::new("a")
            .attr("href", "/app/abc1234567")
            .text("Deep Chat");
        for _ in 0..150 {
            el = Element::new("div").child(el);
        }
        let page = SnapshotPage::new("https://x.test/app/abc1234567", "", Element::new("body").child(el));
        let json = serde_json::to_string(&page).unwrap();

        let loaded = SnapshotPage::from_json(&json).unwrap();
        let mut depth = 0;
        let mut cur = loaded.body();
        while let Some(next) = cur.children.first() {
            cur = next;
            depth += 1;
        }
        assert_eq!(depth, 151);
        assert_eq!(cur.text, "Deep Chat");
        assert!(SnapshotPage::from_json(&format!("{json} trailing")).is_err());
    }

    #[test]
    fn navigating_to_an_empty_url_fails() {
        let mut page = SnapshotPage::new("https://x.test/app", "Gemini", page_body());
        assert!(matches!(page.navigate("  "), Err(PageError::Navigation(_))));
        assert_eq!(page.location(), "https://x.test/app");
    }
}
