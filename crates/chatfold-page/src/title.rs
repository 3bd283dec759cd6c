//! Best-effort title for the conversation on screen.
//!
//! Fallback chain, first usable candidate wins:
//! navigation context → `h1` heading → sidebar link carrying the identity
//! token (deep, across shadow roots) → document title → fixed placeholder.

use std::ops::ControlFlow;

use chatfold_core::text::{collapse_whitespace, truncate_title};
use chatfold_core::{HostProfile, IdentityCodec, NavigationContextRecord, ViewSource};

use crate::dom::{Element, HostPage};
use crate::walk::{is_pruned, walk_deep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    Context,
    Heading,
    Sidebar,
    DocumentTitle,
    Placeholder,
}

impl TitleSource {
    pub fn view_source(self) -> ViewSource {
        match self {
            TitleSource::Context => ViewSource::Context,
            TitleSource::Heading | TitleSource::Sidebar | TitleSource::DocumentTitle => {
                ViewSource::Dom
            }
            TitleSource::Placeholder => ViewSource::Fallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTitle {
    pub title: String,
    pub source: TitleSource,
}

#[derive(Debug, Clone, Default)]
pub struct TitleResolver {
    profile: HostProfile,
    codec: IdentityCodec,
}

impl TitleResolver {
    pub fn new(profile: HostProfile, codec: IdentityCodec) -> Self {
        Self { profile, codec }
    }

    pub fn profile(&self) -> &HostProfile {
        &self.profile
    }

    pub fn codec(&self) -> &IdentityCodec {
        &self.codec
    }

    /// Title for the page's current location. Never fails; the last stage
    /// always yields the placeholder.
    pub fn resolve(
        &self,
        page: &dyn HostPage,
        context: Option<&NavigationContextRecord>,
    ) -> ResolvedTitle {
        let url = page.location();
        let (title, source) = self.resolve_raw(page, &url, context);
        tracing::debug!(url = %url, ?source, "title resolved");
        ResolvedTitle {
            title: truncate_title(&title),
            source,
        }
    }

    /// Title only.
    pub fn resolve_title(&self, page: &dyn HostPage) -> String {
        self.resolve(page, None).title
    }

    fn resolve_raw(
        &self,
        page: &dyn HostPage,
        url: &str,
        context: Option<&NavigationContextRecord>,
    ) -> (String, TitleSource) {
        if let Some(ctx) = context.filter(|c| c.relates_to(url) && !c.title.trim().is_empty()) {
            return (ctx.title.clone(), TitleSource::Context);
        }

        if let Some(token) = self.codec.extract_identity(url) {
            if let Some(t) = self.heading_title(page.body()) {
                return (t, TitleSource::Heading);
            }
            if let Some(t) = self.sidebar_title(page.body(), &token) {
                return (t, TitleSource::Sidebar);
            }
        }

        let doc = self.profile.strip_branding(&page.document_title());
        if self.usable(&doc) {
            return (doc, TitleSource::DocumentTitle);
        }

        (self.profile.fallback_title.clone(), TitleSource::Placeholder)
    }

    /// Non-empty, not the bare app name, not the user's account.
    fn usable(&self, candidate: &str) -> bool {
        !candidate.is_empty()
            && !self.profile.is_placeholder(candidate)
            && !self.profile.is_account_text(candidate)
    }

    fn heading_title(&self, body: &Element) -> Option<String> {
        let h1 = body.query(|e| e.is("h1"))?;
        let text = collapse_whitespace(&h1.inner_text());
        self.usable(&text).then_some(text)
    }

    fn sidebar_title(&self, body: &Element, token: &str) -> Option<String> {
        walk_deep(body, self.profile.max_traversal_nodes, is_pruned, |el, _| {
            match self.link_title(el, token) {
                Some(t) => ControlFlow::Break(t),
                None => ControlFlow::Continue(()),
            }
        })
    }

    fn link_title(&self, el: &Element, token: &str) -> Option<String> {
        if !el.is("a") {
            return None;
        }
        let href = el.href()?;
        if !href.contains(token) || self.profile.account_hosts.iter().any(|h| href.contains(h.as_str())) {
            return None;
        }
        let raw = el.aria_label().map(str::to_string).unwrap_or_else(|| el.inner_text());
        let text = collapse_whitespace(&raw);
        if !self.usable(&text)
            || self.profile.is_control_label(&text)
            || self.profile.is_denied_title(&text)
        {
            return None;
        }
        Some(text)
    }
}
