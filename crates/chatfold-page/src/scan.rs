//! Recent-chat discovery: list the conversations the host sidebar shows, so
//! the user can pick one to file without opening it first.

use std::collections::HashSet;

use chatfold_core::text::collapse_whitespace;
use chatfold_core::{ChatEntry, HostProfile};
use regex::Regex;

use crate::dom::Element;

pub struct RecentChats {
    profile: HostProfile,
    id_pattern: Regex,
}

impl RecentChats {
    pub fn new(profile: HostProfile) -> Result<Self, regex::Error> {
        let id_pattern = Regex::new(&format!(
            "{}[A-Za-z0-9]{{{},}}",
            regex::escape(&profile.route_prefix),
            profile.min_link_id_len.max(1)
        ))?;
        Ok(Self {
            profile,
            id_pattern,
        })
    }

    /// Conversation links in the sidebar (`nav`, else the whole body), light
    /// DOM only, deduplicated by address. `filter` narrows by title,
    /// case-insensitively.
    pub fn scan(&self, body: &Element, filter: &str) -> Vec<ChatEntry> {
        let root = body.query(|e| e.is("nav")).unwrap_or(body);
        let prefix = self.profile.route_prefix.as_str();
        let links = root.query_all(|e| e.is("a") && e.href().is_some_and(|h| h.contains(prefix)));

        let mut seen = HashSet::new();
        let mut chats: Vec<ChatEntry> = Vec::new();
        for link in links {
            let Some(url) = link.href() else { continue };
            if self.is_denied(link) || !self.id_pattern.is_match(url) {
                continue;
            }
            if !seen.insert(url.to_string()) {
                continue;
            }
            let raw = link.aria_label().map(str::to_string).unwrap_or_else(|| link.inner_text());
            let mut title = collapse_whitespace(&raw);
            if title.is_empty() {
                title = format!("Chat {}", chats.len());
            }
            chats.push(ChatEntry::new(title, url));
        }
        tracing::debug!(found = chats.len(), "recent chats scanned");

        let needle = filter.trim().to_lowercase();
        if needle.is_empty() {
            return chats;
        }
        chats
            .into_iter()
            .filter(|c| c.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Account, settings, and upsell links share the route prefix; reject
    /// them by any of their visible labels.
    fn is_denied(&self, link: &Element) -> bool {
        let full = format!(
            "{} {} {}",
            link.inner_text(),
            link.aria_label().unwrap_or_default(),
            link.get_attr("title").unwrap_or_default()
        )
        .to_lowercase();
        self.profile
            .recent_denylist
            .iter()
            .any(|w| full.contains(w.as_str()))
    }
}
