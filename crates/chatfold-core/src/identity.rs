//! Conversation identity: URL → stable token, and "is this a conversation view".
//!
//! Pure string logic. Only the URL path is inspected, so query-string and
//! fragment drift introduced by the host never changes an identity.

use std::sync::LazyLock;

use regex::Regex;

use crate::profile::HostProfile;

static DEFAULT_CODEC: LazyLock<IdentityCodec> = LazyLock::new(|| {
    IdentityCodec::new(&HostProfile::default()).expect("default identity pattern compiles")
});

/// Origin used to resolve relative addresses such as `/app/abc1234567`.
const RELATIVE_BASE: &str = "https://host.invalid/";

/// Maps conversation addresses to identity tokens for one host profile.
#[derive(Debug, Clone)]
pub struct IdentityCodec {
    pattern: Regex,
    route_prefix: String,
    route_root: String,
}

impl IdentityCodec {
    /// Build a codec for the profile's route prefix and minimum token length.
    pub fn new(profile: &HostProfile) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            "{}([A-Za-z0-9_-]{{{},}})",
            regex::escape(&profile.route_prefix),
            profile.min_identity_len.max(1)
        ))?;
        Ok(Self {
            pattern,
            route_prefix: profile.route_prefix.clone(),
            route_root: profile.route_root().to_string(),
        })
    }

    /// Extract the conversation identity token, or `None` for non-conversation
    /// routes (route root, settings-style pages, ids below the minimum length).
    pub fn extract_identity(&self, url: &str) -> Option<String> {
        let path = url_path(url);
        self.pattern
            .captures(&path)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// True iff the path is under the route prefix and is not the prefix itself.
    pub fn is_conversation_url(&self, url: &str) -> bool {
        let path = url_path(url);
        path.contains(&self.route_prefix)
            && !path.ends_with(&self.route_prefix)
            && !path.ends_with(&self.route_root)
    }

    /// Two addresses denote the same conversation: equal tokens when both
    /// yield one, otherwise exact address equality.
    pub fn same_conversation(&self, a: &str, b: &str) -> bool {
        match (self.extract_identity(a), self.extract_identity(b)) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        }
    }
}

impl Default for IdentityCodec {
    fn default() -> Self {
        DEFAULT_CODEC.clone()
    }
}

/// Path component of an absolute or relative URL, without query or fragment.
fn url_path(raw: &str) -> String {
    let parsed = url::Url::parse(raw).or_else(|_| {
        url::Url::parse(RELATIVE_BASE).and_then(|base| base.join(raw))
    });
    match parsed {
        Ok(u) => u.path().to_string(),
        Err(_) => raw
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}
