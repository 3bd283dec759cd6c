use serde::{Deserialize, Serialize};

/// Host-specific heuristics: routes, placeholder names, and denylists.
///
/// Every field has a default matching the Gemini web app, so a partial
/// `host_profile` object in `config.json` only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostProfile {
    /// Path prefix shared by every conversation route, with both slashes.
    pub route_prefix: String,
    /// Minimum identity token length; shorter segments are listing/settings routes.
    pub min_identity_len: usize,
    /// Minimum alphanumeric id length for sidebar links in recent-chat discovery.
    pub min_link_id_len: usize,
    /// Generic application name the host shows before a real title renders.
    pub app_name: String,
    /// Suffixes and prefixes stripped from the document title.
    pub branding: Vec<String>,
    /// Link labels that belong to controls, not conversations (matched case-insensitively).
    pub control_labels: Vec<String>,
    /// Substrings marking a string as the user's own account identity.
    pub account_markers: Vec<String>,
    /// Link hosts that never point at a conversation.
    pub account_hosts: Vec<String>,
    /// Words that disqualify a sidebar link in recent-chat discovery (lowercase).
    pub recent_denylist: Vec<String>,
    /// Words that disqualify a sidebar link label as a conversation title.
    pub title_denylist: Vec<String>,
    pub fallback_title: String,
    pub loading_title: String,
    pub idle_title: String,
    /// Upper bound on elements visited by one deep traversal.
    pub max_traversal_nodes: usize,
}

impl Default for HostProfile {
    fn default() -> Self {
        Self {
            route_prefix: "/app/".to_string(),
            min_identity_len: 10,
            min_link_id_len: 8,
            app_name: "Gemini".to_string(),
            branding: vec![" - Gemini".to_string(), "Google Gemini".to_string()],
            control_labels: vec!["More options".to_string()],
            account_markers: vec![
                "@".to_string(),
                "Google 账号".to_string(),
                "Google Account".to_string(),
            ],
            account_hosts: vec!["accounts.google".to_string()],
            recent_denylist: [
                "google",
                "account",
                "sign out",
                "setting",
                "upgrade",
                "help",
                "faq",
                "activity",
                "manager",
                "gemini advanced",
                "@",
                "账号",
                "设置",
                "帮助",
                "退出",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            title_denylist: ["setting", "help", "account", "设置", "帮助", "账号"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fallback_title: "Current Chat".to_string(),
            loading_title: "Loading...".to_string(),
            idle_title: "No active chat".to_string(),
            max_traversal_nodes: 50_000,
        }
    }
}

impl HostProfile {
    /// Route prefix without its trailing slash (`/app`).
    pub fn route_root(&self) -> &str {
        self.route_prefix.trim_end_matches('/')
    }

    /// True when `text` carries any account-identifying marker.
    pub fn is_account_text(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.account_markers
            .iter()
            .any(|m| lower.contains(&m.to_lowercase()))
    }

    /// True when `text` is a generic control label such as "More options".
    pub fn is_control_label(&self, text: &str) -> bool {
        self.control_labels
            .iter()
            .any(|l| l.eq_ignore_ascii_case(text))
    }

    /// True when `text` names a settings, help or account control.
    pub fn is_denied_title(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.title_denylist
            .iter()
            .any(|w| lower.contains(&w.to_lowercase()))
    }

    /// True when `text` is the bare application name.
    pub fn is_placeholder(&self, text: &str) -> bool {
        text == self.app_name
    }

    /// Strip branding from a document title.
    pub fn strip_branding(&self, title: &str) -> String {
        let mut out = title.to_string();
        for b in &self.branding {
            out = out.replace(b.as_str(), "");
        }
        out.trim().to_string()
    }
}
