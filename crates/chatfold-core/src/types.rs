use serde::{Deserialize, Serialize};

/// Folder id: creation timestamp in Unix milliseconds, unique per store.
pub type FolderId = i64;

/// One saved conversation inside a folder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatEntry {
    pub title: String,
    pub url: String,
}

impl ChatEntry {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// A named, ordered group of chat entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    #[serde(default)]
    pub chats: Vec<ChatEntry>,
}

/// Serialized form of the whole folder store (the durable blob).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderData {
    #[serde(default)]
    pub folders: Vec<Folder>,
}

/// Session-scoped hint written when the user opens a saved chat from a folder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NavigationContextRecord {
    pub url: String,
    pub title: String,
    pub folder_name: String,
    pub context_title: String,
}

impl NavigationContextRecord {
    /// Loose bidirectional substring relation used for both override and
    /// invalidation: either address contains the other. An empty address
    /// relates to nothing.
    pub fn relates_to(&self, live_url: &str) -> bool {
        if self.url.is_empty() || live_url.is_empty() {
            return false;
        }
        live_url.contains(&self.url) || self.url.contains(live_url)
    }
}

/// Where an emitted title came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewSource {
    Context,
    Dom,
    Fallback,
}

/// Snapshot of the conversation on screen, emitted on every detection pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub url: String,
    pub title: String,
    pub is_valid_conversation: bool,
    pub source: ViewSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<NavigationContextRecord>,
}

/// Result of cross-referencing a URL against every folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FolderMatch {
    pub matching_folder_names: Vec<String>,
    pub first_matched_title: Option<String>,
}

impl FolderMatch {
    pub fn is_saved(&self) -> bool {
        !self.matching_folder_names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_record_uses_camel_case_keys() {
        let rec = NavigationContextRecord {
            url: "/app/abc1234567".into(),
            title: "Quantum Notes".into(),
            folder_name: "Research".into(),
            context_title: "Quantum Notes".into(),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["folderName"], "Research");
        assert_eq!(json["contextTitle"], "Quantum Notes");
    }

    #[test]
    fn relates_to_is_bidirectional() {
        let rec = NavigationContextRecord {
            url: "https://x.test/app/abc1234567".into(),
            title: String::new(),
            folder_name: String::new(),
            context_title: String::new(),
        };
        assert!(rec.relates_to("https://x.test/app/abc1234567?hl=en"));
        assert!(rec.relates_to("https://x.test/app/abc12"));
        assert!(!rec.relates_to("https://x.test/app/zzz9999999"));
        assert!(!rec.relates_to(""));

        let blank = NavigationContextRecord {
            url: String::new(),
            ..rec
        };
        assert!(!blank.relates_to("https://x.test/app/abc1234567"));
    }

    #[test]
    fn emitted_records_use_camel_case_keys() {
        let view = ConversationView {
            url: "/app/abc1234567".into(),
            title: "Quantum Notes".into(),
            is_valid_conversation: true,
            source: ViewSource::Dom,
            context: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["isValidConversation"], true);
        assert_eq!(json["source"], "dom");
        assert!(json.get("context").is_none());

        let found = FolderMatch {
            matching_folder_names: vec!["Research".into()],
            first_matched_title: Some("Quantum Notes".into()),
        };
        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["matchingFolderNames"][0], "Research");
        assert_eq!(json["firstMatchedTitle"], "Quantum Notes");
    }

    #[test]
    fn folder_without_chats_deserializes() {
        let f: Folder = serde_json::from_str(r#"{"id":1700000000000,"name":"Inbox"}"#).unwrap();
        assert!(f.chats.is_empty());
    }
}
