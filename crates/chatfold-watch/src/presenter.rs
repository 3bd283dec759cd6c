//! Sync presenter: folds the latest [`ConversationView`] and the folder store
//! into the status a front end renders for "the chat on screen".

use chatfold_core::{ConversationView, FolderMatch};
use chatfold_store::FolderStore;

/// Saved-state of the conversation on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing open, or the title has not resolved yet.
    NoChat,
    NotSaved,
    /// Reached directly: every folder holding the chat.
    Saved { folders: Vec<String>, title: String },
    /// Reached from a folder entry: that folder and the entry's own title.
    SavedInContext { folder_name: String, title: String },
}

impl SyncStatus {
    pub fn label(&self) -> String {
        match self {
            SyncStatus::SavedInContext { folder_name, .. } => {
                format!("SAVED IN: {}", folder_name.to_uppercase())
            }
            _ => "STATUS".to_string(),
        }
    }

    pub fn headline(&self) -> String {
        match self {
            SyncStatus::NoChat => "Select a chat...".to_string(),
            SyncStatus::NotSaved => "Not Saved".to_string(),
            SyncStatus::Saved { folders, .. } => format!("Saved in: {}", folders.join(", ")),
            SyncStatus::SavedInContext { title, .. } => title.clone(),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            SyncStatus::NoChat => "No Chat",
            SyncStatus::NotSaved => "Save to Folder",
            SyncStatus::Saved { .. } | SyncStatus::SavedInContext { .. } => "Add to another Folder",
        }
    }

    pub fn can_save(&self) -> bool {
        !matches!(self, SyncStatus::NoChat)
    }
}

/// The latest view joined with its folder matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentChat {
    pub view: ConversationView,
    pub matches: FolderMatch,
}

impl CurrentChat {
    /// Stored title of the first match, else the resolved one.
    pub fn title(&self) -> &str {
        self.matches
            .first_matched_title
            .as_deref()
            .unwrap_or(&self.view.title)
    }

    pub fn status(&self) -> SyncStatus {
        if !self.view.is_valid_conversation {
            return SyncStatus::NoChat;
        }
        if !self.matches.is_saved() {
            return SyncStatus::NotSaved;
        }
        match &self.view.context {
            Some(ctx) => {
                let title = if ctx.context_title.is_empty() {
                    self.title().to_string()
                } else {
                    ctx.context_title.clone()
                };
                SyncStatus::SavedInContext {
                    folder_name: ctx.folder_name.clone(),
                    title,
                }
            }
            None => SyncStatus::Saved {
                folders: self.matches.matching_folder_names.clone(),
                title: self.title().to_string(),
            },
        }
    }
}

/// Holds the most recent view so the status can be recomputed after CRUD.
#[derive(Debug, Default)]
pub struct SyncPresenter {
    current: Option<CurrentChat>,
}

impl SyncPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&CurrentChat> {
        self.current.as_ref()
    }

    /// Take a new emission. Latest wins.
    pub fn update(&mut self, view: ConversationView, store: &FolderStore) -> SyncStatus {
        let matches = store.find_folders_by_url(&view.url);
        let chat = CurrentChat { view, matches };
        let status = chat.status();
        tracing::debug!(url = %chat.view.url, ?status, "sync status");
        self.current = Some(chat);
        status
    }

    /// Recompute after the store changed under the same view.
    pub fn refresh(&mut self, store: &FolderStore) -> SyncStatus {
        match self.current.take() {
            Some(chat) => self.update(chat.view, store),
            None => SyncStatus::NoChat,
        }
    }
}
