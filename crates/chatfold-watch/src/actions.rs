//! User-initiated operations that span the store, the context, and the page:
//! opening a saved chat and saving the one on screen.

use chatfold_core::{ChatEntry, FolderId, HostProfile, NavigationContextRecord};
use chatfold_page::click::simulate_click_by_title;
use chatfold_page::{ElementPath, HostPage, PageError};
use chatfold_store::{FolderError, FolderStore, NavigationContext};
use thiserror::Error;

use crate::presenter::CurrentChat;
use crate::watcher::{ChatWatcher, ViewSink};

/// Entries saved without a dereferenceable address carry this scheme and are
/// opened by clicking the host's list item with the same title.
pub const SIMULATE_CLICK_SCHEME: &str = "simulate-click://";

/// Title used when nothing better is known.
pub const NEW_CHAT_TITLE: &str = "New Chat";

const NOT_SAVED: &str = "Not Saved";
const SAVED_IN_PREFIX: &str = "Saved in:";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigateError {
    #[error("no conversation is open")]
    NoActiveChat,

    #[error("folder {folder_id} has no chat at index {index}")]
    NoSuchChat { folder_id: FolderId, index: usize },

    #[error(transparent)]
    Folder(#[from] FolderError),

    #[error(transparent)]
    Page(#[from] PageError),
}

/// How a saved chat was brought on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Clicked(ElementPath),
    /// Already on screen; detection re-ran in place.
    Redetected,
    Navigated,
}

/// Open the chat at `index` of `folder_id`, recording where it came from so
/// the next emission reports the entry's own title.
pub fn open_saved_chat(
    store: &FolderStore,
    folder_id: FolderId,
    index: usize,
    ctx: &mut NavigationContext,
    page: &mut dyn HostPage,
    watcher: &mut ChatWatcher,
    sink: &mut dyn ViewSink,
) -> Result<OpenOutcome, NavigateError> {
    let folder = store
        .folder(folder_id)
        .ok_or(FolderError::FolderNotFound(folder_id))?;
    let chat = folder
        .chats
        .get(index)
        .ok_or(NavigateError::NoSuchChat { folder_id, index })?;

    let record = NavigationContextRecord {
        url: chat.url.clone(),
        title: chat.title.clone(),
        folder_name: folder.name.clone(),
        context_title: chat.title.clone(),
    };
    ctx.set(record.clone());

    if chat.url.starts_with(SIMULATE_CLICK_SCHEME) {
        let before = page.location();
        let max_nodes = watcher.resolver().profile().max_traversal_nodes;
        return match simulate_click_by_title(page, &chat.title, max_nodes) {
            Ok(path) => {
                // anchor the context to where the click landed
                let after = page.location();
                if after != before {
                    ctx.set(NavigationContextRecord { url: after, ..record });
                }
                Ok(OpenOutcome::Clicked(path))
            }
            Err(e) => {
                tracing::warn!(title = %chat.title, error = %e, "could not locate chat");
                ctx.clear();
                Err(e.into())
            }
        };
    }

    if page.location() == chat.url {
        watcher.force_detect(page, ctx, sink);
        return Ok(OpenOutcome::Redetected);
    }
    tracing::info!(url = %chat.url, folder = %folder.name, "opening saved chat");
    page.navigate(&chat.url)?;
    Ok(OpenOutcome::Navigated)
}

/// Save the chat on screen into `folder`. Returns `Ok(false)` when it was
/// already there.
pub fn save_current(
    store: &mut FolderStore,
    current: Option<&CurrentChat>,
    folder: Option<FolderId>,
    typed_title: &str,
) -> Result<bool, NavigateError> {
    let folder = folder.ok_or(FolderError::NoFolderSelected)?;
    let current = current
        .filter(|c| c.view.is_valid_conversation)
        .ok_or(NavigateError::NoActiveChat)?;
    let source = ChatEntry::new(current.title(), current.view.url.as_str());
    Ok(save_entry(store, Some(folder), &source, typed_title)?)
}

/// Save `source` (the chat on screen or a discovered recent chat) into
/// `folder` under the typed title, falling back to the source's own title.
pub fn save_entry(
    store: &mut FolderStore,
    folder: Option<FolderId>,
    source: &ChatEntry,
    typed_title: &str,
) -> Result<bool, FolderError> {
    let folder = folder.ok_or(FolderError::NoFolderSelected)?;
    let title = final_title(typed_title, &source.title);
    store.add_chat_to_folder(folder, ChatEntry::new(title, source.url.as_str()))
}

/// Status text is never a usable title.
fn final_title(typed: &str, fallback: &str) -> String {
    let typed = typed.trim();
    if typed.is_empty() || typed.starts_with(SAVED_IN_PREFIX) || typed == NOT_SAVED {
        let fallback = fallback.trim();
        if fallback.is_empty() {
            return NEW_CHAT_TITLE.to_string();
        }
        return fallback.to_string();
    }
    typed.to_string()
}

/// Initial text of the save dialog's title field.
pub fn prefill_title(current_title: &str, document_title: &str, profile: &HostProfile) -> String {
    let mut prefill = current_title.trim().to_string();
    if prefill == NOT_SAVED
        || prefill.starts_with(SAVED_IN_PREFIX)
        || prefill == profile.fallback_title
    {
        let stripped = profile.strip_branding(document_title);
        if !stripped.is_empty() && !profile.is_placeholder(&stripped) {
            prefill = stripped;
        }
    }
    if prefill.is_empty() {
        return NEW_CHAT_TITLE.to_string();
    }
    prefill
}
