//! The durable folder store: single source of truth for folders and their
//! saved chat entries.
//!
//! Every mutation is applied in memory and then written through to the
//! key-value store before returning. A failed write is logged and otherwise
//! ignored; the in-memory state stays the working copy until the next
//! successful write.
//!
//! Existing data that cannot be read is never overwritten. A corrupt blob is
//! copied to [`CORRUPT_KEY`] before the store starts empty; a failed read
//! leaves the store read-only for its lifetime.

use chatfold_core::{ChatEntry, Folder, FolderData, FolderId, FolderMatch, IdentityCodec};

use crate::error::FolderError;
use crate::kv::KvStore;

/// Key holding the serialized [`FolderData`].
pub const FOLDERS_KEY: &str = "chatfold_folder_data_v2";

/// Key receiving an unparseable [`FOLDERS_KEY`] blob before it is replaced.
pub const CORRUPT_KEY: &str = "chatfold_folder_data_v2_corrupt";

/// Folder names are capped at this many characters.
pub const MAX_FOLDER_NAME_CHARS: usize = 30;

pub struct FolderStore {
    data: FolderData,
    kv: Box<dyn KvStore>,
    codec: IdentityCodec,
    read_only: bool,
}

impl FolderStore {
    /// Load the store from `kv`. Missing data starts empty.
    pub fn load(mut kv: Box<dyn KvStore>, codec: IdentityCodec) -> Self {
        let mut read_only = false;
        let data = match kv.get(FOLDERS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<FolderData>(&raw) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(error = %e, backup = CORRUPT_KEY, "folder data is corrupt, starting empty");
                    if let Err(e) = kv.set(CORRUPT_KEY, &raw) {
                        tracing::warn!(error = %e, "could not back up corrupt folder data, store is read-only");
                        read_only = true;
                    }
                    FolderData::default()
                }
            },
            Ok(None) => FolderData::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load folder data, store is read-only");
                read_only = true;
                FolderData::default()
            }
        };
        tracing::debug!(folders = data.folders.len(), read_only, "folder store loaded");
        Self {
            data,
            kv,
            codec,
            read_only,
        }
    }

    /// True when loading failed and writes are refused.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn folders(&self) -> &[Folder] {
        &self.data.folders
    }

    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.data.folders.iter().find(|f| f.id == id)
    }

    pub fn codec(&self) -> &IdentityCodec {
        &self.codec
    }

    /// Create a folder at the end of the list and return its id.
    pub fn add_folder(&mut self, name: &str) -> Result<FolderId, FolderError> {
        let name = validate_name(name)?;
        let id = self.next_id();
        self.data.folders.push(Folder {
            id,
            name,
            chats: Vec::new(),
        });
        tracing::info!(id, "folder created");
        self.persist();
        Ok(id)
    }

    pub fn rename_folder(&mut self, id: FolderId, name: &str) -> Result<(), FolderError> {
        let name = validate_name(name)?;
        let folder = self.folder_mut(id)?;
        folder.name = name;
        self.persist();
        Ok(())
    }

    /// Delete a folder together with every chat entry it owns.
    pub fn delete_folder(&mut self, id: FolderId) -> Result<Folder, FolderError> {
        let pos = self
            .data
            .folders
            .iter()
            .position(|f| f.id == id)
            .ok_or(FolderError::FolderNotFound(id))?;
        let removed = self.data.folders.remove(pos);
        tracing::info!(id, chats = removed.chats.len(), "folder deleted");
        self.persist();
        Ok(removed)
    }

    /// Append `chat` to the folder unless the same conversation is already
    /// there. Returns `Ok(false)` for the duplicate no-op.
    pub fn add_chat_to_folder(
        &mut self,
        folder_id: FolderId,
        chat: ChatEntry,
    ) -> Result<bool, FolderError> {
        let codec = self.codec.clone();
        let folder = self.folder_mut(folder_id)?;
        if folder
            .chats
            .iter()
            .any(|c| codec.same_conversation(&c.url, &chat.url))
        {
            tracing::debug!(folder_id, url = %chat.url, "chat already in folder");
            return Ok(false);
        }
        folder.chats.push(chat);
        self.persist();
        Ok(true)
    }

    /// Remove the entry at `index`. Out-of-range indices remove nothing.
    pub fn remove_chat_from_folder(
        &mut self,
        folder_id: FolderId,
        index: usize,
    ) -> Result<Option<ChatEntry>, FolderError> {
        let folder = self.folder_mut(folder_id)?;
        if index >= folder.chats.len() {
            return Ok(None);
        }
        let removed = folder.chats.remove(index);
        self.persist();
        Ok(Some(removed))
    }

    /// Retitle the entry at `index`. Returns `Ok(false)` when out of range.
    pub fn rename_chat(
        &mut self,
        folder_id: FolderId,
        index: usize,
        new_title: &str,
    ) -> Result<bool, FolderError> {
        let title = new_title.trim();
        if title.is_empty() {
            return Err(FolderError::EmptyName);
        }
        let folder = self.folder_mut(folder_id)?;
        let Some(chat) = folder.chats.get_mut(index) else {
            return Ok(false);
        };
        chat.title = title.to_string();
        self.persist();
        Ok(true)
    }

    /// Move a folder. Equal or out-of-range indices are a no-op without a write.
    pub fn reorder_folders(&mut self, from: usize, to: usize) -> bool {
        if !move_item(&mut self.data.folders, from, to) {
            return false;
        }
        self.persist();
        true
    }

    /// Move a chat within one folder. Same no-op rules as [`Self::reorder_folders`].
    pub fn reorder_chats(&mut self, folder_id: FolderId, from: usize, to: usize) -> bool {
        let Ok(folder) = self.folder_mut(folder_id) else {
            return false;
        };
        if !move_item(&mut folder.chats, from, to) {
            return false;
        }
        self.persist();
        true
    }

    /// Every folder holding this conversation, plus the title stored in the
    /// first match (folder order, then entry order).
    pub fn find_folders_by_url(&self, url: &str) -> FolderMatch {
        let mut result = FolderMatch::default();
        for folder in &self.data.folders {
            let found = folder
                .chats
                .iter()
                .find(|c| self.codec.same_conversation(&c.url, url));
            if let Some(chat) = found {
                result.matching_folder_names.push(folder.name.clone());
                if result.first_matched_title.is_none() {
                    result.first_matched_title = Some(chat.title.clone());
                }
            }
        }
        result
    }

    /// Folders whose name contains `text`, case-insensitively.
    pub fn filter(&self, text: &str) -> Vec<&Folder> {
        let needle = text.trim().to_lowercase();
        self.data
            .folders
            .iter()
            .filter(|f| needle.is_empty() || f.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Write the current state through. Returns whether the write succeeded.
    pub fn persist(&mut self) -> bool {
        if self.read_only {
            tracing::warn!("folder store is read-only, change kept in memory only");
            return false;
        }
        let json = match serde_json::to_string(&self.data) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize folder data");
                return false;
            }
        };
        match self.kv.set(FOLDERS_KEY, &json) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to save folder data");
                false
            }
        }
    }

    fn folder_mut(&mut self, id: FolderId) -> Result<&mut Folder, FolderError> {
        self.data
            .folders
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(FolderError::FolderNotFound(id))
    }

    /// Creation timestamp, bumped past the newest existing id on collision.
    fn next_id(&self) -> FolderId {
        let now = now_millis();
        match self.data.folders.iter().map(|f| f.id).max() {
            Some(max) if max >= now => max + 1,
            _ => now,
        }
    }
}

fn validate_name(name: &str) -> Result<String, FolderError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FolderError::EmptyName);
    }
    if name.chars().count() > MAX_FOLDER_NAME_CHARS {
        return Err(FolderError::NameTooLong {
            max: MAX_FOLDER_NAME_CHARS,
        });
    }
    Ok(name.to_string())
}

fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from == to || from >= items.len() || to >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

fn now_millis() -> FolderId {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    (nanos / 1_000_000) as FolderId
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;

    fn store() -> (FolderStore, MemoryKvStore) {
        let kv = MemoryKvStore::new();
        let s = FolderStore::load(Box::new(kv.clone()), IdentityCodec::default());
        (s, kv)
    }

    fn names(s: &FolderStore) -> Vec<&str> {
        s.folders().iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn add_folder_persists_and_reloads() {
        let (mut s, kv) = store();
        let id = s.add_folder("  Research ").unwrap();
        assert_eq!(s.folder(id).unwrap().name, "Research");
        assert_eq!(kv.write_count(), 1);

        let reloaded = FolderStore::load(Box::new(kv.clone()), IdentityCodec::default());
        assert_eq!(names(&reloaded), vec!["Research"]);
    }

    #[test]
    fn folder_ids_are_unique_even_within_one_millisecond() {
        let (mut s, _) = store();
        let ids: Vec<_> = (0..5).map(|i| s.add_folder(&format!("f{i}")).unwrap()).collect();
        let mut dedup = ids.clone();
        dedup.dedup();
        assert_eq!(ids.len(), dedup.len());
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn invalid_names_are_rejected_without_write() {
        let (mut s, kv) = store();
        assert_eq!(s.add_folder("   "), Err(FolderError::EmptyName));
        assert_eq!(
            s.add_folder(&"n".repeat(31)),
            Err(FolderError::NameTooLong { max: 30 })
        );
        assert!(s.folders().is_empty());
        assert_eq!(kv.write_count(), 0);
    }

    #[test]
    fn rename_and_delete_unknown_folder() {
        let (mut s, _) = store();
        assert_eq!(s.rename_folder(42, "x"), Err(FolderError::FolderNotFound(42)));
        assert_eq!(s.delete_folder(42).unwrap_err(), FolderError::FolderNotFound(42));
    }

    #[test]
    fn add_chat_is_idempotent_by_identity() {
        let (mut s, kv) = store();
        let id = s.add_folder("Research").unwrap();
        assert!(s
            .add_chat_to_folder(id, ChatEntry::new("A", "https://x.test/app/abc1234567"))
            .unwrap());
        let writes = kv.write_count();
        assert!(!s
            .add_chat_to_folder(id, ChatEntry::new("A", "https://x.test/app/abc1234567"))
            .unwrap());
        assert!(!s
            .add_chat_to_folder(id, ChatEntry::new("B", "https://x.test/app/abc1234567?hl=en"))
            .unwrap());
        assert_eq!(s.folder(id).unwrap().chats.len(), 1);
        assert_eq!(kv.write_count(), writes);
    }

    #[test]
    fn add_chat_without_identity_dedups_by_exact_url() {
        let (mut s, _) = store();
        let id = s.add_folder("Synthetic").unwrap();
        assert!(s
            .add_chat_to_folder(id, ChatEntry::new("Q", "simulate-click://Quantum"))
            .unwrap());
        assert!(!s
            .add_chat_to_folder(id, ChatEntry::new("Q", "simulate-click://Quantum"))
            .unwrap());
        assert!(s
            .add_chat_to_folder(id, ChatEntry::new("R", "simulate-click://Relativity"))
            .unwrap());
        assert_eq!(s.folder(id).unwrap().chats.len(), 2);
    }

    #[test]
    fn add_chat_to_missing_folder_fails() {
        let (mut s, _) = store();
        assert_eq!(
            s.add_chat_to_folder(7, ChatEntry::new("A", "/app/abc1234567")),
            Err(FolderError::FolderNotFound(7))
        );
    }

    #[test]
    fn remove_and_rename_chat() {
        let (mut s, _) = store();
        let id = s.add_folder("F").unwrap();
        s.add_chat_to_folder(id, ChatEntry::new("A", "/app/aaaaaaaaaa")).unwrap();
        s.add_chat_to_folder(id, ChatEntry::new("B", "/app/bbbbbbbbbb")).unwrap();

        assert!(s.rename_chat(id, 1, " Bee ").unwrap());
        assert!(!s.rename_chat(id, 9, "nope").unwrap());
        assert_eq!(s.rename_chat(id, 0, " "), Err(FolderError::EmptyName));

        let removed = s.remove_chat_from_folder(id, 0).unwrap().unwrap();
        assert_eq!(removed.title, "A");
        assert_eq!(s.remove_chat_from_folder(id, 5).unwrap(), None);
        assert_eq!(s.folder(id).unwrap().chats, vec![ChatEntry::new("Bee", "/app/bbbbbbbbbb")]);
    }

    #[test]
    fn reorder_noops_never_write() {
        let (mut s, kv) = store();
        let id = s.add_folder("A").unwrap();
        s.add_folder("B").unwrap();
        s.add_chat_to_folder(id, ChatEntry::new("x", "/app/xxxxxxxxxx")).unwrap();
        let writes = kv.write_count();

        assert!(!s.reorder_folders(1, 1));
        assert!(!s.reorder_folders(0, 2));
        assert!(!s.reorder_chats(id, 0, 0));
        assert!(!s.reorder_chats(id, 0, 1));
        assert!(!s.reorder_chats(999, 0, 1));
        assert_eq!(kv.write_count(), writes);
        assert_eq!(names(&s), vec!["A", "B"]);
    }

    #[test]
    fn reorder_moves_items() {
        let (mut s, _) = store();
        let a = s.add_folder("A").unwrap();
        s.add_folder("B").unwrap();
        s.add_folder("C").unwrap();
        assert!(s.reorder_folders(0, 2));
        assert_eq!(names(&s), vec!["B", "C", "A"]);

        for t in ["1", "2", "3"] {
            s.add_chat_to_folder(a, ChatEntry::new(t, format!("/app/chat{t}{t}{t}{t}{t}{t}")))
                .unwrap();
        }
        assert!(s.reorder_chats(a, 2, 0));
        let order: Vec<_> = s.folder(a).unwrap().chats.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(order, vec!["3", "1", "2"]);
    }

    #[test]
    fn find_matches_across_query_drift() {
        let (mut s, _) = store();
        let a = s.add_folder("Research").unwrap();
        let b = s.add_folder("Physics").unwrap();
        s.add_folder("Empty").unwrap();
        s.add_chat_to_folder(a, ChatEntry::new("Quantum Notes", "https://x.test/app/abc1234567?hl=en"))
            .unwrap();
        s.add_chat_to_folder(b, ChatEntry::new("QN again", "https://x.test/app/abc1234567?hl=fr"))
            .unwrap();

        let m = s.find_folders_by_url("https://x.test/app/abc1234567");
        assert_eq!(m.matching_folder_names, vec!["Research", "Physics"]);
        assert_eq!(m.first_matched_title.as_deref(), Some("Quantum Notes"));

        let none = s.find_folders_by_url("https://x.test/app/zzzzzzzzzz");
        assert!(!none.is_saved());
        assert_eq!(none.first_matched_title, None);
    }

    #[test]
    fn delete_folder_cascades_entries() {
        let (mut s, _) = store();
        let id = s.add_folder("Research").unwrap();
        let urls = ["/app/aaaaaaaaaa", "/app/bbbbbbbbbb", "/app/cccccccccc"];
        for u in urls {
            s.add_chat_to_folder(id, ChatEntry::new("t", u)).unwrap();
        }
        let removed = s.delete_folder(id).unwrap();
        assert_eq!(removed.chats.len(), 3);
        for u in urls {
            assert!(!s.find_folders_by_url(u).is_saved());
        }
    }

    #[test]
    fn filter_is_case_insensitive() {
        let (mut s, _) = store();
        s.add_folder("Research").unwrap();
        s.add_folder("Recipes").unwrap();
        s.add_folder("Work").unwrap();
        let hits: Vec<_> = s.filter("RE").iter().map(|f| f.name.as_str()).collect();
        assert_eq!(hits, vec!["Research", "Recipes"]);
        assert_eq!(s.filter("").len(), 3);
    }

    #[test]
    fn failed_write_keeps_in_memory_state() {
        let (mut s, kv) = store();
        kv.set_fail_writes(true);
        let id = s.add_folder("Offline").unwrap();
        assert_eq!(s.folder(id).unwrap().name, "Offline");
        assert_eq!(kv.raw(FOLDERS_KEY), None);

        kv.set_fail_writes(false);
        s.add_folder("Online").unwrap();
        let reloaded = FolderStore::load(Box::new(kv.clone()), IdentityCodec::default());
        assert_eq!(names(&reloaded), vec!["Offline", "Online"]);
    }

    #[test]
    fn corrupt_blob_is_backed_up_before_starting_empty() {
        let mut kv = MemoryKvStore::new();
        kv.set(FOLDERS_KEY, "not json").unwrap();
        let mut s = FolderStore::load(Box::new(kv.clone()), IdentityCodec::default());
        assert!(s.folders().is_empty());
        assert!(!s.is_read_only());
        assert_eq!(kv.raw(CORRUPT_KEY).as_deref(), Some("not json"));

        s.add_folder("Fresh").unwrap();
        assert_eq!(kv.raw(CORRUPT_KEY).as_deref(), Some("not json"));
    }

    #[test]
    fn corrupt_blob_without_backup_is_read_only() {
        let mut kv = MemoryKvStore::new();
        kv.set(FOLDERS_KEY, "not json").unwrap();
        kv.set_fail_writes(true);
        let mut s = FolderStore::load(Box::new(kv.clone()), IdentityCodec::default());
        assert!(s.is_read_only());

        kv.set_fail_writes(false);
        s.add_folder("Fresh").unwrap();
        assert_eq!(kv.raw(FOLDERS_KEY).as_deref(), Some("not json"));
    }

    #[test]
    fn failed_read_never_overwrites_saved_folders() {
        let (mut s, kv) = store();
        for name in ["Research", "Physics", "Recipes"] {
            s.add_folder(name).unwrap();
        }
        let writes = kv.write_count();

        kv.set_fail_reads(true);
        let mut reopened = FolderStore::load(Box::new(kv.clone()), IdentityCodec::default());
        kv.set_fail_reads(false);
        assert!(reopened.is_read_only());
        assert!(reopened.add_folder("New").is_ok());
        assert!(!reopened.persist());
        assert_eq!(kv.write_count(), writes);

        let reloaded = FolderStore::load(Box::new(kv.clone()), IdentityCodec::default());
        assert_eq!(names(&reloaded), vec!["Research", "Physics", "Recipes"]);
    }
}
