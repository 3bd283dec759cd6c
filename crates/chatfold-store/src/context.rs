//! Navigation context: the short-lived "I just opened this from folder X" hint.
//!
//! Kept in memory and mirrored to session-scoped storage so a full page
//! reload restores it. It clears itself once the live URL no longer relates
//! to the recorded one.

use chatfold_core::NavigationContextRecord;

use crate::kv::KvStore;

/// Session key holding the serialized record.
pub const CONTEXT_KEY: &str = "chatfold_context";

pub struct NavigationContext {
    record: Option<NavigationContextRecord>,
    session: Box<dyn KvStore>,
}

impl NavigationContext {
    /// Create the context, restoring any record left in session storage.
    pub fn restore(session: Box<dyn KvStore>) -> Self {
        let record = match session.get(CONTEXT_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<NavigationContextRecord>(&raw) {
                Ok(r) => Some(r),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable navigation context");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to restore navigation context");
                None
            }
        };
        if let Some(r) = &record {
            tracing::debug!(url = %r.url, "navigation context restored");
        }
        Self { record, session }
    }

    pub fn set(&mut self, record: NavigationContextRecord) {
        tracing::debug!(url = %record.url, folder = %record.folder_name, "navigation context set");
        match serde_json::to_string(&record) {
            Ok(json) => {
                if let Err(e) = self.session.set(CONTEXT_KEY, &json) {
                    tracing::warn!(error = %e, "failed to persist navigation context");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize navigation context"),
        }
        self.record = Some(record);
    }

    pub fn get(&self) -> Option<&NavigationContextRecord> {
        self.record.as_ref()
    }

    pub fn clear(&mut self) {
        self.record = None;
        if let Err(e) = self.session.remove(CONTEXT_KEY) {
            tracing::warn!(error = %e, "failed to remove navigation context");
        }
    }

    /// The record, if it applies to `live_url`.
    pub fn override_for(&self, live_url: &str) -> Option<&NavigationContextRecord> {
        self.record.as_ref().filter(|r| r.relates_to(live_url))
    }

    /// Drop the record when `live_url` has moved away from it.
    /// Returns true if a record was cleared.
    pub fn invalidate_for(&mut self, live_url: &str) -> bool {
        let stale = matches!(&self.record, Some(r) if !r.relates_to(live_url));
        if stale {
            tracing::debug!(live_url, "navigation context no longer applies");
            self.clear();
        }
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;

    fn record(url: &str) -> NavigationContextRecord {
        NavigationContextRecord {
            url: url.to_string(),
            title: "Quantum Notes".to_string(),
            folder_name: "Research".to_string(),
            context_title: "Quantum Notes".to_string(),
        }
    }

    #[test]
    fn set_survives_reload() {
        let session = MemoryKvStore::new();
        let mut ctx = NavigationContext::restore(Box::new(session.clone()));
        ctx.set(record("/app/abc1234567"));

        let reloaded = NavigationContext::restore(Box::new(session.clone()));
        assert_eq!(reloaded.get(), Some(&record("/app/abc1234567")));
    }

    #[test]
    fn clear_removes_from_session() {
        let session = MemoryKvStore::new();
        let mut ctx = NavigationContext::restore(Box::new(session.clone()));
        ctx.set(record("/app/abc1234567"));
        ctx.clear();
        assert!(ctx.get().is_none());
        assert_eq!(session.raw(CONTEXT_KEY), None);
        assert!(NavigationContext::restore(Box::new(session)).get().is_none());
    }

    #[test]
    fn invalidate_keeps_related_urls() {
        let mut ctx = NavigationContext::restore(Box::new(MemoryKvStore::new()));
        ctx.set(record("https://x.test/app/abc1234567"));
        assert!(!ctx.invalidate_for("https://x.test/app/abc1234567?hl=en"));
        assert!(ctx.get().is_some());
        assert!(ctx.invalidate_for("https://x.test/app/zzzzzzzzzz"));
        assert!(ctx.get().is_none());
        // nothing left to clear
        assert!(!ctx.invalidate_for("https://x.test/app/yyyyyyyyyy"));
    }

    #[test]
    fn override_only_for_related_url() {
        let mut ctx = NavigationContext::restore(Box::new(MemoryKvStore::new()));
        ctx.set(record("/app/abc1234567"));
        assert!(ctx.override_for("https://x.test/app/abc1234567").is_some());
        assert!(ctx.override_for("https://x.test/app/other00000").is_none());
    }

    #[test]
    fn garbage_in_session_is_ignored() {
        let mut session = MemoryKvStore::new();
        session.set(CONTEXT_KEY, "{not json").unwrap();
        assert!(NavigationContext::restore(Box::new(session)).get().is_none());
    }

    #[test]
    fn failed_session_write_keeps_memory_record() {
        let session = MemoryKvStore::new();
        session.set_fail_writes(true);
        let mut ctx = NavigationContext::restore(Box::new(session.clone()));
        ctx.set(record("/app/abc1234567"));
        assert!(ctx.get().is_some());
        assert_eq!(session.raw(CONTEXT_KEY), None);
    }
}
