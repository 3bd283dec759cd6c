pub mod actions;
pub mod presenter;
pub mod watcher;

pub use actions::{
    open_saved_chat, prefill_title, save_current, save_entry, NavigateError, OpenOutcome,
    SIMULATE_CLICK_SCHEME,
};
pub use presenter::{CurrentChat, SyncPresenter, SyncStatus};
pub use watcher::{ChatWatcher, ViewSink, WatchState, WatcherConfig};
