use std::path::Path;

use chatfold_core::ConversationView;
use chatfold_page::SnapshotPage;
use chatfold_store::StorePaths;
use chatfold_watch::{SyncPresenter, SyncStatus};

use crate::settings::App;

/// `chatfold resolve <snapshot>`
pub fn execute(paths: StorePaths, snapshot: &Path, json: bool) -> anyhow::Result<()> {
    let app = App::open(paths)?;
    let page = SnapshotPage::load(snapshot)?;
    let view = app.watcher()?.detect(&page, &app.ctx);
    let status = SyncPresenter::new().update(view.clone(), &app.store);
    print_view(&view, &status, json)
}

/// One line per emission, or one JSON object per line.
pub fn print_view(view: &ConversationView, status: &SyncStatus, json: bool) -> anyhow::Result<()> {
    if json {
        let line = serde_json::json!({
            "view": view,
            "label": status.label(),
            "headline": status.headline(),
            "action": status.action(),
        });
        println!("{line}");
        return Ok(());
    }
    let source = match view.source {
        chatfold_core::ViewSource::Context => "context",
        chatfold_core::ViewSource::Dom => "dom",
        chatfold_core::ViewSource::Fallback => "fallback",
    };
    println!(
        "{:<9} {}  [{}]  {}: {}",
        source,
        view.title,
        view.url,
        status.label(),
        status.headline()
    );
    Ok(())
}
