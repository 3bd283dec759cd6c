use std::path::Path;

use anyhow::Context;
use chatfold_core::{ConversationView, FolderId};
use chatfold_page::SnapshotPage;
use chatfold_store::{write_atomic, StorePaths};
use chatfold_watch::{open_saved_chat, OpenOutcome, SyncPresenter};

use crate::cmd_resolve::print_view;
use crate::settings::App;

/// `chatfold open <folder-id> <index> --page <snapshot>`
///
/// The snapshot file stands in for the browser tab: after navigation or a
/// simulated click its new location is written back.
pub fn execute(
    paths: StorePaths,
    folder_id: FolderId,
    index: usize,
    snapshot: &Path,
) -> anyhow::Result<()> {
    let mut app = App::open(paths)?;
    let mut page = SnapshotPage::load(snapshot)?;
    let mut watcher = app.watcher()?;
    let mut views: Vec<ConversationView> = Vec::new();

    let outcome = open_saved_chat(
        &app.store,
        folder_id,
        index,
        &mut app.ctx,
        &mut page,
        &mut watcher,
        &mut |v| views.push(v),
    )
    .with_context(|| format!("opening chat {index} of folder {folder_id}"))?;

    match &outcome {
        OpenOutcome::Clicked(path) => println!("clicked {path}"),
        OpenOutcome::Redetected => println!("already open"),
        OpenOutcome::Navigated => println!("navigated to {}", page.url),
    }
    if !matches!(outcome, OpenOutcome::Redetected) {
        let json = serde_json::to_string_pretty(&page)?;
        write_atomic(snapshot, json.as_bytes())?;
    }

    let mut presenter = SyncPresenter::new();
    for view in views {
        let status = presenter.update(view.clone(), &app.store);
        print_view(&view, &status, false)?;
    }
    Ok(())
}
