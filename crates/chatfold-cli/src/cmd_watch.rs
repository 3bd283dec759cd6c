use std::path::Path;
use std::time::{Duration, Instant};

use chatfold_core::ConversationView;
use chatfold_page::SnapshotPage;
use chatfold_store::StorePaths;
use chatfold_watch::SyncPresenter;

use crate::cmd_resolve::print_view;
use crate::settings::App;

/// `chatfold watch <snapshot>`
///
/// Re-reads the snapshot file on every wakeup and drives the watcher with
/// wall-clock milliseconds since start. Folder and session state are re-read
/// too, so `chatfold open` and `chatfold chat save` in another terminal show
/// up in the stream.
pub fn execute(
    paths: StorePaths,
    snapshot: &Path,
    for_ms: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let mut app = App::open(paths)?;
    let mut watcher = app.watcher()?;
    let mut presenter = SyncPresenter::new();
    let poll_ms = app.settings.watcher.poll_interval_ms;
    let start = Instant::now();

    eprintln!("chatfold watch {}", snapshot.display());
    eprintln!("Press Ctrl-C to stop.\n");

    loop {
        let now = elapsed_ms(start);
        if for_ms.is_some_and(|limit| now > limit) {
            return Ok(());
        }

        let wake = match SnapshotPage::load(snapshot) {
            Ok(page) => {
                app.reload()?;
                let mut views: Vec<ConversationView> = Vec::new();
                watcher.tick(now, &page, &mut app.ctx, &mut |v| views.push(v));
                for view in views {
                    let status = presenter.update(view.clone(), &app.store);
                    print_view(&view, &status, json)?;
                }
                watcher.next_wakeup()
            }
            Err(e) => {
                tracing::warn!(error = %e, "snapshot unreadable");
                eprintln!("error: {e:#}");
                now + poll_ms
            }
        };

        let now = elapsed_ms(start);
        if wake > now {
            std::thread::sleep(Duration::from_millis(wake - now));
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
