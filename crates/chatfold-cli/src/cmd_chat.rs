use std::path::{Path, PathBuf};

use anyhow::Context;
use chatfold_core::{ChatEntry, FolderId};
use chatfold_page::{HostPage, RecentChats, SnapshotPage};
use chatfold_store::StorePaths;
use chatfold_watch::{prefill_title, save_current, save_entry, SyncPresenter};
use clap::Subcommand;

use crate::settings::App;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ChatCmd {
    /// Add a chat entry by URL
    Add {
        folder_id: FolderId,
        url: String,
        /// Entry title (defaults to "New Chat")
        #[arg(long)]
        title: Option<String>,
    },
    /// Save the conversation shown in a page snapshot
    Save {
        /// Page snapshot JSON file
        snapshot: PathBuf,
        /// Target folder id
        #[arg(long)]
        folder: Option<FolderId>,
        /// Title to save under (prefilled from the page if omitted)
        #[arg(long)]
        title: Option<String>,
    },
    /// List recent conversations from a page snapshot's sidebar
    Recent {
        snapshot: PathBuf,
        /// Only chats whose title contains this text
        #[arg(long)]
        filter: Option<String>,
        /// Save the listed chat at this position into --folder
        #[arg(long, requires = "folder")]
        pick: Option<usize>,
        #[arg(long)]
        folder: Option<FolderId>,
    },
    /// Remove the chat at an index
    Rm { folder_id: FolderId, index: usize },
    /// Retitle the chat at an index
    Rename {
        folder_id: FolderId,
        index: usize,
        title: String,
    },
    /// Move a chat within its folder
    Move {
        folder_id: FolderId,
        from: usize,
        to: usize,
    },
}

// ── Dispatch ──

pub fn run(cmd: ChatCmd, paths: StorePaths) -> anyhow::Result<()> {
    let mut app = App::open(paths)?;
    match cmd {
        ChatCmd::Add {
            folder_id,
            url,
            title,
        } => {
            let source = ChatEntry::new("", url);
            let added = save_entry(
                &mut app.store,
                Some(folder_id),
                &source,
                title.as_deref().unwrap_or(""),
            )?;
            report_added(added);
        }
        ChatCmd::Save {
            snapshot,
            folder,
            title,
        } => save(&mut app, &snapshot, folder, title)?,
        ChatCmd::Recent {
            snapshot,
            filter,
            pick,
            folder,
        } => recent(&mut app, &snapshot, filter.as_deref().unwrap_or(""), pick, folder)?,
        ChatCmd::Rm { folder_id, index } => {
            match app.store.remove_chat_from_folder(folder_id, index)? {
                Some(chat) => println!("removed \"{}\"", chat.title),
                None => println!("no chat at index {index}"),
            }
        }
        ChatCmd::Rename {
            folder_id,
            index,
            title,
        } => {
            if app.store.rename_chat(folder_id, index, &title)? {
                println!("renamed {index}");
            } else {
                println!("no chat at index {index}");
            }
        }
        ChatCmd::Move {
            folder_id,
            from,
            to,
        } => {
            if app.store.reorder_chats(folder_id, from, to) {
                println!("moved {from} -> {to}");
            } else {
                println!("nothing to move");
            }
        }
    }
    Ok(())
}

// ── Command Implementations ──

fn save(
    app: &mut App,
    snapshot: &Path,
    folder: Option<FolderId>,
    title: Option<String>,
) -> anyhow::Result<()> {
    let page = SnapshotPage::load(snapshot)?;
    let view = app.watcher()?.detect(&page, &app.ctx);
    let mut presenter = SyncPresenter::new();
    presenter.update(view, &app.store);
    let current = presenter.current();

    let typed = match title {
        Some(t) => t,
        None => prefill_title(
            current.map(|c| c.title()).unwrap_or_default(),
            &page.document_title(),
            &app.settings.profile,
        ),
    };
    let added = save_current(&mut app.store, current, folder, &typed)?;
    report_added(added);
    Ok(())
}

fn recent(
    app: &mut App,
    snapshot: &Path,
    filter: &str,
    pick: Option<usize>,
    folder: Option<FolderId>,
) -> anyhow::Result<()> {
    let page = SnapshotPage::load(snapshot)?;
    let scanner = RecentChats::new(app.settings.profile.clone())
        .context("host_profile.route_prefix is not usable")?;
    let chats = scanner.scan(page.body(), filter);

    if let Some(i) = pick {
        let chat = chats
            .get(i)
            .with_context(|| format!("no recent chat at position {i}"))?;
        let added = save_entry(&mut app.store, folder, chat, "")?;
        report_added(added);
        return Ok(());
    }
    if chats.is_empty() {
        println!("No recent chats found");
    }
    for (i, chat) in chats.iter().enumerate() {
        println!("{i}. {}  {}", chat.title, chat.url);
    }
    Ok(())
}

fn report_added(added: bool) {
    if added {
        println!("saved");
    } else {
        println!("already in folder");
    }
}
