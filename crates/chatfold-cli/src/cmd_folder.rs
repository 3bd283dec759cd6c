use chatfold_core::FolderId;
use chatfold_store::StorePaths;
use clap::Subcommand;

use crate::settings::App;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum FolderCmd {
    /// Create a folder
    Add {
        /// Folder name (at most 30 characters)
        name: String,
    },
    /// Rename a folder
    Rename { id: FolderId, name: String },
    /// Delete a folder and every chat in it
    Rm { id: FolderId },
    /// List folders and their chats
    List {
        /// Only folders whose name contains this text
        #[arg(long)]
        filter: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a folder to another position
    Move { from: usize, to: usize },
}

// ── Dispatch ──

pub fn run(cmd: FolderCmd, paths: StorePaths) -> anyhow::Result<()> {
    let mut app = App::open(paths)?;
    match cmd {
        FolderCmd::Add { name } => {
            let id = app.store.add_folder(&name)?;
            println!("{id}  {}", name.trim());
        }
        FolderCmd::Rename { id, name } => {
            app.store.rename_folder(id, &name)?;
            println!("renamed {id}");
        }
        FolderCmd::Rm { id } => {
            let removed = app.store.delete_folder(id)?;
            println!("deleted \"{}\" ({} chats)", removed.name, removed.chats.len());
        }
        FolderCmd::List { filter, json } => list(&app, filter.as_deref().unwrap_or(""), json)?,
        FolderCmd::Move { from, to } => {
            if app.store.reorder_folders(from, to) {
                println!("moved {from} -> {to}");
            } else {
                println!("nothing to move");
            }
        }
    }
    Ok(())
}

// ── Command Implementations ──

fn list(app: &App, filter: &str, json: bool) -> anyhow::Result<()> {
    let folders = app.store.filter(filter);
    if json {
        println!("{}", serde_json::to_string_pretty(&folders)?);
        return Ok(());
    }
    if folders.is_empty() {
        println!("No folders yet");
        return Ok(());
    }
    for folder in folders {
        println!("{}  {} ({})", folder.id, folder.name, folder.chats.len());
        for (i, chat) in folder.chats.iter().enumerate() {
            println!("    {i}. {}  {}", chat.title, chat.url);
        }
    }
    Ok(())
}
