mod cmd_chat;
mod cmd_config;
mod cmd_find;
mod cmd_folder;
mod cmd_open;
mod cmd_reset;
mod cmd_resolve;
mod cmd_watch;
mod settings;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Log filter variable, e.g. `CHATFOLD_LOG=chatfold_watch=debug`.
const LOG_ENV: &str = "CHATFOLD_LOG";

#[derive(Parser)]
#[command(
    name = "chatfold",
    version,
    about = "Organize chat conversations into local folders"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage folders
    Folder {
        #[command(subcommand)]
        cmd: cmd_folder::FolderCmd,
    },
    /// Manage chat entries inside folders
    Chat {
        #[command(subcommand)]
        cmd: cmd_chat::ChatCmd,
    },
    /// Show which folders hold a conversation
    Find {
        /// Conversation URL (absolute or path)
        url: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run one detection pass over a page snapshot
    Resolve {
        /// Page snapshot JSON file
        snapshot: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Follow a page snapshot file and print every emitted view
    Watch {
        /// Page snapshot JSON file, re-read on every tick
        snapshot: PathBuf,
        /// Stop after this many milliseconds (runs until interrupted if omitted)
        #[arg(long)]
        for_ms: Option<u64>,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Open a saved chat in a page snapshot
    Open {
        /// Folder id
        folder_id: i64,
        /// Chat index within the folder
        index: usize,
        /// Page snapshot JSON file; updated in place after navigation
        #[arg(long)]
        page: PathBuf,
    },
    /// Manage config.json values
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
    /// Forget the navigation context of the current session
    Reset,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = chatfold_store::StorePaths::from_env();

    match cli.cmd {
        Command::Folder { cmd } => cmd_folder::run(cmd, paths),
        Command::Chat { cmd } => cmd_chat::run(cmd, paths),
        Command::Find { url, json } => cmd_find::execute(paths, &url, json),
        Command::Resolve { snapshot, json } => cmd_resolve::execute(paths, &snapshot, json),
        Command::Watch {
            snapshot,
            for_ms,
            json,
        } => cmd_watch::execute(paths, &snapshot, for_ms, json),
        Command::Open {
            folder_id,
            index,
            page,
        } => cmd_open::execute(paths, folder_id, index, &page),
        Command::Config { cmd } => cmd_config::run(cmd, &paths),
        Command::Reset => cmd_reset::execute(paths),
    }
}
