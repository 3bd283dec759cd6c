use std::path::{Path, PathBuf};

/// Environment variable overriding the per-user store root.
pub const HOME_ENV: &str = "CHATFOLD_HOME";

/// All well-known paths under the store root.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub root: PathBuf,
    /// Durable key-value directory (folder store).
    pub local_dir: PathBuf,
    /// Session-scoped key-value directory (navigation context).
    pub session_dir: PathBuf,
    pub config_json: PathBuf,
}

impl StorePaths {
    /// Derive all paths from a store root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            local_dir: root.join("local"),
            session_dir: root.join("session"),
            config_json: root.join("config.json"),
            root,
        }
    }

    /// Resolve the root from `CHATFOLD_HOME`, else the per-user data dir.
    pub fn from_env() -> Self {
        match std::env::var_os(HOME_ENV) {
            Some(dir) if !dir.is_empty() => Self::discover(PathBuf::from(dir)),
            _ => Self::discover(store_root()),
        }
    }

    /// Create all required directories. Idempotent.
    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        for dir in [&self.root, &self.local_dir, &self.session_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Return the per-user store root: `<data_dir>/chatfold`, falling back to
/// `~/.chatfold` and finally `./.chatfold-store`.
pub fn store_root() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("chatfold")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".chatfold")
    } else {
        Path::new(".chatfold-store").to_path_buf()
    }
}
