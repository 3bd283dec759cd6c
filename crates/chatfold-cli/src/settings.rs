use anyhow::Context;
use chatfold_core::{HostProfile, IdentityCodec};
use chatfold_page::TitleResolver;
use chatfold_store::{FileKvStore, FolderStore, NavigationContext, StorePaths};
use chatfold_watch::{ChatWatcher, WatcherConfig};

/// Environment override for the poll interval, in milliseconds.
pub const POLL_ENV: &str = "CHATFOLD_POLL_MS";

/// Effective settings: `config.json` keys over built-in defaults, then env.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub watcher: WatcherConfig,
    pub profile: HostProfile,
}

impl Settings {
    /// Missing or unparseable keys keep their defaults.
    pub fn load(paths: &StorePaths) -> Self {
        let mut settings = Self::default();
        let val: serde_json::Value = match std::fs::read_to_string(&paths.config_json)
            .ok()
            .and_then(|c| serde_json::from_str(&c).ok())
        {
            Some(v) => v,
            None => return settings.with_env(),
        };
        if let Some(ms) = val.get("poll_interval_ms").and_then(|v| v.as_u64()) {
            settings.watcher.poll_interval_ms = ms;
        }
        if let Some(delays) = val.get("redetect_delays_ms") {
            match serde_json::from_value::<Vec<u64>>(delays.clone()) {
                Ok(d) => settings.watcher.redetect_delays_ms = d,
                Err(e) => tracing::warn!(error = %e, "ignoring redetect_delays_ms"),
            }
        }
        if let Some(profile) = val.get("host_profile") {
            match serde_json::from_value::<HostProfile>(profile.clone()) {
                Ok(p) => settings.profile = p,
                Err(e) => tracing::warn!(error = %e, "ignoring host_profile"),
            }
        }
        settings.with_env()
    }

    fn with_env(mut self) -> Self {
        if let Some(ms) = std::env::var(POLL_ENV)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.watcher.poll_interval_ms = ms;
        }
        // a zero interval would spin
        self.watcher.poll_interval_ms = self.watcher.poll_interval_ms.max(1);
        self
    }

    pub fn codec(&self) -> anyhow::Result<IdentityCodec> {
        IdentityCodec::new(&self.profile).context("host_profile.route_prefix is not usable")
    }

    pub fn resolver(&self) -> anyhow::Result<TitleResolver> {
        Ok(TitleResolver::new(self.profile.clone(), self.codec()?))
    }
}

/// Everything a command needs, opened from the store root.
pub struct App {
    pub paths: StorePaths,
    pub settings: Settings,
    pub store: FolderStore,
    pub ctx: NavigationContext,
}

impl App {
    pub fn open(paths: StorePaths) -> anyhow::Result<Self> {
        paths
            .ensure_layout()
            .with_context(|| format!("creating store at {}", paths.root.display()))?;
        let settings = Settings::load(&paths);
        let store = FolderStore::load(
            Box::new(FileKvStore::new(&paths.local_dir)),
            settings.codec()?,
        );
        if store.is_read_only() {
            anyhow::bail!(
                "folder data in {} could not be read; refusing to run so it is not overwritten",
                paths.local_dir.display()
            );
        }
        let ctx = NavigationContext::restore(Box::new(FileKvStore::new(&paths.session_dir)));
        Ok(Self {
            paths,
            settings,
            store,
            ctx,
        })
    }

    /// Re-read both stores, picking up writes made by other invocations.
    pub fn reload(&mut self) -> anyhow::Result<()> {
        self.store = FolderStore::load(
            Box::new(FileKvStore::new(&self.paths.local_dir)),
            self.settings.codec()?,
        );
        self.ctx = NavigationContext::restore(Box::new(FileKvStore::new(&self.paths.session_dir)));
        Ok(())
    }

    pub fn watcher(&self) -> anyhow::Result<ChatWatcher> {
        Ok(ChatWatcher::new(
            self.settings.resolver()?,
            self.settings.watcher.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_reads_keys_and_env_override() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = StorePaths::discover(tmp.path());
        paths.ensure_layout().unwrap();
        std::fs::write(
            &paths.config_json,
            r#"{"poll_interval_ms": 250, "redetect_delays_ms": [100],
                "host_profile": {"route_prefix": "/c/", "app_name": "Chatty"}}"#,
        )
        .unwrap();

        std::env::remove_var(POLL_ENV);
        let s = Settings::load(&paths);
        assert_eq!(s.watcher.poll_interval_ms, 250);
        assert_eq!(s.watcher.redetect_delays_ms, vec![100]);
        assert_eq!(s.profile.route_prefix, "/c/");
        assert_eq!(s.profile.fallback_title, "Current Chat");
        assert!(s
            .codec()
            .unwrap()
            .is_conversation_url("https://x.test/c/abcdef123456"));

        std::env::set_var(POLL_ENV, "75");
        assert_eq!(Settings::load(&paths).watcher.poll_interval_ms, 75);
        std::env::set_var(POLL_ENV, "soon");
        assert_eq!(Settings::load(&paths).watcher.poll_interval_ms, 250);
        std::env::remove_var(POLL_ENV);
    }

    #[test]
    fn missing_config_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = StorePaths::discover(tmp.path());
        let s = Settings::load(&paths);
        assert_eq!(
            s.watcher.redetect_delays_ms,
            WatcherConfig::default().redetect_delays_ms
        );
        assert_eq!(s.profile.route_prefix, "/app/");
    }

    #[test]
    fn open_refuses_unreadable_folder_data() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = StorePaths::discover(tmp.path());
        paths.ensure_layout().unwrap();
        // a directory where the data file belongs cannot be read as text
        std::fs::create_dir_all(paths.local_dir.join("chatfold_folder_data_v2.json")).unwrap();
        let err = App::open(paths).err().unwrap();
        assert!(err.to_string().contains("could not be read"));
    }
}
