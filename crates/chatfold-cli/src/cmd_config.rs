use std::path::Path;

use anyhow::Context;
use chatfold_core::{HostProfile, IdentityCodec};
use chatfold_store::{write_atomic, StorePaths};
use clap::Subcommand;
use serde_json::{Map, Value};

use crate::settings::Settings;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// poll_interval_ms, redetect_delays_ms or host_profile
        key: String,
        /// JSON value, e.g. `250`, `[500,1200]` or `{"app_name":"Chatty"}`
        value: String,
    },
    /// Show the effective value of a key
    Get { key: String },
    /// Drop a key from config.json so its default applies again
    Unset { key: String },
    /// Show every key with its effective value
    List,
}

/// Keys read by [`Settings::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    PollIntervalMs,
    RedetectDelaysMs,
    HostProfile,
}

impl ConfigKey {
    const ALL: [ConfigKey; 3] = [
        ConfigKey::PollIntervalMs,
        ConfigKey::RedetectDelaysMs,
        ConfigKey::HostProfile,
    ];

    pub fn parse(key: &str) -> anyhow::Result<Self> {
        match Self::ALL.into_iter().find(|k| k.name() == key) {
            Some(k) => Ok(k),
            None => {
                let known: Vec<_> = Self::ALL.iter().map(|k| k.name()).collect();
                anyhow::bail!("unknown config key `{key}` (known: {})", known.join(", "))
            }
        }
    }

    fn name(self) -> &'static str {
        match self {
            ConfigKey::PollIntervalMs => "poll_interval_ms",
            ConfigKey::RedetectDelaysMs => "redetect_delays_ms",
            ConfigKey::HostProfile => "host_profile",
        }
    }

    /// Reject values `Settings::load` would ignore.
    fn check(self, value: &Value) -> anyhow::Result<()> {
        match self {
            ConfigKey::PollIntervalMs => {
                let ms: u64 = serde_json::from_value(value.clone())
                    .context("poll_interval_ms must be a whole number of milliseconds")?;
                anyhow::ensure!(ms > 0, "poll_interval_ms must be positive");
            }
            ConfigKey::RedetectDelaysMs => {
                serde_json::from_value::<Vec<u64>>(value.clone())
                    .context("redetect_delays_ms must be an array of milliseconds")?;
            }
            ConfigKey::HostProfile => {
                let profile: HostProfile = serde_json::from_value(value.clone())
                    .context("host_profile must be an object of profile fields")?;
                IdentityCodec::new(&profile).context("host_profile.route_prefix is not usable")?;
            }
        }
        Ok(())
    }

    fn effective(self, settings: &Settings) -> anyhow::Result<Value> {
        Ok(match self {
            ConfigKey::PollIntervalMs => Value::from(settings.watcher.poll_interval_ms),
            ConfigKey::RedetectDelaysMs => serde_json::to_value(&settings.watcher.redetect_delays_ms)?,
            ConfigKey::HostProfile => serde_json::to_value(&settings.profile)?,
        })
    }
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, paths: &StorePaths) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(paths, ConfigKey::parse(&key)?, &value),
        ConfigCmd::Get { key } => get(paths, ConfigKey::parse(&key)?),
        ConfigCmd::Unset { key } => unset(paths, ConfigKey::parse(&key)?),
        ConfigCmd::List => list(paths),
    }
}

// ── Command Implementations ──

/// Read `config.json`. Returns an empty map if the file doesn't exist.
fn read_config(path: &Path) -> anyhow::Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&content)
        .with_context(|| format!("parsing {}", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} is not a JSON object", path.display()),
    }
}

fn write_config(path: &Path, config: &Map<String, Value>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    write_atomic(path, json.as_bytes())
}

/// `chatfold config set <key> <value>`
pub fn set(paths: &StorePaths, key: ConfigKey, raw: &str) -> anyhow::Result<()> {
    let value: Value = serde_json::from_str(raw)
        .with_context(|| format!("{} expects a JSON value, got `{raw}`", key.name()))?;
    key.check(&value)?;
    paths.ensure_layout()?;
    let mut config = read_config(&paths.config_json)?;
    config.insert(key.name().to_string(), value.clone());
    write_config(&paths.config_json, &config)?;
    println!("{} = {value}", key.name());
    Ok(())
}

/// `chatfold config get <key>`
pub fn get(paths: &StorePaths, key: ConfigKey) -> anyhow::Result<()> {
    let config = read_config(&paths.config_json)?;
    let value = key.effective(&Settings::load(paths))?;
    println!("{value}{}", origin(&config, key));
    Ok(())
}

/// `chatfold config unset <key>`
pub fn unset(paths: &StorePaths, key: ConfigKey) -> anyhow::Result<()> {
    let mut config = read_config(&paths.config_json)?;
    if config.remove(key.name()).is_none() {
        println!("{} was not set", key.name());
        return Ok(());
    }
    write_config(&paths.config_json, &config)?;
    println!("{} reset to default", key.name());
    Ok(())
}

/// `chatfold config list`
pub fn list(paths: &StorePaths) -> anyhow::Result<()> {
    let config = read_config(&paths.config_json)?;
    let settings = Settings::load(paths);
    for key in ConfigKey::ALL {
        println!(
            "{} = {}{}",
            key.name(),
            key.effective(&settings)?,
            origin(&config, key)
        );
    }
    for unknown in config.keys().filter(|k| !ConfigKey::ALL.iter().any(|c| c.name() == k.as_str())) {
        tracing::warn!(key = %unknown, "config.json has a key chatfold does not read");
    }
    Ok(())
}

fn origin(config: &Map<String, Value>, key: ConfigKey) -> &'static str {
    if config.contains_key(key.name()) {
        ""
    } else {
        "  (default)"
    }
}
