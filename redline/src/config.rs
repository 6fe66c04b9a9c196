//! User configuration.
//!
//! Read once at startup from `$XDG_CONFIG_HOME/redline/config.toml`
//! (falling back to `~/.config/redline/config.toml`). Config problems are
//! soft failures: defaults apply and a note goes to stderr, since the
//! subscriber may not be installed yet when this runs.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Baseline reference a new session diffs against.
    pub base_ref: String,
    /// Command to spawn for the auto-fix hand-off; the path of the
    /// exported `latest.toml` is appended as the final argument.
    pub agent_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self { base_ref: "main".to_owned(), agent_command: None }
    }
}

/// Returns the path to the redline config file.
///
/// Prefers `$XDG_CONFIG_HOME/redline/config.toml`; falls back to
/// `~/.config/redline/config.toml` when the env var is absent.
fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("redline").join("config.toml")
}

/// Loads the config, falling back to defaults on any problem.
pub fn load() -> Config {
    let path = config_path();
    let raw = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(_) => return Config::default(),
    };
    match toml::from_str(&raw) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("redline: config parse error in {:?}: {}", path, e);
            Config::default()
        }
    }
}
