use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "assistant.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub database_url: String,
    pub toast_ms: u64,
    pub main_view_delay_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            database_url: "sqlite://./data/client_state.db".into(),
            toast_ms: 3000,
            main_view_delay_ms: 500,
        }
    }
}

/// Keys accepted in `assistant.toml`; anything absent keeps its default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    database_url: Option<String>,
    toast_ms: Option<u64>,
    main_view_delay_ms: Option<u64>,
}

impl ClientSettings {
    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }

    pub fn main_view_delay(&self) -> Duration {
        Duration::from_millis(self.main_view_delay_ms)
    }

    fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file_cfg: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file_cfg.server_url {
            self.server_url = v;
        }
        if let Some(v) = file_cfg.database_url {
            self.database_url = v;
        }
        if let Some(v) = file_cfg.toast_ms {
            self.toast_ms = v;
        }
        if let Some(v) = file_cfg.main_view_delay_ms {
            self.main_view_delay_ms = v;
        }
        Ok(())
    }

    /// Later keys win, so `APP__*` overrides the plain names.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for key in ["ASSISTANT_SERVER_URL", "APP__SERVER_URL"] {
            if let Some(v) = lookup(key) {
                self.server_url = v;
            }
        }
        for key in ["DATABASE_URL", "APP__DATABASE_URL"] {
            if let Some(v) = lookup(key) {
                self.database_url = v;
            }
        }
        if let Some(v) = parse_millis(&lookup, "APP__TOAST_MS") {
            self.toast_ms = v;
        }
        if let Some(v) = parse_millis(&lookup, "APP__MAIN_VIEW_DELAY_MS") {
            self.main_view_delay_ms = v;
        }
    }
}

fn parse_millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(key, value = %raw, "config: ignoring non-numeric duration");
            None
        }
    }
}

/// Defaults, then the config file, then the process environment.
///
/// An explicit `config_path` must exist; the implicit `assistant.toml` is
/// optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    config_path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    let raw = match config_path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?,
        ),
        None => fs::read_to_string(DEFAULT_CONFIG_FILE).ok(),
    };
    if let Some(raw) = raw {
        let source = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        settings
            .apply_file(&raw)
            .with_context(|| format!("invalid config file '{}'", source.display()))?;
    }

    settings.apply_env(lookup);
    Ok(settings)
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return ClientSettings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
