use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::DEFAULT_BACKEND_URL;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub initial_redacted_count: u64,
    pub log_filter: String,
    pub clock_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            initial_redacted_count: 142,
            log_filter: "info".into(),
            clock_interval_ms: 1000,
        }
    }
}

impl Settings {
    /// Applies command-line overrides, which take precedence over everything else.
    pub fn with_overrides(mut self, backend_url: Option<String>) -> Self {
        if let Some(url) = backend_url {
            self.backend_url = url;
        }
        self
    }

    pub fn clock_interval(&self) -> Duration {
        Duration::from_millis(self.clock_interval_ms.max(1))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    backend_url: Option<String>,
    initial_redacted_count: Option<u64>,
    log_filter: Option<String>,
    clock_interval_ms: Option<u64>,
}

/// Defaults, then `console.toml` (or `config_path`), then environment.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    config_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    if let Some(file_cfg) = read_file_settings(&path, required)? {
        if let Some(v) = file_cfg.backend_url {
            settings.backend_url = v;
        }
        if let Some(v) = file_cfg.initial_redacted_count {
            settings.initial_redacted_count = v;
        }
        if let Some(v) = file_cfg.log_filter {
            settings.log_filter = v;
        }
        if let Some(v) = file_cfg.clock_interval_ms {
            settings.clock_interval_ms = v;
        }
    }

    if let Some(v) = first_env(&env, &["CONSOLE_BACKEND_URL", "APP__BACKEND_URL"]) {
        settings.backend_url = v;
    }
    if let Some(v) = first_env(
        &env,
        &["CONSOLE_INITIAL_REDACTED_COUNT", "APP__INITIAL_REDACTED_COUNT"],
    ) {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.initial_redacted_count = parsed;
        }
    }
    if let Some(v) = first_env(&env, &["CONSOLE_LOG", "APP__LOG_FILTER"]) {
        settings.log_filter = v;
    }
    if let Some(v) = first_env(
        &env,
        &["CONSOLE_CLOCK_INTERVAL_MS", "APP__CLOCK_INTERVAL_MS"],
    ) {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.clock_interval_ms = parsed;
        }
    }

    Ok(settings)
}

/// Later keys win, matching the `APP__*` overrides of the other services.
fn first_env(env: &impl Fn(&str) -> Option<String>, keys: &[&str]) -> Option<String> {
    keys.iter().rev().find_map(|key| env(key))
}

fn read_file_settings(path: &Path, required: bool) -> anyhow::Result<Option<FileSettings>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| {
                format!("failed to read config file '{}'", path.display())
            })
        }
    };
    let parsed = toml::from_str::<FileSettings>(&raw)
        .with_context(|| format!("invalid config file '{}'", path.display()))?;
    Ok(Some(parsed))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
