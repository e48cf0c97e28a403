use std::{fs, path::Path, time::Duration};

use identity::FederatedTokenConfig;
use serde::Deserialize;
use tracing::warn;

pub const SETTINGS_FILE: &str = "splitease.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub database_url: String,
    pub splash_delay_ms: u64,
    pub federated_issuer: String,
    pub federated_token_secret: String,
    pub event_capacity: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/splitease.db".into(),
            splash_delay_ms: 2500,
            federated_issuer: "splitease-dev-idp".into(),
            federated_token_secret: "devsecret".into(),
            event_capacity: 256,
        }
    }
}

impl ClientSettings {
    pub fn splash_delay(&self) -> Duration {
        Duration::from_millis(self.splash_delay_ms)
    }

    pub fn federated_token_config(&self) -> FederatedTokenConfig {
        FederatedTokenConfig {
            issuer: self.federated_issuer.clone(),
            secret: self.federated_token_secret.clone(),
            ..FederatedTokenConfig::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    database_url: Option<String>,
    splash_delay_ms: Option<u64>,
    federated_issuer: Option<String>,
    federated_token_secret: Option<String>,
    event_capacity: Option<usize>,
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the optional TOML file, then environment overrides.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(error) => warn!(path = %path.display(), %error, "ignoring unreadable settings file"),
        }
    }

    apply_env(&mut settings, env);
    settings
}

fn apply_file(settings: &mut ClientSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.splash_delay_ms {
        settings.splash_delay_ms = v;
    }
    if let Some(v) = file_cfg.federated_issuer {
        settings.federated_issuer = v;
    }
    if let Some(v) = file_cfg.federated_token_secret {
        settings.federated_token_secret = v;
    }
    if let Some(v) = file_cfg.event_capacity {
        settings.event_capacity = v;
    }
}

fn apply_env(settings: &mut ClientSettings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__SPLASH_DELAY_MS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.splash_delay_ms = parsed,
            Err(_) => warn!(value = %v, "APP__SPLASH_DELAY_MS is not a number; keeping previous value"),
        }
    }

    if let Some(v) = env("APP__FEDERATED_ISSUER") {
        settings.federated_issuer = v;
    }
    if let Some(v) = env("APP__FEDERATED_TOKEN_SECRET") {
        settings.federated_token_secret = v;
    }

    if let Some(v) = env("APP__EVENT_CAPACITY") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.event_capacity = parsed.max(1);
        }
    }
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
