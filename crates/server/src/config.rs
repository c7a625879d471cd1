use std::{fs, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use server_api::DEFAULT_RESPONSE_DELAY;

const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub response_delay: Duration,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            response_delay: DEFAULT_RESPONSE_DELAY,
            max_body_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    response_delay_ms: Option<u64>,
    max_body_bytes: Option<usize>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse {SETTINGS_FILE}"))?;
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.response_delay_ms {
        settings.response_delay = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.max_body_bytes {
        settings.max_body_bytes = v;
    }
    Ok(())
}

/// Later keys win, so `APP__*` overrides the bare name.
fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    for key in ["SERVER_BIND", "APP__BIND_ADDR"] {
        if let Some(v) = lookup(key) {
            settings.server_bind = v;
        }
    }

    if let Some(v) = lookup("APP__RESPONSE_DELAY_MS") {
        match v.parse::<u64>() {
            Ok(ms) => settings.response_delay = Duration::from_millis(ms),
            Err(_) => tracing::warn!(value = %v, "ignoring unparsable APP__RESPONSE_DELAY_MS"),
        }
    }

    if let Some(v) = lookup("APP__MAX_BODY_BYTES") {
        match v.parse::<usize>() {
            Ok(bytes) => settings.max_body_bytes = bytes,
            Err(_) => tracing::warn!(value = %v, "ignoring unparsable APP__MAX_BODY_BYTES"),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
