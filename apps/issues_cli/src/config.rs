use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use client_core::{ControllerSettings, HttpTransportConfig};
use serde::Deserialize;
use shared::domain::ProjectRef;

pub const DEFAULT_CONFIG_FILE: &str = "processing-issues.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub api_prefix: String,
    pub auth_token: Option<String>,
    pub org: Option<String>,
    pub project: Option<String>,
    pub refresh_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "https://sentry.io".into(),
            api_prefix: "/api/0".into(),
            auth_token: None,
            org: None,
            project: None,
            refresh_delay_ms: 1000,
            request_timeout_secs: 30,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    api_prefix: Option<String>,
    auth_token: Option<String>,
    org: Option<String>,
    project: Option<String>,
    refresh_delay_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    log_filter: Option<String>,
}

impl Settings {
    pub fn apply_file(&mut self, raw: &str) -> Result<(), toml::de::Error> {
        let file_cfg: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file_cfg.server_url {
            self.server_url = v;
        }
        if let Some(v) = file_cfg.api_prefix {
            self.api_prefix = v;
        }
        if let Some(v) = file_cfg.auth_token {
            self.auth_token = Some(v);
        }
        if let Some(v) = file_cfg.org {
            self.org = Some(v);
        }
        if let Some(v) = file_cfg.project {
            self.project = Some(v);
        }
        if let Some(v) = file_cfg.refresh_delay_ms {
            self.refresh_delay_ms = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file_cfg.log_filter {
            self.log_filter = v;
        }
        Ok(())
    }

    /// Later keys in each group win, so `APP__*` overrides the shorter names.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for key in ["SENTRY_URL", "APP__SERVER_URL"] {
            if let Some(v) = lookup(key) {
                self.server_url = v;
            }
        }
        if let Some(v) = lookup("APP__API_PREFIX") {
            self.api_prefix = v;
        }
        for key in ["SENTRY_AUTH_TOKEN", "APP__AUTH_TOKEN"] {
            if let Some(v) = lookup(key) {
                self.auth_token = Some(v);
            }
        }
        for key in ["SENTRY_ORG", "APP__ORG"] {
            if let Some(v) = lookup(key) {
                self.org = Some(v);
            }
        }
        for key in ["SENTRY_PROJECT", "APP__PROJECT"] {
            if let Some(v) = lookup(key) {
                self.project = Some(v);
            }
        }
        if let Some(parsed) = lookup("APP__REFRESH_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.refresh_delay_ms = parsed;
        }
        if let Some(parsed) = lookup("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.request_timeout_secs = parsed;
        }
        if let Some(v) = lookup("RUST_LOG") {
            self.log_filter = v;
        }
    }

    pub fn project_ref(&self) -> anyhow::Result<ProjectRef> {
        let org = self.org.as_deref().map(str::trim).unwrap_or_default();
        let project = self.project.as_deref().map(str::trim).unwrap_or_default();
        if org.is_empty() {
            bail!("no organization configured; pass --org or set SENTRY_ORG");
        }
        if project.is_empty() {
            bail!("no project configured; pass --project or set SENTRY_PROJECT");
        }
        Ok(ProjectRef::new(org, project))
    }

    pub fn transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig {
            server_url: self.server_url.clone(),
            api_prefix: self.api_prefix.clone(),
            auth_token: self.auth_token.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            refresh_delay: Duration::from_millis(self.refresh_delay_ms),
        }
    }
}

/// Defaults, then the config file, then the environment. An explicit
/// `path` must exist; the default file is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            settings
                .apply_file(&raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_CONFIG_FILE) {
                settings
                    .apply_file(&raw)
                    .with_context(|| format!("invalid config file '{DEFAULT_CONFIG_FILE}'"))?;
            }
        }
    }

    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}
