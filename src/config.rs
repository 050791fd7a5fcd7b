use anyhow::{Context, Result};
use chrono::TimeDelta;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::CliArgs;
use crate::format::parse_duration_token;

pub const DEFAULT_BACKEND_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_EVENTS_LIMIT: u32 = 100;
const DEFAULT_METRICS_REFRESH_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_METRICS_WINDOW: &str = "15m";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct KmonConfigFile {
    #[serde(default, alias = "backend_url")]
    backend_base_url: Option<String>,
    #[serde(default)]
    events_limit: Option<u32>,
    #[serde(default)]
    metrics_refresh_secs: Option<u64>,
    #[serde(default)]
    list_refresh_secs: Option<u64>,
    #[serde(default, alias = "timeout_secs")]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    metrics_window: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub source: Option<String>,
    pub backend_base_url: String,
    pub events_limit: u32,
    pub metrics_refresh: Duration,
    pub list_refresh: Option<Duration>,
    pub request_timeout: Duration,
    pub metrics_window: TimeDelta,
}

impl Settings {
    pub fn load(args: &CliArgs) -> Result<Self> {
        let path = args.config.clone().or_else(discover_config_path);
        let (file, source) = match path {
            Some(path) => (read_config_file(&path)?, Some(path.display().to_string())),
            None => (KmonConfigFile::default(), None),
        };

        Self::merge(args.backend_url.as_deref(), file, source)
    }

    fn merge(
        backend_override: Option<&str>,
        file: KmonConfigFile,
        source: Option<String>,
    ) -> Result<Self> {
        let backend_base_url = backend_override
            .map(str::to_string)
            .or(file.backend_base_url)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_BASE_URL.to_string());

        let events_limit = file.events_limit.unwrap_or(DEFAULT_EVENTS_LIMIT);
        if events_limit == 0 {
            anyhow::bail!("events_limit must be greater than zero");
        }

        let metrics_refresh_secs = file
            .metrics_refresh_secs
            .unwrap_or(DEFAULT_METRICS_REFRESH_SECS);
        if metrics_refresh_secs == 0 {
            anyhow::bail!("metrics_refresh_secs must be greater than zero");
        }

        let request_timeout_secs = file
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }

        let window_token = file
            .metrics_window
            .unwrap_or_else(|| DEFAULT_METRICS_WINDOW.to_string());
        let metrics_window = parse_duration_token(&window_token)
            .with_context(|| format!("invalid metrics_window '{window_token}'"))?;

        Ok(Self {
            source,
            backend_base_url,
            events_limit,
            metrics_refresh: Duration::from_secs(metrics_refresh_secs),
            list_refresh: file
                .list_refresh_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_window,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: None,
            backend_base_url: DEFAULT_BACKEND_BASE_URL.to_string(),
            events_limit: DEFAULT_EVENTS_LIMIT,
            metrics_refresh: Duration::from_secs(DEFAULT_METRICS_REFRESH_SECS),
            list_refresh: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            metrics_window: TimeDelta::minutes(15),
        }
    }
}

fn read_config_file(path: &Path) -> Result<KmonConfigFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(KmonConfigFile::default());
    }
    serde_yaml::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("KMON_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("kmon.yaml"),
        PathBuf::from("kmon.yml"),
        PathBuf::from(".kmon.yaml"),
    ];
    if let Some(found) = cwd_candidates.into_iter().find(|candidate| candidate.exists()) {
        return Some(found);
    }

    let home = std::env::var("HOME").ok()?;
    [
        PathBuf::from(&home).join(".config/kmon/config.yaml"),
        PathBuf::from(&home).join(".config/kmon/config.yml"),
    ]
    .into_iter()
    .find(|candidate| candidate.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> KmonConfigFile {
        serde_yaml::from_str(raw).unwrap()
    }

    #[test]
    fn defaults_apply_without_file() {
        let settings = Settings::merge(None, KmonConfigFile::default(), None).unwrap();
        assert_eq!(settings.backend_base_url, "http://localhost:3000");
        assert_eq!(settings.events_limit, 100);
        assert_eq!(settings.metrics_refresh, Duration::from_secs(30));
        assert_eq!(settings.list_refresh, None);
        assert_eq!(settings.metrics_window, TimeDelta::minutes(15));
    }

    #[test]
    fn cli_backend_overrides_file() {
        let file = parse("backend_base_url: http://file:3000\nevents_limit: 20\n");
        let settings = Settings::merge(Some("http://cli:4000"), file, None).unwrap();
        assert_eq!(settings.backend_base_url, "http://cli:4000");
        assert_eq!(settings.events_limit, 20);
    }

    #[test]
    fn file_values_are_applied() {
        let file = parse(
            "backend_url: http://api:8080\nlist_refresh_secs: 10\nmetrics_window: 6h\ntimeout_secs: 3\n",
        );
        let settings = Settings::merge(None, file, Some("kmon.yaml".to_string())).unwrap();
        assert_eq!(settings.backend_base_url, "http://api:8080");
        assert_eq!(settings.list_refresh, Some(Duration::from_secs(10)));
        assert_eq!(settings.metrics_window, TimeDelta::hours(6));
        assert_eq!(settings.request_timeout, Duration::from_secs(3));
        assert_eq!(settings.source.as_deref(), Some("kmon.yaml"));
    }

    #[test]
    fn zero_list_refresh_means_fetch_on_activation() {
        let settings = Settings::merge(None, parse("list_refresh_secs: 0\n"), None).unwrap();
        assert_eq!(settings.list_refresh, None);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Settings::merge(None, parse("metrics_refresh_secs: 0\n"), None).is_err());
        assert!(Settings::merge(None, parse("events_limit: 0\n"), None).is_err());
        assert!(Settings::merge(None, parse("metrics_window: soon\n"), None).is_err());
        assert!(serde_yaml::from_str::<KmonConfigFile>("unknown_key: 1\n").is_err());
    }
}
