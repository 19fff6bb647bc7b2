// src/config/mod.rs
//! Runtime settings.
//!
//! Settings come either from a TOML/JSON file named by `$OCC_CONFIG_PATH` or,
//! more commonly, from environment variables (a `.env` file is honoured by the
//! binary). Variable names match the ones the cron deployment already uses.

pub mod source;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use source::SourceConfig;

use crate::sources::SourceId;

pub const ENV_CONFIG_PATH: &str = "OCC_CONFIG_PATH";

pub const DEFAULT_OUTPUT_FILE: &str = "data.json";

/// HTTP behaviour shared by every adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HttpSettings {
    /// Off by default: most upstreams sit behind self-signed internal certs.
    pub verify_tls: bool,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            verify_tls: false,
            timeout_secs: 30,
            max_attempts: 3,
            retry_delay_ms: 2_000,
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub servicenow: SourceConfig,
    pub bums: SourceConfig,
    pub solarwinds: SourceConfig,
    pub aap: SourceConfig,
    pub audit: SourceConfig,
    pub tenable: SourceConfig,
    pub http: HttpSettings,
    pub output_path: PathBuf,
    /// Loop mode when set and non-zero; otherwise a single run (cron).
    pub interval_secs: Option<u64>,
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            servicenow: SourceConfig::disabled(SourceId::ServiceNow.default_url()),
            bums: SourceConfig::disabled(SourceId::Bums.default_url()),
            solarwinds: SourceConfig::disabled(SourceId::SolarWinds.default_url()),
            aap: SourceConfig::disabled(SourceId::Aap.default_url()),
            audit: SourceConfig::disabled(SourceId::Audit.default_url()),
            tenable: SourceConfig::disabled(SourceId::Tenable.default_url()),
            http: HttpSettings::default(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            interval_secs: None,
            metrics_addr: None,
        }
    }
}

impl Settings {
    pub fn source(&self, id: SourceId) -> &SourceConfig {
        match id {
            SourceId::ServiceNow => &self.servicenow,
            SourceId::Bums => &self.bums,
            SourceId::SolarWinds => &self.solarwinds,
            SourceId::Aap => &self.aap,
            SourceId::Audit => &self.audit,
            SourceId::Tenable => &self.tenable,
        }
    }

    fn source_mut(&mut self, id: SourceId) -> &mut SourceConfig {
        match id {
            SourceId::ServiceNow => &mut self.servicenow,
            SourceId::Bums => &mut self.bums,
            SourceId::SolarWinds => &mut self.solarwinds,
            SourceId::Aap => &mut self.aap,
            SourceId::Audit => &mut self.audit,
            SourceId::Tenable => &mut self.tenable,
        }
    }

    /// A source section given without `url` points at that source's default endpoint.
    fn fill_default_urls(&mut self) {
        for id in SourceId::ALL {
            let cfg = self.source_mut(id);
            if cfg.url.trim().is_empty() {
                cfg.url = id.default_url().to_string();
            }
        }
    }

    /// Resolve settings: `$OCC_CONFIG_PATH` first, then the environment.
    pub fn load() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str| get(key).is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

        let source = |id: SourceId| {
            let p = id.env_prefix();
            SourceConfig {
                enabled: flag(&format!("{p}_ENABLED")),
                url: get(&format!("{p}_URL")).unwrap_or_else(|| id.default_url().to_string()),
                username: get(&format!("{p}_USER")),
                password: get(&format!("{p}_PASS")),
                token: get(&format!("{p}_TOKEN")),
                access_key: get(&format!("{p}_ACCESS_KEY")),
                secret_key: get(&format!("{p}_SECRET_KEY")),
            }
        };

        let defaults = HttpSettings::default();
        let http = HttpSettings {
            verify_tls: flag("VERIFY_SSL"),
            timeout_secs: parse_num(&get, "OCC_HTTP_TIMEOUT_SECS")?.unwrap_or(defaults.timeout_secs),
            max_attempts: parse_num(&get, "OCC_HTTP_MAX_ATTEMPTS")?.unwrap_or(defaults.max_attempts),
            retry_delay_ms: parse_num(&get, "OCC_HTTP_RETRY_DELAY_MS")?
                .unwrap_or(defaults.retry_delay_ms),
        };

        let metrics_addr = match get("OCC_METRICS_ADDR") {
            Some(v) => Some(
                v.trim()
                    .parse::<SocketAddr>()
                    .with_context(|| format!("OCC_METRICS_ADDR is not a socket address: {v}"))?,
            ),
            None => None,
        };

        Ok(Self {
            servicenow: source(SourceId::ServiceNow),
            bums: source(SourceId::Bums),
            solarwinds: source(SourceId::SolarWinds),
            aap: source(SourceId::Aap),
            audit: source(SourceId::Audit),
            tenable: source(SourceId::Tenable),
            http,
            output_path: get("OCC_OUTPUT_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE)),
            interval_secs: parse_num(&get, "OCC_INTERVAL_SECS")?.filter(|s| *s > 0),
            metrics_addr,
        })
    }

    /// Load settings from an explicit file. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_settings(&content, &ext)
            .with_context(|| format!("parsing settings from {}", path.display()))
    }
}

fn parse_num<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .with_context(|| format!("{key} is not a number: {v}"))
        })
        .transpose()
}

fn parse_settings(s: &str, hint_ext: &str) -> Result<Settings> {
    let mut settings: Settings = if hint_ext == "json" {
        serde_json::from_str(s)?
    } else {
        match toml::from_str::<Settings>(s) {
            Ok(v) => v,
            Err(toml_err) => serde_json::from_str(s).map_err(|_| anyhow!(toml_err))?,
        }
    };
    settings.fill_default_urls();
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn empty_environment_yields_all_disabled_defaults() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s, Settings::default());
        assert!(SourceId::ALL.iter().all(|id| !s.source(*id).enabled));
    }

    #[test]
    fn enabled_flag_is_case_insensitive_true_only() {
        let s = Settings::from_lookup(lookup(&[
            ("SNOW_ENABLED", "TRUE"),
            ("BUMS_ENABLED", "1"),
            ("AAP_ENABLED", "true"),
            ("AAP_TOKEN", "tok"),
        ]))
        .unwrap();
        assert!(s.servicenow.enabled);
        assert!(!s.bums.enabled);
        assert!(s.aap.enabled);
        assert_eq!(s.aap.token.as_deref(), Some("tok"));
    }

    #[test]
    fn http_knobs_parse_and_reject_garbage() {
        let s = Settings::from_lookup(lookup(&[
            ("VERIFY_SSL", "true"),
            ("OCC_HTTP_TIMEOUT_SECS", "5"),
            ("OCC_HTTP_MAX_ATTEMPTS", "4"),
            ("OCC_INTERVAL_SECS", "0"),
        ]))
        .unwrap();
        assert!(s.http.verify_tls);
        assert_eq!(s.http.timeout_secs, 5);
        assert_eq!(s.http.max_attempts, 4);
        assert_eq!(s.http.retry_delay_ms, 2_000);
        assert_eq!(s.interval_secs, None);

        let err = Settings::from_lookup(lookup(&[("OCC_HTTP_TIMEOUT_SECS", "soon")]));
        assert!(err.is_err());
    }

    #[test]
    fn toml_and_json_files_fill_missing_fields_with_defaults() {
        let toml = r#"
output_path = "/tmp/occ.json"

[aap]
enabled = true
url = "https://aap.example/api/v2/jobs/"
token = "t"

[http]
max_attempts = 1
"#;
        let s = parse_settings(toml, "toml").unwrap();
        assert!(s.aap.enabled);
        assert_eq!(s.http.max_attempts, 1);
        assert_eq!(s.http.timeout_secs, 30);
        assert_eq!(s.servicenow.url, SourceId::ServiceNow.default_url());

        let json = r#"{"tenable": {"enabled": true, "url": "https://t/rest/analysis"}}"#;
        let s = parse_settings(json, "json").unwrap();
        assert!(s.tenable.enabled);
        assert_eq!(s.output_path, PathBuf::from(DEFAULT_OUTPUT_FILE));
    }

    #[test]
    fn section_without_url_keeps_the_default_endpoint() {
        let toml = r#"
[aap]
enabled = true
token = "t"

[bums]
url = ""
"#;
        let s = parse_settings(toml, "toml").unwrap();
        assert!(s.aap.enabled);
        assert_eq!(s.aap.url, SourceId::Aap.default_url());
        assert_eq!(s.bums.url, SourceId::Bums.default_url());

        let s = parse_settings(r#"{"audit": {"enabled": true}}"#, "json").unwrap();
        assert_eq!(s.audit.url, SourceId::Audit.default_url());
    }
}
