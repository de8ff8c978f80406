use std::{fs, path::PathBuf, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use url::Url;

pub const SETTINGS_FILE: &str = "client.toml";
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Root of the backend API, e.g. `https://jobs.example.com/api/v1/`.
    pub base_url: Url,
    pub page_size: u32,
    pub request_timeout: Duration,
    /// File-backed token storage when set, in-memory otherwise.
    pub token_store_path: Option<PathBuf>,
}

impl ClientSettings {
    pub fn new(base_host: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_host)?,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            token_store_path: None,
        })
    }
}

/// Loads settings from `client.toml` (if present) and the process environment.
///
/// Fails when no base host is configured anywhere.
pub fn load_settings() -> Result<ClientSettings> {
    let raw = fs::read_to_string(SETTINGS_FILE).ok();
    settings_from_sources(raw.as_deref(), |key| std::env::var(key).ok())
}

pub(crate) fn settings_from_sources(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientSettings> {
    let mut base_host: Option<String> = None;
    let mut page_size: Option<String> = None;
    let mut timeout: Option<String> = None;
    let mut token_store_path: Option<String> = None;

    if let Some(raw) = file_contents {
        let table = raw
            .parse::<toml::Table>()
            .with_context(|| format!("failed to parse {SETTINGS_FILE}"))?;
        let get = |key: &str| {
            table.get(key).map(|value| match value {
                toml::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        };
        base_host = get("base_host");
        page_size = get("page_size");
        timeout = get("request_timeout_secs");
        token_store_path = get("token_store_path");
    }

    if let Some(v) = env("API_BASE_HOST") {
        base_host = Some(v);
    }
    if let Some(v) = env("APP__BASE_HOST") {
        base_host = Some(v);
    }
    if let Some(v) = env("APP__PAGE_SIZE") {
        page_size = Some(v);
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        timeout = Some(v);
    }
    if let Some(v) = env("APP__TOKEN_STORE_PATH") {
        token_store_path = Some(v);
    }

    let base_host = base_host
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow!("base host is not configured; set API_BASE_HOST"))?;
    let mut settings = ClientSettings::new(&base_host)?;

    if let Some(v) = page_size {
        let parsed = v
            .trim()
            .parse::<u32>()
            .with_context(|| format!("page_size must be a positive integer, got '{v}'"))?;
        if parsed == 0 {
            bail!("page_size must be a positive integer, got '{v}'");
        }
        settings.page_size = parsed;
    }
    if let Some(v) = timeout {
        let secs = v
            .trim()
            .parse::<u64>()
            .with_context(|| format!("request_timeout_secs must be an integer, got '{v}'"))?;
        settings.request_timeout = Duration::from_secs(secs);
    }
    settings.token_store_path = token_store_path
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    Ok(settings)
}

/// Parses the configured host and makes sure relative endpoint paths are
/// appended to it rather than replacing its last segment.
fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let mut url =
        Url::parse(raw).with_context(|| format!("base host '{raw}' is not an absolute url"))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        bail!("base host '{raw}' must be an http(s) url");
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
