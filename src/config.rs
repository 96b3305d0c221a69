use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{AppError, Result};
use crate::spotify::TokenPolicy;

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
pub const DEFAULT_DB_PATH: &str = "spotify_playlists.db";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub token_url: String,
    pub api_base: String,
    pub db_path: PathBuf,
    pub http_timeout: Duration,
    pub token_policy: TokenPolicy,
}

impl Config {
    /// Config with the given credentials and every other setting at its default.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            spotify_client_id: client_id.into(),
            spotify_client_secret: client_secret.into(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            token_policy: TokenPolicy::Fresh,
        }
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let spotify_client_id = std::env::var("SPOTIFY_CLIENT_ID")
            .map_err(|_| AppError::Config("SPOTIFY_CLIENT_ID not set".into()))?;

        let spotify_client_secret = std::env::var("SPOTIFY_CLIENT_SECRET")
            .map_err(|_| AppError::Config("SPOTIFY_CLIENT_SECRET not set".into()))?;

        let token_url = std::env::var("SPOTIFY_TOKEN_URL")
            .unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string());

        let api_base = std::env::var("SPOTIFY_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let db_path = db_path_from_env();

        let http_timeout = match std::env::var("MOODLISTS_HTTP_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let token_policy = match std::env::var("MOODLISTS_REUSE_TOKEN") {
            Ok(raw) if is_truthy(&raw) => TokenPolicy::Reuse,
            _ => TokenPolicy::Fresh,
        };

        Self {
            spotify_client_id,
            spotify_client_secret,
            token_url,
            api_base,
            db_path,
            http_timeout,
            token_policy,
        }
        .validated()
    }

    /// Point the client at different token and API endpoints.
    pub fn with_endpoints(mut self, token_url: &str, api_base: &str) -> Result<Self> {
        self.token_url = token_url.to_string();
        self.api_base = api_base.to_string();
        self.validated()
    }

    fn validated(mut self) -> Result<Self> {
        check_endpoint("SPOTIFY_TOKEN_URL", &self.token_url)?;
        check_endpoint("SPOTIFY_API_BASE", &self.api_base)?;
        // recommendations URLs are built by appending a path
        while self.api_base.ends_with('/') {
            self.api_base.pop();
        }
        Ok(self)
    }

    pub fn get_missing_config(&self) -> Vec<String> {
        let mut missing = Vec::new();

        if self.spotify_client_id.is_empty() {
            missing.push("SPOTIFY_CLIENT_ID".to_string());
        }
        if self.spotify_client_secret.is_empty() {
            missing.push("SPOTIFY_CLIENT_SECRET".to_string());
        }

        missing
    }
}

/// History database location from `MOODLISTS_DB_PATH`, or the default.
pub fn db_path_from_env() -> PathBuf {
    resolve_db_path(std::env::var("MOODLISTS_DB_PATH").ok())
}

fn resolve_db_path(raw: Option<String>) -> PathBuf {
    match raw {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_DB_PATH),
    }
}

fn check_endpoint(key: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| AppError::Config(format!("{key}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AppError::Config(format!(
            "{key}: unsupported scheme '{other}'"
        ))),
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs: u64 = raw.trim().parse().map_err(|_| {
        AppError::Config(format!("MOODLISTS_HTTP_TIMEOUT_SECS is not a number: {raw}"))
    })?;
    if secs == 0 {
        return Err(AppError::Config(
            "MOODLISTS_HTTP_TIMEOUT_SECS must be greater than zero".into(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
