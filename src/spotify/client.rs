use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::spotify::http::read_body;
use crate::spotify::models::{AuthToken, MAX_TRACKS, Playlist, Track};

/// Remaining validity below which a cached token is not reused.
const TOKEN_REUSE_MARGIN_SECS: i64 = 30;

/// Longest lifetime accepted from the token endpoint.
const MAX_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Whether each recommendations fetch exchanges credentials again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenPolicy {
    /// A new token for every fetch.
    #[default]
    Fresh,
    /// Keep the last token while it is still valid.
    Reuse,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RecommendationsResponse {
    tracks: Option<Vec<Value>>,
}

pub struct SpotifyClient {
    http_client: Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    api_base: String,
    token_policy: TokenPolicy,
    cached_token: Mutex<Option<AuthToken>>,
}

impl SpotifyClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder().timeout(config.http_timeout).build()?;

        Ok(Self {
            http_client,
            client_id: config.spotify_client_id.clone(),
            client_secret: config.spotify_client_secret.clone(),
            token_url: config.token_url.clone(),
            api_base: config.api_base.clone(),
            token_policy: config.token_policy,
            cached_token: Mutex::new(None),
        })
    }

    /// Performs one client-credentials exchange against the token endpoint.
    pub async fn acquire_token(&self) -> Result<AuthToken> {
        let issued_at = Utc::now();

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        let body = read_body(response).await?;

        let parsed: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| AppError::Parse(format!("token response is not valid JSON: {}", e)))?;

        let access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Parse("token response missing access_token".into()))?;
        let expires_in = parsed
            .expires_in
            .ok_or_else(|| AppError::Parse("token response missing expires_in".into()))?;
        if !(0..=MAX_TOKEN_TTL_SECS).contains(&expires_in) {
            return Err(AppError::Parse(format!(
                "token response has out-of-range expires_in: {}",
                expires_in
            )));
        }

        let token = AuthToken::new(access_token, issued_at, expires_in);
        debug!("Acquired Spotify token valid until {}", token.expires_at);

        Ok(token)
    }

    async fn token(&self) -> Result<AuthToken> {
        if self.token_policy == TokenPolicy::Fresh {
            return self.acquire_token().await;
        }

        let mut cached = self.cached_token.lock().await;
        let threshold = Utc::now() + Duration::seconds(TOKEN_REUSE_MARGIN_SECS);
        if let Some(token) = cached.as_ref().filter(|t| t.is_valid_at(threshold)) {
            debug!("Reusing cached Spotify token");
            return Ok(token.clone());
        }

        let token = self.acquire_token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Fetches recommendations seeded by `seed_genres` into a playlist named
    /// after them.
    pub async fn fetch_recommendations(&self, seed_genres: &str, limit: u32) -> Result<Playlist> {
        let token = self.token().await?;

        let limit = limit.clamp(1, MAX_TRACKS as u32);
        let url = format!(
            "{}/recommendations?seed_genres={}&limit={}",
            self.api_base,
            urlencoding::encode(seed_genres),
            limit
        );

        debug!("Requesting recommendations for '{}' (limit {})", seed_genres, limit);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token.access_token)
            .send()
            .await?;

        let body = read_body(response).await?;
        let playlist = parse_recommendations(seed_genres, &body)?;

        info!(
            "Fetched {} recommended tracks for '{}'",
            playlist.track_count(),
            seed_genres
        );

        Ok(playlist)
    }
}

/// Maps a recommendations body onto a playlist.
///
/// Elements without a string `id` or `name` are skipped. A missing or empty
/// `artists` array leaves the artist empty. Only the first `MAX_TRACKS`
/// elements are considered, so a skipped element is never back-filled.
fn parse_recommendations(name: &str, body: &[u8]) -> Result<Playlist> {
    let parsed: RecommendationsResponse = serde_json::from_slice(body).map_err(|e| {
        AppError::Parse(format!("recommendations response is not valid JSON: {}", e))
    })?;

    let items = parsed
        .tracks
        .ok_or_else(|| AppError::Parse("recommendations response missing tracks".into()))?;

    if items.len() > MAX_TRACKS {
        debug!(
            "Dropping {} tracks beyond the {} track cap",
            items.len() - MAX_TRACKS,
            MAX_TRACKS
        );
    }

    let mut playlist = Playlist::new(name);

    for (index, item) in items.iter().take(MAX_TRACKS).enumerate() {
        match parse_track(item) {
            Some(track) => {
                playlist.push_track(track);
            }
            None => warn!("Skipping malformed track at position {}", index),
        }
    }

    Ok(playlist)
}

fn parse_track(item: &Value) -> Option<Track> {
    let id = item.get("id").and_then(Value::as_str)?;
    let name = item.get("name").and_then(Value::as_str)?;

    // Only the first credited artist is kept.
    let artist = item
        .get("artists")
        .and_then(Value::as_array)
        .and_then(|artists| artists.first())
        .and_then(|artist| artist.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    Some(Track::new(id, name, artist))
}
