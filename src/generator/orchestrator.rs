use std::io::Write;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::generator::report::render_playlist;
use crate::spotify::{Playlist, SpotifyClient};
use crate::store::PlaylistStore;

pub const DEFAULT_MOODS: [&str; 3] = ["chill", "energetic", "romantic"];
pub const DEFAULT_LIMIT: u32 = 20;

pub struct MoodPlaylistGenerator {
    spotify_client: SpotifyClient,
    store: PlaylistStore,
    limit: u32,
}

impl MoodPlaylistGenerator {
    pub fn new(spotify_client: SpotifyClient, store: PlaylistStore, limit: u32) -> Self {
        Self {
            spotify_client,
            store,
            limit,
        }
    }

    /// Builds a generator from configuration, opening the store at `config.db_path`.
    pub fn from_config(config: &Config, limit: u32) -> Result<Self> {
        let spotify_client = SpotifyClient::new(config)?;
        let store = PlaylistStore::open(&config.db_path)?;
        Ok(Self::new(spotify_client, store, limit))
    }

    pub fn store(&self) -> &PlaylistStore {
        &self.store
    }

    /// Fetches recommendations for `mood` and records the playlist locally.
    pub async fn generate(&self, mood: &str) -> Result<Playlist> {
        let playlist = self
            .spotify_client
            .fetch_recommendations(mood, self.limit)
            .await?;

        self.store.ensure_schema()?;
        self.store.upsert_playlist(&playlist)?;

        Ok(playlist)
    }

    /// Generates and prints one mood playlist. Failures are logged and leave
    /// both `out` and the store untouched. Returns whether the mood succeeded.
    pub async fn generate_mood_playlist(&self, mood: &str, out: &mut impl Write) -> bool {
        let playlist = match self.generate(mood).await {
            Ok(playlist) => playlist,
            Err(e) => {
                warn!("Failed to generate '{}' playlist: {}", mood, e);
                return false;
            }
        };

        if let Err(e) = render_playlist(&playlist, out) {
            warn!("Failed to print '{}' playlist: {}", mood, e);
            return false;
        }

        true
    }

    /// Processes each mood to completion before starting the next.
    /// Returns how many moods produced a playlist.
    pub async fn run<S: AsRef<str>>(&self, moods: &[S], out: &mut impl Write) -> usize {
        let mut succeeded = 0;

        for mood in moods {
            if self.generate_mood_playlist(mood.as_ref(), out).await {
                succeeded += 1;
            }
        }

        info!("Generated {}/{} mood playlists", succeeded, moods.len());
        succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn generator_for(server: &ServerGuard) -> MoodPlaylistGenerator {
        let config = Config::new("client-id", "client-secret")
            .with_endpoints(
                &format!("{}/api/token", server.url()),
                &format!("{}/v1", server.url()),
            )
            .unwrap();
        let client = SpotifyClient::new(&config).unwrap();
        let store = PlaylistStore::open_in_memory().unwrap();
        MoodPlaylistGenerator::new(client, store, DEFAULT_LIMIT)
    }

    async fn mock_token_ok(server: &mut ServerGuard) -> mockito::Mock {
        server
            .mock("POST", "/api/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "abc", "token_type": "Bearer", "expires_in": 3600}"#)
            .create_async()
            .await
    }

    fn recommendations(tracks: &[(&str, &str)]) -> String {
        let items: Vec<_> = tracks
            .iter()
            .enumerate()
            .map(|(i, (name, artist))| {
                json!({"id": format!("t{i}"), "name": name, "artists": [{"name": artist}]})
            })
            .collect();
        json!({ "tracks": items }).to_string()
    }

    #[tokio::test]
    async fn test_chill_end_to_end() {
        let mut server = Server::new_async().await;
        let _token = mock_token_ok(&mut server).await;
        let _recs = server
            .mock("GET", "/v1/recommendations")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("seed_genres".into(), "chill".into()),
                Matcher::UrlEncoded("limit".into(), "20".into()),
            ]))
            .with_status(200)
            .with_body(recommendations(&[
                ("Teardrop", "Massive Attack"),
                ("Roads", "Portishead"),
                ("Avril 14th", "Aphex Twin"),
            ]))
            .create_async()
            .await;
        let generator = generator_for(&server);

        let mut out = Vec::new();
        assert!(generator.generate_mood_playlist("chill", &mut out).await);

        let printed = String::from_utf8(out).unwrap();
        let numbered: Vec<_> = printed
            .lines()
            .filter(|l| l.starts_with(|c: char| c.is_ascii_digit()))
            .collect();
        assert_eq!(
            numbered,
            vec![
                "1. Teardrop - Massive Attack",
                "2. Roads - Portishead",
                "3. Avril 14th - Aphex Twin",
            ]
        );

        let records = generator.store().list_playlists().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "chill");
        assert_eq!(records[0].track_count, 3);
    }

    #[tokio::test]
    async fn test_token_failure_writes_nothing_and_continues() {
        let mut server = Server::new_async().await;
        let token = server
            .mock("POST", "/api/token")
            .with_status(500)
            .expect(2)
            .create_async()
            .await;
        let recs = server
            .mock("GET", "/v1/recommendations")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let generator = generator_for(&server);

        let mut out = Vec::new();
        let succeeded = generator.run(&["chill", "energetic"], &mut out).await;

        assert_eq!(succeeded, 0);
        assert!(out.is_empty());
        token.assert_async().await;
        recs.assert_async().await;

        generator.store().ensure_schema().unwrap();
        assert!(generator.store().list_playlists().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_leaves_no_trace() {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let config = Config::new("client-id", "client-secret")
            .with_endpoints(
                &format!("http://{addr}/api/token"),
                &format!("http://{addr}/v1"),
            )
            .unwrap();
        let generator = MoodPlaylistGenerator::new(
            SpotifyClient::new(&config).unwrap(),
            PlaylistStore::open_in_memory().unwrap(),
            DEFAULT_LIMIT,
        );

        let err = generator.generate("chill").await.unwrap_err();
        assert!(matches!(err, AppError::Transport(_)), "got {err:?}");

        let mut out = Vec::new();
        assert!(!generator.generate_mood_playlist("chill", &mut out).await);
        assert!(out.is_empty());

        generator.store().ensure_schema().unwrap();
        assert!(generator.store().load_playlist("chill").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_mood_does_not_stop_the_next() {
        let mut server = Server::new_async().await;
        let _token = mock_token_ok(&mut server).await;
        let _broken = server
            .mock("GET", "/v1/recommendations")
            .match_query(Matcher::UrlEncoded("seed_genres".into(), "energetic".into()))
            .with_status(502)
            .create_async()
            .await;
        let _ok = server
            .mock("GET", "/v1/recommendations")
            .match_query(Matcher::UrlEncoded("seed_genres".into(), "romantic".into()))
            .with_status(200)
            .with_body(recommendations(&[("Lover", "Taylor Swift")]))
            .create_async()
            .await;
        let generator = generator_for(&server);

        let mut out = Vec::new();
        let succeeded = generator.run(&["energetic", "romantic"], &mut out).await;

        assert_eq!(succeeded, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Generated romantic Mood Playlist:\n1. Lover - Taylor Swift\n"
        );
        let records = generator.store().list_playlists().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "romantic");
        assert!(generator.store().load_playlist("energetic").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_regenerating_replaces_row() {
        let mut server = Server::new_async().await;
        let _token = mock_token_ok(&mut server).await;
        let _recs = server
            .mock("GET", "/v1/recommendations")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(recommendations(&[("A", "X"), ("B", "Y")]))
            .create_async()
            .await;
        let generator = generator_for(&server);

        generator.generate("chill").await.unwrap();
        generator.generate("chill").await.unwrap();

        let records = generator.store().list_playlists().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].track_count, 2);
    }
}
