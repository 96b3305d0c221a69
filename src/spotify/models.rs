use chrono::{DateTime, Duration, Utc};

/// Upper bound on the number of tracks a playlist holds.
pub const MAX_TRACKS: usize = 100;
pub const MAX_PLAYLIST_NAME_LEN: usize = 99;
pub const MAX_TRACK_ID_LEN: usize = 49;
pub const MAX_TEXT_LEN: usize = 199;

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: Option<String>,
    pub popularity: Option<u32>,
    pub duration_ms: Option<u64>,
}

impl Track {
    /// Builds a track, silently clamping over-long fields.
    pub fn new(id: &str, name: &str, artist: &str) -> Self {
        Self {
            id: clamp(id, MAX_TRACK_ID_LEN),
            name: clamp(name, MAX_TEXT_LEN),
            artist: clamp(artist, MAX_TEXT_LEN),
            album: None,
            popularity: None,
            duration_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub name: String,
    tracks: Vec<Track>,
}

impl Playlist {
    pub fn new(name: &str) -> Self {
        Self {
            name: clamp(name, MAX_PLAYLIST_NAME_LEN),
            tracks: Vec::new(),
        }
    }

    /// Appends a track unless the playlist already holds `MAX_TRACKS`.
    /// Returns whether the track was kept.
    pub fn push_track(&mut self, track: Track) -> bool {
        if self.is_full() {
            return false;
        }
        self.tracks.push(track);
        true
    }

    pub fn is_full(&self) -> bool {
        self.tracks.len() >= MAX_TRACKS
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

/// Bearer credential from the client-credentials exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthToken {
    pub fn new(access_token: String, issued_at: DateTime<Utc>, expires_in_secs: i64) -> Self {
        Self {
            access_token,
            expires_at: issued_at + Duration::seconds(expires_in_secs),
        }
    }

    pub fn is_valid_at(&self, instant: DateTime<Utc>) -> bool {
        instant < self.expires_at
    }
}

/// Truncates to at most `max` characters without splitting a code point.
fn clamp(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
impl Track {
    pub fn mock(name: &str, artist: &str) -> Self {
        Self::new("mock_id", name, artist)
    }
}
