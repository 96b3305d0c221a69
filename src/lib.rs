pub mod config;
pub mod error;
pub mod generator;
pub mod spotify;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
pub use generator::MoodPlaylistGenerator;
pub use spotify::{AuthToken, Playlist, SpotifyClient, TokenPolicy, Track};
pub use store::{PlaylistRecord, PlaylistStore};
