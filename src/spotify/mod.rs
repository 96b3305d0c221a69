pub mod client;
pub mod http;
pub mod models;

pub use client::{SpotifyClient, TokenPolicy};
pub use models::{AuthToken, MAX_TRACKS, Playlist, Track};
