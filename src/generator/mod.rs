pub mod orchestrator;
pub mod report;

pub use orchestrator::{DEFAULT_LIMIT, DEFAULT_MOODS, MoodPlaylistGenerator};
pub use report::render_playlist;
