use std::io::{self, Write};

use crate::spotify::Playlist;

/// Writes the numbered track listing for a generated mood playlist.
pub fn render_playlist(playlist: &Playlist, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Generated {} Mood Playlist:", playlist.name)?;
    for (i, track) in playlist.tracks().iter().enumerate() {
        writeln!(out, "{}. {} - {}", i + 1, track.name, track.artist)?;
    }
    Ok(())
}
