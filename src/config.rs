//! Startup configuration for Starfall

use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_STAR_COUNT: usize = 250;

/// Music-reactive galaxy visualizer. Drop an audio file on it or point it at
/// your microphone and type `upgrade` for a fresh palette.
#[derive(Parser, Debug)]
#[command(name = "starfall", version)]
pub struct Options {
    /// Number of stars in the field
    #[arg(long, default_value_t = DEFAULT_STAR_COUNT)]
    pub stars: usize,

    /// Initial window width in points
    #[arg(long, default_value_t = 1280.0)]
    pub width: f32,

    /// Initial window height in points
    #[arg(long, default_value_t = 720.0)]
    pub height: f32,

    /// Audio file to start playing immediately
    pub audio: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let options = Options::parse_from(["starfall"]);
        assert_eq!(options.stars, 250);
        assert!(options.audio.is_none());
    }

    #[test]
    fn audio_file_and_star_count_parse() {
        let options = Options::parse_from(["starfall", "--stars", "64", "track.mp3"]);
        assert_eq!(options.stars, 64);
        assert_eq!(options.audio.unwrap().to_str().unwrap(), "track.mp3");
    }
}
