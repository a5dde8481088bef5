use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Timeline editor for cutting clips together.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Editor settings file (JSON). Missing fields use defaults.
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (default: info, -v: debug, -vv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty project
    New {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
        /// Sequence name
        #[arg(long, default_value = "Sequence 01")]
        name: String,
    },

    /// Print the tracks and clips of a project
    Show {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
        /// Dump the rendered timeline scene as JSON
        #[arg(long)]
        scene: bool,
        /// Draw the playhead at this time (ms) in the scene dump
        #[arg(long, value_name = "MS", requires = "scene")]
        playhead: Option<i64>,
    },

    /// Add source files to the media bin
    Import {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
        #[arg(value_name = "MEDIA", required = true)]
        media: Vec<PathBuf>,
    },

    /// Place a clip on a track
    Add {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
        #[arg(value_name = "MEDIA")]
        media: PathBuf,
        #[arg(short, long, default_value_t = 0)]
        track: usize,
        /// Timeline start (ms). Defaults to the end of the track.
        #[arg(short, long, value_name = "MS")]
        start: Option<i64>,
        /// In point within the source (ms)
        #[arg(long = "in", value_name = "MS", default_value_t = 0)]
        in_ms: i64,
        /// Out point within the source (ms)
        #[arg(long = "out", value_name = "MS")]
        out_ms: Option<i64>,
        /// Ask the prober for the source length
        #[arg(long)]
        probe: bool,
    },

    /// Remove a clip
    Remove {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
        /// Clip id or unique id prefix
        #[arg(value_name = "CLIP")]
        clip: String,
    },

    /// Reorder the clips of a track
    Reorder {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
        #[arg(short, long, default_value_t = 0)]
        track: usize,
        /// Clip ids (or prefixes) in the new order; unlisted clips follow
        #[arg(value_name = "CLIP", required = true)]
        clips: Vec<String>,
        /// Lay the track out back to back afterwards
        #[arg(long)]
        pack: bool,
    },

    /// Move a clip to a new start time and/or track
    Move {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
        #[arg(value_name = "CLIP")]
        clip: String,
        #[arg(short, long, value_name = "MS")]
        start: i64,
        /// Target track (defaults to the clip's current track)
        #[arg(short, long)]
        track: Option<usize>,
    },

    /// Render the timeline with the encoder
    Export {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
        /// Print the encoder command instead of running it
        #[arg(long)]
        dry_run: bool,
        /// Output preset: 1080p, 720p or shorts
        #[arg(long, value_name = "NAME")]
        preset: Option<String>,
    },

    /// Play the timeline through mpv
    Play {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
        /// Start from this clip instead of the playhead
        #[arg(long, value_name = "CLIP", conflicts_with = "preview")]
        from: Option<String>,
        /// Play only this clip
        #[arg(long, value_name = "CLIP")]
        preview: Option<String>,
        /// Playhead position (ms) used to pick the first clip
        #[arg(long, value_name = "MS", default_value_t = 0)]
        at: i64,
        /// mpv executable
        #[arg(long, default_value = "mpv")]
        mpv: String,
    },
}
