//! # Command-Line Interface Module
//!
//! Clap derive definitions for the headless `musemap` binary. Every command
//! reads a library file exported by the fetch/cache collaborator and drives
//! the library pipeline end to end; nothing is drawn.
//!
//! ## Commands
//!
//! - `classify`: Show the category vector, map position and color of labels
//! - `analyze`: Aggregate a library and print the genre hierarchy
//! - `layout`: Settle the force layout and print a frame snapshot as JSON
//! - `timeline`: Replay library growth and print the active set per step
//! - `completion`: Generate shell completions
//! - `completion-enhanced`: Completions with genre names for `layout --genre`
//!
//! ## Examples
//!
//! ```bash
//! musemap classify "jazz rap" electropop
//! musemap analyze library.json --top 20
//! musemap layout library.json --width 1280 --height 720 --genre "indie rock"
//! musemap timeline library.json --steps 12
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "musemap")]
#[command(about = "musemap: your music library as a map of genres")]
#[command(version)]
pub struct Args {
    /// Settings file to use instead of the platform default
    #[arg(long, global = true, env = "MUSEMAP_CONFIG", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify genre labels into weighted categories
    ///
    /// Prints the category weights of each label together with the map
    /// position and blended color derived from them. Unknown labels fall
    /// back to an even pop/rock blend.
    Classify {
        /// Genre labels, e.g. "jazz rap" or electropop
        #[arg(required = true)]
        labels: Vec<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Aggregate a library into the genre → artist hierarchy
    ///
    /// Prints a summary followed by the genres sorted by track count, each
    /// with its top artists.
    Analyze {
        /// Library JSON file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        library: PathBuf,

        /// Number of genres to keep (overrides the settings file)
        #[arg(long)]
        top: Option<usize>,

        /// Artists listed per genre
        #[arg(long, default_value = "3")]
        artists: usize,

        /// Print the full hierarchy as JSON
        #[arg(long)]
        json: bool,
    },

    /// Settle the force layout and print the final frame as JSON
    Layout {
        /// Library JSON file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        library: PathBuf,

        /// Viewport width in pixels
        #[arg(long, default_value = "1280")]
        width: f64,

        /// Viewport height in pixels
        #[arg(long, default_value = "720")]
        height: f64,

        /// Maximum number of frames to simulate
        #[arg(long, default_value = "600")]
        ticks: usize,

        /// Drill into this genre and lay out its artists
        #[arg(long, value_hint = clap::ValueHint::Other)]
        genre: Option<String>,

        /// Time cursor: RFC 3339 timestamp, YYYY-MM-DD or epoch milliseconds
        #[arg(long)]
        cursor: Option<String>,
    },

    /// Replay library growth over the discovered time range
    ///
    /// Plays the time cursor from the first to the last added track and
    /// prints the active genre count and the largest genres at each step.
    Timeline {
        /// Library JSON file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        library: PathBuf,

        /// Number of evenly spaced steps (default: one step per second at
        /// the configured playback rate)
        #[arg(long)]
        steps: Option<usize>,

        /// Genres listed per step
        #[arg(long, default_value = "5")]
        show: usize,

        /// Viewport width in pixels
        #[arg(long, default_value = "1280")]
        width: f64,

        /// Viewport height in pixels
        #[arg(long, default_value = "720")]
        height: f64,
    },

    /// Write the current settings (defaults included) to the settings file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    ///
    /// Usage: musemap completion bash > ~/.local/share/bash-completion/completions/musemap
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// Generate completions that also complete genre names for `layout --genre`
    ///
    /// Usage: musemap completion-enhanced fish > ~/.config/fish/completions/musemap.fish
    CompletionEnhanced {
        /// Shell to generate completions for (bash or fish)
        shell: Shell,
    },

    /// List genre names of a library for completion (hidden command)
    #[command(hide = true)]
    CompleteGenres {
        library: PathBuf,

        /// Print unquoted, one per line
        #[arg(long)]
        raw: bool,
    },
}
