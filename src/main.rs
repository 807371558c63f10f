//! # musemap
//!
//! Headless driver for the musemap library. Reads a library file exported by
//! the fetch/cache collaborator and runs classification, aggregation, layout
//! and timeline replay from the command line.
//!
//! ## Usage
//!
//! ```bash
//! musemap classify "jazz rap" electropop
//! musemap analyze library.json
//! musemap layout library.json --genre jazz > frame.json
//! musemap timeline library.json --steps 24
//! ```

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use musemap::aggregate::{self, Node};
use musemap::classify;
use musemap::cli::{self, Args};
use musemap::completion;
use musemap::config::{self, Settings};
use musemap::library::{self, CancelFlag, JsonLibrary, Library, LibrarySource};
use musemap::spatial;
use musemap::temporal::Playback;
use musemap::visualization::Visualization;
use serde::Serialize;
use std::path::Path;

/// Frame length used for headless runs, in seconds.
const FRAME_DT: f64 = 1.0 / 60.0;

/// Upper bound on timeline steps derived from the playback rate.
const MAX_TIMELINE_STEPS: f64 = 10_000.0;

/// Main entry point.
///
/// Logging is controlled via `RUST_LOG`:
/// - `RUST_LOG=debug musemap layout lib.json` - Phase changes and active-set swaps
/// - `RUST_LOG=musemap::layout=trace musemap layout lib.json` - Per-tick detail
fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        cli::Command::Classify { labels, json } => run_classify(&labels, json)?,
        cli::Command::Analyze { library, top, artists, json } => {
            let mut settings = Settings::resolve(args.config.as_deref())?;
            if let Some(top) = top {
                settings.aggregation.top_n = top;
            }
            run_analyze(&library, &settings, artists, json)?;
        }
        cli::Command::Layout { library, width, height, ticks, genre, cursor } => {
            let settings = Settings::resolve(args.config.as_deref())?;
            let cursor = cursor.as_deref().map(parse_cursor).transpose()?;
            run_layout(&library, &settings, (width, height), ticks, genre.as_deref(), cursor)?;
        }
        cli::Command::Timeline { library, steps, show, width, height } => {
            let settings = Settings::resolve(args.config.as_deref())?;
            run_timeline(&library, &settings, steps, show, (width, height))?;
        }
        cli::Command::InitConfig { force } => {
            let path = match &args.config {
                Some(path) => path.clone(),
                None => config::get_config_path()?,
            };
            if path.exists() && !force {
                bail!("Settings file {} already exists (use --force to rewrite it)", path.display());
            }
            let settings = if path.exists() { Settings::load_from(&path)? } else { Settings::default() };
            let written = match args.config {
                Some(path) => {
                    settings.save_to(&path)?;
                    path
                }
                None => settings.save()?,
            };
            println!("Wrote settings to {}", written.display());
        }
        cli::Command::Completion { shell } => {
            let mut cmd = Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(&shell), &mut cmd);
        }
        cli::Command::CompletionEnhanced { shell } => {
            print!("{}", completion::enhanced_completion(shell)?);
        }
        cli::Command::CompleteGenres { library, raw } => {
            completion::print_genre_completions(&library, raw)?;
        }
    }

    Ok(())
}

fn load_library(path: &Path) -> Result<Library> {
    JsonLibrary::new(path)
        .load(&CancelFlag::new())
        .with_context(|| format!("Could not load library {}", path.display()))
}

fn parse_cursor(raw: &str) -> Result<i64> {
    library::parse_timestamp(raw).with_context(|| {
        format!("Invalid cursor `{raw}': expected RFC 3339, YYYY-MM-DD or epoch milliseconds")
    })
}

#[derive(Serialize)]
struct Classification<'a> {
    label: &'a str,
    categories: classify::CategoryVector,
    position: glam::DVec2,
    color: String,
}

fn run_classify(labels: &[String], json: bool) -> Result<()> {
    let rows: Vec<Classification> = labels
        .iter()
        .map(|label| {
            let categories = classify::classify(label);
            Classification {
                label,
                position: spatial::position(&categories),
                color: spatial::color(&categories).to_hex(),
                categories,
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in rows {
        let weights: Vec<String> = row
            .categories
            .iter()
            .map(|(category, weight)| format!("{category} {weight:.2}"))
            .collect();
        println!(
            "{:<24} ({:>5.2}, {:>5.2})  {}  {}",
            row.label,
            row.position.x,
            row.position.y,
            row.color,
            weights.join(", ")
        );
    }
    Ok(())
}

fn run_analyze(path: &Path, settings: &Settings, artists_shown: usize, json: bool) -> Result<()> {
    let library = load_library(path)?;
    let genres = aggregate::build(&library.tracks, &library.artists, &settings.aggregation);

    if json {
        println!("{}", serde_json::to_string_pretty(&genres)?);
        return Ok(());
    }

    let summary = aggregate::summarize(&library.tracks, &library.artists, &genres);
    println!("Tracks:            {}", summary.tracks);
    println!("  without genre:   {}", summary.tracks_without_genre);
    println!("  dated:           {}", summary.dated_tracks);
    println!("Artists:           {}", summary.artists);
    println!("Genres shown:      {}", summary.genres);
    if let Some((min, max)) = summary.time_range {
        println!(
            "Added between:     {} and {}",
            library::format_timestamp(min),
            library::format_timestamp(max)
        );
    }
    println!();

    for genre in &genres {
        print_genre(genre, artists_shown);
    }
    Ok(())
}

fn print_genre(genre: &Node, artists_shown: usize) {
    let dominant = genre
        .categories
        .and_then(|c| c.dominant())
        .map_or("-", |c| c.name());
    let top: Vec<String> = genre
        .children
        .iter()
        .take(artists_shown)
        .map(|a| format!("{} ({})", a.name, a.count))
        .collect();
    println!(
        "{:>6}  {:<28} {:<11} {}  {}",
        genre.count,
        genre.name,
        dominant,
        genre.color,
        top.join(", ")
    );
}

fn run_layout(
    path: &Path,
    settings: &Settings,
    (width, height): (f64, f64),
    ticks: usize,
    genre: Option<&str>,
    cursor: Option<i64>,
) -> Result<()> {
    let library = load_library(path)?;
    let mut vis = Visualization::from_library(&library, settings);
    vis.resize(width, height);
    vis.set_cursor(cursor);
    vis.frame(FRAME_DT);

    if let Some(genre) = genre {
        let id = genre.trim().to_lowercase();
        if vis.drill_into(&id).is_empty() {
            bail!("Genre `{genre}' is not in the active set");
        }
        debug!("Drilled into {id}");
    }

    let snapshot = vis.settle(FRAME_DT, ticks.max(1));
    info!(
        "Layout finished in phase {:?} with {} nodes",
        snapshot.phase,
        snapshot.nodes.len()
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn run_timeline(
    path: &Path,
    settings: &Settings,
    steps: Option<usize>,
    show: usize,
    (width, height): (f64, f64),
) -> Result<()> {
    let library = load_library(path)?;
    let mut vis = Visualization::from_library(&library, settings);
    let Some((min, max)) = vis.time_range() else {
        bail!("Library {} has no dated tracks to replay", path.display());
    };
    #[allow(clippy::cast_precision_loss)]
    let span = max.saturating_sub(min) as f64;
    vis.resize(width, height);

    let steps = match steps {
        Some(steps) => {
            let steps = steps.max(1);
            #[allow(clippy::cast_precision_loss)]
            let rate = (span / steps as f64).ceil();
            vis.set_playback(Playback::Playing { rate });
            steps
        }
        None => {
            let rate = vis.playback_rate();
            if !rate.is_finite() || rate <= 0.0 {
                bail!("playback_rate must be a positive number, got {rate}");
            }
            let steps = (span / rate).ceil();
            if steps > MAX_TIMELINE_STEPS {
                bail!(
                    "Replaying {} at playback_rate {rate} takes {steps} steps; pass --steps or raise playback_rate",
                    path.display()
                );
            }
            debug!("Replaying at the configured rate of {rate} ms per step");
            vis.play();
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let whole = steps as usize;
            whole.max(1)
        }
    };

    let mut snapshot = vis.frame(0.0);
    for step in 0..=steps {
        let mut nodes = snapshot.nodes.clone();
        nodes.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
        let top: Vec<String> = nodes
            .iter()
            .take(show)
            .map(|n| format!("{} ({})", n.name, n.count))
            .collect();
        println!(
            "{}  {:>4} genres  {}",
            snapshot.cursor.map_or_else(|| "-".to_string(), library::format_timestamp),
            nodes.len(),
            top.join(", ")
        );

        if !vis.temporal().is_playing() || step == steps {
            break;
        }
        snapshot = vis.frame(1.0);
    }
    Ok(())
}
