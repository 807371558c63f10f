//! Your music library as a map of genres.
//!
//! musemap turns a listener's saved tracks into a spatial map: every genre is
//! a circle sized by track count, placed by what kind of music it is, and
//! drillable into the artists behind it. A time cursor replays how the
//! library grew.
//!
//! Core modules:
//! - [`classify`] - Genre label → weighted semantic categories
//! - [`spatial`] - Category weights → map position and color
//! - [`aggregate`] - Tracks + artist genres → genre/artist hierarchy
//! - [`layout`] - Force simulation inside a container circle
//! - [`temporal`] - Time cursor, playback and spawn/despawn tracking
//! - [`interaction`] - Camera, hit-testing and drill-down navigation
//! - [`visualization`] - Per-frame driver tying the above together
//!
//! ### Supporting Modules
//!
//! - [`library`] - Input data model and the library source seam
//! - [`config`] - Settings file management
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use musemap::config::Settings;
//! use musemap::library::{CancelFlag, JsonLibrary, LibrarySource};
//! use musemap::visualization::Visualization;
//!
//! let library = JsonLibrary::new("library.json").load(&CancelFlag::new())?;
//! let mut vis = Visualization::from_library(&library, &Settings::default());
//! vis.resize(1280.0, 720.0);
//!
//! // One frame per display refresh:
//! let frame = vis.frame(1.0 / 60.0);
//! for node in &frame.nodes {
//!     let center = frame.camera.world_to_screen(node.position);
//!     println!("{} at ({:.0}, {:.0}) r={:.1}", node.name, center.x, center.y, node.radius);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! The core pipeline never fails: unknown labels fall back to a neutral
//! classification, absent artists are skipped, empty input gives an empty
//! map. Fallible edges (reading files, parsing settings, cancelled loads)
//! return `anyhow::Result` with context.
//!
//! ## Threading
//!
//! Aggregation tallies tracks in parallel with rayon. Everything after that
//! lives on the caller's update loop: one [`visualization::Visualization`]
//! per map, mutated only through its own methods.

pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod completion;
pub mod config;
pub mod interaction;
pub mod layout;
pub mod library;
pub mod spatial;
pub mod temporal;
pub mod visualization;
