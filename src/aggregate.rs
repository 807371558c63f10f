//! # Aggregation Pipeline
//!
//! Converts a flat track list plus the artist genre lookup into the two-level
//! node hierarchy the map renders: one genre [`Node`] per distinct
//! (case-folded) genre label, each with one artist child per artist that
//! contributed to it.
//!
//! ## Counting
//!
//! Every (track, artist) pair whose artist carries genre labels contributes
//! once to each of that artist's genres, and once to the (genre, artist)
//! child. A genre's count is therefore always the sum of its children's
//! counts. An artist tagged with several genres shows up under each of them;
//! that duplication is expected.
//!
//! ## Parallelism
//!
//! The tally is embarrassingly parallel per track and runs as a rayon
//! fold/reduce. Output ordering never depends on shard scheduling: sets are
//! ordered, member lists are sorted, and nodes are sorted by count then id.

use crate::classify::{self, CategoryVector};
use glam::DVec2;
use crate::library::{ArtistMap, Track};
use crate::spatial::{self, Rgb};
use log::{debug, trace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Default number of genre nodes kept after sorting.
pub const DEFAULT_TOP_N: usize = 150;

/// Aggregation tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Number of genre nodes kept (largest first)
    pub top_n: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self { top_n: DEFAULT_TOP_N }
    }
}

/// Genre or artist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Genre,
    Artist,
}

/// Track reference held by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberTrack {
    pub id: String,
    pub name: String,
    pub album: String,
    pub added_at: Option<i64>,
}

impl MemberTrack {
    fn from_track(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            name: track.name.clone(),
            album: track.album.name.clone(),
            added_at: track.added_at,
        }
    }

    /// Dated tracks first in time order, then undated; ties by id.
    fn sort_key(&self) -> (bool, i64, &str) {
        (self.added_at.is_none(), self.added_at.unwrap_or(0), self.id.as_str())
    }
}

/// A genre node or an artist node of the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// Unique among siblings: folded genre label or artist id
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    /// Number of contributions
    pub count: usize,
    /// Names of contributing artists
    pub artists: BTreeSet<String>,
    /// Names of contributing albums (empty for artist nodes)
    pub albums: BTreeSet<String>,
    /// Normalized [-1,1]² position (genre nodes only)
    pub anchor: Option<DVec2>,
    /// Category weights behind `anchor` (genre nodes only)
    pub categories: Option<CategoryVector>,
    pub color: Rgb,
    /// Member tracks, oldest first, undated last
    pub tracks: Vec<MemberTrack>,
    /// Sorted `added_at` of every dated contribution
    #[serde(skip)]
    pub timestamps: Vec<i64>,
    /// Contributions without a usable `added_at`
    #[serde(skip)]
    pub undated: usize,
    pub children: Vec<Node>,
}

impl Node {
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Child with the given id.
    #[must_use]
    pub fn child(&self, id: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Default)]
struct ArtistTally {
    name: String,
    count: usize,
    albums: BTreeSet<String>,
    tracks: BTreeMap<String, MemberTrack>,
    timestamps: Vec<i64>,
    undated: usize,
}

impl ArtistTally {
    fn merge(&mut self, other: ArtistTally) {
        if self.name.is_empty() {
            self.name = other.name;
        }
        self.count += other.count;
        self.albums.extend(other.albums);
        self.tracks.extend(other.tracks);
        self.timestamps.extend(other.timestamps);
        self.undated += other.undated;
    }
}

#[derive(Debug, Default)]
struct GenreTally {
    count: usize,
    albums: BTreeSet<String>,
    tracks: BTreeMap<String, MemberTrack>,
    timestamps: Vec<i64>,
    undated: usize,
    artists: HashMap<String, ArtistTally>,
}

impl GenreTally {
    fn merge(&mut self, other: GenreTally) {
        self.count += other.count;
        self.albums.extend(other.albums);
        self.tracks.extend(other.tracks);
        self.timestamps.extend(other.timestamps);
        self.undated += other.undated;
        for (id, artist) in other.artists {
            self.artists.entry(id).or_default().merge(artist);
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    genres: HashMap<String, GenreTally>,
}

impl Tally {
    fn add_track(&mut self, track: &Track, artists: &ArtistMap, folded: &HashMap<&str, Vec<String>>) {
        let mut seen = HashSet::new();
        for artist_ref in &track.artists {
            if !seen.insert(artist_ref.id.as_str()) {
                continue;
            }
            let Some(info) = artists.get(&artist_ref.id) else {
                trace!("Artist {} of track {} not in artist map", artist_ref.id, track.id);
                continue;
            };
            let Some(genres) = folded.get(artist_ref.id.as_str()) else {
                continue;
            };

            let member = MemberTrack::from_track(track);
            let artist_name = if info.name.is_empty() { &artist_ref.name } else { &info.name };

            for genre in genres {
                let g = self.genres.entry(genre.clone()).or_default();
                g.count += 1;
                if !track.album.name.is_empty() {
                    g.albums.insert(track.album.name.clone());
                }
                g.tracks.insert(track.id.clone(), member.clone());

                let a = g.artists.entry(artist_ref.id.clone()).or_default();
                if a.name.is_empty() {
                    a.name = artist_name.clone();
                }
                a.count += 1;
                if !track.album.name.is_empty() {
                    a.albums.insert(track.album.name.clone());
                }
                a.tracks.insert(track.id.clone(), member.clone());

                match track.added_at {
                    Some(t) => {
                        g.timestamps.push(t);
                        a.timestamps.push(t);
                    }
                    None => {
                        g.undated += 1;
                        a.undated += 1;
                    }
                }
            }
        }
    }

    fn merge(mut self, other: Tally) -> Tally {
        for (genre, tally) in other.genres {
            self.genres.entry(genre).or_default().merge(tally);
        }
        self
    }
}

/// Distinct, case-folded, non-blank genre labels per artist id.
fn fold_artist_genres(artists: &ArtistMap) -> HashMap<&str, Vec<String>> {
    artists
        .iter()
        .filter_map(|(id, info)| {
            let mut labels: Vec<String> = info
                .genres
                .iter()
                .map(|g| g.trim().to_lowercase())
                .filter(|g| !g.is_empty())
                .collect();
            labels.sort();
            labels.dedup();
            (!labels.is_empty()).then_some((id.as_str(), labels))
        })
        .collect()
}

fn sorted_members(tracks: BTreeMap<String, MemberTrack>) -> Vec<MemberTrack> {
    let mut members: Vec<MemberTrack> = tracks.into_values().collect();
    members.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    members
}

fn sort_nodes(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
}

fn artist_node(id: String, tally: ArtistTally, artists: &ArtistMap) -> Node {
    let vector = artists
        .get(&id)
        .map_or_else(classify::fallback_vector, |info| classify::classify_all(&info.genres));
    let mut timestamps = tally.timestamps;
    timestamps.sort_unstable();

    Node {
        artists: BTreeSet::from([tally.name.clone()]),
        id,
        name: tally.name,
        kind: NodeKind::Artist,
        count: tally.count,
        albums: tally.albums,
        anchor: None,
        categories: None,
        color: spatial::color(&vector),
        tracks: sorted_members(tally.tracks),
        timestamps,
        undated: tally.undated,
        children: Vec::new(),
    }
}

fn genre_node(label: String, tally: GenreTally, artists: &ArtistMap) -> Node {
    let vector = classify::classify(&label);

    let mut children: Vec<Node> = tally
        .artists
        .into_iter()
        .map(|(id, artist)| artist_node(id, artist, artists))
        .collect();
    sort_nodes(&mut children);

    let mut timestamps = tally.timestamps;
    timestamps.sort_unstable();

    Node {
        id: label.clone(),
        name: label,
        kind: NodeKind::Genre,
        count: tally.count,
        artists: children.iter().map(|c| c.name.clone()).collect(),
        albums: tally.albums,
        anchor: Some(spatial::position(&vector)),
        categories: Some(vector),
        color: spatial::color(&vector),
        tracks: sorted_members(tally.tracks),
        timestamps,
        undated: tally.undated,
        children,
    }
}

/// Build the genre → artist hierarchy.
///
/// Genre nodes come back sorted by count (largest first, ties by id) and
/// truncated to `config.top_n`. Empty input yields an empty hierarchy.
///
/// # Examples
///
/// ```
/// use musemap::aggregate::{build, AggregationConfig};
/// use musemap::library::{ArtistGenreInfo, ArtistMap, ArtistRef, Track, AlbumRef};
///
/// let tracks = vec![Track {
///     id: "t1".into(),
///     name: "So What".into(),
///     artists: vec![ArtistRef { id: "a1".into(), name: "Miles Davis".into() }],
///     album: AlbumRef { id: "al1".into(), name: "Kind of Blue".into() },
///     duration_ms: 562_000,
///     added_at: None,
///     uri: String::new(),
/// }];
/// let mut artists = ArtistMap::new();
/// artists.insert("a1".into(), ArtistGenreInfo { name: "Miles Davis".into(), genres: vec!["Jazz".into()] });
///
/// let genres = build(&tracks, &artists, &AggregationConfig::default());
/// assert_eq!(genres.len(), 1);
/// assert_eq!(genres[0].id, "jazz");
/// assert_eq!(genres[0].children[0].name, "Miles Davis");
/// ```
#[must_use]
pub fn build(tracks: &[Track], artists: &ArtistMap, config: &AggregationConfig) -> Vec<Node> {
    let folded = fold_artist_genres(artists);

    let tally = tracks
        .par_iter()
        .fold(Tally::default, |mut tally, track| {
            tally.add_track(track, artists, &folded);
            tally
        })
        .reduce(Tally::default, Tally::merge);

    let distinct = tally.genres.len();
    let mut genres: Vec<Node> = tally
        .genres
        .into_iter()
        .map(|(label, genre)| genre_node(label, genre, artists))
        .collect();
    sort_nodes(&mut genres);
    genres.truncate(config.top_n);

    debug!(
        "Aggregated {} tracks into {} genres (kept {})",
        tracks.len(),
        distinct,
        genres.len()
    );
    genres
}

/// Headline numbers for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibrarySummary {
    pub tracks: usize,
    /// Tracks none of whose artists carry a genre
    pub tracks_without_genre: usize,
    pub artists: usize,
    pub genres: usize,
    pub dated_tracks: usize,
    pub time_range: Option<(i64, i64)>,
}

/// Summarize a library and the hierarchy built from it.
#[must_use]
pub fn summarize(tracks: &[Track], artists: &ArtistMap, genres: &[Node]) -> LibrarySummary {
    let folded = fold_artist_genres(artists);
    let tracks_without_genre = tracks
        .iter()
        .filter(|t| !t.artists.iter().any(|a| folded.contains_key(a.id.as_str())))
        .count();
    let distinct_artists: HashSet<&str> = tracks
        .iter()
        .flat_map(|t| t.artists.iter().map(|a| a.id.as_str()))
        .collect();

    LibrarySummary {
        tracks: tracks.len(),
        tracks_without_genre,
        artists: distinct_artists.len(),
        genres: genres.len(),
        dated_tracks: tracks.iter().filter(|t| t.added_at.is_some()).count(),
        time_range: crate::library::time_range(tracks),
    }
}

/// Weighted link between two sibling nodes, by index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    /// Relative strength in (0, 1]
    pub weight: f64,
}

/// Links between genre nodes that share artists.
///
/// Weight is the number of shared artists over the smaller artist count, so a
/// niche genre whose artists all also sit in a big one is pulled toward it.
#[must_use]
pub fn shared_artist_links(genres: &[Node]) -> Vec<Link> {
    let artist_ids: Vec<HashSet<&str>> = genres
        .iter()
        .map(|g| g.children.iter().map(|c| c.id.as_str()).collect())
        .collect();

    let mut links = Vec::new();
    for i in 0..genres.len() {
        for j in (i + 1)..genres.len() {
            let shared = artist_ids[i].intersection(&artist_ids[j]).count();
            if shared == 0 {
                continue;
            }
            let smaller = artist_ids[i].len().min(artist_ids[j].len()).max(1);
            #[allow(clippy::cast_precision_loss)]
            let weight = shared as f64 / smaller as f64;
            links.push(Link { source: i, target: j, weight });
        }
    }
    links
}

/// Links between artists of one genre that appear together on a track.
#[must_use]
pub fn collaboration_links(artists: &[Node]) -> Vec<Link> {
    let track_ids: Vec<HashSet<&str>> = artists
        .iter()
        .map(|a| a.tracks.iter().map(|t| t.id.as_str()).collect())
        .collect();

    let mut links = Vec::new();
    for i in 0..artists.len() {
        for j in (i + 1)..artists.len() {
            let shared = track_ids[i].intersection(&track_ids[j]).count();
            if shared == 0 {
                continue;
            }
            let smaller = track_ids[i].len().min(track_ids[j].len()).max(1);
            #[allow(clippy::cast_precision_loss)]
            let weight = shared as f64 / smaller as f64;
            links.push(Link { source: i, target: j, weight });
        }
    }
    links
}
