//! # Temporal Filter
//!
//! Replays library growth. A time cursor selects, for every node, how many
//! of its contributions had been added by that moment:
//!
//! ```text
//! active_count(node, T) = undated + |{ t in node.timestamps : t <= T }|
//! ```
//!
//! Undated contributions are always active. Nodes whose active count is zero
//! leave the active set entirely; nodes going from zero to non-zero are
//! reported as spawning so the layout can animate their entry.
//!
//! The cursor is either scrubbed directly or advanced by playback, which
//! moves at a fixed rate (library milliseconds per wall-clock second) and
//! stops by itself at the end of the range.

use crate::aggregate::Node;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Default playback rate: thirty days of library time per second.
pub const DEFAULT_PLAYBACK_RATE: f64 = 30.0 * 24.0 * 60.0 * 60.0 * 1000.0;

/// Number of contributions active at `cursor`.
///
/// `timestamps` must be sorted ascending. `None` means no time filtering.
#[must_use]
pub fn active_count(timestamps: &[i64], undated: usize, cursor: Option<i64>) -> usize {
    match cursor {
        None => undated + timestamps.len(),
        Some(t) => undated + timestamps.partition_point(|&x| x <= t),
    }
}

/// Active count of a node at `cursor`.
#[must_use]
pub fn node_active_count(node: &Node, cursor: Option<i64>) -> usize {
    active_count(&node.timestamps, node.undated, cursor)
}

/// Playback mode of the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Playback {
    Paused,
    /// Advancing at `rate` library-milliseconds per second
    Playing { rate: f64 },
}

/// One node of the active set with its count at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEntry {
    pub id: String,
    pub count: usize,
}

/// Result of evaluating a node list at the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Nodes with a positive active count, in input order
    pub active: Vec<ActiveEntry>,
    /// Ids that went from zero to a positive count
    pub spawned: Vec<String>,
    /// Ids that dropped to zero
    pub despawned: Vec<String>,
}

impl Evaluation {
    /// True when membership changed since the previous evaluation.
    #[must_use]
    pub fn membership_changed(&self) -> bool {
        !self.spawned.is_empty() || !self.despawned.is_empty()
    }
}

/// Time cursor, playback state and spawn/despawn bookkeeping.
#[derive(Debug, Clone)]
pub struct TemporalFilter {
    range: Option<(i64, i64)>,
    cursor: Option<i64>,
    playback: Playback,
    /// Active counts of the previous evaluation, by id
    previous: HashMap<String, usize>,
}

impl TemporalFilter {
    /// Create a filter over a discovered `[min, max]` range. The cursor starts unset.
    #[must_use]
    pub fn new(range: Option<(i64, i64)>) -> Self {
        Self {
            range,
            cursor: None,
            playback: Playback::Paused,
            previous: HashMap::new(),
        }
    }

    #[must_use]
    pub fn range(&self) -> Option<(i64, i64)> {
        self.range
    }

    #[must_use]
    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    #[must_use]
    pub fn playback(&self) -> Playback {
        self.playback
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        matches!(self.playback, Playback::Playing { .. })
    }

    /// Scrub to an absolute cursor, or `None` to show everything.
    ///
    /// Returns true when the cursor value changed.
    pub fn set_cursor(&mut self, cursor: Option<i64>) -> bool {
        let changed = self.cursor != cursor;
        self.cursor = cursor;
        changed
    }

    /// Start or pause playback.
    ///
    /// Starting while the cursor is unset or already at the end of the range
    /// rewinds to the start of the range first. Without a range there is
    /// nothing to play and playback stays paused. Returns true when the
    /// cursor moved.
    pub fn set_playback(&mut self, playback: Playback) -> bool {
        match playback {
            Playback::Paused => {
                self.playback = Playback::Paused;
                false
            }
            Playback::Playing { rate } => {
                let Some((min, max)) = self.range else {
                    debug!("Playback requested without a dated range, staying paused");
                    self.playback = Playback::Paused;
                    return false;
                };
                self.playback = Playback::Playing { rate: rate.max(0.0) };
                match self.cursor {
                    Some(t) if t < max => false,
                    _ => self.set_cursor(Some(min)),
                }
            }
        }
    }

    /// Advance playback by `dt` seconds. Returns true when the cursor moved.
    ///
    /// Reaching the end of the range clamps the cursor to it and pauses;
    /// playback never wraps around.
    pub fn advance(&mut self, dt: f64) -> bool {
        let Playback::Playing { rate } = self.playback else {
            return false;
        };
        let Some((min, max)) = self.range else {
            self.playback = Playback::Paused;
            return false;
        };

        let current = self.cursor.unwrap_or(min);
        #[allow(clippy::cast_possible_truncation)]
        let step = (rate * dt.max(0.0)).round() as i64;
        let next = current.saturating_add(step).min(max);

        if next >= max {
            debug!("Playback reached end of timeline, pausing");
            self.playback = Playback::Paused;
        }
        self.set_cursor(Some(next))
    }

    /// Evaluate `nodes` at the cursor, reporting spawns and despawns relative
    /// to the previous evaluation.
    pub fn evaluate(&mut self, nodes: &[Node]) -> Evaluation {
        let mut evaluation = Evaluation::default();
        let mut current = HashMap::with_capacity(nodes.len());
        let mut seen = HashSet::with_capacity(nodes.len());

        for node in nodes {
            let count = node_active_count(node, self.cursor);
            let before = self.previous.get(&node.id).copied().unwrap_or(0);
            seen.insert(node.id.as_str());

            if count > 0 {
                if before == 0 {
                    evaluation.spawned.push(node.id.clone());
                }
                evaluation.active.push(ActiveEntry { id: node.id.clone(), count });
                current.insert(node.id.clone(), count);
            } else if before > 0 {
                evaluation.despawned.push(node.id.clone());
            }
        }

        // Nodes that left the evaluated list altogether also despawn.
        let mut vanished: Vec<String> = self
            .previous
            .keys()
            .filter(|id| !seen.contains(id.as_str()))
            .cloned()
            .collect();
        vanished.sort();
        evaluation.despawned.extend(vanished);

        self.previous = current;
        evaluation
    }

    /// Forget spawn bookkeeping, e.g. when the evaluated node list changes
    /// because of navigation.
    pub fn reset_tracking(&mut self) {
        self.previous.clear();
    }
}
