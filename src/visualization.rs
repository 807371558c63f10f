//! # Visualization
//!
//! The per-frame driver. One [`Visualization`] owns the node hierarchy, the
//! [`LayoutEngine`], the [`TemporalFilter`] and the [`InteractionController`].
//!
//! Changes to the active set (drill navigation, cursor scrubbing, playback
//! control, resizing) are queued as [`Command`]s and applied together at
//! the start of the next [`Visualization::frame`], never in the middle of a
//! tick. Each frame then:
//!
//! 1. applies queued commands,
//! 2. advances playback,
//! 3. re-evaluates the active set when anything it depends on moved,
//! 4. ticks the layout once,
//! 5. publishes a [`FrameSnapshot`], which is also what pointer events are
//!    hit-tested against until the next frame.
//!
//! Dropping the `Visualization` tears everything down.

use crate::aggregate::{self, Link, Node};
use crate::config::Settings;
use glam::DVec2;
use crate::interaction::{Camera, InteractionController, InteractionEvent, ViewLevel};
use crate::layout::{LayoutConfig, LayoutEngine, LayoutInput, LayoutMode, NodeView, Phase};
use crate::library::Library;
use crate::temporal::{Playback, TemporalFilter, DEFAULT_PLAYBACK_RATE};
use log::debug;
use serde::Serialize;
use std::collections::VecDeque;

/// Deferred change to the active set or its environment.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ShowTopLevel,
    ShowChildren { parent: String },
    SetCursor(Option<i64>),
    SetPlayback(Playback),
    Resize { width: f64, height: f64 },
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub level: ViewLevel,
    pub breadcrumbs: Vec<String>,
    pub phase: Phase,
    pub alpha: f64,
    pub container_radius: f64,
    pub camera: Camera,
    pub cursor: Option<i64>,
    pub playback: Playback,
    pub time_range: Option<(i64, i64)>,
    pub nodes: Vec<NodeView>,
    /// Events raised while producing this frame
    pub events: Vec<InteractionEvent>,
}

/// Nodes shown at `level`.
fn level_nodes<'a>(genres: &'a [Node], level: &ViewLevel) -> &'a [Node] {
    match level {
        ViewLevel::TopLevel => genres,
        ViewLevel::Drilled { parent } => genres
            .iter()
            .find(|g| &g.id == parent)
            .map(|g| g.children.as_slice())
            .unwrap_or_default(),
    }
}

/// Owner of one live map.
#[derive(Debug)]
pub struct Visualization {
    genres: Vec<Node>,
    engine: LayoutEngine,
    temporal: TemporalFilter,
    controller: InteractionController,
    commands: VecDeque<Command>,
    /// Level whose nodes are currently simulated
    shown: ViewLevel,
    /// Links over the full node list of `shown`
    level_links: Vec<Link>,
    dirty: bool,
    /// A level change is queued but not applied yet
    navigation_pending: bool,
    /// Rate used by [`Visualization::play`], library milliseconds per second
    playback_rate: f64,
    nodes: Vec<NodeView>,
}

impl Visualization {
    /// Build a visualization over an aggregated hierarchy.
    #[must_use]
    pub fn new(genres: Vec<Node>, time_range: Option<(i64, i64)>, layout: LayoutConfig) -> Self {
        let level_links = aggregate::shared_artist_links(&genres);
        Self {
            genres,
            engine: LayoutEngine::new(layout),
            temporal: TemporalFilter::new(time_range),
            controller: InteractionController::default(),
            commands: VecDeque::new(),
            shown: ViewLevel::TopLevel,
            level_links,
            dirty: true,
            navigation_pending: false,
            playback_rate: DEFAULT_PLAYBACK_RATE,
            nodes: Vec::new(),
        }
    }

    /// Aggregate `library` and build a visualization over it.
    #[must_use]
    pub fn from_library(library: &Library, settings: &Settings) -> Self {
        let genres = aggregate::build(&library.tracks, &library.artists, &settings.aggregation);
        let mut vis = Self::new(genres, library.time_range(), settings.layout);
        vis.playback_rate = settings.playback_rate;
        vis
    }

    #[must_use]
    pub fn genres(&self) -> &[Node] {
        &self.genres
    }

    #[must_use]
    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    #[must_use]
    pub fn temporal(&self) -> &TemporalFilter {
        &self.temporal
    }

    #[must_use]
    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    /// Camera access for pan and zoom. Never affects the simulation.
    pub fn camera_mut(&mut self) -> &mut Camera {
        self.controller.camera_mut()
    }

    /// Node views of the last frame.
    #[must_use]
    pub fn nodes(&self) -> &[NodeView] {
        &self.nodes
    }

    #[must_use]
    pub fn time_range(&self) -> Option<(i64, i64)> {
        self.temporal.range()
    }

    pub fn queue(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.queue(Command::Resize { width, height });
    }

    pub fn set_cursor(&mut self, cursor: Option<i64>) {
        self.queue(Command::SetCursor(cursor));
    }

    pub fn set_playback(&mut self, playback: Playback) {
        self.queue(Command::SetPlayback(playback));
    }

    #[must_use]
    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    /// Start playback at the configured rate.
    pub fn play(&mut self) {
        self.set_playback(Playback::Playing { rate: self.playback_rate });
    }

    pub fn pointer_move(&mut self, screen: DVec2) -> Vec<InteractionEvent> {
        let events = self.controller.pointer_move(screen, &self.nodes);
        self.engine.set_hovered(self.controller.hovered());
        events
    }

    pub fn pointer_leave(&mut self) -> Vec<InteractionEvent> {
        let events = self.controller.pointer_leave();
        self.engine.set_hovered(None);
        events
    }

    /// Resolve a click. Drill navigation takes effect on the next frame.
    ///
    /// Clicks are ignored while a level change is queued: the last snapshot
    /// still shows the level being left.
    pub fn click(&mut self, screen: DVec2) -> Vec<InteractionEvent> {
        if self.navigation_pending {
            debug!("Ignoring click while navigation is pending");
            return Vec::new();
        }
        let events = self.controller.click(screen, &self.nodes);
        self.follow_navigation(&events);
        events
    }

    /// Drill into the visible node `id`. Returns no events when it is not
    /// visible or has no children.
    pub fn drill_into(&mut self, id: &str) -> Vec<InteractionEvent> {
        if self.navigation_pending {
            return Vec::new();
        }
        let Some(node) = self.nodes.iter().find(|n| n.id == id) else {
            return Vec::new();
        };
        let events = self.controller.drill_down(node);
        self.follow_navigation(&events);
        events
    }

    /// Leave the current drilled level.
    pub fn back(&mut self) -> Vec<InteractionEvent> {
        let events = self.controller.back();
        self.follow_navigation(&events);
        events
    }

    fn follow_navigation(&mut self, events: &[InteractionEvent]) {
        for event in events {
            match event {
                InteractionEvent::HoverLeave { .. } => {
                    self.engine.set_hovered(None);
                }
                InteractionEvent::DrillDown { id } => {
                    self.queue(Command::ShowChildren { parent: id.clone() });
                    self.navigation_pending = true;
                }
                InteractionEvent::DrillUp { .. } => {
                    let command = match self.controller.level() {
                        ViewLevel::TopLevel => Command::ShowTopLevel,
                        ViewLevel::Drilled { parent } => Command::ShowChildren { parent },
                    };
                    self.queue(command);
                    self.navigation_pending = true;
                }
                _ => {}
            }
        }
    }

    fn show(&mut self, level: ViewLevel) {
        if self.shown == level {
            return;
        }
        debug!("Showing {level:?}");
        self.shown = level;
        self.level_links = match &self.shown {
            ViewLevel::TopLevel => aggregate::shared_artist_links(&self.genres),
            ViewLevel::Drilled { .. } => {
                aggregate::collaboration_links(level_nodes(&self.genres, &self.shown))
            }
        };
        self.temporal.reset_tracking();
        self.dirty = true;
    }

    fn apply(&mut self, command: Command, events: &mut Vec<InteractionEvent>) {
        match command {
            Command::ShowTopLevel => self.show(ViewLevel::TopLevel),
            Command::ShowChildren { parent } => self.show(ViewLevel::Drilled { parent }),
            Command::SetCursor(cursor) => {
                if self.temporal.set_cursor(cursor) {
                    events.push(InteractionEvent::CursorChanged { cursor });
                    self.dirty = true;
                }
            }
            Command::SetPlayback(playback) => {
                if self.temporal.set_playback(playback) {
                    events.push(InteractionEvent::CursorChanged { cursor: self.temporal.cursor() });
                    self.dirty = true;
                }
            }
            Command::Resize { width, height } => {
                self.controller.set_viewport(width, height);
                self.engine.set_viewport(width, height);
            }
        }
    }

    fn refresh_active_set(&mut self) {
        let level_nodes = level_nodes(&self.genres, &self.shown);
        let evaluation = self.temporal.evaluate(level_nodes);
        if evaluation.membership_changed() {
            debug!(
                "Active set: {} nodes, {} spawned, {} despawned",
                evaluation.active.len(),
                evaluation.spawned.len(),
                evaluation.despawned.len()
            );
        }

        // Active entries keep input order, so one forward pass maps them back.
        let mut remap = vec![None; level_nodes.len()];
        let mut inputs = Vec::with_capacity(evaluation.active.len());
        let mut entries = evaluation.active.iter().peekable();
        for (i, node) in level_nodes.iter().enumerate() {
            if let Some(entry) = entries.next_if(|e| e.id == node.id) {
                remap[i] = Some(inputs.len());
                inputs.push(LayoutInput::from_node(node, entry.count));
            }
        }

        let links = self
            .level_links
            .iter()
            .filter_map(|l| {
                Some(Link {
                    source: remap.get(l.source).copied().flatten()?,
                    target: remap.get(l.target).copied().flatten()?,
                    weight: l.weight,
                })
            })
            .collect();

        let mode = match self.shown {
            ViewLevel::TopLevel => LayoutMode::Category,
            ViewLevel::Drilled { .. } => LayoutMode::Cluster,
        };
        self.engine.set_nodes(inputs, mode, links);
    }

    /// Advance one frame by `dt` seconds.
    pub fn frame(&mut self, dt: f64) -> FrameSnapshot {
        let mut events = Vec::new();
        while let Some(command) = self.commands.pop_front() {
            self.apply(command, &mut events);
        }
        self.navigation_pending = false;

        if self.temporal.advance(dt) {
            events.push(InteractionEvent::CursorChanged { cursor: self.temporal.cursor() });
            self.dirty = true;
        }

        if self.dirty {
            self.refresh_active_set();
            self.dirty = false;
        }

        self.engine.tick();
        self.nodes = self.engine.snapshot();
        events.extend(self.controller.retain_visible(&self.nodes));

        FrameSnapshot {
            level: self.shown.clone(),
            breadcrumbs: self.controller.breadcrumbs(),
            phase: self.engine.phase(),
            alpha: self.engine.alpha(),
            container_radius: self.engine.container_radius(),
            camera: *self.controller.camera(),
            cursor: self.temporal.cursor(),
            playback: self.temporal.playback(),
            time_range: self.temporal.range(),
            nodes: self.nodes.clone(),
            events,
        }
    }

    /// Run frames until the layout is idle or `max_frames` ran out.
    /// Returns the last snapshot.
    pub fn settle(&mut self, dt: f64, max_frames: usize) -> FrameSnapshot {
        let mut snapshot = self.frame(dt);
        for _ in 1..max_frames {
            if matches!(snapshot.phase, Phase::Idle | Phase::Empty) {
                break;
            }
            snapshot = self.frame(dt);
        }
        snapshot
    }
}
