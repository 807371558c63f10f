//! # Layout Engine
//!
//! Iterative force simulation that positions the active node set inside a
//! container circle centered on the origin, one [`LayoutEngine::tick`] per
//! frame.
//!
//! ## Phases
//!
//! ```text
//! Empty ──set_nodes/set_viewport──▶ Initializing ──tick──▶ Settling ──alpha < alpha_min──▶ Idle
//!   ▲                                    ▲                                                  │
//!   └── zero viewport / no nodes         └──────────── active set changes ◀─────────────────┘
//! ```
//!
//! In `Empty` nothing is simulated and `tick` returns immediately, but the
//! last inputs are kept so a later valid viewport brings them back.
//!
//! ## Forces
//!
//! Per tick: radius and hover easing, anchor attraction, weak repulsion,
//! optional link springs, integration, collision relaxation, and finally the
//! hard enclosure clamp. Enclosure always runs last, so after any tick every
//! node satisfies `|p| + r <= R`.

mod forces;
pub mod sizing;

use crate::aggregate::{Link, Node};
use glam::DVec2;
use crate::spatial::Rgb;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sizing::SizingConfig;
use std::collections::HashMap;
use std::f64::consts::TAU;

/// Golden angle in radians.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Physics and animation tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Minimum gap between two circles, in pixels
    pub collision_margin: f64,
    /// Relaxation passes per tick
    pub collision_iterations: usize,
    /// Share of an overlap resolved per pass
    pub collision_strength: f64,
    /// Pull toward the category anchor (top level)
    pub anchor_strength: f64,
    /// Pull toward the center (cluster mode)
    pub center_strength: f64,
    /// Anchors sit at `anchor_spread * R` from the center
    pub anchor_spread: f64,
    pub repulsion: f64,
    pub link_strength: f64,
    /// Share of velocity lost per tick
    pub velocity_decay: f64,
    pub alpha_decay: f64,
    /// Below this alpha the layout counts as settled
    pub alpha_min: f64,
    /// Floor the alpha approaches once idle
    pub idle_alpha: f64,
    /// Alpha after a mode change or explicit reheat
    pub reheat_alpha: f64,
    /// Alpha floor after the active set changes within the same mode
    pub update_alpha: f64,
    /// Velocity damping applied when a node hits the container wall
    pub enclosure_damping: f64,
    pub radius_easing: f64,
    pub hover_easing: f64,
    /// Target scale of the hovered node
    pub hover_scale: f64,
    /// Spawn scatter around the anchor, as a share of the container radius
    pub spawn_jitter: f64,
    pub seed: u64,
    pub sizing: SizingConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            collision_margin: 2.0,
            collision_iterations: 3,
            collision_strength: 0.7,
            anchor_strength: 0.06,
            center_strength: 0.04,
            anchor_spread: 0.65,
            repulsion: 200.0,
            link_strength: 0.02,
            velocity_decay: 0.4,
            alpha_decay: 0.0228,
            alpha_min: 0.05,
            idle_alpha: 0.02,
            reheat_alpha: 1.0,
            update_alpha: 0.3,
            enclosure_damping: 0.5,
            radius_easing: 0.15,
            hover_easing: 0.25,
            hover_scale: 1.15,
            spawn_jitter: 0.05,
            seed: 0x6d75_7365,
            sizing: SizingConfig::default(),
        }
    }
}

/// Where nodes are pulled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Toward their category anchors (top-level genres)
    #[default]
    Category,
    /// Toward the center (artists of one genre)
    Cluster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Empty,
    Initializing,
    Settling,
    Idle,
}

/// Layout-relevant view of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutInput {
    pub id: String,
    pub name: String,
    pub count: usize,
    pub color: Rgb,
    /// Normalized category anchor, `None` in cluster mode
    pub anchor: Option<DVec2>,
    pub has_children: bool,
}

impl LayoutInput {
    /// Input for `node` with an explicit (possibly time-filtered) count.
    #[must_use]
    pub fn from_node(node: &Node, count: usize) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            count,
            color: node.color,
            anchor: node.anchor,
            has_children: node.has_children(),
        }
    }
}

impl From<&Node> for LayoutInput {
    fn from(node: &Node) -> Self {
        Self::from_node(node, node.count)
    }
}

/// A node with its physics state. Owned by the [`LayoutEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationNode {
    pub id: String,
    pub name: String,
    pub count: usize,
    pub color: Rgb,
    pub has_children: bool,
    pub position: DVec2,
    pub velocity: DVec2,
    /// Attraction target in world coordinates
    pub target: DVec2,
    pub target_radius: f64,
    /// Eased radius, grows from 0 when spawning
    pub radius: f64,
    pub hover_scale: f64,
    pub(crate) target_hover_scale: f64,
    pub spawning: bool,
}

impl SimulationNode {
    /// Drawn radius: eased radius times hover scale.
    #[must_use]
    pub fn effective_radius(&self) -> f64 {
        self.radius * self.hover_scale
    }

    #[must_use]
    pub fn contains(&self, point: DVec2) -> bool {
        self.position.distance(point) <= self.effective_radius()
    }
}

/// Read-only, serializable state of one node for renderers and hit-testing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: String,
    pub name: String,
    pub count: usize,
    pub color: Rgb,
    pub position: DVec2,
    /// Drawn radius, hover scale included
    pub radius: f64,
    pub has_children: bool,
    pub spawning: bool,
    pub hovered: bool,
}

impl NodeView {
    #[must_use]
    pub fn contains(&self, point: DVec2) -> bool {
        self.position.distance(point) <= self.radius
    }
}

/// Topmost circle under `point`.
///
/// Circles are drawn in slice order, so later entries sit on top and win.
/// The `sticky` id keeps priority while the point stays inside it, which
/// stops hover from flickering between overlapping neighbors.
pub fn pick<'a, T>(
    items: &'a [T],
    point: DVec2,
    sticky: Option<&str>,
    circle: impl Fn(&T) -> (&str, DVec2, f64),
) -> Option<&'a T> {
    let inside = |item: &T| {
        let (_, center, radius) = circle(item);
        center.distance(point) <= radius
    };

    if let Some(sticky) = sticky {
        if let Some(item) = items.iter().find(|item| circle(*item).0 == sticky) {
            if inside(item) {
                return Some(item);
            }
        }
    }
    items.iter().rev().find(|item| inside(*item))
}

/// The force simulation.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: LayoutConfig,
    viewport: (f64, f64),
    mode: LayoutMode,
    inputs: Vec<LayoutInput>,
    links: Vec<Link>,
    nodes: Vec<SimulationNode>,
    node_index: HashMap<String, usize>,
    container: f64,
    alpha: f64,
    phase: Phase,
    hovered: Option<String>,
    rng: StdRng,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl LayoutEngine {
    #[must_use]
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            viewport: (0.0, 0.0),
            mode: LayoutMode::Category,
            inputs: Vec::new(),
            links: Vec::new(),
            nodes: Vec::new(),
            node_index: HashMap::new(),
            container: 0.0,
            alpha: 0.0,
            phase: Phase::Empty,
            hovered: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    #[must_use]
    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    #[must_use]
    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    /// Radius of the container circle, 0 while empty.
    #[must_use]
    pub fn container_radius(&self) -> f64 {
        self.container
    }

    #[must_use]
    pub fn nodes(&self) -> &[SimulationNode] {
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&SimulationNode> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    /// Inputs of the last `set_nodes`, kept even while empty.
    #[must_use]
    pub fn inputs(&self) -> &[LayoutInput] {
        &self.inputs
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    fn viewport_is_valid(&self) -> bool {
        let (w, h) = self.viewport;
        w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0
    }

    /// Resize the viewport. Container and target radii follow; node state
    /// carries over.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        if self.viewport == (width, height) {
            return;
        }
        debug!("Viewport resized to {width}x{height}");
        self.viewport = (width, height);
        self.rebuild(Some(self.config.update_alpha));
    }

    /// Replace the active node set.
    ///
    /// Nodes already present (by id) keep position, velocity, radius and
    /// hover state; new ones spawn at radius 0 near their target. `links`
    /// index into `inputs`.
    ///
    /// Only a change of membership or mode restarts the simulation; new
    /// counts for the same ids just retarget the radii.
    pub fn set_nodes(&mut self, inputs: Vec<LayoutInput>, mode: LayoutMode, links: Vec<Link>) {
        let alpha_floor = if mode != self.mode {
            Some(self.config.reheat_alpha)
        } else if self.same_members(&inputs) {
            None
        } else {
            Some(self.config.update_alpha)
        };
        self.mode = mode;
        self.inputs = inputs;
        self.links = links;
        self.rebuild(alpha_floor);
    }

    fn same_members(&self, inputs: &[LayoutInput]) -> bool {
        inputs.len() == self.nodes.len()
            && inputs.iter().zip(&self.nodes).all(|(input, node)| input.id == node.id)
    }

    fn rebuild(&mut self, alpha_floor: Option<f64>) {
        if !self.viewport_is_valid() || self.inputs.is_empty() {
            if self.phase != Phase::Empty {
                debug!("Layout is empty (viewport {:?}, {} inputs)", self.viewport, self.inputs.len());
            }
            self.nodes.clear();
            self.node_index.clear();
            self.container = 0.0;
            self.alpha = 0.0;
            self.phase = Phase::Empty;
            return;
        }

        let (w, h) = self.viewport;
        let sizing = self.config.sizing;
        let mass = sizing::visual_mass(self.inputs.iter().map(|i| i.count));
        self.container = sizing::container_radius(w, h, mass, &sizing);
        let max_count = self.inputs.iter().map(|i| i.count).max().unwrap_or(0);
        let n = self.inputs.len();

        let mut previous: HashMap<String, SimulationNode> =
            self.nodes.drain(..).map(|node| (node.id.clone(), node)).collect();
        self.node_index.clear();

        let mut spawned = 0usize;
        let mut nodes = Vec::with_capacity(n);
        for (i, input) in self.inputs.iter().enumerate() {
            let target = match self.mode {
                LayoutMode::Category => {
                    input.anchor.unwrap_or(DVec2::ZERO) * (self.config.anchor_spread * self.container)
                }
                LayoutMode::Cluster => DVec2::ZERO,
            };
            let target_radius = sizing::target_radius(input.count, max_count, n, self.container, &sizing);
            let target_hover_scale = if self.hovered.as_deref() == Some(input.id.as_str()) {
                self.config.hover_scale
            } else {
                1.0
            };

            let node = match previous.remove(&input.id) {
                Some(prev) => SimulationNode {
                    name: input.name.clone(),
                    count: input.count,
                    color: input.color,
                    has_children: input.has_children,
                    target,
                    target_radius,
                    target_hover_scale,
                    ..prev
                },
                None => {
                    spawned += 1;
                    let position = spawn_position(&mut self.rng, self.mode, i, n, target, self.container, &self.config);
                    SimulationNode {
                        id: input.id.clone(),
                        name: input.name.clone(),
                        count: input.count,
                        color: input.color,
                        has_children: input.has_children,
                        position,
                        velocity: DVec2::ZERO,
                        target,
                        target_radius,
                        radius: 0.0,
                        hover_scale: 1.0,
                        target_hover_scale,
                        spawning: true,
                    }
                }
            };
            self.node_index.insert(node.id.clone(), i);
            nodes.push(node);
        }
        self.nodes = nodes;

        if self.hovered.as_ref().is_some_and(|id| !self.node_index.contains_key(id)) {
            self.hovered = None;
        }

        match (self.phase, alpha_floor) {
            (Phase::Empty, _) => {
                self.alpha = self.config.reheat_alpha;
                self.phase = Phase::Initializing;
            }
            (_, Some(floor)) => {
                self.alpha = self.alpha.max(floor);
                self.phase = Phase::Initializing;
            }
            (_, None) => {}
        }
        debug!(
            "Layout set to {} nodes ({} new, {} dropped), container radius {:.1}",
            n,
            spawned,
            previous.len(),
            self.container
        );
    }

    /// Bring the simulation back to full intensity.
    pub fn reheat(&mut self) {
        if self.phase == Phase::Empty {
            return;
        }
        self.alpha = self.config.reheat_alpha;
        self.phase = Phase::Settling;
    }

    /// Mark `id` as hovered (or nothing). Returns true when it changed.
    pub fn set_hovered(&mut self, id: Option<&str>) -> bool {
        let id = id.filter(|id| self.node_index.contains_key(*id));
        if self.hovered.as_deref() == id {
            return false;
        }
        self.hovered = id.map(str::to_string);
        let scale = self.config.hover_scale;
        for node in &mut self.nodes {
            node.target_hover_scale = if Some(node.id.as_str()) == id { scale } else { 1.0 };
        }
        true
    }

    /// Advance the simulation one step.
    pub fn tick(&mut self) {
        match self.phase {
            Phase::Empty => return,
            Phase::Initializing => {
                debug!("Layout settling from alpha {:.3}", self.alpha);
                self.phase = Phase::Settling;
            }
            Phase::Settling | Phase::Idle => {}
        }

        self.alpha += (self.config.idle_alpha - self.alpha) * self.config.alpha_decay;
        if self.phase == Phase::Settling && self.alpha < self.config.alpha_min {
            debug!("Layout settled");
            self.phase = Phase::Idle;
        }

        let config = &self.config;
        let strength = match self.mode {
            LayoutMode::Category => config.anchor_strength,
            LayoutMode::Cluster => config.center_strength,
        };

        forces::ease(&mut self.nodes, config);
        forces::anchor(&mut self.nodes, strength, self.alpha);
        forces::repel(&mut self.nodes, config.repulsion, self.alpha);
        forces::link(&mut self.nodes, &self.links, config, self.alpha);
        forces::integrate(&mut self.nodes, config.velocity_decay);
        forces::collide(&mut self.nodes, config);
        forces::enclose(&mut self.nodes, self.container, config.enclosure_damping);

        trace!("Tick: alpha {:.4}, {} nodes", self.alpha, self.nodes.len());
    }

    /// Topmost node containing a world-space point.
    #[must_use]
    pub fn node_at(&self, point: DVec2) -> Option<&SimulationNode> {
        pick(&self.nodes, point, self.hovered.as_deref(), |n| {
            (n.id.as_str(), n.position, n.effective_radius())
        })
    }

    /// Serializable copy of the current node state, in draw order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<NodeView> {
        self.nodes
            .iter()
            .map(|n| NodeView {
                id: n.id.clone(),
                name: n.name.clone(),
                count: n.count,
                color: n.color,
                position: n.position,
                radius: n.effective_radius(),
                has_children: n.has_children,
                spawning: n.spawning,
                hovered: self.hovered.as_deref() == Some(n.id.as_str()),
            })
            .collect()
    }
}

fn spawn_position(
    rng: &mut StdRng,
    mode: LayoutMode,
    index: usize,
    count: usize,
    target: DVec2,
    container: f64,
    config: &LayoutConfig,
) -> DVec2 {
    match mode {
        LayoutMode::Category => {
            let angle = rng.gen_range(0.0..TAU);
            let distance = rng.gen::<f64>() * config.spawn_jitter * container;
            target + DVec2::from_angle(angle) * distance
        }
        LayoutMode::Cluster => {
            // Sunflower spiral around the center.
            #[allow(clippy::cast_precision_loss)]
            let (i, n) = (index as f64, count.max(1) as f64);
            let r = container * 0.5 * ((i + 0.5) / n).sqrt();
            target + DVec2::from_angle(i * GOLDEN_ANGLE) * r
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, Category};
    use crate::spatial::{self, NEUTRAL};

    fn input(id: &str, count: usize, anchor: Option<DVec2>) -> LayoutInput {
        LayoutInput {
            id: id.to_string(),
            name: id.to_string(),
            count,
            color: NEUTRAL,
            anchor,
            has_children: false,
        }
    }

    fn genre_inputs(n: usize) -> Vec<LayoutInput> {
        let labels = ["rock", "jazz", "techno", "folk", "pop", "hip hop", "classical", "jazz rap"];
        (0..n)
            .map(|i| {
                let label = labels[i % labels.len()];
                let anchor = spatial::position(&classify(label));
                input(&format!("{label}-{i}"), 1 + (i * 37) % 90, Some(anchor))
            })
            .collect()
    }

    fn settled(inputs: Vec<LayoutInput>, mode: LayoutMode, ticks: usize) -> LayoutEngine {
        let mut engine = LayoutEngine::default();
        engine.set_viewport(800.0, 600.0);
        engine.set_nodes(inputs, mode, Vec::new());
        for _ in 0..ticks {
            engine.tick();
        }
        engine
    }

    #[test]
    fn test_enclosure_holds_after_ticks() {
        for n in [1, 7, 40, 150] {
            let engine = settled(genre_inputs(n), LayoutMode::Category, 120);
            let r = engine.container_radius();
            for node in engine.nodes() {
                assert!(
                    node.position.length() + node.effective_radius() <= r + 1e-6,
                    "{} escapes the container with {n} nodes",
                    node.id
                );
            }
        }
    }

    #[test]
    fn test_settled_layout_has_no_overlap() {
        let engine = settled(genre_inputs(20), LayoutMode::Category, 400);
        let nodes = engine.nodes();
        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                let gap = a.position.distance(b.position);
                assert!(
                    gap >= a.effective_radius() + b.effective_radius() - 1.0,
                    "{} overlaps {}",
                    a.id,
                    b.id
                );
            }
        }
    }

    #[test]
    fn test_settles_to_idle() {
        let engine = settled(genre_inputs(10), LayoutMode::Category, 400);
        assert_eq!(engine.phase(), Phase::Idle);
        assert!(engine.alpha() >= engine.config().idle_alpha);
        assert!(engine.alpha() < engine.config().alpha_min);
    }

    #[test]
    fn test_zero_viewport_is_empty_and_keeps_inputs() {
        let mut engine = LayoutEngine::default();
        engine.set_nodes(genre_inputs(5), LayoutMode::Category, Vec::new());
        assert_eq!(engine.phase(), Phase::Empty);
        assert!(engine.nodes().is_empty());
        engine.tick();
        assert_eq!(engine.phase(), Phase::Empty);

        engine.set_viewport(640.0, 480.0);
        assert_eq!(engine.phase(), Phase::Initializing);
        assert_eq!(engine.nodes().len(), 5);

        engine.set_viewport(0.0, 480.0);
        assert_eq!(engine.phase(), Phase::Empty);
        assert_eq!(engine.inputs().len(), 5);
    }

    #[test]
    fn test_empty_node_set_is_a_no_op() {
        let mut engine = LayoutEngine::default();
        engine.set_viewport(800.0, 600.0);
        engine.set_nodes(Vec::new(), LayoutMode::Category, Vec::new());
        engine.tick();
        assert_eq!(engine.phase(), Phase::Empty);
        assert_eq!(engine.container_radius(), 0.0);
        assert!(engine.snapshot().is_empty());
    }

    #[test]
    fn test_state_carries_over_by_id() {
        let anchor = Some(spatial::anchor(Category::Rock));
        let mut engine = settled(
            vec![input("a", 10, anchor), input("b", 20, anchor)],
            LayoutMode::Category,
            60,
        );
        let before = engine.node("a").cloned().expect("a is simulated");

        engine.set_nodes(
            vec![input("a", 10, anchor), input("c", 5, anchor)],
            LayoutMode::Category,
            Vec::new(),
        );
        let after = engine.node("a").expect("a survives");
        assert_eq!(after.position, before.position);
        assert_eq!(after.velocity, before.velocity);
        assert_eq!(after.radius, before.radius);
        assert!(!after.spawning);

        let c = engine.node("c").expect("c spawned");
        assert_eq!(c.radius, 0.0);
        assert!(c.spawning);
        assert!(engine.node("b").is_none());
        assert_eq!(engine.phase(), Phase::Initializing);
    }

    #[test]
    fn test_spawned_nodes_grow_to_target() {
        let mut engine = settled(vec![input("a", 10, None)], LayoutMode::Cluster, 1);
        let first = engine.nodes()[0].radius;
        assert!(first > 0.0);
        for _ in 0..60 {
            engine.tick();
        }
        let node = &engine.nodes()[0];
        assert!(node.radius > first);
        assert!((node.radius - node.target_radius).abs() < node.target_radius * 0.05);
        assert!(!node.spawning);
    }

    #[test]
    fn test_radius_follows_sqrt_of_count() {
        let mut engine = LayoutEngine::new(LayoutConfig {
            sizing: SizingConfig { min_radius: 0.0, ..SizingConfig::default() },
            ..LayoutConfig::default()
        });
        engine.set_viewport(800.0, 600.0);
        engine.set_nodes(
            vec![input("small", 25, None), input("big", 100, None)],
            LayoutMode::Cluster,
            Vec::new(),
        );
        let small = engine.node("small").unwrap().target_radius;
        let big = engine.node("big").unwrap().target_radius;
        assert!((big / small - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_few_nodes_are_larger_than_many() {
        let few = settled(genre_inputs(5), LayoutMode::Category, 0);
        let many = settled(genre_inputs(100), LayoutMode::Category, 0);
        let largest = |e: &LayoutEngine| {
            e.nodes().iter().map(|n| n.target_radius).fold(0.0, f64::max)
        };
        assert!(largest(&few) > largest(&many));
    }

    #[test]
    fn test_mode_change_reheats() {
        let mut engine = settled(genre_inputs(6), LayoutMode::Category, 400);
        assert_eq!(engine.phase(), Phase::Idle);

        engine.set_nodes(vec![input("x", 3, None)], LayoutMode::Cluster, Vec::new());
        assert_eq!(engine.phase(), Phase::Initializing);
        assert_eq!(engine.alpha(), engine.config().reheat_alpha);
    }

    #[test]
    fn test_count_update_keeps_phase() {
        let mut engine = settled(genre_inputs(6), LayoutMode::Category, 400);
        let before = engine.nodes()[0].target_radius;
        let mut inputs = genre_inputs(6);
        inputs[0].count += 500;
        engine.set_nodes(inputs, LayoutMode::Category, Vec::new());

        assert_eq!(engine.phase(), Phase::Idle);
        assert!(engine.nodes()[0].target_radius > before);
    }

    #[test]
    fn test_hover_scales_node() {
        let mut engine = settled(vec![input("a", 10, None), input("b", 10, None)], LayoutMode::Cluster, 30);
        assert!(engine.set_hovered(Some("a")));
        assert!(!engine.set_hovered(Some("a")));
        for _ in 0..40 {
            engine.tick();
        }
        let a = engine.node("a").unwrap();
        assert!((a.hover_scale - engine.config().hover_scale).abs() < 1e-3);
        assert!((engine.node("b").unwrap().hover_scale - 1.0).abs() < 1e-9);

        assert!(engine.set_hovered(Some("ghost")));
        assert_eq!(engine.hovered(), None);
    }

    #[test]
    fn test_node_at_hits_and_misses() {
        let engine = settled(vec![input("a", 10, None), input("b", 30, None)], LayoutMode::Cluster, 80);
        for node in engine.nodes() {
            assert_eq!(engine.node_at(node.position).map(|n| n.id.as_str()), Some(node.id.as_str()));
        }
        let far = DVec2::new(engine.container_radius() * 3.0, 0.0);
        assert!(engine.node_at(far).is_none());
    }

    #[test]
    fn test_pick_prefers_sticky_then_topmost() {
        let views = [
            (String::from("under"), DVec2::ZERO, 10.0),
            (String::from("over"), DVec2::new(5.0, 0.0), 10.0),
        ];
        fn circle(v: &(String, DVec2, f64)) -> (&str, DVec2, f64) {
            (v.0.as_str(), v.1, v.2)
        }
        let point = DVec2::new(2.0, 0.0);

        assert_eq!(pick(&views, point, None, circle).map(|v| v.0.as_str()), Some("over"));
        assert_eq!(pick(&views, point, Some("under"), circle).map(|v| v.0.as_str()), Some("under"));
        assert_eq!(
            pick(&views, DVec2::new(14.0, 0.0), Some("under"), circle).map(|v| v.0.as_str()),
            Some("over")
        );
    }

    #[test]
    fn test_spawn_is_deterministic() {
        let a = settled(genre_inputs(12), LayoutMode::Category, 30);
        let b = settled(genre_inputs(12), LayoutMode::Category, 30);
        assert_eq!(a.nodes(), b.nodes());
    }
}
