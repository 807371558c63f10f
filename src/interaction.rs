//! # Interaction Controller
//!
//! Turns pointer input into navigation and hover state. The controller owns
//! the camera, the drill-down stack, and the hovered and selected ids. It
//! never touches physics: pointer handlers read the same node snapshot the
//! renderer draws and return [`InteractionEvent`]s, which the
//! [`Visualization`](crate::visualization::Visualization) turns into layout
//! commands for the next frame.
//!
//! ```text
//!            click node with children
//!   TopLevel ─────────────────────────▶ Drilled { parent }
//!      ▲                                      │
//!      └────────────── back() ────────────────┘
//! ```
//!
//! Clicking a leaf selects it without navigating. Clicking the background
//! never navigates; it only clears a selection.

use glam::DVec2;
use crate::layout::{pick, NodeView};
use log::debug;
use serde::Serialize;

/// Label of the root breadcrumb.
pub const ROOT_CRUMB: &str = "All genres";

/// Screen ⇄ world transform: `screen = world * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Camera {
    pub translate: DVec2,
    pub scale: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            translate: DVec2::ZERO,
            scale: 1.0,
            min_zoom: 0.25,
            max_zoom: 8.0,
        }
    }
}

impl Camera {
    #[must_use]
    pub fn screen_to_world(&self, point: DVec2) -> DVec2 {
        (point - self.translate) / self.scale
    }

    #[must_use]
    pub fn world_to_screen(&self, point: DVec2) -> DVec2 {
        point * self.scale + self.translate
    }

    pub fn pan(&mut self, delta: DVec2) {
        self.translate += delta;
    }

    /// Zoom by `factor` keeping the world point under `screen` fixed.
    pub fn zoom_at(&mut self, screen: DVec2, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let world = self.screen_to_world(screen);
        self.scale = (self.scale * factor).clamp(self.min_zoom, self.max_zoom);
        self.translate = screen - world * self.scale;
    }

    /// Unit scale with the world origin at the center of the viewport.
    pub fn reset(&mut self, width: f64, height: f64) {
        self.scale = 1.0;
        self.translate = DVec2::new(width / 2.0, height / 2.0);
    }
}

/// Current navigation level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum ViewLevel {
    TopLevel,
    Drilled { parent: String },
}

/// Events reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InteractionEvent {
    HoverEnter { id: String },
    HoverLeave { id: String },
    DrillDown { id: String },
    /// Left the level of `id`
    DrillUp { id: String },
    LeafSelected { id: String },
    Deselected { id: String },
    CursorChanged { cursor: Option<i64> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Crumb {
    id: String,
    name: String,
}

/// Camera, drill stack and pointer state.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    camera: Camera,
    viewport: (f64, f64),
    stack: Vec<Crumb>,
    hovered: Option<String>,
    selected: Option<String>,
}

impl InteractionController {
    #[must_use]
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn level(&self) -> ViewLevel {
        match self.stack.last() {
            None => ViewLevel::TopLevel,
            Some(crumb) => ViewLevel::Drilled { parent: crumb.id.clone() },
        }
    }

    /// Ids of the drilled parents, outermost first.
    #[must_use]
    pub fn stack(&self) -> Vec<&str> {
        self.stack.iter().map(|c| c.id.as_str()).collect()
    }

    /// Display labels from the root to the current level.
    #[must_use]
    pub fn breadcrumbs(&self) -> Vec<String> {
        std::iter::once(ROOT_CRUMB.to_string())
            .chain(self.stack.iter().map(|c| c.name.clone()))
            .collect()
    }

    /// Track the viewport and re-center the camera.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
        self.camera.reset(width, height);
    }

    /// Node under a screen point, if any.
    #[must_use]
    pub fn hit<'a>(&self, screen: DVec2, nodes: &'a [NodeView]) -> Option<&'a NodeView> {
        let world = self.camera.screen_to_world(screen);
        pick(nodes, world, self.hovered.as_deref(), |n| (n.id.as_str(), n.position, n.radius))
    }

    /// Update hover from a pointer position.
    pub fn pointer_move(&mut self, screen: DVec2, nodes: &[NodeView]) -> Vec<InteractionEvent> {
        let hit = self.hit(screen, nodes).map(|n| n.id.clone());
        self.set_hover(hit)
    }

    /// Pointer left the canvas.
    pub fn pointer_leave(&mut self) -> Vec<InteractionEvent> {
        self.set_hover(None)
    }

    fn set_hover(&mut self, id: Option<String>) -> Vec<InteractionEvent> {
        if self.hovered == id {
            return Vec::new();
        }
        let mut events = Vec::with_capacity(2);
        if let Some(old) = self.hovered.take() {
            events.push(InteractionEvent::HoverLeave { id: old });
        }
        if let Some(new) = id {
            events.push(InteractionEvent::HoverEnter { id: new.clone() });
            self.hovered = Some(new);
        }
        events
    }

    /// Resolve a click.
    pub fn click(&mut self, screen: DVec2, nodes: &[NodeView]) -> Vec<InteractionEvent> {
        let Some(node) = self.hit(screen, nodes) else {
            return self.clear_selection().into_iter().collect();
        };

        if node.has_children {
            return self.drill_down(node);
        }

        self.selected = Some(node.id.clone());
        vec![InteractionEvent::LeafSelected { id: node.id.clone() }]
    }

    /// Drill into `node` without going through hit-testing. Leaves are
    /// ignored, and so is any drill below the first level: the hierarchy
    /// has exactly two levels.
    pub fn drill_down(&mut self, node: &NodeView) -> Vec<InteractionEvent> {
        if !node.has_children {
            return Vec::new();
        }
        if let Some(crumb) = self.stack.last() {
            debug!("Already drilled into {}, ignoring {}", crumb.id, node.id);
            return Vec::new();
        }
        debug!("Drilling into {}", node.id);
        let mut events = self.set_hover(None);
        events.extend(self.clear_selection());
        self.stack.push(Crumb { id: node.id.clone(), name: node.name.clone() });
        self.camera.reset(self.viewport.0, self.viewport.1);
        events.push(InteractionEvent::DrillDown { id: node.id.clone() });
        events
    }

    /// Leave the current drilled level. A no-op at top level.
    pub fn back(&mut self) -> Vec<InteractionEvent> {
        let Some(crumb) = self.stack.pop() else {
            return Vec::new();
        };
        debug!("Leaving {}", crumb.id);
        let mut events = self.set_hover(None);
        events.extend(self.clear_selection());
        self.camera.reset(self.viewport.0, self.viewport.1);
        events.push(InteractionEvent::DrillUp { id: crumb.id });
        events
    }

    /// Drop hover and selection of nodes that left the active set.
    pub fn retain_visible(&mut self, nodes: &[NodeView]) -> Vec<InteractionEvent> {
        let visible = |id: &String| nodes.iter().any(|n| &n.id == id);
        let mut events = Vec::new();
        if self.hovered.as_ref().is_some_and(|id| !visible(id)) {
            events.extend(self.set_hover(None));
        }
        if self.selected.as_ref().is_some_and(|id| !visible(id)) {
            events.extend(self.clear_selection());
        }
        events
    }

    fn clear_selection(&mut self) -> Option<InteractionEvent> {
        self.selected.take().map(|id| InteractionEvent::Deselected { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::NEUTRAL;

    fn view(id: &str, x: f64, y: f64, radius: f64, has_children: bool) -> NodeView {
        NodeView {
            id: id.to_string(),
            name: id.to_uppercase(),
            count: 1,
            color: NEUTRAL,
            position: DVec2::new(x, y),
            radius,
            has_children,
            spawning: false,
            hovered: false,
        }
    }

    fn controller() -> InteractionController {
        let mut controller = InteractionController::default();
        controller.set_viewport(200.0, 200.0);
        controller
    }

    // World origin sits at screen (100, 100).
    fn screen(x: f64, y: f64) -> DVec2 {
        DVec2::new(x + 100.0, y + 100.0)
    }

    #[test]
    fn test_camera_round_trip() {
        let mut camera = Camera::default();
        camera.pan(DVec2::new(30.0, -12.0));
        camera.zoom_at(DVec2::new(50.0, 50.0), 2.5);
        let p = DVec2::new(7.0, -3.0);
        assert!(camera.screen_to_world(camera.world_to_screen(p)).distance(p) < 1e-9);
    }

    #[test]
    fn test_zoom_keeps_point_fixed_and_clamps() {
        let mut camera = Camera::default();
        let anchor = DVec2::new(120.0, 80.0);
        let before = camera.screen_to_world(anchor);
        camera.zoom_at(anchor, 3.0);
        assert!(camera.screen_to_world(anchor).distance(before) < 1e-9);

        camera.zoom_at(anchor, 1000.0);
        assert_eq!(camera.scale, camera.max_zoom);
        camera.zoom_at(anchor, 1e-6);
        assert_eq!(camera.scale, camera.min_zoom);
    }

    #[test]
    fn test_hover_events_only_on_change() {
        let nodes = vec![view("a", 0.0, 0.0, 10.0, false), view("b", 50.0, 0.0, 10.0, false)];
        let mut c = controller();

        assert_eq!(
            c.pointer_move(screen(1.0, 1.0), &nodes),
            vec![InteractionEvent::HoverEnter { id: "a".into() }]
        );
        assert!(c.pointer_move(screen(2.0, 0.0), &nodes).is_empty());
        assert_eq!(
            c.pointer_move(screen(50.0, 0.0), &nodes),
            vec![
                InteractionEvent::HoverLeave { id: "a".into() },
                InteractionEvent::HoverEnter { id: "b".into() },
            ]
        );
        assert_eq!(
            c.pointer_move(screen(25.0, 40.0), &nodes),
            vec![InteractionEvent::HoverLeave { id: "b".into() }]
        );
        assert_eq!(c.hovered(), None);
    }

    #[test]
    fn test_hovered_node_keeps_priority_in_overlap() {
        let nodes = vec![view("under", 0.0, 0.0, 10.0, false), view("over", 8.0, 0.0, 10.0, false)];
        let mut c = controller();

        c.pointer_move(screen(-5.0, 0.0), &nodes);
        assert_eq!(c.hovered(), Some("under"));
        // Into the overlap: the hovered node stays.
        assert!(c.pointer_move(screen(4.0, 0.0), &nodes).is_empty());
        // Out of "under": the topmost remaining hit wins.
        c.pointer_move(screen(15.0, 0.0), &nodes);
        assert_eq!(c.hovered(), Some("over"));
    }

    #[test]
    fn test_last_drawn_wins_without_hover() {
        let nodes = vec![view("under", 0.0, 0.0, 10.0, false), view("over", 8.0, 0.0, 10.0, false)];
        let c = controller();
        assert_eq!(c.hit(screen(4.0, 0.0), &nodes).map(|n| n.id.as_str()), Some("over"));
    }

    #[test]
    fn test_click_with_children_drills_down_and_back_returns() {
        let nodes = vec![view("jazz", 0.0, 0.0, 20.0, true)];
        let mut c = controller();

        let events = c.click(screen(0.0, 0.0), &nodes);
        assert_eq!(events, vec![InteractionEvent::DrillDown { id: "jazz".into() }]);
        assert_eq!(c.level(), ViewLevel::Drilled { parent: "jazz".into() });
        assert_eq!(c.breadcrumbs(), vec![ROOT_CRUMB.to_string(), "JAZZ".to_string()]);

        assert_eq!(c.back(), vec![InteractionEvent::DrillUp { id: "jazz".into() }]);
        assert_eq!(c.level(), ViewLevel::TopLevel);
        assert!(c.back().is_empty());
    }

    #[test]
    fn test_drill_down_ignores_leaves() {
        let mut c = controller();
        assert!(c.drill_down(&view("miles", 0.0, 0.0, 5.0, false)).is_empty());
        assert_eq!(c.level(), ViewLevel::TopLevel);

        let events = c.drill_down(&view("jazz", 0.0, 0.0, 5.0, true));
        assert_eq!(events, vec![InteractionEvent::DrillDown { id: "jazz".into() }]);
        assert_eq!(c.stack(), vec!["jazz"]);
    }

    #[test]
    fn test_drill_down_stops_at_one_level() {
        let mut c = controller();
        c.drill_down(&view("jazz", 0.0, 0.0, 5.0, true));

        assert!(c.drill_down(&view("folk", 0.0, 0.0, 5.0, true)).is_empty());
        assert_eq!(c.stack(), vec!["jazz"]);
        assert_eq!(c.breadcrumbs(), vec![ROOT_CRUMB.to_string(), "jazz".to_string()]);

        c.back();
        assert_eq!(c.level(), ViewLevel::TopLevel);
    }

    #[test]
    fn test_click_leaf_selects_without_navigation() {
        let nodes = vec![view("miles", 0.0, 0.0, 20.0, false)];
        let mut c = controller();

        let events = c.click(screen(3.0, 3.0), &nodes);
        assert_eq!(events, vec![InteractionEvent::LeafSelected { id: "miles".into() }]);
        assert_eq!(c.level(), ViewLevel::TopLevel);
        assert_eq!(c.selected(), Some("miles"));
    }

    #[test]
    fn test_background_click_while_drilled_only_deselects() {
        let genres = vec![view("jazz", 0.0, 0.0, 20.0, true)];
        let artists = vec![view("miles", 0.0, 0.0, 20.0, false)];
        let mut c = controller();
        c.click(screen(0.0, 0.0), &genres);
        c.click(screen(0.0, 0.0), &artists);

        let events = c.click(screen(90.0, 90.0), &artists);
        assert_eq!(events, vec![InteractionEvent::Deselected { id: "miles".into() }]);
        assert_eq!(c.level(), ViewLevel::Drilled { parent: "jazz".into() });

        assert!(c.click(screen(90.0, 90.0), &artists).is_empty());
    }

    #[test]
    fn test_click_respects_camera() {
        let nodes = vec![view("a", 0.0, 0.0, 10.0, false)];
        let mut c = controller();
        c.camera_mut().pan(DVec2::new(300.0, 0.0));

        assert!(c.click(screen(0.0, 0.0), &nodes).is_empty());
        assert_eq!(c.click(screen(300.0, 0.0), &nodes).len(), 1);
    }

    #[test]
    fn test_vanished_nodes_are_no_hit() {
        let nodes = vec![view("a", 0.0, 0.0, 10.0, false)];
        let mut c = controller();
        c.pointer_move(screen(0.0, 0.0), &nodes);
        c.click(screen(0.0, 0.0), &nodes);

        let events = c.retain_visible(&[]);
        assert_eq!(
            events,
            vec![
                InteractionEvent::HoverLeave { id: "a".into() },
                InteractionEvent::Deselected { id: "a".into() },
            ]
        );
        assert!(c.pointer_move(screen(0.0, 0.0), &[]).is_empty());
    }
}
