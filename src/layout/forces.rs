//! Force passes over the simulation nodes.
//!
//! Soft forces (anchor, repulsion, links) accumulate into velocities and are
//! scaled by alpha. Collision and enclosure act on positions directly and
//! are not scaled, so they keep working after the layout has settled.

use super::{LayoutConfig, SimulationNode};
use crate::aggregate::Link;
use glam::DVec2;

/// Golden angle in radians, used to pick separation directions for
/// coincident nodes.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Distance floor for the inverse-square repulsion.
const MIN_REPULSION_DISTANCE: f64 = 4.0;

/// Ease radii and hover scales toward their targets.
pub fn ease(nodes: &mut [SimulationNode], config: &LayoutConfig) {
    for node in nodes {
        node.radius += (node.target_radius - node.radius) * config.radius_easing;
        node.hover_scale += (node.target_hover_scale - node.hover_scale) * config.hover_easing;
        if node.spawning && node.radius >= node.target_radius * 0.98 {
            node.spawning = false;
        }
    }
}

/// Pull every node toward its target position.
pub fn anchor(nodes: &mut [SimulationNode], strength: f64, alpha: f64) {
    let k = strength * alpha;
    for node in nodes {
        node.velocity += (node.target - node.position) * k;
    }
}

/// Weak inverse-square push between all pairs.
pub fn repel(nodes: &mut [SimulationNode], strength: f64, alpha: f64) {
    let k = strength * alpha;
    if k <= 0.0 {
        return;
    }
    let n = nodes.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let delta = nodes[i].position - nodes[j].position;
            let dist = delta.length().max(MIN_REPULSION_DISTANCE);
            let push = delta.normalize_or_zero() * (k / (dist * dist));
            nodes[i].velocity += push;
            nodes[j].velocity -= push;
        }
    }
}

/// Springs between linked nodes. Only pulls, never pushes: collision
/// already handles spacing.
pub fn link(nodes: &mut [SimulationNode], links: &[Link], config: &LayoutConfig, alpha: f64) {
    let k = config.link_strength * alpha;
    if k <= 0.0 {
        return;
    }
    for l in links {
        if l.source >= nodes.len() || l.target >= nodes.len() || l.source == l.target {
            continue;
        }
        let delta = nodes[l.target].position - nodes[l.source].position;
        let dist = delta.length();
        let rest = nodes[l.source].effective_radius()
            + nodes[l.target].effective_radius()
            + config.collision_margin;
        if dist <= rest {
            continue;
        }
        let pull = delta.normalize_or_zero() * ((dist - rest) * k * l.weight * 0.5);
        nodes[l.source].velocity += pull;
        nodes[l.target].velocity -= pull;
    }
}

/// Apply velocity decay and move every node.
pub fn integrate(nodes: &mut [SimulationNode], velocity_decay: f64) {
    let keep = (1.0 - velocity_decay).clamp(0.0, 1.0);
    for node in nodes {
        node.velocity *= keep;
        if !node.velocity.is_finite() {
            node.velocity = DVec2::ZERO;
        }
        node.position += node.velocity;
    }
}

/// Position relaxation: push overlapping pairs apart until
/// `|pi - pj| >= ri + rj + margin`.
///
/// The overlap is split inversely by area, so a small circle yields to a
/// big one.
pub fn collide(nodes: &mut [SimulationNode], config: &LayoutConfig) {
    let n = nodes.len();
    for _ in 0..config.collision_iterations {
        let mut moved = false;
        for i in 0..n {
            for j in (i + 1)..n {
                let ri = nodes[i].effective_radius();
                let rj = nodes[j].effective_radius();
                let min_dist = ri + rj + config.collision_margin;
                let delta = nodes[j].position - nodes[i].position;
                let dist = delta.length();
                if dist >= min_dist {
                    continue;
                }

                let dir = if dist > 1e-9 {
                    delta / dist
                } else {
                    #[allow(clippy::cast_precision_loss)]
                    let angle = (i * n + j) as f64 * GOLDEN_ANGLE;
                    DVec2::from_angle(angle)
                };

                let (ai, aj) = (ri * ri, rj * rj);
                let (wi, wj) = if ai + aj > 0.0 {
                    (aj / (ai + aj), ai / (ai + aj))
                } else {
                    (0.5, 0.5)
                };

                let shift = (min_dist - dist) * config.collision_strength;
                nodes[i].position -= dir * (shift * wi);
                nodes[j].position += dir * (shift * wj);
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
}

/// Hard clamp into the container disk of radius `container`.
///
/// A node poking out is moved back to `(R - r) * p / |p|`; its outward
/// radial velocity is removed and the rest damped.
pub fn enclose(nodes: &mut [SimulationNode], container: f64, damping: f64) {
    for node in nodes {
        let limit = container - node.effective_radius();
        if limit <= 0.0 {
            node.position = DVec2::ZERO;
            node.velocity = DVec2::ZERO;
            continue;
        }

        let dist = node.position.length();
        if dist <= limit {
            continue;
        }

        let normal = node.position / dist;
        node.position = normal * limit;
        let radial = node.velocity.dot(normal);
        if radial > 0.0 {
            node.velocity -= normal * radial;
        }
        node.velocity *= damping;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::NEUTRAL;

    fn node_at(x: f64, y: f64, radius: f64) -> SimulationNode {
        SimulationNode {
            id: format!("{x},{y}"),
            name: String::new(),
            count: 1,
            color: NEUTRAL,
            has_children: false,
            position: DVec2::new(x, y),
            velocity: DVec2::ZERO,
            target: DVec2::ZERO,
            target_radius: radius,
            radius,
            hover_scale: 1.0,
            target_hover_scale: 1.0,
            spawning: false,
        }
    }

    #[test]
    fn test_collide_separates_overlapping_pair() {
        let config = LayoutConfig {
            collision_strength: 1.0,
            collision_iterations: 1,
            ..LayoutConfig::default()
        };
        let mut nodes = vec![node_at(0.0, 0.0, 10.0), node_at(5.0, 0.0, 10.0)];
        collide(&mut nodes, &config);

        let gap = nodes[0].position.distance(nodes[1].position);
        assert!(gap >= 20.0 + config.collision_margin - 1e-9);
    }

    #[test]
    fn test_collide_moves_small_node_more() {
        let config = LayoutConfig {
            collision_strength: 1.0,
            ..LayoutConfig::default()
        };
        let mut nodes = vec![node_at(0.0, 0.0, 30.0), node_at(10.0, 0.0, 5.0)];
        collide(&mut nodes, &config);

        let big_shift = nodes[0].position.length();
        let small_shift = nodes[1].position.distance(DVec2::new(10.0, 0.0));
        assert!(small_shift > big_shift * 10.0);
    }

    #[test]
    fn test_collide_splits_coincident_nodes() {
        let config = LayoutConfig::default();
        let mut nodes = vec![node_at(0.0, 0.0, 5.0), node_at(0.0, 0.0, 5.0)];
        collide(&mut nodes, &config);
        assert!(nodes[0].position.distance(nodes[1].position) > 0.0);
    }

    #[test]
    fn test_enclose_clamps_and_strips_outward_velocity() {
        let mut nodes = vec![node_at(150.0, 0.0, 10.0)];
        nodes[0].velocity = DVec2::new(5.0, 3.0);
        enclose(&mut nodes, 100.0, 0.5);

        assert!((nodes[0].position.x - 90.0).abs() < 1e-9);
        assert_eq!(nodes[0].velocity.x, 0.0);
        assert!((nodes[0].velocity.y - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_enclose_centers_node_larger_than_container() {
        let mut nodes = vec![node_at(3.0, 4.0, 200.0)];
        enclose(&mut nodes, 100.0, 0.5);
        assert_eq!(nodes[0].position, DVec2::ZERO);
    }

    #[test]
    fn test_link_pulls_distant_nodes_together() {
        let config = LayoutConfig::default();
        let mut nodes = vec![node_at(-100.0, 0.0, 5.0), node_at(100.0, 0.0, 5.0)];
        let links = [Link { source: 0, target: 1, weight: 1.0 }];
        link(&mut nodes, &links, &config, 1.0);

        assert!(nodes[0].velocity.x > 0.0);
        assert!(nodes[1].velocity.x < 0.0);
    }

    #[test]
    fn test_repel_pushes_apart() {
        let mut nodes = vec![node_at(-10.0, 0.0, 1.0), node_at(10.0, 0.0, 1.0)];
        repel(&mut nodes, 100.0, 1.0);
        assert!(nodes[0].velocity.x < 0.0);
        assert!(nodes[1].velocity.x > 0.0);
    }
}
