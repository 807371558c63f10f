//! Container and node radius sizing.
//!
//! - Node area (not radius) is proportional to track count.
//! - A global node scale shrinks every circle as the number of nodes grows,
//!   so five genres render much larger than a hundred and fifty.
//! - The container grows with screen size and with the visual mass of the
//!   active set, so a ten-track playlist does not float in a huge empty disk.

use serde::{Deserialize, Serialize};

/// Sizing tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Share of the half-viewport the container may occupy
    pub container_margin: f64,
    /// Smallest container fill for very sparse sets
    pub min_fill: f64,
    /// Visual mass at which the container reaches full size
    pub reference_mass: f64,
    /// Radius of the largest node at node scale 1, as a share of the container
    pub base_radius: f64,
    /// Node count at which node scale is 1
    pub reference_nodes: f64,
    pub min_node_scale: f64,
    pub max_node_scale: f64,
    /// Radius floor in pixels
    pub min_radius: f64,
    /// Radius ceiling as a share of the container radius
    pub max_radius_fraction: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            container_margin: 0.92,
            min_fill: 0.45,
            reference_mass: 150.0,
            base_radius: 0.16,
            reference_nodes: 20.0,
            min_node_scale: 0.3,
            max_node_scale: 1.6,
            min_radius: 4.0,
            max_radius_fraction: 0.3,
        }
    }
}

/// Visual mass of a node set: the sum of the square roots of the counts.
#[must_use]
pub fn visual_mass(counts: impl IntoIterator<Item = usize>) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    counts.into_iter().map(|c| (c as f64).sqrt()).sum()
}

/// Container radius for a viewport and the visual mass it has to hold.
#[must_use]
pub fn container_radius(width: f64, height: f64, mass: f64, config: &SizingConfig) -> f64 {
    let half = width.min(height).max(0.0) / 2.0 * config.container_margin;
    let fill = if config.reference_mass > 0.0 {
        (mass.max(0.0) / config.reference_mass).sqrt()
    } else {
        1.0
    };
    half * fill.clamp(config.min_fill, 1.0)
}

/// Global node scale, inversely related to the number of nodes.
#[must_use]
pub fn node_scale(node_count: usize, config: &SizingConfig) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let n = node_count.max(1) as f64;
    (config.reference_nodes / n)
        .sqrt()
        .clamp(config.min_node_scale, config.max_node_scale)
}

/// Target radius of a node.
///
/// Proportional to `sqrt(count / max_count)`, scaled by the container and the
/// node scale, then clamped to `[min_radius, container * max_radius_fraction]`.
#[must_use]
pub fn target_radius(
    count: usize,
    max_count: usize,
    node_count: usize,
    container: f64,
    config: &SizingConfig,
) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let share = if max_count == 0 {
        0.0
    } else {
        (count as f64 / max_count as f64).sqrt()
    };
    let ceiling = (container * config.max_radius_fraction).max(config.min_radius);
    let raw = container * config.base_radius * node_scale(node_count, config) * share;
    raw.clamp(config.min_radius, ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_proportional_to_count() {
        let config = SizingConfig {
            min_radius: 0.0,
            max_radius_fraction: 1.0,
            ..SizingConfig::default()
        };
        let r1 = target_radius(25, 100, 20, 400.0, &config);
        let r4 = target_radius(100, 100, 20, 400.0, &config);
        assert!((r4 / r1 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_fewer_nodes_render_larger() {
        let config = SizingConfig::default();
        let few = target_radius(50, 100, 5, 400.0, &config);
        let many = target_radius(50, 100, 150, 400.0, &config);
        assert!(few > many * 2.0);
    }

    #[test]
    fn test_radius_floor_and_ceiling() {
        let config = SizingConfig::default();
        assert_eq!(target_radius(0, 100, 150, 400.0, &config), config.min_radius);
        assert_eq!(target_radius(1, 1_000_000, 150, 400.0, &config), config.min_radius);

        let huge = target_radius(100, 100, 1, 400.0, &config);
        assert!(huge <= 400.0 * config.max_radius_fraction + 1e-9);
    }

    #[test]
    fn test_container_scales_with_viewport_and_mass() {
        let config = SizingConfig::default();
        let sparse = container_radius(800.0, 600.0, 5.0, &config);
        let dense = container_radius(800.0, 600.0, 10_000.0, &config);
        assert!(sparse < dense);
        assert!((dense - 300.0 * config.container_margin).abs() < 1e-9);
        assert!((sparse - dense * config.min_fill).abs() < 1e-9);

        let small_screen = container_radius(400.0, 300.0, 10_000.0, &config);
        assert!(small_screen < dense);
    }

    #[test]
    fn test_visual_mass() {
        assert!((visual_mass([4, 9, 16]) - 9.0).abs() < 1e-12);
        assert_eq!(visual_mass(Vec::<usize>::new()), 0.0);
    }
}
