//! # Spatial Mapping
//!
//! Turns a [`CategoryVector`] into a normalized map position and a display
//! color. Every category owns a fixed anchor on the unit circle and a fixed
//! anchor color; a vector maps to the weight-normalized centroid of the
//! anchors and the weight-normalized average of the colors.
//!
//! Because every anchor lies on the unit circle and weights are non-negative,
//! the resulting position is a convex combination and always lies inside the
//! unit disk.

use crate::classify::{Category, CategoryVector, CATEGORY_COUNT};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS-style hex string, e.g. `#1db954`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Color used when a vector carries no weight at all.
pub const NEUTRAL: Rgb = Rgb::new(128, 128, 128);

/// Anchor color per category, indexed like [`Category::ALL`].
const ANCHOR_COLORS: [Rgb; CATEGORY_COUNT] = [
    Rgb::new(236, 72, 153),  // pop: pink
    Rgb::new(220, 38, 38),   // rock: red
    Rgb::new(245, 158, 11),  // hip-hop: amber
    Rgb::new(59, 130, 246),  // electronic: blue
    Rgb::new(139, 92, 246),  // jazz: violet
    Rgb::new(34, 197, 94),   // folk: green
    Rgb::new(20, 184, 166),  // classical: teal
];

/// Anchor point of a category on the unit circle.
///
/// The first category sits at the top, the rest follow clockwise at even
/// spacing (screen coordinates, y grows downward).
#[must_use]
pub fn anchor(category: Category) -> DVec2 {
    #[allow(clippy::cast_precision_loss)]
    let step = TAU / CATEGORY_COUNT as f64;
    #[allow(clippy::cast_precision_loss)]
    let angle = -FRAC_PI_2 + step * category.index() as f64;
    DVec2::from_angle(angle)
}

/// Anchor color of a category.
#[must_use]
pub const fn anchor_color(category: Category) -> Rgb {
    ANCHOR_COLORS[category.index()]
}

/// Weight-normalized centroid of the category anchors.
#[must_use]
pub fn position(vector: &CategoryVector) -> DVec2 {
    let total = vector.total();
    if total <= 0.0 {
        return DVec2::ZERO;
    }

    vector
        .iter()
        .fold(DVec2::ZERO, |acc, (category, weight)| acc + anchor(category) * weight)
        / total
}

/// Weight-normalized average of the category anchor colors.
#[must_use]
pub fn color(vector: &CategoryVector) -> Rgb {
    let total = vector.total();
    if total <= 0.0 {
        return NEUTRAL;
    }

    let (r, g, b) = vector.iter().fold((0.0, 0.0, 0.0), |(r, g, b), (category, weight)| {
        let c = anchor_color(category);
        (
            r + f64::from(c.r) * weight,
            g + f64::from(c.g) * weight,
            b + f64::from(c.b) * weight,
        )
    });

    Rgb::new(channel(r / total), channel(g / total), channel(b / total))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;

    #[test]
    fn test_anchors_are_on_unit_circle() {
        for category in Category::ALL {
            let a = anchor(category);
            assert!((a.length() - 1.0).abs() < 1e-9, "{category} anchor off the circle");
        }
    }

    #[test]
    fn test_anchors_are_distinct() {
        for (i, a) in Category::ALL.iter().enumerate() {
            for b in &Category::ALL[i + 1..] {
                assert!(anchor(*a).distance(anchor(*b)) > 0.5);
            }
        }
    }

    #[test]
    fn test_single_category_maps_to_its_anchor() {
        let v = CategoryVector::new().with(Category::Jazz, 1.0);
        let p = position(&v);
        assert!(p.distance(anchor(Category::Jazz)) < 1e-9);
        assert_eq!(color(&v), anchor_color(Category::Jazz));
    }

    #[test]
    fn test_position_stays_inside_unit_disk() {
        let weights = [0.0, 0.1, 0.3, 0.5, 0.9, 1.0];
        for (i, &a) in weights.iter().enumerate() {
            for &b in &weights[i..] {
                for (x, &cx) in Category::ALL.iter().enumerate() {
                    let cy = Category::ALL[(x + 3) % CATEGORY_COUNT];
                    let v = CategoryVector::new().with(cx, a).with(cy, b);
                    if v.is_empty() {
                        continue;
                    }
                    assert!(position(&v).length() <= 1.0 + 1e-9);
                }
            }
        }

        for label in ["electropop", "jazz rap", "folk rock", "polka", "soundtrack"] {
            assert!(position(&classify(label)).length() <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn test_blend_lies_between_anchors() {
        let v = CategoryVector::new().with(Category::Pop, 0.5).with(Category::Rock, 0.5);
        let mid = (anchor(Category::Pop) + anchor(Category::Rock)) * 0.5;
        assert!(position(&v).distance(mid) < 1e-9);
    }

    #[test]
    fn test_empty_vector_is_neutral() {
        let v = CategoryVector::new();
        assert_eq!(position(&v), DVec2::ZERO);
        assert_eq!(color(&v), NEUTRAL);
    }

    #[test]
    fn test_hex_formatting() {
        assert_eq!(Rgb::new(29, 185, 84).to_hex(), "#1db954");
    }
}
