//! Collision geometry: shapes, closest points, and reflection.
//!
//! Contact normals are approximated as the vector from the nearest point on
//! the obstacle to the projectile's center. Obstacles are small and convex
//! relative to a wave's path, so this is close enough for gameplay.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Collision shape, centered on the owning entity's position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Circle with the given radius.
    Circle {
        /// Radius in world units.
        radius: f32,
    },
    /// Axis-aligned rectangle.
    Rect {
        /// Half width and half height.
        half_extents: Vec2,
    },
}

impl Shape {
    /// Creates a circle shape.
    #[must_use]
    pub const fn circle(radius: f32) -> Self {
        Self::Circle { radius }
    }

    /// Creates an axis-aligned rectangle from its full size.
    #[must_use]
    pub fn rect(size: Vec2) -> Self {
        Self::Rect {
            half_extents: size * 0.5,
        }
    }

    /// Largest distance from the center to any point of the shape.
    ///
    /// Used to size broad-phase spatial queries.
    #[must_use]
    pub fn extent(&self) -> f32 {
        match *self {
            Self::Circle { radius } => radius,
            Self::Rect { half_extents } => half_extents.length(),
        }
    }

    /// Nearest point on (or inside) the shape to `point`.
    ///
    /// Points inside the shape map to themselves.
    #[must_use]
    pub fn closest_point(&self, center: Vec2, point: Vec2) -> Vec2 {
        match *self {
            Self::Circle { radius } => {
                let offset = point - center;
                if offset.length_squared() <= radius * radius {
                    point
                } else {
                    center + offset.normalize_or_zero() * radius
                }
            }
            Self::Rect { half_extents } => {
                let local = (point - center).clamp(-half_extents, half_extents);
                center + local
            }
        }
    }

    /// Returns `true` if a circle of `radius` at `point` touches the shape.
    #[must_use]
    pub fn overlaps_circle(&self, center: Vec2, point: Vec2, radius: f32) -> bool {
        let nearest = self.closest_point(center, point);
        nearest.distance_squared(point) <= radius * radius
    }
}

/// Approximate outward contact normal between a shape and a moving point.
///
/// Falls back to the direction from the shape's center when the point is
/// inside the shape, and to `+X` when even that is degenerate.
#[must_use]
pub fn contact_normal(shape: &Shape, center: Vec2, point: Vec2) -> Vec2 {
    let nearest = shape.closest_point(center, point);
    let normal = (point - nearest).normalize_or_zero();
    if normal != Vec2::ZERO {
        return normal;
    }
    let from_center = (point - center).normalize_or_zero();
    if from_center == Vec2::ZERO {
        Vec2::X
    } else {
        from_center
    }
}

/// Mirrors `direction` about the surface with the given unit `normal`.
#[must_use]
pub fn reflect(direction: Vec2, normal: Vec2) -> Vec2 {
    direction - 2.0 * direction.dot(normal) * normal
}

/// Returns `true` if `direction` points into the surface.
///
/// Reflection is only applied while approaching so that an overlap that
/// lasts several ticks produces exactly one bounce.
#[must_use]
pub fn is_approaching(direction: Vec2, normal: Vec2) -> bool {
    direction.dot(normal) < 0.0
}

/// Heading angle in radians (counter-clockwise from `+X`) for a direction.
#[must_use]
pub fn heading_of(direction: Vec2) -> f32 {
    direction.y.atan2(direction.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn circle_closest_point_on_rim() {
        let shape = Shape::circle(2.0);
        let nearest = shape.closest_point(Vec2::ZERO, Vec2::new(5.0, 0.0));
        assert!((nearest - Vec2::new(2.0, 0.0)).length() < EPS);
    }

    #[test]
    fn rect_closest_point_clamps() {
        let shape = Shape::rect(Vec2::new(4.0, 2.0));
        let nearest = shape.closest_point(Vec2::ZERO, Vec2::new(5.0, 5.0));
        assert!((nearest - Vec2::new(2.0, 1.0)).length() < EPS);
    }

    #[test]
    fn overlap_uses_radius() {
        let shape = Shape::circle(1.0);
        assert!(shape.overlaps_circle(Vec2::ZERO, Vec2::new(1.4, 0.0), 0.5));
        assert!(!shape.overlaps_circle(Vec2::ZERO, Vec2::new(1.6, 0.0), 0.5));
    }

    #[test]
    fn reflect_mirrors_about_normal() {
        let reflected = reflect(Vec2::new(1.0, -1.0), Vec2::Y);
        assert!((reflected - Vec2::new(1.0, 1.0)).length() < EPS);
    }

    #[test]
    fn head_on_reflection_reverses() {
        let reflected = reflect(Vec2::X, -Vec2::X);
        assert!((reflected + Vec2::X).length() < EPS);
    }

    #[test]
    fn contact_normal_points_away_from_wall() {
        let wall = Shape::rect(Vec2::new(2.0, 10.0));
        let normal = contact_normal(&wall, Vec2::ZERO, Vec2::new(1.3, 0.0));
        assert!((normal - Vec2::X).length() < EPS);
    }

    #[test]
    fn contact_normal_degenerate_falls_back() {
        let normal = contact_normal(&Shape::circle(1.0), Vec2::ZERO, Vec2::ZERO);
        assert_eq!(normal, Vec2::X);
    }

    #[test]
    fn approaching_depends_on_sign() {
        assert!(is_approaching(Vec2::X, -Vec2::X));
        assert!(!is_approaching(Vec2::X, Vec2::X));
    }

    #[test]
    fn rect_extent_is_half_diagonal() {
        let shape = Shape::rect(Vec2::new(6.0, 8.0));
        assert!((shape.extent() - 5.0).abs() < EPS);
    }
}
