//! Support mapping over the Minkowski difference of two posed bodies.

use glam::{Affine2, Vec2};

use crate::api::SupportMap;
use crate::types::SupportPoint;
use crate::Body;

/// Pair support function. Built per pair test and dropped with it.
///
/// Directions are taken by value; callers keep their own search direction.
pub struct PairSupport<'a> {
    a: &'a Body,
    b: &'a Body,
    to_world_a: Affine2,
    to_world_b: Affine2,
    to_local_a: Affine2,
    to_local_b: Affine2,
    /// Query margin-shrunk core shapes instead of full hulls.
    pub use_core: bool,
    /// Inward shrink applied to body A when `use_core` is set.
    pub margin_a: f32,
    /// Inward shrink applied to body B when `use_core` is set.
    pub margin_b: f32,
}

impl<'a> PairSupport<'a> {
    pub fn new(a: &'a Body, b: &'a Body) -> Self {
        let to_world_a = a.transform();
        let to_world_b = b.transform();
        Self {
            a,
            b,
            to_world_a,
            to_world_b,
            to_local_a: to_world_a.inverse(),
            to_local_b: to_world_b.inverse(),
            use_core: false,
            margin_a: 0.0,
            margin_b: 0.0,
        }
    }

    fn farthest(&self, body: &Body, local_dir: Vec2, margin: f32) -> Vec2 {
        if self.use_core {
            body.geometry.farthest_core_point(local_dir, margin)
        } else {
            body.geometry.farthest_hull_point(local_dir)
        }
    }
}

impl SupportMap for PairSupport<'_> {
    fn support(&self, dir: Vec2) -> SupportPoint {
        let dir_a = self.to_local_a.transform_vector2(dir);
        let dir_b = -self.to_local_b.transform_vector2(dir);
        let a = self
            .to_world_a
            .transform_point2(self.farthest(self.a, dir_a, self.margin_a));
        let b = self
            .to_world_b
            .transform_point2(self.farthest(self.b, dir_b, self.margin_b));
        SupportPoint { a, b, pt: a - b }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Geometry;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_support_is_difference_of_witnesses() {
        let a = Body::new(Geometry::circle(1.0).unwrap(), Vec2::new(0.0, 0.0));
        let b = Body::new(Geometry::circle(2.0).unwrap(), Vec2::new(5.0, 0.0));
        let s = PairSupport::new(&a, &b);
        let p = s.support(Vec2::X);
        assert_abs_diff_eq!(p.a.x, 1.0, epsilon = 1e-6);
        // B is queried along -X: its leftmost point
        assert_abs_diff_eq!(p.b.x, 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.pt.x, -2.0, epsilon = 1e-6);
        assert_eq!(p.pt, p.a - p.b);
    }

    #[test]
    fn test_support_respects_orientation() {
        // 4x2 box rotated a quarter turn is tall in world space
        let a = Body::new(Geometry::rectangle(4.0, 2.0).unwrap(), Vec2::new(1.0, 1.0)).with_angle(FRAC_PI_2);
        let b = Body::new(Geometry::point(), Vec2::ZERO);
        let s = PairSupport::new(&a, &b);
        let p = s.support(Vec2::new(0.1, 1.0));
        assert_abs_diff_eq!(p.a.y, 3.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.a.x, 2.0, epsilon = 1e-5);
        assert_eq!(p.b, Vec2::ZERO);
    }

    #[test]
    fn test_core_toggle_and_margins() {
        let a = Body::new(Geometry::circle(3.0).unwrap(), Vec2::ZERO);
        let b = Body::new(Geometry::circle(3.0).unwrap(), Vec2::new(10.0, 0.0));
        let mut s = PairSupport::new(&a, &b);
        s.use_core = true;
        s.margin_a = 1.0;
        s.margin_b = 2.0;
        let p = s.support(Vec2::X);
        assert_abs_diff_eq!(p.a.x, 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.b.x, 9.0, epsilon = 1e-5);
    }
}
