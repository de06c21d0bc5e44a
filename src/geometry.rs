use glam::Vec2;

use crate::error::GeometryError;
use crate::types::Aabb;

/// Shape-kind tag used by the pair dispatcher.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    Circle,
    Rectangle,
    ConvexPolygon,
}

/// Convex body geometry in the body's local frame (origin = body position).
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// Mathematical point.
    Point,
    /// Centered circle.
    Circle { radius: f32 },
    /// Centered box (half extents along local X/Y).
    Rectangle { half_extents: Vec2 },
    ConvexPolygon(ConvexPolygon),
}

fn check_size(v: f32) -> Result<f32, GeometryError> {
    if v.is_finite() && v >= 0.0 {
        Ok(v)
    } else {
        Err(GeometryError::InvalidSize(v))
    }
}

impl Geometry {
    pub fn point() -> Self {
        Geometry::Point
    }

    pub fn circle(radius: f32) -> Result<Self, GeometryError> {
        Ok(Geometry::Circle {
            radius: check_size(radius)?,
        })
    }

    /// Box of the given full width and height.
    pub fn rectangle(width: f32, height: f32) -> Result<Self, GeometryError> {
        let half_extents = Vec2::new(check_size(width)?, check_size(height)?) * 0.5;
        Ok(Geometry::Rectangle { half_extents })
    }

    pub fn convex_polygon(vertices: Vec<Vec2>) -> Result<Self, GeometryError> {
        Ok(Geometry::ConvexPolygon(ConvexPolygon::new(vertices)?))
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point => GeometryKind::Point,
            Geometry::Circle { .. } => GeometryKind::Circle,
            Geometry::Rectangle { .. } => GeometryKind::Rectangle,
            Geometry::ConvexPolygon(_) => GeometryKind::ConvexPolygon,
        }
    }

    /// Radius for circles, `None` otherwise.
    pub fn radius(&self) -> Option<f32> {
        match self {
            Geometry::Circle { radius } => Some(*radius),
            _ => None,
        }
    }

    /// Bounds of the shape rotated by `angle`, relative to the body origin.
    pub fn aabb(&self, angle: f32) -> Aabb {
        match self {
            Geometry::Point => Aabb::new(Vec2::ZERO, Vec2::ZERO),
            Geometry::Circle { radius } => Aabb::new(Vec2::splat(-radius), Vec2::splat(*radius)),
            Geometry::Rectangle { .. } | Geometry::ConvexPolygon(_) => {
                let rot = Vec2::from_angle(angle);
                let unrot = Vec2::new(rot.x, -rot.y);
                // Extreme point along a world axis, in world orientation
                let extent = |axis: Vec2| rot.rotate(self.farthest_hull_point(unrot.rotate(axis)));
                let min = Vec2::new(extent(Vec2::NEG_X).x, extent(Vec2::NEG_Y).y);
                let max = Vec2::new(extent(Vec2::X).x, extent(Vec2::Y).y);
                Aabb::new(min, max)
            }
        }
    }

    /// Farthest point of the hull along `dir` (local frame).
    pub fn farthest_hull_point(&self, dir: Vec2) -> Vec2 {
        match self {
            Geometry::Point => Vec2::ZERO,
            Geometry::Circle { radius } => dir.normalize_or_zero() * *radius,
            Geometry::Rectangle { half_extents } => {
                let pick = |d: f32, h: f32| {
                    if d == 0.0 {
                        0.0
                    } else if d < 0.0 {
                        -h
                    } else {
                        h
                    }
                };
                Vec2::new(pick(dir.x, half_extents.x), pick(dir.y, half_extents.y))
            }
            Geometry::ConvexPolygon(poly) => poly.vertices[poly.farthest_vertex(dir)],
        }
    }

    /// Farthest point along `dir` of the hull shrunk inward by `margin`.
    /// Circles and boxes collapse to their center rather than inverting.
    pub fn farthest_core_point(&self, dir: Vec2, margin: f32) -> Vec2 {
        match self {
            Geometry::Point => Vec2::ZERO,
            Geometry::Circle { radius } => dir.normalize_or_zero() * (*radius - margin).max(0.0),
            Geometry::Rectangle { .. } => {
                let hull = self.farthest_hull_point(dir);
                let shrink = |v: f32| {
                    if v == 0.0 {
                        0.0
                    } else if v < 0.0 {
                        (v + margin).min(0.0)
                    } else {
                        (v - margin).max(0.0)
                    }
                };
                Vec2::new(shrink(hull.x), shrink(hull.y))
            }
            Geometry::ConvexPolygon(poly) => poly.core_vertex(poly.farthest_vertex(dir), margin),
        }
    }
}

/// Convex polygon, counter-clockwise, centered on its centroid.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexPolygon {
    vertices: Vec<Vec2>,
}

impl ConvexPolygon {
    /// Validates convexity, orients CCW and re-centers on the centroid.
    pub fn new(mut vertices: Vec<Vec2>) -> Result<Self, GeometryError> {
        let n = vertices.len();
        if n < 3 {
            return Err(GeometryError::TooFewVertices(n));
        }
        if let Some(v) = vertices.iter().find(|v| !v.is_finite()) {
            return Err(GeometryError::InvalidSize(if v.x.is_finite() { v.y } else { v.x }));
        }

        let signed_area = (0..n)
            .map(|i| vertices[i].perp_dot(vertices[(i + 1) % n]))
            .sum::<f32>()
            * 0.5;
        // Relative to the polygon's size so small shapes stay valid
        let extent_sq = vertices
            .iter()
            .map(|v| (*v - vertices[0]).length_squared())
            .fold(0.0f32, f32::max);
        if signed_area.abs() <= f32::EPSILON * extent_sq {
            return Err(GeometryError::Degenerate);
        }
        if signed_area < 0.0 {
            vertices.reverse();
        }

        for i in 0..n {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            let c = vertices[(i + 2) % n];
            if (b - a).perp_dot(c - b) < -1e-6 {
                return Err(GeometryError::NotConvex((i + 1) % n));
            }
        }

        // Area-weighted centroid over a triangle fan
        let area = signed_area.abs();
        let origin = vertices[0];
        let mut centroid = Vec2::ZERO;
        for i in 1..(n - 1) {
            let v1 = vertices[i];
            let v2 = vertices[i + 1];
            let tri_area = (v1 - origin).perp_dot(v2 - origin) * 0.5;
            centroid += (origin + v1 + v2) / 3.0 * tri_area;
        }
        centroid /= area;
        for v in &mut vertices {
            *v -= centroid;
        }

        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Index of the vertex with the largest projection on `dir` (first wins ties).
    fn farthest_vertex(&self, dir: Vec2) -> usize {
        let mut best = 0;
        let mut best_dot = self.vertices[0].dot(dir);
        for (i, v) in self.vertices.iter().enumerate().skip(1) {
            let d = v.dot(dir);
            if d > best_dot {
                best = i;
                best_dot = d;
            }
        }
        best
    }

    /// Vertex `idx` moved along the inward bisector so both adjacent edges sit `margin` inside.
    fn core_vertex(&self, idx: usize, margin: f32) -> Vec2 {
        let n = self.vertices.len();
        let v = self.vertices[idx];
        let next = self.vertices[(idx + 1) % n];
        let prev = self.vertices[(idx + n - 1) % n];
        let n_next = (next - v).perp().normalize_or_zero();
        let n_prev = (v - prev).perp().normalize_or_zero();
        let denom = 1.0 + n_next.dot(n_prev);
        if denom <= f32::EPSILON {
            return v;
        }
        v + (n_next + n_prev) * (margin / denom)
    }
}
