//! GJK overlap / distance primitive for 2D support mappings.

use arrayvec::ArrayVec;
use glam::Vec2;

use crate::api::SupportMap;
use crate::types::SupportPoint;

/// Distance convergence tolerance (world units).
pub const GJK_ACCURACY: f32 = 1e-4;
/// Iteration budget before giving up.
pub const GJK_MAX_ITERATIONS: u32 = 100;
/// Squared distance under which the origin counts as touched.
const TOUCH_EPS_SQ: f32 = 1e-12;

/// Closest points on A and B (world space).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Witness {
    pub a: Vec2,
    pub b: Vec2,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GjkResult {
    pub overlap: bool,
    /// Separation distance; only set in distance mode for disjoint shapes.
    pub distance: Option<f32>,
    /// Closest points; set together with `distance`.
    pub closest: Option<Witness>,
    pub iterations: u32,
    /// The budget ran out; neither `overlap` nor `distance` is meaningful.
    pub max_iterations_reached: bool,
}

#[derive(Copy, Clone, Debug)]
struct Vertex {
    sp: SupportPoint,
    weight: f32,
}

#[derive(Default)]
struct Simplex {
    verts: ArrayVec<Vertex, 3>,
}

fn ratio(num: f32, den: f32) -> f32 {
    if den.abs() <= f32::MIN_POSITIVE { 0.0 } else { num / den }
}

impl Simplex {
    // solve() leaves at most two vertices unless the origin is enclosed,
    // and an enclosed simplex ends the search
    fn push(&mut self, sp: SupportPoint) {
        self.verts.push(Vertex { sp, weight: 0.0 });
    }

    fn contains(&self, pt: Vec2) -> bool {
        self.verts
            .iter()
            .any(|v| (v.sp.pt - pt).length_squared() <= TOUCH_EPS_SQ)
    }

    /// Closest point of the weighted simplex to the origin.
    fn closest(&self) -> Vec2 {
        self.verts.iter().map(|v| v.sp.pt * v.weight).sum()
    }

    fn witness(&self) -> Witness {
        let a = self.verts.iter().map(|v| v.sp.a * v.weight).sum();
        let b = self.verts.iter().map(|v| v.sp.b * v.weight).sum();
        Witness { a, b }
    }

    fn reduce_to_vertex(&mut self, i: usize) {
        let sp = self.verts[i].sp;
        self.verts.clear();
        self.verts.push(Vertex { sp, weight: 1.0 });
    }

    fn reduce_to_edge(&mut self, i: usize, j: usize, t: f32) {
        let (p, q) = (self.verts[i].sp, self.verts[j].sp);
        self.verts.clear();
        self.verts.push(Vertex { sp: p, weight: 1.0 - t });
        self.verts.push(Vertex { sp: q, weight: t });
    }

    /// Reduce to the feature nearest the origin and weight it.
    /// Returns `true` when the origin is enclosed.
    fn solve(&mut self) -> bool {
        match self.verts.len() {
            1 => {
                self.verts[0].weight = 1.0;
                false
            }
            2 => {
                self.solve_segment();
                false
            }
            3 => self.solve_triangle(),
            _ => false,
        }
    }

    fn solve_segment(&mut self) {
        let a = self.verts[0].sp.pt;
        let b = self.verts[1].sp.pt;
        let ab = b - a;
        let t = -a.dot(ab);
        if t <= 0.0 {
            self.reduce_to_vertex(0);
            return;
        }
        let denom = ab.length_squared();
        if t >= denom {
            self.reduce_to_vertex(1);
            return;
        }
        self.reduce_to_edge(0, 1, t / denom);
    }

    // Voronoi regions of the triangle with the origin as query point.
    fn solve_triangle(&mut self) -> bool {
        let a = self.verts[0].sp.pt;
        let b = self.verts[1].sp.pt;
        let c = self.verts[2].sp.pt;
        let ab = b - a;
        let ac = c - a;

        let d1 = ab.dot(-a);
        let d2 = ac.dot(-a);
        if d1 <= 0.0 && d2 <= 0.0 {
            self.reduce_to_vertex(0);
            return false;
        }

        let d3 = ab.dot(-b);
        let d4 = ac.dot(-b);
        if d3 >= 0.0 && d4 <= d3 {
            self.reduce_to_vertex(1);
            return false;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            self.reduce_to_edge(0, 1, ratio(d1, d1 - d3));
            return false;
        }

        let d5 = ab.dot(-c);
        let d6 = ac.dot(-c);
        if d6 >= 0.0 && d5 <= d6 {
            self.reduce_to_vertex(2);
            return false;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            self.reduce_to_edge(0, 2, ratio(d2, d2 - d6));
            return false;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            self.reduce_to_edge(1, 2, ratio(d4 - d3, (d4 - d3) + (d5 - d6)));
            return false;
        }

        let sum = va + vb + vc;
        if sum.abs() <= f32::MIN_POSITIVE {
            // Collinear triangle: fall back to its first edge
            self.verts.truncate(2);
            self.solve_segment();
            return false;
        }
        let v = vb / sum;
        let w = vc / sum;
        self.verts[0].weight = 1.0 - v - w;
        self.verts[1].weight = v;
        self.verts[2].weight = w;
        true
    }
}

/// Run GJK on `support`, starting from `seed`.
///
/// With `overlap_only` the search stops as soon as a separating direction is
/// proven and no distance is reported. A zero seed falls back to +X.
pub fn gjk<S: SupportMap + ?Sized>(support: &S, seed: Vec2, overlap_only: bool) -> GjkResult {
    let dir = if seed.is_finite() && seed.length_squared() > 0.0 {
        seed
    } else {
        Vec2::X
    };

    let mut simplex = Simplex::default();
    simplex.push(support.support(dir));

    let mut iterations = 0;
    loop {
        iterations += 1;
        if iterations > GJK_MAX_ITERATIONS {
            log::trace!("gjk: no convergence after {} iterations", GJK_MAX_ITERATIONS);
            return GjkResult {
                iterations,
                max_iterations_reached: true,
                ..Default::default()
            };
        }

        let enclosed = simplex.solve();
        let v = simplex.closest();
        let vv = v.length_squared();
        if enclosed || vv <= TOUCH_EPS_SQ {
            return GjkResult {
                overlap: true,
                iterations,
                ..Default::default()
            };
        }

        let w = support.support(-v);
        let vw = v.dot(w.pt);
        if overlap_only && vw > 0.0 {
            // -v separates the origin from the difference
            return GjkResult {
                overlap: false,
                iterations,
                ..Default::default()
            };
        }

        let vlen = vv.sqrt();
        if vv - vw <= GJK_ACCURACY * vlen || simplex.contains(w.pt) {
            if overlap_only {
                // Within tolerance of touching and no separating axis found
                return GjkResult {
                    overlap: true,
                    iterations,
                    ..Default::default()
                };
            }
            return GjkResult {
                overlap: false,
                distance: Some(vlen),
                closest: Some(simplex.witness()),
                iterations,
                max_iterations_reached: false,
            };
        }

        simplex.push(w);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::support::PairSupport;
    use crate::{Body, Geometry};
    use approx::assert_abs_diff_eq;
    use std::cell::Cell;

    fn boxed(pos: Vec2, w: f32, h: f32) -> Body {
        Body::new(Geometry::rectangle(w, h).unwrap(), pos)
    }

    #[test]
    fn test_separated_boxes_distance_and_witnesses() {
        let a = boxed(Vec2::ZERO, 2.0, 2.0);
        let b = boxed(Vec2::new(5.0, 0.0), 2.0, 2.0);
        let s = PairSupport::new(&a, &b);
        let r = gjk(&s, a.pos - b.pos, false);
        assert!(!r.overlap);
        assert!(!r.max_iterations_reached);
        assert_abs_diff_eq!(r.distance.unwrap(), 3.0, epsilon = 1e-3);
        let w = r.closest.unwrap();
        assert_abs_diff_eq!(w.a.x, 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(w.b.x, 4.0, epsilon = 1e-3);
    }

    #[test]
    fn test_separated_circles_distance() {
        let a = Body::new(Geometry::circle(1.0).unwrap(), Vec2::ZERO);
        let b = Body::new(Geometry::circle(2.0).unwrap(), Vec2::new(3.0, 4.0));
        let s = PairSupport::new(&a, &b);
        let r = gjk(&s, a.pos - b.pos, false);
        assert!(!r.overlap);
        assert_abs_diff_eq!(r.distance.unwrap(), 2.0, epsilon = 1e-2);
        let w = r.closest.unwrap();
        assert_abs_diff_eq!(w.a.length(), 1.0, epsilon = 1e-2);
    }

    #[test]
    fn test_overlap_only_reports_no_distance() {
        let a = boxed(Vec2::ZERO, 2.0, 2.0);
        let b = boxed(Vec2::new(10.0, 3.0), 2.0, 2.0);
        let s = PairSupport::new(&a, &b);
        let r = gjk(&s, a.pos - b.pos, true);
        assert!(!r.overlap);
        assert!(r.distance.is_none());
        assert!(r.closest.is_none());
    }

    #[test]
    fn test_overlapping_boxes() {
        let a = boxed(Vec2::ZERO, 2.0, 2.0);
        let b = boxed(Vec2::new(1.5, 0.5), 2.0, 2.0);
        let s = PairSupport::new(&a, &b);
        assert!(gjk(&s, a.pos - b.pos, true).overlap);
        assert!(gjk(&s, a.pos - b.pos, false).overlap);
    }

    #[test]
    fn test_zero_seed_terminates() {
        let a = boxed(Vec2::new(2.0, 2.0), 2.0, 2.0);
        let b = Body::new(Geometry::circle(1.0).unwrap(), Vec2::new(2.0, 2.0));
        let s = PairSupport::new(&a, &b);
        let r = gjk(&s, Vec2::ZERO, true);
        assert!(r.overlap);
        assert!(r.iterations <= GJK_MAX_ITERATIONS);
    }

    /// Not a convex support function: each query returns the next point of
    /// a sequence creeping toward the origin along +Y, too slowly to converge.
    #[derive(Default)]
    pub(crate) struct Receding {
        calls: Cell<u32>,
    }

    impl SupportMap for Receding {
        fn support(&self, _dir: Vec2) -> SupportPoint {
            let k = self.calls.get();
            self.calls.set(k + 1);
            let pt = Vec2::new(0.0, 1000.0 / (k + 1) as f32);
            SupportPoint { a: pt, b: Vec2::ZERO, pt }
        }
    }

    #[test]
    fn test_iteration_budget_is_bounded() {
        let r = gjk(&Receding::default(), Vec2::Y, false);
        assert!(r.max_iterations_reached);
        assert!(!r.overlap);
        assert!(r.distance.is_none());
        assert!(r.closest.is_none());
        assert_eq!(r.iterations, GJK_MAX_ITERATIONS + 1);

        // Overlap-only runs still find the separating direction right away
        let r = gjk(&Receding::default(), Vec2::Y, true);
        assert!(!r.overlap);
        assert!(!r.max_iterations_reached);
    }
}
