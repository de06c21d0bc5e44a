use glam::Vec2;

use crate::api::NarrowphaseApi;
use crate::geometry::GeometryKind;
use crate::gjk::{gjk, GjkResult};
use crate::support::PairSupport;
use crate::types::*;
use crate::Body;

/// Margin growth per iteration of the core search (world units).
pub const MARGIN_STEP: f32 = 1.0;

/// Outcome of a pair test, before collapsing to `Option`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PairOutcome {
    /// Both bodies are fixed; no geometry was tested.
    Ignored,
    /// Shapes do not touch.
    Separated,
    Contact(Contact),
    /// Hulls overlap but the shrunk cores never separated (or GJK gave up).
    /// Not resolved: reported as no collision.
    CoreOverlap,
}

impl PairOutcome {
    pub fn contact(self) -> Option<Contact> {
        match self {
            PairOutcome::Contact(c) => Some(c),
            _ => None,
        }
    }
}

/// Pair testers (stateless).
pub struct Narrowphase;

impl Narrowphase {
    /// Single dispatch point: picks the tester for the pair's shape kinds.
    /// New shape-pair fast paths go here.
    pub fn classify_pair(a: &Body, b: &Body) -> PairOutcome {
        // don't detect two fixed bodies
        if a.fixed && b.fixed {
            return PairOutcome::Ignored;
        }
        match (a.geometry.kind(), b.geometry.kind()) {
            (GeometryKind::Circle, GeometryKind::Circle) => match Self::test_circles(a, b) {
                Some(c) => PairOutcome::Contact(c),
                None => PairOutcome::Separated,
            },
            _ => Self::classify_convex(a, b),
        }
    }

    /// Convex test with the core-overlap case kept distinct from separation.
    pub fn classify_convex(a: &Body, b: &Body) -> PairOutcome {
        // Cheap hull check first
        let mut support = PairSupport::new(a, b);
        let seed = a.pos - b.pos;
        if let Some(outcome) = screen_hulls(&gjk(&support, seed, true)) {
            return outcome;
        }

        let cap_a = a.aabb().half_extents().min_element();
        let cap_b = b.aabb().half_extents().min_element();
        support.use_core = true;
        resolve_cores(a.pos, cap_a, cap_b, |margin_a, margin_b| {
            support.margin_a = margin_a;
            support.margin_b = margin_b;
            gjk(&support, seed, false)
        })
    }
}

/// Verdict of the full-hull overlap run, or `None` when the hulls touch and
/// the cores must be measured.
fn screen_hulls(hull: &GjkResult) -> Option<PairOutcome> {
    if hull.max_iterations_reached {
        log::debug!("hull test did not converge; pair left unresolved");
        Some(PairOutcome::CoreOverlap)
    } else if !hull.overlap {
        Some(PairOutcome::Separated)
    } else {
        None
    }
}

/// Shrink both cores until they stop touching, then turn the final distance
/// run into a contact. `query(margin_a, margin_b)` runs GJK on the cores.
fn resolve_cores(
    origin_a: Vec2,
    cap_a: f32,
    cap_b: f32,
    mut query: impl FnMut(f32, f32) -> GjkResult,
) -> PairOutcome {
    let (mut margin_a, mut margin_b) = (0.0f32, 0.0f32);
    let mut result = GjkResult {
        overlap: true,
        ..Default::default()
    };
    while result.overlap && (margin_a < cap_a || margin_b < cap_b) {
        if margin_a < cap_a {
            margin_a = (margin_a + MARGIN_STEP).min(cap_a);
        }
        if margin_b < cap_b {
            margin_b = (margin_b + MARGIN_STEP).min(cap_b);
        }
        result = query(margin_a, margin_b);
    }

    if result.overlap || result.max_iterations_reached {
        log::debug!(
            "core overlap at margins ({}, {}); pair left unresolved",
            margin_a,
            margin_b
        );
        return PairOutcome::CoreOverlap;
    }
    let (Some(distance), Some(closest)) = (result.distance, result.closest) else {
        return PairOutcome::CoreOverlap;
    };
    let norm = (closest.b - closest.a).normalize_or_zero();
    if norm == Vec2::ZERO {
        return PairOutcome::CoreOverlap;
    }

    let overlap = (margin_a + margin_b - distance).max(0.0);
    PairOutcome::Contact(Contact {
        norm,
        mtv: norm * overlap,
        // Hull point of A along the normal, relative to A
        pos: closest.a + norm * margin_a - origin_a,
        overlap,
    })
}

impl NarrowphaseApi for Narrowphase {
    fn test_convex(a: &Body, b: &Body) -> Option<Contact> {
        Self::classify_convex(a, b).contact()
    }

    fn test_circles(a: &Body, b: &Body) -> Option<Contact> {
        let (Some(ra), Some(rb)) = (a.geometry.radius(), b.geometry.radius()) else {
            return None;
        };
        let mut d = b.pos - a.pos;
        let overlap = d.length() - (ra + rb);

        // Concentric: any direction will do
        if d == Vec2::ZERO {
            d = Vec2::X;
        }

        if overlap <= 0.0 {
            let norm = d.normalize();
            Some(Contact {
                norm,
                mtv: norm * -overlap,
                pos: norm * ra,
                overlap: -overlap,
            })
        } else {
            None
        }
    }

    fn test_pair(a: &Body, b: &Body) -> Option<Contact> {
        Self::classify_pair(a, b).contact()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gjk::tests::Receding;
    use crate::gjk::{Witness, GJK_MAX_ITERATIONS};
    use crate::Geometry;
    use approx::assert_abs_diff_eq;

    fn circle(pos: Vec2, r: f32) -> Body {
        Body::new(Geometry::circle(r).unwrap(), pos)
    }

    fn rect(pos: Vec2, w: f32, h: f32) -> Body {
        Body::new(Geometry::rectangle(w, h).unwrap(), pos)
    }

    #[test]
    fn test_circles_overlap_law() {
        let cases = [
            (Vec2::new(3.0, 0.0), 2.0, 2.0),
            (Vec2::new(0.0, -1.5), 1.0, 1.0),
            (Vec2::new(2.0, 2.0), 3.0, 0.5),
            (Vec2::new(-4.0, 1.0), 1.0, 2.0),
        ];
        for (offset, r1, r2) in cases {
            let a = circle(Vec2::new(1.0, 1.0), r1);
            let b = circle(Vec2::new(1.0, 1.0) + offset, r2);
            let d = offset.length();
            let hit = Narrowphase::test_circles(&a, &b);
            if d < r1 + r2 {
                let c = hit.unwrap();
                assert_abs_diff_eq!(c.overlap, r1 + r2 - d, epsilon = 1e-5);
                assert_abs_diff_eq!(c.norm.length(), 1.0, epsilon = 1e-5);
                assert!(c.norm.dot(offset) > 0.0, "normal points from A to B");
                assert_abs_diff_eq!(c.mtv.length(), c.overlap, epsilon = 1e-5);
                assert_abs_diff_eq!(c.pos.length(), r1, epsilon = 1e-5);
            } else {
                assert!(hit.is_none());
            }
        }
    }

    #[test]
    fn test_concentric_circles_use_fallback_normal() {
        let a = circle(Vec2::new(2.0, 2.0), 1.0);
        let b = circle(Vec2::new(2.0, 2.0), 1.0);
        let c = Narrowphase::test_circles(&a, &b).unwrap();
        assert_eq!(c.norm, Vec2::X);
        assert_abs_diff_eq!(c.overlap, 2.0, epsilon = 1e-6);
        assert_eq!(c.pos, Vec2::X);
    }

    #[test]
    fn test_fixed_pair_never_collides() {
        let a = circle(Vec2::ZERO, 2.0).fixed();
        let b = circle(Vec2::new(1.0, 0.0), 2.0).fixed();
        assert!(Narrowphase::test_circles(&a, &b).is_some());
        assert!(Narrowphase::test_pair(&a, &b).is_none());
        assert_eq!(Narrowphase::classify_pair(&a, &b), PairOutcome::Ignored);

        let c = rect(Vec2::ZERO, 4.0, 4.0).fixed();
        let d = rect(Vec2::new(1.0, 0.0), 4.0, 4.0).fixed();
        assert!(Narrowphase::test_pair(&c, &d).is_none());

        // One movable body is enough to test
        let e = circle(Vec2::new(1.0, 0.0), 2.0);
        assert!(Narrowphase::test_pair(&a, &e).is_some());
    }

    #[test]
    fn test_disjoint_convex_rejected() {
        let a = rect(Vec2::ZERO, 2.0, 2.0);
        let b = rect(Vec2::new(5.0, 0.5), 2.0, 2.0);
        assert!(!a.aabb().overlaps(&b.aabb()));
        assert_eq!(Narrowphase::classify_convex(&a, &b), PairOutcome::Separated);
        assert!(Narrowphase::test_pair(&a, &b).is_none());
    }

    #[test]
    fn test_overlapping_boxes_measure_penetration() {
        // 10x10 boxes overlapping by 2 along X
        let a = rect(Vec2::ZERO, 10.0, 10.0);
        let b = rect(Vec2::new(8.0, 0.0), 10.0, 10.0);
        let c = Narrowphase::test_pair(&a, &b).unwrap();
        assert_abs_diff_eq!(c.overlap, 2.0, epsilon = 1e-2);
        assert_abs_diff_eq!(c.norm.x, 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(c.norm.y, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(c.mtv.x, c.overlap, epsilon = 1e-3);
        // Contact lies on A's right face
        assert_abs_diff_eq!(c.pos.x, 5.0, epsilon = 1e-2);
        assert!(c.overlap >= 0.0);
    }

    #[test]
    fn test_circle_against_box_uses_convex_path() {
        let a = circle(Vec2::new(-5.5, 0.0), 3.0);
        let b = rect(Vec2::ZERO, 10.0, 10.0);
        let c = Narrowphase::test_pair(&a, &b).unwrap();
        assert_abs_diff_eq!(c.overlap, 2.5, epsilon = 5e-2);
        assert!(c.norm.x > 0.99);
    }

    #[test]
    fn test_pair_is_idempotent() {
        let a = rect(Vec2::ZERO, 6.0, 4.0).with_angle(0.3);
        let b = circle(Vec2::new(4.0, 0.0), 2.0);
        let first = Narrowphase::test_pair(&a, &b);
        let second = Narrowphase::test_pair(&a, &b);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_triangle_against_box() {
        let tri = Body::new(
            Geometry::convex_polygon(vec![
                Vec2::new(-4.0, 0.0),
                Vec2::new(4.0, 0.0),
                Vec2::new(0.0, 4.0),
            ])
            .unwrap(),
            Vec2::ZERO,
        );
        // Floor whose top face cuts 0.5 into the triangle's base
        let top_of_base = tri.aabb().min.y;
        let floor = rect(Vec2::new(0.0, top_of_base + 0.5 - 5.0), 40.0, 10.0);
        let c = Narrowphase::test_pair(&tri, &floor).unwrap();
        assert_abs_diff_eq!(c.overlap, 0.5, epsilon = 1e-2);
        assert_abs_diff_eq!(c.norm.y, -1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_core_overlap_yields_none() {
        // Coincident 2x2 boxes: at the cap of 1 both cores collapse onto
        // the same point and still touch.
        let a = rect(Vec2::new(1.0, 1.0), 2.0, 2.0);
        let b = rect(Vec2::new(1.0, 1.0), 2.0, 2.0);
        assert_eq!(Narrowphase::classify_convex(&a, &b), PairOutcome::CoreOverlap);
        assert!(Narrowphase::test_pair(&a, &b).is_none());

        let p = Body::new(
            Geometry::convex_polygon(vec![
                Vec2::new(-3.0, -3.0),
                Vec2::new(3.0, -3.0),
                Vec2::new(3.0, 3.0),
                Vec2::new(-3.0, 3.0),
            ])
            .unwrap(),
            Vec2::ZERO,
        );
        let q = p.clone();
        assert!(Narrowphase::test_pair(&p, &q).is_none());
    }

    #[test]
    fn test_core_search_clamps_margins_and_measures_contact() {
        let mut margins = Vec::new();
        let outcome = resolve_cores(Vec2::new(1.0, 0.0), 1.5, 3.0, |ma, mb| {
            margins.push((ma, mb));
            if margins.len() < 2 {
                return GjkResult {
                    overlap: true,
                    ..Default::default()
                };
            }
            GjkResult {
                distance: Some(1.0),
                closest: Some(Witness {
                    a: Vec2::new(2.0, 0.0),
                    b: Vec2::new(3.0, 0.0),
                }),
                ..Default::default()
            }
        });
        assert_eq!(margins, vec![(1.0, 1.0), (1.5, 2.0)]);
        let c = outcome.contact().unwrap();
        assert_abs_diff_eq!(c.overlap, 2.5, epsilon = 1e-6);
        assert_eq!(c.norm, Vec2::X);
        assert_eq!(c.mtv, Vec2::new(2.5, 0.0));
        // Witness on A's core pushed back out by A's capped margin
        assert_abs_diff_eq!(c.pos.x, 2.5, epsilon = 1e-6);
    }

    #[test]
    fn test_non_converging_core_search_is_core_overlap() {
        let mut runs = 0;
        let outcome = resolve_cores(Vec2::ZERO, 5.0, 5.0, |_, _| {
            runs += 1;
            let r = gjk(&Receding::default(), Vec2::Y, false);
            assert!(r.max_iterations_reached);
            r
        });
        assert_eq!(outcome, PairOutcome::CoreOverlap);
        // A failed run ends the search; margins are not grown further
        assert_eq!(runs, 1);
    }

    #[test]
    fn test_non_converging_hull_test_is_core_overlap() {
        let stalled = GjkResult {
            iterations: GJK_MAX_ITERATIONS + 1,
            max_iterations_reached: true,
            ..Default::default()
        };
        assert_eq!(screen_hulls(&stalled), Some(PairOutcome::CoreOverlap));
        assert_eq!(screen_hulls(&GjkResult::default()), Some(PairOutcome::Separated));
        let touching = GjkResult {
            overlap: true,
            ..Default::default()
        };
        assert_eq!(screen_hulls(&touching), None);
    }
}
