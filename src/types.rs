use glam::Vec2;

use crate::BodyId;

/// Axis-aligned bounds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// (halfWidth, halfHeight).
    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    pub fn translated(self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Closed-interval overlap (touching counts).
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// Minkowski-difference support point with its witnesses on each body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SupportPoint {
    /// Surface point on body A (world space).
    pub a: Vec2,
    /// Surface point on body B (world space).
    pub b: Vec2,
    /// `a - b`.
    pub pt: Vec2,
}

/// Contact measured by a pair tester.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Contact {
    /// Unit normal, pointing from body A toward body B.
    pub norm: Vec2,
    /// Minimum translation vector (`norm * overlap`).
    pub mtv: Vec2,
    /// Contact point relative to body A's position.
    pub pos: Vec2,
    /// Penetration depth (≥ 0).
    pub overlap: f32,
}

/// One detected collision, published inside a [`CollisionBatch`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CollisionRecord {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub norm: Vec2,
    pub mtv: Vec2,
    pub pos: Vec2,
    pub overlap: f32,
}

impl CollisionRecord {
    pub fn new(body_a: BodyId, body_b: BodyId, contact: Contact) -> Self {
        Self {
            body_a,
            body_b,
            norm: contact.norm,
            mtv: contact.mtv,
            pos: contact.pos,
            overlap: contact.overlap,
        }
    }
}

/// Collisions found in one check cycle (never published empty).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionBatch {
    pub collisions: Vec<CollisionRecord>,
}

/// Pair flagged by the broad phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub body_a: BodyId,
    pub body_b: BodyId,
}

impl Candidate {
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self { body_a, body_b }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandidateBatch {
    pub candidates: Vec<Candidate>,
}

impl FromIterator<Candidate> for CandidateBatch {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        Self {
            candidates: iter.into_iter().collect(),
        }
    }
}

/// Payloads carried on the bus.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Candidates(CandidateBatch),
    /// Velocity integration notification; `dt` is not used by detection.
    Step { dt: f32 },
    Collisions(CollisionBatch),
}

/// Bodies a behavior applies to.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Targets {
    /// Every body in the world (candidate filtering is skipped).
    #[default]
    All,
    Only(Vec<BodyId>),
}

/// Counters for the last completed check.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DetectionStats {
    /// Pairs received (candidate mode) or enumerated (all-pairs mode).
    pub pairs_considered: usize,
    /// Pairs that reached the pair dispatcher.
    pub pairs_tested: usize,
    pub collisions: usize,
    /// Convex pairs rejected because their cores never separated.
    pub core_overlaps: usize,
}

/// World-level configuration.
#[derive(Clone, Debug, Default)]
pub struct WorldConfig {
    /// Grid cell size for the built-in broad phase. `None` disables it and
    /// candidates must be published by the caller.
    pub cell_size: Option<f32>,
}
