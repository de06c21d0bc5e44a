//! bonk-detect: narrow-phase collision detection for 2D rigid bodies
//! (convex GJK with rounded-core penetration, circle fast path, event-driven orchestration)

pub mod types;
pub mod api;
pub mod error;
pub mod config;
pub mod geometry;
pub mod support;
pub mod gjk;
pub mod narrowphase;
pub mod bus;
pub mod detector;
pub mod world;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::{ConfigError, GeometryError};
pub use crate::config::{CheckMode, DetectorConfig};
pub use crate::geometry::{ConvexPolygon, Geometry, GeometryKind};
pub use crate::bus::{EventBus, SubscriberId};
pub use crate::detector::BodyCollisionDetection;
pub use crate::narrowphase::{Narrowphase, PairOutcome};
pub use crate::world::World;
use glam::{Affine2, Vec2};

/// Channel the broad phase publishes candidate batches on.
pub const CANDIDATES_CHANNEL: &str = "collisions:candidates";
/// Channel collision batches are published on by default.
pub const DETECTED_CHANNEL: &str = "collisions:detected";
/// Channel carrying the per-step velocity integration notification.
pub const STEP_CHANNEL: &str = "integrate:velocities";

/// Stable handle of a body inside a [`BodySet`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u32);

/// Rigid body state as seen by detection (read-only during a check).
#[derive(Clone, Debug)]
pub struct Body {
    pub pos: Vec2,
    /// Orientation in radians.
    pub angle: f32,
    /// Immovable. Two fixed bodies are never tested against each other.
    pub fixed: bool,
    pub geometry: Geometry,
}

impl Body {
    pub fn new(geometry: Geometry, pos: Vec2) -> Self {
        Self {
            pos,
            angle: 0.0,
            fixed: false,
            geometry,
        }
    }

    /// Builder: set orientation.
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Builder: mark immovable.
    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Local-to-world transform.
    pub fn transform(&self) -> Affine2 {
        Affine2::from_angle_translation(self.angle, self.pos)
    }

    /// World-space bounding box.
    pub fn aabb(&self) -> Aabb {
        self.geometry.aabb(self.angle).translated(self.pos)
    }
}

/// Bodies owned by the world, addressed by [`BodyId`].
#[derive(Clone, Debug, Default)]
pub struct BodySet {
    bodies: Vec<Body>,
}

impl BodySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, body: Body) -> BodyId {
        let id = BodyId(self.bodies.len() as u32);
        self.bodies.push(body);
        id
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Bodies in insertion order with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(i, b)| (BodyId(i as u32), b))
    }
}

impl FromIterator<Body> for BodySet {
    fn from_iter<I: IntoIterator<Item = Body>>(iter: I) -> Self {
        Self {
            bodies: iter.into_iter().collect(),
        }
    }
}
