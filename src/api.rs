use glam::Vec2;

use crate::types::*;
use crate::{Body, BodySet};

/// Directional support query over a Minkowski difference, consumed by the GJK primitive.
pub trait SupportMap {
    /// Support point of `A - B` in world direction `dir`.
    fn support(&self, dir: Vec2) -> SupportPoint;
}

/// Pair-level narrowphase contract.
pub trait NarrowphaseApi {
    /// General convex test (GJK overlap + rounded-core penetration).
    fn test_convex(a: &Body, b: &Body) -> Option<Contact>;

    /// Closed-form circle/circle test.
    fn test_circles(a: &Body, b: &Body) -> Option<Contact>;

    /// Single dispatch point: rejects fixed/fixed pairs and picks the tester.
    fn test_pair(a: &Body, b: &Body) -> Option<Contact>;
}

/// Named-channel publish/subscribe surface handed to behaviors.
///
/// Subscriptions are recorded for the behavior the bus was handed to.
pub trait Bus {
    fn subscribe(&mut self, channel: &str);
    fn unsubscribe(&mut self, channel: &str);
    /// Publish an event; delivery happens after the current handler returns.
    fn emit(&mut self, channel: &str, event: Event);
}

/// Plugin attached to a world, reacting to bus notifications.
pub trait Behavior {
    /// Subscribe to the channels this behavior listens on.
    fn attach(&mut self, bus: &mut dyn Bus);

    /// Undo exactly what `attach` subscribed.
    fn detach(&mut self, bus: &mut dyn Bus);

    /// Candidate batch published by a broad phase.
    fn on_candidates(&mut self, _bodies: &BodySet, _batch: &CandidateBatch, _bus: &mut dyn Bus) {}

    /// Velocity integration step.
    fn on_step(&mut self, _bodies: &BodySet, _dt: f32, _bus: &mut dyn Bus) {}

    /// Collision batch published by a detector.
    fn on_collisions(&mut self, _bodies: &BodySet, _batch: &CollisionBatch, _bus: &mut dyn Bus) {}
}
