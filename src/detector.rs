//! Body collision detection behavior: turns candidate pairs (or every step)
//! into published collision batches.

use std::collections::HashSet;

use crate::api::{Behavior, Bus};
use crate::config::{CheckMode, DetectorConfig};
use crate::narrowphase::{Narrowphase, PairOutcome};
use crate::types::*;
use crate::{Body, BodyId, BodySet, STEP_CHANNEL};

/// Narrow-phase orchestrator. Stateless between checks apart from the
/// counters of the last one.
#[derive(Debug, Default)]
pub struct BodyCollisionDetection {
    config: DetectorConfig,
    targets: Targets,
    /// Channel subscribed at attach time; detach releases exactly this one.
    attached: Option<String>,
    last_stats: DetectionStats,
}

impl BodyCollisionDetection {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Restrict detection to these bodies (default: every body in the world).
    /// Repeated ids are dropped, first occurrence wins.
    pub fn apply_to(mut self, targets: Targets) -> Self {
        self.set_targets(targets);
        self
    }

    pub fn set_targets(&mut self, targets: Targets) {
        self.targets = match targets {
            Targets::All => Targets::All,
            Targets::Only(ids) => {
                let mut seen = HashSet::with_capacity(ids.len());
                Targets::Only(ids.into_iter().filter(|id| seen.insert(*id)).collect())
            }
        };
    }

    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Channel currently listened on, if attached.
    pub fn attached_channel(&self) -> Option<&str> {
        self.attached.as_deref()
    }

    /// Counters of the last completed check.
    pub fn stats(&self) -> DetectionStats {
        self.last_stats
    }

    fn listen_channel(&self) -> &str {
        match &self.config.check {
            CheckMode::EveryStep => STEP_CHANNEL,
            CheckMode::Candidates(channel) => channel,
        }
    }

    /// Test the candidate pairs whose members are both targeted, in order.
    pub fn check(&mut self, bodies: &BodySet, batch: &CandidateBatch) -> Vec<CollisionRecord> {
        let mut stats = DetectionStats {
            pairs_considered: batch.candidates.len(),
            ..Default::default()
        };
        let targeted: Option<HashSet<BodyId>> = match &self.targets {
            Targets::All => None,
            Targets::Only(ids) => Some(ids.iter().copied().collect()),
        };

        let mut collisions = Vec::new();
        for pair in &batch.candidates {
            if let Some(set) = &targeted {
                if !(set.contains(&pair.body_a) && set.contains(&pair.body_b)) {
                    continue;
                }
            }
            let (Some(a), Some(b)) = (bodies.get(pair.body_a), bodies.get(pair.body_b)) else {
                log::warn!(
                    "candidate ({:?}, {:?}) names an unknown body; skipped",
                    pair.body_a,
                    pair.body_b
                );
                continue;
            };
            if let Some(rec) = test_counted(pair.body_a, a, pair.body_b, b, &mut stats) {
                collisions.push(rec);
            }
        }

        stats.collisions = collisions.len();
        self.last_stats = stats;
        collisions
    }

    /// Test every unordered pair of targeted bodies exactly once.
    pub fn check_all(&mut self, bodies: &BodySet) -> Vec<CollisionRecord> {
        let members: Vec<(BodyId, &Body)> = match &self.targets {
            Targets::All => bodies.iter().collect(),
            Targets::Only(ids) => ids
                .iter()
                .filter_map(|&id| match bodies.get(id) {
                    Some(b) => Some((id, b)),
                    None => {
                        log::warn!("target {:?} names an unknown body; skipped", id);
                        None
                    }
                })
                .collect(),
        };

        let n = members.len();
        let mut stats = DetectionStats {
            pairs_considered: n * n.saturating_sub(1) / 2,
            ..Default::default()
        };
        let mut collisions = Vec::new();
        for (j, &(id_a, a)) in members.iter().enumerate() {
            for &(id_b, b) in &members[j + 1..] {
                if let Some(rec) = test_counted(id_a, a, id_b, b, &mut stats) {
                    collisions.push(rec);
                }
            }
        }

        stats.collisions = collisions.len();
        self.last_stats = stats;
        collisions
    }

    fn publish(&self, collisions: Vec<CollisionRecord>, bus: &mut dyn Bus) {
        if collisions.is_empty() {
            return;
        }
        log::debug!(
            "publishing {} collision(s) on {}",
            collisions.len(),
            self.config.channel
        );
        bus.emit(&self.config.channel, Event::Collisions(CollisionBatch { collisions }));
    }
}

/// Run the pair dispatcher and keep count of what it decided.
fn test_counted(
    id_a: BodyId,
    a: &Body,
    id_b: BodyId,
    b: &Body,
    stats: &mut DetectionStats,
) -> Option<CollisionRecord> {
    stats.pairs_tested += 1;
    let outcome = Narrowphase::classify_pair(a, b);
    log::trace!("pair ({:?}, {:?}) -> {:?}", id_a, id_b, outcome);
    if outcome == PairOutcome::CoreOverlap {
        stats.core_overlaps += 1;
    }
    outcome.contact().map(|c| CollisionRecord::new(id_a, id_b, c))
}

impl Behavior for BodyCollisionDetection {
    fn attach(&mut self, bus: &mut dyn Bus) {
        if self.attached.is_some() {
            return;
        }
        let channel = self.listen_channel().to_string();
        bus.subscribe(&channel);
        self.attached = Some(channel);
    }

    fn detach(&mut self, bus: &mut dyn Bus) {
        if let Some(channel) = self.attached.take() {
            bus.unsubscribe(&channel);
        }
    }

    fn on_candidates(&mut self, bodies: &BodySet, batch: &CandidateBatch, bus: &mut dyn Bus) {
        if matches!(self.config.check, CheckMode::EveryStep) {
            return;
        }
        let collisions = self.check(bodies, batch);
        self.publish(collisions, bus);
    }

    fn on_step(&mut self, bodies: &BodySet, _dt: f32, bus: &mut dyn Bus) {
        if !matches!(self.config.check, CheckMode::EveryStep) {
            return;
        }
        let collisions = self.check_all(bodies);
        self.publish(collisions, bus);
    }
}
