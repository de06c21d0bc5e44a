use std::collections::{HashMap, HashSet};

use crate::api::Behavior;
use crate::bus::{EventBus, SubscriberId};
use crate::types::*;
use crate::{Body, BodyId, BodySet, CANDIDATES_CHANNEL, STEP_CHANNEL};

/// Body container plus the behaviors listening on its event bus.
pub struct World {
    pub cfg: WorldConfig,
    bodies: BodySet,

    // Slot index == SubscriberId; a slot is empty while its behavior is
    // being dispatched to, or after removal
    behaviors: Vec<Option<Box<dyn Behavior>>>,
    bus: EventBus,

    // Uniform grid: cell coord -> bodies whose AABB touches the cell
    grid: HashMap<(i32, i32), Vec<BodyId>>,

    // Every event dispatched since the last drain, in dispatch order
    published: Vec<(String, Event)>,
}

impl World {
    pub fn new(cfg: WorldConfig) -> Self {
        Self {
            cfg,
            bodies: BodySet::new(),
            behaviors: Vec::new(),
            bus: EventBus::new(),
            grid: HashMap::new(),
            published: Vec::new(),
        }
    }

    pub fn add_body(&mut self, body: Body) -> BodyId {
        self.bodies.insert(body)
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Register a behavior and let it subscribe.
    pub fn add_behavior(&mut self, mut behavior: Box<dyn Behavior>) -> SubscriberId {
        let id = SubscriberId(self.behaviors.len() as u32);
        behavior.attach(&mut self.bus.handle(id));
        self.behaviors.push(Some(behavior));
        id
    }

    /// Detach and hand back a behavior. `None` if the id is unknown or
    /// already removed.
    pub fn remove_behavior(&mut self, id: SubscriberId) -> Option<Box<dyn Behavior>> {
        let mut behavior = self.behaviors.get_mut(id.0 as usize)?.take()?;
        behavior.detach(&mut self.bus.handle(id));
        Some(behavior)
    }

    /// Publish `event` and run dispatch until the queue is empty.
    pub fn emit(&mut self, channel: &str, event: Event) {
        self.bus.push(channel, event);
        self.dispatch();
    }

    fn dispatch(&mut self) {
        while let Some((channel, event)) = self.bus.pop() {
            let subscribers = self.bus.subscribers(&channel).to_vec();
            log::debug!("dispatch {} to {} subscriber(s)", channel, subscribers.len());
            for who in subscribers {
                let Some(mut behavior) = self
                    .behaviors
                    .get_mut(who.0 as usize)
                    .and_then(Option::take)
                else {
                    continue;
                };
                let mut handle = self.bus.handle(who);
                match &event {
                    Event::Candidates(batch) => behavior.on_candidates(&self.bodies, batch, &mut handle),
                    Event::Step { dt } => behavior.on_step(&self.bodies, *dt, &mut handle),
                    Event::Collisions(batch) => behavior.on_collisions(&self.bodies, batch, &mut handle),
                }
                self.behaviors[who.0 as usize] = Some(behavior);
            }
            self.published.push((channel, event));
        }
    }

    /// One tick: broad phase candidates (if the grid is enabled), then the
    /// velocity step notification.
    pub fn step(&mut self, dt: f32) {
        if let Some(cell_size) = self.cfg.cell_size {
            let batch = self.broad_phase(cell_size);
            self.emit(CANDIDATES_CHANNEL, Event::Candidates(batch));
        }
        self.emit(STEP_CHANNEL, Event::Step { dt });
    }

    /// Take everything dispatched since the last drain.
    pub fn drain_events(&mut self) -> Vec<(String, Event)> {
        std::mem::take(&mut self.published)
    }

    /// Bin bodies by AABB and collect unique pairs sharing a cell whose
    /// boxes overlap, sorted by `(body_a, body_b)`.
    fn broad_phase(&mut self, cell_size: f32) -> CandidateBatch {
        self.grid.clear();
        let aabbs: Vec<Aabb> = self.bodies.iter().map(|(_, b)| b.aabb()).collect();
        for (i, aabb) in aabbs.iter().enumerate() {
            self.insert_into_grid(BodyId(i as u32), aabb, cell_size);
        }

        let mut seen_pairs: HashSet<(BodyId, BodyId)> = HashSet::new();
        for ids in self.grid.values() {
            for i0 in 0..ids.len() {
                for i1 in (i0 + 1)..ids.len() {
                    let (a, b) = (ids[i0], ids[i1]);
                    let key = if a < b { (a, b) } else { (b, a) };
                    if !aabbs[key.0.0 as usize].overlaps(&aabbs[key.1.0 as usize]) {
                        continue;
                    }
                    seen_pairs.insert(key);
                }
            }
        }

        let mut pairs: Vec<(BodyId, BodyId)> = seen_pairs.into_iter().collect();
        pairs.sort_unstable();
        log::trace!("broad phase: {} cells, {} candidate pair(s)", self.grid.len(), pairs.len());
        pairs.into_iter().map(|(a, b)| Candidate::new(a, b)).collect()
    }

    fn insert_into_grid(&mut self, id: BodyId, aabb: &Aabb, cell_size: f32) {
        let cs = cell_size.max(1e-5);
        let ix0 = (aabb.min.x / cs).floor() as i32;
        let iy0 = (aabb.min.y / cs).floor() as i32;
        let ix1 = (aabb.max.x / cs).floor() as i32;
        let iy1 = (aabb.max.y / cs).floor() as i32;
        for iy in iy0..=iy1 {
            for ix in ix0..=ix1 {
                self.grid.entry((ix, iy)).or_default().push(id);
            }
        }
    }
}
