use std::collections::{HashMap, VecDeque};

use crate::api::Bus;
use crate::types::Event;

/// Index of a behavior registered with the world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(pub u32);

/// Channel registry plus the FIFO of events awaiting dispatch.
#[derive(Debug, Default)]
pub struct EventBus {
    subscriptions: HashMap<String, Vec<SubscriberId>>,
    pending: VecDeque<(String, Event)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `who` on `channel`; duplicate subscriptions are ignored.
    pub fn subscribe(&mut self, channel: &str, who: SubscriberId) {
        let subs = self.subscriptions.entry(channel.to_string()).or_default();
        if !subs.contains(&who) {
            subs.push(who);
        }
    }

    pub fn unsubscribe(&mut self, channel: &str, who: SubscriberId) {
        if let Some(subs) = self.subscriptions.get_mut(channel) {
            subs.retain(|s| *s != who);
            if subs.is_empty() {
                self.subscriptions.remove(channel);
            }
        }
    }

    /// Subscribers of `channel` in subscription order.
    pub fn subscribers(&self, channel: &str) -> &[SubscriberId] {
        self.subscriptions
            .get(channel)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Channels `who` currently listens on (sorted).
    pub fn channels_of(&self, who: SubscriberId) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .subscriptions
            .iter()
            .filter(|(_, subs)| subs.contains(&who))
            .map(|(ch, _)| ch.as_str())
            .collect();
        out.sort_unstable();
        out
    }

    pub fn push(&mut self, channel: &str, event: Event) {
        self.pending.push_back((channel.to_string(), event));
    }

    pub fn pop(&mut self) -> Option<(String, Event)> {
        self.pending.pop_front()
    }

    /// Bus view scoped to one subscriber.
    pub fn handle(&mut self, who: SubscriberId) -> BusHandle<'_> {
        BusHandle { bus: self, who }
    }
}

/// [`Bus`] implementation handed to a behavior; subscriptions are recorded under its id.
pub struct BusHandle<'a> {
    bus: &'a mut EventBus,
    who: SubscriberId,
}

impl Bus for BusHandle<'_> {
    fn subscribe(&mut self, channel: &str) {
        log::trace!("{:?} subscribes to {}", self.who, channel);
        self.bus.subscribe(channel, self.who);
    }

    fn unsubscribe(&mut self, channel: &str) {
        log::trace!("{:?} unsubscribes from {}", self.who, channel);
        self.bus.unsubscribe(channel, self.who);
    }

    fn emit(&mut self, channel: &str, event: Event) {
        self.bus.push(channel, event);
    }
}
