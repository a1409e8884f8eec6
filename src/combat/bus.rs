//! Combat domain: frame-scoped hit buffer and per-entity deferred events.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::combat::events::{CombatEvent, HitEvent};

/// Ingestion seam for the external weapon trace system: hits detected during
/// the frame land here and are drained by the session each post-combat pass.
#[derive(Resource, Debug, Default)]
pub struct FrameHits(pub Vec<HitEvent>);

/// Two channels: the in-order hit list for the current frame, and per-entity
/// queues of deferred combat events that live exactly one frame boundary.
#[derive(Resource, Debug, Default)]
pub struct CombatEventBus {
    hits: Vec<HitEvent>,
    deferred: HashMap<Entity, Vec<CombatEvent>>,
}

impl CombatEventBus {
    /// Drops the frame's hit list; deferred queues are untouched.
    pub fn clear_frame(&mut self) {
        self.hits.clear();
    }

    pub fn clear_all(&mut self) {
        self.hits.clear();
        self.deferred.clear();
    }

    pub fn push_hit(&mut self, hit: HitEvent) {
        self.hits.push(hit);
    }

    pub fn hits(&self) -> &[HitEvent] {
        &self.hits
    }

    /// Appends to the subject's queue, preserving insertion order.
    pub fn push_deferred(&mut self, event: CombatEvent) {
        self.deferred.entry(event.subject).or_default().push(event);
    }

    pub fn peek_deferred(&self, who: Entity) -> &[CombatEvent] {
        self.deferred.get(&who).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear_deferred(&mut self, who: Entity) {
        self.deferred.remove(&who);
    }
}
