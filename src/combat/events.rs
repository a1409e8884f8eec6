//! Combat domain: hit events and deferred combat events.

use bevy::ecs::message::Message;
use bevy::prelude::*;

/// One detected weapon overlap, produced by the external trace system and
/// drained by the session each post-combat update.
#[derive(Debug, Clone)]
pub struct HitEvent {
    pub attacker_owner: Entity,
    pub victim_owner: Entity,
    pub hurtbox_entity: Option<Entity>,

    pub part: u32,
    pub attack_instance_id: u32,
    pub sub_shape_index: u32,
    pub damage: f32,

    /// Fraction along the sweep at which the overlap was found, when the
    /// trace system swept rather than overlapped in place.
    pub sweep_fraction: Option<f32>,

    pub hit_pos: Vec3,
    pub hit_normal: Vec3,
}

impl HitEvent {
    pub fn new(
        attacker_owner: Entity,
        victim_owner: Entity,
        attack_instance_id: u32,
        damage: f32,
    ) -> Self {
        Self {
            attacker_owner,
            victim_owner,
            hurtbox_entity: None,
            part: 0,
            attack_instance_id,
            sub_shape_index: 0,
            damage,
            sweep_fraction: None,
            hit_pos: Vec3::ZERO,
            hit_normal: Vec3::Y,
        }
    }
}

/// Semantic outcome of hit resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatEventKind {
    OnHit,
    OnGuarded,
    OnParried,
    OnGuardBreak,
    OnGroggy,
    OnDeath,
}

/// Deferred combat event: pushed during resolution on frame N, observed by
/// the subject's FSM on frame N+1, then cleared. Also mirrored onto the Bevy
/// message bus for outside subscribers.
#[derive(Debug, Clone)]
pub struct CombatEvent {
    pub kind: CombatEventKind,
    pub subject: Entity,
    pub other: Option<Entity>,
    pub attack_instance_id: u32,
    pub value: f32,
}

impl CombatEvent {
    pub fn new(
        kind: CombatEventKind,
        subject: Entity,
        other: Entity,
        attack_instance_id: u32,
    ) -> Self {
        Self {
            kind,
            subject,
            other: Some(other),
            attack_instance_id,
            value: 0.0,
        }
    }

    pub fn with_value(mut self, value: f32) -> Self {
        self.value = value;
        self
    }
}

impl Message for CombatEvent {}

/// Tooling entry point: returns the combat pipeline to its initial state.
#[derive(Debug, Default)]
pub struct ForceResetCombat;

impl Message for ForceResetCombat {}
