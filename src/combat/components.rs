//! Combat domain: components the session reads and writes on fighters.
//!
//! These are the authoritative component surfaces the combat core touches.
//! They are owned by the scene (spawned in the arena module); the core holds
//! them only by entity and re-looks them up every tick.

use std::collections::HashSet;

use bevy::prelude::*;

/// Marker for the boss fighter
#[derive(Component, Debug)]
pub struct Boss;

/// Health, guard/dodge windows, invulnerability and the boss groggy meter.
/// The per-frame hit info block is rewritten by the session every frame.
#[derive(Component, Debug, Clone)]
pub struct Health {
    pub max_health: f32,
    pub current_health: f32,
    pub alive: bool,

    /// Post-hit i-frames: when > 0, a fresh hit re-arms `invuln_remaining`.
    pub invuln_duration: f32,
    pub invuln_remaining: f32,

    // Frame-based windows, driven by the attack driver.
    pub dodge_active: bool,
    pub guard_active: bool,

    /// Damage multiplier while guarding (0.5 = half damage)
    pub guard_damage_scale: f32,

    // Groggy meter (boss only).
    pub groggy: f32,
    pub groggy_max: f32,
    pub groggy_gain_scale: f32,
    pub groggy_duration: f32,

    // Per-frame hit info, cleared at the top of every frame.
    pub hit_this_frame: bool,
    pub guard_hit_this_frame: bool,
    pub dodge_avoided_this_frame: bool,
    pub last_hit_damage: f32,
    pub last_hit_attacker: Option<Entity>,
    pub last_hit_part: u32,
    pub last_hit_pos: Vec3,
    pub last_hit_normal: Vec3,
}

impl Default for Health {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            current_health: 100.0,
            alive: true,
            invuln_duration: 0.0,
            invuln_remaining: 0.0,
            dodge_active: false,
            guard_active: false,
            guard_damage_scale: 0.5,
            groggy: 0.0,
            groggy_max: 100.0,
            groggy_gain_scale: 1.0,
            groggy_duration: 1.5,
            hit_this_frame: false,
            guard_hit_this_frame: false,
            dodge_avoided_this_frame: false,
            last_hit_damage: 0.0,
            last_hit_attacker: None,
            last_hit_part: 0,
            last_hit_pos: Vec3::ZERO,
            last_hit_normal: Vec3::Y,
        }
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            max_health: max,
            current_health: max,
            ..default()
        }
    }
}

/// Which action a driver clip annotates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackClipKind {
    Attack,
    Dodge,
    Guard,
}

/// Where the clip name comes from when the session resolves an override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttackClipSource {
    #[default]
    Explicit,
    BaseA,
    BaseB,
    UpperA,
    UpperB,
    Additive,
}

#[derive(Debug, Clone)]
pub struct AttackClip {
    pub kind: AttackClipKind,
    pub source: AttackClipSource,
    pub clip_name: String,
    pub enabled: bool,
}

impl AttackClip {
    pub fn explicit(kind: AttackClipKind, clip_name: impl Into<String>) -> Self {
        Self {
            kind,
            source: AttackClipSource::Explicit,
            clip_name: clip_name.into(),
            enabled: true,
        }
    }
}

/// Drives the attack/guard/dodge windows and owns the link to the weapon
/// trace entity. Window booleans are runtime state an animation-notify layer
/// would normally toggle; combat only reads them and requests cancels.
#[derive(Component, Debug, Clone, Default)]
pub struct AttackDriver {
    /// Weapon trace entity controlled by this driver; the driver's owner
    /// itself when absent.
    pub trace_entity: Option<Entity>,

    pub clips: Vec<AttackClip>,

    pub attack_active: bool,
    pub dodge_active: bool,
    pub guard_active: bool,

    /// Duration of the attack state, 0 meaning "no timer, exit on window".
    pub attack_state_duration_secs: f32,

    pub attack_cancelable: bool,
    pub cancel_attack_requested: bool,
}

impl AttackDriver {
    pub fn new(trace_entity: Option<Entity>) -> Self {
        Self {
            trace_entity,
            attack_cancelable: true,
            ..default()
        }
    }
}

/// Sweeping weapon overlap volume. The trace system (external) populates the
/// frame hit list from this; combat toggles `active` and owns the attack
/// instance bookkeeping.
#[derive(Component, Debug, Clone, Default)]
pub struct WeaponTrace {
    pub owner: Option<Entity>,
    pub active: bool,
    pub base_damage: f32,

    /// Monotonically increasing per enable; keys the per-attack victim set.
    pub attack_instance_id: u32,
    pub last_attack_instance_id: u32,
    pub hit_victims: HashSet<Entity>,

    // Sweep caches, invalidated whenever a new instance starts.
    pub has_prev_basis: bool,
    pub prev_centers: Vec<Vec3>,
    pub prev_rots: Vec<Quat>,
}

impl WeaponTrace {
    pub fn new(owner: Entity, base_damage: f32) -> Self {
        Self {
            owner: Some(owner),
            base_damage,
            ..default()
        }
    }
}

/// Receiving volume for weapon traces; resolves hits back to its owner.
#[derive(Component, Debug, Clone)]
pub struct Hurtbox {
    pub owner: Option<Entity>,
    /// Body part id (head/arm/leg ...)
    pub part: u32,
    pub damage_scale: f32,
}

impl Hurtbox {
    pub fn new(owner: Entity, part: u32) -> Self {
        Self {
            owner: Some(owner),
            part,
            damage_scale: 1.0,
        }
    }
}
