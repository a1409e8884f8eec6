//! Combat domain: contract types shared across the per-frame pipeline.

use bevy::prelude::*;

use crate::combat::events::CombatEvent;

/// Team affiliation for hit filtering and session bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Team {
    #[default]
    Player,
    Enemy,
    Neutral,
}

/// The single action state a fighter occupies on any given tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionState {
    #[default]
    Idle,
    Move,
    Attack,
    Dodge,
    Guard,
    Hitstun,
    Groggy,
    Dead,
}

/// Derived per-tick flags. The window flags are pass-through copies of the
/// sensor windows; the FSM never invents them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionFlags {
    pub hit_active: bool,
    pub guard_active: bool,
    pub parry_window_active: bool,
    pub invuln_active: bool,
    pub can_be_interrupted: bool,
}

impl Default for ActionFlags {
    fn default() -> Self {
        Self {
            hit_active: false,
            guard_active: false,
            parry_window_active: false,
            invuln_active: false,
            can_be_interrupted: true,
        }
    }
}

/// Command-level input for one fighter on one frame, produced by an intent
/// source (player input or boss brain) before the FSM runs.
#[derive(Debug, Clone, Default)]
pub struct Intent {
    pub move_axis: Vec2,
    pub attack_pressed: bool,
    pub guard_held: bool,
    pub dodge_pressed: bool,
    pub lock_on_toggle: bool,

    pub light_attack_pressed: bool,
    pub heavy_attack_pressed: bool,
    pub attack_held: bool,
    pub attack_held_secs: f32,

    pub guard_pressed: bool,
    pub guard_released: bool,
    pub guard_held_secs: f32,
    pub parry_window_active: bool,
}

/// Read-only view of a fighter's world state, rebuilt from authoritative
/// components every frame. The FSM consults only this, never components.
#[derive(Debug, Clone)]
pub struct Sensors {
    pub dt: f32,
    pub hp: f32,
    pub stamina: f32,

    pub grounded: bool,
    pub blocked: bool,

    pub target: Option<Entity>,
    pub dist_to_target: f32,
    pub angle_to_target_deg: f32,
    pub target_in_front: bool,

    // Driver/health windows (source of truth; flags are derived from these).
    pub attack_window_active: bool,
    pub guard_window_active: bool,
    pub dodge_window_active: bool,
    pub invuln_active: bool,
    pub attack_state_duration_secs: f32,
    pub can_be_hitstunned: bool,

    pub groggy_duration: f32,
    pub move_speed: f32,
}

impl Default for Sensors {
    fn default() -> Self {
        Self {
            dt: 0.0,
            hp: 100.0,
            stamina: 100.0,
            grounded: true,
            blocked: false,
            target: None,
            dist_to_target: 9999.0,
            angle_to_target_deg: 0.0,
            target_in_front: true,
            attack_window_active: false,
            guard_window_active: false,
            dodge_window_active: false,
            invuln_active: false,
            attack_state_duration_secs: 0.0,
            can_be_hitstunned: true,
            groggy_duration: 1.5,
            move_speed: 5.0,
        }
    }
}

/// Imperative effect produced by the FSM or the resolver and executed by the
/// applier (or routed directly by the session for move/anim).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ApplyDamage {
        target: Entity,
        amount: f32,
    },
    ConsumeStamina {
        target: Entity,
        amount: f32,
    },
    EnterHitstun {
        target: Entity,
        duration_secs: f32,
    },
    ForceCancelAttack {
        target: Entity,
    },
    DisableTrace {
        weapon_or_owner: Entity,
    },
    EnableTrace {
        weapon_or_owner: Entity,
    },
    PlayAnim {
        target: Entity,
        clip: String,
        looped: bool,
    },
    RequestMove {
        target: Entity,
        direction: Vec2,
        speed: f32,
        camera_relative: bool,
        face_move: bool,
    },
}

/// Result of one FSM tick
#[derive(Debug, Clone, Default)]
pub struct FsmOutput {
    pub state: ActionState,
    pub flags: ActionFlags,
    pub commands: Vec<Command>,
}

/// Result of resolving one hit event
#[derive(Debug, Clone, Default)]
pub struct ResolveOutput {
    pub immediate: Vec<Command>,
    pub deferred: Vec<CombatEvent>,
}
