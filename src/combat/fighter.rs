//! Combat domain: session-owned fighter state and sensor sampling.

use bevy::prelude::*;

use crate::combat::components::{AttackDriver, Health};
use crate::combat::types::{ActionFlags, ActionState, Sensors, Team};
use crate::movement::{CharacterController, collision_flags};

/// Mutable combat state for one character. Lives in the session for its
/// whole lifetime; reset returns it to defaults.
#[derive(Debug, Clone)]
pub struct Fighter {
    pub id: Option<Entity>,
    pub team: Team,

    pub hp: f32,
    pub stamina: f32,
    pub move_speed: f32,

    pub state: ActionState,
    pub flags: ActionFlags,
    pub can_be_hitstunned: bool,

    /// Cached from the most recent sensor build.
    pub last_target_in_front: bool,
}

impl Default for Fighter {
    fn default() -> Self {
        Self {
            id: None,
            team: Team::Player,
            hp: 100.0,
            stamina: 100.0,
            move_speed: 5.0,
            state: ActionState::Idle,
            flags: ActionFlags::default(),
            can_be_hitstunned: true,
            last_target_in_front: true,
        }
    }
}

impl Fighter {
    /// By-value copy for the resolver: the post-FSM, pre-apply view.
    pub fn snapshot(&self) -> Option<FighterSnapshot> {
        let id = self.id?;
        Some(FighterSnapshot {
            id,
            team: self.team,
            state: self.state,
            flags: self.flags,
            hp: self.hp,
            stamina: self.stamina,
            target_in_front: self.last_target_in_front,
            can_be_hitstunned: self.can_be_hitstunned,
        })
    }
}

/// Immutable fighter view consumed by the resolver
#[derive(Debug, Clone, Copy)]
pub struct FighterSnapshot {
    pub id: Entity,
    pub team: Team,
    pub state: ActionState,
    pub flags: ActionFlags,
    pub hp: f32,
    pub stamina: f32,
    pub target_in_front: bool,
    pub can_be_hitstunned: bool,
}

/// Samples the authoritative components into a fresh `Sensors` for one
/// fighter. Missing components leave the corresponding defaults in place.
pub(crate) fn build_sensors(
    fighter: &mut Fighter,
    target: Option<Entity>,
    dt: f32,
    transforms: &Query<&Transform>,
    healths: &Query<&Health>,
    drivers: &Query<&AttackDriver>,
    controllers: &Query<&CharacterController>,
) -> Sensors {
    let mut s = Sensors {
        dt,
        hp: fighter.hp,
        stamina: fighter.stamina,
        move_speed: fighter.move_speed,
        target,
        ..default()
    };

    let Some(own) = fighter.id else {
        return s;
    };

    if let Ok(controller) = controllers.get(own) {
        s.grounded = controller.on_ground;
        s.blocked = controller.collision_flags & collision_flags::SIDES != 0;
    }

    if let Ok(health) = healths.get(own) {
        s.hp = health.current_health;
        s.guard_window_active = health.guard_active;
        s.dodge_window_active = health.dodge_active;
        s.invuln_active = health.invuln_remaining > 0.0;
        s.groggy_duration = health.groggy_duration;
    }

    if let Ok(driver) = drivers.get(own) {
        // The driver is additive on top of the health windows.
        s.attack_window_active = driver.attack_active;
        s.guard_window_active = s.guard_window_active || driver.guard_active;
        s.dodge_window_active = s.dodge_window_active || driver.dodge_active;
        s.attack_state_duration_secs = driver.attack_state_duration_secs;
    }

    if let (Ok(own_tf), Some(Ok(target_tf))) =
        (transforms.get(own), target.map(|t| transforms.get(t)))
    {
        let delta = target_tf.translation - own_tf.translation;
        s.dist_to_target = delta.length();

        let forward = own_tf.forward();
        let fwd = Vec2::new(forward.x, forward.z).normalize_or(Vec2::new(0.0, 1.0));
        let to_target = if s.dist_to_target > 0.0 {
            Vec2::new(delta.x / s.dist_to_target, delta.z / s.dist_to_target)
        } else {
            Vec2::new(0.0, 1.0)
        };
        let dot = fwd.dot(to_target);
        s.angle_to_target_deg = dot.clamp(-1.0, 1.0).acos().to_degrees();
        s.target_in_front = dot >= 0.0;
    }

    fighter.last_target_in_front = s.target_in_front;
    s
}
