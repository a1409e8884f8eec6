//! Combat domain: the per-frame pipeline turning intent and sensed state
//! into fighter action states, and detected weapon hits into damage, guard,
//! parry, groggy and death outcomes.

mod ai;
mod apply;
mod bus;
mod components;
mod events;
mod fighter;
mod fsm;
mod input;
mod resolver;
mod resources;
mod session;
mod types;

#[cfg(test)]
mod tests;

pub use ai::BossBrain;
pub use bus::{CombatEventBus, FrameHits};
pub use components::{
    AttackClip, AttackClipKind, AttackClipSource, AttackDriver, Boss, Health, Hurtbox, WeaponTrace,
};
pub use events::{CombatEvent, CombatEventKind, ForceResetCombat, HitEvent};
pub use fighter::{Fighter, FighterSnapshot};
pub use fsm::ActionFsm;
pub use input::PlayerInputSource;
pub use resolver::resolve;
pub use resources::CombatConfig;
pub use session::CombatSession;
pub use types::{
    ActionFlags, ActionState, Command, FsmOutput, Intent, ResolveOutput, Sensors, Team,
};

use bevy::prelude::*;

use crate::core::combat_active;

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CombatSession>()
            .init_resource::<CombatEventBus>()
            .init_resource::<FrameHits>()
            .init_resource::<CombatConfig>()
            .add_message::<CombatEvent>()
            .add_message::<ForceResetCombat>()
            .add_systems(
                Update,
                session::sync_combat_enabled.before(session::handle_force_reset),
            )
            // The combat tick proper: intents before sensors, sensors before
            // FSMs, FSM commands before animation.
            .add_systems(
                Update,
                (
                    session::handle_force_reset,
                    session::begin_health_frame,
                    session::tick_health_timers,
                    session::resolve_participants,
                    session::gather_intents,
                    session::update_lock_on,
                    session::build_fighter_sensors,
                    session::tick_fsms,
                    session::route_move_commands,
                    session::route_trace_commands,
                    session::drive_animation,
                )
                    .chain()
                    .run_if(combat_active),
            )
            // Hit resolution runs after the frame's traces have reported.
            .add_systems(
                PostUpdate,
                (session::ingest_frame_hits, session::resolve_frame_hits)
                    .chain()
                    .run_if(combat_active),
            );
    }
}
