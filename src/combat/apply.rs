//! Combat domain: command execution against fighters and components.
//!
//! Executes a batch of immediate commands in order. Commands whose target is
//! missing the relevant component become no-ops; the rest of the batch still
//! runs. Move and anim commands are routed by the session, not here.

use bevy::prelude::*;

use crate::combat::bus::CombatEventBus;
use crate::combat::components::{AttackDriver, Health, WeaponTrace};
use crate::combat::events::{CombatEvent, CombatEventKind};
use crate::combat::session::CombatSession;
use crate::combat::types::Command;

/// Follows the attacker → weapon indirection: the target itself when it
/// carries a trace, else the entity its attack driver points at.
fn resolve_trace_entity(
    owner_or_weapon: Entity,
    drivers: &Query<&mut AttackDriver>,
    traces: &Query<&mut WeaponTrace>,
) -> Entity {
    if traces.contains(owner_or_weapon) {
        return owner_or_weapon;
    }
    match drivers.get(owner_or_weapon) {
        Ok(driver) => driver.trace_entity.unwrap_or(owner_or_weapon),
        Err(_) => owner_or_weapon,
    }
}

/// Applies `commands` in order. `skip_damage` drops `ApplyDamage` entries so
/// the session can route FSM trace commands through the same path without
/// ever applying damage from that batch.
pub(crate) fn apply_immediate(
    session: &mut CombatSession,
    bus: &mut CombatEventBus,
    healths: &mut Query<&mut Health>,
    drivers: &mut Query<&mut AttackDriver>,
    traces: &mut Query<&mut WeaponTrace>,
    commands: &[Command],
    skip_damage: bool,
) {
    for command in commands {
        match command {
            Command::ApplyDamage { target, amount } => {
                if skip_damage {
                    continue;
                }
                let Some(fighter) = session.fighter_mut(*target) else {
                    continue;
                };
                fighter.hp -= amount;
                if let Ok(mut health) = healths.get_mut(*target) {
                    health.current_health -= amount;
                    if health.current_health <= 0.0 {
                        health.current_health = 0.0;
                        // Queue death exactly once per depletion.
                        if health.alive {
                            health.alive = false;
                            bus.push_deferred(CombatEvent {
                                kind: CombatEventKind::OnDeath,
                                subject: *target,
                                other: None,
                                attack_instance_id: 0,
                                value: 0.0,
                            });
                        }
                    }
                    if health.invuln_duration > 0.0 {
                        health.invuln_remaining = health.invuln_duration;
                    }
                }
            }
            Command::ConsumeStamina { target, amount } => {
                if let Some(fighter) = session.fighter_mut(*target) {
                    fighter.stamina = (fighter.stamina - amount).max(0.0);
                }
            }
            Command::ForceCancelAttack { target } => {
                if let Ok(mut driver) = drivers.get_mut(*target) {
                    if driver.attack_cancelable {
                        driver.cancel_attack_requested = true;
                    }
                }
                let trace_entity = resolve_trace_entity(*target, drivers, traces);
                if let Ok(mut trace) = traces.get_mut(trace_entity) {
                    trace.active = false;
                }
            }
            Command::DisableTrace { weapon_or_owner } => {
                let trace_entity = resolve_trace_entity(*weapon_or_owner, drivers, traces);
                if let Ok(mut trace) = traces.get_mut(trace_entity) {
                    trace.active = false;
                }
            }
            Command::EnableTrace { weapon_or_owner } => {
                let trace_entity = resolve_trace_entity(*weapon_or_owner, drivers, traces);
                if let Ok(mut trace) = traces.get_mut(trace_entity) {
                    if !trace.active {
                        trace.attack_instance_id += 1;
                        trace.active = true;
                        trace.has_prev_basis = false;
                        trace.prev_centers.clear();
                        trace.prev_rots.clear();
                        trace.hit_victims.clear();
                        trace.last_attack_instance_id = trace.attack_instance_id;
                    }
                }
            }
            Command::EnterHitstun { .. } => {
                // Hitstun is enforced by the FSM's internal timer; no
                // external state is recorded for it.
            }
            Command::PlayAnim { .. } | Command::RequestMove { .. } => {
                // Routed directly by the session.
            }
        }
    }
}
