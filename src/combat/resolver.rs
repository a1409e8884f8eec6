//! Combat domain: pure hit resolution.
//!
//! Turns one hit event plus the attacker/victim snapshots into immediate
//! commands and deferred events. Precedence: invulnerability absorbs, then
//! parry, then guard (with break on stamina exhaustion), then a clean hit.
//! The resolver never reads or writes external state; the applier does.

use crate::combat::events::{CombatEvent, CombatEventKind, HitEvent};
use crate::combat::fighter::FighterSnapshot;
use crate::combat::types::{Command, ResolveOutput};

pub fn resolve(
    hit: &HitEvent,
    attacker: &FighterSnapshot,
    victim: &FighterSnapshot,
) -> ResolveOutput {
    let mut out = ResolveOutput::default();

    // Defensive: the session pairs snapshots by owner id before calling.
    if hit.victim_owner != victim.id {
        return out;
    }

    if victim.flags.invuln_active {
        // Absorbed by i-frames; the attacker keeps its trace.
        return out;
    }

    if victim.flags.parry_window_active && victim.target_in_front {
        out.deferred.push(CombatEvent::new(
            CombatEventKind::OnParried,
            victim.id,
            attacker.id,
            hit.attack_instance_id,
        ));
        out.immediate.push(Command::DisableTrace {
            weapon_or_owner: attacker.id,
        });
        if attacker.flags.can_be_interrupted {
            out.immediate.push(Command::ForceCancelAttack {
                target: attacker.id,
            });
        }
        return out;
    }

    if victim.flags.guard_active && victim.target_in_front {
        let stamina_cost = hit.damage.max(0.0);
        if stamina_cost > 0.0 {
            out.immediate.push(Command::ConsumeStamina {
                target: victim.id,
                amount: stamina_cost,
            });
        }

        if victim.stamina - stamina_cost <= 0.0 {
            // Guard break: the blow lands anyway.
            out.deferred.push(CombatEvent::new(
                CombatEventKind::OnGuardBreak,
                victim.id,
                attacker.id,
                hit.attack_instance_id,
            ));
            out.immediate.push(Command::ApplyDamage {
                target: victim.id,
                amount: hit.damage,
            });
            if victim.flags.can_be_interrupted && victim.can_be_hitstunned {
                out.immediate.push(Command::ForceCancelAttack { target: victim.id });
                out.immediate.push(Command::DisableTrace {
                    weapon_or_owner: victim.id,
                });
            }
            out.deferred.push(
                CombatEvent::new(
                    CombatEventKind::OnHit,
                    victim.id,
                    attacker.id,
                    hit.attack_instance_id,
                )
                .with_value(hit.damage),
            );
        } else {
            out.deferred.push(CombatEvent::new(
                CombatEventKind::OnGuarded,
                victim.id,
                attacker.id,
                hit.attack_instance_id,
            ));
        }
        return out;
    }

    out.immediate.push(Command::ApplyDamage {
        target: victim.id,
        amount: hit.damage,
    });
    if victim.flags.can_be_interrupted && victim.can_be_hitstunned {
        out.immediate.push(Command::ForceCancelAttack { target: victim.id });
        out.immediate.push(Command::DisableTrace {
            weapon_or_owner: victim.id,
        });
    }
    out.deferred.push(
        CombatEvent::new(
            CombatEventKind::OnHit,
            victim.id,
            attacker.id,
            hit.attack_instance_id,
        )
        .with_value(hit.damage),
    );
    out
}
