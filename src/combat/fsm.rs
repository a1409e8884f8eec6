//! Combat domain: per-fighter action state machine.
//!
//! One instance per fighter, persisting across frames. Each tick consumes the
//! fighter's intent, sensor snapshot and queued deferred events, advances at
//! most one transition step, and emits move/trace commands. The FSM never
//! touches components; inputs it cannot honor are dropped silently.

use bevy::prelude::*;

use crate::combat::events::{CombatEvent, CombatEventKind};
use crate::combat::types::{ActionFlags, ActionState, Command, FsmOutput, Intent, Sensors};

/// Stamina required to start a dodge
const DODGE_STAMINA_COST: f32 = 10.0;
/// Stamina required to start an attack
const ATTACK_STAMINA_COST: f32 = 15.0;
/// Fixed hitstun duration
const HITSTUN_SECS: f32 = 0.4;
/// Grace period before a committed attack may exit on window loss
const ATTACK_EXIT_GRACE_SECS: f32 = 0.05;

fn has_event(events: &[CombatEvent], kind: CombatEventKind) -> bool {
    events.iter().any(|ev| ev.kind == kind)
}

#[derive(Debug, Clone, Default)]
pub struct ActionFsm {
    state: ActionState,
    state_time: f32,
    /// Latched once the attack window has been observed; cleared on exit.
    attack_committed: bool,
    /// Previous tick's hit-window flag, for trace edge detection.
    prev_hit_active: bool,
}

impl ActionFsm {
    pub fn state(&self) -> ActionState {
        self.state
    }

    pub fn state_time(&self) -> f32 {
        self.state_time
    }

    pub fn reset(&mut self) {
        self.state = ActionState::Idle;
        self.state_time = 0.0;
        self.attack_committed = false;
        self.prev_hit_active = false;
    }

    // The trace latch survives state changes on purpose: the weapon trace
    // lifecycle follows the sensed window edges, not the action state.
    fn enter(&mut self, next: ActionState) {
        if self.state != next {
            self.state = next;
            self.state_time = 0.0;
            self.attack_committed = false;
        }
    }

    pub fn update(
        &mut self,
        own: Entity,
        intent: &Intent,
        sensors: &Sensors,
        events: &[CombatEvent],
        dt: f32,
    ) -> FsmOutput {
        let mut out = FsmOutput::default();

        self.state_time += dt;

        // Event-driven entries, first match wins. Death is sticky.
        if sensors.hp <= 0.0 || has_event(events, CombatEventKind::OnDeath) {
            self.enter(ActionState::Dead);
        } else if self.state != ActionState::Dead {
            if has_event(events, CombatEventKind::OnGroggy) {
                self.enter(ActionState::Groggy);
            } else if has_event(events, CombatEventKind::OnHit) && sensors.can_be_hitstunned {
                self.enter(ActionState::Hitstun);
            }
        }

        if !matches!(
            self.state,
            ActionState::Dead | ActionState::Hitstun | ActionState::Groggy
        ) {
            let has_move = intent.move_axis.x.abs() + intent.move_axis.y.abs() > 1e-3;

            if self.state == ActionState::Attack {
                if sensors.attack_state_duration_secs > 0.0 {
                    // Timer-driven attack: leave when the timer elapses.
                    if self.state_time >= sensors.attack_state_duration_secs {
                        self.exit_to_locomotion(own, intent, sensors, has_move, &mut out);
                    }
                } else if !self.attack_committed {
                    if sensors.attack_window_active {
                        self.attack_committed = true;
                    } else if intent.dodge_pressed && sensors.stamina >= DODGE_STAMINA_COST {
                        self.enter(ActionState::Dodge);
                    } else if intent.guard_held {
                        self.enter(ActionState::Guard);
                    } else {
                        self.exit_to_locomotion(own, intent, sensors, has_move, &mut out);
                    }
                } else if !sensors.attack_window_active && self.state_time > ATTACK_EXIT_GRACE_SECS
                {
                    self.enter(ActionState::Idle);
                }
            } else if intent.dodge_pressed && sensors.stamina >= DODGE_STAMINA_COST {
                self.enter(ActionState::Dodge);
            } else if intent.guard_held {
                if self.state != ActionState::Guard {
                    self.enter(ActionState::Guard);
                }
            } else if intent.attack_pressed && sensors.stamina >= ATTACK_STAMINA_COST {
                self.enter(ActionState::Attack);
            } else {
                self.exit_to_locomotion(own, intent, sensors, has_move, &mut out);
            }
        }

        // Flags are pass-through windows from the sensors (single source of
        // truth); the parry window stays reserved.
        let mut flags = ActionFlags {
            hit_active: sensors.attack_window_active,
            guard_active: sensors.guard_window_active,
            parry_window_active: false,
            invuln_active: sensors.dodge_window_active || sensors.invuln_active,
            can_be_interrupted: !matches!(
                self.state,
                ActionState::Dodge | ActionState::Dead | ActionState::Groggy
            ),
        };

        if self.state == ActionState::Hitstun {
            flags.can_be_interrupted = false;
            if self.state_time > HITSTUN_SECS {
                self.enter(ActionState::Idle);
            }
        }

        if self.state == ActionState::Groggy {
            flags.can_be_interrupted = false;
            if self.state_time > sensors.groggy_duration {
                self.enter(ActionState::Idle);
            }
        }

        if flags.hit_active != self.prev_hit_active {
            if flags.hit_active {
                out.commands.push(Command::EnableTrace {
                    weapon_or_owner: own,
                });
            } else {
                out.commands.push(Command::DisableTrace {
                    weapon_or_owner: own,
                });
            }
            self.prev_hit_active = flags.hit_active;
        }

        out.state = self.state;
        out.flags = flags;
        out
    }

    fn exit_to_locomotion(
        &mut self,
        own: Entity,
        intent: &Intent,
        sensors: &Sensors,
        has_move: bool,
        out: &mut FsmOutput,
    ) {
        if has_move {
            self.enter(ActionState::Move);
            out.commands.push(Command::RequestMove {
                target: own,
                direction: intent.move_axis,
                speed: sensors.move_speed,
                camera_relative: true,
                face_move: true,
            });
        } else {
            self.enter(ActionState::Idle);
            out.commands.push(Command::RequestMove {
                target: own,
                direction: Vec2::ZERO,
                speed: 0.0,
                camera_relative: true,
                face_move: false,
            });
        }
    }
}
