//! Combat domain: session orchestration for the two-phase combat tick.
//!
//! The session owns both fighters, both FSMs and the frame bookkeeping, and
//! composes the pipeline in a fixed order: intents, sensors, FSMs and command
//! routing during `Update`; hit ingestion, resolution and groggy accumulation
//! during `PostUpdate`. It owns no combat rules beyond composition.

use std::cmp::Ordering;

use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;

use crate::animation::AnimationRig;
use crate::camera::{CameraFollow, CameraLookAt, CameraMode};
use crate::combat::ai::BossBrain;
use crate::combat::apply::apply_immediate;
use crate::combat::bus::{CombatEventBus, FrameHits};
use crate::combat::components::{AttackDriver, Boss, Health, WeaponTrace};
use crate::combat::events::{CombatEvent, CombatEventKind, ForceResetCombat, HitEvent};
use crate::combat::fighter::{Fighter, FighterSnapshot, build_sensors};
use crate::combat::fsm::ActionFsm;
use crate::combat::input::PlayerInputSource;
use crate::combat::resolver;
use crate::combat::resources::CombatConfig;
use crate::combat::types::{ActionState, Command, Intent, ResolveOutput, Sensors, Team};
use crate::movement::{CharacterController, Player};

mod anim;

pub(crate) use anim::AnimOverride;

/// Owns the combat pipeline state for the player/boss pair.
#[derive(Resource, Debug, Default)]
pub struct CombatSession {
    pub player: Fighter,
    pub boss: Fighter,
    pub player_snapshot: Option<FighterSnapshot>,
    pub boss_snapshot: Option<FighterSnapshot>,

    pub(crate) player_fsm: ActionFsm,
    pub(crate) boss_fsm: ActionFsm,

    pub(crate) player_intent: Intent,
    pub(crate) boss_intent: Intent,
    pub(crate) player_sensors: Sensors,
    pub(crate) boss_sensors: Sensors,
    pub(crate) player_commands: Vec<Command>,
    pub(crate) boss_commands: Vec<Command>,

    pub(crate) player_anim: AnimOverride,
    pub(crate) boss_anim: AnimOverride,
    pub(crate) player_move_blend: f32,
    pub(crate) boss_move_blend: f32,

    pub(crate) lock_on_active: bool,
    pub(crate) lock_on_target: Option<Entity>,

    /// Both participants resolved this frame; the pipeline is inert otherwise.
    pub(crate) ready: bool,
    missing_warned: bool,
}

impl CombatSession {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn fighter_mut(&mut self, id: Entity) -> Option<&mut Fighter> {
        if self.player.id == Some(id) {
            Some(&mut self.player)
        } else if self.boss.id == Some(id) {
            Some(&mut self.boss)
        } else {
            None
        }
    }

    pub(crate) fn participants(&self) -> Option<(Entity, Entity)> {
        Some((self.player.id?, self.boss.id?))
    }
}

/// Watches the world combat switch: turning it off tears the session down so
/// re-enabling starts from defaults. Runs even while the pipeline is inert.
pub(crate) fn sync_combat_enabled(
    active: Res<crate::core::CombatActive>,
    mut was_active: Local<bool>,
    mut session: ResMut<CombatSession>,
    mut bus: ResMut<CombatEventBus>,
) {
    if *was_active && !active.0 {
        session.reset();
        bus.clear_all();
    }
    *was_active = active.0;
}

/// Resets the pipeline on request. Always safe; idempotent.
pub(crate) fn handle_force_reset(
    mut requests: MessageReader<ForceResetCombat>,
    mut session: ResMut<CombatSession>,
    mut bus: ResMut<CombatEventBus>,
    mut sources: Query<&mut PlayerInputSource>,
    mut brains: Query<&mut BossBrain>,
) {
    if requests.read().next().is_none() {
        return;
    }
    session.reset();
    bus.clear_all();
    for mut source in &mut sources {
        source.clear();
    }
    for mut brain in &mut brains {
        brain.clear();
    }
}

/// Clears the per-frame hit info block on every health component.
pub(crate) fn begin_health_frame(mut healths: Query<&mut Health>) {
    for mut health in &mut healths {
        health.hit_this_frame = false;
        health.guard_hit_this_frame = false;
        health.dodge_avoided_this_frame = false;
    }
}

/// Decays post-hit i-frames and keeps exhausted health pinned at zero.
pub(crate) fn tick_health_timers(time: Res<Time>, mut healths: Query<&mut Health>) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }
    for mut health in &mut healths {
        if health.invuln_remaining > 0.0 {
            health.invuln_remaining = (health.invuln_remaining - dt).max(0.0);
        }
        if health.current_health <= 0.0 {
            health.current_health = 0.0;
            health.alive = false;
        }
    }
}

/// Resolves the player/boss handles (marker first, name fallback) and
/// refreshes fighter identity fields. Missing participants make the whole
/// tick inert, with a single warning per outage.
pub(crate) fn resolve_participants(
    config: Res<CombatConfig>,
    mut session: ResMut<CombatSession>,
    players: Query<Entity, With<Player>>,
    bosses: Query<Entity, With<Boss>>,
    names: Query<(Entity, &Name)>,
) {
    let find_by_name = |wanted: &str| {
        names
            .iter()
            .find(|(_, name)| name.as_str() == wanted)
            .map(|(entity, _)| entity)
    };

    let mut player = players.iter().next();
    let mut boss = bosses.iter().next();
    if config.auto_resolve_by_name {
        player = player.or_else(|| find_by_name(&config.player_name));
        boss = boss.or_else(|| find_by_name(&config.boss_name));
    }

    let (Some(player), Some(boss)) = (player, boss) else {
        if !session.missing_warned {
            warn!(
                "combat tick skipped: player={:?} boss={:?} (names {:?}/{:?})",
                player, boss, config.player_name, config.boss_name
            );
            session.missing_warned = true;
        }
        session.ready = false;
        return;
    };

    session.missing_warned = false;
    session.ready = true;
    session.player.id = Some(player);
    session.player.team = Team::Player;
    session.player.can_be_hitstunned = config.player_can_be_hitstunned;
    session.boss.id = Some(boss);
    session.boss.team = Team::Enemy;
    session.boss.can_be_hitstunned = config.boss_can_be_hitstunned;
}

/// Polls the player input source and the boss brain for this frame's intents.
/// A missing source yields an empty intent.
pub(crate) fn gather_intents(
    time: Res<Time>,
    mut session: ResMut<CombatSession>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut sources: Query<&mut PlayerInputSource>,
    mut brains: Query<&mut BossBrain>,
    transforms: Query<&Transform>,
) {
    if !session.ready {
        return;
    }
    let Some((player, boss)) = session.participants() else {
        return;
    };
    let dt = time.delta_secs();

    session.player_intent = match sources.get_mut(player) {
        Ok(mut source) => source.intent(&keyboard, &mouse, dt),
        Err(_) => Intent::default(),
    };

    session.boss_intent = match brains.get_mut(boss) {
        Ok(mut brain) => brain.think(transforms.get(boss).ok(), transforms.get(player).ok(), dt),
        Err(_) => Intent::default(),
    };
}

/// Applies the lock-on toggle edge to the camera rig and points the look-at
/// helper at the boss while locked.
pub(crate) fn update_lock_on(
    mut session: ResMut<CombatSession>,
    mut cameras: Query<(&mut CameraFollow, Option<&mut CameraLookAt>)>,
) {
    if !session.ready {
        return;
    }
    let Some((_, boss)) = session.participants() else {
        return;
    };
    let Some((mut follow, look_at)) = cameras.iter_mut().next() else {
        return;
    };

    if session.player_intent.lock_on_toggle && follow.enable_lock_on {
        if session.lock_on_active {
            session.lock_on_active = false;
            session.lock_on_target = None;
        } else {
            session.lock_on_active = true;
            session.lock_on_target = Some(boss);
        }
    }
    if session.lock_on_active {
        session.lock_on_target = Some(boss);
    }

    follow.lock_on_active = session.lock_on_active;
    if session.lock_on_active {
        follow.lock_on_target = session.lock_on_target;
        follow.mode = CameraMode::LockOn;
    } else {
        follow.lock_on_target = None;
        follow.mode = CameraMode::Orbit;
    }

    if let Some(mut look_at) = look_at {
        look_at.enabled = session.lock_on_active;
        look_at.target = session.lock_on_target;
    }
}

/// Rebuilds both fighters' sensors from authoritative components and adopts
/// the sensed hp as the fighters' own.
pub(crate) fn build_fighter_sensors(
    time: Res<Time>,
    mut session: ResMut<CombatSession>,
    transforms: Query<&Transform>,
    healths: Query<&Health>,
    drivers: Query<&AttackDriver>,
    controllers: Query<&CharacterController>,
) {
    if !session.ready {
        return;
    }
    let dt = time.delta_secs();
    let session = session.as_mut();

    session.player_sensors = build_sensors(
        &mut session.player,
        session.boss.id,
        dt,
        &transforms,
        &healths,
        &drivers,
        &controllers,
    );
    session.boss_sensors = build_sensors(
        &mut session.boss,
        session.player.id,
        dt,
        &transforms,
        &healths,
        &drivers,
        &controllers,
    );

    session.player.hp = session.player_sensors.hp;
    session.boss.hp = session.boss_sensors.hp;
}

/// Drains each fighter's deferred queue into its FSM, runs both FSMs, writes
/// back state and flags, and snapshots the post-FSM view for resolution.
pub(crate) fn tick_fsms(
    time: Res<Time>,
    config: Res<CombatConfig>,
    mut session: ResMut<CombatSession>,
    mut bus: ResMut<CombatEventBus>,
    mut messages: MessageWriter<CombatEvent>,
) {
    if !session.ready {
        return;
    }
    let Some((player, boss)) = session.participants() else {
        return;
    };
    let dt = time.delta_secs();

    let player_events = bus.peek_deferred(player).to_vec();
    let boss_events = bus.peek_deferred(boss).to_vec();

    // Mirror consumed events onto the message bus for outside subscribers.
    for event in player_events.iter().chain(boss_events.iter()) {
        messages.write(event.clone());
    }

    let session = session.as_mut();
    let player_out = session.player_fsm.update(
        player,
        &session.player_intent,
        &session.player_sensors,
        &player_events,
        dt,
    );
    let boss_out = session.boss_fsm.update(
        boss,
        &session.boss_intent,
        &session.boss_sensors,
        &boss_events,
        dt,
    );

    session.player.state = player_out.state;
    session.player.flags = player_out.flags;
    session.boss.state = boss_out.state;
    session.boss.flags = boss_out.flags;
    session.player_snapshot = session.player.snapshot();
    session.boss_snapshot = session.boss.snapshot();
    session.player_commands = player_out.commands;
    session.boss_commands = boss_out.commands;

    bus.clear_deferred(player);
    bus.clear_deferred(boss);

    if config.enable_logs {
        debug!(
            "fsm tick: player={:?} ({} cmds), boss={:?} ({} cmds)",
            session.player.state,
            session.player_commands.len(),
            session.boss.state,
            session.boss_commands.len(),
        );
    }
}

struct MoveBasis {
    forward: Vec2,
    right: Vec2,
}

fn camera_move_basis(cameras: &Query<(&CameraFollow, &Transform)>) -> Option<MoveBasis> {
    let (follow, transform) = cameras.iter().next()?;
    let forward = if follow.enabled {
        let yaw = follow.yaw_deg.to_radians();
        Vec2::new(yaw.sin(), yaw.cos())
    } else {
        let f = transform.forward();
        Vec2::new(f.x, f.z).normalize_or(Vec2::new(0.0, 1.0))
    };
    Some(MoveBasis {
        forward,
        right: Vec2::new(forward.y, -forward.x),
    })
}

/// Routes `RequestMove` commands into the locomotion component, transforming
/// by the camera basis for the player, and zeroes horizontal velocity for
/// fighters whose new state is not Move/Dodge.
pub(crate) fn route_move_commands(
    config: Res<CombatConfig>,
    session: Res<CombatSession>,
    mut controllers: Query<&mut CharacterController>,
    mut transforms: Query<&mut Transform, Without<CameraFollow>>,
    cameras: Query<(&CameraFollow, &Transform)>,
) {
    if !session.ready {
        return;
    }
    let Some((player, _)) = session.participants() else {
        return;
    };
    let basis = camera_move_basis(&cameras);
    let offset_rad = config.rotation_offset_deg.to_radians();

    let mut route = |commands: &[Command]| {
        for command in commands {
            let Command::RequestMove {
                target,
                direction,
                speed,
                camera_relative,
                face_move,
            } = command
            else {
                continue;
            };
            let Ok(mut controller) = controllers.get_mut(*target) else {
                if config.enable_logs {
                    warn!("move request dropped: no controller on {:?}", target);
                }
                continue;
            };

            let mut planar = *direction;
            if *target == player && *camera_relative {
                if let Some(basis) = &basis {
                    planar = basis.right * direction.x + basis.forward * direction.y;
                }
            }
            planar = planar.normalize_or_zero();

            controller.desired_velocity.x = planar.x * speed;
            controller.desired_velocity.z = planar.y * speed;
            controller.desired_velocity.y = 0.0;

            if *face_move && planar != Vec2::ZERO {
                if let Ok(mut transform) = transforms.get_mut(*target) {
                    transform.look_to(Vec3::new(planar.x, 0.0, planar.y), Vec3::Y);
                    if offset_rad != 0.0 {
                        transform.rotate_y(offset_rad);
                    }
                }
            }
        }
    };
    route(&session.player_commands);
    route(&session.boss_commands);

    let mut stop = |id: Option<Entity>, state: ActionState| {
        if matches!(state, ActionState::Move | ActionState::Dodge) {
            return;
        }
        let Some(id) = id else { return };
        if let Ok(mut controller) = controllers.get_mut(id) {
            controller.desired_velocity = Vec3::ZERO;
        }
    };
    stop(session.player.id, session.player.state);
    stop(session.boss.id, session.boss.state);
}

/// Runs the FSM-emitted trace edge commands through the applier. Damage is
/// skipped so this path can never hurt anyone.
pub(crate) fn route_trace_commands(
    mut session: ResMut<CombatSession>,
    mut bus: ResMut<CombatEventBus>,
    mut healths: Query<&mut Health>,
    mut drivers: Query<&mut AttackDriver>,
    mut traces: Query<&mut WeaponTrace>,
) {
    if !session.ready {
        return;
    }
    let trace_commands: Vec<Command> = session
        .player_commands
        .iter()
        .chain(session.boss_commands.iter())
        .filter(|command| {
            matches!(
                command,
                Command::EnableTrace { .. } | Command::DisableTrace { .. }
            )
        })
        .cloned()
        .collect();
    if trace_commands.is_empty() {
        return;
    }
    apply_immediate(
        session.as_mut(),
        bus.as_mut(),
        &mut healths,
        &mut drivers,
        &mut traces,
        &trace_commands,
        true,
    );
}

/// Drives per-fighter animation overrides from the new action state.
pub(crate) fn drive_animation(
    time: Res<Time>,
    config: Res<CombatConfig>,
    mut commands: Commands,
    mut session: ResMut<CombatSession>,
    mut rigs: Query<&mut AnimationRig>,
    drivers: Query<&AttackDriver>,
) {
    if !session.ready {
        return;
    }
    let Some((player, boss)) = session.participants() else {
        return;
    };
    let dt = time.delta_secs();
    let session = session.as_mut();

    anim::apply_state_animation(
        player,
        session.player.state,
        true,
        &mut session.player_anim,
        &mut session.player_move_blend,
        &config,
        dt,
        &mut commands,
        &mut rigs,
        &drivers,
    );
    anim::apply_state_animation(
        boss,
        session.boss.state,
        false,
        &mut session.boss_anim,
        &mut session.boss_move_blend,
        &config,
        dt,
        &mut commands,
        &mut rigs,
        &drivers,
    );
}

/// Deterministic processing order for the frame's hits: attack instance,
/// then attacker, then victim, with swept contacts (earliest first) ahead of
/// plain overlaps inside a group.
pub(crate) fn hit_order(a: &HitEvent, b: &HitEvent) -> Ordering {
    a.attack_instance_id
        .cmp(&b.attack_instance_id)
        .then(a.attacker_owner.cmp(&b.attacker_owner))
        .then(a.victim_owner.cmp(&b.victim_owner))
        .then(b.sweep_fraction.is_some().cmp(&a.sweep_fraction.is_some()))
        .then_with(|| match (a.sweep_fraction, b.sweep_fraction) {
            (Some(fa), Some(fb)) => fa.total_cmp(&fb),
            _ => Ordering::Equal,
        })
        .then(a.sub_shape_index.cmp(&b.sub_shape_index))
        .then(a.hurtbox_entity.cmp(&b.hurtbox_entity))
        .then(a.part.cmp(&b.part))
}

/// Ingests the frame's hits: sort, keep the first hit per
/// (attack instance, attacker, victim) triple, drop the rest.
pub(crate) fn ingest_frame_hits(
    mut frame_hits: ResMut<FrameHits>,
    mut bus: ResMut<CombatEventBus>,
    session: Res<CombatSession>,
) {
    let mut hits = std::mem::take(&mut frame_hits.0);
    if !session.ready {
        return;
    }
    bus.clear_frame();

    hits.sort_by(hit_order);
    let mut last: Option<(u32, Entity, Entity)> = None;
    for hit in hits {
        let key = (hit.attack_instance_id, hit.attacker_owner, hit.victim_owner);
        if last == Some(key) {
            continue;
        }
        last = Some(key);
        bus.push_hit(hit);
    }
}

fn has_deferred(resolved: &ResolveOutput, kind: CombatEventKind) -> bool {
    resolved.deferred.iter().any(|event| event.kind == kind)
}

/// Mirrors a hit's outcome into the victim's health component so UI, audio
/// and effects can react without touching the bus.
fn update_health_hit_info(
    healths: &mut Query<&mut Health>,
    hit: &HitEvent,
    resolved: &ResolveOutput,
    victim: &FighterSnapshot,
) {
    let Ok(mut health) = healths.get_mut(hit.victim_owner) else {
        return;
    };

    health.last_hit_attacker = Some(hit.attacker_owner);
    health.last_hit_part = hit.part;
    health.last_hit_pos = hit.hit_pos;
    health.last_hit_normal = hit.hit_normal;

    let was_hit = has_deferred(resolved, CombatEventKind::OnHit);
    let was_guarded = has_deferred(resolved, CombatEventKind::OnGuarded);
    let was_guard_break = has_deferred(resolved, CombatEventKind::OnGuardBreak);
    let was_parried = has_deferred(resolved, CombatEventKind::OnParried);

    if was_hit || was_guarded || was_guard_break || was_parried {
        health.hit_this_frame = true;
    }
    if was_guarded || was_guard_break || was_parried {
        health.guard_hit_this_frame = true;
    }
    health.last_hit_damage = if was_hit { hit.damage } else { 0.0 };

    if !was_hit && !was_guarded && !was_guard_break && !was_parried && victim.flags.invuln_active {
        health.dodge_avoided_this_frame = true;
    }
}

/// Resolves every surviving hit against the post-FSM snapshots, applies the
/// immediate commands, queues the deferred events, and accumulates the boss
/// groggy meter on qualifying player hits.
pub(crate) fn resolve_frame_hits(
    mut session: ResMut<CombatSession>,
    mut bus: ResMut<CombatEventBus>,
    mut healths: Query<&mut Health>,
    mut drivers: Query<&mut AttackDriver>,
    mut traces: Query<&mut WeaponTrace>,
) {
    if !session.ready {
        return;
    }
    let Some((player, boss)) = session.participants() else {
        return;
    };
    let (Some(player_snapshot), Some(boss_snapshot)) =
        (session.player_snapshot, session.boss_snapshot)
    else {
        return;
    };

    let hits: Vec<HitEvent> = bus.hits().to_vec();
    let mut groggy_triggered = false;

    for hit in &hits {
        let attacker = if hit.attacker_owner == player {
            player_snapshot
        } else {
            boss_snapshot
        };
        let victim = if hit.victim_owner == player {
            player_snapshot
        } else {
            boss_snapshot
        };

        let resolved = resolver::resolve(hit, &attacker, &victim);

        update_health_hit_info(&mut healths, hit, &resolved, &victim);
        apply_immediate(
            session.as_mut(),
            bus.as_mut(),
            &mut healths,
            &mut drivers,
            &mut traces,
            &resolved.immediate,
            false,
        );
        for event in &resolved.deferred {
            bus.push_deferred(event.clone());
        }

        // Groggy accumulation: boss only, player as attacker, landed hits.
        if groggy_triggered
            || hit.victim_owner != boss
            || hit.attacker_owner != player
            || !has_deferred(&resolved, CombatEventKind::OnHit)
        {
            continue;
        }

        let mut capped = false;
        if let Ok(mut health) = healths.get_mut(boss) {
            if health.groggy_max > 0.0 && session.boss.state != ActionState::Groggy {
                let gain = hit.damage * health.groggy_gain_scale.max(0.0);
                if gain > 0.0 {
                    health.groggy = (health.groggy + gain).min(health.groggy_max);
                }
                if health.groggy >= health.groggy_max {
                    health.groggy = 0.0;
                    capped = true;
                }
            }
        }
        if capped {
            groggy_triggered = true;
            let cancel = [
                Command::ForceCancelAttack { target: boss },
                Command::DisableTrace {
                    weapon_or_owner: boss,
                },
            ];
            apply_immediate(
                session.as_mut(),
                bus.as_mut(),
                &mut healths,
                &mut drivers,
                &mut traces,
                &cancel,
                true,
            );
            bus.push_deferred(CombatEvent::new(
                CombatEventKind::OnGroggy,
                boss,
                hit.attacker_owner,
                hit.attack_instance_id,
            ));
        }
    }
}
