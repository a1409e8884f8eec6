//! Combat domain: unit tests for the FSM, resolver and hit ordering, plus
//! app-level duel scenarios driving the whole pipeline.

use bevy::ecs::message::Messages;
use bevy::input::InputPlugin;
use bevy::prelude::*;

use super::session::hit_order;
use super::*;
use super::types::Command;
use crate::animation::AnimationRig;
use crate::core::{CombatActive, CorePlugin};
use crate::movement::{CharacterController, Player};

fn scratch_entity() -> Entity {
    World::new().spawn_empty().id()
}

fn snapshot(id: Entity) -> FighterSnapshot {
    FighterSnapshot {
        id,
        team: Team::Player,
        state: ActionState::Idle,
        flags: ActionFlags::default(),
        hp: 100.0,
        stamina: 100.0,
        target_in_front: true,
        can_be_hitstunned: true,
    }
}

mod fsm {
    use super::*;

    fn move_intent(x: f32, y: f32) -> Intent {
        Intent {
            move_axis: Vec2::new(x, y),
            ..default()
        }
    }

    #[test]
    fn idle_to_move_and_back() {
        let own = scratch_entity();
        let mut fsm = ActionFsm::default();
        let sensors = Sensors::default();

        let out = fsm.update(own, &move_intent(1.0, 0.0), &sensors, &[], 0.016);
        assert_eq!(out.state, ActionState::Move);
        assert!(matches!(
            out.commands.as_slice(),
            [Command::RequestMove { direction, speed, .. }]
                if *direction == Vec2::new(1.0, 0.0) && *speed == sensors.move_speed
        ));

        let out = fsm.update(own, &Intent::default(), &sensors, &[], 0.016);
        assert_eq!(out.state, ActionState::Idle);
        assert!(matches!(
            out.commands.as_slice(),
            [Command::RequestMove { direction, speed, .. }]
                if *direction == Vec2::ZERO && *speed == 0.0
        ));
    }

    #[test]
    fn attack_needs_stamina() {
        let own = scratch_entity();
        let mut fsm = ActionFsm::default();
        let intent = Intent {
            attack_pressed: true,
            ..default()
        };

        let mut sensors = Sensors {
            stamina: 14.0,
            ..default()
        };
        let out = fsm.update(own, &intent, &sensors, &[], 0.016);
        assert_eq!(out.state, ActionState::Idle, "attack below 15 stamina is dropped");

        sensors.stamina = 15.0;
        let out = fsm.update(own, &intent, &sensors, &[], 0.016);
        assert_eq!(out.state, ActionState::Attack);
    }

    #[test]
    fn dodge_outranks_guard_and_attack() {
        let own = scratch_entity();
        let mut fsm = ActionFsm::default();
        let intent = Intent {
            attack_pressed: true,
            guard_held: true,
            dodge_pressed: true,
            ..default()
        };
        let sensors = Sensors::default();

        let out = fsm.update(own, &intent, &sensors, &[], 0.016);
        assert_eq!(out.state, ActionState::Dodge);
        assert!(!out.flags.can_be_interrupted);

        // Without the stamina for it, the dodge is dropped and guard wins.
        let mut fsm = ActionFsm::default();
        let sensors = Sensors {
            stamina: 9.0,
            ..default()
        };
        let out = fsm.update(own, &intent, &sensors, &[], 0.016);
        assert_eq!(out.state, ActionState::Guard);
    }

    #[test]
    fn committed_attack_rides_out_the_window() {
        let own = scratch_entity();
        let mut fsm = ActionFsm::default();
        let attack = Intent {
            attack_pressed: true,
            ..default()
        };
        let mut sensors = Sensors::default();

        let out = fsm.update(own, &attack, &sensors, &[], 0.02);
        assert_eq!(out.state, ActionState::Attack);

        // Window opens: the attack commits and emits the trace rising edge.
        sensors.attack_window_active = true;
        let out = fsm.update(own, &move_intent(1.0, 0.0), &sensors, &[], 0.02);
        assert_eq!(out.state, ActionState::Attack, "committed attack ignores movement");
        assert!(matches!(
            out.commands.as_slice(),
            [Command::EnableTrace { .. }]
        ));

        // Window still open: nothing new.
        let out = fsm.update(own, &move_intent(1.0, 0.0), &sensors, &[], 0.02);
        assert_eq!(out.state, ActionState::Attack);
        assert!(out.commands.is_empty());

        // Window drops after the grace period: back to idle, falling edge.
        sensors.attack_window_active = false;
        let out = fsm.update(own, &Intent::default(), &sensors, &[], 0.02);
        assert_eq!(out.state, ActionState::Idle);
        assert!(matches!(
            out.commands.as_slice(),
            [Command::DisableTrace { .. }]
        ));
    }

    #[test]
    fn uncommitted_attack_obeys_higher_priority_inputs() {
        let own = scratch_entity();
        let mut fsm = ActionFsm::default();
        let sensors = Sensors::default();

        let out = fsm.update(
            own,
            &Intent {
                attack_pressed: true,
                ..default()
            },
            &sensors,
            &[],
            0.016,
        );
        assert_eq!(out.state, ActionState::Attack);

        // No window yet, so a dodge press cancels the windup.
        let out = fsm.update(
            own,
            &Intent {
                dodge_pressed: true,
                ..default()
            },
            &sensors,
            &[],
            0.016,
        );
        assert_eq!(out.state, ActionState::Dodge);
    }

    #[test]
    fn timed_attack_exits_on_duration() {
        let own = scratch_entity();
        let mut fsm = ActionFsm::default();
        let sensors = Sensors {
            attack_state_duration_secs: 0.5,
            ..default()
        };

        let out = fsm.update(
            own,
            &Intent {
                attack_pressed: true,
                ..default()
            },
            &sensors,
            &[],
            0.016,
        );
        assert_eq!(out.state, ActionState::Attack);

        let out = fsm.update(own, &Intent::default(), &sensors, &[], 0.3);
        assert_eq!(out.state, ActionState::Attack, "timer not elapsed yet");

        let out = fsm.update(own, &move_intent(0.0, 1.0), &sensors, &[], 0.3);
        assert_eq!(out.state, ActionState::Move, "timer elapsed into movement");
        assert!(matches!(
            out.commands.as_slice(),
            [Command::RequestMove { .. }]
        ));
    }

    #[test]
    fn hitstun_entry_and_timed_exit() {
        let own = scratch_entity();
        let other = scratch_entity();
        let mut fsm = ActionFsm::default();
        let sensors = Sensors::default();
        let on_hit = [CombatEvent::new(CombatEventKind::OnHit, own, other, 1).with_value(10.0)];

        let out = fsm.update(own, &Intent::default(), &sensors, &on_hit, 0.016);
        assert_eq!(out.state, ActionState::Hitstun);
        assert!(!out.flags.can_be_interrupted);

        // Movement is ignored while stunned.
        let out = fsm.update(own, &move_intent(1.0, 0.0), &sensors, &[], 0.2);
        assert_eq!(out.state, ActionState::Hitstun);

        // The fixed 0.4 s timer expires within this tick.
        let out = fsm.update(own, &Intent::default(), &sensors, &[], 0.25);
        assert_eq!(out.state, ActionState::Idle);
    }

    #[test]
    fn hitstun_respects_immunity() {
        let own = scratch_entity();
        let other = scratch_entity();
        let mut fsm = ActionFsm::default();
        let sensors = Sensors {
            can_be_hitstunned: false,
            ..default()
        };
        let on_hit = [CombatEvent::new(CombatEventKind::OnHit, own, other, 1)];

        let out = fsm.update(own, &Intent::default(), &sensors, &on_hit, 0.016);
        assert_eq!(out.state, ActionState::Idle);
    }

    #[test]
    fn groggy_entry_wins_over_hitstun_and_times_out() {
        let own = scratch_entity();
        let other = scratch_entity();
        let mut fsm = ActionFsm::default();
        let sensors = Sensors {
            groggy_duration: 1.0,
            ..default()
        };
        let events = [
            CombatEvent::new(CombatEventKind::OnHit, own, other, 9).with_value(5.0),
            CombatEvent::new(CombatEventKind::OnGroggy, own, other, 10),
        ];

        let out = fsm.update(own, &Intent::default(), &sensors, &events, 0.016);
        assert_eq!(out.state, ActionState::Groggy);
        assert!(!out.flags.can_be_interrupted);

        let out = fsm.update(own, &move_intent(1.0, 0.0), &sensors, &[], 0.9);
        assert_eq!(out.state, ActionState::Groggy);
        let out = fsm.update(own, &Intent::default(), &sensors, &[], 0.2);
        assert_eq!(out.state, ActionState::Idle, "groggy duration elapsed");
    }

    #[test]
    fn dead_is_terminal() {
        let own = scratch_entity();
        let other = scratch_entity();
        let mut fsm = ActionFsm::default();
        let sensors = Sensors {
            hp: 0.0,
            ..default()
        };

        let out = fsm.update(own, &Intent::default(), &sensors, &[], 0.016);
        assert_eq!(out.state, ActionState::Dead);
        assert!(!out.flags.can_be_interrupted);

        let alive_again = Sensors::default();
        let busy_intent = Intent {
            move_axis: Vec2::ONE,
            attack_pressed: true,
            dodge_pressed: true,
            guard_held: true,
            ..default()
        };
        let groggy = [CombatEvent::new(CombatEventKind::OnGroggy, own, other, 1)];
        let out = fsm.update(own, &busy_intent, &alive_again, &groggy, 1.0);
        assert_eq!(out.state, ActionState::Dead, "no transition leaves death");
    }

    #[test]
    fn window_flags_pass_through_from_sensors() {
        let own = scratch_entity();
        let mut fsm = ActionFsm::default();
        let sensors = Sensors {
            attack_window_active: true,
            guard_window_active: true,
            dodge_window_active: false,
            invuln_active: true,
            ..default()
        };

        let out = fsm.update(own, &Intent::default(), &sensors, &[], 0.016);
        assert!(out.flags.hit_active);
        assert!(out.flags.guard_active);
        assert!(out.flags.invuln_active);
        assert!(!out.flags.parry_window_active, "parry window stays reserved");
    }

    #[test]
    fn invuln_flag_includes_dodge_window() {
        let own = scratch_entity();
        let mut fsm = ActionFsm::default();
        let sensors = Sensors {
            dodge_window_active: true,
            ..default()
        };
        let out = fsm.update(own, &Intent::default(), &sensors, &[], 0.016);
        assert!(out.flags.invuln_active);
    }

    #[test]
    fn reset_is_idempotent() {
        let own = scratch_entity();
        let mut fsm = ActionFsm::default();
        fsm.update(
            own,
            &Intent {
                attack_pressed: true,
                ..default()
            },
            &Sensors::default(),
            &[],
            0.5,
        );

        fsm.reset();
        assert_eq!(fsm.state(), ActionState::Idle);
        assert_eq!(fsm.state_time(), 0.0);
        fsm.reset();
        assert_eq!(fsm.state(), ActionState::Idle);
        assert_eq!(fsm.state_time(), 0.0);
    }
}

mod resolver {
    use super::*;

    #[test]
    fn mismatched_victim_is_a_noop() {
        let attacker = snapshot(scratch_entity());
        let victim = snapshot(scratch_entity());
        let hit = HitEvent::new(attacker.id, scratch_entity(), 1, 10.0);

        let out = resolve(&hit, &attacker, &victim);
        assert!(out.immediate.is_empty());
        assert!(out.deferred.is_empty());
    }

    #[test]
    fn invulnerable_victim_absorbs_the_hit() {
        let attacker = snapshot(scratch_entity());
        let mut victim = snapshot(scratch_entity());
        victim.flags.invuln_active = true;
        let hit = HitEvent::new(attacker.id, victim.id, 3, 50.0);

        let out = resolve(&hit, &attacker, &victim);
        assert!(out.immediate.is_empty());
        assert!(out.deferred.is_empty());
    }

    #[test]
    fn parry_disarms_an_interruptible_attacker() {
        let attacker = snapshot(scratch_entity());
        let mut victim = snapshot(scratch_entity());
        victim.flags.parry_window_active = true;
        victim.target_in_front = true;
        let hit = HitEvent::new(attacker.id, victim.id, 11, 30.0);

        let out = resolve(&hit, &attacker, &victim);
        assert_eq!(out.deferred.len(), 1);
        assert_eq!(out.deferred[0].kind, CombatEventKind::OnParried);
        assert_eq!(out.deferred[0].subject, victim.id);
        assert_eq!(out.deferred[0].other, Some(attacker.id));
        assert_eq!(
            out.immediate,
            vec![
                Command::DisableTrace {
                    weapon_or_owner: attacker.id
                },
                Command::ForceCancelAttack {
                    target: attacker.id
                },
            ]
        );
    }

    #[test]
    fn parry_spares_an_uninterruptible_attacker() {
        let mut attacker = snapshot(scratch_entity());
        attacker.flags.can_be_interrupted = false;
        let mut victim = snapshot(scratch_entity());
        victim.flags.parry_window_active = true;
        let hit = HitEvent::new(attacker.id, victim.id, 11, 30.0);

        let out = resolve(&hit, &attacker, &victim);
        assert_eq!(
            out.immediate,
            vec![Command::DisableTrace {
                weapon_or_owner: attacker.id
            }],
            "trace still drops, but no cancel"
        );
    }

    #[test]
    fn guarded_hit_costs_stamina_only() {
        let attacker = snapshot(scratch_entity());
        let mut victim = snapshot(scratch_entity());
        victim.flags.guard_active = true;
        victim.stamina = 60.0;
        let hit = HitEvent::new(attacker.id, victim.id, 4, 15.0);

        let out = resolve(&hit, &attacker, &victim);
        assert_eq!(
            out.immediate,
            vec![Command::ConsumeStamina {
                target: victim.id,
                amount: 15.0
            }]
        );
        assert_eq!(out.deferred.len(), 1);
        assert_eq!(out.deferred[0].kind, CombatEventKind::OnGuarded);
    }

    #[test]
    fn guard_break_when_stamina_runs_out() {
        let attacker = snapshot(scratch_entity());
        let mut victim = snapshot(scratch_entity());
        victim.flags.guard_active = true;
        victim.stamina = 10.0;
        let hit = HitEvent::new(attacker.id, victim.id, 4, 15.0);

        let out = resolve(&hit, &attacker, &victim);
        let kinds: Vec<_> = out.deferred.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![CombatEventKind::OnGuardBreak, CombatEventKind::OnHit]
        );
        assert_eq!(out.deferred[1].value, 15.0);
        assert_eq!(
            out.immediate,
            vec![
                Command::ConsumeStamina {
                    target: victim.id,
                    amount: 15.0
                },
                Command::ApplyDamage {
                    target: victim.id,
                    amount: 15.0
                },
                Command::ForceCancelAttack { target: victim.id },
                Command::DisableTrace {
                    weapon_or_owner: victim.id
                },
            ]
        );
    }

    #[test]
    fn guard_with_zero_stamina_breaks_not_guards() {
        let attacker = snapshot(scratch_entity());
        let mut victim = snapshot(scratch_entity());
        victim.flags.guard_active = true;
        victim.stamina = 0.0;
        let hit = HitEvent::new(attacker.id, victim.id, 5, 1.0);

        let out = resolve(&hit, &attacker, &victim);
        assert!(
            out.deferred
                .iter()
                .any(|e| e.kind == CombatEventKind::OnGuardBreak)
        );
        assert!(
            !out.deferred
                .iter()
                .any(|e| e.kind == CombatEventKind::OnGuarded)
        );
    }

    #[test]
    fn guard_break_without_hitstun_keeps_the_victims_attack() {
        let attacker = snapshot(scratch_entity());
        let mut victim = snapshot(scratch_entity());
        victim.flags.guard_active = true;
        victim.stamina = 5.0;
        victim.can_be_hitstunned = false;
        let hit = HitEvent::new(attacker.id, victim.id, 4, 15.0);

        let out = resolve(&hit, &attacker, &victim);
        assert!(
            !out.immediate
                .iter()
                .any(|c| matches!(c, Command::ForceCancelAttack { .. })),
            "hitstun-immune victims are not cancelled"
        );
    }

    #[test]
    fn guard_from_behind_is_a_clean_hit() {
        let attacker = snapshot(scratch_entity());
        let mut victim = snapshot(scratch_entity());
        victim.flags.guard_active = true;
        victim.target_in_front = false;
        let hit = HitEvent::new(attacker.id, victim.id, 6, 20.0);

        let out = resolve(&hit, &attacker, &victim);
        assert!(
            out.immediate
                .iter()
                .any(|c| matches!(c, Command::ApplyDamage { amount, .. } if *amount == 20.0))
        );
        assert!(
            out.deferred
                .iter()
                .any(|e| e.kind == CombatEventKind::OnHit)
        );
    }

    #[test]
    fn clean_hit_on_uninterruptible_victim_skips_cancel() {
        let attacker = snapshot(scratch_entity());
        let mut victim = snapshot(scratch_entity());
        victim.flags.can_be_interrupted = false;
        let hit = HitEvent::new(attacker.id, victim.id, 2, 20.0);

        let out = resolve(&hit, &attacker, &victim);
        assert_eq!(
            out.immediate,
            vec![Command::ApplyDamage {
                target: victim.id,
                amount: 20.0
            }]
        );
    }

    #[test]
    fn negative_damage_guard_consumes_nothing() {
        let attacker = snapshot(scratch_entity());
        let mut victim = snapshot(scratch_entity());
        victim.flags.guard_active = true;
        let hit = HitEvent::new(attacker.id, victim.id, 8, -5.0);

        let out = resolve(&hit, &attacker, &victim);
        assert!(
            !out.immediate
                .iter()
                .any(|c| matches!(c, Command::ConsumeStamina { .. }))
        );
        assert_eq!(out.deferred[0].kind, CombatEventKind::OnGuarded);
    }
}

mod ordering {
    use super::*;

    #[test]
    fn hits_sort_by_instance_then_sweep() {
        let attacker = scratch_entity();
        let victim = scratch_entity();

        let mut late_sweep = HitEvent::new(attacker, victim, 2, 1.0);
        late_sweep.sweep_fraction = Some(0.8);
        let mut early_sweep = HitEvent::new(attacker, victim, 2, 1.0);
        early_sweep.sweep_fraction = Some(0.2);
        let no_sweep = HitEvent::new(attacker, victim, 2, 1.0);
        let earlier_instance = HitEvent::new(attacker, victim, 1, 1.0);

        let mut hits = vec![late_sweep, no_sweep, early_sweep, earlier_instance];
        hits.sort_by(hit_order);

        assert_eq!(hits[0].attack_instance_id, 1);
        assert_eq!(hits[1].sweep_fraction, Some(0.2));
        assert_eq!(hits[2].sweep_fraction, Some(0.8));
        assert_eq!(hits[3].sweep_fraction, None, "plain overlaps sort last");
    }

    #[test]
    fn sub_shape_breaks_ties_inside_a_group() {
        let attacker = scratch_entity();
        let victim = scratch_entity();

        let mut second = HitEvent::new(attacker, victim, 3, 1.0);
        second.sub_shape_index = 4;
        let mut first = HitEvent::new(attacker, victim, 3, 1.0);
        first.sub_shape_index = 1;

        let mut hits = vec![second, first];
        hits.sort_by(hit_order);
        assert_eq!(hits[0].sub_shape_index, 1);
    }
}

mod scenarios {
    use super::*;

    struct Duel {
        player: Entity,
        boss: Entity,
        player_weapon: Entity,
        boss_weapon: Entity,
    }

    fn combat_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, InputPlugin, CorePlugin, CombatPlugin));
        app
    }

    /// Spawns the two fighters facing each other, weapons wired to drivers.
    fn spawn_duel(app: &mut App) -> Duel {
        let world = app.world_mut();

        let player = world
            .spawn((
                Player,
                Name::new("Player"),
                Transform::from_xyz(0.0, 0.0, -2.0).looking_at(Vec3::new(0.0, 0.0, 2.0), Vec3::Y),
                CharacterController::default(),
                Health::default(),
                AnimationRig::default(),
            ))
            .id();
        let player_weapon = world.spawn(WeaponTrace::new(player, 10.0)).id();
        world.entity_mut(player).insert((
            AttackDriver::new(Some(player_weapon)),
            Hurtbox::new(player, 0),
        ));

        let boss = world
            .spawn((
                Boss,
                Name::new("Boss"),
                Transform::from_xyz(0.0, 0.0, 2.0).looking_at(Vec3::new(0.0, 0.0, -2.0), Vec3::Y),
                CharacterController::default(),
                Health::default(),
                AnimationRig::default(),
            ))
            .id();
        let boss_weapon = world.spawn(WeaponTrace::new(boss, 10.0)).id();
        world
            .entity_mut(boss)
            .insert((AttackDriver::new(Some(boss_weapon)), Hurtbox::new(boss, 0)));

        Duel {
            player,
            boss,
            player_weapon,
            boss_weapon,
        }
    }

    fn push_hit(app: &mut App, hit: HitEvent) {
        app.world_mut().resource_mut::<FrameHits>().0.push(hit);
    }

    fn deferred_kinds(app: &App, who: Entity) -> Vec<CombatEventKind> {
        app.world()
            .resource::<CombatEventBus>()
            .peek_deferred(who)
            .iter()
            .map(|event| event.kind)
            .collect()
    }

    fn health<'a>(app: &'a App, who: Entity) -> &'a Health {
        app.world().get::<Health>(who).unwrap()
    }

    #[test]
    fn clean_hit_damages_and_interrupts_the_victim() {
        let mut app = combat_app();
        let duel = spawn_duel(&mut app);
        app.world_mut()
            .get_mut::<WeaponTrace>(duel.boss_weapon)
            .unwrap()
            .active = true;

        push_hit(
            &mut app,
            HitEvent::new(duel.player, duel.boss, 7, 20.0),
        );
        app.update();

        let session = app.world().resource::<CombatSession>();
        assert_eq!(session.boss.hp, 80.0);
        assert_eq!(health(&app, duel.boss).current_health, 80.0);
        assert!(health(&app, duel.boss).hit_this_frame);
        assert_eq!(health(&app, duel.boss).last_hit_damage, 20.0);
        assert_eq!(
            health(&app, duel.boss).last_hit_attacker,
            Some(duel.player)
        );

        let events = app
            .world()
            .resource::<CombatEventBus>()
            .peek_deferred(duel.boss);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, CombatEventKind::OnHit);
        assert_eq!(events[0].other, Some(duel.player));
        assert_eq!(events[0].value, 20.0);
        assert_eq!(events[0].attack_instance_id, 7);

        assert!(
            app.world()
                .get::<AttackDriver>(duel.boss)
                .unwrap()
                .cancel_attack_requested
        );
        assert!(!app.world().get::<WeaponTrace>(duel.boss_weapon).unwrap().active);

        // Next frame the boss eats the deferred OnHit and enters hitstun;
        // its queue is then empty.
        app.update();
        assert_eq!(
            app.world().resource::<CombatSession>().boss.state,
            ActionState::Hitstun
        );
        assert!(deferred_kinds(&app, duel.boss).is_empty());
    }

    #[test]
    fn guard_break_at_low_stamina() {
        let mut app = combat_app();
        let duel = spawn_duel(&mut app);

        app.world_mut().get_mut::<Health>(duel.player).unwrap().guard_active = true;
        app.world_mut()
            .get_mut::<WeaponTrace>(duel.player_weapon)
            .unwrap()
            .active = true;
        app.world_mut()
            .resource_mut::<CombatSession>()
            .player
            .stamina = 10.0;

        push_hit(&mut app, HitEvent::new(duel.boss, duel.player, 4, 15.0));
        app.update();

        let session = app.world().resource::<CombatSession>();
        assert_eq!(session.player.stamina, 0.0, "stamina never goes negative");
        assert_eq!(session.player.hp, 85.0);
        assert_eq!(health(&app, duel.player).current_health, 85.0);
        assert!(health(&app, duel.player).guard_hit_this_frame);

        assert_eq!(
            deferred_kinds(&app, duel.player),
            vec![CombatEventKind::OnGuardBreak, CombatEventKind::OnHit]
        );
        assert!(
            app.world()
                .get::<AttackDriver>(duel.player)
                .unwrap()
                .cancel_attack_requested
        );
        assert!(
            !app.world()
                .get::<WeaponTrace>(duel.player_weapon)
                .unwrap()
                .active
        );
    }

    #[test]
    fn guarded_hit_holds_the_line() {
        let mut app = combat_app();
        let duel = spawn_duel(&mut app);
        app.world_mut().get_mut::<Health>(duel.player).unwrap().guard_active = true;

        push_hit(&mut app, HitEvent::new(duel.boss, duel.player, 4, 15.0));
        app.update();

        let session = app.world().resource::<CombatSession>();
        assert_eq!(session.player.stamina, 85.0);
        assert_eq!(session.player.hp, 100.0, "guarded hits deal no damage");
        assert_eq!(
            deferred_kinds(&app, duel.player),
            vec![CombatEventKind::OnGuarded]
        );
        assert!(health(&app, duel.player).guard_hit_this_frame);
        assert_eq!(health(&app, duel.player).last_hit_damage, 0.0);
    }

    #[test]
    fn invulnerable_victim_reports_a_dodge() {
        let mut app = combat_app();
        let duel = spawn_duel(&mut app);
        app.world_mut()
            .get_mut::<Health>(duel.player)
            .unwrap()
            .invuln_remaining = 1.0;

        push_hit(&mut app, HitEvent::new(duel.boss, duel.player, 5, 50.0));
        app.update();

        let session = app.world().resource::<CombatSession>();
        assert_eq!(session.player.hp, 100.0);
        assert!(deferred_kinds(&app, duel.player).is_empty());
        assert!(health(&app, duel.player).dodge_avoided_this_frame);
        assert!(!health(&app, duel.player).hit_this_frame);
    }

    #[test]
    fn guarding_away_from_the_attacker_fails() {
        let mut app = combat_app();
        let duel = spawn_duel(&mut app);

        // Turn the player's back to the boss; guard stays up.
        *app.world_mut().get_mut::<Transform>(duel.player).unwrap() =
            Transform::from_xyz(0.0, 0.0, -2.0)
                .looking_at(Vec3::new(0.0, 0.0, -10.0), Vec3::Y);
        app.world_mut().get_mut::<Health>(duel.player).unwrap().guard_active = true;

        push_hit(&mut app, HitEvent::new(duel.boss, duel.player, 4, 15.0));
        app.update();

        assert_eq!(
            app.world().resource::<CombatSession>().player.hp,
            85.0,
            "guard only covers the front"
        );
        assert_eq!(
            deferred_kinds(&app, duel.player),
            vec![CombatEventKind::OnHit]
        );
    }

    #[test]
    fn groggy_threshold_triggers_once() {
        let mut app = combat_app();
        let duel = spawn_duel(&mut app);
        {
            let mut health = app.world_mut().get_mut::<Health>(duel.boss).unwrap();
            health.groggy = 90.0;
            health.groggy_max = 100.0;
            health.groggy_gain_scale = 1.0;
        }
        app.world_mut()
            .get_mut::<WeaponTrace>(duel.boss_weapon)
            .unwrap()
            .active = true;

        push_hit(&mut app, HitEvent::new(duel.player, duel.boss, 9, 5.0));
        push_hit(&mut app, HitEvent::new(duel.player, duel.boss, 10, 6.0));
        app.update();

        let health_after = health(&app, duel.boss);
        assert_eq!(health_after.groggy, 0.0, "meter zeroes when capped");

        let kinds = deferred_kinds(&app, duel.boss);
        assert_eq!(
            kinds
                .iter()
                .filter(|k| **k == CombatEventKind::OnGroggy)
                .count(),
            1,
            "one OnGroggy per threshold crossing"
        );
        assert_eq!(
            kinds
                .iter()
                .filter(|k| **k == CombatEventKind::OnHit)
                .count(),
            2
        );
        assert!(
            !app.world()
                .get::<WeaponTrace>(duel.boss_weapon)
                .unwrap()
                .active
        );
        assert!(
            app.world()
                .get::<AttackDriver>(duel.boss)
                .unwrap()
                .cancel_attack_requested
        );

        app.update();
        assert_eq!(
            app.world().resource::<CombatSession>().boss.state,
            ActionState::Groggy
        );
    }

    #[test]
    fn duplicate_hits_from_one_swing_collapse() {
        let mut app = combat_app();
        let duel = spawn_duel(&mut app);

        for sub_shape in 0..3 {
            let mut hit = HitEvent::new(duel.player, duel.boss, 17, 20.0);
            hit.sub_shape_index = sub_shape;
            push_hit(&mut app, hit);
        }
        app.update();

        assert_eq!(app.world().resource::<CombatEventBus>().hits().len(), 1);
        assert_eq!(app.world().resource::<CombatSession>().boss.hp, 80.0);
        assert_eq!(
            deferred_kinds(&app, duel.boss),
            vec![CombatEventKind::OnHit]
        );
    }

    #[test]
    fn death_is_queued_exactly_once() {
        let mut app = combat_app();
        let duel = spawn_duel(&mut app);
        app.world_mut()
            .get_mut::<Health>(duel.boss)
            .unwrap()
            .current_health = 10.0;

        // Two lethal hits land in the same frame.
        push_hit(&mut app, HitEvent::new(duel.player, duel.boss, 1, 20.0));
        push_hit(&mut app, HitEvent::new(duel.player, duel.boss, 2, 20.0));
        app.update();

        let health_after = health(&app, duel.boss);
        assert_eq!(health_after.current_health, 0.0, "damage clamps at zero");
        assert!(!health_after.alive);
        assert_eq!(
            deferred_kinds(&app, duel.boss)
                .iter()
                .filter(|k| **k == CombatEventKind::OnDeath)
                .count(),
            1
        );

        app.update();
        assert_eq!(
            app.world().resource::<CombatSession>().boss.state,
            ActionState::Dead
        );

        // Dead fighters stay dead.
        app.update();
        assert_eq!(
            app.world().resource::<CombatSession>().boss.state,
            ActionState::Dead
        );
    }

    #[test]
    fn attack_window_edges_drive_the_weapon_trace() {
        let mut app = combat_app();
        let duel = spawn_duel(&mut app);
        app.update();

        // Rising edge: new attack instance, cleared victim set.
        {
            let mut trace = app
                .world_mut()
                .get_mut::<WeaponTrace>(duel.player_weapon)
                .unwrap();
            trace.hit_victims.insert(duel.boss);
        }
        app.world_mut()
            .get_mut::<AttackDriver>(duel.player)
            .unwrap()
            .attack_active = true;
        app.update();

        {
            let trace = app.world().get::<WeaponTrace>(duel.player_weapon).unwrap();
            assert!(trace.active);
            assert_eq!(trace.attack_instance_id, 1);
            assert_eq!(trace.last_attack_instance_id, 1);
            assert!(trace.hit_victims.is_empty());
        }

        // While the window holds, re-enabling is a no-op.
        app.update();
        assert_eq!(
            app.world()
                .get::<WeaponTrace>(duel.player_weapon)
                .unwrap()
                .attack_instance_id,
            1
        );

        // Falling edge disables; the next rise increments again.
        app.world_mut()
            .get_mut::<AttackDriver>(duel.player)
            .unwrap()
            .attack_active = false;
        app.update();
        assert!(
            !app.world()
                .get::<WeaponTrace>(duel.player_weapon)
                .unwrap()
                .active
        );

        app.world_mut()
            .get_mut::<AttackDriver>(duel.player)
            .unwrap()
            .attack_active = true;
        app.update();
        assert_eq!(
            app.world()
                .get::<WeaponTrace>(duel.player_weapon)
                .unwrap()
                .attack_instance_id,
            2,
            "attack instance ids strictly increase"
        );
    }

    #[test]
    fn session_reset_is_idempotent() {
        let mut session = CombatSession::default();
        session.player.stamina = 12.0;
        session.player.state = ActionState::Guard;
        session.boss.hp = 3.0;

        session.reset();
        assert_eq!(session.player.stamina, 100.0);
        assert_eq!(session.player.state, ActionState::Idle);
        assert_eq!(session.boss.hp, 100.0);
        assert!(session.player.id.is_none());

        session.reset();
        assert_eq!(session.player.stamina, 100.0);
        assert_eq!(session.player.state, ActionState::Idle);
    }

    #[test]
    fn force_reset_clears_session_and_bus() {
        let mut app = combat_app();
        let duel = spawn_duel(&mut app);

        // Drain some stamina through a guarded hit, leave a deferred event
        // queued for next frame.
        app.world_mut().get_mut::<Health>(duel.player).unwrap().guard_active = true;
        push_hit(&mut app, HitEvent::new(duel.boss, duel.player, 7, 20.0));
        app.update();
        assert_eq!(app.world().resource::<CombatSession>().player.stamina, 80.0);
        assert!(!deferred_kinds(&app, duel.player).is_empty());

        app.world_mut()
            .resource_mut::<Messages<ForceResetCombat>>()
            .write(ForceResetCombat);
        app.update();

        let session = app.world().resource::<CombatSession>();
        assert_eq!(session.player.stamina, 100.0, "fighter state returns to defaults");
        assert_eq!(session.player.state, ActionState::Idle);
        assert!(session.ready, "participants resolve again in the same frame");
        assert!(
            app.world()
                .resource::<CombatEventBus>()
                .peek_deferred(duel.player)
                .is_empty(),
            "pending deferred events are dropped with the bus"
        );

        // Resetting again changes nothing.
        app.world_mut()
            .resource_mut::<Messages<ForceResetCombat>>()
            .write(ForceResetCombat);
        app.update();
        let session = app.world().resource::<CombatSession>();
        assert_eq!(session.player.stamina, 100.0);
        assert_eq!(session.player.state, ActionState::Idle);
    }

    #[test]
    fn movement_intent_reaches_the_controller() {
        let mut app = combat_app();
        let duel = spawn_duel(&mut app);
        app.world_mut()
            .entity_mut(duel.player)
            .insert(PlayerInputSource::default());
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyW);

        app.update();

        let session = app.world().resource::<CombatSession>();
        assert_eq!(session.player.state, ActionState::Move);
        let controller = app
            .world()
            .get::<CharacterController>(duel.player)
            .unwrap();
        assert!(
            controller.desired_velocity.z > 4.9,
            "forward input becomes forward velocity at move speed"
        );

        // Releasing the key settles back to idle and zeroes the velocity.
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .release(KeyCode::KeyW);
        app.update();
        let controller = app
            .world()
            .get::<CharacterController>(duel.player)
            .unwrap();
        assert_eq!(
            app.world().resource::<CombatSession>().player.state,
            ActionState::Idle
        );
        assert_eq!(controller.desired_velocity, Vec3::ZERO);
    }

    #[test]
    fn applier_treats_placeholder_commands_as_noops() {
        use bevy::ecs::system::RunSystemOnce;

        let mut app = combat_app();
        let duel = spawn_duel(&mut app);
        app.update();

        let hp_before = health(&app, duel.player).current_health;
        let batch = vec![
            Command::EnterHitstun {
                target: duel.player,
                duration_secs: 0.4,
            },
            Command::PlayAnim {
                target: duel.player,
                clip: "idle".to_string(),
                looped: false,
            },
        ];
        app.world_mut()
            .run_system_once(
                move |mut session: ResMut<CombatSession>,
                      mut bus: ResMut<CombatEventBus>,
                      mut healths: Query<&mut Health>,
                      mut drivers: Query<&mut AttackDriver>,
                      mut traces: Query<&mut WeaponTrace>| {
                    crate::combat::apply::apply_immediate(
                        session.as_mut(),
                        bus.as_mut(),
                        &mut healths,
                        &mut drivers,
                        &mut traces,
                        &batch,
                        false,
                    );
                },
            )
            .unwrap();

        assert_eq!(health(&app, duel.player).current_health, hp_before);
        assert!(deferred_kinds(&app, duel.player).is_empty());
        assert!(
            !app.world()
                .get::<WeaponTrace>(duel.player_weapon)
                .unwrap()
                .active
        );
    }

    #[test]
    fn disabling_combat_tears_the_session_down() {
        let mut app = combat_app();
        let duel = spawn_duel(&mut app);

        push_hit(&mut app, HitEvent::new(duel.player, duel.boss, 7, 20.0));
        app.update();
        assert_eq!(app.world().resource::<CombatSession>().boss.hp, 80.0);

        app.world_mut().resource_mut::<CombatActive>().0 = false;
        app.update();

        let session = app.world().resource::<CombatSession>();
        assert!(session.player.id.is_none(), "session returns to defaults");
        assert_eq!(session.boss.hp, 100.0);
        assert!(app.world().resource::<CombatEventBus>().hits().is_empty());

        // Re-enabling resolves participants again on the next tick.
        app.world_mut().resource_mut::<CombatActive>().0 = true;
        app.update();
        assert!(app.world().resource::<CombatSession>().ready);
    }

    #[test]
    fn missing_participants_make_the_tick_inert() {
        let mut app = combat_app();

        push_hit(
            &mut app,
            HitEvent::new(scratch_entity(), scratch_entity(), 1, 10.0),
        );
        app.update();

        assert!(!app.world().resource::<CombatSession>().ready);
        assert!(app.world().resource::<CombatEventBus>().hits().is_empty());
        assert!(app.world().resource::<FrameHits>().0.is_empty());
    }

    #[test]
    fn sensors_reflect_component_windows() {
        let mut app = combat_app();
        let duel = spawn_duel(&mut app);
        {
            let mut health = app.world_mut().get_mut::<Health>(duel.player).unwrap();
            health.guard_active = true;
        }
        app.world_mut()
            .get_mut::<AttackDriver>(duel.player)
            .unwrap()
            .dodge_active = true;
        app.update();

        let session = app.world().resource::<CombatSession>();
        assert!(session.player_sensors.guard_window_active);
        assert!(session.player_sensors.dodge_window_active);
        assert!(session.player_sensors.target_in_front);
        assert!(session.player.flags.guard_active);
        assert!(session.player.flags.invuln_active, "dodge window grants i-frames");
        assert!((session.player_sensors.dist_to_target - 4.0).abs() < 1e-3);
        assert!(session.player_sensors.angle_to_target_deg < 1.0);
        assert!(session.player_sensors.grounded);
        assert!(!session.player_sensors.blocked);

        assert_eq!(session.player.team, Team::Player);
        assert_eq!(session.boss.team, Team::Enemy);
        assert_eq!(session.player_sensors.target, Some(duel.boss));

        let snap = session.player_snapshot.expect("snapshot taken post-fsm");
        assert_eq!(snap.team, Team::Player);
        assert_eq!(snap.state, session.player.state);
        assert_eq!(snap.hp, session.player.hp);

        let hurtbox = app.world().get::<Hurtbox>(duel.player).unwrap();
        assert_eq!(hurtbox.part, 0);
        assert_eq!(hurtbox.owner, Some(duel.player));
        assert_eq!(hurtbox.damage_scale, 1.0);

        let weapon = app.world().get::<WeaponTrace>(duel.player_weapon).unwrap();
        assert_eq!(weapon.owner, Some(duel.player));
        assert_eq!(weapon.base_damage, 10.0);

        assert_eq!(
            health(&app, duel.player).guard_damage_scale,
            0.5,
            "default guard mitigation"
        );
    }
}

mod intent_sources {
    use super::*;

    #[test]
    fn held_attack_resolves_heavy_on_release() {
        let mut source = PlayerInputSource::default();
        let mut keyboard = ButtonInput::<KeyCode>::default();
        let mouse = ButtonInput::<MouseButton>::default();

        keyboard.press(KeyCode::KeyJ);
        let intent = source.intent(&keyboard, &mouse, 0.1);
        assert!(intent.attack_pressed);
        assert!(intent.attack_held);

        keyboard.clear();
        let intent = source.intent(&keyboard, &mouse, 0.3);
        assert!(intent.attack_held_secs > 0.35);
        assert!(!intent.heavy_attack_pressed, "not resolved until release");

        keyboard.release(KeyCode::KeyJ);
        let intent = source.intent(&keyboard, &mouse, 0.016);
        assert!(intent.heavy_attack_pressed);
        assert!(!intent.light_attack_pressed);
    }

    #[test]
    fn quick_tap_resolves_light() {
        let mut source = PlayerInputSource::default();
        let mut keyboard = ButtonInput::<KeyCode>::default();
        let mouse = ButtonInput::<MouseButton>::default();

        keyboard.press(KeyCode::KeyJ);
        source.intent(&keyboard, &mouse, 0.05);
        keyboard.clear();
        keyboard.release(KeyCode::KeyJ);
        let intent = source.intent(&keyboard, &mouse, 0.016);
        assert!(intent.light_attack_pressed);
        assert!(!intent.heavy_attack_pressed);
    }

    #[test]
    fn parry_window_covers_the_start_of_a_guard() {
        let mut source = PlayerInputSource::default();
        let mut keyboard = ButtonInput::<KeyCode>::default();
        let mouse = ButtonInput::<MouseButton>::default();

        keyboard.press(KeyCode::KeyK);
        let intent = source.intent(&keyboard, &mouse, 0.1);
        assert!(intent.guard_held);
        assert!(intent.guard_pressed);
        assert!(intent.parry_window_active);
        assert_eq!(intent.guard_held_secs, 0.1);

        keyboard.clear();
        let intent = source.intent(&keyboard, &mouse, 0.1);
        assert!(
            !intent.parry_window_active,
            "window closes once the hold outlives it"
        );
        assert!(intent.guard_held);

        keyboard.release(KeyCode::KeyK);
        let intent = source.intent(&keyboard, &mouse, 0.1);
        assert!(intent.guard_released);
        assert_eq!(intent.guard_held_secs, 0.0);
    }

    #[test]
    fn wasd_maps_to_the_move_axis() {
        let mut source = PlayerInputSource::default();
        let mut keyboard = ButtonInput::<KeyCode>::default();
        let mouse = ButtonInput::<MouseButton>::default();

        keyboard.press(KeyCode::KeyW);
        keyboard.press(KeyCode::KeyD);
        let intent = source.intent(&keyboard, &mouse, 0.016);
        assert_eq!(intent.move_axis, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn boss_brain_swings_in_range_and_honors_cooldown() {
        let mut brain = BossBrain::seeded(7);
        let own = Transform::from_xyz(0.0, 0.0, 0.0);
        let near = Transform::from_xyz(0.0, 0.0, 2.0);
        let far = Transform::from_xyz(0.0, 0.0, 12.0);

        let intent = brain.think(Some(&own), Some(&near), 0.016);
        assert!(intent.attack_pressed);

        let intent = brain.think(Some(&own), Some(&near), 0.016);
        assert!(!intent.attack_pressed, "cooldown gates the next swing");
        assert!(intent.move_axis != Vec2::ZERO);

        let intent = brain.think(Some(&own), Some(&far), 0.016);
        assert!(!intent.attack_pressed);
        assert!(
            intent.move_axis.dot(Vec2::new(0.0, 1.0)) > 0.0,
            "advance leans toward the target"
        );

        let intent = brain.think(None, Some(&near), 0.016);
        assert_eq!(intent.move_axis, Vec2::ZERO, "missing transforms yield no intent");
    }
}
