//! Arena domain: spawns the duel — one player, one boss, their weapons.

use bevy::prelude::*;

use crate::animation::AnimationRig;
use crate::combat::{
    AttackClip, AttackClipKind, AttackDriver, Boss, BossBrain, CombatConfig, Health, Hurtbox,
    PlayerInputSource, WeaponTrace,
};
use crate::movement::{CharacterController, Player};

/// Hit parts used by the duel hurtboxes
pub mod parts {
    pub const BODY: u32 = 0;
}

fn standard_clips(prefix: &str) -> Vec<AttackClip> {
    vec![
        AttackClip::explicit(AttackClipKind::Attack, format!("{prefix}_swing")),
        AttackClip::explicit(AttackClipKind::Dodge, format!("{prefix}_roll")),
        AttackClip::explicit(AttackClipKind::Guard, format!("{prefix}_guard")),
    ]
}

fn spawn_fighters(mut commands: Commands, config: Res<CombatConfig>) {
    let player = commands
        .spawn((
            Name::new(config.player_name.clone()),
            Player,
            Transform::from_xyz(0.0, 0.0, -6.0).looking_at(Vec3::new(0.0, 0.0, 6.0), Vec3::Y),
            CharacterController::default(),
            Health::new(100.0),
            AnimationRig::default(),
            PlayerInputSource::default(),
        ))
        .id();
    let player_weapon = commands
        .spawn((
            Name::new("PlayerWeapon"),
            Transform::from_xyz(0.4, 1.0, 0.4),
            WeaponTrace::new(player, 12.0),
        ))
        .id();
    commands.entity(player).add_child(player_weapon);
    commands.entity(player).insert((
        AttackDriver {
            trace_entity: Some(player_weapon),
            clips: standard_clips("player"),
            attack_cancelable: true,
            ..default()
        },
        Hurtbox::new(player, parts::BODY),
    ));

    let boss = commands
        .spawn((
            Name::new(config.boss_name.clone()),
            Boss,
            BossBrain::seeded(config.brain_seed),
            Transform::from_xyz(0.0, 0.0, 6.0).looking_at(Vec3::new(0.0, 0.0, -6.0), Vec3::Y),
            CharacterController::default(),
            Health {
                max_health: 300.0,
                current_health: 300.0,
                groggy_max: 100.0,
                groggy_duration: 2.5,
                ..default()
            },
            AnimationRig::default(),
        ))
        .id();
    let boss_weapon = commands
        .spawn((
            Name::new("BossWeapon"),
            Transform::from_xyz(0.6, 1.2, 0.6),
            WeaponTrace::new(boss, 18.0),
        ))
        .id();
    commands.entity(boss).add_child(boss_weapon);
    commands.entity(boss).insert((
        AttackDriver {
            trace_entity: Some(boss_weapon),
            clips: standard_clips("boss"),
            attack_cancelable: true,
            ..default()
        },
        Hurtbox::new(boss, parts::BODY),
    ));
}

pub struct ArenaPlugin;

impl Plugin for ArenaPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_fighters);
    }
}
