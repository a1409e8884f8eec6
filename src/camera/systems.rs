//! Camera domain: rig spawning and follow behaviors.

use bevy::prelude::*;

use crate::camera::components::{CameraFollow, CameraLookAt, CameraMode};
use crate::movement::Player;

pub(crate) fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("CombatCamera"),
        Camera3d::default(),
        Transform::from_xyz(0.0, 4.0, -8.0).looking_at(Vec3::new(0.0, 1.0, 0.0), Vec3::Y),
        CameraFollow::default(),
        CameraLookAt::default(),
    ));
}

/// Adopts the player as follow target once one exists.
pub(crate) fn acquire_follow_target(
    players: Query<Entity, With<Player>>,
    mut follows: Query<&mut CameraFollow>,
) {
    let Some(player) = players.iter().next() else {
        return;
    };
    for mut follow in &mut follows {
        if follow.target.is_none() {
            follow.target = Some(player);
        }
    }
}

pub(crate) fn follow_target(
    transforms: Query<&Transform, Without<CameraFollow>>,
    mut cameras: Query<(&mut CameraFollow, &mut Transform)>,
) {
    for (mut follow, mut camera_tf) in &mut cameras {
        if !follow.enabled {
            continue;
        }
        let Some(anchor) = follow.target.and_then(|t| transforms.get(t).ok()) else {
            continue;
        };

        if follow.mode == CameraMode::LockOn {
            // Face through the anchor toward the lock-on target and keep the
            // yaw in sync so camera-relative movement tracks the framing.
            if let Some(target_tf) = follow.lock_on_target.and_then(|t| transforms.get(t).ok()) {
                let delta = target_tf.translation - anchor.translation;
                let planar = Vec2::new(delta.x, delta.z);
                if planar.length_squared() > 1e-6 {
                    follow.yaw_deg = planar.x.atan2(planar.y).to_degrees();
                }
            }
        }

        let yaw = follow.yaw_deg.to_radians();
        let pitch = follow.pitch_deg.to_radians();
        let forward = Vec2::new(yaw.sin(), yaw.cos());
        let back = forward * follow.distance * pitch.cos();

        camera_tf.translation = anchor.translation
            + Vec3::new(
                -back.x,
                follow.height + follow.distance * pitch.sin(),
                -back.y,
            );
        let focus = anchor.translation + Vec3::Y * follow.height * 0.5;
        camera_tf.look_at(focus, Vec3::Y);
    }
}

pub(crate) fn apply_look_at(
    transforms: Query<&Transform, Without<CameraLookAt>>,
    mut cameras: Query<(&CameraLookAt, &mut Transform)>,
) {
    for (look_at, mut camera_tf) in &mut cameras {
        if !look_at.enabled {
            continue;
        }
        let Some(target_tf) = look_at.target.and_then(|t| transforms.get(t).ok()) else {
            continue;
        };
        let focus = target_tf.translation + Vec3::Y;
        camera_tf.look_at(focus, Vec3::Y);
    }
}
