//! Movement domain: controller integration.

use bevy::prelude::*;

use crate::movement::components::{CharacterController, collision_flags};
use crate::movement::MovementTuning;

pub(crate) fn integrate_controllers(
    time: Res<Time>,
    tuning: Res<MovementTuning>,
    mut query: Query<(&mut CharacterController, &mut Transform)>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }

    for (mut controller, mut transform) in &mut query {
        controller.collision_flags = 0;

        if controller.apply_gravity && !controller.on_ground {
            controller.vertical_velocity += tuning.gravity * dt;
        }

        let step = Vec3::new(
            controller.desired_velocity.x,
            controller.vertical_velocity,
            controller.desired_velocity.z,
        ) * dt;
        transform.translation += step;

        // Floor contact.
        if transform.translation.y <= tuning.floor_y {
            transform.translation.y = tuning.floor_y;
            controller.vertical_velocity = 0.0;
            controller.on_ground = true;
            controller.collision_flags |= collision_flags::BELOW;
        } else {
            controller.on_ground = false;
        }

        // Arena boundary.
        let planar = Vec2::new(transform.translation.x, transform.translation.z);
        if planar.length() > tuning.arena_radius {
            let clamped = planar.normalize_or_zero() * tuning.arena_radius;
            transform.translation.x = clamped.x;
            transform.translation.z = clamped.y;
            controller.collision_flags |= collision_flags::SIDES;
        }
    }
}
