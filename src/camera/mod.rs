//! Camera domain: third-person follow rig with lock-on.

mod components;
mod systems;

pub use components::{CameraFollow, CameraLookAt, CameraMode};

use bevy::prelude::*;

pub struct CameraRigPlugin;

impl Plugin for CameraRigPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, systems::spawn_camera).add_systems(
            PostUpdate,
            (
                systems::acquire_follow_target,
                systems::follow_target,
                systems::apply_look_at,
            )
                .chain()
                .before(TransformSystems::Propagate),
        );
    }
}
