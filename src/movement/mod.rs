//! Movement domain: kinematic character locomotion.
//!
//! Stands in for the engine character controller: gameplay writes a desired
//! velocity, the integrator moves the transform, keeps the fighter on the
//! arena floor and reports ground/side contact back.

mod components;
mod systems;

pub use components::{CharacterController, Player, collision_flags};

use bevy::prelude::*;

use crate::core::gameplay_active;

#[derive(Resource, Debug, Clone)]
pub struct MovementTuning {
    pub gravity: f32,
    pub floor_y: f32,
    /// Fighters are kept inside this radius around the arena origin.
    pub arena_radius: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            floor_y: 0.0,
            arena_radius: 18.0,
        }
    }
}

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MovementTuning>()
            .add_systems(Update, systems::integrate_controllers.run_if(gameplay_active));
    }
}
