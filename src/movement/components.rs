//! Movement domain: controller component and contact flags.

use bevy::prelude::*;

/// Marker for the player character
#[derive(Component, Debug)]
pub struct Player;

/// Contact bits reported by the integrator
pub mod collision_flags {
    pub const SIDES: u8 = 1 << 0;
    pub const BELOW: u8 = 1 << 1;
}

/// Kinematic character controller. Gameplay fills `desired_velocity`
/// (horizontal, m/s); the integrator owns the vertical axis and fills the
/// output fields.
#[derive(Component, Debug, Clone)]
pub struct CharacterController {
    pub desired_velocity: Vec3,

    pub apply_gravity: bool,
    pub vertical_velocity: f32,

    // Outputs.
    pub on_ground: bool,
    pub collision_flags: u8,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self {
            desired_velocity: Vec3::ZERO,
            apply_gravity: true,
            vertical_velocity: 0.0,
            on_ground: true,
            collision_flags: 0,
        }
    }
}
