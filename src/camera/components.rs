//! Camera domain: follow rig components.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    #[default]
    Orbit,
    LockOn,
}

/// Third-person follow rig. The combat session flips the lock-on fields;
/// the follow system keeps yaw in sync so the move basis tracks the camera.
#[derive(Component, Debug, Clone)]
pub struct CameraFollow {
    pub enabled: bool,
    pub target: Option<Entity>,
    pub distance: f32,
    pub height: f32,
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub mode: CameraMode,

    pub enable_lock_on: bool,
    pub lock_on_active: bool,
    pub lock_on_target: Option<Entity>,
}

impl Default for CameraFollow {
    fn default() -> Self {
        Self {
            enabled: true,
            target: None,
            distance: 7.0,
            height: 2.0,
            yaw_deg: 0.0,
            pitch_deg: 15.0,
            mode: CameraMode::Orbit,
            enable_lock_on: true,
            lock_on_active: false,
            lock_on_target: None,
        }
    }
}

/// Aims the camera at an entity while enabled (lock-on framing).
#[derive(Component, Debug, Clone, Default)]
pub struct CameraLookAt {
    pub enabled: bool,
    pub target: Option<Entity>,
}
