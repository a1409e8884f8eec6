//! Combat domain: session configuration.

use bevy::prelude::*;
use serde::Deserialize;

/// Session tuning, optionally loaded from `assets/data/combat.ron`. Every
/// field has a safe default so a missing or partial file still boots.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Scene-name fallbacks used when the marker lookup finds nothing.
    pub player_name: String,
    pub boss_name: String,
    pub auto_resolve_by_name: bool,

    /// Gates the chatty per-tick log lines.
    pub enable_logs: bool,

    pub player_can_be_hitstunned: bool,
    pub boss_can_be_hitstunned: bool,

    /// Cross-fade duration between the base layer and an override clip.
    pub anim_blend_secs: f32,
    pub idle_clip: String,
    pub move_clip: String,
    pub move_blend_speed: f32,

    /// Clip that plays back slowed down while the player attacks.
    pub attack_slow_clip: String,
    pub attack_slow_speed: f32,

    /// Yaw offset applied when facing the move direction.
    pub rotation_offset_deg: f32,

    /// Seed for the boss brain's cooldown jitter.
    pub brain_seed: u64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            player_name: "Player".to_string(),
            boss_name: "Boss".to_string(),
            auto_resolve_by_name: true,
            enable_logs: false,
            player_can_be_hitstunned: true,
            boss_can_be_hitstunned: true,
            anim_blend_secs: 0.15,
            idle_clip: "idle".to_string(),
            move_clip: "walk".to_string(),
            move_blend_speed: 8.0,
            attack_slow_clip: String::new(),
            attack_slow_speed: 0.6,
            rotation_offset_deg: 0.0,
            brain_seed: 0,
        }
    }
}
