//! Combat domain: boss brain producing a per-frame intent.

use bevy::prelude::*;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::combat::types::Intent;

/// Minimal pressure brain: close the distance, swing when in range and off
/// cooldown. The cooldown carries seeded jitter so the rhythm is not a
/// metronome while staying reproducible run to run.
#[derive(Component, Debug)]
pub struct BossBrain {
    pub attack_range: f32,
    pub attack_cooldown_secs: f32,
    pub cooldown_jitter_secs: f32,
    /// Sideways drift mixed into the advance, for circling pressure.
    pub move_bias: f32,

    cooldown_timer: f32,
    rng: ChaCha8Rng,
}

impl BossBrain {
    pub fn seeded(seed: u64) -> Self {
        Self {
            attack_range: 2.5,
            attack_cooldown_secs: 2.0,
            cooldown_jitter_secs: 0.5,
            move_bias: 0.35,
            cooldown_timer: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn clear(&mut self) {
        self.cooldown_timer = 0.0;
    }

    pub fn think(
        &mut self,
        own_tf: Option<&Transform>,
        target_tf: Option<&Transform>,
        dt: f32,
    ) -> Intent {
        self.cooldown_timer = (self.cooldown_timer - dt).max(0.0);

        let mut intent = Intent::default();
        let (Some(own_tf), Some(target_tf)) = (own_tf, target_tf) else {
            return intent;
        };

        let delta = target_tf.translation - own_tf.translation;
        let planar = Vec2::new(delta.x, delta.z);
        let dist = planar.length();

        if dist <= self.attack_range && self.cooldown_timer <= 0.0 {
            intent.attack_pressed = true;
            self.cooldown_timer =
                self.attack_cooldown_secs + self.rng.random::<f32>() * self.cooldown_jitter_secs;
        } else {
            let toward = planar.normalize_or_zero();
            let drift = Vec2::new(-toward.y, toward.x) * self.move_bias;
            // Intent axes are (x right, y forward); world Z is forward here.
            let biased = (toward + drift).normalize_or_zero();
            intent.move_axis = Vec2::new(biased.x, biased.y);
        }

        intent
    }
}
