//! Animation domain: the data surface the combat session drives.
//!
//! Holds clip names, times, rates and blend weights per layer. Actual
//! skinned playback lives outside this crate; here the layers only advance
//! their clocks so downstream consumers see coherent clip time.

use bevy::prelude::*;

use crate::core::gameplay_active;

/// A two-clip blend layer
#[derive(Debug, Clone)]
pub struct AnimLayer {
    pub enabled: bool,
    pub clip_a: String,
    pub clip_b: String,
    pub time_a: f32,
    pub time_b: f32,
    pub speed_a: f32,
    pub speed_b: f32,
    pub loop_a: bool,
    pub loop_b: bool,
    /// 0 = clip A, 1 = clip B
    pub blend01: f32,
    pub auto_advance: bool,
}

impl Default for AnimLayer {
    fn default() -> Self {
        Self {
            enabled: true,
            clip_a: String::new(),
            clip_b: String::new(),
            time_a: 0.0,
            time_b: 0.0,
            speed_a: 1.0,
            speed_b: 1.0,
            loop_a: true,
            loop_b: true,
            blend01: 0.0,
            auto_advance: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdditiveLayer {
    pub enabled: bool,
    pub clip: String,
    pub time: f32,
    pub speed: f32,
    pub weight: f32,
}

impl Default for AdditiveLayer {
    fn default() -> Self {
        Self {
            enabled: false,
            clip: String::new(),
            time: 0.0,
            speed: 1.0,
            weight: 1.0,
        }
    }
}

#[derive(Component, Debug, Clone, Default)]
pub struct AnimationRig {
    pub enabled: bool,
    pub playing: bool,
    pub base: AnimLayer,
    pub upper: AnimLayer,
    pub additive: AdditiveLayer,
}

fn advance_rigs(time: Res<Time>, mut rigs: Query<&mut AnimationRig>) {
    let dt = time.delta_secs();
    for mut rig in &mut rigs {
        if !rig.enabled || !rig.playing {
            continue;
        }
        let rig = rig.as_mut();
        for layer in [&mut rig.base, &mut rig.upper] {
            if !layer.enabled || !layer.auto_advance {
                continue;
            }
            layer.time_a += dt * layer.speed_a;
            layer.time_b += dt * layer.speed_b;
        }
        if rig.additive.enabled {
            rig.additive.time += dt * rig.additive.speed;
        }
    }
}

pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, advance_rigs.run_if(gameplay_active));
    }
}
