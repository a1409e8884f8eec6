//! Combat domain: state-driven animation override bookkeeping.
//!
//! The base layer is hijacked for attack/dodge/guard clips and restored when
//! the state ends, cross-fading over the configured blend time. While no
//! override holds, the base layer carries an idle/walk blend.

use bevy::prelude::*;

use crate::animation::{AnimLayer, AnimationRig};
use crate::combat::components::{AttackClipKind, AttackClipSource, AttackDriver};
use crate::combat::resources::CombatConfig;
use crate::combat::types::ActionState;

fn smooth_approach(current: f32, target: f32, speed: f32, dt: f32) -> f32 {
    let t = (speed * dt).clamp(0.0, 1.0);
    current + (target - current) * t
}

/// Per-fighter override state: which clip holds the base layer, the saved
/// layer to restore, and the in-flight cross-fade.
#[derive(Debug, Clone, Default)]
pub(crate) struct AnimOverride {
    saved_base: Option<AnimLayer>,
    active: bool,
    blending: bool,
    blending_to_override: bool,
    blend_timer: f32,
    clip: String,
    looped: bool,
}

impl AnimOverride {
    fn begin_to_override(
        &mut self,
        rig: &mut AnimationRig,
        clip: &str,
        looped: bool,
        speed: f32,
        blend_secs: f32,
    ) {
        if !self.active {
            self.saved_base = Some(rig.base.clone());
        }
        self.active = true;
        self.clip = clip.to_string();
        self.looped = looped;

        if blend_secs <= 0.0 {
            rig.base.auto_advance = true;
            rig.base.clip_a = clip.to_string();
            rig.base.clip_b = clip.to_string();
            rig.base.time_a = 0.0;
            rig.base.time_b = 0.0;
            rig.base.speed_a = speed;
            rig.base.speed_b = speed;
            rig.base.loop_a = looped;
            rig.base.loop_b = looped;
            rig.base.blend01 = 0.0;
            self.blending = false;
            self.blending_to_override = true;
            return;
        }

        self.blending = true;
        self.blending_to_override = true;
        self.blend_timer = 0.0;

        rig.base.auto_advance = true;
        rig.base.clip_b = clip.to_string();
        rig.base.time_b = 0.0;
        rig.base.speed_b = speed;
        rig.base.loop_b = looped;
        rig.base.blend01 = 0.0;
    }

    fn begin_to_saved(&mut self, rig: &mut AnimationRig, blend_secs: f32) {
        let Some(saved) = self.saved_base.clone() else {
            self.active = false;
            self.clip.clear();
            self.blending = false;
            return;
        };

        if blend_secs <= 0.0 {
            rig.base = saved;
            rig.base.time_a = 0.0;
            rig.base.time_b = 0.0;
            self.active = false;
            self.clip.clear();
            self.saved_base = None;
            self.blending = false;
            return;
        }

        self.blending = true;
        self.blending_to_override = false;
        self.blend_timer = 0.0;

        rig.base.auto_advance = true;
        rig.base.clip_b = saved.clip_a;
        rig.base.time_b = 0.0;
        rig.base.speed_b = saved.speed_a;
        rig.base.loop_b = saved.loop_a;
        rig.base.blend01 = 0.0;
    }

    fn step(&mut self, rig: &mut AnimationRig, dt: f32, blend_secs: f32) {
        if !self.blending || blend_secs <= 0.0 {
            return;
        }

        self.blend_timer += dt;
        let alpha = (self.blend_timer / blend_secs).min(1.0);
        rig.base.blend01 = alpha;
        if alpha < 1.0 {
            return;
        }

        if self.blending_to_override {
            rig.base.clip_a = self.clip.clone();
            rig.base.time_a = rig.base.time_b;
            rig.base.speed_a = rig.base.speed_b;
            rig.base.loop_a = self.looped;
            rig.base.clip_b = self.clip.clone();
            rig.base.time_b = rig.base.time_a;
            rig.base.blend01 = 0.0;
            self.blending = false;
        } else {
            if let Some(saved) = self.saved_base.take() {
                rig.base = saved;
            }
            rig.base.time_a = 0.0;
            rig.base.time_b = 0.0;
            self.active = false;
            self.clip.clear();
            self.blending = false;
        }
    }
}

/// Drives one fighter's rig from its action state: clip override resolution
/// through the driver's clip table, the idle/walk base blend, and the
/// player-only attack-slow playback rate.
#[allow(clippy::too_many_arguments)]
pub(crate) fn apply_state_animation(
    entity: Entity,
    current: ActionState,
    is_player: bool,
    anim_state: &mut AnimOverride,
    move_blend: &mut f32,
    config: &CombatConfig,
    dt: f32,
    commands: &mut Commands,
    rigs: &mut Query<&mut AnimationRig>,
    drivers: &Query<&AttackDriver>,
) {
    let Ok(mut rig) = rigs.get_mut(entity) else {
        // Attach a rig and pick it up next frame.
        commands.entity(entity).insert(AnimationRig::default());
        return;
    };
    let Ok(driver) = drivers.get(entity) else {
        return;
    };

    rig.enabled = true;
    rig.playing = true;
    rig.upper.enabled = false;
    rig.additive.enabled = false;

    let resolve_clip = |kind: AttackClipKind, rig: &AnimationRig| -> Option<String> {
        driver
            .clips
            .iter()
            .find(|clip| clip.enabled && clip.kind == kind)
            .map(|clip| match clip.source {
                AttackClipSource::BaseA => rig.base.clip_a.clone(),
                AttackClipSource::BaseB => rig.base.clip_b.clone(),
                AttackClipSource::UpperA => rig.upper.clip_a.clone(),
                AttackClipSource::UpperB => rig.upper.clip_b.clone(),
                AttackClipSource::Additive => rig.additive.clip.clone(),
                AttackClipSource::Explicit => clip.clip_name.clone(),
            })
    };

    let (clip_name, looped) = match current {
        ActionState::Attack => (resolve_clip(AttackClipKind::Attack, &rig), false),
        ActionState::Dodge => (resolve_clip(AttackClipKind::Dodge, &rig), false),
        ActionState::Guard => (resolve_clip(AttackClipKind::Guard, &rig), true),
        _ => (None, false),
    };
    let clip_name = clip_name.filter(|name| !name.is_empty());

    let is_locomotion = matches!(current, ActionState::Idle | ActionState::Move);
    if is_locomotion && !anim_state.active && !config.idle_clip.is_empty() {
        let target_blend = if current == ActionState::Move && !config.move_clip.is_empty() {
            1.0
        } else {
            0.0
        };
        *move_blend = smooth_approach(*move_blend, target_blend, config.move_blend_speed, dt);

        rig.base.auto_advance = true;
        rig.base.clip_a = config.idle_clip.clone();
        rig.base.clip_b = if config.move_clip.is_empty() {
            config.idle_clip.clone()
        } else {
            config.move_clip.clone()
        };
        rig.base.loop_a = true;
        rig.base.loop_b = true;
        rig.base.speed_a = 1.0;
        rig.base.speed_b = 1.0;
        rig.base.blend01 = *move_blend;
    }

    let override_speed = match &clip_name {
        Some(name)
            if current == ActionState::Attack
                && is_player
                && !config.attack_slow_clip.is_empty()
                && *name == config.attack_slow_clip =>
        {
            config.attack_slow_speed.max(0.0)
        }
        _ => 1.0,
    };

    if let Some(name) = &clip_name {
        let clip_changed =
            !anim_state.active || anim_state.clip != *name || anim_state.looped != looped;
        if clip_changed {
            anim_state.begin_to_override(
                &mut rig,
                name,
                looped,
                override_speed,
                config.anim_blend_secs,
            );
        }
    } else if anim_state.active && (!anim_state.blending || anim_state.blending_to_override) {
        anim_state.begin_to_saved(&mut rig, config.anim_blend_secs);
    }

    anim_state.step(&mut rig, dt, config.anim_blend_secs);
    if anim_state.active && !anim_state.blending {
        rig.base.speed_a = override_speed;
        rig.base.speed_b = override_speed;
    }
}
