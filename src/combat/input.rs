//! Combat domain: player input sampling into an `Intent`.

use bevy::prelude::*;

use crate::combat::types::Intent;

/// Reads the configured bindings each tick and produces the player's intent.
/// Light vs heavy attack is decided on release against the hold threshold;
/// the parry window is the first `parry_window_secs` of a guard hold.
#[derive(Component, Debug, Clone)]
pub struct PlayerInputSource {
    pub key_forward: KeyCode,
    pub key_backward: KeyCode,
    pub key_left: KeyCode,
    pub key_right: KeyCode,
    pub key_attack: KeyCode,
    pub key_guard: KeyCode,
    pub key_dodge: KeyCode,

    pub use_mouse_attack: bool,
    pub mouse_attack: MouseButton,
    pub mouse_guard: MouseButton,
    pub use_mouse_lock_on: bool,
    pub mouse_lock_on: MouseButton,

    /// Attack held at least this long before release counts as heavy.
    pub attack_hold_threshold_secs: f32,
    pub parry_window_secs: f32,

    attack_held_prev: bool,
    attack_held_secs: f32,
    guard_held_prev: bool,
    guard_held_secs: f32,
}

impl Default for PlayerInputSource {
    fn default() -> Self {
        Self {
            key_forward: KeyCode::KeyW,
            key_backward: KeyCode::KeyS,
            key_left: KeyCode::KeyA,
            key_right: KeyCode::KeyD,
            key_attack: KeyCode::KeyJ,
            key_guard: KeyCode::KeyK,
            key_dodge: KeyCode::Space,
            use_mouse_attack: true,
            mouse_attack: MouseButton::Left,
            mouse_guard: MouseButton::Right,
            use_mouse_lock_on: true,
            mouse_lock_on: MouseButton::Middle,
            attack_hold_threshold_secs: 0.35,
            parry_window_secs: 0.15,
            attack_held_prev: false,
            attack_held_secs: 0.0,
            guard_held_prev: false,
            guard_held_secs: 0.0,
        }
    }
}

impl PlayerInputSource {
    pub fn clear(&mut self) {
        self.attack_held_prev = false;
        self.attack_held_secs = 0.0;
        self.guard_held_prev = false;
        self.guard_held_secs = 0.0;
    }

    pub fn intent(
        &mut self,
        keyboard: &ButtonInput<KeyCode>,
        mouse: &ButtonInput<MouseButton>,
        dt: f32,
    ) -> Intent {
        let mut intent = Intent::default();

        let mut x = 0.0;
        let mut y = 0.0;
        if keyboard.pressed(self.key_left) {
            x -= 1.0;
        }
        if keyboard.pressed(self.key_right) {
            x += 1.0;
        }
        if keyboard.pressed(self.key_forward) {
            y += 1.0;
        }
        if keyboard.pressed(self.key_backward) {
            y -= 1.0;
        }
        intent.move_axis = Vec2::new(x, y);

        let attack_pressed = keyboard.just_pressed(self.key_attack)
            || (self.use_mouse_attack && mouse.just_pressed(self.mouse_attack));
        let attack_held = keyboard.pressed(self.key_attack)
            || (self.use_mouse_attack && mouse.pressed(self.mouse_attack));
        let attack_released = !attack_held && self.attack_held_prev;

        if attack_pressed {
            self.attack_held_secs = 0.0;
        }
        if attack_held {
            self.attack_held_secs += dt;
        }

        if attack_released {
            if self.attack_held_secs >= self.attack_hold_threshold_secs {
                intent.heavy_attack_pressed = true;
            } else {
                intent.light_attack_pressed = true;
            }
            self.attack_held_secs = 0.0;
        } else if attack_pressed && !attack_held {
            intent.light_attack_pressed = true;
        }

        intent.attack_pressed = attack_pressed;
        intent.attack_held = attack_held;
        intent.attack_held_secs = if attack_held { self.attack_held_secs } else { 0.0 };

        let guard_pressed = keyboard.just_pressed(self.key_guard)
            || (self.use_mouse_attack && mouse.just_pressed(self.mouse_guard));
        let guard_held = keyboard.pressed(self.key_guard)
            || (self.use_mouse_attack && mouse.pressed(self.mouse_guard));
        let guard_released = !guard_held && self.guard_held_prev;

        if guard_pressed {
            self.guard_held_secs = 0.0;
        }
        if guard_held {
            self.guard_held_secs += dt;
        } else {
            self.guard_held_secs = 0.0;
        }

        intent.guard_pressed = guard_pressed;
        intent.guard_held = guard_held;
        intent.guard_released = guard_released;
        intent.guard_held_secs = if guard_held { self.guard_held_secs } else { 0.0 };
        intent.parry_window_active = guard_held && self.guard_held_secs <= self.parry_window_secs;

        intent.dodge_pressed = keyboard.just_pressed(self.key_dodge);
        if self.use_mouse_lock_on {
            intent.lock_on_toggle = mouse.just_pressed(self.mouse_lock_on);
        }

        self.attack_held_prev = attack_held;
        self.guard_held_prev = guard_held;

        intent
    }
}
