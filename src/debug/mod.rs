//! Debug tools: combat state readout and manual reset (dev builds).

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;

use crate::combat::{CombatSession, ForceResetCombat};

/// Logs fighter state transitions as they happen.
fn log_state_changes(
    session: Res<CombatSession>,
    mut previous: Local<Option<(crate::combat::ActionState, crate::combat::ActionState)>>,
) {
    let current = (session.player.state, session.boss.state);
    if *previous != Some(current) {
        info!(
            "combat states: player={:?} boss={:?} (hp {:.0}/{:.0})",
            current.0, current.1, session.player.hp, session.boss.hp
        );
        *previous = Some(current);
    }
}

/// F5 resets the combat session.
fn reset_hotkey(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut requests: MessageWriter<ForceResetCombat>,
) {
    if keyboard.just_pressed(KeyCode::F5) {
        requests.write(ForceResetCombat);
    }
}

/// F6 toggles the gameplay pause.
fn pause_hotkey(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut paused: ResMut<crate::core::GameplayPaused>,
) {
    if keyboard.just_pressed(KeyCode::F6) {
        if paused.is_paused() {
            paused.unpause("debug");
        } else {
            paused.pause("debug");
        }
    }
}

pub struct DebugPlugin;

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (log_state_changes, reset_hotkey, pause_hotkey));
    }
}
