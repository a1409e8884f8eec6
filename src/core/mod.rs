//! Core domain: run-level flags shared by every gameplay system.

use bevy::prelude::*;
use std::collections::HashSet;

/// Gameplay is paused while any source holds a pause.
#[derive(Resource, Debug, Default)]
pub struct GameplayPaused {
    pub sources: HashSet<String>,
}

impl GameplayPaused {
    pub fn is_paused(&self) -> bool {
        !self.sources.is_empty()
    }

    pub fn pause(&mut self, source: impl Into<String>) {
        self.sources.insert(source.into());
    }

    pub fn unpause(&mut self, source: impl Into<String>) {
        self.sources.remove(&source.into());
    }
}

/// World-level switch for the combat pipeline. Turning it off makes both
/// combat phases inert until re-enabled.
#[derive(Resource, Debug)]
pub struct CombatActive(pub bool);

impl Default for CombatActive {
    fn default() -> Self {
        Self(true)
    }
}

/// Run condition: gameplay not paused
pub fn gameplay_active(paused: Res<GameplayPaused>) -> bool {
    !paused.is_paused()
}

/// Run condition for the combat pipeline
pub fn combat_active(active: Res<CombatActive>, paused: Res<GameplayPaused>) -> bool {
    active.0 && !paused.is_paused()
}

pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameplayPaused>()
            .init_resource::<CombatActive>();
    }
}
