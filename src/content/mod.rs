//! Content module: data-driven configuration.
//!
//! Loads the combat session config from `assets/data/combat.ron` when the
//! file exists; otherwise the compiled-in defaults apply. A malformed file
//! logs a structured error and falls back rather than aborting the boot.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use ron::Options;

use crate::combat::CombatConfig;

/// Error type for content loading failures.
#[derive(Debug)]
pub struct ContentLoadError {
    pub file: String,
    pub message: String,
}

impl fmt::Display for ContentLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load {}: {}", self.file, self.message)
    }
}

fn ron_options() -> Options {
    Options::default().with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
}

/// Loads a single RON struct from `path`.
fn load_single_file<T>(path: &Path) -> Result<T, ContentLoadError>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let file_name = path.display().to_string();
    let contents = fs::read_to_string(path).map_err(|e| ContentLoadError {
        file: file_name.clone(),
        message: format!("IO error: {}", e),
    })?;

    ron_options()
        .from_str(&contents)
        .map_err(|e| ContentLoadError {
            file: file_name,
            message: format!("parse error: {}", e),
        })
}

pub fn load_combat_config(base_path: &Path) -> Result<CombatConfig, ContentLoadError> {
    load_single_file(&base_path.join("combat.ron"))
}

pub struct ContentPlugin;

impl Plugin for ContentPlugin {
    fn build(&self, app: &mut App) {
        let base_path = PathBuf::from("assets/data");
        let config = if base_path.join("combat.ron").is_file() {
            match load_combat_config(&base_path) {
                Ok(config) => config,
                Err(err) => {
                    warn!("{err}; using combat defaults");
                    CombatConfig::default()
                }
            }
        } else {
            CombatConfig::default()
        };
        app.insert_resource(config);
    }
}
