use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::clipper::Clipper;

pub const DEFAULT_CAULK_SHADER: &str = "textures/common/caulk";
pub const DEFAULT_SETTINGS_FILE: &str = "clipper_settings.json";

pub struct ClipperSettingsPlugin;

impl Plugin for ClipperSettingsPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<ClipperSettings>()
            .init_resource::<ClipperSettings>()
            .init_resource::<ClipperSettingsPath>()
            .add_systems(Startup, load_clipper_settings);
    }
}

/// Persisted clipper preferences.
#[derive(Resource, Reflect, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[reflect(Resource)]
#[serde(default)]
pub struct ClipperSettings {
    /// Stamp `caulk_shader` on new cut faces instead of the active texture.
    pub use_caulk: bool,
    pub caulk_shader: String,
}

impl Default for ClipperSettings {
    fn default() -> Self {
        Self {
            use_caulk: true,
            caulk_shader: DEFAULT_CAULK_SHADER.to_string(),
        }
    }
}

/// Where [`ClipperSettings`] are read from at startup.
#[derive(Resource, Clone, Debug)]
pub struct ClipperSettingsPath(pub PathBuf);

impl Default for ClipperSettingsPath {
    fn default() -> Self {
        Self(PathBuf::from(DEFAULT_SETTINGS_FILE))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to access clipper settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid clipper settings: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ClipperSettings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load from `path`, falling back to defaults. A missing file is not an error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(SettingsError::Io(err)) if err.kind() == ErrorKind::NotFound => Self::default(),
            Err(err) => {
                warn!("Using default clipper settings, {}: {err}", path.display());
                Self::default()
            }
        }
    }
}

fn load_clipper_settings(path: Res<ClipperSettingsPath>, mut settings: ResMut<ClipperSettings>) {
    *settings = ClipperSettings::load_or_default(&path.0);
    debug!(
        "Clipper settings: use_caulk={}, caulk_shader={}",
        settings.use_caulk, settings.caulk_shader
    );
}

/// Push changed preferences into the clipper.
pub(crate) fn sync_clipper_settings(settings: Res<ClipperSettings>, mut clipper: ResMut<Clipper>) {
    if settings.is_changed() {
        clipper.apply_settings(&settings);
    }
}
