pub mod brush;
pub mod clipper;
pub mod scene;
pub mod selection;
pub mod settings;
pub mod texture_browser;

use bevy::prelude::*;

pub use clipper::{Clipper, ClipperPlugin};

/// Brush clip tool: brushes, selection, undo history, texture choice, clipper
/// settings and the clipper itself.
pub struct CleavePlugin;

impl Plugin for CleavePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            cleave_commands::CommandHistoryPlugin,
            brush::BrushPlugin,
            selection::SelectionPlugin,
            texture_browser::TextureBrowserPlugin,
            settings::ClipperSettingsPlugin,
            clipper::ClipperPlugin,
        ));
    }
}
