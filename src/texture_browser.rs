use bevy::prelude::*;
use cleave_geometry::DEFAULT_SHADER;

pub struct TextureBrowserPlugin;

impl Plugin for TextureBrowserPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TextureBrowser>()
            .add_observer(handle_select_texture);
    }
}

/// Texture browser state the brush tools read from.
#[derive(Resource, Default, Debug)]
pub struct TextureBrowser {
    /// Shader highlighted in the browser, if any.
    pub selected: Option<String>,
}

impl TextureBrowser {
    /// The shader new faces get when nothing more specific applies.
    pub fn active_shader(&self) -> &str {
        self.selected.as_deref().unwrap_or(DEFAULT_SHADER)
    }
}

/// Make a shader the active one.
#[derive(Event, Debug, Clone)]
pub struct SelectTexture {
    pub shader: String,
}

fn handle_select_texture(event: On<SelectTexture>, mut browser: ResMut<TextureBrowser>) {
    browser.selected = Some(event.shader.clone());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_shader_defaults() {
        let browser = TextureBrowser::default();
        assert_eq!(browser.active_shader(), DEFAULT_SHADER);
    }

    #[test]
    fn select_texture_changes_the_active_shader() {
        let mut world = World::new();
        world.init_resource::<TextureBrowser>();
        world.add_observer(handle_select_texture);

        world.trigger(SelectTexture {
            shader: "textures/base/metal".to_string(),
        });
        assert_eq!(world.resource::<TextureBrowser>().active_shader(), "textures/base/metal");
    }
}
