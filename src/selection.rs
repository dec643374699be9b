use bevy::prelude::*;

use crate::brush::Brush;

pub struct SelectionPlugin;

impl Plugin for SelectionPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Selection::default())
            .add_observer(on_selected_removed);
    }
}

/// Marker component placed on selected entities. Multiple entities can have this.
#[derive(Component)]
pub struct Selected;

/// Resource tracking the full selection state.
#[derive(Resource, Default)]
pub struct Selection {
    /// Ordered list of selected entities. The last entity is the primary selection.
    pub entities: Vec<Entity>,
}

impl Selection {
    /// Get the primary (last) selected entity.
    pub fn primary(&self) -> Option<Entity> {
        self.entities.last().copied()
    }

    /// Check if an entity is selected.
    pub fn is_selected(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }
}

// ---------------------------------------------------------------------------
// Exclusive-world helpers (used by scene edits that run outside of systems)
// ---------------------------------------------------------------------------

/// Add `entity` to the selection.
pub fn select_entity(world: &mut World, entity: Entity) {
    let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
        return;
    };
    entity_mut.insert(Selected);
    let mut selection = world.resource_mut::<Selection>();
    if !selection.entities.contains(&entity) {
        selection.entities.push(entity);
    }
}

/// Remove `entity` from the selection without despawning it.
pub fn deselect_entity(world: &mut World, entity: Entity) {
    if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
        entity_mut.remove::<Selected>();
    }
    world.resource_mut::<Selection>().entities.retain(|&e| e != entity);
}

/// Snapshot of the selected entities that carry a [`Brush`], in selection order.
///
/// Returned as an owned list so callers may spawn and despawn while walking it.
pub fn selected_brushes(world: &World) -> Vec<Entity> {
    world
        .resource::<Selection>()
        .entities
        .iter()
        .copied()
        .filter(|&e| world.get::<Brush>(e).is_some())
        .collect()
}

/// Clean up the Selection resource when a Selected component is removed
/// (e.g., entity despawned).
pub(crate) fn on_selected_removed(
    trigger: On<Remove, Selected>,
    mut selection: ResMut<Selection>,
) {
    let entity = trigger.event_target();
    selection.entities.retain(|&e| e != entity);
}
