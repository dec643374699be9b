use bevy::math::bounding::Aabb3d;
use bevy::prelude::*;

use crate::brush::Brush;
use crate::selection::deselect_entity;

/// Fallback used when the scene holds no brushes: origin 0, extents 64.
pub const DEFAULT_SCENE_EXTENT: f32 = 64.0;

pub fn default_scene_bounds() -> Aabb3d {
    Aabb3d::new(Vec3::ZERO, Vec3::splat(DEFAULT_SCENE_EXTENT))
}

/// Spawn a brush entity, optionally under `parent`.
pub fn spawn_brush(world: &mut World, brush: Brush, transform: Transform, parent: Option<Entity>) -> Entity {
    let mut entity = world.spawn((brush, transform, GlobalTransform::from(transform), Visibility::default()));
    if let Some(parent) = parent {
        entity.insert(ChildOf(parent));
    }
    entity.id()
}

/// Remove a brush entity from the scene (and from the selection).
pub fn despawn_brush(world: &mut World, entity: Entity) {
    deselect_entity(world, entity);
    if let Ok(entity_mut) = world.get_entity_mut(entity) {
        entity_mut.despawn();
    }
}

/// Hidden entities are skipped by brush tools.
pub fn is_visible(world: &World, entity: Entity) -> bool {
    !matches!(world.get::<Visibility>(entity), Some(Visibility::Hidden))
}

/// Brush-local to world matrix (identity when the entity has no transform).
pub fn brush_to_world(world: &World, entity: Entity) -> bevy::math::Affine3A {
    world
        .get::<GlobalTransform>(entity)
        .map(|global| global.affine())
        .unwrap_or_default()
}

/// Bounds of every visible brush in world space, or None when there are none.
pub fn scene_bounds(world: &mut World) -> Option<Aabb3d> {
    let mut query = world.query::<(Entity, &Brush)>();
    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    let mut any = false;
    for (entity, brush) in query.iter(world) {
        if !is_visible(world, entity) {
            continue;
        }
        let to_world = brush_to_world(world, entity);
        for vertex in brush.vertices() {
            let p = to_world.transform_point3(vertex);
            min = min.min(p);
            max = max.max(p);
            any = true;
        }
    }
    any.then(|| Aabb3d {
        min: min.into(),
        max: max.into(),
    })
}
