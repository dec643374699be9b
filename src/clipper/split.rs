use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bevy::prelude::*;
use cleave_commands::EditorCommand;
use cleave_geometry::{Plane3, TextureProjection};

use crate::brush::Brush;
use crate::scene::{brush_to_world, despawn_brush, is_visible, spawn_brush};
use crate::selection::{Selected, select_entity};

/// Which part of a cut brush survives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Reflect)]
pub enum BrushSplit {
    /// Keep what lies in front of the clip plane.
    Front,
    /// Keep what lies behind the clip plane.
    Back,
    /// Keep both halves as separate brushes.
    FrontAndBack,
}

/// Shader and projection stamped on a newly created face.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceTexturing {
    pub shader: String,
    pub projection: TextureProjection,
}

impl FaceTexturing {
    pub fn new(shader: impl Into<String>) -> Self {
        Self {
            shader: shader.into(),
            projection: TextureProjection::default(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("brush left with no faces after split")]
    EmptyBrush,
    #[error("fragment left with no faces after split")]
    EmptyFragment,
}

/// What cutting one brush amounts to.
#[derive(Clone, Debug, PartialEq)]
pub enum BrushCut {
    /// Not touched by the plane, or entirely on the kept side.
    Untouched,
    /// Entirely on the discarded side.
    Discard,
    /// Cut through. `kept` replaces the original; `fragment` is the other half
    /// when both halves are kept.
    Trimmed { kept: Brush, fragment: Option<Brush> },
}

/// The shader used most often on `brush`, with the projection of the face that
/// made it the leader. Ties go to the shader that reached the count first.
/// Without any repeated shader the fallback wins.
pub fn determine_dominant_shader(brush: &Brush, fallback: &FaceTexturing) -> FaceTexturing {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut best: Option<(&str, TextureProjection)> = None;
    let mut best_count = 0;

    for face in &brush.faces {
        let count = counts.entry(face.shader.as_str()).or_default();
        *count += 1;
        if *count > best_count {
            best_count = *count;
            best = Some((face.shader.as_str(), face.projection));
        }
    }

    match best {
        Some((shader, projection)) if best_count > 1 => FaceTexturing {
            shader: shader.to_string(),
            projection,
        },
        _ => fallback.clone(),
    }
}

/// Decide what happens to `brush` when cut by the plane through `points`.
///
/// `points` must be in the brush's local space. The plane's front side is where
/// `(p0 - p1) × (p2 - p1)` points.
pub fn split_brush(
    brush: &Brush,
    points: [Vec3; 3],
    split: BrushSplit,
    fallback: &FaceTexturing,
) -> Result<BrushCut, SplitError> {
    let [p0, p1, p2] = points;
    let plane = Plane3::from_points(p0, p1, p2);
    if !plane.is_valid() {
        return Ok(BrushCut::Untouched);
    }

    // The face added to the original bounds the kept half; its front is discarded.
    let kept_face = match split {
        BrushSplit::Front => plane.flipped(),
        BrushSplit::Back | BrushSplit::FrontAndBack => plane,
    };
    let classification = brush.classify_plane(&kept_face);

    if classification.straddles() {
        let texturing = determine_dominant_shader(brush, fallback);

        let fragment = if split == BrushSplit::FrontAndBack {
            let mut fragment = brush.clone();
            if let Some(index) = fragment.add_plane(p0, p1, p2, &texturing.shader, texturing.projection) {
                fragment.flip_face(index);
            }
            fragment.remove_empty_faces();
            if fragment.is_empty() {
                return Err(SplitError::EmptyFragment);
            }
            Some(fragment)
        } else {
            None
        };

        let mut kept = brush.clone();
        if let Some(index) = kept.add_plane(p0, p1, p2, &texturing.shader, texturing.projection) {
            if split == BrushSplit::Front {
                kept.flip_face(index);
            }
        }
        kept.remove_empty_faces();
        if kept.is_empty() {
            return Err(SplitError::EmptyBrush);
        }

        Ok(BrushCut::Trimmed { kept, fragment })
    } else if split != BrushSplit::FrontAndBack && classification.front() > 0 {
        Ok(BrushCut::Discard)
    } else {
        Ok(BrushCut::Untouched)
    }
}

// ---------------------------------------------------------------------------
// Scene-level orchestration
// ---------------------------------------------------------------------------

/// A brush that left or entered the scene during a split. The entity id changes
/// whenever undo/redo respawns it; clones share the live id.
#[derive(Debug, Clone)]
pub struct DetachedBrush {
    entity: Arc<Mutex<Entity>>,
    pub brush: Brush,
    pub transform: Transform,
    pub parent: Option<Entity>,
    pub selected: bool,
}

impl DetachedBrush {
    pub fn entity(&self) -> Entity {
        *self.entity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn respawn(&self, world: &mut World) {
        let parent = self.parent.filter(|&p| world.get_entity(p).is_ok());
        let entity = spawn_brush(world, self.brush.clone(), self.transform, parent);
        if self.selected {
            select_entity(world, entity);
        }
        *self.entity.lock().unwrap_or_else(PoisonError::into_inner) = entity;
    }

    fn despawn(&self, world: &mut World) {
        despawn_brush(world, self.entity());
    }
}

#[derive(Debug, Clone)]
pub struct TrimmedBrush {
    pub entity: Entity,
    pub old: Brush,
    pub new: Brush,
}

/// Everything one split changed in the scene.
#[derive(Debug, Default, Clone)]
pub struct SplitOutcome {
    pub trimmed: Vec<TrimmedBrush>,
    pub removed: Vec<DetachedBrush>,
    pub inserted: Vec<DetachedBrush>,
}

impl SplitOutcome {
    pub fn is_empty(&self) -> bool {
        self.trimmed.is_empty() && self.removed.is_empty() && self.inserted.is_empty()
    }

    pub fn inserted_entities(&self) -> Vec<Entity> {
        self.inserted.iter().map(DetachedBrush::entity).collect()
    }

    pub fn removed_entities(&self) -> Vec<Entity> {
        self.removed.iter().map(DetachedBrush::entity).collect()
    }
}

struct PendingFragment {
    brush: Brush,
    transform: Transform,
    parent: Option<Entity>,
}

/// Cuts a set of brushes with one plane.
///
/// Brushes that get trimmed are rewritten during [`visit`](Self::visit); spawning
/// fragments and despawning discarded brushes waits for [`finalize`](Self::finalize)
/// so the caller's brush list stays valid while it is walked.
pub struct BrushByPlaneClipper {
    points: [Vec3; 3],
    split: BrushSplit,
    fallback: FaceTexturing,
    trimmed: Vec<TrimmedBrush>,
    remove_list: Vec<Entity>,
    insert_list: Vec<PendingFragment>,
}

impl BrushByPlaneClipper {
    /// `points` are in world space.
    pub fn new(points: [Vec3; 3], split: BrushSplit, fallback: FaceTexturing) -> Self {
        Self {
            points,
            split,
            fallback,
            trimmed: Vec::new(),
            remove_list: Vec::new(),
            insert_list: Vec::new(),
        }
    }

    pub fn visit(&mut self, world: &mut World, entity: Entity) {
        if !is_visible(world, entity) {
            return;
        }
        let Some(brush) = world.get::<Brush>(entity) else {
            return;
        };

        let to_local = brush_to_world(world, entity).inverse();
        let mut local_points = self.points.map(|p| to_local.transform_point3(p));
        // A mirroring transform reverses the winding, and with it the plane's front.
        if to_local.matrix3.determinant() < 0.0 {
            local_points.swap(0, 1);
        }

        match split_brush(brush, local_points, self.split, &self.fallback) {
            Ok(BrushCut::Untouched) => {}
            Ok(BrushCut::Discard) => self.remove_list.push(entity),
            Ok(BrushCut::Trimmed { kept, fragment }) => {
                let old = brush.clone();
                if let Some(fragment) = fragment {
                    self.insert_list.push(PendingFragment {
                        brush: fragment,
                        transform: world.get::<Transform>(entity).copied().unwrap_or_default(),
                        parent: world.get::<ChildOf>(entity).map(|c| c.0),
                    });
                }
                if let Some(mut brush) = world.get_mut::<Brush>(entity) {
                    *brush = kept.clone();
                }
                self.trimmed.push(TrimmedBrush {
                    entity,
                    old,
                    new: kept,
                });
            }
            Err(err) => {
                if cfg!(debug_assertions) {
                    panic!("{err} (brush {entity})");
                }
                error!("Skipping brush {entity}: {err}");
            }
        }
    }

    /// Apply the deferred removals and insertions.
    pub fn finalize(self, world: &mut World) -> SplitOutcome {
        let mut outcome = SplitOutcome {
            trimmed: self.trimmed,
            ..default()
        };

        for entity in self.remove_list {
            let Some(brush) = world.get::<Brush>(entity).cloned() else {
                continue;
            };
            outcome.removed.push(DetachedBrush {
                entity: Arc::new(Mutex::new(entity)),
                brush,
                transform: world.get::<Transform>(entity).copied().unwrap_or_default(),
                parent: world.get::<ChildOf>(entity).map(|c| c.0),
                selected: world.get::<Selected>(entity).is_some(),
            });
            despawn_brush(world, entity);
        }

        for pending in self.insert_list {
            let entity = spawn_brush(world, pending.brush.clone(), pending.transform, pending.parent);
            select_entity(world, entity);
            outcome.inserted.push(DetachedBrush {
                entity: Arc::new(Mutex::new(entity)),
                brush: pending.brush,
                transform: pending.transform,
                parent: pending.parent,
                selected: true,
            });
        }

        outcome
    }
}

// ---------------------------------------------------------------------------
// Undo command
// ---------------------------------------------------------------------------

/// Undo record of one clip or split.
pub struct SplitBrushes {
    pub outcome: SplitOutcome,
    pub label: String,
}

impl EditorCommand for SplitBrushes {
    fn execute(&self, world: &mut World) {
        for trimmed in &self.outcome.trimmed {
            if let Some(mut brush) = world.get_mut::<Brush>(trimmed.entity) {
                *brush = trimmed.new.clone();
            }
        }
        for removed in &self.outcome.removed {
            removed.despawn(world);
        }
        for inserted in &self.outcome.inserted {
            inserted.respawn(world);
        }
    }

    fn undo(&self, world: &mut World) {
        for inserted in &self.outcome.inserted {
            inserted.despawn(world);
        }
        for removed in &self.outcome.removed {
            removed.respawn(world);
        }
        for trimmed in &self.outcome.trimmed {
            if let Some(mut brush) = world.get_mut::<Brush>(trimmed.entity) {
                *brush = trimmed.old.clone();
            }
        }
    }

    fn description(&self) -> &str {
        &self.label
    }
}
