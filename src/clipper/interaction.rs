use bevy::prelude::*;

use super::{Clipper, ViewType, clip_selection, refresh_scene_bounds, split_selection};

pub(super) fn add_observers(app: &mut App) {
    app.add_observer(on_toggle_clip_mode)
        .add_observer(on_place_clip_point)
        .add_observer(on_drag_clip_point)
        .add_observer(on_release_clip_point)
        .add_observer(on_flip_clip)
        .add_observer(on_reset_clip_points)
        .add_observer(on_clip_selection)
        .add_observer(on_split_selection);
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Event, Debug, Clone, Copy)]
pub struct ToggleClipMode {
    pub enabled: bool,
}

/// Pointer pressed in a 2D view at `point` (world space). Grabs the clip point
/// under the cursor if there is one, otherwise places a new point.
#[derive(Event, Debug, Clone, Copy)]
pub struct PlaceClipPoint {
    pub point: Vec3,
    pub view_type: ViewType,
    /// Pixels per world unit.
    pub scale: f32,
}

/// Pointer moved while a clip point is grabbed.
#[derive(Event, Debug, Clone, Copy)]
pub struct DragClipPoint {
    pub point: Vec3,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct ReleaseClipPoint;

#[derive(Event, Debug, Clone, Copy)]
pub struct FlipClip;

#[derive(Event, Debug, Clone, Copy)]
pub struct ResetClipPoints;

#[derive(Event, Debug, Clone, Copy)]
pub struct ClipSelection;

#[derive(Event, Debug, Clone, Copy)]
pub struct SplitSelection;

// ---------------------------------------------------------------------------
// Observers
// ---------------------------------------------------------------------------

fn on_toggle_clip_mode(event: On<ToggleClipMode>, mut commands: Commands) {
    let enabled = event.enabled;
    commands.queue(move |world: &mut World| {
        refresh_scene_bounds(world);
        world.resource_mut::<Clipper>().on_clip_mode(enabled);
    });
}

fn on_place_clip_point(event: On<PlaceClipPoint>, mut commands: Commands) {
    let PlaceClipPoint {
        point,
        view_type,
        scale,
    } = *event;
    commands.queue(move |world: &mut World| {
        if !world.resource::<Clipper>().clip_mode() {
            return;
        }
        refresh_scene_bounds(world);
        let mut clipper = world.resource_mut::<Clipper>();
        clipper.set_view(view_type, scale);
        if let Some(index) = clipper.find(point, view_type, scale) {
            clipper.set_moving_clip(Some(index));
        } else {
            let index = clipper.new_clip_point(point);
            clipper.set_moving_clip(Some(index));
        }
    });
}

fn on_drag_clip_point(event: On<DragClipPoint>, mut clipper: ResMut<Clipper>) {
    let Some(index) = clipper.moving_clip() else {
        return;
    };
    let Some(clip_point) = clipper.clip_point(index) else {
        return;
    };
    // Depth stays where it was; only the view's screen axes follow the pointer.
    let (x, y) = clipper.view_type().screen_axes();
    let mut coords = clip_point.coords;
    coords[x] = event.point[x];
    coords[y] = event.point[y];
    clipper.set_clip_point_coords(index, coords);
}

fn on_release_clip_point(_event: On<ReleaseClipPoint>, mut clipper: ResMut<Clipper>) {
    clipper.set_moving_clip(None);
}

fn on_flip_clip(_event: On<FlipClip>, mut clipper: ResMut<Clipper>) {
    if clipper.clip_mode() {
        clipper.flip_clip();
    }
}

fn on_reset_clip_points(_event: On<ResetClipPoints>, mut clipper: ResMut<Clipper>) {
    clipper.reset();
    clipper.set_moving_clip(None);
    clipper.update();
}

fn on_clip_selection(_event: On<ClipSelection>, mut commands: Commands) {
    commands.queue(|world: &mut World| {
        clip_selection(world);
    });
}

fn on_split_selection(_event: On<SplitSelection>, mut commands: Commands) {
    commands.queue(|world: &mut World| {
        split_selection(world);
    });
}

// ---------------------------------------------------------------------------
// Keyboard shortcuts
// ---------------------------------------------------------------------------

/// Enter clips, Shift+Enter splits, Ctrl+Enter flips, Escape drops the points.
pub(super) fn handle_clip_keys(world: &mut World) {
    if !world.resource::<Clipper>().clip_mode() {
        return;
    }

    let keyboard = world.resource::<ButtonInput<KeyCode>>();
    let ctrl = keyboard.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]);
    let shift = keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
    let enter_pressed = keyboard.any_just_pressed([KeyCode::Enter, KeyCode::NumpadEnter]);
    let escape_pressed = keyboard.just_pressed(KeyCode::Escape);

    if enter_pressed && ctrl {
        world.resource_mut::<Clipper>().flip_clip();
    } else if enter_pressed && shift {
        split_selection(world);
    } else if enter_pressed {
        clip_selection(world);
    } else if escape_pressed {
        world.trigger(ResetClipPoints);
    }
}
