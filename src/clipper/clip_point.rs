use bevy::prelude::*;

use super::ViewType;

/// Pick radius around a clip point, in screen pixels.
pub const CLIP_POINT_PICK_RADIUS: f32 = 8.0;

/// One of the three points defining the clip plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect)]
pub struct ClipPoint {
    pub coords: Vec3,
    is_set: bool,
}

impl ClipPoint {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set(&mut self, is_set: bool) {
        self.is_set = is_set;
    }

    pub fn is_set(&self) -> bool {
        self.is_set
    }

    /// Screen-space hit test against `cursor` in a 2D view.
    ///
    /// `scale` is pixels per world unit. When this point is set, within the pick
    /// radius and closer than `best_distance` (squared pixels), `best_distance` is
    /// lowered and true is returned.
    pub fn test_select(&self, cursor: Vec3, view_type: ViewType, scale: f32, best_distance: &mut f32) -> bool {
        if !self.is_set {
            return false;
        }
        let (x, y) = view_type.screen_axes();
        let dx = (self.coords[x] - cursor[x]) * scale;
        let dy = (self.coords[y] - cursor[y]) * scale;
        let distance = dx * dx + dy * dy;
        if distance < CLIP_POINT_PICK_RADIUS * CLIP_POINT_PICK_RADIUS && distance < *best_distance {
            *best_distance = distance;
            return true;
        }
        false
    }
}
