use bevy::prelude::*;

use super::Clipper;

const POINT_COLOR: Color = Color::srgb(1.0, 0.3, 0.3);
const PLANE_COLOR: Color = Color::srgba(1.0, 0.3, 0.3, 0.4);
/// Marker radius in screen pixels.
const POINT_RADIUS_PX: f32 = 4.0;

pub(super) fn draw_clip_gizmos(clipper: Res<Clipper>, mut gizmos: Gizmos) {
    if clipper.clip_mode() {
        clipper.draw(&mut gizmos);
    }
}

impl Clipper {
    /// Draw the set points, the outline of the cut they define and the normal
    /// of the kept side. Sizes follow the view scale.
    pub fn draw(&self, gizmos: &mut Gizmos) {
        let world_per_px = 1.0 / self.view_scale().max(f32::EPSILON);
        let radius = POINT_RADIUS_PX * world_per_px;

        for clip_point in self.clip_points().iter().filter(|p| p.is_set()) {
            gizmos.sphere(Isometry3d::from_translation(clip_point.coords), radius, POINT_COLOR);
        }

        let Some(points) = self.plane_points() else {
            return;
        };
        let plane = self.clip_plane();
        if !plane.is_valid() {
            return;
        }
        for i in 0..points.len() {
            gizmos.line(points[i], points[(i + 1) % points.len()], PLANE_COLOR);
        }

        let center = (points[0] + points[1] + points[2]) / 3.0;
        // `clip` keeps what lies in front of the oriented plane.
        gizmos.arrow(center, center + plane.normal * 32.0 * world_per_px, POINT_COLOR);
    }
}
