mod clip_point;
mod gizmo;
mod interaction;
pub mod split;

use bevy::math::bounding::Aabb3d;
use bevy::prelude::*;
use cleave_commands::CommandHistory;
use cleave_geometry::Plane3;

pub use clip_point::{CLIP_POINT_PICK_RADIUS, ClipPoint};
pub use interaction::{
    ClipSelection, DragClipPoint, FlipClip, PlaceClipPoint, ReleaseClipPoint, ResetClipPoints, SplitSelection,
    ToggleClipMode,
};
pub use split::{
    BrushByPlaneClipper, BrushCut, BrushSplit, FaceTexturing, SplitBrushes, SplitError, SplitOutcome,
    determine_dominant_shader, split_brush,
};

use crate::scene::{default_scene_bounds, scene_bounds};
use crate::selection::selected_brushes;
use crate::settings::{ClipperSettings, sync_clipper_settings};
use crate::texture_browser::TextureBrowser;

pub const NUM_CLIP_POINTS: usize = 3;

pub struct ClipperPlugin;

impl Plugin for ClipperPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<ClipPoint>()
            .register_type::<ViewType>()
            .register_type::<BrushSplit>()
            .init_resource::<Clipper>()
            .add_systems(
                Update,
                (
                    sync_clipper_settings.run_if(resource_exists::<ClipperSettings>),
                    interaction::handle_clip_keys.run_if(resource_exists::<ButtonInput<KeyCode>>),
                    gizmo::draw_clip_gizmos,
                )
                    .chain(),
            );
        interaction::add_observers(app);
    }
}

// ---------------------------------------------------------------------------
// View orientation
// ---------------------------------------------------------------------------

/// Orientation of the 2D view clip points are picked in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum ViewType {
    #[default]
    XY,
    XZ,
    YZ,
}

impl ViewType {
    /// World axes shown horizontally and vertically.
    pub fn screen_axes(self) -> (usize, usize) {
        match self {
            ViewType::XY => (0, 1),
            ViewType::XZ => (0, 2),
            ViewType::YZ => (1, 2),
        }
    }

    /// World axis looking into the screen.
    pub fn normal_axis(self) -> usize {
        match self {
            ViewType::XY => 2,
            ViewType::XZ => 1,
            ViewType::YZ => 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipperState {
    /// Clip mode off.
    Idle,
    /// Clip mode on, not enough points for a plane.
    Picking,
    /// Enough points for a usable plane.
    Ready,
}

// ---------------------------------------------------------------------------
// Clipper resource
// ---------------------------------------------------------------------------

/// The three-point clip tool.
#[derive(Resource, Debug)]
pub struct Clipper {
    view_type: ViewType,
    /// Pixels per world unit of the active 2D view.
    view_scale: f32,
    clip_points: [ClipPoint; NUM_CLIP_POINTS],
    moving_clip: Option<usize>,
    swap_sides: bool,
    clip_plane: Plane3,
    enabled: bool,
    use_caulk: bool,
    caulk_shader: String,
    scene_bounds: Aabb3d,
}

impl Default for Clipper {
    fn default() -> Self {
        Self::new(&ClipperSettings::default())
    }
}

impl Clipper {
    pub fn new(settings: &ClipperSettings) -> Self {
        Self {
            view_type: ViewType::default(),
            view_scale: 1.0,
            clip_points: [ClipPoint::default(); NUM_CLIP_POINTS],
            moving_clip: None,
            swap_sides: false,
            clip_plane: Plane3::ZERO,
            enabled: false,
            use_caulk: settings.use_caulk,
            caulk_shader: settings.caulk_shader.clone(),
            scene_bounds: default_scene_bounds(),
        }
    }

    pub fn apply_settings(&mut self, settings: &ClipperSettings) {
        self.use_caulk = settings.use_caulk;
        self.caulk_shader.clone_from(&settings.caulk_shader);
    }

    pub fn caulk_shader(&self) -> &str {
        &self.caulk_shader
    }

    pub fn use_caulk(&self) -> bool {
        self.use_caulk
    }

    pub fn clip_mode(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> ClipperState {
        if !self.enabled {
            ClipperState::Idle
        } else if self.valid() && self.clip_plane.is_valid() {
            ClipperState::Ready
        } else {
            ClipperState::Picking
        }
    }

    pub fn view_type(&self) -> ViewType {
        self.view_type
    }

    pub fn set_view_type(&mut self, view_type: ViewType) {
        self.view_type = view_type;
    }

    pub fn view_scale(&self) -> f32 {
        self.view_scale
    }

    /// Switch the active 2D view and its zoom.
    pub fn set_view(&mut self, view_type: ViewType, scale: f32) {
        self.view_type = view_type;
        self.view_scale = scale;
    }

    pub fn swap_sides(&self) -> bool {
        self.swap_sides
    }

    pub fn scene_bounds(&self) -> Aabb3d {
        self.scene_bounds
    }

    /// Bounds used to extrude the implicit third point. Takes effect on the next `update`.
    pub fn set_scene_bounds(&mut self, bounds: Aabb3d) {
        self.scene_bounds = bounds;
    }

    pub fn clip_point(&self, index: usize) -> Option<&ClipPoint> {
        self.clip_points.get(index)
    }

    pub fn clip_points(&self) -> &[ClipPoint; NUM_CLIP_POINTS] {
        &self.clip_points
    }

    /// Oriented clip plane, or [`Plane3::ZERO`] when fewer than two points are set.
    pub fn clip_plane(&self) -> Plane3 {
        self.clip_plane
    }

    /// At least the first two points are set.
    pub fn valid(&self) -> bool {
        self.clip_points[0].is_set() && self.clip_points[1].is_set()
    }

    pub fn moving_clip(&self) -> Option<usize> {
        self.moving_clip
    }

    pub fn set_moving_clip(&mut self, index: Option<usize>) {
        self.moving_clip = index.filter(|&i| i < NUM_CLIP_POINTS);
    }

    /// Coordinates of the point being dragged, or of the first point when none is.
    pub fn moving_clip_coords_mut(&mut self) -> &mut Vec3 {
        let index = self.moving_clip.unwrap_or(0);
        &mut self.clip_points[index].coords
    }

    /// Move an existing point (drag) and recompute the plane.
    pub fn set_clip_point_coords(&mut self, index: usize, point: Vec3) {
        let Some(clip_point) = self.clip_points.get_mut(index) else {
            return;
        };
        clip_point.coords = point;
        self.update();
    }

    /// Shader stamped on new cut faces when the cut brush has no dominant one.
    pub fn shader(&self, browser: &TextureBrowser) -> String {
        if self.use_caulk {
            self.caulk_shader.clone()
        } else {
            browser.active_shader().to_string()
        }
    }

    /// Split kind `clip` applies.
    pub fn split_kind(&self) -> BrushSplit {
        if self.swap_sides {
            BrushSplit::Back
        } else {
            BrushSplit::Front
        }
    }

    /// Closest set point under `cursor` in the given view.
    pub fn find(&self, cursor: Vec3, view_type: ViewType, scale: f32) -> Option<usize> {
        let mut best_distance = f32::MAX;
        let mut best = None;
        for (index, clip_point) in self.clip_points.iter().enumerate() {
            if clip_point.test_select(cursor, view_type, scale, &mut best_distance) {
                best = Some(index);
            }
        }
        best
    }

    pub fn reset(&mut self) {
        for clip_point in &mut self.clip_points {
            clip_point.reset();
        }
    }

    pub fn on_clip_mode(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.reset();
        if !enabled {
            self.moving_clip = None;
        }
        self.update();
    }

    /// Fill the first unset point. With all three set, start over from the first.
    pub fn new_clip_point(&mut self, point: Vec3) -> usize {
        let index = match self.clip_points.iter().position(|p| !p.is_set()) {
            Some(index) => index,
            None => {
                self.reset();
                0
            }
        };
        self.clip_points[index].coords = point;
        self.clip_points[index].set(true);
        self.update();
        index
    }

    pub fn flip_clip(&mut self) {
        self.swap_sides = !self.swap_sides;
        self.update();
    }

    /// The three points defining the cut, unoriented by `swap_sides`.
    ///
    /// An unset third point is extruded from the first along the view's depth
    /// axis, spanning the scene bounds. The first two points are moved onto the
    /// near face so the three stay non-collinear.
    pub fn plane_points(&self) -> Option<[Vec3; 3]> {
        if !self.valid() {
            return None;
        }
        let mut points = self.clip_points.map(|p| p.coords);
        if self.clip_points[2].is_set() {
            return Some(points);
        }

        let mins = Vec3::from(self.scene_bounds.min);
        let maxs = Vec3::from(self.scene_bounds.max);
        let n = self.view_type.normal_axis();
        let x = if n == 0 { 1 } else { 0 };
        let y = if n == 2 { 1 } else { 2 };

        // XZ looks along +Y, so the extrusion runs the other way.
        let (near, far) = if n == 1 { (maxs[n], mins[n]) } else { (mins[n], maxs[n]) };
        points[0][n] = near;
        points[1][n] = near;
        points[2][x] = points[0][x];
        points[2][y] = points[0][y];
        points[2][n] = far;
        Some(points)
    }

    /// Recompute the oriented clip plane.
    pub fn update(&mut self) {
        self.clip_plane = match self.plane_points() {
            Some([p0, p1, p2]) if self.swap_sides => Plane3::from_points(p1, p0, p2),
            Some([p0, p1, p2]) => Plane3::from_points(p0, p1, p2),
            None => Plane3::ZERO,
        };
    }
}

// ---------------------------------------------------------------------------
// Scene-level commands
// ---------------------------------------------------------------------------

/// Re-measure the scene so the implicit third point spans it.
pub fn refresh_scene_bounds(world: &mut World) {
    let bounds = scene_bounds(world).unwrap_or_else(default_scene_bounds);
    world.resource_mut::<Clipper>().set_scene_bounds(bounds);
}

/// Trim the selected brushes, keeping one side of the clip plane.
pub fn clip_selection(world: &mut World) -> Option<SplitOutcome> {
    let split = world.resource::<Clipper>().split_kind();
    run_split(world, split, "Clip brushes")
}

/// Cut the selected brushes in two, keeping both halves.
pub fn split_selection(world: &mut World) -> Option<SplitOutcome> {
    run_split(world, BrushSplit::FrontAndBack, "Split brushes")
}

fn run_split(world: &mut World, split: BrushSplit, label: &str) -> Option<SplitOutcome> {
    {
        let clipper = world.resource::<Clipper>();
        if !clipper.clip_mode() || !clipper.valid() {
            return None;
        }
    }
    refresh_scene_bounds(world);

    let clipper = world.resource::<Clipper>();
    let points = clipper.plane_points()?;
    let shader = match world.get_resource::<TextureBrowser>() {
        Some(browser) => clipper.shader(browser),
        None => clipper.shader(&TextureBrowser::default()),
    };

    let mut orchestrator = BrushByPlaneClipper::new(points, split, FaceTexturing::new(shader));
    for entity in selected_brushes(world) {
        orchestrator.visit(world, entity);
    }
    let outcome = orchestrator.finalize(world);

    {
        let mut clipper = world.resource_mut::<Clipper>();
        clipper.reset();
        clipper.update();
    }

    if outcome.is_empty() {
        debug!("{label}: no brush touched by the clip plane");
    } else {
        info!(
            "{label}: {} trimmed, {} removed, {} created",
            outcome.trimmed.len(),
            outcome.removed.len(),
            outcome.inserted.len()
        );
        world.resource_mut::<CommandHistory>().push(Box::new(SplitBrushes {
            outcome: outcome.clone(),
            label: label.to_string(),
        }));
    }
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cleave_geometry::PlaneSide;

    use super::*;
    use crate::brush::Brush;
    use crate::scene::spawn_brush;
    use crate::selection::{Selected, Selection, select_entity};

    fn test_world() -> World {
        let mut world = World::new();
        world.init_resource::<Selection>();
        world.init_resource::<CommandHistory>();
        world.init_resource::<TextureBrowser>();
        world.init_resource::<Clipper>();
        world
    }

    fn selected_box(world: &mut World, min: Vec3, max: Vec3) -> Entity {
        let brush = spawn_brush(world, Brush::from_bounds(min, max, "stone"), Transform::default(), None);
        select_entity(world, brush);
        brush
    }

    fn pick(world: &mut World, points: &[Vec3]) {
        let mut clipper = world.resource_mut::<Clipper>();
        clipper.on_clip_mode(true);
        for &point in points {
            clipper.new_clip_point(point);
        }
    }

    fn z_range(world: &World, entity: Entity) -> (f32, f32) {
        let (min, max) = world.get::<Brush>(entity).unwrap().local_bounds().unwrap();
        (min.z, max.z)
    }

    const Z32: [Vec3; 3] = [
        Vec3::new(0.0, 0.0, 32.0),
        Vec3::new(10.0, 0.0, 32.0),
        Vec3::new(0.0, 10.0, 32.0),
    ];

    #[test]
    fn state_follows_mode_and_points() {
        let mut clipper = Clipper::default();
        assert_eq!(clipper.state(), ClipperState::Idle);
        clipper.on_clip_mode(true);
        assert_eq!(clipper.state(), ClipperState::Picking);
        clipper.new_clip_point(Vec3::ZERO);
        assert!(!clipper.valid());
        assert_eq!(clipper.clip_plane(), Plane3::ZERO);
        clipper.new_clip_point(Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(clipper.state(), ClipperState::Ready);
        clipper.on_clip_mode(false);
        assert_eq!(clipper.state(), ClipperState::Idle);
        assert!(clipper.clip_points().iter().all(|p| !p.is_set()));
    }

    #[test]
    fn fourth_point_restarts_picking() {
        let mut clipper = Clipper::default();
        clipper.on_clip_mode(true);
        for i in 0..3 {
            assert_eq!(clipper.new_clip_point(Vec3::splat(i as f32)), i);
        }
        assert_eq!(clipper.new_clip_point(Vec3::splat(9.0)), 0);
        assert_eq!(clipper.clip_point(0).unwrap().coords, Vec3::splat(9.0));
        assert!(!clipper.clip_point(1).unwrap().is_set());
        assert!(!clipper.valid());
    }

    #[test]
    fn leaving_clip_mode_drops_moving_point() {
        let mut clipper = Clipper::default();
        clipper.on_clip_mode(true);
        clipper.new_clip_point(Vec3::ZERO);
        clipper.set_moving_clip(Some(0));
        *clipper.moving_clip_coords_mut() = Vec3::X;
        assert_eq!(clipper.clip_point(0).unwrap().coords, Vec3::X);
        clipper.on_clip_mode(false);
        assert_eq!(clipper.moving_clip(), None);
    }

    #[test]
    fn synthesized_point_spans_bounds_in_xy() {
        let mut clipper = Clipper::default();
        clipper.set_scene_bounds(Aabb3d {
            min: Vec3::new(-10.0, -10.0, -5.0).into(),
            max: Vec3::new(10.0, 10.0, 50.0).into(),
        });
        clipper.on_clip_mode(true);
        clipper.new_clip_point(Vec3::new(1.0, 2.0, 0.0));
        clipper.new_clip_point(Vec3::new(8.0, 2.0, 0.0));

        let [p0, p1, p2] = clipper.plane_points().unwrap();
        assert_eq!(p0, Vec3::new(1.0, 2.0, -5.0));
        assert_eq!(p1, Vec3::new(8.0, 2.0, -5.0));
        assert_eq!(p2, Vec3::new(1.0, 2.0, 50.0));

        let plane = clipper.clip_plane();
        assert!(plane.is_valid());
        // Vertical plane through y = 2.
        assert_relative_eq!(plane.normal.y.abs(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(plane.distance_to(Vec3::new(0.0, 2.0, 0.0)), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn synthesized_point_in_xz_runs_from_max_to_min() {
        let mut clipper = Clipper::default();
        clipper.set_view_type(ViewType::XZ);
        clipper.on_clip_mode(true);
        clipper.new_clip_point(Vec3::new(0.0, 0.0, 4.0));
        clipper.new_clip_point(Vec3::new(0.0, 0.0, 20.0));

        let [p0, p1, p2] = clipper.plane_points().unwrap();
        assert_eq!(p0.y, 64.0);
        assert_eq!(p1.y, 64.0);
        assert_eq!(p2, Vec3::new(0.0, -64.0, 4.0));
        assert!(clipper.clip_plane().is_valid());
    }

    #[test]
    fn synthesized_point_in_yz() {
        let mut clipper = Clipper::default();
        clipper.set_view_type(ViewType::YZ);
        clipper.on_clip_mode(true);
        clipper.new_clip_point(Vec3::new(0.0, 3.0, 4.0));
        clipper.new_clip_point(Vec3::new(0.0, 30.0, 4.0));

        let [p0, _, p2] = clipper.plane_points().unwrap();
        assert_eq!(p0.x, -64.0);
        assert_eq!(p2, Vec3::new(64.0, 3.0, 4.0));
    }

    #[test]
    fn flip_reverses_the_plane() {
        let mut clipper = Clipper::default();
        clipper.on_clip_mode(true);
        for point in Z32 {
            clipper.new_clip_point(point);
        }
        let before = clipper.clip_plane();
        assert_eq!(before.classify_point(Vec3::ZERO), PlaneSide::Front);

        clipper.flip_clip();
        assert!(clipper.swap_sides());
        assert_eq!(clipper.split_kind(), BrushSplit::Back);
        assert!(clipper.clip_plane().approx_eq(&before.flipped()));
        // Picked points are not reordered.
        assert_eq!(clipper.plane_points().unwrap(), Z32);
    }

    #[test]
    fn find_returns_closest_point() {
        let mut clipper = Clipper::default();
        clipper.on_clip_mode(true);
        clipper.new_clip_point(Vec3::new(0.0, 0.0, 0.0));
        clipper.new_clip_point(Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(clipper.find(Vec3::new(3.0, 0.0, 0.0), ViewType::XY, 1.0), Some(1));
        assert_eq!(clipper.find(Vec3::new(1.0, 0.0, 0.0), ViewType::XY, 1.0), Some(0));
        assert_eq!(clipper.find(Vec3::new(100.0, 0.0, 0.0), ViewType::XY, 1.0), None);
    }

    #[test]
    fn shader_prefers_caulk_when_enabled() {
        let browser = TextureBrowser {
            selected: Some("textures/base/metal".to_string()),
        };
        let mut clipper = Clipper::default();
        assert_eq!(clipper.shader(&browser), "textures/common/caulk");
        clipper.apply_settings(&ClipperSettings {
            use_caulk: false,
            ..default()
        });
        assert_eq!(clipper.shader(&browser), "textures/base/metal");
    }

    #[test]
    fn clip_keeps_the_lower_half() {
        let mut world = test_world();
        let brush = selected_box(&mut world, Vec3::ZERO, Vec3::splat(64.0));
        pick(&mut world, &Z32);

        let outcome = clip_selection(&mut world).unwrap();
        assert_eq!(outcome.trimmed.len(), 1);
        assert!(outcome.inserted.is_empty());

        let (min_z, max_z) = z_range(&world, brush);
        assert_relative_eq!(min_z, 0.0, epsilon = 1e-3);
        assert_relative_eq!(max_z, 32.0, epsilon = 1e-3);
        assert!(world.get::<Brush>(brush).unwrap().faces.iter().all(|f| f.shader == "stone"));

        let clipper = world.resource::<Clipper>();
        assert!(!clipper.valid());
        assert_eq!(clipper.clip_plane(), Plane3::ZERO);
    }

    #[test]
    fn two_point_clips_extrude_along_the_view_axis() {
        // View, picked points, axis the cut runs across, range an unflipped clip keeps.
        let cases = [
            (
                ViewType::XY,
                [Vec3::new(0.0, 32.0, 0.0), Vec3::new(64.0, 32.0, 0.0)],
                1,
                (32.0, 64.0),
            ),
            (
                ViewType::XZ,
                [Vec3::new(0.0, 0.0, 32.0), Vec3::new(64.0, 0.0, 32.0)],
                2,
                (32.0, 64.0),
            ),
            (
                ViewType::YZ,
                [Vec3::new(0.0, 32.0, 0.0), Vec3::new(0.0, 32.0, 64.0)],
                1,
                (0.0, 32.0),
            ),
        ];

        for (view_type, points, axis, kept) in cases {
            for flip in [false, true] {
                let mut world = test_world();
                let brush = selected_box(&mut world, Vec3::ZERO, Vec3::splat(64.0));
                world.resource_mut::<Clipper>().set_view_type(view_type);
                pick(&mut world, &points);
                assert!(!world.resource::<Clipper>().clip_point(2).unwrap().is_set());
                if flip {
                    world.resource_mut::<Clipper>().flip_clip();
                }

                let outcome = clip_selection(&mut world).unwrap();
                assert_eq!(outcome.trimmed.len(), 1, "{view_type:?} flip={flip}");

                let expected = if !flip {
                    kept
                } else if kept.0 == 0.0 {
                    (32.0, 64.0)
                } else {
                    (0.0, 32.0)
                };
                let (min, max) = world.get::<Brush>(brush).unwrap().local_bounds().unwrap();
                assert_relative_eq!(min[axis], expected.0, epsilon = 1e-3);
                assert_relative_eq!(max[axis], expected.1, epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn two_point_split_in_side_view() {
        let mut world = test_world();
        let brush = selected_box(&mut world, Vec3::ZERO, Vec3::splat(64.0));
        world.resource_mut::<Clipper>().set_view_type(ViewType::XZ);
        pick(&mut world, &[Vec3::new(0.0, 0.0, 0.0), Vec3::new(64.0, 0.0, 64.0)]);

        let outcome = split_selection(&mut world).unwrap();
        let fragment = outcome.inserted_entities()[0];
        for entity in [brush, fragment] {
            let (min, max) = world.get::<Brush>(entity).unwrap().local_bounds().unwrap();
            // Diagonal cut: each half still spans the full box in Y.
            assert_relative_eq!(min.y, 0.0, epsilon = 1e-3);
            assert_relative_eq!(max.y, 64.0, epsilon = 1e-3);
            assert_eq!(world.get::<Brush>(entity).unwrap().vertices().len(), 6);
        }
    }

    #[test]
    fn split_keeps_both_halves_selected() {
        let mut world = test_world();
        let brush = selected_box(&mut world, Vec3::ZERO, Vec3::splat(64.0));
        pick(&mut world, &Z32);

        let outcome = split_selection(&mut world).unwrap();
        let fragment = outcome.inserted_entities()[0];

        let (min_z, max_z) = z_range(&world, brush);
        assert_relative_eq!(min_z, 32.0, epsilon = 1e-3);
        assert_relative_eq!(max_z, 64.0, epsilon = 1e-3);
        let (min_z, max_z) = z_range(&world, fragment);
        assert_relative_eq!(min_z, 0.0, epsilon = 1e-3);
        assert_relative_eq!(max_z, 32.0, epsilon = 1e-3);

        assert!(world.get::<Selected>(brush).is_some());
        assert!(world.get::<Selected>(fragment).is_some());
        assert_eq!(world.resource::<Selection>().entities.len(), 2);
    }

    #[test]
    fn one_point_is_a_no_op() {
        let mut world = test_world();
        let brush = selected_box(&mut world, Vec3::ZERO, Vec3::splat(64.0));
        pick(&mut world, &Z32[..1]);

        assert!(clip_selection(&mut world).is_none());
        assert!(split_selection(&mut world).is_none());
        let (min_z, max_z) = z_range(&world, brush);
        assert_relative_eq!(min_z, 0.0, epsilon = 1e-3);
        assert_relative_eq!(max_z, 64.0, epsilon = 1e-3);
        assert!(!world.resource::<CommandHistory>().can_undo());
        // Points survive a refused clip.
        assert!(world.resource::<Clipper>().clip_point(0).unwrap().is_set());
    }

    #[test]
    fn collinear_points_change_nothing() {
        let mut world = test_world();
        let brush = selected_box(&mut world, Vec3::ZERO, Vec3::splat(64.0));
        pick(
            &mut world,
            &[Vec3::ZERO, Vec3::new(10.0, 10.0, 10.0), Vec3::new(20.0, 20.0, 20.0)],
        );
        assert!(!world.resource::<Clipper>().clip_plane().is_valid());
        assert_eq!(world.resource::<Clipper>().state(), ClipperState::Picking);

        let outcome = clip_selection(&mut world).unwrap();
        assert!(outcome.is_empty());
        let (min_z, max_z) = z_range(&world, brush);
        assert_relative_eq!(min_z, 0.0, epsilon = 1e-3);
        assert_relative_eq!(max_z, 64.0, epsilon = 1e-3);
        assert!(!world.resource::<CommandHistory>().can_undo());
    }

    #[test]
    fn clip_outside_clip_mode_is_refused() {
        let mut world = test_world();
        selected_box(&mut world, Vec3::ZERO, Vec3::splat(64.0));
        pick(&mut world, &Z32);
        world.resource_mut::<Clipper>().enabled = false;
        assert!(clip_selection(&mut world).is_none());
    }

    #[test]
    fn clip_removes_brushes_on_the_discarded_side_and_undoes() {
        let mut world = test_world();
        let below = selected_box(&mut world, Vec3::ZERO, Vec3::new(64.0, 64.0, 16.0));
        let above = selected_box(&mut world, Vec3::new(0.0, 0.0, 40.0), Vec3::splat(64.0));
        pick(&mut world, &Z32);

        let outcome = clip_selection(&mut world).unwrap();
        assert_eq!(outcome.removed_entities(), vec![above]);
        assert!(world.get_entity(above).is_err());
        assert_eq!(world.resource::<Selection>().entities, vec![below]);
        assert_eq!(
            world.resource::<CommandHistory>().last_description(),
            Some("Clip brushes")
        );

        assert!(cleave_commands::undo(&mut world));
        assert_eq!(world.query::<&Brush>().iter(&world).count(), 2);
        assert_eq!(world.resource::<Selection>().entities.len(), 2);
    }

    #[test]
    fn flipped_clip_keeps_the_upper_half() {
        let mut world = test_world();
        let brush = selected_box(&mut world, Vec3::ZERO, Vec3::splat(64.0));
        pick(&mut world, &Z32);
        world.resource_mut::<Clipper>().flip_clip();

        clip_selection(&mut world).unwrap();
        let (min_z, max_z) = z_range(&world, brush);
        assert_relative_eq!(min_z, 32.0, epsilon = 1e-3);
        assert_relative_eq!(max_z, 64.0, epsilon = 1e-3);
    }

    #[test]
    fn new_cut_faces_use_the_fallback_without_a_dominant_shader() {
        let mut world = test_world();
        let brush = selected_box(&mut world, Vec3::ZERO, Vec3::splat(64.0));
        {
            let mut brush = world.get_mut::<Brush>(brush).unwrap();
            for (i, face) in brush.faces.iter_mut().enumerate() {
                face.shader = format!("shader_{i}");
            }
        }
        pick(&mut world, &Z32);

        clip_selection(&mut world).unwrap();
        let faces = &world.get::<Brush>(brush).unwrap().faces;
        assert!(faces.iter().any(|f| f.shader == "textures/common/caulk"));
    }
}
