use bevy::prelude::*;
use cleave_geometry::{
    BrushFaceData, BrushSplitType, Plane3, TextureProjection, classify_vertices, compute_brush_geometry,
    polygon_area, EPSILON,
};

/// Upper bound on faces per brush. `add_plane` refuses to grow past it.
pub const MAX_FACES: usize = 1024;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// Canonical brush data: a convex solid as the intersection of the half-spaces
/// behind each face plane. Geometry is derived from this, in brush-local space.
#[derive(Component, Reflect, Clone, Debug, Default, PartialEq)]
#[reflect(Component, Default)]
pub struct Brush {
    pub faces: Vec<BrushFaceData>,
}

// ---------------------------------------------------------------------------
// Brush constructors
// ---------------------------------------------------------------------------

impl Brush {
    /// Create a cuboid brush centred on the origin.
    pub fn cuboid(half_x: f32, half_y: f32, half_z: f32) -> Self {
        Self::from_bounds(
            Vec3::new(-half_x, -half_y, -half_z),
            Vec3::new(half_x, half_y, half_z),
            cleave_geometry::DEFAULT_SHADER,
        )
    }

    /// Create an axis-aligned box spanning `min..max` with one shader on every face.
    pub fn from_bounds(min: Vec3, max: Vec3, shader: &str) -> Self {
        let planes = [
            Plane3::new(Vec3::X, max.x),
            Plane3::new(Vec3::NEG_X, -min.x),
            Plane3::new(Vec3::Y, max.y),
            Plane3::new(Vec3::NEG_Y, -min.y),
            Plane3::new(Vec3::Z, max.z),
            Plane3::new(Vec3::NEG_Z, -min.z),
        ];
        Self {
            faces: planes
                .into_iter()
                .map(|plane| BrushFaceData::new(plane, shader, TextureProjection::default()))
                .collect(),
        }
    }

    /// Create a brush from explicit planes, all using `shader`.
    pub fn from_planes(planes: impl IntoIterator<Item = Plane3>, shader: &str) -> Self {
        Self {
            faces: planes
                .into_iter()
                .map(|plane| BrushFaceData::new(plane, shader, TextureProjection::default()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Geometry queries and mutation
// ---------------------------------------------------------------------------

impl Brush {
    /// Unique vertices and per-face ordered polygons.
    pub fn geometry(&self) -> (Vec<Vec3>, Vec<Vec<usize>>) {
        compute_brush_geometry(&self.faces)
    }

    pub fn vertices(&self) -> Vec<Vec3> {
        self.geometry().0
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Number of faces whose polygon has a real area.
    pub fn contributing_faces(&self) -> usize {
        let (vertices, polygons) = self.geometry();
        polygons
            .iter()
            .filter(|polygon| polygon.len() >= 3 && polygon_area(&vertices, polygon) > EPSILON)
            .count()
    }

    /// Local-space bounds of the solid, or None when it has no vertices.
    pub fn local_bounds(&self) -> Option<(Vec3, Vec3)> {
        let vertices = self.vertices();
        let first = *vertices.first()?;
        Some(vertices.iter().fold((first, first), |(min, max), v| (min.min(*v), max.max(*v))))
    }

    /// Count brush vertices in front of, behind, and on `plane`.
    pub fn classify_plane(&self, plane: &Plane3) -> BrushSplitType {
        classify_vertices(&self.vertices(), plane)
    }

    /// Append a face through three points. Returns its index, or None when the
    /// points are degenerate, the brush already has that exact plane, or the
    /// face limit is reached.
    pub fn add_plane(
        &mut self,
        p0: Vec3,
        p1: Vec3,
        p2: Vec3,
        shader: &str,
        projection: TextureProjection,
    ) -> Option<usize> {
        if self.faces.len() >= MAX_FACES {
            return None;
        }
        let plane = Plane3::from_points(p0, p1, p2);
        if !plane.is_valid() || self.faces.iter().any(|face| face.plane.approx_eq(&plane)) {
            return None;
        }
        self.faces.push(BrushFaceData::new(plane, shader, projection));
        Some(self.faces.len() - 1)
    }

    /// Reverse one face so it bounds the opposite half-space.
    pub fn flip_face(&mut self, index: usize) -> bool {
        let Some(face) = self.faces.get_mut(index) else {
            return false;
        };
        face.flip_winding();
        true
    }

    /// Drop faces that no longer contribute area to the solid, and any repeat of
    /// a plane already kept. Call after cutting.
    pub fn remove_empty_faces(&mut self) {
        let (vertices, polygons) = self.geometry();
        let mut kept: Vec<BrushFaceData> = Vec::with_capacity(self.faces.len());
        for (face, polygon) in self.faces.iter().zip(&polygons) {
            if polygon.len() < 3 || polygon_area(&vertices, polygon) <= EPSILON {
                continue;
            }
            if kept.iter().any(|k| k.plane.approx_eq(&face.plane)) {
                continue;
            }
            kept.push(face.clone());
        }
        self.faces = kept;
    }
}

pub struct BrushPlugin;

impl Plugin for BrushPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Brush>()
            .register_type::<BrushFaceData>()
            .register_type::<Plane3>()
            .register_type::<TextureProjection>();
    }
}
