mod plane;

use bevy::prelude::*;

pub use plane::{BrushSplitType, Plane3, PlaneSide};

/// Tolerance shared by winding derivation and plane classification.
pub const EPSILON: f32 = 1e-4;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// Shader assigned to faces that never had one.
pub const DEFAULT_SHADER: &str = "_default";

/// Shift/scale/rotation mapping a face plane to texture space.
#[derive(Clone, Copy, Debug, Reflect, PartialEq)]
pub struct TextureProjection {
    pub offset: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
}

impl Default for TextureProjection {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

impl TextureProjection {
    /// Texture coordinates of `point` on a face with the given normal.
    pub fn project(&self, point: Vec3, normal: Vec3) -> Vec2 {
        let (u_axis, v_axis) = compute_face_tangent_axes(normal);
        let (sin_r, cos_r) = self.rotation.sin_cos();
        let u = point.dot(u_axis);
        let v = point.dot(v_axis);
        let ru = u * cos_r - v * sin_r;
        let rv = u * sin_r + v * cos_r;
        Vec2::new(
            ru / self.scale.x.max(0.001) + self.offset.x,
            rv / self.scale.y.max(0.001) + self.offset.y,
        )
    }
}

#[derive(Clone, Debug, Reflect, PartialEq)]
pub struct BrushFaceData {
    pub plane: Plane3,
    /// Shader (material) name, e.g. "textures/common/caulk".
    pub shader: String,
    pub projection: TextureProjection,
}

impl Default for BrushFaceData {
    fn default() -> Self {
        Self {
            plane: Plane3::ZERO,
            shader: DEFAULT_SHADER.to_string(),
            projection: TextureProjection::default(),
        }
    }
}

impl BrushFaceData {
    pub fn new(plane: Plane3, shader: impl Into<String>, projection: TextureProjection) -> Self {
        Self {
            plane,
            shader: shader.into(),
            projection,
        }
    }

    /// Reverse the face so it bounds the opposite half-space.
    pub fn flip_winding(&mut self) {
        self.plane = self.plane.flipped();
    }
}

// ---------------------------------------------------------------------------
// Geometry functions
// ---------------------------------------------------------------------------

/// Solve the intersection of three planes. Returns None if degenerate.
pub fn plane_triple_intersection(p1: &Plane3, p2: &Plane3, p3: &Plane3) -> Option<Vec3> {
    let n1 = p1.normal;
    let n2 = p2.normal;
    let n3 = p3.normal;

    let det = n1.dot(n2.cross(n3));
    if det.abs() < EPSILON {
        return None;
    }

    let point = (n2.cross(n3) * p1.distance + n3.cross(n1) * p2.distance + n1.cross(n2) * p3.distance) / det;
    Some(point)
}

/// Check if a point is inside (or on the boundary of) all half-planes.
pub fn point_inside_all_planes(point: Vec3, faces: &[BrushFaceData]) -> bool {
    faces
        .iter()
        .filter(|face| face.plane.is_valid())
        .all(|face| face.plane.distance_to(point) <= EPSILON)
}

/// Compute brush geometry from face planes.
/// Returns (unique vertices, per-face polygon vertex indices).
///
/// Faces with an invalid plane never produce vertices and get an empty polygon.
pub fn compute_brush_geometry(faces: &[BrushFaceData]) -> (Vec<Vec3>, Vec<Vec<usize>>) {
    let n = faces.len();
    let mut vertices: Vec<Vec3> = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                if !(faces[i].plane.is_valid() && faces[j].plane.is_valid() && faces[k].plane.is_valid()) {
                    continue;
                }
                let Some(point) = plane_triple_intersection(&faces[i].plane, &faces[j].plane, &faces[k].plane)
                else {
                    continue;
                };
                if point_inside_all_planes(point, faces)
                    && !vertices.iter().any(|v| (*v - point).length() < EPSILON)
                {
                    vertices.push(point);
                }
            }
        }
    }

    let mut face_polygons = Vec::with_capacity(n);
    for face in faces {
        let mut face_verts: Vec<usize> = Vec::new();
        if face.plane.is_valid() {
            for (vi, v) in vertices.iter().enumerate() {
                if face.plane.distance_to(*v).abs() < EPSILON {
                    face_verts.push(vi);
                }
            }
        }

        if face_verts.len() >= 3 {
            sort_face_vertices_by_winding(&vertices, &mut face_verts, face.plane.normal);
        }

        face_polygons.push(face_verts);
    }

    (vertices, face_polygons)
}

/// Sort face vertex indices by winding order around the face normal.
pub fn sort_face_vertices_by_winding(vertices: &[Vec3], indices: &mut [usize], normal: Vec3) {
    if indices.len() < 3 {
        return;
    }

    let centroid: Vec3 = indices.iter().map(|&i| vertices[i]).sum::<Vec3>() / indices.len() as f32;
    let (u_axis, v_axis) = compute_face_tangent_axes(normal);

    indices.sort_by(|&a, &b| {
        let da = vertices[a] - centroid;
        let db = vertices[b] - centroid;
        let angle_a = da.dot(v_axis).atan2(da.dot(u_axis));
        let angle_b = db.dot(v_axis).atan2(db.dot(u_axis));
        angle_a.total_cmp(&angle_b)
    });
}

/// Area of a convex polygon given by ordered vertex indices.
pub fn polygon_area(vertices: &[Vec3], indices: &[usize]) -> f32 {
    if indices.len() < 3 {
        return 0.0;
    }
    let origin = vertices[indices[0]];
    let mut doubled = Vec3::ZERO;
    for pair in indices[1..].windows(2) {
        doubled += (vertices[pair[0]] - origin).cross(vertices[pair[1]] - origin);
    }
    doubled.length() * 0.5
}

/// Compute tangent axes for a face from its normal (paraxial projection).
pub fn compute_face_tangent_axes(normal: Vec3) -> (Vec3, Vec3) {
    let abs_n = normal.abs();
    let up = if abs_n.y >= abs_n.x && abs_n.y >= abs_n.z {
        // Mostly Y: use Z as reference
        Vec3::Z
    } else {
        Vec3::Y
    };
    let u = normal.cross(up).normalize_or_zero();
    let v = normal.cross(u).normalize_or_zero();
    (u, v)
}

/// Texture coordinates for the vertices of one face polygon.
pub fn compute_face_uvs(vertices: &[Vec3], indices: &[usize], face: &BrushFaceData) -> Vec<Vec2> {
    indices
        .iter()
        .map(|&vi| face.projection.project(vertices[vi], face.plane.normal))
        .collect()
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Count how many of `vertices` lie in front of, behind, or on `plane`.
///
/// An invalid plane classifies every vertex as `On`, so nothing ever straddles it.
pub fn classify_vertices(vertices: &[Vec3], plane: &Plane3) -> BrushSplitType {
    let mut split = BrushSplitType::default();
    for &vertex in vertices {
        if plane.is_valid() {
            split.record(plane.classify_point(vertex));
        } else {
            split.record(PlaneSide::On);
        }
    }
    split
}
