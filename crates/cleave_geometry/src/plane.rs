use std::ops::Neg;

use bevy::prelude::*;

use crate::EPSILON;

/// Oriented plane `normal · x = distance`.
///
/// Points with `normal · x > distance` are in front of the plane. A brush face keeps
/// the half-space behind its plane, so face normals point out of the solid.
#[derive(Clone, Copy, Debug, Reflect, Default, PartialEq)]
pub struct Plane3 {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane3 {
    /// The invalid plane. Used whenever fewer than two clip points are known.
    pub const ZERO: Self = Self {
        normal: Vec3::ZERO,
        distance: 0.0,
    };

    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Plane through three points.
    ///
    /// The normal is `(p0 - p1) × (p2 - p1)`, so walking `p0 → p1 → p2` clockwise
    /// when seen from the front. Collinear or coincident points give [`Plane3::ZERO`].
    pub fn from_points(p0: Vec3, p1: Vec3, p2: Vec3) -> Self {
        let a = p0 - p1;
        let b = p2 - p1;
        let cross = a.cross(b);
        let length = cross.length();
        // |a × b| = |a||b| sin θ, so this rejects near-parallel spans at any scale.
        if length <= EPSILON * a.length() * b.length() || length <= f32::EPSILON {
            return Self::ZERO;
        }
        let normal = cross / length;
        Self {
            normal,
            distance: normal.dot(p0),
        }
    }

    /// A plane is usable when its normal has unit length.
    pub fn is_valid(&self) -> bool {
        (self.normal.length_squared() - 1.0).abs() < 1e-3
    }

    /// Same plane, opposite orientation.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// Signed distance of `point` from the plane (positive in front).
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }

    pub fn classify_point(&self, point: Vec3) -> PlaneSide {
        let d = self.distance_to(point);
        if d > EPSILON {
            PlaneSide::Front
        } else if d < -EPSILON {
            PlaneSide::Back
        } else {
            PlaneSide::On
        }
    }

    /// Identical orientation and offset within [`EPSILON`].
    pub fn approx_eq(&self, other: &Plane3) -> bool {
        self.normal.dot(other.normal) > 1.0 - EPSILON
            && (self.distance - other.distance).abs() < EPSILON
    }
}

impl Neg for Plane3 {
    type Output = Plane3;

    fn neg(self) -> Self::Output {
        self.flipped()
    }
}

/// Which side of a plane a point falls on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect)]
pub enum PlaneSide {
    Front,
    Back,
    On,
}

impl PlaneSide {
    pub const fn index(self) -> usize {
        match self {
            PlaneSide::Front => 0,
            PlaneSide::Back => 1,
            PlaneSide::On => 2,
        }
    }
}

/// Per-side vertex counts of a brush classified against a plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BrushSplitType {
    pub counts: [usize; 3],
}

impl BrushSplitType {
    pub fn count(&self, side: PlaneSide) -> usize {
        self.counts[side.index()]
    }

    pub fn front(&self) -> usize {
        self.count(PlaneSide::Front)
    }

    pub fn back(&self) -> usize {
        self.count(PlaneSide::Back)
    }

    pub fn on(&self) -> usize {
        self.count(PlaneSide::On)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Vertices on both sides: the plane cuts through the solid.
    pub fn straddles(&self) -> bool {
        self.front() > 0 && self.back() > 0
    }

    pub fn record(&mut self, side: PlaneSide) {
        self.counts[side.index()] += 1;
    }
}

impl std::ops::AddAssign for BrushSplitType {
    fn add_assign(&mut self, rhs: Self) {
        for (lhs, rhs) in self.counts.iter_mut().zip(rhs.counts) {
            *lhs += rhs;
        }
    }
}
