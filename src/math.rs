//! Math primitives shared by the simulation core and the C boundary.
//!
//! World-space coordinates use the `Real` scalar, which widens to `f64` when
//! the `double-precision` feature is enabled. Local-space vectors and
//! rotations always stay `f32`. The aligned wrapper types exist so that
//! structs crossing the C boundary carry the same per-field alignment on both
//! sides of a reinterpreting cast.

use glam::{Quat, Vec3};

/// Scalar used for world-space coordinates.
#[cfg(feature = "double-precision")]
pub type Real = f64;
/// Scalar used for world-space coordinates.
#[cfg(not(feature = "double-precision"))]
pub type Real = f32;

/// World-space position vector.
#[cfg(feature = "double-precision")]
pub type RVec3 = glam::DVec3;
/// World-space position vector.
#[cfg(not(feature = "double-precision"))]
pub type RVec3 = glam::Vec3;

/// Widens a local-space vector to world precision.
#[inline]
pub fn rvec3_from_vec3(v: Vec3) -> RVec3 {
    RVec3::new(v.x as Real, v.y as Real, v.z as Real)
}

/// Narrows a world-space vector to local precision.
#[inline]
pub fn vec3_from_rvec3(v: RVec3) -> Vec3 {
    Vec3::new(v.x as f32, v.y as f32, v.z as f32)
}

/// Four packed floats with SIMD-vector alignment. The fourth lane is storage
/// padding for three-component quantities and the real component for
/// quaternions.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct F32x4(pub [f32; 4]);

impl F32x4 {
    pub const ZERO: Self = Self([0.0; 4]);

    #[inline]
    pub fn from_vec3(v: Vec3) -> Self {
        Self([v.x, v.y, v.z, 0.0])
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.0[0], self.0[1], self.0[2])
    }

    #[inline]
    pub fn from_quat(q: Quat) -> Self {
        Self([q.x, q.y, q.z, q.w])
    }

    #[inline]
    pub fn to_quat(self) -> Quat {
        Quat::from_xyzw(self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

/// Four packed `Real`s holding a world-space position. Alignment widens with
/// the coordinate width so reinterpreted pointers stay SIMD-safe.
#[cfg(feature = "double-precision")]
#[repr(C, align(32))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RealX4(pub [Real; 4]);

/// Four packed `Real`s holding a world-space position.
#[cfg(not(feature = "double-precision"))]
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RealX4(pub [Real; 4]);

impl RealX4 {
    pub const ZERO: Self = Self([0.0; 4]);

    #[inline]
    pub fn from_rvec3(v: RVec3) -> Self {
        Self([v.x, v.y, v.z, 0.0])
    }

    #[inline]
    pub fn to_rvec3(self) -> RVec3 {
        RVec3::new(self.0[0], self.0[1], self.0[2])
    }
}

/// A `u32` padded out to one SIMD lane, mirroring counters that precede
/// aligned point arrays in boundary structs.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct U32x1Pad(pub u32);

/// Sixteen packed floats holding a column-major 4x4 matrix.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct F32x16(pub [f32; 16]);

impl Default for F32x16 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl F32x16 {
    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    #[inline]
    pub fn from_mat4(m: glam::Mat4) -> Self {
        Self(m.to_cols_array())
    }

    #[inline]
    pub fn to_mat4(self) -> glam::Mat4 {
        glam::Mat4::from_cols_array(&self.0)
    }
}

/// Axis-aligned bounding box in world space (single precision; conservative
/// for double-precision positions).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::INVALID
    }
}

impl Aabb {
    /// An empty box that unions as the identity.
    pub const INVALID: Self = Self {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    #[inline]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Intersection of two overlapping boxes.
    #[inline]
    pub fn intersection(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    #[inline]
    pub fn union_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    #[inline]
    pub fn union(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Bounds of this box after rotating it about the origin and translating.
    /// Conservative: rotates the eight corners.
    pub fn transformed(&self, rotation: Quat, translation: Vec3) -> Aabb {
        let mut out = Aabb::INVALID;
        for ix in 0..2 {
            for iy in 0..2 {
                for iz in 0..2 {
                    let corner = Vec3::new(
                        if ix == 0 { self.min.x } else { self.max.x },
                        if iy == 0 { self.min.y } else { self.max.y },
                        if iz == 0 { self.min.z } else { self.max.z },
                    );
                    out.union_point(rotation * corner + translation);
                }
            }
        }
        out
    }
}

/// Advances an orientation by an angular velocity over `dt` using the
/// quaternion derivative, renormalizing afterwards.
pub fn integrate_rotation(rotation: Quat, angular_velocity: Vec3, dt: f32) -> Quat {
    if angular_velocity.length_squared() < 1e-12 {
        return rotation;
    }
    let half_dt = 0.5 * dt;
    let delta = Quat::from_xyzw(
        angular_velocity.x * half_dt,
        angular_velocity.y * half_dt,
        angular_velocity.z * half_dt,
        0.0,
    );
    (rotation + delta * rotation).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn aabb_overlap_is_symmetric() {
        let a = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_center_half_extents(Vec3::new(1.5, 0.0, 0.0), Vec3::ONE);
        let c = Aabb::from_center_half_extents(Vec3::new(5.0, 0.0, 0.0), Vec3::ONE);
        assert!(a.overlaps(&b) && b.overlaps(&a));
        assert!(!a.overlaps(&c) && !c.overlaps(&a));
    }

    #[test]
    fn transformed_bounds_contain_rotated_box() {
        let a = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0));
        let rotated = a.transformed(
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            Vec3::new(0.0, 10.0, 0.0),
        );
        assert_relative_eq!(rotated.center().y, 10.0, epsilon = 1e-5);
        assert_relative_eq!(rotated.half_extents().y, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn rotation_integration_preserves_unit_length() {
        let q = integrate_rotation(Quat::IDENTITY, Vec3::new(0.0, 4.0, 0.0), 1.0 / 60.0);
        assert_relative_eq!(q.length(), 1.0, epsilon = 1e-6);
    }
}
