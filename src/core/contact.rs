//! Contact value types crossing the boundary, and the listener extension
//! point that receives them.

use glam::Vec3;

use crate::config::{MAX_FACE_POINTS, MAX_MANIFOLD_POINTS};
use crate::core::body::Body;
use crate::core::id::{BodyId, SubShapeId, SubShapeIdPair};
use crate::math::{F32x4, RVec3, RealX4, U32x1Pad};

/// Verdict returned by a contact-validate callback.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateResult {
    /// Accept this and any further contact for this body pair.
    AcceptAllContacts = 0,
    /// Accept this contact only.
    AcceptContact = 1,
    /// Reject this contact only.
    RejectContact = 2,
    /// Reject this and any further contact for this body pair.
    RejectAllContacts = 3,
}

/// Fixed-capacity list of world-space points, stored relative to a manifold's
/// base offset.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ContactPoints<const N: usize> {
    pub num_points: U32x1Pad,
    pub points: [F32x4; N],
}

impl<const N: usize> Default for ContactPoints<N> {
    fn default() -> Self {
        Self {
            num_points: U32x1Pad(0),
            points: [F32x4::ZERO; N],
        }
    }
}

impl<const N: usize> ContactPoints<N> {
    pub fn push(&mut self, point: Vec3) {
        let n = self.num_points.0 as usize;
        if n < N {
            self.points[n] = F32x4::from_vec3(point);
            self.num_points.0 += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.num_points.0 as usize
    }

    pub fn is_empty(&self) -> bool {
        self.num_points.0 == 0
    }
}

/// Contact surface between two shapes during one step. Points are stored
/// relative to `base_offset` to keep them accurate in double-precision
/// worlds.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactManifold {
    pub base_offset: RealX4,
    /// World-space normal, pointing from shape 1 towards shape 2.
    pub normal: F32x4,
    pub penetration_depth: f32,
    pub shape1_sub_shape_id: SubShapeId,
    pub shape2_sub_shape_id: SubShapeId,
    pub shape1_relative_contact: ContactPoints<MAX_MANIFOLD_POINTS>,
    pub shape2_relative_contact: ContactPoints<MAX_MANIFOLD_POINTS>,
}

impl ContactManifold {
    pub fn base_offset(&self) -> RVec3 {
        self.base_offset.to_rvec3()
    }

    pub fn normal(&self) -> Vec3 {
        self.normal.to_vec3()
    }
}

/// Per-pair response parameters a contact listener may rewrite in place.
/// The core reads these back after every added/persisted notification.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ContactSettings {
    pub combined_friction: f32,
    pub combined_restitution: f32,
    pub is_sensor: bool,
}

impl ContactSettings {
    pub fn for_pair(body1: &Body, body2: &Body) -> Self {
        Self {
            combined_friction: (body1.friction * body2.friction).sqrt(),
            combined_restitution: body1.restitution.max(body2.restitution),
            is_sensor: body1.is_sensor() || body2.is_sensor(),
        }
    }
}

/// Deepest-point result handed to validate callbacks before a manifold is
/// built.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct CollideShapeResult {
    pub shape1_contact_point: F32x4,
    pub shape2_contact_point: F32x4,
    /// World-space penetration axis, pointing from shape 1 towards shape 2.
    pub penetration_axis: F32x4,
    pub penetration_depth: f32,
    pub shape1_sub_shape_id: SubShapeId,
    pub shape2_sub_shape_id: SubShapeId,
    pub body2_id: BodyId,
    pub shape1_face: ContactPoints<MAX_FACE_POINTS>,
    pub shape2_face: ContactPoints<MAX_FACE_POINTS>,
}

/// Receives contact lifecycle notifications during an update. Implementations
/// must tolerate being called for many pairs per step.
pub trait ContactEvents: Send + Sync {
    fn on_contact_validate(
        &self,
        body1: &Body,
        body2: &Body,
        base_offset: RVec3,
        collision_result: &CollideShapeResult,
    ) -> ValidateResult;

    fn on_contact_added(
        &self,
        body1: &Body,
        body2: &Body,
        manifold: &ContactManifold,
        settings: &mut ContactSettings,
    );

    fn on_contact_persisted(
        &self,
        body1: &Body,
        body2: &Body,
        manifold: &ContactManifold,
        settings: &mut ContactSettings,
    );

    fn on_contact_removed(&self, sub_shape_pair: &SubShapeIdPair);
}
