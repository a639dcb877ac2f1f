//! Constraints and constraint settings.
//!
//! Same blueprint/instance split as shapes: settings describe, `create`
//! instantiates a reference-counted constraint bound to two specific bodies.
//! Solving the constraint belongs to the wrapped solver; the core tracks the
//! bindings and exposes the lifetime protocol.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Quat, Vec3};

use crate::core::alloc::{handle_alloc, handle_free};
use crate::core::body::Body;
use crate::core::id::BodyId;
use crate::math::{vec3_from_rvec3, RVec3};

/// Broad classification of a constraint.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    Constraint = 0,
    TwoBodyConstraint = 1,
}

/// Concrete constraint kind.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSubType {
    Fixed = 0,
    Point = 1,
    Hinge = 2,
    Slider = 3,
    Distance = 4,
    Cone = 5,
    SwingTwist = 6,
    SixDof = 7,
    Path = 8,
    Vehicle = 9,
    RackAndPinion = 10,
    Gear = 11,
    Pulley = 12,
}

/// Space the constraint's anchor points are given in.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstraintSpace {
    #[default]
    LocalToBodyCom = 0,
    WorldSpace = 1,
}

/// Parameter payload of a constraint blueprint. A closed set: this core only
/// carries the kinds the boundary exposes builders for.
#[derive(Debug, Clone, Copy)]
pub enum ConstraintSettingsKind {
    Fixed {
        space: ConstraintSpace,
        auto_detect_point: bool,
    },
}

/// Mutable blueprint for a constraint.
#[derive(Debug)]
pub struct ConstraintSettings {
    pub(crate) ref_count: AtomicU32,
    pub user_data: u64,
    pub kind: ConstraintSettingsKind,
}

impl ConstraintSettings {
    pub fn fixed() -> Self {
        Self {
            ref_count: AtomicU32::new(1),
            user_data: 0,
            kind: ConstraintSettingsKind::Fixed {
                space: ConstraintSpace::WorldSpace,
                auto_detect_point: true,
            },
        }
    }

    /// # Safety
    /// `ptr` must point at live settings.
    pub unsafe fn add_ref(ptr: *const ConstraintSettings) {
        debug_assert!(!ptr.is_null());
        (*ptr).ref_count.fetch_add(1, Ordering::Relaxed);
    }

    /// # Safety
    /// `ptr` must point at live settings with a reference owed by the caller.
    pub unsafe fn release(ptr: *const ConstraintSettings) {
        debug_assert!(!ptr.is_null());
        if (*ptr).ref_count.fetch_sub(1, Ordering::AcqRel) == 1 {
            handle_free(ptr as *mut ConstraintSettings);
        }
    }

    /// # Safety
    /// `ptr` must point at live settings.
    pub unsafe fn ref_count(ptr: *const ConstraintSettings) -> u32 {
        debug_assert!(!ptr.is_null());
        (*ptr).ref_count.load(Ordering::Acquire)
    }

    /// Instantiates a constraint binding `body1` and `body2`. The returned
    /// pointer carries one reference owed to the caller; null on failure.
    pub fn create_constraint(&self, body1: &Body, body2: &Body) -> *const Constraint {
        let ConstraintSettingsKind::Fixed {
            space,
            auto_detect_point,
        } = self.kind;

        // Anchor at the midpoint between both centers of mass when asked to
        // auto-detect, expressed per the requested space.
        let world_anchor = midpoint(
            body1.center_of_mass_position(),
            body2.center_of_mass_position(),
        );
        let (anchor1, anchor2) = if auto_detect_point {
            (
                to_local(body1, world_anchor, space),
                to_local(body2, world_anchor, space),
            )
        } else {
            (Vec3::ZERO, Vec3::ZERO)
        };

        handle_alloc(Constraint {
            ref_count: AtomicU32::new(1),
            constraint_type: ConstraintType::TwoBodyConstraint,
            sub_type: ConstraintSubType::Fixed,
            user_data: self.user_data,
            body1: body1.id,
            body2: body2.id,
            space,
            local_anchor1: anchor1,
            local_anchor2: anchor2,
            reference_rotation: body2.rotation() * body1.rotation().inverse(),
        })
    }
}

fn midpoint(a: RVec3, b: RVec3) -> RVec3 {
    (a + b) * 0.5
}

fn to_local(body: &Body, world: RVec3, space: ConstraintSpace) -> Vec3 {
    match space {
        ConstraintSpace::WorldSpace => {
            body.rotation().inverse() * vec3_from_rvec3(world - body.center_of_mass_position())
        }
        ConstraintSpace::LocalToBodyCom => vec3_from_rvec3(world),
    }
}

/// An instantiated constraint between two bodies. Immutable apart from its
/// reference count and user data.
#[derive(Debug)]
pub struct Constraint {
    pub(crate) ref_count: AtomicU32,
    pub constraint_type: ConstraintType,
    pub sub_type: ConstraintSubType,
    pub user_data: u64,
    pub body1: BodyId,
    pub body2: BodyId,
    pub space: ConstraintSpace,
    pub local_anchor1: Vec3,
    pub local_anchor2: Vec3,
    pub reference_rotation: Quat,
}

impl Constraint {
    /// # Safety
    /// `ptr` must point at a live constraint.
    pub unsafe fn add_ref(ptr: *const Constraint) {
        debug_assert!(!ptr.is_null());
        (*ptr).ref_count.fetch_add(1, Ordering::Relaxed);
    }

    /// # Safety
    /// `ptr` must point at a live constraint with a reference owed by the
    /// caller.
    pub unsafe fn release(ptr: *const Constraint) {
        debug_assert!(!ptr.is_null());
        if (*ptr).ref_count.fetch_sub(1, Ordering::AcqRel) == 1 {
            handle_free(ptr as *mut Constraint);
        }
    }

    /// # Safety
    /// `ptr` must point at a live constraint.
    pub unsafe fn ref_count(ptr: *const Constraint) -> u32 {
        debug_assert!(!ptr.is_null());
        (*ptr).ref_count.load(Ordering::Acquire)
    }
}
