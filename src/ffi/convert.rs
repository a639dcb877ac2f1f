//! The accessor layer: paired, total, non-allocating conversions between
//! public boundary types and their native counterparts.
//!
//! Native → public is infallible reinterpretation. Public → native for
//! polymorphic natives (settings kinds, shapes) validates the dynamic kind
//! tag in debug builds and aborts on mismatch; an incompatible cast is
//! undefined behavior downstream, so there is no recoverable path.

use crate::core::body::{Activation, Body, BodyCreationSettings, MotionProperties, MotionType};
use crate::core::constraint::{Constraint, ConstraintSettings, ConstraintSettingsKind};
use crate::core::contact::ContactSettings;
use crate::core::filter::{GroupFilter, PhysicsMaterial};
use crate::core::id::BodyId;
use crate::core::shape::{Shape, ShapeSettings, ShapeSettingsKind};
use crate::character::{Character, CharacterSettings, CharacterVirtual, CharacterVirtualSettings};
use crate::ffi::types::*;
use crate::jobs::{JobSystem, TempAllocator};
use crate::system::{
    BodyInterface, BodyLockInterface, BodyLockRead, BodyLockWrite, NarrowPhaseQuery,
    PhysicsSystem, RayCast, RayCastResult,
};

macro_rules! accessor_pair {
    ($to_native:ident, $to_native_mut:ident, $pub_ty:ty, $native_ty:ty) => {
        #[inline]
        pub unsafe fn $to_native<'a>(ptr: *const $pub_ty) -> &'a $native_ty {
            debug_assert!(!ptr.is_null());
            &*(ptr as *const $native_ty)
        }

        #[inline]
        pub unsafe fn $to_native_mut<'a>(ptr: *mut $pub_ty) -> &'a mut $native_ty {
            debug_assert!(!ptr.is_null());
            &mut *(ptr as *mut $native_ty)
        }
    };
}

accessor_pair!(body_ref, body_mut, KeelBody, Body);
accessor_pair!(motion_ref, motion_mut, KeelMotionProperties, MotionProperties);
accessor_pair!(
    creation_settings_ref,
    creation_settings_mut,
    KeelBodyCreationSettings,
    BodyCreationSettings
);
accessor_pair!(contact_settings_ref, contact_settings_mut, KeelContactSettings, ContactSettings);
accessor_pair!(system_ref, system_mut, KeelPhysicsSystem, PhysicsSystem);
accessor_pair!(body_iface_ref, body_iface_mut, KeelBodyInterface, BodyInterface);
accessor_pair!(
    lock_iface_ref,
    lock_iface_mut,
    KeelBodyLockInterface,
    BodyLockInterface
);
accessor_pair!(query_ref, query_mut, KeelNarrowPhaseQuery, NarrowPhaseQuery);
accessor_pair!(lock_read_ref, lock_read_mut, KeelBodyLockRead, BodyLockRead);
accessor_pair!(lock_write_ref, lock_write_mut, KeelBodyLockWrite, BodyLockWrite);
accessor_pair!(ray_cast_ref, ray_cast_mut, KeelRayCast, RayCast);
accessor_pair!(ray_result_ref, ray_result_mut, KeelRayCastResult, RayCastResult);
accessor_pair!(temp_alloc_ref, temp_alloc_mut, KeelTempAllocator, TempAllocator);
accessor_pair!(job_system_ref, job_system_mut, KeelJobSystem, JobSystem);
accessor_pair!(constraint_ref, constraint_mut, KeelConstraint, Constraint);
accessor_pair!(character_ref, character_mut, KeelCharacter, Character);
accessor_pair!(
    character_virtual_ref,
    character_virtual_mut,
    KeelCharacterVirtual,
    CharacterVirtual
);
accessor_pair!(
    character_settings_ref,
    character_settings_mut,
    KeelCharacterSettings,
    CharacterSettings
);
accessor_pair!(
    character_virtual_settings_ref,
    character_virtual_settings_mut,
    KeelCharacterVirtualSettings,
    CharacterVirtualSettings
);
accessor_pair!(group_filter_ref, group_filter_mut, KeelGroupFilter, GroupFilter);
accessor_pair!(material_ref, material_mut, KeelPhysicsMaterial, PhysicsMaterial);

// Shapes carry a kind tag; the plain accessors accept any shape.
accessor_pair!(shape_ref, shape_mut, KeelShape, Shape);

// --- shape settings, validated per claimed subtype --------------------------

#[inline]
pub unsafe fn shape_settings_ref<'a>(ptr: *const KeelShapeSettings) -> &'a ShapeSettings {
    debug_assert!(!ptr.is_null());
    &*(ptr as *const ShapeSettings)
}

#[inline]
pub unsafe fn shape_settings_mut<'a>(ptr: *mut KeelShapeSettings) -> &'a mut ShapeSettings {
    debug_assert!(!ptr.is_null());
    &mut *(ptr as *mut ShapeSettings)
}

macro_rules! settings_accessor {
    ($to_native:ident, $to_native_mut:ident, $pub_ty:ty, $check:expr) => {
        #[inline]
        pub unsafe fn $to_native<'a>(ptr: *const $pub_ty) -> &'a ShapeSettings {
            debug_assert!(!ptr.is_null());
            let settings = &*(ptr as *const ShapeSettings);
            let check: fn(&ShapeSettings) -> bool = $check;
            debug_assert!(check(settings), "shape settings kind mismatch");
            settings
        }

        #[inline]
        pub unsafe fn $to_native_mut<'a>(ptr: *mut $pub_ty) -> &'a mut ShapeSettings {
            debug_assert!(!ptr.is_null());
            let settings = &mut *(ptr as *mut ShapeSettings);
            let check: fn(&ShapeSettings) -> bool = $check;
            debug_assert!(check(settings), "shape settings kind mismatch");
            settings
        }
    };
}

settings_accessor!(convex_settings_ref, convex_settings_mut, KeelConvexShapeSettings, |s| s
    .is_convex());
settings_accessor!(box_settings_ref, box_settings_mut, KeelBoxShapeSettings, |s| matches!(
    s.kind,
    ShapeSettingsKind::Box { .. }
));
settings_accessor!(sphere_settings_ref, sphere_settings_mut, KeelSphereShapeSettings, |s| {
    matches!(s.kind, ShapeSettingsKind::Sphere { .. })
});
settings_accessor!(
    triangle_settings_ref,
    triangle_settings_mut,
    KeelTriangleShapeSettings,
    |s| matches!(s.kind, ShapeSettingsKind::Triangle { .. })
);
settings_accessor!(
    capsule_settings_ref,
    capsule_settings_mut,
    KeelCapsuleShapeSettings,
    |s| matches!(s.kind, ShapeSettingsKind::Capsule { .. })
);
settings_accessor!(
    tapered_capsule_settings_ref,
    tapered_capsule_settings_mut,
    KeelTaperedCapsuleShapeSettings,
    |s| matches!(s.kind, ShapeSettingsKind::TaperedCapsule { .. })
);
settings_accessor!(
    cylinder_settings_ref,
    cylinder_settings_mut,
    KeelCylinderShapeSettings,
    |s| matches!(s.kind, ShapeSettingsKind::Cylinder { .. })
);
settings_accessor!(
    convex_hull_settings_ref,
    convex_hull_settings_mut,
    KeelConvexHullShapeSettings,
    |s| matches!(s.kind, ShapeSettingsKind::ConvexHull { .. })
);
settings_accessor!(
    height_field_settings_ref,
    height_field_settings_mut,
    KeelHeightFieldShapeSettings,
    |s| matches!(s.kind, ShapeSettingsKind::HeightField { .. })
);
settings_accessor!(
    mesh_settings_ref,
    mesh_settings_mut,
    KeelMeshShapeSettings,
    |s| matches!(s.kind, ShapeSettingsKind::Mesh { .. })
);
settings_accessor!(
    decorated_settings_ref,
    decorated_settings_mut,
    KeelDecoratedShapeSettings,
    |s| s.is_decorated()
);
settings_accessor!(
    compound_settings_ref,
    compound_settings_mut,
    KeelCompoundShapeSettings,
    |s| s.is_compound()
);

// --- constraint settings ----------------------------------------------------

#[inline]
pub unsafe fn constraint_settings_ref<'a>(
    ptr: *const KeelConstraintSettings,
) -> &'a ConstraintSettings {
    debug_assert!(!ptr.is_null());
    &*(ptr as *const ConstraintSettings)
}

#[inline]
pub unsafe fn two_body_constraint_settings_ref<'a>(
    ptr: *const KeelTwoBodyConstraintSettings,
) -> &'a ConstraintSettings {
    debug_assert!(!ptr.is_null());
    &*(ptr as *const ConstraintSettings)
}

#[inline]
pub unsafe fn fixed_constraint_settings_mut<'a>(
    ptr: *mut KeelFixedConstraintSettings,
) -> &'a mut ConstraintSettings {
    debug_assert!(!ptr.is_null());
    let settings = &mut *(ptr as *mut ConstraintSettings);
    debug_assert!(
        matches!(settings.kind, ConstraintSettingsKind::Fixed { .. }),
        "constraint settings kind mismatch"
    );
    settings
}

// --- native → public --------------------------------------------------------

#[inline]
pub fn pub_shape(ptr: *const Shape) -> *const KeelShape {
    ptr as *const KeelShape
}

#[inline]
pub fn pub_body(ptr: *const Body) -> *const KeelBody {
    ptr as *const KeelBody
}

#[inline]
pub fn pub_body_mut(ptr: *mut Body) -> *mut KeelBody {
    ptr as *mut KeelBody
}

#[inline]
pub fn pub_constraint(ptr: *const Constraint) -> *const KeelConstraint {
    ptr as *const KeelConstraint
}

// --- enum value conversions (numeric identity) ------------------------------

#[inline]
pub fn motion_type_from_raw(raw: KeelMotionType) -> MotionType {
    debug_assert!(raw <= KEEL_MOTION_TYPE_DYNAMIC);
    match raw {
        KEEL_MOTION_TYPE_STATIC => MotionType::Static,
        KEEL_MOTION_TYPE_KINEMATIC => MotionType::Kinematic,
        _ => MotionType::Dynamic,
    }
}

#[inline]
pub fn activation_from_raw(raw: KeelActivation) -> Activation {
    if raw == KEEL_ACTIVATION_ACTIVATE {
        Activation::Activate
    } else {
        Activation::DontActivate
    }
}

#[inline]
pub fn body_id_from_raw(raw: KeelBodyId) -> BodyId {
    BodyId(raw)
}
