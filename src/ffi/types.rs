//! Public C-side types: opaque handles, layout-mirrored value structs, enum
//! encodings, and callback tables.
//!
//! Every mirrored struct here must stay bit-for-bit layout-equal to its
//! native counterpart; the accessor layer reinterprets pointers between the
//! two without copying. The `const` blocks at the bottom hold the build if a
//! field drifts. Enum values are shared by numeric identity.

use std::os::raw::c_void;

use crate::config::{MAX_FACE_POINTS, MAX_MANIFOLD_POINTS};
use crate::core::{alloc, body, contact, filter, id};
use crate::math::{F32x16, F32x4, Real, RealX4, U32x1Pad};
use crate::{character, system};

// ---------------------------------------------------------------------------
// Scalar aliases and enum encodings
// ---------------------------------------------------------------------------

pub type KeelReal = Real;
pub type KeelObjectLayer = u16;
pub type KeelBroadPhaseLayer = u8;
pub type KeelBodyId = u32;
pub type KeelSubShapeId = u32;
pub type KeelCollisionGroupId = u32;
pub type KeelCollisionSubGroupId = u32;

pub const KEEL_BODY_ID_INVALID: KeelBodyId = u32::MAX;
pub const KEEL_BODY_ID_INDEX_BITS: u32 = id::BodyId::INDEX_BITS;

/// Bit set on entries of the unsafe body array whose slot is free.
pub const KEEL_IS_FREED_BODY_BIT: usize = system::FREED_BODY_BIT;

pub type KeelMotionType = u8;
pub const KEEL_MOTION_TYPE_STATIC: KeelMotionType = 0;
pub const KEEL_MOTION_TYPE_KINEMATIC: KeelMotionType = 1;
pub const KEEL_MOTION_TYPE_DYNAMIC: KeelMotionType = 2;

pub type KeelMotionQuality = u8;
pub const KEEL_MOTION_QUALITY_DISCRETE: KeelMotionQuality = 0;
pub const KEEL_MOTION_QUALITY_LINEAR_CAST: KeelMotionQuality = 1;

pub type KeelActivation = u32;
pub const KEEL_ACTIVATION_ACTIVATE: KeelActivation = 0;
pub const KEEL_ACTIVATION_DONT_ACTIVATE: KeelActivation = 1;

pub type KeelBodyType = u32;
pub const KEEL_BODY_TYPE_RIGID: KeelBodyType = 0;
pub const KEEL_BODY_TYPE_SOFT: KeelBodyType = 1;

pub type KeelShapeType = u8;
pub const KEEL_SHAPE_TYPE_CONVEX: KeelShapeType = 0;
pub const KEEL_SHAPE_TYPE_COMPOUND: KeelShapeType = 1;
pub const KEEL_SHAPE_TYPE_DECORATED: KeelShapeType = 2;
pub const KEEL_SHAPE_TYPE_MESH: KeelShapeType = 3;
pub const KEEL_SHAPE_TYPE_HEIGHT_FIELD: KeelShapeType = 4;

pub type KeelShapeSubType = u8;
pub const KEEL_SHAPE_SUB_TYPE_SPHERE: KeelShapeSubType = 0;
pub const KEEL_SHAPE_SUB_TYPE_BOX: KeelShapeSubType = 1;
pub const KEEL_SHAPE_SUB_TYPE_TRIANGLE: KeelShapeSubType = 2;
pub const KEEL_SHAPE_SUB_TYPE_CAPSULE: KeelShapeSubType = 3;
pub const KEEL_SHAPE_SUB_TYPE_TAPERED_CAPSULE: KeelShapeSubType = 4;
pub const KEEL_SHAPE_SUB_TYPE_CYLINDER: KeelShapeSubType = 5;
pub const KEEL_SHAPE_SUB_TYPE_CONVEX_HULL: KeelShapeSubType = 6;
pub const KEEL_SHAPE_SUB_TYPE_STATIC_COMPOUND: KeelShapeSubType = 7;
pub const KEEL_SHAPE_SUB_TYPE_MUTABLE_COMPOUND: KeelShapeSubType = 8;
pub const KEEL_SHAPE_SUB_TYPE_ROTATED_TRANSLATED: KeelShapeSubType = 9;
pub const KEEL_SHAPE_SUB_TYPE_SCALED: KeelShapeSubType = 10;
pub const KEEL_SHAPE_SUB_TYPE_OFFSET_CENTER_OF_MASS: KeelShapeSubType = 11;
pub const KEEL_SHAPE_SUB_TYPE_MESH: KeelShapeSubType = 12;
pub const KEEL_SHAPE_SUB_TYPE_HEIGHT_FIELD: KeelShapeSubType = 13;

pub type KeelConstraintType = u32;
pub const KEEL_CONSTRAINT_TYPE_CONSTRAINT: KeelConstraintType = 0;
pub const KEEL_CONSTRAINT_TYPE_TWO_BODY_CONSTRAINT: KeelConstraintType = 1;

pub type KeelConstraintSubType = u32;
pub const KEEL_CONSTRAINT_SUB_TYPE_FIXED: KeelConstraintSubType = 0;
pub const KEEL_CONSTRAINT_SUB_TYPE_POINT: KeelConstraintSubType = 1;
pub const KEEL_CONSTRAINT_SUB_TYPE_HINGE: KeelConstraintSubType = 2;
pub const KEEL_CONSTRAINT_SUB_TYPE_SLIDER: KeelConstraintSubType = 3;
pub const KEEL_CONSTRAINT_SUB_TYPE_DISTANCE: KeelConstraintSubType = 4;

pub type KeelConstraintSpace = u32;
pub const KEEL_CONSTRAINT_SPACE_LOCAL_TO_BODY_COM: KeelConstraintSpace = 0;
pub const KEEL_CONSTRAINT_SPACE_WORLD_SPACE: KeelConstraintSpace = 1;

pub type KeelAllowedDofs = u8;
pub const KEEL_ALLOWED_DOFS_ALL: KeelAllowedDofs = body::ALLOWED_DOFS_ALL;
pub const KEEL_ALLOWED_DOFS_TRANSLATION_X: KeelAllowedDofs = body::ALLOWED_DOFS_TRANSLATION_X;
pub const KEEL_ALLOWED_DOFS_TRANSLATION_Y: KeelAllowedDofs = body::ALLOWED_DOFS_TRANSLATION_Y;
pub const KEEL_ALLOWED_DOFS_TRANSLATION_Z: KeelAllowedDofs = body::ALLOWED_DOFS_TRANSLATION_Z;
pub const KEEL_ALLOWED_DOFS_ROTATION_X: KeelAllowedDofs = body::ALLOWED_DOFS_ROTATION_X;
pub const KEEL_ALLOWED_DOFS_ROTATION_Y: KeelAllowedDofs = body::ALLOWED_DOFS_ROTATION_Y;
pub const KEEL_ALLOWED_DOFS_ROTATION_Z: KeelAllowedDofs = body::ALLOWED_DOFS_ROTATION_Z;
pub const KEEL_ALLOWED_DOFS_PLANE_2D: KeelAllowedDofs = body::ALLOWED_DOFS_PLANE_2D;

pub type KeelOverrideMassProperties = u8;
pub const KEEL_OVERRIDE_MASS_PROPERTIES_CALC_MASS_INERTIA: KeelOverrideMassProperties = 0;
pub const KEEL_OVERRIDE_MASS_PROPERTIES_CALC_INERTIA: KeelOverrideMassProperties = 1;
pub const KEEL_OVERRIDE_MASS_PROPERTIES_MASS_INERTIA_PROVIDED: KeelOverrideMassProperties = 2;

pub type KeelValidateResult = u32;
pub const KEEL_VALIDATE_RESULT_ACCEPT_ALL_CONTACTS: KeelValidateResult = 0;
pub const KEEL_VALIDATE_RESULT_ACCEPT_CONTACT: KeelValidateResult = 1;
pub const KEEL_VALIDATE_RESULT_REJECT_CONTACT: KeelValidateResult = 2;
pub const KEEL_VALIDATE_RESULT_REJECT_ALL_CONTACTS: KeelValidateResult = 3;

pub type KeelBackFaceMode = u8;
pub const KEEL_BACK_FACE_MODE_IGNORE: KeelBackFaceMode = 0;
pub const KEEL_BACK_FACE_MODE_COLLIDE: KeelBackFaceMode = 1;

pub type KeelPhysicsUpdateError = u8;
pub const KEEL_PHYSICS_UPDATE_ERROR_NO_ERROR: KeelPhysicsUpdateError = 0;
pub const KEEL_PHYSICS_UPDATE_ERROR_MANIFOLD_CACHE_FULL: KeelPhysicsUpdateError =
    system::UPDATE_ERROR_MANIFOLD_CACHE_FULL;
pub const KEEL_PHYSICS_UPDATE_ERROR_BODY_PAIR_CACHE_FULL: KeelPhysicsUpdateError =
    system::UPDATE_ERROR_BODY_PAIR_CACHE_FULL;
pub const KEEL_PHYSICS_UPDATE_ERROR_CONTACT_CONSTRAINTS_FULL: KeelPhysicsUpdateError =
    system::UPDATE_ERROR_CONTACT_CONSTRAINTS_FULL;

pub type KeelCharacterGroundState = u32;
pub const KEEL_CHARACTER_GROUND_STATE_ON_GROUND: KeelCharacterGroundState = 0;
pub const KEEL_CHARACTER_GROUND_STATE_ON_STEEP_GROUND: KeelCharacterGroundState = 1;
pub const KEEL_CHARACTER_GROUND_STATE_NOT_SUPPORTED: KeelCharacterGroundState = 2;
pub const KEEL_CHARACTER_GROUND_STATE_IN_AIR: KeelCharacterGroundState = 3;

pub type KeelAllocateFunction = alloc::AllocateFn;
pub type KeelFreeFunction = alloc::FreeFn;
pub type KeelAlignedAllocateFunction = alloc::AlignedAllocateFn;
pub type KeelAlignedFreeFunction = alloc::AlignedFreeFn;

// ---------------------------------------------------------------------------
// Opaque handle types
// ---------------------------------------------------------------------------

macro_rules! opaque_handle {
    ($($name:ident),* $(,)?) => {
        $(
            #[repr(C)]
            pub struct $name {
                _unused: [u8; 0],
            }
        )*
    };
}

opaque_handle!(
    KeelShape,
    KeelShapeSettings,
    KeelConvexShapeSettings,
    KeelBoxShapeSettings,
    KeelSphereShapeSettings,
    KeelTriangleShapeSettings,
    KeelCapsuleShapeSettings,
    KeelTaperedCapsuleShapeSettings,
    KeelCylinderShapeSettings,
    KeelConvexHullShapeSettings,
    KeelHeightFieldShapeSettings,
    KeelMeshShapeSettings,
    KeelDecoratedShapeSettings,
    KeelCompoundShapeSettings,
    KeelConstraint,
    KeelConstraintSettings,
    KeelTwoBodyConstraintSettings,
    KeelFixedConstraintSettings,
    KeelPhysicsSystem,
    KeelBodyInterface,
    KeelBodyLockInterface,
    KeelNarrowPhaseQuery,
    KeelSharedMutex,
    KeelTempAllocator,
    KeelJobSystem,
    KeelGroupFilter,
    KeelPhysicsMaterial,
    KeelCharacter,
    KeelCharacterVirtual,
);

// ---------------------------------------------------------------------------
// Layout-mirrored value structs
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct KeelCollisionGroup {
    pub filter: *const KeelGroupFilter,
    pub group_id: KeelCollisionGroupId,
    pub sub_group_id: KeelCollisionSubGroupId,
}

#[repr(C)]
#[derive(Debug)]
pub struct KeelMotionProperties {
    pub linear_velocity: F32x4,
    pub angular_velocity: F32x4,
    pub inv_inertia_diagonal: F32x4,
    pub inertia_rotation: F32x4,

    pub force: [f32; 3],
    pub torque: [f32; 3],
    pub inv_mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub max_linear_velocity: f32,
    pub max_angular_velocity: f32,
    pub gravity_factor: f32,
    pub index_in_active_bodies: u32,
    pub island_index: u32,

    pub motion_quality: KeelMotionQuality,
    pub allow_sleeping: bool,

    #[cfg(feature = "double-precision")]
    pub reserved: [u8; 76],
    #[cfg(not(feature = "double-precision"))]
    pub reserved: [u8; 52],

    #[cfg(debug_assertions)]
    pub cached_motion_type: KeelMotionType,
}

#[repr(C)]
#[derive(Debug)]
pub struct KeelBody {
    pub position: RealX4,
    pub rotation: F32x4,
    pub bounds_min: F32x4,
    pub bounds_max: F32x4,

    pub shape: *const KeelShape,
    /// Null for static bodies.
    pub motion_properties: *mut KeelMotionProperties,
    pub user_data: u64,
    pub collision_group: KeelCollisionGroup,

    pub friction: f32,
    pub restitution: f32,
    pub id: KeelBodyId,

    pub object_layer: KeelObjectLayer,

    pub broad_phase_layer: KeelBroadPhaseLayer,
    pub motion_type: KeelMotionType,
    pub flags: u8,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct KeelMassProperties {
    pub mass: f32,
    pub inertia: F32x16,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct KeelBodyCreationSettings {
    pub position: RealX4,
    pub rotation: F32x4,
    pub linear_velocity: F32x4,
    pub angular_velocity: F32x4,
    pub user_data: u64,
    pub object_layer: KeelObjectLayer,
    pub collision_group: KeelCollisionGroup,
    pub motion_type: KeelMotionType,
    pub allowed_dofs: KeelAllowedDofs,
    pub allow_dynamic_or_kinematic: bool,
    pub is_sensor: bool,
    pub collide_kinematic_vs_non_dynamic: bool,
    pub use_manifold_reduction: bool,
    pub apply_gyroscopic_force: bool,
    pub motion_quality: KeelMotionQuality,
    pub allow_sleeping: bool,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub max_linear_velocity: f32,
    pub max_angular_velocity: f32,
    pub gravity_factor: f32,
    pub num_velocity_steps_override: u32,
    pub num_position_steps_override: u32,
    pub override_mass_properties: KeelOverrideMassProperties,
    pub inertia_multiplier: f32,
    pub mass_properties_override: KeelMassProperties,
    pub shape_settings: *const KeelShapeSettings,
    pub shape: *const KeelShape,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeelSubShapeIdCreator {
    pub id: KeelSubShapeId,
    pub current_bit: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeelBodySubShape {
    pub body_id: KeelBodyId,
    pub sub_shape_id: KeelSubShapeId,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeelSubShapeIdPair {
    pub first: KeelBodySubShape,
    pub second: KeelBodySubShape,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct KeelContactPoints64 {
    pub num_points: U32x1Pad,
    pub points: [F32x4; MAX_MANIFOLD_POINTS],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct KeelContactPoints32 {
    pub num_points: U32x1Pad,
    pub points: [F32x4; MAX_FACE_POINTS],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct KeelContactManifold {
    pub base_offset: RealX4,
    /// World-space normal from shape 1 towards shape 2.
    pub normal: F32x4,
    pub penetration_depth: f32,
    pub shape1_sub_shape_id: KeelSubShapeId,
    pub shape2_sub_shape_id: KeelSubShapeId,
    pub shape1_relative_contact: KeelContactPoints64,
    pub shape2_relative_contact: KeelContactPoints64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct KeelContactSettings {
    pub combined_friction: f32,
    pub combined_restitution: f32,
    pub is_sensor: bool,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct KeelCollideShapeResult {
    pub shape1_contact_point: F32x4,
    pub shape2_contact_point: F32x4,
    pub penetration_axis: F32x4,
    pub penetration_depth: f32,
    pub shape1_sub_shape_id: KeelSubShapeId,
    pub shape2_sub_shape_id: KeelSubShapeId,
    pub body2_id: KeelBodyId,
    pub shape1_face: KeelContactPoints32,
    pub shape2_face: KeelContactPoints32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct KeelTransformedShape {
    pub shape_position_com: RealX4,
    pub shape_rotation: F32x4,
    pub shape: *const KeelShape,
    pub shape_scale: [f32; 3],
    pub body_id: KeelBodyId,
    pub sub_shape_id_creator: KeelSubShapeIdCreator,
}

#[repr(C)]
pub struct KeelBodyLockRead {
    pub lock_interface: *const KeelBodyLockInterface,
    pub mutex: *mut KeelSharedMutex,
    pub body: *const KeelBody,
}

#[repr(C)]
pub struct KeelBodyLockWrite {
    pub lock_interface: *const KeelBodyLockInterface,
    pub mutex: *mut KeelSharedMutex,
    pub body: *mut KeelBody,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeelRayCast {
    pub origin: RealX4,
    /// Length of the vector is the cast distance.
    pub direction: F32x4,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct KeelRayCastResult {
    pub body_id: KeelBodyId,
    pub fraction: f32,
    pub sub_shape_id: KeelSubShapeId,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct KeelRayCastSettings {
    pub back_face_mode: KeelBackFaceMode,
    pub treat_convex_as_solid: bool,
}

#[repr(C)]
#[derive(Debug)]
pub struct KeelCharacterBaseSettings {
    pub ref_count: u32,
    pub up: F32x4,
    pub supporting_volume: F32x4,
    pub max_slope_angle: f32,
    pub shape: *const KeelShape,
}

#[repr(C)]
#[derive(Debug)]
pub struct KeelCharacterSettings {
    pub base: KeelCharacterBaseSettings,
    pub layer: KeelObjectLayer,
    pub mass: f32,
    pub friction: f32,
    pub gravity_factor: f32,
}

#[repr(C)]
#[derive(Debug)]
pub struct KeelCharacterVirtualSettings {
    pub base: KeelCharacterBaseSettings,
    pub mass: f32,
    pub max_strength: f32,
    pub shape_offset: F32x4,
    pub back_face_mode: KeelBackFaceMode,
    pub predictive_contact_distance: f32,
    pub max_collision_iterations: u32,
    pub max_constraint_iterations: u32,
    pub min_time_remaining: f32,
    pub collision_tolerance: f32,
    pub character_padding: f32,
    pub max_num_hits: u32,
    pub hit_reduction_cos_max_angle: f32,
    pub penetration_recovery_speed: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct KeelCharacterContactSettings {
    pub can_push_character: bool,
    pub can_receive_impulses: bool,
}

// ---------------------------------------------------------------------------
// Callback tables
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeelBroadPhaseLayerInterfaceVTable {
    pub get_num_broad_phase_layers: Option<unsafe extern "C" fn() -> u32>,
    pub get_broad_phase_layer:
        Option<unsafe extern "C" fn(layer: KeelObjectLayer) -> KeelBroadPhaseLayer>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeelObjectLayerPairFilterVTable {
    pub should_collide:
        Option<unsafe extern "C" fn(layer1: KeelObjectLayer, layer2: KeelObjectLayer) -> bool>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeelObjectVsBroadPhaseLayerFilterVTable {
    pub should_collide: Option<
        unsafe extern "C" fn(layer1: KeelObjectLayer, layer2: KeelBroadPhaseLayer) -> bool,
    >,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeelContactListenerVTable {
    /// Optional; absent means all contacts are accepted.
    pub on_contact_validate: Option<
        unsafe extern "C" fn(
            body1: *const KeelBody,
            body2: *const KeelBody,
            base_offset: *const KeelReal,
            collision_result: *const KeelCollideShapeResult,
        ) -> KeelValidateResult,
    >,
    /// Optional. `io_settings` is live; mutations are observed by the core.
    pub on_contact_added: Option<
        unsafe extern "C" fn(
            body1: *const KeelBody,
            body2: *const KeelBody,
            manifold: *const KeelContactManifold,
            io_settings: *mut KeelContactSettings,
        ),
    >,
    /// Optional.
    pub on_contact_persisted: Option<
        unsafe extern "C" fn(
            body1: *const KeelBody,
            body2: *const KeelBody,
            manifold: *const KeelContactManifold,
            io_settings: *mut KeelContactSettings,
        ),
    >,
    /// Optional.
    pub on_contact_removed:
        Option<unsafe extern "C" fn(sub_shape_pair: *const KeelSubShapeIdPair)>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeelBodyActivationListenerVTable {
    pub user_data: Option<std::ptr::NonNull<c_void>>,
    pub on_body_activated: Option<
        unsafe extern "C" fn(user_data: *mut c_void, body_id: *const KeelBodyId, body_user_data: u64),
    >,
    pub on_body_deactivated: Option<
        unsafe extern "C" fn(user_data: *mut c_void, body_id: *const KeelBodyId, body_user_data: u64),
    >,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeelPhysicsStepListenerVTable {
    pub user_data: Option<std::ptr::NonNull<c_void>>,
    pub on_step: Option<
        unsafe extern "C" fn(
            user_data: *mut c_void,
            delta_time: f32,
            physics_system: *mut KeelPhysicsSystem,
        ),
    >,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeelBroadPhaseLayerFilterVTable {
    pub user_data: Option<std::ptr::NonNull<c_void>>,
    pub should_collide:
        Option<unsafe extern "C" fn(user_data: *const c_void, layer: KeelBroadPhaseLayer) -> bool>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeelObjectLayerFilterVTable {
    pub user_data: Option<std::ptr::NonNull<c_void>>,
    pub should_collide:
        Option<unsafe extern "C" fn(user_data: *const c_void, layer: KeelObjectLayer) -> bool>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeelBodyFilterVTable {
    pub user_data: Option<std::ptr::NonNull<c_void>>,
    pub should_collide:
        Option<unsafe extern "C" fn(user_data: *const c_void, body_id: *const KeelBodyId) -> bool>,
    pub should_collide_locked:
        Option<unsafe extern "C" fn(user_data: *const c_void, body: *const KeelBody) -> bool>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeelCharacterContactListenerVTable {
    pub user_data: Option<std::ptr::NonNull<c_void>>,
    pub on_adjust_body_velocity: Option<
        unsafe extern "C" fn(
            user_data: *mut c_void,
            character: *const KeelCharacterVirtual,
            body2: *const KeelBody,
            io_linear_velocity: *mut f32,
            io_angular_velocity: *mut f32,
        ),
    >,
    pub on_contact_validate: Option<
        unsafe extern "C" fn(
            user_data: *mut c_void,
            character: *const KeelCharacterVirtual,
            body2: *const KeelBody,
            sub_shape_id: *const KeelSubShapeId,
        ) -> bool,
    >,
    pub on_contact_added: Option<
        unsafe extern "C" fn(
            user_data: *mut c_void,
            character: *const KeelCharacterVirtual,
            body2: *const KeelBody,
            sub_shape_id: *const KeelSubShapeId,
            contact_position: *const KeelReal,
            contact_normal: *const f32,
            io_settings: *mut KeelCharacterContactSettings,
        ),
    >,
    pub on_contact_solve: Option<
        unsafe extern "C" fn(
            user_data: *mut c_void,
            character: *const KeelCharacterVirtual,
            body2: *const KeelBody,
            sub_shape_id: *const KeelSubShapeId,
            contact_position: *const KeelReal,
            contact_normal: *const f32,
            contact_velocity: *const f32,
            character_velocity_in: *const f32,
            character_velocity_out: *mut f32,
        ),
    >,
}

// ---------------------------------------------------------------------------
// Layout equivalence checks (public mirror vs native counterpart)
// ---------------------------------------------------------------------------

macro_rules! assert_layout {
    ($pub_ty:ty, $native_ty:ty, [$($field:ident),* $(,)?]) => {
        const _: () = {
            assert!(
                std::mem::size_of::<$pub_ty>() == std::mem::size_of::<$native_ty>(),
                concat!("size mismatch: ", stringify!($pub_ty))
            );
            assert!(
                std::mem::align_of::<$pub_ty>() == std::mem::align_of::<$native_ty>(),
                concat!("align mismatch: ", stringify!($pub_ty))
            );
            $(
                assert!(
                    std::mem::offset_of!($pub_ty, $field)
                        == std::mem::offset_of!($native_ty, $field),
                    concat!(
                        "offset mismatch: ",
                        stringify!($pub_ty),
                        ".",
                        stringify!($field)
                    )
                );
            )*
        };
    };
}

assert_layout!(
    KeelMotionProperties,
    body::MotionProperties,
    [
        linear_velocity,
        angular_velocity,
        inv_inertia_diagonal,
        inertia_rotation,
        force,
        torque,
        inv_mass,
        linear_damping,
        angular_damping,
        max_linear_velocity,
        max_angular_velocity,
        gravity_factor,
        index_in_active_bodies,
        island_index,
        motion_quality,
        allow_sleeping,
        reserved,
    ]
);

assert_layout!(KeelCollisionGroup, filter::CollisionGroup, [filter, group_id, sub_group_id]);

assert_layout!(
    KeelBody,
    body::Body,
    [
        position,
        rotation,
        bounds_min,
        bounds_max,
        shape,
        motion_properties,
        user_data,
        collision_group,
        friction,
        restitution,
        id,
        object_layer,
        broad_phase_layer,
        motion_type,
        flags,
    ]
);

assert_layout!(KeelMassProperties, body::MassProperties, [mass, inertia]);

assert_layout!(
    KeelBodyCreationSettings,
    body::BodyCreationSettings,
    [
        position,
        rotation,
        linear_velocity,
        angular_velocity,
        user_data,
        object_layer,
        collision_group,
        motion_type,
        allowed_dofs,
        allow_dynamic_or_kinematic,
        is_sensor,
        collide_kinematic_vs_non_dynamic,
        use_manifold_reduction,
        apply_gyroscopic_force,
        motion_quality,
        allow_sleeping,
        friction,
        restitution,
        linear_damping,
        angular_damping,
        max_linear_velocity,
        max_angular_velocity,
        gravity_factor,
        num_velocity_steps_override,
        num_position_steps_override,
        override_mass_properties,
        inertia_multiplier,
        mass_properties_override,
        shape_settings,
        shape,
    ]
);

assert_layout!(KeelSubShapeIdCreator, id::SubShapeIdCreator, [id, current_bit]);
assert_layout!(KeelSubShapeIdPair, id::SubShapeIdPair, [first, second]);

assert_layout!(
    KeelContactManifold,
    contact::ContactManifold,
    [
        base_offset,
        normal,
        penetration_depth,
        shape1_sub_shape_id,
        shape2_sub_shape_id,
        shape1_relative_contact,
        shape2_relative_contact,
    ]
);

assert_layout!(
    KeelContactSettings,
    contact::ContactSettings,
    [combined_friction, combined_restitution, is_sensor]
);

assert_layout!(
    KeelCollideShapeResult,
    contact::CollideShapeResult,
    [
        shape1_contact_point,
        shape2_contact_point,
        penetration_axis,
        penetration_depth,
        shape1_sub_shape_id,
        shape2_sub_shape_id,
        body2_id,
        shape1_face,
        shape2_face,
    ]
);

assert_layout!(
    KeelTransformedShape,
    system::TransformedShape,
    [
        shape_position_com,
        shape_rotation,
        shape,
        shape_scale,
        body_id,
        sub_shape_id_creator,
    ]
);

assert_layout!(
    KeelBodyLockRead,
    system::BodyLockRead,
    [lock_interface, mutex, body]
);
assert_layout!(
    KeelBodyLockWrite,
    system::BodyLockWrite,
    [lock_interface, mutex, body]
);

assert_layout!(KeelRayCast, system::RayCast, [origin, direction]);
assert_layout!(
    KeelRayCastResult,
    system::RayCastResult,
    [body_id, fraction, sub_shape_id]
);
assert_layout!(
    KeelRayCastSettings,
    system::RayCastSettings,
    [back_face_mode, treat_convex_as_solid]
);

assert_layout!(
    KeelCharacterBaseSettings,
    character::CharacterBaseSettings,
    [up, supporting_volume, max_slope_angle, shape]
);
assert_layout!(
    KeelCharacterSettings,
    character::CharacterSettings,
    [base, layer, mass, friction, gravity_factor]
);
assert_layout!(
    KeelCharacterVirtualSettings,
    character::CharacterVirtualSettings,
    [
        base,
        mass,
        max_strength,
        shape_offset,
        back_face_mode,
        predictive_contact_distance,
        max_collision_iterations,
        max_constraint_iterations,
        min_time_remaining,
        collision_tolerance,
        character_padding,
        max_num_hits,
        hit_reduction_cos_max_angle,
        penetration_recovery_speed,
    ]
);
assert_layout!(
    KeelCharacterContactSettings,
    character::CharacterContactSettings,
    [can_push_character, can_receive_impulses]
);
