//! Keel – a rigid-body simulation core behind a flat, layout-stable C ABI.
//!
//! The crate has two faces. The `core`, `system`, `jobs`, and `character`
//! modules are the native side: bodies, shapes, constraints, filters, and the
//! physics system that steps them. The `ffi` module is the boundary: opaque
//! handles, `#[repr(C)]` structs that mirror the native ones bit for bit, and
//! the exported `keel_*` functions that any language binding links against.
//!
//! The split follows one rule everywhere: native and public types for the
//! same entity are layout-equal, so the boundary reinterprets pointers
//! instead of marshalling, and all lifetimes cross as explicit
//! add-ref/release pairs.

pub mod character;
pub mod config;
pub mod core;
pub mod ffi;
pub mod jobs;
pub mod math;
pub mod system;
pub mod utils;

pub use glam::{Mat3, Mat4, Quat, Vec3};

pub use crate::core::{
    Body, BodyCreationSettings, BodyId, CollisionGroup, Constraint, ConstraintSettings,
    ContactManifold, ContactSettings, MassProperties, MotionProperties, MotionType, Shape,
    ShapeError, ShapeSettings, ShapeSettingsKind,
};
pub use crate::jobs::{JobSystem, TempAllocator};
pub use crate::math::{Aabb, RVec3, Real};
pub use crate::system::{
    BodyInterface, BodyLockInterface, NarrowPhaseQuery, PhysicsSystem, RayCast, RayCastResult,
};
