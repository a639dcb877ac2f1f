//! Core types describing the native side of the boundary: bodies, shapes,
//! constraints, filters, and the allocation/lifetime protocol they share.

pub mod alloc;
pub mod body;
pub mod constraint;
pub mod contact;
pub mod filter;
pub mod id;
pub mod shape;

pub use body::{Body, BodyCreationSettings, MassProperties, MotionProperties, MotionType};
pub use constraint::{Constraint, ConstraintSettings};
pub use contact::{ContactManifold, ContactSettings, ValidateResult};
pub use filter::{CollisionGroup, GroupFilter, PhysicsMaterial};
pub use id::{BodyId, BroadPhaseLayer, ObjectLayer, SubShapeId, SubShapeIdPair};
pub use shape::{Shape, ShapeError, ShapeSettings, ShapeSettingsKind};
