//! Collision filtering: layer extension points and per-body groups.
//!
//! The traits here are the core-side view of the boundary's callback tables.
//! A physics system owns one implementation of each for its whole lifetime;
//! the `ffi::bridge` module provides implementations backed by C function
//! pointers.

use std::sync::atomic::AtomicU32;

use crate::core::id::{BodyId, BroadPhaseLayer, ObjectLayer};

/// Maps object layers onto broad-phase partitions.
pub trait BroadPhaseLayerMap: Send + Sync {
    fn num_broad_phase_layers(&self) -> u32;
    fn broad_phase_layer(&self, layer: ObjectLayer) -> BroadPhaseLayer;
}

/// Decides whether two object layers may collide.
pub trait LayerPairFilter: Send + Sync {
    fn should_collide(&self, layer1: ObjectLayer, layer2: ObjectLayer) -> bool;
}

/// Decides whether an object layer may collide with a broad-phase partition.
/// Consulted by queries that walk the broad phase.
pub trait ObjectVsBroadPhaseFilter: Send + Sync {
    fn should_collide(&self, layer: ObjectLayer, broad_phase_layer: BroadPhaseLayer) -> bool;
}

/// Receives body wake/sleep transitions.
pub trait ActivationEvents: Send + Sync {
    fn on_body_activated(&self, body_id: BodyId, user_data: u64);
    fn on_body_deactivated(&self, body_id: BodyId, user_data: u64);
}

/// Receives the start of every collision step.
pub trait StepEvents: Send + Sync {
    fn on_step(&self, delta_time: f32);
}

/// Identifies a group of connected bodies that should not collide with each
/// other (ragdoll links, chains). Reference counted; carried by value inside
/// [`CollisionGroup`] as an opaque pointer.
#[repr(C)]
#[derive(Debug)]
pub struct GroupFilter {
    pub ref_count: AtomicU32,
    pub user_data: u64,
}

/// Named surface description referenced by convex shape settings. The core
/// stores and returns the pointer; it does not interpret it.
#[repr(C)]
#[derive(Debug)]
pub struct PhysicsMaterial {
    pub ref_count: AtomicU32,
    pub user_data: u64,
}

/// Group id inside a [`CollisionGroup`].
pub type CollisionGroupId = u32;

/// Sub-group id inside a [`CollisionGroup`].
pub type CollisionSubGroupId = u32;

/// Per-body group assignment. Two bodies in the same group with the same
/// filter delegate their pair decision to the filter; everything else
/// collides subject to layer filtering.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CollisionGroup {
    pub filter: *const GroupFilter,
    pub group_id: CollisionGroupId,
    pub sub_group_id: CollisionSubGroupId,
}

impl CollisionGroup {
    pub const INVALID_GROUP: CollisionGroupId = u32::MAX;
    pub const INVALID_SUB_GROUP: CollisionSubGroupId = u32::MAX;
}

impl Default for CollisionGroup {
    fn default() -> Self {
        Self {
            filter: std::ptr::null(),
            group_id: Self::INVALID_GROUP,
            sub_group_id: Self::INVALID_SUB_GROUP,
        }
    }
}

// The filter pointer is only dereferenced while the owning system is alive;
// sharing the POD across threads is the caller's contract.
unsafe impl Send for CollisionGroup {}
unsafe impl Sync for CollisionGroup {}
