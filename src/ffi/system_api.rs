//! Flat API: physics system lifecycle, the update entry point, body locks,
//! narrow-phase queries, and the step collaborators.

use std::os::raw::c_void;

use crate::core::constraint::Constraint;
use crate::ffi::bridge::{
    ActivationListenerBridge, BodyFilterBridge, BroadPhaseLayerBridge,
    BroadPhaseLayerFilterBridge, ContactListenerBridge, ObjectLayerFilterBridge,
    ObjectVsBroadPhaseBridge, PairFilterBridge, StepListenerBridge,
};
use crate::ffi::convert::*;
use crate::ffi::init::debug_check_initialized;
use crate::ffi::types::*;
use crate::ffi::vec::{load_vec3, store_vec3};
use crate::jobs::{JobSystem, TempAllocator};
use crate::system::PhysicsSystem;

// ---------------------------------------------------------------------------
// TempAllocator / JobSystem
// ---------------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn keel_temp_allocator_create(in_size: u32) -> *mut KeelTempAllocator {
    debug_check_initialized();
    match TempAllocator::new(in_size) {
        Some(alloc) => crate::core::alloc::handle_alloc(alloc) as *mut KeelTempAllocator,
        None => std::ptr::null_mut(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_temp_allocator_destroy(in_allocator: *mut KeelTempAllocator) {
    debug_assert!(!in_allocator.is_null());
    crate::core::alloc::handle_free(in_allocator as *mut TempAllocator);
}

#[no_mangle]
pub extern "C" fn keel_job_system_create(
    in_max_jobs: u32,
    in_max_barriers: u32,
    in_num_threads: i32,
) -> *mut KeelJobSystem {
    debug_check_initialized();
    crate::core::alloc::handle_alloc(JobSystem::new(in_max_jobs, in_max_barriers, in_num_threads))
        as *mut KeelJobSystem
}

#[no_mangle]
pub unsafe extern "C" fn keel_job_system_destroy(in_job_system: *mut KeelJobSystem) {
    debug_assert!(!in_job_system.is_null());
    crate::core::alloc::handle_free(in_job_system as *mut JobSystem);
}

// ---------------------------------------------------------------------------
// PhysicsSystem
// ---------------------------------------------------------------------------

/// Creates a physics system with fixed capacities. The three callback tables
/// become system-owned adapters; unregistered slots answer with safe
/// defaults (zero layers, no collisions).
#[no_mangle]
pub extern "C" fn keel_physics_system_create(
    in_max_bodies: u32,
    in_num_body_mutexes: u32,
    in_max_body_pairs: u32,
    in_max_contact_constraints: u32,
    in_broad_phase_layer_interface: KeelBroadPhaseLayerInterfaceVTable,
    in_object_vs_broad_phase_layer_filter: KeelObjectVsBroadPhaseLayerFilterVTable,
    in_object_layer_pair_filter: KeelObjectLayerPairFilterVTable,
) -> *mut KeelPhysicsSystem {
    debug_check_initialized();
    PhysicsSystem::create(
        in_max_bodies,
        in_num_body_mutexes,
        in_max_body_pairs,
        in_max_contact_constraints,
        Box::new(BroadPhaseLayerBridge::new(in_broad_phase_layer_interface)),
        Box::new(ObjectVsBroadPhaseBridge::new(
            in_object_vs_broad_phase_layer_filter,
        )),
        Box::new(PairFilterBridge::new(in_object_layer_pair_filter)),
    ) as *mut KeelPhysicsSystem
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_destroy(in_physics_system: *mut KeelPhysicsSystem) {
    debug_assert!(!in_physics_system.is_null());
    PhysicsSystem::destroy(in_physics_system as *mut PhysicsSystem);
}

/// Advances the simulation by `in_delta_time`. The temp allocator and job
/// system are required; a null for either is a contract violation. Returns a
/// bitmask of capacity-exhaustion flags; zero means success.
#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_update(
    in_physics_system: *mut KeelPhysicsSystem,
    in_delta_time: f32,
    in_collision_steps: i32,
    in_integration_sub_steps: i32,
    in_temp_allocator: *mut KeelTempAllocator,
    in_job_system: *mut KeelJobSystem,
) -> KeelPhysicsUpdateError {
    debug_assert!(
        !in_temp_allocator.is_null() && !in_job_system.is_null(),
        "update requires a temp allocator and a job system"
    );
    system_mut(in_physics_system).update(
        in_delta_time,
        in_collision_steps,
        in_integration_sub_steps,
        temp_alloc_ref(in_temp_allocator),
        job_system_ref(in_job_system),
    )
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_get_gravity(
    in_physics_system: *const KeelPhysicsSystem,
    out_gravity: *mut f32,
) {
    store_vec3(out_gravity, system_ref(in_physics_system).gravity());
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_set_gravity(
    in_physics_system: *mut KeelPhysicsSystem,
    in_gravity: *const f32,
) {
    system_mut(in_physics_system).set_gravity(load_vec3(in_gravity));
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_get_num_bodies(
    in_physics_system: *const KeelPhysicsSystem,
) -> u32 {
    system_ref(in_physics_system).num_bodies()
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_get_num_active_bodies(
    in_physics_system: *const KeelPhysicsSystem,
    in_type: KeelBodyType,
) -> u32 {
    let body_type = if in_type == KEEL_BODY_TYPE_SOFT {
        crate::core::body::BodyType::Soft
    } else {
        crate::core::body::BodyType::Rigid
    };
    system_ref(in_physics_system).num_active_bodies(body_type)
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_get_max_bodies(
    in_physics_system: *const KeelPhysicsSystem,
) -> u32 {
    system_ref(in_physics_system).max_bodies()
}

/// Installs the contact listener. All four callbacks are wired; null slots
/// fall back to their defaults. Passing a null table clears the listener.
#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_set_contact_listener(
    in_physics_system: *mut KeelPhysicsSystem,
    in_listener: *mut KeelContactListenerVTable,
) {
    let system = system_mut(in_physics_system);
    if in_listener.is_null() {
        system.set_contact_listener(None, 0);
        return;
    }
    system.set_contact_listener(
        Some(Box::new(ContactListenerBridge::new(*in_listener))),
        in_listener as usize,
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_get_contact_listener(
    in_physics_system: *const KeelPhysicsSystem,
) -> *mut c_void {
    system_ref(in_physics_system).contact_listener_raw() as *mut c_void
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_set_body_activation_listener(
    in_physics_system: *mut KeelPhysicsSystem,
    in_listener: *mut KeelBodyActivationListenerVTable,
) {
    let system = system_mut(in_physics_system);
    if in_listener.is_null() {
        system.set_activation_listener(None, 0);
        return;
    }
    system.set_activation_listener(
        Some(Box::new(ActivationListenerBridge::new(*in_listener))),
        in_listener as usize,
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_get_body_activation_listener(
    in_physics_system: *const KeelPhysicsSystem,
) -> *mut c_void {
    system_ref(in_physics_system).activation_listener_raw() as *mut c_void
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_add_step_listener(
    in_physics_system: *mut KeelPhysicsSystem,
    in_listener: *mut KeelPhysicsStepListenerVTable,
) {
    debug_assert!(!in_listener.is_null());
    let system = system_mut(in_physics_system);
    system.add_step_listener(
        in_listener as usize,
        Box::new(StepListenerBridge::new(*in_listener, in_physics_system)),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_remove_step_listener(
    in_physics_system: *mut KeelPhysicsSystem,
    in_listener: *mut KeelPhysicsStepListenerVTable,
) {
    system_mut(in_physics_system).remove_step_listener(in_listener as usize);
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_add_constraint(
    in_physics_system: *mut KeelPhysicsSystem,
    in_two_body_constraint: *mut KeelConstraint,
) {
    system_mut(in_physics_system).add_constraint(in_two_body_constraint as *const Constraint);
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_remove_constraint(
    in_physics_system: *mut KeelPhysicsSystem,
    in_two_body_constraint: *mut KeelConstraint,
) {
    system_mut(in_physics_system).remove_constraint(in_two_body_constraint as *const Constraint);
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_optimize_broad_phase(
    in_physics_system: *mut KeelPhysicsSystem,
) {
    system_mut(in_physics_system).optimize_broad_phase();
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_get_body_interface(
    in_physics_system: *mut KeelPhysicsSystem,
) -> *mut KeelBodyInterface {
    system_mut(in_physics_system).body_interface() as *mut KeelBodyInterface
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_get_body_interface_no_lock(
    in_physics_system: *mut KeelPhysicsSystem,
) -> *mut KeelBodyInterface {
    system_mut(in_physics_system).body_interface_nolock() as *mut KeelBodyInterface
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_get_body_lock_interface(
    in_physics_system: *const KeelPhysicsSystem,
) -> *const KeelBodyLockInterface {
    system_ref(in_physics_system).body_lock_interface() as *const KeelBodyLockInterface
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_get_body_lock_interface_no_lock(
    in_physics_system: *const KeelPhysicsSystem,
) -> *const KeelBodyLockInterface {
    system_ref(in_physics_system).body_lock_interface_nolock() as *const KeelBodyLockInterface
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_get_narrow_phase_query(
    in_physics_system: *const KeelPhysicsSystem,
) -> *const KeelNarrowPhaseQuery {
    system_ref(in_physics_system).narrow_phase_query() as *const KeelNarrowPhaseQuery
}

#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_get_narrow_phase_query_no_lock(
    in_physics_system: *const KeelPhysicsSystem,
) -> *const KeelNarrowPhaseQuery {
    system_ref(in_physics_system).narrow_phase_query_nolock() as *const KeelNarrowPhaseQuery
}

/// Copies up to `in_max_body_ids` ids of all created bodies.
#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_get_body_ids(
    in_physics_system: *const KeelPhysicsSystem,
    in_max_body_ids: u32,
    out_num_body_ids: *mut u32,
    out_body_ids: *mut KeelBodyId,
) {
    debug_assert!(!out_num_body_ids.is_null());
    let ids = system_ref(in_physics_system).body_manager().body_ids();
    let count = ids.len().min(in_max_body_ids as usize);
    *out_num_body_ids = count as u32;
    if !out_body_ids.is_null() {
        for (i, id) in ids.iter().take(count).enumerate() {
            *out_body_ids.add(i) = id.0;
        }
    }
}

/// Copies up to `in_max_body_ids` ids of currently active bodies.
#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_get_active_body_ids(
    in_physics_system: *const KeelPhysicsSystem,
    in_max_body_ids: u32,
    out_num_body_ids: *mut u32,
    out_body_ids: *mut KeelBodyId,
) {
    debug_assert!(!out_num_body_ids.is_null());
    let system = system_ref(in_physics_system);
    let ids = system.body_manager().active_body_ids();
    let count = ids.len().min(in_max_body_ids as usize);
    *out_num_body_ids = count as u32;
    if !out_body_ids.is_null() {
        for (i, id) in ids.iter().take(count).enumerate() {
            *out_body_ids.add(i) = id.0;
        }
    }
}

/// Direct access to the body slot array. Entries with
/// [`KEEL_IS_FREED_BODY_BIT`] set are freelist links, not bodies; the array
/// is valid only until the next structural change.
#[no_mangle]
pub unsafe extern "C" fn keel_physics_system_get_bodies_unsafe(
    in_physics_system: *mut KeelPhysicsSystem,
) -> *mut *mut KeelBody {
    system_mut(in_physics_system).body_manager_mut().bodies_unsafe() as *mut *mut KeelBody
}

// ---------------------------------------------------------------------------
// BodyLockInterface
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn keel_body_lock_interface_lock_read(
    in_lock_interface: *const KeelBodyLockInterface,
    in_body_id: KeelBodyId,
    out_lock: *mut KeelBodyLockRead,
) {
    debug_assert!(!out_lock.is_null());
    lock_iface_ref(in_lock_interface)
        .lock_read(body_id_from_raw(in_body_id), lock_read_mut(out_lock));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_lock_interface_unlock_read(
    in_lock_interface: *const KeelBodyLockInterface,
    io_lock: *mut KeelBodyLockRead,
) {
    debug_assert!(!io_lock.is_null());
    lock_iface_ref(in_lock_interface).unlock_read(lock_read_mut(io_lock));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_lock_interface_lock_write(
    in_lock_interface: *const KeelBodyLockInterface,
    in_body_id: KeelBodyId,
    out_lock: *mut KeelBodyLockWrite,
) {
    debug_assert!(!out_lock.is_null());
    lock_iface_ref(in_lock_interface)
        .lock_write(body_id_from_raw(in_body_id), lock_write_mut(out_lock));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_lock_interface_unlock_write(
    in_lock_interface: *const KeelBodyLockInterface,
    io_lock: *mut KeelBodyLockWrite,
) {
    debug_assert!(!io_lock.is_null());
    lock_iface_ref(in_lock_interface).unlock_write(lock_write_mut(io_lock));
}

// ---------------------------------------------------------------------------
// NarrowPhaseQuery
// ---------------------------------------------------------------------------

/// Closest-hit ray cast. `io_hit` must be default-initialized; its fraction
/// doubles as the early-out threshold. The filter tables may be null for "no
/// filtering".
#[no_mangle]
pub unsafe extern "C" fn keel_narrow_phase_query_cast_ray(
    in_query: *const KeelNarrowPhaseQuery,
    in_ray: *const KeelRayCast,
    io_hit: *mut KeelRayCastResult,
    in_broad_phase_layer_filter: *const KeelBroadPhaseLayerFilterVTable,
    in_object_layer_filter: *const KeelObjectLayerFilterVTable,
    in_body_filter: *const KeelBodyFilterVTable,
) -> bool {
    debug_assert!(!in_ray.is_null() && !io_hit.is_null());
    let broad_phase = (!in_broad_phase_layer_filter.is_null())
        .then(|| BroadPhaseLayerFilterBridge::new(*in_broad_phase_layer_filter));
    let object = (!in_object_layer_filter.is_null())
        .then(|| ObjectLayerFilterBridge::new(*in_object_layer_filter));
    let body = (!in_body_filter.is_null()).then(|| BodyFilterBridge::new(*in_body_filter));

    query_ref(in_query).cast_ray(
        ray_cast_ref(in_ray),
        ray_result_mut(io_hit),
        broad_phase
            .as_ref()
            .map(|f| f as &dyn crate::system::query::BroadPhaseLayerQueryFilter),
        object
            .as_ref()
            .map(|f| f as &dyn crate::system::query::ObjectLayerQueryFilter),
        body.as_ref()
            .map(|f| f as &dyn crate::system::query::BodyQueryFilter),
    )
}
