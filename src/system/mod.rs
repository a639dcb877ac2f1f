//! The physics system: body storage, filters, listeners, and the update
//! entry point.

pub mod body_interface;
pub mod body_manager;
pub mod contacts;
pub mod locks;
pub mod query;

use glam::Vec3;

use crate::config::{self, DEFAULT_BODY_MUTEX_COUNT, UPDATE_BUDGET_MS};
use crate::core::alloc::{handle_alloc, handle_free};
use crate::core::body::{Body, BodyType};
use crate::core::constraint::Constraint;
use crate::core::contact::ContactEvents;
use crate::core::filter::{
    ActivationEvents, BroadPhaseLayerMap, LayerPairFilter, ObjectVsBroadPhaseFilter, StepEvents,
};
use crate::core::id::BodyId;
use crate::jobs::{JobSystem, TempAllocator};
use crate::utils::logging::ScopedTimer;

pub use body_interface::BodyInterface;
pub use body_manager::{BodyManager, FREED_BODY_BIT};
pub use contacts::{manifold_for_pair, pair_can_collide, pair_overlaps, ContactGraph, PairOutcome};
pub use locks::{BodyLockInterface, BodyLockRead, BodyLockWrite, SharedMutex};
pub use query::{NarrowPhaseQuery, RayCast, RayCastResult, RayCastSettings, TransformedShape};

/// Update completed without running out of anything.
pub const UPDATE_ERROR_NONE: u8 = 0;
/// The manifold cache could not hold every touching pair.
pub const UPDATE_ERROR_MANIFOLD_CACHE_FULL: u8 = 1 << 0;
/// The body-pair list filled before the sweep finished.
pub const UPDATE_ERROR_BODY_PAIR_CACHE_FULL: u8 = 1 << 1;
/// More non-sensor contacts than the constraint buffer can take.
pub const UPDATE_ERROR_CONTACT_CONSTRAINTS_FULL: u8 = 1 << 2;

/// Send-able raw body pointer for fanning integration across workers. Each
/// pointer in a batch refers to a distinct body.
#[derive(Clone, Copy)]
struct BodyPtr(*mut Body);

unsafe impl Send for BodyPtr {}
unsafe impl Sync for BodyPtr {}

#[repr(C)]
#[derive(Clone, Copy)]
struct BodyPair(*mut Body, *mut Body);

/// Top-level simulation container. Created once, stepped once per tick.
pub struct PhysicsSystem {
    manager: BodyManager,
    shards: Box<[SharedMutex]>,
    structural: parking_lot::Mutex<()>,
    gravity: Vec3,

    // Extension-point adapters, owned for the system's whole lifetime.
    broad_phase_layer_map: Box<dyn BroadPhaseLayerMap>,
    object_vs_broad_phase_filter: Box<dyn ObjectVsBroadPhaseFilter>,
    pair_filter: Box<dyn LayerPairFilter>,
    contact_listener: Option<Box<dyn ContactEvents>>,
    contact_listener_raw: usize,
    activation_listener: Option<Box<dyn ActivationEvents>>,
    activation_listener_raw: usize,
    step_listeners: Vec<(usize, Box<dyn StepEvents>)>,

    constraints: Vec<*const Constraint>,
    contact_graph: ContactGraph,
    max_body_pairs: u32,
    max_contact_constraints: u32,

    // Boundary sub-objects; addresses are stable because the system lives
    // behind one heap allocation.
    body_interface: BodyInterface,
    body_interface_nolock: BodyInterface,
    body_lock_interface: BodyLockInterface,
    body_lock_interface_nolock: BodyLockInterface,
    narrow_phase_query: NarrowPhaseQuery,
    narrow_phase_query_nolock: NarrowPhaseQuery,
}

unsafe impl Send for PhysicsSystem {}
unsafe impl Sync for PhysicsSystem {}

impl PhysicsSystem {
    /// Allocates and wires a system. The filter adapters are owned by the
    /// system and dropped with it.
    pub fn create(
        max_bodies: u32,
        num_body_mutexes: u32,
        max_body_pairs: u32,
        max_contact_constraints: u32,
        broad_phase_layer_map: Box<dyn BroadPhaseLayerMap>,
        object_vs_broad_phase_filter: Box<dyn ObjectVsBroadPhaseFilter>,
        pair_filter: Box<dyn LayerPairFilter>,
    ) -> *mut PhysicsSystem {
        let shard_count = if num_body_mutexes == 0 {
            DEFAULT_BODY_MUTEX_COUNT
        } else {
            num_body_mutexes
        }
        .next_power_of_two()
        .min(1024) as usize;
        let shards: Box<[SharedMutex]> =
            (0..shard_count).map(|_| SharedMutex::new()).collect();

        let system = PhysicsSystem {
            manager: BodyManager::new(max_bodies),
            shards,
            structural: parking_lot::Mutex::new(()),
            gravity: Vec3::from_array(config::DEFAULT_GRAVITY),
            broad_phase_layer_map,
            object_vs_broad_phase_filter,
            pair_filter,
            contact_listener: None,
            contact_listener_raw: 0,
            activation_listener: None,
            activation_listener_raw: 0,
            step_listeners: Vec::new(),
            constraints: Vec::new(),
            contact_graph: ContactGraph::new(max_body_pairs as usize),
            max_body_pairs,
            max_contact_constraints,
            body_interface: BodyInterface {
                system: std::ptr::null_mut(),
                locking: true,
            },
            body_interface_nolock: BodyInterface {
                system: std::ptr::null_mut(),
                locking: false,
            },
            body_lock_interface: BodyLockInterface {
                system: std::ptr::null(),
                locking: true,
            },
            body_lock_interface_nolock: BodyLockInterface {
                system: std::ptr::null(),
                locking: false,
            },
            narrow_phase_query: NarrowPhaseQuery {
                system: std::ptr::null(),
                locking: true,
            },
            narrow_phase_query_nolock: NarrowPhaseQuery {
                system: std::ptr::null(),
                locking: false,
            },
        };

        let ptr = handle_alloc(system);
        if ptr.is_null() {
            return std::ptr::null_mut();
        }
        unsafe {
            (*ptr).body_interface.system = ptr;
            (*ptr).body_interface_nolock.system = ptr;
            (*ptr).body_lock_interface.system = ptr;
            (*ptr).body_lock_interface_nolock.system = ptr;
            (*ptr).narrow_phase_query.system = ptr;
            (*ptr).narrow_phase_query_nolock.system = ptr;
        }
        log::debug!(
            "physics system created: {max_bodies} bodies, {max_body_pairs} pairs, \
             {max_contact_constraints} contact constraints"
        );
        ptr
    }

    /// # Safety
    /// `ptr` must come from [`PhysicsSystem::create`] and not be used again.
    pub unsafe fn destroy(ptr: *mut PhysicsSystem) {
        handle_free(ptr);
    }

    #[inline]
    pub fn body_manager(&self) -> &BodyManager {
        &self.manager
    }

    #[inline]
    pub fn body_manager_mut(&mut self) -> &mut BodyManager {
        &mut self.manager
    }

    pub(crate) fn structural_lock(&self) -> parking_lot::MutexGuard<'_, ()> {
        self.structural.lock()
    }

    #[inline]
    pub(crate) fn lock_shards(&self) -> &[SharedMutex] {
        &self.shards
    }

    #[inline]
    pub(crate) fn lock_shard(&self, id: BodyId) -> &SharedMutex {
        &self.shards[id.index() as usize & (self.shards.len() - 1)]
    }

    pub fn broad_phase_layer_map(&self) -> &dyn BroadPhaseLayerMap {
        self.broad_phase_layer_map.as_ref()
    }

    pub fn object_vs_broad_phase_filter(&self) -> &dyn ObjectVsBroadPhaseFilter {
        self.object_vs_broad_phase_filter.as_ref()
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    pub fn activate(&mut self, id: BodyId) {
        let _guard = self.structural.lock();
        self.manager
            .activate(id, self.activation_listener.as_deref());
    }

    pub fn deactivate(&mut self, id: BodyId) {
        let _guard = self.structural.lock();
        self.manager
            .deactivate(id, self.activation_listener.as_deref());
    }

    pub(crate) fn activation_events(&self) -> Option<&dyn ActivationEvents> {
        self.activation_listener.as_deref()
    }

    pub(crate) fn purge_contacts(&mut self, id: BodyId) {
        self.contact_graph
            .purge_body(id, self.contact_listener.as_deref());
    }

    pub(crate) fn create_body_locked(
        &mut self,
        settings: &crate::core::body::BodyCreationSettings,
    ) -> Result<*mut Body, crate::core::shape::ShapeError> {
        let _guard = self.structural.lock();
        self.manager.create_body(settings)
    }

    pub(crate) fn create_body_with_id_locked(
        &mut self,
        id: BodyId,
        settings: &crate::core::body::BodyCreationSettings,
    ) -> Result<*mut Body, crate::core::shape::ShapeError> {
        let _guard = self.structural.lock();
        self.manager.create_body_with_id(id, settings)
    }

    pub(crate) fn destroy_body_locked(&mut self, id: BodyId) {
        let _guard = self.structural.lock();
        self.manager
            .destroy_body(id, self.activation_listener.as_deref());
    }

    pub(crate) fn add_body_locked(&mut self, id: BodyId, activation: crate::core::body::Activation) {
        let _guard = self.structural.lock();
        self.manager
            .add_body(id, activation, self.activation_listener.as_deref());
    }

    pub(crate) fn remove_body_locked(&mut self, id: BodyId) {
        let _guard = self.structural.lock();
        self.manager
            .remove_body(id, self.activation_listener.as_deref());
        self.contact_graph
            .purge_body(id, self.contact_listener.as_deref());
    }

    /// Installs (or clears) the contact listener, remembering the caller's
    /// raw pointer so it can be handed back.
    pub fn set_contact_listener(
        &mut self,
        listener: Option<Box<dyn ContactEvents>>,
        raw: usize,
    ) {
        self.contact_listener = listener;
        self.contact_listener_raw = if self.contact_listener.is_some() {
            raw
        } else {
            0
        };
    }

    pub fn contact_listener_raw(&self) -> usize {
        self.contact_listener_raw
    }

    pub fn set_activation_listener(
        &mut self,
        listener: Option<Box<dyn ActivationEvents>>,
        raw: usize,
    ) {
        self.activation_listener = listener;
        self.activation_listener_raw = if self.activation_listener.is_some() {
            raw
        } else {
            0
        };
    }

    pub fn activation_listener_raw(&self) -> usize {
        self.activation_listener_raw
    }

    pub fn add_step_listener(&mut self, raw: usize, listener: Box<dyn StepEvents>) {
        self.step_listeners.push((raw, listener));
    }

    pub fn remove_step_listener(&mut self, raw: usize) {
        self.step_listeners.retain(|(key, _)| *key != raw);
    }

    /// Adds a constraint, keeping a reference for the system.
    pub fn add_constraint(&mut self, constraint: *const Constraint) {
        if constraint.is_null() {
            return;
        }
        unsafe { Constraint::add_ref(constraint) };
        self.constraints.push(constraint);
    }

    pub fn remove_constraint(&mut self, constraint: *const Constraint) {
        if let Some(pos) = self.constraints.iter().position(|&c| c == constraint) {
            self.constraints.swap_remove(pos);
            unsafe { Constraint::release(constraint) };
        }
    }

    pub fn constraints(&self) -> &[*const Constraint] {
        &self.constraints
    }

    pub fn num_bodies(&self) -> u32 {
        self.manager.num_bodies()
    }

    pub fn num_active_bodies(&self, body_type: BodyType) -> u32 {
        self.manager.num_active_bodies(body_type)
    }

    pub fn max_bodies(&self) -> u32 {
        self.manager.max_bodies()
    }

    pub fn body_interface(&mut self) -> *mut BodyInterface {
        &mut self.body_interface
    }

    pub fn body_interface_nolock(&mut self) -> *mut BodyInterface {
        &mut self.body_interface_nolock
    }

    pub fn body_lock_interface(&self) -> *const BodyLockInterface {
        &self.body_lock_interface
    }

    pub fn body_lock_interface_nolock(&self) -> *const BodyLockInterface {
        &self.body_lock_interface_nolock
    }

    pub fn narrow_phase_query(&self) -> *const NarrowPhaseQuery {
        &self.narrow_phase_query
    }

    pub fn narrow_phase_query_nolock(&self) -> *const NarrowPhaseQuery {
        &self.narrow_phase_query_nolock
    }

    /// Refreshes the world bounds of every added body. The heavy tree
    /// rebuild this names in the original engine has no counterpart here.
    pub fn optimize_broad_phase(&mut self) {
        for body in self.manager.added_bodies() {
            unsafe { (*body).update_bounds() };
        }
    }

    /// Advances the simulation. `integration_sub_steps` is accepted for
    /// signature compatibility and ignored, like the boundary it mirrors.
    pub fn update(
        &mut self,
        delta_time: f32,
        collision_steps: i32,
        _integration_sub_steps: i32,
        temp_allocator: &TempAllocator,
        job_system: &JobSystem,
    ) -> u8 {
        debug_assert!(delta_time >= 0.0);
        debug_assert!(collision_steps > 0);
        let _timer = ScopedTimer::with_budget("physics update", UPDATE_BUDGET_MS);

        let mut error = UPDATE_ERROR_NONE;
        let steps = collision_steps.max(1);
        let step_dt = delta_time / steps as f32;

        for _ in 0..steps {
            for (_, listener) in &self.step_listeners {
                listener.on_step(step_dt);
            }
            self.integrate_active(step_dt, job_system);
            error |= self.collide_pairs(temp_allocator);
        }

        if error != UPDATE_ERROR_NONE {
            log::warn!("physics update reported capacity exhaustion: {error:#04b}");
        }
        error
    }

    fn integrate_active(&mut self, dt: f32, job_system: &JobSystem) {
        let gravity = self.gravity;
        let batch: Vec<BodyPtr> = self
            .manager
            .active_body_ids()
            .iter()
            .filter_map(|&id| self.manager.get_body_ptr(id))
            .map(BodyPtr)
            .collect();
        if batch.is_empty() {
            return;
        }
        job_system.install(move || {
            #[cfg(feature = "parallel")]
            {
                use rayon::prelude::*;
                batch
                    .par_iter()
                    .for_each(|ptr| unsafe { (*ptr.0).integrate(gravity, dt) });
            }
            #[cfg(not(feature = "parallel"))]
            for ptr in &batch {
                unsafe { (*ptr.0).integrate(gravity, dt) };
            }
        });
    }

    /// One pass of layer-filtered AABB pair detection plus contact event
    /// dispatch. Returns the capacity error bits for this step.
    fn collide_pairs(&mut self, temp_allocator: &TempAllocator) -> u8 {
        let mut error = UPDATE_ERROR_NONE;
        let added = self.manager.added_bodies();
        let capacity = self.max_body_pairs as usize;

        // Pair scratch comes from the step's temp allocator; the registered
        // heap backs it up when the block is too small.
        let scratch_bytes = capacity * std::mem::size_of::<BodyPair>();
        let mut from_temp = true;
        let mut scratch = temp_allocator.allocate(scratch_bytes) as *mut BodyPair;
        if scratch.is_null() {
            from_temp = false;
            scratch = unsafe {
                crate::core::alloc::alloc_block(scratch_bytes, std::mem::align_of::<BodyPair>())
            } as *mut BodyPair;
        }

        let mut pair_count = 0usize;
        'outer: for i in 0..added.len() {
            for j in i + 1..added.len() {
                let (a, b) = unsafe { (&*added[i], &*added[j]) };
                if !pair_can_collide(a, b, self.pair_filter.as_ref()) {
                    continue;
                }
                if !pair_overlaps(a, b) {
                    continue;
                }
                if pair_count == capacity {
                    error |= UPDATE_ERROR_BODY_PAIR_CACHE_FULL;
                    break 'outer;
                }
                unsafe { scratch.add(pair_count).write(BodyPair(added[i], added[j])) };
                pair_count += 1;
            }
        }

        let listener = self.contact_listener.as_deref();
        self.contact_graph.begin_step();
        for k in 0..pair_count {
            let BodyPair(a, b) = unsafe { scratch.add(k).read() };
            let outcome =
                self.contact_graph
                    .process_pair(unsafe { &*a }, unsafe { &*b }, listener);
            if outcome == PairOutcome::CacheFull {
                error |= UPDATE_ERROR_MANIFOLD_CACHE_FULL;
            }
        }
        self.contact_graph.finish_step(listener);

        if self.contact_graph.constraint_count() > self.max_contact_constraints as usize {
            error |= UPDATE_ERROR_CONTACT_CONSTRAINTS_FULL;
        }

        if from_temp {
            temp_allocator.free(scratch as *mut u8, scratch_bytes);
        } else {
            unsafe { crate::core::alloc::free_block(scratch as *mut u8) };
        }
        error
    }

    /// Per-pair contact settings as last observed (listener edits included).
    pub fn contact_settings_for(
        &self,
        a: BodyId,
        b: BodyId,
    ) -> Option<crate::core::contact::ContactSettings> {
        self.contact_graph.pair_settings(a, b)
    }
}

impl Drop for PhysicsSystem {
    fn drop(&mut self) {
        for &constraint in &self.constraints {
            unsafe { Constraint::release(constraint) };
        }
    }
}
