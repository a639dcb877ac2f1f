use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use keel::ffi::*;

// Several tests share the static callback counters; serialize them.
static TEST_LOCK: Mutex<()> = Mutex::new(());

fn init() {
    keel_register_default_allocator();
    keel_create_factory();
    keel_register_types();
}

// Two-layer scheme: non-moving (0) only collides with moving (1).
unsafe extern "C" fn bp_layer_count() -> u32 {
    2
}

unsafe extern "C" fn bp_layer_map(layer: KeelObjectLayer) -> KeelBroadPhaseLayer {
    layer as KeelBroadPhaseLayer
}

unsafe extern "C" fn layers_collide(a: KeelObjectLayer, b: KeelObjectLayer) -> bool {
    match a {
        0 => b == 1,
        1 => true,
        _ => false,
    }
}

unsafe extern "C" fn layer_vs_bp(a: KeelObjectLayer, b: KeelBroadPhaseLayer) -> bool {
    match a {
        0 => b == 1,
        1 => true,
        _ => false,
    }
}

fn layered_system(
    max_bodies: u32,
    max_body_pairs: u32,
    max_contact_constraints: u32,
) -> *mut KeelPhysicsSystem {
    init();
    keel_physics_system_create(
        max_bodies,
        0,
        max_body_pairs,
        max_contact_constraints,
        KeelBroadPhaseLayerInterfaceVTable {
            get_num_broad_phase_layers: Some(bp_layer_count),
            get_broad_phase_layer: Some(bp_layer_map),
        },
        KeelObjectVsBroadPhaseLayerFilterVTable {
            should_collide: Some(layer_vs_bp),
        },
        KeelObjectLayerPairFilterVTable {
            should_collide: Some(layers_collide),
        },
    )
}

unsafe fn make_shape(radius: f32) -> *mut KeelShape {
    let settings = keel_sphere_shape_settings_create(radius) as *mut KeelShapeSettings;
    let shape = keel_shape_settings_create_shape(settings);
    keel_shape_settings_release(settings);
    shape
}

unsafe fn add_body(
    system: *mut KeelPhysicsSystem,
    shape: *const KeelShape,
    y: KeelReal,
    motion_type: KeelMotionType,
    layer: KeelObjectLayer,
) -> KeelBodyId {
    let iface = keel_physics_system_get_body_interface(system);
    let mut settings = MaybeUninit::<KeelBodyCreationSettings>::uninit();
    let position: [KeelReal; 3] = [0.0, y, 0.0];
    let rotation: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
    keel_body_creation_settings_set(
        settings.as_mut_ptr(),
        shape,
        position.as_ptr(),
        rotation.as_ptr(),
        motion_type,
        layer,
    );
    keel_body_interface_create_and_add_body(iface, settings.as_ptr(), KEEL_ACTIVATION_ACTIVATE)
}

static CONTACT_ADDED: AtomicU32 = AtomicU32::new(0);
static CONTACT_PERSISTED: AtomicU32 = AtomicU32::new(0);
static CONTACT_REMOVED: AtomicU32 = AtomicU32::new(0);

unsafe extern "C" fn on_contact_added(
    _body1: *const KeelBody,
    _body2: *const KeelBody,
    _manifold: *const KeelContactManifold,
    io_settings: *mut KeelContactSettings,
) {
    CONTACT_ADDED.fetch_add(1, Ordering::SeqCst);
    // Mutate the live settings; the persisted callback must observe this.
    (*io_settings).combined_friction = 0.125;
}

unsafe extern "C" fn on_contact_persisted(
    _body1: *const KeelBody,
    _body2: *const KeelBody,
    _manifold: *const KeelContactManifold,
    io_settings: *mut KeelContactSettings,
) {
    if (*io_settings).combined_friction == 0.125 {
        CONTACT_PERSISTED.fetch_add(1, Ordering::SeqCst);
    }
}

unsafe extern "C" fn on_contact_removed(_pair: *const KeelSubShapeIdPair) {
    CONTACT_REMOVED.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn overlapping_static_and_dynamic_bodies_fire_one_contact_added() {
    let _guard = TEST_LOCK.lock().unwrap();
    let system = layered_system(1024, 1024, 1024);
    CONTACT_ADDED.store(0, Ordering::SeqCst);
    CONTACT_PERSISTED.store(0, Ordering::SeqCst);
    CONTACT_REMOVED.store(0, Ordering::SeqCst);

    unsafe {
        let mut listener = KeelContactListenerVTable {
            on_contact_validate: None,
            on_contact_added: Some(on_contact_added),
            on_contact_persisted: Some(on_contact_persisted),
            on_contact_removed: Some(on_contact_removed),
        };
        keel_physics_system_set_contact_listener(system, &mut listener);

        let shape = make_shape(1.0);
        let _floor = add_body(system, shape, 0.0, KEEL_MOTION_TYPE_STATIC, 0);
        let ball = add_body(system, shape, 0.5, KEEL_MOTION_TYPE_DYNAMIC, 1);

        let temp = keel_temp_allocator_create(1024 * 1024);
        let jobs = keel_job_system_create(64, 8, 2);
        let error = keel_physics_system_update(system, 1.0 / 60.0, 1, 1, temp, jobs);

        assert_eq!(error, KEEL_PHYSICS_UPDATE_ERROR_NO_ERROR);
        assert_eq!(CONTACT_ADDED.load(Ordering::SeqCst), 1);

        // Still overlapping next step: persisted, with the mutated settings.
        let error = keel_physics_system_update(system, 1.0 / 60.0, 1, 1, temp, jobs);
        assert_eq!(error, KEEL_PHYSICS_UPDATE_ERROR_NO_ERROR);
        assert_eq!(CONTACT_ADDED.load(Ordering::SeqCst), 1);
        assert!(CONTACT_PERSISTED.load(Ordering::SeqCst) >= 1);

        // Teleport the ball away; the pair is removed exactly once.
        let iface = keel_physics_system_get_body_interface(system);
        let far: [KeelReal; 3] = [100.0, 100.0, 100.0];
        keel_body_interface_set_position(iface, ball, far.as_ptr(), KEEL_ACTIVATION_ACTIVATE);
        keel_physics_system_update(system, 1.0 / 60.0, 1, 1, temp, jobs);
        assert_eq!(CONTACT_REMOVED.load(Ordering::SeqCst), 1);

        keel_job_system_destroy(jobs);
        keel_temp_allocator_destroy(temp);
        keel_shape_release(shape);
        keel_physics_system_destroy(system);
    }
}

#[test]
fn unregistered_pair_filter_fails_closed() {
    let _guard = TEST_LOCK.lock().unwrap();
    init();
    // All three callback tables empty: zero layers, nothing collides.
    let system = keel_physics_system_create(
        64,
        0,
        64,
        64,
        KeelBroadPhaseLayerInterfaceVTable::default(),
        KeelObjectVsBroadPhaseLayerFilterVTable::default(),
        KeelObjectLayerPairFilterVTable::default(),
    );
    CONTACT_ADDED.store(0, Ordering::SeqCst);

    unsafe {
        let mut listener = KeelContactListenerVTable {
            on_contact_added: Some(on_contact_added),
            ..Default::default()
        };
        keel_physics_system_set_contact_listener(system, &mut listener);

        let shape = make_shape(1.0);
        add_body(system, shape, 0.0, KEEL_MOTION_TYPE_STATIC, 0);
        add_body(system, shape, 0.5, KEEL_MOTION_TYPE_DYNAMIC, 1);

        let temp = keel_temp_allocator_create(64 * 1024);
        let jobs = keel_job_system_create(16, 4, 1);
        let error = keel_physics_system_update(system, 1.0 / 60.0, 1, 1, temp, jobs);

        assert_eq!(error, KEEL_PHYSICS_UPDATE_ERROR_NO_ERROR);
        assert_eq!(CONTACT_ADDED.load(Ordering::SeqCst), 0);

        keel_job_system_destroy(jobs);
        keel_temp_allocator_destroy(temp);
        keel_shape_release(shape);
        keel_physics_system_destroy(system);
    }
}

#[test]
fn pair_cache_exhaustion_is_reported_not_fatal() {
    let _guard = TEST_LOCK.lock().unwrap();
    // Room for one pair only, but three mutually overlapping dynamic bodies.
    let system = layered_system(64, 1, 1);
    unsafe {
        let shape = make_shape(2.0);
        for i in 0..3 {
            add_body(system, shape, i as KeelReal * 0.1, KEEL_MOTION_TYPE_DYNAMIC, 1);
        }

        let temp = keel_temp_allocator_create(64 * 1024);
        let jobs = keel_job_system_create(16, 4, 1);
        let error = keel_physics_system_update(system, 1.0 / 60.0, 1, 1, temp, jobs);

        assert_ne!(error & KEEL_PHYSICS_UPDATE_ERROR_BODY_PAIR_CACHE_FULL, 0);

        keel_job_system_destroy(jobs);
        keel_temp_allocator_destroy(temp);
        keel_shape_release(shape);
        keel_physics_system_destroy(system);
    }
}

static VALIDATE_CALLS: AtomicU32 = AtomicU32::new(0);

unsafe extern "C" fn reject_all_contacts(
    _body1: *const KeelBody,
    _body2: *const KeelBody,
    _base_offset: *const KeelReal,
    _result: *const KeelCollideShapeResult,
) -> KeelValidateResult {
    VALIDATE_CALLS.fetch_add(1, Ordering::SeqCst);
    KEEL_VALIDATE_RESULT_REJECT_ALL_CONTACTS
}

#[test]
fn rejected_contacts_never_reach_the_added_callback() {
    let _guard = TEST_LOCK.lock().unwrap();
    let system = layered_system(64, 64, 64);
    CONTACT_ADDED.store(0, Ordering::SeqCst);
    VALIDATE_CALLS.store(0, Ordering::SeqCst);

    unsafe {
        let mut listener = KeelContactListenerVTable {
            on_contact_validate: Some(reject_all_contacts),
            on_contact_added: Some(on_contact_added),
            ..Default::default()
        };
        keel_physics_system_set_contact_listener(system, &mut listener);

        let shape = make_shape(1.0);
        add_body(system, shape, 0.0, KEEL_MOTION_TYPE_STATIC, 0);
        add_body(system, shape, 0.5, KEEL_MOTION_TYPE_DYNAMIC, 1);

        let temp = keel_temp_allocator_create(64 * 1024);
        let jobs = keel_job_system_create(16, 4, 1);
        keel_physics_system_update(system, 1.0 / 60.0, 1, 1, temp, jobs);

        assert!(VALIDATE_CALLS.load(Ordering::SeqCst) >= 1);
        assert_eq!(CONTACT_ADDED.load(Ordering::SeqCst), 0);

        keel_job_system_destroy(jobs);
        keel_temp_allocator_destroy(temp);
        keel_shape_release(shape);
        keel_physics_system_destroy(system);
    }
}

static ACTIVATED: AtomicU32 = AtomicU32::new(0);
static DEACTIVATED: AtomicU32 = AtomicU32::new(0);

unsafe extern "C" fn on_activated(
    _user_data: *mut std::os::raw::c_void,
    _body_id: *const KeelBodyId,
    _body_user_data: u64,
) {
    ACTIVATED.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn on_deactivated(
    _user_data: *mut std::os::raw::c_void,
    _body_id: *const KeelBodyId,
    _body_user_data: u64,
) {
    DEACTIVATED.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn activation_listener_sees_add_and_remove() {
    let _guard = TEST_LOCK.lock().unwrap();
    let system = layered_system(64, 64, 64);
    ACTIVATED.store(0, Ordering::SeqCst);
    DEACTIVATED.store(0, Ordering::SeqCst);

    unsafe {
        let mut listener = KeelBodyActivationListenerVTable {
            user_data: None,
            on_body_activated: Some(on_activated),
            on_body_deactivated: Some(on_deactivated),
        };
        keel_physics_system_set_body_activation_listener(system, &mut listener);

        let shape = make_shape(0.5);
        let id = add_body(system, shape, 0.0, KEEL_MOTION_TYPE_DYNAMIC, 1);
        assert_eq!(ACTIVATED.load(Ordering::SeqCst), 1);

        let iface = keel_physics_system_get_body_interface(system);
        keel_body_interface_deactivate_body(iface, id);
        assert_eq!(DEACTIVATED.load(Ordering::SeqCst), 1);

        keel_body_interface_remove_body(iface, id);
        keel_body_interface_destroy_body(iface, id);
        keel_shape_release(shape);
        keel_physics_system_destroy(system);
    }
}

static STEPS_SEEN: AtomicU32 = AtomicU32::new(0);

unsafe extern "C" fn on_step(
    _user_data: *mut std::os::raw::c_void,
    _delta_time: f32,
    _system: *mut KeelPhysicsSystem,
) {
    STEPS_SEEN.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn step_listeners_run_once_per_collision_step() {
    let _guard = TEST_LOCK.lock().unwrap();
    let system = layered_system(8, 8, 8);
    STEPS_SEEN.store(0, Ordering::SeqCst);
    unsafe {
        let mut listener = KeelPhysicsStepListenerVTable {
            user_data: None,
            on_step: Some(on_step),
        };
        keel_physics_system_add_step_listener(system, &mut listener);

        let temp = keel_temp_allocator_create(16 * 1024);
        let jobs = keel_job_system_create(16, 4, 1);
        keel_physics_system_update(system, 1.0 / 30.0, 2, 1, temp, jobs);
        assert_eq!(STEPS_SEEN.load(Ordering::SeqCst), 2);

        keel_physics_system_remove_step_listener(system, &mut listener);
        keel_physics_system_update(system, 1.0 / 30.0, 2, 1, temp, jobs);
        assert_eq!(STEPS_SEEN.load(Ordering::SeqCst), 2);

        keel_job_system_destroy(jobs);
        keel_temp_allocator_destroy(temp);
        keel_physics_system_destroy(system);
    }
}

#[test]
fn gravity_moves_active_dynamic_bodies() {
    let _guard = TEST_LOCK.lock().unwrap();
    let system = layered_system(8, 8, 8);
    unsafe {
        let shape = make_shape(0.5);
        let id = add_body(system, shape, 10.0, KEEL_MOTION_TYPE_DYNAMIC, 1);

        let temp = keel_temp_allocator_create(16 * 1024);
        let jobs = keel_job_system_create(16, 4, 1);
        for _ in 0..10 {
            keel_physics_system_update(system, 1.0 / 60.0, 1, 1, temp, jobs);
        }

        let iface = keel_physics_system_get_body_interface(system);
        let mut position: [KeelReal; 3] = [0.0; 3];
        keel_body_interface_get_position(iface, id, position.as_mut_ptr());
        assert!(position[1] < 10.0);

        let mut velocity = [0.0f32; 3];
        keel_body_interface_get_linear_velocity(iface, id, velocity.as_mut_ptr());
        assert!(velocity[1] < 0.0);

        keel_job_system_destroy(jobs);
        keel_temp_allocator_destroy(temp);
        keel_shape_release(shape);
        keel_physics_system_destroy(system);
    }
}

#[test]
fn gravity_accessors_round_trip() {
    let _guard = TEST_LOCK.lock().unwrap();
    let system = layered_system(4, 4, 4);
    unsafe {
        let gravity = [0.0f32, -3.71, 0.0];
        keel_physics_system_set_gravity(system, gravity.as_ptr());
        let mut read_back = [0.0f32; 3];
        keel_physics_system_get_gravity(system, read_back.as_mut_ptr());
        assert_eq!(read_back, gravity);
        keel_physics_system_destroy(system);
    }
}

#[test]
fn body_id_snapshots_cover_created_and_active_bodies() {
    let _guard = TEST_LOCK.lock().unwrap();
    let system = layered_system(32, 32, 32);
    unsafe {
        let shape = make_shape(0.5);
        let a = add_body(system, shape, 0.0, KEEL_MOTION_TYPE_DYNAMIC, 1);
        let _b = add_body(system, shape, 5.0, KEEL_MOTION_TYPE_DYNAMIC, 1);

        assert_eq!(keel_physics_system_get_num_bodies(system), 2);
        assert_eq!(
            keel_physics_system_get_num_active_bodies(system, KEEL_BODY_TYPE_RIGID),
            2
        );
        assert_eq!(
            keel_physics_system_get_num_active_bodies(system, KEEL_BODY_TYPE_SOFT),
            0
        );

        let mut ids = [KEEL_BODY_ID_INVALID; 8];
        let mut count = 0u32;
        keel_physics_system_get_body_ids(system, 8, &mut count, ids.as_mut_ptr());
        assert_eq!(count, 2);

        let iface = keel_physics_system_get_body_interface(system);
        keel_body_interface_deactivate_body(iface, a);
        keel_physics_system_get_active_body_ids(system, 8, &mut count, ids.as_mut_ptr());
        assert_eq!(count, 1);

        keel_shape_release(shape);
        keel_physics_system_destroy(system);
    }
}
