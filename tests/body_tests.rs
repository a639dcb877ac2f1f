use std::mem::MaybeUninit;

use keel::ffi::*;

fn init() {
    keel_register_default_allocator();
    keel_create_factory();
    keel_register_types();
}

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

fn test_system(max_bodies: u32) -> *mut KeelPhysicsSystem {
    init();
    keel_physics_system_create(
        max_bodies,
        0,
        1024,
        1024,
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

unsafe fn sphere_shape(radius: f32) -> *mut KeelShape {
    let settings = keel_sphere_shape_settings_create(radius) as *mut KeelShapeSettings;
    let shape = keel_shape_settings_create_shape(settings);
    keel_shape_settings_release(settings);
    shape
}

unsafe fn dynamic_settings(shape: *const KeelShape, y: KeelReal) -> KeelBodyCreationSettings {
    let mut settings = MaybeUninit::<KeelBodyCreationSettings>::uninit();
    let position: [KeelReal; 3] = [0.0, y, 0.0];
    let rotation: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
    keel_body_creation_settings_set(
        settings.as_mut_ptr(),
        shape,
        position.as_ptr(),
        rotation.as_ptr(),
        KEEL_MOTION_TYPE_DYNAMIC,
        1,
    );
    settings.assume_init()
}

#[test]
fn creation_settings_set_fills_inputs_and_defaults() {
    init();
    unsafe {
        let shape = sphere_shape(0.5);
        let settings = dynamic_settings(shape, 3.0);

        // Explicit inputs.
        assert_eq!(settings.position.0[0], 0.0);
        assert_eq!(settings.position.0[1], 3.0);
        assert_eq!(settings.rotation.0, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(settings.motion_type, KEEL_MOTION_TYPE_DYNAMIC);
        assert_eq!(settings.object_layer, 1);
        assert_eq!(settings.shape, shape as *const KeelShape);
        assert!(settings.shape_settings.is_null());

        // Documented defaults for everything unspecified.
        assert_eq!(settings.friction, 0.2);
        assert_eq!(settings.restitution, 0.0);
        assert_eq!(settings.linear_damping, 0.05);
        assert_eq!(settings.angular_damping, 0.05);
        assert_eq!(settings.max_linear_velocity, 500.0);
        assert_eq!(settings.gravity_factor, 1.0);
        assert_eq!(settings.allowed_dofs, KEEL_ALLOWED_DOFS_ALL);
        assert_eq!(settings.motion_quality, KEEL_MOTION_QUALITY_DISCRETE);
        assert!(settings.allow_sleeping);
        assert!(settings.use_manifold_reduction);
        assert!(!settings.is_sensor);
        assert_eq!(settings.user_data, 0);
        assert_eq!(
            settings.override_mass_properties,
            KEEL_OVERRIDE_MASS_PROPERTIES_CALC_MASS_INERTIA
        );
        assert_eq!(settings.num_velocity_steps_override, 0);
        assert_eq!(settings.num_position_steps_override, 0);

        keel_shape_release(shape);
    }
}

#[test]
fn body_lifecycle_and_motion_properties() {
    let system = test_system(64);
    unsafe {
        let iface = keel_physics_system_get_body_interface(system);
        let shape = sphere_shape(0.5);
        let settings = dynamic_settings(shape, 2.0);

        let body = keel_body_interface_create_body(iface, &settings);
        assert!(!body.is_null());
        let id = keel_body_get_id(body);
        assert!(!keel_body_id_is_invalid(id));
        assert!(!keel_body_interface_is_added(iface, id));

        // Static bodies have no motion properties; dynamic ones do.
        assert!(keel_body_is_dynamic(body));
        let motion = keel_body_get_motion_properties(body);
        assert!(!motion.is_null());
        assert!(keel_motion_properties_get_inverse_mass(motion) > 0.0);

        keel_body_interface_add_body(iface, id, KEEL_ACTIVATION_ACTIVATE);
        assert!(keel_body_interface_is_added(iface, id));
        assert!(keel_body_interface_is_active(iface, id));

        let velocity = [1.0f32, 0.0, 0.0];
        keel_body_interface_set_linear_velocity(iface, id, velocity.as_ptr());
        let mut read_back = [0.0f32; 3];
        keel_body_interface_get_linear_velocity(iface, id, read_back.as_mut_ptr());
        assert_eq!(read_back, velocity);

        keel_body_interface_remove_body(iface, id);
        keel_body_interface_destroy_body(iface, id);
        assert!(!keel_body_interface_is_added(iface, id));

        keel_shape_release(shape);
        keel_physics_system_destroy(system);
    }
}

#[test]
fn static_bodies_have_null_motion_properties() {
    let system = test_system(8);
    unsafe {
        let iface = keel_physics_system_get_body_interface(system);
        let shape = sphere_shape(1.0);
        let mut settings = dynamic_settings(shape, 0.0);
        settings.motion_type = KEEL_MOTION_TYPE_STATIC;
        settings.object_layer = 0;

        let body = keel_body_interface_create_body(iface, &settings);
        assert!(keel_body_is_static(body));
        assert!(keel_body_get_motion_properties(body).is_null());
        assert!(!keel_body_is_active(body));

        keel_body_interface_destroy_body(iface, keel_body_get_id(body));
        keel_shape_release(shape);
        keel_physics_system_destroy(system);
    }
}

#[test]
fn destroyed_slots_are_tombstoned_and_ids_go_stale() {
    let system = test_system(16);
    unsafe {
        let iface = keel_physics_system_get_body_interface(system);
        let shape = sphere_shape(0.5);
        let settings = dynamic_settings(shape, 0.0);

        let body = keel_body_interface_create_body(iface, &settings);
        let id = keel_body_get_id(body);
        let index = keel_body_id_get_index(id) as usize;

        let slots = keel_physics_system_get_bodies_unsafe(system);
        assert_eq!(*slots.add(index), body);

        keel_body_interface_destroy_body(iface, id);
        let raw = *slots.add(index) as usize;
        assert_eq!(raw & KEEL_IS_FREED_BODY_BIT, KEEL_IS_FREED_BODY_BIT);

        // The recycled slot gets a new sequence number.
        let second = keel_body_interface_create_body(iface, &settings);
        let second_id = keel_body_get_id(second);
        assert_eq!(keel_body_id_get_index(second_id) as usize, index);
        assert_ne!(
            keel_body_id_get_sequence_number(id),
            keel_body_id_get_sequence_number(second_id)
        );

        keel_body_interface_destroy_body(iface, second_id);
        keel_shape_release(shape);
        keel_physics_system_destroy(system);
    }
}

#[test]
fn body_locks_pair_and_release() {
    let system = test_system(8);
    unsafe {
        let iface = keel_physics_system_get_body_interface(system);
        let shape = sphere_shape(0.5);
        let settings = dynamic_settings(shape, 0.0);
        let body = keel_body_interface_create_body(iface, &settings);
        let id = keel_body_get_id(body);

        let lock_iface = keel_physics_system_get_body_lock_interface(system);

        let mut read = MaybeUninit::<KeelBodyLockRead>::uninit();
        keel_body_lock_interface_lock_read(lock_iface, id, read.as_mut_ptr());
        let mut read = read.assume_init();
        assert_eq!(read.body, body as *const KeelBody);
        assert!(!read.mutex.is_null());
        keel_body_lock_interface_unlock_read(lock_iface, &mut read);
        assert!(read.body.is_null());

        let mut write = MaybeUninit::<KeelBodyLockWrite>::uninit();
        keel_body_lock_interface_lock_write(lock_iface, id, write.as_mut_ptr());
        let mut write = write.assume_init();
        assert_eq!(write.body, body);
        keel_body_lock_interface_unlock_write(lock_iface, &mut write);

        // Stale id: the lock is taken and released, but no body comes back.
        keel_body_interface_destroy_body(iface, id);
        let mut stale = MaybeUninit::<KeelBodyLockRead>::uninit();
        keel_body_lock_interface_lock_read(lock_iface, id, stale.as_mut_ptr());
        let mut stale = stale.assume_init();
        assert!(stale.body.is_null());
        keel_body_lock_interface_unlock_read(lock_iface, &mut stale);

        // The no-lock variant hands out guards without a mutex.
        let nolock = keel_physics_system_get_body_lock_interface_no_lock(system);
        let other = keel_body_interface_create_body(iface, &settings);
        let other_id = keel_body_get_id(other);
        let mut guard = MaybeUninit::<KeelBodyLockRead>::uninit();
        keel_body_lock_interface_lock_read(nolock, other_id, guard.as_mut_ptr());
        let mut guard = guard.assume_init();
        assert!(guard.mutex.is_null());
        assert_eq!(guard.body, other as *const KeelBody);
        keel_body_lock_interface_unlock_read(nolock, &mut guard);

        keel_body_interface_destroy_body(iface, other_id);
        keel_shape_release(shape);
        keel_physics_system_destroy(system);
    }
}

#[test]
fn motion_type_switching_allocates_and_frees_motion_state() {
    let system = test_system(8);
    unsafe {
        let iface = keel_physics_system_get_body_interface(system);
        let shape = sphere_shape(0.5);
        let mut settings = dynamic_settings(shape, 0.0);
        settings.allow_dynamic_or_kinematic = true;

        let body = keel_body_interface_create_body(iface, &settings);
        let id = keel_body_get_id(body);
        assert!(!keel_body_get_motion_properties(body).is_null());

        keel_body_interface_set_motion_type(
            iface,
            id,
            KEEL_MOTION_TYPE_STATIC,
            KEEL_ACTIVATION_DONT_ACTIVATE,
        );
        assert!(keel_body_get_motion_properties(body).is_null());
        assert_eq!(keel_body_interface_get_motion_type(iface, id), KEEL_MOTION_TYPE_STATIC);

        keel_body_interface_set_motion_type(
            iface,
            id,
            KEEL_MOTION_TYPE_KINEMATIC,
            KEEL_ACTIVATION_DONT_ACTIVATE,
        );
        assert!(!keel_body_get_motion_properties(body).is_null());

        keel_body_interface_destroy_body(iface, id);
        keel_shape_release(shape);
        keel_physics_system_destroy(system);
    }
}
