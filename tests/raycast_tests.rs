use std::mem::MaybeUninit;
use std::os::raw::c_void;

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

unsafe extern "C" fn all_layers_collide(_a: KeelObjectLayer, _b: KeelObjectLayer) -> bool {
    true
}

unsafe extern "C" fn all_vs_bp_collide(_a: KeelObjectLayer, _b: KeelBroadPhaseLayer) -> bool {
    true
}

fn test_system() -> *mut KeelPhysicsSystem {
    init();
    keel_physics_system_create(
        64,
        0,
        64,
        64,
        KeelBroadPhaseLayerInterfaceVTable {
            get_num_broad_phase_layers: Some(bp_layer_count),
            get_broad_phase_layer: Some(bp_layer_map),
        },
        KeelObjectVsBroadPhaseLayerFilterVTable {
            should_collide: Some(all_vs_bp_collide),
        },
        KeelObjectLayerPairFilterVTable {
            should_collide: Some(all_layers_collide),
        },
    )
}

unsafe fn add_sphere(
    system: *mut KeelPhysicsSystem,
    position: [KeelReal; 3],
    radius: f32,
    layer: KeelObjectLayer,
) -> KeelBodyId {
    let shape_settings = keel_sphere_shape_settings_create(radius) as *mut KeelShapeSettings;
    let shape = keel_shape_settings_create_shape(shape_settings);
    keel_shape_settings_release(shape_settings);

    let iface = keel_physics_system_get_body_interface(system);
    let mut settings = MaybeUninit::<KeelBodyCreationSettings>::uninit();
    let rotation = [0.0f32, 0.0, 0.0, 1.0];
    keel_body_creation_settings_set(
        settings.as_mut_ptr(),
        shape,
        position.as_ptr(),
        rotation.as_ptr(),
        KEEL_MOTION_TYPE_STATIC,
        layer,
    );
    let id =
        keel_body_interface_create_and_add_body(iface, settings.as_ptr(), KEEL_ACTIVATION_DONT_ACTIVATE);
    keel_shape_release(shape);
    id
}

fn ray(origin: [KeelReal; 3], direction: [f32; 3]) -> KeelRayCast {
    let mut ray = KeelRayCast::default();
    ray.origin.0[..3].copy_from_slice(&origin);
    ray.direction.0[..3].copy_from_slice(&direction);
    ray
}

#[test]
fn closest_body_wins() {
    let system = test_system();
    unsafe {
        let near = add_sphere(system, [0.0, 0.0, 5.0], 1.0, 1);
        let _far = add_sphere(system, [0.0, 0.0, 12.0], 1.0, 1);

        let query = keel_physics_system_get_narrow_phase_query(system);
        let ray = ray([0.0, 0.0, 0.0], [0.0, 0.0, 20.0]);
        let mut hit = KeelRayCastResult {
            body_id: KEEL_BODY_ID_INVALID,
            fraction: 1.0 + f32::EPSILON,
            sub_shape_id: 0,
        };
        let found = keel_narrow_phase_query_cast_ray(
            query,
            &ray,
            &mut hit,
            std::ptr::null(),
            std::ptr::null(),
            std::ptr::null(),
        );
        assert!(found);
        assert_eq!(hit.body_id, near);
        // Entry point of the near sphere is at z = 4 along a 20-long ray.
        assert!((hit.fraction - 0.2).abs() < 1e-3);

        keel_physics_system_destroy(system);
    }
}

#[test]
fn a_miss_leaves_the_result_untouched() {
    let system = test_system();
    unsafe {
        add_sphere(system, [0.0, 50.0, 5.0], 1.0, 1);

        let query = keel_physics_system_get_narrow_phase_query(system);
        let ray = ray([0.0, 0.0, 0.0], [0.0, 0.0, 20.0]);
        let mut hit = KeelRayCastResult {
            body_id: KEEL_BODY_ID_INVALID,
            fraction: 1.0 + f32::EPSILON,
            sub_shape_id: 0,
        };
        let found = keel_narrow_phase_query_cast_ray(
            query,
            &ray,
            &mut hit,
            std::ptr::null(),
            std::ptr::null(),
            std::ptr::null(),
        );
        assert!(!found);
        assert_eq!(hit.body_id, KEEL_BODY_ID_INVALID);

        keel_physics_system_destroy(system);
    }
}

unsafe extern "C" fn only_layer_two(_user_data: *const c_void, layer: KeelObjectLayer) -> bool {
    layer == 2
}

#[test]
fn object_layer_filter_prunes_hits() {
    let system = test_system();
    unsafe {
        let _blocker = add_sphere(system, [0.0, 0.0, 5.0], 1.0, 1);
        let behind = add_sphere(system, [0.0, 0.0, 10.0], 1.0, 2);

        let query = keel_physics_system_get_narrow_phase_query(system);
        let ray = ray([0.0, 0.0, 0.0], [0.0, 0.0, 20.0]);
        let filter = KeelObjectLayerFilterVTable {
            user_data: None,
            should_collide: Some(only_layer_two),
        };
        let mut hit = KeelRayCastResult {
            body_id: KEEL_BODY_ID_INVALID,
            fraction: 1.0 + f32::EPSILON,
            sub_shape_id: 0,
        };
        let found = keel_narrow_phase_query_cast_ray(
            query,
            &ray,
            &mut hit,
            std::ptr::null(),
            &filter,
            std::ptr::null(),
        );
        assert!(found);
        assert_eq!(hit.body_id, behind);

        keel_physics_system_destroy(system);
    }
}

#[test]
fn early_out_fraction_is_honored() {
    let system = test_system();
    unsafe {
        add_sphere(system, [0.0, 0.0, 15.0], 1.0, 1);

        let query = keel_physics_system_get_narrow_phase_query(system);
        let ray = ray([0.0, 0.0, 0.0], [0.0, 0.0, 20.0]);
        // Caller already has a closer hit at fraction 0.5; the sphere at
        // fraction 0.7 must not replace it.
        let mut hit = KeelRayCastResult {
            body_id: KEEL_BODY_ID_INVALID,
            fraction: 0.5,
            sub_shape_id: 0,
        };
        let found = keel_narrow_phase_query_cast_ray(
            query,
            &ray,
            &mut hit,
            std::ptr::null(),
            std::ptr::null(),
            std::ptr::null(),
        );
        assert!(!found);
        assert_eq!(hit.fraction, 0.5);

        keel_physics_system_destroy(system);
    }
}
