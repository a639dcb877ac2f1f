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

unsafe fn add_floor(system: *mut KeelPhysicsSystem) {
    let half_extent = [50.0f32, 0.5, 50.0];
    let shape_settings = keel_box_shape_settings_create(half_extent.as_ptr()) as *mut KeelShapeSettings;
    let shape = keel_shape_settings_create_shape(shape_settings);
    keel_shape_settings_release(shape_settings);

    let iface = keel_physics_system_get_body_interface(system);
    let mut settings = MaybeUninit::<KeelBodyCreationSettings>::uninit();
    let position: [KeelReal; 3] = [0.0, -0.5, 0.0];
    let rotation = [0.0f32, 0.0, 0.0, 1.0];
    keel_body_creation_settings_set(
        settings.as_mut_ptr(),
        shape,
        position.as_ptr(),
        rotation.as_ptr(),
        KEEL_MOTION_TYPE_STATIC,
        0,
    );
    keel_body_interface_create_and_add_body(iface, settings.as_ptr(), KEEL_ACTIVATION_DONT_ACTIVATE);
    keel_shape_release(shape);
}

unsafe fn capsule_shape() -> *mut KeelShape {
    let settings = keel_capsule_shape_settings_create(0.6, 0.3) as *mut KeelShapeSettings;
    let shape = keel_shape_settings_create_shape(settings);
    keel_shape_settings_release(settings);
    shape
}

#[test]
fn character_owns_a_body_in_the_system() {
    let system = test_system();
    unsafe {
        let shape = capsule_shape();
        let settings = keel_character_settings_create();
        (*(settings as *mut keel::character::CharacterSettings)).base.shape =
            shape as *const keel::Shape;

        let position: [KeelReal; 3] = [0.0, 2.0, 0.0];
        let rotation = [0.0f32, 0.0, 0.0, 1.0];
        let character = keel_character_create(settings, position.as_ptr(), rotation.as_ptr(), 7, system);
        assert!(!character.is_null());
        assert_eq!(keel_physics_system_get_num_bodies(system), 1);

        keel_character_add_to_physics_system(character, KEEL_ACTIVATION_ACTIVATE, true);
        let mut read_back: [KeelReal; 3] = [0.0; 3];
        keel_character_get_position(character, read_back.as_mut_ptr());
        assert!((read_back[1] - 2.0).abs() < 1.0e-4);

        let velocity = [1.0f32, 0.0, 0.0];
        keel_character_set_linear_velocity(character, velocity.as_ptr());
        let mut velocity_back = [0.0f32; 3];
        keel_character_get_linear_velocity(character, velocity_back.as_mut_ptr());
        assert_eq!(velocity_back, velocity);

        keel_character_remove_from_physics_system(character, true);
        keel_character_destroy(character);
        assert_eq!(keel_physics_system_get_num_bodies(system), 0);

        keel_character_settings_release(settings);
        keel_shape_release(shape);
        keel_physics_system_destroy(system);
    }
}

#[test]
fn character_virtual_detects_ground_and_air() {
    let system = test_system();
    unsafe {
        add_floor(system);

        let shape = capsule_shape();
        let settings = keel_character_virtual_settings_create();
        (*(settings as *mut keel::character::CharacterVirtualSettings)).base.shape =
            shape as *const keel::Shape;

        // Standing just above the floor.
        let position: [KeelReal; 3] = [0.0, 0.95, 0.0];
        let rotation = [0.0f32, 0.0, 0.0, 1.0];
        let character =
            keel_character_virtual_create(settings, position.as_ptr(), rotation.as_ptr(), system);
        assert!(!character.is_null());

        let gravity = [0.0f32, -9.81, 0.0];
        let temp = keel_temp_allocator_create(16 * 1024);
        keel_character_virtual_update(
            character,
            1.0 / 60.0,
            gravity.as_ptr(),
            std::ptr::null(),
            std::ptr::null(),
            std::ptr::null(),
            temp,
        );
        assert_eq!(
            keel_character_virtual_get_ground_state(character),
            KEEL_CHARACTER_GROUND_STATE_ON_GROUND
        );

        // Far above the floor: in the air.
        let high: [KeelReal; 3] = [0.0, 30.0, 0.0];
        keel_character_virtual_set_position(character, high.as_ptr());
        keel_character_virtual_update(
            character,
            1.0 / 60.0,
            gravity.as_ptr(),
            std::ptr::null(),
            std::ptr::null(),
            std::ptr::null(),
            temp,
        );
        assert_eq!(
            keel_character_virtual_get_ground_state(character),
            KEEL_CHARACTER_GROUND_STATE_IN_AIR
        );

        keel_temp_allocator_destroy(temp);
        keel_character_virtual_destroy(character);
        keel_character_virtual_settings_release(settings);
        keel_shape_release(shape);
        keel_physics_system_destroy(system);
    }
}
