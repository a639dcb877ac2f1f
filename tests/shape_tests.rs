use keel::ffi::*;

fn init() {
    keel_register_default_allocator();
    keel_create_factory();
    keel_register_types();
}

#[test]
fn create_shape_is_idempotent_and_adds_one_reference_per_call() {
    init();
    unsafe {
        let settings = keel_sphere_shape_settings_create(0.5) as *mut KeelShapeSettings;
        assert!(!settings.is_null());

        let first = keel_shape_settings_create_shape(settings);
        assert!(!first.is_null());
        let count_after_first = keel_shape_get_ref_count(first);

        let second = keel_shape_settings_create_shape(settings);
        assert_eq!(first, second);
        assert_eq!(keel_shape_get_ref_count(first), count_after_first + 1);

        keel_shape_release(second);
        keel_shape_release(first);
        keel_shape_settings_release(settings);
    }
}

#[test]
fn mutating_settings_after_creation_does_not_change_the_shape() {
    init();
    unsafe {
        let settings = keel_sphere_shape_settings_create(1.0);
        let shape = keel_shape_settings_create_shape(settings as *mut KeelShapeSettings);
        keel_sphere_shape_settings_set_radius(settings, 5.0);
        let again = keel_shape_settings_create_shape(settings as *mut KeelShapeSettings);
        assert_eq!(shape, again);
        assert_eq!(keel_sphere_shape_settings_get_radius(settings), 5.0);

        keel_shape_release(shape);
        keel_shape_release(again);
        keel_shape_settings_release(settings as *mut KeelShapeSettings);
    }
}

#[test]
fn invalid_shape_parameters_yield_a_null_handle() {
    init();
    unsafe {
        let settings = keel_sphere_shape_settings_create(-2.0);
        let shape = keel_shape_settings_create_shape(settings as *mut KeelShapeSettings);
        assert!(shape.is_null());
        keel_shape_settings_release(settings as *mut KeelShapeSettings);
    }
}

#[test]
fn box_settings_report_type_and_sub_type() {
    init();
    unsafe {
        let half_extent = [1.0f32, 2.0, 3.0];
        let settings = keel_box_shape_settings_create(half_extent.as_ptr());

        let mut read_back = [0.0f32; 3];
        keel_box_shape_settings_get_half_extent(settings, read_back.as_mut_ptr());
        assert_eq!(read_back, half_extent);

        let shape = keel_shape_settings_create_shape(settings as *mut KeelShapeSettings);
        assert_eq!(keel_shape_get_type(shape), KEEL_SHAPE_TYPE_CONVEX);
        assert_eq!(keel_shape_get_sub_type(shape), KEEL_SHAPE_SUB_TYPE_BOX);

        keel_shape_set_user_data(shape, 77);
        assert_eq!(keel_shape_get_user_data(shape), 77);

        keel_shape_release(shape);
        keel_shape_settings_release(settings as *mut KeelShapeSettings);
    }
}

#[test]
fn compound_settings_hold_references_on_their_children() {
    init();
    unsafe {
        let sphere = keel_sphere_shape_settings_create(0.5) as *mut KeelShapeSettings;
        let compound = keel_static_compound_shape_settings_create();

        let position: [KeelReal; 3] = [1.0, 0.0, 0.0];
        let rotation: [KeelReal; 4] = [0.0, 0.0, 0.0, 1.0];
        keel_compound_shape_settings_add_shape(
            compound,
            position.as_ptr(),
            rotation.as_ptr(),
            sphere,
            9,
        );
        assert_eq!(keel_shape_settings_get_ref_count(sphere), 2);

        let shape = keel_shape_settings_create_shape(compound as *mut KeelShapeSettings);
        assert!(!shape.is_null());
        assert_eq!(keel_shape_get_type(shape), KEEL_SHAPE_TYPE_COMPOUND);

        keel_shape_release(shape);
        keel_shape_settings_release(compound as *mut KeelShapeSettings);
        assert_eq!(keel_shape_settings_get_ref_count(sphere), 1);
        keel_shape_settings_release(sphere);
    }
}

#[test]
fn decorated_settings_wrap_an_inner_blueprint() {
    init();
    unsafe {
        let inner = keel_sphere_shape_settings_create(1.0) as *mut KeelShapeSettings;
        let scale: [KeelReal; 3] = [2.0, 2.0, 2.0];
        let scaled = keel_scaled_shape_settings_create(inner, scale.as_ptr());
        assert!(!scaled.is_null());

        let shape = keel_shape_settings_create_shape(scaled as *mut KeelShapeSettings);
        assert_eq!(keel_shape_get_type(shape), KEEL_SHAPE_TYPE_DECORATED);
        assert_eq!(keel_shape_get_sub_type(shape), KEEL_SHAPE_SUB_TYPE_SCALED);

        keel_shape_release(shape);
        keel_shape_settings_release(scaled as *mut KeelShapeSettings);
        keel_shape_settings_release(inner);
    }
}

#[test]
fn convex_density_and_user_data_round_trip() {
    init();
    unsafe {
        let settings = keel_capsule_shape_settings_create(0.5, 0.25);
        keel_convex_shape_settings_set_density(
            settings as *mut KeelConvexShapeSettings,
            780.0,
        );
        assert_eq!(
            keel_convex_shape_settings_get_density(settings as *const KeelConvexShapeSettings),
            780.0
        );

        keel_shape_settings_set_user_data(settings as *mut KeelShapeSettings, 42);
        assert_eq!(
            keel_shape_settings_get_user_data(settings as *const KeelShapeSettings),
            42
        );
        keel_shape_settings_release(settings as *mut KeelShapeSettings);
    }
}

#[test]
fn mesh_sanitize_drops_degenerate_triangles() {
    init();
    unsafe {
        let vertices: [[f32; 3]; 4] = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        // Second triangle repeats a vertex, third indexes out of range.
        let indices: [u32; 9] = [0, 1, 2, 1, 1, 2, 0, 1, 9];
        let settings = keel_mesh_shape_settings_create(
            vertices.as_ptr() as *const _,
            4,
            12,
            indices.as_ptr(),
            9,
        );
        keel_mesh_shape_settings_sanitize(settings);
        let shape = keel_shape_settings_create_shape(settings as *mut KeelShapeSettings);
        assert!(!shape.is_null());

        keel_shape_release(shape);
        keel_shape_settings_release(settings as *mut KeelShapeSettings);
    }
}
