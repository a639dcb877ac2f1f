//! Flat API: shape settings builders, shape creation, and the shared
//! reference-count protocol.

use std::os::raw::c_void;

use glam::Vec3;

use crate::core::alloc::handle_alloc;
use crate::core::filter::PhysicsMaterial;
use crate::core::shape::{Shape, ShapeSettings, ShapeSettingsKind, SettingsRef, CompoundChildSettings};
use crate::config::DEFAULT_CONVEX_RADIUS;
use crate::ffi::convert::*;
use crate::ffi::init::debug_check_initialized;
use crate::ffi::types::*;
use crate::ffi::vec::{load_quat, load_rvec3, load_vec3, store_vec3};
use crate::math::vec3_from_rvec3;

fn new_settings(kind: ShapeSettingsKind) -> *mut KeelShapeSettings {
    debug_check_initialized();
    handle_alloc(ShapeSettings::new(kind)) as *mut KeelShapeSettings
}

// ---------------------------------------------------------------------------
// ShapeSettings (base)
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn keel_shape_settings_add_ref(in_settings: *mut KeelShapeSettings) {
    ShapeSettings::add_ref(in_settings as *const ShapeSettings);
}

#[no_mangle]
pub unsafe extern "C" fn keel_shape_settings_release(in_settings: *mut KeelShapeSettings) {
    ShapeSettings::release(in_settings as *const ShapeSettings);
}

#[no_mangle]
pub unsafe extern "C" fn keel_shape_settings_get_ref_count(
    in_settings: *const KeelShapeSettings,
) -> u32 {
    ShapeSettings::ref_count(in_settings as *const ShapeSettings)
}

/// First call creates the shape; later calls return the same pointer. Every
/// call adds one reference the caller must release. Null when the settings
/// fail validation.
#[no_mangle]
pub unsafe extern "C" fn keel_shape_settings_create_shape(
    in_settings: *const KeelShapeSettings,
) -> *mut KeelShape {
    debug_check_initialized();
    match shape_settings_ref(in_settings).create_shape() {
        Ok(shape) => shape as *mut KeelShape,
        Err(err) => {
            log::warn!("shape creation failed: {err}");
            std::ptr::null_mut()
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_shape_settings_get_user_data(
    in_settings: *const KeelShapeSettings,
) -> u64 {
    shape_settings_ref(in_settings).user_data
}

#[no_mangle]
pub unsafe extern "C" fn keel_shape_settings_set_user_data(
    in_settings: *mut KeelShapeSettings,
    in_user_data: u64,
) {
    shape_settings_mut(in_settings).user_data = in_user_data;
}

// ---------------------------------------------------------------------------
// ConvexShapeSettings
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn keel_convex_shape_settings_get_material(
    in_settings: *const KeelConvexShapeSettings,
) -> *const KeelPhysicsMaterial {
    convex_settings_ref(in_settings).material as *const KeelPhysicsMaterial
}

#[no_mangle]
pub unsafe extern "C" fn keel_convex_shape_settings_set_material(
    in_settings: *mut KeelConvexShapeSettings,
    in_material: *const KeelPhysicsMaterial,
) {
    convex_settings_mut(in_settings).material = in_material as *const PhysicsMaterial;
}

#[no_mangle]
pub unsafe extern "C" fn keel_convex_shape_settings_get_density(
    in_settings: *const KeelConvexShapeSettings,
) -> f32 {
    convex_settings_ref(in_settings).density
}

#[no_mangle]
pub unsafe extern "C" fn keel_convex_shape_settings_set_density(
    in_settings: *mut KeelConvexShapeSettings,
    in_density: f32,
) {
    convex_settings_mut(in_settings).density = in_density;
}

// ---------------------------------------------------------------------------
// BoxShapeSettings
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn keel_box_shape_settings_create(
    in_half_extent: *const f32,
) -> *mut KeelBoxShapeSettings {
    new_settings(ShapeSettingsKind::Box {
        half_extent: load_vec3(in_half_extent),
        convex_radius: DEFAULT_CONVEX_RADIUS,
    }) as *mut KeelBoxShapeSettings
}

#[no_mangle]
pub unsafe extern "C" fn keel_box_shape_settings_get_half_extent(
    in_settings: *const KeelBoxShapeSettings,
    out_half_extent: *mut f32,
) {
    if let ShapeSettingsKind::Box { half_extent, .. } = box_settings_ref(in_settings).kind {
        store_vec3(out_half_extent, half_extent);
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_box_shape_settings_set_half_extent(
    in_settings: *mut KeelBoxShapeSettings,
    in_half_extent: *const f32,
) {
    if let ShapeSettingsKind::Box { half_extent, .. } = &mut box_settings_mut(in_settings).kind {
        *half_extent = load_vec3(in_half_extent);
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_box_shape_settings_get_convex_radius(
    in_settings: *const KeelBoxShapeSettings,
) -> f32 {
    match box_settings_ref(in_settings).kind {
        ShapeSettingsKind::Box { convex_radius, .. } => convex_radius,
        _ => 0.0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_box_shape_settings_set_convex_radius(
    in_settings: *mut KeelBoxShapeSettings,
    in_convex_radius: f32,
) {
    if let ShapeSettingsKind::Box { convex_radius, .. } = &mut box_settings_mut(in_settings).kind {
        *convex_radius = in_convex_radius;
    }
}

// ---------------------------------------------------------------------------
// SphereShapeSettings
// ---------------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn keel_sphere_shape_settings_create(in_radius: f32) -> *mut KeelSphereShapeSettings {
    new_settings(ShapeSettingsKind::Sphere { radius: in_radius }) as *mut KeelSphereShapeSettings
}

#[no_mangle]
pub unsafe extern "C" fn keel_sphere_shape_settings_get_radius(
    in_settings: *const KeelSphereShapeSettings,
) -> f32 {
    match sphere_settings_ref(in_settings).kind {
        ShapeSettingsKind::Sphere { radius } => radius,
        _ => 0.0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_sphere_shape_settings_set_radius(
    in_settings: *mut KeelSphereShapeSettings,
    in_radius: f32,
) {
    if let ShapeSettingsKind::Sphere { radius } = &mut sphere_settings_mut(in_settings).kind {
        *radius = in_radius;
    }
}

// ---------------------------------------------------------------------------
// TriangleShapeSettings
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn keel_triangle_shape_settings_create(
    in_v1: *const f32,
    in_v2: *const f32,
    in_v3: *const f32,
) -> *mut KeelTriangleShapeSettings {
    new_settings(ShapeSettingsKind::Triangle {
        vertices: [load_vec3(in_v1), load_vec3(in_v2), load_vec3(in_v3)],
        convex_radius: 0.0,
    }) as *mut KeelTriangleShapeSettings
}

#[no_mangle]
pub unsafe extern "C" fn keel_triangle_shape_settings_set_vertices(
    in_settings: *mut KeelTriangleShapeSettings,
    in_v1: *const f32,
    in_v2: *const f32,
    in_v3: *const f32,
) {
    if let ShapeSettingsKind::Triangle { vertices, .. } =
        &mut triangle_settings_mut(in_settings).kind
    {
        *vertices = [load_vec3(in_v1), load_vec3(in_v2), load_vec3(in_v3)];
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_triangle_shape_settings_get_vertices(
    in_settings: *const KeelTriangleShapeSettings,
    out_v1: *mut f32,
    out_v2: *mut f32,
    out_v3: *mut f32,
) {
    if let ShapeSettingsKind::Triangle { vertices, .. } = triangle_settings_ref(in_settings).kind {
        store_vec3(out_v1, vertices[0]);
        store_vec3(out_v2, vertices[1]);
        store_vec3(out_v3, vertices[2]);
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_triangle_shape_settings_get_convex_radius(
    in_settings: *const KeelTriangleShapeSettings,
) -> f32 {
    match triangle_settings_ref(in_settings).kind {
        ShapeSettingsKind::Triangle { convex_radius, .. } => convex_radius,
        _ => 0.0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_triangle_shape_settings_set_convex_radius(
    in_settings: *mut KeelTriangleShapeSettings,
    in_convex_radius: f32,
) {
    if let ShapeSettingsKind::Triangle { convex_radius, .. } =
        &mut triangle_settings_mut(in_settings).kind
    {
        *convex_radius = in_convex_radius;
    }
}

// ---------------------------------------------------------------------------
// CapsuleShapeSettings
// ---------------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn keel_capsule_shape_settings_create(
    in_half_height_of_cylinder: f32,
    in_radius: f32,
) -> *mut KeelCapsuleShapeSettings {
    new_settings(ShapeSettingsKind::Capsule {
        half_height: in_half_height_of_cylinder,
        radius: in_radius,
    }) as *mut KeelCapsuleShapeSettings
}

#[no_mangle]
pub unsafe extern "C" fn keel_capsule_shape_settings_get_half_height(
    in_settings: *const KeelCapsuleShapeSettings,
) -> f32 {
    match capsule_settings_ref(in_settings).kind {
        ShapeSettingsKind::Capsule { half_height, .. } => half_height,
        _ => 0.0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_capsule_shape_settings_set_half_height(
    in_settings: *mut KeelCapsuleShapeSettings,
    in_half_height_of_cylinder: f32,
) {
    if let ShapeSettingsKind::Capsule { half_height, .. } =
        &mut capsule_settings_mut(in_settings).kind
    {
        *half_height = in_half_height_of_cylinder;
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_capsule_shape_settings_get_radius(
    in_settings: *const KeelCapsuleShapeSettings,
) -> f32 {
    match capsule_settings_ref(in_settings).kind {
        ShapeSettingsKind::Capsule { radius, .. } => radius,
        _ => 0.0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_capsule_shape_settings_set_radius(
    in_settings: *mut KeelCapsuleShapeSettings,
    in_radius: f32,
) {
    if let ShapeSettingsKind::Capsule { radius, .. } = &mut capsule_settings_mut(in_settings).kind {
        *radius = in_radius;
    }
}

// ---------------------------------------------------------------------------
// TaperedCapsuleShapeSettings
// ---------------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn keel_tapered_capsule_shape_settings_create(
    in_half_height: f32,
    in_top_radius: f32,
    in_bottom_radius: f32,
) -> *mut KeelTaperedCapsuleShapeSettings {
    new_settings(ShapeSettingsKind::TaperedCapsule {
        half_height: in_half_height,
        top_radius: in_top_radius,
        bottom_radius: in_bottom_radius,
    }) as *mut KeelTaperedCapsuleShapeSettings
}

#[no_mangle]
pub unsafe extern "C" fn keel_tapered_capsule_shape_settings_get_half_height(
    in_settings: *const KeelTaperedCapsuleShapeSettings,
) -> f32 {
    match tapered_capsule_settings_ref(in_settings).kind {
        ShapeSettingsKind::TaperedCapsule { half_height, .. } => half_height,
        _ => 0.0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_tapered_capsule_shape_settings_set_half_height(
    in_settings: *mut KeelTaperedCapsuleShapeSettings,
    in_half_height: f32,
) {
    if let ShapeSettingsKind::TaperedCapsule { half_height, .. } =
        &mut tapered_capsule_settings_mut(in_settings).kind
    {
        *half_height = in_half_height;
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_tapered_capsule_shape_settings_get_top_radius(
    in_settings: *const KeelTaperedCapsuleShapeSettings,
) -> f32 {
    match tapered_capsule_settings_ref(in_settings).kind {
        ShapeSettingsKind::TaperedCapsule { top_radius, .. } => top_radius,
        _ => 0.0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_tapered_capsule_shape_settings_set_top_radius(
    in_settings: *mut KeelTaperedCapsuleShapeSettings,
    in_top_radius: f32,
) {
    if let ShapeSettingsKind::TaperedCapsule { top_radius, .. } =
        &mut tapered_capsule_settings_mut(in_settings).kind
    {
        *top_radius = in_top_radius;
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_tapered_capsule_shape_settings_get_bottom_radius(
    in_settings: *const KeelTaperedCapsuleShapeSettings,
) -> f32 {
    match tapered_capsule_settings_ref(in_settings).kind {
        ShapeSettingsKind::TaperedCapsule { bottom_radius, .. } => bottom_radius,
        _ => 0.0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_tapered_capsule_shape_settings_set_bottom_radius(
    in_settings: *mut KeelTaperedCapsuleShapeSettings,
    in_bottom_radius: f32,
) {
    if let ShapeSettingsKind::TaperedCapsule { bottom_radius, .. } =
        &mut tapered_capsule_settings_mut(in_settings).kind
    {
        *bottom_radius = in_bottom_radius;
    }
}

// ---------------------------------------------------------------------------
// CylinderShapeSettings
// ---------------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn keel_cylinder_shape_settings_create(
    in_half_height: f32,
    in_radius: f32,
) -> *mut KeelCylinderShapeSettings {
    new_settings(ShapeSettingsKind::Cylinder {
        half_height: in_half_height,
        radius: in_radius,
        convex_radius: DEFAULT_CONVEX_RADIUS,
    }) as *mut KeelCylinderShapeSettings
}

#[no_mangle]
pub unsafe extern "C" fn keel_cylinder_shape_settings_get_convex_radius(
    in_settings: *const KeelCylinderShapeSettings,
) -> f32 {
    match cylinder_settings_ref(in_settings).kind {
        ShapeSettingsKind::Cylinder { convex_radius, .. } => convex_radius,
        _ => 0.0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_cylinder_shape_settings_set_convex_radius(
    in_settings: *mut KeelCylinderShapeSettings,
    in_convex_radius: f32,
) {
    if let ShapeSettingsKind::Cylinder { convex_radius, .. } =
        &mut cylinder_settings_mut(in_settings).kind
    {
        *convex_radius = in_convex_radius;
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_cylinder_shape_settings_get_half_height(
    in_settings: *const KeelCylinderShapeSettings,
) -> f32 {
    match cylinder_settings_ref(in_settings).kind {
        ShapeSettingsKind::Cylinder { half_height, .. } => half_height,
        _ => 0.0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_cylinder_shape_settings_set_half_height(
    in_settings: *mut KeelCylinderShapeSettings,
    in_half_height: f32,
) {
    if let ShapeSettingsKind::Cylinder { half_height, .. } =
        &mut cylinder_settings_mut(in_settings).kind
    {
        *half_height = in_half_height;
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_cylinder_shape_settings_get_radius(
    in_settings: *const KeelCylinderShapeSettings,
) -> f32 {
    match cylinder_settings_ref(in_settings).kind {
        ShapeSettingsKind::Cylinder { radius, .. } => radius,
        _ => 0.0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_cylinder_shape_settings_set_radius(
    in_settings: *mut KeelCylinderShapeSettings,
    in_radius: f32,
) {
    if let ShapeSettingsKind::Cylinder { radius, .. } = &mut cylinder_settings_mut(in_settings).kind
    {
        *radius = in_radius;
    }
}

// ---------------------------------------------------------------------------
// ConvexHullShapeSettings
// ---------------------------------------------------------------------------

/// `in_vertices` points at `in_num_vertices` positions, each `in_vertex_size`
/// bytes apart with three leading floats.
#[no_mangle]
pub unsafe extern "C" fn keel_convex_hull_shape_settings_create(
    in_vertices: *const c_void,
    in_num_vertices: u32,
    in_vertex_size: u32,
) -> *mut KeelConvexHullShapeSettings {
    debug_assert!(!in_vertices.is_null());
    debug_assert!(in_vertex_size as usize >= std::mem::size_of::<f32>() * 3);
    let mut points = Vec::with_capacity(in_num_vertices as usize);
    for i in 0..in_num_vertices as usize {
        let vertex = (in_vertices as *const u8).add(i * in_vertex_size as usize) as *const f32;
        points.push(load_vec3(vertex));
    }
    new_settings(ShapeSettingsKind::ConvexHull {
        points,
        max_convex_radius: DEFAULT_CONVEX_RADIUS,
        max_error_convex_radius: 0.05,
        hull_tolerance: 1.0e-3,
    }) as *mut KeelConvexHullShapeSettings
}

#[no_mangle]
pub unsafe extern "C" fn keel_convex_hull_shape_settings_get_max_convex_radius(
    in_settings: *const KeelConvexHullShapeSettings,
) -> f32 {
    match convex_hull_settings_ref(in_settings).kind {
        ShapeSettingsKind::ConvexHull {
            max_convex_radius, ..
        } => max_convex_radius,
        _ => 0.0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_convex_hull_shape_settings_set_max_convex_radius(
    in_settings: *mut KeelConvexHullShapeSettings,
    in_max_convex_radius: f32,
) {
    if let ShapeSettingsKind::ConvexHull {
        max_convex_radius, ..
    } = &mut convex_hull_settings_mut(in_settings).kind
    {
        *max_convex_radius = in_max_convex_radius;
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_convex_hull_shape_settings_get_max_error_convex_radius(
    in_settings: *const KeelConvexHullShapeSettings,
) -> f32 {
    match convex_hull_settings_ref(in_settings).kind {
        ShapeSettingsKind::ConvexHull {
            max_error_convex_radius,
            ..
        } => max_error_convex_radius,
        _ => 0.0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_convex_hull_shape_settings_set_max_error_convex_radius(
    in_settings: *mut KeelConvexHullShapeSettings,
    in_max_err_convex_radius: f32,
) {
    if let ShapeSettingsKind::ConvexHull {
        max_error_convex_radius,
        ..
    } = &mut convex_hull_settings_mut(in_settings).kind
    {
        *max_error_convex_radius = in_max_err_convex_radius;
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_convex_hull_shape_settings_get_hull_tolerance(
    in_settings: *const KeelConvexHullShapeSettings,
) -> f32 {
    match convex_hull_settings_ref(in_settings).kind {
        ShapeSettingsKind::ConvexHull { hull_tolerance, .. } => hull_tolerance,
        _ => 0.0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_convex_hull_shape_settings_set_hull_tolerance(
    in_settings: *mut KeelConvexHullShapeSettings,
    in_hull_tolerance: f32,
) {
    if let ShapeSettingsKind::ConvexHull { hull_tolerance, .. } =
        &mut convex_hull_settings_mut(in_settings).kind
    {
        *hull_tolerance = in_hull_tolerance;
    }
}

// ---------------------------------------------------------------------------
// HeightFieldShapeSettings
// ---------------------------------------------------------------------------

/// `in_samples` is a square grid of `in_height_field_size`² heights.
#[no_mangle]
pub unsafe extern "C" fn keel_height_field_shape_settings_create(
    in_samples: *const f32,
    in_height_field_size: u32,
) -> *mut KeelHeightFieldShapeSettings {
    debug_assert!(!in_samples.is_null());
    let count = (in_height_field_size as usize).pow(2);
    let samples = std::slice::from_raw_parts(in_samples, count).to_vec();
    new_settings(ShapeSettingsKind::HeightField {
        samples,
        size: in_height_field_size,
        offset: Vec3::ZERO,
        scale: Vec3::ONE,
        block_size: 2,
        bits_per_sample: 8,
    }) as *mut KeelHeightFieldShapeSettings
}

#[no_mangle]
pub unsafe extern "C" fn keel_height_field_shape_settings_get_offset(
    in_settings: *const KeelHeightFieldShapeSettings,
    out_offset: *mut f32,
) {
    if let ShapeSettingsKind::HeightField { offset, .. } =
        height_field_settings_ref(in_settings).kind
    {
        store_vec3(out_offset, offset);
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_height_field_shape_settings_set_offset(
    in_settings: *mut KeelHeightFieldShapeSettings,
    in_offset: *const f32,
) {
    if let ShapeSettingsKind::HeightField { offset, .. } =
        &mut height_field_settings_mut(in_settings).kind
    {
        *offset = load_vec3(in_offset);
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_height_field_shape_settings_get_scale(
    in_settings: *const KeelHeightFieldShapeSettings,
    out_scale: *mut f32,
) {
    if let ShapeSettingsKind::HeightField { scale, .. } = height_field_settings_ref(in_settings).kind
    {
        store_vec3(out_scale, scale);
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_height_field_shape_settings_set_scale(
    in_settings: *mut KeelHeightFieldShapeSettings,
    in_scale: *const f32,
) {
    if let ShapeSettingsKind::HeightField { scale, .. } =
        &mut height_field_settings_mut(in_settings).kind
    {
        *scale = load_vec3(in_scale);
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_height_field_shape_settings_get_block_size(
    in_settings: *const KeelHeightFieldShapeSettings,
) -> u32 {
    match height_field_settings_ref(in_settings).kind {
        ShapeSettingsKind::HeightField { block_size, .. } => block_size,
        _ => 0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_height_field_shape_settings_set_block_size(
    in_settings: *mut KeelHeightFieldShapeSettings,
    in_block_size: u32,
) {
    if let ShapeSettingsKind::HeightField { block_size, .. } =
        &mut height_field_settings_mut(in_settings).kind
    {
        *block_size = in_block_size;
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_height_field_shape_settings_get_bits_per_sample(
    in_settings: *const KeelHeightFieldShapeSettings,
) -> u32 {
    match height_field_settings_ref(in_settings).kind {
        ShapeSettingsKind::HeightField {
            bits_per_sample, ..
        } => bits_per_sample,
        _ => 0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_height_field_shape_settings_set_bits_per_sample(
    in_settings: *mut KeelHeightFieldShapeSettings,
    in_num_bits: u32,
) {
    if let ShapeSettingsKind::HeightField {
        bits_per_sample, ..
    } = &mut height_field_settings_mut(in_settings).kind
    {
        *bits_per_sample = in_num_bits;
    }
}

// ---------------------------------------------------------------------------
// MeshShapeSettings
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn keel_mesh_shape_settings_create(
    in_vertices: *const c_void,
    in_num_vertices: u32,
    in_vertex_size: u32,
    in_indices: *const u32,
    in_num_indices: u32,
) -> *mut KeelMeshShapeSettings {
    debug_assert!(!in_vertices.is_null() && !in_indices.is_null());
    debug_assert!(in_vertex_size as usize >= std::mem::size_of::<f32>() * 3);
    let mut vertices = Vec::with_capacity(in_num_vertices as usize);
    for i in 0..in_num_vertices as usize {
        let vertex = (in_vertices as *const u8).add(i * in_vertex_size as usize) as *const f32;
        vertices.push(load_vec3(vertex));
    }
    let indices = std::slice::from_raw_parts(in_indices, in_num_indices as usize).to_vec();
    new_settings(ShapeSettingsKind::Mesh {
        vertices,
        indices,
        max_triangles_per_leaf: 8,
    }) as *mut KeelMeshShapeSettings
}

#[no_mangle]
pub unsafe extern "C" fn keel_mesh_shape_settings_get_max_triangles_per_leaf(
    in_settings: *const KeelMeshShapeSettings,
) -> u32 {
    match mesh_settings_ref(in_settings).kind {
        ShapeSettingsKind::Mesh {
            max_triangles_per_leaf,
            ..
        } => max_triangles_per_leaf,
        _ => 0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn keel_mesh_shape_settings_set_max_triangles_per_leaf(
    in_settings: *mut KeelMeshShapeSettings,
    in_max_triangles: u32,
) {
    if let ShapeSettingsKind::Mesh {
        max_triangles_per_leaf,
        ..
    } = &mut mesh_settings_mut(in_settings).kind
    {
        *max_triangles_per_leaf = in_max_triangles;
    }
}

/// Drops degenerate triangles and indices referencing missing vertices.
#[no_mangle]
pub unsafe extern "C" fn keel_mesh_shape_settings_sanitize(in_settings: *mut KeelMeshShapeSettings) {
    if let ShapeSettingsKind::Mesh {
        vertices, indices, ..
    } = &mut mesh_settings_mut(in_settings).kind
    {
        let vertex_count = vertices.len() as u32;
        let mut sane = Vec::with_capacity(indices.len());
        for triangle in indices.chunks_exact(3) {
            let in_range = triangle.iter().all(|&i| i < vertex_count);
            let distinct =
                triangle[0] != triangle[1] && triangle[1] != triangle[2] && triangle[0] != triangle[2];
            if in_range && distinct {
                sane.extend_from_slice(triangle);
            }
        }
        *indices = sane;
    }
}

// ---------------------------------------------------------------------------
// Decorated shape settings
// ---------------------------------------------------------------------------

unsafe fn inner_settings_ref(inner: *const KeelShapeSettings) -> SettingsRef {
    let native = inner as *const ShapeSettings;
    ShapeSettings::add_ref(native);
    SettingsRef::from_raw(native)
}

#[no_mangle]
pub unsafe extern "C" fn keel_rotated_translated_shape_settings_create(
    in_inner_shape_settings: *const KeelShapeSettings,
    in_rotated: *const KeelReal,
    in_translated: *const KeelReal,
) -> *mut KeelDecoratedShapeSettings {
    debug_assert!(!in_inner_shape_settings.is_null());
    let rotation_wide = [
        *in_rotated as f32,
        *in_rotated.add(1) as f32,
        *in_rotated.add(2) as f32,
        *in_rotated.add(3) as f32,
    ];
    new_settings(ShapeSettingsKind::RotatedTranslated {
        rotation: load_quat(rotation_wide.as_ptr()),
        translation: vec3_from_rvec3(load_rvec3(in_translated)),
        inner: inner_settings_ref(in_inner_shape_settings),
    }) as *mut KeelDecoratedShapeSettings
}

#[no_mangle]
pub unsafe extern "C" fn keel_scaled_shape_settings_create(
    in_inner_shape_settings: *const KeelShapeSettings,
    in_scale: *const KeelReal,
) -> *mut KeelDecoratedShapeSettings {
    debug_assert!(!in_inner_shape_settings.is_null());
    new_settings(ShapeSettingsKind::Scaled {
        scale: vec3_from_rvec3(load_rvec3(in_scale)),
        inner: inner_settings_ref(in_inner_shape_settings),
    }) as *mut KeelDecoratedShapeSettings
}

#[no_mangle]
pub unsafe extern "C" fn keel_offset_center_of_mass_shape_settings_create(
    in_inner_shape_settings: *const KeelShapeSettings,
    in_center_of_mass: *const KeelReal,
) -> *mut KeelDecoratedShapeSettings {
    debug_assert!(!in_inner_shape_settings.is_null());
    new_settings(ShapeSettingsKind::OffsetCenterOfMass {
        offset: vec3_from_rvec3(load_rvec3(in_center_of_mass)),
        inner: inner_settings_ref(in_inner_shape_settings),
    }) as *mut KeelDecoratedShapeSettings
}

// ---------------------------------------------------------------------------
// Compound shape settings
// ---------------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn keel_static_compound_shape_settings_create() -> *mut KeelCompoundShapeSettings {
    new_settings(ShapeSettingsKind::Compound {
        children: Vec::new(),
        mutable: false,
    }) as *mut KeelCompoundShapeSettings
}

#[no_mangle]
pub extern "C" fn keel_mutable_compound_shape_settings_create() -> *mut KeelCompoundShapeSettings {
    new_settings(ShapeSettingsKind::Compound {
        children: Vec::new(),
        mutable: true,
    }) as *mut KeelCompoundShapeSettings
}

#[no_mangle]
pub unsafe extern "C" fn keel_compound_shape_settings_add_shape(
    in_settings: *mut KeelCompoundShapeSettings,
    in_position: *const KeelReal,
    in_rotation: *const KeelReal,
    in_shape: *const KeelShapeSettings,
    in_user_data: u32,
) {
    debug_assert!(!in_shape.is_null());
    let rotation_wide = [
        *in_rotation as f32,
        *in_rotation.add(1) as f32,
        *in_rotation.add(2) as f32,
        *in_rotation.add(3) as f32,
    ];
    if let ShapeSettingsKind::Compound { children, .. } =
        &mut compound_settings_mut(in_settings).kind
    {
        children.push(CompoundChildSettings {
            position: vec3_from_rvec3(load_rvec3(in_position)),
            rotation: load_quat(rotation_wide.as_ptr()),
            settings: inner_settings_ref(in_shape),
            user_data: in_user_data,
        });
    }
}

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn keel_shape_add_ref(in_shape: *mut KeelShape) {
    Shape::add_ref(in_shape as *const Shape);
}

#[no_mangle]
pub unsafe extern "C" fn keel_shape_release(in_shape: *mut KeelShape) {
    Shape::release(in_shape as *const Shape);
}

#[no_mangle]
pub unsafe extern "C" fn keel_shape_get_ref_count(in_shape: *const KeelShape) -> u32 {
    Shape::ref_count(in_shape as *const Shape)
}

#[no_mangle]
pub unsafe extern "C" fn keel_shape_get_type(in_shape: *const KeelShape) -> KeelShapeType {
    shape_ref(in_shape).shape_type as KeelShapeType
}

#[no_mangle]
pub unsafe extern "C" fn keel_shape_get_sub_type(in_shape: *const KeelShape) -> KeelShapeSubType {
    shape_ref(in_shape).sub_type as KeelShapeSubType
}

#[no_mangle]
pub unsafe extern "C" fn keel_shape_get_user_data(in_shape: *const KeelShape) -> u64 {
    shape_ref(in_shape).user_data
}

#[no_mangle]
pub unsafe extern "C" fn keel_shape_set_user_data(in_shape: *mut KeelShape, in_user_data: u64) {
    shape_mut(in_shape).user_data = in_user_data;
}

#[no_mangle]
pub unsafe extern "C" fn keel_shape_get_center_of_mass(
    in_shape: *const KeelShape,
    out_position: *mut KeelReal,
) {
    debug_assert!(!out_position.is_null());
    let com = shape_ref(in_shape).center_of_mass;
    crate::ffi::vec::store_rvec3(out_position, crate::math::rvec3_from_vec3(com));
}
