//! Flat API: body interface, body accessors, motion properties, body ids.

use glam::{Mat3, Mat4};

use crate::core::body::{BodyCreationSettings, MassProperties};
use crate::core::filter::CollisionGroup;
use crate::core::id::BodyId;
use crate::core::shape::Shape;
use crate::ffi::convert::*;
use crate::ffi::types::*;
use crate::ffi::vec::{
    load_mat44, load_quat, load_rvec3, load_vec3, store_mat44, store_quat, store_rvec3, store_vec3,
};
use crate::math::F32x16;

// ---------------------------------------------------------------------------
// BodyCreationSettings
// ---------------------------------------------------------------------------

/// Fills `out_settings` with the documented defaults.
#[no_mangle]
pub unsafe extern "C" fn keel_body_creation_settings_set_default(
    out_settings: *mut KeelBodyCreationSettings,
) {
    debug_assert!(!out_settings.is_null());
    *creation_settings_mut(out_settings) = BodyCreationSettings::default();
}

/// Defaults plus the given shape, pose, motion type, and layer.
#[no_mangle]
pub unsafe extern "C" fn keel_body_creation_settings_set(
    out_settings: *mut KeelBodyCreationSettings,
    in_shape: *const KeelShape,
    in_position: *const KeelReal,
    in_rotation: *const f32,
    in_motion_type: KeelMotionType,
    in_layer: KeelObjectLayer,
) {
    debug_assert!(!out_settings.is_null());
    *creation_settings_mut(out_settings) = BodyCreationSettings::new(
        in_shape as *const Shape,
        load_rvec3(in_position),
        load_quat(in_rotation),
        motion_type_from_raw(in_motion_type),
        in_layer,
    );
}

// ---------------------------------------------------------------------------
// BodyInterface
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_create_body(
    in_iface: *mut KeelBodyInterface,
    in_settings: *const KeelBodyCreationSettings,
) -> *mut KeelBody {
    pub_body_mut(body_iface_ref(in_iface).create_body(creation_settings_ref(in_settings)))
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_create_body_with_id(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_settings: *const KeelBodyCreationSettings,
) -> *mut KeelBody {
    pub_body_mut(
        body_iface_ref(in_iface)
            .create_body_with_id(body_id_from_raw(in_body_id), creation_settings_ref(in_settings)),
    )
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_destroy_body(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
) {
    body_iface_ref(in_iface).destroy_body(body_id_from_raw(in_body_id));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_add_body(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_mode: KeelActivation,
) {
    body_iface_ref(in_iface).add_body(body_id_from_raw(in_body_id), activation_from_raw(in_mode));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_remove_body(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
) {
    body_iface_ref(in_iface).remove_body(body_id_from_raw(in_body_id));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_create_and_add_body(
    in_iface: *mut KeelBodyInterface,
    in_settings: *const KeelBodyCreationSettings,
    in_mode: KeelActivation,
) -> KeelBodyId {
    body_iface_ref(in_iface)
        .create_and_add_body(creation_settings_ref(in_settings), activation_from_raw(in_mode))
        .0
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_is_added(
    in_iface: *const KeelBodyInterface,
    in_body_id: KeelBodyId,
) -> bool {
    body_iface_ref(in_iface as *mut KeelBodyInterface).is_added(body_id_from_raw(in_body_id))
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_activate_body(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
) {
    body_iface_ref(in_iface).activate_body(body_id_from_raw(in_body_id));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_deactivate_body(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
) {
    body_iface_ref(in_iface).deactivate_body(body_id_from_raw(in_body_id));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_is_active(
    in_iface: *const KeelBodyInterface,
    in_body_id: KeelBodyId,
) -> bool {
    body_iface_ref(in_iface as *mut KeelBodyInterface).is_active(body_id_from_raw(in_body_id))
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_set_linear_velocity(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_velocity: *const f32,
) {
    body_iface_ref(in_iface)
        .set_linear_velocity(body_id_from_raw(in_body_id), load_vec3(in_velocity));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_get_linear_velocity(
    in_iface: *const KeelBodyInterface,
    in_body_id: KeelBodyId,
    out_velocity: *mut f32,
) {
    let v = body_iface_ref(in_iface as *mut KeelBodyInterface)
        .get_linear_velocity(body_id_from_raw(in_body_id));
    store_vec3(out_velocity, v);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_add_linear_velocity(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_velocity: *const f32,
) {
    body_iface_ref(in_iface)
        .add_linear_velocity(body_id_from_raw(in_body_id), load_vec3(in_velocity));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_set_angular_velocity(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_velocity: *const f32,
) {
    body_iface_ref(in_iface)
        .set_angular_velocity(body_id_from_raw(in_body_id), load_vec3(in_velocity));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_get_angular_velocity(
    in_iface: *const KeelBodyInterface,
    in_body_id: KeelBodyId,
    out_velocity: *mut f32,
) {
    let v = body_iface_ref(in_iface as *mut KeelBodyInterface)
        .get_angular_velocity(body_id_from_raw(in_body_id));
    store_vec3(out_velocity, v);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_set_linear_and_angular_velocity(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_linear_velocity: *const f32,
    in_angular_velocity: *const f32,
) {
    body_iface_ref(in_iface).set_linear_and_angular_velocity(
        body_id_from_raw(in_body_id),
        load_vec3(in_linear_velocity),
        load_vec3(in_angular_velocity),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_get_linear_and_angular_velocity(
    in_iface: *const KeelBodyInterface,
    in_body_id: KeelBodyId,
    out_linear_velocity: *mut f32,
    out_angular_velocity: *mut f32,
) {
    let (v, w) = body_iface_ref(in_iface as *mut KeelBodyInterface)
        .get_linear_and_angular_velocity(body_id_from_raw(in_body_id));
    store_vec3(out_linear_velocity, v);
    store_vec3(out_angular_velocity, w);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_add_linear_and_angular_velocity(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_linear_velocity: *const f32,
    in_angular_velocity: *const f32,
) {
    body_iface_ref(in_iface).add_linear_and_angular_velocity(
        body_id_from_raw(in_body_id),
        load_vec3(in_linear_velocity),
        load_vec3(in_angular_velocity),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_get_point_velocity(
    in_iface: *const KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_point: *const KeelReal,
    out_velocity: *mut f32,
) {
    let v = body_iface_ref(in_iface as *mut KeelBodyInterface)
        .get_point_velocity(body_id_from_raw(in_body_id), load_rvec3(in_point));
    store_vec3(out_velocity, v);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_get_position(
    in_iface: *const KeelBodyInterface,
    in_body_id: KeelBodyId,
    out_position: *mut KeelReal,
) {
    let p = body_iface_ref(in_iface as *mut KeelBodyInterface)
        .get_position(body_id_from_raw(in_body_id));
    store_rvec3(out_position, p);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_set_position(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_position: *const KeelReal,
    in_activation: KeelActivation,
) {
    body_iface_ref(in_iface).set_position(
        body_id_from_raw(in_body_id),
        load_rvec3(in_position),
        activation_from_raw(in_activation),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_get_center_of_mass_position(
    in_iface: *const KeelBodyInterface,
    in_body_id: KeelBodyId,
    out_position: *mut KeelReal,
) {
    let p = body_iface_ref(in_iface as *mut KeelBodyInterface)
        .get_center_of_mass_position(body_id_from_raw(in_body_id));
    store_rvec3(out_position, p);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_get_rotation(
    in_iface: *const KeelBodyInterface,
    in_body_id: KeelBodyId,
    out_rotation: *mut f32,
) {
    let q = body_iface_ref(in_iface as *mut KeelBodyInterface)
        .get_rotation(body_id_from_raw(in_body_id));
    store_quat(out_rotation, q);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_set_rotation(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_rotation: *const f32,
    in_activation: KeelActivation,
) {
    body_iface_ref(in_iface).set_rotation(
        body_id_from_raw(in_body_id),
        load_quat(in_rotation),
        activation_from_raw(in_activation),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_set_position_rotation_and_velocity(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_position: *const KeelReal,
    in_rotation: *const f32,
    in_linear_velocity: *const f32,
    in_angular_velocity: *const f32,
) {
    body_iface_ref(in_iface).set_position_rotation_and_velocity(
        body_id_from_raw(in_body_id),
        load_rvec3(in_position),
        load_quat(in_rotation),
        load_vec3(in_linear_velocity),
        load_vec3(in_angular_velocity),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_add_force(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_force: *const f32,
) {
    body_iface_ref(in_iface).add_force(body_id_from_raw(in_body_id), load_vec3(in_force));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_add_force_at_position(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_force: *const f32,
    in_position: *const KeelReal,
) {
    body_iface_ref(in_iface).add_force_at_position(
        body_id_from_raw(in_body_id),
        load_vec3(in_force),
        load_rvec3(in_position),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_add_torque(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_torque: *const f32,
) {
    body_iface_ref(in_iface).add_torque(body_id_from_raw(in_body_id), load_vec3(in_torque));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_add_force_and_torque(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_force: *const f32,
    in_torque: *const f32,
) {
    body_iface_ref(in_iface).add_force_and_torque(
        body_id_from_raw(in_body_id),
        load_vec3(in_force),
        load_vec3(in_torque),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_add_impulse(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_impulse: *const f32,
) {
    body_iface_ref(in_iface).add_impulse(body_id_from_raw(in_body_id), load_vec3(in_impulse));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_add_impulse_at_position(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_impulse: *const f32,
    in_position: *const KeelReal,
) {
    body_iface_ref(in_iface).add_impulse_at_position(
        body_id_from_raw(in_body_id),
        load_vec3(in_impulse),
        load_rvec3(in_position),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_add_angular_impulse(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_impulse: *const f32,
) {
    body_iface_ref(in_iface)
        .add_angular_impulse(body_id_from_raw(in_body_id), load_vec3(in_impulse));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_get_motion_type(
    in_iface: *const KeelBodyInterface,
    in_body_id: KeelBodyId,
) -> KeelMotionType {
    body_iface_ref(in_iface as *mut KeelBodyInterface).get_motion_type(body_id_from_raw(in_body_id))
        as KeelMotionType
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_set_motion_type(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_motion_type: KeelMotionType,
    in_activation: KeelActivation,
) {
    body_iface_ref(in_iface).set_motion_type(
        body_id_from_raw(in_body_id),
        motion_type_from_raw(in_motion_type),
        activation_from_raw(in_activation),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_get_object_layer(
    in_iface: *const KeelBodyInterface,
    in_body_id: KeelBodyId,
) -> KeelObjectLayer {
    body_iface_ref(in_iface as *mut KeelBodyInterface).get_object_layer(body_id_from_raw(in_body_id))
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_interface_set_object_layer(
    in_iface: *mut KeelBodyInterface,
    in_body_id: KeelBodyId,
    in_layer: KeelObjectLayer,
) {
    body_iface_ref(in_iface).set_object_layer(body_id_from_raw(in_body_id), in_layer);
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_id(in_body: *const KeelBody) -> KeelBodyId {
    body_ref(in_body).id.0
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_is_active(in_body: *const KeelBody) -> bool {
    body_ref(in_body).is_active()
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_is_static(in_body: *const KeelBody) -> bool {
    body_ref(in_body).is_static()
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_is_kinematic(in_body: *const KeelBody) -> bool {
    body_ref(in_body).is_kinematic()
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_is_dynamic(in_body: *const KeelBody) -> bool {
    body_ref(in_body).is_dynamic()
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_can_be_kinematic_or_dynamic(in_body: *const KeelBody) -> bool {
    body_ref(in_body).can_be_kinematic_or_dynamic()
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_set_is_sensor(in_body: *mut KeelBody, in_is_sensor: bool) {
    body_mut(in_body).set_is_sensor(in_is_sensor);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_is_sensor(in_body: *const KeelBody) -> bool {
    body_ref(in_body).is_sensor()
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_motion_type(in_body: *const KeelBody) -> KeelMotionType {
    body_ref(in_body).motion_type as KeelMotionType
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_set_motion_type(
    in_body: *mut KeelBody,
    in_motion_type: KeelMotionType,
) {
    body_mut(in_body).motion_type = motion_type_from_raw(in_motion_type);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_broad_phase_layer(
    in_body: *const KeelBody,
) -> KeelBroadPhaseLayer {
    body_ref(in_body).broad_phase_layer
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_object_layer(in_body: *const KeelBody) -> KeelObjectLayer {
    body_ref(in_body).object_layer
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_collision_group(
    in_body: *mut KeelBody,
) -> *mut KeelCollisionGroup {
    &mut body_mut(in_body).collision_group as *mut CollisionGroup as *mut KeelCollisionGroup
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_set_collision_group(
    in_body: *mut KeelBody,
    in_group: *const KeelCollisionGroup,
) {
    debug_assert!(!in_group.is_null());
    body_mut(in_body).collision_group = *(in_group as *const CollisionGroup);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_allow_sleeping(in_body: *const KeelBody) -> bool {
    body_ref(in_body).allow_sleeping()
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_set_allow_sleeping(in_body: *mut KeelBody, in_allow: bool) {
    body_mut(in_body).set_allow_sleeping(in_allow);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_friction(in_body: *const KeelBody) -> f32 {
    body_ref(in_body).friction
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_set_friction(in_body: *mut KeelBody, in_friction: f32) {
    body_mut(in_body).friction = in_friction;
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_restitution(in_body: *const KeelBody) -> f32 {
    body_ref(in_body).restitution
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_set_restitution(in_body: *mut KeelBody, in_restitution: f32) {
    body_mut(in_body).restitution = in_restitution;
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_linear_velocity(
    in_body: *const KeelBody,
    out_linear_velocity: *mut f32,
) {
    store_vec3(out_linear_velocity, body_ref(in_body).linear_velocity());
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_set_linear_velocity(
    in_body: *mut KeelBody,
    in_linear_velocity: *const f32,
) {
    body_mut(in_body).set_linear_velocity(load_vec3(in_linear_velocity));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_set_linear_velocity_clamped(
    in_body: *mut KeelBody,
    in_linear_velocity: *const f32,
) {
    body_mut(in_body).set_linear_velocity_clamped(load_vec3(in_linear_velocity));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_angular_velocity(
    in_body: *const KeelBody,
    out_angular_velocity: *mut f32,
) {
    store_vec3(out_angular_velocity, body_ref(in_body).angular_velocity());
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_set_angular_velocity(
    in_body: *mut KeelBody,
    in_angular_velocity: *const f32,
) {
    body_mut(in_body).set_angular_velocity(load_vec3(in_angular_velocity));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_set_angular_velocity_clamped(
    in_body: *mut KeelBody,
    in_angular_velocity: *const f32,
) {
    body_mut(in_body).set_angular_velocity_clamped(load_vec3(in_angular_velocity));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_point_velocity_com(
    in_body: *const KeelBody,
    in_point_relative_to_com: *const f32,
    out_velocity: *mut f32,
) {
    let v = body_ref(in_body).point_velocity_com(load_vec3(in_point_relative_to_com));
    store_vec3(out_velocity, v);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_point_velocity(
    in_body: *const KeelBody,
    in_point: *const KeelReal,
    out_velocity: *mut f32,
) {
    let v = body_ref(in_body).point_velocity(load_rvec3(in_point));
    store_vec3(out_velocity, v);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_add_force(in_body: *mut KeelBody, in_force: *const f32) {
    body_mut(in_body).add_force(load_vec3(in_force));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_add_force_at_position(
    in_body: *mut KeelBody,
    in_force: *const f32,
    in_position: *const KeelReal,
) {
    body_mut(in_body).add_force_at_position(load_vec3(in_force), load_rvec3(in_position));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_add_torque(in_body: *mut KeelBody, in_torque: *const f32) {
    body_mut(in_body).add_torque(load_vec3(in_torque));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_inverse_inertia(
    in_body: *const KeelBody,
    out_inverse_inertia: *mut f32,
) {
    let m: F32x16 = body_ref(in_body).inverse_inertia();
    store_mat44(out_inverse_inertia, m.to_mat4());
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_add_impulse(in_body: *mut KeelBody, in_impulse: *const f32) {
    body_mut(in_body).add_impulse(load_vec3(in_impulse));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_add_impulse_at_position(
    in_body: *mut KeelBody,
    in_impulse: *const f32,
    in_position: *const KeelReal,
) {
    body_mut(in_body).add_impulse_at_position(load_vec3(in_impulse), load_rvec3(in_position));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_add_angular_impulse(
    in_body: *mut KeelBody,
    in_angular_impulse: *const f32,
) {
    body_mut(in_body).add_angular_impulse(load_vec3(in_angular_impulse));
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_move_kinematic(
    in_body: *mut KeelBody,
    in_target_position: *const KeelReal,
    in_target_rotation: *const f32,
    in_delta_time: f32,
) {
    body_mut(in_body).move_kinematic(
        load_rvec3(in_target_position),
        load_quat(in_target_rotation),
        in_delta_time,
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_apply_buoyancy_impulse(
    in_body: *mut KeelBody,
    in_surface_position: *const KeelReal,
    in_surface_normal: *const f32,
    in_buoyancy: f32,
    in_linear_drag: f32,
    in_angular_drag: f32,
    in_fluid_velocity: *const f32,
    in_gravity: *const f32,
    in_delta_time: f32,
) {
    body_mut(in_body).apply_buoyancy_impulse(
        load_rvec3(in_surface_position),
        load_vec3(in_surface_normal),
        in_buoyancy,
        in_linear_drag,
        in_angular_drag,
        load_vec3(in_fluid_velocity),
        load_vec3(in_gravity),
        in_delta_time,
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_is_in_broad_phase(in_body: *const KeelBody) -> bool {
    body_ref(in_body).is_in_broad_phase()
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_is_collision_cache_invalid(in_body: *const KeelBody) -> bool {
    body_ref(in_body).is_collision_cache_invalid()
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_shape(in_body: *const KeelBody) -> *const KeelShape {
    pub_shape(body_ref(in_body).shape)
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_position(
    in_body: *const KeelBody,
    out_position: *mut KeelReal,
) {
    store_rvec3(out_position, body_ref(in_body).get_position());
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_rotation(in_body: *const KeelBody, out_rotation: *mut f32) {
    store_quat(out_rotation, body_ref(in_body).rotation());
}

unsafe fn store_mat3(out: *mut f32, m: Mat3) {
    debug_assert!(!out.is_null());
    let cols = m.to_cols_array();
    std::ptr::copy_nonoverlapping(cols.as_ptr(), out, 9);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_world_transform(
    in_body: *const KeelBody,
    out_rotation: *mut f32,
    out_translation: *mut KeelReal,
) {
    let (rotation, translation) = body_ref(in_body).world_transform();
    store_mat3(out_rotation, rotation);
    store_rvec3(out_translation, translation);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_center_of_mass_position(
    in_body: *const KeelBody,
    out_position: *mut KeelReal,
) {
    store_rvec3(out_position, body_ref(in_body).center_of_mass_position());
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_center_of_mass_transform(
    in_body: *const KeelBody,
    out_rotation: *mut f32,
    out_translation: *mut KeelReal,
) {
    let (rotation, translation) = body_ref(in_body).center_of_mass_transform();
    store_mat3(out_rotation, rotation);
    store_rvec3(out_translation, translation);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_inverse_center_of_mass_transform(
    in_body: *const KeelBody,
    out_rotation: *mut f32,
    out_translation: *mut KeelReal,
) {
    let (rotation, translation) = body_ref(in_body).inverse_center_of_mass_transform();
    store_mat3(out_rotation, rotation);
    store_rvec3(out_translation, translation);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_world_space_bounds(
    in_body: *const KeelBody,
    out_min: *mut f32,
    out_max: *mut f32,
) {
    let bounds = body_ref(in_body).world_bounds();
    store_vec3(out_min, bounds.min);
    store_vec3(out_max, bounds.max);
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_motion_properties(
    in_body: *mut KeelBody,
) -> *mut KeelMotionProperties {
    body_mut(in_body).motion_properties as *mut KeelMotionProperties
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_user_data(in_body: *const KeelBody) -> u64 {
    body_ref(in_body).user_data
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_set_user_data(in_body: *mut KeelBody, in_user_data: u64) {
    body_mut(in_body).user_data = in_user_data;
}

#[no_mangle]
pub unsafe extern "C" fn keel_body_get_world_space_surface_normal(
    in_body: *const KeelBody,
    in_sub_shape_id: KeelSubShapeId,
    in_position: *const KeelReal,
    out_normal_vector: *mut f32,
) {
    let normal =
        body_ref(in_body).world_space_surface_normal(in_sub_shape_id, load_rvec3(in_position));
    store_vec3(out_normal_vector, normal);
}

// ---------------------------------------------------------------------------
// MotionProperties
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_get_motion_quality(
    in_properties: *const KeelMotionProperties,
) -> KeelMotionQuality {
    motion_ref(in_properties).motion_quality as KeelMotionQuality
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_get_linear_velocity(
    in_properties: *const KeelMotionProperties,
    out_linear_velocity: *mut f32,
) {
    store_vec3(out_linear_velocity, motion_ref(in_properties).linear_velocity());
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_set_linear_velocity(
    in_properties: *mut KeelMotionProperties,
    in_linear_velocity: *const f32,
) {
    motion_mut(in_properties).set_linear_velocity(load_vec3(in_linear_velocity));
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_set_linear_velocity_clamped(
    in_properties: *mut KeelMotionProperties,
    in_linear_velocity: *const f32,
) {
    motion_mut(in_properties).set_linear_velocity_clamped(load_vec3(in_linear_velocity));
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_get_angular_velocity(
    in_properties: *const KeelMotionProperties,
    out_angular_velocity: *mut f32,
) {
    store_vec3(out_angular_velocity, motion_ref(in_properties).angular_velocity());
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_set_angular_velocity(
    in_properties: *mut KeelMotionProperties,
    in_angular_velocity: *const f32,
) {
    motion_mut(in_properties).set_angular_velocity(load_vec3(in_angular_velocity));
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_set_angular_velocity_clamped(
    in_properties: *mut KeelMotionProperties,
    in_angular_velocity: *const f32,
) {
    motion_mut(in_properties).set_angular_velocity_clamped(load_vec3(in_angular_velocity));
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_move_kinematic(
    in_properties: *mut KeelMotionProperties,
    in_delta_position: *const f32,
    in_delta_rotation: *const f32,
    in_delta_time: f32,
) {
    motion_mut(in_properties).move_kinematic(
        load_vec3(in_delta_position),
        load_quat(in_delta_rotation),
        in_delta_time,
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_clamp_linear_velocity(
    in_properties: *mut KeelMotionProperties,
) {
    motion_mut(in_properties).clamp_linear_velocity();
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_clamp_angular_velocity(
    in_properties: *mut KeelMotionProperties,
) {
    motion_mut(in_properties).clamp_angular_velocity();
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_get_linear_damping(
    in_properties: *const KeelMotionProperties,
) -> f32 {
    motion_ref(in_properties).linear_damping
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_set_linear_damping(
    in_properties: *mut KeelMotionProperties,
    in_linear_damping: f32,
) {
    motion_mut(in_properties).linear_damping = in_linear_damping;
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_get_angular_damping(
    in_properties: *const KeelMotionProperties,
) -> f32 {
    motion_ref(in_properties).angular_damping
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_set_angular_damping(
    in_properties: *mut KeelMotionProperties,
    in_angular_damping: f32,
) {
    motion_mut(in_properties).angular_damping = in_angular_damping;
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_get_gravity_factor(
    in_properties: *const KeelMotionProperties,
) -> f32 {
    motion_ref(in_properties).gravity_factor
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_set_gravity_factor(
    in_properties: *mut KeelMotionProperties,
    in_gravity_factor: f32,
) {
    motion_mut(in_properties).gravity_factor = in_gravity_factor;
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_set_mass_properties(
    in_properties: *mut KeelMotionProperties,
    in_mass_properties: *const KeelMassProperties,
) {
    debug_assert!(!in_mass_properties.is_null());
    motion_mut(in_properties)
        .set_mass_properties(&*(in_mass_properties as *const MassProperties));
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_get_inverse_mass(
    in_properties: *const KeelMotionProperties,
) -> f32 {
    motion_ref(in_properties).inv_mass
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_set_inverse_mass(
    in_properties: *mut KeelMotionProperties,
    in_inv_mass: f32,
) {
    motion_mut(in_properties).inv_mass = in_inv_mass;
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_get_inverse_inertia_diagonal(
    in_properties: *const KeelMotionProperties,
    out_inverse_inertia_diagonal: *mut f32,
) {
    store_vec3(
        out_inverse_inertia_diagonal,
        motion_ref(in_properties).inv_inertia_diagonal.to_vec3(),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_get_inertia_rotation(
    in_properties: *const KeelMotionProperties,
    out_inertia_rotation: *mut f32,
) {
    store_quat(
        out_inertia_rotation,
        motion_ref(in_properties).inertia_rotation.to_quat(),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_set_inverse_inertia(
    in_properties: *mut KeelMotionProperties,
    in_diagonal: *const f32,
    in_rotation: *const f32,
) {
    motion_mut(in_properties).set_inverse_inertia(load_vec3(in_diagonal), load_quat(in_rotation));
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_get_local_space_inverse_inertia(
    in_properties: *const KeelMotionProperties,
    out_matrix: *mut f32,
) {
    store_mat44(out_matrix, motion_ref(in_properties).local_space_inverse_inertia());
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_get_inverse_inertia_for_rotation(
    in_properties: *const KeelMotionProperties,
    in_rotation_matrix: *const f32,
    out_matrix: *mut f32,
) {
    let rotation: Mat4 = load_mat44(in_rotation_matrix);
    store_mat44(
        out_matrix,
        motion_ref(in_properties).inverse_inertia_for_rotation(rotation),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_multiply_world_space_inverse_inertia_by_vector(
    in_properties: *const KeelMotionProperties,
    in_body_rotation: *const f32,
    in_vector: *const f32,
    out_vector: *mut f32,
) {
    let result = motion_ref(in_properties).multiply_world_inverse_inertia_by_vector(
        load_quat(in_body_rotation),
        load_vec3(in_vector),
    );
    store_vec3(out_vector, result);
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_get_point_velocity_com(
    in_properties: *const KeelMotionProperties,
    in_point_relative_to_com: *const f32,
    out_point: *mut f32,
) {
    let v = motion_ref(in_properties).point_velocity_com(load_vec3(in_point_relative_to_com));
    store_vec3(out_point, v);
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_get_max_linear_velocity(
    in_properties: *const KeelMotionProperties,
) -> f32 {
    motion_ref(in_properties).max_linear_velocity
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_set_max_linear_velocity(
    in_properties: *mut KeelMotionProperties,
    in_max_linear_velocity: f32,
) {
    motion_mut(in_properties).max_linear_velocity = in_max_linear_velocity;
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_get_max_angular_velocity(
    in_properties: *const KeelMotionProperties,
) -> f32 {
    motion_ref(in_properties).max_angular_velocity
}

#[no_mangle]
pub unsafe extern "C" fn keel_motion_properties_set_max_angular_velocity(
    in_properties: *mut KeelMotionProperties,
    in_max_angular_velocity: f32,
) {
    motion_mut(in_properties).max_angular_velocity = in_max_angular_velocity;
}

// ---------------------------------------------------------------------------
// BodyId helpers
// ---------------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn keel_body_id_get_index(in_body_id: KeelBodyId) -> u32 {
    BodyId(in_body_id).index()
}

#[no_mangle]
pub extern "C" fn keel_body_id_get_sequence_number(in_body_id: KeelBodyId) -> u8 {
    BodyId(in_body_id).sequence_number()
}

#[no_mangle]
pub extern "C" fn keel_body_id_is_invalid(in_body_id: KeelBodyId) -> bool {
    BodyId(in_body_id).is_invalid()
}
