//! Flat API: character and character-virtual families.

use crate::character::{Character, CharacterSettings, CharacterVirtual, CharacterVirtualSettings};
use crate::core::alloc::handle_alloc;
use crate::ffi::bridge::CharacterContactBridge;
use crate::ffi::convert::*;
use crate::ffi::init::debug_check_initialized;
use crate::ffi::types::*;
use crate::ffi::vec::{load_quat, load_rvec3, store_quat, store_rvec3, store_vec3, load_vec3};
use crate::math::{F32x4, RealX4};
use crate::system::PhysicsSystem;

// ---------------------------------------------------------------------------
// CharacterSettings
// ---------------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn keel_character_settings_create() -> *mut KeelCharacterSettings {
    debug_check_initialized();
    handle_alloc(CharacterSettings::default()) as *mut KeelCharacterSettings
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_settings_add_ref(
    in_settings: *mut KeelCharacterSettings,
) {
    CharacterSettings::add_ref(in_settings as *const CharacterSettings);
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_settings_release(
    in_settings: *mut KeelCharacterSettings,
) {
    CharacterSettings::release(in_settings as *const CharacterSettings);
}

// ---------------------------------------------------------------------------
// Character
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn keel_character_create(
    in_settings: *const KeelCharacterSettings,
    in_position: *const KeelReal,
    in_rotation: *const f32,
    in_user_data: u64,
    in_physics_system: *mut KeelPhysicsSystem,
) -> *mut KeelCharacter {
    debug_check_initialized();
    Character::create(
        character_settings_ref(in_settings),
        load_rvec3(in_position),
        load_quat(in_rotation),
        in_user_data,
        in_physics_system as *mut PhysicsSystem,
    ) as *mut KeelCharacter
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_destroy(in_character: *mut KeelCharacter) {
    Character::destroy(in_character as *mut Character);
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_add_to_physics_system(
    in_character: *mut KeelCharacter,
    in_activation: KeelActivation,
    in_lock_bodies: bool,
) {
    character_ref(in_character)
        .add_to_physics_system(activation_from_raw(in_activation), in_lock_bodies);
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_remove_from_physics_system(
    in_character: *mut KeelCharacter,
    in_lock_bodies: bool,
) {
    character_ref(in_character).remove_from_physics_system(in_lock_bodies);
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_get_position(
    in_character: *const KeelCharacter,
    out_position: *mut KeelReal,
) {
    store_rvec3(out_position, character_ref(in_character).position());
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_set_position(
    in_character: *mut KeelCharacter,
    in_position: *const KeelReal,
) {
    character_ref(in_character).set_position(load_rvec3(in_position));
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_get_linear_velocity(
    in_character: *const KeelCharacter,
    out_linear_velocity: *mut f32,
) {
    store_vec3(out_linear_velocity, character_ref(in_character).linear_velocity());
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_set_linear_velocity(
    in_character: *mut KeelCharacter,
    in_linear_velocity: *const f32,
) {
    character_ref(in_character).set_linear_velocity(load_vec3(in_linear_velocity));
}

// ---------------------------------------------------------------------------
// CharacterVirtualSettings
// ---------------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn keel_character_virtual_settings_create() -> *mut KeelCharacterVirtualSettings {
    debug_check_initialized();
    handle_alloc(CharacterVirtualSettings::default()) as *mut KeelCharacterVirtualSettings
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_virtual_settings_release(
    in_settings: *mut KeelCharacterVirtualSettings,
) {
    CharacterVirtualSettings::release(in_settings as *const CharacterVirtualSettings);
}

// ---------------------------------------------------------------------------
// CharacterVirtual
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn keel_character_virtual_create(
    in_settings: *const KeelCharacterVirtualSettings,
    in_position: *const KeelReal,
    in_rotation: *const f32,
    in_physics_system: *mut KeelPhysicsSystem,
) -> *mut KeelCharacterVirtual {
    debug_check_initialized();
    CharacterVirtual::create(
        character_virtual_settings_ref(in_settings),
        load_rvec3(in_position),
        load_quat(in_rotation),
        in_physics_system as *const PhysicsSystem,
    ) as *mut KeelCharacterVirtual
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_virtual_destroy(
    in_character: *mut KeelCharacterVirtual,
) {
    CharacterVirtual::destroy(in_character as *mut CharacterVirtual);
}

/// Moves the character by one step under `in_gravity`. The filter and
/// allocator arguments exist for signature compatibility with richer
/// narrow-phase sweeps; the ground probe here needs none of them.
#[no_mangle]
pub unsafe extern "C" fn keel_character_virtual_update(
    in_character: *mut KeelCharacterVirtual,
    in_delta_time: f32,
    in_gravity: *const f32,
    _in_broad_phase_layer_filter: *const KeelBroadPhaseLayerFilterVTable,
    _in_object_layer_filter: *const KeelObjectLayerFilterVTable,
    _in_body_filter: *const KeelBodyFilterVTable,
    in_temp_allocator: *mut KeelTempAllocator,
) {
    debug_assert!(!in_temp_allocator.is_null());
    character_virtual_mut(in_character).update(in_delta_time, load_vec3(in_gravity));
}

/// Installs the contact listener; null clears it.
#[no_mangle]
pub unsafe extern "C" fn keel_character_virtual_set_listener(
    in_character: *mut KeelCharacterVirtual,
    in_listener: *mut KeelCharacterContactListenerVTable,
) {
    let character = character_virtual_mut(in_character);
    if in_listener.is_null() {
        character.set_listener(None, 0);
        return;
    }
    character.set_listener(
        Some(Box::new(CharacterContactBridge::new(*in_listener))),
        in_listener as usize,
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_virtual_update_ground_velocity(
    in_character: *mut KeelCharacterVirtual,
) {
    character_virtual_mut(in_character).update_ground_velocity();
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_virtual_get_ground_velocity(
    in_character: *const KeelCharacterVirtual,
    out_ground_velocity: *mut f32,
) {
    store_vec3(
        out_ground_velocity,
        character_virtual_ref(in_character).ground_velocity(),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_virtual_get_ground_state(
    in_character: *mut KeelCharacterVirtual,
) -> KeelCharacterGroundState {
    character_virtual_ref(in_character).ground_state() as KeelCharacterGroundState
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_virtual_get_position(
    in_character: *const KeelCharacterVirtual,
    out_position: *mut KeelReal,
) {
    store_rvec3(
        out_position,
        character_virtual_ref(in_character).position.to_rvec3(),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_virtual_set_position(
    in_character: *mut KeelCharacterVirtual,
    in_position: *const KeelReal,
) {
    character_virtual_mut(in_character).position = RealX4::from_rvec3(load_rvec3(in_position));
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_virtual_get_rotation(
    in_character: *const KeelCharacterVirtual,
    out_rotation: *mut f32,
) {
    store_quat(
        out_rotation,
        character_virtual_ref(in_character).rotation.to_quat(),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_virtual_set_rotation(
    in_character: *mut KeelCharacterVirtual,
    in_rotation: *const f32,
) {
    character_virtual_mut(in_character).rotation = F32x4::from_quat(load_quat(in_rotation));
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_virtual_get_linear_velocity(
    in_character: *const KeelCharacterVirtual,
    out_linear_velocity: *mut f32,
) {
    store_vec3(
        out_linear_velocity,
        character_virtual_ref(in_character).linear_velocity_vec(),
    );
}

#[no_mangle]
pub unsafe extern "C" fn keel_character_virtual_set_linear_velocity(
    in_character: *mut KeelCharacterVirtual,
    in_linear_velocity: *const f32,
) {
    character_virtual_mut(in_character).linear_velocity =
        F32x4::from_vec3(load_vec3(in_linear_velocity));
}
