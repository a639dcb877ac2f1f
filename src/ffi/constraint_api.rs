//! Flat API: constraint settings and constraints.

use crate::core::alloc::handle_alloc;
use crate::core::constraint::{
    Constraint, ConstraintSettings, ConstraintSettingsKind, ConstraintSpace,
};
use crate::ffi::convert::*;
use crate::ffi::init::debug_check_initialized;
use crate::ffi::types::*;

// ---------------------------------------------------------------------------
// ConstraintSettings (base)
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn keel_constraint_settings_add_ref(
    in_settings: *mut KeelConstraintSettings,
) {
    ConstraintSettings::add_ref(in_settings as *const ConstraintSettings);
}

#[no_mangle]
pub unsafe extern "C" fn keel_constraint_settings_release(
    in_settings: *mut KeelConstraintSettings,
) {
    ConstraintSettings::release(in_settings as *const ConstraintSettings);
}

#[no_mangle]
pub unsafe extern "C" fn keel_constraint_settings_get_ref_count(
    in_settings: *const KeelConstraintSettings,
) -> u32 {
    ConstraintSettings::ref_count(in_settings as *const ConstraintSettings)
}

#[no_mangle]
pub unsafe extern "C" fn keel_constraint_settings_get_user_data(
    in_settings: *const KeelConstraintSettings,
) -> u64 {
    constraint_settings_ref(in_settings).user_data
}

#[no_mangle]
pub unsafe extern "C" fn keel_constraint_settings_set_user_data(
    in_settings: *mut KeelConstraintSettings,
    in_user_data: u64,
) {
    (*(in_settings as *mut ConstraintSettings)).user_data = in_user_data;
}

// ---------------------------------------------------------------------------
// TwoBodyConstraintSettings
// ---------------------------------------------------------------------------

/// Instantiates the constraint for two specific bodies. One reference is
/// owed to the caller; null on failure.
#[no_mangle]
pub unsafe extern "C" fn keel_two_body_constraint_settings_create_constraint(
    in_settings: *const KeelTwoBodyConstraintSettings,
    in_body1: *mut KeelBody,
    in_body2: *mut KeelBody,
) -> *mut KeelConstraint {
    debug_assert!(!in_body1.is_null() && !in_body2.is_null());
    two_body_constraint_settings_ref(in_settings)
        .create_constraint(body_ref(in_body1), body_ref(in_body2)) as *mut KeelConstraint
}

// ---------------------------------------------------------------------------
// FixedConstraintSettings
// ---------------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn keel_fixed_constraint_settings_create() -> *mut KeelFixedConstraintSettings {
    debug_check_initialized();
    handle_alloc(ConstraintSettings::fixed()) as *mut KeelFixedConstraintSettings
}

#[no_mangle]
pub unsafe extern "C" fn keel_fixed_constraint_settings_set_space(
    in_settings: *mut KeelFixedConstraintSettings,
    in_space: KeelConstraintSpace,
) {
    let ConstraintSettingsKind::Fixed { space, .. } =
        &mut fixed_constraint_settings_mut(in_settings).kind;
    *space = if in_space == KEEL_CONSTRAINT_SPACE_LOCAL_TO_BODY_COM {
        ConstraintSpace::LocalToBodyCom
    } else {
        ConstraintSpace::WorldSpace
    };
}

#[no_mangle]
pub unsafe extern "C" fn keel_fixed_constraint_settings_set_auto_detect_point(
    in_settings: *mut KeelFixedConstraintSettings,
    in_enabled: bool,
) {
    let ConstraintSettingsKind::Fixed {
        auto_detect_point, ..
    } = &mut fixed_constraint_settings_mut(in_settings).kind;
    *auto_detect_point = in_enabled;
}

// ---------------------------------------------------------------------------
// Constraint
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn keel_constraint_add_ref(in_constraint: *mut KeelConstraint) {
    Constraint::add_ref(in_constraint as *const Constraint);
}

#[no_mangle]
pub unsafe extern "C" fn keel_constraint_release(in_constraint: *mut KeelConstraint) {
    Constraint::release(in_constraint as *const Constraint);
}

#[no_mangle]
pub unsafe extern "C" fn keel_constraint_get_ref_count(
    in_constraint: *const KeelConstraint,
) -> u32 {
    Constraint::ref_count(in_constraint as *const Constraint)
}

#[no_mangle]
pub unsafe extern "C" fn keel_constraint_get_type(
    in_constraint: *const KeelConstraint,
) -> KeelConstraintType {
    constraint_ref(in_constraint).constraint_type as KeelConstraintType
}

#[no_mangle]
pub unsafe extern "C" fn keel_constraint_get_sub_type(
    in_constraint: *const KeelConstraint,
) -> KeelConstraintSubType {
    constraint_ref(in_constraint).sub_type as KeelConstraintSubType
}

#[no_mangle]
pub unsafe extern "C" fn keel_constraint_get_user_data(
    in_constraint: *const KeelConstraint,
) -> u64 {
    constraint_ref(in_constraint).user_data
}

#[no_mangle]
pub unsafe extern "C" fn keel_constraint_set_user_data(
    in_constraint: *mut KeelConstraint,
    in_user_data: u64,
) {
    constraint_mut(in_constraint).user_data = in_user_data;
}
