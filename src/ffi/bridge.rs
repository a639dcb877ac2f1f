//! Adapters from C callback tables to the core's extension-point traits.
//!
//! Each adapter copies its table by value at construction and forwards trait
//! calls into the registered function pointers. Missing pointers answer with
//! safe defaults: layer mapping reports zero layers, collision filters fail
//! closed, contact validation accepts. An adapter is owned by the system (or
//! character) it was installed on and lives exactly as long as it does.

use std::os::raw::c_void;

use glam::Vec3;

use crate::character::{CharacterContactEvents, CharacterContactSettings, CharacterVirtual};
use crate::core::body::Body;
use crate::core::contact::{
    CollideShapeResult, ContactEvents, ContactManifold, ContactSettings, ValidateResult,
};
use crate::core::filter::{
    ActivationEvents, BroadPhaseLayerMap, LayerPairFilter, ObjectVsBroadPhaseFilter, StepEvents,
};
use crate::core::id::{BodyId, BroadPhaseLayer, ObjectLayer, SubShapeId, SubShapeIdPair};
use crate::ffi::types::*;
use crate::math::{Real, RVec3};

#[inline]
fn user_data_ptr(slot: Option<std::ptr::NonNull<c_void>>) -> *mut c_void {
    slot.map_or(std::ptr::null_mut(), |p| p.as_ptr())
}

pub(crate) struct BroadPhaseLayerBridge {
    vtable: KeelBroadPhaseLayerInterfaceVTable,
}

unsafe impl Send for BroadPhaseLayerBridge {}
unsafe impl Sync for BroadPhaseLayerBridge {}

impl BroadPhaseLayerBridge {
    pub fn new(vtable: KeelBroadPhaseLayerInterfaceVTable) -> Self {
        Self { vtable }
    }
}

impl BroadPhaseLayerMap for BroadPhaseLayerBridge {
    fn num_broad_phase_layers(&self) -> u32 {
        match self.vtable.get_num_broad_phase_layers {
            Some(f) => unsafe { f() },
            None => 0,
        }
    }

    fn broad_phase_layer(&self, layer: ObjectLayer) -> BroadPhaseLayer {
        match self.vtable.get_broad_phase_layer {
            Some(f) => unsafe { f(layer) },
            None => 0,
        }
    }
}

pub(crate) struct PairFilterBridge {
    vtable: KeelObjectLayerPairFilterVTable,
}

unsafe impl Send for PairFilterBridge {}
unsafe impl Sync for PairFilterBridge {}

impl PairFilterBridge {
    pub fn new(vtable: KeelObjectLayerPairFilterVTable) -> Self {
        Self { vtable }
    }
}

impl LayerPairFilter for PairFilterBridge {
    fn should_collide(&self, layer1: ObjectLayer, layer2: ObjectLayer) -> bool {
        // No predicate registered: nothing collides.
        match self.vtable.should_collide {
            Some(f) => unsafe { f(layer1, layer2) },
            None => false,
        }
    }
}

pub(crate) struct ObjectVsBroadPhaseBridge {
    vtable: KeelObjectVsBroadPhaseLayerFilterVTable,
}

unsafe impl Send for ObjectVsBroadPhaseBridge {}
unsafe impl Sync for ObjectVsBroadPhaseBridge {}

impl ObjectVsBroadPhaseBridge {
    pub fn new(vtable: KeelObjectVsBroadPhaseLayerFilterVTable) -> Self {
        Self { vtable }
    }
}

impl ObjectVsBroadPhaseFilter for ObjectVsBroadPhaseBridge {
    fn should_collide(&self, layer: ObjectLayer, broad_phase_layer: BroadPhaseLayer) -> bool {
        match self.vtable.should_collide {
            Some(f) => unsafe { f(layer, broad_phase_layer) },
            None => false,
        }
    }
}

pub(crate) struct ContactListenerBridge {
    vtable: KeelContactListenerVTable,
}

unsafe impl Send for ContactListenerBridge {}
unsafe impl Sync for ContactListenerBridge {}

impl ContactListenerBridge {
    pub fn new(vtable: KeelContactListenerVTable) -> Self {
        Self { vtable }
    }
}

impl ContactEvents for ContactListenerBridge {
    fn on_contact_validate(
        &self,
        body1: &Body,
        body2: &Body,
        base_offset: RVec3,
        collision_result: &CollideShapeResult,
    ) -> ValidateResult {
        let Some(f) = self.vtable.on_contact_validate else {
            return ValidateResult::AcceptAllContacts;
        };
        let offset: [Real; 3] = [base_offset.x, base_offset.y, base_offset.z];
        let verdict = unsafe {
            f(
                body1 as *const Body as *const KeelBody,
                body2 as *const Body as *const KeelBody,
                offset.as_ptr(),
                collision_result as *const CollideShapeResult as *const KeelCollideShapeResult,
            )
        };
        match verdict {
            KEEL_VALIDATE_RESULT_ACCEPT_CONTACT => ValidateResult::AcceptContact,
            KEEL_VALIDATE_RESULT_REJECT_CONTACT => ValidateResult::RejectContact,
            KEEL_VALIDATE_RESULT_REJECT_ALL_CONTACTS => ValidateResult::RejectAllContacts,
            _ => ValidateResult::AcceptAllContacts,
        }
    }

    fn on_contact_added(
        &self,
        body1: &Body,
        body2: &Body,
        manifold: &ContactManifold,
        settings: &mut ContactSettings,
    ) {
        if let Some(f) = self.vtable.on_contact_added {
            unsafe {
                f(
                    body1 as *const Body as *const KeelBody,
                    body2 as *const Body as *const KeelBody,
                    manifold as *const ContactManifold as *const KeelContactManifold,
                    // Live pointer: callback mutations land in the record.
                    settings as *mut ContactSettings as *mut KeelContactSettings,
                );
            }
        }
    }

    fn on_contact_persisted(
        &self,
        body1: &Body,
        body2: &Body,
        manifold: &ContactManifold,
        settings: &mut ContactSettings,
    ) {
        if let Some(f) = self.vtable.on_contact_persisted {
            unsafe {
                f(
                    body1 as *const Body as *const KeelBody,
                    body2 as *const Body as *const KeelBody,
                    manifold as *const ContactManifold as *const KeelContactManifold,
                    settings as *mut ContactSettings as *mut KeelContactSettings,
                );
            }
        }
    }

    fn on_contact_removed(&self, sub_shape_pair: &SubShapeIdPair) {
        if let Some(f) = self.vtable.on_contact_removed {
            unsafe {
                f(sub_shape_pair as *const SubShapeIdPair as *const KeelSubShapeIdPair);
            }
        }
    }
}

pub(crate) struct ActivationListenerBridge {
    vtable: KeelBodyActivationListenerVTable,
}

unsafe impl Send for ActivationListenerBridge {}
unsafe impl Sync for ActivationListenerBridge {}

impl ActivationListenerBridge {
    pub fn new(vtable: KeelBodyActivationListenerVTable) -> Self {
        Self { vtable }
    }
}

impl ActivationEvents for ActivationListenerBridge {
    fn on_body_activated(&self, body_id: BodyId, user_data: u64) {
        if let Some(f) = self.vtable.on_body_activated {
            let raw = body_id.0;
            unsafe { f(user_data_ptr(self.vtable.user_data), &raw, user_data) };
        }
    }

    fn on_body_deactivated(&self, body_id: BodyId, user_data: u64) {
        if let Some(f) = self.vtable.on_body_deactivated {
            let raw = body_id.0;
            unsafe { f(user_data_ptr(self.vtable.user_data), &raw, user_data) };
        }
    }
}

pub(crate) struct StepListenerBridge {
    vtable: KeelPhysicsStepListenerVTable,
    system: *mut KeelPhysicsSystem,
}

unsafe impl Send for StepListenerBridge {}
unsafe impl Sync for StepListenerBridge {}

impl StepListenerBridge {
    pub fn new(vtable: KeelPhysicsStepListenerVTable, system: *mut KeelPhysicsSystem) -> Self {
        Self { vtable, system }
    }
}

impl StepEvents for StepListenerBridge {
    fn on_step(&self, delta_time: f32) {
        if let Some(f) = self.vtable.on_step {
            unsafe { f(user_data_ptr(self.vtable.user_data), delta_time, self.system) };
        }
    }
}

// --- query-time filter bridges ---------------------------------------------

pub(crate) struct BroadPhaseLayerFilterBridge {
    vtable: KeelBroadPhaseLayerFilterVTable,
}

impl BroadPhaseLayerFilterBridge {
    pub fn new(vtable: KeelBroadPhaseLayerFilterVTable) -> Self {
        Self { vtable }
    }
}

impl crate::system::query::BroadPhaseLayerQueryFilter for BroadPhaseLayerFilterBridge {
    fn should_collide(&self, layer: BroadPhaseLayer) -> bool {
        match self.vtable.should_collide {
            Some(f) => unsafe { f(user_data_ptr(self.vtable.user_data), layer) },
            None => false,
        }
    }
}

pub(crate) struct ObjectLayerFilterBridge {
    vtable: KeelObjectLayerFilterVTable,
}

impl ObjectLayerFilterBridge {
    pub fn new(vtable: KeelObjectLayerFilterVTable) -> Self {
        Self { vtable }
    }
}

impl crate::system::query::ObjectLayerQueryFilter for ObjectLayerFilterBridge {
    fn should_collide(&self, layer: ObjectLayer) -> bool {
        match self.vtable.should_collide {
            Some(f) => unsafe { f(user_data_ptr(self.vtable.user_data), layer) },
            None => false,
        }
    }
}

pub(crate) struct BodyFilterBridge {
    vtable: KeelBodyFilterVTable,
}

impl BodyFilterBridge {
    pub fn new(vtable: KeelBodyFilterVTable) -> Self {
        Self { vtable }
    }
}

impl crate::system::query::BodyQueryFilter for BodyFilterBridge {
    fn should_collide(&self, id: BodyId) -> bool {
        match self.vtable.should_collide {
            Some(f) => {
                let raw = id.0;
                unsafe { f(user_data_ptr(self.vtable.user_data), &raw) }
            }
            None => false,
        }
    }

    fn should_collide_locked(&self, body: &Body) -> bool {
        match self.vtable.should_collide_locked {
            Some(f) => unsafe {
                f(
                    user_data_ptr(self.vtable.user_data),
                    body as *const Body as *const KeelBody,
                )
            },
            None => false,
        }
    }
}

// --- character contact bridge ----------------------------------------------

pub(crate) struct CharacterContactBridge {
    vtable: KeelCharacterContactListenerVTable,
}

unsafe impl Send for CharacterContactBridge {}
unsafe impl Sync for CharacterContactBridge {}

impl CharacterContactBridge {
    pub fn new(vtable: KeelCharacterContactListenerVTable) -> Self {
        Self { vtable }
    }
}

impl CharacterContactEvents for CharacterContactBridge {
    fn on_adjust_body_velocity(
        &self,
        character: &CharacterVirtual,
        body: &Body,
        linear_velocity: Vec3,
        angular_velocity: Vec3,
    ) {
        if let Some(f) = self.vtable.on_adjust_body_velocity {
            let mut linear = linear_velocity.to_array();
            let mut angular = angular_velocity.to_array();
            unsafe {
                f(
                    user_data_ptr(self.vtable.user_data),
                    character as *const CharacterVirtual as *const KeelCharacterVirtual,
                    body as *const Body as *const KeelBody,
                    linear.as_mut_ptr(),
                    angular.as_mut_ptr(),
                );
            }
        }
    }

    fn on_contact_validate(
        &self,
        character: &CharacterVirtual,
        body: &Body,
        sub_shape_id: SubShapeId,
    ) -> bool {
        match self.vtable.on_contact_validate {
            Some(f) => unsafe {
                f(
                    user_data_ptr(self.vtable.user_data),
                    character as *const CharacterVirtual as *const KeelCharacterVirtual,
                    body as *const Body as *const KeelBody,
                    &sub_shape_id,
                )
            },
            None => true,
        }
    }

    fn on_contact_added(
        &self,
        character: &CharacterVirtual,
        body: &Body,
        sub_shape_id: SubShapeId,
        contact_position: RVec3,
        contact_normal: Vec3,
        settings: &mut CharacterContactSettings,
    ) {
        if let Some(f) = self.vtable.on_contact_added {
            let position: [Real; 3] = [contact_position.x, contact_position.y, contact_position.z];
            let normal = contact_normal.to_array();
            unsafe {
                f(
                    user_data_ptr(self.vtable.user_data),
                    character as *const CharacterVirtual as *const KeelCharacterVirtual,
                    body as *const Body as *const KeelBody,
                    &sub_shape_id,
                    position.as_ptr(),
                    normal.as_ptr(),
                    settings as *mut CharacterContactSettings as *mut KeelCharacterContactSettings,
                );
            }
        }
    }

    fn on_contact_solve(
        &self,
        character: &CharacterVirtual,
        body: &Body,
        sub_shape_id: SubShapeId,
        contact_position: RVec3,
        contact_normal: Vec3,
        contact_velocity: Vec3,
        character_velocity: Vec3,
    ) -> Vec3 {
        match self.vtable.on_contact_solve {
            Some(f) => {
                let position: [Real; 3] =
                    [contact_position.x, contact_position.y, contact_position.z];
                let normal = contact_normal.to_array();
                let velocity = contact_velocity.to_array();
                let velocity_in = character_velocity.to_array();
                let mut velocity_out = velocity_in;
                unsafe {
                    f(
                        user_data_ptr(self.vtable.user_data),
                        character as *const CharacterVirtual as *const KeelCharacterVirtual,
                        body as *const Body as *const KeelBody,
                        &sub_shape_id,
                        position.as_ptr(),
                        normal.as_ptr(),
                        velocity.as_ptr(),
                        velocity_in.as_ptr(),
                        velocity_out.as_mut_ptr(),
                    );
                }
                Vec3::from_array(velocity_out)
            }
            None => character_velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_layer_interface_reports_zero_layers() {
        let bridge = BroadPhaseLayerBridge::new(KeelBroadPhaseLayerInterfaceVTable::default());
        assert_eq!(bridge.num_broad_phase_layers(), 0);
        assert_eq!(bridge.broad_phase_layer(3), 0);
    }

    #[test]
    fn empty_pair_filters_fail_closed() {
        let pair = PairFilterBridge::new(KeelObjectLayerPairFilterVTable::default());
        assert!(!pair.should_collide(0, 1));

        let versus = ObjectVsBroadPhaseBridge::new(KeelObjectVsBroadPhaseLayerFilterVTable::default());
        assert!(!versus.should_collide(0, 1));
    }

    unsafe extern "C" fn two_layers() -> u32 {
        2
    }

    #[test]
    fn registered_slots_are_forwarded() {
        let bridge = BroadPhaseLayerBridge::new(KeelBroadPhaseLayerInterfaceVTable {
            get_num_broad_phase_layers: Some(two_layers),
            get_broad_phase_layer: None,
        });
        assert_eq!(bridge.num_broad_phase_layers(), 2);
        assert_eq!(bridge.broad_phase_layer(1), 0);
    }
}
