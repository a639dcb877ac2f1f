//! Body CRUD and property access on behalf of boundary callers.
//!
//! All operations are one-shot, non-blocking forwards into the body manager
//! under the interface's own locking: structural calls serialize on the
//! system's structural mutex, per-body mutators take the body's lock shard.
//! The no-lock variant skips shard locking for callers that already hold
//! exclusion.

use glam::{Quat, Vec3};

use crate::core::alloc::{handle_alloc, handle_free};
use crate::core::body::{
    Activation, Body, BodyCreationSettings, MotionProperties, MotionType,
};
use crate::core::id::{BodyId, ObjectLayer};
use crate::math::RVec3;
use crate::system::PhysicsSystem;

pub struct BodyInterface {
    pub(crate) system: *mut PhysicsSystem,
    pub(crate) locking: bool,
}

unsafe impl Send for BodyInterface {}
unsafe impl Sync for BodyInterface {}

impl BodyInterface {
    #[inline]
    fn system(&self) -> &PhysicsSystem {
        unsafe { &*self.system }
    }

    #[inline]
    #[allow(clippy::mut_from_ref)]
    fn system_mut(&self) -> &mut PhysicsSystem {
        unsafe { &mut *self.system }
    }

    fn with_body_read<R>(&self, id: BodyId, f: impl FnOnce(&Body) -> R) -> Option<R> {
        let system = self.system();
        let shard = self.locking.then(|| system.lock_shard(id));
        if let Some(shard) = shard {
            shard.lock_shared();
        }
        let result = system
            .body_manager()
            .get_body_ptr(id)
            .map(|ptr| f(unsafe { &*ptr }));
        if let Some(shard) = shard {
            unsafe { shard.unlock_shared() };
        }
        result
    }

    fn with_body_write<R>(&self, id: BodyId, f: impl FnOnce(&mut Body) -> R) -> Option<R> {
        let system = self.system();
        let shard = self.locking.then(|| system.lock_shard(id));
        if let Some(shard) = shard {
            shard.lock_exclusive();
        }
        let result = system
            .body_manager()
            .get_body_ptr(id)
            .map(|ptr| f(unsafe { &mut *ptr }));
        if let Some(shard) = shard {
            unsafe { shard.unlock_exclusive() };
        }
        result
    }

    /// Creates a body from `settings` without adding it to the broad phase.
    /// Null on capacity or shape failure.
    pub fn create_body(&self, settings: &BodyCreationSettings) -> *mut Body {
        match self.system_mut().create_body_locked(settings) {
            Ok(body) => body,
            Err(err) => {
                log::warn!("create_body failed: {err}");
                std::ptr::null_mut()
            }
        }
    }

    /// Creates a body in the exact slot named by `id`.
    pub fn create_body_with_id(
        &self,
        id: BodyId,
        settings: &BodyCreationSettings,
    ) -> *mut Body {
        match self.system_mut().create_body_with_id_locked(id, settings) {
            Ok(body) => body,
            Err(err) => {
                log::warn!("create_body_with_id failed: {err}");
                std::ptr::null_mut()
            }
        }
    }

    /// Destroys a body. The body must not be added; remove it first.
    pub fn destroy_body(&self, id: BodyId) {
        self.system_mut().destroy_body_locked(id);
    }

    pub fn add_body(&self, id: BodyId, activation: Activation) {
        self.system_mut().add_body_locked(id, activation);
    }

    pub fn remove_body(&self, id: BodyId) {
        self.system_mut().remove_body_locked(id);
    }

    /// Create + add in one call; returns the id (invalid on failure).
    pub fn create_and_add_body(
        &self,
        settings: &BodyCreationSettings,
        activation: Activation,
    ) -> BodyId {
        let body = self.create_body(settings);
        if body.is_null() {
            return BodyId::INVALID;
        }
        let id = unsafe { (*body).id };
        self.add_body(id, activation);
        id
    }

    pub fn is_added(&self, id: BodyId) -> bool {
        self.with_body_read(id, |b| b.is_in_broad_phase())
            .unwrap_or(false)
    }

    pub fn activate_body(&self, id: BodyId) {
        self.system_mut().activate(id);
    }

    pub fn deactivate_body(&self, id: BodyId) {
        self.system_mut().deactivate(id);
    }

    pub fn is_active(&self, id: BodyId) -> bool {
        self.with_body_read(id, |b| b.is_active()).unwrap_or(false)
    }

    pub fn set_linear_velocity(&self, id: BodyId, velocity: Vec3) {
        self.with_body_write(id, |b| b.set_linear_velocity_clamped(velocity));
    }

    pub fn get_linear_velocity(&self, id: BodyId) -> Vec3 {
        self.with_body_read(id, |b| b.linear_velocity())
            .unwrap_or(Vec3::ZERO)
    }

    pub fn add_linear_velocity(&self, id: BodyId, velocity: Vec3) {
        self.with_body_write(id, |b| {
            let v = b.linear_velocity();
            b.set_linear_velocity_clamped(v + velocity);
        });
    }

    pub fn set_angular_velocity(&self, id: BodyId, velocity: Vec3) {
        self.with_body_write(id, |b| b.set_angular_velocity_clamped(velocity));
    }

    pub fn get_angular_velocity(&self, id: BodyId) -> Vec3 {
        self.with_body_read(id, |b| b.angular_velocity())
            .unwrap_or(Vec3::ZERO)
    }

    pub fn set_linear_and_angular_velocity(&self, id: BodyId, linear: Vec3, angular: Vec3) {
        self.with_body_write(id, |b| {
            b.set_linear_velocity_clamped(linear);
            b.set_angular_velocity_clamped(angular);
        });
    }

    pub fn get_linear_and_angular_velocity(&self, id: BodyId) -> (Vec3, Vec3) {
        self.with_body_read(id, |b| (b.linear_velocity(), b.angular_velocity()))
            .unwrap_or((Vec3::ZERO, Vec3::ZERO))
    }

    pub fn add_linear_and_angular_velocity(&self, id: BodyId, linear: Vec3, angular: Vec3) {
        self.with_body_write(id, |b| {
            let v = b.linear_velocity();
            let w = b.angular_velocity();
            b.set_linear_velocity_clamped(v + linear);
            b.set_angular_velocity_clamped(w + angular);
        });
    }

    pub fn get_point_velocity(&self, id: BodyId, point: RVec3) -> Vec3 {
        self.with_body_read(id, |b| b.point_velocity(point))
            .unwrap_or(Vec3::ZERO)
    }

    pub fn get_position(&self, id: BodyId) -> RVec3 {
        self.with_body_read(id, |b| b.get_position())
            .unwrap_or(RVec3::ZERO)
    }

    pub fn set_position(&self, id: BodyId, position: RVec3, activation: Activation) {
        self.with_body_write(id, |b| {
            let rotation = b.rotation();
            b.set_position_and_rotation(position, rotation);
        });
        if activation == Activation::Activate {
            self.activate_body(id);
        }
    }

    pub fn get_center_of_mass_position(&self, id: BodyId) -> RVec3 {
        self.with_body_read(id, |b| b.center_of_mass_position())
            .unwrap_or(RVec3::ZERO)
    }

    pub fn get_rotation(&self, id: BodyId) -> Quat {
        self.with_body_read(id, |b| b.rotation())
            .unwrap_or(Quat::IDENTITY)
    }

    pub fn set_rotation(&self, id: BodyId, rotation: Quat, activation: Activation) {
        self.with_body_write(id, |b| {
            let position = b.get_position();
            b.set_position_and_rotation(position, rotation);
        });
        if activation == Activation::Activate {
            self.activate_body(id);
        }
    }

    pub fn set_position_rotation_and_velocity(
        &self,
        id: BodyId,
        position: RVec3,
        rotation: Quat,
        linear: Vec3,
        angular: Vec3,
    ) {
        self.with_body_write(id, |b| {
            b.set_position_and_rotation(position, rotation);
            b.set_linear_velocity_clamped(linear);
            b.set_angular_velocity_clamped(angular);
        });
    }

    pub fn add_force(&self, id: BodyId, force: Vec3) {
        self.with_body_write(id, |b| b.add_force(force));
        self.activate_body(id);
    }

    pub fn add_force_at_position(&self, id: BodyId, force: Vec3, position: RVec3) {
        self.with_body_write(id, |b| b.add_force_at_position(force, position));
        self.activate_body(id);
    }

    pub fn add_torque(&self, id: BodyId, torque: Vec3) {
        self.with_body_write(id, |b| b.add_torque(torque));
        self.activate_body(id);
    }

    pub fn add_force_and_torque(&self, id: BodyId, force: Vec3, torque: Vec3) {
        self.with_body_write(id, |b| {
            b.add_force(force);
            b.add_torque(torque);
        });
        self.activate_body(id);
    }

    pub fn add_impulse(&self, id: BodyId, impulse: Vec3) {
        self.with_body_write(id, |b| b.add_impulse(impulse));
        self.activate_body(id);
    }

    pub fn add_impulse_at_position(&self, id: BodyId, impulse: Vec3, position: RVec3) {
        self.with_body_write(id, |b| b.add_impulse_at_position(impulse, position));
        self.activate_body(id);
    }

    pub fn add_angular_impulse(&self, id: BodyId, impulse: Vec3) {
        self.with_body_write(id, |b| b.add_angular_impulse(impulse));
        self.activate_body(id);
    }

    pub fn get_motion_type(&self, id: BodyId) -> MotionType {
        self.with_body_read(id, |b| b.motion_type)
            .unwrap_or(MotionType::Static)
    }

    /// Switches a body between static, kinematic, and dynamic, creating or
    /// dropping its motion properties as needed.
    pub fn set_motion_type(&self, id: BodyId, motion_type: MotionType, activation: Activation) {
        if motion_type == MotionType::Static {
            // Leave the active list while the motion state still exists.
            self.deactivate_body(id);
        }
        self.with_body_write(id, |b| {
            if b.motion_type == motion_type {
                return;
            }
            debug_assert!(
                b.motion_type == MotionType::Static || b.can_be_kinematic_or_dynamic() ||
                    motion_type == MotionType::Static,
                "body was not created with allow_dynamic_or_kinematic"
            );
            match motion_type {
                MotionType::Static => {
                    if !b.motion_properties.is_null() {
                        unsafe { handle_free(b.motion_properties) };
                        b.motion_properties = std::ptr::null_mut();
                    }
                }
                MotionType::Kinematic | MotionType::Dynamic => {
                    if b.motion_properties.is_null() {
                        let settings = BodyCreationSettings {
                            motion_type,
                            ..BodyCreationSettings::default()
                        };
                        let mass = settings.mass_properties(b.shape());
                        b.motion_properties =
                            handle_alloc(MotionProperties::new(&settings, mass));
                    }
                }
            }
            b.motion_type = motion_type;
            #[cfg(debug_assertions)]
            if let Some(mp) = b.motion_properties_mut() {
                mp.cached_motion_type = motion_type;
            }
        });
        if activation == Activation::Activate && motion_type != MotionType::Static {
            self.activate_body(id);
        }
    }

    pub fn get_object_layer(&self, id: BodyId) -> ObjectLayer {
        self.with_body_read(id, |b| b.object_layer).unwrap_or(0)
    }

    pub fn set_object_layer(&self, id: BodyId, layer: ObjectLayer) {
        let map = self.system().broad_phase_layer_map();
        self.with_body_write(id, |b| {
            b.object_layer = layer;
            b.broad_phase_layer = map.broad_phase_layer(layer);
        });
    }
}
