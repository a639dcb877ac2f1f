//! Character controllers: a rigid-body-backed `Character` and a
//! non-physical `CharacterVirtual` that moves itself and probes the world.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Quat, Vec3};

use crate::core::alloc::{handle_alloc, handle_free};
use crate::core::body::{Activation, Body, BodyCreationSettings, MotionType};
use crate::core::id::{BodyId, ObjectLayer, SubShapeId};
use crate::core::shape::{Shape, ShapeRef};
use crate::math::{rvec3_from_vec3, F32x4, RVec3, RealX4};
use crate::system::query::{RayCast, RayCastResult};
use crate::system::PhysicsSystem;

/// Contact state of a character with respect to the ground.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterGroundState {
    OnGround = 0,
    OnSteepGround = 1,
    NotSupported = 2,
    InAir = 3,
}

/// Shared settings head of both character families. Layout-stable; the
/// leading reference count takes the place the original reserved for its
/// object header.
#[repr(C)]
#[derive(Debug)]
pub struct CharacterBaseSettings {
    pub(crate) ref_count: AtomicU32,
    /// Up direction; fourth lane ignored.
    pub up: F32x4,
    /// Plane (normal, constant) below which contacts can support the
    /// character.
    pub supporting_volume: F32x4,
    pub max_slope_angle: f32,
    pub shape: *const Shape,
}

impl CharacterBaseSettings {
    fn new() -> Self {
        Self {
            ref_count: AtomicU32::new(1),
            up: F32x4::from_vec3(Vec3::Y),
            supporting_volume: F32x4([0.0, 1.0, 0.0, -1.0e10]),
            max_slope_angle: 50.0_f32.to_radians(),
            shape: std::ptr::null(),
        }
    }
}

/// Settings for the rigid-body-backed character.
#[repr(C)]
#[derive(Debug)]
pub struct CharacterSettings {
    pub base: CharacterBaseSettings,
    pub layer: ObjectLayer,
    pub mass: f32,
    pub friction: f32,
    pub gravity_factor: f32,
}

impl Default for CharacterSettings {
    fn default() -> Self {
        Self {
            base: CharacterBaseSettings::new(),
            layer: 0,
            mass: 80.0,
            friction: 0.2,
            gravity_factor: 1.0,
        }
    }
}

impl CharacterSettings {
    /// # Safety
    /// `ptr` must point at live settings.
    pub unsafe fn add_ref(ptr: *const CharacterSettings) {
        debug_assert!(!ptr.is_null());
        (*ptr).base.ref_count.fetch_add(1, Ordering::Relaxed);
    }

    /// # Safety
    /// `ptr` must point at live settings with a reference owed by the caller.
    pub unsafe fn release(ptr: *const CharacterSettings) {
        debug_assert!(!ptr.is_null());
        if (*ptr).base.ref_count.fetch_sub(1, Ordering::AcqRel) == 1 {
            handle_free(ptr as *mut CharacterSettings);
        }
    }
}

/// Settings for the non-physical character.
#[repr(C)]
#[derive(Debug)]
pub struct CharacterVirtualSettings {
    pub base: CharacterBaseSettings,
    pub mass: f32,
    pub max_strength: f32,
    pub shape_offset: F32x4,
    pub back_face_mode: u8,
    pub predictive_contact_distance: f32,
    pub max_collision_iterations: u32,
    pub max_constraint_iterations: u32,
    pub min_time_remaining: f32,
    pub collision_tolerance: f32,
    pub character_padding: f32,
    pub max_num_hits: u32,
    pub hit_reduction_cos_max_angle: f32,
    pub penetration_recovery_speed: f32,
}

impl Default for CharacterVirtualSettings {
    fn default() -> Self {
        Self {
            base: CharacterBaseSettings::new(),
            mass: 70.0,
            max_strength: 100.0,
            shape_offset: F32x4::ZERO,
            back_face_mode: 0,
            predictive_contact_distance: 0.1,
            max_collision_iterations: 5,
            max_constraint_iterations: 15,
            min_time_remaining: 1.0e-4,
            collision_tolerance: 1.0e-3,
            character_padding: 0.02,
            max_num_hits: 256,
            hit_reduction_cos_max_angle: 0.999,
            penetration_recovery_speed: 1.0,
        }
    }
}

impl CharacterVirtualSettings {
    /// # Safety
    /// `ptr` must point at live settings with a reference owed by the caller.
    pub unsafe fn release(ptr: *const CharacterVirtualSettings) {
        debug_assert!(!ptr.is_null());
        if (*ptr).base.ref_count.fetch_sub(1, Ordering::AcqRel) == 1 {
            handle_free(ptr as *mut CharacterVirtualSettings);
        }
    }
}

/// Listener settings a character-contact callback may rewrite.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CharacterContactSettings {
    pub can_push_character: bool,
    pub can_receive_impulses: bool,
}

impl Default for CharacterContactSettings {
    fn default() -> Self {
        Self {
            can_push_character: true,
            can_receive_impulses: true,
        }
    }
}

/// Receives `CharacterVirtual` contact notifications.
pub trait CharacterContactEvents {
    fn on_adjust_body_velocity(
        &self,
        character: &CharacterVirtual,
        body: &Body,
        linear_velocity: Vec3,
        angular_velocity: Vec3,
    );

    fn on_contact_validate(
        &self,
        character: &CharacterVirtual,
        body: &Body,
        sub_shape_id: SubShapeId,
    ) -> bool;

    #[allow(clippy::too_many_arguments)]
    fn on_contact_added(
        &self,
        character: &CharacterVirtual,
        body: &Body,
        sub_shape_id: SubShapeId,
        contact_position: RVec3,
        contact_normal: Vec3,
        settings: &mut CharacterContactSettings,
    );

    #[allow(clippy::too_many_arguments)]
    fn on_contact_solve(
        &self,
        character: &CharacterVirtual,
        body: &Body,
        sub_shape_id: SubShapeId,
        contact_position: RVec3,
        contact_normal: Vec3,
        contact_velocity: Vec3,
        character_velocity: Vec3,
    ) -> Vec3;
}

/// Rigid-body-backed character: a thin wrapper keeping a body in the system.
pub struct Character {
    system: *mut PhysicsSystem,
    pub body_id: BodyId,
    pub up: Vec3,
    pub max_slope_angle: f32,
    pub layer: ObjectLayer,
    pub user_data: u64,
}

unsafe impl Send for Character {}

impl Character {
    /// Creates the backing body (not yet added to the system). Null on
    /// failure.
    pub fn create(
        settings: &CharacterSettings,
        position: RVec3,
        rotation: Quat,
        user_data: u64,
        system: *mut PhysicsSystem,
    ) -> *mut Character {
        debug_assert!(!system.is_null());
        if settings.base.shape.is_null() {
            log::warn!("character settings without a shape");
            return std::ptr::null_mut();
        }
        let mut body_settings = BodyCreationSettings::new(
            settings.base.shape,
            position,
            rotation,
            MotionType::Dynamic,
            settings.layer,
        );
        body_settings.friction = settings.friction;
        body_settings.gravity_factor = settings.gravity_factor;
        body_settings.user_data = user_data;
        body_settings.allow_dynamic_or_kinematic = true;
        body_settings.override_mass_properties =
            crate::core::body::OverrideMassProperties::CalcInertia;
        body_settings.mass_properties_override.mass = settings.mass;

        let body = unsafe { (*(*system).body_interface()).create_body(&body_settings) };
        if body.is_null() {
            return std::ptr::null_mut();
        }
        handle_alloc(Character {
            system,
            body_id: unsafe { (*body).id },
            up: settings.base.up.to_vec3(),
            max_slope_angle: settings.base.max_slope_angle,
            layer: settings.layer,
            user_data,
        })
    }

    /// # Safety
    /// `ptr` must come from [`Character::create`] and not be used again.
    pub unsafe fn destroy(ptr: *mut Character) {
        if ptr.is_null() {
            return;
        }
        let character = &*ptr;
        let iface = &*(*character.system).body_interface();
        if iface.is_added(character.body_id) {
            iface.remove_body(character.body_id);
        }
        iface.destroy_body(character.body_id);
        handle_free(ptr);
    }

    fn interface(&self, lock_bodies: bool) -> &crate::system::BodyInterface {
        unsafe {
            let system = &mut *self.system;
            if lock_bodies {
                &*system.body_interface()
            } else {
                &*system.body_interface_nolock()
            }
        }
    }

    pub fn add_to_physics_system(&self, activation: Activation, lock_bodies: bool) {
        self.interface(lock_bodies).add_body(self.body_id, activation);
    }

    pub fn remove_from_physics_system(&self, lock_bodies: bool) {
        self.interface(lock_bodies).remove_body(self.body_id);
    }

    pub fn position(&self) -> RVec3 {
        self.interface(true).get_position(self.body_id)
    }

    pub fn set_position(&self, position: RVec3) {
        self.interface(true)
            .set_position(self.body_id, position, Activation::DontActivate);
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.interface(true).get_linear_velocity(self.body_id)
    }

    pub fn set_linear_velocity(&self, velocity: Vec3) {
        self.interface(true).set_linear_velocity(self.body_id, velocity);
    }
}

/// Non-physical character: carries its own pose and velocity, probes the
/// world for support, and never enters the body manager.
pub struct CharacterVirtual {
    system: *const PhysicsSystem,
    pub position: RealX4,
    pub rotation: F32x4,
    pub linear_velocity: F32x4,
    pub up: Vec3,
    pub max_slope_angle: f32,
    pub mass: f32,
    pub character_padding: f32,
    pub predictive_contact_distance: f32,
    shape: ShapeRef,
    ground_state: CharacterGroundState,
    ground_velocity: Vec3,
    ground_normal: Vec3,
    ground_body: BodyId,
    listener: Option<Box<dyn CharacterContactEvents>>,
    listener_raw: usize,
}

unsafe impl Send for CharacterVirtual {}

impl CharacterVirtual {
    pub fn create(
        settings: &CharacterVirtualSettings,
        position: RVec3,
        rotation: Quat,
        system: *const PhysicsSystem,
    ) -> *mut CharacterVirtual {
        debug_assert!(!system.is_null());
        if settings.base.shape.is_null() {
            log::warn!("character virtual settings without a shape");
            return std::ptr::null_mut();
        }
        unsafe { Shape::add_ref(settings.base.shape) };
        handle_alloc(CharacterVirtual {
            system,
            position: RealX4::from_rvec3(position),
            rotation: F32x4::from_quat(rotation),
            linear_velocity: F32x4::ZERO,
            up: settings.base.up.to_vec3(),
            max_slope_angle: settings.base.max_slope_angle,
            mass: settings.mass,
            character_padding: settings.character_padding,
            predictive_contact_distance: settings.predictive_contact_distance,
            shape: unsafe { ShapeRef::from_raw(settings.base.shape) },
            ground_state: CharacterGroundState::InAir,
            ground_velocity: Vec3::ZERO,
            ground_normal: Vec3::ZERO,
            ground_body: BodyId::INVALID,
            listener: None,
            listener_raw: 0,
        })
    }

    /// # Safety
    /// `ptr` must come from [`CharacterVirtual::create`] and not be used
    /// again.
    pub unsafe fn destroy(ptr: *mut CharacterVirtual) {
        handle_free(ptr);
    }

    pub fn set_listener(&mut self, listener: Option<Box<dyn CharacterContactEvents>>, raw: usize) {
        self.listener = listener;
        self.listener_raw = if self.listener.is_some() { raw } else { 0 };
    }

    pub fn listener_raw(&self) -> usize {
        self.listener_raw
    }

    pub fn ground_state(&self) -> CharacterGroundState {
        self.ground_state
    }

    pub fn ground_velocity(&self) -> Vec3 {
        self.ground_velocity
    }

    pub fn linear_velocity_vec(&self) -> Vec3 {
        self.linear_velocity.to_vec3()
    }

    /// Integrates the character by `dt` and refreshes ground contact.
    pub fn update(&mut self, dt: f32, gravity: Vec3) {
        let mut velocity = self.linear_velocity.to_vec3() + gravity * dt;
        let position = self.position.to_rvec3() + rvec3_from_vec3(velocity * dt);

        self.probe_ground(position);
        if self.ground_state == CharacterGroundState::OnGround {
            // Kill the velocity component into the ground.
            let into_ground = velocity.dot(self.ground_normal);
            if into_ground < 0.0 {
                velocity -= self.ground_normal * into_ground;
            }
        }

        self.linear_velocity = F32x4::from_vec3(velocity);
        self.position = RealX4::from_rvec3(position);
    }

    /// Casts down along `-up` from the shape bottom to classify support.
    fn probe_ground(&mut self, position: RVec3) {
        let system = unsafe { &*self.system };
        let bottom_offset = -self.shape.get().local_bounds.min.y;
        let probe_len = bottom_offset + self.character_padding + self.predictive_contact_distance;
        let ray = RayCast {
            origin: RealX4::from_rvec3(position),
            direction: F32x4::from_vec3(-self.up * probe_len),
        };
        let mut hit = RayCastResult::default();
        let query = unsafe { &*system.narrow_phase_query() };
        let found = query.cast_ray(&ray, &mut hit, None, None, None);

        if !found {
            self.ground_state = CharacterGroundState::InAir;
            self.ground_velocity = Vec3::ZERO;
            self.ground_normal = Vec3::ZERO;
            self.ground_body = BodyId::INVALID;
            return;
        }

        let hit_point = position + rvec3_from_vec3(-self.up * (probe_len * hit.fraction));
        let Some(body) = system.body_manager().get_body(hit.body_id) else {
            self.ground_state = CharacterGroundState::InAir;
            return;
        };
        let normal = body.world_space_surface_normal(hit.sub_shape_id, hit_point);
        let slope_cos = normal.dot(self.up);
        self.ground_body = hit.body_id;
        self.ground_normal = normal;
        self.ground_state = if slope_cos >= self.max_slope_angle.cos() {
            CharacterGroundState::OnGround
        } else if slope_cos > 0.0 {
            CharacterGroundState::OnSteepGround
        } else {
            CharacterGroundState::NotSupported
        };

        if let Some(listener) = &self.listener {
            let mut settings = CharacterContactSettings::default();
            if listener.on_contact_validate(self, body, hit.sub_shape_id) {
                listener.on_contact_added(
                    self,
                    body,
                    hit.sub_shape_id,
                    hit_point,
                    normal,
                    &mut settings,
                );
            }
        }
    }

    /// Re-reads the velocity of whatever the character stands on.
    pub fn update_ground_velocity(&mut self) {
        let system = unsafe { &*self.system };
        self.ground_velocity = system
            .body_manager()
            .get_body(self.ground_body)
            .map(|body| {
                let rel = -self.up * (-self.shape.get().local_bounds.min.y);
                body.point_velocity(self.position.to_rvec3() + rvec3_from_vec3(rel))
            })
            .unwrap_or(Vec3::ZERO);
    }
}
