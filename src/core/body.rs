//! Bodies and their mutable dynamics state.
//!
//! `Body` and `MotionProperties` are the layout-stable native structs behind
//! the boundary's `KeelBody`/`KeelMotionProperties` views: a pointer to one is
//! reinterpreted as a pointer to the other with no transformation, so field
//! order, width, and alignment here are load-bearing.

use glam::{Mat3, Mat4, Quat, Vec3};

use crate::config;
use crate::core::filter::CollisionGroup;
use crate::core::id::{BodyId, BroadPhaseLayer, ObjectLayer, SubShapeId};
use crate::core::shape::{diagonal_inertia_mat, Shape, ShapeError, ShapeSettings};
use crate::math::{
    integrate_rotation, rvec3_from_vec3, vec3_from_rvec3, Aabb, F32x16, F32x4, RVec3, RealX4,
};

/// How (and whether) a body moves.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionType {
    #[default]
    Static = 0,
    Kinematic = 1,
    Dynamic = 2,
}

/// Collision quality for fast-moving bodies. Stored and reported; the
/// linear-cast path belongs to the wrapped solver, not this core.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionQuality {
    #[default]
    Discrete = 0,
    LinearCast = 1,
}

/// Whether adding a body should also wake it.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Activate = 0,
    DontActivate = 1,
}

/// Rigid versus soft body classification; this core only creates rigid
/// bodies.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Rigid = 0,
    Soft = 1,
}

/// How body-creation settings derive mass and inertia.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrideMassProperties {
    #[default]
    CalcMassInertia = 0,
    CalcInertia = 1,
    MassInertiaProvided = 2,
}

/// Bitmask of degrees of freedom a dynamic body may use.
pub type AllowedDofs = u8;

pub const ALLOWED_DOFS_TRANSLATION_X: AllowedDofs = 0b000001;
pub const ALLOWED_DOFS_TRANSLATION_Y: AllowedDofs = 0b000010;
pub const ALLOWED_DOFS_TRANSLATION_Z: AllowedDofs = 0b000100;
pub const ALLOWED_DOFS_ROTATION_X: AllowedDofs = 0b001000;
pub const ALLOWED_DOFS_ROTATION_Y: AllowedDofs = 0b010000;
pub const ALLOWED_DOFS_ROTATION_Z: AllowedDofs = 0b100000;
pub const ALLOWED_DOFS_ALL: AllowedDofs = 0b111111;
pub const ALLOWED_DOFS_PLANE_2D: AllowedDofs =
    ALLOWED_DOFS_TRANSLATION_X | ALLOWED_DOFS_TRANSLATION_Y | ALLOWED_DOFS_ROTATION_Z;

/// Mass and local-space inertia tensor (column-major 4x4, 3x3 block used).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MassProperties {
    pub mass: f32,
    pub inertia: F32x16,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self {
            mass: 0.0,
            inertia: F32x16::IDENTITY,
        }
    }
}

impl MassProperties {
    pub fn from_diagonal(mass: f32, diagonal: Vec3) -> Self {
        Self {
            mass,
            inertia: diagonal_inertia_mat(diagonal),
        }
    }

    /// Rescales for a non-uniformly scaled copy of the same geometry.
    pub fn scale(&mut self, scale: Vec3) {
        let volume_ratio = (scale.x * scale.y * scale.z).abs();
        let old_mass = self.mass;
        self.mass *= volume_ratio;
        if old_mass > 0.0 {
            let ratio = self.mass / old_mass;
            let s2 = scale * scale;
            let m = self.inertia.to_mat4();
            let d = Vec3::new(m.col(0).x, m.col(1).y, m.col(2).z);
            // Inertia of a scaled solid tracks mass times the squared
            // cross-axis extents.
            let nd = Vec3::new(
                d.x * ratio * 0.5 * (s2.y + s2.z),
                d.y * ratio * 0.5 * (s2.x + s2.z),
                d.z * ratio * 0.5 * (s2.x + s2.y),
            );
            self.inertia = diagonal_inertia_mat(nd);
        }
    }

    /// Replaces the mass, rescaling inertia to keep the same mass
    /// distribution.
    pub fn set_mass_keep_shape(&mut self, mass: f32) {
        if self.mass > 0.0 {
            let ratio = mass / self.mass;
            let m = self.inertia.to_mat4();
            self.inertia = F32x16::from_mat4(Mat4::from_cols(
                m.col(0) * ratio,
                m.col(1) * ratio,
                m.col(2) * ratio,
                glam::Vec4::W,
            ));
        }
        self.mass = mass;
    }
}

/// Per-body dynamics state, present only on movable bodies. Mutated by the
/// update; readable and writable through the boundary between updates.
#[repr(C)]
#[derive(Debug)]
pub struct MotionProperties {
    pub linear_velocity: F32x4,
    pub angular_velocity: F32x4,
    pub inv_inertia_diagonal: F32x4,
    pub inertia_rotation: F32x4,

    pub force: [f32; 3],
    pub torque: [f32; 3],
    pub inv_mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub max_linear_velocity: f32,
    pub max_angular_velocity: f32,
    pub gravity_factor: f32,
    pub index_in_active_bodies: u32,
    pub island_index: u32,

    pub motion_quality: MotionQuality,
    pub allow_sleeping: bool,

    #[cfg(feature = "double-precision")]
    pub reserved: [u8; 76],
    #[cfg(not(feature = "double-precision"))]
    pub reserved: [u8; 52],

    #[cfg(debug_assertions)]
    pub cached_motion_type: MotionType,
}

/// Marker for "not on the active list".
pub const NOT_ACTIVE: u32 = u32::MAX;

impl MotionProperties {
    pub fn new(settings: &BodyCreationSettings, mass: MassProperties) -> Self {
        let inv_mass = if mass.mass > 0.0 { 1.0 / mass.mass } else { 0.0 };
        let m = mass.inertia.to_mat4();
        let diag = Vec3::new(m.col(0).x, m.col(1).y, m.col(2).z);
        let inv_diag = Vec3::new(
            if diag.x > 0.0 { 1.0 / diag.x } else { 0.0 },
            if diag.y > 0.0 { 1.0 / diag.y } else { 0.0 },
            if diag.z > 0.0 { 1.0 / diag.z } else { 0.0 },
        );
        Self {
            linear_velocity: settings.linear_velocity,
            angular_velocity: settings.angular_velocity,
            inv_inertia_diagonal: F32x4::from_vec3(inv_diag),
            inertia_rotation: F32x4::from_quat(Quat::IDENTITY),
            force: [0.0; 3],
            torque: [0.0; 3],
            inv_mass,
            linear_damping: settings.linear_damping,
            angular_damping: settings.angular_damping,
            max_linear_velocity: settings.max_linear_velocity,
            max_angular_velocity: settings.max_angular_velocity,
            gravity_factor: settings.gravity_factor,
            index_in_active_bodies: NOT_ACTIVE,
            island_index: NOT_ACTIVE,
            motion_quality: settings.motion_quality,
            allow_sleeping: settings.allow_sleeping,
            #[cfg(feature = "double-precision")]
            reserved: [0; 76],
            #[cfg(not(feature = "double-precision"))]
            reserved: [0; 52],
            #[cfg(debug_assertions)]
            cached_motion_type: settings.motion_type,
        }
    }

    #[inline]
    pub fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity.to_vec3()
    }

    #[inline]
    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity.to_vec3()
    }

    pub fn set_linear_velocity(&mut self, v: Vec3) {
        self.linear_velocity = F32x4::from_vec3(v);
    }

    pub fn set_linear_velocity_clamped(&mut self, v: Vec3) {
        self.linear_velocity = F32x4::from_vec3(v.clamp_length_max(self.max_linear_velocity));
    }

    pub fn set_angular_velocity(&mut self, v: Vec3) {
        self.angular_velocity = F32x4::from_vec3(v);
    }

    pub fn set_angular_velocity_clamped(&mut self, v: Vec3) {
        self.angular_velocity = F32x4::from_vec3(v.clamp_length_max(self.max_angular_velocity));
    }

    pub fn clamp_linear_velocity(&mut self) {
        let v = self.linear_velocity();
        self.set_linear_velocity(v.clamp_length_max(self.max_linear_velocity));
    }

    pub fn clamp_angular_velocity(&mut self) {
        let v = self.angular_velocity();
        self.set_angular_velocity(v.clamp_length_max(self.max_angular_velocity));
    }

    /// Sets velocities so the body arrives at `delta` over `dt`.
    pub fn move_kinematic(&mut self, delta_position: Vec3, delta_rotation: Quat, dt: f32) {
        debug_assert!(dt > 0.0);
        let inv_dt = 1.0 / dt;
        self.set_linear_velocity(delta_position * inv_dt);
        let (axis, angle) = delta_rotation.to_axis_angle();
        self.set_angular_velocity(axis * (angle * inv_dt));
    }

    pub fn set_mass_properties(&mut self, mass: &MassProperties) {
        self.inv_mass = if mass.mass > 0.0 { 1.0 / mass.mass } else { 0.0 };
        let m = mass.inertia.to_mat4();
        let diag = Vec3::new(m.col(0).x, m.col(1).y, m.col(2).z);
        self.inv_inertia_diagonal = F32x4::from_vec3(Vec3::new(
            if diag.x > 0.0 { 1.0 / diag.x } else { 0.0 },
            if diag.y > 0.0 { 1.0 / diag.y } else { 0.0 },
            if diag.z > 0.0 { 1.0 / diag.z } else { 0.0 },
        ));
        self.inertia_rotation = F32x4::from_quat(Quat::IDENTITY);
    }

    pub fn set_inverse_inertia(&mut self, diagonal: Vec3, rotation: Quat) {
        self.inv_inertia_diagonal = F32x4::from_vec3(diagonal);
        self.inertia_rotation = F32x4::from_quat(rotation);
    }

    /// Inverse inertia tensor in body local space.
    pub fn local_space_inverse_inertia(&self) -> Mat4 {
        let r = Mat4::from_quat(self.inertia_rotation.to_quat());
        let d = Mat4::from_scale(self.inv_inertia_diagonal.to_vec3());
        r * d * r.transpose()
    }

    /// Inverse inertia tensor for a body at orientation `rotation`.
    pub fn inverse_inertia_for_rotation(&self, rotation: Mat4) -> Mat4 {
        rotation * self.local_space_inverse_inertia() * rotation.transpose()
    }

    pub fn multiply_world_inverse_inertia_by_vector(&self, body_rotation: Quat, v: Vec3) -> Vec3 {
        let world = self.inverse_inertia_for_rotation(Mat4::from_quat(body_rotation));
        world.transform_vector3(v)
    }

    /// Velocity of a point given relative to the center of mass.
    pub fn point_velocity_com(&self, point: Vec3) -> Vec3 {
        self.linear_velocity() + self.angular_velocity().cross(point)
    }
}

/// Creation-time description of a body. Layout-stable across the boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BodyCreationSettings {
    pub position: RealX4,
    pub rotation: F32x4,
    pub linear_velocity: F32x4,
    pub angular_velocity: F32x4,
    pub user_data: u64,
    pub object_layer: ObjectLayer,
    pub collision_group: CollisionGroup,
    pub motion_type: MotionType,
    pub allowed_dofs: AllowedDofs,
    pub allow_dynamic_or_kinematic: bool,
    pub is_sensor: bool,
    pub collide_kinematic_vs_non_dynamic: bool,
    pub use_manifold_reduction: bool,
    pub apply_gyroscopic_force: bool,
    pub motion_quality: MotionQuality,
    pub allow_sleeping: bool,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub max_linear_velocity: f32,
    pub max_angular_velocity: f32,
    pub gravity_factor: f32,
    pub num_velocity_steps_override: u32,
    pub num_position_steps_override: u32,
    pub override_mass_properties: OverrideMassProperties,
    pub inertia_multiplier: f32,
    pub mass_properties_override: MassProperties,
    pub shape_settings: *const ShapeSettings,
    pub shape: *const Shape,
}

impl Default for BodyCreationSettings {
    fn default() -> Self {
        Self {
            position: RealX4::ZERO,
            rotation: F32x4::from_quat(Quat::IDENTITY),
            linear_velocity: F32x4::ZERO,
            angular_velocity: F32x4::ZERO,
            user_data: 0,
            object_layer: 0,
            collision_group: CollisionGroup::default(),
            motion_type: MotionType::Dynamic,
            allowed_dofs: ALLOWED_DOFS_ALL,
            allow_dynamic_or_kinematic: false,
            is_sensor: false,
            collide_kinematic_vs_non_dynamic: false,
            use_manifold_reduction: true,
            apply_gyroscopic_force: false,
            motion_quality: MotionQuality::Discrete,
            allow_sleeping: true,
            friction: config::DEFAULT_FRICTION,
            restitution: config::DEFAULT_RESTITUTION,
            linear_damping: config::DEFAULT_LINEAR_DAMPING,
            angular_damping: config::DEFAULT_ANGULAR_DAMPING,
            max_linear_velocity: config::DEFAULT_MAX_LINEAR_VELOCITY,
            max_angular_velocity: config::DEFAULT_MAX_ANGULAR_VELOCITY,
            gravity_factor: 1.0,
            num_velocity_steps_override: 0,
            num_position_steps_override: 0,
            override_mass_properties: OverrideMassProperties::CalcMassInertia,
            inertia_multiplier: 1.0,
            mass_properties_override: MassProperties::default(),
            shape_settings: std::ptr::null(),
            shape: std::ptr::null(),
        }
    }
}

impl BodyCreationSettings {
    /// Convenience constructor matching the boundary's `set` operation.
    pub fn new(
        shape: *const Shape,
        position: RVec3,
        rotation: Quat,
        motion_type: MotionType,
        object_layer: ObjectLayer,
    ) -> Self {
        Self {
            position: RealX4::from_rvec3(position),
            rotation: F32x4::from_quat(rotation),
            motion_type,
            object_layer,
            shape,
            ..Self::default()
        }
    }

    /// Resolves the shape, preferring the concrete pointer over the settings
    /// blueprint. The returned pointer carries one reference owed to the
    /// caller.
    pub fn resolve_shape(&self) -> Result<*const Shape, ShapeError> {
        if !self.shape.is_null() {
            unsafe { Shape::add_ref(self.shape) };
            return Ok(self.shape);
        }
        if !self.shape_settings.is_null() {
            return unsafe { (*self.shape_settings).create_shape() };
        }
        Err(ShapeError::InvalidParameter("body without shape"))
    }

    /// Mass properties per the override mode.
    pub fn mass_properties(&self, shape: &Shape) -> MassProperties {
        let mut props = match self.override_mass_properties {
            OverrideMassProperties::CalcMassInertia => shape.mass_properties(),
            OverrideMassProperties::CalcInertia => {
                let mut p = shape.mass_properties();
                p.set_mass_keep_shape(self.mass_properties_override.mass);
                p
            }
            OverrideMassProperties::MassInertiaProvided => self.mass_properties_override,
        };
        if self.inertia_multiplier != 1.0 {
            let m = props.inertia.to_mat4();
            props.inertia = F32x16::from_mat4(Mat4::from_cols(
                m.col(0) * self.inertia_multiplier,
                m.col(1) * self.inertia_multiplier,
                m.col(2) * self.inertia_multiplier,
                glam::Vec4::W,
            ));
        }
        props
    }
}

/// A rigid body. `position` is the center-of-mass position.
#[repr(C)]
#[derive(Debug)]
pub struct Body {
    pub position: RealX4,
    pub rotation: F32x4,
    pub bounds_min: F32x4,
    pub bounds_max: F32x4,

    pub shape: *const Shape,
    /// Null exactly when the body is static.
    pub motion_properties: *mut MotionProperties,
    pub user_data: u64,
    pub collision_group: CollisionGroup,

    pub friction: f32,
    pub restitution: f32,
    pub id: BodyId,

    pub object_layer: ObjectLayer,

    pub broad_phase_layer: BroadPhaseLayer,
    pub motion_type: MotionType,
    pub flags: u8,
}

// Bodies are shared across worker threads during an update; structural
// mutation is serialized by the owning manager.
unsafe impl Send for Body {}
unsafe impl Sync for Body {}

impl Body {
    pub const FLAG_IS_SENSOR: u8 = 1 << 0;
    pub const FLAG_IN_BROAD_PHASE: u8 = 1 << 1;
    pub const FLAG_ALLOW_DYNAMIC_OR_KINEMATIC: u8 = 1 << 2;
    pub const FLAG_USE_MANIFOLD_REDUCTION: u8 = 1 << 3;
    pub const FLAG_APPLY_GYROSCOPIC_FORCE: u8 = 1 << 4;
    pub const FLAG_CACHE_INVALID: u8 = 1 << 5;

    #[inline]
    pub fn is_static(&self) -> bool {
        self.motion_type == MotionType::Static
    }

    #[inline]
    pub fn is_kinematic(&self) -> bool {
        self.motion_type == MotionType::Kinematic
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.motion_type == MotionType::Dynamic
    }

    #[inline]
    pub fn can_be_kinematic_or_dynamic(&self) -> bool {
        self.flags & Self::FLAG_ALLOW_DYNAMIC_OR_KINEMATIC != 0
    }

    #[inline]
    pub fn is_sensor(&self) -> bool {
        self.flags & Self::FLAG_IS_SENSOR != 0
    }

    pub fn set_is_sensor(&mut self, sensor: bool) {
        if sensor {
            self.flags |= Self::FLAG_IS_SENSOR;
        } else {
            self.flags &= !Self::FLAG_IS_SENSOR;
        }
    }

    #[inline]
    pub fn is_in_broad_phase(&self) -> bool {
        self.flags & Self::FLAG_IN_BROAD_PHASE != 0
    }

    #[inline]
    pub fn is_collision_cache_invalid(&self) -> bool {
        self.flags & Self::FLAG_CACHE_INVALID != 0
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        match self.motion_properties() {
            Some(mp) => mp.index_in_active_bodies != NOT_ACTIVE,
            None => false,
        }
    }

    #[inline]
    pub fn motion_properties(&self) -> Option<&MotionProperties> {
        unsafe { self.motion_properties.as_ref() }
    }

    #[inline]
    pub fn motion_properties_mut(&mut self) -> Option<&mut MotionProperties> {
        unsafe { self.motion_properties.as_mut() }
    }

    pub fn allow_sleeping(&self) -> bool {
        self.motion_properties().is_some_and(|mp| mp.allow_sleeping)
    }

    pub fn set_allow_sleeping(&mut self, allow: bool) {
        if let Some(mp) = self.motion_properties_mut() {
            mp.allow_sleeping = allow;
        }
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        unsafe { &*self.shape }
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        self.rotation.to_quat()
    }

    /// Center-of-mass position in world space.
    #[inline]
    pub fn center_of_mass_position(&self) -> RVec3 {
        self.position.to_rvec3()
    }

    /// Body-origin position in world space.
    pub fn get_position(&self) -> RVec3 {
        self.center_of_mass_position()
            - rvec3_from_vec3(self.rotation() * self.shape().center_of_mass)
    }

    pub fn set_position_and_rotation(&mut self, position: RVec3, rotation: Quat) {
        let com = rotation * self.shape().center_of_mass;
        self.position = RealX4::from_rvec3(position + rvec3_from_vec3(com));
        self.rotation = F32x4::from_quat(rotation.normalize());
        self.update_bounds();
    }

    pub fn world_bounds(&self) -> Aabb {
        Aabb::new(self.bounds_min.to_vec3(), self.bounds_max.to_vec3())
    }

    /// Recomputes world-space bounds from the shape's local bounds.
    pub fn update_bounds(&mut self) {
        let bounds = self
            .shape()
            .local_bounds
            .transformed(self.rotation(), Vec3::ZERO);
        let origin = vec3_from_rvec3(self.get_position());
        self.bounds_min = F32x4::from_vec3(bounds.min + origin);
        self.bounds_max = F32x4::from_vec3(bounds.max + origin);
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.motion_properties()
            .map_or(Vec3::ZERO, |mp| mp.linear_velocity())
    }

    pub fn set_linear_velocity(&mut self, v: Vec3) {
        if let Some(mp) = self.motion_properties_mut() {
            mp.set_linear_velocity(v);
        }
    }

    pub fn set_linear_velocity_clamped(&mut self, v: Vec3) {
        if let Some(mp) = self.motion_properties_mut() {
            mp.set_linear_velocity_clamped(v);
        }
    }

    pub fn angular_velocity(&self) -> Vec3 {
        self.motion_properties()
            .map_or(Vec3::ZERO, |mp| mp.angular_velocity())
    }

    pub fn set_angular_velocity(&mut self, v: Vec3) {
        if let Some(mp) = self.motion_properties_mut() {
            mp.set_angular_velocity(v);
        }
    }

    pub fn set_angular_velocity_clamped(&mut self, v: Vec3) {
        if let Some(mp) = self.motion_properties_mut() {
            mp.set_angular_velocity_clamped(v);
        }
    }

    /// Velocity of a point given relative to the center of mass.
    pub fn point_velocity_com(&self, point: Vec3) -> Vec3 {
        self.motion_properties()
            .map_or(Vec3::ZERO, |mp| mp.point_velocity_com(point))
    }

    /// Velocity of a world-space point on the body.
    pub fn point_velocity(&self, point: RVec3) -> Vec3 {
        let rel = vec3_from_rvec3(point - self.center_of_mass_position());
        self.point_velocity_com(rel)
    }

    pub fn add_force(&mut self, force: Vec3) {
        if let Some(mp) = self.motion_properties_mut() {
            mp.force[0] += force.x;
            mp.force[1] += force.y;
            mp.force[2] += force.z;
        }
    }

    pub fn add_force_at_position(&mut self, force: Vec3, position: RVec3) {
        let rel = vec3_from_rvec3(position - self.center_of_mass_position());
        self.add_force(force);
        self.add_torque(rel.cross(force));
    }

    pub fn add_torque(&mut self, torque: Vec3) {
        if let Some(mp) = self.motion_properties_mut() {
            mp.torque[0] += torque.x;
            mp.torque[1] += torque.y;
            mp.torque[2] += torque.z;
        }
    }

    pub fn add_impulse(&mut self, impulse: Vec3) {
        if let Some(mp) = self.motion_properties_mut() {
            let dv = impulse * mp.inv_mass;
            mp.set_linear_velocity_clamped(mp.linear_velocity() + dv);
        }
    }

    pub fn add_impulse_at_position(&mut self, impulse: Vec3, position: RVec3) {
        let rel = vec3_from_rvec3(position - self.center_of_mass_position());
        self.add_impulse(impulse);
        self.add_angular_impulse(rel.cross(impulse));
    }

    pub fn add_angular_impulse(&mut self, impulse: Vec3) {
        let rotation = self.rotation();
        if let Some(mp) = self.motion_properties_mut() {
            let dw = mp.multiply_world_inverse_inertia_by_vector(rotation, impulse);
            mp.set_angular_velocity_clamped(mp.angular_velocity() + dw);
        }
    }

    /// World-space inverse inertia tensor.
    pub fn inverse_inertia(&self) -> F32x16 {
        match self.motion_properties() {
            Some(mp) => F32x16::from_mat4(
                mp.inverse_inertia_for_rotation(Mat4::from_quat(self.rotation())),
            ),
            None => F32x16::from_mat4(Mat4::ZERO),
        }
    }

    /// Sets velocities so the body reaches the target pose over `dt`.
    pub fn move_kinematic(&mut self, target_position: RVec3, target_rotation: Quat, dt: f32) {
        let com_target =
            target_position + rvec3_from_vec3(target_rotation * self.shape().center_of_mass);
        let delta = vec3_from_rvec3(com_target - self.center_of_mass_position());
        let delta_rot = target_rotation * self.rotation().inverse();
        if let Some(mp) = self.motion_properties_mut() {
            mp.move_kinematic(delta, delta_rot, dt);
        }
    }

    /// Applies an impulse approximating buoyancy and drag for a body
    /// intersecting a fluid surface. Returns whether the body was touched.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_buoyancy_impulse(
        &mut self,
        surface_position: RVec3,
        surface_normal: Vec3,
        buoyancy: f32,
        linear_drag: f32,
        angular_drag: f32,
        fluid_velocity: Vec3,
        gravity: Vec3,
        dt: f32,
    ) -> bool {
        let Some(mp) = self.motion_properties() else {
            return false;
        };
        let inv_mass = mp.inv_mass;
        if inv_mass <= 0.0 {
            return false;
        }
        let depth = vec3_from_rvec3(self.center_of_mass_position() - surface_position)
            .dot(surface_normal);
        let bounds = self.world_bounds();
        let half_height = bounds.half_extents().dot(surface_normal.abs()).max(1e-6);
        // Submerged fraction of the bounding volume, 0 fully above the
        // surface, 1 fully below.
        let submerged = ((half_height - depth) / (2.0 * half_height)).clamp(0.0, 1.0);
        if submerged <= 0.0 {
            return false;
        }
        let up_impulse = -gravity * (buoyancy * submerged / inv_mass) * dt;
        let relative = fluid_velocity - self.linear_velocity();
        let drag_impulse = relative * (linear_drag * submerged / inv_mass) * dt;
        self.add_impulse(up_impulse + drag_impulse);
        let angular = -self.angular_velocity() * (angular_drag * submerged) * dt;
        if let Some(mp) = self.motion_properties_mut() {
            mp.set_angular_velocity_clamped(mp.angular_velocity() + angular);
        }
        true
    }

    /// Rotation matrix plus translation of the body origin.
    pub fn world_transform(&self) -> (Mat3, RVec3) {
        (Mat3::from_quat(self.rotation()), self.get_position())
    }

    pub fn center_of_mass_transform(&self) -> (Mat3, RVec3) {
        (Mat3::from_quat(self.rotation()), self.center_of_mass_position())
    }

    pub fn inverse_center_of_mass_transform(&self) -> (Mat3, RVec3) {
        let inv = Mat3::from_quat(self.rotation().inverse());
        let t = -(inv * vec3_from_rvec3(self.center_of_mass_position()));
        (inv, rvec3_from_vec3(t))
    }

    /// Outward surface normal at a world-space position on the given leaf
    /// shape. Exact for spheres and boxes, radial fallback otherwise.
    pub fn world_space_surface_normal(&self, _sub_shape_id: SubShapeId, position: RVec3) -> Vec3 {
        use crate::core::shape::ShapeKind;
        let local = self.rotation().inverse()
            * vec3_from_rvec3(position - self.center_of_mass_position());
        let normal = match &self.shape().kind {
            ShapeKind::Sphere { .. } => local,
            ShapeKind::Box { half_extent, .. } => {
                // Face whose relative penetration is deepest.
                let rel = local / *half_extent;
                let abs = rel.abs();
                if abs.x >= abs.y && abs.x >= abs.z {
                    Vec3::new(rel.x.signum(), 0.0, 0.0)
                } else if abs.y >= abs.z {
                    Vec3::new(0.0, rel.y.signum(), 0.0)
                } else {
                    Vec3::new(0.0, 0.0, rel.z.signum())
                }
            }
            _ => local,
        };
        (self.rotation() * normal).normalize_or_zero()
    }

    /// Advances the body by one collision step. Called by the owning system.
    pub(crate) fn integrate(&mut self, gravity: Vec3, dt: f32) {
        if !self.is_active() {
            return;
        }
        let rotation = self.rotation();
        let is_dynamic = self.is_dynamic();
        let Some(mp) = (unsafe { self.motion_properties.as_mut() }) else {
            return;
        };

        if is_dynamic {
            let force = Vec3::from_array(mp.force);
            let torque = Vec3::from_array(mp.torque);
            let mut v = mp.linear_velocity()
                + (gravity * mp.gravity_factor + force * mp.inv_mass) * dt;
            let mut w = mp.angular_velocity()
                + mp.multiply_world_inverse_inertia_by_vector(rotation, torque) * dt;
            v *= 1.0 / (1.0 + mp.linear_damping * dt);
            w *= 1.0 / (1.0 + mp.angular_damping * dt);
            mp.set_linear_velocity_clamped(v);
            mp.set_angular_velocity_clamped(w);
            mp.force = [0.0; 3];
            mp.torque = [0.0; 3];
        }

        let v = mp.linear_velocity();
        let w = mp.angular_velocity();
        self.position =
            RealX4::from_rvec3(self.position.to_rvec3() + rvec3_from_vec3(v * dt));
        self.rotation = F32x4::from_quat(integrate_rotation(rotation, w, dt));
        self.update_bounds();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alloc;
    use approx::assert_relative_eq;

    fn test_body(motion_type: MotionType) -> (Body, *mut MotionProperties, *const Shape) {
        alloc::register_default();
        let shape = ShapeSettings::sphere(0.5).create_shape().unwrap();
        let settings = BodyCreationSettings::new(
            shape,
            RVec3::new(0.0, 2.0, 0.0),
            Quat::IDENTITY,
            motion_type,
            1,
        );
        let mp = if motion_type == MotionType::Static {
            std::ptr::null_mut()
        } else {
            let props = settings.mass_properties(unsafe { &*shape });
            alloc::handle_alloc(MotionProperties::new(&settings, props))
        };
        let mut body = Body {
            position: settings.position,
            rotation: settings.rotation,
            bounds_min: F32x4::ZERO,
            bounds_max: F32x4::ZERO,
            shape,
            motion_properties: mp,
            user_data: 0,
            collision_group: CollisionGroup::default(),
            friction: settings.friction,
            restitution: settings.restitution,
            id: BodyId::new(0, 0),
            object_layer: settings.object_layer,
            broad_phase_layer: 0,
            motion_type,
            flags: 0,
        };
        body.update_bounds();
        (body, mp, shape)
    }

    #[test]
    fn static_bodies_have_no_motion_properties() {
        let (body, _, shape) = test_body(MotionType::Static);
        assert!(body.motion_properties().is_none());
        assert_eq!(body.linear_velocity(), Vec3::ZERO);
        unsafe { Shape::release(shape) };
    }

    #[test]
    fn integration_applies_gravity_to_active_dynamic_bodies() {
        let (mut body, mp, shape) = test_body(MotionType::Dynamic);
        unsafe { (*mp).index_in_active_bodies = 0 };
        let y0 = body.center_of_mass_position().y;
        body.integrate(Vec3::new(0.0, -9.81, 0.0), 1.0 / 60.0);
        assert!(body.center_of_mass_position().y < y0);
        assert!(body.linear_velocity().y < 0.0);
        unsafe {
            alloc::handle_free(mp);
            Shape::release(shape);
        }
    }

    #[test]
    fn kinematic_move_reaches_target_after_one_step() {
        let (mut body, mp, shape) = test_body(MotionType::Kinematic);
        unsafe { (*mp).index_in_active_bodies = 0 };
        let dt = 1.0 / 60.0;
        let target = RVec3::new(1.0, 2.0, 0.0);
        body.move_kinematic(target, Quat::IDENTITY, dt);
        body.integrate(Vec3::ZERO, dt);
        assert_relative_eq!(body.get_position().x as f32, 1.0, epsilon = 1e-4);
        unsafe {
            alloc::handle_free(mp);
            Shape::release(shape);
        }
    }
}
