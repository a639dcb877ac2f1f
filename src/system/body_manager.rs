//! Body storage: a fixed-capacity slot array with a tagged-pointer freelist.
//!
//! Freed slots reuse the pointer storage to hold the freelist link with bit 0
//! set, so callers taking the unsafe direct body-array view can (and must)
//! check that bit before dereferencing. Slot reuse bumps an 8-bit sequence
//! number folded into the body id, which is how stale ids are rejected.

use glam::Vec3;

use crate::core::alloc::{handle_alloc, handle_free};
use crate::core::body::{
    Activation, Body, BodyCreationSettings, BodyType, MotionProperties, MotionType, NOT_ACTIVE,
};
use crate::core::filter::ActivationEvents;
use crate::core::id::BodyId;
use crate::core::shape::{Shape, ShapeError};
use crate::math::F32x4;

/// Bit marking a freed slot in the body pointer array.
pub const FREED_BODY_BIT: usize = 0x1;

const FREE_LIST_END: usize = usize::MAX >> 1;

pub struct BodyManager {
    /// One entry per slot; either a live body pointer or a tagged freelist
    /// link.
    slots: Vec<*mut Body>,
    sequence: Vec<u8>,
    free_head: usize,
    num_bodies: u32,
    max_bodies: u32,
    /// Dense list of awake bodies; `index_in_active_bodies` points into it.
    active: Vec<BodyId>,
}

unsafe impl Send for BodyManager {}
unsafe impl Sync for BodyManager {}

impl BodyManager {
    pub fn new(max_bodies: u32) -> Self {
        let max_bodies = max_bodies.min(BodyId::INDEX_BITS);
        let mut slots = Vec::with_capacity(max_bodies as usize);
        for i in 0..max_bodies as usize {
            let next = if i + 1 < max_bodies as usize {
                i + 1
            } else {
                FREE_LIST_END
            };
            slots.push(((next << 1) | FREED_BODY_BIT) as *mut Body);
        }
        Self {
            slots,
            sequence: vec![0; max_bodies as usize],
            free_head: if max_bodies > 0 { 0 } else { FREE_LIST_END },
            num_bodies: 0,
            max_bodies,
            active: Vec::new(),
        }
    }

    #[inline]
    fn slot_is_free(&self, index: usize) -> bool {
        (self.slots[index] as usize) & FREED_BODY_BIT != 0
    }

    /// Creates a body in the first free slot. Null shape resolution or a full
    /// manager yields an error; the body is not yet part of the broad phase.
    pub fn create_body(
        &mut self,
        settings: &BodyCreationSettings,
    ) -> Result<*mut Body, ShapeError> {
        let index = self.free_head;
        if index == FREE_LIST_END {
            log::warn!("body manager is full ({} bodies)", self.max_bodies);
            return Err(ShapeError::InvalidParameter("body capacity reached"));
        }
        let id = BodyId::new(index as u32, self.sequence[index]);
        let body = self.instantiate(id, settings)?;
        self.free_head = (self.slots[index] as usize) >> 1;
        self.slots[index] = body;
        self.num_bodies += 1;
        Ok(body)
    }

    /// Creates a body in the exact slot named by `id`. The slot must be free
    /// and the sequence number becomes the id's.
    pub fn create_body_with_id(
        &mut self,
        id: BodyId,
        settings: &BodyCreationSettings,
    ) -> Result<*mut Body, ShapeError> {
        let index = id.index() as usize;
        if index >= self.slots.len() || !self.slot_is_free(index) {
            return Err(ShapeError::InvalidParameter("body id slot unavailable"));
        }
        self.sequence[index] = id.sequence_number();
        let body = self.instantiate(id, settings)?;
        // Unlink the slot from the freelist.
        if self.free_head == index {
            self.free_head = (self.slots[index] as usize) >> 1;
        } else {
            let mut cursor = self.free_head;
            while cursor != FREE_LIST_END {
                let next = (self.slots[cursor] as usize) >> 1;
                if next == index {
                    self.slots[cursor] = self.slots[index];
                    break;
                }
                cursor = next;
            }
        }
        self.slots[index] = body;
        self.num_bodies += 1;
        Ok(body)
    }

    fn instantiate(
        &mut self,
        id: BodyId,
        settings: &BodyCreationSettings,
    ) -> Result<*mut Body, ShapeError> {
        let shape = settings.resolve_shape()?;
        let motion_properties = if settings.motion_type == MotionType::Static {
            std::ptr::null_mut()
        } else {
            let mass = settings.mass_properties(unsafe { &*shape });
            let mp = handle_alloc(MotionProperties::new(settings, mass));
            if mp.is_null() {
                unsafe { Shape::release(shape) };
                return Err(ShapeError::InvalidParameter("allocation failed"));
            }
            mp
        };

        let mut flags = 0u8;
        if settings.is_sensor {
            flags |= Body::FLAG_IS_SENSOR;
        }
        if settings.allow_dynamic_or_kinematic {
            flags |= Body::FLAG_ALLOW_DYNAMIC_OR_KINEMATIC;
        }
        if settings.use_manifold_reduction {
            flags |= Body::FLAG_USE_MANIFOLD_REDUCTION;
        }
        if settings.apply_gyroscopic_force {
            flags |= Body::FLAG_APPLY_GYROSCOPIC_FORCE;
        }

        let mut body = Body {
            position: settings.position,
            rotation: settings.rotation,
            bounds_min: F32x4::ZERO,
            bounds_max: F32x4::ZERO,
            shape,
            motion_properties,
            user_data: settings.user_data,
            collision_group: settings.collision_group,
            friction: settings.friction,
            restitution: settings.restitution,
            id,
            object_layer: settings.object_layer,
            broad_phase_layer: 0,
            motion_type: settings.motion_type,
            flags,
        };
        // Creation settings position the body origin, not the center of mass.
        body.set_position_and_rotation(
            settings.position.to_rvec3(),
            settings.rotation.to_quat(),
        );

        let ptr = handle_alloc(body);
        if ptr.is_null() {
            unsafe {
                if !motion_properties.is_null() {
                    handle_free(motion_properties);
                }
                Shape::release(shape);
            }
            return Err(ShapeError::InvalidParameter("allocation failed"));
        }
        Ok(ptr)
    }

    /// Destroys a body that is not currently added to the broad phase.
    pub fn destroy_body(&mut self, id: BodyId, events: Option<&dyn ActivationEvents>) {
        let Some(body) = self.get_body_ptr(id) else {
            return;
        };
        unsafe {
            debug_assert!(
                !(*body).is_in_broad_phase(),
                "destroying a body that is still added"
            );
            if (*body).is_active() {
                self.deactivate(id, events);
            }
            let index = id.index() as usize;
            Shape::release((*body).shape);
            if !(*body).motion_properties.is_null() {
                handle_free((*body).motion_properties);
            }
            handle_free(body);
            self.sequence[index] = self.sequence[index].wrapping_add(1);
            self.slots[index] = ((self.free_head << 1) | FREED_BODY_BIT) as *mut Body;
            self.free_head = index;
            self.num_bodies -= 1;
        }
    }

    /// Puts a created body into the broad phase.
    pub fn add_body(
        &mut self,
        id: BodyId,
        activation: Activation,
        events: Option<&dyn ActivationEvents>,
    ) {
        let Some(body) = self.get_body_ptr(id) else {
            return;
        };
        unsafe {
            (*body).flags |= Body::FLAG_IN_BROAD_PHASE;
            (*body).update_bounds();
            if activation == Activation::Activate && !(*body).is_static() {
                self.activate(id, events);
            }
        }
    }

    /// Takes a body out of the broad phase, deactivating it first.
    pub fn remove_body(&mut self, id: BodyId, events: Option<&dyn ActivationEvents>) {
        let Some(body) = self.get_body_ptr(id) else {
            return;
        };
        unsafe {
            if (*body).is_active() {
                self.deactivate(id, events);
            }
            (*body).flags &= !Body::FLAG_IN_BROAD_PHASE;
        }
    }

    pub fn activate(&mut self, id: BodyId, events: Option<&dyn ActivationEvents>) {
        let Some(body) = self.get_body_ptr(id) else {
            return;
        };
        unsafe {
            let Some(mp) = (*body).motion_properties.as_mut() else {
                return;
            };
            if mp.index_in_active_bodies != NOT_ACTIVE {
                return;
            }
            mp.index_in_active_bodies = self.active.len() as u32;
            self.active.push(id);
            if let Some(events) = events {
                events.on_body_activated(id, (*body).user_data);
            }
        }
    }

    pub fn deactivate(&mut self, id: BodyId, events: Option<&dyn ActivationEvents>) {
        let Some(body) = self.get_body_ptr(id) else {
            return;
        };
        unsafe {
            let Some(mp) = (*body).motion_properties.as_mut() else {
                return;
            };
            let index = mp.index_in_active_bodies;
            if index == NOT_ACTIVE {
                return;
            }
            mp.index_in_active_bodies = NOT_ACTIVE;
            mp.set_linear_velocity(Vec3::ZERO);
            mp.set_angular_velocity(Vec3::ZERO);
            self.active.swap_remove(index as usize);
            if let Some(&moved) = self.active.get(index as usize) {
                if let Some(moved_body) = self.get_body_ptr(moved) {
                    if let Some(moved_mp) = (*moved_body).motion_properties.as_mut() {
                        moved_mp.index_in_active_bodies = index;
                    }
                }
            }
            if let Some(events) = events {
                events.on_body_deactivated(id, (*body).user_data);
            }
        }
    }

    /// Resolves an id to its body, rejecting stale sequence numbers.
    pub fn get_body_ptr(&self, id: BodyId) -> Option<*mut Body> {
        let index = id.index() as usize;
        if id.is_invalid() || index >= self.slots.len() || self.slot_is_free(index) {
            return None;
        }
        let body = self.slots[index];
        if unsafe { (*body).id } != id {
            return None;
        }
        Some(body)
    }

    pub fn get_body(&self, id: BodyId) -> Option<&Body> {
        self.get_body_ptr(id).map(|p| unsafe { &*p })
    }

    pub fn num_bodies(&self) -> u32 {
        self.num_bodies
    }

    pub fn max_bodies(&self) -> u32 {
        self.max_bodies
    }

    pub fn num_active_bodies(&self, body_type: BodyType) -> u32 {
        match body_type {
            BodyType::Rigid => self.active.len() as u32,
            BodyType::Soft => 0,
        }
    }

    pub fn active_body_ids(&self) -> &[BodyId] {
        &self.active
    }

    /// Ids of all created bodies, in slot order.
    pub fn body_ids(&self) -> Vec<BodyId> {
        let mut out = Vec::with_capacity(self.num_bodies as usize);
        for (index, &slot) in self.slots.iter().enumerate() {
            if (slot as usize) & FREED_BODY_BIT == 0 {
                out.push(BodyId::new(index as u32, self.sequence[index]));
            }
        }
        out
    }

    /// Bodies currently in the broad phase.
    pub fn added_bodies(&self) -> Vec<*mut Body> {
        self.slots
            .iter()
            .copied()
            .filter(|&slot| {
                (slot as usize) & FREED_BODY_BIT == 0 && unsafe { (*slot).is_in_broad_phase() }
            })
            .collect()
    }

    /// Direct slot array access, tombstone bits and all. Valid only until the
    /// next structural change.
    pub fn bodies_unsafe(&mut self) -> *mut *mut Body {
        self.slots.as_mut_ptr()
    }
}

impl Drop for BodyManager {
    fn drop(&mut self) {
        for index in 0..self.slots.len() {
            if !self.slot_is_free(index) {
                let body = self.slots[index];
                unsafe {
                    Shape::release((*body).shape);
                    if !(*body).motion_properties.is_null() {
                        handle_free((*body).motion_properties);
                    }
                    handle_free(body);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alloc;
    use crate::core::shape::ShapeSettings;
    use crate::math::{RVec3, RealX4};
    use glam::Quat;

    fn settings() -> BodyCreationSettings {
        alloc::register_default();
        let shape = ShapeSettings::sphere(0.5).create_shape().unwrap();
        let mut s = BodyCreationSettings::new(
            shape,
            RVec3::new(0.0, 0.0, 0.0),
            Quat::IDENTITY,
            MotionType::Dynamic,
            1,
        );
        s.position = RealX4::ZERO;
        s
    }

    #[test]
    fn slot_reuse_bumps_sequence_number() {
        let mut manager = BodyManager::new(8);
        let s = settings();
        let first = unsafe { (*manager.create_body(&s).unwrap()).id };
        manager.destroy_body(first, None);
        let second = unsafe { (*manager.create_body(&s).unwrap()).id };
        assert_eq!(first.index(), second.index());
        assert_ne!(first.sequence_number(), second.sequence_number());
        assert!(manager.get_body(first).is_none());
        assert!(manager.get_body(second).is_some());
        unsafe { Shape::release(s.shape) };
    }

    #[test]
    fn capacity_is_enforced() {
        let mut manager = BodyManager::new(2);
        let s = settings();
        assert!(manager.create_body(&s).is_ok());
        assert!(manager.create_body(&s).is_ok());
        assert!(manager.create_body(&s).is_err());
        assert_eq!(manager.num_bodies(), 2);
        unsafe { Shape::release(s.shape) };
    }

    #[test]
    fn freed_slots_carry_the_tombstone_bit() {
        let mut manager = BodyManager::new(4);
        let s = settings();
        let body = manager.create_body(&s).unwrap();
        let id = unsafe { (*body).id };
        let slots = manager.bodies_unsafe();
        unsafe {
            assert_eq!(*slots.add(id.index() as usize), body);
            manager.destroy_body(id, None);
            let raw = *slots.add(id.index() as usize) as usize;
            assert_eq!(raw & FREED_BODY_BIT, FREED_BODY_BIT);
        }
        unsafe { Shape::release(s.shape) };
    }

    #[test]
    fn activation_maintains_the_dense_active_list() {
        let mut manager = BodyManager::new(8);
        let s = settings();
        let a = unsafe { (*manager.create_body(&s).unwrap()).id };
        let b = unsafe { (*manager.create_body(&s).unwrap()).id };
        let c = unsafe { (*manager.create_body(&s).unwrap()).id };
        manager.add_body(a, Activation::Activate, None);
        manager.add_body(b, Activation::Activate, None);
        manager.add_body(c, Activation::Activate, None);
        assert_eq!(manager.num_active_bodies(BodyType::Rigid), 3);

        manager.deactivate(a, None);
        assert_eq!(manager.num_active_bodies(BodyType::Rigid), 2);
        // The swapped-in body's back-reference must be fixed up.
        for &id in manager.active_body_ids() {
            let body = manager.get_body(id).unwrap();
            let mp = body.motion_properties().unwrap();
            assert_eq!(
                manager.active_body_ids()[mp.index_in_active_bodies as usize],
                id
            );
        }
        manager.remove_body(b, None);
        manager.remove_body(c, None);
        manager.remove_body(a, None);
        unsafe { Shape::release(s.shape) };
    }
}
