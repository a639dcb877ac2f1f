//! Narrow-phase queries against the bodies of a system.
//!
//! The one query the boundary exposes is a closest-hit ray cast. The ray
//! direction vector carries the cast length; hit fractions are reported along
//! it in `[0, 1)`. Sphere, box, and triangle tests are exact; remaining
//! shapes answer conservatively with their local bounds.

use glam::Vec3;

use crate::core::body::Body;
use crate::core::id::{BodyId, BroadPhaseLayer, ObjectLayer, SubShapeId, SubShapeIdCreator};
use crate::core::shape::{Shape, ShapeKind};
use crate::math::{vec3_from_rvec3, F32x4, RealX4};
use crate::system::PhysicsSystem;

/// World-space ray; `direction` length is the cast distance.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RayCast {
    pub origin: RealX4,
    pub direction: F32x4,
}

/// Closest-hit result. Must be default-initialized before the cast; the
/// fraction doubles as the early-out threshold.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RayCastResult {
    pub body_id: BodyId,
    pub fraction: f32,
    pub sub_shape_id: SubShapeId,
}

impl Default for RayCastResult {
    fn default() -> Self {
        Self {
            body_id: BodyId::INVALID,
            fraction: 1.0 + f32::EPSILON,
            sub_shape_id: 0,
        }
    }
}

/// Ray-cast behavior switches.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RayCastSettings {
    pub back_face_mode: u8,
    pub treat_convex_as_solid: bool,
}

impl Default for RayCastSettings {
    fn default() -> Self {
        Self {
            back_face_mode: 0,
            treat_convex_as_solid: true,
        }
    }
}

/// A shape in world space, as held by one body leaf.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TransformedShape {
    pub shape_position_com: RealX4,
    pub shape_rotation: F32x4,
    pub shape: *const Shape,
    pub shape_scale: [f32; 3],
    pub body_id: BodyId,
    pub sub_shape_id_creator: SubShapeIdCreator,
}

impl TransformedShape {
    pub fn from_body(body: &Body) -> Self {
        Self {
            shape_position_com: body.position,
            shape_rotation: body.rotation,
            shape: body.shape,
            shape_scale: [1.0; 3],
            body_id: body.id,
            sub_shape_id_creator: SubShapeIdCreator::default(),
        }
    }
}

/// Query-time filter on broad-phase partitions. Absent filter accepts all.
pub trait BroadPhaseLayerQueryFilter {
    fn should_collide(&self, layer: BroadPhaseLayer) -> bool;
}

/// Query-time filter on object layers.
pub trait ObjectLayerQueryFilter {
    fn should_collide(&self, layer: ObjectLayer) -> bool;
}

/// Query-time filter on individual bodies.
pub trait BodyQueryFilter {
    fn should_collide(&self, id: BodyId) -> bool;
    fn should_collide_locked(&self, body: &Body) -> bool;
}

/// Entry point for narrow-phase queries. Owned by a physics system.
pub struct NarrowPhaseQuery {
    pub(crate) system: *const PhysicsSystem,
    pub(crate) locking: bool,
}

unsafe impl Send for NarrowPhaseQuery {}
unsafe impl Sync for NarrowPhaseQuery {}

impl NarrowPhaseQuery {
    /// Casts `ray` against every added body, keeping the closest hit below
    /// `hit.fraction`. Returns whether anything was hit.
    pub fn cast_ray(
        &self,
        ray: &RayCast,
        hit: &mut RayCastResult,
        broad_phase_filter: Option<&dyn BroadPhaseLayerQueryFilter>,
        object_filter: Option<&dyn ObjectLayerQueryFilter>,
        body_filter: Option<&dyn BodyQueryFilter>,
    ) -> bool {
        let system = unsafe { &*self.system };
        // The locking variant keeps the body array stable for the sweep.
        let _guard = self.locking.then(|| system.structural_lock());
        let origin = ray.origin.to_rvec3();
        let direction = ray.direction.to_vec3();
        let mut found = false;

        for body_ptr in system.body_manager().added_bodies() {
            let body = unsafe { &*body_ptr };
            if let Some(filter) = broad_phase_filter {
                if !filter.should_collide(body.broad_phase_layer) {
                    continue;
                }
            }
            if let Some(filter) = object_filter {
                if !filter.should_collide(body.object_layer) {
                    continue;
                }
            }
            if let Some(filter) = body_filter {
                if !filter.should_collide(body.id) || !filter.should_collide_locked(body) {
                    continue;
                }
            }

            // Ray in body-origin local space.
            let inv_rot = body.rotation().inverse();
            let local_origin = inv_rot * vec3_from_rvec3(origin - body.get_position());
            let local_dir = inv_rot * direction;

            if let Some((fraction, sub_shape_id)) = ray_vs_shape(
                body.shape(),
                local_origin,
                local_dir,
                SubShapeIdCreator::default(),
            ) {
                if fraction < hit.fraction {
                    hit.body_id = body.id;
                    hit.fraction = fraction;
                    hit.sub_shape_id = sub_shape_id;
                    found = true;
                }
            }
        }
        found
    }
}

/// Ray versus one shape in the shape's local space. Returns the earliest
/// fraction in `[0, 1]` and the leaf sub-shape id.
fn ray_vs_shape(
    shape: &Shape,
    origin: Vec3,
    direction: Vec3,
    creator: SubShapeIdCreator,
) -> Option<(f32, SubShapeId)> {
    match &shape.kind {
        ShapeKind::Sphere { radius } => {
            ray_vs_sphere(origin, direction, Vec3::ZERO, *radius).map(|t| (t, creator.id))
        }
        ShapeKind::Box { half_extent, .. } => {
            ray_vs_box(origin, direction, *half_extent).map(|t| (t, creator.id))
        }
        ShapeKind::Triangle { vertices, .. } => {
            ray_vs_triangle(origin, direction, vertices).map(|t| (t, creator.id))
        }
        ShapeKind::Capsule {
            half_height,
            radius,
        } => ray_vs_capsule(origin, direction, *half_height, *radius).map(|t| (t, creator.id)),
        ShapeKind::RotatedTranslated {
            rotation,
            translation,
            inner,
        } => {
            let inv = rotation.inverse();
            ray_vs_shape(
                inner.get(),
                inv * (origin - *translation),
                inv * direction,
                creator,
            )
        }
        ShapeKind::Scaled { scale, inner } => ray_vs_shape(
            inner.get(),
            origin / *scale,
            direction / *scale,
            creator,
        ),
        ShapeKind::OffsetCenterOfMass { inner, .. } => {
            ray_vs_shape(inner.get(), origin, direction, creator)
        }
        ShapeKind::Compound { children, .. } => {
            let mut best: Option<(f32, SubShapeId)> = None;
            for (index, child) in children.iter().enumerate() {
                let inv = child.rotation.inverse();
                let child_creator = creator.push(index as u32, compound_id_bits(children.len()));
                if let Some((t, sub)) = ray_vs_shape(
                    child.shape.get(),
                    inv * (origin - child.position),
                    inv * direction,
                    child_creator,
                ) {
                    if best.is_none_or(|(bt, _)| t < bt) {
                        best = Some((t, sub));
                    }
                }
            }
            best
        }
        // Mesh, height field, convex hull, and the remaining convex kinds
        // answer with their bounds.
        _ => {
            let bounds = shape.local_bounds;
            ray_vs_aabb(origin, direction, bounds.center(), bounds.half_extents())
                .map(|t| (t, creator.id))
        }
    }
}

fn compound_id_bits(children: usize) -> u32 {
    (usize::BITS - children.next_power_of_two().leading_zeros()).max(1)
}

fn ray_vs_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let a = direction.length_squared();
    if a <= f32::EPSILON {
        return None;
    }
    let b = 2.0 * oc.dot(direction);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_disc = discriminant.sqrt();
    let t = (-b - sqrt_disc) / (2.0 * a);
    if (0.0..=1.0).contains(&t) {
        Some(t)
    } else if t < 0.0 && c <= 0.0 {
        // Origin inside the sphere.
        Some(0.0)
    } else {
        None
    }
}

fn ray_vs_box(origin: Vec3, direction: Vec3, half_extent: Vec3) -> Option<f32> {
    ray_vs_aabb(origin, direction, Vec3::ZERO, half_extent)
}

fn ray_vs_aabb(origin: Vec3, direction: Vec3, center: Vec3, half_extent: Vec3) -> Option<f32> {
    let mut t_min: f32 = 0.0;
    let mut t_max: f32 = 1.0;
    for i in 0..3 {
        let o = origin[i] - center[i];
        let d = direction[i];
        let min = -half_extent[i];
        let max = half_extent[i];
        if d.abs() < 1e-8 {
            if o < min || o > max {
                return None;
            }
        } else {
            let inv = 1.0 / d;
            let mut t1 = (min - o) * inv;
            let mut t2 = (max - o) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }
    }
    Some(t_min)
}

fn ray_vs_triangle(origin: Vec3, direction: Vec3, vertices: &[Vec3; 3]) -> Option<f32> {
    let edge1 = vertices[1] - vertices[0];
    let edge2 = vertices[2] - vertices[0];
    let h = direction.cross(edge2);
    let det = edge1.dot(h);
    if det.abs() < 1e-8 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - vertices[0];
    let u = s.dot(h) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (0.0..=1.0).contains(&t).then_some(t)
}

fn ray_vs_capsule(origin: Vec3, direction: Vec3, half_height: f32, radius: f32) -> Option<f32> {
    // Sphere-swept segment along local Y: test both cap spheres and the
    // cylindrical side wall.
    let mut best: Option<f32> = None;
    for cap_y in [-half_height, half_height] {
        if let Some(t) = ray_vs_sphere(origin, direction, Vec3::new(0.0, cap_y, 0.0), radius) {
            if best.is_none_or(|b| t < b) {
                best = Some(t);
            }
        }
    }
    // Infinite cylinder x^2 + z^2 = r^2, clipped to |y| <= half_height.
    let a = direction.x * direction.x + direction.z * direction.z;
    if a > f32::EPSILON {
        let b = 2.0 * (origin.x * direction.x + origin.z * direction.z);
        let c = origin.x * origin.x + origin.z * origin.z - radius * radius;
        let disc = b * b - 4.0 * a * c;
        if disc >= 0.0 {
            let t = (-b - disc.sqrt()) / (2.0 * a);
            if (0.0..=1.0).contains(&t) {
                let y = origin.y + t * direction.y;
                if y.abs() <= half_height && best.is_none_or(|bt| t < bt) {
                    best = Some(t);
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ray_hits_sphere_at_expected_fraction() {
        let t = ray_vs_sphere(
            Vec3::new(-2.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::ZERO,
            1.0,
        )
        .unwrap();
        assert_relative_eq!(t, 0.25, epsilon = 1e-5);
    }

    #[test]
    fn ray_misses_offset_box() {
        assert!(ray_vs_box(
            Vec3::new(-2.0, 5.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::ONE
        )
        .is_none());
    }

    #[test]
    fn ray_hits_triangle_interior_only() {
        let vertices = [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0)];
        let hit = ray_vs_triangle(
            Vec3::new(0.5, 0.5, -1.0),
            Vec3::new(0.0, 0.0, 2.0),
            &vertices,
        );
        assert!(hit.is_some());
        let miss = ray_vs_triangle(
            Vec3::new(1.9, 1.9, -1.0),
            Vec3::new(0.0, 0.0, 2.0),
            &vertices,
        );
        assert!(miss.is_none());
    }

    #[test]
    fn capsule_side_wall_is_hit_between_caps() {
        let t = ray_vs_capsule(Vec3::new(-2.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0), 0.5, 0.25)
            .unwrap();
        assert_relative_eq!(t, (2.0 - 0.25) / 4.0, epsilon = 1e-4);
    }
}
