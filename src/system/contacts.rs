//! Persistent contact-pair tracking and event dispatch.
//!
//! Each update reports overlapping body pairs. Pairs seen for the first time
//! go through validate → added; pairs still overlapping get persisted; pairs
//! that stopped overlapping get removed. The per-pair `ContactSettings` live
//! in the record so listener mutations stick across steps. Capacity limits
//! mirror the boundary's error bits: pair list, manifold cache, and contact
//! constraint buffer can each run out independently.

use std::collections::HashMap;

use glam::Vec3;

use crate::core::body::Body;
use crate::core::contact::{
    CollideShapeResult, ContactEvents, ContactManifold, ContactSettings, ValidateResult,
};
use crate::core::id::{BodyId, SubShapeIdPair};
use crate::math::{vec3_from_rvec3, F32x4};

/// Pair key with the lower body id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey(BodyId, BodyId);

impl PairKey {
    pub fn new(a: BodyId, b: BodyId) -> Self {
        if a.0 <= b.0 {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

#[derive(Debug)]
struct ContactRecord {
    settings: ContactSettings,
    sub_pair: SubShapeIdPair,
    last_seen: u64,
}

/// Outcome of feeding one overlapping pair through the graph.
#[derive(Debug, PartialEq, Eq)]
pub enum PairOutcome {
    Added,
    Persisted,
    Rejected,
    /// The manifold cache is out of slots for new pairs.
    CacheFull,
}

#[derive(Debug, Default)]
pub struct ContactGraph {
    records: HashMap<PairKey, ContactRecord>,
    step: u64,
    max_records: usize,
}

impl ContactGraph {
    pub fn new(max_records: usize) -> Self {
        Self {
            records: HashMap::new(),
            step: 0,
            max_records,
        }
    }

    pub fn begin_step(&mut self) {
        self.step += 1;
    }

    /// Number of pairs that currently need contact constraints (sensors make
    /// no constraints).
    pub fn constraint_count(&self) -> usize {
        self.records
            .values()
            .filter(|r| !r.settings.is_sensor)
            .count()
    }

    pub fn pair_count(&self) -> usize {
        self.records.len()
    }

    /// Dispatches the right listener notification for one overlapping pair.
    pub fn process_pair(
        &mut self,
        body1: &Body,
        body2: &Body,
        listener: Option<&dyn ContactEvents>,
    ) -> PairOutcome {
        let key = PairKey::new(body1.id, body2.id);
        let manifold = manifold_for_pair(body1, body2);
        let sub_pair = SubShapeIdPair {
            first: crate::core::id::BodySubShape {
                body_id: body1.id,
                sub_shape_id: manifold.shape1_sub_shape_id,
            },
            second: crate::core::id::BodySubShape {
                body_id: body2.id,
                sub_shape_id: manifold.shape2_sub_shape_id,
            },
        };

        if let Some(record) = self.records.get_mut(&key) {
            record.last_seen = self.step;
            if let Some(listener) = listener {
                listener.on_contact_persisted(body1, body2, &manifold, &mut record.settings);
            }
            return PairOutcome::Persisted;
        }

        if let Some(listener) = listener {
            let result = listener.on_contact_validate(
                body1,
                body2,
                manifold.base_offset(),
                &collide_result_for_pair(body2, &manifold),
            );
            if matches!(
                result,
                ValidateResult::RejectContact | ValidateResult::RejectAllContacts
            ) {
                return PairOutcome::Rejected;
            }
        }

        if self.records.len() >= self.max_records {
            return PairOutcome::CacheFull;
        }

        let mut settings = ContactSettings::for_pair(body1, body2);
        if let Some(listener) = listener {
            listener.on_contact_added(body1, body2, &manifold, &mut settings);
        }
        self.records.insert(
            key,
            ContactRecord {
                settings,
                sub_pair,
                last_seen: self.step,
            },
        );
        PairOutcome::Added
    }

    /// Emits removal callbacks for every pair not seen this step.
    pub fn finish_step(&mut self, listener: Option<&dyn ContactEvents>) {
        let step = self.step;
        self.records.retain(|_, record| {
            if record.last_seen == step {
                return true;
            }
            if let Some(listener) = listener {
                listener.on_contact_removed(&record.sub_pair);
            }
            false
        });
    }

    /// Drops every pair touching `id`, with removal callbacks. Called when a
    /// body leaves the broad phase.
    pub fn purge_body(&mut self, id: BodyId, listener: Option<&dyn ContactEvents>) {
        self.records.retain(|key, record| {
            if key.0 != id && key.1 != id {
                return true;
            }
            if let Some(listener) = listener {
                listener.on_contact_removed(&record.sub_pair);
            }
            false
        });
    }

    /// Per-pair settings as last observed by the core (listener mutations
    /// included).
    pub fn pair_settings(&self, a: BodyId, b: BodyId) -> Option<ContactSettings> {
        self.records
            .get(&PairKey::new(a, b))
            .map(|record| record.settings)
    }
}

/// Builds a one-point manifold from the overlap of two world-space bounds.
/// The normal points from body 1 towards body 2 along the axis of least
/// penetration; points are relative to body 1's center of mass.
pub fn manifold_for_pair(body1: &Body, body2: &Body) -> ContactManifold {
    let b1 = body1.world_bounds();
    let b2 = body2.world_bounds();
    let overlap = b1.intersection(&b2);
    let size = overlap.max - overlap.min;

    let (axis, depth) = smallest_axis(size);
    let direction = vec3_from_rvec3(body2.center_of_mass_position() - body1.center_of_mass_position());
    let sign = if direction.dot(axis) >= 0.0 { 1.0 } else { -1.0 };
    let normal = axis * sign;

    let base_offset = body1.center_of_mass_position();
    let center = overlap.center();
    let relative = center - vec3_from_rvec3(base_offset);

    let mut manifold = ContactManifold {
        base_offset: crate::math::RealX4::from_rvec3(base_offset),
        normal: F32x4::from_vec3(normal),
        penetration_depth: depth,
        shape1_sub_shape_id: 0,
        shape2_sub_shape_id: 0,
        ..Default::default()
    };
    manifold
        .shape1_relative_contact
        .push(relative - normal * (depth * 0.5));
    manifold
        .shape2_relative_contact
        .push(relative + normal * (depth * 0.5));
    manifold
}

fn collide_result_for_pair(body2: &Body, manifold: &ContactManifold) -> CollideShapeResult {
    let base = vec3_from_rvec3(manifold.base_offset());
    let normal = manifold.normal();
    let p1 = manifold.shape1_relative_contact.points[0].to_vec3() + base;
    let p2 = manifold.shape2_relative_contact.points[0].to_vec3() + base;
    let mut result = CollideShapeResult {
        shape1_contact_point: F32x4::from_vec3(p1),
        shape2_contact_point: F32x4::from_vec3(p2),
        penetration_axis: F32x4::from_vec3(normal),
        penetration_depth: manifold.penetration_depth,
        shape1_sub_shape_id: manifold.shape1_sub_shape_id,
        shape2_sub_shape_id: manifold.shape2_sub_shape_id,
        body2_id: body2.id,
        ..Default::default()
    };
    result.shape1_face.push(p1);
    result.shape2_face.push(p2);
    result
}

fn smallest_axis(size: Vec3) -> (Vec3, f32) {
    if size.x <= size.y && size.x <= size.z {
        (Vec3::X, size.x)
    } else if size.y <= size.z {
        (Vec3::Y, size.y)
    } else {
        (Vec3::Z, size.z)
    }
}

/// True when layer filtering and motion types allow this pair to generate
/// contacts at all.
pub fn pair_can_collide(
    body1: &Body,
    body2: &Body,
    filter: &dyn crate::core::filter::LayerPairFilter,
) -> bool {
    if body1.id == body2.id {
        return false;
    }
    // Two non-moving bodies never make a pair.
    if body1.is_static() && body2.is_static() {
        return false;
    }
    // At least one side must be awake for the pair to do anything.
    if !body1.is_active() && !body2.is_active() {
        return false;
    }
    if !filter.should_collide(body1.object_layer, body2.object_layer) {
        return false;
    }
    // Same-group bodies with a shared filter are linked structures; skip.
    let g1 = &body1.collision_group;
    let g2 = &body2.collision_group;
    if !g1.filter.is_null()
        && g1.filter == g2.filter
        && g1.group_id == g2.group_id
        && g1.group_id != crate::core::filter::CollisionGroup::INVALID_GROUP
    {
        return false;
    }
    true
}

/// AABB overlap gate used by the pair sweep.
pub fn pair_overlaps(body1: &Body, body2: &Body) -> bool {
    body1.world_bounds().overlaps(&body2.world_bounds())
}
