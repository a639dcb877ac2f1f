//! Shapes and shape settings.
//!
//! Settings are mutable blueprints; `create_shape` turns a blueprint into an
//! immutable, reference-counted shape exactly once and then keeps handing the
//! same shape back. The settings hierarchy of the original object model is a
//! closed set of kinds, each carrying its own parameter payload.

use std::fmt;
use std::sync::atomic::{AtomicPtr, AtomicU32, Ordering};

use glam::{Mat3, Quat, Vec3};

use crate::config::DEFAULT_CONVEX_RADIUS;
use crate::core::alloc::{handle_alloc, handle_free};
use crate::core::body::MassProperties;
use crate::core::filter::PhysicsMaterial;
use crate::math::{Aabb, F32x16};

/// Density assumed for convex shapes unless overridden (kg/m^3, water).
pub const DEFAULT_DENSITY: f32 = 1000.0;

/// Validation failure while turning settings into a shape.
#[derive(Debug)]
pub enum ShapeError {
    /// A scalar parameter was out of range.
    InvalidParameter(&'static str),
    /// The supplied geometry has too few points or faces to be usable.
    DegenerateGeometry(&'static str),
    /// An index referenced a vertex that does not exist.
    IndexOutOfRange { index: u32, vertex_count: u32 },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::InvalidParameter(what) => write!(f, "invalid shape parameter: {what}"),
            ShapeError::DegenerateGeometry(what) => write!(f, "degenerate geometry: {what}"),
            ShapeError::IndexOutOfRange {
                index,
                vertex_count,
            } => write!(f, "index {index} out of range ({vertex_count} vertices)"),
        }
    }
}

impl std::error::Error for ShapeError {}

/// Broad classification of a shape, stable across the boundary.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Convex = 0,
    Compound = 1,
    Decorated = 2,
    Mesh = 3,
    HeightField = 4,
}

/// Concrete shape kind, stable across the boundary.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeSubType {
    Sphere = 0,
    Box = 1,
    Triangle = 2,
    Capsule = 3,
    TaperedCapsule = 4,
    Cylinder = 5,
    ConvexHull = 6,
    StaticCompound = 7,
    MutableCompound = 8,
    RotatedTranslated = 9,
    Scaled = 10,
    OffsetCenterOfMass = 11,
    Mesh = 12,
    HeightField = 13,
}

/// Owning reference to an immutable shape. Cloning bumps the shared count;
/// dropping releases it.
#[derive(Debug)]
pub struct ShapeRef(*const Shape);

impl ShapeRef {
    /// Takes ownership of one reference already counted on `ptr`.
    ///
    /// # Safety
    /// `ptr` must point at a live shape with a reference owed to the caller.
    pub unsafe fn from_raw(ptr: *const Shape) -> Self {
        debug_assert!(!ptr.is_null());
        Self(ptr)
    }

    #[inline]
    pub fn as_ptr(&self) -> *const Shape {
        self.0
    }

    #[inline]
    pub fn get(&self) -> &Shape {
        unsafe { &*self.0 }
    }
}

impl Clone for ShapeRef {
    fn clone(&self) -> Self {
        unsafe { Shape::add_ref(self.0) };
        Self(self.0)
    }
}

impl Drop for ShapeRef {
    fn drop(&mut self) {
        unsafe { Shape::release(self.0) };
    }
}

unsafe impl Send for ShapeRef {}
unsafe impl Sync for ShapeRef {}

/// One child of a compound shape.
#[derive(Debug, Clone)]
pub struct CompoundChild {
    pub position: Vec3,
    pub rotation: Quat,
    pub shape: ShapeRef,
    pub user_data: u32,
}

/// Immutable collision geometry. Never mutated after creation apart from the
/// reference count and user data.
#[derive(Debug)]
pub struct Shape {
    pub(crate) ref_count: AtomicU32,
    pub shape_type: ShapeType,
    pub sub_type: ShapeSubType,
    pub user_data: u64,
    pub density: f32,
    pub center_of_mass: Vec3,
    pub local_bounds: Aabb,
    pub kind: ShapeKind,
}

/// Geometry payload of a shape.
#[derive(Debug)]
pub enum ShapeKind {
    Sphere {
        radius: f32,
    },
    Box {
        half_extent: Vec3,
        convex_radius: f32,
    },
    Triangle {
        vertices: [Vec3; 3],
        convex_radius: f32,
    },
    Capsule {
        half_height: f32,
        radius: f32,
    },
    TaperedCapsule {
        half_height: f32,
        top_radius: f32,
        bottom_radius: f32,
    },
    Cylinder {
        half_height: f32,
        radius: f32,
        convex_radius: f32,
    },
    ConvexHull {
        points: Vec<Vec3>,
        max_convex_radius: f32,
    },
    HeightField {
        samples: Vec<f32>,
        size: u32,
        offset: Vec3,
        scale: Vec3,
    },
    Mesh {
        vertices: Vec<Vec3>,
        indices: Vec<u32>,
    },
    RotatedTranslated {
        rotation: Quat,
        translation: Vec3,
        inner: ShapeRef,
    },
    Scaled {
        scale: Vec3,
        inner: ShapeRef,
    },
    OffsetCenterOfMass {
        offset: Vec3,
        inner: ShapeRef,
    },
    Compound {
        children: Vec<CompoundChild>,
        mutable: bool,
    },
}

impl Shape {
    /// # Safety
    /// `ptr` must point at a live shape.
    pub unsafe fn add_ref(ptr: *const Shape) {
        debug_assert!(!ptr.is_null());
        (*ptr).ref_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Drops one reference, destroying the shape when the last one goes.
    ///
    /// # Safety
    /// `ptr` must point at a live shape with a reference owed by the caller.
    pub unsafe fn release(ptr: *const Shape) {
        debug_assert!(!ptr.is_null());
        if (*ptr).ref_count.fetch_sub(1, Ordering::AcqRel) == 1 {
            handle_free(ptr as *mut Shape);
        }
    }

    /// # Safety
    /// `ptr` must point at a live shape.
    pub unsafe fn ref_count(ptr: *const Shape) -> u32 {
        debug_assert!(!ptr.is_null());
        (*ptr).ref_count.load(Ordering::Acquire)
    }

    /// Mass and local-space inertia for this geometry at its density. Exact
    /// for spheres, boxes and cylinders; everything else falls back to the
    /// box of its local bounds.
    pub fn mass_properties(&self) -> MassProperties {
        match &self.kind {
            ShapeKind::Sphere { radius } => {
                let mass = self.density * 4.0 / 3.0 * std::f32::consts::PI * radius.powi(3);
                let inertia = 0.4 * mass * radius * radius;
                MassProperties::from_diagonal(mass, Vec3::splat(inertia))
            }
            ShapeKind::Box { half_extent, .. } => {
                box_mass_properties(self.density, *half_extent)
            }
            ShapeKind::Cylinder {
                half_height,
                radius,
                ..
            } => {
                let height = 2.0 * half_height;
                let mass = self.density * std::f32::consts::PI * radius * radius * height;
                let radial = mass * (3.0 * radius * radius + height * height) / 12.0;
                let axial = 0.5 * mass * radius * radius;
                MassProperties::from_diagonal(mass, Vec3::new(radial, axial, radial))
            }
            ShapeKind::Scaled { scale, inner } => {
                let mut inner_props = inner.get().mass_properties();
                inner_props.scale(*scale);
                inner_props
            }
            ShapeKind::RotatedTranslated { inner, .. }
            | ShapeKind::OffsetCenterOfMass { inner, .. } => inner.get().mass_properties(),
            ShapeKind::Compound { children, .. } => {
                let mass = children
                    .iter()
                    .map(|c| c.shape.get().mass_properties().mass)
                    .sum();
                let mut props = box_mass_properties(self.density, self.local_bounds.half_extents());
                props.set_mass_keep_shape(mass);
                props
            }
            _ => box_mass_properties(self.density, self.local_bounds.half_extents()),
        }
    }
}

fn box_mass_properties(density: f32, half_extent: Vec3) -> MassProperties {
    let full = half_extent * 2.0;
    let mass = density * full.x * full.y * full.z;
    let factor = mass / 12.0;
    MassProperties::from_diagonal(
        mass,
        Vec3::new(
            factor * (full.y * full.y + full.z * full.z),
            factor * (full.x * full.x + full.z * full.z),
            factor * (full.x * full.x + full.y * full.y),
        ),
    )
}

/// Owning reference to shape settings, used by compound/decorated blueprints.
#[derive(Debug)]
pub struct SettingsRef(*const ShapeSettings);

impl SettingsRef {
    /// # Safety
    /// `ptr` must point at live settings with a reference owed to the caller.
    pub unsafe fn from_raw(ptr: *const ShapeSettings) -> Self {
        debug_assert!(!ptr.is_null());
        Self(ptr)
    }

    #[inline]
    pub fn as_ptr(&self) -> *const ShapeSettings {
        self.0
    }

    #[inline]
    pub fn get(&self) -> &ShapeSettings {
        unsafe { &*self.0 }
    }
}

impl Clone for SettingsRef {
    fn clone(&self) -> Self {
        unsafe { ShapeSettings::add_ref(self.0) };
        Self(self.0)
    }
}

impl Drop for SettingsRef {
    fn drop(&mut self) {
        unsafe { ShapeSettings::release(self.0) };
    }
}

unsafe impl Send for SettingsRef {}
unsafe impl Sync for SettingsRef {}

/// One child blueprint of a compound settings object.
#[derive(Debug, Clone)]
pub struct CompoundChildSettings {
    pub position: Vec3,
    pub rotation: Quat,
    pub settings: SettingsRef,
    pub user_data: u32,
}

/// Mutable blueprint for a shape.
#[derive(Debug)]
pub struct ShapeSettings {
    pub(crate) ref_count: AtomicU32,
    pub user_data: u64,
    /// Convex-only: density used for mass properties.
    pub density: f32,
    /// Convex-only: surface material. Stored, never interpreted by the core.
    pub material: *const PhysicsMaterial,
    cached_shape: AtomicPtr<Shape>,
    pub kind: ShapeSettingsKind,
}

unsafe impl Send for ShapeSettings {}
unsafe impl Sync for ShapeSettings {}

/// Parameter payload of a shape blueprint.
#[derive(Debug)]
pub enum ShapeSettingsKind {
    Sphere {
        radius: f32,
    },
    Box {
        half_extent: Vec3,
        convex_radius: f32,
    },
    Triangle {
        vertices: [Vec3; 3],
        convex_radius: f32,
    },
    Capsule {
        half_height: f32,
        radius: f32,
    },
    TaperedCapsule {
        half_height: f32,
        top_radius: f32,
        bottom_radius: f32,
    },
    Cylinder {
        half_height: f32,
        radius: f32,
        convex_radius: f32,
    },
    ConvexHull {
        points: Vec<Vec3>,
        max_convex_radius: f32,
        max_error_convex_radius: f32,
        hull_tolerance: f32,
    },
    HeightField {
        samples: Vec<f32>,
        size: u32,
        offset: Vec3,
        scale: Vec3,
        block_size: u32,
        bits_per_sample: u32,
    },
    Mesh {
        vertices: Vec<Vec3>,
        indices: Vec<u32>,
        max_triangles_per_leaf: u32,
    },
    RotatedTranslated {
        rotation: Quat,
        translation: Vec3,
        inner: SettingsRef,
    },
    Scaled {
        scale: Vec3,
        inner: SettingsRef,
    },
    OffsetCenterOfMass {
        offset: Vec3,
        inner: SettingsRef,
    },
    Compound {
        children: Vec<CompoundChildSettings>,
        mutable: bool,
    },
}

impl ShapeSettings {
    pub fn new(kind: ShapeSettingsKind) -> Self {
        Self {
            ref_count: AtomicU32::new(1),
            user_data: 0,
            density: DEFAULT_DENSITY,
            material: std::ptr::null(),
            cached_shape: AtomicPtr::new(std::ptr::null_mut()),
            kind,
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Self::new(ShapeSettingsKind::Sphere { radius })
    }

    pub fn boxed(half_extent: Vec3) -> Self {
        Self::new(ShapeSettingsKind::Box {
            half_extent,
            convex_radius: DEFAULT_CONVEX_RADIUS,
        })
    }

    pub fn capsule(half_height: f32, radius: f32) -> Self {
        Self::new(ShapeSettingsKind::Capsule {
            half_height,
            radius,
        })
    }

    /// Whether this blueprint describes a convex leaf shape.
    pub fn is_convex(&self) -> bool {
        matches!(
            self.kind,
            ShapeSettingsKind::Sphere { .. }
                | ShapeSettingsKind::Box { .. }
                | ShapeSettingsKind::Triangle { .. }
                | ShapeSettingsKind::Capsule { .. }
                | ShapeSettingsKind::TaperedCapsule { .. }
                | ShapeSettingsKind::Cylinder { .. }
                | ShapeSettingsKind::ConvexHull { .. }
        )
    }

    pub fn is_decorated(&self) -> bool {
        matches!(
            self.kind,
            ShapeSettingsKind::RotatedTranslated { .. }
                | ShapeSettingsKind::Scaled { .. }
                | ShapeSettingsKind::OffsetCenterOfMass { .. }
        )
    }

    pub fn is_compound(&self) -> bool {
        matches!(self.kind, ShapeSettingsKind::Compound { .. })
    }

    /// # Safety
    /// `ptr` must point at live settings.
    pub unsafe fn add_ref(ptr: *const ShapeSettings) {
        debug_assert!(!ptr.is_null());
        (*ptr).ref_count.fetch_add(1, Ordering::Relaxed);
    }

    /// # Safety
    /// `ptr` must point at live settings with a reference owed by the caller.
    pub unsafe fn release(ptr: *const ShapeSettings) {
        debug_assert!(!ptr.is_null());
        if (*ptr).ref_count.fetch_sub(1, Ordering::AcqRel) == 1 {
            handle_free(ptr as *mut ShapeSettings);
        }
    }

    /// # Safety
    /// `ptr` must point at live settings.
    pub unsafe fn ref_count(ptr: *const ShapeSettings) -> u32 {
        debug_assert!(!ptr.is_null());
        (*ptr).ref_count.load(Ordering::Acquire)
    }

    /// Creates the shape described by these settings.
    ///
    /// The first call constructs the shape; later calls return the same
    /// pointer. Every call adds one reference owed to the caller. Mutating
    /// the settings after the first call does not change the created shape.
    pub fn create_shape(&self) -> Result<*const Shape, ShapeError> {
        let cached = self.cached_shape.load(Ordering::Acquire);
        if !cached.is_null() {
            unsafe { Shape::add_ref(cached) };
            return Ok(cached);
        }

        let shape = self.build()?;
        let ptr = handle_alloc(shape);
        if ptr.is_null() {
            return Err(ShapeError::InvalidParameter("allocation failed"));
        }
        match self.cached_shape.compare_exchange(
            std::ptr::null_mut(),
            ptr,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                // The cache keeps the creation reference; hand the caller
                // their own.
                unsafe { Shape::add_ref(ptr) };
                Ok(ptr)
            }
            Err(existing) => {
                // Lost a race with a concurrent first call; keep theirs.
                unsafe { handle_free(ptr) };
                unsafe { Shape::add_ref(existing) };
                Ok(existing)
            }
        }
    }

    fn build(&self) -> Result<Shape, ShapeError> {
        let (shape_type, sub_type) = self.classify();
        let kind = self.build_kind()?;
        let local_bounds = kind_bounds(&kind);
        let center_of_mass = kind_center_of_mass(&kind, &local_bounds);
        Ok(Shape {
            ref_count: AtomicU32::new(1),
            shape_type,
            sub_type,
            user_data: 0,
            density: self.density,
            center_of_mass,
            local_bounds,
            kind,
        })
    }

    fn classify(&self) -> (ShapeType, ShapeSubType) {
        match &self.kind {
            ShapeSettingsKind::Sphere { .. } => (ShapeType::Convex, ShapeSubType::Sphere),
            ShapeSettingsKind::Box { .. } => (ShapeType::Convex, ShapeSubType::Box),
            ShapeSettingsKind::Triangle { .. } => (ShapeType::Convex, ShapeSubType::Triangle),
            ShapeSettingsKind::Capsule { .. } => (ShapeType::Convex, ShapeSubType::Capsule),
            ShapeSettingsKind::TaperedCapsule { .. } => {
                (ShapeType::Convex, ShapeSubType::TaperedCapsule)
            }
            ShapeSettingsKind::Cylinder { .. } => (ShapeType::Convex, ShapeSubType::Cylinder),
            ShapeSettingsKind::ConvexHull { .. } => (ShapeType::Convex, ShapeSubType::ConvexHull),
            ShapeSettingsKind::HeightField { .. } => {
                (ShapeType::HeightField, ShapeSubType::HeightField)
            }
            ShapeSettingsKind::Mesh { .. } => (ShapeType::Mesh, ShapeSubType::Mesh),
            ShapeSettingsKind::RotatedTranslated { .. } => {
                (ShapeType::Decorated, ShapeSubType::RotatedTranslated)
            }
            ShapeSettingsKind::Scaled { .. } => (ShapeType::Decorated, ShapeSubType::Scaled),
            ShapeSettingsKind::OffsetCenterOfMass { .. } => {
                (ShapeType::Decorated, ShapeSubType::OffsetCenterOfMass)
            }
            ShapeSettingsKind::Compound { mutable, .. } => (
                ShapeType::Compound,
                if *mutable {
                    ShapeSubType::MutableCompound
                } else {
                    ShapeSubType::StaticCompound
                },
            ),
        }
    }

    fn build_kind(&self) -> Result<ShapeKind, ShapeError> {
        match &self.kind {
            ShapeSettingsKind::Sphere { radius } => {
                require_positive(*radius, "sphere radius")?;
                Ok(ShapeKind::Sphere { radius: *radius })
            }
            ShapeSettingsKind::Box {
                half_extent,
                convex_radius,
            } => {
                require_positive(half_extent.min_element(), "box half extent")?;
                if *convex_radius < 0.0 || *convex_radius > half_extent.min_element() {
                    return Err(ShapeError::InvalidParameter("box convex radius"));
                }
                Ok(ShapeKind::Box {
                    half_extent: *half_extent,
                    convex_radius: *convex_radius,
                })
            }
            ShapeSettingsKind::Triangle {
                vertices,
                convex_radius,
            } => {
                let area2 = (vertices[1] - vertices[0])
                    .cross(vertices[2] - vertices[0])
                    .length_squared();
                if area2 <= f32::EPSILON {
                    return Err(ShapeError::DegenerateGeometry("triangle"));
                }
                Ok(ShapeKind::Triangle {
                    vertices: *vertices,
                    convex_radius: *convex_radius,
                })
            }
            ShapeSettingsKind::Capsule {
                half_height,
                radius,
            } => {
                require_positive(*radius, "capsule radius")?;
                require_positive(*half_height, "capsule half height")?;
                Ok(ShapeKind::Capsule {
                    half_height: *half_height,
                    radius: *radius,
                })
            }
            ShapeSettingsKind::TaperedCapsule {
                half_height,
                top_radius,
                bottom_radius,
            } => {
                require_positive(*half_height, "tapered capsule half height")?;
                require_positive(*top_radius, "tapered capsule top radius")?;
                require_positive(*bottom_radius, "tapered capsule bottom radius")?;
                Ok(ShapeKind::TaperedCapsule {
                    half_height: *half_height,
                    top_radius: *top_radius,
                    bottom_radius: *bottom_radius,
                })
            }
            ShapeSettingsKind::Cylinder {
                half_height,
                radius,
                convex_radius,
            } => {
                require_positive(*radius, "cylinder radius")?;
                require_positive(*half_height, "cylinder half height")?;
                Ok(ShapeKind::Cylinder {
                    half_height: *half_height,
                    radius: *radius,
                    convex_radius: *convex_radius,
                })
            }
            ShapeSettingsKind::ConvexHull {
                points,
                max_convex_radius,
                ..
            } => {
                if points.len() < 4 {
                    return Err(ShapeError::DegenerateGeometry("convex hull needs 4 points"));
                }
                Ok(ShapeKind::ConvexHull {
                    points: points.clone(),
                    max_convex_radius: *max_convex_radius,
                })
            }
            ShapeSettingsKind::HeightField {
                samples,
                size,
                offset,
                scale,
                ..
            } => {
                if *size < 2 || samples.len() != (*size as usize).pow(2) {
                    return Err(ShapeError::DegenerateGeometry("height field sample grid"));
                }
                Ok(ShapeKind::HeightField {
                    samples: samples.clone(),
                    size: *size,
                    offset: *offset,
                    scale: *scale,
                })
            }
            ShapeSettingsKind::Mesh {
                vertices, indices, ..
            } => {
                if vertices.len() < 3 || indices.len() < 3 || indices.len() % 3 != 0 {
                    return Err(ShapeError::DegenerateGeometry("triangle mesh"));
                }
                if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
                    return Err(ShapeError::IndexOutOfRange {
                        index: bad,
                        vertex_count: vertices.len() as u32,
                    });
                }
                Ok(ShapeKind::Mesh {
                    vertices: vertices.clone(),
                    indices: indices.clone(),
                })
            }
            ShapeSettingsKind::RotatedTranslated {
                rotation,
                translation,
                inner,
            } => Ok(ShapeKind::RotatedTranslated {
                rotation: *rotation,
                translation: *translation,
                inner: create_inner(inner)?,
            }),
            ShapeSettingsKind::Scaled { scale, inner } => {
                if scale.abs().min_element() <= f32::EPSILON {
                    return Err(ShapeError::InvalidParameter("scale"));
                }
                Ok(ShapeKind::Scaled {
                    scale: *scale,
                    inner: create_inner(inner)?,
                })
            }
            ShapeSettingsKind::OffsetCenterOfMass { offset, inner } => {
                Ok(ShapeKind::OffsetCenterOfMass {
                    offset: *offset,
                    inner: create_inner(inner)?,
                })
            }
            ShapeSettingsKind::Compound { children, mutable } => {
                if children.is_empty() {
                    return Err(ShapeError::DegenerateGeometry("compound without children"));
                }
                let mut built = Vec::with_capacity(children.len());
                for child in children {
                    built.push(CompoundChild {
                        position: child.position,
                        rotation: child.rotation,
                        shape: create_inner(&child.settings)?,
                        user_data: child.user_data,
                    });
                }
                Ok(ShapeKind::Compound {
                    children: built,
                    mutable: *mutable,
                })
            }
        }
    }
}

impl Drop for ShapeSettings {
    fn drop(&mut self) {
        let cached = self.cached_shape.load(Ordering::Acquire);
        if !cached.is_null() {
            unsafe { Shape::release(cached) };
        }
    }
}

fn require_positive(value: f32, what: &'static str) -> Result<(), ShapeError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ShapeError::InvalidParameter(what))
    }
}

fn create_inner(inner: &SettingsRef) -> Result<ShapeRef, ShapeError> {
    let ptr = inner.get().create_shape()?;
    // create_shape already counted the reference this ShapeRef owns.
    Ok(unsafe { ShapeRef::from_raw(ptr) })
}

fn kind_bounds(kind: &ShapeKind) -> Aabb {
    match kind {
        ShapeKind::Sphere { radius } => {
            Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(*radius))
        }
        ShapeKind::Box { half_extent, .. } => {
            Aabb::from_center_half_extents(Vec3::ZERO, *half_extent)
        }
        ShapeKind::Triangle { vertices, .. } => {
            let mut b = Aabb::INVALID;
            for v in vertices {
                b.union_point(*v);
            }
            b
        }
        ShapeKind::Capsule {
            half_height,
            radius,
        } => Aabb::from_center_half_extents(
            Vec3::ZERO,
            Vec3::new(*radius, half_height + radius, *radius),
        ),
        ShapeKind::TaperedCapsule {
            half_height,
            top_radius,
            bottom_radius,
        } => {
            let r = top_radius.max(*bottom_radius);
            Aabb::from_center_half_extents(Vec3::ZERO, Vec3::new(r, half_height + r, r))
        }
        ShapeKind::Cylinder {
            half_height,
            radius,
            ..
        } => Aabb::from_center_half_extents(Vec3::ZERO, Vec3::new(*radius, *half_height, *radius)),
        ShapeKind::ConvexHull { points, .. } => {
            let mut b = Aabb::INVALID;
            for p in points {
                b.union_point(*p);
            }
            b
        }
        ShapeKind::HeightField {
            samples,
            size,
            offset,
            scale,
        } => {
            let mut min_y = f32::MAX;
            let mut max_y = f32::MIN;
            for &s in samples {
                min_y = min_y.min(s);
                max_y = max_y.max(s);
            }
            let extent = (*size - 1) as f32;
            let mut b = Aabb::new(
                Vec3::new(0.0, min_y, 0.0),
                Vec3::new(extent, max_y, extent),
            );
            b.min = *offset + b.min * *scale;
            b.max = *offset + b.max * *scale;
            Aabb::new(b.min.min(b.max), b.min.max(b.max))
        }
        ShapeKind::Mesh { vertices, .. } => {
            let mut b = Aabb::INVALID;
            for v in vertices {
                b.union_point(*v);
            }
            b
        }
        ShapeKind::RotatedTranslated {
            rotation,
            translation,
            inner,
        } => inner.get().local_bounds.transformed(*rotation, *translation),
        ShapeKind::Scaled { scale, inner } => {
            let b = inner.get().local_bounds;
            let a = b.min * *scale;
            let c = b.max * *scale;
            Aabb::new(a.min(c), a.max(c))
        }
        ShapeKind::OffsetCenterOfMass { inner, .. } => inner.get().local_bounds,
        ShapeKind::Compound { children, .. } => {
            let mut b = Aabb::INVALID;
            for child in children {
                b.union(
                    &child
                        .shape
                        .get()
                        .local_bounds
                        .transformed(child.rotation, child.position),
                );
            }
            b
        }
    }
}

fn kind_center_of_mass(kind: &ShapeKind, bounds: &Aabb) -> Vec3 {
    match kind {
        ShapeKind::Sphere { .. }
        | ShapeKind::Box { .. }
        | ShapeKind::Capsule { .. }
        | ShapeKind::TaperedCapsule { .. }
        | ShapeKind::Cylinder { .. } => Vec3::ZERO,
        ShapeKind::Triangle { vertices, .. } => {
            (vertices[0] + vertices[1] + vertices[2]) / 3.0
        }
        ShapeKind::ConvexHull { points, .. } => {
            points.iter().copied().sum::<Vec3>() / points.len() as f32
        }
        ShapeKind::RotatedTranslated {
            rotation,
            translation,
            inner,
        } => *rotation * inner.get().center_of_mass + *translation,
        ShapeKind::Scaled { scale, inner } => inner.get().center_of_mass * *scale,
        ShapeKind::OffsetCenterOfMass { offset, inner } => inner.get().center_of_mass + *offset,
        ShapeKind::Compound { children, .. } => {
            let mut total_mass = 0.0;
            let mut weighted = Vec3::ZERO;
            for child in children {
                let mass = child.shape.get().mass_properties().mass.max(f32::EPSILON);
                total_mass += mass;
                weighted += mass * (child.rotation * child.shape.get().center_of_mass + child.position);
            }
            weighted / total_mass
        }
        _ => bounds.center(),
    }
}

/// Inertia helpers shared with body-creation mass overrides.
pub(crate) fn diagonal_inertia_mat(diagonal: Vec3) -> F32x16 {
    F32x16::from_mat4(glam::Mat4::from_mat3(Mat3::from_diagonal(diagonal)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alloc;
    use approx::assert_relative_eq;

    fn settings_handle(settings: ShapeSettings) -> *const ShapeSettings {
        alloc::register_default();
        handle_alloc(settings)
    }

    #[test]
    fn create_shape_is_idempotent_and_counts_references() {
        let settings = settings_handle(ShapeSettings::sphere(0.5));
        unsafe {
            let first = (*settings).create_shape().unwrap();
            let count_after_first = Shape::ref_count(first);
            let second = (*settings).create_shape().unwrap();
            assert_eq!(first, second);
            assert_eq!(Shape::ref_count(first), count_after_first + 1);
            Shape::release(first);
            Shape::release(second);
            ShapeSettings::release(settings);
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        alloc::register_default();
        let bad = ShapeSettings::sphere(-1.0);
        assert!(bad.create_shape().is_err());

        let degenerate = ShapeSettings::new(ShapeSettingsKind::Mesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            indices: vec![0, 1, 7],
            max_triangles_per_leaf: 8,
        });
        assert!(matches!(
            degenerate.create_shape(),
            Err(ShapeError::IndexOutOfRange { index: 7, .. })
        ));
    }

    #[test]
    fn sphere_mass_matches_volume_times_density() {
        alloc::register_default();
        let settings = ShapeSettings::sphere(1.0);
        let shape = settings.create_shape().unwrap();
        let props = unsafe { (*shape).mass_properties() };
        assert_relative_eq!(
            props.mass,
            DEFAULT_DENSITY * 4.0 / 3.0 * std::f32::consts::PI,
            epsilon = 1e-2
        );
        unsafe { Shape::release(shape) };
    }

    #[test]
    fn compound_bounds_union_children() {
        alloc::register_default();
        let sphere = handle_alloc(ShapeSettings::sphere(1.0));
        let child = CompoundChildSettings {
            position: Vec3::new(3.0, 0.0, 0.0),
            rotation: Quat::IDENTITY,
            settings: unsafe {
                ShapeSettings::add_ref(sphere);
                SettingsRef::from_raw(sphere)
            },
            user_data: 0,
        };
        let compound = ShapeSettings::new(ShapeSettingsKind::Compound {
            children: vec![child],
            mutable: false,
        });
        let shape = compound.create_shape().unwrap();
        unsafe {
            assert_relative_eq!((*shape).local_bounds.max.x, 4.0, epsilon = 1e-5);
            Shape::release(shape);
            ShapeSettings::release(sphere);
        }
    }
}
