use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use keel::core::filter::{BroadPhaseLayerMap, LayerPairFilter, ObjectVsBroadPhaseFilter};
use keel::core::shape::ShapeSettings;
use keel::core::body::{Activation, BodyCreationSettings, MotionType};
use keel::ffi::{keel_create_factory, keel_register_default_allocator, keel_register_types};
use keel::{JobSystem, PhysicsSystem, Quat, RVec3, TempAllocator};

const DT: f32 = 1.0 / 60.0;

struct OpenLayers;

impl BroadPhaseLayerMap for OpenLayers {
    fn num_broad_phase_layers(&self) -> u32 {
        2
    }

    fn broad_phase_layer(&self, layer: u16) -> u8 {
        layer as u8
    }
}

impl LayerPairFilter for OpenLayers {
    fn should_collide(&self, _layer1: u16, _layer2: u16) -> bool {
        true
    }
}

impl ObjectVsBroadPhaseFilter for OpenLayers {
    fn should_collide(&self, _layer: u16, _broad_phase_layer: u8) -> bool {
        true
    }
}

fn prepare_system(body_count: u32) -> *mut PhysicsSystem {
    keel_register_default_allocator();
    keel_create_factory();
    keel_register_types();

    let system = PhysicsSystem::create(
        body_count.max(16),
        0,
        4096,
        4096,
        Box::new(OpenLayers),
        Box::new(OpenLayers),
        Box::new(OpenLayers),
    );
    let shape = ShapeSettings::sphere(0.45).create_shape().unwrap();
    unsafe {
        let iface = &*(*system).body_interface();
        for i in 0..body_count {
            let settings = BodyCreationSettings::new(
                shape,
                RVec3::new((i % 64) as _, (i / 64) as _, 0.0),
                Quat::IDENTITY,
                MotionType::Dynamic,
                1,
            );
            iface.create_and_add_body(&settings, Activation::Activate);
        }
        keel::core::shape::Shape::release(shape);
    }
    system
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("system_update");
    for &count in &[64u32, 256, 1024] {
        group.bench_with_input(BenchmarkId::new("bodies", count), &count, |b, &count| {
            let system = prepare_system(count);
            let temp = TempAllocator::new(4 * 1024 * 1024).unwrap();
            let jobs = JobSystem::new(256, 16, -1);
            b.iter(|| unsafe {
                black_box((*system).update(black_box(DT), 1, 1, &temp, &jobs));
            });
            unsafe { PhysicsSystem::destroy(system) };
        });
    }
    group.finish();
}

fn bench_ray_cast(c: &mut Criterion) {
    use keel::{RayCast, RayCastResult};

    let system = prepare_system(512);
    let query = unsafe { &*(*system).narrow_phase_query() };
    c.bench_function("narrow_phase_cast_ray", |b| {
        b.iter(|| {
            let mut ray = RayCast::default();
            ray.origin.0[0] = -10.0;
            ray.direction.0[0] = 120.0;
            let mut hit = RayCastResult::default();
            black_box(query.cast_ray(&ray, &mut hit, None, None, None));
        })
    });
    unsafe { PhysicsSystem::destroy(system) };
}

criterion_group!(benches, bench_update, bench_ray_cast);
criterion_main!(benches);
