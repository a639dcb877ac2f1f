//! Contract-violation checks exercised at the native layer, where the debug
//! assertion surfaces as a Rust panic that a test can observe. The same
//! preconditions guard the C entry points (null temp allocator, null job
//! system), where tripping them aborts the process instead.

use keel::core::filter::{BroadPhaseLayerMap, LayerPairFilter, ObjectVsBroadPhaseFilter};
use keel::ffi::{keel_create_factory, keel_register_default_allocator, keel_register_types};
use keel::{JobSystem, PhysicsSystem, TempAllocator};

struct TwoLayers;

impl BroadPhaseLayerMap for TwoLayers {
    fn num_broad_phase_layers(&self) -> u32 {
        2
    }

    fn broad_phase_layer(&self, layer: u16) -> u8 {
        layer as u8
    }
}

impl LayerPairFilter for TwoLayers {
    fn should_collide(&self, _layer1: u16, _layer2: u16) -> bool {
        true
    }
}

impl ObjectVsBroadPhaseFilter for TwoLayers {
    fn should_collide(&self, _layer: u16, _broad_phase_layer: u8) -> bool {
        true
    }
}

fn native_system() -> *mut PhysicsSystem {
    keel_register_default_allocator();
    keel_create_factory();
    keel_register_types();
    PhysicsSystem::create(
        16,
        0,
        16,
        16,
        Box::new(TwoLayers),
        Box::new(TwoLayers),
        Box::new(TwoLayers),
    )
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "collision_steps")]
fn update_rejects_a_nonpositive_step_count() {
    let system = native_system();
    let temp = TempAllocator::new(16 * 1024).unwrap();
    let jobs = JobSystem::new(16, 4, 1);
    unsafe {
        (*system).update(1.0 / 60.0, 0, 1, &temp, &jobs);
    }
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "delta_time")]
fn update_rejects_a_negative_time_step() {
    let system = native_system();
    let temp = TempAllocator::new(16 * 1024).unwrap();
    let jobs = JobSystem::new(16, 4, 1);
    unsafe {
        (*system).update(-1.0, 1, 1, &temp, &jobs);
    }
}
