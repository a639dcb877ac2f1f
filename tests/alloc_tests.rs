//! Reference-count protocol verified through a counting allocator.
//!
//! Lives in its own test binary so the process-wide allocator registration
//! cannot interfere with other tests.

use std::alloc::{alloc, dealloc, Layout};
use std::os::raw::c_void;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Mutex;

use keel::ffi::*;

static LIVE_BLOCKS: AtomicIsize = AtomicIsize::new(0);

// The counters are process-wide; run these tests one at a time.
static TEST_LOCK: Mutex<()> = Mutex::new(());

const HEADER: usize = 32;

unsafe extern "C" fn counting_aligned_alloc(size: usize, alignment: usize) -> *mut c_void {
    let align = alignment.max(16);
    let layout = Layout::from_size_align(size + HEADER.max(align), align).unwrap();
    let base = alloc(layout);
    if base.is_null() {
        return std::ptr::null_mut();
    }
    let prefix = HEADER.max(align);
    let user = base.add(prefix);
    (user.sub(std::mem::size_of::<usize>() * 3) as *mut usize).write(base as usize);
    (user.sub(std::mem::size_of::<usize>() * 2) as *mut usize).write(layout.size());
    (user.sub(std::mem::size_of::<usize>()) as *mut usize).write(layout.align());
    LIVE_BLOCKS.fetch_add(1, Ordering::SeqCst);
    user as *mut c_void
}

unsafe extern "C" fn counting_aligned_free(block: *mut c_void) {
    if block.is_null() {
        return;
    }
    let user = block as *mut u8;
    let base = (user.sub(std::mem::size_of::<usize>() * 3) as *const usize).read() as *mut u8;
    let size = (user.sub(std::mem::size_of::<usize>() * 2) as *const usize).read();
    let align = (user.sub(std::mem::size_of::<usize>()) as *const usize).read();
    dealloc(base, Layout::from_size_align(size, align).unwrap());
    LIVE_BLOCKS.fetch_sub(1, Ordering::SeqCst);
}

unsafe extern "C" fn counting_alloc(size: usize) -> *mut c_void {
    counting_aligned_alloc(size, 16)
}

unsafe extern "C" fn counting_free(block: *mut c_void) {
    counting_aligned_free(block)
}

#[test]
fn n_add_refs_and_n_plus_one_releases_destroy_exactly_once() {
    let _guard = TEST_LOCK.lock().unwrap();
    unsafe {
        keel_register_custom_allocator(
            counting_alloc,
            counting_free,
            counting_aligned_alloc,
            counting_aligned_free,
        );
    }
    keel_create_factory();
    keel_register_types();

    let baseline = LIVE_BLOCKS.load(Ordering::SeqCst);
    unsafe {
        // Shape settings: creation hands the caller the implicit reference.
        let settings = keel_sphere_shape_settings_create(1.0) as *mut KeelShapeSettings;
        assert_eq!(LIVE_BLOCKS.load(Ordering::SeqCst), baseline + 1);

        const N: u32 = 5;
        for _ in 0..N {
            keel_shape_settings_add_ref(settings);
        }
        assert_eq!(keel_shape_settings_get_ref_count(settings), N + 1);

        for _ in 0..N + 1 {
            keel_shape_settings_release(settings);
        }
        // Destroyed exactly once: the allocation count is back to baseline.
        assert_eq!(LIVE_BLOCKS.load(Ordering::SeqCst), baseline);
    }
}

#[test]
fn shapes_released_through_settings_leave_no_leaks() {
    let _guard = TEST_LOCK.lock().unwrap();
    unsafe {
        keel_register_custom_allocator(
            counting_alloc,
            counting_free,
            counting_aligned_alloc,
            counting_aligned_free,
        );
    }
    keel_create_factory();
    keel_register_types();

    let baseline = LIVE_BLOCKS.load(Ordering::SeqCst);
    unsafe {
        let settings = keel_capsule_shape_settings_create(0.6, 0.2) as *mut KeelShapeSettings;
        let shape_a = keel_shape_settings_create_shape(settings);
        let shape_b = keel_shape_settings_create_shape(settings);
        assert_eq!(shape_a, shape_b);

        keel_shape_release(shape_a);
        keel_shape_release(shape_b);
        // The cache still holds the shape until the settings go away.
        assert!(LIVE_BLOCKS.load(Ordering::SeqCst) > baseline);
        keel_shape_settings_release(settings);
        assert_eq!(LIVE_BLOCKS.load(Ordering::SeqCst), baseline);
    }
}
