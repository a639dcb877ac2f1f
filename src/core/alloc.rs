//! Process-wide allocator registration.
//!
//! Every object whose pointer crosses the C boundary (bodies, motion
//! properties, shapes, settings, constraints, systems, temp-allocator blocks)
//! is allocated through the registered allocation functions, so a host can
//! route the core's memory through its own heap and account for it. The
//! default registration is backed by the Rust global allocator with a hidden
//! header that remembers the original layout.

use std::alloc::{alloc as rust_alloc, dealloc as rust_dealloc, Layout};
use std::os::raw::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};

pub type AllocateFn = unsafe extern "C" fn(size: usize) -> *mut c_void;
pub type FreeFn = unsafe extern "C" fn(block: *mut c_void);
pub type AlignedAllocateFn = unsafe extern "C" fn(size: usize, alignment: usize) -> *mut c_void;
pub type AlignedFreeFn = unsafe extern "C" fn(block: *mut c_void);

static ALLOCATE: AtomicUsize = AtomicUsize::new(0);
static FREE: AtomicUsize = AtomicUsize::new(0);
static ALIGNED_ALLOCATE: AtomicUsize = AtomicUsize::new(0);
static ALIGNED_FREE: AtomicUsize = AtomicUsize::new(0);

/// Minimum alignment handed out by the unaligned allocation entry point.
pub const MIN_ALIGNMENT: usize = 16;

#[repr(C)]
struct BlockHeader {
    base: *mut u8,
    size: usize,
    align: usize,
}

fn header_prefix(align: usize) -> usize {
    // Room for the header, rounded up to the requested alignment.
    let header = std::mem::size_of::<BlockHeader>();
    let align = if align < std::mem::align_of::<BlockHeader>() {
        std::mem::align_of::<BlockHeader>()
    } else {
        align
    };
    header.div_ceil(align) * align
}

unsafe extern "C" fn default_aligned_allocate(size: usize, alignment: usize) -> *mut c_void {
    let align = alignment.max(std::mem::align_of::<BlockHeader>());
    let prefix = header_prefix(align);
    let Ok(layout) = Layout::from_size_align(size + prefix, align) else {
        return std::ptr::null_mut();
    };
    let base = rust_alloc(layout);
    if base.is_null() {
        return std::ptr::null_mut();
    }
    let user = base.add(prefix);
    let header = user.sub(std::mem::size_of::<BlockHeader>()) as *mut BlockHeader;
    header.write(BlockHeader {
        base,
        size: size + prefix,
        align,
    });
    user as *mut c_void
}

unsafe extern "C" fn default_aligned_free(block: *mut c_void) {
    if block.is_null() {
        return;
    }
    let header = (block as *mut u8).sub(std::mem::size_of::<BlockHeader>()) as *const BlockHeader;
    let BlockHeader { base, size, align } = header.read();
    rust_dealloc(base, Layout::from_size_align_unchecked(size, align));
}

unsafe extern "C" fn default_allocate(size: usize) -> *mut c_void {
    default_aligned_allocate(size, MIN_ALIGNMENT)
}

unsafe extern "C" fn default_free(block: *mut c_void) {
    default_aligned_free(block)
}

/// Installs the global-allocator-backed default functions.
pub fn register_default() {
    register_custom(
        default_allocate,
        default_free,
        default_aligned_allocate,
        default_aligned_free,
    );
}

/// Installs caller-supplied allocation functions. The aligned pair must honor
/// arbitrary power-of-two alignments; the plain pair must return 16-byte
/// aligned blocks.
pub fn register_custom(
    allocate: AllocateFn,
    free: FreeFn,
    aligned_allocate: AlignedAllocateFn,
    aligned_free: AlignedFreeFn,
) {
    ALLOCATE.store(allocate as usize, Ordering::Release);
    FREE.store(free as usize, Ordering::Release);
    ALIGNED_ALLOCATE.store(aligned_allocate as usize, Ordering::Release);
    ALIGNED_FREE.store(aligned_free as usize, Ordering::Release);
    log::debug!("allocator registered");
}

/// Whether any allocator has been registered yet. Allocating before
/// registration is a contract violation.
pub fn is_registered() -> bool {
    ALIGNED_ALLOCATE.load(Ordering::Acquire) != 0
}

#[inline]
fn load_fn(slot: &AtomicUsize) -> usize {
    let raw = slot.load(Ordering::Acquire);
    debug_assert!(raw != 0, "allocator used before registration");
    raw
}

/// Allocates an untyped block through the registered aligned allocator.
pub unsafe fn alloc_block(size: usize, align: usize) -> *mut u8 {
    let f: AlignedAllocateFn = std::mem::transmute(load_fn(&ALIGNED_ALLOCATE));
    f(size, align) as *mut u8
}

/// Frees a block obtained from [`alloc_block`].
pub unsafe fn free_block(block: *mut u8) {
    let f: AlignedFreeFn = std::mem::transmute(load_fn(&ALIGNED_FREE));
    f(block as *mut c_void)
}

/// Moves `value` onto the registered heap and returns a stable raw pointer.
/// Returns null if the host allocator refuses the request.
pub fn handle_alloc<T>(value: T) -> *mut T {
    let align = std::mem::align_of::<T>().max(MIN_ALIGNMENT);
    unsafe {
        let ptr = alloc_block(std::mem::size_of::<T>(), align) as *mut T;
        if ptr.is_null() {
            return std::ptr::null_mut();
        }
        ptr.write(value);
        ptr
    }
}

/// Drops and frees a pointer produced by [`handle_alloc`].
///
/// # Safety
/// `ptr` must have come from [`handle_alloc`] with the same `T`, and must not
/// be used afterwards.
pub unsafe fn handle_free<T>(ptr: *mut T) {
    if ptr.is_null() {
        return;
    }
    std::ptr::drop_in_place(ptr);
    free_block(ptr as *mut u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allocator_round_trips_alignments() {
        register_default();
        for align in [16usize, 32, 64, 128] {
            unsafe {
                let block = alloc_block(100, align);
                assert!(!block.is_null());
                assert_eq!(block as usize % align, 0);
                block.write_bytes(0xAB, 100);
                free_block(block);
            }
        }
    }

    #[test]
    fn handle_alloc_preserves_value() {
        register_default();
        let ptr = handle_alloc([1u64, 2, 3]);
        unsafe {
            assert_eq!((*ptr)[2], 3);
            handle_free(ptr);
        }
    }
}
