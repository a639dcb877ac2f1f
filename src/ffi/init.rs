//! Process-wide registration: allocator, factory, type registry, trace sink.
//!
//! Allocator and factory/type registration must happen once, before any
//! other entry point; using the boundary without them is a contract
//! violation caught by debug assertions.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::alloc;
use crate::utils::logging::{self, TraceHandler};

static FACTORY_CREATED: AtomicBool = AtomicBool::new(false);
static TYPES_REGISTERED: AtomicBool = AtomicBool::new(false);

/// Debug-checks the "register before use" contract.
pub(crate) fn debug_check_initialized() {
    debug_assert!(alloc::is_registered(), "no allocator registered");
    debug_assert!(
        FACTORY_CREATED.load(Ordering::Acquire),
        "keel_create_factory has not been called"
    );
    debug_assert!(
        TYPES_REGISTERED.load(Ordering::Acquire),
        "keel_register_types has not been called"
    );
}

#[no_mangle]
pub extern "C" fn keel_register_default_allocator() {
    alloc::register_default();
}

/// Routes every boundary-crossing allocation through the supplied functions.
/// The plain pair must hand out 16-byte aligned blocks.
#[no_mangle]
pub unsafe extern "C" fn keel_register_custom_allocator(
    in_alloc: alloc::AllocateFn,
    in_free: alloc::FreeFn,
    in_aligned_alloc: alloc::AlignedAllocateFn,
    in_aligned_free: alloc::AlignedFreeFn,
) {
    alloc::register_custom(in_alloc, in_free, in_aligned_alloc, in_aligned_free);
}

#[no_mangle]
pub extern "C" fn keel_create_factory() {
    FACTORY_CREATED.store(true, Ordering::Release);
    logging::trace_line("factory created");
}

#[no_mangle]
pub extern "C" fn keel_destroy_factory() {
    FACTORY_CREATED.store(false, Ordering::Release);
    TYPES_REGISTERED.store(false, Ordering::Release);
    logging::trace_line("factory destroyed");
}

#[no_mangle]
pub extern "C" fn keel_register_types() {
    debug_assert!(
        FACTORY_CREATED.load(Ordering::Acquire),
        "create the factory before registering types"
    );
    TYPES_REGISTERED.store(true, Ordering::Release);
    logging::trace_line("types registered");
}

/// Installs a presentation-only sink for diagnostic text. Pass null to clear.
#[no_mangle]
pub extern "C" fn keel_register_trace_handler(handler: Option<TraceHandler>) {
    logging::set_trace_handler(handler);
}
