//! Step-scoped scratch allocation and the worker pool handle.
//!
//! Both objects are caller-owned collaborators of the update: the temp
//! allocator provides bump-allocated scratch memory that lives for one update,
//! and the job system decides where integration work runs.

use std::cell::Cell;

use crate::core::alloc;

/// Bump allocator scoped to one simulation update. Allocations must be freed
/// in reverse order; everything is gone when the allocator is destroyed.
#[derive(Debug)]
pub struct TempAllocator {
    base: *mut u8,
    size: usize,
    top: Cell<usize>,
}

unsafe impl Send for TempAllocator {}

impl TempAllocator {
    const ALIGN: usize = 16;

    /// Reserves `size` bytes from the registered allocator. Returns `None`
    /// when the host refuses the block.
    pub fn new(size: u32) -> Option<Self> {
        let base = unsafe { alloc::alloc_block(size as usize, Self::ALIGN) };
        if base.is_null() {
            return None;
        }
        Some(Self {
            base,
            size: size as usize,
            top: Cell::new(0),
        })
    }

    /// Bump-allocates `size` bytes (16-byte aligned). Null when the block is
    /// exhausted; callers fall back to the registered heap.
    pub fn allocate(&self, size: usize) -> *mut u8 {
        let rounded = size.div_ceil(Self::ALIGN) * Self::ALIGN;
        let top = self.top.get();
        if top + rounded > self.size {
            log::warn!(
                "temp allocator exhausted: {} + {} > {}",
                top,
                rounded,
                self.size
            );
            return std::ptr::null_mut();
        }
        self.top.set(top + rounded);
        unsafe { self.base.add(top) }
    }

    /// Returns the most recent allocation. Out-of-order frees are a contract
    /// violation.
    pub fn free(&self, ptr: *mut u8, size: usize) {
        let rounded = size.div_ceil(Self::ALIGN) * Self::ALIGN;
        let top = self.top.get();
        debug_assert!(top >= rounded, "temp allocator free without allocation");
        let expected = unsafe { self.base.add(top - rounded) };
        debug_assert!(ptr == expected, "temp allocator frees must be LIFO");
        let _ = ptr;
        self.top.set(top - rounded);
    }

    pub fn used(&self) -> usize {
        self.top.get()
    }

    pub fn is_empty(&self) -> bool {
        self.top.get() == 0
    }
}

impl Drop for TempAllocator {
    fn drop(&mut self) {
        debug_assert!(self.is_empty(), "temp allocator destroyed while in use");
        unsafe { alloc::free_block(self.base) };
    }
}

/// Worker pool the update fans out across. With the `parallel` feature off
/// (or a single-threaded pool) everything runs inline on the calling thread.
#[derive(Debug)]
pub struct JobSystem {
    max_jobs: u32,
    max_barriers: u32,
    num_threads: usize,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl JobSystem {
    /// `num_threads < 0` picks the host's default parallelism.
    pub fn new(max_jobs: u32, max_barriers: u32, num_threads: i32) -> Self {
        debug_assert!(max_jobs > 0);
        let requested = if num_threads < 0 {
            0
        } else {
            num_threads as usize
        };
        #[cfg(feature = "parallel")]
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(requested)
            .thread_name(|i| format!("keel-worker-{i}"))
            .build()
            .map_err(|err| {
                log::warn!("falling back to inline execution: {err}");
                err
            })
            .ok();
        #[cfg(not(feature = "parallel"))]
        let _ = requested;

        Self {
            max_jobs,
            max_barriers,
            num_threads: if num_threads < 0 {
                std::thread::available_parallelism().map_or(1, |n| n.get())
            } else {
                num_threads.max(1) as usize
            },
            #[cfg(feature = "parallel")]
            pool,
        }
    }

    pub fn thread_count(&self) -> usize {
        self.num_threads
    }

    pub fn max_jobs(&self) -> u32 {
        self.max_jobs
    }

    pub fn max_barriers(&self) -> u32 {
        self.max_barriers
    }

    /// Runs `op` inside the worker pool so nested parallel iterators use it.
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        #[cfg(feature = "parallel")]
        if let Some(pool) = &self.pool {
            return pool.install(op);
        }
        op()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_allocator_is_lifo() {
        alloc::register_default();
        let temp = TempAllocator::new(1024).unwrap();
        let a = temp.allocate(100);
        let b = temp.allocate(60);
        assert!(!a.is_null() && !b.is_null());
        assert_eq!(temp.used(), 112 + 64);
        temp.free(b, 60);
        temp.free(a, 100);
        assert!(temp.is_empty());
    }

    #[test]
    fn temp_allocator_reports_exhaustion() {
        alloc::register_default();
        let temp = TempAllocator::new(64).unwrap();
        assert!(temp.allocate(128).is_null());
        assert!(temp.is_empty());
    }

    #[test]
    fn job_system_runs_work_inline_or_pooled() {
        let jobs = JobSystem::new(64, 8, 2);
        let result = jobs.install(|| (0..100).sum::<i32>());
        assert_eq!(result, 4950);
        assert!(jobs.thread_count() >= 1);
    }
}
