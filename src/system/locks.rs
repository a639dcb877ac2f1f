//! Scoped per-body read/write locking across the boundary.
//!
//! A lock guard is constructed in caller-provided storage by the lock call
//! and must be destroyed by the matching unlock call. Locks are sharded: a
//! body id hashes onto one of a fixed set of rwlocks owned by the physics
//! system. The no-lock interface variant hands out guards with a null mutex
//! for callers that manage exclusion themselves.

use parking_lot::lock_api::RawRwLock as RawRwLockApi;
use parking_lot::RawRwLock;

use crate::core::body::Body;
use crate::core::id::BodyId;
use crate::system::PhysicsSystem;

/// One lock shard. Opaque across the boundary.
#[repr(transparent)]
pub struct SharedMutex(RawRwLock);

impl SharedMutex {
    pub fn new() -> Self {
        Self(RawRwLockApi::INIT)
    }

    #[inline]
    pub fn lock_shared(&self) {
        self.0.lock_shared();
    }

    /// # Safety
    /// Must be paired with a prior `lock_shared` on this thread.
    #[inline]
    pub unsafe fn unlock_shared(&self) {
        self.0.unlock_shared();
    }

    #[inline]
    pub fn lock_exclusive(&self) {
        self.0.lock_exclusive();
    }

    /// # Safety
    /// Must be paired with a prior `lock_exclusive` on this thread.
    #[inline]
    pub unsafe fn unlock_exclusive(&self) {
        self.0.unlock_exclusive();
    }
}

impl Default for SharedMutex {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard state for a read lock, constructed in caller storage.
#[repr(C)]
pub struct BodyLockRead {
    pub lock_interface: *const BodyLockInterface,
    pub mutex: *mut SharedMutex,
    pub body: *const Body,
}

/// Guard state for a write lock, constructed in caller storage.
#[repr(C)]
pub struct BodyLockWrite {
    pub lock_interface: *const BodyLockInterface,
    pub mutex: *mut SharedMutex,
    pub body: *mut Body,
}

/// Hands out per-body lock guards. Owned by a physics system; `locking =
/// false` is the no-lock variant sharing the same shard array.
pub struct BodyLockInterface {
    pub(crate) system: *const PhysicsSystem,
    pub(crate) locking: bool,
}

unsafe impl Send for BodyLockInterface {}
unsafe impl Sync for BodyLockInterface {}

impl BodyLockInterface {
    fn system(&self) -> &PhysicsSystem {
        unsafe { &*self.system }
    }

    fn shard(&self, id: BodyId) -> *mut SharedMutex {
        let shards = self.system().lock_shards();
        let index = id.index() as usize & (shards.len() - 1);
        &shards[index] as *const SharedMutex as *mut SharedMutex
    }

    /// Acquires a shared lock and resolves the body. `out.body` is null when
    /// the id is stale; the lock is held either way and must be released
    /// through [`Self::unlock_read`].
    pub fn lock_read(&self, id: BodyId, out: &mut BodyLockRead) {
        out.lock_interface = self;
        if self.locking {
            let mutex = self.shard(id);
            unsafe { (*mutex).lock_shared() };
            out.mutex = mutex;
        } else {
            out.mutex = std::ptr::null_mut();
        }
        out.body = self
            .system()
            .body_manager()
            .get_body_ptr(id)
            .map_or(std::ptr::null(), |p| p as *const Body);
    }

    pub fn unlock_read(&self, lock: &mut BodyLockRead) {
        debug_assert!(lock.lock_interface == self as *const _);
        if !lock.mutex.is_null() {
            unsafe { (*lock.mutex).unlock_shared() };
            lock.mutex = std::ptr::null_mut();
        }
        lock.body = std::ptr::null();
    }

    /// Exclusive-lock counterpart of [`Self::lock_read`].
    pub fn lock_write(&self, id: BodyId, out: &mut BodyLockWrite) {
        out.lock_interface = self;
        if self.locking {
            let mutex = self.shard(id);
            unsafe { (*mutex).lock_exclusive() };
            out.mutex = mutex;
        } else {
            out.mutex = std::ptr::null_mut();
        }
        out.body = self
            .system()
            .body_manager()
            .get_body_ptr(id)
            .unwrap_or(std::ptr::null_mut());
    }

    pub fn unlock_write(&self, lock: &mut BodyLockWrite) {
        debug_assert!(lock.lock_interface == self as *const _);
        if !lock.mutex.is_null() {
            unsafe { (*lock.mutex).unlock_exclusive() };
            lock.mutex = std::ptr::null_mut();
        }
        lock.body = std::ptr::null_mut();
    }
}
