//! Intrusive reference counting shared by every graph object.
//!
//! Each reference-counted object embeds a [`RefCount`]: an integer counter
//! guarded by its own mutex. There is no global lock, and counters never
//! reference each other, so there is no lock ordering between objects.
//!
//! The counter itself never frees anything. [`RefCount::release`] reports a
//! [`Release`] outcome and the owner of the allocation (normally
//! [`RefPtr`](crate::handle::RefPtr)) performs the destruction after the
//! counter's guard has been dropped.
//!
//! # Destruction floor
//!
//! Destruction is requested whenever the post-decrement value is below 1,
//! not only on the exact 1 → 0 transition. A release on a counter that is
//! already at 0 (an over-release) therefore still asks for destruction. It is
//! reported separately as [`Release::OverReleased`] and logged, so the
//! double-release is visible instead of silently masked.
//!
//! # Who may count
//!
//! Only this crate changes a counter. Outside code can read it through
//! [`RefCount::count`] but cannot retain or release it, so a live handle can
//! never be freed from under its holders:
//!
//! ```compile_fail
//! use plv_rs::{Element, RefCounted};
//!
//! let element = Element::new("E1");
//! element.ref_count().release();
//! ```

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Outcome of a single [`RefCount::release`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Other references remain; carries the remaining count.
    Alive(usize),
    /// The count dropped from 1 to 0. The caller must destroy the object.
    Destroy,
    /// The count was already at or below 0. The caller must still destroy
    /// the object, but this indicates an unbalanced retain/release pair.
    OverReleased,
}

impl Release {
    /// Whether the caller is responsible for destroying the object.
    #[inline]
    pub fn should_destroy(self) -> bool {
        !matches!(self, Release::Alive(_))
    }
}

/// Mutex-guarded reference counter. Starts at 0.
///
/// Cloning a `RefCount` yields a fresh counter at 0: a copied object never
/// inherits the original's references. Types that embed a `RefCount` and
/// derive `Clone` get this behavior for free.
pub struct RefCount {
    count: Mutex<i64>,
}

impl RefCount {
    pub const fn new() -> Self {
        Self {
            count: Mutex::new(0),
        }
    }

    // The counter is always left consistent, so a poisoned guard is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, i64> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Increment the counter. Returns the new count.
    pub(crate) fn retain(&self) -> usize {
        let mut count = self.lock();
        *count += 1;
        (*count).max(0) as usize
    }

    /// Decrement the counter.
    ///
    /// The guard is dropped before returning, so a caller acting on a
    /// destroying outcome never holds this object's lock while it runs
    /// destructors that may lock other objects.
    pub(crate) fn release(&self) -> Release {
        let mut count = self.lock();
        let before = *count;
        *count -= 1;
        let after = *count;
        drop(count);

        if after >= 1 {
            return Release::Alive(after as usize);
        }
        if before < 1 {
            // Only reachable if an `unsafe` contract was broken.
            tracing::warn!(
                count = before,
                "release() called on an object with no outstanding references"
            );
            return Release::OverReleased;
        }
        Release::Destroy
    }

    /// Current number of references.
    ///
    /// Advisory only: another thread may change the count as soon as the
    /// lock is dropped. Never reports a negative value.
    pub fn count(&self) -> usize {
        (*self.lock()).max(0) as usize
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RefCount {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl fmt::Debug for RefCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefCount({})", self.count())
    }
}

/// Implemented by every object whose lifetime is managed by a [`RefCount`].
///
/// Trait objects such as `dyn PipelineElement` inherit this as a supertrait,
/// so a handle can release them without knowing the concrete type. The
/// concrete type's `Drop` still runs on destruction.
///
/// # Safety
///
/// `ref_count` must always return the same counter, owned exclusively by
/// `self` and embedded in it. [`RefPtr`](crate::handle::RefPtr) frees the
/// object when that counter reaches the floor, so a counter shared with
/// another object, or one swapped out over the object's lifetime, leads to a
/// use-after-free.
pub unsafe trait RefCounted {
    /// The counter embedded in this object.
    fn ref_count(&self) -> &RefCount;
}
