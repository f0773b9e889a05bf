//! Owning handle for reference-counted objects.
//!
//! [`RefPtr`] is the only sanctioned way to hold a pointer to a
//! [`RefCounted`] object. It retains on acquire and releases on drop, and it
//! destroys the referent when the release reaches the destruction floor.
//!
//! Handles work with trait objects: `RefPtr<dyn PipelineElement>` releases
//! through the `RefCounted` supertrait and drops the concrete element.

use crate::error::{PlvError, Result};
use crate::refcount::RefCounted;
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;

/// Shared owning handle to a heap-allocated [`RefCounted`] object.
///
/// A handle may be null. Dereferencing a null handle through [`Deref`] is a
/// precondition violation and panics; use [`RefPtr::get`] or
/// [`RefPtr::try_get`] when the handle may be null.
pub struct RefPtr<T: RefCounted + ?Sized> {
    ptr: Option<NonNull<T>>,
    _owns: PhantomData<Box<T>>,
}

// SAFETY: the counter is mutex-guarded and the referent is only shared
// immutably, so handles may cross threads whenever `T` itself may.
unsafe impl<T: RefCounted + ?Sized + Send + Sync> Send for RefPtr<T> {}
unsafe impl<T: RefCounted + ?Sized + Send + Sync> Sync for RefPtr<T> {}

impl<T: RefCounted> RefPtr<T> {
    /// Move `value` to the heap and take the first reference to it.
    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }
}

impl<T: RefCounted + ?Sized> RefPtr<T> {
    /// Take ownership of a boxed object and retain it.
    ///
    /// Accepts unsized boxes, so `Box<dyn PipelineElement>` becomes a
    /// `RefPtr<dyn PipelineElement>`.
    pub fn from_box(value: Box<T>) -> Self {
        let ptr = NonNull::from(Box::leak(value));
        // SAFETY: just leaked from a live box.
        unsafe { ptr.as_ref() }.ref_count().retain();
        Self {
            ptr: Some(ptr),
            _owns: PhantomData,
        }
    }

    /// A handle with no referent.
    pub const fn null() -> Self {
        Self {
            ptr: None,
            _owns: PhantomData,
        }
    }

    /// Wrap a raw referent, retaining it. A null pointer yields a null handle.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a live object that was allocated by
    /// [`RefPtr::new`] / [`RefPtr::from_box`] and is still kept alive by at
    /// least one other handle for the duration of this call.
    pub unsafe fn from_raw(ptr: *const T) -> Self {
        match NonNull::new(ptr as *mut T) {
            Some(ptr) => {
                ptr.as_ref().ref_count().retain();
                Self {
                    ptr: Some(ptr),
                    _owns: PhantomData,
                }
            }
            None => Self::null(),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    #[inline]
    pub fn is_not_null(&self) -> bool {
        self.ptr.is_some()
    }

    /// Borrow the referent, or `None` for a null handle.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        // SAFETY: a non-null handle holds a reference, so the referent is live
        // for at least as long as `self` is borrowed.
        self.ptr.as_ref().map(|ptr| unsafe { ptr.as_ref() })
    }

    /// Borrow the referent, or fail with [`PlvError::NullHandle`].
    pub fn try_get(&self) -> Result<&T> {
        self.get().ok_or(PlvError::NullHandle(type_name::<T>()))
    }

    /// Current reference count of the referent (0 for a null handle). Advisory.
    pub fn ref_count(&self) -> usize {
        self.get().map_or(0, |value| value.ref_count().count())
    }

    /// Address of the referent, usable as an identity key. 0 for null.
    pub fn addr(&self) -> usize {
        self.ptr.map_or(0, |ptr| ptr.as_ptr() as *const () as usize)
    }

    /// Whether both handles refer to the same object (or are both null).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }

    /// Move the referent out, leaving this handle null. No retain or release.
    pub fn take(&mut self) -> Self {
        Self {
            ptr: self.ptr.take(),
            _owns: PhantomData,
        }
    }

    /// Point this handle at `other`'s referent.
    ///
    /// The new referent is retained before the old one is released, so
    /// assigning a handle to itself never reaches the destruction floor.
    pub fn set(&mut self, other: &Self) {
        self.clone_from(other);
    }

    /// Release the referent and become null.
    pub fn reset(&mut self) {
        drop(self.take());
    }

    fn release_ptr(ptr: NonNull<T>) {
        // SAFETY: the caller gives up a retained reference, so the referent
        // is live until this release completes.
        let outcome = unsafe { ptr.as_ref() }.ref_count().release();
        if outcome.should_destroy() {
            tracing::trace!(type_name = type_name::<T>(), "destroying reference-counted object");
            // SAFETY: allocated through `Box` in `from_box`, and the floor was
            // reached, so no other handle refers to it any more.
            drop(unsafe { Box::from_raw(ptr.as_ptr()) });
        }
    }
}

impl<T: RefCounted + ?Sized> Clone for RefPtr<T> {
    fn clone(&self) -> Self {
        if let Some(value) = self.get() {
            value.ref_count().retain();
        }
        Self {
            ptr: self.ptr,
            _owns: PhantomData,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if let Some(value) = source.get() {
            value.ref_count().retain();
        }
        if let Some(old) = std::mem::replace(&mut self.ptr, source.ptr) {
            Self::release_ptr(old);
        }
    }
}

impl<T: RefCounted + ?Sized> Drop for RefPtr<T> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            Self::release_ptr(ptr);
        }
    }
}

impl<T: RefCounted + ?Sized> Default for RefPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: RefCounted + ?Sized> Deref for RefPtr<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.get() {
            Some(value) => value,
            None => panic!("dereferenced a null RefPtr<{}>", type_name::<T>()),
        }
    }
}

impl<T: RefCounted + ?Sized> fmt::Debug for RefPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "RefPtr(null)")
        } else {
            write!(f, "RefPtr({:#x}, refs={})", self.addr(), self.ref_count())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refcount::RefCount;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    struct Tracked {
        refs: RefCount,
        drops: Arc<AtomicUsize>,
    }

    impl Tracked {
        fn new(drops: &Arc<AtomicUsize>) -> Self {
            Self {
                refs: RefCount::new(),
                drops: Arc::clone(drops),
            }
        }
    }

    unsafe impl RefCounted for Tracked {
        fn ref_count(&self) -> &RefCount {
            &self.refs
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    trait Named: RefCounted + Send + Sync {
        fn name(&self) -> &str;
    }

    impl Named for Tracked {
        fn name(&self) -> &str {
            "tracked"
        }
    }

    #[test]
    fn test_new_retains_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let handle = RefPtr::new(Tracked::new(&drops));
        assert!(handle.is_not_null());
        assert_eq!(handle.ref_count(), 1);
        drop(handle);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_null_handle() {
        let handle: RefPtr<Tracked> = RefPtr::null();
        assert!(handle.is_null());
        assert!(handle.get().is_none());
        assert_eq!(handle.ref_count(), 0);
        assert!(matches!(handle.try_get(), Err(PlvError::NullHandle(_))));
        assert!(RefPtr::<Tracked>::default().ptr_eq(&handle));
    }

    #[test]
    #[should_panic(expected = "dereferenced a null RefPtr")]
    fn test_null_deref_panics() {
        let handle: RefPtr<Tracked> = RefPtr::null();
        let _ = handle.refs.count();
    }

    #[test]
    fn test_clone_and_drop_destroys_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let a = RefPtr::new(Tracked::new(&drops));
        let b = a.clone();
        assert_eq!(a.ref_count(), 2);
        assert!(a.ptr_eq(&b));
        drop(a);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        assert_eq!(b.ref_count(), 1);
        drop(b);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reassign_moves_counts_by_one() {
        let drops = Arc::new(AtomicUsize::new(0));
        let a = RefPtr::new(Tracked::new(&drops));
        let b = RefPtr::new(Tracked::new(&drops));

        let mut h = a.clone();
        assert_eq!(a.ref_count(), 2);
        assert_eq!(b.ref_count(), 1);

        h.set(&b);
        assert_eq!(a.ref_count(), 1);
        assert_eq!(b.ref_count(), 2);
        assert!(h.ptr_eq(&b));
        assert_eq!(drops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_self_assignment_keeps_referent() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut h = RefPtr::new(Tracked::new(&drops));
        let same = unsafe { RefPtr::from_raw(&*h as *const Tracked) };
        assert_eq!(h.ref_count(), 2);
        h.set(&same);
        assert_eq!(h.ref_count(), 2);
        drop(same);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        assert_eq!(h.ref_count(), 1);
        drop(h);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reassigning_last_handle_destroys_old_referent() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut h = RefPtr::new(Tracked::new(&drops));
        let other = RefPtr::new(Tracked::new(&drops));
        h.set(&other);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        h.reset();
        assert!(h.is_null());
        assert_eq!(other.ref_count(), 1);
    }

    #[test]
    fn test_take_transfers_without_counting() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut a = RefPtr::new(Tracked::new(&drops));
        let b = a.take();
        assert!(a.is_null());
        assert_eq!(b.ref_count(), 1);
        drop(a);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(b);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_raw_null_is_null() {
        let handle = unsafe { RefPtr::<Tracked>::from_raw(std::ptr::null()) };
        assert!(handle.is_null());
    }

    #[test]
    fn test_trait_object_runs_concrete_drop() {
        let drops = Arc::new(AtomicUsize::new(0));
        let handle: RefPtr<dyn Named> = RefPtr::from_box(Box::new(Tracked::new(&drops)));
        assert_eq!(handle.name(), "tracked");
        let copy = handle.clone();
        assert_eq!(copy.ref_count(), 2);
        drop(handle);
        drop(copy);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_clones_destroy_once() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 500;

        let drops = Arc::new(AtomicUsize::new(0));
        let root = RefPtr::new(Tracked::new(&drops));

        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                let local = root.clone();
                thread::spawn(move || {
                    let mut scratch: RefPtr<Tracked> = RefPtr::null();
                    for _ in 0..ROUNDS {
                        let copy = local.clone();
                        scratch.set(&copy);
                    }
                    drop(scratch);
                    drop(local);
                })
            })
            .collect();

        drop(root);
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}
