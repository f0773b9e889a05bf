//! Output pins and their runtime type descriptors.
//!
//! A pin is a named, typed endpoint owned by exactly one element. The
//! [`TypeDescriptor`] it carries is what the inspector registry keys on to
//! pick a viewer for a pin whose value type is not known statically.

use crate::handle::RefPtr;
use crate::refcount::{RefCount, RefCounted};
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Runtime identifier of the value type a pin produces.
///
/// Equality and hashing use the `TypeId` only; the name is for display.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
}

impl TypeDescriptor {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type path, e.g. `alloc::string::String`.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, e.g. `String`.
    pub fn short_name(&self) -> &'static str {
        // Generic arguments may contain `::`, so only split the outer path.
        let outer = self.name.split('<').next().unwrap_or(self.name);
        match outer.rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }

    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({})", self.name)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Capability exposed by every output pin.
pub trait OutputPin: RefCounted + Send + Sync {
    /// Pin name, unique within its element.
    fn name(&self) -> &str;

    /// Descriptor of the produced value type. Stable for the pin's lifetime.
    fn type_info(&self) -> TypeDescriptor;

    /// Name of the element that owns this pin.
    fn owner(&self) -> &str;
}

/// Owning handle to any output pin.
pub type PinHandle = RefPtr<dyn OutputPin>;

/// Output pin producing values of type `T`.
pub struct TypedOutputPin<T: 'static> {
    refs: RefCount,
    name: String,
    owner: String,
    _produces: PhantomData<fn() -> T>,
}

impl<T: 'static> TypedOutputPin<T> {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            refs: RefCount::new(),
            name: name.into(),
            owner: owner.into(),
            _produces: PhantomData,
        }
    }

    /// Move the pin behind a type-erased handle.
    pub fn into_handle(self) -> PinHandle {
        RefPtr::from_box(Box::new(self))
    }
}

// Not derived: a derive would require `T: Clone`.
impl<T: 'static> Clone for TypedOutputPin<T> {
    fn clone(&self) -> Self {
        Self {
            refs: self.refs.clone(),
            name: self.name.clone(),
            owner: self.owner.clone(),
            _produces: PhantomData,
        }
    }
}

// SAFETY: `refs` belongs to this pin alone; `Clone` gives the copy a fresh one.
unsafe impl<T: 'static> RefCounted for TypedOutputPin<T> {
    fn ref_count(&self) -> &RefCount {
        &self.refs
    }
}

impl<T: 'static> OutputPin for TypedOutputPin<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_info(&self) -> TypeDescriptor {
        TypeDescriptor::of::<T>()
    }

    fn owner(&self) -> &str {
        &self.owner
    }
}

impl<T: 'static> Drop for TypedOutputPin<T> {
    fn drop(&mut self) {
        tracing::trace!(owner = %self.owner, pin = %self.name, "output pin destroyed");
    }
}

impl<T: 'static> fmt::Debug for TypedOutputPin<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedOutputPin")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("type", &TypeDescriptor::of::<T>())
            .finish()
    }
}
