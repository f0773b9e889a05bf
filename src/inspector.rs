//! Inspector registry: type-driven viewer selection for output pins.
//!
//! The registry maps a pin's [`TypeDescriptor`] to a factory that builds an
//! [`Inspector`] for it. Keys are `TypeId`s, so a registration either
//! matches a pin's type exactly or not at all, and conflicting registrations
//! are rejected when they are made rather than discovered at dispatch time.

use crate::error::{PlvError, Result};
use crate::pipeline::{PinHandle, TypeDescriptor};
use std::any::TypeId;
use std::collections::HashMap;

/// A viewer attached to one output pin.
pub trait Inspector {
    /// Title shown above the inspector.
    fn title(&self) -> &str;

    /// The pin being inspected.
    fn pin(&self) -> &PinHandle;

    /// One-line summary of what this inspector shows.
    fn describe(&self) -> String {
        format!("{} ({})", self.title(), self.pin().type_info())
    }
}

/// Builds an inspector for a pin.
pub type InspectorFactory = fn(PinHandle) -> Box<dyn Inspector>;

/// Metadata for a registered pin type, including its factory function.
#[derive(Clone)]
pub struct InspectorKindInfo {
    pub type_info: TypeDescriptor,
    pub display_name: &'static str,
    pub factory: InspectorFactory,
}

/// Inspector for scalar and text values.
pub struct ValueInspector {
    title: String,
    pin: PinHandle,
}

impl ValueInspector {
    pub fn create(pin: PinHandle) -> Box<dyn Inspector> {
        let title = format!("{}.{}", pin.owner(), pin.name());
        Box::new(Self { title, pin })
    }
}

impl Inspector for ValueInspector {
    fn title(&self) -> &str {
        &self.title
    }

    fn pin(&self) -> &PinHandle {
        &self.pin
    }
}

/// Fallback inspector for pin types with no registered inspector.
///
/// Only shows the pin's type name.
pub struct RawInspector {
    title: String,
    pin: PinHandle,
}

impl RawInspector {
    pub fn create(pin: PinHandle) -> Box<dyn Inspector> {
        let title = format!("{}.{} [raw]", pin.owner(), pin.name());
        Box::new(Self { title, pin })
    }
}

impl Inspector for RawInspector {
    fn title(&self) -> &str {
        &self.title
    }

    fn pin(&self) -> &PinHandle {
        &self.pin
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.title, self.pin.type_info().name())
    }
}

/// Registry mapping pin value types to inspector factories.
pub struct InspectorRegistry {
    kinds: HashMap<TypeId, InspectorKindInfo>,
    fallback: Option<InspectorFactory>,
}

impl InspectorRegistry {
    /// An empty registry with no fallback.
    pub fn new() -> Self {
        Self {
            kinds: HashMap::new(),
            fallback: None,
        }
    }

    /// A registry with value inspectors for the built-in scalar types and
    /// [`RawInspector`] as the fallback.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        let builtin: [(TypeDescriptor, &'static str); 6] = [
            (TypeDescriptor::of::<i64>(), "Integer"),
            (TypeDescriptor::of::<u64>(), "Unsigned"),
            (TypeDescriptor::of::<f64>(), "Float"),
            (TypeDescriptor::of::<bool>(), "Boolean"),
            (TypeDescriptor::of::<String>(), "Text"),
            (TypeDescriptor::of::<f32>(), "Float (32-bit)"),
        ];
        for (type_info, display_name) in builtin {
            registry.kinds.insert(
                type_info.id(),
                InspectorKindInfo {
                    type_info,
                    display_name,
                    factory: ValueInspector::create,
                },
            );
        }
        registry.fallback = Some(RawInspector::create);
        registry
    }

    /// Register an inspector factory for pins producing `T`.
    ///
    /// Fails with [`PlvError::DuplicateInspector`] if `T` already has one.
    pub fn register<T: 'static>(
        &mut self,
        display_name: &'static str,
        factory: InspectorFactory,
    ) -> Result<()> {
        let type_info = TypeDescriptor::of::<T>();
        if self.kinds.contains_key(&type_info.id()) {
            return Err(PlvError::DuplicateInspector {
                type_name: type_info.name(),
            });
        }
        tracing::debug!(type_name = type_info.name(), display_name, "Inspector registered");
        self.kinds.insert(
            type_info.id(),
            InspectorKindInfo {
                type_info,
                display_name,
                factory,
            },
        );
        Ok(())
    }

    /// Set or clear the factory used for unregistered types.
    pub fn set_fallback(&mut self, fallback: Option<InspectorFactory>) {
        self.fallback = fallback;
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn lookup(&self, type_info: &TypeDescriptor) -> Option<&InspectorKindInfo> {
        self.kinds.get(&type_info.id())
    }

    pub fn is_registered<T: 'static>(&self) -> bool {
        self.kinds.contains_key(&TypeId::of::<T>())
    }

    /// Build an inspector for `pin`, falling back when its type is unknown
    /// and `allow_fallback` is set.
    pub fn create(&self, pin: PinHandle, allow_fallback: bool) -> Option<Box<dyn Inspector>> {
        if pin.is_null() {
            return None;
        }
        match self.lookup(&pin.type_info()) {
            Some(kind) => Some((kind.factory)(pin)),
            None if allow_fallback => self.fallback.map(|factory| factory(pin)),
            None => None,
        }
    }

    /// Registered kinds sorted by display name.
    pub fn kinds(&self) -> Vec<&InspectorKindInfo> {
        let mut kinds: Vec<_> = self.kinds.values().collect();
        kinds.sort_by_key(|kind| kind.display_name);
        kinds
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for InspectorRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::TypedOutputPin;

    struct Image;

    struct ImageInspector {
        pin: PinHandle,
    }

    impl Inspector for ImageInspector {
        fn title(&self) -> &str {
            "image"
        }

        fn pin(&self) -> &PinHandle {
            &self.pin
        }
    }

    fn image_inspector(pin: PinHandle) -> Box<dyn Inspector> {
        Box::new(ImageInspector { pin })
    }

    #[test]
    fn test_builtin_kinds() {
        let registry = InspectorRegistry::with_builtin();
        assert!(registry.is_registered::<i64>());
        assert!(registry.is_registered::<String>());
        assert!(!registry.is_registered::<Image>());
        assert!(registry.has_fallback());
        assert_eq!(registry.kinds()[0].display_name, "Boolean");
    }

    #[test]
    fn test_dispatch_by_type() {
        let mut registry = InspectorRegistry::with_builtin();
        registry.register::<Image>("Image", image_inspector).unwrap();

        let int_pin = TypedOutputPin::<i64>::new("E1", "out1").into_handle();
        let image_pin = TypedOutputPin::<Image>::new("E1", "out2").into_handle();

        let a = registry.create(int_pin, true).unwrap();
        assert_eq!(a.title(), "E1.out1");
        assert_eq!(a.describe(), "E1.out1 (i64)");

        let b = registry.create(image_pin, true).unwrap();
        assert_eq!(b.title(), "image");
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = InspectorRegistry::new();
        registry.register::<Image>("Image", image_inspector).unwrap();
        let err = registry
            .register::<Image>("Image again", image_inspector)
            .unwrap_err();
        assert!(matches!(err, PlvError::DuplicateInspector { .. }));
        assert_eq!(registry.lookup(&TypeDescriptor::of::<Image>()).unwrap().display_name, "Image");
    }

    #[test]
    fn test_fallback_policy() {
        let registry = InspectorRegistry::with_builtin();
        let pin = TypedOutputPin::<Image>::new("E1", "frame").into_handle();

        assert!(registry.create(pin.clone(), false).is_none());
        let raw = registry.create(pin.clone(), true).unwrap();
        assert_eq!(raw.title(), "E1.frame [raw]");
        assert!(raw.describe().contains("Image"));

        let empty = InspectorRegistry::new();
        assert!(empty.create(pin, true).is_none());
    }

    #[test]
    fn test_inspector_holds_pin() {
        let registry = InspectorRegistry::with_builtin();
        let pin = TypedOutputPin::<f64>::new("E1", "out").into_handle();
        let inspector = registry.create(pin.clone(), true).unwrap();
        assert_eq!(pin.ref_count(), 2);
        drop(inspector);
        assert_eq!(pin.ref_count(), 1);
    }

    #[test]
    fn test_null_pin_yields_none() {
        let registry = InspectorRegistry::with_builtin();
        assert!(registry.create(PinHandle::null(), true).is_none());
    }
}
