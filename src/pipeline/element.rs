//! Pipeline elements.
//!
//! An element is a named node owning zero or more output pins. Different
//! kinds of element are modeled through the [`PipelineElement`] capability
//! trait; [`Element`] is the general-purpose implementation.

use crate::handle::RefPtr;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::pin::{PinHandle, TypedOutputPin};
use crate::refcount::{RefCount, RefCounted};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

/// Capability set of a pipeline element.
pub trait PipelineElement: RefCounted + Send + Sync {
    /// Stable identity used for logging and display.
    fn name(&self) -> &str;

    /// Point-in-time snapshot of the element's output pins, in creation order.
    ///
    /// Each handle keeps its pin alive for as long as the caller holds it.
    fn output_pins(&self) -> Vec<PinHandle>;

    /// Look up an output pin by name.
    fn output_pin(&self, name: &str) -> Option<PinHandle> {
        self.output_pins().into_iter().find(|pin| pin.name() == name)
    }

    /// Called when the owning pipeline starts.
    fn on_start(&self) {}

    /// Called when the owning pipeline stops.
    fn on_stop(&self) {}
}

/// Owning handle to any pipeline element.
pub type ElementHandle = RefPtr<dyn PipelineElement>;

/// Builds a fresh pin of one concrete type for an `(owner, name)` pair.
type PinFactory = fn(&str, &str) -> PinHandle;

fn make_pin<T: 'static>(owner: &str, name: &str) -> PinHandle {
    TypedOutputPin::<T>::new(owner, name).into_handle()
}

struct OwnedPin {
    handle: PinHandle,
    factory: PinFactory,
}

/// General-purpose element with a fixed name and a growable set of pins.
///
/// Cloning an element is a deep copy: the copy gets its own counter at 0,
/// new pins with the same names and types, and starts out not running.
pub struct Element {
    refs: RefCount,
    name: String,
    pins: RwLock<Vec<OwnedPin>>,
    running: AtomicBool,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            refs: RefCount::new(),
            name: name.into(),
            pins: RwLock::new(Vec::new()),
            running: AtomicBool::new(false),
        }
    }

    /// Builder form of [`Element::add_output`]. A duplicate name is logged
    /// and skipped.
    pub fn with_output<T: 'static>(self, pin_name: &str) -> Self {
        if let Err(e) = self.add_output::<T>(pin_name) {
            tracing::warn!("{}", e);
        }
        self
    }

    /// Create an output pin producing `T` and return a handle to it.
    pub fn add_output<T: 'static>(&self, pin_name: &str) -> PipelineResult<PinHandle> {
        let mut pins = self.pins.write().unwrap_or_else(PoisonError::into_inner);
        if pins.iter().any(|pin| pin.handle.name() == pin_name) {
            return Err(PipelineError::DuplicatePin {
                element: self.name.clone(),
                pin: pin_name.to_string(),
            });
        }
        let factory: PinFactory = make_pin::<T>;
        let pin = factory(&self.name, pin_name);
        pins.push(OwnedPin {
            handle: pin.clone(),
            factory,
        });
        tracing::debug!(element = %self.name, pin = pin_name, "output pin added");
        Ok(pin)
    }

    pub fn pin_count(&self) -> usize {
        self.pins.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Move the element behind a type-erased handle.
    pub fn into_handle(self) -> ElementHandle {
        RefPtr::from_box(Box::new(self))
    }
}

// SAFETY: `refs` belongs to this element alone.
unsafe impl RefCounted for Element {
    fn ref_count(&self) -> &RefCount {
        &self.refs
    }
}

impl PipelineElement for Element {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_pins(&self) -> Vec<PinHandle> {
        self.pins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|pin| pin.handle.clone())
            .collect()
    }

    fn on_start(&self) {
        self.running.store(true, Ordering::Release);
    }

    fn on_stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Clone for Element {
    fn clone(&self) -> Self {
        let pins = self
            .pins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|pin| OwnedPin {
                handle: (pin.factory)(&self.name, pin.handle.name()),
                factory: pin.factory,
            })
            .collect();
        Self {
            refs: self.refs.clone(),
            name: self.name.clone(),
            pins: RwLock::new(pins),
            running: AtomicBool::new(false),
        }
    }
}

impl Drop for Element {
    fn drop(&mut self) {
        let pins = self.pins.get_mut().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(element = %self.name, pins = pins.len(), "element destroyed");
        // Pins are released here, after the element's own counter lock is gone.
        pins.clear();
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pins: Vec<String> = self
            .output_pins()
            .iter()
            .map(|pin| format!("{}: {}", pin.name(), pin.type_info()))
            .collect();
        f.debug_struct("Element")
            .field("name", &self.name)
            .field("pins", &pins)
            .finish()
    }
}
