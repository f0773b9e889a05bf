//! Graph objects that record their own destruction

use plv_rs::pipeline::{PinHandle, TypeDescriptor};
use plv_rs::{OutputPin, PipelineElement, RefCount, RefCounted, RefPtr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared counter incremented by every tracked object's `Drop`
#[derive(Clone, Default)]
pub struct DropLog {
    drops: Arc<AtomicUsize>,
}

impl DropLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Output pin that logs its destruction
pub struct TrackedPin {
    refs: RefCount,
    name: String,
    owner: String,
    type_info: TypeDescriptor,
    log: DropLog,
}

impl TrackedPin {
    pub fn new<T: 'static>(owner: &str, name: &str, log: &DropLog) -> Self {
        Self {
            refs: RefCount::new(),
            name: name.to_string(),
            owner: owner.to_string(),
            type_info: TypeDescriptor::of::<T>(),
            log: log.clone(),
        }
    }
}

// SAFETY: each tracked object owns its counter.
unsafe impl RefCounted for TrackedPin {
    fn ref_count(&self) -> &RefCount {
        &self.refs
    }
}

impl OutputPin for TrackedPin {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_info(&self) -> TypeDescriptor {
        self.type_info
    }

    fn owner(&self) -> &str {
        &self.owner
    }
}

impl Drop for TrackedPin {
    fn drop(&mut self) {
        self.log.record();
    }
}

/// Element that logs its destruction and owns tracked pins
pub struct TrackedElement {
    refs: RefCount,
    name: String,
    pins: Vec<PinHandle>,
    log: DropLog,
}

impl TrackedElement {
    pub fn new(name: &str, pins: Vec<PinHandle>, log: &DropLog) -> Self {
        Self {
            refs: RefCount::new(),
            name: name.to_string(),
            pins,
            log: log.clone(),
        }
    }
}

unsafe impl RefCounted for TrackedElement {
    fn ref_count(&self) -> &RefCount {
        &self.refs
    }
}

impl PipelineElement for TrackedElement {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_pins(&self) -> Vec<PinHandle> {
        self.pins.clone()
    }
}

impl Drop for TrackedElement {
    fn drop(&mut self) {
        self.log.record();
    }
}

/// Wrap a tracked pin in a type-erased handle
pub fn pin_handle(pin: TrackedPin) -> PinHandle {
    RefPtr::from_box(Box::new(pin))
}
