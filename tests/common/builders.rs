//! Test data builders for creating graph objects

use super::tracking::{pin_handle, DropLog, TrackedElement, TrackedPin};
use plv_rs::pipeline::PinHandle;
use plv_rs::{Element, ElementHandle, RefPtr};

/// Builder for tracked elements whose destruction (and their pins') is logged
pub struct TrackedElementBuilder {
    name: String,
    pins: Vec<PinHandle>,
    log: DropLog,
}

impl TrackedElementBuilder {
    pub fn new(name: &str, log: &DropLog) -> Self {
        Self {
            name: name.to_string(),
            pins: Vec::new(),
            log: log.clone(),
        }
    }

    pub fn output<T: 'static>(mut self, pin_name: &str) -> Self {
        self.pins
            .push(pin_handle(TrackedPin::new::<T>(&self.name, pin_name, &self.log)));
        self
    }

    pub fn build(self) -> ElementHandle {
        RefPtr::from_box(Box::new(TrackedElement::new(&self.name, self.pins, &self.log)))
    }
}

/// A plain element with a single `i64` output named `out`
pub fn simple_element(name: &str) -> ElementHandle {
    Element::new(name).with_output::<i64>("out").into_handle()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracked_builder() {
        let log = DropLog::new();
        let element = TrackedElementBuilder::new("E", &log)
            .output::<i64>("a")
            .output::<f64>("b")
            .build();
        assert_eq!(element.output_pins().len(), 2);
        drop(element);
        assert_eq!(log.count(), 3);
    }
}
