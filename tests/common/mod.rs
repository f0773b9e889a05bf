//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod tracking;

use plv_rs::pipeline::PinHandle;
use plv_rs::ElementHandle;
use std::time::Duration;

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_millis(100)
}

/// Element names in sequence order
pub fn element_names(elements: &[ElementHandle]) -> Vec<String> {
    elements.iter().map(|e| e.name().to_string()).collect()
}

/// Pin names in sequence order
pub fn pin_names(pins: &[PinHandle]) -> Vec<String> {
    pins.iter().map(|p| p.name().to_string()).collect()
}
