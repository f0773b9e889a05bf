//! Pipeline graph: elements, their output pins, and the owning pipeline.
//!
//! # Ownership
//!
//! ```text
//! Pipeline ──owns──► [ElementHandle] ──owns──► [PinHandle]
//!     ▲                    ▲                       ▲
//!     └── presentation layer holds transient handles from snapshots
//! ```
//!
//! Every node in the graph is [`RefCounted`](crate::refcount::RefCounted)
//! and held through [`RefPtr`](crate::handle::RefPtr) handles, so a snapshot
//! from [`Pipeline::children`] or [`PipelineElement::output_pins`] stays
//! valid even if the owning container drops its entry concurrently.
//!
//! # Design
//!
//! - **Capability traits**: `PipelineElement` and `OutputPin` are trait
//!   objects; concrete kinds are not a closed set.
//! - **Typed pin descriptors**: `TypeDescriptor` wraps a `TypeId`, which
//!   the inspector registry keys on.
//! - **Explicit notification**: listener list plus crossbeam channels.

pub mod element;
pub mod error;
pub mod events;
pub mod executor;
pub mod pin;

pub use element::{Element, ElementHandle, PipelineElement};
pub use error::{PipelineError, PipelineResult};
pub use events::{ListenerId, PipelineEvent};
pub use executor::{Pipeline, PipelineState};
pub use pin::{OutputPin, PinHandle, TypeDescriptor, TypedOutputPin};
