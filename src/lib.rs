//! # plv-rs: Pipeline Object Graph Core
//!
//! The ownership and lifetime layer of a visual pipeline editor. A graphical
//! shell assembles named processing elements, and inspects their output pins
//! while the pipeline runs. This crate provides the part both sides share:
//!
//! - **Reference counting**: [`RefCount`] is a mutex-guarded intrusive counter
//!   embedded in every graph object.
//! - **Owning handles**: [`RefPtr`] retains on acquire and releases on drop,
//!   destroying the object exactly once when the last handle goes away.
//! - **Graph contract**: [`Pipeline`] owns [`PipelineElement`]s, which own
//!   [`OutputPin`]s carrying a runtime [`TypeDescriptor`].
//! - **Inspection**: [`InspectorRegistry`] maps pin types to viewers and
//!   [`InspectorHost`] keeps them in sync with a live pipeline.
//!
//! ## Threads
//!
//! A pipeline is typically driven from a control thread while worker threads
//! run elements and the presentation thread walks the same graph. Every
//! graph operation takes `&self`; there is no global lock.
//!
//! ## Example
//!
//! ```
//! use plv_rs::{Element, InspectorHost, InspectorRegistry, Pipeline, RefPtr};
//! use plv_rs::config::InspectorConfig;
//!
//! let pipeline = RefPtr::new(Pipeline::default());
//! let mut host = InspectorHost::attach(
//!     pipeline.clone(),
//!     InspectorRegistry::with_builtin(),
//!     InspectorConfig::default(),
//! )?;
//!
//! pipeline.add_element(Element::new("E1").with_output::<i64>("out1").into_handle())?;
//! host.pump();
//! assert_eq!(host.inspector_count(), 1);
//!
//! pipeline.start()?;
//! host.shutdown()?;
//! # Ok::<(), plv_rs::PlvError>(())
//! ```

pub mod config;
pub mod error;
pub mod handle;
pub mod host;
pub mod inspector;
pub mod logging;
pub mod pipeline;
pub mod refcount;

// Re-export commonly used types
pub use config::PlvConfig;
pub use error::{PlvError, Result};
pub use handle::RefPtr;
pub use host::InspectorHost;
pub use inspector::{Inspector, InspectorRegistry};
pub use pipeline::{
    Element, ElementHandle, OutputPin, PinHandle, Pipeline, PipelineElement, PipelineEvent,
    PipelineState, TypeDescriptor,
};
pub use refcount::{RefCount, RefCounted, Release};
