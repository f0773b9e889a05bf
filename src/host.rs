//! Presentation-side consumer of a pipeline.
//!
//! `InspectorHost` follows the pipeline the way an editor window does: it
//! attaches one inspector per output pin of every element, picks up
//! elements added later, and lets go of inspectors for removed elements so
//! it is never the last holder of a pin under normal operation.
//!
//! Events arrive over a channel and are applied in [`InspectorHost::pump`],
//! which the owning thread calls once per frame.

use crate::config::InspectorConfig;
use crate::error::Result;
use crate::handle::RefPtr;
use crate::inspector::{Inspector, InspectorRegistry};
use crate::pipeline::{ElementHandle, Pipeline, PipelineEvent, PipelineState};
use crossbeam_channel::Receiver;
use std::collections::HashSet;

/// An inspector placed in the host, with the element it belongs to.
pub struct AttachedInspector {
    pub element_name: String,
    element_addr: usize,
    pub max_size: (u32, u32),
    pub inspector: Box<dyn Inspector>,
}

impl AttachedInspector {
    pub fn title(&self) -> &str {
        self.inspector.title()
    }
}

/// Attaches inspectors to a pipeline's pins and keeps them in sync.
pub struct InspectorHost {
    pipeline: RefPtr<Pipeline>,
    registry: InspectorRegistry,
    config: InspectorConfig,
    events: Receiver<PipelineEvent>,
    attached: Vec<AttachedInspector>,
    seen: HashSet<usize>,
}

impl InspectorHost {
    /// Start following `pipeline`.
    ///
    /// Subscribes before enumerating existing elements, so an element added
    /// concurrently is seen either in the snapshot or as an event. Elements
    /// seen both ways get inspectors only once.
    pub fn attach(
        pipeline: RefPtr<Pipeline>,
        registry: InspectorRegistry,
        config: InspectorConfig,
    ) -> Result<Self> {
        let events = pipeline.try_get()?.event_channel();
        let mut host = Self {
            pipeline,
            registry,
            config,
            events,
            attached: Vec::new(),
            seen: HashSet::new(),
        };
        for element in host.pipeline.children() {
            host.add_inspectors_for_pins(&element);
        }
        tracing::info!(
            "Inspector host attached ({} inspectors)",
            host.attached.len()
        );
        Ok(host)
    }

    /// Apply all pending pipeline events. Returns how many were processed.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.events.try_recv() {
            processed += 1;
            match event {
                PipelineEvent::ElementAdded(element) => self.add_inspectors_for_pins(&element),
                PipelineEvent::ElementRemoved(element) => self.detach(&element),
                PipelineEvent::Cleared { .. } => self.detach_all(),
                PipelineEvent::StateChanged { from, to } => {
                    tracing::debug!("Pipeline state {} -> {}", from, to);
                }
            }
        }
        processed
    }

    fn add_inspectors_for_pins(&mut self, element: &ElementHandle) {
        if !self.seen.insert(element.addr()) {
            return;
        }
        tracing::debug!("Adding inspectors for {}", element.name());

        for pin in element.output_pins() {
            let type_info = pin.type_info();
            let pin_name = pin.name().to_string();
            match self.registry.create(pin, self.config.fallback_enabled) {
                Some(inspector) => {
                    tracing::debug!("Adding inspector for pin {}", pin_name);
                    self.attached.push(AttachedInspector {
                        element_name: element.name().to_string(),
                        element_addr: element.addr(),
                        max_size: self.config.max_size(),
                        inspector,
                    });
                }
                None => tracing::warn!(
                    "No inspector for pin {}.{} of type {}",
                    element.name(),
                    pin_name,
                    type_info.name()
                ),
            }
        }
    }

    fn detach(&mut self, element: &ElementHandle) {
        let addr = element.addr();
        self.seen.remove(&addr);
        let before = self.attached.len();
        self.attached.retain(|a| a.element_addr != addr);
        tracing::debug!(
            "Removed {} inspectors for {}",
            before - self.attached.len(),
            element.name()
        );
    }

    fn detach_all(&mut self) {
        self.seen.clear();
        self.attached.clear();
    }

    pub fn inspectors(&self) -> &[AttachedInspector] {
        &self.attached
    }

    pub fn inspector_count(&self) -> usize {
        self.attached.len()
    }

    pub fn pipeline(&self) -> &RefPtr<Pipeline> {
        &self.pipeline
    }

    /// Stop the pipeline if it is running, then clear it.
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Stopping pipeline...");
        if self.pipeline.state() == PipelineState::Running {
            self.pipeline.stop()?;
        }
        self.pipeline.clear()?;
        self.pump();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlvError;
    use crate::pipeline::Element;

    fn host_for(pipeline: &RefPtr<Pipeline>) -> InspectorHost {
        InspectorHost::attach(
            pipeline.clone(),
            InspectorRegistry::with_builtin(),
            InspectorConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_attach_to_null_pipeline_fails() {
        let result = InspectorHost::attach(
            RefPtr::null(),
            InspectorRegistry::with_builtin(),
            InspectorConfig::default(),
        );
        assert!(matches!(result, Err(PlvError::NullHandle(_))));
    }

    #[test]
    fn test_existing_and_new_elements() {
        let pipeline = RefPtr::new(Pipeline::default());
        pipeline
            .add_element(
                Element::new("a")
                    .with_output::<i64>("x")
                    .with_output::<f64>("y")
                    .into_handle(),
            )
            .unwrap();

        let mut host = host_for(&pipeline);
        assert_eq!(host.inspector_count(), 2);

        pipeline
            .add_element(Element::new("b").with_output::<bool>("z").into_handle())
            .unwrap();
        assert_eq!(host.pump(), 1);
        let titles: Vec<&str> = host.inspectors().iter().map(|a| a.title()).collect();
        assert_eq!(titles, ["a.x", "a.y", "b.z"]);
        assert!(host.inspectors().iter().all(|a| a.max_size == (320, 240)));
    }

    #[test]
    fn test_removed_element_releases_pins() {
        let pipeline = RefPtr::new(Pipeline::default());
        let element = Element::new("a").with_output::<i64>("x").into_handle();
        pipeline.add_element(element.clone()).unwrap();
        let mut host = host_for(&pipeline);
        host.pump();

        let pin = element.output_pin("x").unwrap();
        // element + inspector + local
        assert_eq!(pin.ref_count(), 3);

        pipeline.remove_element(&element);
        host.pump();
        assert_eq!(host.inspector_count(), 0);
        assert_eq!(pin.ref_count(), 2);
    }

    #[test]
    fn test_fallback_disabled_skips_unknown_types() {
        struct Opaque;
        let pipeline = RefPtr::new(Pipeline::default());
        pipeline
            .add_element(
                Element::new("a")
                    .with_output::<Opaque>("blob")
                    .with_output::<i64>("n")
                    .into_handle(),
            )
            .unwrap();
        let host = InspectorHost::attach(
            pipeline.clone(),
            InspectorRegistry::with_builtin(),
            InspectorConfig {
                fallback_enabled: false,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(host.inspector_count(), 1);
        assert_eq!(host.inspectors()[0].title(), "a.n");
    }

    #[test]
    fn test_shutdown_stops_and_clears() {
        let pipeline = RefPtr::new(Pipeline::default());
        pipeline
            .add_element(Element::new("a").with_output::<i64>("x").into_handle())
            .unwrap();
        let mut host = host_for(&pipeline);
        pipeline.start().unwrap();

        host.shutdown().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Idle);
        assert!(pipeline.is_empty());
        assert_eq!(host.inspector_count(), 0);
    }
}
