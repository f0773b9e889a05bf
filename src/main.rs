//! plv-rs - Headless Pipeline Runner
//!
//! Builds a small pipeline, attaches inspectors to its pins, runs it while a
//! worker thread walks the graph, then shuts down the same way the editor
//! window does on close.
//!
//! Usage: `plv-rs [config.toml]`

use anyhow::Context;
use plv_rs::{
    config::PlvConfig, logging, Element, InspectorHost, InspectorRegistry, Pipeline, RefPtr,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Marker type for image-valued pins.
struct Image;

fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => PlvConfig::load(&path).with_context(|| format!("loading {}", path))?,
        None => PlvConfig::load_or_default(),
    };

    // Initialize logging
    let _log_guard = logging::init_logging(&config.logging)?;
    tracing::info!("Starting plv-rs");

    let pipeline = RefPtr::new(Pipeline::new(config.pipeline.clone()));
    let mut host = InspectorHost::attach(
        pipeline.clone(),
        InspectorRegistry::with_builtin(),
        config.inspector.clone(),
    )?;

    pipeline.add_element(
        Element::new("camera")
            .with_output::<Image>("frame")
            .with_output::<f64>("fps")
            .into_handle(),
    )?;
    pipeline.add_element(
        Element::new("detector")
            .with_output::<i64>("count")
            .with_output::<bool>("found")
            .into_handle(),
    )?;
    host.pump();

    // Walk the graph from another thread while the pipeline runs.
    let running = Arc::new(AtomicBool::new(true));
    let observer = {
        let pipeline = pipeline.clone();
        let running = Arc::clone(&running);
        thread::spawn(move || {
            let mut walks = 0u64;
            while running.load(Ordering::Acquire) {
                for element in pipeline.children() {
                    for pin in element.output_pins() {
                        tracing::trace!("{}.{}: {}", element.name(), pin.name(), pin.type_info());
                    }
                }
                walks += 1;
                thread::sleep(Duration::from_millis(5));
            }
            walks
        })
    };

    pipeline.start()?;
    thread::sleep(Duration::from_millis(50));

    for attached in host.inspectors() {
        tracing::info!(
            "[{}] {} (max {}x{})",
            attached.element_name,
            attached.inspector.describe(),
            attached.max_size.0,
            attached.max_size.1
        );
    }

    running.store(false, Ordering::Release);
    let walks = observer
        .join()
        .map_err(|_| anyhow::anyhow!("observer thread panicked"))?;
    tracing::info!("Observer walked the graph {} times", walks);

    // Signal pipeline to stop and release everything
    tracing::info!("Shutting down...");
    host.shutdown()?;

    Ok(())
}
