//! Pipeline container and lifecycle controller.
//!
//! The pipeline owns an ordered sequence of element handles and moves
//! through `Idle → Running → Stopped`. It is shared between the
//! presentation thread and execution threads, so every operation takes
//! `&self`:
//!
//! - `lifecycle` (Mutex) serializes `start`, `stop` and `clear` for the
//!   whole transition, hooks and notifications included.
//! - `state` (Mutex) guards the lifecycle state.
//! - `elements` (RwLock) guards the element sequence.
//! - `subscribers` (Mutex) guards listeners and channels.
//!
//! Lock order is `lifecycle → state → elements → subscribers`. Reads such as
//! [`Pipeline::children`] never take `lifecycle`. Apart from `lifecycle`, no
//! lock is held while element hooks, listeners, or element destructors run,
//! so hooks and listeners may read the pipeline and add or remove elements,
//! but must not call `start`, `stop` or `clear` on it.
//!
//! Channel subscribers receive graph events while the element lock is still
//! held, so a channel sees additions and removals in the same order as
//! [`Pipeline::children`].

use crate::config::PipelineConfig;
use crate::pipeline::element::ElementHandle;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::events::{Listener, ListenerId, PipelineEvent, Subscribers};
use crate::refcount::{RefCount, RefCounted};
use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Lifecycle state of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PipelineState {
    #[default]
    Idle,
    Running,
    Stopped,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "Idle"),
            PipelineState::Running => write!(f, "Running"),
            PipelineState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Ordered collection of owned elements with a start/stop/clear lifecycle.
///
/// Not `Clone`; share a pipeline through `RefPtr<Pipeline>` handles.
pub struct Pipeline {
    refs: RefCount,
    lifecycle: Mutex<()>,
    state: Mutex<PipelineState>,
    elements: RwLock<Vec<ElementHandle>>,
    subscribers: Mutex<Subscribers>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            refs: RefCount::new(),
            lifecycle: Mutex::new(()),
            state: Mutex::new(PipelineState::Idle),
            elements: RwLock::new(Vec::new()),
            subscribers: Mutex::new(Subscribers::default()),
            config,
        }
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, ()> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_state(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_elements(&self) -> RwLockReadGuard<'_, Vec<ElementHandle>> {
        self.elements.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_elements(&self) -> RwLockWriteGuard<'_, Vec<ElementHandle>> {
        self.elements.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Send `event` to every channel and hand back the listeners, which the
    /// caller runs with [`Pipeline::notify`] once its locks are released.
    fn dispatch(&self, event: &PipelineEvent) -> Vec<Listener> {
        self.lock_subscribers().dispatch(event)
    }

    fn notify(listeners: Vec<Listener>, event: &PipelineEvent) {
        for listener in listeners {
            listener(event);
        }
    }

    fn emit(&self, event: PipelineEvent) {
        Self::notify(self.dispatch(&event), &event);
    }

    // ── Graph ──

    /// Append an element and notify subscribers before returning.
    pub fn add_element(&self, element: ElementHandle) -> PipelineResult<()> {
        if element.is_null() {
            return Err(PipelineError::NullElement);
        }
        let event = PipelineEvent::ElementAdded(element.clone());
        let listeners = {
            let mut elements = self.write_elements();
            let limit = self.config.max_elements;
            if limit > 0 && elements.len() >= limit {
                return Err(PipelineError::CapacityExceeded { limit });
            }
            elements.push(element.clone());
            self.dispatch(&event)
        };
        tracing::debug!(element = element.name(), "Element added");
        Self::notify(listeners, &event);
        Ok(())
    }

    /// Remove `element` (matched by identity). Returns whether it was present.
    ///
    /// Handles already held elsewhere keep the element alive.
    pub fn remove_element(&self, element: &ElementHandle) -> bool {
        let (event, listeners) = {
            let mut elements = self.write_elements();
            let removed = match elements.iter().position(|e| e.ptr_eq(element)) {
                Some(index) => elements.remove(index),
                None => return false,
            };
            let event = PipelineEvent::ElementRemoved(removed);
            let listeners = self.dispatch(&event);
            (event, listeners)
        };
        if let PipelineEvent::ElementRemoved(removed) = &event {
            tracing::debug!(element = removed.name(), "Element removed");
        }
        Self::notify(listeners, &event);
        true
    }

    /// Point-in-time snapshot of all elements, in insertion order.
    ///
    /// The returned handles keep their elements alive even if the pipeline
    /// removes them afterwards. The snapshot may be stale relative to
    /// concurrent `add_element` calls.
    pub fn children(&self) -> Vec<ElementHandle> {
        self.read_elements().clone()
    }

    /// First element with the given name.
    pub fn element_by_name(&self, name: &str) -> Option<ElementHandle> {
        self.read_elements()
            .iter()
            .find(|e| e.name() == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.read_elements().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_elements().is_empty()
    }

    // ── Lifecycle ──

    pub fn state(&self) -> PipelineState {
        *self.lock_state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == PipelineState::Running
    }

    /// `Idle | Stopped → Running`. Calls `on_start` on every element.
    ///
    /// A concurrent `stop` or `clear` waits until every hook has run and the
    /// state change has been announced.
    pub fn start(&self) -> PipelineResult<()> {
        let _transition = self.lock_lifecycle();
        let from = {
            let mut state = self.lock_state();
            if *state == PipelineState::Running {
                return Err(PipelineError::AlreadyRunning);
            }
            std::mem::replace(&mut *state, PipelineState::Running)
        };

        let children = self.children();
        tracing::info!("Starting pipeline with {} elements", children.len());
        for element in &children {
            element.on_start();
        }

        self.emit(PipelineEvent::StateChanged {
            from,
            to: PipelineState::Running,
        });
        Ok(())
    }

    /// `Running → Stopped`. Calls `on_stop` on every element.
    pub fn stop(&self) -> PipelineResult<()> {
        let _transition = self.lock_lifecycle();
        {
            let mut state = self.lock_state();
            if *state != PipelineState::Running {
                return Err(PipelineError::NotRunning(*state));
            }
            *state = PipelineState::Stopped;
        }

        let children = self.children();
        tracing::info!("Stopping pipeline with {} elements", children.len());
        for element in &children {
            element.on_stop();
        }

        self.emit(PipelineEvent::StateChanged {
            from: PipelineState::Running,
            to: PipelineState::Stopped,
        });
        Ok(())
    }

    /// `Idle | Stopped → Idle`, dropping every element handle the pipeline owns.
    ///
    /// Rejected with [`PipelineError::ClearWhileRunning`] while running; stop first.
    pub fn clear(&self) -> PipelineResult<()> {
        let _transition = self.lock_lifecycle();
        let (from, removed, event, listeners) = {
            let mut state = self.lock_state();
            if *state == PipelineState::Running {
                return Err(PipelineError::ClearWhileRunning);
            }
            let from = std::mem::replace(&mut *state, PipelineState::Idle);
            let mut elements = self.write_elements();
            let removed = std::mem::take(&mut *elements);
            let event = PipelineEvent::Cleared {
                removed: removed.len(),
            };
            let listeners = self.dispatch(&event);
            (from, removed, event, listeners)
        };

        tracing::info!("Clearing pipeline ({} elements)", removed.len());
        // Elements with no other holders are destroyed here, outside the graph locks.
        drop(removed);

        Self::notify(listeners, &event);
        if from != PipelineState::Idle {
            self.emit(PipelineEvent::StateChanged {
                from,
                to: PipelineState::Idle,
            });
        }
        Ok(())
    }

    // ── Notifications ──

    /// Register a listener invoked synchronously for every later event.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&PipelineEvent) + Send + Sync + 'static,
    {
        let mut subscribers = self.lock_subscribers();
        let id = subscribers.add_listener(Arc::new(listener));
        tracing::debug!(subscribers = subscribers.len(), "Listener subscribed");
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.lock_subscribers().remove_listener(id)
    }

    /// Receive every later event on a channel. Dropping the receiver unsubscribes.
    pub fn event_channel(&self) -> Receiver<PipelineEvent> {
        let mut subscribers = self.lock_subscribers();
        let rx = subscribers.add_channel();
        tracing::debug!(subscribers = subscribers.len(), "Event channel opened");
        rx
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

// SAFETY: `refs` belongs to this pipeline alone.
unsafe impl RefCounted for Pipeline {
    fn ref_count(&self) -> &RefCount {
        &self.refs
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        let elements = self.elements.get_mut().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!("Pipeline destroyed ({} elements released)", elements.len());
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .children()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        f.debug_struct("Pipeline")
            .field("state", &self.state())
            .field("elements", &names)
            .finish()
    }
}
