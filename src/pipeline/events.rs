//! Pipeline notifications.
//!
//! Two delivery paths share one subscriber list:
//!
//! - **Listeners**: closures invoked synchronously on the thread that
//!   performed the change, before the mutating call returns.
//! - **Channels**: unbounded crossbeam receivers for consumers on another
//!   thread (the presentation layer drains these once per frame).
//!
//! Anything subscribed before a mutating call observes that call's event
//! exactly once.

use crate::pipeline::element::ElementHandle;
use crate::pipeline::executor::PipelineState;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fmt;
use std::sync::Arc;

/// Events emitted by a pipeline.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// An element was appended. Carries a handle, so the element stays alive
    /// while the event is in flight.
    ElementAdded(ElementHandle),

    /// An element was removed from the pipeline's sequence.
    ElementRemoved(ElementHandle),

    /// The lifecycle state changed.
    StateChanged {
        from: PipelineState,
        to: PipelineState,
    },

    /// All elements were removed.
    Cleared { removed: usize },
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::ElementAdded(e) => write!(f, "ElementAdded({})", e.name()),
            PipelineEvent::ElementRemoved(e) => write!(f, "ElementRemoved({})", e.name()),
            PipelineEvent::StateChanged { from, to } => {
                write!(f, "StateChanged: {} -> {}", from, to)
            }
            PipelineEvent::Cleared { removed } => write!(f, "Cleared({} elements)", removed),
        }
    }
}

/// Identifies a registered listener for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

pub(crate) type Listener = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

/// Registered listeners and channel senders.
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
    channels: Vec<Sender<PipelineEvent>>,
}

impl Subscribers {
    pub(crate) fn add_listener(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub(crate) fn add_channel(&mut self) -> Receiver<PipelineEvent> {
        let (tx, rx) = unbounded();
        self.channels.push(tx);
        rx
    }

    /// Send `event` to every channel, pruning dropped receivers, and return
    /// the listeners to invoke once the caller has released its lock.
    pub(crate) fn dispatch(&mut self, event: &PipelineEvent) -> Vec<Listener> {
        self.channels.retain(|tx| tx.send(event.clone()).is_ok());
        self.listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len() + self.channels.len()
    }
}
