//! Registry change notifications.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::partial::PartialDefinition;

/// Default number of events buffered per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Something that happened to the registry.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    /// A partial was added through `register`
    Registered {
        name: String,
        definition: Arc<PartialDefinition>,
    },

    Unregistered { name: String },

    /// A partial was loaded from disk by discovery or a file-add event
    Discovered {
        name: String,
        definition: Arc<PartialDefinition>,
    },

    /// A changed file replaced an existing definition
    Reloaded {
        name: String,
        definition: Arc<PartialDefinition>,
    },

    /// A file failed to load or the watcher reported a problem
    Error {
        path: Option<PathBuf>,
        message: String,
    },
}

impl RegistryEvent {
    /// Name of the affected partial, if the event concerns one.
    pub fn name(&self) -> Option<&str> {
        match self {
            RegistryEvent::Registered { name, .. }
            | RegistryEvent::Unregistered { name }
            | RegistryEvent::Discovered { name, .. }
            | RegistryEvent::Reloaded { name, .. } => Some(name),
            RegistryEvent::Error { .. } => None,
        }
    }
}

/// Hub for broadcasting registry events to all subscribers.
#[derive(Debug, Clone)]
pub(crate) struct EventHub {
    sender: broadcast::Sender<RegistryEvent>,
}

impl EventHub {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub(crate) fn send(&self, event: RegistryEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.sender.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
