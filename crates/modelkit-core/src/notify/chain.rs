use crate::graph::Graph;

use super::notification::{EventKind, Notification};

/// Accumulates the notifications of one mutation before dispatch
#[derive(Debug, Default, Clone)]
pub struct NotificationChain {
    events: Vec<Notification>,
}

impl NotificationChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `notification`, merging it into the first compatible queued
    /// event (in queue order)
    ///
    /// Returns `true` if it was appended as a separate event.
    pub fn add(&mut self, notification: Notification) -> bool {
        for queued in &mut self.events {
            if queued.merge(&notification) {
                return false;
            }
        }
        self.events.push(notification);
        true
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Notification] {
        &self.events
    }

    /// Deliver queued events FIFO to their notifiers, then clear
    pub fn dispatch(&mut self, graph: &Graph) {
        for notification in self.events.drain(..) {
            if notification.kind() == EventKind::NoEvent {
                continue;
            }
            tracing::trace!(
                object_id = notification.notifier().index(),
                kind = ?notification.kind(),
                "dispatch notification"
            );
            graph.notify(&notification);
        }
    }
}
