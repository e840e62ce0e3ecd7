use std::cell::RefCell;
use std::rc::Rc;

use modelkit_core_types::ObjectId;

use super::notification::{EventKind, Notification};

/// Receives the notifications of the objects it is registered on
///
/// The target is a plain id, never an owning handle; the graph sets it on
/// registration and clears it on removal.
pub trait Observer {
    fn notify_changed(&mut self, notification: &Notification);

    fn target(&self) -> Option<ObjectId>;

    fn set_target(&mut self, target: Option<ObjectId>);

    /// Forget `old_target` if it is the current target
    fn unset_target(&mut self, old_target: ObjectId) {
        if self.target() == Some(old_target) {
            self.set_target(None);
        }
    }
}

/// Shared handle an observer is registered through
///
/// Removal matches handles by pointer identity.
pub type ObserverHandle = Rc<RefCell<dyn Observer>>;

/// Observer that records every notification it receives
#[derive(Debug, Default)]
pub struct EventLog {
    target: Option<ObjectId>,
    events: Vec<Notification>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh log wrapped for registration
    pub fn shared() -> Rc<RefCell<EventLog>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn events(&self) -> &[Notification] {
        &self.events
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.iter().map(Notification::kind).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&Notification> {
        self.events.last()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Observer for EventLog {
    fn notify_changed(&mut self, notification: &Notification) {
        self.events.push(notification.clone());
    }

    fn target(&self) -> Option<ObjectId> {
        self.target
    }

    fn set_target(&mut self, target: Option<ObjectId>) {
        self.target = target;
    }
}
