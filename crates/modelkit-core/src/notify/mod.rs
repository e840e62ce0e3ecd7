//! Change notifications
//!
//! A [`Notification`] is an immutable change record addressed by
//! `(notifier, feature)`. Mutations collect them in a [`NotificationChain`],
//! which merges compatible records before dispatching them to the
//! [`Observer`]s registered on each notifier.

pub mod chain;
pub mod notification;
pub mod observer;

pub use chain::NotificationChain;
pub use notification::{EventKind, EventValue, Notification};
pub use observer::{EventLog, Observer, ObserverHandle};
