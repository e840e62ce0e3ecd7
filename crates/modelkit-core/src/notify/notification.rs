use modelkit_core_types::{FeatureId, ObjectId};

use crate::list::ListChange;
use crate::value::Value;

/// Kind of change a notification reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Set,
    Unset,
    Add,
    Remove,
    AddMany,
    RemoveMany,
    Move,
    /// An observer is being detached; sent to that observer only
    RemovingAdapter,
    /// A proxy was replaced by the object it stood for
    Resolve,
    /// Placeholder that is skipped at dispatch
    NoEvent,
}

/// Old or new payload of a notification
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventValue {
    #[default]
    None,
    Value(Value),
    Values(Vec<Value>),
    /// Original positions of a multi-element removal
    Positions(Vec<usize>),
    /// Previous index of a moved element
    Index(usize),
}

impl EventValue {
    pub fn is_none(&self) -> bool {
        matches!(self, EventValue::None)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            EventValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_values(&self) -> Option<&[Value]> {
        match self {
            EventValue::Values(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_positions(&self) -> Option<&[usize]> {
        match self {
            EventValue::Positions(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            EventValue::Index(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<Option<Value>> for EventValue {
    fn from(value: Option<Value>) -> Self {
        value.map_or(EventValue::None, EventValue::Value)
    }
}

impl From<Value> for EventValue {
    fn from(value: Value) -> Self {
        EventValue::Value(value)
    }
}

/// A change record for one `(notifier, feature)`
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    kind: EventKind,
    notifier: ObjectId,
    feature: Option<FeatureId>,
    old_value: EventValue,
    new_value: EventValue,
    position: Option<usize>,
}

impl Notification {
    pub fn new(
        kind: EventKind,
        notifier: ObjectId,
        feature: Option<FeatureId>,
        old_value: EventValue,
        new_value: EventValue,
        position: Option<usize>,
    ) -> Self {
        Self {
            kind,
            notifier,
            feature,
            old_value,
            new_value,
            position,
        }
    }

    pub fn set(
        notifier: ObjectId,
        feature: FeatureId,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> Self {
        Self::new(
            EventKind::Set,
            notifier,
            Some(feature),
            old_value.into(),
            new_value.into(),
            None,
        )
    }

    /// `new_value` is the default the feature falls back to
    pub fn unset(
        notifier: ObjectId,
        feature: FeatureId,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> Self {
        Self::new(
            EventKind::Unset,
            notifier,
            Some(feature),
            old_value.into(),
            new_value.into(),
            None,
        )
    }

    pub fn add(notifier: ObjectId, feature: FeatureId, value: Value, position: usize) -> Self {
        Self::new(
            EventKind::Add,
            notifier,
            Some(feature),
            EventValue::None,
            EventValue::Value(value),
            Some(position),
        )
    }

    pub fn add_many(
        notifier: ObjectId,
        feature: FeatureId,
        values: Vec<Value>,
        position: usize,
    ) -> Self {
        Self::new(
            EventKind::AddMany,
            notifier,
            Some(feature),
            EventValue::None,
            EventValue::Values(values),
            Some(position),
        )
    }

    pub fn remove(notifier: ObjectId, feature: FeatureId, value: Value, position: usize) -> Self {
        Self::new(
            EventKind::Remove,
            notifier,
            Some(feature),
            EventValue::Value(value),
            EventValue::None,
            Some(position),
        )
    }

    /// `positions` index the list as it was before any of the removals
    pub fn remove_many(
        notifier: ObjectId,
        feature: FeatureId,
        values: Vec<Value>,
        positions: Vec<usize>,
    ) -> Self {
        let position = positions.first().copied();
        Self::new(
            EventKind::RemoveMany,
            notifier,
            Some(feature),
            EventValue::Values(values),
            EventValue::Positions(positions),
            position,
        )
    }

    pub fn replace(
        notifier: ObjectId,
        feature: FeatureId,
        old_value: Value,
        new_value: Value,
        position: usize,
    ) -> Self {
        Self::new(
            EventKind::Set,
            notifier,
            Some(feature),
            EventValue::Value(old_value),
            EventValue::Value(new_value),
            Some(position),
        )
    }

    pub fn moved(
        notifier: ObjectId,
        feature: FeatureId,
        from: usize,
        to: usize,
        value: Value,
    ) -> Self {
        Self::new(
            EventKind::Move,
            notifier,
            Some(feature),
            EventValue::Index(from),
            EventValue::Value(value),
            Some(to),
        )
    }

    pub fn resolve(
        notifier: ObjectId,
        feature: FeatureId,
        proxy: ObjectId,
        resolved: ObjectId,
        position: Option<usize>,
    ) -> Self {
        Self::new(
            EventKind::Resolve,
            notifier,
            Some(feature),
            EventValue::Value(Value::Object(proxy)),
            EventValue::Value(Value::Object(resolved)),
            position,
        )
    }

    /// `position` is the observer's index in the notifier's observer list
    pub fn removing_adapter(notifier: ObjectId, position: usize) -> Self {
        Self::new(
            EventKind::RemovingAdapter,
            notifier,
            None,
            EventValue::None,
            EventValue::None,
            Some(position),
        )
    }

    pub fn no_event(notifier: ObjectId) -> Self {
        Self::new(
            EventKind::NoEvent,
            notifier,
            None,
            EventValue::None,
            EventValue::None,
            None,
        )
    }

    /// Translate a completed list mutation into its notification
    pub fn from_change(notifier: ObjectId, feature: FeatureId, change: ListChange<Value>) -> Self {
        match change {
            ListChange::Added { index, item } => Self::add(notifier, feature, item, index),
            ListChange::AddedMany { index, items } => {
                Self::add_many(notifier, feature, items, index)
            }
            ListChange::Removed { index, item } => Self::remove(notifier, feature, item, index),
            ListChange::RemovedMany { positions, items } => {
                Self::remove_many(notifier, feature, items, positions)
            }
            ListChange::Replaced { index, old, new } => {
                Self::replace(notifier, feature, old, new, index)
            }
            ListChange::Moved { from, to, item } => Self::moved(notifier, feature, from, to, item),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn notifier(&self) -> ObjectId {
        self.notifier
    }

    pub fn feature(&self) -> Option<FeatureId> {
        self.feature
    }

    pub fn old_value(&self) -> &EventValue {
        &self.old_value
    }

    pub fn new_value(&self) -> &EventValue {
        &self.new_value
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Check if the event reports no observable change of the feature value
    pub fn is_touch(&self) -> bool {
        match self.kind {
            EventKind::Resolve | EventKind::RemovingAdapter => true,
            EventKind::Set | EventKind::Unset => self.old_value == self.new_value,
            EventKind::Move => self.old_value.as_index() == self.position,
            _ => false,
        }
    }

    /// Absorb `other` into this queued event if the merge rules allow it
    ///
    /// Only events with the same notifier and feature merge. Returns `false`
    /// and leaves `self` untouched otherwise.
    pub(crate) fn merge(&mut self, other: &Notification) -> bool {
        if self.notifier != other.notifier || self.feature != other.feature {
            return false;
        }
        match (self.kind, other.kind) {
            (EventKind::Set | EventKind::Unset, EventKind::Set | EventKind::Unset) => {
                self.new_value = other.new_value.clone();
                if other.kind == EventKind::Set {
                    self.kind = EventKind::Set;
                }
                true
            }
            (EventKind::Remove, EventKind::Remove) => self.merge_remove(other),
            (EventKind::RemoveMany, EventKind::Remove) => self.absorb_remove(other),
            _ => false,
        }
    }

    fn merge_remove(&mut self, other: &Notification) -> bool {
        let (Some(first), Some(second)) = (self.position, other.position) else {
            return false;
        };
        let (Some(v1), Some(v2)) = (self.old_value.as_value(), other.old_value.as_value()) else {
            return false;
        };
        let (values, positions) = if first <= second {
            (vec![v1.clone(), v2.clone()], vec![first, second + 1])
        } else {
            (vec![v2.clone(), v1.clone()], vec![second, first])
        };
        self.kind = EventKind::RemoveMany;
        self.position = positions.first().copied();
        self.old_value = EventValue::Values(values);
        self.new_value = EventValue::Positions(positions);
        true
    }

    fn absorb_remove(&mut self, other: &Notification) -> bool {
        let Some(mut position) = other.position else {
            return false;
        };
        let Some(value) = other.old_value.as_value().cloned() else {
            return false;
        };
        let (EventValue::Values(values), EventValue::Positions(positions)) =
            (&mut self.old_value, &mut self.new_value)
        else {
            return false;
        };
        let mut slot = 0;
        while slot < positions.len() && positions[slot] <= position {
            slot += 1;
            position += 1;
        }
        positions.insert(slot, position);
        values.insert(slot.min(values.len()), value);
        self.position = positions.first().copied();
        true
    }
}
