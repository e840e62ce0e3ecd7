//! Pluggable feature storage
//!
//! A [`Store`] holds the feature data of store-backed objects outside the
//! graph arena, keyed by `(object, feature)`. Single-valued features are
//! addressed with `index = None`, list elements with `Some(i)`.

use std::collections::HashMap;

use modelkit_core_types::{FeatureId, ObjectId};

use crate::value::Value;

/// Keyed random-access backing for store-backed objects
///
/// Callers pass in-range indices; out-of-range reads yield `None` and
/// out-of-range writes are ignored.
pub trait Store {
    fn get(&self, object: ObjectId, feature: FeatureId, index: Option<usize>) -> Option<Value>;

    /// Replace a value, returning the previous one
    fn set(
        &mut self,
        object: ObjectId,
        feature: FeatureId,
        index: Option<usize>,
        value: Value,
    ) -> Option<Value>;

    fn is_set(&self, object: ObjectId, feature: FeatureId) -> bool;

    fn unset(&mut self, object: ObjectId, feature: FeatureId);

    fn size(&self, object: ObjectId, feature: FeatureId) -> usize;

    fn is_empty(&self, object: ObjectId, feature: FeatureId) -> bool {
        self.size(object, feature) == 0
    }

    fn contains(&self, object: ObjectId, feature: FeatureId, value: &Value) -> bool {
        self.index_of(object, feature, value).is_some()
    }

    fn index_of(&self, object: ObjectId, feature: FeatureId, value: &Value) -> Option<usize>;

    fn add(&mut self, object: ObjectId, feature: FeatureId, index: usize, value: Value);

    fn remove(&mut self, object: ObjectId, feature: FeatureId, index: usize) -> Option<Value>;

    /// Move the element at `source` to `target`, returning it
    fn move_to(
        &mut self,
        object: ObjectId,
        feature: FeatureId,
        target: usize,
        source: usize,
    ) -> Option<Value>;

    fn clear(&mut self, object: ObjectId, feature: FeatureId);

    fn to_vec(&self, object: ObjectId, feature: FeatureId) -> Vec<Value>;
}

/// In-process [`Store`] over hash maps
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    singles: HashMap<(ObjectId, FeatureId), Value>,
    lists: HashMap<(ObjectId, FeatureId), Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `(object, feature)` entries held
    pub fn entry_count(&self) -> usize {
        self.singles.len() + self.lists.len()
    }

    fn list_mut(&mut self, object: ObjectId, feature: FeatureId) -> &mut Vec<Value> {
        self.lists.entry((object, feature)).or_default()
    }
}

impl Store for MemoryStore {
    fn get(&self, object: ObjectId, feature: FeatureId, index: Option<usize>) -> Option<Value> {
        match index {
            None => self.singles.get(&(object, feature)).cloned(),
            Some(i) => self.lists.get(&(object, feature))?.get(i).cloned(),
        }
    }

    fn set(
        &mut self,
        object: ObjectId,
        feature: FeatureId,
        index: Option<usize>,
        value: Value,
    ) -> Option<Value> {
        match index {
            None => self.singles.insert((object, feature), value),
            Some(i) => self
                .list_mut(object, feature)
                .get_mut(i)
                .map(|slot| std::mem::replace(slot, value)),
        }
    }

    fn is_set(&self, object: ObjectId, feature: FeatureId) -> bool {
        self.singles.contains_key(&(object, feature))
            || self
                .lists
                .get(&(object, feature))
                .is_some_and(|values| !values.is_empty())
    }

    fn unset(&mut self, object: ObjectId, feature: FeatureId) {
        self.singles.remove(&(object, feature));
        self.lists.remove(&(object, feature));
    }

    fn size(&self, object: ObjectId, feature: FeatureId) -> usize {
        self.lists.get(&(object, feature)).map_or(0, Vec::len)
    }

    fn index_of(&self, object: ObjectId, feature: FeatureId, value: &Value) -> Option<usize> {
        self.lists
            .get(&(object, feature))?
            .iter()
            .position(|v| v == value)
    }

    fn add(&mut self, object: ObjectId, feature: FeatureId, index: usize, value: Value) {
        let values = self.list_mut(object, feature);
        if index <= values.len() {
            values.insert(index, value);
        }
    }

    fn remove(&mut self, object: ObjectId, feature: FeatureId, index: usize) -> Option<Value> {
        let values = self.lists.get_mut(&(object, feature))?;
        (index < values.len()).then(|| values.remove(index))
    }

    fn move_to(
        &mut self,
        object: ObjectId,
        feature: FeatureId,
        target: usize,
        source: usize,
    ) -> Option<Value> {
        let values = self.lists.get_mut(&(object, feature))?;
        if source >= values.len() || target >= values.len() {
            return None;
        }
        let value = values.remove(source);
        values.insert(target, value.clone());
        Some(value)
    }

    fn clear(&mut self, object: ObjectId, feature: FeatureId) {
        self.lists.remove(&(object, feature));
    }

    fn to_vec(&self, object: ObjectId, feature: FeatureId) -> Vec<Value> {
        self.lists
            .get(&(object, feature))
            .cloned()
            .unwrap_or_default()
    }
}
