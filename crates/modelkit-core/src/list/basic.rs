//! Plain in-memory list variant

use std::fmt::Debug;

use super::ListPrimitives;

/// A standalone ordered list with an optional uniqueness constraint
///
/// Mutations do not notify anyone; use a [`super::FeatureList`] for
/// feature-backed contents.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementList<T> {
    items: Vec<T>,
    unique: bool,
}

impl<T: Clone + PartialEq + Debug> ElementList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            unique: false,
        }
    }

    /// A list that rejects elements it already holds
    pub fn unique() -> Self {
        Self {
            items: Vec::new(),
            unique: true,
        }
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items,
            unique: false,
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Clone + PartialEq + Debug> ListPrimitives for ElementList<T> {
    type Item = T;

    fn len(&self) -> usize {
        self.items.len()
    }

    fn item_at(&self, index: usize) -> Option<T> {
        self.items.get(index).cloned()
    }

    fn is_unique(&self) -> bool {
        self.unique
    }

    fn position_of(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|candidate| candidate == item)
    }

    fn do_insert(&mut self, index: usize, item: T) {
        self.items.insert(index, item);
    }

    fn do_insert_many(&mut self, index: usize, items: Vec<T>) {
        self.items.splice(index..index, items);
    }

    fn do_remove(&mut self, index: usize) -> Option<T> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    fn do_set(&mut self, index: usize, item: T) -> Option<T> {
        self.items
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, item))
    }

    fn do_move(&mut self, from: usize, to: usize) -> Option<T> {
        if from >= self.items.len() || to >= self.items.len() {
            return None;
        }
        let item = self.items.remove(from);
        self.items.insert(to, item.clone());
        Some(item)
    }

    fn do_clear(&mut self) -> Vec<T> {
        std::mem::take(&mut self.items)
    }
}
