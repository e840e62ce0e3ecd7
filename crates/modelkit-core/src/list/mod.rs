//! Ordered container hierarchy
//!
//! Every list variant implements the low-level [`ListPrimitives`]; the public
//! operation set ([`OrderedList`]) is written once on top of them. Variants
//! never override the public layer: bounds checks, uniqueness filtering and
//! the batching of bulk changes into a single [`ListChange`] live here only.

pub mod basic;
pub mod feature;

pub use basic::ElementList;
pub use feature::FeatureList;

use std::fmt::Debug;

use crate::errors::{ModelError, Result};

/// A completed mutation, reported to [`ListPrimitives::did_change`] after the
/// backing data has been updated
#[derive(Debug, Clone, PartialEq)]
pub enum ListChange<T> {
    Added { index: usize, item: T },
    AddedMany { index: usize, items: Vec<T> },
    Removed { index: usize, item: T },
    /// `positions` are indices in the list as it was before the removal
    RemovedMany { positions: Vec<usize>, items: Vec<T> },
    Replaced { index: usize, old: T, new: T },
    Moved { from: usize, to: usize, item: T },
}

/// Storage-level hooks of a list variant
///
/// Primitives perform no validation; callers guarantee indices are in range.
pub trait ListPrimitives {
    type Item: Clone + PartialEq + Debug;

    fn len(&self) -> usize;

    /// Raw element at `index`, without proxy resolution
    fn item_at(&self, index: usize) -> Option<Self::Item>;

    fn is_unique(&self) -> bool {
        false
    }

    fn position_of(&self, item: &Self::Item) -> Option<usize> {
        (0..self.len()).find(|&i| self.item_at(i).as_ref() == Some(item))
    }

    fn do_insert(&mut self, index: usize, item: Self::Item);

    fn do_insert_many(&mut self, index: usize, items: Vec<Self::Item>) {
        for (offset, item) in items.into_iter().enumerate() {
            self.do_insert(index + offset, item);
        }
    }

    fn do_remove(&mut self, index: usize) -> Option<Self::Item>;

    fn do_set(&mut self, index: usize, item: Self::Item) -> Option<Self::Item>;

    fn do_move(&mut self, from: usize, to: usize) -> Option<Self::Item>;

    fn do_clear(&mut self) -> Vec<Self::Item> {
        let mut removed = Vec::with_capacity(self.len());
        while let Some(item) = self.len().checked_sub(1).and_then(|i| self.do_remove(i)) {
            removed.push(item);
        }
        removed.reverse();
        removed
    }

    /// Reject an element before any mutation happens
    ///
    /// # Errors
    ///
    /// Variants return `InvalidValue` (or a containment error) for elements
    /// they cannot hold.
    fn validate(&self, _item: &Self::Item) -> Result<()> {
        Ok(())
    }

    /// Read hook: lets a variant swap the stored element for a resolved one
    ///
    /// # Errors
    ///
    /// Variants propagate lookup errors met while resolving.
    fn resolve_at(&mut self, _index: usize, item: Self::Item) -> Result<Self::Item> {
        Ok(item)
    }

    /// Post-mutation hook (notifications, inverse maintenance)
    ///
    /// # Errors
    ///
    /// Errors from maintaining the other end of a reference.
    fn did_change(&mut self, _change: ListChange<Self::Item>) -> Result<()> {
        Ok(())
    }
}

/// Public list operations, implemented once for every [`ListPrimitives`]
pub trait OrderedList: ListPrimitives {
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, item: &Self::Item) -> bool {
        self.position_of(item).is_some()
    }

    fn index_of(&self, item: &Self::Item) -> Option<usize> {
        self.position_of(item)
    }

    /// Element at `index`, resolved through the variant's read hook
    ///
    /// # Errors
    ///
    /// * `IndexOutOfRange` - If `index >= len`
    /// * Any error of the read hook
    fn get(&mut self, index: usize) -> Result<Self::Item> {
        let item = self.basic_get(index)?;
        self.resolve_at(index, item)
    }

    /// Element at `index` without resolution
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index >= len`.
    fn basic_get(&self, index: usize) -> Result<Self::Item> {
        self.item_at(index).ok_or(ModelError::IndexOutOfRange {
            index,
            size: self.len(),
        })
    }

    /// All elements, resolved
    ///
    /// # Errors
    ///
    /// Stops at the first element the read hook fails on.
    fn get_all(&mut self) -> Result<Vec<Self::Item>> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }

    /// All elements, raw
    fn to_vec(&self) -> Vec<Self::Item> {
        (0..self.len()).filter_map(|i| self.item_at(i)).collect()
    }

    fn iter(&self) -> ListIter<'_, Self>
    where
        Self: Sized,
    {
        ListIter {
            list: self,
            index: 0,
        }
    }

    /// Append; returns `false` when a unique list already holds the element
    ///
    /// # Errors
    ///
    /// Same as [`OrderedList::insert`].
    fn add(&mut self, item: Self::Item) -> Result<bool> {
        let size = self.len();
        self.insert(size, item)
    }

    /// Insert at `index` (`0..=len`); returns `false` when a unique list
    /// already holds the element
    ///
    /// # Errors
    ///
    /// * `IndexOutOfRange` - If `index > len`
    /// * Any error of the validate hook; the list is left untouched
    fn insert(&mut self, index: usize, item: Self::Item) -> Result<bool> {
        let size = self.len();
        if index > size {
            return Err(ModelError::IndexOutOfRange { index, size });
        }
        if self.is_unique() && self.contains(&item) {
            return Ok(false);
        }
        self.validate(&item)?;
        self.do_insert(index, item.clone());
        self.did_change(ListChange::Added { index, item })?;
        Ok(true)
    }

    /// Append a batch, reported as one change
    ///
    /// # Errors
    ///
    /// Same as [`OrderedList::insert_all`].
    fn add_all(&mut self, items: Vec<Self::Item>) -> Result<bool> {
        let size = self.len();
        self.insert_all(size, items)
    }

    /// Insert a batch at `index`, reported as one change
    ///
    /// # Errors
    ///
    /// * `IndexOutOfRange` - If `index > len`
    /// * Any error of the validate hook; nothing is inserted when one element
    ///   is rejected
    fn insert_all(&mut self, index: usize, items: Vec<Self::Item>) -> Result<bool> {
        let size = self.len();
        if index > size {
            return Err(ModelError::IndexOutOfRange { index, size });
        }
        let mut items = items;
        if self.is_unique() {
            let mut accepted: Vec<Self::Item> = Vec::with_capacity(items.len());
            for item in items {
                if !self.contains(&item) && !accepted.contains(&item) {
                    accepted.push(item);
                }
            }
            items = accepted;
        }
        for item in &items {
            self.validate(item)?;
        }
        match items.len() {
            0 => Ok(false),
            1 => {
                let item = items.remove(0);
                self.do_insert(index, item.clone());
                self.did_change(ListChange::Added { index, item })?;
                Ok(true)
            }
            _ => {
                self.do_insert_many(index, items.clone());
                self.did_change(ListChange::AddedMany { index, items })?;
                Ok(true)
            }
        }
    }

    /// Remove and return the element at `index`
    ///
    /// # Errors
    ///
    /// * `IndexOutOfRange` - If `index >= len`
    /// * Whatever [`ListPrimitives::did_change`] reports.
    fn remove_at(&mut self, index: usize) -> Result<Self::Item> {
        let size = self.len();
        if index >= size {
            return Err(ModelError::IndexOutOfRange { index, size });
        }
        let item = self
            .do_remove(index)
            .ok_or(ModelError::IndexOutOfRange { index, size })?;
        self.did_change(ListChange::Removed {
            index,
            item: item.clone(),
        })?;
        Ok(item)
    }

    /// Remove the first occurrence; returns `false` when absent
    ///
    /// # Errors
    ///
    /// Returns whatever [`ListPrimitives::did_change`] reports.
    fn remove(&mut self, item: &Self::Item) -> Result<bool> {
        match self.position_of(item) {
            Some(index) => {
                self.remove_at(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove every element contained in `items`, reported as one change
    ///
    /// # Errors
    ///
    /// Returns whatever [`ListPrimitives::did_change`] reports.
    fn remove_all(&mut self, items: &[Self::Item]) -> Result<bool> {
        let positions: Vec<usize> = (0..self.len())
            .filter(|&i| self.item_at(i).is_some_and(|item| items.contains(&item)))
            .collect();
        self.remove_positions(positions)
    }

    /// Keep only elements contained in `items`, reported as one change
    ///
    /// # Errors
    ///
    /// Returns whatever [`ListPrimitives::did_change`] reports.
    fn retain_all(&mut self, items: &[Self::Item]) -> Result<bool> {
        let positions: Vec<usize> = (0..self.len())
            .filter(|&i| self.item_at(i).is_some_and(|item| !items.contains(&item)))
            .collect();
        self.remove_positions(positions)
    }

    /// Remove `[from, to)`, reported as one change
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `to > len` or `from > to`.
    fn remove_range(&mut self, from: usize, to: usize) -> Result<Vec<Self::Item>> {
        let size = self.len();
        if to > size {
            return Err(ModelError::IndexOutOfRange { index: to, size });
        }
        if from > to {
            return Err(ModelError::IndexOutOfRange { index: from, size });
        }
        let items: Vec<Self::Item> = (from..to).filter_map(|i| self.item_at(i)).collect();
        self.remove_positions((from..to).collect())?;
        Ok(items)
    }

    /// 
    ///
    /// # Errors
    ///
    /// Returns whatever [`ListPrimitives::did_change`] reports.
    #[doc(hidden)]
    fn remove_positions(&mut self, positions: Vec<usize>) -> Result<bool> {
        let mut removed = Vec::with_capacity(positions.len());
        for &index in positions.iter().rev() {
            if let Some(item) = self.do_remove(index) {
                removed.push(item);
            }
        }
        removed.reverse();
        match removed.len() {
            0 => Ok(false),
            1 => {
                let item = removed.remove(0);
                self.did_change(ListChange::Removed {
                    index: positions[0],
                    item,
                })?;
                Ok(true)
            }
            _ => {
                self.did_change(ListChange::RemovedMany {
                    positions,
                    items: removed,
                })?;
                Ok(true)
            }
        }
    }

    /// Relocate the element at `from` to `to`, shifting the ones in between
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` unless both `from` and `to` are below `len`.
    fn move_to(&mut self, from: usize, to: usize) -> Result<Self::Item> {
        let size = self.len();
        if from >= size {
            return Err(ModelError::IndexOutOfRange { index: from, size });
        }
        if to >= size {
            return Err(ModelError::IndexOutOfRange { index: to, size });
        }
        let item = self
            .do_move(from, to)
            .ok_or(ModelError::IndexOutOfRange { index: from, size })?;
        self.did_change(ListChange::Moved {
            from,
            to,
            item: item.clone(),
        })?;
        Ok(item)
    }

    /// Relocate `item` in front of the element currently at `before`
    ///
    /// `before` is an insertion point in `0..=len`; passing `len` moves the
    /// element to the end.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` when the list does not hold `item`.
    fn move_object(&mut self, before: usize, item: &Self::Item) -> Result<()> {
        let size = self.len();
        if before > size {
            return Err(ModelError::IndexOutOfRange {
                index: before,
                size,
            });
        }
        let from = self
            .position_of(item)
            .ok_or_else(|| ModelError::ElementNotFound {
                element: format!("{:?}", item),
            })?;
        let to = if before > from { before - 1 } else { before };
        self.move_to(from, to)?;
        Ok(())
    }

    /// Replace the element at `index`, returning the previous one
    ///
    /// # Errors
    ///
    /// Returns `DuplicateElement` when a unique list holds `item` at another
    /// index.
    fn set(&mut self, index: usize, item: Self::Item) -> Result<Self::Item> {
        let size = self.len();
        if index >= size {
            return Err(ModelError::IndexOutOfRange { index, size });
        }
        if self.is_unique() {
            if let Some(existing) = self.position_of(&item) {
                if existing != index {
                    return Err(ModelError::DuplicateElement { index: existing });
                }
            }
        }
        self.validate(&item)?;
        let old = self
            .do_set(index, item.clone())
            .ok_or(ModelError::IndexOutOfRange { index, size })?;
        self.did_change(ListChange::Replaced {
            index,
            old: old.clone(),
            new: item,
        })?;
        Ok(old)
    }

    /// Remove everything, returning the removed elements in order
    ///
    /// # Errors
    ///
    /// Returns whatever [`ListPrimitives::did_change`] reports.
    fn clear(&mut self) -> Result<Vec<Self::Item>> {
        let removed = self.do_clear();
        match removed.len() {
            0 => {}
            1 => self.did_change(ListChange::Removed {
                index: 0,
                item: removed[0].clone(),
            })?,
            n => self.did_change(ListChange::RemovedMany {
                positions: (0..n).collect(),
                items: removed.clone(),
            })?,
        }
        Ok(removed)
    }
}

impl<L: ListPrimitives + ?Sized> OrderedList for L {}

/// Raw iterator over a list's elements
pub struct ListIter<'a, L: ListPrimitives> {
    list: &'a L,
    index: usize,
}

impl<L: ListPrimitives> Iterator for ListIter<'_, L> {
    type Item = L::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.list.item_at(self.index)?;
        self.index += 1;
        Some(item)
    }
}
