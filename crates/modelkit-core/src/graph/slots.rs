//! Backing-aware slot primitives
//!
//! Locally backed objects (and cached store-backed ones) keep their data in
//! the record; store-backed objects replay every write against the graph's
//! store. Reads come from the record unless the object is uncached and
//! store-backed. A cached object starts from whatever the store already
//! holds for it. Callers have validated ids and indices.

use modelkit_core_types::{FeatureId, ObjectId};

use crate::errors::Result;
use crate::store::Store;
use crate::value::Value;

use super::{Backing, Graph, ObjectRecord};

impl ObjectRecord {
    fn single_slot_mut(&mut self, feature: FeatureId) -> &mut Option<Value> {
        let index = feature.index();
        if self.values.len() <= index {
            self.values.resize(index + 1, None);
        }
        &mut self.values[index]
    }

    fn local_list(&self, feature: FeatureId) -> Option<&Vec<Value>> {
        self.lists.get(feature.index()).and_then(Option::as_ref)
    }

    fn local_list_mut(&mut self, feature: FeatureId) -> &mut Vec<Value> {
        let index = feature.index();
        if self.lists.len() <= index {
            self.lists.resize(index + 1, None);
        }
        self.lists[index].get_or_insert_with(Vec::new)
    }
}

impl Graph {
    fn backing_of(&self, object: ObjectId) -> Backing {
        self.objects
            .get(object.index())
            .map_or(Backing::Local, |r| r.backing)
    }

    /// The store when it is the source of truth for reads of `object`
    fn reading_store(&self, object: ObjectId) -> Option<&dyn Store> {
        let backing = self.backing_of(object);
        if backing.keeps_local() {
            return None;
        }
        self.store.as_deref()
    }

    /// The store when writes to `object` must be replayed on it
    fn writing_store(&mut self, object: ObjectId) -> Option<&mut (dyn Store + 'static)> {
        if self.backing_of(object).is_store_backed() {
            self.store.as_deref_mut()
        } else {
            None
        }
    }

    fn local(&self, object: ObjectId) -> Option<&ObjectRecord> {
        self.objects
            .get(object.index())
            .filter(|r| r.backing.keeps_local())
    }

    fn local_mut(&mut self, object: ObjectId) -> Option<&mut ObjectRecord> {
        self.objects
            .get_mut(object.index())
            .filter(|r| r.backing.keeps_local())
    }

    /// Seed the local copy of a cached store-backed object from the store
    pub(crate) fn fill_cache(&mut self, object: ObjectId) -> Result<()> {
        let record = self.record(object)?;
        if record.backing != (Backing::Store { cached: true }) {
            return Ok(());
        }
        let features = self.metamodel.features(record.class)?;
        let Some(store) = self.store.as_deref() else {
            return Ok(());
        };

        let mut singles = Vec::new();
        let mut lists = Vec::new();
        for (index, def) in features.iter().enumerate() {
            let feature = FeatureId::new(index);
            if def.many {
                if store.size(object, feature) > 0 {
                    lists.push((feature, store.to_vec(object, feature)));
                }
            } else if let Some(value) = store.get(object, feature, None) {
                singles.push((feature, value));
            }
        }

        let record = &mut self.objects[object.index()];
        for (feature, value) in singles {
            *record.single_slot_mut(feature) = Some(value);
        }
        for (feature, values) in lists {
            *record.local_list_mut(feature) = values;
        }
        Ok(())
    }

    // ===== Single-valued slots =====

    pub(crate) fn single_get(&self, object: ObjectId, feature: FeatureId) -> Option<Value> {
        if let Some(store) = self.reading_store(object) {
            return store.get(object, feature, None);
        }
        self.local(object)
            .and_then(|r| r.values.get(feature.index()).cloned().flatten())
    }

    /// Store `value` (or clear the slot), returning the previous value
    pub(crate) fn single_set(
        &mut self,
        object: ObjectId,
        feature: FeatureId,
        value: Option<Value>,
    ) -> Option<Value> {
        let mut old = self.single_get(object, feature);
        if let Some(record) = self.local_mut(object) {
            old = std::mem::replace(record.single_slot_mut(feature), value.clone());
        }
        if let Some(store) = self.writing_store(object) {
            match value {
                Some(value) => {
                    store.set(object, feature, None, value);
                }
                None => store.unset(object, feature),
            }
        }
        old
    }

    // ===== Multi-valued slots =====

    pub(crate) fn list_len(&self, object: ObjectId, feature: FeatureId) -> usize {
        if let Some(store) = self.reading_store(object) {
            return store.size(object, feature);
        }
        self.local(object)
            .and_then(|r| r.local_list(feature))
            .map_or(0, Vec::len)
    }

    pub(crate) fn list_get(&self, object: ObjectId, feature: FeatureId, index: usize) -> Option<Value> {
        if let Some(store) = self.reading_store(object) {
            return store.get(object, feature, Some(index));
        }
        self.local(object)
            .and_then(|r| r.local_list(feature))
            .and_then(|list| list.get(index).cloned())
    }

    pub(crate) fn list_position(&self, object: ObjectId, feature: FeatureId, value: &Value) -> Option<usize> {
        if let Some(store) = self.reading_store(object) {
            return store.index_of(object, feature, value);
        }
        self.local(object)
            .and_then(|r| r.local_list(feature))
            .and_then(|list| list.iter().position(|v| v == value))
    }

    pub(crate) fn list_values(&self, object: ObjectId, feature: FeatureId) -> Vec<Value> {
        if let Some(store) = self.reading_store(object) {
            return store.to_vec(object, feature);
        }
        self.local(object)
            .and_then(|r| r.local_list(feature))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn list_insert(&mut self, object: ObjectId, feature: FeatureId, index: usize, value: Value) {
        if let Some(record) = self.local_mut(object) {
            record.local_list_mut(feature).insert(index, value.clone());
        }
        if let Some(store) = self.writing_store(object) {
            store.add(object, feature, index, value);
        }
    }

    pub(crate) fn list_insert_many(
        &mut self,
        object: ObjectId,
        feature: FeatureId,
        index: usize,
        values: Vec<Value>,
    ) {
        if let Some(record) = self.local_mut(object) {
            record
                .local_list_mut(feature)
                .splice(index..index, values.iter().cloned());
        }
        if let Some(store) = self.writing_store(object) {
            for (offset, value) in values.into_iter().enumerate() {
                store.add(object, feature, index + offset, value);
            }
        }
    }

    pub(crate) fn list_remove(&mut self, object: ObjectId, feature: FeatureId, index: usize) -> Option<Value> {
        let mut removed = None;
        if let Some(record) = self.local_mut(object) {
            let list = record.local_list_mut(feature);
            removed = (index < list.len()).then(|| list.remove(index));
        }
        let keeps_local = self.backing_of(object).keeps_local();
        if let Some(store) = self.writing_store(object) {
            let stored = store.remove(object, feature, index);
            if !keeps_local {
                removed = stored;
            }
        }
        removed
    }

    pub(crate) fn list_set(
        &mut self,
        object: ObjectId,
        feature: FeatureId,
        index: usize,
        value: Value,
    ) -> Option<Value> {
        let mut old = None;
        if let Some(record) = self.local_mut(object) {
            old = record
                .local_list_mut(feature)
                .get_mut(index)
                .map(|slot| std::mem::replace(slot, value.clone()));
        }
        let keeps_local = self.backing_of(object).keeps_local();
        if let Some(store) = self.writing_store(object) {
            let stored = store.set(object, feature, Some(index), value);
            if !keeps_local {
                old = stored;
            }
        }
        old
    }

    pub(crate) fn list_move(&mut self, object: ObjectId, feature: FeatureId, from: usize, to: usize) -> Option<Value> {
        let mut moved = None;
        if let Some(record) = self.local_mut(object) {
            let list = record.local_list_mut(feature);
            if from < list.len() && to < list.len() {
                let value = list.remove(from);
                list.insert(to, value.clone());
                moved = Some(value);
            }
        }
        let keeps_local = self.backing_of(object).keeps_local();
        if let Some(store) = self.writing_store(object) {
            let stored = store.move_to(object, feature, to, from);
            if !keeps_local {
                moved = stored;
            }
        }
        moved
    }

    pub(crate) fn list_clear(&mut self, object: ObjectId, feature: FeatureId) -> Vec<Value> {
        let mut removed = self.list_values(object, feature);
        if let Some(record) = self.local_mut(object) {
            removed = std::mem::take(record.local_list_mut(feature));
        }
        if let Some(store) = self.writing_store(object) {
            store.clear(object, feature);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::graph::ObjectOptions;
    use crate::metamodel::{FeatureDef, MetamodelBuilder};
    use crate::value::DataType;
    use std::sync::Arc;

    fn graph_with_store() -> (Graph, modelkit_core_types::ClassId) {
        let mut builder = MetamodelBuilder::new("slots");
        let bag = builder.class("Bag");
        builder
            .feature(bag, FeatureDef::attribute("label", DataType::Str))
            .feature(bag, FeatureDef::attribute("items", DataType::Int).many());
        let metamodel = Arc::new(builder.build().unwrap());
        (Graph::with_store(metamodel, Box::new(MemoryStore::new())), bag)
    }

    #[test]
    fn test_uncached_store_object_reads_from_store() {
        let (mut graph, bag) = graph_with_store();
        let object = graph
            .create_with(bag, ObjectOptions {
                backing: Backing::Store { cached: false },
                ..Default::default()
            })
            .unwrap();
        let items = FeatureId::new(1);
        graph.list_insert(object, items, 0, Value::Int(1));
        graph.list_insert_many(object, items, 1, vec![Value::Int(2), Value::Int(3)]);

        assert!(graph.objects[object.index()].local_list(items).is_none());
        assert_eq!(graph.store().unwrap().size(object, items), 3);
        assert_eq!(graph.list_move(object, items, 0, 2), Some(Value::Int(1)));
        assert_eq!(
            graph.list_values(object, items),
            vec![Value::Int(2), Value::Int(3), Value::Int(1)]
        );
    }

    #[test]
    fn test_cached_store_object_writes_both() {
        let (mut graph, bag) = graph_with_store();
        let object = graph
            .create_with(bag, ObjectOptions {
                backing: Backing::Store { cached: true },
                ..Default::default()
            })
            .unwrap();
        let label = FeatureId::new(0);
        assert_eq!(graph.single_set(object, label, Some("a".into())), None);
        assert_eq!(graph.single_set(object, label, Some("b".into())), Some("a".into()));

        assert_eq!(graph.single_get(object, label), Some("b".into()));
        assert_eq!(
            graph.store().unwrap().get(object, label, None),
            Some("b".into())
        );
    }

    #[test]
    fn test_cached_store_object_starts_from_store_contents() {
        let (mut graph, bag) = graph_with_store();
        let label = FeatureId::new(0);
        let items = FeatureId::new(1);
        // the next object created will be obj#0
        let next = ObjectId::new(0);
        let store = graph.store_mut().unwrap();
        store.set(next, label, None, "kept".into());
        store.add(next, items, 0, Value::Int(7));

        let object = graph
            .create_with(bag, ObjectOptions {
                backing: Backing::Store { cached: true },
                ..Default::default()
            })
            .unwrap();

        assert_eq!(object, next);
        assert_eq!(graph.single_get(object, label), Some("kept".into()));
        assert_eq!(graph.list_values(object, items), vec![Value::Int(7)]);
        assert!(graph.objects[object.index()].local_list(items).is_some());
    }
}
