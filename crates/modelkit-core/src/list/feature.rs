//! Feature-backed list variant
//!
//! A [`FeatureList`] is a short-lived view over the multi-valued feature of
//! one object. Primitives go through the graph's backing-aware slots, so the
//! same view serves locally and store-backed objects. Reference features add
//! opposite/container maintenance and proxy resolution on read.

use std::sync::Arc;

use modelkit_core_types::{FeatureId, ObjectId};

use crate::errors::Result;
use crate::graph::Graph;
use crate::metamodel::FeatureDef;
use crate::notify::{Notification, NotificationChain};
use crate::value::Value;

use super::{ListChange, ListPrimitives};

/// List view over `(owner, feature)`
pub struct FeatureList<'g> {
    graph: &'g mut Graph,
    owner: ObjectId,
    feature_id: FeatureId,
    feature: Arc<FeatureDef>,
    resolve: bool,
}

impl<'g> FeatureList<'g> {
    pub(crate) fn new(
        graph: &'g mut Graph,
        owner: ObjectId,
        feature_id: FeatureId,
        feature: Arc<FeatureDef>,
    ) -> Self {
        let resolve = feature.resolves_proxies();
        Self {
            graph,
            owner,
            feature_id,
            feature,
            resolve,
        }
    }

    /// The same list without proxy resolution on read
    pub fn unresolved(mut self) -> Self {
        self.resolve = false;
        self
    }

    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    pub fn feature_id(&self) -> FeatureId {
        self.feature_id
    }

    pub fn feature(&self) -> &FeatureDef {
        &self.feature
    }

    /// Object ids held by a reference list, without resolution
    pub fn objects(&self) -> Vec<ObjectId> {
        (0..self.len())
            .filter_map(|i| self.item_at(i))
            .filter_map(|v| v.as_object())
            .collect()
    }

    fn mirror_add(&mut self, item: &Value, chain: &mut NotificationChain) -> Result<()> {
        if let Value::Object(target) = item {
            self.graph
                .inverse_add(self.owner, self.feature_id, &self.feature, *target, chain)?;
        }
        Ok(())
    }

    fn mirror_remove(&mut self, item: &Value, chain: &mut NotificationChain) -> Result<()> {
        if let Value::Object(target) = item {
            self.graph
                .inverse_remove(self.owner, self.feature_id, &self.feature, *target, chain)?;
        }
        Ok(())
    }
}

impl ListPrimitives for FeatureList<'_> {
    type Item = Value;

    fn len(&self) -> usize {
        self.graph.list_len(self.owner, self.feature_id)
    }

    fn item_at(&self, index: usize) -> Option<Value> {
        self.graph.list_get(self.owner, self.feature_id, index)
    }

    /// Lists with an opposite or containment are always unique
    fn is_unique(&self) -> bool {
        self.feature.keeps_unique()
    }

    fn position_of(&self, item: &Value) -> Option<usize> {
        self.graph.list_position(self.owner, self.feature_id, item)
    }

    fn do_insert(&mut self, index: usize, item: Value) {
        self.graph
            .list_insert(self.owner, self.feature_id, index, item);
    }

    fn do_insert_many(&mut self, index: usize, items: Vec<Value>) {
        self.graph
            .list_insert_many(self.owner, self.feature_id, index, items);
    }

    fn do_remove(&mut self, index: usize) -> Option<Value> {
        self.graph.list_remove(self.owner, self.feature_id, index)
    }

    fn do_set(&mut self, index: usize, item: Value) -> Option<Value> {
        self.graph.list_set(self.owner, self.feature_id, index, item)
    }

    fn do_move(&mut self, from: usize, to: usize) -> Option<Value> {
        self.graph.list_move(self.owner, self.feature_id, from, to)
    }

    fn do_clear(&mut self) -> Vec<Value> {
        self.graph.list_clear(self.owner, self.feature_id)
    }

    fn validate(&self, item: &Value) -> Result<()> {
        self.graph.check_value(self.owner, &self.feature, item)
    }

    fn resolve_at(&mut self, index: usize, item: Value) -> Result<Value> {
        match item {
            Value::Object(target) if self.resolve && self.graph.is_proxy(target) => {
                let resolved = self.graph.resolve_slot(
                    self.owner,
                    self.feature_id,
                    &self.feature,
                    target,
                    Some(index),
                )?;
                Ok(Value::Object(resolved))
            }
            other => Ok(other),
        }
    }

    fn did_change(&mut self, change: ListChange<Value>) -> Result<()> {
        let mut chain = NotificationChain::new();
        if self.feature.has_inverse() {
            match &change {
                ListChange::Added { item, .. } => self.mirror_add(item, &mut chain)?,
                ListChange::AddedMany { items, .. } => {
                    for item in items {
                        self.mirror_add(item, &mut chain)?;
                    }
                }
                ListChange::Removed { item, .. } => self.mirror_remove(item, &mut chain)?,
                ListChange::RemovedMany { items, .. } => {
                    for item in items {
                        self.mirror_remove(item, &mut chain)?;
                    }
                }
                ListChange::Replaced { old, new, .. } => {
                    if old != new {
                        self.mirror_remove(old, &mut chain)?;
                        self.mirror_add(new, &mut chain)?;
                    }
                }
                ListChange::Moved { .. } => {}
            }
        }
        self.graph.queue(
            &mut chain,
            Notification::from_change(self.owner, self.feature_id, change),
        );
        chain.dispatch(self.graph);
        Ok(())
    }
}
