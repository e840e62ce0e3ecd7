//! Object graph arena
//!
//! Objects are records addressed by [`ObjectId`]; they are never removed, so
//! an id handed out by a graph stays valid for its lifetime. Containment and
//! cross references are plain ids held in feature slots, and the single
//! container of an object is recorded on the object itself.

mod inverse;
pub mod proxy;
mod slots;

pub use proxy::{ProxyResolver, UriMapResolver};

use std::sync::Arc;

use modelkit_core_types::{ClassId, FeatureId, ObjectId};

use crate::errors::{ModelError, Result};
use crate::list::{FeatureList, OrderedList};
use crate::metamodel::{FeatureDef, FeatureKind, Metamodel};
use crate::notify::{Notification, NotificationChain, ObserverHandle};
use crate::store::Store;
use crate::traversal::{AllContents, TypedContents};
use crate::value::Value;

/// Where an object's feature data lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backing {
    /// Slots inside the graph record
    #[default]
    Local,
    /// The graph's [`Store`]; `cached` keeps a local copy that serves reads
    Store { cached: bool },
}

impl Backing {
    pub(crate) fn keeps_local(self) -> bool {
        matches!(self, Backing::Local | Backing::Store { cached: true })
    }

    pub(crate) fn is_store_backed(self) -> bool {
        matches!(self, Backing::Store { .. })
    }
}

/// Per-object creation options
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectOptions {
    pub backing: Backing,
    /// Delivery cannot be switched off for this object
    pub fixed_delivery: bool,
}

/// Capability to create empty instances of a class
pub trait Factory {
    /// Create an empty instance of `class`
    ///
    /// # Errors
    ///
    /// Implementations report `ClassNotFound` or `AbstractClass` for classes
    /// without instances.
    fn create(&mut self, class: ClassId) -> Result<ObjectId>;
}

pub(crate) struct ObjectRecord {
    class: ClassId,
    values: Vec<Option<Value>>,
    lists: Vec<Option<Vec<Value>>>,
    /// Parent and the parent's containment feature holding this object
    container: Option<(ObjectId, FeatureId)>,
    proxy_uri: Option<String>,
    observers: Vec<ObserverHandle>,
    deliver: bool,
    fixed_delivery: bool,
    backing: Backing,
}

impl ObjectRecord {
    fn new(class: ClassId, feature_count: usize, options: ObjectOptions) -> Self {
        Self {
            class,
            values: vec![None; feature_count],
            lists: vec![None; feature_count],
            container: None,
            proxy_uri: None,
            observers: Vec::new(),
            deliver: true,
            fixed_delivery: options.fixed_delivery,
            backing: options.backing,
        }
    }
}

/// A live object graph over one metamodel
pub struct Graph {
    metamodel: Arc<Metamodel>,
    objects: Vec<ObjectRecord>,
    store: Option<Box<dyn Store>>,
    resolver: Option<Box<dyn ProxyResolver>>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("metamodel", &self.metamodel.name())
            .field("objects", &self.objects.len())
            .field("store", &self.store.is_some())
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl Graph {
    pub fn new(metamodel: Arc<Metamodel>) -> Self {
        Self {
            metamodel,
            objects: Vec::new(),
            store: None,
            resolver: None,
        }
    }

    /// A graph whose store-backed objects keep their data in `store`
    pub fn with_store(metamodel: Arc<Metamodel>, store: Box<dyn Store>) -> Self {
        Self {
            store: Some(store),
            ..Self::new(metamodel)
        }
    }

    pub fn metamodel(&self) -> &Arc<Metamodel> {
        &self.metamodel
    }

    pub fn store(&self) -> Option<&dyn Store> {
        self.store.as_deref()
    }

    pub fn store_mut(&mut self) -> Option<&mut (dyn Store + 'static)> {
        self.store.as_deref_mut()
    }

    /// Number of objects ever created in this graph
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        (0..self.objects.len()).map(ObjectId::new)
    }

    // ===== Creation =====

    /// Create an empty, locally backed instance of `class`
    ///
    /// # Errors
    ///
    /// Same as [`Graph::create_with`].
    pub fn create(&mut self, class: ClassId) -> Result<ObjectId> {
        self.create_with(class, ObjectOptions::default())
    }

    /// Create an empty instance of `class` with explicit backing and delivery
    ///
    /// # Errors
    ///
    /// * `ClassNotFound` - If `class` is not in the metamodel
    /// * `AbstractClass` - If `class` is abstract
    /// * `StoreUnavailable` - If a store backing is requested on a graph without a store
    pub fn create_with(&mut self, class: ClassId, options: ObjectOptions) -> Result<ObjectId> {
        let def = self.metamodel.class(class)?;
        if def.is_abstract {
            return Err(ModelError::AbstractClass {
                class_name: def.name.clone(),
            });
        }
        if options.backing.is_store_backed() && self.store.is_none() {
            return Err(ModelError::StoreUnavailable);
        }
        let feature_count = self.metamodel.feature_count(class)?;
        let id = ObjectId::new(self.objects.len());
        self.objects
            .push(ObjectRecord::new(class, feature_count, options));
        self.fill_cache(id)?;
        Ok(id)
    }

    /// Create an unresolved placeholder standing for the object at `uri`
    ///
    /// # Errors
    ///
    /// Same as [`Graph::create`].
    pub fn create_proxy(&mut self, class: ClassId, uri: impl Into<String>) -> Result<ObjectId> {
        let id = self.create(class)?;
        self.objects[id.index()].proxy_uri = Some(uri.into());
        Ok(id)
    }

    // ===== Object queries =====

    pub(crate) fn record(&self, object: ObjectId) -> Result<&ObjectRecord> {
        self.objects
            .get(object.index())
            .ok_or(ModelError::ObjectNotFound { object_id: object })
    }

    fn record_mut(&mut self, object: ObjectId) -> Result<&mut ObjectRecord> {
        self.objects
            .get_mut(object.index())
            .ok_or(ModelError::ObjectNotFound { object_id: object })
    }

    /// Class of `object`
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` for an unknown id.
    pub fn class_of(&self, object: ObjectId) -> Result<ClassId> {
        Ok(self.record(object)?.class)
    }

    pub fn is_proxy(&self, object: ObjectId) -> bool {
        self.objects
            .get(object.index())
            .is_some_and(|r| r.proxy_uri.is_some())
    }

    pub fn proxy_uri(&self, object: ObjectId) -> Option<&str> {
        self.objects
            .get(object.index())
            .and_then(|r| r.proxy_uri.as_deref())
    }

    /// Turn an object into a proxy (`Some`) or mark it resolved (`None`)
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` for an unknown id.
    pub fn set_proxy_uri(&mut self, object: ObjectId, uri: Option<String>) -> Result<()> {
        self.record_mut(object)?.proxy_uri = uri;
        Ok(())
    }

    /// Where the feature data of `object` lives
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` for an unknown id.
    pub fn backing(&self, object: ObjectId) -> Result<Backing> {
        Ok(self.record(object)?.backing)
    }

    /// Parent of a contained object
    pub fn container(&self, object: ObjectId) -> Option<ObjectId> {
        self.container_slot(object).map(|(parent, _)| parent)
    }

    /// The parent's containment feature holding `object`
    pub fn containing_feature(&self, object: ObjectId) -> Option<FeatureId> {
        self.container_slot(object).map(|(_, feature)| feature)
    }

    pub(crate) fn container_slot(&self, object: ObjectId) -> Option<(ObjectId, FeatureId)> {
        self.objects.get(object.index()).and_then(|r| r.container)
    }

    /// Check if `ancestor` is on the container chain above `object`
    pub fn is_ancestor(&self, ancestor: ObjectId, object: ObjectId) -> bool {
        let mut current = self.container(object);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.container(parent);
        }
        false
    }

    /// Definition of `feature` on the class of `object`
    ///
    /// # Errors
    ///
    /// * `ObjectNotFound` - If `object` is not in this graph
    /// * `FeatureNotFound` - If `feature` is not a feature of the object's class
    pub fn feature_def(&self, object: ObjectId, feature: FeatureId) -> Result<Arc<FeatureDef>> {
        self.metamodel.feature(self.class_of(object)?, feature)
    }

    /// Id of the feature called `name` on the class of `object`
    ///
    /// # Errors
    ///
    /// * `ObjectNotFound` - If `object` is not in this graph
    /// * `FeatureNotFound` - If the class has no feature called `name`
    pub fn feature_id(&self, object: ObjectId, name: &str) -> Result<FeatureId> {
        self.metamodel.feature_id(self.class_of(object)?, name)
    }

    fn class_name(&self, object: ObjectId) -> String {
        self.class_of(object)
            .map(|c| self.metamodel.class_name(c))
            .unwrap_or_else(|_| object.to_string())
    }

    // ===== Observers =====

    /// Register `observer` on `object` and make it the observer's target
    ///
    /// Returns `false` if this handle is already registered there.
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` for an unknown id.
    pub fn add_observer(&mut self, object: ObjectId, observer: ObserverHandle) -> Result<bool> {
        let record = self.record_mut(object)?;
        if record.observers.iter().any(|o| same_observer(o, &observer)) {
            return Ok(false);
        }
        record.observers.push(observer.clone());
        observer.borrow_mut().set_target(Some(object));
        Ok(true)
    }

    /// Detach `observer`, telling it with a REMOVING_ADAPTER event first
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` for an unknown id.
    pub fn remove_observer(&mut self, object: ObjectId, observer: &ObserverHandle) -> Result<bool> {
        let record = self.record_mut(object)?;
        let Some(index) = record.observers.iter().position(|o| same_observer(o, observer)) else {
            return Ok(false);
        };
        let removed = record.observers.remove(index);
        if record.deliver {
            removed
                .borrow_mut()
                .notify_changed(&Notification::removing_adapter(object, index));
        }
        removed.borrow_mut().unset_target(object);
        Ok(true)
    }

    /// Observers registered on `object`, in registration order
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` for an unknown id.
    pub fn observers(&self, object: ObjectId) -> Result<&[ObserverHandle]> {
        Ok(&self.record(object)?.observers)
    }

    pub fn deliver(&self, object: ObjectId) -> bool {
        self.objects.get(object.index()).is_some_and(|r| r.deliver)
    }

    /// Switch notification delivery for `object`
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` if the object was created with fixed delivery.
    pub fn set_deliver(&mut self, object: ObjectId, deliver: bool) -> Result<()> {
        let record = self.record_mut(object)?;
        if record.fixed_delivery {
            return Err(ModelError::UnsupportedOperation {
                op: "set_deliver".to_string(),
                reason: format!("delivery of {} is fixed", object),
            });
        }
        record.deliver = deliver;
        Ok(())
    }

    /// Check if a change on `object` would reach anyone
    pub fn notification_required(&self, object: ObjectId) -> bool {
        self.objects
            .get(object.index())
            .is_some_and(|r| r.deliver && !r.observers.is_empty())
    }

    /// Push `notification` to the observers of its notifier
    pub fn notify(&self, notification: &Notification) {
        let Some(record) = self.objects.get(notification.notifier().index()) else {
            return;
        };
        if !record.deliver {
            return;
        }
        for observer in &record.observers {
            match observer.try_borrow_mut() {
                Ok(mut observer) => observer.notify_changed(notification),
                Err(_) => tracing::warn!(
                    object_id = notification.notifier().index(),
                    "observer is borrowed during dispatch, notification skipped"
                ),
            }
        }
    }

    pub(crate) fn queue(&self, chain: &mut NotificationChain, notification: Notification) {
        if self.notification_required(notification.notifier()) {
            chain.add(notification);
        }
    }

    // ===== Reflective access =====

    fn single_feature(&self, object: ObjectId, feature: FeatureId) -> Result<Arc<FeatureDef>> {
        let def = self.feature_def(object, feature)?;
        if def.many {
            return Err(ModelError::NotSingle {
                class_name: self.class_name(object),
                feature: def.name.clone(),
            });
        }
        Ok(def)
    }

    fn changeable_feature(&self, object: ObjectId, feature: FeatureId) -> Result<Arc<FeatureDef>> {
        let def = self.feature_def(object, feature)?;
        if !def.changeable {
            return Err(ModelError::NotChangeable {
                class_name: self.class_name(object),
                feature: def.name.clone(),
            });
        }
        Ok(def)
    }

    /// Value of a single-valued feature, resolving a proxy reference
    ///
    /// # Errors
    ///
    /// * `ObjectNotFound` - If `object` is not in this graph
    /// * `FeatureNotFound` - If `feature` is not a feature of the object's class
    /// * `NotSingle` - If `feature` is multi-valued
    pub fn get(&mut self, object: ObjectId, feature: FeatureId) -> Result<Option<Value>> {
        let def = self.single_feature(object, feature)?;
        let value = self.current_value(object, feature, &def);
        match value {
            Some(Value::Object(target))
                if def.resolves_proxies() && !def.is_container() && self.is_proxy(target) =>
            {
                let resolved = self.resolve_slot(object, feature, &def, target, None)?;
                Ok(Some(Value::Object(resolved)))
            }
            other => Ok(other),
        }
    }

    /// Value of a single-valued feature without proxy resolution
    ///
    /// # Errors
    ///
    /// * `ObjectNotFound` - If `object` is not in this graph
    /// * `FeatureNotFound` - If `feature` is not a feature of the object's class
    /// * `NotSingle` - If `feature` is multi-valued
    pub fn basic_get(&self, object: ObjectId, feature: FeatureId) -> Result<Option<Value>> {
        let def = self.single_feature(object, feature)?;
        Ok(self.current_value(object, feature, &def))
    }

    fn current_value(&self, object: ObjectId, feature: FeatureId, def: &FeatureDef) -> Option<Value> {
        if def.is_container() {
            return self
                .container_via(object, def)
                .map(|(parent, _)| Value::Object(parent));
        }
        self.single_get(object, feature).or_else(|| def.default.clone())
    }

    /// The container slot of `object` if it is held through `container_feature`'s opposite
    fn container_via(&self, object: ObjectId, container_feature: &FeatureDef) -> Option<(ObjectId, FeatureId)> {
        let (parent, feature) = self.container_slot(object)?;
        let holder = self.feature_def(parent, feature).ok()?;
        (container_feature.opposite() == Some(holder.name.as_str())).then_some((parent, feature))
    }

    /// Assign a single-valued feature
    ///
    /// Opposite ends and containers are updated before the SET notification
    /// is dispatched. Assigning a container feature moves `object` into the
    /// new parent.
    ///
    /// # Errors
    ///
    /// * `ObjectNotFound` - If `object` is not in this graph
    /// * `FeatureNotFound` - If `feature` is not a feature of the object's class
    /// * `NotSingle` - If `feature` is multi-valued
    /// * `NotChangeable` - If `feature` is read-only
    /// * `InvalidValue` - If `value` does not conform to the feature type
    /// * `RecursiveContainment` - If the assignment would contain an ancestor
    pub fn set(&mut self, object: ObjectId, feature: FeatureId, value: Option<Value>) -> Result<()> {
        self.single_feature(object, feature)?;
        let def = self.changeable_feature(object, feature)?;
        if def.is_container() {
            return self.set_container_feature(object, feature, &def, value);
        }
        if let Some(value) = &value {
            self.check_value(object, &def, value)?;
        }
        self.assign(object, feature, &def, value)
    }

    /// Validated assignment shared by `set` and the containment helpers
    fn assign(
        &mut self,
        object: ObjectId,
        feature: FeatureId,
        def: &FeatureDef,
        value: Option<Value>,
    ) -> Result<()> {
        let mut chain = NotificationChain::new();
        let old = self.single_get(object, feature);
        if def.has_inverse() && old != value {
            if let Some(Value::Object(previous)) = &old {
                self.inverse_remove(object, feature, def, *previous, &mut chain)?;
            }
            if let Some(Value::Object(next)) = &value {
                self.inverse_add(object, feature, def, *next, &mut chain)?;
            }
        }
        self.single_set(object, feature, value.clone());
        self.queue(&mut chain, Notification::set(object, feature, old, value));
        chain.dispatch(self);
        Ok(())
    }

    fn set_container_feature(
        &mut self,
        object: ObjectId,
        feature: FeatureId,
        def: &FeatureDef,
        value: Option<Value>,
    ) -> Result<()> {
        let current = self.container_via(object, def);
        match value {
            None => match current {
                Some(_) => self.detach(object),
                None => {
                    let mut chain = NotificationChain::new();
                    self.queue(&mut chain, Notification::set(object, feature, None, None));
                    chain.dispatch(self);
                    Ok(())
                }
            },
            Some(value) => {
                self.check_value(object, def, &value)?;
                let Value::Object(parent) = value else {
                    return Err(self.invalid_value(def, "expected an object reference"));
                };
                if current.map(|(p, _)| p) == Some(parent) {
                    let mut chain = NotificationChain::new();
                    let same = Some(Value::Object(parent));
                    self.queue(&mut chain, Notification::set(object, feature, same.clone(), same));
                    chain.dispatch(self);
                    return Ok(());
                }
                if parent == object || self.is_ancestor(object, parent) {
                    return Err(ModelError::RecursiveContainment {
                        object_id: object,
                        container_id: parent,
                    });
                }
                let containment_name = def.opposite().unwrap_or_default().to_string();
                let containment = self.feature_id(parent, &containment_name)?;
                let holder = self.feature_def(parent, containment)?;
                if holder.many {
                    self.list(parent, containment)?.add(Value::Object(object))?;
                    Ok(())
                } else {
                    self.assign(parent, containment, &holder, Some(Value::Object(object)))
                }
            }
        }
    }

    /// Remove `object` from its container, if any
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` for an unknown id.
    pub fn detach(&mut self, object: ObjectId) -> Result<()> {
        let Some((parent, feature)) = self.record(object)?.container else {
            return Ok(());
        };
        let def = self.feature_def(parent, feature)?;
        if def.many {
            FeatureList::new(self, parent, feature, def).remove(&Value::Object(object))?;
            Ok(())
        } else {
            self.assign(parent, feature, &def, None)
        }
    }

    /// Replace the contents of a multi-valued feature
    ///
    /// # Errors
    ///
    /// * `ObjectNotFound` - If `object` is not in this graph
    /// * `FeatureNotFound` - If `feature` is not a feature of the object's class
    /// * `NotChangeable` - If `feature` is read-only
    /// * `NotMany` - If `feature` is single-valued
    /// * `InvalidValue` - If any of `values` does not conform; the list is then empty
    pub fn set_all(&mut self, object: ObjectId, feature: FeatureId, values: Vec<Value>) -> Result<()> {
        self.changeable_feature(object, feature)?;
        let mut list = self.list(object, feature)?;
        list.clear()?;
        list.add_all(values)?;
        Ok(())
    }

    /// Return a feature to its unset state
    ///
    /// Unsettable features report UNSET, others a SET back to the default.
    /// Multi-valued features are cleared.
    ///
    /// # Errors
    ///
    /// * `ObjectNotFound` - If `object` is not in this graph
    /// * `FeatureNotFound` - If `feature` is not a feature of the object's class
    /// * `NotChangeable` - If `feature` is read-only
    pub fn unset(&mut self, object: ObjectId, feature: FeatureId) -> Result<()> {
        let def = self.changeable_feature(object, feature)?;
        if def.many {
            self.list(object, feature)?.clear()?;
            return Ok(());
        }
        if def.is_container() {
            return self.set_container_feature(object, feature, &def, None);
        }
        let mut chain = NotificationChain::new();
        let old = self.single_get(object, feature);
        if def.has_inverse() {
            if let Some(Value::Object(previous)) = &old {
                self.inverse_remove(object, feature, &def, *previous, &mut chain)?;
            }
        }
        self.single_set(object, feature, None);
        let notification = if def.unsettable {
            Notification::unset(object, feature, old, def.default.clone())
        } else {
            Notification::set(object, feature, old, def.default.clone())
        };
        self.queue(&mut chain, notification);
        chain.dispatch(self);
        Ok(())
    }

    /// Check if a feature holds something other than its unset state
    ///
    /// # Errors
    ///
    /// * `ObjectNotFound` - If `object` is not in this graph
    /// * `FeatureNotFound` - If `feature` is not a feature of the object's class
    pub fn is_set(&self, object: ObjectId, feature: FeatureId) -> Result<bool> {
        let def = self.feature_def(object, feature)?;
        if def.many {
            return Ok(self.list_len(object, feature) > 0);
        }
        if def.is_container() {
            return Ok(self.container_via(object, &def).is_some());
        }
        let value = self.single_get(object, feature);
        Ok(if def.unsettable {
            value.is_some()
        } else {
            value.is_some() && value != def.default
        })
    }

    /// List view of a multi-valued feature
    ///
    /// # Errors
    ///
    /// * `ObjectNotFound` - If `object` is not in this graph
    /// * `FeatureNotFound` - If `feature` is not a feature of the object's class
    /// * `NotMany` - If `feature` is single-valued
    pub fn list(&mut self, object: ObjectId, feature: FeatureId) -> Result<FeatureList<'_>> {
        let def = self.feature_def(object, feature)?;
        if !def.many {
            return Err(ModelError::NotMany {
                class_name: self.class_name(object),
                feature: def.name.clone(),
            });
        }
        Ok(FeatureList::new(self, object, feature, def))
    }

    /// Raw contents of a feature: the list for multi-valued features, zero or
    /// one element otherwise
    ///
    /// # Errors
    ///
    /// * `ObjectNotFound` - If `object` is not in this graph
    /// * `FeatureNotFound` - If `feature` is not a feature of the object's class
    pub fn values(&self, object: ObjectId, feature: FeatureId) -> Result<Vec<Value>> {
        let def = self.feature_def(object, feature)?;
        if def.many {
            Ok(self.list_values(object, feature))
        } else {
            Ok(self.current_value(object, feature, &def).into_iter().collect())
        }
    }

    /// Reject a value that cannot be stored in `def` on `owner`
    pub(crate) fn check_value(&self, owner: ObjectId, def: &FeatureDef, value: &Value) -> Result<()> {
        match &def.kind {
            FeatureKind::Attribute { data_type } => {
                if value.conforms_to(*data_type) {
                    Ok(())
                } else {
                    Err(self.invalid_value(def, &format!("expected {:?}, got {:?}", data_type, value)))
                }
            }
            FeatureKind::Reference { target, .. } => {
                let Value::Object(referenced) = value else {
                    return Err(self.invalid_value(def, "expected an object reference"));
                };
                let class = self.class_of(*referenced)?;
                if !self.metamodel.conforms(class, *target) {
                    return Err(self.invalid_value(
                        def,
                        &format!(
                            "{} is not a {}",
                            self.metamodel.class_name(class),
                            self.metamodel.class_name(*target)
                        ),
                    ));
                }
                if def.is_containment() && (*referenced == owner || self.is_ancestor(*referenced, owner)) {
                    return Err(ModelError::RecursiveContainment {
                        object_id: *referenced,
                        container_id: owner,
                    });
                }
                Ok(())
            }
        }
    }

    fn invalid_value(&self, def: &FeatureDef, reason: &str) -> ModelError {
        ModelError::InvalidValue {
            feature: def.name.clone(),
            reason: reason.to_string(),
        }
    }

    // ===== Containment tree =====

    /// Direct children, in feature order then list order
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` for an unknown id.
    pub fn contents(&self, object: ObjectId) -> Result<Vec<ObjectId>> {
        let class = self.class_of(object)?;
        let features = self.metamodel.features(class)?;
        let mut children = Vec::new();
        for (index, def) in features.iter().enumerate() {
            if def.is_containment() && !def.derived {
                children.extend(
                    self.values(object, FeatureId::new(index))?
                        .iter()
                        .filter_map(Value::as_object),
                );
            }
        }
        Ok(children)
    }

    /// Non-containment references held by `object`, with the feature holding each
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` for an unknown id.
    pub fn cross_references(&self, object: ObjectId) -> Result<Vec<(FeatureId, ObjectId)>> {
        let class = self.class_of(object)?;
        let features = self.metamodel.features(class)?;
        let mut references = Vec::new();
        for (index, def) in features.iter().enumerate() {
            if def.is_reference() && !def.is_containment() && !def.is_container() && !def.derived {
                let feature = FeatureId::new(index);
                references.extend(
                    self.values(object, feature)?
                        .iter()
                        .filter_map(Value::as_object)
                        .map(|target| (feature, target)),
                );
            }
        }
        Ok(references)
    }

    /// Every descendant of `root` in depth-first pre-order, root excluded
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` if `root` is not in this graph.
    pub fn all_contents(&self, root: ObjectId) -> Result<AllContents<'_>> {
        self.record(root)?;
        Ok(AllContents::new(self, root))
    }

    /// Descendants of `root` conforming to `class`, skipping subtrees that
    /// cannot contain one
    ///
    /// # Errors
    ///
    /// * `ObjectNotFound` - If `root` is not in this graph
    /// * `ClassNotFound` - If `class` is not in the metamodel
    pub fn all_contents_of_type(&self, root: ObjectId, class: ClassId) -> Result<TypedContents<'_>> {
        let table = self.metamodel.transition_table(self.class_of(root)?, class)?;
        Ok(TypedContents::new(self, root, table))
    }
}

impl Factory for Graph {
    fn create(&mut self, class: ClassId) -> Result<ObjectId> {
        Graph::create(self, class)
    }
}

fn same_observer(a: &ObserverHandle, b: &ObserverHandle) -> bool {
    std::ptr::eq(
        std::rc::Rc::as_ptr(a).cast::<()>(),
        std::rc::Rc::as_ptr(b).cast::<()>(),
    )
}
