//! Proxy resolution
//!
//! A proxy is an object carrying a locator URI in place of its data. Reads
//! through proxy-resolving features ask the graph's [`ProxyResolver`] for the
//! real object and swap it into the slot that was read.

use std::collections::HashMap;

use modelkit_core_types::{FeatureId, ObjectId};

use crate::errors::{ModelError, Result};
use crate::metamodel::FeatureDef;
use crate::notify::{Notification, NotificationChain};
use crate::value::Value;

use super::Graph;

/// Maps a proxy to the object its locator denotes
pub trait ProxyResolver {
    /// `None` declines; the proxy then stays in place
    fn resolve(&mut self, graph: &Graph, proxy: ObjectId, uri: &str) -> Option<ObjectId>;
}

/// Resolver backed by a fixed locator table
#[derive(Debug, Default, Clone)]
pub struct UriMapResolver {
    targets: HashMap<String, ObjectId>,
}

impl UriMapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, object: ObjectId) -> Option<ObjectId> {
        self.targets.insert(uri.into(), object)
    }

    pub fn with(mut self, uri: impl Into<String>, object: ObjectId) -> Self {
        self.insert(uri, object);
        self
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl ProxyResolver for UriMapResolver {
    fn resolve(&mut self, _graph: &Graph, _proxy: ObjectId, uri: &str) -> Option<ObjectId> {
        self.targets.get(uri).copied()
    }
}

impl Graph {
    pub fn set_resolver(&mut self, resolver: Box<dyn ProxyResolver>) {
        self.resolver = Some(resolver);
    }

    pub fn take_resolver(&mut self) -> Option<Box<dyn ProxyResolver>> {
        self.resolver.take()
    }

    /// The object `object` stands for, or `object` itself when it is not a
    /// proxy or resolution is declined
    pub fn resolve(&mut self, object: ObjectId) -> ObjectId {
        let Some(uri) = self.proxy_uri(object).map(str::to_string) else {
            return object;
        };
        let Some(mut resolver) = self.resolver.take() else {
            tracing::warn!(object_id = object.index(), uri = %uri, "no proxy resolver configured");
            return object;
        };
        let resolved = resolver.resolve(self, object, &uri);
        self.resolver = Some(resolver);

        match resolved {
            Some(target) if target != object && self.record(target).is_ok() => {
                tracing::debug!(
                    object_id = object.index(),
                    resolved_id = target.index(),
                    uri = %uri,
                    "proxy resolved"
                );
                target
            }
            _ => {
                tracing::warn!(object_id = object.index(), uri = %uri, "proxy resolution declined");
                object
            }
        }
    }

    /// Like [`Graph::resolve`], but a declined proxy is an error
    ///
    /// # Errors
    ///
    /// Returns `ResolutionFailure` with the proxy's URI when the resolver
    /// declines or none is configured.
    pub fn try_resolve(&mut self, object: ObjectId) -> Result<ObjectId> {
        let resolved = self.resolve(object);
        if resolved == object {
            if let Some(uri) = self.proxy_uri(object) {
                return Err(ModelError::ResolutionFailure {
                    uri: uri.to_string(),
                });
            }
        }
        Ok(resolved)
    }

    /// Resolve the proxy read from `owner.feature` (at `position` for lists)
    /// and replace it in that slot
    ///
    /// Returns the proxy unchanged when resolution is declined or the result
    /// cannot take the slot.
    pub(crate) fn resolve_slot(
        &mut self,
        owner: ObjectId,
        feature: FeatureId,
        def: &FeatureDef,
        proxy: ObjectId,
        position: Option<usize>,
    ) -> Result<ObjectId> {
        let resolved = self.resolve(proxy);
        if resolved == proxy {
            return Ok(proxy);
        }
        if self.check_value(owner, def, &Value::Object(resolved)).is_err() {
            tracing::warn!(
                object_id = owner.index(),
                feature_id = feature.index(),
                resolved_id = resolved.index(),
                "resolved object does not fit the feature, keeping proxy"
            );
            return Ok(proxy);
        }
        if let Some(index) = position {
            let held = self
                .list_position(owner, feature, &Value::Object(resolved))
                .is_some_and(|at| at != index);
            if held && def.keeps_unique() {
                tracing::warn!(
                    object_id = owner.index(),
                    feature_id = feature.index(),
                    resolved_id = resolved.index(),
                    "resolved object already in the list, keeping proxy"
                );
                return Ok(proxy);
            }
        }

        match position {
            Some(index) => {
                self.list_set(owner, feature, index, Value::Object(resolved));
            }
            None => {
                self.single_set(owner, feature, Some(Value::Object(resolved)));
            }
        }

        let mut chain = NotificationChain::new();
        if def.has_inverse() {
            self.inverse_remove(owner, feature, def, proxy, &mut chain)?;
            if !self.holds_inverse(owner, def, resolved)? {
                self.inverse_add(owner, feature, def, resolved, &mut chain)?;
            }
        }
        self.queue(
            &mut chain,
            Notification::resolve(owner, feature, proxy, resolved, position),
        );
        chain.dispatch(self);
        Ok(resolved)
    }

    /// Check if `target` already carries the other end of `owner`'s feature
    fn holds_inverse(&self, owner: ObjectId, def: &FeatureDef, target: ObjectId) -> Result<bool> {
        if def.is_containment() {
            return Ok(self.container_slot(target).is_some());
        }
        let Some(opposite_name) = def.opposite() else {
            return Ok(true);
        };
        let opposite = self.feature_id(target, opposite_name)?;
        let owner_value = Value::Object(owner);
        if self.feature_def(target, opposite)?.many {
            Ok(self.list_position(target, opposite, &owner_value).is_some())
        } else {
            Ok(self.single_get(target, opposite) == Some(owner_value))
        }
    }
}
