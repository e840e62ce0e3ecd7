//! Opposite-end and container maintenance
//!
//! These run before the owner's own notification is queued, so observers
//! see the inverse updates first once the chain dispatches.

use modelkit_core_types::{FeatureId, ObjectId};

use crate::errors::Result;
use crate::metamodel::FeatureDef;
use crate::notify::{Notification, NotificationChain};
use crate::value::Value;

use super::Graph;

impl Graph {
    /// Mirror `owner.feature += target` onto `target`
    pub(crate) fn inverse_add(
        &mut self,
        owner: ObjectId,
        feature: FeatureId,
        def: &FeatureDef,
        target: ObjectId,
        chain: &mut NotificationChain,
    ) -> Result<()> {
        if def.is_containment() {
            return self.attach_child(owner, feature, target, chain);
        }
        let Some(opposite_name) = def.opposite() else {
            return Ok(());
        };
        let opposite = self.feature_id(target, opposite_name)?;
        let opposite_def = self.feature_def(target, opposite)?;
        let owner_value = Value::Object(owner);

        if opposite_def.many {
            if self.list_position(target, opposite, &owner_value).is_none() {
                let index = self.list_len(target, opposite);
                self.list_insert(target, opposite, index, owner_value.clone());
                self.queue(chain, Notification::add(target, opposite, owner_value, index));
            }
            return Ok(());
        }

        let previous = self.single_get(target, opposite);
        if previous.as_ref() == Some(&owner_value) {
            return Ok(());
        }
        if let Some(Value::Object(holder)) = previous {
            // the old holder loses `target` on its end of the pair
            let held = self.feature_id(holder, &def.name)?;
            self.drop_reference(holder, held, target, chain)?;
        }
        let old = self.single_set(target, opposite, Some(owner_value.clone()));
        self.queue(chain, Notification::set(target, opposite, old, Some(owner_value)));
        Ok(())
    }

    /// Mirror `owner.feature -= target` onto `target`
    pub(crate) fn inverse_remove(
        &mut self,
        owner: ObjectId,
        feature: FeatureId,
        def: &FeatureDef,
        target: ObjectId,
        chain: &mut NotificationChain,
    ) -> Result<()> {
        if def.is_containment() {
            if self.container_slot(target) == Some((owner, feature)) {
                self.clear_container(target, chain)?;
            }
            return Ok(());
        }
        let Some(opposite_name) = def.opposite() else {
            return Ok(());
        };
        let opposite = self.feature_id(target, opposite_name)?;
        self.drop_reference(target, opposite, owner, chain)
    }

    /// Remove `referenced` from `holder.feature` without touching the other end
    fn drop_reference(
        &mut self,
        holder: ObjectId,
        feature: FeatureId,
        referenced: ObjectId,
        chain: &mut NotificationChain,
    ) -> Result<()> {
        let def = self.feature_def(holder, feature)?;
        let value = Value::Object(referenced);
        if def.many {
            if let Some(index) = self.list_position(holder, feature, &value) {
                self.list_remove(holder, feature, index);
                self.queue(chain, Notification::remove(holder, feature, value, index));
            }
        } else if self.single_get(holder, feature).as_ref() == Some(&value) {
            self.single_set(holder, feature, None);
            self.queue(chain, Notification::set(holder, feature, Some(value), None));
        }
        Ok(())
    }

    /// Record `parent.feature` as the container of `child`, first taking it
    /// out of the slot of its previous container
    fn attach_child(
        &mut self,
        parent: ObjectId,
        feature: FeatureId,
        child: ObjectId,
        chain: &mut NotificationChain,
    ) -> Result<()> {
        let previous = self.container_slot(child);
        if previous == Some((parent, feature)) {
            return Ok(());
        }
        if let Some((old_parent, old_feature)) = previous {
            self.drop_reference(old_parent, old_feature, child, chain)?;
        }
        self.record_mut(child)?.container = Some((parent, feature));

        let old_link = match previous {
            Some((old_parent, old_feature)) => self
                .container_feature_of(child, old_parent, old_feature)?
                .map(|f| (f, old_parent)),
            None => None,
        };
        let new_link = self.container_feature_of(child, parent, feature)?;
        match (old_link, new_link) {
            (Some((old_f, old_parent)), Some(new_f)) if old_f == new_f => {
                self.queue(
                    chain,
                    Notification::set(
                        child,
                        new_f,
                        Some(Value::Object(old_parent)),
                        Some(Value::Object(parent)),
                    ),
                );
            }
            (old_link, new_link) => {
                if let Some((old_f, old_parent)) = old_link {
                    self.queue(
                        chain,
                        Notification::set(child, old_f, Some(Value::Object(old_parent)), None),
                    );
                }
                if let Some(new_f) = new_link {
                    self.queue(
                        chain,
                        Notification::set(child, new_f, None, Some(Value::Object(parent))),
                    );
                }
            }
        }
        Ok(())
    }

    fn clear_container(&mut self, child: ObjectId, chain: &mut NotificationChain) -> Result<()> {
        let Some((parent, feature)) = self.record_mut(child)?.container.take() else {
            return Ok(());
        };
        if let Some(link) = self.container_feature_of(child, parent, feature)? {
            self.queue(
                chain,
                Notification::set(child, link, Some(Value::Object(parent)), None),
            );
        }
        Ok(())
    }

    /// The child-side feature paired with `parent.feature`, if one is declared
    fn container_feature_of(
        &self,
        child: ObjectId,
        parent: ObjectId,
        feature: FeatureId,
    ) -> Result<Option<FeatureId>> {
        let def = self.feature_def(parent, feature)?;
        match def.opposite() {
            Some(name) => Ok(Some(self.feature_id(child, name)?)),
            None => Ok(None),
        }
    }
}
