//! Deep copy of containment subtrees
//!
//! A [`Copier`] copies objects in two passes: [`Copier::copy`] clones
//! attributes and contained children (recording original → copy), then
//! [`Copier::copy_references`] rewires cross references so that references
//! into the copied set point at copies.

use std::collections::HashMap;
use std::time::Instant;

use modelkit_core_types::{FeatureId, ObjectId};

use crate::errors::{ModelError, Result};
use crate::graph::{Factory, Graph};
use crate::list::OrderedList;
use crate::metamodel::FeatureDef;
use crate::value::Value;
use crate::{log_op_end, log_op_error, log_op_start};

/// Copy behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOptions {
    /// Resolve proxies while reading the originals
    pub resolve_proxies: bool,
    /// Keep one-way references to objects outside the copied set
    pub use_original_references: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            resolve_proxies: false,
            use_original_references: true,
        }
    }
}

/// Two-pass deep copier over one graph
pub struct Copier<'g> {
    graph: &'g mut Graph,
    options: CopyOptions,
    copies: HashMap<ObjectId, ObjectId>,
    /// Originals in the order they were copied
    originals: Vec<ObjectId>,
}

impl<'g> Copier<'g> {
    pub fn new(graph: &'g mut Graph, options: CopyOptions) -> Self {
        Self {
            graph,
            options,
            copies: HashMap::new(),
            originals: Vec::new(),
        }
    }

    /// Copy of `original`, if it has been copied
    pub fn get(&self, original: ObjectId) -> Option<ObjectId> {
        self.copies.get(&original).copied()
    }

    pub fn len(&self) -> usize {
        self.copies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }

    /// Copy `original` and its containment subtree
    ///
    /// Cross references are not set until [`Copier::copy_references`].
    ///
    /// # Errors
    ///
    /// * `ObjectNotFound` - If `original` is not in the graph
    /// * `AbstractClass` - If the original's class cannot be instantiated
    /// * Any error from writing the copied values
    pub fn copy(&mut self, original: ObjectId) -> Result<ObjectId> {
        let original = if self.options.resolve_proxies {
            self.graph.resolve(original)
        } else {
            original
        };
        if let Some(existing) = self.get(original) {
            return Ok(existing);
        }

        let class = self.graph.class_of(original)?;
        let copy = Factory::create(&mut *self.graph, class)?;
        self.copies.insert(original, copy);
        self.originals.push(original);

        let features = self.graph.metamodel().features(class)?;
        for (index, def) in features.iter().enumerate() {
            let feature = FeatureId::new(index);
            if def.derived || !def.changeable || !self.graph.is_set(original, feature)? {
                continue;
            }
            if def.is_attribute() {
                self.copy_attribute(original, copy, feature, def)?;
            } else if def.is_containment() {
                self.copy_containment(original, copy, feature, def)?;
            }
        }

        if let Some(uri) = self.graph.proxy_uri(original).map(str::to_string) {
            self.graph.set_proxy_uri(copy, Some(uri))?;
        }
        Ok(copy)
    }

    /// Copy each of `originals`, sharing one copy map
    ///
    /// # Errors
    ///
    /// Stops at the first failing [`Copier::copy`].
    pub fn copy_all(&mut self, originals: &[ObjectId]) -> Result<Vec<ObjectId>> {
        originals.iter().map(|o| self.copy(*o)).collect()
    }

    fn copy_attribute(
        &mut self,
        original: ObjectId,
        copy: ObjectId,
        feature: FeatureId,
        def: &FeatureDef,
    ) -> Result<()> {
        let values = self.graph.values(original, feature)?;
        if def.many {
            self.graph.list(copy, feature)?.add_all(values)?;
        } else {
            self.graph.set(copy, feature, values.into_iter().next())?;
        }
        Ok(())
    }

    fn copy_containment(
        &mut self,
        original: ObjectId,
        copy: ObjectId,
        feature: FeatureId,
        def: &FeatureDef,
    ) -> Result<()> {
        let children = self.read_references(original, feature, def)?;
        let mut copied = Vec::with_capacity(children.len());
        for child in children {
            copied.push(Value::Object(self.copy(child)?));
        }
        if def.many {
            self.graph.list(copy, feature)?.add_all(copied)?;
        } else {
            self.graph.set(copy, feature, copied.into_iter().next())?;
        }
        Ok(())
    }

    fn read_references(&mut self, object: ObjectId, feature: FeatureId, def: &FeatureDef) -> Result<Vec<ObjectId>> {
        let values = match (def.many, self.options.resolve_proxies) {
            (true, true) => self.graph.list(object, feature)?.get_all()?,
            (false, true) => self.graph.get(object, feature)?.into_iter().collect(),
            (_, false) => self.graph.values(object, feature)?,
        };
        Ok(values.iter().filter_map(Value::as_object).collect())
    }

    /// Point the cross references of every copy at copies where possible
    ///
    /// Bidirectional references to objects outside the copied set are
    /// skipped; one-way ones keep the original target when
    /// `use_original_references` is on.
    ///
    /// # Errors
    ///
    /// Propagates errors from assigning the rewired references.
    pub fn copy_references(&mut self) -> Result<()> {
        for original in self.originals.clone() {
            let Some(copy) = self.get(original) else {
                continue;
            };
            let class = self.graph.class_of(original)?;
            let features = self.graph.metamodel().features(class)?;
            for (index, def) in features.iter().enumerate() {
                let feature = FeatureId::new(index);
                if !def.is_reference()
                    || def.is_containment()
                    || def.is_container()
                    || def.derived
                    || !def.changeable
                    || !self.graph.is_set(original, feature)?
                {
                    continue;
                }
                if def.many {
                    self.copy_reference_list(original, copy, feature, def)?;
                } else {
                    self.copy_reference(original, copy, feature, def)?;
                }
            }
        }
        Ok(())
    }

    fn copy_reference(
        &mut self,
        original: ObjectId,
        copy: ObjectId,
        feature: FeatureId,
        def: &FeatureDef,
    ) -> Result<()> {
        let Some(target) = self.read_references(original, feature, def)?.into_iter().next() else {
            return Ok(());
        };
        match self.get(target) {
            Some(copied) => self.graph.set(copy, feature, Some(Value::Object(copied))),
            None if self.options.use_original_references && def.opposite().is_none() => {
                self.graph.set(copy, feature, Some(Value::Object(target)))
            }
            None => Ok(()),
        }
    }

    fn copy_reference_list(
        &mut self,
        original: ObjectId,
        copy: ObjectId,
        feature: FeatureId,
        def: &FeatureDef,
    ) -> Result<()> {
        let targets = self.read_references(original, feature, def)?;
        let bidirectional = def.opposite().is_some();
        let mapped: Vec<(ObjectId, Option<ObjectId>)> =
            targets.into_iter().map(|t| (t, self.get(t))).collect();
        let use_original = self.options.use_original_references;

        let mut list = self.graph.list(copy, feature)?;
        let mut index = 0;
        for (target, copied) in mapped {
            match copied {
                None if use_original && !bidirectional => {
                    if list.insert(index, Value::Object(target))? {
                        index += 1;
                    }
                }
                None => {}
                Some(copied) => {
                    let value = Value::Object(copied);
                    match list.index_of(&value) {
                        // the inverse side already put it there
                        Some(position) if bidirectional => {
                            if position != index {
                                list.move_to(position, index)?;
                            }
                            index += 1;
                        }
                        _ => {
                            if list.insert(index, value)? {
                                index += 1;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn copy_set(graph: &mut Graph, objects: &[ObjectId]) -> Result<(Vec<ObjectId>, usize)> {
    let mut copier = Copier::new(graph, CopyOptions::default());
    let copies = copier.copy_all(objects)?;
    copier.copy_references()?;
    Ok((copies, copier.len()))
}

/// Deep copy `object` with default options, references included
///
/// # Errors
///
/// Same as [`copy_all`].
pub fn copy(graph: &mut Graph, object: ObjectId) -> Result<ObjectId> {
    let copies = copy_all(graph, &[object])?;
    copies
        .into_iter()
        .next()
        .ok_or(ModelError::ObjectNotFound { object_id: object })
}

/// Deep copy several objects as one set, so references between them are
/// rewired to the copies
///
/// # Errors
///
/// Any [`Copier`] error; it is logged at the operation boundary before
/// being returned.
pub fn copy_all(graph: &mut Graph, objects: &[ObjectId]) -> Result<Vec<ObjectId>> {
    let started = Instant::now();
    log_op_start!("deep_copy", root_count = objects.len());
    match copy_set(graph, objects) {
        Ok((copies, count)) => {
            log_op_end!(
                "deep_copy",
                duration_ms = started.elapsed().as_millis() as u64,
                copy_count = count
            );
            Ok(copies)
        }
        Err(err) => {
            log_op_error!(
                "deep_copy",
                err.clone(),
                duration_ms = started.elapsed().as_millis() as u64
            );
            Err(err)
        }
    }
}
