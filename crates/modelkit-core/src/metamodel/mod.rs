//! Self-describing metamodel read by the kernel
//!
//! Classes, their structural features, and the lazily computed class-keyed
//! caches derived from them (full feature lists, feature-name maps, subtype
//! closures, class transition tables).

pub mod builder;
pub mod class;

pub use builder::MetamodelBuilder;
pub use class::{ClassDef, FeatureDef, FeatureKind};

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use modelkit_core_types::{ClassId, FeatureId};
use serde::{Deserialize, Serialize};

use crate::errors::{ModelError, Result};
use crate::traversal::ClassTransitionTable;
use crate::{log_op_end, log_op_start};

/// Full feature list of one class plus its name index
#[derive(Debug, Clone)]
struct FeatureTable {
    features: Arc<[Arc<FeatureDef>]>,
    by_name: Arc<HashMap<String, FeatureId>>,
}

/// Lazily filled, class-keyed caches
///
/// Each mutex only serialises the one-time computation of an entry; no lock
/// is held while an entry is being computed or while notifications dispatch.
#[derive(Debug, Default)]
struct MetamodelCache {
    features: Mutex<HashMap<ClassId, FeatureTable>>,
    subtypes: Mutex<HashMap<ClassId, Arc<[ClassId]>>>,
    transitions: Mutex<HashMap<(ClassId, ClassId), Arc<ClassTransitionTable>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A validated set of classes
///
/// Immutable once shared; `add_feature` is the only structural mutation and
/// it invalidates every cache.
#[derive(Debug, Serialize, Deserialize)]
pub struct Metamodel {
    name: String,
    classes: Vec<ClassDef>,
    #[serde(skip)]
    cache: MetamodelCache,
}

impl Metamodel {
    pub(crate) fn from_classes(name: String, classes: Vec<ClassDef>) -> Result<Self> {
        let mut metamodel = Self {
            name,
            classes,
            cache: MetamodelCache::default(),
        };
        metamodel.validate()?;
        Ok(metamodel)
    }

    /// Load and validate a metamodel definition from JSON
    ///
    /// # Errors
    ///
    /// Returns `Serialization` for malformed JSON and `InvalidMetamodel` for
    /// inconsistent definitions.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut metamodel: Metamodel = serde_json::from_str(json)?;
        metamodel.validate()?;
        Ok(metamodel)
    }

    /// Serialize the definition (caches excluded)
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Iterate over all classes with their ids
    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassDef)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, def)| (ClassId::new(i), def))
    }

    /// Get a class definition by id
    ///
    /// # Errors
    ///
    /// Returns `ClassNotFound` if the id is outside this metamodel.
    pub fn class(&self, id: ClassId) -> Result<&ClassDef> {
        self.classes
            .get(id.index())
            .ok_or(ModelError::ClassNotFound { class_id: id })
    }

    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.classes
            .iter()
            .position(|c| c.name == name)
            .map(ClassId::new)
    }

    /// Check if `sub` is `sup` or inherits from it
    pub fn conforms(&self, sub: ClassId, sup: ClassId) -> bool {
        let mut pending = vec![sub];
        let mut seen = HashSet::new();
        while let Some(class) = pending.pop() {
            if class == sup {
                return true;
            }
            if !seen.insert(class) {
                continue;
            }
            if let Some(def) = self.classes.get(class.index()) {
                pending.extend(def.supertypes.iter().copied());
            }
        }
        false
    }

    /// All classes conforming to `class`, itself included, in id order
    pub fn subtypes(&self, class: ClassId) -> Arc<[ClassId]> {
        if let Some(cached) = lock(&self.cache.subtypes).get(&class) {
            return cached.clone();
        }
        let computed: Arc<[ClassId]> = (0..self.classes.len())
            .map(ClassId::new)
            .filter(|candidate| self.conforms(*candidate, class))
            .collect();
        lock(&self.cache.subtypes)
            .entry(class)
            .or_insert(computed)
            .clone()
    }

    fn feature_table(&self, class: ClassId) -> Result<FeatureTable> {
        if let Some(cached) = lock(&self.cache.features).get(&class) {
            return Ok(cached.clone());
        }
        let features = self.collect_features(class)?;
        let by_name = features
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), FeatureId::new(i)))
            .collect();
        let table = FeatureTable {
            features: features.into(),
            by_name: Arc::new(by_name),
        };
        Ok(lock(&self.cache.features)
            .entry(class)
            .or_insert(table)
            .clone())
    }

    /// Inherited features first (first supertype keeps its ids), then own ones
    fn collect_features(&self, class: ClassId) -> Result<Vec<Arc<FeatureDef>>> {
        let def = self.class(class)?;
        let mut all: Vec<Arc<FeatureDef>> = Vec::new();
        for supertype in &def.supertypes {
            for feature in self.collect_features(*supertype)? {
                if !all.iter().any(|f| f.name == feature.name) {
                    all.push(feature);
                }
            }
        }
        all.extend(def.features.iter().cloned().map(Arc::new));
        Ok(all)
    }

    /// Full feature list of a class, indexed by `FeatureId`
    ///
    /// # Errors
    ///
    /// Returns `ClassNotFound` if `class` is outside this metamodel.
    pub fn features(&self, class: ClassId) -> Result<Arc<[Arc<FeatureDef>]>> {
        Ok(self.feature_table(class)?.features)
    }

    /// Number of features of `class`, inherited ones included
    ///
    /// # Errors
    ///
    /// Returns `ClassNotFound` if `class` is outside this metamodel.
    pub fn feature_count(&self, class: ClassId) -> Result<usize> {
        Ok(self.feature_table(class)?.features.len())
    }

    /// Get a feature of a class by id
    ///
    /// # Errors
    ///
    /// Returns `ClassNotFound` or `FeatureNotFound`.
    pub fn feature(&self, class: ClassId, feature: FeatureId) -> Result<Arc<FeatureDef>> {
        let table = self.feature_table(class)?;
        table
            .features
            .get(feature.index())
            .cloned()
            .ok_or_else(|| ModelError::FeatureNotFound {
                class_name: self.class_name(class),
                feature: feature.to_string(),
            })
    }

    /// Look up a feature id by name
    ///
    /// # Errors
    ///
    /// Returns `ClassNotFound` or `FeatureNotFound`.
    pub fn feature_id(&self, class: ClassId, name: &str) -> Result<FeatureId> {
        let table = self.feature_table(class)?;
        table
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::FeatureNotFound {
                class_name: self.class_name(class),
                feature: name.to_string(),
            })
    }

    pub(crate) fn class_name(&self, class: ClassId) -> String {
        self.classes
            .get(class.index())
            .map(|c| c.name.clone())
            .unwrap_or_else(|| class.to_string())
    }

    /// Transition table pruning containment traversal from `start` to `end`
    ///
    /// Built on first request and cached for the lifetime of the metamodel
    /// (or until `invalidate_caches`).
    ///
    /// # Errors
    ///
    /// Returns `ClassNotFound` if `start` or `end` is outside this metamodel.
    pub fn transition_table(
        &self,
        start: ClassId,
        end: ClassId,
    ) -> Result<Arc<ClassTransitionTable>> {
        if let Some(cached) = lock(&self.cache.transitions).get(&(start, end)) {
            return Ok(cached.clone());
        }

        let started = Instant::now();
        log_op_start!(
            "build_transition_table",
            class_id = start.index(),
            end_class_id = end.index()
        );
        let table = ClassTransitionTable::build(self, start, end)?;
        log_op_end!(
            "build_transition_table",
            duration_ms = started.elapsed().as_millis() as u64,
            transition_count = table.transition_count()
        );

        Ok(lock(&self.cache.transitions)
            .entry((start, end))
            .or_insert_with(|| Arc::new(table))
            .clone())
    }

    /// Append a feature to a class and drop every derived cache
    ///
    /// Only meant for metamodels that have no live instances yet; existing
    /// objects keep the slot layout they were created with.
    ///
    /// # Errors
    ///
    /// * `ClassNotFound` - If `class` is outside this metamodel
    /// * `InvalidMetamodel` - If the feature breaks validation; the class is
    ///   restored to its previous feature list
    pub fn add_feature(&mut self, class: ClassId, feature: FeatureDef) -> Result<FeatureId> {
        let name = feature.name.clone();
        self.classes
            .get_mut(class.index())
            .ok_or(ModelError::ClassNotFound { class_id: class })?
            .features
            .push(feature);
        if let Err(err) = self.validate() {
            if let Some(def) = self.classes.get_mut(class.index()) {
                def.features.pop();
            }
            self.invalidate_caches();
            return Err(err);
        }
        self.feature_id(class, &name)
    }

    /// Drop all lazily computed entries
    pub fn invalidate_caches(&self) {
        lock(&self.cache.features).clear();
        lock(&self.cache.subtypes).clear();
        lock(&self.cache.transitions).clear();
    }

    fn validate(&mut self) -> Result<()> {
        self.invalidate_caches();
        self.check_supertypes()?;

        let count = self.classes.len();
        let mut container_flags = Vec::new();

        for index in 0..count {
            let class = ClassId::new(index);
            let all = self.collect_features(class)?;
            let mut names = HashSet::new();
            for feature in &all {
                if !names.insert(feature.name.as_str()) {
                    return Err(invalid(format!(
                        "class {} declares feature '{}' twice",
                        self.classes[index].name, feature.name
                    )));
                }
            }

            for (local, feature) in self.classes[index].features.iter().enumerate() {
                self.check_feature(class, feature)?;
                if let (Some(target), Some(opposite)) = (feature.target(), feature.opposite()) {
                    let other = self
                        .collect_features(target)?
                        .into_iter()
                        .find(|f| f.name == opposite)
                        .ok_or_else(|| {
                            invalid(format!(
                                "opposite '{}' of {}.{} not found",
                                opposite, self.classes[index].name, feature.name
                            ))
                        })?;
                    if other.opposite() != Some(feature.name.as_str()) {
                        return Err(invalid(format!(
                            "opposite of {}.{} does not point back",
                            self.classes[index].name, feature.name
                        )));
                    }
                    if !other.target().is_some_and(|t| self.conforms(class, t)) {
                        return Err(invalid(format!(
                            "opposite '{}' does not target {}",
                            opposite, self.classes[index].name
                        )));
                    }
                    if feature.is_containment() && other.is_containment() {
                        return Err(invalid(format!(
                            "{}.{} and its opposite are both containments",
                            self.classes[index].name, feature.name
                        )));
                    }
                    if other.is_containment() && feature.many {
                        return Err(invalid(format!(
                            "container feature {}.{} must be single-valued",
                            self.classes[index].name, feature.name
                        )));
                    }
                    container_flags.push((index, local, other.is_containment()));
                }
            }
        }

        for (index, local, flag) in container_flags {
            self.classes[index].features[local].set_container(flag);
        }
        self.invalidate_caches();
        Ok(())
    }

    fn check_supertypes(&self) -> Result<()> {
        for (index, def) in self.classes.iter().enumerate() {
            for supertype in &def.supertypes {
                if supertype.index() >= self.classes.len() {
                    return Err(invalid(format!(
                        "class {} has unknown supertype {}",
                        def.name, supertype
                    )));
                }
            }
            let class = ClassId::new(index);
            if def
                .supertypes
                .iter()
                .any(|supertype| self.conforms(*supertype, class))
            {
                return Err(invalid(format!(
                    "class {} inherits from itself",
                    def.name
                )));
            }
        }
        Ok(())
    }

    fn check_feature(&self, class: ClassId, feature: &FeatureDef) -> Result<()> {
        if let Some(target) = feature.target() {
            if target.index() >= self.classes.len() {
                return Err(invalid(format!(
                    "{}.{} targets unknown class {}",
                    self.class_name(class),
                    feature.name,
                    target
                )));
            }
        }
        if let (Some(data_type), Some(default)) = (feature.data_type(), &feature.default) {
            if !default.conforms_to(data_type) {
                return Err(invalid(format!(
                    "default of {}.{} is not a {:?}",
                    self.class_name(class),
                    feature.name,
                    data_type
                )));
            }
        }
        if feature.is_reference() && feature.default.is_some() {
            return Err(invalid(format!(
                "reference {}.{} cannot declare a default",
                self.class_name(class),
                feature.name
            )));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> ModelError {
    ModelError::InvalidMetamodel { reason }
}
