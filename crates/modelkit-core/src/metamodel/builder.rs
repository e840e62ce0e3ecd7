use modelkit_core_types::ClassId;

use super::class::{ClassDef, FeatureDef};
use super::Metamodel;
use crate::errors::{ModelError, Result};

/// Pending opposite pairing, applied at build time
#[derive(Debug, Clone)]
struct OppositePair {
    class_a: ClassId,
    feature_a: String,
    class_b: ClassId,
    feature_b: String,
}

/// Incremental construction of a `Metamodel`
///
/// Mistakes (unknown class ids, unknown opposite names) are collected and
/// reported by `build`, so definitions can be chained without `?` on every
/// line.
#[derive(Debug, Default)]
pub struct MetamodelBuilder {
    name: String,
    classes: Vec<ClassDef>,
    opposites: Vec<OppositePair>,
    problems: Vec<String>,
}

impl MetamodelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declare a concrete class
    pub fn class(&mut self, name: impl Into<String>) -> ClassId {
        self.classes.push(ClassDef::new(name));
        ClassId::new(self.classes.len() - 1)
    }

    /// Declare an abstract class
    pub fn abstract_class(&mut self, name: impl Into<String>) -> ClassId {
        let id = self.class(name);
        self.classes[id.index()].is_abstract = true;
        id
    }

    pub fn supertype(&mut self, class: ClassId, supertype: ClassId) -> &mut Self {
        match self.classes.get_mut(class.index()) {
            Some(def) => def.supertypes.push(supertype),
            None => self
                .problems
                .push(format!("supertype declared on unknown class {}", class)),
        }
        self
    }

    pub fn feature(&mut self, class: ClassId, feature: FeatureDef) -> &mut Self {
        match self.classes.get_mut(class.index()) {
            Some(def) => def.features.push(feature),
            None => self.problems.push(format!(
                "feature '{}' declared on unknown class {}",
                feature.name, class
            )),
        }
        self
    }

    /// Pair two reference features declared on `class_a` and `class_b`
    pub fn opposites(
        &mut self,
        class_a: ClassId,
        feature_a: &str,
        class_b: ClassId,
        feature_b: &str,
    ) -> &mut Self {
        self.opposites.push(OppositePair {
            class_a,
            feature_a: feature_a.to_string(),
            class_b,
            feature_b: feature_b.to_string(),
        });
        self
    }

    /// Validate and freeze the definitions
    ///
    /// # Errors
    ///
    /// Returns `InvalidMetamodel` describing the first problem found.
    pub fn build(mut self) -> Result<Metamodel> {
        if let Some(problem) = self.problems.first() {
            return Err(ModelError::InvalidMetamodel {
                reason: problem.clone(),
            });
        }

        for pair in std::mem::take(&mut self.opposites) {
            self.link(pair.class_a, &pair.feature_a, &pair.feature_b)?;
            self.link(pair.class_b, &pair.feature_b, &pair.feature_a)?;
        }

        Metamodel::from_classes(self.name, self.classes)
    }

    fn link(&mut self, class: ClassId, feature: &str, opposite: &str) -> Result<()> {
        let linked = self
            .classes
            .get_mut(class.index())
            .and_then(|def| def.features.iter_mut().find(|f| f.name == feature))
            .is_some_and(|def| def.set_opposite(opposite));
        if linked {
            Ok(())
        } else {
            Err(ModelError::InvalidMetamodel {
                reason: format!(
                    "cannot pair '{}' on {}: no such reference declared there",
                    feature, class
                ),
            })
        }
    }
}
