use modelkit_core_types::ClassId;
use serde::{Deserialize, Serialize};

use crate::value::{DataType, Value};

fn default_true() -> bool {
    true
}

/// What a structural feature holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureKind {
    /// Primitive values of one data type
    Attribute { data_type: DataType },

    /// References to objects conforming to `target`
    Reference {
        target: ClassId,
        #[serde(default)]
        containment: bool,
        /// Name of the paired feature on the target class
        #[serde(default)]
        opposite: Option<String>,
        #[serde(default = "default_true")]
        resolve_proxies: bool,
        /// Set during validation when the opposite is a containment
        #[serde(skip)]
        container: bool,
    },
}

/// A typed, named slot on a class
///
/// Feature ids are not stored here: a feature's id is its position in the
/// full feature list of the class it is looked up on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDef {
    pub name: String,
    pub kind: FeatureKind,
    #[serde(default)]
    pub many: bool,
    #[serde(default = "default_true")]
    pub unique: bool,
    #[serde(default = "default_true")]
    pub changeable: bool,
    #[serde(default)]
    pub derived: bool,
    #[serde(default)]
    pub unsettable: bool,
    #[serde(default)]
    pub default: Option<Value>,
}

impl FeatureDef {
    /// Single-valued attribute; lists built with `.many()` allow duplicates
    pub fn attribute(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Attribute { data_type },
            many: false,
            unique: false,
            changeable: true,
            derived: false,
            unsettable: false,
            default: None,
        }
    }

    /// Single-valued, proxy-resolving cross reference
    pub fn reference(name: impl Into<String>, target: ClassId) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Reference {
                target,
                containment: false,
                opposite: None,
                resolve_proxies: true,
                container: false,
            },
            many: false,
            unique: true,
            changeable: true,
            derived: false,
            unsettable: false,
            default: None,
        }
    }

    /// Single-valued containment reference
    pub fn containment(name: impl Into<String>, target: ClassId) -> Self {
        let mut def = Self::reference(name, target);
        if let FeatureKind::Reference { containment, .. } = &mut def.kind {
            *containment = true;
        }
        def
    }

    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.changeable = false;
        self
    }

    pub fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    pub fn unsettable(mut self) -> Self {
        self.unsettable = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn without_proxy_resolution(mut self) -> Self {
        if let FeatureKind::Reference {
            resolve_proxies, ..
        } = &mut self.kind
        {
            *resolve_proxies = false;
        }
        self
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, FeatureKind::Attribute { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FeatureKind::Reference { .. })
    }

    pub fn is_containment(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::Reference {
                containment: true,
                ..
            }
        )
    }

    /// Check if this is the child-side end of a containment pair
    pub fn is_container(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::Reference {
                container: true,
                ..
            }
        )
    }

    pub fn opposite(&self) -> Option<&str> {
        match &self.kind {
            FeatureKind::Reference { opposite, .. } => opposite.as_deref(),
            FeatureKind::Attribute { .. } => None,
        }
    }

    /// Check if mutations must be mirrored onto the referenced object
    pub fn has_inverse(&self) -> bool {
        self.is_containment() || self.opposite().is_some()
    }

    /// Check if a list of this feature may never hold the same element twice
    pub fn keeps_unique(&self) -> bool {
        self.unique || self.has_inverse()
    }

    pub fn resolves_proxies(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::Reference {
                resolve_proxies: true,
                ..
            }
        )
    }

    pub fn target(&self) -> Option<ClassId> {
        match self.kind {
            FeatureKind::Reference { target, .. } => Some(target),
            FeatureKind::Attribute { .. } => None,
        }
    }

    pub fn data_type(&self) -> Option<DataType> {
        match self.kind {
            FeatureKind::Attribute { data_type } => Some(data_type),
            FeatureKind::Reference { .. } => None,
        }
    }

    pub(crate) fn set_opposite(&mut self, name: &str) -> bool {
        match &mut self.kind {
            FeatureKind::Reference { opposite, .. } => {
                *opposite = Some(name.to_string());
                true
            }
            FeatureKind::Attribute { .. } => false,
        }
    }

    pub(crate) fn set_container(&mut self, flag: bool) {
        if let FeatureKind::Reference { container, .. } = &mut self.kind {
            *container = flag;
        }
    }
}

/// A class of the metamodel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub supertypes: Vec<ClassId>,
    /// Features declared by this class itself, after all inherited ones
    #[serde(default)]
    pub features: Vec<FeatureDef>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_abstract: false,
            supertypes: Vec::new(),
            features: Vec::new(),
        }
    }
}
