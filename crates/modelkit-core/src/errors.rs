use modelkit_core_types::{ClassId, ObjectId};
use thiserror::Error;

/// Result type alias using ModelError
pub type Result<T> = std::result::Result<T, ModelError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// raised by the kernel. Each kind maps to a stable error code that can be
/// used for programmatic error handling, testing, and external API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Collection semantics
    IndexOutOfRange,
    DuplicateElement,
    ElementNotFound,
    UnsupportedOperation,

    // References
    ResolutionFailure,
    CycleDetected,

    // Lookup
    NotFound,

    // Structural/Validation
    InvalidInput,
    ConstraintViolation,
    InvalidMetamodel,

    // Integration/IO
    Persistence,
    Serialization,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::IndexOutOfRange => "ERR_INDEX_OUT_OF_RANGE",
            ExErrorKind::DuplicateElement => "ERR_DUPLICATE_ELEMENT",
            ExErrorKind::ElementNotFound => "ERR_ELEMENT_NOT_FOUND",
            ExErrorKind::UnsupportedOperation => "ERR_UNSUPPORTED_OPERATION",
            ExErrorKind::ResolutionFailure => "ERR_RESOLUTION_FAILURE",
            ExErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::InvalidMetamodel => "ERR_INVALID_METAMODEL",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
        }
    }
}

/// Canonical structured error type
///
/// This error type provides a structured representation of errors with
/// classification fields for programmatic handling and rich context for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    feature: Option<String>,
    index: Option<usize>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            feature: None,
            index: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add feature name context
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    /// Add list index context
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the feature context, if any
    pub fn feature(&self) -> Option<&str> {
        self.feature.as_deref()
    }

    /// Get the index context, if any
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(feature) = &self.feature {
            write!(f, " (feature: {})", feature)?;
        }
        if let Some(index) = self.index {
            write!(f, " (index: {})", index)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for kernel operations
///
/// Every variant is a synchronous, programmer-error-class condition raised at
/// the violating call. Nothing is retried internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    // ===== Collection Errors =====
    /// Index outside the valid range of a list operation
    #[error("Index {index} out of range for size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    /// Set would store an element a unique list already holds elsewhere
    #[error("Element already present at index {index}")]
    DuplicateElement { index: usize },

    /// Element addressed by value is not in the list
    #[error("Element not found: {element}")]
    ElementNotFound { element: String },

    /// Operation not supported by the target
    #[error("Unsupported operation '{op}': {reason}")]
    UnsupportedOperation { op: String, reason: String },

    // ===== Reference Errors =====
    /// Proxy resolution was declined
    #[error("Proxy could not be resolved: {uri}")]
    ResolutionFailure { uri: String },

    /// Attaching would make an object contain one of its own ancestors
    #[error("Recursive containment: {object_id} cannot be contained by {container_id}")]
    RecursiveContainment {
        object_id: ObjectId,
        container_id: ObjectId,
    },

    // ===== Lookup Errors =====
    /// Object id does not address a record in this graph
    #[error("Object not found: {object_id}")]
    ObjectNotFound { object_id: ObjectId },

    /// Class id does not address a class in this metamodel
    #[error("Class not found: {class_id}")]
    ClassNotFound { class_id: ClassId },

    /// Feature name or id is not part of the class
    #[error("Feature {feature} not found in class {class_name}")]
    FeatureNotFound { class_name: String, feature: String },

    // ===== Validation Errors =====
    /// Abstract classes have no instances
    #[error("Class {class_name} is abstract and cannot be instantiated")]
    AbstractClass { class_name: String },

    /// A list operation was addressed at a single-valued feature
    #[error("Feature {feature} of class {class_name} is single-valued")]
    NotMany { class_name: String, feature: String },

    /// A single-value operation was addressed at a multi-valued feature
    #[error("Feature {feature} of class {class_name} is multi-valued")]
    NotSingle { class_name: String, feature: String },

    /// Reflective write to a read-only feature
    #[error("Feature {feature} of class {class_name} is not changeable")]
    NotChangeable { class_name: String, feature: String },

    /// Value does not conform to the feature's type
    #[error("Invalid value for feature {feature}: {reason}")]
    InvalidValue { feature: String, reason: String },

    /// Metamodel definition is inconsistent
    #[error("Invalid metamodel: {reason}")]
    InvalidMetamodel { reason: String },

    // ===== Integration Errors =====
    /// Store-backed object requested on a graph without a store
    #[error("No store configured for store-backed objects")]
    StoreUnavailable,

    /// Metamodel (de)serialization failed
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

/// Conversion from ModelError to ExError
impl From<ModelError> for ExError {
    fn from(err: ModelError) -> Self {
        let message = err.to_string();
        match err {
            ModelError::IndexOutOfRange { index, .. } => {
                ExError::new(ExErrorKind::IndexOutOfRange)
                    .with_index(index)
                    .with_message(message)
            }

            ModelError::DuplicateElement { index } => ExError::new(ExErrorKind::DuplicateElement)
                .with_index(index)
                .with_message(message),

            ModelError::ElementNotFound { .. } => {
                ExError::new(ExErrorKind::ElementNotFound).with_message(message)
            }

            ModelError::UnsupportedOperation { op, .. } => {
                ExError::new(ExErrorKind::UnsupportedOperation)
                    .with_op(op)
                    .with_message(message)
            }

            ModelError::ResolutionFailure { uri } => ExError::new(ExErrorKind::ResolutionFailure)
                .with_entity_id(uri)
                .with_message(message),

            ModelError::RecursiveContainment { object_id, .. } => {
                ExError::new(ExErrorKind::CycleDetected)
                    .with_entity_id(object_id.to_string())
                    .with_message(message)
            }

            ModelError::ObjectNotFound { object_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(object_id.to_string())
                .with_message(message),

            ModelError::ClassNotFound { class_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(class_id.to_string())
                .with_message(message),

            ModelError::FeatureNotFound { class_name, feature } => {
                ExError::new(ExErrorKind::NotFound)
                    .with_entity_id(class_name)
                    .with_feature(feature)
                    .with_message(message)
            }

            ModelError::AbstractClass { class_name } => ExError::new(ExErrorKind::InvalidInput)
                .with_entity_id(class_name)
                .with_message(message),

            ModelError::NotMany {
                class_name,
                feature,
            }
            | ModelError::NotSingle {
                class_name,
                feature,
            } => ExError::new(ExErrorKind::InvalidInput)
                .with_entity_id(class_name)
                .with_feature(feature)
                .with_message(message),

            ModelError::NotChangeable {
                class_name,
                feature,
            } => ExError::new(ExErrorKind::ConstraintViolation)
                .with_entity_id(class_name)
                .with_feature(feature)
                .with_message(message),

            ModelError::InvalidValue { feature, .. } => ExError::new(ExErrorKind::InvalidInput)
                .with_feature(feature)
                .with_message(message),

            ModelError::InvalidMetamodel { .. } => {
                ExError::new(ExErrorKind::InvalidMetamodel).with_message(message)
            }

            ModelError::StoreUnavailable => {
                ExError::new(ExErrorKind::Persistence).with_message(message)
            }

            ModelError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to ModelError
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_error_kind_codes() {
        let cases = [
            (ExErrorKind::IndexOutOfRange, "ERR_INDEX_OUT_OF_RANGE"),
            (ExErrorKind::DuplicateElement, "ERR_DUPLICATE_ELEMENT"),
            (ExErrorKind::ElementNotFound, "ERR_ELEMENT_NOT_FOUND"),
            (ExErrorKind::UnsupportedOperation, "ERR_UNSUPPORTED_OPERATION"),
            (ExErrorKind::ResolutionFailure, "ERR_RESOLUTION_FAILURE"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_index_out_of_range_carries_bounds() {
        let err = ModelError::IndexOutOfRange { index: 7, size: 3 };
        assert_eq!(err.to_string(), "Index 7 out of range for size 3");

        let ex_err: ExError = err.into();
        assert_eq!(ex_err.kind(), ExErrorKind::IndexOutOfRange);
        assert_eq!(ex_err.index(), Some(7));
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::NotFound)
            .with_op("get")
            .with_feature("books")
            .with_message("Feature missing");
        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_NOT_FOUND]"));
        assert!(rendered.contains("'get'"));
        assert!(rendered.contains("(feature: books)"));
    }
}
