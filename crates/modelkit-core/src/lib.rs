//! modelkit core - reflective object-graph kernel
//!
//! This crate manages live, typed object graphs described by a small
//! self-describing metamodel, including:
//! - Ordered lists with uniqueness and batched change reporting
//! - Change notifications, merging notification chains and observers
//! - Opposite-reference and single-container maintenance
//! - Lazy proxy resolution through a pluggable resolver
//! - Store-backed objects with an optional local cache
//! - Containment traversal, typed traversal over class transition tables
//! - Deep copy with reference rewiring

pub mod copy;
pub mod errors;
pub mod graph;
pub mod list;
pub mod logging_facility;
pub mod metamodel;
pub mod notify;
pub mod store;
pub mod traversal;
pub mod value;

// Re-export commonly used types
pub use copy::{CopyOptions, Copier};
pub use errors::{ExError, ExErrorKind, ModelError, Result};
pub use graph::{Backing, Factory, Graph, ObjectOptions, ProxyResolver, UriMapResolver};
pub use list::{ElementList, FeatureList, ListChange, ListPrimitives, OrderedList};
pub use metamodel::{ClassDef, FeatureDef, FeatureKind, Metamodel, MetamodelBuilder};
pub use modelkit_core_types::{schema, ClassId, FeatureId, ObjectId};
pub use notify::{EventKind, EventLog, EventValue, Notification, NotificationChain, Observer, ObserverHandle};
pub use store::{MemoryStore, Store};
pub use value::{DataType, Value};
