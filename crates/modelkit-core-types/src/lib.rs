//! Core types shared across modelkit facilities
//!
//! This crate provides foundational types used by the kernel, its error
//! facility and its logging facility:
//!
//! - **Identity types**: ObjectId, ClassId, FeatureId
//! - **Schema constants**: Canonical field keys and event names

pub mod ids;
pub mod schema;

pub use ids::{ClassId, FeatureId, ObjectId};
