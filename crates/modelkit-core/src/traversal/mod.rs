//! Containment-tree traversal
//!
//! [`AllContents`] walks every descendant; [`TypedContents`] walks only the
//! parts of the tree that can hold instances of a target class, guided by a
//! [`ClassTransitionTable`] computed from the metamodel.

pub mod contents;
pub mod transitions;
pub mod typed;

pub use contents::AllContents;
pub use transitions::{ClassTransitionTable, Transition};
pub use typed::TypedContents;
