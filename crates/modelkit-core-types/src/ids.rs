//! Stable identity types for graph objects and metamodel elements
//!
//! All three are small-integer indices: an `ObjectId` addresses a record in a
//! graph arena, a `ClassId` a class in a metamodel, and a `FeatureId` a slot
//! within a class's full feature list.

use serde::{Deserialize, Serialize};

macro_rules! index_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create from an arena or table index
            pub fn new(index: usize) -> Self {
                Self(index as u32)
            }

            /// Get the underlying index
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

index_id!(
    /// Identity of an object record inside a graph arena
    ObjectId,
    "obj#"
);

index_id!(
    /// Identity of a class inside a metamodel
    ClassId,
    "class#"
);

index_id!(
    /// Identity of a structural feature, local to its class's feature list
    ///
    /// Inherited features keep the id they have in the supertype.
    FeatureId,
    "feature#"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        assert_eq!(ObjectId::new(7).index(), 7);
        assert_eq!(ClassId::new(0).index(), 0);
        assert_eq!(FeatureId::new(3).index(), 3);
    }

    #[test]
    fn test_display_prefixes() {
        assert_eq!(ObjectId::new(2).to_string(), "obj#2");
        assert_eq!(ClassId::new(1).to_string(), "class#1");
        assert_eq!(FeatureId::new(4).to_string(), "feature#4");
    }

    #[test]
    fn test_serializes_transparently() {
        let json = serde_json::to_string(&ObjectId::new(5)).unwrap();
        assert_eq!(json, "5");
        let back: FeatureId = serde_json::from_str("9").unwrap();
        assert_eq!(back, FeatureId::new(9));
    }
}
