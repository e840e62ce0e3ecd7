//! Class transition tables
//!
//! For a `(start, end)` class pair the table records, per class, the
//! containment features (and the concrete target classes behind them) that
//! can lead from an instance of that class down to an instance of `end`.
//! Typed traversal follows only these edges.

use std::collections::{HashMap, HashSet};

use modelkit_core_types::{ClassId, FeatureId};

use crate::errors::Result;
use crate::metamodel::Metamodel;

/// One containment edge toward the end class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transition {
    pub feature: FeatureId,
    pub target: ClassId,
}

/// Immutable pruning table for typed traversal from `start` to `end`
#[derive(Debug, Clone)]
pub struct ClassTransitionTable {
    start: ClassId,
    end: ClassId,
    edges: HashMap<ClassId, Vec<Transition>>,
    reaching: HashSet<ClassId>,
    terminals: HashSet<ClassId>,
}

impl ClassTransitionTable {
    /// Compute the table by a depth-first walk over containment features
    ///
    /// Every subtype of a containment target is considered a possible child
    /// class. An edge back into a class on the current walk path is held
    /// back and only added once its target is known to reach `end`; held
    /// edges are folded in repeatedly until nothing changes.
    ///
    /// # Errors
    ///
    /// * `ClassNotFound` - If `start` or `end` is not in the metamodel
    pub fn build(metamodel: &Metamodel, start: ClassId, end: ClassId) -> Result<Self> {
        metamodel.class(start)?;
        metamodel.class(end)?;

        let mut walk = Walk {
            metamodel,
            end,
            visited: HashSet::new(),
            on_path: HashSet::new(),
            edges: HashMap::new(),
            reaching: HashSet::new(),
            terminals: HashSet::new(),
            held: Vec::new(),
        };
        walk.visit(start)?;
        walk.fold_held_edges();

        let mut edges = walk.edges;
        for transitions in edges.values_mut() {
            transitions.sort_by_key(|t| (t.feature, t.target));
            transitions.dedup();
        }
        Ok(Self {
            start,
            end,
            edges,
            reaching: walk.reaching,
            terminals: walk.terminals,
        })
    }

    pub fn start(&self) -> ClassId {
        self.start
    }

    pub fn end(&self) -> ClassId {
        self.end
    }

    /// Edges out of `class`, ordered by feature id
    pub fn transitions(&self, class: ClassId) -> &[Transition] {
        self.edges.get(&class).map_or(&[], Vec::as_slice)
    }

    /// Distinct features of `class` worth descending into, in id order
    pub fn features_for(&self, class: ClassId) -> Vec<FeatureId> {
        let mut features: Vec<FeatureId> =
            self.transitions(class).iter().map(|t| t.feature).collect();
        features.dedup();
        features
    }

    /// Check if an instance of `class` is, or can contain, an `end` instance
    pub fn reaches(&self, class: ClassId) -> bool {
        self.reaching.contains(&class)
    }

    /// Check if instances of `class` are yielded by typed traversal
    pub fn is_terminal(&self, class: ClassId) -> bool {
        self.terminals.contains(&class)
    }

    /// Terminal classes met during the walk, in id order
    pub fn terminals(&self) -> Vec<ClassId> {
        let mut terminals: Vec<ClassId> = self.terminals.iter().copied().collect();
        terminals.sort();
        terminals
    }

    pub fn transition_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}

struct Walk<'m> {
    metamodel: &'m Metamodel,
    end: ClassId,
    visited: HashSet<ClassId>,
    on_path: HashSet<ClassId>,
    edges: HashMap<ClassId, Vec<Transition>>,
    reaching: HashSet<ClassId>,
    terminals: HashSet<ClassId>,
    /// Edges whose target was on the path or not (yet) known to reach `end`
    held: Vec<(ClassId, Transition)>,
}

impl Walk<'_> {
    fn visit(&mut self, class: ClassId) -> Result<()> {
        self.visited.insert(class);
        self.on_path.insert(class);
        if self.metamodel.conforms(class, self.end) {
            self.terminals.insert(class);
            self.reaching.insert(class);
        }

        let features = self.metamodel.features(class)?;
        for (index, def) in features.iter().enumerate() {
            if !def.is_containment() || def.derived {
                continue;
            }
            let Some(target) = def.target() else {
                continue;
            };
            let feature = FeatureId::new(index);
            for &candidate in self.metamodel.subtypes(target).iter() {
                let transition = Transition {
                    feature,
                    target: candidate,
                };
                if self.on_path.contains(&candidate) {
                    self.held.push((class, transition));
                    continue;
                }
                if !self.visited.contains(&candidate) {
                    self.visit(candidate)?;
                }
                if self.reaching.contains(&candidate) {
                    self.add_edge(class, transition);
                } else {
                    self.held.push((class, transition));
                }
            }
        }

        self.on_path.remove(&class);
        Ok(())
    }

    fn add_edge(&mut self, class: ClassId, transition: Transition) {
        self.edges.entry(class).or_default().push(transition);
        self.reaching.insert(class);
    }

    fn fold_held_edges(&mut self) {
        loop {
            let held = std::mem::take(&mut self.held);
            let (ready, pending): (Vec<_>, Vec<_>) = held
                .into_iter()
                .partition(|(_, t)| self.reaching.contains(&t.target));
            self.held = pending;
            if ready.is_empty() {
                break;
            }
            for (class, transition) in ready {
                self.add_edge(class, transition);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::{FeatureDef, MetamodelBuilder};
    use crate::value::DataType;

    /// Folder contains Folder* and Item*; Item contains Note; Tag is unrelated
    fn folders() -> (Metamodel, ClassId, ClassId, ClassId, ClassId) {
        let mut b = MetamodelBuilder::new("folders");
        let folder = b.class("Folder");
        let item = b.class("Item");
        let note = b.class("Note");
        let tag = b.class("Tag");
        b.feature(folder, FeatureDef::containment("folders", folder).many())
            .feature(folder, FeatureDef::containment("items", item).many())
            .feature(folder, FeatureDef::containment("tags", tag).many())
            .feature(item, FeatureDef::containment("note", note))
            .feature(note, FeatureDef::attribute("text", DataType::Str));
        (b.build().unwrap(), folder, item, note, tag)
    }

    #[test]
    fn test_self_containment_is_folded() {
        let (mm, folder, item, note, tag) = folders();
        let table = ClassTransitionTable::build(&mm, folder, note).unwrap();

        assert!(table.reaches(folder));
        assert!(table.reaches(item));
        assert!(!table.reaches(tag));
        assert_eq!(table.terminals(), vec![note]);
        assert_eq!(
            table.features_for(folder),
            vec![FeatureId::new(0), FeatureId::new(1)]
        );
        assert_eq!(table.transitions(item).len(), 1);
        assert_eq!(table.transition_count(), 3);
    }

    #[test]
    fn test_unreachable_end_yields_empty_table() {
        let (mm, folder, _, _, tag) = folders();
        let table = ClassTransitionTable::build(&mm, tag, folder).unwrap();
        assert_eq!(table.transition_count(), 0);
        assert!(!table.reaches(tag));
    }

    #[test]
    fn test_branch_without_end_is_pruned() {
        let (mm, folder, _, _, tag) = folders();
        let table = ClassTransitionTable::build(&mm, folder, tag).unwrap();
        // `items` never leads to a Tag
        assert_eq!(
            table.features_for(folder),
            vec![FeatureId::new(0), FeatureId::new(2)]
        );
        assert!(table.is_terminal(tag));
    }

    #[test]
    fn test_mutual_containment_needs_several_folds() {
        // Shelf holds Boxes and Dust, Box holds Shelves and Coins
        let mut b = MetamodelBuilder::new("storage");
        let shelf = b.class("Shelf");
        let boxed = b.class("Box");
        let coin = b.class("Coin");
        let dust = b.class("Dust");
        b.feature(shelf, FeatureDef::containment("boxes", boxed).many())
            .feature(shelf, FeatureDef::containment("dust", dust).many())
            .feature(boxed, FeatureDef::containment("shelves", shelf).many())
            .feature(boxed, FeatureDef::containment("coins", coin).many());
        let mm = b.build().unwrap();

        // Starting at Box, Shelf only reaches Coin back through Box, so the
        // Shelf edge and then the Box -> Shelf edge land in separate rounds
        let table = ClassTransitionTable::build(&mm, boxed, coin).unwrap();

        assert!(table.reaches(boxed));
        assert!(table.reaches(shelf));
        assert!(!table.reaches(dust));
        assert_eq!(
            table.features_for(boxed),
            vec![FeatureId::new(0), FeatureId::new(1)]
        );
        assert_eq!(table.features_for(shelf), vec![FeatureId::new(0)]);
        assert_eq!(table.terminals(), vec![coin]);
        assert_eq!(table.transition_count(), 3);
    }
}
