use std::sync::Arc;

use modelkit_core_types::{FeatureId, ObjectId};

use crate::graph::Graph;
use crate::value::Value;

use super::ClassTransitionTable;

/// One object whose children are being walked
struct Frame {
    object: ObjectId,
    transitions: Vec<FeatureId>,
    next_transition: usize,
    children: Vec<ObjectId>,
    next_child: usize,
}

impl Frame {
    fn new(object: ObjectId, transitions: Vec<FeatureId>) -> Self {
        Self {
            object,
            transitions,
            next_transition: 0,
            children: Vec::new(),
            next_child: 0,
        }
    }
}

/// Lazy pre-order iterator over the descendants of a root that conform to
/// the end class of its transition table
///
/// Only features listed in the table are followed, so subtrees that cannot
/// contain a match are never loaded.
pub struct TypedContents<'g> {
    graph: &'g Graph,
    table: Arc<ClassTransitionTable>,
    stack: Vec<Frame>,
}

impl<'g> TypedContents<'g> {
    pub(crate) fn new(graph: &'g Graph, root: ObjectId, table: Arc<ClassTransitionTable>) -> Self {
        let transitions = table.features_for(table.start());
        Self {
            graph,
            table,
            stack: vec![Frame::new(root, transitions)],
        }
    }

    pub fn table(&self) -> &ClassTransitionTable {
        &self.table
    }
}

impl Iterator for TypedContents<'_> {
    type Item = ObjectId;

    fn next(&mut self) -> Option<ObjectId> {
        loop {
            let frame = self.stack.last_mut()?;

            if frame.next_child < frame.children.len() {
                let child = frame.children[frame.next_child];
                frame.next_child += 1;
                let Ok(class) = self.graph.class_of(child) else {
                    continue;
                };
                if !self.table.reaches(class) {
                    continue;
                }
                let transitions = self.table.features_for(class);
                if !transitions.is_empty() {
                    self.stack.push(Frame::new(child, transitions));
                }
                if self.table.is_terminal(class) {
                    return Some(child);
                }
                continue;
            }

            if frame.next_transition < frame.transitions.len() {
                let feature = frame.transitions[frame.next_transition];
                frame.next_transition += 1;
                frame.children = self
                    .graph
                    .values(frame.object, feature)
                    .unwrap_or_default()
                    .iter()
                    .filter_map(Value::as_object)
                    .collect();
                frame.next_child = 0;
                continue;
            }

            self.stack.pop();
        }
    }
}
