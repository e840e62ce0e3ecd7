use modelkit_core_types::ObjectId;

use crate::graph::Graph;

/// Lazy depth-first pre-order iterator over the descendants of a root
///
/// The root itself is not yielded. Children of a yielded object are only
/// fetched when iteration continues past it, so [`AllContents::prune`] can
/// skip a subtree without visiting it.
pub struct AllContents<'g> {
    graph: &'g Graph,
    stack: Vec<std::vec::IntoIter<ObjectId>>,
    expand: Option<ObjectId>,
}

impl<'g> AllContents<'g> {
    pub(crate) fn new(graph: &'g Graph, root: ObjectId) -> Self {
        Self {
            graph,
            stack: Vec::new(),
            expand: Some(root),
        }
    }

    /// Do not descend into the object returned last
    pub fn prune(&mut self) {
        self.expand = None;
    }
}

impl Iterator for AllContents<'_> {
    type Item = ObjectId;

    fn next(&mut self) -> Option<ObjectId> {
        if let Some(parent) = self.expand.take() {
            let children = self.graph.contents(parent).unwrap_or_default();
            self.stack.push(children.into_iter());
        }
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(child) => {
                    self.expand = Some(child);
                    return Some(child);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
