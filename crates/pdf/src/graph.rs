//! Object graph and numbering.
//!
//! Objects are added under provisional handles and linked by ownership
//! edges or weak back-links (a page's `/Parent`). [`ObjectGraph::number`]
//! numbers the objects reachable from the roots in topological order, so
//! an object always comes after every object that owns it. Writing the
//! numbered objects is left to the caller.

use pdf_writer::Ref;
use slide_core::CodecError;
use std::collections::VecDeque;

pub(crate) type Result<T> = std::result::Result<T, CodecError>;

/// Handle of an object in an [`ObjectGraph`].
///
/// Handles are provisional; final object numbers are assigned by
/// [`ObjectGraph::number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// 1-based provisional number, used in diagnostics.
    pub fn number(self) -> u32 {
        self.0 as u32 + 1
    }
}

/// References held by a graph node.
pub trait Linked {
    /// Objects this one owns, such as a page's content stream.
    fn owned(&self) -> Vec<NodeId>;

    /// Back-links to owners. They must resolve but do not order numbering.
    fn back_links(&self) -> Vec<NodeId> {
        Vec::new()
    }
}

#[derive(Debug)]
pub struct ObjectGraph<N> {
    nodes: Vec<Option<N>>,
}

impl<N> Default for ObjectGraph<N> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<N: Linked> ObjectGraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a handle to be filled in later with [`ObjectGraph::set`].
    pub fn reserve(&mut self) -> NodeId {
        self.nodes.push(None);
        NodeId(self.nodes.len() - 1)
    }

    pub fn set(&mut self, id: NodeId, node: N) {
        if let Some(slot) = self.nodes.get_mut(id.0) {
            *slot = Some(node);
        }
    }

    pub fn add(&mut self, node: N) -> NodeId {
        let id = self.reserve();
        self.set(id, node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&N> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn owned(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id).map(Linked::owned).unwrap_or_default()
    }

    /// Assign final object numbers.
    ///
    /// Numbers follow Kahn's algorithm over ownership edges starting from
    /// `roots`. Unreachable objects get no number.
    pub fn number(&self, roots: &[NodeId]) -> Result<Numbering> {
        // Reachability over ownership edges, checking every target exists.
        let mut reachable = vec![false; self.nodes.len()];
        let mut stack: Vec<NodeId> = Vec::new();
        for &root in roots {
            if self.get(root).is_none() {
                return Err(CodecError::DanglingReference {
                    from: 0,
                    to: root.number(),
                });
            }
            stack.push(root);
        }
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut reachable[id.0], true) {
                continue;
            }
            for target in self.owned(id) {
                if self.get(target).is_none() {
                    return Err(CodecError::DanglingReference {
                        from: id.number(),
                        to: target.number(),
                    });
                }
                stack.push(target);
            }
        }

        let mut in_degree = vec![0usize; self.nodes.len()];
        for (index, _) in reachable.iter().enumerate().filter(|(_, r)| **r) {
            for target in self.owned(NodeId(index)) {
                in_degree[target.0] += 1;
            }
        }

        let mut refs: Vec<Option<Ref>> = vec![None; self.nodes.len()];
        let mut order = Vec::new();
        let mut queue: VecDeque<NodeId> = roots
            .iter()
            .copied()
            .filter(|root| in_degree[root.0] == 0)
            .collect();
        while let Some(id) = queue.pop_front() {
            if refs[id.0].is_some() {
                continue;
            }
            order.push(id);
            refs[id.0] = Some(Ref::new(order.len() as i32));
            for target in self.owned(id) {
                in_degree[target.0] -= 1;
                if in_degree[target.0] == 0 {
                    queue.push_back(target);
                }
            }
        }

        if let Some(index) = (0..self.nodes.len()).find(|&i| reachable[i] && refs[i].is_none()) {
            return Err(CodecError::ObjectGraphCycle(NodeId(index).number()));
        }

        // Back-links must land on numbered objects.
        for &id in &order {
            for target in self.get(id).map(Linked::back_links).unwrap_or_default() {
                if refs.get(target.0).copied().flatten().is_none() {
                    return Err(CodecError::DanglingReference {
                        from: id.number(),
                        to: target.number(),
                    });
                }
            }
        }

        let dropped = reachable.iter().filter(|r| !**r).count();
        if dropped > 0 {
            log::debug!("Dropped {} unreachable PDF objects", dropped);
        }
        Ok(Numbering { refs, order })
    }
}

/// Final object numbers of a graph.
#[derive(Debug, Clone)]
pub struct Numbering {
    refs: Vec<Option<Ref>>,
    order: Vec<NodeId>,
}

impl Numbering {
    /// Numbered handles, in number order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn get(&self, id: NodeId) -> Option<Ref> {
        self.refs.get(id.0).copied().flatten()
    }

    /// Reference to `to`, as written by object `from`.
    pub fn resolve(&self, from: NodeId, to: NodeId) -> Result<Ref> {
        self.get(to).ok_or(CodecError::DanglingReference {
            from: from.number(),
            to: to.number(),
        })
    }

    /// Number of numbered objects.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Owns `kids`, with an optional back-link.
    struct Node {
        kids: Vec<NodeId>,
        parent: Option<NodeId>,
    }

    impl Linked for Node {
        fn owned(&self) -> Vec<NodeId> {
            self.kids.clone()
        }

        fn back_links(&self) -> Vec<NodeId> {
            self.parent.into_iter().collect()
        }
    }

    fn node(kids: Vec<NodeId>) -> Node {
        Node { kids, parent: None }
    }

    fn number(graph: &ObjectGraph<Node>, roots: &[NodeId], id: NodeId) -> i32 {
        graph
            .number(roots)
            .unwrap()
            .get(id)
            .map(Ref::get)
            .unwrap_or(0)
    }

    #[test]
    fn test_numbers_follow_ownership() {
        let mut graph = ObjectGraph::new();
        let shared = graph.add(node(vec![]));
        let b = graph.add(node(vec![shared]));
        let a = graph.add(node(vec![shared]));
        let root = graph.reserve();
        graph.set(root, node(vec![a, b]));
        let orphan = graph.add(node(vec![]));

        assert_eq!(number(&graph, &[root], root), 1);
        assert_eq!(number(&graph, &[root], a), 2);
        assert_eq!(number(&graph, &[root], b), 3);
        // Numbered only after both owners.
        assert_eq!(number(&graph, &[root], shared), 4);
        assert_eq!(number(&graph, &[root], orphan), 0);

        let numbering = graph.number(&[root]).unwrap();
        assert_eq!(numbering.order(), &[root, a, b, shared]);
        assert_eq!(numbering.len(), 4);
    }

    #[test]
    fn test_back_links_do_not_order() {
        let mut graph = ObjectGraph::new();
        let parent = graph.reserve();
        let child = graph.add(Node {
            kids: vec![],
            parent: Some(parent),
        });
        graph.set(parent, node(vec![child]));
        assert_eq!(number(&graph, &[parent], parent), 1);
        assert_eq!(number(&graph, &[parent], child), 2);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut graph = ObjectGraph::new();
        let root = graph.reserve();
        let a = graph.reserve();
        let b = graph.add(node(vec![a]));
        graph.set(a, node(vec![b]));
        graph.set(root, node(vec![a]));

        let err = graph.number(&[root]).unwrap_err();
        assert!(matches!(err, CodecError::ObjectGraphCycle(n) if n == a.number()));
    }

    #[test]
    fn test_missing_target_is_dangling() {
        let mut graph = ObjectGraph::new();
        let missing = graph.reserve();
        let root = graph.add(node(vec![missing]));
        let err = graph.number(&[root]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::DanglingReference { from, to } if from == root.number() && to == missing.number()
        ));
    }

    #[test]
    fn test_back_link_to_unreachable_is_dangling() {
        let mut graph = ObjectGraph::new();
        let stray = graph.add(node(vec![]));
        let child = graph.add(Node {
            kids: vec![],
            parent: Some(stray),
        });
        let root = graph.add(node(vec![child]));
        let numbering = graph.number(&[root]);
        assert!(matches!(
            numbering,
            Err(CodecError::DanglingReference { from, to }) if from == child.number() && to == stray.number()
        ));
    }
}
