//! Arena of linked nodes that an authored script compiles into.
//!
//! Forward `child` edges own the chain; `parent` is a back-reference kept
//! for structural queries and re-parenting. All links are ids into the
//! arena, so rewiring never fights the borrow checker.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use thiserror::Error;

use crate::schema::id::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node {0} cannot be its own parent")]
    SelfParent(NodeId),
    #[error("node {0} cannot be its own child")]
    SelfChild(NodeId),
    #[error("root node {0} cannot have a parent")]
    RootParent(NodeId),
    #[error("root node {0} cannot be removed")]
    RootRemoval(NodeId),
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("node {0} already exists")]
    Duplicate(NodeId),
    #[error("graph already has root {0}")]
    RootExists(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeType {
    /// Sentinel entry point; never has a parent.
    Root,
    /// Single child, single parent.
    Content,
    /// Ordered children.
    Tree,
}

#[derive(Debug, Clone)]
pub struct Node<C> {
    id: NodeId,
    node_type: NodeType,
    content: Option<C>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl<C> Node<C> {
    fn new(id: NodeId, node_type: NodeType, content: Option<C>) -> Self {
        Self {
            id,
            node_type,
            content,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn content(&self) -> Option<&C> {
        self.content.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The continuation. For tree nodes this is the first child.
    pub fn child(&self) -> Option<NodeId> {
        self.children.first().copied()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.node_type == NodeType::Root
    }
}

/// Head and tail of a linked run of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Chain {
    pub head: NodeId,
    pub tail: NodeId,
}

impl Chain {
    pub fn single(id: NodeId) -> Self {
        Self { head: id, tail: id }
    }

    /// `None` for an empty run.
    pub fn from_nodes(nodes: &[NodeId]) -> Option<Self> {
        Some(Self {
            head: *nodes.first()?,
            tail: *nodes.last()?,
        })
    }
}

/// Payloads that can describe themselves for serialization.
pub trait ToData {
    type Data: Serialize;

    fn to_data(&self) -> Self::Data;
}

/// Serialized view of one node: its id and its content's data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeData<D> {
    pub id: String,
    pub data: Option<D>,
}

#[derive(Debug, Clone)]
pub struct Graph<C> {
    nodes: FxHashMap<NodeId, Node<C>>,
    root: Option<NodeId>,
    /// Continuation each branch point had before its first splice.
    continuations: FxHashMap<NodeId, Option<NodeId>>,
}

impl<C> Default for Graph<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Graph<C> {
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            root: None,
            continuations: FxHashMap::default(),
        }
    }

    fn insert(&mut self, node: Node<C>) -> Result<NodeId, GraphError> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(GraphError::Duplicate(id));
        }
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// A graph holding only an empty root.
    pub fn with_root(root: NodeId) -> Self {
        let mut graph = Self::new();
        graph.nodes.insert(root, Node::new(root, NodeType::Root, None));
        graph.root = Some(root);
        graph
    }

    pub fn insert_root(&mut self, id: NodeId, content: Option<C>) -> Result<NodeId, GraphError> {
        if let Some(root) = self.root {
            return Err(GraphError::RootExists(root));
        }
        self.insert(Node::new(id, NodeType::Root, content))?;
        self.root = Some(id);
        Ok(id)
    }

    pub fn insert_content(&mut self, id: NodeId, content: C) -> Result<NodeId, GraphError> {
        self.insert(Node::new(id, NodeType::Content, Some(content)))
    }

    pub fn insert_tree(&mut self, id: NodeId, content: Option<C>) -> Result<NodeId, GraphError> {
        self.insert(Node::new(id, NodeType::Tree, content))
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<C>> {
        self.nodes.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node<C>, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node<C>, GraphError> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn content(&self, id: NodeId) -> Option<&C> {
        self.nodes.get(&id).and_then(|n| n.content.as_ref())
    }

    pub fn content_mut(&mut self, id: NodeId) -> Option<&mut C> {
        self.nodes.get_mut(&id).and_then(|n| n.content.as_mut())
    }

    pub fn child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(Node::child)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn has_child(&self, id: NodeId) -> bool {
        self.child(id).is_some()
    }

    /// Set the back-reference only. Forward edges are untouched.
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<(), GraphError> {
        let node = self.node(id)?;
        if let Some(parent) = parent {
            if parent == id {
                return Err(GraphError::SelfParent(id));
            }
            if node.is_root() {
                return Err(GraphError::RootParent(id));
            }
            self.node(parent)?;
        }
        self.node_mut(id)?.parent = parent;
        Ok(())
    }

    fn check_child(&self, id: NodeId, child: NodeId) -> Result<(), GraphError> {
        self.node(id)?;
        if child == id {
            return Err(GraphError::SelfChild(id));
        }
        if self.node(child)?.is_root() {
            return Err(GraphError::RootParent(child));
        }
        Ok(())
    }

    /// Unlink `child` from whatever parent it has other than `keep`.
    fn detach_from_parent(&mut self, child: NodeId, keep: NodeId) {
        let Some(previous) = self.parent(child) else {
            return;
        };
        if previous == keep {
            return;
        }
        if let Some(prev) = self.nodes.get_mut(&previous) {
            prev.children.retain(|c| *c != child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
        }
    }

    /// Replace the node's children with `child`, or clear them with `None`.
    ///
    /// An incoming child is moved away from its previous parent, and a
    /// replaced child loses its back-reference.
    pub fn set_child(&mut self, id: NodeId, child: Option<NodeId>) -> Result<(), GraphError> {
        match child {
            Some(child) => self.check_child(id, child)?,
            None => {
                self.node(id)?;
            }
        }
        if let Some(child) = child {
            self.detach_from_parent(child, id);
        }

        let old = std::mem::take(&mut self.node_mut(id)?.children);
        for old_child in old {
            if Some(old_child) == child {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(&old_child) {
                if node.parent == Some(id) {
                    node.parent = None;
                }
            }
        }

        if let Some(child) = child {
            self.node_mut(id)?.children.push(child);
            self.node_mut(child)?.parent = Some(id);
        }
        Ok(())
    }

    /// Append to a tree node's children; on other nodes this is `set_child`.
    pub fn add_child(&mut self, id: NodeId, child: NodeId) -> Result<(), GraphError> {
        if self.node(id)?.node_type != NodeType::Tree {
            return self.set_child(id, Some(child));
        }
        self.check_child(id, child)?;
        self.detach_from_parent(child, id);
        let node = self.node_mut(id)?;
        if !node.children.contains(&child) {
            node.children.push(child);
        }
        self.node_mut(child)?.parent = Some(id);
        Ok(())
    }

    /// Unlink `child` if it is one of the node's children. `None` clears
    /// every child.
    pub fn remove_child(&mut self, id: NodeId, child: Option<NodeId>) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        let removed: Vec<NodeId> = match child {
            Some(child) => {
                let before = node.children.len();
                node.children.retain(|c| *c != child);
                if node.children.len() == before {
                    return Ok(());
                }
                vec![child]
            }
            None => std::mem::take(&mut node.children),
        };
        for removed in removed {
            if let Some(node) = self.nodes.get_mut(&removed) {
                if node.parent == Some(id) {
                    node.parent = None;
                }
            }
        }
        Ok(())
    }

    /// Detach the node from its parent. It stays in the arena.
    pub fn remove(&mut self, id: NodeId) -> Result<(), GraphError> {
        let node = self.node(id)?;
        if node.is_root() {
            return Err(GraphError::RootRemoval(id));
        }
        if let Some(parent) = node.parent {
            self.remove_child(parent, Some(id))?;
        }
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Link `nodes` in order, each one the child of the previous.
    pub fn link(&mut self, nodes: &[NodeId]) -> Result<Option<Chain>, GraphError> {
        for pair in nodes.windows(2) {
            self.set_child(pair[0], Some(pair[1]))?;
        }
        Ok(Chain::from_nodes(nodes))
    }

    /// The continuation `at` had before it was first spliced, or its
    /// current child if it never was.
    pub fn continuation(&self, at: NodeId) -> Option<NodeId> {
        match self.continuations.get(&at) {
            Some(remembered) => *remembered,
            None => self.child(at),
        }
    }

    /// Graft `branch` between `at` and its continuation.
    ///
    /// The continuation is captured on the first splice at `at`; later
    /// splices at the same node reconnect to that same node. `None` points
    /// `at` straight back at the continuation.
    pub fn splice(&mut self, at: NodeId, branch: Option<Chain>) -> Result<(), GraphError> {
        self.node(at)?;
        let continuation = match self.continuations.get(&at) {
            Some(remembered) => *remembered,
            None => {
                let current = self.child(at);
                self.continuations.insert(at, current);
                current
            }
        };

        match branch {
            Some(chain) => {
                self.set_child(chain.tail, continuation)?;
                self.set_child(at, Some(chain.head))?;
            }
            None => self.set_child(at, continuation)?,
        }
        tracing::trace!(%at, ?branch, ?continuation, "spliced");
        Ok(())
    }

    /// Follow child edges starting at (and including) `from`.
    pub fn walk(&self, from: NodeId) -> Walk<'_, C> {
        Walk {
            graph: self,
            next: self.contains(from).then_some(from),
            seen: FxHashSet::default(),
        }
    }
}

impl<C: ToData> Graph<C> {
    pub fn node_data(&self, id: NodeId) -> Result<NodeData<C::Data>, GraphError> {
        let node = self.node(id)?;
        Ok(NodeData {
            id: id.to_string(),
            data: node.content.as_ref().map(ToData::to_data),
        })
    }
}

/// Iterator over a chain. Stops at the end or on revisiting a node.
pub struct Walk<'g, C> {
    graph: &'g Graph<C>,
    next: Option<NodeId>,
    seen: FxHashSet<NodeId>,
}

impl<C> Iterator for Walk<'_, C> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        if !self.seen.insert(current) {
            self.next = None;
            return None;
        }
        self.next = self.graph.child(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(n: u64) -> (Graph<&'static str>, Vec<NodeId>) {
        let mut graph = Graph::new();
        graph.insert_root(NodeId(0), None).unwrap();
        let ids: Vec<NodeId> = (1..=n).map(NodeId).collect();
        for id in &ids {
            graph.insert_content(*id, "x").unwrap();
        }
        (graph, ids)
    }

    #[test]
    fn link_sets_parents_in_order() {
        let (mut graph, ids) = graph_with(4);
        let chain = graph.link(&ids).unwrap().unwrap();
        assert_eq!(chain, Chain { head: ids[0], tail: ids[3] });
        assert_eq!(graph.parent(ids[0]), None);
        for i in 1..ids.len() {
            assert_eq!(graph.parent(ids[i]), Some(ids[i - 1]));
            assert_eq!(graph.child(ids[i - 1]), Some(ids[i]));
        }
        assert!(!graph.has_child(ids[3]));
    }

    #[test]
    fn self_links_are_rejected() {
        let (mut graph, ids) = graph_with(1);
        assert_eq!(
            graph.set_parent(ids[0], Some(ids[0])),
            Err(GraphError::SelfParent(ids[0]))
        );
        assert_eq!(
            graph.set_child(ids[0], Some(ids[0])),
            Err(GraphError::SelfChild(ids[0]))
        );
    }

    #[test]
    fn root_rules() {
        let (mut graph, ids) = graph_with(1);
        let root = graph.root().unwrap();
        assert_eq!(
            graph.set_parent(root, Some(ids[0])),
            Err(GraphError::RootParent(root))
        );
        assert_eq!(
            graph.set_child(ids[0], Some(root)),
            Err(GraphError::RootParent(root))
        );
        assert_eq!(graph.remove(root), Err(GraphError::RootRemoval(root)));
        assert_eq!(
            graph.insert_root(NodeId(99), None),
            Err(GraphError::RootExists(root))
        );
    }

    #[test]
    fn set_child_moves_instead_of_copying() {
        let (mut graph, ids) = graph_with(3);
        graph.set_child(ids[0], Some(ids[2])).unwrap();
        graph.set_child(ids[1], Some(ids[2])).unwrap();
        assert_eq!(graph.child(ids[0]), None);
        assert_eq!(graph.child(ids[1]), Some(ids[2]));
        assert_eq!(graph.parent(ids[2]), Some(ids[1]));
    }

    #[test]
    fn replaced_child_loses_parent() {
        let (mut graph, ids) = graph_with(3);
        graph.set_child(ids[0], Some(ids[1])).unwrap();
        graph.set_child(ids[0], Some(ids[2])).unwrap();
        assert_eq!(graph.parent(ids[1]), None);
        assert_eq!(graph.parent(ids[2]), Some(ids[0]));
    }

    #[test]
    fn remove_child_and_remove() {
        let (mut graph, ids) = graph_with(3);
        graph.link(&ids).unwrap();
        graph.remove_child(ids[0], Some(ids[2])).unwrap();
        assert_eq!(graph.child(ids[0]), Some(ids[1]));
        graph.remove(ids[2]).unwrap();
        assert!(!graph.has_child(ids[1]));
        assert_eq!(graph.parent(ids[2]), None);
        graph.remove_child(ids[0], None).unwrap();
        assert!(!graph.has_child(ids[0]));
        assert_eq!(graph.parent(ids[1]), None);
    }

    #[test]
    fn tree_nodes_keep_ordered_children() {
        let (mut graph, ids) = graph_with(3);
        graph.insert_tree(NodeId(10), None).unwrap();
        graph.add_child(NodeId(10), ids[0]).unwrap();
        graph.add_child(NodeId(10), ids[1]).unwrap();
        graph.add_child(NodeId(10), ids[0]).unwrap();
        assert_eq!(graph.node(NodeId(10)).unwrap().children(), &[ids[0], ids[1]]);
        assert_eq!(graph.parent(ids[1]), Some(NodeId(10)));
        graph.remove(ids[0]).unwrap();
        assert_eq!(graph.node(NodeId(10)).unwrap().children(), &[ids[1]]);
    }

    #[test]
    fn splice_rejoins_the_old_continuation() {
        // main: 1 -> 2 -> 3, branch: 4 -> 5
        let (mut graph, ids) = graph_with(5);
        graph.link(&ids[..3]).unwrap();
        let branch = graph.link(&ids[3..]).unwrap();

        graph.splice(ids[1], branch).unwrap();
        let walked: Vec<NodeId> = graph.walk(ids[0]).collect();
        assert_eq!(walked, vec![ids[0], ids[1], ids[3], ids[4], ids[2]]);
        assert_eq!(graph.continuation(ids[1]), Some(ids[2]));
    }

    #[test]
    fn repeated_splice_reuses_remembered_continuation() {
        let (mut graph, ids) = graph_with(5);
        graph.link(&ids[..3]).unwrap();
        graph.splice(ids[1], Some(Chain::single(ids[3]))).unwrap();
        graph.splice(ids[1], Some(Chain::single(ids[4]))).unwrap();
        let walked: Vec<NodeId> = graph.walk(ids[1]).collect();
        assert_eq!(walked, vec![ids[1], ids[4], ids[2]]);
        assert!(!graph.has_child(ids[3]));

        graph.splice(ids[1], None).unwrap();
        assert_eq!(graph.child(ids[1]), Some(ids[2]));
    }

    #[test]
    fn splice_at_chain_end() {
        let (mut graph, ids) = graph_with(2);
        graph.splice(ids[0], Some(Chain::single(ids[1]))).unwrap();
        let walked: Vec<NodeId> = graph.walk(ids[0]).collect();
        assert_eq!(walked, vec![ids[0], ids[1]]);
    }

    #[test]
    fn walk_stops_on_cycle() {
        let (mut graph, ids) = graph_with(2);
        graph.set_child(ids[0], Some(ids[1])).unwrap();
        graph.set_child(ids[1], Some(ids[0])).unwrap();
        assert_eq!(graph.walk(ids[0]).count(), 2);
        assert_eq!(graph.walk(NodeId(77)).count(), 0);
    }

    struct Line(&'static str);

    impl ToData for Line {
        type Data = String;

        fn to_data(&self) -> String {
            self.0.to_uppercase()
        }
    }

    #[test]
    fn node_data_uses_string_id() {
        let mut graph = Graph::new();
        graph.insert_content(NodeId(5), Line("hi")).unwrap();
        let data = graph.node_data(NodeId(5)).unwrap();
        assert_eq!(data, NodeData { id: "5".to_string(), data: Some("HI".to_string()) });
    }
}
