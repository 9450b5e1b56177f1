use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a node in the action graph.
///
/// Displays as its decimal string, which is the form handed to the
/// presentation layer and written into node data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Identity of a scripted element (character, scene, menu, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Lets a single action handle sit next to action lists in builder input.
impl IntoIterator for NodeId {
    type Item = NodeId;
    type IntoIter = std::iter::Once<NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        std::iter::once(self)
    }
}

/// Monotonic id source for one game session.
///
/// Nodes and elements draw from the same counter, so every id minted in a
/// session is unique across both kinds.
#[derive(Debug, Clone, Default)]
pub struct IdManager {
    next: u64,
}

impl IdManager {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn get_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn get_string_id(&mut self) -> String {
        self.get_id().to_string()
    }

    pub fn node_id(&mut self) -> NodeId {
        NodeId(self.get_id())
    }

    pub fn element_id(&mut self) -> ElementId {
        ElementId(self.get_id())
    }

    /// The id the next call will hand out.
    pub fn peek(&self) -> u64 {
        self.next
    }

    pub fn prefix(prefix: &str, value: &str, separator: &str) -> String {
        format!("{}{}{}", prefix, separator, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let mut ids = IdManager::new();
        assert_eq!(ids.get_id(), 0);
        assert_eq!(ids.node_id(), NodeId(1));
        assert_eq!(ids.element_id(), ElementId(2));
        assert_eq!(ids.get_string_id(), "3");
        assert_eq!(ids.peek(), 4);
    }

    #[test]
    fn sessions_do_not_share_counters() {
        let mut a = IdManager::new();
        let mut b = IdManager::new();
        a.get_id();
        a.get_id();
        assert_eq!(b.get_id(), 0);
    }

    #[test]
    fn prefix_joins_with_separator() {
        assert_eq!(IdManager::prefix("image", "7", ":"), "image:7");
    }

    #[test]
    fn node_id_displays_as_string() {
        assert_eq!(NodeId(42).to_string(), "42");
        assert_eq!(NodeId(3).into_iter().collect::<Vec<_>>(), vec![NodeId(3)]);
    }
}
