use crate::core::action::{ActionKind, StoryAction};
use crate::core::builder::Constructable;
use crate::core::graph::Chain;
use crate::schema::id::{ElementId, NodeId};

/// The top-level container of a playable script.
///
/// Its constructed actions are the units the interpreter plays in order.
#[derive(Debug)]
pub struct Story {
    pub(crate) id: ElementId,
    name: String,
    actions: Vec<NodeId>,
}

impl Story {
    pub fn new(id: ElementId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            actions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actions(&self) -> &[NodeId] {
        &self.actions
    }
}

impl Constructable for Story {
    fn actions_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.actions
    }

    fn composite(chain: Option<Chain>) -> ActionKind {
        ActionKind::Story(StoryAction::Action(chain))
    }
}
