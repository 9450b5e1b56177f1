use serde::{Deserialize, Serialize};

use crate::core::builder::Actionable;
use crate::core::store::Storable;
use crate::core::transaction::{Rollback, Stateful};
use crate::schema::id::{ElementId, NodeId};
use crate::schema::sentence::{Sentence, SentenceConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterConfig {
    /// Default text color for this character's lines.
    #[serde(default)]
    pub color: Option<String>,
}

/// Lines currently on screen, in the order they were said.
#[derive(Debug, Default)]
pub struct CharacterState {
    shown: Vec<NodeId>,
}

pub enum CharacterRecord {
    Say { node: NodeId },
    Hide { node: NodeId },
}

impl Rollback for CharacterState {
    type Record = CharacterRecord;

    fn rollback(&mut self, record: CharacterRecord, _store: &mut Storable) {
        match record {
            CharacterRecord::Say { node } => self.shown.retain(|n| *n != node),
            CharacterRecord::Hide { node } => {
                if !self.shown.contains(&node) {
                    self.shown.push(node);
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct Character {
    pub(crate) id: ElementId,
    name: String,
    config: CharacterConfig,
    pending: Vec<NodeId>,
    pub(crate) stateful: Stateful<CharacterState>,
}

impl Character {
    pub fn new(id: ElementId, name: impl Into<String>, config: CharacterConfig) -> Self {
        Self {
            id,
            name: name.into(),
            config,
            pending: Vec::new(),
            stateful: Stateful::new(CharacterState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CharacterConfig {
        &self.config
    }

    pub fn lines(&self) -> &[NodeId] {
        &self.stateful.state.shown
    }

    pub fn is_showing(&self, node: NodeId) -> bool {
        self.stateful.state.shown.contains(&node)
    }

    /// The sentence as this character speaks it: attributed to them and
    /// colored with their default color when it has none of its own.
    pub fn speak(&self, sentence: &Sentence) -> Sentence {
        let mut line = sentence.clone();
        if line.character.is_none() {
            line.character = Some(self.name.clone());
        }
        if let Some(color) = &self.config.color {
            if line.config.color == SentenceConfig::default().color {
                line.config.color = color.clone();
            }
        }
        line
    }

    pub(crate) fn said(&mut self, node: NodeId) {
        self.stateful.state.shown.push(node);
        self.stateful.record(CharacterRecord::Say { node });
    }

    /// Take a line off screen. Returns false if it was not showing.
    pub(crate) fn hide_line(&mut self, node: NodeId) -> bool {
        let before = self.stateful.state.shown.len();
        self.stateful.state.shown.retain(|n| *n != node);
        if self.stateful.state.shown.len() == before {
            return false;
        }
        self.stateful.record(CharacterRecord::Hide { node });
        true
    }
}

impl Actionable for Character {
    fn pending_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Character {
        Character::new(
            ElementId(1),
            "Alice",
            CharacterConfig {
                color: Some("#c0ffee".to_string()),
            },
        )
    }

    #[test]
    fn speak_attributes_and_colors() {
        let line = alice().speak(&Sentence::from("Hi"));
        assert_eq!(line.character.as_deref(), Some("Alice"));
        assert_eq!(line.config.color, "#c0ffee");

        let mut quoted = Sentence::from("Psst");
        quoted.character = Some("Bob".to_string());
        assert_eq!(alice().speak(&quoted).character.as_deref(), Some("Bob"));
    }

    #[test]
    fn undo_say_hides_the_line() {
        let mut alice = alice();
        let mut store = Storable::new();
        alice.said(NodeId(10));
        alice.said(NodeId(11));
        assert_eq!(alice.lines(), &[NodeId(10), NodeId(11)]);

        alice.stateful.undo(None, &mut store).unwrap();
        assert!(!alice.is_showing(NodeId(11)));
        assert!(alice.is_showing(NodeId(10)));
    }

    #[test]
    fn undo_hide_shows_it_again() {
        let mut alice = alice();
        let mut store = Storable::new();
        alice.said(NodeId(10));
        assert!(alice.hide_line(NodeId(10)));
        assert!(!alice.hide_line(NodeId(10)));
        assert!(!alice.is_showing(NodeId(10)));

        alice.stateful.undo(None, &mut store).unwrap();
        assert!(alice.is_showing(NodeId(10)));
    }

    #[test]
    fn take_actions_drains() {
        let mut alice = alice();
        alice.pending_mut().push(NodeId(4));
        assert_eq!(alice.take_actions(), vec![NodeId(4)]);
        assert!(alice.take_actions().is_empty());
    }
}
