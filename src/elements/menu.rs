use crate::core::graph::Chain;
use crate::core::store::Storable;
use crate::core::transaction::{Rollback, Stateful};
use crate::schema::id::{ElementId, NodeId};
use crate::schema::sentence::Sentence;

/// One entry of a menu and the detached chain it leads into.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub prompt: Sentence,
    pub actions: Vec<NodeId>,
    pub chain: Option<Chain>,
}

#[derive(Debug, Default)]
pub struct MenuState {
    pub chosen: Option<usize>,
}

pub enum MenuRecord {
    Chose {
        index: usize,
        previous: Option<usize>,
    },
}

impl Rollback for MenuState {
    type Record = MenuRecord;

    fn rollback(&mut self, record: MenuRecord, _store: &mut Storable) {
        match record {
            MenuRecord::Chose { previous, .. } => self.chosen = previous,
        }
    }
}

#[derive(Debug)]
pub struct Menu {
    pub(crate) id: ElementId,
    prompt: Option<Sentence>,
    choices: Vec<Choice>,
    pub(crate) stateful: Stateful<MenuState>,
}

impl Menu {
    pub fn new(id: ElementId, prompt: Option<Sentence>) -> Self {
        Self {
            id,
            prompt,
            choices: Vec::new(),
            stateful: Stateful::new(MenuState::default()),
        }
    }

    pub fn prompt(&self) -> Option<&Sentence> {
        self.prompt.as_ref()
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn prompts(&self) -> Vec<Sentence> {
        self.choices.iter().map(|c| c.prompt.clone()).collect()
    }

    pub fn chosen(&self) -> Option<usize> {
        self.stateful.state.chosen
    }

    pub(crate) fn push_choice(&mut self, choice: Choice) {
        self.choices.push(choice);
    }

    /// Record a pick and hand back its chain. `None` if out of range.
    pub(crate) fn choose(&mut self, index: usize) -> Option<Option<Chain>> {
        let chain = self.choices.get(index)?.chain;
        let previous = self.stateful.state.chosen.replace(index);
        self.stateful.record(MenuRecord::Chose { index, previous });
        Some(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> Menu {
        let mut menu = Menu::new(ElementId(1), Some(Sentence::from("Where to?")));
        for (n, label) in ["Left", "Right"].into_iter().enumerate() {
            let actions = vec![NodeId(10 + n as u64)];
            menu.push_choice(Choice {
                prompt: Sentence::from(label),
                chain: Chain::from_nodes(&actions),
                actions,
            });
        }
        menu
    }

    #[test]
    fn choose_returns_the_chain() {
        let mut menu = menu();
        assert_eq!(menu.choose(1), Some(Some(Chain::single(NodeId(11)))));
        assert_eq!(menu.chosen(), Some(1));
        assert_eq!(menu.choose(5), None);
        assert_eq!(menu.chosen(), Some(1));
    }

    #[test]
    fn undo_restores_previous_choice() {
        let mut menu = menu();
        let mut store = Storable::new();
        menu.choose(0);
        menu.choose(1);
        menu.stateful.undo(None, &mut store).unwrap();
        assert_eq!(menu.chosen(), Some(0));
        menu.stateful.undo(None, &mut store).unwrap();
        assert_eq!(menu.chosen(), None);
    }

    #[test]
    fn prompts_keep_order() {
        let texts: Vec<String> = menu().prompts().iter().map(Sentence::plain_text).collect();
        assert_eq!(texts, vec!["Left", "Right"]);
    }
}
