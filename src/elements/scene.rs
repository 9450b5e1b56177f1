use serde::{Deserialize, Serialize};

use crate::core::action::{ActionKind, SceneAction};
use crate::core::builder::{Actionable, Constructable};
use crate::core::graph::Chain;
use crate::core::store::Storable;
use crate::core::transaction::{Rollback, Stateful};
use crate::schema::id::{ElementId, NodeId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Background shown when the scene starts.
    #[serde(default)]
    pub background: Option<String>,
}

#[derive(Debug, Default)]
pub struct SceneState {
    pub background: Option<String>,
}

pub enum SceneRecord {
    Background { previous: Option<String> },
}

impl Rollback for SceneState {
    type Record = SceneRecord;

    fn rollback(&mut self, record: SceneRecord, _store: &mut Storable) {
        match record {
            SceneRecord::Background { previous } => self.background = previous,
        }
    }
}

#[derive(Debug)]
pub struct Scene {
    pub(crate) id: ElementId,
    name: String,
    config: SceneConfig,
    pending: Vec<NodeId>,
    actions: Vec<NodeId>,
    pub(crate) stateful: Stateful<SceneState>,
}

impl Scene {
    pub fn new(id: ElementId, name: impl Into<String>, config: SceneConfig) -> Self {
        let state = SceneState {
            background: config.background.clone(),
        };
        Self {
            id,
            name: name.into(),
            config,
            pending: Vec::new(),
            actions: Vec::new(),
            stateful: Stateful::new(state),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn background(&self) -> Option<&str> {
        self.stateful.state.background.as_deref()
    }

    /// Every action constructed into this scene, in order.
    pub fn actions(&self) -> &[NodeId] {
        &self.actions
    }

    pub(crate) fn set_background(&mut self, src: &str) {
        let previous = self.stateful.state.background.replace(src.to_string());
        self.stateful.record(SceneRecord::Background { previous });
    }
}

impl Actionable for Scene {
    fn pending_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.pending
    }
}

impl Constructable for Scene {
    fn actions_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.actions
    }

    fn composite(chain: Option<Chain>) -> ActionKind {
        ActionKind::Scene(SceneAction::Action(chain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_starts_from_config_and_undoes() {
        let config = SceneConfig {
            background: Some("park.png".to_string()),
        };
        let mut scene = Scene::new(ElementId(1), "park", config);
        let mut store = Storable::new();
        assert_eq!(scene.background(), Some("park.png"));

        scene.set_background("night.png");
        assert_eq!(scene.background(), Some("night.png"));
        scene.stateful.undo(None, &mut store).unwrap();
        assert_eq!(scene.background(), Some("park.png"));
    }
}
