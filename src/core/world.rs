use crate::core::action::{Action, ActionData, ActionKind, ExecCtx, Executed};
use crate::core::builder::Author;
use crate::core::error::GameError;
use crate::core::graph::{Chain, Graph};
use crate::core::presentation::Presentation;
use crate::core::store::Storable;
use crate::elements::character::CharacterConfig;
use crate::elements::condition::Condition;
use crate::elements::image::ImageConfig;
use crate::elements::scene::SceneConfig;
use crate::elements::script::ScriptCtx;
use crate::elements::sound::SoundConfig;
use crate::elements::{
    Character, Cleaner, ElementError, ElementKind, Elements, Handle, Image, Menu, Scene, Script,
    Sound, Story,
};
use crate::schema::id::{ElementId, IdManager, NodeId};
use crate::schema::sentence::Sentence;

pub type ActionGraph = Graph<Action>;

#[derive(Debug)]
pub struct World {
    pub(crate) ids: IdManager,
    pub(crate) graph: ActionGraph,
    pub(crate) elements: Elements,
    root: NodeId,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        let mut ids = IdManager::new();
        let root = ids.node_id();
        Self {
            ids,
            graph: Graph::with_root(root),
            elements: Elements::new(),
            root,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn graph(&self) -> &ActionGraph {
        &self.graph
    }

    pub fn elements(&self) -> &Elements {
        &self.elements
    }

    pub fn ids(&self) -> &IdManager {
        &self.ids
    }

    pub fn get<T: ElementKind>(&self, handle: Handle<T>) -> Result<&T, GameError> {
        Ok(self.elements.resolve(handle)?)
    }

    pub fn with<T: ElementKind>(&mut self, handle: Handle<T>) -> Author<'_, T> {
        Author::new(self, handle)
    }

    pub fn character(&mut self, name: impl Into<String>, config: CharacterConfig) -> Handle<Character> {
        let id = self.ids.element_id();
        self.elements.insert(Character::new(id, name, config))
    }

    pub fn image(&mut self, name: impl Into<String>, config: ImageConfig) -> Result<Handle<Image>, GameError> {
        let image = Image::new(self.ids.element_id(), name, config)?;
        Ok(self.elements.insert(image))
    }

    pub fn sound(&mut self, name: impl Into<String>, config: SoundConfig) -> Handle<Sound> {
        let id = self.ids.element_id();
        self.elements.insert(Sound::new(id, name, config))
    }

    pub fn scene(&mut self, name: impl Into<String>, config: SceneConfig) -> Handle<Scene> {
        let id = self.ids.element_id();
        self.elements.insert(Scene::new(id, name, config))
    }

    pub fn story(&mut self, name: impl Into<String>) -> Handle<Story> {
        let id = self.ids.element_id();
        self.elements.insert(Story::new(id, name))
    }

    pub fn script(
        &mut self,
        handler: impl FnMut(&mut ScriptCtx<'_>) -> Option<Cleaner> + 'static,
    ) -> Handle<Script> {
        let id = self.ids.element_id();
        self.elements.insert(Script::new(id, handler))
    }

    pub fn condition(&mut self) -> Handle<Condition> {
        let id = self.ids.element_id();
        self.elements.insert(Condition::new(id))
    }

    pub fn menu(&mut self, prompt: Option<Sentence>) -> Handle<Menu> {
        let id = self.ids.element_id();
        self.elements.insert(Menu::new(id, prompt))
    }

    /// Mint a node holding a new action for `callee`.
    pub fn new_action(&mut self, callee: ElementId, kind: ActionKind) -> Result<NodeId, GameError> {
        let node = self.ids.node_id();
        self.graph
            .insert_content(node, Action::new(node, callee, kind))?;
        Ok(node)
    }

    /// Link `actions` into a chain, each the child of the one before.
    pub fn construct(&mut self, actions: &[NodeId]) -> Result<Option<Chain>, GameError> {
        Ok(self.graph.link(actions)?)
    }

    /// Flatten and link a branch body that stays off the main chain until
    /// it is spliced in.
    pub fn detached<L, I>(&mut self, lists: L) -> Result<(Vec<NodeId>, Option<Chain>), GameError>
    where
        L: IntoIterator<Item = I>,
        I: IntoIterator<Item = NodeId>,
    {
        let actions: Vec<NodeId> = lists.into_iter().flatten().collect();
        let chain = self.construct(&actions)?;
        Ok((actions, chain))
    }

    /// Attach the story's first unit under the root and return its units.
    pub fn set_root(&mut self, story: Handle<Story>) -> Result<Vec<NodeId>, GameError> {
        let units = self.get(story)?.actions().to_vec();
        self.graph.set_child(self.root, units.first().copied())?;
        Ok(units)
    }

    pub fn action(&self, node: NodeId) -> Option<&Action> {
        self.graph.content(node)
    }

    pub fn action_data(&self, node: NodeId) -> Result<ActionData, GameError> {
        self.action(node)
            .map(Action::to_data)
            .ok_or(GameError::MissingAction(node))
    }

    pub fn callee_of(&self, node: NodeId) -> Result<ElementId, GameError> {
        self.action(node)
            .map(|a| a.callee)
            .ok_or(GameError::MissingAction(node))
    }

    /// Commits recorded so far by an element.
    pub fn commits(&self, element: ElementId) -> usize {
        self.elements.get(element).map_or(0, |e| e.commits())
    }

    /// Undo the latest commit of the element behind `node`.
    pub fn undo_action(&mut self, node: NodeId, store: &mut Storable) -> Result<usize, GameError> {
        let callee = self.callee_of(node)?;
        let element = self
            .elements
            .get_mut(callee)
            .ok_or(ElementError::NotFound(callee))?;
        Ok(element.undo(store)?)
    }

    /// Apply a menu pick: record it and splice the chosen chain after the
    /// menu node. Out-of-range picks continue past the menu.
    pub fn choose(&mut self, node: NodeId, index: usize) -> Result<(), GameError> {
        let callee = self.callee_of(node)?;
        let menu = self.elements.typed_mut::<Menu>(callee)?;
        match menu.choose(index) {
            Some(chain) => self.graph.splice(node, chain)?,
            None => {
                tracing::warn!(%node, index, choices = menu.choices().len(), "menu choice out of range");
                self.graph.splice(node, None)?;
            }
        }
        Ok(())
    }

    /// Node ids from `from` along child edges.
    pub fn walk(&self, from: NodeId) -> Vec<NodeId> {
        self.graph.walk(from).collect()
    }

    pub fn execute(
        &mut self,
        node: NodeId,
        store: &mut Storable,
        presentation: &mut dyn Presentation,
    ) -> Result<Executed, GameError> {
        let action = self.action(node).cloned().ok_or(GameError::MissingAction(node))?;
        tracing::debug!(%node, action = action.type_tag(), "executing");
        presentation.handle(&action);
        action.execute_action(&mut ExecCtx {
            world: self,
            store,
            presentation,
        })
    }
}
