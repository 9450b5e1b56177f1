use crate::core::action::{ActionResult, Executed, Suspended};
use crate::core::config::{GameConfig, GameSettings};
use crate::core::error::GameError;
use crate::core::persist::FileStore;
use crate::core::presentation::Presentation;
use crate::core::store::{Namespace, Storable};
use crate::core::world::World;
use crate::elements::{Handle, Story};
use crate::schema::id::{ElementId, NodeId};
use crate::schema::saved_game::SavedGame;

/// Key of the namespace every live game starts with.
pub const GAME_NAMESPACE: &str = "game";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveStatus {
    /// Story loaded, nothing played yet.
    Idle,
    Running,
    /// Waiting on an unresolved future.
    Suspended,
    Terminated,
}

/// Outcome of one interpreter step.
#[derive(Debug, Clone)]
pub enum Step {
    Advanced(ActionResult),
    /// The step is waiting on the presentation layer. The future may
    /// already be resolved; the next call adopts its result.
    Suspended(Suspended),
    Terminated,
}

/// A step that is waiting, with what is needed to account for it later.
#[derive(Debug, Clone)]
struct Pending {
    node: NodeId,
    future: Suspended,
    callee: ElementId,
    commits_before: usize,
}

/// An adopted result and whether its element committed a record for it.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub result: ActionResult,
    pub committed: bool,
}

/// Walks the action graph one step per [`LiveGame::next`] call, parking
/// on a suspended future until the presentation layer resolves it.
#[derive(Debug)]
pub struct LiveGame {
    pub storable: Storable,
    story: Option<ElementId>,
    units: Vec<NodeId>,
    current_unit: usize,
    current_action: Option<NodeId>,
    locked_awaiting: Option<Pending>,
    current_saved_game: Option<SavedGame>,
    history: Vec<HistoryEntry>,
    /// Extra namespaces created alongside `game` on every new game.
    namespaces: Vec<String>,
    started: bool,
    terminated: bool,
}

impl Default for LiveGame {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveGame {
    pub fn new() -> Self {
        let mut live = Self {
            storable: Storable::new(),
            story: None,
            units: Vec::new(),
            current_unit: 0,
            current_action: None,
            locked_awaiting: None,
            current_saved_game: None,
            history: Vec::new(),
            namespaces: Vec::new(),
            started: false,
            terminated: false,
        };
        live.init_namespaces();
        live
    }

    fn init_namespaces(&mut self) {
        self.storable
            .add_namespace(Namespace::new("Game", GAME_NAMESPACE));
        for key in &self.namespaces {
            self.storable
                .add_namespace(Namespace::new(key.clone(), key.clone()));
        }
    }

    /// Register a namespace that starts empty now and on every new game.
    pub fn register_namespace(&mut self, key: impl Into<String>) -> &mut Self {
        let key = key.into();
        if !self.namespaces.contains(&key) {
            self.namespaces.push(key.clone());
        }
        self.storable.add_namespace(Namespace::new(key.clone(), key));
        self
    }

    pub fn load_story(&mut self, story: ElementId, units: Vec<NodeId>) -> &mut Self {
        self.story = Some(story);
        self.units = units;
        self
    }

    /// Rewind to the first unit with every registered namespace emptied.
    pub fn new_game(&mut self, version: &str) -> &mut Self {
        self.init_namespaces();
        self.current_unit = 0;
        self.current_action = self.units.first().copied();
        self.locked_awaiting = None;
        self.history.clear();
        self.started = true;
        self.terminated = false;
        self.current_saved_game = Some(SavedGame::new_game(version));
        self
    }

    pub fn story(&self) -> Option<ElementId> {
        self.story
    }

    pub fn units(&self) -> &[NodeId] {
        &self.units
    }

    pub fn current_action(&self) -> Option<NodeId> {
        self.current_action
    }

    pub fn current_saved_game(&self) -> Option<&SavedGame> {
        self.current_saved_game.as_ref()
    }

    pub(crate) fn set_saved_game(&mut self, saved: SavedGame) {
        self.current_saved_game = Some(saved);
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn status(&self) -> LiveStatus {
        if self.terminated {
            return LiveStatus::Terminated;
        }
        match &self.locked_awaiting {
            Some(pending) if !pending.future.is_solved() => LiveStatus::Suspended,
            _ if self.started => LiveStatus::Running,
            _ => LiveStatus::Idle,
        }
    }

    /// Move to the next top-level unit. Units already reached through
    /// their predecessor's chain are not replayed.
    fn next_unit(&mut self) -> Option<NodeId> {
        let index = if self.started { self.current_unit + 1 } else { 0 };
        self.started = true;
        let unit = self.units.get(index).copied()?;
        self.current_unit = index;
        Some(unit)
    }

    fn sync_unit(&mut self, node: NodeId) {
        if let Some(index) = self.units.iter().position(|u| *u == node) {
            self.current_unit = index;
        }
    }

    /// Run one step.
    pub fn next(
        &mut self,
        world: &mut World,
        presentation: &mut dyn Presentation,
    ) -> Result<Step, GameError> {
        if self.story.is_none() {
            return Err(GameError::NoStory);
        }

        if let Some(pending) = &self.locked_awaiting {
            let Some(result) = pending.future.result() else {
                tracing::trace!("locked awaiting");
                return Ok(Step::Suspended(pending.future.clone()));
            };
            let (callee, commits_before) = (pending.callee, pending.commits_before);
            self.locked_awaiting = None;
            if let Some(index) = result.choice {
                world.choose(result.node, index)?;
            }
            self.current_action = world.graph().child(result.node);
            let committed = world.commits(callee) > commits_before;
            self.history.push(HistoryEntry {
                result: result.clone(),
                committed,
            });
            return Ok(Step::Advanced(result));
        }

        if self.current_action.is_none() {
            self.current_action = self.next_unit();
        }
        let Some(node) = self.current_action else {
            tracing::debug!("story finished");
            self.terminated = true;
            return Ok(Step::Terminated);
        };
        self.started = true;
        self.sync_unit(node);

        let callee = world.callee_of(node)?;
        let commits_before = world.commits(callee);
        match world.execute(node, &mut self.storable, presentation)? {
            Executed::Suspended(future) => {
                self.locked_awaiting = Some(Pending {
                    node,
                    future: future.clone(),
                    callee,
                    commits_before,
                });
                Ok(Step::Suspended(future))
            }
            Executed::Immediate(result) => {
                self.current_action = world.graph().child(result.node);
                let committed = world.commits(callee) > commits_before;
                self.history.push(HistoryEntry {
                    result: result.clone(),
                    committed,
                });
                Ok(Step::Advanced(result))
            }
        }
    }

    /// Step back over the most recently adopted result: undo its record,
    /// if it made one, and make it the next action to run. A step still
    /// waiting to be adopted is rolled back first.
    pub fn undo_last(&mut self, world: &mut World) -> Result<Option<ActionResult>, GameError> {
        if let Some(pending) = self.locked_awaiting.take() {
            if world.commits(pending.callee) > pending.commits_before {
                world.undo_action(pending.node, &mut self.storable)?;
            }
            self.current_action = Some(pending.node);
        }
        let Some(entry) = self.history.pop() else {
            return Ok(None);
        };
        if entry.committed {
            world.undo_action(entry.result.node, &mut self.storable)?;
        }
        self.current_action = Some(entry.result.node);
        self.terminated = false;
        Ok(Some(entry.result))
    }
}

/// What [`Game::play_until_blocked`] got through.
#[derive(Debug, Clone)]
pub struct Progress {
    pub results: Vec<ActionResult>,
    /// The unresolved future play stopped at, if any.
    pub blocked_on: Option<Suspended>,
    pub terminated: bool,
}

/// A playable game: world, live session, config and settings.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    settings: GameSettings,
    world: World,
    live: LiveGame,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let mut live = LiveGame::new();
        for key in &config.namespaces {
            live.register_namespace(key.clone());
        }
        Self {
            config,
            settings: GameSettings::default(),
            world: World::new(),
            live,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn live(&self) -> &LiveGame {
        &self.live
    }

    pub fn live_mut(&mut self) -> &mut LiveGame {
        &mut self.live
    }

    pub fn store(&self) -> &Storable {
        &self.live.storable
    }

    pub fn store_mut(&mut self) -> &mut Storable {
        &mut self.live.storable
    }

    /// Make `story` the one this game plays.
    pub fn register_story(&mut self, story: Handle<Story>) -> Result<&mut Self, GameError> {
        let units = self.world.set_root(story)?;
        tracing::debug!(story = %story.id(), units = units.len(), "story registered");
        self.live.load_story(story.id(), units);
        Ok(self)
    }

    pub fn new_game(&mut self) -> &mut Self {
        self.live.new_game(&self.config.version);
        self
    }

    pub fn next(&mut self, presentation: &mut dyn Presentation) -> Result<Step, GameError> {
        self.live.next(&mut self.world, presentation)
    }

    /// Step until a future is left unresolved or the story ends.
    pub fn play_until_blocked(
        &mut self,
        presentation: &mut dyn Presentation,
    ) -> Result<Progress, GameError> {
        let mut results = Vec::new();
        loop {
            match self.next(presentation)? {
                Step::Advanced(result) => results.push(result),
                Step::Suspended(future) => {
                    if !future.is_solved() {
                        return Ok(Progress {
                            results,
                            blocked_on: Some(future),
                            terminated: false,
                        });
                    }
                }
                Step::Terminated => {
                    return Ok(Progress {
                        results,
                        blocked_on: None,
                        terminated: true,
                    })
                }
            }
        }
    }

    pub fn undo_last(&mut self) -> Result<Option<ActionResult>, GameError> {
        self.live.undo_last(&mut self.world)
    }

    fn save_name(&self, fs: &impl FileStore, name: &str) -> String {
        let file = fs.get_name(name, &self.config.save_suffix);
        format!("{}/{}", self.config.saves_folder, file)
    }

    /// Snapshot the store under `name`.
    pub fn save_game(&mut self, fs: &impl FileStore, name: &str) -> Result<SavedGame, GameError> {
        let mut saved = self
            .live
            .current_saved_game()
            .cloned()
            .unwrap_or_else(|| SavedGame::new(name, self.config.version.clone()));
        saved.name = name.to_string();
        saved.version = self.config.version.clone();
        saved.game.store = self.live.storable.to_data();
        saved.touch();

        fs.create_folder(&self.config.saves_folder)?;
        fs.save(&self.save_name(fs, name), &saved)?;
        tracing::debug!(name, "game saved");
        self.live.set_saved_game(saved.clone());
        Ok(saved)
    }

    /// Restore store namespaces from the save `name`.
    pub fn load_game(&mut self, fs: &impl FileStore, name: &str) -> Result<SavedGame, GameError> {
        let saved: SavedGame = fs.load(&self.save_name(fs, name))?;
        if saved.version != self.config.version {
            tracing::warn!(saved = %saved.version, current = %self.config.version, "save version differs");
        }
        self.live.storable.load(saved.game.store.clone());
        self.live.set_saved_game(saved.clone());
        Ok(saved)
    }

    /// Load settings, writing the defaults first if there are none.
    pub fn read_settings(&mut self, fs: &impl FileStore) -> Result<&GameSettings, GameError> {
        let name = fs.get_name(&self.config.settings_name, &self.config.settings_suffix);
        if !fs.is_file_exists(&name) {
            fs.save(&name, &GameSettings::default())?;
        }
        self.settings = fs.load(&name)?;
        Ok(&self.settings)
    }

    pub fn save_settings(
        &mut self,
        fs: &impl FileStore,
        settings: GameSettings,
    ) -> Result<&GameSettings, GameError> {
        let name = fs.get_name(&self.config.settings_name, &self.config.settings_suffix);
        fs.save(&name, &settings)?;
        self.settings = settings;
        Ok(&self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::presentation::Headless;
    use crate::elements::character::CharacterConfig;
    use crate::elements::scene::SceneConfig;

    fn two_line_game() -> Game {
        let mut game = Game::default();
        let world = game.world_mut();
        let alice = world.character("Alice", CharacterConfig::default());
        let scene = world.scene("Park", SceneConfig::default());
        let story = world.story("main");
        let lines = world.with(alice).say("one").say("two").take_actions().unwrap();
        let unit = world.with(scene).action([lines]).unwrap();
        world.with(story).action([unit]).unwrap();
        game.register_story(story).unwrap();
        game
    }

    #[test]
    fn stepping_without_story_fails() {
        let mut game = Game::default();
        assert!(matches!(
            game.next(&mut Headless::new()),
            Err(GameError::NoStory)
        ));
    }

    #[test]
    fn suspended_step_is_adopted_on_next_call() {
        let mut game = two_line_game();
        let mut headless = Headless::new();
        game.new_game();
        assert_eq!(game.live().status(), LiveStatus::Running);

        // scene:action runs inline
        assert!(matches!(game.next(&mut headless).unwrap(), Step::Advanced(r) if r.action_type == "scene:action"));
        // say suspends, headless resolves at once
        assert!(matches!(game.next(&mut headless).unwrap(), Step::Suspended(f) if f.is_solved()));
        assert!(matches!(game.next(&mut headless).unwrap(), Step::Advanced(r) if r.action_type == "character:say"));
    }

    #[test]
    fn unresolved_future_is_returned_unchanged() {
        struct Mute;
        impl Presentation for Mute {
            fn create_say(&mut self, _: NodeId, _: &crate::schema::sentence::Sentence, _: Suspended) {}
            fn create_menu(
                &mut self,
                _: NodeId,
                _: Option<&crate::schema::sentence::Sentence>,
                _: &[crate::schema::sentence::Sentence],
                _: Suspended,
            ) {
            }
            fn set_background(&mut self, _: &str, _: Suspended) {}
            fn sleep(&mut self, _: std::time::Duration, _: Suspended) {}
            fn animate_image(&mut self, _: &str, _: crate::core::presentation::ImageEvent, _: Suspended) {}
            fn play_sound(&mut self, _: &crate::elements::Sound, _: Option<Suspended>) {}
        }

        let mut game = two_line_game();
        let mut mute = Mute;
        game.new_game();
        let progress = game.play_until_blocked(&mut mute).unwrap();
        let blocked = progress.blocked_on.unwrap();
        assert_eq!(game.live().status(), LiveStatus::Suspended);

        let Step::Suspended(again) = game.next(&mut mute).unwrap() else {
            panic!("expected the same suspension");
        };
        assert!(again.ptr_eq(&blocked));

        blocked.resolve(crate::core::awaitable::Resolution::Continue).unwrap();
        assert!(matches!(game.next(&mut mute).unwrap(), Step::Advanced(_)));
    }

    #[test]
    fn new_game_names_the_save() {
        let mut game = two_line_game();
        game.new_game();
        let saved = game.live().current_saved_game().unwrap();
        assert!(saved.name.starts_with("NewGame-"));
        assert!(game.store().has_namespace(GAME_NAMESPACE));
    }

    #[test]
    fn terminated_stays_terminated() {
        let mut game = two_line_game();
        let mut headless = Headless::new();
        game.new_game();
        let progress = game.play_until_blocked(&mut headless).unwrap();
        assert!(progress.terminated);
        assert_eq!(headless.lines(), vec!["Alice: one", "Alice: two"]);
        assert!(matches!(game.next(&mut headless).unwrap(), Step::Terminated));
        assert_eq!(game.live().status(), LiveStatus::Terminated);
    }

    #[test]
    fn undo_last_replays_the_step() {
        let mut game = two_line_game();
        let mut headless = Headless::new();
        game.new_game();
        game.play_until_blocked(&mut headless).unwrap();

        let undone = game.undo_last().unwrap().unwrap();
        assert_eq!(undone.action_type, "character:say");
        assert_eq!(game.live().current_action(), Some(undone.node));

        let progress = game.play_until_blocked(&mut headless).unwrap();
        assert!(progress.terminated);
        assert_eq!(headless.lines().last(), Some(&"Alice: two"));
        assert_eq!(headless.lines().len(), 3);
    }
}
