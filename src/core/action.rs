use serde::Serialize;
use std::time::Duration;

use crate::core::awaitable::{Awaitable, Resolution};
use crate::core::error::GameError;
use crate::core::graph::{Chain, NodeData, ToData};
use crate::core::presentation::{ImageEvent, Presentation};
use crate::core::store::Storable;
use crate::core::world::World;
use crate::elements::image::{ImagePosition, Transform};
use crate::elements::{Character, Condition, Image, Menu, Scene, Script, Sound};
use crate::schema::id::{ElementId, IdManager, NodeId};
use crate::schema::sentence::Sentence;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CharacterAction {
    Say(Sentence),
    /// Take an earlier `character:say` line off screen.
    Hide(NodeId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SceneAction {
    /// Composite: runs the scene's inner chain.
    Action(Option<Chain>),
    SetBackground(String),
    Sleep(Duration),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StoryAction {
    Action(Option<Chain>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ImageAction {
    SetSrc(String),
    SetPosition(ImagePosition, Transform),
    Show(Transform),
    Hide(Transform),
    ApplyTransform(Transform),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConditionAction {
    Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScriptAction {
    Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MenuAction {
    Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SoundAction {
    Play,
    Stop,
}

impl CharacterAction {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Say(_) => "character:say",
            Self::Hide(_) => "character:hide",
        }
    }
}

impl SceneAction {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Action(_) => "scene:action",
            Self::SetBackground(_) => "scene:setBackground",
            Self::Sleep(_) => "scene:sleep",
        }
    }
}

impl StoryAction {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Action(_) => "story:action",
        }
    }
}

impl ImageAction {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::SetSrc(_) => "image:setSrc",
            Self::SetPosition(..) => "image:setPosition",
            Self::Show(_) => "image:show",
            Self::Hide(_) => "image:hide",
            Self::ApplyTransform(_) => "image:applyTransform",
        }
    }
}

impl ConditionAction {
    pub fn tag(&self) -> &'static str {
        "condition:action"
    }
}

impl ScriptAction {
    pub fn tag(&self) -> &'static str {
        "script:action"
    }
}

impl MenuAction {
    pub fn tag(&self) -> &'static str {
        "menu:action"
    }
}

impl SoundAction {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Play => "sound:play",
            Self::Stop => "sound:stop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ActionKind {
    Character(CharacterAction),
    Scene(SceneAction),
    Story(StoryAction),
    Image(ImageAction),
    Condition(ConditionAction),
    Script(ScriptAction),
    Menu(MenuAction),
    Sound(SoundAction),
}

impl ActionKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Character(a) => a.tag(),
            Self::Scene(a) => a.tag(),
            Self::Story(a) => a.tag(),
            Self::Image(a) => a.tag(),
            Self::Condition(a) => a.tag(),
            Self::Script(a) => a.tag(),
            Self::Menu(a) => a.tag(),
            Self::Sound(a) => a.tag(),
        }
    }
}

/// One step of a script: the payload of a content node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    /// The node holding this action.
    pub node: NodeId,
    /// The element the action belongs to.
    pub callee: ElementId,
    pub kind: ActionKind,
}

/// Outcome of one step. The interpreter continues at `node`'s child.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    #[serde(rename = "type")]
    pub action_type: &'static str,
    pub node: NodeId,
    /// The menu entry picked, for menu results.
    pub choice: Option<usize>,
}

impl ActionResult {
    pub fn new(action_type: &'static str, node: NodeId) -> Self {
        Self {
            action_type,
            node,
            choice: None,
        }
    }

    pub fn with_choice(mut self, choice: usize) -> Self {
        self.choice = Some(choice);
        self
    }
}

/// A step waiting on the presentation layer.
pub type Suspended = Awaitable<ActionResult, Resolution>;

#[derive(Debug, Clone)]
pub enum Executed {
    Immediate(ActionResult),
    Suspended(Suspended),
}

/// Serialized form of an action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionData {
    #[serde(rename = "type")]
    pub action_type: &'static str,
    pub content: NodeData<ActionKind>,
}

impl ToData for Action {
    type Data = ActionKind;

    fn to_data(&self) -> ActionKind {
        self.kind.clone()
    }
}

/// Everything an action may touch while it executes.
pub struct ExecCtx<'a> {
    pub world: &'a mut World,
    pub store: &'a mut Storable,
    pub presentation: &'a mut dyn Presentation,
}

impl Action {
    pub fn new(node: NodeId, callee: ElementId, kind: ActionKind) -> Self {
        Self { node, callee, kind }
    }

    pub fn type_tag(&self) -> &'static str {
        self.kind.type_tag()
    }

    pub fn to_data(&self) -> ActionData {
        ActionData {
            action_type: self.type_tag(),
            content: NodeData {
                id: self.node.to_string(),
                data: Some(ToData::to_data(self)),
            },
        }
    }

    fn result(&self) -> ActionResult {
        ActionResult::new(self.type_tag(), self.node)
    }

    /// A future that completes this action with its plain result.
    fn suspend(&self) -> Suspended {
        let result = self.result();
        Awaitable::new(move |_: Resolution| result)
    }

    #[tracing::instrument(level = "trace", skip(self, ctx), fields(node = %self.node, action = self.type_tag()))]
    pub fn execute_action(&self, ctx: &mut ExecCtx<'_>) -> Result<Executed, GameError> {
        match &self.kind {
            ActionKind::Character(CharacterAction::Say(sentence)) => {
                let character = ctx.world.elements.typed_mut::<Character>(self.callee)?;
                let line = character.speak(sentence);
                character.said(self.node);
                let future = self.suspend();
                ctx.presentation.create_say(self.node, &line, future.clone());
                if !line.config.pause {
                    return Ok(Executed::Immediate(self.result()));
                }
                Ok(Executed::Suspended(future))
            }
            ActionKind::Character(CharacterAction::Hide(line)) => {
                let character = ctx.world.elements.typed_mut::<Character>(self.callee)?;
                if character.hide_line(*line) {
                    ctx.presentation.hide_say(*line);
                } else {
                    tracing::debug!(line = %line, "line was not showing");
                }
                Ok(Executed::Immediate(self.result()))
            }
            ActionKind::Scene(action) => self.execute_scene(action, ctx),
            ActionKind::Story(StoryAction::Action(chain)) => {
                ctx.world.graph.splice(self.node, *chain)?;
                Ok(Executed::Immediate(self.result()))
            }
            ActionKind::Image(action) => self.execute_image(action, ctx),
            ActionKind::Condition(_) => {
                let condition = ctx.world.elements.typed_mut::<Condition>(self.callee)?;
                let chain = condition.run(ctx.store);
                ctx.world.graph.splice(self.node, chain)?;
                Ok(Executed::Immediate(self.result()))
            }
            ActionKind::Script(_) => {
                let script = ctx.world.elements.typed_mut::<Script>(self.callee)?;
                script.run(ctx.store, self.node);
                Ok(Executed::Immediate(self.result()))
            }
            ActionKind::Menu(_) => {
                let menu = ctx.world.elements.typed::<Menu>(self.callee)?;
                let result = self.result();
                let future: Suspended = Awaitable::new(move |resolution: Resolution| match resolution {
                    Resolution::Choose(index) => result.with_choice(index),
                    Resolution::Continue => result,
                });
                ctx.presentation
                    .create_menu(self.node, menu.prompt(), &menu.prompts(), future.clone());
                Ok(Executed::Suspended(future))
            }
            ActionKind::Sound(action) => {
                let sound = ctx.world.elements.typed_mut::<Sound>(self.callee)?;
                match action {
                    SoundAction::Play => {
                        sound.play();
                        if sound.config().blocks() {
                            let future = self.suspend();
                            ctx.presentation.play_sound(sound, Some(future.clone()));
                            return Ok(Executed::Suspended(future));
                        }
                        ctx.presentation.play_sound(sound, None);
                    }
                    SoundAction::Stop => {
                        sound.stop();
                        ctx.presentation.stop_sound(sound);
                    }
                }
                Ok(Executed::Immediate(self.result()))
            }
        }
    }

    fn execute_scene(&self, action: &SceneAction, ctx: &mut ExecCtx<'_>) -> Result<Executed, GameError> {
        let scene = ctx.world.elements.typed_mut::<Scene>(self.callee)?;
        match action {
            SceneAction::Action(chain) => {
                ctx.presentation.set_scene(scene);
                ctx.world.graph.splice(self.node, *chain)?;
                Ok(Executed::Immediate(self.result()))
            }
            SceneAction::SetBackground(src) => {
                scene.set_background(src);
                let future = self.suspend();
                ctx.presentation.set_background(src, future.clone());
                Ok(Executed::Suspended(future))
            }
            SceneAction::Sleep(duration) => {
                let future = self.suspend();
                ctx.presentation.sleep(*duration, future.clone());
                Ok(Executed::Suspended(future))
            }
        }
    }

    fn execute_image(&self, action: &ImageAction, ctx: &mut ExecCtx<'_>) -> Result<Executed, GameError> {
        let image = ctx.world.elements.typed_mut::<Image>(self.callee)?;
        if image.presented_id().is_none() {
            let id = IdManager::prefix("image", &ctx.world.ids.get_string_id(), ":");
            if image.register(id.clone()) {
                ctx.presentation.add_image(&id, image);
            }
        }
        let id = image.presented_id().unwrap_or_default().to_string();

        let event = match action {
            ImageAction::SetSrc(src) => {
                image.set_src(src);
                return Ok(Executed::Immediate(self.result()));
            }
            ImageAction::SetPosition(position, transform) => {
                image.set_position(position);
                ImageEvent::SetPosition(position.clone(), transform.clone())
            }
            ImageAction::Show(transform) => {
                image.show();
                ImageEvent::Show(transform.clone())
            }
            ImageAction::Hide(transform) => {
                image.hide();
                ImageEvent::Hide(transform.clone())
            }
            ImageAction::ApplyTransform(transform) => {
                image.apply_transform(transform);
                ImageEvent::ApplyTransform(transform.clone())
            }
        };
        let future = self.suspend();
        ctx.presentation.animate_image(&id, event, future.clone());
        Ok(Executed::Suspended(future))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_scoped_to_their_family() {
        let cases = [
            (ActionKind::Character(CharacterAction::Say(Sentence::from("hi"))), "character:say"),
            (ActionKind::Character(CharacterAction::Hide(NodeId(1))), "character:hide"),
            (ActionKind::Scene(SceneAction::Action(None)), "scene:action"),
            (ActionKind::Scene(SceneAction::SetBackground("bg".into())), "scene:setBackground"),
            (ActionKind::Scene(SceneAction::Sleep(Duration::from_secs(1))), "scene:sleep"),
            (ActionKind::Story(StoryAction::Action(None)), "story:action"),
            (ActionKind::Image(ImageAction::SetSrc("a.png".into())), "image:setSrc"),
            (ActionKind::Image(ImageAction::Show(Transform::default())), "image:show"),
            (ActionKind::Image(ImageAction::ApplyTransform(Transform::default())), "image:applyTransform"),
            (ActionKind::Condition(ConditionAction::Action), "condition:action"),
            (ActionKind::Script(ScriptAction::Action), "script:action"),
            (ActionKind::Menu(MenuAction::Action), "menu:action"),
            (ActionKind::Sound(SoundAction::Play), "sound:play"),
            (ActionKind::Sound(SoundAction::Stop), "sound:stop"),
        ];
        for (kind, tag) in cases {
            assert_eq!(kind.type_tag(), tag);
        }
    }

    #[test]
    fn to_data_wraps_node_content() {
        let action = Action::new(
            NodeId(12),
            ElementId(3),
            ActionKind::Character(CharacterAction::Say(Sentence::from("hello"))),
        );
        let data = action.to_data();
        assert_eq!(data.action_type, "character:say");
        assert_eq!(data.content.id, "12");
        assert_eq!(data.content.data, Some(action.kind.clone()));
    }

    #[test]
    fn menu_receiver_maps_choice() {
        let result = ActionResult::new("menu:action", NodeId(1));
        let future: Suspended = Awaitable::new(move |resolution: Resolution| match resolution {
            Resolution::Choose(index) => result.with_choice(index),
            Resolution::Continue => result,
        });
        future.resolve(Resolution::Choose(2)).unwrap();
        assert_eq!(future.result().unwrap().choice, Some(2));
    }

    #[test]
    fn action_data_serializes_type_field() {
        let action = Action::new(NodeId(4), ElementId(1), ActionKind::Sound(SoundAction::Stop));
        let text = ron::to_string(&action.to_data()).unwrap();
        assert!(text.contains("sound:stop"));
        assert!(text.contains("Stop"));
    }
}
