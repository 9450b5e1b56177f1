//! Fluent authoring API.
//!
//! `world.with(handle)` returns an [`Author`] that appends actions for one
//! element. The first failure sticks and is returned by whichever call ends
//! the chain, so scripts read top to bottom with a single `?`:
//!
//! ```ignore
//! let intro = world.with(alice).say("Hi!").say("Nice day.").take_actions()?;
//! ```

use std::time::Duration;

use crate::core::action::{
    ActionKind, CharacterAction, ConditionAction, ImageAction, MenuAction, SceneAction,
    ScriptAction, SoundAction,
};
use crate::core::error::GameError;
use crate::core::graph::Chain;
use crate::core::world::World;
use crate::elements::condition::Lambda;
use crate::elements::image::{ImagePosition, Transform};
use crate::elements::menu::Choice;
use crate::elements::{
    Character, Condition, ElementKind, Handle, Image, Menu, Scene, Script, Sound,
};
use crate::schema::id::{ElementId, NodeId};
use crate::schema::sentence::Sentence;

/// Elements that accumulate actions until they are taken.
pub trait Actionable {
    fn pending_mut(&mut self) -> &mut Vec<NodeId>;

    /// Drain the pending list. A second call returns nothing.
    fn take_actions(&mut self) -> Vec<NodeId> {
        std::mem::take(self.pending_mut())
    }
}

/// Elements that wrap a list of actions into one composite action.
pub trait Constructable {
    fn actions_mut(&mut self) -> &mut Vec<NodeId>;

    fn composite(chain: Option<Chain>) -> ActionKind;
}

pub struct Author<'w, T> {
    world: &'w mut World,
    handle: Handle<T>,
    error: Option<GameError>,
}

impl<'w, T: ElementKind> Author<'w, T> {
    pub(crate) fn new(world: &'w mut World, handle: Handle<T>) -> Self {
        let error = world
            .elements
            .typed::<T>(handle.id())
            .err()
            .map(GameError::from);
        Self {
            world,
            handle,
            error,
        }
    }

    pub fn handle(&self) -> Handle<T> {
        self.handle
    }

    /// The first error hit so far, if any.
    pub fn error(&self) -> Option<&GameError> {
        self.error.as_ref()
    }

    fn apply(mut self, f: impl FnOnce(&mut World, ElementId) -> Result<(), GameError>) -> Self {
        if self.error.is_none() {
            if let Err(err) = f(&mut *self.world, self.handle.id()) {
                tracing::debug!(error = %err, "authoring failed");
                self.error = Some(err);
            }
        }
        self
    }

    fn finish<R>(
        self,
        f: impl FnOnce(&mut World, ElementId) -> Result<R, GameError>,
    ) -> Result<R, GameError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        f(self.world, self.handle.id())
    }
}

impl<T: ElementKind + Actionable> Author<'_, T> {
    fn push(self, kind: ActionKind) -> Self {
        self.apply(|world, id| {
            let node = world.new_action(id, kind)?;
            world.elements.typed_mut::<T>(id)?.pending_mut().push(node);
            Ok(())
        })
    }

    pub fn take_actions(self) -> Result<Vec<NodeId>, GameError> {
        self.finish(|world, id| Ok(world.elements.typed_mut::<T>(id)?.take_actions()))
    }
}

impl<T: ElementKind + Constructable> Author<'_, T> {
    /// Flatten `lists`, link them into a chain owned by this element and
    /// return a composite action that runs the chain.
    pub fn action<L, I>(self, lists: L) -> Result<NodeId, GameError>
    where
        L: IntoIterator<Item = I>,
        I: IntoIterator<Item = NodeId>,
    {
        self.finish(|world, id| {
            let actions: Vec<NodeId> = lists.into_iter().flatten().collect();
            world
                .elements
                .typed_mut::<T>(id)?
                .actions_mut()
                .extend(actions.iter().copied());
            let chain = world.construct(&actions)?;
            let node = world.new_action(id, T::composite(chain))?;
            if let Some(chain) = chain {
                world.graph.set_parent(chain.head, Some(node))?;
            }
            Ok(node)
        })
    }
}

impl Author<'_, Character> {
    pub fn say(self, sentence: impl Into<Sentence>) -> Self {
        self.push(ActionKind::Character(CharacterAction::Say(sentence.into())))
    }

    /// Take down a line this character said earlier.
    pub fn hide_line(self, line: NodeId) -> Self {
        self.push(ActionKind::Character(CharacterAction::Hide(line)))
    }
}

impl Author<'_, Scene> {
    pub fn set_background(self, src: impl Into<String>) -> Self {
        self.push(ActionKind::Scene(SceneAction::SetBackground(src.into())))
    }

    pub fn sleep(self, duration: Duration) -> Self {
        self.push(ActionKind::Scene(SceneAction::Sleep(duration)))
    }
}

impl Author<'_, Image> {
    pub fn set_src(self, src: impl Into<String>) -> Self {
        self.push(ActionKind::Image(ImageAction::SetSrc(src.into())))
    }

    pub fn set_position(mut self, position: ImagePosition, transform: Transform) -> Self {
        if let Err(err) = position.validate() {
            if self.error.is_none() {
                self.error = Some(err.into());
            }
            return self;
        }
        self.push(ActionKind::Image(ImageAction::SetPosition(position, transform)))
    }

    pub fn show(self, transform: Transform) -> Self {
        self.push(ActionKind::Image(ImageAction::Show(transform)))
    }

    pub fn hide(self, transform: Transform) -> Self {
        self.push(ActionKind::Image(ImageAction::Hide(transform)))
    }

    pub fn apply_transform(self, transform: Transform) -> Self {
        self.push(ActionKind::Image(ImageAction::ApplyTransform(transform)))
    }
}

impl Author<'_, Sound> {
    pub fn play(self) -> Self {
        self.push(ActionKind::Sound(SoundAction::Play))
    }

    pub fn stop(self) -> Self {
        self.push(ActionKind::Sound(SoundAction::Stop))
    }
}

impl Author<'_, Script> {
    pub fn to_action(self) -> Result<NodeId, GameError> {
        self.finish(|world, id| world.new_action(id, ActionKind::Script(ScriptAction::Action)))
    }
}

impl Author<'_, Condition> {
    pub fn when<L, I>(self, predicate: Lambda, lists: L) -> Self
    where
        L: IntoIterator<Item = I>,
        I: IntoIterator<Item = NodeId>,
    {
        self.apply(|world, id| {
            let (actions, chain) = world.detached(lists)?;
            world
                .elements
                .typed_mut::<Condition>(id)?
                .set_if(predicate, actions, chain)?;
            Ok(())
        })
    }

    pub fn else_when<L, I>(self, predicate: Lambda, lists: L) -> Self
    where
        L: IntoIterator<Item = I>,
        I: IntoIterator<Item = NodeId>,
    {
        self.apply(|world, id| {
            let (actions, chain) = world.detached(lists)?;
            world
                .elements
                .typed_mut::<Condition>(id)?
                .push_else_if(predicate, actions, chain)?;
            Ok(())
        })
    }

    pub fn otherwise<L, I>(self, lists: L) -> Self
    where
        L: IntoIterator<Item = I>,
        I: IntoIterator<Item = NodeId>,
    {
        self.apply(|world, id| {
            let (actions, chain) = world.detached(lists)?;
            world
                .elements
                .typed_mut::<Condition>(id)?
                .set_else(actions, chain)?;
            Ok(())
        })
    }

    pub fn to_action(self) -> Result<NodeId, GameError> {
        self.finish(|world, id| world.new_action(id, ActionKind::Condition(ConditionAction::Action)))
    }
}

impl Author<'_, Menu> {
    pub fn choose<L, I>(self, prompt: impl Into<Sentence>, lists: L) -> Self
    where
        L: IntoIterator<Item = I>,
        I: IntoIterator<Item = NodeId>,
    {
        let prompt = prompt.into();
        self.apply(|world, id| {
            let (actions, chain) = world.detached(lists)?;
            world.elements.typed_mut::<Menu>(id)?.push_choice(Choice {
                prompt,
                actions,
                chain,
            });
            Ok(())
        })
    }

    pub fn to_action(self) -> Result<NodeId, GameError> {
        self.finish(|world, id| world.new_action(id, ActionKind::Menu(MenuAction::Action)))
    }
}
