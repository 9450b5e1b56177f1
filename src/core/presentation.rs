//! The contract between the interpreter and whatever draws the story.
//!
//! Every call that receives a [`Suspended`] future must eventually resolve
//! it; the interpreter stays blocked on that step until it does.

use std::collections::VecDeque;
use std::time::Duration;

use crate::core::action::{Action, Suspended};
use crate::core::awaitable::Resolution;
use crate::elements::image::{ImagePosition, Transform};
use crate::elements::{Image, Scene, Sound};
use crate::schema::id::NodeId;
use crate::schema::sentence::Sentence;

/// An image change the host is expected to animate.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageEvent {
    SetPosition(ImagePosition, Transform),
    Show(Transform),
    Hide(Transform),
    ApplyTransform(Transform),
}

impl ImageEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetPosition(..) => "setPosition",
            Self::Show(_) => "show",
            Self::Hide(_) => "hide",
            Self::ApplyTransform(_) => "applyTransform",
        }
    }
}

pub trait Presentation {
    /// Show a line. Resolve with [`Resolution::Continue`] once acknowledged.
    fn create_say(&mut self, node: NodeId, sentence: &Sentence, future: Suspended);

    /// Offer a choice. Resolve with [`Resolution::Choose`].
    fn create_menu(
        &mut self,
        node: NodeId,
        prompt: Option<&Sentence>,
        choices: &[Sentence],
        future: Suspended,
    );

    /// Remove a line shown by an earlier `create_say`.
    fn hide_say(&mut self, _node: NodeId) {}

    fn set_scene(&mut self, _scene: &Scene) {}

    fn set_background(&mut self, src: &str, future: Suspended);

    fn sleep(&mut self, duration: Duration, future: Suspended);

    /// Called once per image, before its first action runs.
    fn add_image(&mut self, _id: &str, _image: &Image) {}

    fn animate_image(&mut self, id: &str, event: ImageEvent, future: Suspended);

    /// `future` is present only for sounds the story waits on.
    fn play_sound(&mut self, sound: &Sound, future: Option<Suspended>);

    fn stop_sound(&mut self, _sound: &Sound) {}

    /// Notified of every action just before it executes.
    fn handle(&mut self, _action: &Action) {}
}

fn settle(future: &Suspended, resolution: Resolution) {
    if let Err(err) = future.resolve(resolution) {
        tracing::warn!(error = %err, "future resolved twice");
    }
}

/// A presentation with no screen: resolves everything at once and keeps a
/// plain-text transcript of what would have been shown.
#[derive(Debug, Default)]
pub struct Headless {
    transcript: Vec<String>,
    choices: VecDeque<usize>,
}

impl Headless {
    pub fn new() -> Self {
        Self::default()
    }

    /// Menu picks to answer with, in order. Menus beyond these pick 0.
    pub fn with_choices(mut self, choices: impl IntoIterator<Item = usize>) -> Self {
        self.choices.extend(choices);
        self
    }

    pub fn push_choice(&mut self, choice: usize) {
        self.choices.push_back(choice);
    }

    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Only the dialogue lines.
    pub fn lines(&self) -> Vec<&str> {
        self.transcript
            .iter()
            .filter_map(|entry| entry.strip_prefix("say "))
            .collect()
    }

    fn log(&mut self, entry: String) {
        tracing::trace!(%entry, "headless");
        self.transcript.push(entry);
    }
}

impl Presentation for Headless {
    fn create_say(&mut self, _node: NodeId, sentence: &Sentence, future: Suspended) {
        let entry = match &sentence.character {
            Some(name) => format!("say {}: {}", name, sentence),
            None => format!("say {}", sentence),
        };
        self.log(entry);
        settle(&future, Resolution::Continue);
    }

    fn create_menu(
        &mut self,
        _node: NodeId,
        prompt: Option<&Sentence>,
        choices: &[Sentence],
        future: Suspended,
    ) {
        let labels: Vec<String> = choices.iter().map(Sentence::plain_text).collect();
        let prompt = prompt.map(Sentence::plain_text).unwrap_or_default();
        let index = self.choices.pop_front().unwrap_or(0);
        self.log(format!("menu {} [{}] -> {}", prompt, labels.join(" | "), index));
        settle(&future, Resolution::Choose(index));
    }

    fn hide_say(&mut self, node: NodeId) {
        self.log(format!("hide {}", node));
    }

    fn set_scene(&mut self, scene: &Scene) {
        self.log(format!("scene {}", scene.name()));
    }

    fn set_background(&mut self, src: &str, future: Suspended) {
        self.log(format!("background {}", src));
        settle(&future, Resolution::Continue);
    }

    fn sleep(&mut self, duration: Duration, future: Suspended) {
        self.log(format!("sleep {}ms", duration.as_millis()));
        settle(&future, Resolution::Continue);
    }

    fn add_image(&mut self, id: &str, image: &Image) {
        self.log(format!("image {} as {}", image.name(), id));
    }

    fn animate_image(&mut self, id: &str, event: ImageEvent, future: Suspended) {
        self.log(format!("image {} {}", id, event.name()));
        settle(&future, Resolution::Continue);
    }

    fn play_sound(&mut self, sound: &Sound, future: Option<Suspended>) {
        self.log(format!("sound {} play", sound.name()));
        if let Some(future) = future {
            settle(&future, Resolution::Continue);
        }
    }

    fn stop_sound(&mut self, sound: &Sound) {
        self.log(format!("sound {} stop", sound.name()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::ActionResult;
    use crate::core::awaitable::Awaitable;

    fn future(node: u64) -> Suspended {
        let result = ActionResult::new("menu:action", NodeId(node));
        Awaitable::new(move |r: Resolution| match r {
            Resolution::Choose(i) => result.with_choice(i),
            Resolution::Continue => result,
        })
    }

    #[test]
    fn say_resolves_immediately() {
        let mut headless = Headless::new();
        let f = future(1);
        let mut line = Sentence::from("Hello");
        line.character = Some("Alice".to_string());
        headless.create_say(NodeId(1), &line, f.clone());
        assert!(f.is_solved());
        assert_eq!(headless.lines(), vec!["Alice: Hello"]);
    }

    #[test]
    fn menus_consume_queued_choices() {
        let mut headless = Headless::new().with_choices([1]);
        let choices = [Sentence::from("A"), Sentence::from("B")];

        let first = future(1);
        headless.create_menu(NodeId(1), None, &choices, first.clone());
        assert_eq!(first.result().unwrap().choice, Some(1));

        let second = future(2);
        headless.create_menu(NodeId(2), None, &choices, second.clone());
        assert_eq!(second.result().unwrap().choice, Some(0));
        assert_eq!(headless.transcript()[0], "menu  [A | B] -> 1");
    }
}
