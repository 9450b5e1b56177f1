//! Scripted elements: the things actions act on.
//!
//! Elements live in the world's [`Elements`] registry and are addressed by
//! typed [`Handle`]s. Each stateful element embeds a
//! [`Stateful`](crate::core::transaction::Stateful) so its runtime mutations
//! can be undone.

pub mod character;
pub mod condition;
pub mod image;
pub mod menu;
pub mod scene;
pub mod script;
pub mod sound;
pub mod story;

use rustc_hash::FxHashMap;
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

use crate::core::store::Storable;
use crate::core::transaction::TransactionError;
use crate::schema::id::ElementId;

pub use character::Character;
pub use condition::Condition;
pub use image::Image;
pub use menu::Menu;
pub use scene::Scene;
pub use script::Script;
pub use sound::Sound;
pub use story::Story;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementError {
    #[error("element not found: {0}")]
    NotFound(ElementId),
    #[error("element {id} is a {found}, expected {expected}")]
    WrongKind {
        id: ElementId,
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid element config: {0}")]
    InvalidConfig(String),
}

/// Compensation returned by scripts and predicates, run on undo.
pub type Cleaner = Box<dyn FnOnce(&mut Storable)>;

#[derive(Debug)]
pub enum Element {
    Character(Character),
    Image(Image),
    Sound(Sound),
    Scene(Scene),
    Story(Story),
    Script(Script),
    Condition(Condition),
    Menu(Menu),
}

impl Element {
    pub fn id(&self) -> ElementId {
        match self {
            Self::Character(e) => e.id(),
            Self::Image(e) => e.id(),
            Self::Sound(e) => e.id(),
            Self::Scene(e) => e.id(),
            Self::Story(e) => e.id(),
            Self::Script(e) => e.id(),
            Self::Condition(e) => e.id(),
            Self::Menu(e) => e.id(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Character(_) => Character::KIND,
            Self::Image(_) => Image::KIND,
            Self::Sound(_) => Sound::KIND,
            Self::Scene(_) => Scene::KIND,
            Self::Story(_) => Story::KIND,
            Self::Script(_) => Script::KIND,
            Self::Condition(_) => Condition::KIND,
            Self::Menu(_) => Menu::KIND,
        }
    }

    /// Number of commits in the element's transaction log.
    pub fn commits(&self) -> usize {
        match self {
            Self::Character(e) => e.stateful.transaction().len(),
            Self::Image(e) => e.stateful.transaction().len(),
            Self::Sound(e) => e.stateful.transaction().len(),
            Self::Scene(e) => e.stateful.transaction().len(),
            Self::Story(_) => 0,
            Self::Script(e) => e.stateful.transaction().len(),
            Self::Condition(e) => e.stateful.transaction().len(),
            Self::Menu(e) => e.stateful.transaction().len(),
        }
    }

    /// Undo the element's latest commit.
    pub fn undo(&mut self, store: &mut Storable) -> Result<usize, TransactionError> {
        match self {
            Self::Character(e) => e.stateful.undo(None, store),
            Self::Image(e) => e.stateful.undo(None, store),
            Self::Sound(e) => e.stateful.undo(None, store),
            Self::Scene(e) => e.stateful.undo(None, store),
            Self::Story(_) => Err(TransactionError::InvalidToken { token: 0, len: 0 }),
            Self::Script(e) => e.stateful.undo(None, store),
            Self::Condition(e) => e.stateful.undo(None, store),
            Self::Menu(e) => e.stateful.undo(None, store),
        }
    }
}

/// Typed access into [`Element`].
pub trait ElementKind: Sized + 'static {
    const KIND: &'static str;

    fn id(&self) -> ElementId;
    fn from_ref(element: &Element) -> Option<&Self>;
    fn from_mut(element: &mut Element) -> Option<&mut Self>;
    fn into_element(self) -> Element;
}

macro_rules! element_kind {
    ($($ty:ident => $tag:literal),* $(,)?) => {
        $(
            impl ElementKind for $ty {
                const KIND: &'static str = $tag;

                fn id(&self) -> ElementId {
                    self.id
                }

                fn from_ref(element: &Element) -> Option<&Self> {
                    match element {
                        Element::$ty(e) => Some(e),
                        _ => None,
                    }
                }

                fn from_mut(element: &mut Element) -> Option<&mut Self> {
                    match element {
                        Element::$ty(e) => Some(e),
                        _ => None,
                    }
                }

                fn into_element(self) -> Element {
                    Element::$ty(self)
                }
            }
        )*
    };
}

element_kind! {
    Character => "character",
    Image => "image",
    Sound => "sound",
    Scene => "scene",
    Story => "story",
    Script => "script",
    Condition => "condition",
    Menu => "menu",
}

/// A typed reference to an element owned by a world.
pub struct Handle<T> {
    id: ElementId,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(id: ElementId) -> Self {
        Self {
            id,
            _kind: PhantomData,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T: ElementKind> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle<{}>({})", T::KIND, self.id)
    }
}

/// Registry of every element in a world.
#[derive(Debug, Default)]
pub struct Elements {
    map: FxHashMap<ElementId, Element>,
}

impl Elements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: ElementKind>(&mut self, element: T) -> Handle<T> {
        let id = element.id();
        self.map.insert(id, element.into_element());
        Handle::new(id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.map.get(&id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.map.get_mut(&id)
    }

    pub fn typed<T: ElementKind>(&self, id: ElementId) -> Result<&T, ElementError> {
        let element = self.map.get(&id).ok_or(ElementError::NotFound(id))?;
        let found = element.kind();
        T::from_ref(element).ok_or(ElementError::WrongKind {
            id,
            expected: T::KIND,
            found,
        })
    }

    pub fn typed_mut<T: ElementKind>(&mut self, id: ElementId) -> Result<&mut T, ElementError> {
        let element = self.map.get_mut(&id).ok_or(ElementError::NotFound(id))?;
        let found = element.kind();
        T::from_mut(element).ok_or(ElementError::WrongKind {
            id,
            expected: T::KIND,
            found,
        })
    }

    pub fn resolve<T: ElementKind>(&self, handle: Handle<T>) -> Result<&T, ElementError> {
        self.typed(handle.id())
    }
}
