//! Narrative Script: fluent scene authoring and a resumable interpreter
//! for visual-novel style stories.
//!
//! Stories are authored against a [`World`](core::world::World) as chains of
//! actions owned by elements (characters, scenes, images, sounds, scripts,
//! conditions and menus). A [`Game`](core::game::Game) then steps through
//! the resulting action graph one action at a time, pausing on futures the
//! presentation layer resolves and splicing in branches as conditions and
//! menus pick them. Every element mutation is recorded so steps can be
//! undone, and the store can be saved to and restored from RON files.

pub mod core;
pub mod elements;
pub mod schema;

pub use crate::core::error::GameError;
pub use crate::core::game::{Game, LiveGame, Step};
pub use crate::core::world::World;
