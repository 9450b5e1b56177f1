pub mod id;
pub mod saved_game;
pub mod sentence;
pub mod value;
