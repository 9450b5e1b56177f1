pub mod action;
pub mod awaitable;
pub mod builder;
pub mod config;
pub mod error;
pub mod game;
pub mod graph;
pub mod persist;
pub mod presentation;
pub mod store;
pub mod transaction;
pub mod world;
