pub mod input;
pub mod playtest;
pub mod render;
pub mod save;
pub mod session;
pub mod settings;
pub mod tetris_core;
