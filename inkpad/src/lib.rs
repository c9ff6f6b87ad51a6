#![warn(clippy::pedantic)]

pub mod config;
pub mod editor;
pub mod render;
pub mod tools;

pub use editor::Editor;
