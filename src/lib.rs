pub mod config;
pub mod cuts;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod guillotine;
pub mod layout;
pub mod pattern;
pub mod render;
pub mod snap;
pub mod types;
pub mod validate;
