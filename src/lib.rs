pub mod app;
pub mod canvas;
pub mod clip;
pub mod config;
pub mod data;
pub mod error;
pub mod flags;
pub mod geo;
pub mod image_cache;
pub mod map;
pub mod render;
pub mod resolver;
pub mod selection;
pub mod ui;

#[cfg(test)]
mod test_support;
