pub mod app;
pub mod config;
pub mod dataset;
pub mod graph;
pub mod layout;
pub mod render;
pub mod util;
