pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod locator;
pub mod marker;
pub mod platform;
pub mod reconcile;
pub mod render;
pub mod visibility;
