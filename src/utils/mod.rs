pub mod config;
pub mod env;
pub mod error;
pub mod expansion;
pub mod render;
