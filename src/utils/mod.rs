//! Utility modules shared across commands.

pub mod command;
pub mod date;
pub mod minify;
