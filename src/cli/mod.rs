//! CLI command handlers

pub mod commands;

pub use commands::{bind, text, types};
