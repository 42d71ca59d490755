//! One module per `wgkey` subcommand.

pub mod completions;
pub mod delete;
pub mod exists;
pub mod get;
pub mod list;
pub mod put;
pub mod render;
