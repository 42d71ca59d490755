//! Application configuration (`wgkey.toml`).

pub mod settings;

pub use settings::{app_home, KdfChoice, Settings};
