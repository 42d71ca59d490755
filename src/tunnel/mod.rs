//! WireGuard tunnel configuration built from a stored profile.

pub mod config;

pub use config::{render, Peer, Profile};
