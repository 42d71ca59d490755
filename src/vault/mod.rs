//! Vault module: sealed secret envelopes and their on-disk store.
//!
//! This module provides:
//! - The authenticated `Envelope` with `seal` / `open` (`envelope`)
//! - The JSON record format and canonical MAC input (`format`)
//! - The per-profile `SecretStore` (`store`)

pub mod envelope;
pub mod format;
pub mod store;

// Re-export the most commonly used items.
pub use envelope::Envelope;
pub use store::{PermissionStatus, PutOutcome, SecretStore, StoredProfile};
