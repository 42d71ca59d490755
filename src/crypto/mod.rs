//! Cryptographic primitives for wgkey.
//!
//! This module provides:
//! - The AES block cipher, encryption direction only (`aes`)
//! - AES counter-mode keystream (`ctr`)
//! - scrypt / PBKDF2 password-based key derivation (`kdf`)

pub mod aes;
pub mod ctr;
pub mod kdf;

pub use aes::{Aes, Tables, TABLES};
pub use ctr::{generate_nonce, Ctr};
pub use kdf::{derive, derive_exact, generate_salt, DerivedKeys, KdfParams};
