//! AES in counter mode.
//!
//! The 128-bit counter starts at the nonce (read big-endian) and is
//! incremented modulo 2^128 after every keystream block.  Each 16-byte
//! chunk of input consumes one fresh keystream block; when the last chunk
//! is short, the rest of that block is thrown away, so a following call
//! starts on a new counter value.
//!
//! Encryption and decryption are the same operation.

use rand::RngCore;

use super::aes::{Aes, Tables, BLOCK_SIZE};
use crate::errors::CipherError;

/// Length of the nonce that seeds the counter.
pub const NONCE_LEN: usize = 16;

/// A keystream generator over one key and counter.
pub struct Ctr<'t> {
    cipher: Aes<'t>,
    counter: u128,
}

impl Ctr<'static> {
    /// Build a stream seeded from `nonce`.
    pub fn new(key: &[u8], nonce: &[u8; NONCE_LEN]) -> Result<Self, CipherError> {
        Self::with_counter(key, u128::from_be_bytes(*nonce))
    }

    /// Build a stream starting at an explicit counter value.
    pub fn with_counter(key: &[u8], initial_counter: u128) -> Result<Self, CipherError> {
        Ok(Self {
            cipher: Aes::new(key)?,
            counter: initial_counter,
        })
    }
}

impl<'t> Ctr<'t> {
    /// Build a stream whose cipher reads from a caller-owned table set.
    pub fn with_tables(
        key: &[u8],
        initial_counter: u128,
        tables: &'t Tables,
    ) -> Result<Self, CipherError> {
        Ok(Self {
            cipher: Aes::with_tables(key, tables)?,
            counter: initial_counter,
        })
    }

    /// The counter value the next keystream block will be generated from.
    pub fn counter(&self) -> u128 {
        self.counter
    }

    /// XOR `data` with the keystream, returning a new buffer.
    pub fn apply(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        self.apply_in_place(&mut out);
        out
    }

    /// XOR `data` with the keystream in place.
    pub fn apply_in_place(&mut self, data: &mut [u8]) {
        for chunk in data.chunks_mut(BLOCK_SIZE) {
            let keystream = self.next_block();
            for (byte, k) in chunk.iter_mut().zip(keystream.iter()) {
                *byte ^= k;
            }
        }
    }

    fn next_block(&mut self) -> [u8; BLOCK_SIZE] {
        // `to_be_bytes` on a u128 is the high 64-bit half followed by the
        // low half, both big-endian.
        let block = self.counter.to_be_bytes();
        self.counter = self.counter.wrapping_add(1);
        self.cipher.encrypt_block(&block)
    }
}

/// Generate a random 16-byte nonce.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);
    nonce
}
