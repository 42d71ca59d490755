//! Authenticated secret envelope: encrypt-then-MAC.
//!
//! `seal` derives an encryption key and a MAC key from the password and a
//! fresh salt, encrypts the secret with AES-256-CTR under a fresh nonce, and
//! tags the canonical `kdf | params | salt | nonce | ciphertext` bytes with
//! HMAC-SHA256.
//!
//! `open` re-derives both keys from the stored salt and parameters, checks
//! the tag in constant time, and only then runs the keystream.  Plaintext
//! never exists for an envelope whose tag did not verify.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::format::{self, CURRENT_VERSION};
use crate::crypto::ctr::{generate_nonce, Ctr, NONCE_LEN};
use crate::crypto::kdf::{self, generate_salt, KdfParams, SALT_LEN};
use crate::errors::{Result, WgKeyError};

/// Length of the HMAC-SHA256 tag.
pub const TAG_LEN: usize = 32;

/// One sealed secret, as held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub version: u32,
    pub kdf: KdfParams,
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

impl Envelope {
    /// Encrypt and authenticate `secret` under `password`.
    ///
    /// `kdf` is the preferred derivation; the envelope records whatever was
    /// actually used (see [`kdf::derive`]).
    pub fn seal(secret: &[u8], password: &[u8], kdf: &KdfParams) -> Result<Self> {
        if password.is_empty() {
            return Err(WgKeyError::NoPassword);
        }

        let salt = generate_salt();
        let nonce = generate_nonce();
        let (keys, effective) = kdf::derive(password, &salt, kdf)?;

        let mut stream = Ctr::new(keys.encryption_key(), &nonce)
            .map_err(|e| WgKeyError::CommandFailed(format!("cipher setup: {e}")))?;
        let ciphertext = stream.apply(secret);

        let tag = compute_tag(keys.mac_key(), &effective, &salt, &nonce, &ciphertext)?;

        Ok(Self {
            version: CURRENT_VERSION,
            kdf: effective,
            salt,
            nonce,
            ciphertext,
            tag,
        })
    }

    /// Verify the tag and recover the secret.
    pub fn open(&self, password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        if password.is_empty() {
            return Err(WgKeyError::NoPassword);
        }
        if self.version != CURRENT_VERSION {
            return Err(WgKeyError::Corrupt(format!(
                "unsupported version {}",
                self.version
            )));
        }

        // The parameters came from disk; anything the KDF refuses is damage.
        let keys = kdf::derive_exact(password, &self.salt, &self.kdf)
            .map_err(|e| WgKeyError::Corrupt(format!("stored kdf parameters: {e}")))?;

        let expected = compute_tag(
            keys.mac_key(),
            &self.kdf,
            &self.salt,
            &self.nonce,
            &self.ciphertext,
        )?;
        if !bool::from(expected.as_slice().ct_eq(self.tag.as_slice())) {
            return Err(WgKeyError::BadPassword);
        }

        let mut stream = Ctr::new(keys.encryption_key(), &self.nonce)
            .map_err(|_| WgKeyError::DecryptFailed)?;
        let mut plaintext = Zeroizing::new(self.ciphertext.clone());
        stream.apply_in_place(&mut plaintext);
        Ok(plaintext)
    }

    /// Serialize to the stored JSON text.
    pub fn to_json(&self) -> Result<String> {
        format::encode(self)
    }

    /// Parse stored JSON text.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        format::decode(data)
    }
}

fn compute_tag(
    mac_key: &[u8],
    kdf: &KdfParams,
    salt: &[u8],
    nonce: &[u8],
    ciphertext: &[u8],
) -> Result<[u8; TAG_LEN]> {
    let mut mac = Hmac::<Sha256>::new_from_slice(mac_key)
        .map_err(|e| WgKeyError::CommandFailed(format!("invalid HMAC key: {e}")))?;
    mac.update(&format::mac_input(kdf, salt, nonce, ciphertext));
    Ok(mac.finalize().into_bytes().into())
}
