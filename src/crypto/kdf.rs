//! Password-based key derivation.
//!
//! scrypt is the primary algorithm; PBKDF2-HMAC-SHA256 is the fallback for
//! builds without the `scrypt` feature.  Both produce 64 bytes: the first
//! half becomes the encryption key and the second half the MAC key.
//!
//! The algorithm and cost parameters actually used are always returned so
//! they can be stored next to the ciphertext.  Re-deriving at read time goes
//! through [`derive_exact`], which never substitutes defaults.

use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::KdfError;

/// Length of the salt in bytes.
pub const SALT_LEN: usize = 16;

/// Length of each derived key in bytes.
pub const KEY_LEN: usize = 32;

/// Total derived output: encryption key followed by MAC key.
const OUTPUT_LEN: usize = 2 * KEY_LEN;

pub const DEFAULT_SCRYPT_N: u64 = 1 << 14;
pub const DEFAULT_SCRYPT_R: u32 = 8;
pub const DEFAULT_SCRYPT_P: u32 = 1;
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 200_000;

/// Upper bound on scrypt memory (128 * r * (n + p) bytes).  Stored parameters
/// come from disk, so they are bounded before any allocation happens.
const MAX_SCRYPT_MEMORY: u128 = 1 << 30;

/// Upper bound on scrypt parallelism.  Work grows linearly with `p`.
const MAX_SCRYPT_P: u32 = 16;

/// Upper bound on PBKDF2 iterations accepted from storage.
const MAX_PBKDF2_ITERATIONS: u32 = 10_000_000;

/// Algorithm choice together with its cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdfParams {
    /// scrypt with work factor `n` (a power of two), block size `r` and
    /// parallelism `p`.
    Scrypt { n: u64, r: u32, p: u32 },
    /// PBKDF2-HMAC-SHA256 with the given iteration count.
    Pbkdf2 { iterations: u32 },
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::Scrypt {
            n: DEFAULT_SCRYPT_N,
            r: DEFAULT_SCRYPT_R,
            p: DEFAULT_SCRYPT_P,
        }
    }
}

impl KdfParams {
    pub fn scrypt(n: u64, r: u32, p: u32) -> Self {
        Self::Scrypt { n, r, p }
    }

    pub fn pbkdf2(iterations: u32) -> Self {
        Self::Pbkdf2 { iterations }
    }

    /// Name recorded in the envelope's `kdf` field.
    pub fn algorithm(&self) -> &'static str {
        match self {
            Self::Scrypt { .. } => "scrypt",
            Self::Pbkdf2 { .. } => "pbkdf2",
        }
    }

    /// Check structural validity and resource bounds.
    pub fn validate(&self) -> Result<(), KdfError> {
        match *self {
            Self::Scrypt { n, r, p } => {
                if n < 2 || !n.is_power_of_two() {
                    return Err(KdfError::InvalidParams(format!(
                        "scrypt n must be a power of two greater than 1 (got {n})"
                    )));
                }
                if r == 0 || p == 0 {
                    return Err(KdfError::InvalidParams(format!(
                        "scrypt r and p must be at least 1 (got r={r}, p={p})"
                    )));
                }
                if p > MAX_SCRYPT_P {
                    return Err(KdfError::InvalidParams(format!(
                        "scrypt p must be at most {MAX_SCRYPT_P} (got {p})"
                    )));
                }
                // scrypt requires n < 2^(16 * r).
                if u64::from(n.trailing_zeros()) >= 16 * u64::from(r) {
                    return Err(KdfError::InvalidParams(format!(
                        "scrypt n={n} is too large for r={r}"
                    )));
                }
                let memory = 128 * u128::from(r) * (u128::from(n) + u128::from(p));
                if memory > MAX_SCRYPT_MEMORY {
                    return Err(KdfError::InvalidParams(format!(
                        "scrypt n={n}, r={r}, p={p} needs {memory} bytes, above the {MAX_SCRYPT_MEMORY} byte limit"
                    )));
                }
                Ok(())
            }
            Self::Pbkdf2 { iterations } => {
                if iterations == 0 || iterations > MAX_PBKDF2_ITERATIONS {
                    return Err(KdfError::InvalidParams(format!(
                        "pbkdf2 iterations must be between 1 and {MAX_PBKDF2_ITERATIONS} (got {iterations})"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Encryption and MAC keys split from one derivation.  Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeys {
    encryption: [u8; KEY_LEN],
    mac: [u8; KEY_LEN],
}

impl DerivedKeys {
    fn split(output: &[u8; OUTPUT_LEN]) -> Self {
        let mut encryption = [0u8; KEY_LEN];
        let mut mac = [0u8; KEY_LEN];
        encryption.copy_from_slice(&output[..KEY_LEN]);
        mac.copy_from_slice(&output[KEY_LEN..]);
        Self { encryption, mac }
    }

    pub fn encryption_key(&self) -> &[u8; KEY_LEN] {
        &self.encryption
    }

    pub fn mac_key(&self) -> &[u8; KEY_LEN] {
        &self.mac
    }
}

/// Derive keys with `preferred`, falling back to PBKDF2 with the default
/// iteration count only when the preferred primitive is not compiled in.
///
/// Returns the keys and the parameters that produced them.
pub fn derive(
    password: &[u8],
    salt: &[u8],
    preferred: &KdfParams,
) -> Result<(DerivedKeys, KdfParams), KdfError> {
    match derive_exact(password, salt, preferred) {
        Ok(keys) => Ok((keys, *preferred)),
        Err(KdfError::Unavailable(name)) => {
            let fallback = KdfParams::pbkdf2(DEFAULT_PBKDF2_ITERATIONS);
            tracing::warn!(
                unavailable = name,
                iterations = DEFAULT_PBKDF2_ITERATIONS,
                "falling back to pbkdf2"
            );
            let keys = derive_exact(password, salt, &fallback)?;
            Ok((keys, fallback))
        }
        Err(e) => Err(e),
    }
}

/// Derive keys with exactly `params`.  No fallback, no defaults.
pub fn derive_exact(
    password: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<DerivedKeys, KdfError> {
    params.validate()?;

    let mut output = [0u8; OUTPUT_LEN];
    let result = match *params {
        KdfParams::Scrypt { n, r, p } => scrypt_into(password, salt, n, r, p, &mut output),
        KdfParams::Pbkdf2 { iterations } => {
            pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut output);
            Ok(())
        }
    };

    let keys = result.map(|()| DerivedKeys::split(&output));
    output.zeroize();
    keys
}

#[cfg(feature = "scrypt")]
fn scrypt_into(
    password: &[u8],
    salt: &[u8],
    n: u64,
    r: u32,
    p: u32,
    output: &mut [u8; OUTPUT_LEN],
) -> Result<(), KdfError> {
    // `validate` guarantees n is a power of two, so this is exact.
    let log_n = n.trailing_zeros() as u8;
    let params = scrypt::Params::new(log_n, r, p, OUTPUT_LEN)
        .map_err(|e| KdfError::InvalidParams(format!("scrypt: {e}")))?;
    scrypt::scrypt(password, salt, &params, output)
        .map_err(|e| KdfError::Failed(format!("scrypt: {e}")))
}

#[cfg(not(feature = "scrypt"))]
fn scrypt_into(
    _password: &[u8],
    _salt: &[u8],
    _n: u64,
    _r: u32,
    _p: u32,
    _output: &mut [u8; OUTPUT_LEN],
) -> Result<(), KdfError> {
    Err(KdfError::Unavailable("scrypt"))
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
