use thiserror::Error;

/// Invalid-input conditions in the block cipher and counter-mode layers.
///
/// Key and block lengths are fixed by the types on the hot paths, so these
/// only surface through the slice-taking constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CipherError {
    #[error("invalid AES key size: {0} bytes (expected 16, 24 or 32)")]
    InvalidKeySize(usize),

    #[error("invalid block size: {0} bytes (expected 16)")]
    InvalidBlockSize(usize),
}

/// Failures of the password-based key derivation step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KdfError {
    /// The primitive is not compiled into this build.  This is the only
    /// kind that allows falling back to another algorithm.
    #[error("{0} is not available in this build")]
    Unavailable(&'static str),

    #[error("invalid KDF parameters: {0}")]
    InvalidParams(String),

    #[error("key derivation failed: {0}")]
    Failed(String),
}

/// All errors that can occur in wgkey.
#[derive(Debug, Error)]
pub enum WgKeyError {
    // --- Envelope / store taxonomy ---
    #[error("a non-empty password is required")]
    NoPassword,

    #[error("no stored secret for profile '{0}'")]
    Missing(String),

    #[error("stored secret is corrupt: {0}")]
    Corrupt(String),

    #[error("authentication failed (wrong password or tampered data)")]
    BadPassword,

    #[error("decryption failed after successful authentication")]
    DecryptFailed,

    // --- Input validation ---
    #[error("invalid profile id '{0}'")]
    InvalidProfileId(String),

    // --- Crypto ---
    #[error(transparent)]
    Kdf(#[from] KdfError),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Config / serialization ---
    #[error("Config file error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl WgKeyError {
    /// Whether this error must be shown to users only as a generic
    /// "cannot retrieve key" message.
    ///
    /// Reporting which of these occurred would let an observer tell a wrong
    /// password apart from a tampered or missing file.
    pub fn is_retrieval_failure(&self) -> bool {
        matches!(
            self,
            Self::Missing(_) | Self::Corrupt(_) | Self::BadPassword | Self::DecryptFailed
        )
    }
}

/// Convenience type alias for wgkey results.
pub type Result<T> = std::result::Result<T, WgKeyError>;
