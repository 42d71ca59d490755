use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{
    KdfParams, DEFAULT_PBKDF2_ITERATIONS, DEFAULT_SCRYPT_N, DEFAULT_SCRYPT_P, DEFAULT_SCRYPT_R,
};
use crate::errors::{Result, WgKeyError};

/// Application id used for the data directory name.
pub const APP_ID: &str = "wireguard.sysadmin";

/// Data directory name used by earlier releases.
const LEGACY_APP_ID: &str = "wireguard.davidv.dev";

/// Fallback home when neither `WIREGUARD_APP_HOME` nor `HOME` is set.
const DEFAULT_APP_HOME: &str = "/home/phablet";

/// Lowest scrypt work factor accepted from configuration.
const MIN_SCRYPT_N: u64 = 1024;

/// Lowest PBKDF2 iteration count accepted from configuration.
const MIN_PBKDF2_ITERATIONS: u32 = 10_000;

/// Which KDF new secrets are sealed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KdfChoice {
    Scrypt,
    Pbkdf2,
}

/// Application configuration, loaded from `wgkey.toml`.
///
/// Every field has a sensible default so wgkey works without any config
/// file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding one sub-directory per profile.  When unset it is
    /// derived from the application home.
    #[serde(default)]
    pub profiles_dir: Option<PathBuf>,

    /// KDF for newly stored secrets (default: scrypt).
    #[serde(default = "default_kdf")]
    pub kdf: KdfChoice,

    /// scrypt work factor, a power of two (default: 16384).
    #[serde(default = "default_scrypt_n")]
    pub scrypt_n: u64,

    /// scrypt block size (default: 8).
    #[serde(default = "default_scrypt_r")]
    pub scrypt_r: u32,

    /// scrypt parallelism (default: 1).
    #[serde(default = "default_scrypt_p")]
    pub scrypt_p: u32,

    /// PBKDF2 iteration count when `kdf = "pbkdf2"` (default: 200000).
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,

    /// Log filter used when `RUST_LOG` is not set (default: "warn").
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_kdf() -> KdfChoice {
    KdfChoice::Scrypt
}

fn default_scrypt_n() -> u64 {
    DEFAULT_SCRYPT_N
}

fn default_scrypt_r() -> u32 {
    DEFAULT_SCRYPT_R
}

fn default_scrypt_p() -> u32 {
    DEFAULT_SCRYPT_P
}

fn default_pbkdf2_iterations() -> u32 {
    DEFAULT_PBKDF2_ITERATIONS
}

fn default_log_level() -> String {
    "warn".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            profiles_dir: None,
            kdf: default_kdf(),
            scrypt_n: default_scrypt_n(),
            scrypt_r: default_scrypt_r(),
            scrypt_p: default_scrypt_p(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Name of the config file inside the application data directory.
    pub const FILE_NAME: &'static str = "wgkey.toml";

    /// Load settings from `path`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            WgKeyError::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;

        Ok(settings)
    }

    /// Default config file location: `<data_dir>/wgkey.toml`.
    pub fn default_path(app_home: &Path) -> PathBuf {
        data_dir(app_home, APP_ID).join(Self::FILE_NAME)
    }

    /// Resolve the profiles directory.
    ///
    /// An explicit `profiles_dir` wins.  Otherwise the current data
    /// directory is used, unless only the legacy one exists.
    pub fn profiles_dir(&self, app_home: &Path) -> PathBuf {
        if let Some(dir) = &self.profiles_dir {
            return dir.clone();
        }

        let current = data_dir(app_home, APP_ID);
        let legacy = data_dir(app_home, LEGACY_APP_ID);
        if !current.exists() && legacy.exists() {
            tracing::debug!(path = %legacy.display(), "using legacy data directory");
            return legacy.join("profiles");
        }
        current.join("profiles")
    }

    /// Convert the KDF settings into crypto-layer params, enforcing
    /// minimum costs.
    pub fn kdf_params(&self) -> Result<KdfParams> {
        let params = match self.kdf {
            KdfChoice::Scrypt => {
                if self.scrypt_n < MIN_SCRYPT_N {
                    return Err(WgKeyError::Config(format!(
                        "scrypt_n must be at least {MIN_SCRYPT_N} (got {})",
                        self.scrypt_n
                    )));
                }
                KdfParams::scrypt(self.scrypt_n, self.scrypt_r, self.scrypt_p)
            }
            KdfChoice::Pbkdf2 => {
                if self.pbkdf2_iterations < MIN_PBKDF2_ITERATIONS {
                    return Err(WgKeyError::Config(format!(
                        "pbkdf2_iterations must be at least {MIN_PBKDF2_ITERATIONS} (got {})",
                        self.pbkdf2_iterations
                    )));
                }
                KdfParams::pbkdf2(self.pbkdf2_iterations)
            }
        };

        params
            .validate()
            .map_err(|e| WgKeyError::Config(e.to_string()))?;
        Ok(params)
    }
}

/// The application home: `$WIREGUARD_APP_HOME`, else `$HOME`, else the
/// device default.
pub fn app_home() -> PathBuf {
    std::env::var_os("WIREGUARD_APP_HOME")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_APP_HOME))
}

fn data_dir(app_home: &Path, app_id: &str) -> PathBuf {
    app_home.join(".local").join("share").join(app_id)
}

// ── Tests ────────────────────────────────────────────────────────────
