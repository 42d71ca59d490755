//! Per-profile secret storage on disk.
//!
//! `SecretStore` maps a profile id to `<root>/<profile_id>/secret.json` and
//! owns that file's lifecycle.  There is no caching: every call goes to the
//! filesystem.  Writers are not coordinated; the last `put` for a profile
//! wins.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use super::envelope::Envelope;
use crate::crypto::kdf::KdfParams;
use crate::errors::{Result, WgKeyError};

/// File name of the sealed secret inside a profile directory.
pub const SECRET_FILE_NAME: &str = "secret.json";

/// Longest accepted profile id.
const MAX_PROFILE_ID_LEN: usize = 64;

/// Whether the owner-only mode could be applied to a written secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionStatus {
    /// The file is `0600`.
    Restricted,
    /// The file was written but its mode could not be restricted.
    Unrestricted(String),
}

/// Result of a successful `put`.
#[derive(Debug, Clone)]
pub struct PutOutcome {
    pub path: PathBuf,
    pub permissions: PermissionStatus,
}

/// A listed profile that has a stored secret.
#[derive(Debug, Clone)]
pub struct StoredProfile {
    pub id: String,
    /// Recorded KDF name, or `None` if the envelope could not be parsed.
    pub kdf: Option<&'static str>,
    pub modified: Option<DateTime<Utc>>,
}

/// Filesystem-backed store of sealed secrets.
#[derive(Debug, Clone)]
pub struct SecretStore {
    root: PathBuf,
    kdf: KdfParams,
}

impl SecretStore {
    /// A store rooted at `root`, sealing new secrets with the default scrypt
    /// parameters.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            kdf: KdfParams::default(),
        }
    }

    /// Use `kdf` as the preferred derivation for future `put` calls.
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    /// Path of the secret file for `profile_id`.
    pub fn secret_path(&self, profile_id: &str) -> Result<PathBuf> {
        validate_profile_id(profile_id)?;
        Ok(self.root.join(profile_id).join(SECRET_FILE_NAME))
    }

    /// Whether a secret is stored for `profile_id`.  Invalid ids never exist.
    pub fn exists(&self, profile_id: &str) -> bool {
        self.secret_path(profile_id)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Seal `secret` under `password` and write it for `profile_id`,
    /// replacing any previous envelope.
    ///
    /// The write goes through a temp file in the same directory and a
    /// rename, so readers never see a half-written envelope.
    pub fn put(&self, profile_id: &str, secret: &[u8], password: &[u8]) -> Result<PutOutcome> {
        if password.is_empty() {
            return Err(WgKeyError::NoPassword);
        }
        let path = self.secret_path(profile_id)?;

        let envelope = Envelope::seal(secret, password, &self.kdf)?;
        let text = envelope.to_json()?;

        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;

        let tmp_path = parent.join(format!(".{SECRET_FILE_NAME}.tmp"));
        write_private(&tmp_path, text.as_bytes())?;
        let permissions = restrict_permissions(&tmp_path);
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        tracing::debug!(
            profile = profile_id,
            kdf = envelope.kdf.algorithm(),
            path = %path.display(),
            "stored secret"
        );

        Ok(PutOutcome { path, permissions })
    }

    /// Read and open the secret for `profile_id`.
    pub fn get(&self, profile_id: &str, password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        if password.is_empty() {
            return Err(WgKeyError::NoPassword);
        }
        let path = self.secret_path(profile_id)?;

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(WgKeyError::Missing(profile_id.to_string()));
            }
            Err(e) => {
                return Err(WgKeyError::Corrupt(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };

        let envelope = Envelope::from_json(&data)?;
        tracing::debug!(
            profile = profile_id,
            kdf = envelope.kdf.algorithm(),
            "opening stored secret"
        );
        envelope.open(password)
    }

    /// Like [`SecretStore::get`], decoded as text with surrounding
    /// whitespace removed.  Invalid UTF-8 is replaced rather than rejected.
    pub fn get_private_key(&self, profile_id: &str, password: &[u8]) -> Result<Zeroizing<String>> {
        let bytes = self.get(profile_id, password)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(Zeroizing::new(text.trim().to_string()))
    }

    /// Remove the secret for `profile_id`.  Removing nothing is not an error.
    pub fn delete(&self, profile_id: &str) -> Result<()> {
        let path = self.secret_path(profile_id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(profile = profile_id, "deleted secret");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Profiles under the root that have a stored secret, sorted by id.
    pub fn list(&self) -> Result<Vec<StoredProfile>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut profiles = Vec::new();
        for entry in entries {
            let entry = entry?;
            let Some(id) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if validate_profile_id(&id).is_err() {
                continue;
            }
            let path = entry.path().join(SECRET_FILE_NAME);
            if !path.is_file() {
                continue;
            }

            let kdf = fs::read(&path)
                .ok()
                .and_then(|data| Envelope::from_json(&data).ok())
                .map(|envelope| envelope.kdf.algorithm());
            let modified = fs::metadata(&path)
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from);

            profiles.push(StoredProfile { id, kdf, modified });
        }

        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(profiles)
    }
}

/// Validate that a profile id is safe to use as a single path component.
///
/// Allowed: ASCII letters, digits, underscores, hyphens, periods.
/// Must be non-empty, at most 64 characters, and not `.` or `..`.
pub fn validate_profile_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > MAX_PROFILE_ID_LEN || id == "." || id == ".." {
        return Err(WgKeyError::InvalidProfileId(id.to_string()));
    }
    if !id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
    {
        return Err(WgKeyError::InvalidProfileId(id.to_string()));
    }
    Ok(())
}

/// Create (or truncate) `path` and write `data`, asking for owner-only
/// permissions at creation on Unix.
fn write_private(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

/// Force the mode to `0600`.  Failure is reported, not fatal.
fn restrict_permissions(path: &Path) -> PermissionStatus {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
            Ok(()) => PermissionStatus::Restricted,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not restrict secret file permissions");
                PermissionStatus::Unrestricted(e.to_string())
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        PermissionStatus::Unrestricted("unsupported platform".to_string())
    }
}
