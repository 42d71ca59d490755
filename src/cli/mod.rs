//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::{app_home, Settings};
use crate::errors::{Result, WgKeyError};
use crate::vault::SecretStore;

/// Environment variable consulted first for the store password.
pub const PASSWORD_ENV: &str = "WGKEY_PASSWORD";

/// wgkey: password-protected storage for WireGuard private keys.
#[derive(Parser)]
#[command(
    name = "wgkey",
    about = "Password-protected storage for WireGuard private keys",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Profiles directory (overrides the config file)
    #[arg(long, global = true, env = "WGKEY_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to wgkey.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Store (or replace) a profile's private key
    Put {
        /// Profile id
        profile: String,
        /// Read the private key from this file instead of prompting
        #[arg(long)]
        key_file: Option<PathBuf>,
    },

    /// Print a profile's private key
    Get {
        /// Profile id
        profile: String,
    },

    /// Delete a profile's stored private key
    Delete {
        /// Profile id
        profile: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Check whether a profile has a stored private key
    Exists {
        /// Profile id
        profile: String,
    },

    /// List profiles with stored private keys
    List,

    /// Print the WireGuard configuration for a profile
    Render {
        /// Profile id
        profile: String,
        /// Profile description (JSON)
        #[arg(long)]
        profile_file: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load settings from `--config`, or from the default location.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => Settings::default_path(&app_home()),
    };
    Settings::load(&path)
}

/// Build the secret store from CLI flags and settings.
pub fn open_store(cli: &Cli, settings: &Settings) -> Result<SecretStore> {
    let root = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => settings.profiles_dir(&app_home()),
    };
    Ok(SecretStore::new(root).with_kdf(settings.kdf_params()?))
}

/// Get the store password, trying in order:
/// 1. `WGKEY_PASSWORD` env var
/// 2. One line from stdin, when stdin is not a terminal
/// 3. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env_or_stdin()? {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter key password")
        .interact()
        .map_err(|e| WgKeyError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation (used by `put`).
///
/// Non-interactive sources are used as-is, like [`prompt_password`].
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env_or_stdin()? {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Choose key password")
        .with_confirmation(
            "Confirm key password",
            "Passwords do not match, try again",
        )
        .interact()
        .map_err(|e| WgKeyError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

fn password_from_env_or_stdin() -> Result<Option<Zeroizing<String>>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Some(Zeroizing::new(pw)));
        }
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut line = Zeroizing::new(String::new());
    stdin.lock().read_line(&mut line)?;
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.is_empty() {
        return Err(WgKeyError::NoPassword);
    }
    Ok(Some(Zeroizing::new(trimmed.to_string())))
}
