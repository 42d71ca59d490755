//! `wgkey put` — store (or replace) a profile's private key.

use std::fs;
use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{open_store, prompt_new_password, Cli};
use crate::config::Settings;
use crate::errors::{Result, WgKeyError};
use crate::vault::PermissionStatus;

/// Execute the `put` command.
pub fn execute(cli: &Cli, settings: &Settings, profile: &str, key_file: Option<&Path>) -> Result<()> {
    let store = open_store(cli, settings)?;

    // Determine the private key from one of two sources.
    let private_key = match key_file {
        // Source 1: A file (e.g. the output of `wg genkey`).
        Some(path) => {
            let data = Zeroizing::new(fs::read(path)?);
            Zeroizing::new(String::from_utf8_lossy(&data).trim().to_string())
        }
        // Source 2: Interactive secure prompt (default).
        None => Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt(format!("Private key for {profile}"))
                .interact()
                .map_err(|e| WgKeyError::CommandFailed(format!("input prompt: {e}")))?,
        ),
    };

    if private_key.is_empty() {
        return Err(WgKeyError::CommandFailed("private key is empty".into()));
    }

    let replaced = store.exists(profile);
    let password = prompt_new_password()?;
    let outcome = store.put(profile, private_key.as_bytes(), password.as_bytes())?;

    if let PermissionStatus::Unrestricted(reason) = &outcome.permissions {
        output::warning(&format!(
            "Could not restrict permissions on {}: {reason}",
            outcome.path.display()
        ));
    }

    let verb = if replaced { "replaced" } else { "stored" };
    output::success(&format!("Private key for '{profile}' {verb}"));
    output::tip("The same password is needed to bring the tunnel up.");

    Ok(())
}
