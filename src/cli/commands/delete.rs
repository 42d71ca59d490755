//! `wgkey delete` — remove a profile's stored private key.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::config::Settings;
use crate::errors::{Result, WgKeyError};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, settings: &Settings, profile: &str, force: bool) -> Result<()> {
    let store = open_store(cli, settings)?;

    if !store.exists(profile) {
        // Deleting nothing still validates the id and succeeds.
        store.delete(profile)?;
        output::info(&format!("No stored private key for '{profile}'"));
        return Ok(());
    }

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete the private key for '{profile}'?"))
            .default(false)
            .interact()
            .map_err(|e| WgKeyError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    store.delete(profile)?;
    output::success(&format!("Deleted private key for '{profile}'"));

    Ok(())
}
