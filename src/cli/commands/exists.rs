//! `wgkey exists` — report whether a profile has a stored private key.

use crate::cli::{open_store, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `exists` command.  Returns whether the key exists so the
/// caller can set the exit status.
pub fn execute(cli: &Cli, settings: &Settings, profile: &str) -> Result<bool> {
    let store = open_store(cli, settings)?;
    let exists = store.exists(profile);
    println!("{}", if exists { "yes" } else { "no" });
    Ok(exists)
}
