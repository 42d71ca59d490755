//! `wgkey get` — retrieve and print a profile's private key.

use crate::cli::{open_store, prompt_password, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(cli: &Cli, settings: &Settings, profile: &str) -> Result<()> {
    let store = open_store(cli, settings)?;

    let password = prompt_password()?;
    let key = store.get_private_key(profile, password.as_bytes())?;
    println!("{}", key.as_str());

    Ok(())
}
