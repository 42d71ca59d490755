//! `wgkey render` — print a profile's WireGuard configuration.

use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::{open_store, prompt_password, Cli};
use crate::config::Settings;
use crate::errors::Result;
use crate::tunnel::{self, Profile};

/// Execute the `render` command.
pub fn execute(cli: &Cli, settings: &Settings, profile: &str, profile_file: &Path) -> Result<()> {
    let store = open_store(cli, settings)?;
    let description = Profile::load(profile_file)?;

    let password = prompt_password()?;
    let key = store.get_private_key(profile, password.as_bytes())?;

    let text = Zeroizing::new(tunnel::render(&description, &key));
    print!("{}", text.as_str());

    Ok(())
}
