//! `wgkey list` — display stored profiles in a table.

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `list` command.  No password is needed; only metadata is read.
pub fn execute(cli: &Cli, settings: &Settings) -> Result<()> {
    let store = open_store(cli, settings)?;
    let profiles = store.list()?;

    output::info(&format!(
        "{} — {} stored key(s)",
        store.root().display(),
        profiles.len()
    ));
    output::print_profiles_table(&profiles);

    Ok(())
}
