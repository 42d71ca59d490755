//! `wgkey completions` — print a shell completion script.
//!
//! The shell name is parsed by clap, so only shells `clap_complete`
//! supports reach this module.

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::Cli;
use crate::errors::Result;

/// Binary name the generated script completes.
const BIN_NAME: &str = "wgkey";

/// Execute the `completions` command, writing the script to stdout.
pub fn execute(shell: Shell) -> Result<()> {
    let stdout = io::stdout();
    write_script(shell, &mut stdout.lock())
}

/// Render the completion script for `shell` into `out`.
pub fn write_script(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, BIN_NAME, out);
    out.flush()?;
    Ok(())
}
