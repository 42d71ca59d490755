use clap::Parser;
use wgkey::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let settings = match wgkey::cli::load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            wgkey::cli::output::error(&e.to_string());
            std::process::exit(1);
        }
    };

    let level = if cli.verbose {
        "debug"
    } else {
        settings.log_level.as_str()
    };
    init_logging(level);

    let result = match cli.command {
        Commands::Put {
            ref profile,
            ref key_file,
        } => wgkey::cli::commands::put::execute(&cli, &settings, profile, key_file.as_deref()),
        Commands::Get { ref profile } => {
            wgkey::cli::commands::get::execute(&cli, &settings, profile)
        }
        Commands::Delete { ref profile, force } => {
            wgkey::cli::commands::delete::execute(&cli, &settings, profile, force)
        }
        Commands::Exists { ref profile } => {
            match wgkey::cli::commands::exists::execute(&cli, &settings, profile) {
                Ok(true) => Ok(()),
                Ok(false) => std::process::exit(1),
                Err(e) => Err(e),
            }
        }
        Commands::List => wgkey::cli::commands::list::execute(&cli, &settings),
        Commands::Render {
            ref profile,
            ref profile_file,
        } => wgkey::cli::commands::render::execute(&cli, &settings, profile, profile_file),
        Commands::Completions { shell } => wgkey::cli::commands::completions::execute(shell),
    };

    if let Err(e) = result {
        // Never reveal which retrieval failure happened.
        if e.is_retrieval_failure() {
            tracing::debug!(error = %e, "retrieval failed");
            wgkey::cli::output::error("cannot retrieve key");
        } else {
            wgkey::cli::output::error(&e.to_string());
        }
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` overrides the configured level.
fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
