//! glshim CLI: the `glshim` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Generate {
            catalog,
            tweaks,
            config,
            functions,
            jobs,
            json,
        } => commands::generate::run(commands::generate::Args {
            catalog,
            tweaks,
            config,
            functions,
            jobs,
            json,
        }),

        Commands::Resolve { name, tweaks, json } => commands::resolve::run(name, tweaks, json),

        Commands::Check {
            catalog,
            tweaks,
            config,
            json,
        } => commands::check::run(catalog, tweaks, config, json),
    }
}
