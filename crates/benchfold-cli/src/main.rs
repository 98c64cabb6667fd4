//! benchfold CLI: the `benchfold` command.

mod cli;
mod commands;
mod config;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_ENV: &str = "BENCHFOLD_LOG";

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = support::load_config_or_exit(cli.config.as_deref());

    match cli.command {
        Commands::Interpret {
            schema,
            build,
            files,
            json,
        } => commands::interpret::run(&config, schema, build, files, json),

        Commands::Condense {
            schema,
            build,
            summary,
            files,
            json,
        } => commands::condense::run(
            &config,
            commands::condense::Args {
                schema,
                build,
                summary,
                files,
                json,
            },
        ),

        Commands::Rebuild {
            schema,
            history,
            summary,
            workers,
            budget_secs,
            json,
        } => commands::rebuild::run(
            &config,
            commands::rebuild::Args {
                schema,
                history,
                summary,
                workers,
                budget_secs,
                json,
            },
        ),

        Commands::Show { summary, json } => commands::show::run(summary, json),
    }
}
