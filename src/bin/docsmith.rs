//! Docsmith CLI - Python docstring coverage, generation and rewriting

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides the default level
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Scan(args) => {
            let config = cli::load_configuration(cli.config.as_deref())?;
            cli::scan_command(args, config).await?;
        }
        Commands::Review(args) => {
            let config = cli::load_configuration(cli.config.as_deref())?;
            cli::review_command(args, config).await?;
        }
        Commands::Generate(args) => {
            let config = cli::load_configuration(cli.config.as_deref())?;
            cli::generate_command(args, config).await?;
        }
        Commands::Apply(args) => {
            let config = cli::load_configuration(cli.config.as_deref())?;
            cli::apply_command(args, config).await?;
        }
        Commands::Validate(args) => {
            let config = cli::load_configuration(cli.config.as_deref())?;
            cli::validate_command(args, config).await?;
        }
        Commands::Metrics(args) => {
            cli::metrics_command(args).await?;
        }
        Commands::PrintDefaultConfig => {
            cli::print_default_config()?;
        }
        Commands::InitConfig(args) => {
            cli::init_config(args)?;
        }
    }

    Ok(())
}
