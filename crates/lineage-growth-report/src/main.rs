use anyhow::Context;
use clap::Parser;

mod cli;
mod commands;
mod config;
mod output;

fn main() {
    if let Err(error) = run() {
        eprintln!("growth-report error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = config::ReportConfig::load(cli.config.as_deref())
        .context("failed to load report settings")?;

    match &cli.command {
        cli::Commands::Growth(args) => commands::growth(args, &config, &cli.out_dir),
        cli::Commands::Takeover(args) => commands::takeover(args, &config, &cli.out_dir),
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("GROWTH_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
