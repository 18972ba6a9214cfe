use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod format;
mod util;

use cli::{Cli, Commands};
use commands::CommandContext;
use config::Config;
use format::FormatOptions;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "ecowitt", &mut io::stdout());
        return Ok(());
    }

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::path);
    let config = Config::load_or_default(&config_path);
    let make_context = |flag| CommandContext {
        config: &config,
        config_path: config_path.clone(),
        output: cli.output.as_ref(),
        quiet: cli.quiet,
        format: cli.resolve_format(flag, config.format),
        opts: FormatOptions::new(cli.no_color || config.no_color, cli.compact),
    };

    match &cli.command {
        Commands::Discover {
            timeout,
            broadcast,
            output,
        } => commands::cmd_discover(&make_context(output.format), *timeout, *broadcast),
        Commands::Listen {
            period,
            port,
            output,
        } => commands::cmd_listen(&make_context(output.format), *period, *port),
        Commands::LiveData { gateway, output } => {
            commands::cmd_live_data(&make_context(output.format), gateway)
        }
        Commands::Sensors {
            gateway,
            output,
            all,
        } => commands::cmd_sensors(&make_context(output.format), gateway, *all),
        Commands::Firmware { gateway, output } => {
            commands::cmd_firmware(&make_context(output.format), gateway)
        }
        Commands::Mac { gateway, output } => commands::cmd_mac(&make_context(output.format), gateway),
        Commands::SystemParams { gateway, output } => {
            commands::cmd_system_params(&make_context(output.format), gateway)
        }
        Commands::Rain {
            gateway,
            output,
            totals,
        } => commands::cmd_rain(&make_context(output.format), gateway, *totals),
        Commands::Calibration {
            gateway,
            output,
            soil,
        } => commands::cmd_calibration(&make_context(output.format), gateway, *soil),
        Commands::Offsets {
            gateway,
            output,
            kind,
        } => commands::cmd_offsets(&make_context(output.format), gateway, *kind),
        Commands::Services { gateway, output } => {
            commands::cmd_services(&make_context(output.format), gateway)
        }
        Commands::Config { action } => commands::cmd_config(&make_context(None), action),
        Commands::Completions { .. } => Ok(()),
    }
}
