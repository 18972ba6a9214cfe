//! Config command implementation.

use anyhow::{Result, bail};

use super::CommandContext;
use crate::cli::ConfigAction;
use crate::config::Config;
use crate::util::write_output;

pub fn cmd_config(ctx: &CommandContext<'_>, action: &ConfigAction) -> Result<()> {
    let path = &ctx.config_path;
    match action {
        ConfigAction::Path => write_output(ctx.output, &format!("{}\n", path.display())),
        ConfigAction::Show => {
            let content = toml::to_string_pretty(ctx.config)?;
            write_output(ctx.output, &content)
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "Config file already exists: {}\nUse --force to overwrite it.",
                    path.display()
                );
            }
            Config::default().save_to(path)?;
            if !ctx.quiet {
                eprintln!("Wrote {}", path.display());
            }
            Ok(())
        }
        ConfigAction::SetIp { ip } => {
            let mut config = ctx.config.clone();
            config.gateway = config.gateway.ip(*ip);
            config.save_to(path)?;
            if !ctx.quiet {
                eprintln!("Default gateway set to {}", ip);
            }
            Ok(())
        }
        ConfigAction::UnsetIp => {
            let mut config = ctx.config.clone();
            config.gateway.ip = None;
            config.save_to(path)?;
            if !ctx.quiet {
                eprintln!("Default gateway removed");
            }
            Ok(())
        }
    }
}
