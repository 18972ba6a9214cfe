//! Utility functions for CLI operations.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use ecowitt_core::{Device, DeviceConfig};

use crate::cli::GatewayArgs;
use crate::config::{Config, resolve_gateway};

/// Open a gateway from flags and config, discovering one when no address is
/// known.
pub fn open_device(args: &GatewayArgs, config: &Config, quiet: bool) -> Result<Device> {
    let gateway = resolve_gateway(args, config)?;
    open_with(gateway, quiet)
}

fn open_with(gateway: DeviceConfig, quiet: bool) -> Result<Device> {
    let announce = gateway.ip.is_none() && !quiet;
    if announce {
        eprintln!("No gateway address given. Broadcasting for gateways...");
    }
    let device = Device::from_config(gateway).context(
        "Failed to locate a gateway. Use --ip <ADDRESS> or set ECOWITT_IP environment variable.\n\
         Run 'ecowitt discover' to find gateways on the local network.",
    )?;
    if announce {
        eprintln!("Using gateway at {}", device.address());
    }
    tracing::debug!("Using gateway at {} ({})", device.address(), device.discovered_via());
    Ok(device)
}

/// Write output to file or stdout.
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}
