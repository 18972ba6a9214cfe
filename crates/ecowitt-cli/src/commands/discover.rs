//! Discover and listen command implementations.

use std::net::IpAddr;

use anyhow::{Context, Result};
use ecowitt_core::{DiscoveredDevice, discover, listen};

use super::CommandContext;
use crate::cli::OutputFormat;
use crate::config::seconds;
use crate::format::{format_devices_csv, format_devices_text};
use crate::util::write_output;

pub fn cmd_discover(
    ctx: &CommandContext<'_>,
    timeout: Option<f64>,
    broadcast: Option<IpAddr>,
) -> Result<()> {
    let mut options = ctx.config.gateway.discovery.clone();
    if let Some(secs) = timeout {
        options = options.timeout(seconds(secs)?);
    }
    if let Some(address) = broadcast {
        options = options.broadcast_address(address);
    }
    if !ctx.quiet && ctx.format == OutputFormat::Text {
        eprintln!(
            "Broadcasting to {}:{} (timeout: {:?})...",
            options.broadcast_address, options.broadcast_port, options.timeout
        );
    }

    let devices = discover(&options).context("Failed to discover gateways")?;
    emit_devices(ctx, &devices)
}

pub fn cmd_listen(ctx: &CommandContext<'_>, period: Option<f64>, port: Option<u16>) -> Result<()> {
    let mut options = ctx.config.gateway.discovery.clone();
    if let Some(secs) = period {
        options = options.listen_period(seconds(secs)?);
    }
    if let Some(port) = port {
        options = options.listen_port(port);
    }
    if !ctx.quiet && ctx.format == OutputFormat::Text {
        eprintln!(
            "Listening for beacons on port {} for {:?}...",
            options.listen_port, options.listen_period
        );
    }

    let devices = listen(&options)
        .with_context(|| format!("Failed to listen on UDP port {}", options.listen_port))?;
    emit_devices(ctx, &devices)
}

fn emit_devices(ctx: &CommandContext<'_>, devices: &[DiscoveredDevice]) -> Result<()> {
    let content = match ctx.format {
        OutputFormat::Json => ctx.opts.as_json(&devices)?,
        OutputFormat::Text => format_devices_text(devices, &ctx.opts),
        OutputFormat::Csv => format_devices_csv(devices),
    };
    write_output(ctx.output, &content)
}
