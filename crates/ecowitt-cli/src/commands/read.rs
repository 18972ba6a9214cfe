//! Live data and rain command implementations.

use anyhow::{Context, Result};
use ecowitt_core::Observations;

use super::CommandContext;
use crate::cli::{GatewayArgs, OutputFormat};
use crate::format::{format_observations_csv, format_observations_text};
use crate::util::{open_device, write_output};

pub fn cmd_live_data(ctx: &CommandContext<'_>, gateway: &GatewayArgs) -> Result<()> {
    let mut device = open_device(gateway, ctx.config, ctx.quiet)?;
    let data = device.livedata().context("Failed to read live data")?;
    emit_observations(ctx, &data)
}

pub fn cmd_rain(ctx: &CommandContext<'_>, gateway: &GatewayArgs, totals: bool) -> Result<()> {
    let device = open_device(gateway, ctx.config, ctx.quiet)?;
    if totals {
        let totals = device.raindata().context("Failed to read rain totals")?;
        ctx.emit_record(&totals)
    } else {
        let data = device.rain().context("Failed to read rain data")?;
        emit_observations(ctx, &data)
    }
}

fn emit_observations(ctx: &CommandContext<'_>, data: &Observations) -> Result<()> {
    let content = match ctx.format {
        OutputFormat::Json => ctx.opts.as_json(data)?,
        OutputFormat::Text => format_observations_text(data, &ctx.opts),
        OutputFormat::Csv => format_observations_csv(data),
    };
    write_output(ctx.output, &content)
}
