//! Sensors command implementation.

use anyhow::{Context, Result};
use ecowitt_core::SensorRegistry;

use super::CommandContext;
use crate::cli::{GatewayArgs, OutputFormat};
use crate::format::{SensorRow, format_sensors_csv, format_sensors_text};
use crate::util::{open_device, write_output};

pub fn cmd_sensors(ctx: &CommandContext<'_>, gateway: &GatewayArgs, all: bool) -> Result<()> {
    let mut device = open_device(gateway, ctx.config, ctx.quiet)?;
    device
        .update_sensor_ids()
        .context("Failed to read sensor IDs")?;
    let rows = sensor_rows(device.sensors(), all);

    let content = match ctx.format {
        OutputFormat::Json => ctx.opts.as_json(&rows)?,
        OutputFormat::Text => format_sensors_text(&rows, &ctx.opts),
        OutputFormat::Csv => format_sensors_csv(&rows),
    };
    write_output(ctx.output, &content)
}

/// Describe the sensors in `registry`, optionally including slots that are
/// searching or disabled.
pub fn sensor_rows(registry: &SensorRegistry, all: bool) -> Vec<SensorRow> {
    let addresses: Vec<u8> = if all {
        registry.addresses().collect()
    } else {
        registry.connected_addresses().collect()
    };
    addresses
        .into_iter()
        .filter_map(|address| {
            let info = registry.sensor_info(address)?;
            let state = registry.get(address)?;
            Some(SensorRow {
                address,
                name: info.name.to_string(),
                id: state.id.clone(),
                battery: state.battery,
                battery_state: state
                    .battery
                    .and_then(|_| registry.battery_description(address, state.battery)),
                signal: state.signal,
            })
        })
        .collect()
}
