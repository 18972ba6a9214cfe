//! Firmware, MAC and system parameter command implementations.

use anyhow::{Context, Result};
use ecowitt_types::{DeviceModel, MacAddress, SystemParams};
use serde::Serialize;
use time::OffsetDateTime;

use super::CommandContext;
use crate::cli::{GatewayArgs, OutputFormat};
use crate::util::{open_device, write_output};

#[derive(Debug, Serialize)]
struct FirmwareInfo {
    firmware: String,
    model: Option<DeviceModel>,
}

#[derive(Debug, Serialize)]
struct MacInfo {
    mac: MacAddress,
}

#[derive(Debug, Serialize)]
struct SystemInfo {
    #[serde(flatten)]
    params: SystemParams,
    frequency_mhz: Option<u16>,
    sensor_type_name: Option<&'static str>,
    #[serde(with = "time::serde::rfc3339::option")]
    utc_time: Option<OffsetDateTime>,
}

pub fn cmd_firmware(ctx: &CommandContext<'_>, gateway: &GatewayArgs) -> Result<()> {
    let mut device = open_device(gateway, ctx.config, ctx.quiet)?;
    let firmware = device
        .firmware_version()
        .context("Failed to read firmware version")?;
    let model = device.model().context("Failed to determine model")?;

    match ctx.format {
        OutputFormat::Text => write_output(ctx.output, &format!("{}\n", firmware)),
        _ => ctx.emit_record(&FirmwareInfo { firmware, model }),
    }
}

pub fn cmd_mac(ctx: &CommandContext<'_>, gateway: &GatewayArgs) -> Result<()> {
    let mut device = open_device(gateway, ctx.config, ctx.quiet)?;
    let mac = device.mac_address().context("Failed to read MAC address")?;

    match ctx.format {
        OutputFormat::Text => write_output(ctx.output, &format!("{}\n", mac)),
        _ => ctx.emit_record(&MacInfo { mac }),
    }
}

pub fn cmd_system_params(ctx: &CommandContext<'_>, gateway: &GatewayArgs) -> Result<()> {
    let device = open_device(gateway, ctx.config, ctx.quiet)?;
    let params = device
        .system_params()
        .context("Failed to read system parameters")?;

    ctx.emit_record(&SystemInfo {
        frequency_mhz: params.frequency_mhz(),
        sensor_type_name: params.sensor_type_name(),
        utc_time: params.utc_datetime(),
        params,
    })
}
