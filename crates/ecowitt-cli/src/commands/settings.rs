//! Calibration, offset and upload service command implementations.

use anyhow::{Context, Result};
use ecowitt_core::{Calibration, CustomUpload};
use ecowitt_types::{
    ChannelOffsets, Co2Offset, EcowittParams, MulchOffsets, SoilCalibration, WeathercloudParams,
    WowParams, WundergroundParams,
};
use serde::Serialize;

use super::CommandContext;
use crate::cli::{GatewayArgs, OffsetKind};
use crate::util::open_device;

#[derive(Debug, Serialize)]
struct CalibrationReport {
    #[serde(flatten)]
    calibration: Calibration,
    #[serde(skip_serializing_if = "Option::is_none")]
    soil: Option<SoilCalibration>,
}

#[derive(Debug, Default, Serialize)]
struct OffsetReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    mulch: Option<MulchOffsets>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mulch_t: Option<ChannelOffsets>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pm25: Option<ChannelOffsets>,
    #[serde(skip_serializing_if = "Option::is_none")]
    co2: Option<Co2Offset>,
}

#[derive(Debug, Serialize)]
struct ServiceReport {
    ecowitt: EcowittParams,
    wunderground: WundergroundParams,
    wow: WowParams,
    weathercloud: WeathercloudParams,
    custom: CustomUpload,
}

pub fn cmd_calibration(ctx: &CommandContext<'_>, gateway: &GatewayArgs, soil: bool) -> Result<()> {
    let device = open_device(gateway, ctx.config, ctx.quiet)?;
    let calibration = device.calibration().context("Failed to read calibration")?;
    let soil = if soil {
        Some(
            device
                .soil_calibration()
                .context("Failed to read soil calibration")?,
        )
    } else {
        None
    };
    ctx.emit_record(&CalibrationReport { calibration, soil })
}

pub fn cmd_offsets(ctx: &CommandContext<'_>, gateway: &GatewayArgs, kind: OffsetKind) -> Result<()> {
    let device = open_device(gateway, ctx.config, ctx.quiet)?;
    let wants = |k: OffsetKind| kind == OffsetKind::All || kind == k;
    let mut report = OffsetReport::default();

    if wants(OffsetKind::Mulch) {
        report.mulch = Some(device.mulch_offset().context("Failed to read mulch offsets")?);
    }
    if wants(OffsetKind::MulchT) {
        report.mulch_t = Some(
            device
                .mulch_t_offset()
                .context("Failed to read temperature offsets")?,
        );
    }
    if wants(OffsetKind::Pm25) {
        report.pm25 = Some(device.pm25_offset().context("Failed to read PM2.5 offsets")?);
    }
    if wants(OffsetKind::Co2) {
        report.co2 = Some(device.co2_offset().context("Failed to read CO2 offsets")?);
    }
    ctx.emit_record(&report)
}

pub fn cmd_services(ctx: &CommandContext<'_>, gateway: &GatewayArgs) -> Result<()> {
    let mut device = open_device(gateway, ctx.config, ctx.quiet)?;
    let report = ServiceReport {
        ecowitt: device
            .ecowitt_params()
            .context("Failed to read Ecowitt.net settings")?,
        wunderground: device
            .wunderground_params()
            .context("Failed to read Weather Underground settings")?,
        wow: device.wow_params().context("Failed to read WOW settings")?,
        weathercloud: device
            .weathercloud_params()
            .context("Failed to read Weathercloud settings")?,
        custom: device
            .all_custom_params()
            .context("Failed to read customized upload settings")?,
    };
    ctx.emit_record(&report)
}
