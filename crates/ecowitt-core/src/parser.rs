//! Response payload parsing.
//!
//! Live data and rain responses are walked tag by tag using the tables in
//! [`crate::fields`]. Every other read response has a fixed layout and is
//! parsed by the matching record type in [`ecowitt_types::params`].

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info};

use ecowitt_types::{
    ChannelOffsets, Co2Offset, CustomizedParams, EcowittParams, GainCalibration, MacAddress,
    MulchOffsets, Observations, OffsetCalibration, RainTotals, SoilCalibration, SystemParams,
    UserPaths, Value, WeathercloudParams, WowParams, WundergroundParams,
};

use crate::commands::Command;
use crate::error::{Error, Result};
use crate::fields::FieldTable;
use crate::frame::{self, hex};

/// What to do when a payload contains a tag missing from the decode table.
///
/// The width of an unknown field is unknown, so the walk can never resume
/// past it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldPolicy {
    /// Keep the fields decoded so far and report the unknown tag.
    #[default]
    Stop,
    /// Fail the whole parse with [`Error::UnknownFieldCode`].
    Fail,
}

/// An unknown tag met while walking a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField {
    pub tag: u8,
    /// Offset of the tag within the payload.
    pub offset: usize,
    /// Bytes after the tag that were not decoded.
    pub remaining: Vec<u8>,
}

/// Result of walking a tag/value payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressedData {
    pub observations: Observations,
    /// Set when the walk stopped early at an unknown tag.
    pub unknown: Option<UnknownField>,
}

impl AddressedData {
    /// Whether every byte of the payload was decoded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unknown.is_none()
    }

    #[must_use]
    pub fn into_observations(self) -> Observations {
        self.observations
    }
}

/// Tag/value payload decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    /// Log unknown tags at info rather than debug.
    pub log_unknown_fields: bool,
    pub unknown_policy: UnknownFieldPolicy,
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn log_unknown_fields(mut self, enabled: bool) -> Self {
        self.log_unknown_fields = enabled;
        self
    }

    #[must_use]
    pub fn unknown_policy(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_policy = policy;
        self
    }

    /// Walk a tag/value payload using `table`.
    ///
    /// A field whose declared width runs past the end of the payload is
    /// decoded from the bytes that remain.
    pub fn parse_addressed_data(&self, payload: &[u8], table: FieldTable) -> Result<AddressedData> {
        let mut result = AddressedData::default();
        let mut index = 0;

        while index + 1 < payload.len() {
            let tag = payload[index];
            let Some(spec) = table.lookup(tag) else {
                let remaining = &payload[index + 1..];
                if self.log_unknown_fields {
                    info!(
                        "Unknown field address '{:02X}' detected. Remaining data '{}' ignored.",
                        tag,
                        hex(remaining)
                    );
                } else {
                    debug!(
                        "Unknown field address '{:02X}' detected. Remaining data '{}' ignored.",
                        tag,
                        hex(remaining)
                    );
                }
                if self.unknown_policy == UnknownFieldPolicy::Fail {
                    return Err(Error::UnknownFieldCode { tag, offset: index });
                }
                result.unknown = Some(UnknownField {
                    tag,
                    offset: index,
                    remaining: remaining.to_vec(),
                });
                break;
            };

            let start = index + 1;
            let end = (start + spec.size).min(payload.len());
            for (name, value) in spec.decoder.decode(&payload[start..end], spec.names) {
                result.observations.insert(name, value);
            }
            index = start + spec.size;
        }
        Ok(result)
    }

    /// Parse a `CMD_GW1000_LIVEDATA` response.
    pub fn parse_live_data(&self, response: &[u8]) -> Result<AddressedData> {
        let payload = frame::payload(response, Command::LiveData);
        self.parse_addressed_data(payload, FieldTable::LiveData)
    }

    /// Parse a `CMD_READ_RAIN` response.
    pub fn parse_rain(&self, response: &[u8]) -> Result<AddressedData> {
        let payload = frame::payload(response, Command::ReadRain);
        self.parse_addressed_data(payload, FieldTable::Rain)
    }
}

/// Lightning detection time from decoded live data.
#[must_use]
pub fn lightning_time(observations: &Observations) -> Option<OffsetDateTime> {
    match observations.value("lightningdettime")? {
        Value::Int(t) => OffsetDateTime::from_unix_timestamp(t).ok(),
        _ => None,
    }
}

/// Rain totals from a `CMD_READ_RAINDATA` response.
pub fn parse_raindata(response: &[u8]) -> Result<RainTotals> {
    Ok(RainTotals::from_payload(frame::payload(
        response,
        Command::ReadRainData,
    ))?)
}

/// Multi-channel temperature and humidity offsets.
pub fn parse_mulch_offset(response: &[u8]) -> Result<MulchOffsets> {
    Ok(MulchOffsets::from_payload(frame::payload(
        response,
        Command::GetMulchOffset,
    ))?)
}

/// WN34 temperature offsets, one per channel.
pub fn parse_mulch_t_offset(response: &[u8]) -> Result<ChannelOffsets> {
    Ok(ChannelOffsets::from_payload(frame::payload(
        response,
        Command::GetMulchTempOffset,
    ))?)
}

/// PM2.5 offsets, one per channel.
pub fn parse_pm25_offset(response: &[u8]) -> Result<ChannelOffsets> {
    Ok(ChannelOffsets::from_payload(frame::payload(
        response,
        Command::GetPm25Offset,
    ))?)
}

/// WH45 CO2, PM2.5 and PM10 offsets.
pub fn parse_co2_offset(response: &[u8]) -> Result<Co2Offset> {
    Ok(Co2Offset::from_payload(frame::payload(
        response,
        Command::GetCo2Offset,
    ))?)
}

/// Rain, UV, solar and wind gain factors.
pub fn parse_gain(response: &[u8]) -> Result<GainCalibration> {
    Ok(GainCalibration::from_payload(frame::payload(
        response,
        Command::ReadGain,
    ))?)
}

/// Temperature, humidity, pressure and wind direction offsets.
pub fn parse_calibration(response: &[u8]) -> Result<OffsetCalibration> {
    Ok(OffsetCalibration::from_payload(frame::payload(
        response,
        Command::ReadCalibration,
    ))?)
}

/// Soil moisture sensor calibration for every paired WH51.
pub fn parse_soil_humiad(response: &[u8]) -> Result<SoilCalibration> {
    Ok(SoilCalibration::from_payload(frame::payload(
        response,
        Command::GetSoilHumiad,
    ))?)
}

/// Frequency, sensor type, clock and timezone settings.
pub fn parse_system_params(response: &[u8]) -> Result<SystemParams> {
    Ok(SystemParams::from_payload(frame::payload(
        response,
        Command::ReadSsss,
    ))?)
}

/// Ecowitt.net upload interval. The MAC is left unset.
pub fn parse_ecowitt(response: &[u8]) -> Result<EcowittParams> {
    Ok(EcowittParams::from_payload(frame::payload(
        response,
        Command::ReadEcowitt,
    ))?)
}

/// Weather Underground station ID and password.
pub fn parse_wunderground(response: &[u8]) -> Result<WundergroundParams> {
    Ok(WundergroundParams::from_payload(frame::payload(
        response,
        Command::ReadWunderground,
    ))?)
}

/// WOW station ID and password.
pub fn parse_wow(response: &[u8]) -> Result<WowParams> {
    Ok(WowParams::from_payload(frame::payload(
        response,
        Command::ReadWow,
    ))?)
}

/// Weathercloud station ID and key.
pub fn parse_weathercloud(response: &[u8]) -> Result<WeathercloudParams> {
    Ok(WeathercloudParams::from_payload(frame::payload(
        response,
        Command::ReadWeathercloud,
    ))?)
}

/// Customized upload server settings.
pub fn parse_customized(response: &[u8]) -> Result<CustomizedParams> {
    Ok(CustomizedParams::from_payload(frame::payload(
        response,
        Command::ReadCustomized,
    ))?)
}

/// Request paths for Ecowitt and Wunderground protocol custom uploads.
pub fn parse_usr_path(response: &[u8]) -> Result<UserPaths> {
    Ok(UserPaths::from_payload(frame::payload(
        response,
        Command::ReadUsrPath,
    ))?)
}

/// Station MAC from a `CMD_READ_STATION_MAC` response.
pub fn parse_station_mac(response: &[u8]) -> Result<MacAddress> {
    Ok(MacAddress::from_slice(frame::payload(
        response,
        Command::ReadStationMac,
    ))?)
}

/// Firmware version string, e.g. `GW2000C_V2.1.4`.
pub fn parse_firmware_version(response: &[u8]) -> Result<String> {
    Ok(ecowitt_types::firmware_from_payload(frame::payload(
        response,
        Command::ReadFirmwareVersion,
    ))?)
}
