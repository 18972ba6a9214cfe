//! Fixed-layout configuration and calibration records.
//!
//! Unlike live data, these responses are not self-describing: each has a
//! hand-specified byte layout. Every record parses from the response
//! *payload* (the bytes between the size field and the checksum) and
//! returns [`ParseError::InsufficientBytes`] rather than panicking when the
//! payload is truncated.
//!
//! Repeated per-channel records are decoded in whole units; a trailing
//! partial record is ignored.

use std::collections::BTreeMap;

use bytes::Buf;
use time::OffsetDateTime;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ParseResult};
use crate::types::MacAddress;

fn ensure(data: &[u8], expected: usize) -> ParseResult<()> {
    if data.len() < expected {
        return Err(ParseError::insufficient(expected, data.len()));
    }
    Ok(())
}

/// Read a length-prefixed string, advancing `buf` past it.
fn take_string(buf: &mut &[u8]) -> ParseResult<String> {
    if !buf.has_remaining() {
        return Err(ParseError::insufficient(1, 0));
    }
    let len = usize::from(buf.get_u8());
    if buf.remaining() < len {
        return Err(ParseError::insufficient(len, buf.remaining()));
    }
    let value = String::from_utf8_lossy(&buf[..len]).into_owned();
    buf.advance(len);
    Ok(value)
}

/// Traditional rain gauge totals (`READ_RAINDATA`), all in mm or mm/h.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RainTotals {
    pub rate: f64,
    pub day: f64,
    pub week: f64,
    pub month: f64,
    pub year: f64,
}

impl RainTotals {
    /// Byte length of the payload.
    pub const SIZE: usize = 20;

    /// Parse five big-endian u32 tenths.
    pub fn from_payload(data: &[u8]) -> ParseResult<Self> {
        ensure(data, Self::SIZE)?;
        let mut buf = data;
        let mut next = || f64::from(buf.get_u32()) / 10.0;
        Ok(Self {
            rate: next(),
            day: next(),
            week: next(),
            month: next(),
            year: next(),
        })
    }
}

/// Multi-channel temperature/humidity sensor offset.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MulchOffset {
    /// Humidity offset in %.
    pub humidity: i8,
    /// Temperature offset in °C.
    pub temperature: f64,
}

/// Per-channel WH31 offsets (`GET_MulCH_OFFSET`).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MulchOffsets {
    pub channels: BTreeMap<u8, MulchOffset>,
}

impl MulchOffsets {
    /// Parse repeated `channel, hum i8, temp i8/10` records.
    pub fn from_payload(data: &[u8]) -> ParseResult<Self> {
        let channels = data
            .chunks_exact(3)
            .map(|mut rec| {
                let channel = rec.get_u8();
                let humidity = rec.get_i8();
                let temperature = f64::from(rec.get_i8()) / 10.0;
                (
                    channel,
                    MulchOffset {
                        humidity,
                        temperature,
                    },
                )
            })
            .collect();
        Ok(Self { channels })
    }

    /// Offset for a channel.
    #[must_use]
    pub fn get(&self, channel: u8) -> Option<&MulchOffset> {
        self.channels.get(&channel)
    }
}

/// Per-channel temperature offsets keyed by channel, in tenths decoded to °C
/// or µg/m³.
///
/// Used for both WN34 temperature offsets (`GET_MulCH_T_OFFSET`) and PM2.5
/// offsets (`GET_PM25_OFFSET`), which share the `channel, i16/10` layout.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelOffsets {
    pub channels: BTreeMap<u8, f64>,
}

impl ChannelOffsets {
    /// Parse repeated `channel, i16 BE / 10` records.
    pub fn from_payload(data: &[u8]) -> ParseResult<Self> {
        let channels = data
            .chunks_exact(3)
            .map(|mut rec| {
                let channel = rec.get_u8();
                (channel, f64::from(rec.get_i16()) / 10.0)
            })
            .collect();
        Ok(Self { channels })
    }

    /// Offset for a channel.
    #[must_use]
    pub fn get(&self, channel: u8) -> Option<f64> {
        self.channels.get(&channel).copied()
    }
}

/// WN34 temperature offsets.
pub type MulchTempOffsets = ChannelOffsets;

/// PM2.5 sensor offsets.
pub type Pm25Offsets = ChannelOffsets;

/// WH45 CO2/PM offsets (`GET_CO2_OFFSET`).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Co2Offset {
    /// CO2 offset in ppm.
    pub co2: i16,
    /// PM2.5 offset in µg/m³.
    pub pm25: f64,
    /// PM10 offset in µg/m³.
    pub pm10: f64,
}

impl Co2Offset {
    pub const SIZE: usize = 6;

    pub fn from_payload(data: &[u8]) -> ParseResult<Self> {
        ensure(data, Self::SIZE)?;
        let mut buf = data;
        Ok(Self {
            co2: buf.get_i16(),
            pm25: f64::from(buf.get_i16()) / 10.0,
            pm10: f64::from(buf.get_i16()) / 10.0,
        })
    }
}

/// Calibration gains (`READ_GAIN`).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GainCalibration {
    pub uv: f64,
    pub solar: f64,
    pub wind: f64,
    pub rain: f64,
}

impl GainCalibration {
    pub const SIZE: usize = 10;

    /// Parse four u16 hundredths following two reserved bytes.
    pub fn from_payload(data: &[u8]) -> ParseResult<Self> {
        ensure(data, Self::SIZE)?;
        let mut buf = data;
        buf.advance(2);
        let mut next = || f64::from(buf.get_u16()) / 100.0;
        Ok(Self {
            uv: next(),
            solar: next(),
            wind: next(),
            rain: next(),
        })
    }
}

/// Sensor offset calibration (`READ_CALIBRATION`).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OffsetCalibration {
    /// Indoor temperature offset in °C.
    pub intemp: f64,
    /// Indoor humidity offset in %.
    pub inhum: i8,
    /// Absolute pressure offset in hPa.
    pub abs: f64,
    /// Relative pressure offset in hPa.
    pub rel: f64,
    /// Outdoor temperature offset in °C.
    pub outtemp: f64,
    /// Outdoor humidity offset in %.
    pub outhum: i8,
    /// Wind direction offset in degrees.
    pub dir: i16,
}

impl OffsetCalibration {
    pub const SIZE: usize = 16;

    pub fn from_payload(data: &[u8]) -> ParseResult<Self> {
        ensure(data, Self::SIZE)?;
        let mut buf = data;
        Ok(Self {
            intemp: f64::from(buf.get_i16()) / 10.0,
            inhum: buf.get_i8(),
            abs: f64::from(buf.get_i32()) / 10.0,
            rel: f64::from(buf.get_i32()) / 10.0,
            outtemp: f64::from(buf.get_i16()) / 10.0,
            outhum: buf.get_i8(),
            dir: buf.get_i16(),
        })
    }
}

/// Soil moisture sensor calibration for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SoilChannel {
    /// Current humidity in %.
    pub humidity: u8,
    /// Current AD value.
    pub ad: i16,
    /// Whether the custom AD range is in use.
    pub ad_select: u8,
    /// AD value mapped to 0%.
    pub adj_min: u8,
    /// AD value mapped to 100%.
    pub adj_max: i16,
}

/// Soil moisture calibration (`GET_SOILHUMIAD`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SoilCalibration {
    pub channels: BTreeMap<u8, SoilChannel>,
}

impl SoilCalibration {
    pub fn from_payload(data: &[u8]) -> ParseResult<Self> {
        let channels = data
            .chunks_exact(8)
            .map(|mut rec| {
                let channel = rec.get_u8();
                let soil = SoilChannel {
                    humidity: rec.get_u8(),
                    ad: rec.get_i16(),
                    ad_select: rec.get_u8(),
                    adj_min: rec.get_u8(),
                    adj_max: rec.get_i16(),
                };
                (channel, soil)
            })
            .collect();
        Ok(Self { channels })
    }

    #[must_use]
    pub fn get(&self, channel: u8) -> Option<&SoilChannel> {
        self.channels.get(&channel)
    }
}

/// Gateway system parameters (`READ_SSSS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SystemParams {
    /// Sensor radio frequency code, see [`SystemParams::frequency_mhz`].
    pub frequency: u8,
    /// Main outdoor sensor type code: 0 is WH24, 1 is WH65.
    pub sensor_type: u8,
    /// Device clock as a unix timestamp, `None` if unset.
    pub utc: Option<u32>,
    /// Index into the device's timezone table.
    pub timezone_index: u8,
    /// Daylight saving in effect.
    pub dst_status: bool,
}

impl SystemParams {
    pub const SIZE: usize = 8;

    pub fn from_payload(data: &[u8]) -> ParseResult<Self> {
        ensure(data, Self::SIZE)?;
        let mut buf = data;
        let frequency = buf.get_u8();
        let sensor_type = buf.get_u8();
        let utc = Some(buf.get_u32()).filter(|&t| t != u32::MAX);
        Ok(Self {
            frequency,
            sensor_type,
            utc,
            timezone_index: buf.get_u8(),
            dst_status: buf.get_u8() != 0,
        })
    }

    /// Sensor radio frequency in MHz.
    #[must_use]
    pub fn frequency_mhz(&self) -> Option<u16> {
        match self.frequency {
            0 => Some(433),
            1 => Some(868),
            2 => Some(915),
            3 => Some(920),
            _ => None,
        }
    }

    /// Main outdoor sensor type name.
    #[must_use]
    pub fn sensor_type_name(&self) -> Option<&'static str> {
        match self.sensor_type {
            0 => Some("WH24"),
            1 => Some("WH65"),
            _ => None,
        }
    }

    /// Device clock as a date/time.
    #[must_use]
    pub fn utc_datetime(&self) -> Option<OffsetDateTime> {
        self.utc
            .and_then(|t| OffsetDateTime::from_unix_timestamp(i64::from(t)).ok())
    }
}

/// Ecowitt.net upload parameters (`READ_ECOWITT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EcowittParams {
    /// Upload interval in minutes, 0 means disabled.
    pub interval: u8,
    /// Gateway MAC, which Ecowitt.net uses as the station key.
    ///
    /// Not part of the response; filled in from `READ_STATION_MAC`.
    pub mac: Option<MacAddress>,
}

impl EcowittParams {
    pub fn from_payload(data: &[u8]) -> ParseResult<Self> {
        ensure(data, 1)?;
        Ok(Self {
            interval: data[0],
            mac: None,
        })
    }
}

/// Weather Underground upload parameters (`READ_WUNDERGROUND`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WundergroundParams {
    pub id: String,
    pub password: String,
}

impl WundergroundParams {
    pub fn from_payload(data: &[u8]) -> ParseResult<Self> {
        let mut buf = data;
        Ok(Self {
            id: take_string(&mut buf)?,
            password: take_string(&mut buf)?,
        })
    }
}

/// Weather Observations Website upload parameters (`READ_WOW`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WowParams {
    pub id: String,
    pub password: String,
    pub station_num: String,
}

impl WowParams {
    /// Parse three consecutive length-prefixed strings.
    pub fn from_payload(data: &[u8]) -> ParseResult<Self> {
        let mut buf = data;
        let id = take_string(&mut buf)?;
        let password = take_string(&mut buf)?;
        let station_num = take_string(&mut buf)?;
        Ok(Self {
            id,
            password,
            station_num,
        })
    }
}

/// Weathercloud upload parameters (`READ_WEATHERCLOUD`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeathercloudParams {
    pub id: String,
    pub key: String,
}

impl WeathercloudParams {
    pub fn from_payload(data: &[u8]) -> ParseResult<Self> {
        let mut buf = data;
        Ok(Self {
            id: take_string(&mut buf)?,
            key: take_string(&mut buf)?,
        })
    }
}

/// Customized upload server parameters (`READ_CUSTOMIZED`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CustomizedParams {
    pub id: String,
    pub password: String,
    pub server: String,
    pub port: u16,
    /// Upload interval in seconds.
    pub interval: u16,
    /// Upload protocol: 0 is Ecowitt, 1 is Wunderground.
    pub protocol: u8,
    pub active: bool,
}

impl CustomizedParams {
    pub fn from_payload(data: &[u8]) -> ParseResult<Self> {
        let mut buf = data;
        let id = take_string(&mut buf)?;
        let password = take_string(&mut buf)?;
        let server = take_string(&mut buf)?;
        ensure(buf, 6)?;
        Ok(Self {
            id,
            password,
            server,
            port: buf.get_u16(),
            interval: buf.get_u16(),
            protocol: buf.get_u8(),
            active: buf.get_u8() != 0,
        })
    }

    /// Upload protocol name.
    #[must_use]
    pub fn protocol_name(&self) -> &'static str {
        match self.protocol {
            0 => "Ecowitt",
            1 => "Wunderground",
            _ => "unknown",
        }
    }
}

/// Customized upload paths (`READ_USR_PATH`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UserPaths {
    pub ecowitt_path: String,
    pub wu_path: String,
}

impl UserPaths {
    pub fn from_payload(data: &[u8]) -> ParseResult<Self> {
        let mut buf = data;
        Ok(Self {
            ecowitt_path: take_string(&mut buf)?,
            wu_path: take_string(&mut buf)?,
        })
    }
}

/// Parse a length-prefixed firmware version string (`READ_FIRMWARE_VERSION`).
///
/// Bytes are taken as Latin-1 characters.
pub fn firmware_from_payload(data: &[u8]) -> ParseResult<String> {
    ensure(data, 1)?;
    let len = usize::from(data[0]);
    let text = data
        .get(1..1 + len)
        .ok_or(ParseError::insufficient(1 + len, data.len()))?;
    Ok(text.iter().map(|&b| char::from(b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rain_totals() {
        let data = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x34, 0x00, 0x00, 0x00, 0x34, 0x00, 0x00,
            0x01, 0x7B, 0x00, 0x00, 0x09, 0x25,
        ];
        let rain = RainTotals::from_payload(&data).unwrap();
        assert_eq!(rain.rate, 0.0);
        assert_eq!(rain.day, 5.2);
        assert_eq!(rain.week, 5.2);
        assert_eq!(rain.month, 37.9);
        assert_eq!(rain.year, 234.1);
    }

    #[test]
    fn test_rain_totals_truncated() {
        let err = RainTotals::from_payload(&[0u8; 12]).unwrap_err();
        assert_eq!(err, ParseError::insufficient(20, 12));
        assert!(err.to_string().contains("requires 20 bytes"));
    }

    #[test]
    fn test_mulch_offsets_ignore_partial_record() {
        let offsets = MulchOffsets::from_payload(&[0x00, 0x02, 0x15, 0x01, 0xFB]).unwrap();
        assert_eq!(offsets.channels.len(), 1);
        let ch0 = offsets.get(0).unwrap();
        assert_eq!(ch0.humidity, 2);
        assert_eq!(ch0.temperature, 2.1);
    }

    #[test]
    fn test_channel_offsets_signed() {
        let offsets = ChannelOffsets::from_payload(&[0x03, 0xFF, 0xC7]).unwrap();
        assert_eq!(offsets.get(3), Some(-5.7));
        assert_eq!(offsets.get(4), None);
    }

    #[test]
    fn test_system_params_unset_clock() {
        let data = [0x02, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00];
        let params = SystemParams::from_payload(&data).unwrap();
        assert_eq!(params.frequency_mhz(), Some(915));
        assert_eq!(params.sensor_type_name(), Some("WH24"));
        assert_eq!(params.utc, None);
        assert!(params.utc_datetime().is_none());
        assert!(!params.dst_status);
    }

    #[test]
    fn test_wow_station_number() {
        let mut data = vec![0x02];
        data.extend_from_slice(b"ab");
        data.push(0x03);
        data.extend_from_slice(b"pwd");
        data.push(0x04);
        data.extend_from_slice(b"1234");
        let wow = WowParams::from_payload(&data).unwrap();
        assert_eq!(wow.id, "ab");
        assert_eq!(wow.password, "pwd");
        assert_eq!(wow.station_num, "1234");
    }

    #[test]
    fn test_length_prefixed_string_truncated() {
        // id claims 8 bytes, only 3 follow
        let data = [0x08, b'a', b'b', b'c'];
        let err = WundergroundParams::from_payload(&data).unwrap_err();
        assert!(matches!(err, ParseError::InsufficientBytes { .. }));
    }

    #[test]
    fn test_customized_missing_trailer() {
        let mut data = vec![0x01, b'a', 0x01, b'b', 0x01, b'c'];
        data.extend_from_slice(&[0x1F, 0x40]);
        let err = CustomizedParams::from_payload(&data).unwrap_err();
        assert_eq!(err, ParseError::insufficient(6, 2));
    }

    #[test]
    fn test_firmware_from_payload() {
        let mut data = vec![0x0E];
        data.extend_from_slice(b"GW2000C_V2.1.4");
        assert_eq!(firmware_from_payload(&data).unwrap(), "GW2000C_V2.1.4");
        assert!(firmware_from_payload(&[0x05, b'G']).is_err());
        assert!(firmware_from_payload(&[]).is_err());
    }
}
