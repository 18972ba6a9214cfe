//! Command vocabulary of the gateway binary API.
//!
//! Each command is a single code byte. Read commands are answered with a
//! frame echoing the same code; write commands are answered with a one-byte
//! status payload (see [`crate::frame::confirm_write`]).

use std::fmt;

use crate::error::{Error, Result};
use crate::frame::LengthField;

macro_rules! commands {
    ($($(#[$meta:meta])* $variant:ident = $code:literal => $name:literal,)+) => {
        /// A gateway API command.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Command {
            $($(#[$meta])* $variant = $code,)+
        }

        impl Command {
            /// Every command, in code order.
            pub const ALL: &'static [Command] = &[$(Command::$variant,)+];

            /// Symbolic name, e.g. `CMD_LIVEDATA`.
            #[must_use]
            pub fn name(&self) -> &'static str {
                match self {
                    $(Command::$variant => $name,)+
                }
            }
        }

        impl TryFrom<u8> for Command {
            type Error = Error;

            fn try_from(code: u8) -> Result<Self> {
                match code {
                    $($code => Ok(Command::$variant),)+
                    other => Err(Error::UnknownApiCommand(other)),
                }
            }
        }
    };
}

commands! {
    WriteSsid = 0x11 => "CMD_WRITE_SSID",
    /// UDP discovery request.
    Broadcast = 0x12 => "CMD_BROADCAST",
    ReadEcowitt = 0x1E => "CMD_READ_ECOWITT",
    WriteEcowitt = 0x1F => "CMD_WRITE_ECOWITT",
    ReadWunderground = 0x20 => "CMD_READ_WUNDERGROUND",
    WriteWunderground = 0x21 => "CMD_WRITE_WUNDERGROUND",
    ReadWow = 0x22 => "CMD_READ_WOW",
    WriteWow = 0x23 => "CMD_WRITE_WOW",
    ReadWeathercloud = 0x24 => "CMD_READ_WEATHERCLOUD",
    WriteWeathercloud = 0x25 => "CMD_WRITE_WEATHERCLOUD",
    ReadStationMac = 0x26 => "CMD_READ_STATION_MAC",
    /// Live sensor data, answered with a TLV payload.
    LiveData = 0x27 => "CMD_GW1000_LIVEDATA",
    GetSoilHumiad = 0x28 => "CMD_GET_SOILHUMIAD",
    SetSoilHumiad = 0x29 => "CMD_SET_SOILHUMIAD",
    ReadCustomized = 0x2A => "CMD_READ_CUSTOMIZED",
    WriteCustomized = 0x2B => "CMD_WRITE_CUSTOMIZED",
    GetMulchOffset = 0x2C => "CMD_GET_MulCH_OFFSET",
    SetMulchOffset = 0x2D => "CMD_SET_MulCH_OFFSET",
    GetPm25Offset = 0x2E => "CMD_GET_PM25_OFFSET",
    SetPm25Offset = 0x2F => "CMD_SET_PM25_OFFSET",
    /// System parameters: frequency, sensor type, clock, timezone.
    ReadSsss = 0x30 => "CMD_READ_SSSS",
    WriteSsss = 0x31 => "CMD_WRITE_SSSS",
    ReadRainData = 0x34 => "CMD_READ_RAINDATA",
    WriteRainData = 0x35 => "CMD_WRITE_RAINDATA",
    ReadGain = 0x36 => "CMD_READ_GAIN",
    WriteGain = 0x37 => "CMD_WRITE_GAIN",
    ReadCalibration = 0x38 => "CMD_READ_CALIBRATION",
    WriteCalibration = 0x39 => "CMD_WRITE_CALIBRATION",
    ReadSensorId = 0x3A => "CMD_READ_SENSOR_ID",
    WriteSensorId = 0x3B => "CMD_WRITE_SENSOR_ID",
    /// Sensor IDs with battery and signal state.
    ReadSensorIdNew = 0x3C => "CMD_READ_SENSOR_ID_NEW",
    WriteReboot = 0x40 => "CMD_WRITE_REBOOT",
    WriteReset = 0x41 => "CMD_WRITE_RESET",
    WriteUpdate = 0x43 => "CMD_WRITE_UPDATE",
    ReadFirmwareVersion = 0x50 => "CMD_READ_FIRMWARE_VERSION",
    ReadUsrPath = 0x51 => "CMD_READ_USR_PATH",
    WriteUsrPath = 0x52 => "CMD_WRITE_USR_PATH",
    GetCo2Offset = 0x53 => "CMD_GET_CO2_OFFSET",
    SetCo2Offset = 0x54 => "CMD_SET_CO2_OFFSET",
    ReadRstRainTime = 0x55 => "CMD_READ_RSTRAIN_TIME",
    WriteRstRainTime = 0x56 => "CMD_WRITE_RSTRAIN_TIME",
    /// Piezo and traditional rain data, answered with a TLV payload.
    ReadRain = 0x57 => "CMD_READ_RAIN",
    WriteRain = 0x58 => "CMD_WRITE_RAIN",
    GetMulchTempOffset = 0x59 => "CMD_GET_MulCH_T_OFFSET",
}

impl Command {
    /// The command code byte.
    #[must_use]
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Resolve a symbolic name, with or without the `CMD_` prefix.
    ///
    /// `LIVEDATA` is accepted as shorthand for `CMD_GW1000_LIVEDATA`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ecowitt_core::Command;
    ///
    /// assert_eq!(Command::from_name("CMD_READ_FIRMWARE_VERSION").unwrap(), Command::ReadFirmwareVersion);
    /// assert_eq!(Command::from_name("READ_SSSS").unwrap().code(), 0x30);
    /// assert!(Command::from_name("CMD_MAKE_COFFEE").is_err());
    /// ```
    pub fn from_name(name: &str) -> Result<Self> {
        let bare = name.strip_prefix("CMD_").unwrap_or(name);
        if bare == "LIVEDATA" {
            return Ok(Command::LiveData);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|cmd| cmd.name().strip_prefix("CMD_") == Some(bare))
            .ok_or_else(|| Error::UnknownCommandName(name.to_string()))
    }

    /// Whether the command changes gateway state.
    #[must_use]
    pub fn is_write(&self) -> bool {
        let bare = &self.name()[4..];
        bare.starts_with("WRITE_") || bare.starts_with("SET_")
    }

    /// Width of the size field in this command's response.
    #[must_use]
    pub fn length_field(&self) -> LengthField {
        match self {
            Command::LiveData
            | Command::ReadRain
            | Command::ReadSensorIdNew
            | Command::GetMulchTempOffset
            | Command::Broadcast => LengthField::Long,
            _ => LengthField::Short,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_values() {
        assert_eq!(Command::Broadcast.code(), 0x12);
        assert_eq!(Command::LiveData.code(), 0x27);
        assert_eq!(Command::ReadSensorIdNew.code(), 0x3C);
        assert_eq!(Command::ReadFirmwareVersion.code(), 0x50);
        assert_eq!(Command::GetMulchTempOffset.code(), 0x59);
        assert_eq!(Command::ALL.len(), 44);
    }

    #[test]
    fn test_try_from_every_code() {
        for cmd in Command::ALL {
            assert_eq!(Command::try_from(cmd.code()).unwrap(), *cmd);
        }
    }

    #[test]
    fn test_try_from_unknown_code() {
        let err = Command::try_from(0x99).unwrap_err();
        assert!(matches!(err, Error::UnknownApiCommand(0x99)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            Command::from_name("CMD_GET_MulCH_OFFSET").unwrap(),
            Command::GetMulchOffset
        );
        assert_eq!(Command::from_name("CMD_LIVEDATA").unwrap(), Command::LiveData);
        assert_eq!(
            Command::from_name("GW1000_LIVEDATA").unwrap(),
            Command::LiveData
        );
        assert!(matches!(
            Command::from_name("read_ssss"),
            Err(Error::UnknownCommandName(_))
        ));
    }

    #[test]
    fn test_is_write() {
        assert!(Command::WriteReboot.is_write());
        assert!(Command::SetCo2Offset.is_write());
        assert!(!Command::ReadSsss.is_write());
        assert!(!Command::GetSoilHumiad.is_write());
        assert!(!Command::Broadcast.is_write());
    }

    #[test]
    fn test_length_field() {
        assert_eq!(Command::LiveData.length_field(), LengthField::Long);
        assert_eq!(Command::Broadcast.length_field(), LengthField::Long);
        assert_eq!(Command::ReadRainData.length_field(), LengthField::Short);
        assert_eq!(Command::ReadFirmwareVersion.length_field(), LengthField::Short);
    }
}
