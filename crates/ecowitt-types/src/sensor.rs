//! Sensor address table and battery state semantics.
//!
//! A gateway reports each paired sensor under a one-byte address. The
//! address fixes the sensor model, and the model fixes how its battery byte
//! is encoded.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a sensor's battery byte is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BatteryStrategy {
    /// Bit 0 only: 0 is OK, 1 is low.
    Binary,
    /// Level 0-5, with 6 meaning external (DC) power.
    IntLevel,
    /// Volts in units of 0.02 V.
    Voltage,
    /// Volts in units of 0.1 V.
    VoltageTenths,
    /// WH40 rain gauge. Legacy units report 0.1 V, newer ones 0.01 V.
    Wh40,
    /// Volts in units of 0.1 V held in `(raw >> shift) & mask`; the
    /// remaining bits carry other flags.
    Packed { mask: u8, shift: u8 },
}

impl BatteryStrategy {
    /// Whether decoded values of this strategy are voltages.
    #[must_use]
    pub fn is_voltage(&self) -> bool {
        matches!(
            self,
            BatteryStrategy::Voltage
                | BatteryStrategy::VoltageTenths
                | BatteryStrategy::Wh40
                | BatteryStrategy::Packed { .. }
        )
    }
}

/// Static description of the sensor found at an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorInfo {
    /// Short name used as the field prefix, e.g. `wh31_ch1`.
    pub name: &'static str,
    /// Display name, e.g. `WH31 ch1`.
    pub long_name: &'static str,
    pub strategy: BatteryStrategy,
}

/// Sensors that report a battery value but have no low battery cut-off.
pub const NO_LOW: [&str; 2] = ["ws80", "ws90"];

/// Sensor IDs of sensors that are paired slots but not registered.
///
/// `fffffffe` means the gateway is still searching, `ffffffff` means the
/// slot is disabled.
pub const NOT_REGISTERED: [&str; 2] = ["fffffffe", "ffffffff"];

/// Highest sensor address the gateway reports.
pub const MAX_ADDRESS: u8 = 0x30;

const WH31: [(&str, &str); 8] = [
    ("wh31_ch1", "WH31 ch1"),
    ("wh31_ch2", "WH31 ch2"),
    ("wh31_ch3", "WH31 ch3"),
    ("wh31_ch4", "WH31 ch4"),
    ("wh31_ch5", "WH31 ch5"),
    ("wh31_ch6", "WH31 ch6"),
    ("wh31_ch7", "WH31 ch7"),
    ("wh31_ch8", "WH31 ch8"),
];

const WH51: [(&str, &str); 8] = [
    ("wh51_ch1", "WH51 ch1"),
    ("wh51_ch2", "WH51 ch2"),
    ("wh51_ch3", "WH51 ch3"),
    ("wh51_ch4", "WH51 ch4"),
    ("wh51_ch5", "WH51 ch5"),
    ("wh51_ch6", "WH51 ch6"),
    ("wh51_ch7", "WH51 ch7"),
    ("wh51_ch8", "WH51 ch8"),
];

const WH41: [(&str, &str); 4] = [
    ("wh41_ch1", "WH41 ch1"),
    ("wh41_ch2", "WH41 ch2"),
    ("wh41_ch3", "WH41 ch3"),
    ("wh41_ch4", "WH41 ch4"),
];

const WH55: [(&str, &str); 4] = [
    ("wh55_ch1", "WH55 ch1"),
    ("wh55_ch2", "WH55 ch2"),
    ("wh55_ch3", "WH55 ch3"),
    ("wh55_ch4", "WH55 ch4"),
];

const WN34: [(&str, &str); 8] = [
    ("wn34_ch1", "WN34 ch1"),
    ("wn34_ch2", "WN34 ch2"),
    ("wn34_ch3", "WN34 ch3"),
    ("wn34_ch4", "WN34 ch4"),
    ("wn34_ch5", "WN34 ch5"),
    ("wn34_ch6", "WN34 ch6"),
    ("wn34_ch7", "WN34 ch7"),
    ("wn34_ch8", "WN34 ch8"),
];

const WN35: [(&str, &str); 8] = [
    ("wn35_ch1", "WN35 ch1"),
    ("wn35_ch2", "WN35 ch2"),
    ("wn35_ch3", "WN35 ch3"),
    ("wn35_ch4", "WN35 ch4"),
    ("wn35_ch5", "WN35 ch5"),
    ("wn35_ch6", "WN35 ch6"),
    ("wn35_ch7", "WN35 ch7"),
    ("wn35_ch8", "WN35 ch8"),
];

/// Look up the sensor at `address`.
///
/// `use_wh32` names address 0x05 as a WH32 rather than a WH26, and
/// `is_wh24` names address 0x00 as a WH24 rather than a WH65.
///
/// # Examples
///
/// ```
/// use ecowitt_types::{sensor_info, BatteryStrategy};
///
/// let info = sensor_info(0x16, true, false).unwrap();
/// assert_eq!(info.name, "wh41_ch1");
/// assert_eq!(info.strategy, BatteryStrategy::IntLevel);
/// assert!(sensor_info(0x31, true, false).is_none());
/// ```
#[must_use]
pub fn sensor_info(address: u8, use_wh32: bool, is_wh24: bool) -> Option<SensorInfo> {
    use BatteryStrategy::*;

    let (name, long_name, strategy) = match address {
        0x00 if is_wh24 => ("wh24", "WH24", Binary),
        0x00 => ("wh65", "WH65", Binary),
        0x01 => ("wh68", "WH68", Voltage),
        0x02 => ("ws80", "WS80", Voltage),
        0x03 => ("wh40", "WH40", Wh40),
        0x04 => ("wh25", "WH25", Binary),
        0x05 if use_wh32 => ("wh32", "WH32", Binary),
        0x05 => ("wh26", "WH26", Binary),
        0x06..=0x0D => {
            let (n, l) = WH31[usize::from(address - 0x06)];
            (n, l, Binary)
        }
        0x0E..=0x15 => {
            let (n, l) = WH51[usize::from(address - 0x0E)];
            (n, l, VoltageTenths)
        }
        0x16..=0x19 => {
            let (n, l) = WH41[usize::from(address - 0x16)];
            (n, l, IntLevel)
        }
        0x1A => ("wh57", "WH57", IntLevel),
        0x1B..=0x1E => {
            let (n, l) = WH55[usize::from(address - 0x1B)];
            (n, l, IntLevel)
        }
        0x1F..=0x26 => {
            let (n, l) = WN34[usize::from(address - 0x1F)];
            (n, l, Voltage)
        }
        0x27 => ("wh45", "WH45", IntLevel),
        0x28..=0x2F => {
            let (n, l) = WN35[usize::from(address - 0x28)];
            (n, l, Voltage)
        }
        0x30 => ("ws90", "WS90", Voltage),
        _ => return None,
    };
    Some(SensorInfo {
        name,
        long_name,
        strategy,
    })
}

/// Human readable battery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BatteryDescription {
    Ok,
    Low,
    /// Running on external power.
    Dc,
    Unknown,
}

impl BatteryDescription {
    /// Describe a decoded battery value for a sensor using `strategy`.
    ///
    /// Returns `None` for sensors listed in [`NO_LOW`] that do have a value,
    /// since there is no cut-off to compare it against.
    #[must_use]
    pub fn describe(info: &SensorInfo, value: Option<f64>) -> Option<Self> {
        let Some(value) = value else {
            return Some(BatteryDescription::Unknown);
        };
        if NO_LOW.contains(&info.name) {
            return None;
        }
        let description = match info.strategy {
            BatteryStrategy::Binary => {
                if value == 0.0 {
                    BatteryDescription::Ok
                } else if value == 1.0 {
                    BatteryDescription::Low
                } else {
                    BatteryDescription::Unknown
                }
            }
            BatteryStrategy::IntLevel => {
                if value <= 1.0 {
                    BatteryDescription::Low
                } else if value == 6.0 {
                    BatteryDescription::Dc
                } else if value <= 5.0 {
                    BatteryDescription::Ok
                } else {
                    BatteryDescription::Unknown
                }
            }
            BatteryStrategy::Voltage
            | BatteryStrategy::VoltageTenths
            | BatteryStrategy::Wh40
            | BatteryStrategy::Packed { .. } => {
                if value <= 1.2 {
                    BatteryDescription::Low
                } else {
                    BatteryDescription::Ok
                }
            }
        };
        Some(description)
    }
}

impl fmt::Display for BatteryDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatteryDescription::Ok => write!(f, "OK"),
            BatteryDescription::Low => write!(f, "low"),
            BatteryDescription::Dc => write!(f, "DC"),
            BatteryDescription::Unknown => write!(f, "Unknown"),
        }
    }
}
