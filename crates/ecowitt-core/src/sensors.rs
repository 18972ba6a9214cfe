//! Paired sensor registry.
//!
//! The registry is rebuilt wholesale from each `CMD_READ_SENSOR_ID_NEW`
//! response. Each sensor is reported as a 7-byte record:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 1 | Address |
//! | 1 | 4 | Sensor ID (u32 BE) |
//! | 5 | 1 | Battery byte, meaning set by the address |
//! | 6 | 1 | Signal level 0-4 |

use std::collections::BTreeMap;

use tracing::debug;

use ecowitt_types::{
    BatteryDescription, BatteryStrategy, NOT_REGISTERED, Observations, SensorInfo, Value,
    sensor_info,
};

use crate::commands::Command;
use crate::frame;

const RECORD_LEN: usize = 7;

/// Options controlling sensor decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SensorOptions {
    /// Report battery state for sensors with no signal.
    pub show_battery: bool,
    /// Drop the battery value of WH40 units that do not report one.
    pub ignore_wh40_batt: bool,
    /// Address 0x05 is a WH32 rather than a WH26.
    pub use_wh32: bool,
    /// Address 0x00 is a WH24 rather than a WH65.
    pub is_wh24: bool,
}

impl Default for SensorOptions {
    fn default() -> Self {
        Self {
            show_battery: false,
            ignore_wh40_batt: true,
            use_wh32: true,
            is_wh24: false,
        }
    }
}

/// State of one reported sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorState {
    /// Sensor ID as eight lowercase hex digits.
    pub id: String,
    pub battery: Option<f64>,
    pub signal: Option<u8>,
}

impl SensorState {
    /// Whether a sensor is actually paired to this address.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        !NOT_REGISTERED.contains(&self.id.as_str())
    }
}

/// Sensors known to a gateway.
#[derive(Debug, Clone, Default)]
pub struct SensorRegistry {
    options: SensorOptions,
    sensors: BTreeMap<u8, SensorState>,
    legacy_wh40: Option<bool>,
}

impl SensorRegistry {
    #[must_use]
    pub fn new(options: SensorOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn options(&self) -> &SensorOptions {
        &self.options
    }

    /// Replace the registry contents from a `CMD_READ_SENSOR_ID_NEW` response.
    ///
    /// `None` or an empty response clears the registry.
    pub fn set_sensor_id_data(&mut self, response: Option<&[u8]>) {
        self.sensors.clear();
        let Some(response) = response.filter(|r| !r.is_empty()) else {
            return;
        };

        let payload = frame::payload(response, Command::ReadSensorIdNew);
        for record in payload.chunks_exact(RECORD_LEN) {
            let address = record[0];
            let Some(info) = self.info(address) else {
                debug!("Unknown sensor address {:#04x}, skipping", address);
                continue;
            };
            let id = format!(
                "{:08x}",
                u32::from_be_bytes([record[1], record[2], record[3], record[4]])
            );
            let state = self.decode_state(&info, id, record[5], record[6]);
            self.sensors.insert(address, state);
        }
    }

    fn info(&self, address: u8) -> Option<SensorInfo> {
        sensor_info(address, self.options.use_wh32, self.options.is_wh24)
    }

    fn decode_state(&mut self, info: &SensorInfo, id: String, batt: u8, signal: u8) -> SensorState {
        if NOT_REGISTERED.contains(&id.as_str()) {
            return SensorState {
                id,
                battery: None,
                signal: None,
            };
        }
        let battery = if signal == 0 && !self.options.show_battery {
            None
        } else {
            self.decode_battery(info.strategy, batt)
        };
        SensorState {
            id,
            battery,
            signal: Some(signal),
        }
    }

    fn decode_battery(&mut self, strategy: BatteryStrategy, raw: u8) -> Option<f64> {
        let raw16 = u16::from(raw);
        match strategy {
            BatteryStrategy::Binary => Some(f64::from(raw & 1)),
            BatteryStrategy::IntLevel => Some(f64::from(raw)),
            BatteryStrategy::Voltage => Some(f64::from(raw16 * 2) / 100.0),
            BatteryStrategy::VoltageTenths => Some(f64::from(raw) / 10.0),
            BatteryStrategy::Packed { mask, shift } => {
                let bits = raw.checked_shr(u32::from(shift)).unwrap_or(0) & mask;
                Some(f64::from(bits) / 10.0)
            }
            // legacy units report a fixed value below 2.0 V in 0.1 V steps
            BatteryStrategy::Wh40 if raw < 20 => {
                self.legacy_wh40 = Some(true);
                (!self.options.ignore_wh40_batt).then(|| f64::from(raw) / 10.0)
            }
            BatteryStrategy::Wh40 => {
                self.legacy_wh40 = Some(false);
                Some(f64::from(raw) / 100.0)
            }
        }
    }

    /// Every reported address, including searching and disabled slots.
    pub fn addresses(&self) -> impl Iterator<Item = u8> + '_ {
        self.sensors.keys().copied()
    }

    /// Addresses with a registered sensor.
    pub fn connected_addresses(&self) -> impl Iterator<Item = u8> + '_ {
        self.sensors
            .iter()
            .filter(|(_, s)| s.is_registered())
            .map(|(a, _)| *a)
    }

    #[must_use]
    pub fn get(&self, address: u8) -> Option<&SensorState> {
        self.sensors.get(&address)
    }

    #[must_use]
    pub fn id(&self, address: u8) -> Option<&str> {
        self.get(address).map(|s| s.id.as_str())
    }

    #[must_use]
    pub fn battery_state(&self, address: u8) -> Option<f64> {
        self.get(address).and_then(|s| s.battery)
    }

    #[must_use]
    pub fn signal_level(&self, address: u8) -> Option<u8> {
        self.get(address).and_then(|s| s.signal)
    }

    /// `None` until a WH40 has been seen.
    #[must_use]
    pub fn legacy_wh40(&self) -> Option<bool> {
        self.legacy_wh40
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// `{name}_batt` and `{name}_sig` fields for every connected sensor.
    #[must_use]
    pub fn battery_and_signal_data(&self) -> Observations {
        let mut data = Observations::new();
        for address in self.connected_addresses() {
            let (Some(info), Some(state)) = (self.info(address), self.get(address)) else {
                continue;
            };
            let battery = state.battery.map(|v| {
                if info.strategy.is_voltage() {
                    Value::Float(v)
                } else {
                    Value::Int(v as i64)
                }
            });
            data.insert(format!("{}_batt", info.name), battery);
            data.insert(format!("{}_sig", info.name), state.signal.map(Value::from));
        }
        data
    }

    /// Describe a battery value reported for `address`.
    #[must_use]
    pub fn battery_description(&self, address: u8, value: Option<f64>) -> Option<BatteryDescription> {
        let info = self.info(address)?;
        BatteryDescription::describe(&info, value)
    }

    /// Static description of the sensor at `address`.
    #[must_use]
    pub fn sensor_info(&self, address: u8) -> Option<SensorInfo> {
        self.info(address)
    }
}
