//! Core types for decoded gateway data.

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ParseResult};

/// Default TCP port of the gateway API.
pub const DEFAULT_PORT: u16 = 45000;

/// Gateway hardware model.
///
/// The API has no command that reports the model directly. It is inferred
/// from the firmware version string or the access point SSID, both of which
/// embed the model name.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new models in
/// future versions without breaking downstream code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[non_exhaustive]
pub enum DeviceModel {
    Gw1000,
    Gw1100,
    Gw1200,
    Gw2000,
    Wh2650,
    Wh2680,
    Wn1900,
}

impl DeviceModel {
    /// All known models, in matching order.
    pub const KNOWN: [DeviceModel; 7] = [
        DeviceModel::Gw1000,
        DeviceModel::Gw1100,
        DeviceModel::Gw1200,
        DeviceModel::Gw2000,
        DeviceModel::Wh2650,
        DeviceModel::Wh2680,
        DeviceModel::Wn1900,
    ];

    /// Model name as it appears in firmware strings and SSIDs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceModel::Gw1000 => "GW1000",
            DeviceModel::Gw1100 => "GW1100",
            DeviceModel::Gw1200 => "GW1200",
            DeviceModel::Gw2000 => "GW2000",
            DeviceModel::Wh2650 => "WH2650",
            DeviceModel::Wh2680 => "WH2680",
            DeviceModel::Wn1900 => "WN1900",
        }
    }

    /// Detect the model from a firmware version string or SSID.
    ///
    /// The first known model contained in the uppercased string wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use ecowitt_types::DeviceModel;
    ///
    /// assert_eq!(DeviceModel::from_name("GW2000C_V2.1.4"), Some(DeviceModel::Gw2000));
    /// assert_eq!(DeviceModel::from_name("gw1100a-wifi1234"), Some(DeviceModel::Gw1100));
    /// assert_eq!(DeviceModel::from_name("HP2551"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.to_uppercase();
        Self::KNOWN
            .into_iter()
            .find(|model| upper.contains(model.as_str()))
    }
}

impl fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a device's network address was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DiscoveryMethod {
    /// Address supplied by the caller.
    #[default]
    Configured,
    /// Found by sending a UDP broadcast and collecting replies.
    Broadcast,
    /// Found by passively listening for device beacons.
    Listen,
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryMethod::Configured => write!(f, "configured"),
            DiscoveryMethod::Broadcast => write!(f, "broadcast"),
            DiscoveryMethod::Listen => write!(f, "listen"),
        }
    }
}

/// A gateway MAC address.
///
/// The MAC is the only identity of a gateway that survives DHCP address
/// changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Build a MAC address from the first six bytes of `data`.
    pub fn from_slice(data: &[u8]) -> ParseResult<Self> {
        let bytes: [u8; 6] = data
            .get(..6)
            .and_then(|b| b.try_into().ok())
            .ok_or(ParseError::insufficient(6, data.len()))?;
        Ok(Self(bytes))
    }

    /// The raw address bytes.
    #[must_use]
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, g
        )
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    /// Parse `AA:BB:CC:DD:EE:FF` (case-insensitive, `:` or `-` separated).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(ParseError::InvalidValue(format!(
                "MAC address '{}' must have six octets",
                s
            )));
        }
        let mut bytes = [0u8; 6];
        for (slot, part) in bytes.iter_mut().zip(parts) {
            *slot = u8::from_str_radix(part, 16).map_err(|_| {
                ParseError::InvalidValue(format!("invalid octet '{}' in MAC address", part))
            })?;
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

/// A single decoded observation value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// Integral value (humidity, direction, counts, levels).
    Int(i64),
    /// Scaled value (temperatures, pressures, rain, gains).
    Float(f64),
    /// Raw six-byte device date/time field.
    DateTime([u8; 6]),
}

impl Value {
    /// Numeric view of the value, if it is numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::DateTime(_) => None,
        }
    }

    /// Integral view of the value, if it is an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::DateTime(b) => write!(
                f,
                "({}, {}, {}, {}, {}, {})",
                b[0], b[1], b[2], b[3], b[4], b[5]
            ),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<[u8; 6]> for Value {
    fn from(v: [u8; 6]) -> Self {
        Value::DateTime(v)
    }
}

/// A set of decoded observations keyed by field name.
///
/// A key mapped to `None` is a named absence: the field was present in the
/// response but carried a sentinel meaning "no data" (for example a
/// lightning distance of `0xFF`). Fields that were not reported at all are
/// simply not in the map.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Observations(BTreeMap<String, Option<Value>>);

impl Observations {
    /// Create an empty observation set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<Value>) {
        self.0.insert(name.into(), value);
    }

    /// Look up a field; the outer `Option` is presence, the inner is value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Option<Value>> {
        self.0.get(name)
    }

    /// The value of a field, flattening absence and named absence.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<Value> {
        self.0.get(name).copied().flatten()
    }

    /// Numeric value of a field.
    #[must_use]
    pub fn f64(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(|v| v.as_f64())
    }

    /// Whether the field was reported, with or without a value.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Remove a field.
    pub fn remove(&mut self, name: &str) -> Option<Option<Value>> {
        self.0.remove(name)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<Value>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Field names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl Extend<(String, Option<Value>)> for Observations {
    fn extend<I: IntoIterator<Item = (String, Option<Value>)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<(String, Option<Value>)> for Observations {
    fn from_iter<I: IntoIterator<Item = (String, Option<Value>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Observations {
    type Item = (String, Option<Value>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Option<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
