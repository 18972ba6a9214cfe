//! Output formatting for text, JSON and CSV.

use anyhow::Result;
use ecowitt_core::{DiscoveredDevice, Observations};
use ecowitt_types::BatteryDescription;
use owo_colors::OwoColorize;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;

/// Options shared by all formatters.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool, compact: bool) -> Self {
        Self { no_color, compact }
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }

    fn heading(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.bold().to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.dimmed().to_string()
        }
    }
}

/// Quote a CSV field when it contains a separator, quote or newline.
fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// ============================================================================
// Discovery
// ============================================================================

#[must_use]
pub fn format_devices_text(devices: &[DiscoveredDevice], opts: &FormatOptions) -> String {
    if devices.is_empty() {
        return "No gateways found.\n".to_string();
    }
    let mut output = opts.heading(&format!("Found {} gateway(s)", devices.len()));
    output.push('\n');
    for device in devices {
        let model = device
            .model
            .map(|m| m.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        output.push_str(&format!(
            "  {:<21} {}  {:<8} {}\n",
            device.socket_addr(),
            device.mac,
            model,
            device.ssid
        ));
        if let Ok(seen) = device.captured_at.format(&Rfc3339) {
            output.push_str(&format!("  {}\n", opts.dim(&format!("seen {} via {}", seen, device.method))));
        }
    }
    output
}

#[must_use]
pub fn format_devices_csv(devices: &[DiscoveredDevice]) -> String {
    let mut output = "mac,ip,port,model,ssid\n".to_string();
    for device in devices {
        output.push_str(&format!(
            "{},{},{},{},{}\n",
            device.mac,
            device.ip_address,
            device.port,
            device.model.map(|m| m.to_string()).unwrap_or_default(),
            csv_escape(&device.ssid)
        ));
    }
    output
}

// ============================================================================
// Observations
// ============================================================================

#[must_use]
pub fn format_observations_text(data: &Observations, opts: &FormatOptions) -> String {
    if data.is_empty() {
        return "No data.\n".to_string();
    }
    let width = data.names().map(str::len).max().unwrap_or(0);
    let mut output = String::new();
    for (name, value) in data.iter() {
        let value = match value {
            Some(v) => v.to_string(),
            None => opts.dim("--"),
        };
        output.push_str(&format!("{:<width$}  {}\n", name, value, width = width));
    }
    output
}

#[must_use]
pub fn format_observations_csv(data: &Observations) -> String {
    let mut output = "name,value\n".to_string();
    for (name, value) in data.iter() {
        let value = value.map(|v| v.to_string()).unwrap_or_default();
        output.push_str(&format!("{},{}\n", name, csv_escape(&value)));
    }
    output
}

// ============================================================================
// Sensors
// ============================================================================

/// One paired sensor slot, as shown by the `sensors` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorRow {
    pub address: u8,
    pub name: String,
    pub id: String,
    pub battery: Option<f64>,
    pub battery_state: Option<BatteryDescription>,
    pub signal: Option<u8>,
}

fn battery_label(row: &SensorRow) -> String {
    match (row.battery, row.battery_state) {
        (Some(value), Some(state)) => format!("{} ({})", value, state),
        (Some(value), None) => value.to_string(),
        (None, _) => "--".to_string(),
    }
}

#[must_use]
pub fn format_sensors_text(rows: &[SensorRow], opts: &FormatOptions) -> String {
    if rows.is_empty() {
        return "No sensors registered.\n".to_string();
    }
    let mut output = opts.heading(&format!(
        "{:<4} {:<14} {:<9} {:<14} {}",
        "addr", "sensor", "id", "battery", "signal"
    ));
    output.push('\n');
    for row in rows {
        let signal = row
            .signal
            .map(|s| format!("{}/4", s))
            .unwrap_or_else(|| "--".to_string());
        output.push_str(&format!(
            "{:<4} {:<14} {:<9} {:<14} {}\n",
            format!("{:02X}", row.address),
            row.name,
            row.id,
            battery_label(row),
            signal
        ));
    }
    output
}

#[must_use]
pub fn format_sensors_csv(rows: &[SensorRow]) -> String {
    let mut output = "address,sensor,id,battery,battery_state,signal\n".to_string();
    for row in rows {
        output.push_str(&format!(
            "{:02X},{},{},{},{},{}\n",
            row.address,
            csv_escape(&row.name),
            row.id,
            row.battery.map(|b| b.to_string()).unwrap_or_default(),
            row.battery_state.map(|s| s.to_string()).unwrap_or_default(),
            row.signal.map(|s| s.to_string()).unwrap_or_default()
        ));
    }
    output
}

// ============================================================================
// Settings records
// ============================================================================

/// Flatten a serialized record into `path = value` pairs.
///
/// Nested objects join their keys with `.`, arrays use the element index.
fn flatten(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", prefix, key)
        }
    };
    match value {
        serde_json::Value::Object(map) => {
            for (key, value) in map {
                flatten(&join(key), value, out);
            }
        }
        serde_json::Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                flatten(&join(&index.to_string()), value, out);
            }
        }
        serde_json::Value::Null => out.push((prefix.to_string(), String::new())),
        serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

fn flattened<T: Serialize>(record: &T) -> Result<Vec<(String, String)>> {
    let value = serde_json::to_value(record)?;
    let mut pairs = Vec::new();
    flatten("", &value, &mut pairs);
    Ok(pairs)
}

/// Render any serializable settings record as aligned `key  value` lines.
pub fn format_record_text<T: Serialize>(record: &T, opts: &FormatOptions) -> Result<String> {
    let pairs = flattened(record)?;
    let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let mut output = String::new();
    for (key, value) in pairs {
        let value = if value.is_empty() { opts.dim("--") } else { value };
        output.push_str(&format!("{:<width$}  {}\n", key, value, width = width));
    }
    Ok(output)
}

pub fn format_record_csv<T: Serialize>(record: &T) -> Result<String> {
    let mut output = "key,value\n".to_string();
    for (key, value) in flattened(record)? {
        output.push_str(&format!("{},{}\n", csv_escape(&key), csv_escape(&value)));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecowitt_core::Value;
    use serde_json::json;

    fn plain() -> FormatOptions {
        FormatOptions::new(true, false)
    }

    fn sample_observations() -> Observations {
        let mut data = Observations::new();
        data.insert("intemp", Some(Value::Float(23.4)));
        data.insert("inhumid", Some(Value::Int(38)));
        data.insert("lightningdist", None);
        data
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_observations_text_aligned() {
        let text = format_observations_text(&sample_observations(), &plain());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "inhumid        38");
        assert_eq!(lines[1], "intemp         23.4");
        assert_eq!(lines[2], "lightningdist  --");
    }

    #[test]
    fn test_observations_csv() {
        let csv = format_observations_csv(&sample_observations());
        assert_eq!(csv, "name,value\ninhumid,38\nintemp,23.4\nlightningdist,\n");
    }

    #[test]
    fn test_observations_json_keeps_absent_values() {
        let json = plain().as_json(&sample_observations()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["intemp"], json!(23.4));
        assert_eq!(parsed["lightningdist"], serde_json::Value::Null);
    }

    #[test]
    fn test_compact_json() {
        let opts = FormatOptions::new(true, true);
        assert_eq!(opts.as_json(&json!({"a": 1})).unwrap(), "{\"a\":1}\n");
    }

    #[test]
    fn test_empty_outputs() {
        assert_eq!(format_devices_text(&[], &plain()), "No gateways found.\n");
        assert_eq!(
            format_observations_text(&Observations::new(), &plain()),
            "No data.\n"
        );
        assert_eq!(format_sensors_text(&[], &plain()), "No sensors registered.\n");
    }

    #[test]
    fn test_sensors_text() {
        let rows = vec![SensorRow {
            address: 0x06,
            name: "wh31_ch1".to_string(),
            id: "0000002d".to_string(),
            battery: Some(0.0),
            battery_state: Some(BatteryDescription::Ok),
            signal: Some(4),
        }];
        let text = format_sensors_text(&rows, &plain());
        assert!(text.lines().nth(1).unwrap().starts_with("06   wh31_ch1"));
        assert!(text.contains("4/4"));

        let csv = format_sensors_csv(&rows);
        assert_eq!(csv.lines().nth(1).unwrap(), "06,wh31_ch1,0000002d,0,OK,4");
    }

    #[test]
    fn test_record_flattening() {
        let record = json!({
            "server": "rtupdate.wunderground.com",
            "interval": 60,
            "nested": {"enabled": true, "path": null},
            "list": [1.5, 2.5],
        });
        let text = format_record_text(&record, &plain()).unwrap();
        assert!(text.contains("server"));
        assert!(text.contains("nested.enabled  true"));
        assert!(text.contains("list.1"));
        assert!(text.contains("2.5"));

        let csv = format_record_csv(&record).unwrap();
        assert!(csv.contains("nested.path,\n"));
        assert!(csv.contains("interval,60\n"));
    }
}
