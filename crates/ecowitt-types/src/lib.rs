//! Platform-agnostic types for Ecowitt weather station gateways.
//!
//! This crate provides the data types shared by the protocol engine
//! (ecowitt-core) and front ends such as ecowitt-cli. It performs no I/O.
//!
//! # Features
//!
//! - Decoded observation values and sets
//! - Fixed-layout configuration and calibration records
//! - The sensor address table and battery state semantics
//! - Device identity types (MAC address, model)
//! - Error types for data parsing
//!
//! # Example
//!
//! ```
//! use ecowitt_types::SystemParams;
//!
//! let params = SystemParams::from_payload(&[0x00, 0x01, 0x62, 0x66, 0x8E, 0x53, 0x5E, 0x03]).unwrap();
//! assert_eq!(params.frequency_mhz(), Some(433));
//! assert_eq!(params.sensor_type_name(), Some("WH65"));
//! ```

pub mod error;
pub mod params;
pub mod sensor;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use params::{
    ChannelOffsets, Co2Offset, CustomizedParams, EcowittParams, GainCalibration, MulchOffset,
    MulchOffsets, MulchTempOffsets, OffsetCalibration, Pm25Offsets, RainTotals, SoilCalibration,
    SoilChannel, SystemParams, UserPaths, WeathercloudParams, WowParams, WundergroundParams,
    firmware_from_payload,
};
pub use sensor::{
    BatteryDescription, BatteryStrategy, MAX_ADDRESS, NO_LOW, NOT_REGISTERED, SensorInfo,
    sensor_info,
};
pub use types::{DEFAULT_PORT, DeviceModel, DiscoveryMethod, MacAddress, Observations, Value};

#[cfg(test)]
mod tests {
    use super::*;

    // Payloads below are the bytes between the size field and the checksum
    // of captured gateway responses.

    #[test]
    fn test_parse_system_params() {
        // FF FF 30 0B | 00 01 62 66 8E 53 5E 03 | 46
        let payload = [0x00, 0x01, 0x62, 0x66, 0x8E, 0x53, 0x5E, 0x03];
        let params = SystemParams::from_payload(&payload).unwrap();

        assert_eq!(params.frequency, 0);
        assert_eq!(params.sensor_type, 1);
        assert_eq!(params.utc, Some(1_650_888_275));
        assert_eq!(params.timezone_index, 94);
        assert!(params.dst_status);

        let when = params.utc_datetime().unwrap();
        assert_eq!(when.year(), 2022);
        assert_eq!(when.unix_timestamp(), 1_650_888_275);
    }

    #[test]
    fn test_parse_rain_totals() {
        // FF FF 34 17 | 00 00 00 00 00 00 00 34 00 00 00 34 00 00 01 7B 00 00 09 25 | 5D
        let payload = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x34, 0x00, 0x00, 0x00, 0x34, 0x00, 0x00,
            0x01, 0x7B, 0x00, 0x00, 0x09, 0x25,
        ];
        let rain = RainTotals::from_payload(&payload).unwrap();
        assert_eq!(
            rain,
            RainTotals {
                rate: 0.0,
                day: 5.2,
                week: 5.2,
                month: 37.9,
                year: 234.1,
            }
        );
    }

    #[test]
    fn test_parse_mulch_offsets() {
        let payload = [
            0x00, 0x02, 0x15, // ch0: hum +2, temp +2.1
            0x01, 0xFB, 0xE5, // ch1: hum -5, temp -2.7
            0x02, 0x00, 0x00, //
            0x03, 0x00, 0x00, //
            0x04, 0x00, 0x00, //
            0x05, 0x00, 0x00, //
            0x06, 0x00, 0x00, //
            0x07, 0x00, 0x00,
        ];
        let offsets = MulchOffsets::from_payload(&payload).unwrap();

        assert_eq!(offsets.channels.len(), 8);
        assert_eq!(
            offsets.get(0),
            Some(&MulchOffset {
                humidity: 2,
                temperature: 2.1
            })
        );
        assert_eq!(
            offsets.get(1),
            Some(&MulchOffset {
                humidity: -5,
                temperature: -2.7
            })
        );
        assert_eq!(offsets.get(7).unwrap().humidity, 0);
    }

    #[test]
    fn test_parse_pm25_offsets() {
        // FF FF 2E 0F | 00 00 C8 01 FF 38 02 00 00 03 FF C7 | ..
        let payload = [
            0x00, 0x00, 0xC8, 0x01, 0xFF, 0x38, 0x02, 0x00, 0x00, 0x03, 0xFF, 0xC7,
        ];
        let offsets = Pm25Offsets::from_payload(&payload).unwrap();
        assert_eq!(offsets.get(0), Some(20.0));
        assert_eq!(offsets.get(1), Some(-20.0));
        assert_eq!(offsets.get(2), Some(0.0));
        assert_eq!(offsets.get(3), Some(-5.7));
    }

    #[test]
    fn test_parse_co2_offset() {
        let payload = [0x1D, 0xC7, 0x00, 0x7B, 0xFF, 0xCB];
        let offset = Co2Offset::from_payload(&payload).unwrap();
        assert_eq!(offset.co2, 7623);
        assert_eq!(offset.pm25, 12.3);
        assert_eq!(offset.pm10, -5.3);
    }

    #[test]
    fn test_parse_gain() {
        // FF FF 36 0F | 04 F3 00 35 00 0A 01 F4 01 AE 00 64 | 38
        let payload = [
            0x04, 0xF3, 0x00, 0x35, 0x00, 0x0A, 0x01, 0xF4, 0x01, 0xAE, 0x00, 0x64,
        ];
        let gain = GainCalibration::from_payload(&payload).unwrap();
        assert_eq!(gain.uv, 0.53);
        assert_eq!(gain.solar, 0.1);
        assert_eq!(gain.wind, 5.0);
        assert_eq!(gain.rain, 4.3);
    }

    #[test]
    fn test_parse_calibration() {
        // FF FF 38 13 | FF C6 04 FF FF FF E5 00 00 00 31 00 60 09 00 B4 | 44
        let payload = [
            0xFF, 0xC6, 0x04, 0xFF, 0xFF, 0xFF, 0xE5, 0x00, 0x00, 0x00, 0x31, 0x00, 0x60, 0x09,
            0x00, 0xB4,
        ];
        let cal = OffsetCalibration::from_payload(&payload).unwrap();
        assert_eq!(cal.intemp, -5.8);
        assert_eq!(cal.inhum, 4);
        assert_eq!(cal.abs, -2.7);
        assert_eq!(cal.rel, 4.9);
        assert_eq!(cal.outtemp, 9.6);
        assert_eq!(cal.outhum, 9);
        assert_eq!(cal.dir, 180);
    }

    #[test]
    fn test_parse_soil_calibration() {
        let payload = [
            0x00, 0x29, 0x00, 0xEB, 0x01, 0xC8, 0x03, 0xE8, // ch0
            0x01, 0x35, 0x01, 0x17, 0x01, 0x23, 0x00, 0xC8, // ch1
        ];
        let soil = SoilCalibration::from_payload(&payload).unwrap();
        assert_eq!(
            soil.get(0),
            Some(&SoilChannel {
                humidity: 41,
                ad: 235,
                ad_select: 1,
                adj_min: 200,
                adj_max: 1000,
            })
        );
        assert_eq!(
            soil.get(1),
            Some(&SoilChannel {
                humidity: 53,
                ad: 279,
                ad_select: 1,
                adj_min: 35,
                adj_max: 200,
            })
        );
    }

    #[test]
    fn test_parse_service_params() {
        // READ_ECOWITT: FF FF 1E 04 | 03 | 23
        let ecowitt = EcowittParams::from_payload(&[0x03]).unwrap();
        assert_eq!(ecowitt.interval, 3);
        assert_eq!(ecowitt.mac, None);

        // READ_WUNDERGROUND: id "abcdefgh", password "12345678", trailing flag
        let mut payload = vec![0x08];
        payload.extend_from_slice(b"abcdefgh");
        payload.push(0x08);
        payload.extend_from_slice(b"12345678");
        payload.push(0x01);
        let wu = WundergroundParams::from_payload(&payload).unwrap();
        assert_eq!(wu.id, "abcdefgh");
        assert_eq!(wu.password, "12345678");

        let mut payload = vec![0x03];
        payload.extend_from_slice(b"abc");
        payload.push(0x04);
        payload.extend_from_slice(b"k3y!");
        let wc = WeathercloudParams::from_payload(&payload).unwrap();
        assert_eq!(wc.id, "abc");
        assert_eq!(wc.key, "k3y!");
    }

    #[test]
    fn test_parse_customized_params() {
        // FF FF 2A 27 | 06 "123456" 08 "abcdefgh" 0D "192.168.2.220" 1F 40 00 14 00 01 | ..
        let mut payload = vec![0x06];
        payload.extend_from_slice(b"123456");
        payload.push(0x08);
        payload.extend_from_slice(b"abcdefgh");
        payload.push(0x0D);
        payload.extend_from_slice(b"192.168.2.220");
        payload.extend_from_slice(&[0x1F, 0x40, 0x00, 0x14, 0x00, 0x01]);
        assert_eq!(payload.len(), 36);

        let custom = CustomizedParams::from_payload(&payload).unwrap();
        assert_eq!(custom.id, "123456");
        assert_eq!(custom.password, "abcdefgh");
        assert_eq!(custom.server, "192.168.2.220");
        assert_eq!(custom.port, 8000);
        assert_eq!(custom.interval, 20);
        assert_eq!(custom.protocol_name(), "Ecowitt");
        assert!(custom.active);
    }

    #[test]
    fn test_customized_high_port() {
        let mut payload = vec![0x00, 0x00, 0x00];
        payload.extend_from_slice(&[0xAF, 0xC8, 0x00, 0x3C, 0x01, 0x00]);
        let custom = CustomizedParams::from_payload(&payload).unwrap();
        assert_eq!(custom.port, 45000);
        assert_eq!(custom.protocol_name(), "Wunderground");
        assert!(!custom.active);
    }

    #[test]
    fn test_parse_user_paths() {
        let mut payload = vec![0x05];
        payload.extend_from_slice(b"/path");
        payload.push(0x08);
        payload.extend_from_slice(b"/my/path");
        let paths = UserPaths::from_payload(&payload).unwrap();
        assert_eq!(paths.ecowitt_path, "/path");
        assert_eq!(paths.wu_path, "/my/path");
    }

    #[test]
    fn test_mac_address() {
        let mac = MacAddress::from_slice(&[0xE8, 0x68, 0xE7, 0x87, 0x1A, 0x4F]).unwrap();
        assert_eq!(mac.to_string(), "E8:68:E7:87:1A:4F");
        assert_eq!("e8-68-e7-87-1a-4f".parse::<MacAddress>().unwrap(), mac);
        assert!("E8:68:E7".parse::<MacAddress>().is_err());
        assert!("E8:68:E7:87:1A:ZZ".parse::<MacAddress>().is_err());
        assert!(MacAddress::from_slice(&[0xE8, 0x68]).is_err());
    }

    #[test]
    fn test_device_model_from_name() {
        assert_eq!(DeviceModel::from_name("GW1000B_V1.6.8"), Some(DeviceModel::Gw1000));
        assert_eq!(DeviceModel::from_name("WH2650A-WIFI56BB"), Some(DeviceModel::Wh2650));
        assert_eq!(DeviceModel::from_name("wn1900c"), Some(DeviceModel::Wn1900));
        assert_eq!(DeviceModel::from_name(""), None);
        assert_eq!(DeviceModel::Gw1200.to_string(), "GW1200");
    }

    #[test]
    fn test_observations_named_absence() {
        let mut obs = Observations::new();
        obs.insert("intemp", Some(Value::Float(32.0)));
        obs.insert("lightningdist", None);

        assert_eq!(obs.len(), 2);
        assert!(obs.contains("lightningdist"));
        assert_eq!(obs.get("lightningdist"), Some(&None));
        assert_eq!(obs.value("lightningdist"), None);
        assert_eq!(obs.get("lowbatt"), None);
        assert_eq!(obs.f64("intemp"), Some(32.0));
        assert_eq!(obs.names().collect::<Vec<_>>(), ["intemp", "lightningdist"]);
    }

    #[test]
    fn test_value_views() {
        assert_eq!(Value::Int(38).as_f64(), Some(38.0));
        assert_eq!(Value::Float(1.5).as_i64(), None);
        assert_eq!(Value::DateTime([12, 171, 35, 65, 86, 55]).as_f64(), None);
        assert_eq!(
            Value::DateTime([12, 171, 35, 65, 86, 55]).to_string(),
            "(12, 171, 35, 65, 86, 55)"
        );
        assert_eq!(Value::from(9331u16), Value::Int(9331));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_observations_serialize() {
        let mut obs = Observations::new();
        obs.insert("humid1", Some(Value::Int(58)));
        obs.insert("lightningdist", None);
        obs.insert("temp1", Some(Value::Float(23.7)));

        let json = serde_json::to_string(&obs).unwrap();
        assert_eq!(json, r#"{"humid1":58,"lightningdist":null,"temp1":23.7}"#);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_mac_address_serde() {
        let mac = MacAddress([0xAA, 0xBB, 0xCC, 0x01, 0x02, 0x03]);
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, r#""AA:BB:CC:01:02:03""#);
        let back: MacAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mac);
        assert!(serde_json::from_str::<MacAddress>(r#""nope""#).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_discovery_method_serde() {
        assert_eq!(
            serde_json::to_string(&DiscoveryMethod::Broadcast).unwrap(),
            r#""broadcast""#
        );
        assert_eq!(DiscoveryMethod::default(), DiscoveryMethod::Configured);
    }
}

/// Property-based tests for fixed-layout record parsing.
///
/// Every record parser must reject or accept arbitrary payloads without
/// panicking.
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn fixed_records_never_panic(data: Vec<u8>) {
            let _ = RainTotals::from_payload(&data);
            let _ = MulchOffsets::from_payload(&data);
            let _ = ChannelOffsets::from_payload(&data);
            let _ = Co2Offset::from_payload(&data);
            let _ = GainCalibration::from_payload(&data);
            let _ = OffsetCalibration::from_payload(&data);
            let _ = SoilCalibration::from_payload(&data);
            let _ = SystemParams::from_payload(&data);
            let _ = EcowittParams::from_payload(&data);
        }

        #[test]
        fn string_records_never_panic(data: Vec<u8>) {
            let _ = WundergroundParams::from_payload(&data);
            let _ = WowParams::from_payload(&data);
            let _ = WeathercloudParams::from_payload(&data);
            let _ = CustomizedParams::from_payload(&data);
            let _ = UserPaths::from_payload(&data);
            let _ = firmware_from_payload(&data);
        }

        #[test]
        fn truncated_layout_is_an_error(data in proptest::collection::vec(any::<u8>(), 0..20)) {
            prop_assert!(RainTotals::from_payload(&data).is_err());
        }

        #[test]
        fn mac_display_parses_back(bytes: [u8; 6]) {
            let mac = MacAddress(bytes);
            prop_assert_eq!(mac.to_string().parse::<MacAddress>().unwrap(), mac);
        }
    }
}
