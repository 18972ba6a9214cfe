//! Field decode functions.
//!
//! Each function turns the raw bytes of one live-data field into a value.
//! All of them are total: a slice of a length the field does not use yields
//! `None` instead of a panic. Multi-byte integers are big-endian.

/// Sentinel lightning distance threshold: anything above is "no strike".
pub const MAX_LIGHTNING_DISTANCE: u8 = 40;

fn be_u16(data: &[u8]) -> Option<u16> {
    let bytes: [u8; 2] = data.try_into().ok()?;
    Some(u16::from_be_bytes(bytes))
}

fn be_u32(data: &[u8]) -> Option<u32> {
    let bytes: [u8; 4] = data.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

/// Signed tenths, e.g. temperature in °C.
pub fn decode_temp(data: &[u8]) -> Option<f64> {
    let bytes: [u8; 2] = data.try_into().ok()?;
    Some(f64::from(i16::from_be_bytes(bytes)) / 10.0)
}

/// Single unsigned byte, e.g. relative humidity in %.
pub fn decode_humid(data: &[u8]) -> Option<u8> {
    match data {
        [b] => Some(*b),
        _ => None,
    }
}

/// Unsigned tenths, e.g. pressure in hPa.
///
/// Longer slices are decoded from their last two bytes.
pub fn decode_press(data: &[u8]) -> Option<f64> {
    let tail = data.get(data.len().checked_sub(2)?..)?;
    be_u16(tail).map(|v| f64::from(v) / 10.0)
}

/// Unsigned 16-bit integer, e.g. wind direction in degrees.
pub fn decode_dir(data: &[u8]) -> Option<u16> {
    be_u16(data)
}

/// Unsigned 32-bit tenths, e.g. accumulated rain in mm.
pub fn decode_big_rain(data: &[u8]) -> Option<f64> {
    be_u32(data).map(|v| f64::from(v) / 10.0)
}

/// Six raw date/time bytes, passed through undecoded.
pub fn decode_datetime(data: &[u8]) -> Option<[u8; 6]> {
    data.try_into().ok()
}

/// Lightning distance in km, `None` when the sensor reports no strike.
pub fn decode_distance(data: &[u8]) -> Option<u8> {
    decode_humid(data).filter(|&d| d <= MAX_LIGHTNING_DISTANCE)
}

/// Unix timestamp, `None` for the unset value `0xFFFFFFFF`.
pub fn decode_utc(data: &[u8]) -> Option<u32> {
    be_u32(data).filter(|&t| t != u32::MAX)
}

/// Unsigned 32-bit counter.
pub fn decode_count(data: &[u8]) -> Option<u32> {
    be_u32(data)
}

/// Unsigned hundredths, e.g. a rain gain factor.
pub fn decode_gain_100(data: &[u8]) -> Option<f64> {
    be_u16(data).map(|v| f64::from(v) / 100.0)
}

/// Field whose contents are not decoded.
pub fn decode_reserved(_data: &[u8]) -> Option<f64> {
    None
}

/// Legacy low battery bitmap.
///
/// Battery state comes from the sensor ID response instead, so this field
/// is consumed but never reported.
pub fn decode_batt(_data: &[u8]) -> Option<f64> {
    None
}

/// WN34 temperature. The trailing battery byte is ignored.
pub fn decode_wn34(data: &[u8]) -> Option<f64> {
    match data {
        [hi, lo, _batt] => decode_temp(&[*hi, *lo]),
        _ => None,
    }
}

/// Decoded WH45 combined CO2/PM/TH sensor block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wh45 {
    pub temp: f64,
    pub humid: u8,
    pub pm10: f64,
    pub pm10_24h_avg: f64,
    pub pm25: f64,
    pub pm25_24h_avg: f64,
    pub co2: u16,
    pub co2_24h_avg: u16,
}

/// WH45 block of 16 bytes. The trailing battery byte is ignored.
pub fn decode_wh45(data: &[u8]) -> Option<Wh45> {
    if data.len() != 16 {
        return None;
    }
    let word = |i: usize| u16::from_be_bytes([data[i], data[i + 1]]);
    Some(Wh45 {
        temp: f64::from(i16::from_be_bytes([data[0], data[1]])) / 10.0,
        humid: data[2],
        pm10: f64::from(word(3)) / 10.0,
        pm10_24h_avg: f64::from(word(5)) / 10.0,
        pm25: f64::from(word(7)) / 10.0,
        pm25_24h_avg: f64::from(word(9)) / 10.0,
        co2: word(11),
        co2_24h_avg: word(13),
    })
}

/// Ten piezo rain gain factors. Gains 5 to 9 are reserved by current
/// firmware.
pub fn decode_rain_gain(data: &[u8]) -> Option<[f64; 10]> {
    if data.len() != 20 {
        return None;
    }
    let mut gains = [0.0; 10];
    for (gain, pair) in gains.iter_mut().zip(data.chunks_exact(2)) {
        *gain = f64::from(u16::from_be_bytes([pair[0], pair[1]])) / 100.0;
    }
    Some(gains)
}

/// Rain reset times: hour of day, day of week (0 Sunday, 1 Monday) and
/// month of year (0 January).
pub fn decode_rain_reset(data: &[u8]) -> Option<[u8; 3]> {
    data.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_temp() {
        assert_eq!(decode_temp(&[0x00, 0xEA]), Some(23.4));
        assert_eq!(decode_temp(&[0xFF, 0xC6]), Some(-5.8));
        assert_eq!(decode_temp(&[0x00]), None);
        assert_eq!(decode_temp(&[0x00, 0xEA, 0x00]), None);
    }

    #[test]
    fn test_decode_humid() {
        assert_eq!(decode_humid(&[0x48]), Some(72));
        assert_eq!(decode_humid(&[]), None);
        assert_eq!(decode_humid(&[0x48, 0x48]), None);
    }

    #[test]
    fn test_decode_press() {
        assert_eq!(decode_press(&[0x27, 0x4C]), Some(1006.0));
        assert_eq!(decode_press(&[0x03, 0x27, 0x4C]), Some(1006.0));
        assert_eq!(decode_press(&[0x27]), None);
        assert_eq!(decode_press(&[]), None);
    }

    #[test]
    fn test_press_family() {
        // speed, rain and uv share the press layout
        assert_eq!(decode_press(&[0x00, 0x70]), Some(11.2));
        assert_eq!(decode_press(&[0x01, 0x70]), Some(36.8));
        assert_eq!(decode_press(&[0x32, 0x70]), Some(1291.2));
        assert_eq!(decode_press(&[0x1C, 0x9D]), Some(732.5));
        assert_eq!(decode_press(&[0x05, 0x1C, 0x9D]), Some(732.5));
    }

    #[test]
    fn test_decode_dir() {
        assert_eq!(decode_dir(&[0x00, 0x70]), Some(112));
        assert_eq!(decode_dir(&[0x24, 0x73]), Some(9331));
        assert_eq!(decode_dir(&[0x00, 0x70, 0x00]), None);
    }

    #[test]
    fn test_decode_big_rain() {
        assert_eq!(decode_big_rain(&[0x01, 0x70, 0x37, 0x21]), Some(2_413_136.1));
        assert_eq!(decode_big_rain(&[0x02, 0x40, 0x72, 0x51]), Some(3_777_800.1));
        assert_eq!(decode_big_rain(&[0x01, 0x70, 0x37]), None);
    }

    #[test]
    fn test_decode_datetime() {
        assert_eq!(
            decode_datetime(&[0x0C, 0xAB, 0x23, 0x41, 0x56, 0x37]),
            Some([12, 171, 35, 65, 86, 55])
        );
        assert_eq!(decode_datetime(&[0x0C]), None);
        assert_eq!(decode_datetime(&[0u8; 7]), None);
    }

    #[test]
    fn test_decode_distance() {
        assert_eq!(decode_distance(&[0x1A]), Some(26));
        assert_eq!(decode_distance(&[40]), Some(40));
        assert_eq!(decode_distance(&[41]), None);
        assert_eq!(decode_distance(&[0xFF]), None);
        assert_eq!(decode_distance(&[]), None);
        assert_eq!(decode_distance(&[0x1A, 0x1A]), None);
    }

    #[test]
    fn test_decode_utc() {
        assert_eq!(decode_utc(&[0x5F, 0x40, 0x72, 0x51]), Some(1_598_059_089));
        assert_eq!(decode_utc(&[0xFF, 0xFF, 0xFF, 0xFF]), None);
        assert_eq!(decode_utc(&[0x5F]), None);
        assert_eq!(decode_utc(&[0u8; 5]), None);
    }

    #[test]
    fn test_decode_count() {
        assert_eq!(decode_count(&[0x00, 0x40, 0x72, 0x51]), Some(4_223_569));
        assert_eq!(decode_count(&[0x00]), None);
        assert_eq!(decode_count(&[0u8; 5]), None);
    }

    #[test]
    fn test_decode_gain_100() {
        assert_eq!(decode_gain_100(&[0x01, 0xF2]), Some(4.98));
        assert_eq!(decode_gain_100(&[0x01]), None);
        assert_eq!(decode_gain_100(&[0u8; 5]), None);
    }

    #[test]
    fn test_reserved_and_batt() {
        assert_eq!(decode_reserved(&[0x01, 0x02]), None);
        assert_eq!(decode_batt(&[0u8; 16]), None);
    }

    #[test]
    fn test_decode_wn34() {
        assert_eq!(decode_wn34(&[0x00, 0xDD, 0x5A]), Some(22.1));
        assert_eq!(decode_wn34(&[0x00, 0xDD]), None);
        assert_eq!(decode_wn34(&[0u8; 4]), None);
    }

    #[test]
    fn test_decode_wh45() {
        let data = [
            0x00, 0xEA, 0x4D, 0x35, 0x6D, 0x28, 0x78, 0x34, 0x3D, 0x62, 0x7E, 0x8D, 0x2A, 0x39,
            0x9F, 0x04,
        ];
        let wh45 = decode_wh45(&data).unwrap();
        assert_eq!(wh45.temp, 23.4);
        assert_eq!(wh45.humid, 77);
        assert_eq!(wh45.pm10, 1367.7);
        assert_eq!(wh45.pm10_24h_avg, 1036.0);
        assert_eq!(wh45.pm25, 1337.3);
        assert_eq!(wh45.pm25_24h_avg, 2521.4);
        assert_eq!(wh45.co2, 36138);
        assert_eq!(wh45.co2_24h_avg, 14751);

        assert_eq!(decode_wh45(&[0x00]), None);
        assert_eq!(decode_wh45(&[0u8; 17]), None);
    }

    #[test]
    fn test_decode_rain_gain() {
        let data = [
            0x00, 0x0A, 0x01, 0xF4, 0x00, 0x64, 0x00, 0xE6, 0x01, 0xCC, 0x01, 0xEA, 0x01, 0x4A,
            0x00, 0xDE, 0x00, 0x6E, 0x00, 0x14,
        ];
        assert_eq!(
            decode_rain_gain(&data),
            Some([0.1, 5.0, 1.0, 2.3, 4.6, 4.9, 3.3, 2.22, 1.1, 0.2])
        );
        assert_eq!(decode_rain_gain(&[0x00, 0x0A]), None);
    }

    #[test]
    fn test_decode_rain_reset() {
        assert_eq!(decode_rain_reset(&[0x09, 0x01, 0x06]), Some([9, 1, 6]));
        assert_eq!(decode_rain_reset(&[]), None);
        assert_eq!(decode_rain_reset(&[0x09, 0x01]), None);
    }
}

/// Property-based tests for decode totality.
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// No decoder panics, whatever it is handed.
        #[test]
        fn decoders_never_panic(data: Vec<u8>) {
            let _ = decode_temp(&data);
            let _ = decode_humid(&data);
            let _ = decode_press(&data);
            let _ = decode_dir(&data);
            let _ = decode_big_rain(&data);
            let _ = decode_datetime(&data);
            let _ = decode_distance(&data);
            let _ = decode_utc(&data);
            let _ = decode_count(&data);
            let _ = decode_gain_100(&data);
            let _ = decode_wn34(&data);
            let _ = decode_wh45(&data);
            let _ = decode_rain_gain(&data);
            let _ = decode_rain_reset(&data);
        }

        /// Fixed-width decoders reject every other width.
        #[test]
        fn wrong_width_is_absent(data in proptest::collection::vec(any::<u8>(), 0..32)) {
            if data.len() != 2 {
                prop_assert!(decode_temp(&data).is_none());
                prop_assert!(decode_dir(&data).is_none());
            }
            if data.len() != 4 {
                prop_assert!(decode_big_rain(&data).is_none());
                prop_assert!(decode_count(&data).is_none());
            }
            if data.len() < 2 {
                prop_assert!(decode_press(&data).is_none());
            }
            if data.len() != 16 {
                prop_assert!(decode_wh45(&data).is_none());
            }
        }
    }
}
