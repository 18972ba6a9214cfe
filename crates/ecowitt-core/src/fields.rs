//! Field decode tables for the self-describing live data responses.
//!
//! `CMD_GW1000_LIVEDATA` and `CMD_READ_RAIN` answer with a stream of
//! `<tag> <value>` records. The tag alone determines the value's width and
//! encoding, so the tables below are all a decoder needs to walk the stream.
//! A tag missing from a table cannot be skipped, since its width is unknown.

use ecowitt_types::Value;

use crate::decode::{
    decode_big_rain, decode_count, decode_datetime, decode_dir, decode_distance, decode_gain_100,
    decode_humid, decode_press, decode_rain_gain, decode_rain_reset, decode_temp, decode_utc,
    decode_wh45, decode_wn34,
};

/// How to decode a field's value bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldDecoder {
    Temp,
    Humid,
    Press,
    Dir,
    Speed,
    Rain,
    RainRate,
    BigRain,
    Light,
    Uv,
    Uvi,
    Datetime,
    Pm25,
    Pm10,
    Moist,
    Leak,
    Wet,
    Int,
    Co2,
    Distance,
    Utc,
    Count,
    Memory,
    Gain100,
    Reserved,
    Batt,
    Wn34,
    Wh45,
    RainGain,
    RainReset,
}

impl FieldDecoder {
    /// Decode `data` into named observations.
    ///
    /// Scalar decoders always produce exactly one entry, named `names[0]`,
    /// whose value is `None` when the data could not be decoded. Composite
    /// decoders produce one entry per name, paired positionally, or none at
    /// all when the data has the wrong length. `Reserved` and `Batt` never
    /// produce anything.
    #[must_use]
    pub fn decode(
        self,
        data: &[u8],
        names: &'static [&'static str],
    ) -> Vec<(&'static str, Option<Value>)> {
        use FieldDecoder::*;

        let scalar = |value: Option<Value>| match names.first() {
            Some(name) => vec![(*name, value)],
            None => Vec::new(),
        };

        match self {
            Temp => scalar(decode_temp(data).map(Value::from)),
            Humid | Uvi | Moist | Leak | Wet | Int => scalar(decode_humid(data).map(Value::from)),
            Press | Speed | Rain | RainRate | Uv | Pm25 | Pm10 => {
                scalar(decode_press(data).map(Value::from))
            }
            Dir | Co2 => scalar(decode_dir(data).map(Value::from)),
            BigRain | Light => scalar(decode_big_rain(data).map(Value::from)),
            Datetime => scalar(decode_datetime(data).map(Value::from)),
            Distance => scalar(decode_distance(data).map(Value::from)),
            Utc => scalar(decode_utc(data).map(Value::from)),
            Count | Memory => scalar(decode_count(data).map(Value::from)),
            Gain100 => scalar(decode_gain_100(data).map(Value::from)),
            Reserved | Batt => Vec::new(),
            Wn34 => match decode_wn34(data) {
                Some(temp) => scalar(Some(Value::from(temp))),
                None => Vec::new(),
            },
            Wh45 => match decode_wh45(data) {
                Some(w) => zip(
                    names,
                    [
                        Value::from(w.temp),
                        Value::from(w.humid),
                        Value::from(w.pm10),
                        Value::from(w.pm10_24h_avg),
                        Value::from(w.pm25),
                        Value::from(w.pm25_24h_avg),
                        Value::from(w.co2),
                        Value::from(w.co2_24h_avg),
                    ],
                ),
                None => Vec::new(),
            },
            RainGain => match decode_rain_gain(data) {
                Some(gains) => zip(names, gains.map(Value::from)),
                None => Vec::new(),
            },
            RainReset => match decode_rain_reset(data) {
                Some(reset) => zip(names, reset.map(Value::from)),
                None => Vec::new(),
            },
        }
    }
}

fn zip<const N: usize>(
    names: &'static [&'static str],
    values: [Value; N],
) -> Vec<(&'static str, Option<Value>)> {
    names
        .iter()
        .copied()
        .zip(values.into_iter().map(Some))
        .collect()
}

/// A decode table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub decoder: FieldDecoder,
    /// Number of value bytes following the tag.
    pub size: usize,
    /// Observation names produced by the decoder.
    pub names: &'static [&'static str],
}

impl FieldSpec {
    const fn new(decoder: FieldDecoder, size: usize, names: &'static [&'static str]) -> Self {
        Self {
            decoder,
            size,
            names,
        }
    }
}

/// Which response a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldTable {
    /// `CMD_GW1000_LIVEDATA`.
    LiveData,
    /// `CMD_READ_RAIN`.
    Rain,
}

impl FieldTable {
    /// Look up the entry for `tag`.
    #[must_use]
    pub fn lookup(&self, tag: u8) -> Option<FieldSpec> {
        match self {
            FieldTable::LiveData => live_data_field(tag),
            FieldTable::Rain => rain_field(tag),
        }
    }
}

/// Live data tags that carry rainfall.
pub const RAIN_FIELD_CODES: [u8; 14] = [
    0x0D, 0x0E, 0x0F, 0x10, 0x11, 0x12, 0x13, 0x14, 0x80, 0x81, 0x83, 0x84, 0x85, 0x86,
];

/// Live data tags that carry wind.
pub const WIND_FIELD_CODES: [u8; 4] = [0x0A, 0x0B, 0x0C, 0x19];

static TEMP: [&str; 16] = [
    "temp1", "temp2", "temp3", "temp4", "temp5", "temp6", "temp7", "temp8", "temp9", "temp10",
    "temp11", "temp12", "temp13", "temp14", "temp15", "temp16",
];
static HUMID: [&str; 8] = [
    "humid1", "humid2", "humid3", "humid4", "humid5", "humid6", "humid7", "humid8",
];
static SOILTEMP: [&str; 16] = [
    "soiltemp1", "soiltemp2", "soiltemp3", "soiltemp4", "soiltemp5", "soiltemp6", "soiltemp7",
    "soiltemp8", "soiltemp9", "soiltemp10", "soiltemp11", "soiltemp12", "soiltemp13",
    "soiltemp14", "soiltemp15", "soiltemp16",
];
static SOILMOIST: [&str; 16] = [
    "soilmoist1", "soilmoist2", "soilmoist3", "soilmoist4", "soilmoist5", "soilmoist6",
    "soilmoist7", "soilmoist8", "soilmoist9", "soilmoist10", "soilmoist11", "soilmoist12",
    "soilmoist13", "soilmoist14", "soilmoist15", "soilmoist16",
];
static PM25_24H: [&str; 4] = [
    "pm251_24h_avg",
    "pm252_24h_avg",
    "pm253_24h_avg",
    "pm254_24h_avg",
];
static PM25: [&str; 4] = ["pm251", "pm252", "pm253", "pm254"];
static LEAK: [&str; 4] = ["leak1", "leak2", "leak3", "leak4"];
static LEAFWET: [&str; 8] = [
    "leafwet1", "leafwet2", "leafwet3", "leafwet4", "leafwet5", "leafwet6", "leafwet7",
    "leafwet8",
];
static WH45: [&str; 8] = [
    "temp17",
    "humid17",
    "pm10",
    "pm10_24h_avg",
    "pm255",
    "pm255_24h_avg",
    "co2",
    "co2_24h_avg",
];
static RAIN_GAIN: [&str; 10] = [
    "gain0", "gain1", "gain2", "gain3", "gain4", "gain5", "gain6", "gain7", "gain8", "gain9",
];
static RAIN_RESET: [&str; 3] = ["day_reset", "week_reset", "annual_reset"];

fn nth(names: &'static [&'static str], index: u8) -> &'static [&'static str] {
    let i = usize::from(index);
    &names[i..=i]
}

fn live_data_field(tag: u8) -> Option<FieldSpec> {
    use FieldDecoder::*;

    let spec = match tag {
        0x01 => FieldSpec::new(Temp, 2, &["intemp"]),
        0x02 => FieldSpec::new(Temp, 2, &["outtemp"]),
        0x03 => FieldSpec::new(Temp, 2, &["dewpoint"]),
        0x04 => FieldSpec::new(Temp, 2, &["windchill"]),
        0x05 => FieldSpec::new(Temp, 2, &["heatindex"]),
        0x06 => FieldSpec::new(Humid, 1, &["inhumid"]),
        0x07 => FieldSpec::new(Humid, 1, &["outhumid"]),
        0x08 => FieldSpec::new(Press, 2, &["absbarometer"]),
        0x09 => FieldSpec::new(Press, 2, &["relbarometer"]),
        0x0A => FieldSpec::new(Dir, 2, &["winddir"]),
        0x0B => FieldSpec::new(Speed, 2, &["windspeed"]),
        0x0C => FieldSpec::new(Speed, 2, &["gustspeed"]),
        0x0D => FieldSpec::new(Rain, 2, &["t_rainevent"]),
        0x0E => FieldSpec::new(RainRate, 2, &["t_rainrate"]),
        0x0F => FieldSpec::new(Gain100, 2, &["t_raingain"]),
        0x10 => FieldSpec::new(Rain, 2, &["t_rainday"]),
        0x11 => FieldSpec::new(Rain, 2, &["t_rainweek"]),
        0x12 => FieldSpec::new(BigRain, 4, &["t_rainmonth"]),
        0x13 => FieldSpec::new(BigRain, 4, &["t_rainyear"]),
        0x14 => FieldSpec::new(BigRain, 4, &["t_raintotals"]),
        0x15 => FieldSpec::new(Light, 4, &["light"]),
        0x16 => FieldSpec::new(Uv, 2, &["uv"]),
        0x17 => FieldSpec::new(Uvi, 1, &["uvi"]),
        0x18 => FieldSpec::new(Datetime, 6, &["datetime"]),
        0x19 => FieldSpec::new(Speed, 2, &["daymaxwind"]),
        0x1A..=0x21 => FieldSpec::new(Temp, 2, nth(&TEMP, tag - 0x1A)),
        0x22..=0x29 => FieldSpec::new(Humid, 1, nth(&HUMID, tag - 0x22)),
        0x2A => FieldSpec::new(Pm25, 2, &["pm251"]),
        // soil temperature and moisture alternate, one pair per channel
        0x2B..=0x4A if (tag - 0x2B) % 2 == 0 => {
            FieldSpec::new(Temp, 2, nth(&SOILTEMP, (tag - 0x2B) / 2))
        }
        0x2B..=0x4A => FieldSpec::new(Moist, 1, nth(&SOILMOIST, (tag - 0x2C) / 2)),
        0x4C => FieldSpec::new(Batt, 16, &["lowbatt"]),
        0x4D..=0x50 => FieldSpec::new(Pm25, 2, nth(&PM25_24H, tag - 0x4D)),
        0x51..=0x53 => FieldSpec::new(Pm25, 2, nth(&PM25, tag - 0x50)),
        0x58..=0x5B => FieldSpec::new(Leak, 1, nth(&LEAK, tag - 0x58)),
        0x60 => FieldSpec::new(Distance, 1, &["lightningdist"]),
        0x61 => FieldSpec::new(Utc, 4, &["lightningdettime"]),
        0x62 => FieldSpec::new(Count, 4, &["lightningcount"]),
        0x63..=0x6A => FieldSpec::new(Wn34, 3, nth(&TEMP, tag - 0x63 + 8)),
        0x6C => FieldSpec::new(Memory, 4, &["heap_free"]),
        0x70 => FieldSpec::new(Wh45, 16, &WH45),
        0x72..=0x79 => FieldSpec::new(Wet, 1, nth(&LEAFWET, tag - 0x72)),
        0x7A | 0x7B | 0x80..=0x88 => return piezo_field(tag),
        _ => return None,
    };
    Some(spec)
}

fn rain_field(tag: u8) -> Option<FieldSpec> {
    use FieldDecoder::*;

    let spec = match tag {
        0x0D => FieldSpec::new(Rain, 2, &["t_rainevent"]),
        0x0E => FieldSpec::new(RainRate, 2, &["t_rainrate"]),
        0x0F => FieldSpec::new(Gain100, 2, &["t_raingain"]),
        0x10 => FieldSpec::new(BigRain, 4, &["t_rainday"]),
        0x11 => FieldSpec::new(BigRain, 4, &["t_rainweek"]),
        0x12 => FieldSpec::new(BigRain, 4, &["t_rainmonth"]),
        0x13 => FieldSpec::new(BigRain, 4, &["t_rainyear"]),
        _ => return piezo_field(tag),
    };
    Some(spec)
}

/// Piezo rain gauge and rain configuration fields, common to both tables.
fn piezo_field(tag: u8) -> Option<FieldSpec> {
    use FieldDecoder::*;

    let spec = match tag {
        0x7A => FieldSpec::new(Int, 1, &["rain_priority"]),
        0x7B => FieldSpec::new(Int, 1, &["temperature_comp"]),
        0x80 => FieldSpec::new(RainRate, 2, &["p_rainrate"]),
        0x81 => FieldSpec::new(Rain, 2, &["p_rainevent"]),
        0x82 => FieldSpec::new(Reserved, 2, &["p_rainhour"]),
        0x83 => FieldSpec::new(BigRain, 4, &["p_rainday"]),
        0x84 => FieldSpec::new(BigRain, 4, &["p_rainweek"]),
        0x85 => FieldSpec::new(BigRain, 4, &["p_rainmonth"]),
        0x86 => FieldSpec::new(BigRain, 4, &["p_rainyear"]),
        0x87 => FieldSpec::new(RainGain, 20, &RAIN_GAIN),
        0x88 => FieldSpec::new(RainReset, 3, &RAIN_RESET),
        _ => return None,
    };
    Some(spec)
}
