//! The three weather records that get persisted between runs. Each record is
//! stored as a fixed-size blob: its fields in declaration order, little-endian.

use chrono::NaiveTime;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Reserved field value meaning "never loaded"
pub const SENTINEL: i32 = i32::MIN;

/// Slot in the platform's key-value storage
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct PersistKey(pub u32);

impl PersistKey {
    pub const WEATHER_INFO: Self = Self(2);
    pub const WEATHER_FORECAST: Self = Self(222);
    pub const WEATHER_SUN: Self = Self(333);
}

impl Display for PersistKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record with a fixed binary layout under a well-known key
pub trait Record: Sized {
    const KEY: PersistKey;
    /// Encoded size, in bytes
    const SIZE: usize;

    /// Record with every field set to "unknown"
    fn unknown() -> Self;

    fn to_bytes(&self) -> Vec<u8>;

    /// Decode a blob. `None` if the length doesn't match [Self::SIZE]
    fn from_bytes(bytes: &[u8]) -> Option<Self>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CurrentWeather {
    pub temperature: i32,
    pub icon_id: u32,
}

impl CurrentWeather {
    pub fn temperature(&self) -> Option<i32> {
        known(self.temperature)
    }
}

impl Record for CurrentWeather {
    const KEY: PersistKey = PersistKey::WEATHER_INFO;
    const SIZE: usize = 8;

    fn unknown() -> Self {
        Self {
            temperature: SENTINEL,
            icon_id: 0,
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::SIZE);
        bytes.extend(self.temperature.to_le_bytes());
        bytes.extend(self.icon_id.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let [temperature, icon_id] = words::<2>(bytes)?;
        Some(Self {
            temperature: i32::from_le_bytes(temperature),
            icon_id: u32::from_le_bytes(icon_id),
        })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ForecastWeather {
    pub high_temp: i32,
    pub low_temp: i32,
    pub icon_id: u32,
}

impl ForecastWeather {
    pub fn high(&self) -> Option<i32> {
        known(self.high_temp)
    }

    pub fn low(&self) -> Option<i32> {
        known(self.low_temp)
    }
}

impl Record for ForecastWeather {
    const KEY: PersistKey = PersistKey::WEATHER_FORECAST;
    const SIZE: usize = 12;

    fn unknown() -> Self {
        Self {
            high_temp: SENTINEL,
            low_temp: SENTINEL,
            icon_id: 0,
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::SIZE);
        bytes.extend(self.high_temp.to_le_bytes());
        bytes.extend(self.low_temp.to_le_bytes());
        bytes.extend(self.icon_id.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let [high_temp, low_temp, icon_id] = words::<3>(bytes)?;
        Some(Self {
            high_temp: i32::from_le_bytes(high_temp),
            low_temp: i32::from_le_bytes(low_temp),
            icon_id: u32::from_le_bytes(icon_id),
        })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SunTimes {
    pub rise_hour: i32,
    pub rise_minute: i32,
    pub set_hour: i32,
    pub set_minute: i32,
}

impl SunTimes {
    /// Local sunrise time, if known and in range
    pub fn sunrise(&self) -> Option<NaiveTime> {
        time_of_day(self.rise_hour, self.rise_minute)
    }

    /// Local sunset time, if known and in range
    pub fn sunset(&self) -> Option<NaiveTime> {
        time_of_day(self.set_hour, self.set_minute)
    }
}

impl Record for SunTimes {
    const KEY: PersistKey = PersistKey::WEATHER_SUN;
    const SIZE: usize = 16;

    fn unknown() -> Self {
        Self {
            rise_hour: SENTINEL,
            rise_minute: SENTINEL,
            set_hour: SENTINEL,
            set_minute: SENTINEL,
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        [self.rise_hour, self.rise_minute, self.set_hour, self.set_minute]
            .into_iter()
            .flat_map(i32::to_le_bytes)
            .collect()
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let [rise_hour, rise_minute, set_hour, set_minute] =
            words::<4>(bytes)?.map(i32::from_le_bytes);
        Some(Self {
            rise_hour,
            rise_minute,
            set_hour,
            set_minute,
        })
    }
}

fn known(value: i32) -> Option<i32> {
    (value != SENTINEL).then_some(value)
}

fn time_of_day(hour: i32, minute: i32) -> Option<NaiveTime> {
    let hour = u32::try_from(known(hour)?).ok()?;
    let minute = u32::try_from(known(minute)?).ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Split a blob into exactly `N` 4-byte words
fn words<const N: usize>(bytes: &[u8]) -> Option<[[u8; 4]; N]> {
    if bytes.len() != N * 4 {
        return None;
    }
    let mut words = [[0; 4]; N];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        word.copy_from_slice(chunk);
    }
    Some(words)
}
