//! Mapping from provider condition codes to the icons we ship. The codes follow
//! the classic 0-47 weather condition taxonomy, where day/night is baked into
//! the code itself (e.g. 31 is "clear (night)", 32 is "sunny").

/// One of the weather icons bundled with the app. The discriminant is the
/// numeric resource ID that gets persisted and handed to the icon decoder.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
#[repr(u32)]
pub enum IconId {
    Generic = 1,
    Thunderstorm = 2,
    RainAndSnow = 3,
    LightRain = 4,
    HeavyRain = 5,
    LightSnow = 6,
    HeavySnow = 7,
    Cloudy = 8,
    PartlyCloudyNight = 9,
    ClearDay = 10,
    ClearNight = 11,
    PartlyCloudy = 12,
}

impl IconId {
    pub const ALL: [Self; 12] = [
        Self::Generic,
        Self::Thunderstorm,
        Self::RainAndSnow,
        Self::LightRain,
        Self::HeavyRain,
        Self::LightSnow,
        Self::HeavySnow,
        Self::Cloudy,
        Self::PartlyCloudyNight,
        Self::ClearDay,
        Self::ClearNight,
        Self::PartlyCloudy,
    ];

    /// Numeric resource ID, as stored in the weather records
    pub fn resource_id(self) -> u32 {
        self as u32
    }

    /// Asset file stem for this icon
    pub fn name(self) -> &'static str {
        match self {
            Self::Generic => "weather_generic",
            Self::Thunderstorm => "weather_thunderstorm",
            Self::RainAndSnow => "weather_raining_and_snowing",
            Self::LightRain => "weather_light_rain",
            Self::HeavyRain => "weather_heavy_rain",
            Self::LightSnow => "weather_light_snow",
            Self::HeavySnow => "weather_heavy_snow",
            Self::Cloudy => "weather_cloudy",
            Self::PartlyCloudyNight => "weather_partly_cloudy_night",
            Self::ClearDay => "weather_clear_day",
            Self::ClearNight => "weather_clear_night",
            Self::PartlyCloudy => "weather_partly_cloudy",
        }
    }
}

impl TryFrom<u32> for IconId {
    type Error = u32;

    fn try_from(resource_id: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|icon| icon.resource_id() == resource_id)
            .ok_or(resource_id)
    }
}

/// Pick the icon for a condition code. Anything we don't recognize gets the
/// generic icon.
pub fn resolve_icon(condition_code: i32) -> IconId {
    match condition_code {
        // tornado, tropical storm, hurricane, (severe) thunderstorms,
        // isolated/scattered thunderstorms, thundershowers
        0..=4 | 37..=39 | 45 | 47 => IconId::Thunderstorm,
        // mixed rain/snow/sleet, freezing drizzle/rain, rain and hail
        5..=8 | 10 | 35 => IconId::RainAndSnow,
        // drizzle, scattered showers
        9 | 40 => IconId::LightRain,
        11 | 12 => IconId::HeavyRain,
        // flurries, light/blowing snow, hail, scattered snow showers
        13..=15 | 17 | 42 => IconId::LightSnow,
        // snow, sleet, heavy snow, snow showers
        16 | 18 | 41 | 43 | 46 => IconId::HeavySnow,
        // dust, fog, haze, smoke, cloudy
        19..=22 | 26 => IconId::Cloudy,
        27 | 29 => IconId::PartlyCloudyNight,
        // blustery, windy, cold, sunny, fair (day), hot
        23..=25 | 32 | 34 | 36 => IconId::ClearDay,
        31 | 33 => IconId::ClearNight,
        28 | 30 | 44 => IconId::PartlyCloudy,
        _ => IconId::Generic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every listed code, grouped by the icon it should produce
    const TABLE: &[(&[i32], IconId)] = &[
        (&[0, 1, 2, 3, 4, 37, 38, 39, 45, 47], IconId::Thunderstorm),
        (&[5, 6, 7, 8, 10, 35], IconId::RainAndSnow),
        (&[9, 40], IconId::LightRain),
        (&[11, 12], IconId::HeavyRain),
        (&[13, 14, 15, 17, 42], IconId::LightSnow),
        (&[16, 18, 41, 43, 46], IconId::HeavySnow),
        (&[19, 20, 21, 22, 26], IconId::Cloudy),
        (&[27, 29], IconId::PartlyCloudyNight),
        (&[23, 24, 25, 34, 32, 36], IconId::ClearDay),
        (&[31, 33], IconId::ClearNight),
        (&[28, 30, 44], IconId::PartlyCloudy),
    ];

    #[test]
    fn test_resolve_table() {
        for (codes, icon) in TABLE {
            for code in *codes {
                assert_eq!(resolve_icon(*code), *icon, "code {code}");
            }
        }
    }

    #[test]
    fn test_table_covers_0_to_47() {
        let mut listed: Vec<i32> = TABLE
            .iter()
            .flat_map(|(codes, _)| codes.iter().copied())
            .collect();
        listed.sort_unstable();
        assert_eq!(listed, (0..=47).collect::<Vec<_>>());
    }

    #[test]
    fn test_resolve_unknown() {
        for code in [-1, 48, 100, 3200, i32::MIN, i32::MAX] {
            assert_eq!(resolve_icon(code), IconId::Generic, "code {code}");
        }
    }

    #[test]
    fn test_resource_id_round_trip() {
        for icon in IconId::ALL {
            assert_eq!(IconId::try_from(icon.resource_id()), Ok(icon));
        }
        assert_eq!(IconId::try_from(0), Err(0));
        assert_eq!(IconId::try_from(13), Err(13));
    }
}
