//! WMO weather interpretation codes as reported by Open-Meteo.

use serde::{Deserialize, Serialize};

/// First code of the rain class (61 = slight rain). Everything at or above
/// it is rain, snow, showers or thunderstorm.
pub const RAIN_CLASS_CODE: u8 = 61;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherCode(pub u8);

impl WeatherCode {
    pub fn description(self) -> &'static str {
        self.entry().0
    }

    /// Icon name understood by the dashboard's icon set.
    pub fn icon(self) -> &'static str {
        self.entry().1
    }

    pub fn is_rain_class(self) -> bool {
        self.0 >= RAIN_CLASS_CODE
    }

    // Codes without an entry render as clear sky.
    fn entry(self) -> (&'static str, &'static str) {
        match self.0 {
            1 => ("Mainly clear", "Sun"),
            2 => ("Partly cloudy", "CloudSun"),
            3 => ("Overcast", "Cloud"),
            45 | 48 => ("Fog", "CloudFog"),
            51 => ("Drizzle", "CloudDrizzle"),
            61 => ("Rain", "CloudRain"),
            80 => ("Rain showers", "CloudRain"),
            95 => ("Thunderstorm", "CloudLightning"),
            _ => ("Clear sky", "Sun"),
        }
    }
}

impl From<u8> for WeatherCode {
    fn from(code: u8) -> Self {
        WeatherCode(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_fall_back_to_clear_sky() {
        assert_eq!(WeatherCode(73).description(), "Clear sky");
        assert_eq!(WeatherCode(73).icon(), "Sun");
        assert_eq!(WeatherCode(48).description(), "Fog");
    }

    #[test]
    fn rain_class_starts_at_61() {
        assert!(!WeatherCode(51).is_rain_class());
        assert!(WeatherCode(61).is_rain_class());
        assert!(WeatherCode(95).is_rain_class());
    }
}
