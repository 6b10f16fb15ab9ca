//! WMO weather interpretation codes as reported by the forecast API.

use serde::Serialize;

/// Broad grouping a renderer maps to an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCategory {
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherCondition {
    pub description: &'static str,
    pub category: WeatherCategory,
}

pub fn describe(code: u16) -> &'static str {
    match code {
        0 => "Clear Sky",
        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Rime Fog",
        51 => "Light Drizzle",
        53 => "Moderate Drizzle",
        55 => "Heavy Drizzle",
        56 => "Light Freezing Drizzle",
        57 => "Heavy Freezing Drizzle",
        61 => "Light Rain",
        63 => "Moderate Rain",
        65 => "Heavy Rain",
        66 => "Light Freezing Rain",
        67 => "Heavy Freezing Rain",
        71 => "Light Snowfall",
        73 => "Moderate Snowfall",
        75 => "Heavy Snowfall",
        77 => "Snow Grains",
        80 => "Light Rain Showers",
        81 => "Moderate Rain Showers",
        82 => "Heavy Rain Showers",
        85 => "Light Snow Showers",
        86 => "Heavy Snow Showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with Light Hail",
        99 => "Thunderstorm with Heavy Hail",
        _ => "Unknown Weather",
    }
}

pub fn category(code: u16) -> WeatherCategory {
    match code {
        0 | 1 => WeatherCategory::Clear,
        2 => WeatherCategory::PartlyCloudy,
        3 => WeatherCategory::Cloudy,
        45 | 48 => WeatherCategory::Fog,
        51 | 53 | 55 | 56 | 57 => WeatherCategory::Drizzle,
        61 | 63 | 65 | 66 | 67 | 80 | 81 => WeatherCategory::Rain,
        82 | 95 | 96 | 99 => WeatherCategory::HeavyRain,
        71 | 73 | 75 | 77 | 85 | 86 => WeatherCategory::Snow,
        _ => WeatherCategory::Unknown,
    }
}

pub fn classify(code: u16) -> WeatherCondition {
    WeatherCondition {
        description: describe(code),
        category: category(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(classify(0).description, "Clear Sky");
        assert_eq!(classify(1).category, WeatherCategory::Clear);
        assert_eq!(classify(63).description, "Moderate Rain");
        assert_eq!(classify(82).category, WeatherCategory::HeavyRain);
        assert_eq!(classify(86).category, WeatherCategory::Snow);
        assert_eq!(
            classify(99),
            WeatherCondition {
                description: "Thunderstorm with Heavy Hail",
                category: WeatherCategory::HeavyRain,
            }
        );
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(classify(42).description, "Unknown Weather");
        assert_eq!(classify(42).category, WeatherCategory::Unknown);
    }

    #[test]
    fn test_every_described_code_has_a_category() {
        for code in 0..=100u16 {
            if describe(code) != "Unknown Weather" {
                assert_ne!(category(code), WeatherCategory::Unknown, "code {}", code);
            }
        }
    }
}
