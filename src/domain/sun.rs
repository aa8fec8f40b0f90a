use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UvLevel {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
    Extreme,
}

impl UvLevel {
    pub fn from_index(uv_index: f64) -> Self {
        if uv_index < 3.0 {
            UvLevel::Low
        } else if uv_index < 6.0 {
            UvLevel::Moderate
        } else if uv_index < 8.0 {
            UvLevel::High
        } else if uv_index < 11.0 {
            UvLevel::VeryHigh
        } else {
            UvLevel::Extreme
        }
    }
}

/// Moderate UV (3..=7) is the window worth nudging people outdoors for.
pub fn is_good_conditions(uv_index: f64) -> bool {
    (3.0..=7.0).contains(&uv_index)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SkinType {
    #[serde(rename = "I-II")]
    Fair,
    #[serde(rename = "III-IV")]
    Medium,
    #[serde(rename = "V-VI")]
    Dark,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExposureRecommendation {
    pub skin_type: SkinType,
    pub name: &'static str,
    pub min_minutes: u32,
    pub max_minutes: u32,
    pub recommended_minutes: u32,
    pub recommended_seconds: u32,
}

impl SkinType {
    pub const ALL: [SkinType; 3] = [SkinType::Fair, SkinType::Medium, SkinType::Dark];

    pub fn code(&self) -> &'static str {
        match self {
            SkinType::Fair => "I-II",
            SkinType::Medium => "III-IV",
            SkinType::Dark => "V-VI",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SkinType::Fair => "Fair Skin Type I-II",
            SkinType::Medium => "Medium Skin Type III-IV",
            SkinType::Dark => "Dark Skin Type V-VI",
        }
    }

    /// Daily sun exposure range in minutes.
    pub fn exposure_range(&self) -> (u32, u32) {
        match self {
            SkinType::Fair => (8, 12),
            SkinType::Medium => (15, 20),
            SkinType::Dark => (25, 30),
        }
    }

    pub fn recommendation(&self) -> ExposureRecommendation {
        let (min_minutes, max_minutes) = self.exposure_range();
        let recommended_minutes = (min_minutes + max_minutes) / 2;
        ExposureRecommendation {
            skin_type: *self,
            name: self.display_name(),
            min_minutes,
            max_minutes,
            recommended_minutes,
            recommended_seconds: recommended_minutes * 60,
        }
    }
}

impl TryFrom<&str> for SkinType {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_uppercase().as_str() {
            "I-II" | "1-2" => Ok(SkinType::Fair),
            "III-IV" | "3-4" => Ok(SkinType::Medium),
            "V-VI" | "5-6" => Ok(SkinType::Dark),
            _ => Err(()),
        }
    }
}

/// WMO weather interpretation codes as reported by Open-Meteo.
pub fn weather_description(code: i64) -> &'static str {
    match code {
        0 => "Clear Sky",
        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing Rime Fog",
        51 => "Light Drizzle",
        53 => "Moderate Drizzle",
        55 => "Dense Drizzle",
        56 => "Light Freezing Drizzle",
        57 => "Dense Freezing Drizzle",
        61 => "Slight Rain",
        63 => "Moderate Rain",
        65 => "Heavy Rain",
        66 => "Light Freezing Rain",
        67 => "Heavy Freezing Rain",
        71 => "Slight Snow",
        73 => "Moderate Snow",
        75 => "Heavy Snow",
        77 => "Snow Grains",
        80 => "Slight Rain Showers",
        81 => "Moderate Rain Showers",
        82 => "Violent Rain Showers",
        85 => "Slight Snow Showers",
        86 => "Heavy Snow Showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with Slight Hail",
        99 => "Thunderstorm with Heavy Hail",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uv_levels() {
        assert_eq!(UvLevel::from_index(0.0), UvLevel::Low);
        assert_eq!(UvLevel::from_index(3.0), UvLevel::Moderate);
        assert_eq!(UvLevel::from_index(7.9), UvLevel::High);
        assert_eq!(UvLevel::from_index(10.5), UvLevel::VeryHigh);
        assert_eq!(UvLevel::from_index(11.0), UvLevel::Extreme);
        assert_eq!(serde_json::to_value(UvLevel::VeryHigh).unwrap(), "Very High");
    }

    #[test]
    fn test_good_conditions_window() {
        assert!(!is_good_conditions(2.9));
        assert!(is_good_conditions(3.0));
        assert!(is_good_conditions(7.0));
        assert!(!is_good_conditions(7.5));
    }

    #[test]
    fn test_skin_type_recommendation() {
        let rec = SkinType::try_from("iii-iv").unwrap().recommendation();
        assert_eq!(rec.min_minutes, 15);
        assert_eq!(rec.max_minutes, 20);
        assert_eq!(rec.recommended_minutes, 17);
        assert_eq!(rec.recommended_seconds, 1020);
        assert!(SkinType::try_from("VII").is_err());
        for skin in SkinType::ALL {
            assert_eq!(serde_json::to_value(skin).unwrap(), skin.code());
            assert_eq!(SkinType::try_from(skin.code()), Ok(skin));
        }
    }

    #[test]
    fn test_weather_codes() {
        assert_eq!(weather_description(2), "Partly Cloudy");
        assert_eq!(weather_description(1234), "Unknown");
    }
}
